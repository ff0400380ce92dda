//! Native Library Scopes
//!
//! A scope is the ownership boundary for native libraries and the unit
//! against which duplicate loads are checked.

/*
 * %CopyrightBegin%
 *
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright Lee Barney 2025. All Rights Reserved.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 * %CopyrightEnd%
 */

use std::fmt;

use crate::loader::LoaderId;

/// Owner of a native library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryScope {
    /// Statically linked into the runtime; shared by everyone
    Builtin,
    /// Owned by one loader node
    Loader(LoaderId),
    /// Process-wide system scope (loads with no requesting loader)
    System,
}

impl fmt::Display for LibraryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryScope::Builtin => write!(f, "builtin"),
            LibraryScope::Loader(id) => write!(f, "{}", id),
            LibraryScope::System => write!(f, "system"),
        }
    }
}
