//! Native Library Errors

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

use entities_module_loading::LibraryScope;
use thiserror::Error;

/// Native library loading errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NativeLibraryError {
    /// Every candidate location was tried and none could be loaded
    #[error("no {name} in library path: {reason}")]
    UnsatisfiedLink {
        /// Requested library name
        name: String,
        /// Summary of what was tried
        reason: String,
    },

    /// The library is already owned by, or being loaded for, another scope
    #[error("native library {name} already loaded by {owner}; cannot load it for {requester}")]
    CrossScopeCollision {
        /// Canonical library name
        name: String,
        /// Scope that owns the library
        owner: LibraryScope,
        /// Scope that asked for it
        requester: LibraryScope,
    },

    /// The OS loader rejected the library
    #[error("can't load library {name}: {reason}")]
    LoadFailed {
        /// Canonical library name
        name: String,
        /// OS loader message
        reason: String,
    },

    /// The library is not registered in the given scope
    #[error("native library {0} is not loaded in this scope")]
    NotLoaded(String),
}

impl NativeLibraryError {
    /// Whether trying the next search location could still succeed
    pub fn is_recoverable_by_search(&self) -> bool {
        matches!(self, NativeLibraryError::LoadFailed { .. })
    }
}
