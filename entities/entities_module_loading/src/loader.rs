//! Loader Identity and Kinds
//!
//! Every loader node carries a process-unique [`LoaderId`]. Loader *kinds*
//! replace subclassing: a [`LoaderKind`] names a family of loaders and points
//! at the kind it extends. The parallel-capable registration protocol walks
//! this chain.

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
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique loader identity
///
/// Id 0 is reserved for the bootstrap loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(u64);

static NEXT_LOADER_ID: AtomicU64 = AtomicU64::new(1);

impl LoaderId {
    /// Identity of the runtime's built-in (bootstrap) module set
    pub const BOOTSTRAP: LoaderId = LoaderId(0);

    /// Allocate a fresh identity
    pub fn next() -> Self {
        LoaderId(NEXT_LOADER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Whether this is the bootstrap identity
    pub fn is_bootstrap(self) -> bool {
        self == Self::BOOTSTRAP
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bootstrap() {
            write!(f, "loader#bootstrap")
        } else {
            write!(f, "loader#{}", self.0)
        }
    }
}

/// Loader kind descriptor
///
/// Kinds are declared as statics and identified by address. Two statics
/// with the same name are still distinct kinds.
///
/// ```rust
/// use entities_module_loading::{LoaderKind, BASE_LOADER_KIND};
///
/// static URL_LOADER: LoaderKind = LoaderKind::extending("UrlLoader", &BASE_LOADER_KIND);
/// assert_eq!(URL_LOADER.super_kind().map(|k| k.name()), Some("ModuleLoader"));
/// ```
#[derive(Debug)]
pub struct LoaderKind {
    name: &'static str,
    super_kind: Option<&'static LoaderKind>,
}

/// The root of every kind chain; registered as parallel-capable at startup
pub static BASE_LOADER_KIND: LoaderKind = LoaderKind::root("ModuleLoader");

impl LoaderKind {
    /// A kind with no super-kind
    pub const fn root(name: &'static str) -> Self {
        Self {
            name,
            super_kind: None,
        }
    }

    /// A kind extending `super_kind`
    pub const fn extending(name: &'static str, super_kind: &'static LoaderKind) -> Self {
        Self {
            name,
            super_kind: Some(super_kind),
        }
    }

    /// Kind name, for display only
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Kind this one extends, if any
    pub fn super_kind(&self) -> Option<&'static LoaderKind> {
        self.super_kind
    }
}

impl LoaderKind {
    /// Identity key of this kind: the address of its static
    pub fn identity(&self) -> usize {
        self as *const LoaderKind as usize
    }
}

impl PartialEq for LoaderKind {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for LoaderKind {}

impl Hash for LoaderKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}
