//! Native Loader
//!
//! The seam between the library manager and the operating system's dynamic
//! loader. [`LibloadingNativeLoader`] is the production implementation; tests
//! substitute their own [`NativeLoader`] to observe and script native calls.
//!
//! ## Safety
//!
//! Loading a shared library runs its initialization code, and resolving a
//! symbol yields an address whose validity depends on the library staying
//! loaded. Handles stay loaded until [`NativeLoader::unload`] is called for
//! them, which the manager only does once the library has been removed from
//! every registry.

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

use std::collections::{HashMap, HashSet};
use std::ffi::c_void;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use libloading::{Library, Symbol};
use parking_lot::Mutex;

/// Opaque handle to a loaded native image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(u64);

impl NativeHandle {
    /// Wrap a raw handle value
    pub fn from_raw(raw: u64) -> Self {
        NativeHandle(raw)
    }

    /// Raw handle value
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

/// OS dynamic-loader primitives
pub trait NativeLoader: Send + Sync {
    /// Load the library at `path` (already canonical)
    ///
    /// # Errors
    /// The OS loader's message.
    fn load(&self, path: &Path) -> Result<NativeHandle, String>;

    /// Bind a library that is statically linked into the process
    ///
    /// # Errors
    /// The OS loader's message, or a note that `name` is not builtin.
    fn load_builtin(&self, name: &str) -> Result<NativeHandle, String>;

    /// Release a handle obtained from `load` or `load_builtin`
    fn unload(&self, handle: NativeHandle);

    /// Address of `symbol` in the library behind `handle`
    fn lookup(&self, handle: NativeHandle, symbol: &str) -> Option<usize>;

    /// Whether `name` is statically linked into the process
    fn is_builtin(&self, _name: &str) -> bool {
        false
    }
}

/// [`NativeLoader`] backed by `libloading`
#[derive(Debug, Default)]
pub struct LibloadingNativeLoader {
    builtins: HashSet<String>,
    libraries: Mutex<HashMap<u64, Library>>,
    next_handle: AtomicU64,
}

impl LibloadingNativeLoader {
    /// Create a loader with no builtin libraries
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader that treats `builtins` as statically linked
    pub fn with_builtins<I, S>(builtins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            builtins: builtins.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    fn store(&self, library: Library) -> NativeHandle {
        let raw = self.next_handle.fetch_add(1, Ordering::Relaxed) + 1;
        self.libraries.lock().insert(raw, library);
        NativeHandle(raw)
    }

    #[cfg(unix)]
    fn this_process() -> Result<Library, String> {
        Ok(libloading::os::unix::Library::this().into())
    }

    #[cfg(windows)]
    fn this_process() -> Result<Library, String> {
        libloading::os::windows::Library::this()
            .map(Into::into)
            .map_err(|e| e.to_string())
    }
}

impl NativeLoader for LibloadingNativeLoader {
    fn load(&self, path: &Path) -> Result<NativeHandle, String> {
        // Safety: running the library's initializers is the purpose of this
        // call; the handle keeps the image mapped until `unload`.
        let library = unsafe { Library::new(path) }.map_err(|e| e.to_string())?;
        Ok(self.store(library))
    }

    fn load_builtin(&self, name: &str) -> Result<NativeHandle, String> {
        if !self.is_builtin(name) {
            return Err(format!("{} is not a builtin library", name));
        }
        let library = Self::this_process()?;
        Ok(self.store(library))
    }

    fn unload(&self, handle: NativeHandle) {
        let library = self.libraries.lock().remove(&handle.0);
        if let Some(library) = library {
            if let Err(e) = library.close() {
                tracing::warn!(handle = handle.0, error = %e, "native unload reported an error");
            }
        }
    }

    fn lookup(&self, handle: NativeHandle, symbol: &str) -> Option<usize> {
        let libraries = self.libraries.lock();
        let library = libraries.get(&handle.0)?;
        // Safety: the symbol is read as an untyped address and never called here.
        let found: Symbol<*const c_void> = unsafe { library.get(symbol.as_bytes()) }.ok()?;
        Some(*found as usize)
    }

    fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains(name)
    }
}
