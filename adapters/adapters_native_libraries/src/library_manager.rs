//! Native Library Manager
//!
//! Tracks which native libraries are loaded, by whom, and which are in the
//! middle of loading or unloading.
//!
//! ## Architecture Context
//!
//! ### CLEAN Architecture Layer
//! - **Layer**: Adapters (I/O and external interfaces)
//! - **Responsibility**: Deduplicating native loads per process, enforcing
//!   single-scope ownership, answering reentrant calls from library
//!   initializers and finalizers
//!
//! ### Dependency Rules (CRITICAL - Must Follow)
//! - **Can depend on**: `entities_module_loading` (inward dependency - OK)
//! - **MUST NOT depend on**: `code_management_module_loading`; loader nodes
//!   hand their [`ScopeLibraries`] in rather than being looked up
//!
//! ## Locking
//!
//! A load or unload holds two reentrant locks for the whole native call, in
//! this order:
//! 1. the target scope's library list
//! 2. the manager's global state (name registry + reentrancy stack)
//!
//! Both are reentrant so a library initializer or finalizer that calls back
//! into [`NativeLibraryManager::load`] on the same thread passes straight through
//! to the reentrancy check instead of deadlocking. Other threads block until
//! the native call returns. The `RefCell` borrows behind the locks are never
//! held across a native call.
//!
//! ## Ownership
//!
//! Each scope owns a [`ScopeLibraries`] list. Loader nodes own theirs; the
//! manager owns the builtin and system lists. Libraries are unloaded
//! explicitly when their scope is torn down ([`NativeLibraryManager::release_scope`]).

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

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use entities_module_loading::LibraryScope;
use parking_lot::ReentrantMutex;

use crate::error::NativeLibraryError;
use crate::native_loader::{LibloadingNativeLoader, NativeHandle, NativeLoader};
use crate::search_path::LibrarySearchPath;

/// Shared reference to a loaded library
pub type NativeLibraryRef = Arc<NativeLibrary>;

/// A loaded native library
#[derive(Debug)]
pub struct NativeLibrary {
    name: String,
    handle: NativeHandle,
    scope: LibraryScope,
    builtin: bool,
    loaded: AtomicBool,
}

impl NativeLibrary {
    /// Canonical name: absolute path, or the builtin library name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native handle
    pub fn handle(&self) -> NativeHandle {
        self.handle
    }

    /// Owning scope
    pub fn scope(&self) -> LibraryScope {
        self.scope
    }

    /// Whether the library is statically linked
    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    /// Whether the native image is still loaded
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }
}

/// Libraries owned by one scope
#[derive(Debug)]
pub struct ScopeLibraries {
    scope: LibraryScope,
    libraries: ReentrantMutex<RefCell<Vec<NativeLibraryRef>>>,
}

impl ScopeLibraries {
    /// Create an empty list for `scope`
    pub fn new(scope: LibraryScope) -> Self {
        Self {
            scope,
            libraries: ReentrantMutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Scope this list belongs to
    pub fn scope(&self) -> LibraryScope {
        self.scope
    }

    /// Library registered under `name`
    pub fn find(&self, name: &str) -> Option<NativeLibraryRef> {
        let guard = self.libraries.lock();
        let libraries = guard.borrow();
        libraries.iter().find(|lib| lib.name == name).cloned()
    }

    /// Snapshot of the registered libraries
    pub fn libraries(&self) -> Vec<NativeLibraryRef> {
        self.libraries.lock().borrow().clone()
    }

    /// Canonical names of the registered libraries
    pub fn names(&self) -> Vec<String> {
        self.libraries
            .lock()
            .borrow()
            .iter()
            .map(|lib| lib.name.clone())
            .collect()
    }

    /// Number of registered libraries
    pub fn len(&self) -> usize {
        self.libraries.lock().borrow().len()
    }

    /// Whether no library is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Library currently inside a native load or unload call
#[derive(Debug, Clone)]
struct InFlight {
    name: String,
    scope: LibraryScope,
}

#[derive(Debug, Default)]
struct ManagerState {
    /// Canonical name -> owning scope, for every loaded library
    loaded_names: HashMap<String, LibraryScope>,
    /// Reentrancy stack
    in_flight: Vec<InFlight>,
}

/// Process-wide native library manager
pub struct NativeLibraryManager {
    loader: Arc<dyn NativeLoader>,
    builtin: ScopeLibraries,
    system: ScopeLibraries,
    state: ReentrantMutex<RefCell<ManagerState>>,
}

impl std::fmt::Debug for NativeLibraryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLibraryManager")
            .field("builtin", &self.builtin.names())
            .field("system", &self.system.names())
            .finish()
    }
}

impl NativeLibraryManager {
    /// Create a manager over `loader`
    pub fn new(loader: Arc<dyn NativeLoader>) -> Self {
        Self {
            loader,
            builtin: ScopeLibraries::new(LibraryScope::Builtin),
            system: ScopeLibraries::new(LibraryScope::System),
            state: ReentrantMutex::new(RefCell::new(ManagerState::default())),
        }
    }

    /// Get the global manager, backed by the OS dynamic loader
    pub fn global() -> Arc<NativeLibraryManager> {
        static INSTANCE: OnceLock<Arc<NativeLibraryManager>> = OnceLock::new();
        INSTANCE
            .get_or_init(|| Arc::new(NativeLibraryManager::new(Arc::new(LibloadingNativeLoader::new()))))
            .clone()
    }

    /// Libraries loaded with no requesting loader
    pub fn system_libraries(&self) -> &ScopeLibraries {
        &self.system
    }

    /// Statically linked libraries (shared by every scope)
    pub fn builtin_libraries(&self) -> &ScopeLibraries {
        &self.builtin
    }

    /// Whether `name` is loaded anywhere in the process
    pub fn is_loaded(&self, canonical_name: &str) -> bool {
        self.state.lock().borrow().loaded_names.contains_key(canonical_name)
    }

    /// Scope that owns `name`, if loaded
    pub fn owner_of(&self, canonical_name: &str) -> Option<LibraryScope> {
        self.state.lock().borrow().loaded_names.get(canonical_name).copied()
    }

    /// Load the library file at `path` into `libs`
    ///
    /// # Returns
    /// `Ok(true)` if the library is loaded for the scope (now or already),
    /// `Ok(false)` if no file exists at `path`.
    ///
    /// # Errors
    /// - `CrossScopeCollision`: another scope owns or is loading the library
    /// - `LoadFailed`: the OS loader rejected the file
    pub fn load(&self, path: &Path, libs: &ScopeLibraries) -> Result<bool, NativeLibraryError> {
        let canonical = match Self::canonicalize(path) {
            Some(canonical) => canonical,
            None => return Ok(false),
        };
        let name = canonical.to_string_lossy().into_owned();
        let loader = self.loader.clone();
        self.load_entry(&name, libs, false, move || loader.load(&canonical))
    }

    /// Bind the builtin library `name`
    ///
    /// Builtins live in the shared builtin list whatever scope asks.
    ///
    /// # Returns
    /// `Ok(false)` if `name` is not builtin.
    pub fn load_builtin(&self, name: &str) -> Result<bool, NativeLibraryError> {
        if !self.loader.is_builtin(name) {
            return Ok(false);
        }
        let loader = self.loader.clone();
        let owned = name.to_string();
        self.load_entry(name, &self.builtin, true, move || loader.load_builtin(&owned))
    }

    /// Locate and load library `name` for `libs`
    ///
    /// Tries, in order: a builtin library of that name, the loader-supplied
    /// `explicit` path, each system directory, each user directory. The first
    /// successful load wins.
    ///
    /// # Returns
    /// Canonical name of the loaded library.
    ///
    /// # Errors
    /// - `UnsatisfiedLink`: no location produced a loadable library
    /// - `CrossScopeCollision`: fatal as soon as it is seen
    pub fn load_library(
        &self,
        name: &str,
        explicit: Option<&Path>,
        search: &LibrarySearchPath,
        libs: &ScopeLibraries,
    ) -> Result<String, NativeLibraryError> {
        if self.load_builtin(name)? {
            return Ok(name.to_string());
        }

        let mut last_failure: Option<NativeLibraryError> = None;
        let explicit_candidate = explicit.map(Path::to_path_buf);
        let candidates = explicit_candidate.into_iter().chain(search.candidates(name));
        for candidate in candidates {
            match self.load(&candidate, libs) {
                Ok(true) => {
                    return Ok(Self::canonicalize(&candidate)
                        .map(|p| p.to_string_lossy().into_owned())
                        .unwrap_or_else(|| candidate.to_string_lossy().into_owned()));
                }
                Ok(false) => {
                    tracing::trace!(library = name, candidate = %candidate.display(), "not present");
                }
                Err(e) if e.is_recoverable_by_search() => {
                    tracing::warn!(library = name, candidate = %candidate.display(), error = %e, "load failed, trying next location");
                    last_failure = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        let reason = match last_failure {
            Some(e) => e.to_string(),
            None => format!("searched {} location(s)", search.len() + usize::from(explicit.is_some())),
        };
        Err(NativeLibraryError::UnsatisfiedLink {
            name: name.to_string(),
            reason,
        })
    }

    /// Unload `library` from `libs`
    ///
    /// # Errors
    /// `NotLoaded` if the library is not registered in `libs`.
    pub fn unload(&self, libs: &ScopeLibraries, library: &NativeLibraryRef) -> Result<(), NativeLibraryError> {
        let libs_guard = libs.libraries.lock();
        let state_guard = self.state.lock();

        {
            let mut list = libs_guard.borrow_mut();
            let position = list
                .iter()
                .position(|lib| Arc::ptr_eq(lib, library))
                .ok_or_else(|| NativeLibraryError::NotLoaded(library.name.clone()))?;
            list.remove(position);

            let mut state = state_guard.borrow_mut();
            state.loaded_names.remove(&library.name);
            state.in_flight.push(InFlight {
                name: library.name.clone(),
                scope: library.scope,
            });
        }

        if !library.builtin {
            self.loader.unload(library.handle);
        }
        library.loaded.store(false, Ordering::Release);

        state_guard.borrow_mut().in_flight.pop();
        tracing::debug!(library = %library.name, scope = %library.scope, "unloaded native library");
        Ok(())
    }

    /// Unload every library owned by `libs`
    ///
    /// Called when the owning scope is torn down.
    pub fn release_scope(&self, libs: &ScopeLibraries) {
        for library in libs.libraries().into_iter().rev() {
            if let Err(e) = self.unload(libs, &library) {
                tracing::warn!(library = %library.name, error = %e, "unload during scope release failed");
            }
        }
    }

    /// Unload the system and builtin scopes
    pub fn shutdown(&self) {
        self.release_scope(&self.system);
        self.release_scope(&self.builtin);
    }

    /// Address of `symbol` in `libs` or, failing that, in a builtin library
    pub fn find_native(&self, libs: &ScopeLibraries, symbol: &str) -> Option<usize> {
        libs.libraries()
            .into_iter()
            .chain(self.builtin.libraries())
            .find_map(|lib| self.loader.lookup(lib.handle, symbol))
    }

    fn canonicalize(path: &Path) -> Option<PathBuf> {
        if !path.exists() {
            return None;
        }
        match fs::canonicalize(path) {
            Ok(canonical) => Some(canonical),
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "cannot canonicalize");
                None
            }
        }
    }

    fn load_entry<F>(
        &self,
        name: &str,
        libs: &ScopeLibraries,
        builtin: bool,
        native_load: F,
    ) -> Result<bool, NativeLibraryError>
    where
        F: FnOnce() -> Result<NativeHandle, String>,
    {
        let libs_guard = libs.libraries.lock();
        let state_guard = self.state.lock();
        let scope = libs.scope;

        if libs_guard.borrow().iter().any(|lib| lib.name == name) {
            return Ok(true);
        }

        {
            let mut state = state_guard.borrow_mut();
            if let Some(owner) = state.loaded_names.get(name) {
                tracing::warn!(library = name, owner = %owner, requester = %scope, "native library already owned by another scope");
                return Err(NativeLibraryError::CrossScopeCollision {
                    name: name.to_string(),
                    owner: *owner,
                    requester: scope,
                });
            }
            if let Some(pending) = state.in_flight.iter().find(|entry| entry.name == name) {
                if pending.scope == scope {
                    tracing::trace!(library = name, "reentrant load satisfied by in-flight load");
                    return Ok(true);
                }
                return Err(NativeLibraryError::CrossScopeCollision {
                    name: name.to_string(),
                    owner: pending.scope,
                    requester: scope,
                });
            }
            state.in_flight.push(InFlight {
                name: name.to_string(),
                scope,
            });
        }

        let result = native_load();

        state_guard.borrow_mut().in_flight.pop();

        let handle = result.map_err(|reason| NativeLibraryError::LoadFailed {
            name: name.to_string(),
            reason,
        })?;

        let library = Arc::new(NativeLibrary {
            name: name.to_string(),
            handle,
            scope,
            builtin,
            loaded: AtomicBool::new(true),
        });
        state_guard
            .borrow_mut()
            .loaded_names
            .insert(name.to_string(), scope);
        libs_guard.borrow_mut().push(library);
        tracing::debug!(library = name, scope = %scope, "loaded native library");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities_module_loading::LoaderId;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicU64;

    /// Loader that succeeds for every path and records calls
    #[derive(Default)]
    struct RecordingLoader {
        loads: Mutex<Vec<PathBuf>>,
        unloads: Mutex<Vec<NativeHandle>>,
        next: AtomicU64,
        fail: bool,
    }

    impl NativeLoader for RecordingLoader {
        fn load(&self, path: &Path) -> Result<NativeHandle, String> {
            self.loads.lock().push(path.to_path_buf());
            if self.fail {
                return Err("not a shared object".to_string());
            }
            Ok(NativeHandle::from_raw(self.next.fetch_add(1, Ordering::Relaxed) + 1))
        }

        fn load_builtin(&self, _name: &str) -> Result<NativeHandle, String> {
            Ok(NativeHandle::from_raw(9000))
        }

        fn unload(&self, handle: NativeHandle) {
            self.unloads.lock().push(handle);
        }

        fn lookup(&self, handle: NativeHandle, symbol: &str) -> Option<usize> {
            (symbol == "present").then_some(handle.as_raw() as usize)
        }

        fn is_builtin(&self, name: &str) -> bool {
            name == "builtin_zip"
        }
    }

    fn library_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"\x7fELF").unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let manager = NativeLibraryManager::new(Arc::new(RecordingLoader::default()));
        let libs = ScopeLibraries::new(LibraryScope::System);
        assert!(!manager.load(Path::new("/no/such/libfoo.so"), &libs).unwrap());
        assert!(libs.is_empty());
    }

    #[test]
    fn test_same_scope_reload_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = library_file(dir.path(), "libfoo.so");
        let loader = Arc::new(RecordingLoader::default());
        let manager = NativeLibraryManager::new(loader.clone());
        let libs = ScopeLibraries::new(LibraryScope::Loader(LoaderId::next()));

        assert!(manager.load(&path, &libs).unwrap());
        assert!(manager.load(&path, &libs).unwrap());
        assert_eq!(libs.len(), 1);
        assert_eq!(loader.loads.lock().len(), 1);
    }

    #[test]
    fn test_cross_scope_collision() {
        let dir = tempfile::tempdir().unwrap();
        let path = library_file(dir.path(), "libfoo.so");
        let manager = NativeLibraryManager::new(Arc::new(RecordingLoader::default()));
        let first = ScopeLibraries::new(LibraryScope::Loader(LoaderId::next()));
        let second = ScopeLibraries::new(LibraryScope::Loader(LoaderId::next()));

        manager.load(&path, &first).unwrap();
        let err = manager.load(&path, &second).unwrap_err();
        assert!(matches!(err, NativeLibraryError::CrossScopeCollision { .. }));
        assert!(second.is_empty());
    }

    #[test]
    fn test_failed_load_registers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = library_file(dir.path(), "libbad.so");
        let loader = Arc::new(RecordingLoader {
            fail: true,
            ..RecordingLoader::default()
        });
        let manager = NativeLibraryManager::new(loader);
        let libs = ScopeLibraries::new(LibraryScope::System);

        let err = manager.load(&path, &libs).unwrap_err();
        assert!(matches!(err, NativeLibraryError::LoadFailed { .. }));
        assert!(libs.is_empty());
        let canonical = fs::canonicalize(&path).unwrap();
        assert!(!manager.is_loaded(&canonical.to_string_lossy()));
        assert!(manager.state.lock().borrow().in_flight.is_empty());
    }

    #[test]
    fn test_unload_releases_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = library_file(dir.path(), "libfoo.so");
        let loader = Arc::new(RecordingLoader::default());
        let manager = NativeLibraryManager::new(loader.clone());
        let first = ScopeLibraries::new(LibraryScope::Loader(LoaderId::next()));
        let second = ScopeLibraries::new(LibraryScope::Loader(LoaderId::next()));

        manager.load(&path, &first).unwrap();
        let library = first.libraries().remove(0);
        manager.unload(&first, &library).unwrap();
        assert!(!library.is_loaded());
        assert_eq!(loader.unloads.lock().as_slice(), &[library.handle()]);

        // Once released, another scope may take ownership
        assert!(manager.load(&path, &second).unwrap());
        assert_eq!(manager.unload(&first, &library), Err(NativeLibraryError::NotLoaded(library.name().to_string())));
    }

    #[test]
    fn test_builtin_shared_and_never_closed() {
        let loader = Arc::new(RecordingLoader::default());
        let manager = NativeLibraryManager::new(loader.clone());
        assert!(!manager.load_builtin("not_builtin").unwrap());
        assert!(manager.load_builtin("builtin_zip").unwrap());
        assert!(manager.load_builtin("builtin_zip").unwrap());
        assert_eq!(manager.builtin_libraries().len(), 1);
        assert_eq!(manager.owner_of("builtin_zip"), Some(LibraryScope::Builtin));

        manager.shutdown();
        assert!(manager.builtin_libraries().is_empty());
        assert!(loader.unloads.lock().is_empty());
    }

    #[test]
    fn test_find_native_falls_back_to_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let path = library_file(dir.path(), "libfoo.so");
        let manager = NativeLibraryManager::new(Arc::new(RecordingLoader::default()));
        let libs = ScopeLibraries::new(LibraryScope::System);

        assert!(manager.find_native(&libs, "present").is_none());
        manager.load_builtin("builtin_zip").unwrap();
        assert_eq!(manager.find_native(&libs, "present"), Some(9000));
        manager.load(&path, &libs).unwrap();
        assert_eq!(manager.find_native(&libs, "present"), Some(1));
        assert!(manager.find_native(&libs, "absent").is_none());
    }

    /// Loader whose unload calls back into the manager for the same file
    struct UnloadCallbackLoader {
        manager: OnceLock<std::sync::Weak<NativeLibraryManager>>,
        path: PathBuf,
        own: Arc<ScopeLibraries>,
        other: Arc<ScopeLibraries>,
        native_loads: AtomicU64,
        callbacks: Mutex<Vec<Result<bool, NativeLibraryError>>>,
    }

    impl NativeLoader for UnloadCallbackLoader {
        fn load(&self, _path: &Path) -> Result<NativeHandle, String> {
            Ok(NativeHandle::from_raw(self.native_loads.fetch_add(1, Ordering::SeqCst) + 1))
        }

        fn load_builtin(&self, name: &str) -> Result<NativeHandle, String> {
            Err(name.to_string())
        }

        fn unload(&self, _handle: NativeHandle) {
            if let Some(manager) = self.manager.get().and_then(std::sync::Weak::upgrade) {
                let same = manager.load(&self.path, &self.own);
                let other = manager.load(&self.path, &self.other);
                self.callbacks.lock().extend([same, other]);
            }
        }

        fn lookup(&self, _handle: NativeHandle, _symbol: &str) -> Option<usize> {
            None
        }
    }

    #[test]
    fn test_unload_tolerates_reentrant_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = library_file(dir.path(), "libcallback.so");
        let own = Arc::new(ScopeLibraries::new(LibraryScope::Loader(LoaderId::next())));
        let other = Arc::new(ScopeLibraries::new(LibraryScope::Loader(LoaderId::next())));
        let loader = Arc::new(UnloadCallbackLoader {
            manager: OnceLock::new(),
            path: path.clone(),
            own: own.clone(),
            other: other.clone(),
            native_loads: AtomicU64::new(0),
            callbacks: Mutex::new(Vec::new()),
        });
        let manager = Arc::new(NativeLibraryManager::new(loader.clone()));
        assert!(loader.manager.set(Arc::downgrade(&manager)).is_ok());

        manager.load(&path, &own).unwrap();
        let library = own.libraries().remove(0);
        manager.unload(&own, &library).unwrap();

        let callbacks = loader.callbacks.lock();
        assert_eq!(callbacks.len(), 2);
        assert_eq!(callbacks[0], Ok(true));
        assert!(matches!(callbacks[1], Err(NativeLibraryError::CrossScopeCollision { .. })));
        assert_eq!(loader.native_loads.load(Ordering::SeqCst), 1);
        assert!(own.is_empty());
        assert!(other.is_empty());
        assert!(!manager.is_loaded(library.name()));
        assert!(manager.state.lock().borrow().in_flight.is_empty());
    }

    #[test]
    fn test_release_scope_unloads_everything() {
        let dir = tempfile::tempdir().unwrap();
        let a = library_file(dir.path(), "liba.so");
        let b = library_file(dir.path(), "libb.so");
        let loader = Arc::new(RecordingLoader::default());
        let manager = NativeLibraryManager::new(loader.clone());
        let libs = ScopeLibraries::new(LibraryScope::Loader(LoaderId::next()));

        manager.load(&a, &libs).unwrap();
        manager.load(&b, &libs).unwrap();
        manager.release_scope(&libs);
        assert!(libs.is_empty());
        assert_eq!(loader.unloads.lock().len(), 2);
    }
}
