//! Loader Collaborators
//!
//! Capability traits the loader hierarchy consumes from the embedding
//! runtime, plus stock implementations usable on their own:
//!
//! - [`ModuleFinder`]: per-loader lookup of module bytes, resources and
//!   native library files
//! - [`ModuleDefiner`]: turns a byte range into a [`Module`]
//! - [`BootstrapResolver`]: modules known to the root of every hierarchy
//! - [`ModuleLinker`]: links a module when resolution asks for it
//! - [`AccessPolicy`]: security checks at the node boundary
//!
//! ## See Also
//!
//! - [`directory_finder`](super::directory_finder/index.html): filesystem [`ModuleFinder`]

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

use std::collections::HashMap;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;

use entities_module_loading::{
    CodeSource, LoaderError, LoaderId, LoaderKind, Module, ModuleHandle, ProtectionDomain,
};
use parking_lot::RwLock;

/// Bytes of a module as found by a [`ModuleFinder`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleBytes {
    pub bytes: Vec<u8>,
    /// Where the bytes came from, if known
    pub code_source: Option<CodeSource>,
}

impl ModuleBytes {
    /// Bytes with no code source
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            code_source: None,
        }
    }

    /// Attach the code source the bytes were read from
    pub fn with_code_source(mut self, code_source: CodeSource) -> Self {
        self.code_source = Some(code_source);
        self
    }
}

/// Per-loader lookup capability
///
/// Only `find_module` is required. A finder that never returns anything
/// turns its node into a pure delegator.
pub trait ModuleFinder: Send + Sync {
    /// Locate the bytes of module `name`
    ///
    /// # Errors
    /// `LoaderError::ModuleNotFound` if this finder does not know `name`;
    /// any other error aborts resolution.
    fn find_module(&self, name: &str) -> Result<ModuleBytes, LoaderError>;

    /// Locate resource `name` (a `/`-separated path)
    fn find_resource(&self, _name: &str) -> Option<PathBuf> {
        None
    }

    /// Every copy of resource `name` this finder can see, in search order
    fn find_resources(&self, name: &str) -> Vec<PathBuf> {
        self.find_resource(name).into_iter().collect()
    }

    /// Absolute path of native library `name`, if this finder supplies one
    fn find_library(&self, _name: &str) -> Option<PathBuf> {
        None
    }
}

/// Arguments handed to a [`ModuleDefiner`]
#[derive(Debug)]
pub struct DefinitionRequest<'a> {
    pub name: Option<&'a str>,
    pub bytes: &'a [u8],
    /// Validated to lie within `bytes`
    pub range: Range<usize>,
    pub protection_domain: &'a Arc<ProtectionDomain>,
    pub defining_loader: LoaderId,
}

impl DefinitionRequest<'_> {
    /// The byte range being defined
    pub fn code(&self) -> &[u8] {
        &self.bytes[self.range.clone()]
    }
}

/// Turns module bytes into a runtime [`Module`]
pub trait ModuleDefiner: Send + Sync {
    /// Define the module described by `request`
    ///
    /// # Errors
    /// `LoaderError::Definition` for malformed input.
    fn define_from_bytes(&self, request: &DefinitionRequest<'_>) -> Result<ModuleHandle, LoaderError>;
}

/// Modules resolved by the root of every hierarchy
pub trait BootstrapResolver: Send + Sync {
    /// The bootstrap module named `name`, if there is one
    fn resolve_bootstrap(&self, name: &str) -> Option<ModuleHandle>;

    /// Bootstrap resource `name`
    fn find_resource(&self, _name: &str) -> Option<PathBuf> {
        None
    }
}

/// Links modules on request
pub trait ModuleLinker: Send + Sync {
    /// Link `module`
    ///
    /// # Errors
    /// `LoaderError::Link` if linking fails.
    fn link(&self, module: &ModuleHandle) -> Result<(), LoaderError>;
}

/// Security checks at the node boundary
///
/// Every check permits by default.
pub trait AccessPolicy: Send + Sync {
    /// May a loader of `kind` be created?
    fn check_create_loader(&self, _kind: &LoaderKind) -> Result<(), LoaderError> {
        Ok(())
    }

    /// May `requester` obtain the parent of `loader`?
    fn check_parent_access(&self, _loader: LoaderId, _requester: LoaderId) -> Result<(), LoaderError> {
        Ok(())
    }
}

/// Policy that permits everything
#[derive(Debug, Default, Clone, Copy)]
pub struct PermitAll;

impl AccessPolicy for PermitAll {}

/// Linker that only records that a module was linked
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLinker;

impl ModuleLinker for NoopLinker {
    fn link(&self, module: &ModuleHandle) -> Result<(), LoaderError> {
        module.mark_linked();
        Ok(())
    }
}

/// Finder that knows nothing; its node only delegates
#[derive(Debug, Default, Clone, Copy)]
pub struct DelegateOnly;

impl ModuleFinder for DelegateOnly {
    fn find_module(&self, name: &str) -> Result<ModuleBytes, LoaderError> {
        Err(LoaderError::ModuleNotFound(name.to_string()))
    }
}

/// Definer that treats module bytes as opaque
///
/// Requires a name and a non-empty byte range.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpaqueModuleDefiner;

impl ModuleDefiner for OpaqueModuleDefiner {
    fn define_from_bytes(&self, request: &DefinitionRequest<'_>) -> Result<ModuleHandle, LoaderError> {
        let name = request
            .name
            .ok_or_else(|| LoaderError::definition("<unnamed>", "module name cannot be derived from opaque bytes"))?;
        if request.code().is_empty() {
            return Err(LoaderError::definition(name, "empty module body"));
        }
        Ok(Module::new(
            name,
            request.defining_loader,
            request.protection_domain.clone(),
            request.code().len(),
        ))
    }
}

/// [`BootstrapResolver`] backed by a registration map
#[derive(Debug, Default)]
pub struct BuiltinModules {
    modules: RwLock<HashMap<String, ModuleHandle>>,
}

impl BuiltinModules {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an unsigned bootstrap module called `name`
    ///
    /// Registering a name twice keeps the first module.
    pub fn register(&self, name: &str) -> ModuleHandle {
        self.modules
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Module::new(name, LoaderId::BOOTSTRAP, Arc::new(ProtectionDomain::new(None)), 0))
            .clone()
    }

    /// Names of every registered module, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl BootstrapResolver for BuiltinModules {
    fn resolve_bootstrap(&self, name: &str) -> Option<ModuleHandle> {
        self.modules.read().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_definer_uses_range() {
        let domain = Arc::new(ProtectionDomain::new(None));
        let bytes = b"headerBODYtrailer";
        let request = DefinitionRequest {
            name: Some("pkg.Body"),
            bytes,
            range: 6..10,
            protection_domain: &domain,
            defining_loader: LoaderId::next(),
        };
        let module = OpaqueModuleDefiner.define_from_bytes(&request).unwrap();
        assert_eq!(module.name(), "pkg.Body");
        assert_eq!(module.code_length(), 4);
        assert_eq!(module.defining_loader(), request.defining_loader);
    }

    #[test]
    fn test_opaque_definer_rejects_unnamed_and_empty() {
        let domain = Arc::new(ProtectionDomain::new(None));
        let unnamed = DefinitionRequest {
            name: None,
            bytes: b"x",
            range: 0..1,
            protection_domain: &domain,
            defining_loader: LoaderId::next(),
        };
        assert!(matches!(
            OpaqueModuleDefiner.define_from_bytes(&unnamed),
            Err(LoaderError::Definition { .. })
        ));

        let empty = DefinitionRequest {
            name: Some("a.B"),
            bytes: b"x",
            range: 1..1,
            protection_domain: &domain,
            defining_loader: LoaderId::next(),
        };
        assert!(OpaqueModuleDefiner.define_from_bytes(&empty).is_err());
    }

    #[test]
    fn test_builtin_modules_register_once() {
        let builtins = BuiltinModules::new();
        let first = builtins.register("base.Object");
        let second = builtins.register("base.Object");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.defining_loader(), LoaderId::BOOTSTRAP);
        assert!(builtins.resolve_bootstrap("base.String").is_none());
        assert_eq!(builtins.names(), vec!["base.Object".to_string()]);
    }

    #[test]
    fn test_noop_linker_marks_linked() {
        let module = Module::new("a.B", LoaderId::next(), Arc::new(ProtectionDomain::new(None)), 1);
        assert!(!module.is_linked());
        NoopLinker.link(&module).unwrap();
        assert!(module.is_linked());
    }

    #[test]
    fn test_delegate_only_finds_nothing() {
        assert!(DelegateOnly.find_module("a.B").unwrap_err().is_not_found());
        assert!(DelegateOnly.find_library("z").is_none());
    }
}
