//! Loader Node
//!
//! One loader of the hierarchy. A node owns its lock table, certificate
//! registry, retained modules, protection domains, assertion table and native
//! library scope, and holds a strong reference to its parent so ancestors
//! outlive their descendants.
//!
//! Resolution lives in [`delegation`](super::delegation/index.html) and
//! definition in [`definition`](super::definition/index.html); this module
//! covers construction, accessors, assertion status and native libraries.
//!
//! ## Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use code_management_module_loading::{DelegateOnly, LoaderContext, LoaderNode, OpaqueModuleDefiner};
//! use entities_module_loading::BASE_LOADER_KIND;
//!
//! let context = LoaderContext::builder(Arc::new(OpaqueModuleDefiner)).build();
//! let root = LoaderNode::new(&BASE_LOADER_KIND, None, Arc::new(DelegateOnly), context.clone()).unwrap();
//! let child = LoaderNode::new(&BASE_LOADER_KIND, Some(root.clone()), Arc::new(DelegateOnly), context).unwrap();
//!
//! assert!(root.is_ancestor_of(&child));
//! assert!(!child.is_ancestor_of(&root));
//! assert!(child.is_parallel_capable());
//! ```

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
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use adapters_native_libraries::{NativeLibraryError, ScopeLibraries};
use entities_module_loading::{
    CodeSource, LibraryScope, LoaderError, LoaderId, LoaderKind, ModuleHandle, ProtectionDomain,
};
use infrastructure_loader_tables::{AssertionStatusTable, CertificateRegistry, LockTable};
use parking_lot::Mutex;

use crate::collaborators::ModuleFinder;
use crate::context::LoaderContext;

/// A loader in the hierarchy
pub struct LoaderNode {
    id: LoaderId,
    kind: &'static LoaderKind,
    parent: Option<Arc<LoaderNode>>,
    pub(crate) finder: Arc<dyn ModuleFinder>,
    pub(crate) context: Arc<LoaderContext>,
    pub(crate) locks: LockTable,
    pub(crate) certificates: CertificateRegistry,
    /// Every module this node returned or defined, by name
    pub(crate) loaded: Mutex<HashMap<String, ModuleHandle>>,
    /// Modules defined by this node, in definition order
    pub(crate) defined: Mutex<Vec<ModuleHandle>>,
    pub(crate) domains: Mutex<Vec<Arc<ProtectionDomain>>>,
    default_domain: OnceLock<Arc<ProtectionDomain>>,
    domain_cache: Mutex<HashMap<CodeSource, Arc<ProtectionDomain>>>,
    assertions: Mutex<AssertionStatusTable>,
    native_libraries: ScopeLibraries,
    torn_down: AtomicBool,
}

impl std::fmt::Debug for LoaderNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderNode")
            .field("id", &self.id)
            .field("kind", &self.kind.name())
            .field("parent", &self.parent.as_ref().map(|p| p.id))
            .field("parallel", &self.locks.is_parallel())
            .finish_non_exhaustive()
    }
}

impl LoaderNode {
    /// Create a node of `kind` under `parent`
    ///
    /// Whether the node is parallel-capable is decided here from the
    /// context's registry and never changes. Creating the first instance of a
    /// kind closes that kind to parallel-capable registration.
    ///
    /// # Errors
    /// Whatever the access policy returns for loader creation.
    pub fn new(
        kind: &'static LoaderKind,
        parent: Option<Arc<LoaderNode>>,
        finder: Arc<dyn ModuleFinder>,
        context: Arc<LoaderContext>,
    ) -> Result<Arc<Self>, LoaderError> {
        context.policy().check_create_loader(kind)?;
        let parallel = context.parallel_registry().note_instance(kind);
        let id = LoaderId::next();
        let assertions = AssertionStatusTable::new(context.config().default_assertion_status);

        tracing::debug!(
            loader = %id,
            kind = kind.name(),
            parallel,
            parent = ?parent.as_ref().map(|p| p.id),
            "created loader"
        );

        Ok(Arc::new(Self {
            id,
            kind,
            parent,
            finder,
            context,
            locks: LockTable::new(parallel),
            certificates: CertificateRegistry::new(),
            loaded: Mutex::new(HashMap::new()),
            defined: Mutex::new(Vec::new()),
            domains: Mutex::new(Vec::new()),
            default_domain: OnceLock::new(),
            domain_cache: Mutex::new(HashMap::new()),
            assertions: Mutex::new(assertions),
            native_libraries: ScopeLibraries::new(LibraryScope::Loader(id)),
            torn_down: AtomicBool::new(false),
        }))
    }

    pub fn id(&self) -> LoaderId {
        self.id
    }

    pub fn kind(&self) -> &'static LoaderKind {
        self.kind
    }

    pub fn context(&self) -> &Arc<LoaderContext> {
        &self.context
    }

    /// Parent node, without an access check
    pub fn parent(&self) -> Option<&Arc<LoaderNode>> {
        self.parent.as_ref()
    }

    /// Parent node, as seen by loader `requester`
    ///
    /// # Errors
    /// `LoaderError::AccessDenied` if the policy refuses.
    pub fn checked_parent(&self, requester: LoaderId) -> Result<Option<Arc<LoaderNode>>, LoaderError> {
        self.context.policy().check_parent_access(self.id, requester)?;
        Ok(self.parent.clone())
    }

    /// Whether this node is a strict ancestor of `other`
    pub fn is_ancestor_of(&self, other: &LoaderNode) -> bool {
        let mut current = other.parent.as_deref();
        while let Some(node) = current {
            if node.id == self.id {
                return true;
            }
            current = node.parent.as_deref();
        }
        false
    }

    pub fn is_parallel_capable(&self) -> bool {
        self.locks.is_parallel()
    }

    /// Modules defined by this node, in definition order
    pub fn defined_modules(&self) -> Vec<ModuleHandle> {
        self.defined.lock().clone()
    }

    /// Protection domains of the modules defined by this node
    pub fn protection_domains(&self) -> Vec<Arc<ProtectionDomain>> {
        self.domains.lock().clone()
    }

    /// Packages with at least one module defined by this node, sorted
    pub fn defined_packages(&self) -> Vec<String> {
        self.certificates.packages()
    }

    /// Domain used when a definition supplies none
    pub(crate) fn default_domain(&self) -> Arc<ProtectionDomain> {
        self.default_domain
            .get_or_init(|| Arc::new(ProtectionDomain::new(Some(CodeSource::default()))))
            .clone()
    }

    /// The cached domain for `code_source`
    pub(crate) fn domain_for(&self, code_source: CodeSource) -> Arc<ProtectionDomain> {
        self.domain_cache
            .lock()
            .entry(code_source)
            .or_insert_with_key(|source| Arc::new(ProtectionDomain::new(Some(source.clone()))))
            .clone()
    }

    pub(crate) fn record_domain(&self, domain: &Arc<ProtectionDomain>) {
        let mut domains = self.domains.lock();
        if !domains.iter().any(|d| d.id() == domain.id()) {
            domains.push(domain.clone());
        }
    }

    // Assertion status

    pub fn set_default_assertion_status(&self, enabled: bool) {
        self.assertions.lock().set_default(enabled);
    }

    pub fn set_package_assertion_status(&self, package: &str, enabled: bool) {
        self.assertions.lock().set_package(package, enabled);
    }

    pub fn set_module_assertion_status(&self, name: &str, enabled: bool) {
        self.assertions.lock().set_module(name, enabled);
    }

    /// Drop every package and module entry and disable the default
    pub fn clear_assertion_status(&self) {
        self.assertions.lock().clear();
    }

    /// Assertion status module `name` should start with
    pub fn desired_assertion_status(&self, name: &str) -> bool {
        self.assertions.lock().desired_status(name)
    }

    // Native libraries

    /// Libraries owned by this node
    pub fn native_libraries(&self) -> &ScopeLibraries {
        &self.native_libraries
    }

    /// Canonical names of the libraries owned by this node
    pub fn native_library_names(&self) -> Vec<String> {
        self.native_libraries.names()
    }

    /// Load library `name` into this node's scope
    ///
    /// The finder's own library path is tried first, then the context's
    /// system and user directories.
    ///
    /// # Returns
    /// Canonical name of the loaded library.
    ///
    /// # Errors
    /// - `UnsatisfiedLink`: no location produced a loadable library
    /// - `CrossScopeCollision`: another scope owns or is loading the library
    pub fn load_library(&self, name: &str) -> Result<String, NativeLibraryError> {
        let explicit = self.finder.find_library(name);
        self.context.native_libraries().load_library(
            name,
            explicit.as_deref(),
            self.context.library_search_path(),
            &self.native_libraries,
        )
    }

    /// Load the library at `path` into this node's scope, without searching
    ///
    /// # Errors
    /// - `UnsatisfiedLink`: no file at `path`, or the OS loader refused it
    /// - `CrossScopeCollision`: another scope owns or is loading the library
    pub fn load_library_absolute(&self, path: &Path) -> Result<String, NativeLibraryError> {
        let display = path.display().to_string();
        let loaded = self
            .context
            .native_libraries()
            .load(path, &self.native_libraries)
            .map_err(|e| match e {
                NativeLibraryError::LoadFailed { reason, .. } => NativeLibraryError::UnsatisfiedLink {
                    name: display.clone(),
                    reason,
                },
                other => other,
            })?;
        if !loaded {
            return Err(NativeLibraryError::UnsatisfiedLink {
                name: display,
                reason: "no such file".to_string(),
            });
        }
        Ok(fs::canonicalize(path)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or(display))
    }

    /// Address of native `symbol` in this node's libraries or a builtin library
    pub fn find_native(&self, symbol: &str) -> Option<usize> {
        self.context
            .native_libraries()
            .find_native(&self.native_libraries, symbol)
    }

    /// Unload every library owned by this node
    ///
    /// Runs once; later calls do nothing. Dropping the node calls it too.
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let count = self.native_libraries.len();
        self.context.native_libraries().release_scope(&self.native_libraries);
        tracing::debug!(loader = %self.id, libraries = count, "loader torn down");
    }
}

impl Drop for LoaderNode {
    fn drop(&mut self) {
        self.teardown();
    }
}
