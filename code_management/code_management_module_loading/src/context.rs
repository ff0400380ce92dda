//! Loader Context
//!
//! Collaborators and settings shared by the nodes of one hierarchy. A
//! context is built once with [`LoaderContextBuilder`] and handed to every
//! [`LoaderNode`](crate::LoaderNode) as an `Arc`.
//!
//! ## Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use code_management_module_loading::{BuiltinModules, LoaderContext, OpaqueModuleDefiner};
//!
//! let builtins = Arc::new(BuiltinModules::new());
//! builtins.register("base.Object");
//!
//! let context = LoaderContext::builder(Arc::new(OpaqueModuleDefiner))
//!     .bootstrap(builtins)
//!     .build();
//! assert!(!context.config().name_rules.reserved_prefix.is_empty());
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

use std::sync::Arc;

use adapters_native_libraries::{LibrarySearchPath, NativeLibraryError, NativeLibraryManager};
use entities_module_loading::LoaderKind;
use infrastructure_loader_tables::ParallelCapableRegistry;

use crate::collaborators::{
    AccessPolicy, BootstrapResolver, BuiltinModules, ModuleDefiner, ModuleLinker, NoopLinker, PermitAll,
};
use crate::config::LoaderConfig;

/// Shared collaborators of a loader hierarchy
pub struct LoaderContext {
    definer: Arc<dyn ModuleDefiner>,
    bootstrap: Arc<dyn BootstrapResolver>,
    linker: Arc<dyn ModuleLinker>,
    policy: Arc<dyn AccessPolicy>,
    native_libraries: Arc<NativeLibraryManager>,
    library_search_path: LibrarySearchPath,
    parallel_registry: &'static ParallelCapableRegistry,
    config: LoaderConfig,
}

impl std::fmt::Debug for LoaderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderContext")
            .field("native_libraries", &self.native_libraries)
            .field("library_search_path", &self.library_search_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LoaderContext {
    /// Start building a context around `definer`
    pub fn builder(definer: Arc<dyn ModuleDefiner>) -> LoaderContextBuilder {
        LoaderContextBuilder::new(definer)
    }

    pub fn definer(&self) -> &dyn ModuleDefiner {
        self.definer.as_ref()
    }

    pub fn bootstrap(&self) -> &dyn BootstrapResolver {
        self.bootstrap.as_ref()
    }

    pub fn linker(&self) -> &dyn ModuleLinker {
        self.linker.as_ref()
    }

    pub fn policy(&self) -> &dyn AccessPolicy {
        self.policy.as_ref()
    }

    pub fn native_libraries(&self) -> &Arc<NativeLibraryManager> {
        &self.native_libraries
    }

    pub fn library_search_path(&self) -> &LibrarySearchPath {
        &self.library_search_path
    }

    pub fn parallel_registry(&self) -> &'static ParallelCapableRegistry {
        self.parallel_registry
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Register `kind` as parallel-capable in this context's registry
    ///
    /// Succeeds only while no instance of `kind` exists and its super-kind
    /// is already registered. Registration is permanent.
    pub fn register_as_parallel_capable(&self, kind: &'static LoaderKind) -> bool {
        self.parallel_registry.register(kind)
    }

    /// Load library `name` into the system scope
    ///
    /// Searches the system directories and then the user directories.
    ///
    /// # Errors
    /// - `UnsatisfiedLink`: no directory produced a loadable library
    /// - `CrossScopeCollision`: a loader already owns the library
    pub fn load_system_library(&self, name: &str) -> Result<String, NativeLibraryError> {
        let manager = &self.native_libraries;
        manager.load_library(name, None, &self.library_search_path, manager.system_libraries())
    }
}

/// Builder for [`LoaderContext`]
///
/// Everything except the definer has a default: builtin modules with no
/// registrations, [`NoopLinker`], [`PermitAll`], the process-wide native
/// library manager, the search path from the environment, the process-wide
/// parallel-capable registry and [`LoaderConfig::from_env`].
pub struct LoaderContextBuilder {
    definer: Arc<dyn ModuleDefiner>,
    bootstrap: Option<Arc<dyn BootstrapResolver>>,
    linker: Option<Arc<dyn ModuleLinker>>,
    policy: Option<Arc<dyn AccessPolicy>>,
    native_libraries: Option<Arc<NativeLibraryManager>>,
    library_search_path: Option<LibrarySearchPath>,
    parallel_registry: Option<&'static ParallelCapableRegistry>,
    config: Option<LoaderConfig>,
}

impl LoaderContextBuilder {
    pub fn new(definer: Arc<dyn ModuleDefiner>) -> Self {
        Self {
            definer,
            bootstrap: None,
            linker: None,
            policy: None,
            native_libraries: None,
            library_search_path: None,
            parallel_registry: None,
            config: None,
        }
    }

    pub fn bootstrap(mut self, bootstrap: Arc<dyn BootstrapResolver>) -> Self {
        self.bootstrap = Some(bootstrap);
        self
    }

    pub fn linker(mut self, linker: Arc<dyn ModuleLinker>) -> Self {
        self.linker = Some(linker);
        self
    }

    pub fn policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn native_libraries(mut self, manager: Arc<NativeLibraryManager>) -> Self {
        self.native_libraries = Some(manager);
        self
    }

    pub fn library_search_path(mut self, search: LibrarySearchPath) -> Self {
        self.library_search_path = Some(search);
        self
    }

    pub fn parallel_registry(mut self, registry: &'static ParallelCapableRegistry) -> Self {
        self.parallel_registry = Some(registry);
        self
    }

    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Arc<LoaderContext> {
        Arc::new(LoaderContext {
            definer: self.definer,
            bootstrap: self
                .bootstrap
                .unwrap_or_else(|| Arc::new(BuiltinModules::new())),
            linker: self.linker.unwrap_or_else(|| Arc::new(NoopLinker)),
            policy: self.policy.unwrap_or_else(|| Arc::new(PermitAll)),
            native_libraries: self
                .native_libraries
                .unwrap_or_else(NativeLibraryManager::global),
            library_search_path: self
                .library_search_path
                .unwrap_or_else(LibrarySearchPath::from_env),
            parallel_registry: self
                .parallel_registry
                .unwrap_or_else(ParallelCapableRegistry::global),
            config: self.config.unwrap_or_else(LoaderConfig::from_env),
        })
    }
}
