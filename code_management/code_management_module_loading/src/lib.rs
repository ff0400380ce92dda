//! Code Management Layer: Module Loading
//!
//! Provides the loader hierarchy:
//! - Parent-first delegation with per-name or per-loader locking
//! - The definition pipeline (name checks, signer consistency, retention)
//! - Per-loader native library ownership
//! - Directory-backed module finders
//!
//! Bytecode definition, bootstrap resolution, linking and access checks are
//! supplied by the embedding runtime through the traits in
//! [`collaborators`]. Depends on the Entities, Infrastructure and Adapters
//! layers.
//!
//! ## Architecture Context
//!
//! ### CLEAN Architecture Layer
//! - **Layer**: Code Management
//! - **Responsibility**: Delegation, definition and per-node native library
//!   ownership
//!
//! ### Dependency Rules (CRITICAL - Must Follow)
//! - **Can depend on**: `entities_module_loading`,
//!   `infrastructure_loader_tables`, `adapters_native_libraries` (inward
//!   dependencies - OK)
//! - **MUST NOT depend on**: `frameworks_loader_cli`
//! - **Communication pattern**: runtime-specific behavior enters only through
//!   the traits in [`collaborators`]
//!
//! ## Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use code_management_module_loading::*;
//! use entities_module_loading::BASE_LOADER_KIND;
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::create_dir_all(dir.path().join("app")).unwrap();
//! std::fs::write(dir.path().join("app/Main.class"), b"module bytes").unwrap();
//!
//! let context = LoaderContext::builder(Arc::new(OpaqueModuleDefiner)).build();
//! let root = LoaderNode::new(
//!     &BASE_LOADER_KIND,
//!     None,
//!     Arc::new(DirectoryModuleFinder::new(vec![dir.path().to_path_buf()])),
//!     context,
//! )
//! .unwrap();
//!
//! let module = root.resolve("app.Main", true).unwrap();
//! assert_eq!(module.defining_loader(), root.id());
//! assert!(module.is_linked());
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

pub mod collaborators;
pub mod config;
pub mod context;
pub mod definition;
pub mod delegation;
pub mod directory_finder;
pub mod loader_node;

pub use collaborators::{
    AccessPolicy, BootstrapResolver, BuiltinModules, DefinitionRequest, DelegateOnly, ModuleBytes,
    ModuleDefiner, ModuleFinder, ModuleLinker, NoopLinker, OpaqueModuleDefiner, PermitAll,
};
pub use config::LoaderConfig;
pub use context::{LoaderContext, LoaderContextBuilder};
pub use directory_finder::DirectoryModuleFinder;
pub use loader_node::LoaderNode;
