//! Entities Layer: Module Loading
//!
//! Provides the data model shared by every layer of the module loading
//! subsystem:
//! - Loader identities and loader kinds
//! - Signer certificates and certificate sets
//! - Code sources and protection domains
//! - Module handles produced by the external definer
//! - Native library ownership scopes
//! - Module name and package rules
//! - The error taxonomy for resolution and definition
//!
//! This crate has no dependencies on other layers.
//!
//! ## Architecture Context
//!
//! ### CLEAN Architecture Layer
//! - **Layer**: Entities (innermost)
//! - **Responsibility**: Plain data types and name rules; no I/O, no locking
//!   policy
//!
//! ### Dependency Rules (CRITICAL - Must Follow)
//! - **Can depend on**: `thiserror` only
//! - **MUST NOT depend on**: any other workspace crate (every other layer
//!   depends on this one)

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

pub mod certificates;
pub mod error;
pub mod loader;
pub mod module;
pub mod names;
pub mod protection_domain;
pub mod scope;

pub use certificates::{Certificate, CertificateSet};
pub use error::LoaderError;
pub use loader::{LoaderId, LoaderKind, BASE_LOADER_KIND};
pub use module::{Module, ModuleHandle};
pub use names::{
    package_name, NameRules, ARRAY_PREFIX, DEFAULT_RESERVED_PREFIX, MODULE_PATH_SEPARATOR,
    PACKAGE_SEPARATOR,
};
pub use protection_domain::{CodeSource, ProtectionDomain};
pub use scope::LibraryScope;
