//! Adapters Layer: Native Libraries
//!
//! Loads and unloads the shared libraries that modules depend on.
//!
//! ## Overview
//!
//! Every loaded library belongs to exactly one scope: the builtin scope
//! (statically linked, shared by everyone), one loader node, or the
//! process-wide system scope. A canonical library name is loaded at most once
//! per process. Asking again from the owning scope is a no-op success; asking
//! from any other scope is a [`NativeLibraryError::CrossScopeCollision`].
//!
//! A library's initialization routine may call back into the manager to load
//! itself again. The manager tracks in-flight loads on a reentrancy stack and
//! answers such calls without invoking the OS loader twice.
//!
//! ## Architecture Context
//!
//! ### CLEAN Architecture Layer
//! - **Layer**: Adapters (I/O and external interfaces)
//! - **Responsibility**: Talking to the OS dynamic loader and the filesystem
//!   search path; recording which scope owns each library
//!
//! ### Dependency Rules (CRITICAL - Must Follow)
//! - **Can depend on**: `entities_module_loading` (inward dependency - OK)
//! - **MUST NOT depend on**: `code_management_module_loading` (would create
//!   circular dependency)
//! - **Communication pattern**: callers pass in the [`ScopeLibraries`] they
//!   own; the manager never looks up loader nodes
//!
//! ## Modules
//!
//! - **[`native_loader`](native_loader/index.html)**: the OS dynamic-loader
//!   seam and its `libloading` implementation
//! - **[`library_manager`](library_manager/index.html)**: scope lists, the
//!   global name registry and the reentrancy stack
//! - **[`search_path`](search_path/index.html)**: system and user library
//!   directories
//!
//! ## See Also
//!
//! - [`entities_module_loading`](../../entities/entities_module_loading/index.html): `LibraryScope`

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

pub mod error;
pub mod library_manager;
pub mod native_loader;
pub mod search_path;

pub use error::NativeLibraryError;
pub use library_manager::{NativeLibrary, NativeLibraryManager, NativeLibraryRef, ScopeLibraries};
pub use native_loader::{LibloadingNativeLoader, NativeHandle, NativeLoader};
pub use search_path::LibrarySearchPath;
