//! Infrastructure Layer: Loader Tables
//!
//! Provides the per-loader bookkeeping structures that the delegation engine
//! and definition pipeline build on:
//! - Loading locks (per-name or per-loader, decided at construction)
//! - The process-wide registry of parallel-capable loader kinds
//! - Per-package canonical signer sets
//! - Assertion status flags
//!
//! Depends on the Entities layer only.
//!
//! ## Architecture Context
//!
//! ### CLEAN Architecture Layer
//! - **Layer**: Infrastructure
//! - **Responsibility**: Thread-safe tables keyed by module name, package or
//!   loader kind; no knowledge of finders or definers
//!
//! ### Dependency Rules (CRITICAL - Must Follow)
//! - **Can depend on**: `entities_module_loading` (inward dependency - OK)
//! - **MUST NOT depend on**: `adapters_native_libraries`,
//!   `code_management_module_loading` (outer layers call into this one)

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

pub mod assertion_status;
pub mod certificate_registry;
pub mod lock_table;
pub mod parallel_registry;

pub use assertion_status::AssertionStatusTable;
pub use certificate_registry::{CertificateRegistry, CertificateReservation};
pub use lock_table::{LoadingLock, LockTable};
pub use parallel_registry::ParallelCapableRegistry;
