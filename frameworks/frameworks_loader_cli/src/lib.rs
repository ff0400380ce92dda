//! Frameworks Layer: Loader CLI
//!
//! Library half of the `modload` binary:
//! - Argument definitions ([`args`])
//! - Building a loader hierarchy from directories ([`hierarchy`])
//! - Running one command against it ([`run`])
//!
//! Depends on the Entities, Adapters and Code Management layers.
//!
//! ## Architecture Context
//!
//! ### CLEAN Architecture Layer
//! - **Layer**: Frameworks (outermost)
//! - **Responsibility**: Command-line parsing, logging setup and wiring a
//!   concrete hierarchy together
//!
//! ### Dependency Rules (CRITICAL - Must Follow)
//! - **Can depend on**: every inner layer
//! - **MUST NOT be depended on**: no other workspace crate uses this one

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

pub mod args;
pub mod error;
pub mod hierarchy;

pub use args::{Command, LoaderArgs};
pub use error::CliError;
pub use hierarchy::{run, Hierarchy};
