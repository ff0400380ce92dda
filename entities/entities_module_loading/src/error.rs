//! Loader Errors
//!
//! Error taxonomy for module resolution, definition and linking. Every
//! variant propagates synchronously to the caller; none is retried by the
//! loading subsystem.

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

use thiserror::Error;

/// Module loading errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
    /// No ancestor resolved the name and the concrete loader could not find it
    ///
    /// Recoverable at the call site.
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    /// The name failed validation; raised before any state is touched
    #[error("invalid module name '{name}': {reason}")]
    InvalidName {
        /// Offending name
        name: String,
        /// Which rule was violated
        reason: String,
    },

    /// The definer rejected the module, or the pipeline refused it
    ///
    /// The loader's state is left unmodified for the failed attempt.
    #[error("failed to define module '{name}': {reason}")]
    Definition {
        /// Module name (or `<unnamed>`)
        name: String,
        /// Failure description
        reason: String,
    },

    /// The module's signers differ from those already registered for its package
    #[error("signer information of module '{module}' does not match signer information of other modules in package '{package}'")]
    SignerMismatch {
        /// Module being defined
        module: String,
        /// Package whose canonical signer set was violated
        package: String,
    },

    /// The external linker rejected the module
    #[error("failed to link module '{name}': {reason}")]
    Link {
        /// Module name
        name: String,
        /// Failure description
        reason: String,
    },

    /// The access policy refused the operation
    #[error("access denied: {0}")]
    AccessDenied(String),
}

impl LoaderError {
    /// Shorthand for a [`LoaderError::Definition`]
    pub fn definition(name: impl Into<String>, reason: impl Into<String>) -> Self {
        LoaderError::Definition {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`LoaderError::InvalidName`]
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        LoaderError::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is the recoverable not-found outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoaderError::ModuleNotFound(_))
    }
}
