//! CLI error type

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

use std::path::PathBuf;

use adapters_native_libraries::NativeLibraryError;
use entities_module_loading::LoaderError;
use thiserror::Error;

/// Failures reported by `modload`
#[derive(Debug, Error)]
pub enum CliError {
    #[error("at least one --layer directory is required")]
    NoLayers,

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("resource {0} not found")]
    ResourceNotFound(String),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Native(#[from] NativeLibraryError),
}
