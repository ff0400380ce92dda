//! Command-Line Argument Parsing Module
//!
//! Argument definitions for the `modload` binary. Uses clap for type-safe
//! argument parsing.

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

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::CliError;

/// modload command-line arguments
#[derive(Parser, Debug)]
#[command(name = "modload")]
#[command(about = "Resolve modules and native libraries through a loader hierarchy")]
pub struct LoaderArgs {
    /// Module directory of one loader; the first is the root, each later one a child of the previous
    #[arg(long = "layer", value_name = "DIR")]
    pub layers: Vec<PathBuf>,

    /// Native library directory of the innermost loader
    #[arg(long, value_name = "DIR")]
    pub library_dir: Option<PathBuf>,

    /// System library directories (platform path-list syntax)
    #[arg(long, value_name = "PATHS")]
    pub system_library_path: Option<OsString>,

    /// User library directories (platform path-list syntax)
    #[arg(long, value_name = "PATHS")]
    pub library_path: Option<OsString>,

    /// Permit module names under the reserved prefix
    #[arg(long)]
    pub allow_reserved_prefix: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// What to do with the hierarchy
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resolve a module through the innermost loader
    Resolve {
        /// Fully qualified module name (e.g. "app.Main")
        name: String,

        /// Link the module after resolving it
        #[arg(long)]
        link: bool,
    },

    /// Load a native library into the innermost loader
    LoadLibrary {
        /// Short library name (e.g. "z" for libz.so)
        name: String,
    },

    /// Locate a resource through the innermost loader
    Resource {
        /// `/`-separated resource path
        name: String,

        /// List every visible copy instead of the first
        #[arg(long)]
        all: bool,
    },
}

impl LoaderArgs {
    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), CliError> {
        if self.layers.is_empty() {
            return Err(CliError::NoLayers);
        }
        if let Some(layer) = self.layers.iter().find(|layer| !layer.is_dir()) {
            return Err(CliError::NotADirectory(layer.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layers_keep_order() {
        let args = LoaderArgs::try_parse_from([
            "modload", "--layer", "/base", "--layer", "/app", "resolve", "app.Main", "--link",
        ])
        .unwrap();
        assert_eq!(args.layers, vec![PathBuf::from("/base"), PathBuf::from("/app")]);
        assert_eq!(
            args.command,
            Command::Resolve {
                name: "app.Main".to_string(),
                link: true,
            }
        );
    }

    #[test]
    fn test_load_library_subcommand() {
        let args = LoaderArgs::try_parse_from([
            "modload",
            "--layer",
            "/base",
            "--system-library-path",
            "/opt/lib",
            "load-library",
            "z",
        ])
        .unwrap();
        assert_eq!(args.system_library_path, Some(OsString::from("/opt/lib")));
        assert_eq!(args.command, Command::LoadLibrary { name: "z".to_string() });
    }

    #[test]
    fn test_validate_requires_layer() {
        let args = LoaderArgs::try_parse_from(["modload", "resource", "a.txt"]).unwrap();
        assert!(matches!(args.validate(), Err(CliError::NoLayers)));
    }

    #[test]
    fn test_missing_subcommand_rejected() {
        assert!(LoaderArgs::try_parse_from(["modload", "--layer", "/base"]).is_err());
    }
}
