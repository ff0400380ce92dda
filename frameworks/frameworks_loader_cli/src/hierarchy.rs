//! Loader Hierarchy Construction
//!
//! Builds a chain of directory-backed loaders from `--layer` arguments and
//! runs one [`Command`] against the innermost loader.
//!
//! ## Examples
//!
//! ```rust
//! use clap::Parser;
//! use frameworks_loader_cli::{run, LoaderArgs};
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::create_dir_all(dir.path().join("demo")).unwrap();
//! std::fs::write(dir.path().join("demo/Hello.class"), b"hello").unwrap();
//!
//! let layer = dir.path().to_str().unwrap();
//! let args = LoaderArgs::parse_from(["modload", "--layer", layer, "resolve", "demo.Hello"]);
//! let output = run(&args).unwrap();
//! assert!(output[0].starts_with("demo.Hello defined by"));
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

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use adapters_native_libraries::search_path::{SYSTEM_LIBRARY_PATH_VAR, USER_LIBRARY_PATH_VAR};
use adapters_native_libraries::{LibloadingNativeLoader, LibrarySearchPath, NativeLibraryManager};
use code_management_module_loading::{
    DirectoryModuleFinder, LoaderConfig, LoaderContext, LoaderNode, OpaqueModuleDefiner,
};
use entities_module_loading::{LoaderId, BASE_LOADER_KIND};

use crate::args::{Command, LoaderArgs};
use crate::error::CliError;

/// Chain of loaders, root first
#[derive(Debug)]
pub struct Hierarchy {
    layers: Vec<Arc<LoaderNode>>,
    innermost: Arc<LoaderNode>,
}

impl Hierarchy {
    /// One loader per directory; each loader is the parent of the next
    ///
    /// `library_dir` is given to the innermost loader only.
    pub fn build(
        layers: &[PathBuf],
        library_dir: Option<&Path>,
        context: Arc<LoaderContext>,
    ) -> Result<Self, CliError> {
        let mut nodes: Vec<Arc<LoaderNode>> = Vec::with_capacity(layers.len());
        for (index, dir) in layers.iter().enumerate() {
            let mut finder = DirectoryModuleFinder::new(vec![dir.clone()]);
            if index + 1 == layers.len() {
                if let Some(library_dir) = library_dir {
                    finder = finder.with_library_dir(library_dir);
                }
            }
            let parent = nodes.last().cloned();
            nodes.push(LoaderNode::new(&BASE_LOADER_KIND, parent, Arc::new(finder), context.clone())?);
        }
        let innermost = nodes.last().cloned().ok_or(CliError::NoLayers)?;
        tracing::debug!(layers = nodes.len(), innermost = %innermost.id(), "built loader hierarchy");
        Ok(Self {
            layers: nodes,
            innermost,
        })
    }

    pub fn layers(&self) -> &[Arc<LoaderNode>] {
        &self.layers
    }

    /// Loader that receives every request
    pub fn innermost(&self) -> &Arc<LoaderNode> {
        &self.innermost
    }

    /// Human-readable position of `loader` in the chain
    pub fn describe(&self, loader: LoaderId) -> String {
        match self.layers.iter().position(|node| node.id() == loader) {
            Some(index) => format!("layer {}", index),
            None => "bootstrap".to_string(),
        }
    }

    /// Run `command` against the innermost loader
    ///
    /// # Returns
    /// Lines to print.
    pub fn execute(&self, command: &Command) -> Result<Vec<String>, CliError> {
        match command {
            Command::Resolve { name, link } => {
                let module = self.innermost.resolve(name, *link)?;
                Ok(vec![format!(
                    "{} defined by {} ({}), {} bytes{}",
                    module.name(),
                    module.defining_loader(),
                    self.describe(module.defining_loader()),
                    module.code_length(),
                    if module.is_linked() { ", linked" } else { "" }
                )])
            }
            Command::LoadLibrary { name } => {
                let loaded = self.innermost.load_library(name)?;
                Ok(vec![format!("loaded {}", loaded)])
            }
            Command::Resource { name, all: true } => {
                let found = self.innermost.find_resources(name);
                if found.is_empty() {
                    return Err(CliError::ResourceNotFound(name.clone()));
                }
                Ok(found.iter().map(|p| p.display().to_string()).collect())
            }
            Command::Resource { name, all: false } => self
                .innermost
                .find_resource(name)
                .map(|p| vec![p.display().to_string()])
                .ok_or_else(|| CliError::ResourceNotFound(name.clone())),
        }
    }
}

/// Library search path from the flags, falling back to the environment
pub fn search_path_for(args: &LoaderArgs) -> LibrarySearchPath {
    let system = args
        .system_library_path
        .clone()
        .or_else(|| env::var_os(SYSTEM_LIBRARY_PATH_VAR));
    let user = args
        .library_path
        .clone()
        .or_else(|| env::var_os(USER_LIBRARY_PATH_VAR));
    LibrarySearchPath::from_vars(system.as_deref(), user.as_deref())
}

/// Build the hierarchy described by `args` and run its command
///
/// Native libraries loaded by the command are unloaded before returning.
pub fn run(args: &LoaderArgs) -> Result<Vec<String>, CliError> {
    args.validate()?;

    let mut config = LoaderConfig::from_env();
    if args.allow_reserved_prefix {
        config = config.allow_reserved_prefix(true);
    }
    let manager = Arc::new(NativeLibraryManager::new(Arc::new(LibloadingNativeLoader::new())));
    let context = LoaderContext::builder(Arc::new(OpaqueModuleDefiner))
        .native_libraries(manager.clone())
        .library_search_path(search_path_for(args))
        .config(config)
        .build();

    let hierarchy = Hierarchy::build(&args.layers, args.library_dir.as_deref(), context)?;
    let output = hierarchy.execute(&args.command);
    drop(hierarchy);
    manager.shutdown();
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn context() -> Arc<LoaderContext> {
        LoaderContext::builder(Arc::new(OpaqueModuleDefiner))
            .config(LoaderConfig::default())
            .library_search_path(LibrarySearchPath::default())
            .build()
    }

    #[test]
    fn test_chain_parents() {
        let dirs = [PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")];
        let hierarchy = Hierarchy::build(&dirs, None, context()).unwrap();
        let layers = hierarchy.layers();
        assert_eq!(layers.len(), 3);
        assert!(layers[0].parent().is_none());
        assert_eq!(layers[1].parent().map(|p| p.id()), Some(layers[0].id()));
        assert_eq!(layers[2].parent().map(|p| p.id()), Some(layers[1].id()));
        assert_eq!(hierarchy.innermost().id(), layers[2].id());
        assert_eq!(hierarchy.describe(layers[1].id()), "layer 1");
        assert_eq!(hierarchy.describe(LoaderId::BOOTSTRAP), "bootstrap");
    }

    #[test]
    fn test_empty_layers_rejected() {
        assert!(matches!(
            Hierarchy::build(&[], None, context()),
            Err(CliError::NoLayers)
        ));
    }

    #[test]
    fn test_flag_overrides_search_path() {
        let args = LoaderArgs {
            layers: vec![PathBuf::from("/a")],
            library_dir: None,
            system_library_path: Some(OsString::from("/opt/sys")),
            library_path: Some(OsString::from("/home/u/lib")),
            allow_reserved_prefix: false,
            command: Command::LoadLibrary { name: "z".to_string() },
        };
        let search = search_path_for(&args);
        assert_eq!(search.system_paths(), &[PathBuf::from("/opt/sys")]);
        assert_eq!(search.user_paths(), &[PathBuf::from("/home/u/lib")]);
    }
}
