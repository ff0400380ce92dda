//! Directory Module Finder
//!
//! [`ModuleFinder`] over an ordered list of directory roots. Module `a.b.C`
//! is read from `a/b/C.class` under the first root that has it, and the
//! root becomes the module's code source. Resources are looked up by their
//! `/`-separated path under each root. Native libraries come from an
//! optional library directory.

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

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use adapters_native_libraries::LibrarySearchPath;
use entities_module_loading::{CodeSource, LoaderError, MODULE_PATH_SEPARATOR, PACKAGE_SEPARATOR};

use crate::collaborators::{ModuleBytes, ModuleFinder};

/// File extension of module files
pub const MODULE_FILE_EXTENSION: &str = "class";

/// Finder reading modules from directory trees
#[derive(Debug, Clone, Default)]
pub struct DirectoryModuleFinder {
    roots: Vec<PathBuf>,
    library_dir: Option<PathBuf>,
}

impl DirectoryModuleFinder {
    /// Create a finder over `roots`, searched in order
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            library_dir: None,
        }
    }

    /// Also supply native libraries from `dir`
    pub fn with_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.library_dir = Some(dir.into());
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Relative path of module `name`
    ///
    /// ```rust
    /// use code_management_module_loading::DirectoryModuleFinder;
    /// use std::path::PathBuf;
    ///
    /// assert_eq!(
    ///     DirectoryModuleFinder::module_path("a.b.C"),
    ///     PathBuf::from("a").join("b").join("C.class")
    /// );
    /// ```
    pub fn module_path(name: &str) -> PathBuf {
        let mut path: PathBuf = name.split(PACKAGE_SEPARATOR).collect();
        path.set_extension(MODULE_FILE_EXTENSION);
        path
    }

    fn code_source(root: &Path) -> CodeSource {
        CodeSource::unsigned(format!("file:{}", root.display()))
    }

    /// Resource name as a path that cannot leave a root
    fn resource_path(name: &str) -> Option<PathBuf> {
        let relative = Path::new(name.trim_start_matches(MODULE_PATH_SEPARATOR));
        let mut path = PathBuf::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        (!path.as_os_str().is_empty()).then_some(path)
    }

    fn resource_candidates<'a>(&'a self, name: &str) -> impl Iterator<Item = PathBuf> + 'a {
        let relative = Self::resource_path(name);
        if relative.is_none() {
            tracing::debug!(resource = name, "resource name escapes its root");
        }
        self.roots
            .iter()
            .filter_map(move |root| relative.as_ref().map(|r| root.join(r)))
            .filter(|path| path.is_file())
    }
}

impl ModuleFinder for DirectoryModuleFinder {
    fn find_module(&self, name: &str) -> Result<ModuleBytes, LoaderError> {
        let relative = Self::module_path(name);
        for root in &self.roots {
            let path = root.join(&relative);
            if path.is_dir() {
                continue;
            }
            match fs::read(&path) {
                Ok(bytes) => {
                    tracing::trace!(module = name, path = %path.display(), "found module file");
                    return Ok(ModuleBytes::new(bytes).with_code_source(Self::code_source(root)));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(LoaderError::definition(
                        name,
                        format!("cannot read {}: {}", path.display(), e),
                    ));
                }
            }
        }
        Err(LoaderError::ModuleNotFound(name.to_string()))
    }

    fn find_resource(&self, name: &str) -> Option<PathBuf> {
        self.resource_candidates(name).next()
    }

    fn find_resources(&self, name: &str) -> Vec<PathBuf> {
        self.resource_candidates(name).collect()
    }

    fn find_library(&self, name: &str) -> Option<PathBuf> {
        let dir = self.library_dir.as_ref()?;
        let path = dir.join(LibrarySearchPath::map_library_name(name));
        path.is_file().then_some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, contents: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_first_root_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write(second.path(), "a/b/C.class", b"second");
        write(second.path(), "a/D.class", b"only-second");
        write(first.path(), "a/D.class", b"first");

        let finder = DirectoryModuleFinder::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);

        let d = finder.find_module("a.D").unwrap();
        assert_eq!(d.bytes, b"first");
        assert_eq!(d.code_source, Some(DirectoryModuleFinder::code_source(first.path())));

        let c = finder.find_module("a.b.C").unwrap();
        assert_eq!(c.bytes, b"second");
    }

    #[test]
    fn test_missing_module() {
        let root = tempfile::tempdir().unwrap();
        let finder = DirectoryModuleFinder::new(vec![root.path().to_path_buf()]);
        assert!(finder.find_module("no.Such").unwrap_err().is_not_found());
    }

    #[test]
    fn test_resources_in_root_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write(first.path(), "conf/app.properties", b"1");
        write(second.path(), "conf/app.properties", b"2");

        let finder = DirectoryModuleFinder::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);
        assert_eq!(
            finder.find_resource("/conf/app.properties"),
            Some(first.path().join("conf/app.properties"))
        );
        assert_eq!(finder.find_resources("conf/app.properties").len(), 2);
        assert!(finder.find_resource("conf/none").is_none());
    }

    #[test]
    fn test_directory_is_not_a_module() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("pkg/Inner.class")).unwrap();
        let finder = DirectoryModuleFinder::new(vec![root.path().to_path_buf()]);
        assert!(finder.find_module("pkg.Inner").unwrap_err().is_not_found());
        assert!(finder.find_module("").unwrap_err().is_not_found());
    }

    #[test]
    fn test_resource_cannot_escape_root() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("root");
        write(outer.path(), "secret.txt", b"s");
        write(&root, "inside.txt", b"i");

        let finder = DirectoryModuleFinder::new(vec![root.clone()]);
        assert!(finder.find_resource("../secret.txt").is_none());
        assert!(finder.find_resource("./../secret.txt").is_none());
        assert!(finder.find_resources("sub/../../secret.txt").is_empty());
        assert!(finder.find_resource("").is_none());
        assert_eq!(finder.find_resource("./inside.txt"), Some(root.join("inside.txt")));
    }

    #[test]
    fn test_library_dir() {
        let libs = tempfile::tempdir().unwrap();
        let file_name = LibrarySearchPath::map_library_name("codec");
        fs::write(libs.path().join(&file_name), b"\x7fELF").unwrap();

        let finder = DirectoryModuleFinder::new(vec![]).with_library_dir(libs.path());
        assert_eq!(finder.find_library("codec"), Some(libs.path().join(&file_name)));
        assert!(finder.find_library("absent").is_none());
        assert!(DirectoryModuleFinder::default().find_library("codec").is_none());
    }
}
