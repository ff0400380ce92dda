//! Library Search Path
//!
//! Ordered directories consulted when a library is requested by short name.
//! System directories are searched before user directories. The short name is
//! mapped to the platform file name (`foo` -> `libfoo.so`, `foo.dll`, ...).
//!
//! ## Environment
//!
//! - `MODLOAD_SYSTEM_LIBRARY_PATH`: system directories
//! - `MODLOAD_LIBRARY_PATH`: user directories
//!
//! Both use the platform path-list syntax.

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
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// Environment variable holding the system library directories
pub const SYSTEM_LIBRARY_PATH_VAR: &str = "MODLOAD_SYSTEM_LIBRARY_PATH";

/// Environment variable holding the user library directories
pub const USER_LIBRARY_PATH_VAR: &str = "MODLOAD_LIBRARY_PATH";

/// Ordered system and user library directories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibrarySearchPath {
    system_paths: Vec<PathBuf>,
    user_paths: Vec<PathBuf>,
}

impl LibrarySearchPath {
    /// Create a search path from explicit directory lists
    pub fn new(system_paths: Vec<PathBuf>, user_paths: Vec<PathBuf>) -> Self {
        Self {
            system_paths,
            user_paths,
        }
    }

    /// Read the search path from the environment
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var_os(SYSTEM_LIBRARY_PATH_VAR).as_deref(),
            env::var_os(USER_LIBRARY_PATH_VAR).as_deref(),
        )
    }

    /// Build a search path from raw path-list values
    pub fn from_vars(system: Option<&OsStr>, user: Option<&OsStr>) -> Self {
        Self::new(split(system), split(user))
    }

    /// System directories, in search order
    pub fn system_paths(&self) -> &[PathBuf] {
        &self.system_paths
    }

    /// User directories, in search order
    pub fn user_paths(&self) -> &[PathBuf] {
        &self.user_paths
    }

    /// Total number of directories
    pub fn len(&self) -> usize {
        self.system_paths.len() + self.user_paths.len()
    }

    /// Whether no directory is configured
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Platform file name for library `name`
    pub fn map_library_name(name: &str) -> OsString {
        libloading::library_filename(name)
    }

    /// Candidate files for library `name`, in search order
    ///
    /// ```rust
    /// use adapters_native_libraries::LibrarySearchPath;
    /// use std::path::PathBuf;
    ///
    /// let search = LibrarySearchPath::new(vec![PathBuf::from("/sys")], vec![PathBuf::from("/usr")]);
    /// let candidates: Vec<PathBuf> = search.candidates("foo").collect();
    /// assert_eq!(candidates.len(), 2);
    /// assert!(candidates[0].starts_with("/sys"));
    /// ```
    pub fn candidates(&self, name: &str) -> impl Iterator<Item = PathBuf> + '_ {
        let file_name = Self::map_library_name(name);
        self.system_paths
            .iter()
            .chain(self.user_paths.iter())
            .map(move |dir| dir.join(&file_name))
    }
}

fn split(value: Option<&OsStr>) -> Vec<PathBuf> {
    value
        .map(|v| env::split_paths(v).filter(|p| !p.as_os_str().is_empty()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_splits_and_orders() {
        let system = env::join_paths(["/opt/sys1", "/opt/sys2"]).unwrap();
        let user = env::join_paths(["/home/u/lib"]).unwrap();
        let search = LibrarySearchPath::from_vars(Some(&system), Some(&user));
        assert_eq!(search.system_paths(), &[PathBuf::from("/opt/sys1"), PathBuf::from("/opt/sys2")]);
        assert_eq!(search.user_paths(), &[PathBuf::from("/home/u/lib")]);
        assert_eq!(search.len(), 3);
    }

    #[test]
    fn test_missing_vars_give_empty_path() {
        let search = LibrarySearchPath::from_vars(None, None);
        assert!(search.is_empty());
        assert_eq!(search.candidates("foo").count(), 0);
    }

    #[test]
    fn test_candidates_use_platform_name() {
        let search = LibrarySearchPath::new(vec![PathBuf::from("/a")], vec![PathBuf::from("/b")]);
        let mapped = LibrarySearchPath::map_library_name("foo");
        let candidates: Vec<PathBuf> = search.candidates("foo").collect();
        assert_eq!(candidates, vec![PathBuf::from("/a").join(&mapped), PathBuf::from("/b").join(&mapped)]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_mapping() {
        assert_eq!(LibrarySearchPath::map_library_name("foo"), OsString::from("libfoo.so"));
    }
}
