//! Assertion Status Table
//!
//! Per-loader assertion flags. A module's desired status is taken from its
//! own entry if present, otherwise from the nearest enclosing package entry,
//! otherwise from the loader default.

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

use std::collections::HashMap;

use entities_module_loading::PACKAGE_SEPARATOR;

/// Assertion flags for one loader
#[derive(Debug, Clone, Default)]
pub struct AssertionStatusTable {
    default_status: bool,
    /// Keyed by package name; `""` is the default package
    packages: HashMap<String, bool>,
    modules: HashMap<String, bool>,
}

impl AssertionStatusTable {
    /// Create a table with the given default
    pub fn new(default_status: bool) -> Self {
        Self {
            default_status,
            ..Self::default()
        }
    }

    /// Set the loader-wide default
    pub fn set_default(&mut self, enabled: bool) {
        self.default_status = enabled;
    }

    /// Set the status for a package and all its subpackages
    pub fn set_package(&mut self, package: &str, enabled: bool) {
        self.packages.insert(package.to_string(), enabled);
    }

    /// Set the status for one module (and its nested modules)
    pub fn set_module(&mut self, name: &str, enabled: bool) {
        self.modules.insert(name.to_string(), enabled);
    }

    /// Drop every entry and reset the default to disabled
    pub fn clear(&mut self) {
        self.default_status = false;
        self.packages.clear();
        self.modules.clear();
    }

    /// Status a module named `name` should be initialized with
    pub fn desired_status(&self, name: &str) -> bool {
        if let Some(status) = self.modules.get(name) {
            return *status;
        }

        let mut candidate = name;
        match candidate.rfind(PACKAGE_SEPARATOR) {
            None => {
                if let Some(status) = self.packages.get("") {
                    return *status;
                }
            }
            Some(0) => {}
            Some(mut dot) => loop {
                candidate = &candidate[..dot];
                if let Some(status) = self.packages.get(candidate) {
                    return *status;
                }
                match candidate.rfind(PACKAGE_SEPARATOR) {
                    Some(next) if next > 0 => dot = next,
                    _ => break,
                }
            },
        }

        self.default_status
    }
}
