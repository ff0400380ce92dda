//! Module Name Rules
//!
//! Module names are dot-separated (`a.b.Name`). A name must never contain the
//! module-path separator `/`, must not use array syntax unless permitted, and
//! must not start with the reserved system prefix unless an override is in
//! effect.

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

use crate::error::LoaderError;

/// Separator between package components
pub const PACKAGE_SEPARATOR: char = '.';

/// Separator used in module paths; never valid inside a binary name
pub const MODULE_PATH_SEPARATOR: char = '/';

/// Leading character of array type descriptors
pub const ARRAY_PREFIX: char = '[';

/// Default reserved system prefix
pub const DEFAULT_RESERVED_PREFIX: &str = "java.";

/// Package portion of a module name
///
/// Everything before the last [`PACKAGE_SEPARATOR`], or the empty string for
/// the default package.
///
/// ```rust
/// use entities_module_loading::package_name;
///
/// assert_eq!(package_name("com.example.Main"), "com.example");
/// assert_eq!(package_name("Main"), "");
/// ```
pub fn package_name(name: &str) -> &str {
    match name.rfind(PACKAGE_SEPARATOR) {
        Some(pos) => &name[..pos],
        None => "",
    }
}

/// Validation rules applied to module names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRules {
    /// Names starting with this prefix are prohibited
    pub reserved_prefix: String,
    /// Permit the reserved prefix anyway
    pub allow_reserved_prefix: bool,
    /// Permit names beginning with `[`
    pub allow_array_syntax: bool,
}

impl Default for NameRules {
    fn default() -> Self {
        Self {
            reserved_prefix: DEFAULT_RESERVED_PREFIX.to_string(),
            allow_reserved_prefix: false,
            allow_array_syntax: false,
        }
    }
}

impl NameRules {
    /// Check the syntactic shape of a name
    pub fn is_well_formed(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        if name.contains(MODULE_PATH_SEPARATOR) {
            return false;
        }
        if !self.allow_array_syntax && name.starts_with(ARRAY_PREFIX) {
            return false;
        }
        true
    }

    /// Full validation for a name about to be defined
    ///
    /// # Errors
    /// `LoaderError::InvalidName` naming the rule that failed.
    pub fn validate_for_definition(&self, name: &str) -> Result<(), LoaderError> {
        if name.contains(MODULE_PATH_SEPARATOR) {
            return Err(LoaderError::invalid_name(
                name,
                format!("contains module-path separator '{}'", MODULE_PATH_SEPARATOR),
            ));
        }
        if !self.allow_array_syntax && name.starts_with(ARRAY_PREFIX) {
            return Err(LoaderError::invalid_name(name, "array syntax is not a module name"));
        }
        if !self.allow_reserved_prefix
            && !self.reserved_prefix.is_empty()
            && name.starts_with(&self.reserved_prefix)
        {
            return Err(LoaderError::invalid_name(
                name,
                format!("prohibited package name prefix '{}'", self.reserved_prefix),
            ));
        }
        Ok(())
    }
}
