//! Loader Configuration
//!
//! Name validation rules and the initial assertion status shared by every
//! node built from one [`LoaderContext`](crate::LoaderContext).
//!
//! ## Environment
//!
//! - `MODLOAD_ALLOW_RESERVED_PREFIX`: permit names under the reserved prefix
//! - `MODLOAD_ENABLE_ASSERTIONS`: default assertion status for new nodes
//!
//! Accepted truthy values are `1`, `true`, `yes` and `on` (any case).

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

use entities_module_loading::NameRules;

/// Environment variable overriding the reserved-prefix rule
pub const ALLOW_RESERVED_PREFIX_VAR: &str = "MODLOAD_ALLOW_RESERVED_PREFIX";

/// Environment variable setting the default assertion status
pub const ENABLE_ASSERTIONS_VAR: &str = "MODLOAD_ENABLE_ASSERTIONS";

/// Settings applied to every node of a hierarchy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoaderConfig {
    pub name_rules: NameRules,
    /// Assertion status a new node starts with
    pub default_assertion_status: bool,
}

impl LoaderConfig {
    /// Defaults overlaid with the environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overlaid with values produced by `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(ALLOW_RESERVED_PREFIX_VAR) {
            config.name_rules.allow_reserved_prefix = parse_flag(&value);
        }
        if let Some(value) = lookup(ENABLE_ASSERTIONS_VAR) {
            config.default_assertion_status = parse_flag(&value);
        }
        config
    }

    /// Replace the reserved prefix
    pub fn with_reserved_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_rules.reserved_prefix = prefix.into();
        self
    }

    /// Permit or refuse names under the reserved prefix
    pub fn allow_reserved_prefix(mut self, allow: bool) -> Self {
        self.name_rules.allow_reserved_prefix = allow;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
