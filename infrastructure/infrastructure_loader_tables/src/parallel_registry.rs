//! Parallel-Capable Registry
//!
//! Process-wide, append-only record of loader kinds that have registered as
//! parallel-capable. A kind may register only while no instance of it exists
//! and only if its super-kind is already registered. The registry also
//! records which kinds have been instantiated, so the decision a loader reads
//! at construction can never change afterwards.

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

use std::collections::HashSet;
use std::sync::OnceLock;

use entities_module_loading::{LoaderKind, BASE_LOADER_KIND};
use parking_lot::Mutex;

/// Kinds are keyed by [`LoaderKind::identity`], never by name
#[derive(Debug, Default)]
struct RegistryState {
    registered: HashSet<usize>,
    instantiated: HashSet<usize>,
}

/// Registry of parallel-capable loader kinds
#[derive(Debug)]
pub struct ParallelCapableRegistry {
    state: Mutex<RegistryState>,
}

impl ParallelCapableRegistry {
    /// Create a registry with the base kind already registered
    pub fn new() -> Self {
        let mut state = RegistryState::default();
        state.registered.insert(BASE_LOADER_KIND.identity());
        Self {
            state: Mutex::new(state),
        }
    }

    /// Get the global registry instance
    pub fn global() -> &'static ParallelCapableRegistry {
        static INSTANCE: OnceLock<ParallelCapableRegistry> = OnceLock::new();
        INSTANCE.get_or_init(ParallelCapableRegistry::new)
    }

    /// Register `kind` as parallel-capable
    ///
    /// # Returns
    /// `true` if the kind is (now) registered. `false` if its super-kind is
    /// not registered or an instance of the kind was already constructed.
    pub fn register(&self, kind: &'static LoaderKind) -> bool {
        let mut state = self.state.lock();
        if state.registered.contains(&kind.identity()) {
            return true;
        }
        if state.instantiated.contains(&kind.identity()) {
            tracing::warn!(kind = kind.name(), "parallel-capable registration after instantiation ignored");
            return false;
        }
        if let Some(super_kind) = kind.super_kind() {
            if !state.registered.contains(&super_kind.identity()) {
                return false;
            }
        }
        state.registered.insert(kind.identity());
        tracing::debug!(kind = kind.name(), "registered parallel-capable loader kind");
        true
    }

    /// Whether `kind` is registered
    pub fn is_registered(&self, kind: &LoaderKind) -> bool {
        self.state.lock().registered.contains(&kind.identity())
    }

    /// Record construction of a `kind` instance and read its lock policy
    ///
    /// # Returns
    /// `true` if instances of the kind are parallel-capable.
    pub fn note_instance(&self, kind: &'static LoaderKind) -> bool {
        let mut state = self.state.lock();
        state.instantiated.insert(kind.identity());
        state.registered.contains(&kind.identity())
    }
}

impl Default for ParallelCapableRegistry {
    fn default() -> Self {
        Self::new()
    }
}
