//! Delegation Engine
//!
//! Parent-first resolution. For a name not yet known to the node:
//!
//! 1. take the node's loading lock for the name
//! 2. return the module if the node already returned or defined it
//! 3. ask the parent (or, at the root, the bootstrap resolver)
//! 4. otherwise ask the node's own finder and define what it returns
//! 5. link the result if the caller asked for it
//!
//! A not-found answer from an ancestor is not an error; any other ancestor
//! error ends resolution. Modules obtained from ancestors are remembered by
//! the node, so a later lookup stops at step 2.

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

use entities_module_loading::{LoaderError, ModuleHandle};

use crate::loader_node::LoaderNode;

impl LoaderNode {
    /// Resolve module `name` through this node
    ///
    /// # Arguments
    /// * `name` - Fully qualified module name
    /// * `must_link` - Link the module before returning it
    ///
    /// # Errors
    /// - `ModuleNotFound`: neither an ancestor nor this node's finder knows
    ///   `name`, or `name` is not a well-formed module name
    /// - errors from the finder, the definition pipeline or the linker
    pub fn resolve(&self, name: &str, must_link: bool) -> Result<ModuleHandle, LoaderError> {
        if !self.context.config().name_rules.is_well_formed(name) {
            return Err(LoaderError::ModuleNotFound(name.to_string()));
        }

        let lock = self.locks.lock_for(name);
        let _guard = lock.lock();
        tracing::trace!(loader = %self.id(), module = name, "loading lock held");

        let module = match self.find_loaded_module(name) {
            Some(module) => module,
            None => self.resolve_unloaded(name)?,
        };

        if must_link && !module.is_linked() {
            self.context.linker().link(&module)?;
        }
        Ok(module)
    }

    /// Module `name` if this node already returned or defined it
    pub fn find_loaded_module(&self, name: &str) -> Option<ModuleHandle> {
        self.loaded.lock().get(name).cloned()
    }

    /// Locate resource `name`, ancestors first
    pub fn find_resource(&self, name: &str) -> Option<PathBuf> {
        let inherited = match self.parent() {
            Some(parent) => parent.find_resource(name),
            None => self.context.bootstrap().find_resource(name),
        };
        inherited.or_else(|| self.finder.find_resource(name))
    }

    /// Every copy of resource `name` visible from this node, ancestors first
    pub fn find_resources(&self, name: &str) -> Vec<PathBuf> {
        let mut found = match self.parent() {
            Some(parent) => parent.find_resources(name),
            None => self.context.bootstrap().find_resource(name).into_iter().collect(),
        };
        found.extend(self.finder.find_resources(name));
        found
    }

    // Caller holds the loading lock for `name`
    fn resolve_unloaded(&self, name: &str) -> Result<ModuleHandle, LoaderError> {
        let delegated = match self.parent() {
            Some(parent) => parent.resolve(name, false),
            None => self
                .context
                .bootstrap()
                .resolve_bootstrap(name)
                .ok_or_else(|| LoaderError::ModuleNotFound(name.to_string())),
        };

        match delegated {
            Ok(module) => {
                tracing::trace!(
                    loader = %self.id(),
                    module = name,
                    defined_by = %module.defining_loader(),
                    "resolved by ancestor"
                );
                self.loaded
                    .lock()
                    .entry(name.to_string())
                    .or_insert_with(|| module.clone());
                Ok(module)
            }
            Err(e) if e.is_not_found() => self.find_and_define(name),
            Err(e) => Err(e),
        }
    }

    fn find_and_define(&self, name: &str) -> Result<ModuleHandle, LoaderError> {
        let found = self.finder.find_module(name)?;
        let domain = found.code_source.map(|source| self.domain_for(source));
        let length = found.bytes.len();
        self.define(Some(name), &found.bytes, 0..length, domain)
    }
}
