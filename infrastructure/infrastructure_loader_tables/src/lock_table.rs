//! Lock Table
//!
//! Hands out the lock a loader holds while resolving a module name.
//!
//! ## Policies
//!
//! - **Parallel-capable**: one lock per module name, created on first use.
//!   Resolutions of different names never contend; resolutions of the same
//!   name serialize.
//! - **Coarse-locked**: the name is ignored and every resolution on the
//!   loader shares one lock.
//!
//! Locks are reentrant so a definer that resolves a dependency on the same
//! loader and thread does not deadlock against itself. Per-name locks are
//! never removed from the table.

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
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

/// Lock token for one (loader, name) key
///
/// Hold the guard returned by `lock()` for the whole resolution.
pub type LoadingLock = Arc<ReentrantMutex<()>>;

/// Per-loader table of loading locks
#[derive(Debug)]
pub struct LockTable {
    parallel: bool,
    /// Shared lock for coarse-locked loaders
    loader_lock: LoadingLock,
    /// Per-name locks for parallel-capable loaders
    name_locks: Mutex<HashMap<String, LoadingLock>>,
}

impl LockTable {
    /// Create a lock table
    ///
    /// # Arguments
    /// * `parallel` - Whether the owning loader is parallel-capable
    pub fn new(parallel: bool) -> Self {
        Self {
            parallel,
            loader_lock: Arc::new(ReentrantMutex::new(())),
            name_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Whether locks are handed out per name
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Lock to hold while resolving `name`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use infrastructure_loader_tables::LockTable;
    /// use std::sync::Arc;
    ///
    /// let table = LockTable::new(true);
    /// let lock = table.lock_for("a.B");
    /// let _guard = lock.lock();
    /// assert!(Arc::ptr_eq(&lock, &table.lock_for("a.B")));
    /// assert!(!Arc::ptr_eq(&lock, &table.lock_for("a.C")));
    /// ```
    pub fn lock_for(&self, name: &str) -> LoadingLock {
        if !self.parallel {
            return self.loader_lock.clone();
        }
        let mut locks = self.name_locks.lock();
        if let Some(lock) = locks.get(name) {
            return lock.clone();
        }
        let lock = Arc::new(ReentrantMutex::new(()));
        locks.insert(name.to_string(), lock.clone());
        tracing::trace!(name, "created loading lock");
        lock
    }

    /// Number of per-name locks created so far
    pub fn name_lock_count(&self) -> usize {
        self.name_locks.lock().len()
    }
}
