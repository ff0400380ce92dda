//! Certificate Registry
//!
//! Per-loader map from package name to the canonical signer set for that
//! package. The first module defined in a package fixes the set; every later
//! module of the package must match it.
//!
//! Registration happens through a [`CertificateReservation`]. A reservation
//! that is dropped without being committed withdraws the entry again unless
//! another definition of the package has committed or is still in flight, so
//! a failed definition leaves the registry as it found it.

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

use entities_module_loading::{package_name, CertificateSet, LoaderError};
use parking_lot::Mutex;

#[derive(Debug)]
struct PackageSigners {
    certificates: CertificateSet,
    /// Definitions holding a reservation on this entry
    pending: usize,
    /// At least one module of the package was defined
    committed: bool,
}

/// Per-loader package signer registry
#[derive(Debug, Default)]
pub struct CertificateRegistry {
    packages: Mutex<HashMap<String, PackageSigners>>,
}

impl CertificateRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `certificates` for the package of `module_name` and reserve it
    ///
    /// # Errors
    /// `LoaderError::SignerMismatch` if the package already has a different
    /// canonical set. Nothing is registered in that case.
    pub fn reserve(
        &self,
        module_name: &str,
        certificates: &CertificateSet,
    ) -> Result<CertificateReservation<'_>, LoaderError> {
        let package = package_name(module_name);
        let mut packages = self.packages.lock();
        match packages.get_mut(package) {
            Some(entry) => {
                if !entry.certificates.matches(certificates) {
                    tracing::warn!(
                        module = module_name,
                        package,
                        registered = %entry.certificates,
                        offered = %certificates,
                        "signer mismatch"
                    );
                    return Err(LoaderError::SignerMismatch {
                        module: module_name.to_string(),
                        package: package.to_string(),
                    });
                }
                entry.pending += 1;
            }
            None => {
                packages.insert(
                    package.to_string(),
                    PackageSigners {
                        certificates: certificates.clone(),
                        pending: 1,
                        committed: false,
                    },
                );
            }
        }
        Ok(CertificateReservation {
            registry: self,
            package: package.to_string(),
            committed: false,
        })
    }

    /// Canonical signer set registered for `package`
    pub fn certificates_for(&self, package: &str) -> Option<CertificateSet> {
        self.packages
            .lock()
            .get(package)
            .map(|entry| entry.certificates.clone())
    }

    /// Packages with at least one defined module
    pub fn packages(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .packages
            .lock()
            .iter()
            .filter(|(_, entry)| entry.committed)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn release(&self, package: &str, committed: bool) {
        let mut packages = self.packages.lock();
        let remove = match packages.get_mut(package) {
            Some(entry) => {
                entry.pending = entry.pending.saturating_sub(1);
                entry.committed |= committed;
                entry.pending == 0 && !entry.committed
            }
            None => false,
        };
        if remove {
            packages.remove(package);
        }
    }
}

/// Outstanding claim on a package's signer set
///
/// Call [`commit`](Self::commit) once the module is defined. Dropping an
/// uncommitted reservation rolls the claim back.
#[derive(Debug)]
pub struct CertificateReservation<'a> {
    registry: &'a CertificateRegistry,
    package: String,
    committed: bool,
}

impl CertificateReservation<'_> {
    /// Package the reservation is for
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Make the signer set permanent for the package
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for CertificateReservation<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.package, self.committed);
    }
}
