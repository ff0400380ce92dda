//! Module Handles
//!
//! A [`Module`] is the runtime representation returned by the external
//! definer. Handles are reference counted; the defining loader retains one
//! so the module stays alive as long as its loader is reachable.

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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::certificates::CertificateSet;
use crate::loader::LoaderId;
use crate::names::package_name;
use crate::protection_domain::ProtectionDomain;

/// Shared module handle
pub type ModuleHandle = Arc<Module>;

/// A defined module
#[derive(Debug)]
pub struct Module {
    name: String,
    defining_loader: LoaderId,
    protection_domain: Arc<ProtectionDomain>,
    code_length: usize,
    signers: OnceLock<CertificateSet>,
    linked: AtomicBool,
}

impl Module {
    /// Create a module handle
    ///
    /// Called by definers once the bytes have been accepted.
    pub fn new(
        name: impl Into<String>,
        defining_loader: LoaderId,
        protection_domain: Arc<ProtectionDomain>,
        code_length: usize,
    ) -> ModuleHandle {
        Arc::new(Self {
            name: name.into(),
            defining_loader,
            protection_domain,
            code_length,
            signers: OnceLock::new(),
            linked: AtomicBool::new(false),
        })
    }

    /// Fully qualified module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package the module belongs to (empty for the default package)
    pub fn package(&self) -> &str {
        package_name(&self.name)
    }

    /// Loader that defined this module
    pub fn defining_loader(&self) -> LoaderId {
        self.defining_loader
    }

    /// Trust context the module was defined in
    pub fn protection_domain(&self) -> &Arc<ProtectionDomain> {
        &self.protection_domain
    }

    /// Number of bytes the module was defined from
    pub fn code_length(&self) -> usize {
        self.code_length
    }

    /// Attach signer certificates
    ///
    /// Signers are set once; later calls are ignored and return `false`.
    pub fn set_signers(&self, signers: CertificateSet) -> bool {
        self.signers.set(signers).is_ok()
    }

    /// Signer certificates, if the module was signed
    pub fn signers(&self) -> Option<&CertificateSet> {
        self.signers.get()
    }

    /// Whether the linker has processed this module
    pub fn is_linked(&self) -> bool {
        self.linked.load(Ordering::Acquire)
    }

    /// Record that linking completed
    pub fn mark_linked(&self) {
        self.linked.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificates::Certificate;

    fn module(name: &str) -> ModuleHandle {
        Module::new(name, LoaderId::next(), Arc::new(ProtectionDomain::new(None)), 4)
    }

    #[test]
    fn test_package() {
        assert_eq!(module("a.b.C").package(), "a.b");
        assert_eq!(module("C").package(), "");
    }

    #[test]
    fn test_signers_set_once() {
        let m = module("p.A");
        assert!(m.signers().is_none());
        let first: CertificateSet = vec![Certificate::new("c1")].into_iter().collect();
        assert!(m.set_signers(first.clone()));
        assert!(!m.set_signers(CertificateSet::empty()));
        assert_eq!(m.signers(), Some(&first));
    }

    #[test]
    fn test_linked_flag() {
        let m = module("p.A");
        assert!(!m.is_linked());
        m.mark_linked();
        assert!(m.is_linked());
    }
}
