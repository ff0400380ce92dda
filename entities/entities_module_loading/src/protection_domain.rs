//! Code Sources and Protection Domains
//!
//! A [`CodeSource`] records where module bytes came from and who signed them.
//! A [`ProtectionDomain`] wraps a code source as the trust context attached to
//! every defined module. Domains are shared through `Arc` and compared by
//! identity.

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

use std::sync::atomic::{AtomicU64, Ordering};

use crate::certificates::CertificateSet;

/// Origin of module bytes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CodeSource {
    location: Option<String>,
    certificates: CertificateSet,
}

impl CodeSource {
    /// Create a code source
    pub fn new(location: Option<String>, certificates: CertificateSet) -> Self {
        Self {
            location,
            certificates,
        }
    }

    /// Unsigned code source at `location`
    pub fn unsigned(location: impl Into<String>) -> Self {
        Self::new(Some(location.into()), CertificateSet::empty())
    }

    /// Location the bytes were read from, if known
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Signer certificates
    pub fn certificates(&self) -> &CertificateSet {
        &self.certificates
    }
}

static NEXT_DOMAIN_ID: AtomicU64 = AtomicU64::new(1);

/// Trust context attached to a defined module
#[derive(Debug)]
pub struct ProtectionDomain {
    id: u64,
    code_source: Option<CodeSource>,
}

impl ProtectionDomain {
    /// Create a domain for `code_source`
    pub fn new(code_source: Option<CodeSource>) -> Self {
        Self {
            id: NEXT_DOMAIN_ID.fetch_add(1, Ordering::Relaxed),
            code_source,
        }
    }

    /// Domain identity
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Code source, absent for a loader's default domain
    pub fn code_source(&self) -> Option<&CodeSource> {
        self.code_source.as_ref()
    }

    /// Signer certificates of the code source
    ///
    /// A domain without a code source is unsigned.
    pub fn certificates(&self) -> CertificateSet {
        self.code_source
            .as_ref()
            .map(|cs| cs.certificates().clone())
            .unwrap_or_default()
    }
}

impl PartialEq for ProtectionDomain {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ProtectionDomain {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificates::Certificate;

    #[test]
    fn test_domains_compare_by_identity() {
        let cs = CodeSource::unsigned("/opt/app");
        let a = ProtectionDomain::new(Some(cs.clone()));
        let b = ProtectionDomain::new(Some(cs));
        assert_ne!(a, b);
        assert_eq!(a.code_source(), b.code_source());
    }

    #[test]
    fn test_default_domain_is_unsigned() {
        let pd = ProtectionDomain::new(None);
        assert!(pd.certificates().is_empty());
        assert!(pd.code_source().is_none());
    }

    #[test]
    fn test_certificates_from_code_source() {
        let certs: CertificateSet = vec![Certificate::new("signer")].into_iter().collect();
        let pd = ProtectionDomain::new(Some(CodeSource::new(Some("/x".into()), certs.clone())));
        assert_eq!(pd.certificates(), certs);
        assert_eq!(pd.code_source().and_then(|cs| cs.location()), Some("/x"));
    }
}
