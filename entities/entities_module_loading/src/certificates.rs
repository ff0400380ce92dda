//! Signer Certificates
//!
//! A [`Certificate`] is an opaque signer identity. A [`CertificateSet`] is the
//! collection of signers attached to one code source. Two sets match when
//! they have the same size and each contains every element of the other,
//! regardless of order.

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

use std::fmt;

/// Signer identity
///
/// Certificates are compared by their encoded identity only; parsing and
/// chain validation belong to the security collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Certificate {
    identity: Vec<u8>,
}

impl Certificate {
    /// Create a certificate from its encoded identity
    pub fn new(identity: impl Into<Vec<u8>>) -> Self {
        Self {
            identity: identity.into(),
        }
    }

    /// Encoded identity bytes
    pub fn identity(&self) -> &[u8] {
        &self.identity
    }
}

impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.identity))
    }
}

/// Set of signer certificates
///
/// Kept as an ordered list so the original signing order is preserved for
/// reporting, but compared as an unordered set by [`CertificateSet::matches`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CertificateSet {
    certificates: Vec<Certificate>,
}

impl CertificateSet {
    /// Create an empty (unsigned) set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a set from a list of certificates
    pub fn new(certificates: Vec<Certificate>) -> Self {
        Self { certificates }
    }

    /// Number of certificates
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// Whether the set is unsigned
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Iterate over the certificates
    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.certificates.iter()
    }

    /// Whether `certificate` is a member of this set
    pub fn contains(&self, certificate: &Certificate) -> bool {
        self.certificates.contains(certificate)
    }

    /// Compare two sets for package signing consistency
    ///
    /// Both sets unsigned is a match. Otherwise the sizes must be equal and
    /// each set must contain every certificate of the other.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use entities_module_loading::{Certificate, CertificateSet};
    ///
    /// let a = CertificateSet::new(vec![Certificate::new("c1"), Certificate::new("c2")]);
    /// let b = CertificateSet::new(vec![Certificate::new("c2"), Certificate::new("c1")]);
    /// assert!(a.matches(&b));
    /// assert!(!a.matches(&CertificateSet::empty()));
    /// ```
    pub fn matches(&self, other: &CertificateSet) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.is_empty() && other.is_empty();
        }
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|c| other.contains(c)) && other.iter().all(|c| self.contains(c))
    }
}

impl FromIterator<Certificate> for CertificateSet {
    fn from_iter<I: IntoIterator<Item = Certificate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for CertificateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, cert) in self.certificates.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", cert)?;
        }
        write!(f, "}}")
    }
}
