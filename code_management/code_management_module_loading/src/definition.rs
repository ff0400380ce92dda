//! Definition Pipeline
//!
//! Turns a byte range into a module owned by a node. In order:
//!
//! 1. validate the name (no `/`, no reserved prefix unless permitted)
//! 2. check the range against the bytes
//! 3. take the name's loading lock and refuse a name already registered
//! 4. pick the protection domain, defaulting to the node's own
//! 5. reserve the package's signer set (mismatch is fatal)
//! 6. call the external definer
//! 7. check the result, attach signers, retain the module, record the domain
//!
//! An unnamed definition learns its name from the definer, so steps 3 and 5
//! run after step 6 for it, under the lock of the produced name.
//!
//! A failure anywhere leaves the node as it was. In particular a package
//! signer set first registered by a failed attempt is withdrawn.

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

use std::ops::Range;
use std::sync::Arc;

use entities_module_loading::{LoaderError, ModuleHandle, ProtectionDomain};

use crate::collaborators::DefinitionRequest;
use crate::loader_node::LoaderNode;

const UNNAMED: &str = "<unnamed>";

impl LoaderNode {
    /// Define a module from `bytes[range]` in this node
    ///
    /// # Arguments
    /// * `name` - Expected module name; `None` lets the definer decide
    /// * `bytes` - Buffer holding the module
    /// * `range` - Part of `bytes` to define
    /// * `protection_domain` - Trust context; the node default if `None`
    ///
    /// # Errors
    /// - `InvalidName`: rejected before anything is touched
    /// - `SignerMismatch`: the package is already signed differently
    /// - `Definition`: bad range, duplicate name, definer failure, or the
    ///   definer produced a different name or loader
    pub fn define(
        &self,
        name: Option<&str>,
        bytes: &[u8],
        range: Range<usize>,
        protection_domain: Option<Arc<ProtectionDomain>>,
    ) -> Result<ModuleHandle, LoaderError> {
        let rules = &self.context.config().name_rules;
        if let Some(name) = name {
            rules.validate_for_definition(name)?;
        }
        let label = name.unwrap_or(UNNAMED);
        if range.start > range.end || range.end > bytes.len() {
            return Err(LoaderError::definition(
                label,
                format!("range {}..{} outside {} byte(s)", range.start, range.end, bytes.len()),
            ));
        }

        let lock = name.map(|n| self.locks.lock_for(n));
        let _guard = lock.as_ref().map(|l| l.lock());

        if let Some(name) = name {
            if self.loaded.lock().contains_key(name) {
                tracing::warn!(loader = %self.id(), module = name, "duplicate definition refused");
                return Err(LoaderError::definition(name, "duplicate module definition"));
            }
        }

        let domain = protection_domain.unwrap_or_else(|| self.default_domain());
        let signers = domain.certificates();
        let early_reservation = match name {
            Some(name) => Some(self.certificates.reserve(name, &signers)?),
            None => None,
        };

        let request = DefinitionRequest {
            name,
            bytes,
            range,
            protection_domain: &domain,
            defining_loader: self.id(),
        };
        let module = self
            .context
            .definer()
            .define_from_bytes(&request)
            .inspect_err(|e| {
                tracing::warn!(loader = %self.id(), module = label, error = %e, "definer rejected module");
            })?;

        match name {
            Some(name) if module.name() != name => {
                return Err(LoaderError::definition(
                    name,
                    format!("definer produced module {}", module.name()),
                ));
            }
            None => rules.validate_for_definition(module.name())?,
            _ => {}
        }
        if module.defining_loader() != self.id() {
            return Err(LoaderError::definition(
                module.name(),
                format!("definer attributed module to {}", module.defining_loader()),
            ));
        }

        let late_lock = match name {
            Some(_) => None,
            None => Some(self.locks.lock_for(module.name())),
        };
        let _late_guard = late_lock.as_ref().map(|l| l.lock());
        let reservation = match early_reservation {
            Some(reservation) => reservation,
            None => self.certificates.reserve(module.name(), &signers)?,
        };

        {
            let mut loaded = self.loaded.lock();
            if loaded.contains_key(module.name()) {
                tracing::warn!(loader = %self.id(), module = module.name(), "duplicate definition refused");
                return Err(LoaderError::definition(module.name(), "duplicate module definition"));
            }
            loaded.insert(module.name().to_string(), module.clone());
        }

        if !signers.is_empty() {
            module.set_signers(signers);
        }
        reservation.commit();
        self.defined.lock().push(module.clone());
        self.record_domain(&domain);

        tracing::debug!(
            loader = %self.id(),
            module = module.name(),
            bytes = module.code_length(),
            domain = domain.id(),
            "defined module"
        );
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use entities_module_loading::{
        Certificate, CertificateSet, CodeSource, Module, BASE_LOADER_KIND,
    };

    use crate::collaborators::{DelegateOnly, ModuleDefiner, OpaqueModuleDefiner};
    use crate::config::LoaderConfig;
    use crate::context::LoaderContext;
    use crate::loader_node::LoaderNode;

    use super::*;

    fn node_with(definer: Arc<dyn ModuleDefiner>) -> Arc<LoaderNode> {
        let context = LoaderContext::builder(definer)
            .config(LoaderConfig::default())
            .build();
        LoaderNode::new(&BASE_LOADER_KIND, None, Arc::new(DelegateOnly), context).unwrap()
    }

    fn signed_domain(location: &str, signer: &str) -> Arc<ProtectionDomain> {
        let certificates: CertificateSet = [Certificate::new(signer.as_bytes())].into_iter().collect();
        Arc::new(ProtectionDomain::new(Some(CodeSource::new(Some(location.to_string()), certificates))))
    }

    /// Definer that ignores the requested name
    struct Renaming;

    impl ModuleDefiner for Renaming {
        fn define_from_bytes(&self, request: &DefinitionRequest<'_>) -> Result<ModuleHandle, LoaderError> {
            Ok(Module::new(
                "other.Name",
                request.defining_loader,
                request.protection_domain.clone(),
                request.code().len(),
            ))
        }
    }

    /// Definer that names the module after its bytes
    struct NameFromBytes;

    impl ModuleDefiner for NameFromBytes {
        fn define_from_bytes(&self, request: &DefinitionRequest<'_>) -> Result<ModuleHandle, LoaderError> {
            let name = String::from_utf8_lossy(request.code()).into_owned();
            Ok(Module::new(
                name,
                request.defining_loader,
                request.protection_domain.clone(),
                request.code().len(),
            ))
        }
    }

    #[test]
    fn test_define_with_default_domain() {
        let node = node_with(Arc::new(OpaqueModuleDefiner));
        let module = node.define(Some("pkg.A"), b"abc", 0..3, None).unwrap();
        assert_eq!(module.package(), "pkg");
        assert!(module.signers().is_none());
        assert_eq!(node.protection_domains().len(), 1);
        assert!(Arc::ptr_eq(module.protection_domain(), &node.protection_domains()[0]));

        node.define(Some("pkg.B"), b"abc", 0..3, None).unwrap();
        assert_eq!(node.protection_domains().len(), 1);
        assert_eq!(node.defined_packages(), vec!["pkg".to_string()]);
    }

    #[test]
    fn test_invalid_names_touch_nothing() {
        let node = node_with(Arc::new(OpaqueModuleDefiner));
        for name in ["a/B", "java.lang.Fake", "[I"] {
            let err = node.define(Some(name), b"x", 0..1, None).unwrap_err();
            assert!(matches!(err, LoaderError::InvalidName { .. }), "{name}");
        }
        assert!(node.defined_modules().is_empty());
        assert!(node.protection_domains().is_empty());
        assert!(node.defined_packages().is_empty());
    }

    #[test]
    fn test_range_outside_bytes() {
        let node = node_with(Arc::new(OpaqueModuleDefiner));
        assert!(matches!(
            node.define(Some("a.B"), b"abc", 1..9, None),
            Err(LoaderError::Definition { .. })
        ));
    }

    #[test]
    fn test_duplicate_definition_refused() {
        let node = node_with(Arc::new(OpaqueModuleDefiner));
        node.define(Some("a.B"), b"abc", 0..3, None).unwrap();
        let err = node.define(Some("a.B"), b"abc", 0..3, None).unwrap_err();
        assert!(matches!(err, LoaderError::Definition { .. }));
        assert_eq!(node.defined_modules().len(), 1);
    }

    #[test]
    fn test_signers_attached_and_enforced() {
        let node = node_with(Arc::new(OpaqueModuleDefiner));
        let alice = signed_domain("file:/alice.jar", "alice");
        let first = node.define(Some("sec.One"), b"1", 0..1, Some(alice.clone())).unwrap();
        assert_eq!(first.signers().map(CertificateSet::len), Some(1));

        let mallory = signed_domain("file:/mallory.jar", "mallory");
        let err = node.define(Some("sec.Two"), b"2", 0..1, Some(mallory)).unwrap_err();
        assert_eq!(
            err,
            LoaderError::SignerMismatch {
                module: "sec.Two".to_string(),
                package: "sec".to_string(),
            }
        );
        assert!(node.find_loaded_module("sec.Two").is_none());

        // Same signer from another code source is fine
        let alice_again = signed_domain("file:/alice-2.jar", "alice");
        node.define(Some("sec.Three"), b"3", 0..1, Some(alice_again)).unwrap();
        assert_eq!(node.protection_domains().len(), 2);
    }

    #[test]
    fn test_wrong_name_rolls_back() {
        let node = node_with(Arc::new(Renaming));
        let signed = signed_domain("file:/x.jar", "x");
        let err = node.define(Some("wanted.Name"), b"abc", 0..3, Some(signed)).unwrap_err();
        assert!(matches!(err, LoaderError::Definition { .. }));
        assert!(node.defined_modules().is_empty());
        assert!(node.find_loaded_module("other.Name").is_none());
        // The failed attempt left no signer set behind for the package
        assert!(node.certificates.certificates_for("wanted").is_none());

        // So the package can still be defined with a different signer
        let other = signed_domain("file:/y.jar", "y");
        let err = node.define(Some("wanted.Name"), b"abc", 0..3, Some(other)).unwrap_err();
        assert!(!matches!(err, LoaderError::SignerMismatch { .. }));
    }

    #[test]
    fn test_unnamed_definition_takes_definer_name() {
        let node = node_with(Arc::new(NameFromBytes));
        let module = node.define(None, b"anon.Gen", 0..8, None).unwrap();
        assert_eq!(module.name(), "anon.Gen");
        assert!(node.find_loaded_module("anon.Gen").is_some());

        let err = node.define(None, b"anon.Gen", 0..8, None).unwrap_err();
        assert!(matches!(err, LoaderError::Definition { .. }));
        let err = node.define(None, b"java.Evil", 0..9, None).unwrap_err();
        assert!(matches!(err, LoaderError::InvalidName { .. }));
    }

    #[test]
    fn test_unnamed_definition_joins_signed_package() {
        let node = node_with(Arc::new(NameFromBytes));
        node.define(Some("sec.One"), b"sec.One", 0..7, Some(signed_domain("file:/a.jar", "alice")))
            .unwrap();

        let mallory = signed_domain("file:/m.jar", "mallory");
        let err = node.define(None, b"sec.Two", 0..7, Some(mallory)).unwrap_err();
        assert_eq!(
            err,
            LoaderError::SignerMismatch {
                module: "sec.Two".to_string(),
                package: "sec".to_string(),
            }
        );
        assert!(node.find_loaded_module("sec.Two").is_none());

        let alice = signed_domain("file:/a2.jar", "alice");
        let module = node.define(None, b"sec.Two", 0..7, Some(alice)).unwrap();
        assert_eq!(module.signers().map(CertificateSet::len), Some(1));
    }

    #[test]
    fn test_unnamed_definition_registers_package_signers() {
        let node = node_with(Arc::new(NameFromBytes));
        let alice = signed_domain("file:/a.jar", "alice");
        node.define(None, b"sec.One", 0..7, Some(alice)).unwrap();
        assert_eq!(node.defined_packages(), vec!["sec".to_string()]);

        let mallory = signed_domain("file:/m.jar", "mallory");
        let err = node.define(Some("sec.Two"), b"sec.Two", 0..7, Some(mallory)).unwrap_err();
        assert!(matches!(err, LoaderError::SignerMismatch { .. }));
        assert!(node.find_loaded_module("sec.Two").is_none());
    }

    #[test]
    fn test_unnamed_definition_keeps_unsigned_package_unsigned() {
        let node = node_with(Arc::new(NameFromBytes));
        node.define(None, b"plain.One", 0..9, None).unwrap();
        let signed = signed_domain("file:/x.jar", "x");
        let err = node.define(None, b"plain.Two", 0..9, Some(signed)).unwrap_err();
        assert!(matches!(err, LoaderError::SignerMismatch { .. }));
        assert_eq!(node.defined_modules().len(), 1);
    }

    #[test]
    fn test_reserved_prefix_override() {
        let context = LoaderContext::builder(Arc::new(OpaqueModuleDefiner))
            .config(LoaderConfig::default().allow_reserved_prefix(true))
            .build();
        let node = LoaderNode::new(&BASE_LOADER_KIND, None, Arc::new(DelegateOnly), context).unwrap();
        assert!(node.define(Some("java.lang.Patched"), b"x", 0..1, None).is_ok());
    }
}
