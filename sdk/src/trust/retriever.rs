// Copyright 2024 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use std::collections::HashSet;

use pdfsig_crypto::{
    certificate::{fingerprint, is_self_signed, Certificate, CertificateRef},
    crl::Crl,
    ocsp::ResponderId,
};

use super::{CertificateSet, TrustedCertificatesStore};

/// Finds issuer certificates among known and trusted certificates.
///
/// Known certificates only help complete chains; being known never makes
/// a certificate trusted.
#[derive(Clone, Debug, Default)]
pub struct IssuingCertificateRetriever {
    known: CertificateSet,
    trusted: TrustedCertificatesStore,
}

impl IssuingCertificateRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trusted_store(trusted: TrustedCertificatesStore) -> Self {
        Self {
            known: CertificateSet::default(),
            trusted,
        }
    }

    pub fn add_known_certificates<I>(&mut self, certificates: I)
    where
        I: IntoIterator<Item = CertificateRef>,
    {
        for cert in certificates {
            self.known.insert(cert);
        }
    }

    /// Adds certificates trusted for every purpose.
    pub fn add_trusted_certificates<I>(&mut self, certificates: I)
    where
        I: IntoIterator<Item = CertificateRef>,
    {
        self.trusted.add_generally_trusted_certificates(certificates);
    }

    pub fn trusted_store(&self) -> &TrustedCertificatesStore {
        &self.trusted
    }

    pub fn trusted_store_mut(&mut self) -> &mut TrustedCertificatesStore {
        &mut self.trusted
    }

    pub fn is_certificate_trusted(&self, certificate: &dyn Certificate) -> bool {
        self.trusted.is_generally_trusted(certificate)
    }

    /// Certificates whose subject is `certificate`'s issuer, known ones first.
    ///
    /// Signatures are not checked here.
    pub fn retrieve_issuer_certificates(
        &self,
        certificate: &dyn Certificate,
    ) -> Vec<CertificateRef> {
        self.by_subject(certificate.issuer())
    }

    /// Certificates whose subject is the CRL's issuer, known ones first.
    pub fn retrieve_crl_issuer_certificates(&self, crl: &dyn Crl) -> Vec<CertificateRef> {
        self.by_subject(crl.issuer())
    }

    /// Certificates trusted for OCSP signing that `responder_id` names.
    pub fn retrieve_ocsp_responder_certificates(
        &self,
        responder_id: &ResponderId,
    ) -> Vec<CertificateRef> {
        self.trusted
            .certificates(super::TrustClass::Ocsp)
            .filter(|cert| responder_id.matches(cert.as_ref()))
            .cloned()
            .collect()
    }

    /// Follows verified issuers upward from `certificate` and returns the
    /// last certificate reached.
    ///
    /// The walk ends at a self-signed or trusted certificate, or where no
    /// issuer verifies. Returns `None` if it runs into a loop.
    pub fn retrieve_root(&self, certificate: &CertificateRef) -> Option<CertificateRef> {
        let mut current = certificate.clone();
        let mut visited = HashSet::new();

        loop {
            if !visited.insert(fingerprint(current.as_ref())) {
                return None;
            }

            if is_self_signed(current.as_ref()) || self.trusted.is_trusted(current.as_ref()) {
                return Some(current);
            }

            let next = self
                .retrieve_issuer_certificates(current.as_ref())
                .into_iter()
                .find(|issuer| current.verify(issuer.as_ref()));

            match next {
                Some(issuer) => current = issuer,
                None => return Some(current),
            }
        }
    }

    fn by_subject(&self, subject: &str) -> Vec<CertificateRef> {
        let mut found = CertificateSet::default();

        for cert in self.known.iter().filter(|c| c.subject() == subject) {
            found.insert(cert.clone());
        }

        for cert in self.trusted.certificates_by_subject(subject) {
            found.insert(cert);
        }

        found.iter().cloned().collect()
    }
}
