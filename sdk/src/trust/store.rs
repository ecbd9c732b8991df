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

use std::{
    collections::{HashMap, HashSet},
    fmt::{self, Display, Formatter},
};

use pdfsig_crypto::certificate::{fingerprint, Certificate, CertificateRef};

/// What a trusted certificate may be relied on for.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TrustClass {
    /// Trusted for every purpose.
    Generic,

    /// Trusted to issue certificates.
    Ca,

    /// Trusted to sign OCSP responses.
    Ocsp,

    /// Trusted to sign CRLs.
    Crl,

    /// Trusted to sign timestamps.
    Timestamp,
}

impl TrustClass {
    pub const ALL: [TrustClass; 5] = [
        TrustClass::Generic,
        TrustClass::Ca,
        TrustClass::Ocsp,
        TrustClass::Crl,
        TrustClass::Timestamp,
    ];
}

impl Display for TrustClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrustClass::Generic => "any purpose",
            TrustClass::Ca => "certificate generation",
            TrustClass::Ocsp => "OCSP response generation",
            TrustClass::Crl => "CRL generation",
            TrustClass::Timestamp => "timestamp generation",
        })
    }
}

/// Insertion-ordered set of certificates keyed by fingerprint.
#[derive(Clone, Debug, Default)]
pub(crate) struct CertificateSet {
    certificates: Vec<CertificateRef>,
    fingerprints: HashSet<String>,
}

impl CertificateSet {
    /// Returns `false` if the certificate was already present.
    pub(crate) fn insert(&mut self, certificate: CertificateRef) -> bool {
        if self.fingerprints.insert(fingerprint(certificate.as_ref())) {
            self.certificates.push(certificate);
            true
        } else {
            false
        }
    }

    pub(crate) fn contains(&self, certificate: &dyn Certificate) -> bool {
        self.fingerprints.contains(&fingerprint(certificate))
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, CertificateRef> {
        self.certificates.iter()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }
}

/// Trusted certificates grouped by what they are trusted for.
///
/// Certificates are identified by fingerprint, so adding the same
/// certificate twice to one class has no effect. A certificate may sit in
/// several classes at once.
#[derive(Clone, Debug, Default)]
pub struct TrustedCertificatesStore {
    classes: HashMap<TrustClass, CertificateSet>,
}

impl TrustedCertificatesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_certificates<I>(&mut self, class: TrustClass, certificates: I)
    where
        I: IntoIterator<Item = CertificateRef>,
    {
        let entries = self.classes.entry(class).or_default();
        for cert in certificates {
            entries.insert(cert);
        }
    }

    pub fn add_generally_trusted_certificates<I>(&mut self, certificates: I)
    where
        I: IntoIterator<Item = CertificateRef>,
    {
        self.add_certificates(TrustClass::Generic, certificates);
    }

    pub fn add_ca_trusted_certificates<I>(&mut self, certificates: I)
    where
        I: IntoIterator<Item = CertificateRef>,
    {
        self.add_certificates(TrustClass::Ca, certificates);
    }

    pub fn add_ocsp_trusted_certificates<I>(&mut self, certificates: I)
    where
        I: IntoIterator<Item = CertificateRef>,
    {
        self.add_certificates(TrustClass::Ocsp, certificates);
    }

    pub fn add_crl_trusted_certificates<I>(&mut self, certificates: I)
    where
        I: IntoIterator<Item = CertificateRef>,
    {
        self.add_certificates(TrustClass::Crl, certificates);
    }

    pub fn add_timestamp_trusted_certificates<I>(&mut self, certificates: I)
    where
        I: IntoIterator<Item = CertificateRef>,
    {
        self.add_certificates(TrustClass::Timestamp, certificates);
    }

    /// Returns `true` if the certificate is in `class`.
    pub fn is_trusted_for(&self, class: TrustClass, certificate: &dyn Certificate) -> bool {
        self.classes
            .get(&class)
            .is_some_and(|entries| entries.contains(certificate))
    }

    pub fn is_generally_trusted(&self, certificate: &dyn Certificate) -> bool {
        self.is_trusted_for(TrustClass::Generic, certificate)
    }

    pub fn is_ca_trusted(&self, certificate: &dyn Certificate) -> bool {
        self.is_trusted_for(TrustClass::Ca, certificate)
    }

    pub fn is_ocsp_trusted(&self, certificate: &dyn Certificate) -> bool {
        self.is_trusted_for(TrustClass::Ocsp, certificate)
    }

    pub fn is_crl_trusted(&self, certificate: &dyn Certificate) -> bool {
        self.is_trusted_for(TrustClass::Crl, certificate)
    }

    pub fn is_timestamp_trusted(&self, certificate: &dyn Certificate) -> bool {
        self.is_trusted_for(TrustClass::Timestamp, certificate)
    }

    /// Returns `true` if the certificate is in any class.
    pub fn is_trusted(&self, certificate: &dyn Certificate) -> bool {
        self.classes.values().any(|entries| entries.contains(certificate))
    }

    /// Certificates in `class`.
    pub fn certificates(&self, class: TrustClass) -> impl Iterator<Item = &CertificateRef> {
        self.classes
            .get(&class)
            .into_iter()
            .flat_map(CertificateSet::iter)
    }

    /// Trusted certificates of any class whose subject is `subject`, each
    /// listed once.
    pub fn certificates_by_subject(&self, subject: &str) -> Vec<CertificateRef> {
        let mut found = CertificateSet::default();

        for class in TrustClass::ALL {
            for cert in self.certificates(class) {
                if cert.subject() == subject {
                    found.insert(cert.clone());
                }
            }
        }

        found.certificates
    }

    pub fn is_empty(&self) -> bool {
        self.classes.values().all(CertificateSet::is_empty)
    }
}
