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

use chrono::{DateTime, Utc};
use x509_parser::{extensions::ParsedExtension, prelude::*};

use super::{serial_magnitude, timestamp_to_utc};
use crate::{
    certificate::{BasicConstraints, Certificate, KeyUsage},
    oids, CryptoError,
};

/// A DER certificate with its commonly used fields extracted up front.
#[derive(Clone, Debug)]
pub struct X509Cert {
    der: Vec<u8>,
    subject: String,
    issuer: String,
    serial_number: Vec<u8>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    public_key: Vec<u8>,
    key_usage: Option<KeyUsage>,
    extended_key_usage: Option<Vec<String>>,
    basic_constraints: Option<BasicConstraints>,
    extension_oids: Vec<String>,
    crl_distribution_points: Vec<String>,
    ocsp_responder_urls: Vec<String>,
}

impl X509Cert {
    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        let (_rem, cert) = X509Certificate::from_der(der)
            .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;

        let not_before = timestamp_to_utc(cert.validity().not_before.timestamp())
            .map_err(CryptoError::InvalidCertificate)?;
        let not_after = timestamp_to_utc(cert.validity().not_after.timestamp())
            .map_err(CryptoError::InvalidCertificate)?;

        let key_usage = cert.key_usage().ok().flatten().map(|ext| {
            let ku = ext.value;
            [
                (ku.digital_signature(), KeyUsage::DIGITAL_SIGNATURE),
                (ku.non_repudiation(), KeyUsage::NON_REPUDIATION),
                (ku.key_encipherment(), KeyUsage::KEY_ENCIPHERMENT),
                (ku.data_encipherment(), KeyUsage::DATA_ENCIPHERMENT),
                (ku.key_agreement(), KeyUsage::KEY_AGREEMENT),
                (ku.key_cert_sign(), KeyUsage::KEY_CERT_SIGN),
                (ku.crl_sign(), KeyUsage::CRL_SIGN),
                (ku.encipher_only(), KeyUsage::ENCIPHER_ONLY),
                (ku.decipher_only(), KeyUsage::DECIPHER_ONLY),
            ]
            .into_iter()
            .filter(|(set, _)| *set)
            .fold(KeyUsage::empty(), |acc, (_, bit)| acc | bit)
        });

        let extended_key_usage = cert.extended_key_usage().ok().flatten().map(|ext| {
            let eku = ext.value;
            let mut purposes: Vec<String> = [
                (eku.any, oids::ANY_EXTENDED_KEY_USAGE),
                (eku.server_auth, oids::SERVER_AUTH),
                (eku.client_auth, oids::CLIENT_AUTH),
                (eku.code_signing, oids::CODE_SIGNING),
                (eku.email_protection, oids::EMAIL_PROTECTION),
                (eku.time_stamping, oids::TIME_STAMPING),
                (eku.ocsp_signing, oids::OCSP_SIGNING),
            ]
            .into_iter()
            .filter(|(set, _)| *set)
            .map(|(_, oid)| oid.to_string())
            .collect();

            purposes.extend(eku.other.iter().map(|oid| oid.to_id_string()));
            purposes
        });

        let basic_constraints = cert
            .basic_constraints()
            .ok()
            .flatten()
            .map(|ext| BasicConstraints {
                ca: ext.value.ca,
                path_len_constraint: ext.value.path_len_constraint,
            });

        let mut crl_distribution_points = Vec::new();
        let mut ocsp_responder_urls = Vec::new();

        for ext in cert.extensions() {
            match ext.parsed_extension() {
                ParsedExtension::CRLDistributionPoints(points) => {
                    for point in points.points.iter() {
                        if let Some(DistributionPointName::FullName(names)) =
                            &point.distribution_point
                        {
                            for name in names {
                                if let GeneralName::URI(uri) = name {
                                    crl_distribution_points.push(uri.to_string());
                                }
                            }
                        }
                    }
                }
                ParsedExtension::AuthorityInfoAccess(aia) => {
                    for ad in &aia.accessdescs {
                        if let GeneralName::URI(uri) = ad.access_location {
                            if ad.access_method.to_id_string() == oids::AD_OCSP {
                                ocsp_responder_urls.push(uri.to_string());
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(Self {
            der: der.to_vec(),
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            serial_number: serial_magnitude(cert.raw_serial()),
            not_before,
            not_after,
            public_key: cert.public_key().subject_public_key.data.to_vec(),
            key_usage,
            extended_key_usage,
            basic_constraints,
            extension_oids: cert
                .extensions()
                .iter()
                .map(|ext| ext.oid.to_id_string())
                .collect(),
            crl_distribution_points,
            ocsp_responder_urls,
        })
    }
}

impl Certificate for X509Cert {
    fn encoded(&self) -> &[u8] {
        &self.der
    }

    fn subject(&self) -> &str {
        &self.subject
    }

    fn issuer(&self) -> &str {
        &self.issuer
    }

    fn serial_number(&self) -> &[u8] {
        &self.serial_number
    }

    fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    fn key_usage(&self) -> Option<KeyUsage> {
        self.key_usage
    }

    fn extended_key_usage(&self) -> Option<Vec<String>> {
        self.extended_key_usage.clone()
    }

    fn basic_constraints(&self) -> Option<BasicConstraints> {
        self.basic_constraints
    }

    fn has_extension(&self, oid: &str) -> bool {
        self.extension_oids.iter().any(|o| o == oid)
    }

    fn crl_distribution_points(&self) -> Vec<String> {
        self.crl_distribution_points.clone()
    }

    fn ocsp_responder_urls(&self) -> Vec<String> {
        self.ocsp_responder_urls.clone()
    }

    fn verify(&self, issuer: &dyn Certificate) -> bool {
        let Ok((_, cert)) = X509Certificate::from_der(&self.der) else {
            return false;
        };
        let Ok((_, issuer)) = X509Certificate::from_der(issuer.encoded()) else {
            return false;
        };

        cert.verify_signature(Some(issuer.public_key())).is_ok()
    }
}
