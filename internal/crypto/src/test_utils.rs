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

//! In-memory certificates, CRLs and OCSP responses for tests.
//!
//! Keys are modeled as opaque key ids: an object "signed by" key `k`
//! verifies against any certificate whose public key is `k`. The
//! encoded form of every object is its JSON serialization, which
//! [`TestDecoder`] reads back.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    certificate::{BasicConstraints, Certificate, CertificateRef, KeyUsage},
    crl::{Crl, CrlRef, CrlReason, IssuingDistributionPoint, RevokedCertificate},
    decoder::RevocationDecoder,
    ocsp::{BasicOcspResponse, CertStatus, OcspResponseRef, ResponderId, SingleResponse},
    CryptoError,
};

fn default_not_before() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()
}

fn default_not_after() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap()
}

fn key_of(cert: &dyn Certificate) -> String {
    String::from_utf8_lossy(cert.public_key()).into_owned()
}

/// Certificate with a JSON encoding.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TestCertificate {
    subject: String,
    issuer: String,
    serial_number: Vec<u8>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    key_id: String,
    signed_by: String,
    key_usage: Option<KeyUsage>,
    extended_key_usage: Option<Vec<String>>,
    basic_constraints: Option<BasicConstraints>,
    extensions: Vec<String>,
    crl_distribution_points: Vec<String>,
    ocsp_urls: Vec<String>,

    #[serde(skip)]
    encoded: Vec<u8>,
}

impl TestCertificate {
    /// Starts a self-signed certificate for `subject`.
    pub fn builder(subject: &str) -> CertificateBuilder {
        CertificateBuilder {
            cert: TestCertificate {
                subject: subject.to_string(),
                issuer: subject.to_string(),
                serial_number: vec![1],
                not_before: default_not_before(),
                not_after: default_not_after(),
                key_id: format!("key:{subject}"),
                signed_by: format!("key:{subject}"),
                key_usage: None,
                extended_key_usage: None,
                basic_constraints: None,
                extensions: Vec::new(),
                crl_distribution_points: Vec::new(),
                ocsp_urls: Vec::new(),
                encoded: Vec::new(),
            },
        }
    }

    fn finish(mut self) -> Self {
        self.encoded = serde_json::to_vec(&self).unwrap();
        self
    }
}

impl Certificate for TestCertificate {
    fn encoded(&self) -> &[u8] {
        &self.encoded
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
        self.key_id.as_bytes()
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
        self.extensions.iter().any(|e| e == oid)
    }

    fn crl_distribution_points(&self) -> Vec<String> {
        self.crl_distribution_points.clone()
    }

    fn ocsp_responder_urls(&self) -> Vec<String> {
        self.ocsp_urls.clone()
    }

    fn verify(&self, issuer: &dyn Certificate) -> bool {
        issuer.public_key() == self.signed_by.as_bytes()
    }
}

pub struct CertificateBuilder {
    cert: TestCertificate,
}

impl CertificateBuilder {
    /// Makes `issuer` the issuer and signer of the certificate.
    pub fn issued_by(mut self, issuer: &dyn Certificate) -> Self {
        self.cert.issuer = issuer.subject().to_string();
        self.cert.signed_by = key_of(issuer);
        self
    }

    /// Names an issuer without a matching signature.
    pub fn issuer_name(mut self, issuer: &str) -> Self {
        self.cert.issuer = issuer.to_string();
        self
    }

    pub fn signed_by_key(mut self, key_id: &str) -> Self {
        self.cert.signed_by = key_id.to_string();
        self
    }

    pub fn key_id(mut self, key_id: &str) -> Self {
        if self.cert.signed_by == self.cert.key_id {
            self.cert.signed_by = key_id.to_string();
        }
        self.cert.key_id = key_id.to_string();
        self
    }

    pub fn serial(mut self, serial: u64) -> Self {
        let bytes = serial.to_be_bytes();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(7);
        self.cert.serial_number = bytes[first..].to_vec();
        self
    }

    pub fn validity(mut self, not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> Self {
        self.cert.not_before = not_before;
        self.cert.not_after = not_after;
        self
    }

    pub fn key_usage(mut self, key_usage: KeyUsage) -> Self {
        self.cert.key_usage = Some(key_usage);
        self
    }

    pub fn extended_key_usage(mut self, purposes: &[&str]) -> Self {
        self.cert.extended_key_usage = Some(purposes.iter().map(|p| p.to_string()).collect());
        self
    }

    /// Marks the certificate as a CA with `keyCertSign` and `cRLSign`.
    pub fn ca(mut self, path_len_constraint: Option<u32>) -> Self {
        self.cert.basic_constraints = Some(BasicConstraints {
            ca: true,
            path_len_constraint,
        });
        self.cert.key_usage = Some(KeyUsage::KEY_CERT_SIGN | KeyUsage::CRL_SIGN);
        self
    }

    pub fn basic_constraints(mut self, basic_constraints: BasicConstraints) -> Self {
        self.cert.basic_constraints = Some(basic_constraints);
        self
    }

    pub fn extension(mut self, oid: &str) -> Self {
        self.cert.extensions.push(oid.to_string());
        self
    }

    pub fn crl_distribution_point(mut self, url: &str) -> Self {
        self.cert.crl_distribution_points.push(url.to_string());
        self
    }

    pub fn ocsp_url(mut self, url: &str) -> Self {
        self.cert.ocsp_urls.push(url.to_string());
        self
    }

    pub fn build(self) -> CertificateRef {
        Arc::new(self.cert.finish())
    }
}

/// CRL with a JSON encoding.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TestCrl {
    issuer: String,
    signed_by: String,
    this_update: DateTime<Utc>,
    next_update: Option<DateTime<Utc>>,
    revoked: Vec<RevokedCertificate>,
    issuing_distribution_point: Option<IssuingDistributionPoint>,
    expired_certs_on_crl: Option<DateTime<Utc>>,

    #[serde(skip)]
    encoded: Vec<u8>,
}

impl TestCrl {
    /// Starts a CRL issued and signed by `issuer`.
    pub fn builder(issuer: &dyn Certificate, this_update: DateTime<Utc>) -> CrlBuilder {
        CrlBuilder {
            crl: TestCrl {
                issuer: issuer.subject().to_string(),
                signed_by: key_of(issuer),
                this_update,
                next_update: None,
                revoked: Vec::new(),
                issuing_distribution_point: None,
                expired_certs_on_crl: None,
                encoded: Vec::new(),
            },
        }
    }
}

impl Crl for TestCrl {
    fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    fn issuer(&self) -> &str {
        &self.issuer
    }

    fn this_update(&self) -> DateTime<Utc> {
        self.this_update
    }

    fn next_update(&self) -> Option<DateTime<Utc>> {
        self.next_update
    }

    fn revoked_certificate(&self, serial_number: &[u8]) -> Option<RevokedCertificate> {
        self.revoked
            .iter()
            .find(|r| r.serial_number == serial_number)
            .cloned()
    }

    fn issuing_distribution_point(&self) -> Option<IssuingDistributionPoint> {
        self.issuing_distribution_point.clone()
    }

    fn expired_certs_on_crl(&self) -> Option<DateTime<Utc>> {
        self.expired_certs_on_crl
    }

    fn verify(&self, issuer: &dyn Certificate) -> bool {
        issuer.public_key() == self.signed_by.as_bytes()
    }
}

pub struct CrlBuilder {
    crl: TestCrl,
}

impl CrlBuilder {
    pub fn next_update(mut self, next_update: DateTime<Utc>) -> Self {
        self.crl.next_update = Some(next_update);
        self
    }

    pub fn revoke(self, cert: &dyn Certificate, revocation_date: DateTime<Utc>) -> Self {
        self.revoke_with_reason(cert, revocation_date, None)
    }

    pub fn revoke_with_reason(
        mut self,
        cert: &dyn Certificate,
        revocation_date: DateTime<Utc>,
        reason: Option<CrlReason>,
    ) -> Self {
        self.crl.revoked.push(RevokedCertificate {
            serial_number: cert.serial_number().to_vec(),
            revocation_date,
            reason,
        });
        self
    }

    pub fn issuing_distribution_point(mut self, idp: IssuingDistributionPoint) -> Self {
        self.crl.issuing_distribution_point = Some(idp);
        self
    }

    pub fn expired_certs_on_crl(mut self, cutoff: DateTime<Utc>) -> Self {
        self.crl.expired_certs_on_crl = Some(cutoff);
        self
    }

    pub fn signed_by_key(mut self, key_id: &str) -> Self {
        self.crl.signed_by = key_id.to_string();
        self
    }

    pub fn build(mut self) -> Arc<TestCrl> {
        self.crl.encoded = serde_json::to_vec(&self.crl).unwrap();
        Arc::new(self.crl)
    }
}

/// OCSP basic response with a JSON encoding.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TestOcspResponse {
    responder_id: ResponderId,
    signed_by: String,
    produced_at: DateTime<Utc>,
    responses: Vec<SingleResponse>,
    embedded: Vec<TestCertificate>,

    #[serde(skip)]
    certificates: Vec<CertificateRef>,

    #[serde(skip)]
    encoded: Vec<u8>,
}

impl TestOcspResponse {
    /// Starts a response produced and signed by `responder`.
    pub fn builder(responder: &dyn Certificate, produced_at: DateTime<Utc>) -> OcspBuilder {
        OcspBuilder {
            response: TestOcspResponse {
                responder_id: ResponderId::ByName(responder.subject().to_string()),
                signed_by: key_of(responder),
                produced_at,
                responses: Vec::new(),
                embedded: Vec::new(),
                certificates: Vec::new(),
                encoded: Vec::new(),
            },
        }
    }

    fn restore_certificates(&mut self) {
        self.certificates = self
            .embedded
            .iter()
            .map(|c| Arc::new(c.clone().finish()) as CertificateRef)
            .collect();
    }
}

impl BasicOcspResponse for TestOcspResponse {
    fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    fn responder_id(&self) -> &ResponderId {
        &self.responder_id
    }

    fn produced_at(&self) -> DateTime<Utc> {
        self.produced_at
    }

    fn responses(&self) -> &[SingleResponse] {
        &self.responses
    }

    fn certificates(&self) -> &[CertificateRef] {
        &self.certificates
    }

    fn verify(&self, responder: &dyn Certificate) -> bool {
        responder.public_key() == self.signed_by.as_bytes()
    }
}

pub struct OcspBuilder {
    response: TestOcspResponse,
}

impl OcspBuilder {
    /// Adds a single response for `cert`.
    pub fn status(
        mut self,
        cert: &dyn Certificate,
        cert_status: CertStatus,
        this_update: DateTime<Utc>,
        next_update: Option<DateTime<Utc>>,
    ) -> Self {
        self.response.responses.push(SingleResponse {
            serial_number: cert.serial_number().to_vec(),
            issuer_name_hash: None,
            cert_status,
            this_update,
            next_update,
        });
        self
    }

    pub fn good(self, cert: &dyn Certificate, this_update: DateTime<Utc>) -> Self {
        self.status(cert, CertStatus::Good, this_update, None)
    }

    pub fn revoked(
        self,
        cert: &dyn Certificate,
        this_update: DateTime<Utc>,
        revocation_time: DateTime<Utc>,
    ) -> Self {
        self.status(
            cert,
            CertStatus::Revoked {
                revocation_time,
                reason: None,
            },
            this_update,
            None,
        )
    }

    /// Embeds a certificate built by [`TestCertificate::builder`].
    pub fn embed(mut self, cert: &CertificateRef) -> Self {
        if let Ok(c) = serde_json::from_slice::<TestCertificate>(cert.encoded()) {
            self.response.embedded.push(c);
        }
        self
    }

    pub fn responder_id(mut self, responder_id: ResponderId) -> Self {
        self.response.responder_id = responder_id;
        self
    }

    pub fn signed_by_key(mut self, key_id: &str) -> Self {
        self.response.signed_by = key_id.to_string();
        self
    }

    pub fn build(mut self) -> Arc<TestOcspResponse> {
        self.response.encoded = serde_json::to_vec(&self.response).unwrap();
        self.response.restore_certificates();
        Arc::new(self.response)
    }
}

/// Reads back the JSON encodings produced by this module.
#[derive(Debug, Default)]
pub struct TestDecoder;

impl RevocationDecoder for TestDecoder {
    fn decode_crl(&self, encoded: &[u8]) -> Result<CrlRef, CryptoError> {
        let mut crl: TestCrl = serde_json::from_slice(encoded)
            .map_err(|e| CryptoError::InvalidCrl(e.to_string()))?;
        crl.encoded = encoded.to_vec();
        Ok(Arc::new(crl))
    }

    fn decode_ocsp_response(&self, encoded: &[u8]) -> Result<OcspResponseRef, CryptoError> {
        let mut response: TestOcspResponse = serde_json::from_slice(encoded)
            .map_err(|e| CryptoError::InvalidOcspResponse(e.to_string()))?;
        response.encoded = encoded.to_vec();
        response.restore_certificates();
        Ok(Arc::new(response))
    }
}
