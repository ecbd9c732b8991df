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

//! End to end validation through the public API, configured from a
//! settings file.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use pdfsig::{
    chain_validator::EXTENSION_MISSING,
    crypto::{
        certificate::{CertificateRef, KeyUsage},
        ocsp::BasicOcspResponse,
        test_utils::{TestCertificate, TestCrl, TestDecoder, TestOcspResponse},
    },
    document::{DocumentRevision, RevisionReader},
    format_message,
    revocation::{crl_validator::FRESHNESS_CHECK, SuppliedRevocationData},
    settings::Settings,
    signature::{Dss, PdfSignature, SignedDocument, TimeStampToken, VALIDATING_SIGNATURE},
    CertificateSource, Result, TimeBasedContext, ValidationContext, ValidationReport,
    ValidationResult, ValidatorChain, ValidatorContext,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

struct Pki {
    root: CertificateRef,
    signer: CertificateRef,
}

impl Pki {
    fn new() -> Self {
        let root = TestCertificate::builder("CN=Integration Root").ca(None).build();
        let signer = TestCertificate::builder("CN=Integration Signer")
            .issued_by(root.as_ref())
            .serial(7)
            .key_usage(KeyUsage::DIGITAL_SIGNATURE | KeyUsage::NON_REPUDIATION)
            .build();
        Self { root, signer }
    }

    /// A chain configured from the settings fixture that trusts the root.
    fn chain(&self) -> ValidatorChain {
        let settings = Settings::from_toml(include_str!("fixtures/settings.toml")).unwrap();

        ValidatorChain::builder()
            .properties(settings.validation_properties().unwrap())
            .validate_document_revisions(settings.validation.validate_document_revisions)
            .trusted_certificates([self.root.clone()])
            .decoder(Arc::new(TestDecoder))
            .current_time(now())
            .build()
    }
}

fn signer_context() -> ValidationContext {
    ValidationContext::new(
        ValidatorContext::SignatureValidator,
        CertificateSource::SignerCert,
        TimeBasedContext::Present,
    )
}

fn failures(report: &ValidationReport) -> Vec<String> {
    report.failures().map(|item| item.message.to_string()).collect()
}

#[derive(Debug)]
struct Signature {
    name: String,
    signer: CertificateRef,
    root: CertificateRef,
}

impl PdfSignature for Signature {
    fn name(&self) -> &str {
        &self.name
    }

    fn covers_whole_document(&self) -> bool {
        true
    }

    fn verify_integrity(&self) -> Result<bool> {
        Ok(true)
    }

    fn signing_certificate(&self) -> Option<CertificateRef> {
        Some(self.signer.clone())
    }

    fn certificates(&self) -> Vec<CertificateRef> {
        vec![self.signer.clone(), self.root.clone()]
    }

    fn is_document_timestamp(&self) -> bool {
        false
    }

    fn timestamp_token(&self) -> Option<Arc<dyn TimeStampToken>> {
        None
    }
}

#[derive(Debug, Default)]
struct Document {
    signatures: Vec<Arc<Signature>>,
    dss: Dss,
}

impl RevisionReader for Document {
    fn all_revisions(&self) -> Result<Vec<DocumentRevision>> {
        Ok(Vec::new())
    }
}

impl SignedDocument for Document {
    fn signatures(&self) -> Result<Vec<Arc<dyn PdfSignature>>> {
        Ok(self
            .signatures
            .iter()
            .map(|s| s.clone() as Arc<dyn PdfSignature>)
            .collect())
    }

    fn dss(&self) -> Dss {
        self.dss.clone()
    }
}

#[test]
fn certificate_with_supplied_crl() {
    init_logging();
    let pki = Pki::new();
    let chain = pki.chain();

    let mut supplied = SuppliedRevocationData::new();
    supplied.add_crl(TestCrl::builder(pki.root.as_ref(), now() - TimeDelta::days(1)).build());

    let report = chain
        .with_supplied_revocation_data(supplied)
        .validate_certificate(&signer_context(), &pki.signer, now());

    assert_eq!(report.validation_result(), ValidationResult::Valid, "{report}");
}

#[test]
fn configured_crl_freshness_applies() {
    init_logging();
    let pki = Pki::new();
    let this_update = now() - TimeDelta::days(10);

    let mut supplied = SuppliedRevocationData::new();
    supplied.add_crl(TestCrl::builder(pki.root.as_ref(), this_update).build());

    let report = pki
        .chain()
        .with_supplied_revocation_data(supplied)
        .validate_certificate(&signer_context(), &pki.signer, now());

    // a stale CRL leaves the status open, it does not revoke
    assert_eq!(report.validation_result(), ValidationResult::Indeterminate);
    assert!(failures(&report).contains(&format_message(
        FRESHNESS_CHECK,
        &[&this_update, &now(), &TimeDelta::days(7)]
    )));
}

#[test]
fn configured_extension_requirement() {
    init_logging();
    let pki = Pki::new();
    let signer = TestCertificate::builder("CN=Approver")
        .issued_by(pki.root.as_ref())
        .serial(8)
        .key_usage(KeyUsage::DIGITAL_SIGNATURE)
        .build();

    let mut supplied = SuppliedRevocationData::new();
    supplied.add_crl(TestCrl::builder(pki.root.as_ref(), now() - TimeDelta::days(1)).build());

    let report = pki
        .chain()
        .with_supplied_revocation_data(supplied)
        .validate_certificate(&signer_context(), &signer, now());

    assert_eq!(report.validation_result(), ValidationResult::Invalid);
    assert_eq!(
        failures(&report),
        vec![format_message(EXTENSION_MISSING, &[&"key_usage:nonRepudiation"])]
    );
}

#[test]
fn signed_document_with_ocsp_in_dss() {
    init_logging();
    let pki = Pki::new();

    let produced_at = now() - TimeDelta::hours(1);
    let ocsp = TestOcspResponse::builder(pki.root.as_ref(), produced_at)
        .good(pki.signer.as_ref(), produced_at)
        .build();

    let document = Document {
        signatures: vec![Arc::new(Signature {
            name: "Signature1".to_string(),
            signer: pki.signer.clone(),
            root: pki.root.clone(),
        })],
        dss: Dss {
            ocsp_responses: vec![ocsp.encoded().to_vec()],
            ..Default::default()
        },
    };

    let report = pki
        .chain()
        .signature_validator()
        .validate_signatures(&document);

    assert_eq!(report.validation_result(), ValidationResult::Valid, "{report}");
    assert!(report
        .logs()
        .iter()
        .any(|item| item.message == format_message(VALIDATING_SIGNATURE, &[&"Signature1"])));
}

#[test]
fn signed_document_without_revocation_data() {
    init_logging();
    let pki = Pki::new();

    let document = Document {
        signatures: vec![Arc::new(Signature {
            name: "Signature1".to_string(),
            signer: pki.signer.clone(),
            root: pki.root.clone(),
        })],
        ..Default::default()
    };

    // online fetching is off in the settings, so nothing can settle the
    // signer's status
    let report = pki
        .chain()
        .signature_validator()
        .validate_latest_signature(&document);

    assert_eq!(report.validation_result(), ValidationResult::Indeterminate);
}
