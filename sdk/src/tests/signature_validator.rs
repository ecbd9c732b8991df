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

use std::sync::Arc;

use chrono::TimeDelta;
use pdfsig_crypto::{crl::Crl, test_utils::TestCrl};
use pdfsig_report::{format_message, ReportItemStatus, ValidationResult};

use crate::{
    document::REVISIONS_RETRIEVAL_FAILED,
    properties::{ContextSelector, SignatureValidationProperties},
    revocation::crl_validator::VALID_CERTIFICATE_IS_REVOKED,
    signature::*,
    tests::fixtures::{
        days, failure_messages, has_message, now, DocBuilder, Integrity, Pki, TestDocument,
        TestSignature, TestToken,
    },
    validator_chain::ValidatorChain,
};

/// Chain for `pki` that does not diff revisions.
fn signatures_only(pki: &Pki) -> ValidatorChain {
    pki.chain().validate_document_revisions(false).build()
}

/// Root CRL listing nothing, issued a day ago.
fn empty_crl(pki: &Pki) -> Vec<u8> {
    TestCrl::builder(pki.root.as_ref(), now() - days(1))
        .build()
        .encoded()
        .to_vec()
}

#[test]
fn test_valid_signature() {
    let pki = Pki::new();
    let mut document =
        TestDocument::with_signatures(vec![TestSignature::signed_by("Signature1", &pki.signer)]);
    document.dss.crls.push(empty_crl(&pki));

    let report = signatures_only(&pki)
        .signature_validator()
        .validate_signatures(&document);

    assert_eq!(report.validation_result(), ValidationResult::Valid, "{report}");
    assert!(has_message(
        &report,
        &format_message(VALIDATING_SIGNATURE, &[&"Signature1"])
    ));
}

#[test]
fn test_signature_not_covering_document() {
    let pki = Pki::new();
    let mut signature = TestSignature::signed_by("Signature1", &pki.signer);
    signature.covers_whole_document = false;
    let document = TestDocument::with_signatures(vec![signature]);

    let report = signatures_only(&pki)
        .signature_validator()
        .validate_signatures(&document);

    assert_eq!(report.validation_result(), ValidationResult::Invalid);
    assert_eq!(
        failure_messages(&report),
        vec![format_message(DOCUMENT_IS_NOT_COVERED, &[&"Signature1"])]
    );
}

#[test]
fn test_older_signatures_need_not_cover_document() {
    let pki = Pki::new();
    let mut older = TestSignature::signed_by("Signature1", &pki.signer);
    older.covers_whole_document = false;
    let latest = TestSignature::signed_by("Signature2", &pki.signer);
    let mut document = TestDocument::with_signatures(vec![older, latest]);
    document.dss.crls.push(empty_crl(&pki));

    let report = signatures_only(&pki)
        .signature_validator()
        .validate_signatures(&document);

    assert_eq!(report.validation_result(), ValidationResult::Valid, "{report}");
}

#[test]
fn test_integrity() {
    let pki = Pki::new();

    let mut broken = TestSignature::signed_by("Signature1", &pki.signer);
    broken.integrity = Integrity::Broken;
    let report = signatures_only(&pki)
        .signature_validator()
        .validate_signatures(&TestDocument::with_signatures(vec![broken]));
    assert_eq!(report.validation_result(), ValidationResult::Invalid);
    assert_eq!(
        failure_messages(&report),
        vec![format_message(CANNOT_VERIFY_SIGNATURE, &[&"Signature1"])]
    );

    let mut unreadable = TestSignature::signed_by("Signature1", &pki.signer);
    unreadable.integrity = Integrity::Unreadable;
    let report = signatures_only(&pki)
        .signature_validator()
        .validate_signatures(&TestDocument::with_signatures(vec![unreadable]));
    assert_eq!(report.validation_result(), ValidationResult::Indeterminate);
    assert_eq!(
        failure_messages(&report),
        vec![format_message(CANNOT_READ_SIGNATURE, &[&"Signature1"])]
    );
}

#[test]
fn test_signer_certificate_missing() {
    let pki = Pki::new();
    let mut signature = TestSignature::signed_by("Signature1", &pki.signer);
    signature.signer = None;

    let report = signatures_only(&pki)
        .signature_validator()
        .validate_signatures(&TestDocument::with_signatures(vec![signature]));

    assert_eq!(
        failure_messages(&report),
        vec![format_message(SIGNER_CERTIFICATE_MISSING, &[&"Signature1"])]
    );
}

#[test]
fn test_document_timestamp_moves_validation_into_the_past() {
    let pki = Pki::new();
    let gen_time = now() - days(1);
    let revoked_at = now() - TimeDelta::hours(12);

    // issued after the timestamp, so fresh enough for it
    let crl = TestCrl::builder(pki.root.as_ref(), gen_time + TimeDelta::hours(1))
        .revoke(pki.signer.as_ref(), revoked_at)
        .build();

    let signature = TestSignature::signed_by("Signature1", &pki.signer);
    let timestamp = TestSignature::timestamp(
        "Timestamp1",
        TestToken {
            verifies: true,
            gen_time,
            signer: Some(pki.tsa()),
        },
    );
    let mut document = TestDocument::with_signatures(vec![signature, timestamp]);
    document.dss.crls.push(crl.encoded().to_vec());

    let report = signatures_only(&pki)
        .signature_validator()
        .validate_latest_signature(&document);

    assert_eq!(report.validation_result(), ValidationResult::Valid, "{report}");
    assert!(has_message(
        &report,
        &format_message(VALIDATING_SIGNATURE, &[&"Signature1"])
    ));
    assert!(has_message(
        &report,
        &format_message(VALID_CERTIFICATE_IS_REVOKED, &[&revoked_at, &gen_time])
    ));

    // without the timestamp the same signer is revoked
    let mut document =
        TestDocument::with_signatures(vec![TestSignature::signed_by("Signature1", &pki.signer)]);
    document.dss.crls.push(crl.encoded().to_vec());
    let report = signatures_only(&pki)
        .signature_validator()
        .validate_latest_signature(&document);
    assert_eq!(report.validation_result(), ValidationResult::Invalid);
}

#[test]
fn test_signature_timestamp() {
    let pki = Pki::new();
    let gen_time = now() - days(2);
    let crl = TestCrl::builder(pki.root.as_ref(), gen_time + TimeDelta::minutes(10))
        .revoke(pki.signer.as_ref(), now() - days(1))
        .build();

    let mut signature = TestSignature::signed_by("Signature1", &pki.signer);
    signature.token = Some(Arc::new(TestToken {
        verifies: true,
        gen_time,
        signer: Some(pki.tsa()),
    }));
    signature.crls.push(crl.encoded().to_vec());

    let report = signatures_only(&pki)
        .signature_validator()
        .validate_signatures(&TestDocument::with_signatures(vec![signature]));

    assert_eq!(report.validation_result(), ValidationResult::Valid, "{report}");
}

#[test]
fn test_broken_document_timestamp() {
    let pki = Pki::new();
    let signature = TestSignature::signed_by("Signature1", &pki.signer);
    let timestamp = TestSignature::timestamp(
        "Timestamp1",
        TestToken {
            verifies: false,
            gen_time: now() - days(1),
            signer: Some(pki.tsa()),
        },
    );
    let document = TestDocument::with_signatures(vec![signature, timestamp]);

    let report = signatures_only(&pki)
        .signature_validator()
        .validate_latest_signature(&document);

    assert_eq!(report.validation_result(), ValidationResult::Invalid);
    assert_eq!(failure_messages(&report), vec![CANNOT_VERIFY_TIMESTAMP]);
    // the covered signature is not looked at
    assert!(!has_message(
        &report,
        &format_message(VALIDATING_SIGNATURE, &[&"Signature1"])
    ));
}

#[test]
fn test_timestamp_without_tsa_certificate() {
    let pki = Pki::new();
    let timestamp = TestSignature::timestamp(
        "Timestamp1",
        TestToken {
            verifies: true,
            gen_time: now(),
            signer: None,
        },
    );

    let report = signatures_only(&pki)
        .signature_validator()
        .validate_latest_signature(&TestDocument::with_signatures(vec![timestamp]));

    assert_eq!(failure_messages(&report), vec![TSA_CERTIFICATE_MISSING]);
}

#[test]
fn test_stop_after_first_failure() {
    let pki = Pki::new();
    let older = TestSignature::signed_by("Signature1", &pki.signer);
    let mut latest = TestSignature::signed_by("Signature2", &pki.signer);
    latest.integrity = Integrity::Broken;
    let document = TestDocument::with_signatures(vec![older, latest]);

    let mut properties = SignatureValidationProperties::default();
    properties.set_continue_after_failure(ContextSelector::any(), false);
    let chain = pki
        .chain()
        .properties(properties)
        .validate_document_revisions(false)
        .build();

    let report = chain.signature_validator().validate_signatures(&document);

    assert_eq!(report.failures().count(), 1);
    assert!(!has_message(
        &report,
        &format_message(VALIDATING_SIGNATURE, &[&"Signature1"])
    ));
}

#[test]
fn test_unreadable_signatures() {
    let pki = Pki::new();
    let document = TestDocument {
        unreadable: true,
        ..Default::default()
    };

    let report = signatures_only(&pki)
        .signature_validator()
        .validate_signatures(&document);

    assert_eq!(report.validation_result(), ValidationResult::Indeterminate);
    assert_eq!(failure_messages(&report), vec![CANNOT_READ_SIGNATURES]);
}

#[test]
fn test_no_signatures() {
    let pki = Pki::new();
    let document = TestDocument::default();

    let report = signatures_only(&pki)
        .signature_validator()
        .validate_latest_signature(&document);
    assert_eq!(report.validation_result(), ValidationResult::Valid);
    assert_eq!(report.logs()[0].status, ReportItemStatus::Info);
    assert_eq!(report.logs()[0].message, NO_SIGNATURES);

    let report = signatures_only(&pki)
        .signature_validator()
        .validate_signatures(&document);
    assert_eq!(report.validation_result(), ValidationResult::Valid);
    assert_eq!(report.logs()[0].status, ReportItemStatus::Info);
    assert_eq!(report.logs()[0].message, NO_SIGNATURES);
}

#[test]
fn test_malformed_embedded_revocation_data() {
    let pki = Pki::new();
    let mut document =
        TestDocument::with_signatures(vec![TestSignature::signed_by("Signature1", &pki.signer)]);
    document.dss.crls.push(b"garbage".to_vec());
    document.dss.crls.push(empty_crl(&pki));
    document.dss.ocsp_responses.push(b"garbage".to_vec());

    let report = signatures_only(&pki)
        .signature_validator()
        .validate_signatures(&document);

    assert_eq!(
        failure_messages(&report),
        vec![CRL_PARSING_ERROR, OCSP_PARSING_ERROR]
    );
    // the good CRL still settles the signer's status
    assert_eq!(report.certificate_failures().count(), 0);
}

#[test]
fn test_revisions_are_checked_first() {
    let pki = Pki::new();
    let mut document =
        TestDocument::with_signatures(vec![TestSignature::signed_by("Signature1", &pki.signer)]);
    document.revisions = Some(DocBuilder::broken());
    document.dss.crls.push(empty_crl(&pki));

    let report = pki.chain().build().signature_validator().validate_signatures(&document);

    assert_eq!(failure_messages(&report), vec![REVISIONS_RETRIEVAL_FAILED]);
    assert!(has_message(
        &report,
        &format_message(VALIDATING_SIGNATURE, &[&"Signature1"])
    ));
}
