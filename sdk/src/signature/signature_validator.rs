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

use chrono::{DateTime, Utc};
use pdfsig_report::{format_message, report_item, ValidationReport, ValidationResult};

use super::{PdfSignature, SignedDocument, TimeStampToken};
use crate::{
    context::{CertificateSource, TimeBasedContext, ValidationContext, ValidatorContext},
    document::{DocumentRevision, DocumentRevisionsValidator, RevisionReader},
    revocation::SuppliedRevocationData,
    validator_chain::ValidatorChain,
};

pub const SIGNATURE_VERIFICATION: &str = "Signature verification check.";
pub const TIMESTAMP_VERIFICATION: &str = "Timestamp verification check.";
pub const REVOCATION_DATA_CHECK: &str = "Embedded revocation data check.";

pub const CANNOT_READ_SIGNATURE: &str = "Signature container of \"{0}\" couldn't be read.";
pub const CANNOT_READ_SIGNATURES: &str = "Document signatures couldn't be read.";
pub const CANNOT_READ_TIMESTAMP: &str = "Timestamp token couldn't be read.";
pub const CANNOT_VERIFY_SIGNATURE: &str = "Signature \"{0}\" cannot be mathematically verified.";
pub const CANNOT_VERIFY_TIMESTAMP: &str = "Signature timestamp attribute cannot be verified.";
pub const CRL_PARSING_ERROR: &str = "CRL embedded in the document couldn't be parsed.";
pub const DOCUMENT_IS_NOT_COVERED: &str = "Signature \"{0}\" doesn't cover entire document.";
pub const NO_SIGNATURES: &str = "Document doesn't contain any signatures.";
pub const OCSP_PARSING_ERROR: &str = "OCSP response embedded in the document couldn't be parsed.";
pub const SIGNER_CERTIFICATE_MISSING: &str = "Signing certificate of \"{0}\" couldn't be found.";
pub const TIMESTAMP_MISSING: &str = "Document timestamp \"{0}\" doesn't contain a timestamp token.";
pub const TSA_CERTIFICATE_MISSING: &str = "Timestamp signing certificate couldn't be found.";
pub const VALIDATING_SIGNATURE: &str = "Validating signature {0}.";

/// Runs the revision checks over a [`SignedDocument`].
struct Revisions<'a>(&'a dyn SignedDocument);

impl RevisionReader for Revisions<'_> {
    fn all_revisions(&self) -> crate::Result<Vec<DocumentRevision>> {
        self.0.all_revisions()
    }
}

/// Validates the signatures of a document, newest first.
///
/// A verified timestamp fixes the time at which everything it covers is
/// checked: certificates of older signatures are validated at the
/// timestamp's `genTime` in a historical context.
#[derive(Clone, Debug)]
pub struct SignatureValidator {
    chain: ValidatorChain,
    last_timestamp: Option<DateTime<Utc>>,
}

impl SignatureValidator {
    pub fn new(chain: ValidatorChain) -> Self {
        Self {
            chain,
            last_timestamp: None,
        }
    }

    /// Validates the most recent signature. When it is a document
    /// timestamp, the signatures it covers are validated too, up to and
    /// including the first ordinary signature.
    pub fn validate_latest_signature(&mut self, document: &dyn SignedDocument) -> ValidationReport {
        let mut report = ValidationReport::new();
        self.last_timestamp = None;

        let Some(signatures) = read_signatures(document, &mut report) else {
            return report;
        };

        // Nothing is signed, so there is nothing to distrust.
        if signatures.is_empty() {
            report_item!(SIGNATURE_VERIFICATION, NO_SIGNATURES).info(&mut report);
            return report;
        }

        let chain = self.document_chain(document, &signatures, &mut report);

        for (index, signature) in signatures.iter().rev().enumerate() {
            let verified =
                self.validate_signature(&chain, signature.as_ref(), index == 0, &mut report);
            if !verified || !signature.is_document_timestamp() {
                break;
            }
        }

        report
    }

    /// Validates the document revisions (when the chain asks for it) and
    /// then every signature, newest first.
    pub fn validate_signatures(&mut self, document: &dyn SignedDocument) -> ValidationReport {
        let mut report = ValidationReport::new();
        self.last_timestamp = None;

        let context = ValidationContext::new(
            ValidatorContext::SignatureValidator,
            CertificateSource::SignerCert,
            TimeBasedContext::Present,
        );
        let continue_after_failure = self.chain.properties().continue_after_failure(&context);
        let stop = |report: &ValidationReport| {
            !continue_after_failure && report.validation_result() != ValidationResult::Valid
        };

        let revisions_checked = self.chain.validate_document_revisions();
        if revisions_checked {
            let mut revisions = DocumentRevisionsValidator::new(&self.chain);
            report.merge(revisions.validate_all_document_revisions(&Revisions(document)));
            if stop(&report) {
                return report;
            }
        }

        let Some(signatures) = read_signatures(document, &mut report) else {
            return report;
        };

        if signatures.is_empty() {
            if !revisions_checked {
                report_item!(SIGNATURE_VERIFICATION, NO_SIGNATURES).info(&mut report);
            }
            return report;
        }

        let chain = self.document_chain(document, &signatures, &mut report);

        for (index, signature) in signatures.iter().rev().enumerate() {
            self.validate_signature(&chain, signature.as_ref(), index == 0, &mut report);
            if stop(&report) {
                break;
            }
        }

        report
    }

    /// The chain extended with the certificates and revocation data the
    /// document carries.
    fn document_chain(
        &self,
        document: &dyn SignedDocument,
        signatures: &[Arc<dyn PdfSignature>],
        report: &mut ValidationReport,
    ) -> ValidatorChain {
        let dss = document.dss();

        let mut certificates = dss.certificates;
        let mut crls = dss.crls;
        let mut ocsp_responses = dss.ocsp_responses;

        for signature in signatures {
            certificates.extend(signature.certificates());
            crls.extend(signature.crls());
            ocsp_responses.extend(signature.ocsp_responses());
        }

        let decoder = self.chain.decoder();
        let mut supplied = SuppliedRevocationData::new();

        for encoded in &crls {
            match decoder.decode_crl(encoded) {
                Ok(crl) => supplied.add_crl(crl),
                Err(err) => {
                    log::warn!("embedded CRL could not be decoded: {err}");
                    report_item!(REVOCATION_DATA_CHECK, CRL_PARSING_ERROR)
                        .caused_by(err)
                        .indeterminate(report);
                }
            }
        }

        for encoded in &ocsp_responses {
            match decoder.decode_ocsp_response(encoded) {
                Ok(response) => supplied.add_ocsp_response(response),
                Err(err) => {
                    log::warn!("embedded OCSP response could not be decoded: {err}");
                    report_item!(REVOCATION_DATA_CHECK, OCSP_PARSING_ERROR)
                        .caused_by(err)
                        .indeterminate(report);
                }
            }
        }

        self.chain
            .with_known_certificates(certificates)
            .with_supplied_revocation_data(supplied)
    }

    /// Date and time base for the next check: the last verified
    /// timestamp, or now.
    fn validation_time(&self, chain: &ValidatorChain) -> (DateTime<Utc>, TimeBasedContext) {
        match self.last_timestamp {
            Some(time) => (time, TimeBasedContext::Historical),
            None => (chain.now(), TimeBasedContext::Present),
        }
    }

    /// Returns `false` when the signature could not be evaluated.
    fn validate_signature(
        &mut self,
        chain: &ValidatorChain,
        signature: &dyn PdfSignature,
        latest: bool,
        report: &mut ValidationReport,
    ) -> bool {
        let name = signature.name();
        report_item!(
            SIGNATURE_VERIFICATION,
            format_message(VALIDATING_SIGNATURE, &[&name])
        )
        .info(report);

        if signature.is_document_timestamp() {
            let Some(token) = signature.timestamp_token() else {
                report_item!(
                    TIMESTAMP_VERIFICATION,
                    format_message(TIMESTAMP_MISSING, &[&name])
                )
                .indeterminate(report);
                return false;
            };
            return self.validate_timestamp(chain, token.as_ref(), report);
        }

        if latest && !signature.covers_whole_document() {
            report_item!(
                SIGNATURE_VERIFICATION,
                format_message(DOCUMENT_IS_NOT_COVERED, &[&name])
            )
            .invalid(report);
            return false;
        }

        match signature.verify_integrity() {
            Ok(true) => {}
            Ok(false) => {
                report_item!(
                    SIGNATURE_VERIFICATION,
                    format_message(CANNOT_VERIFY_SIGNATURE, &[&name])
                )
                .invalid(report);
                return false;
            }
            Err(err) => {
                log::warn!("signature {name} could not be read: {err}");
                report_item!(
                    SIGNATURE_VERIFICATION,
                    format_message(CANNOT_READ_SIGNATURE, &[&name])
                )
                .caused_by(err)
                .indeterminate(report);
                return false;
            }
        }

        if let Some(token) = signature.timestamp_token() {
            if !self.validate_timestamp(chain, token.as_ref(), report) {
                return false;
            }
        }

        let Some(signer) = signature.signing_certificate() else {
            report_item!(
                SIGNATURE_VERIFICATION,
                format_message(SIGNER_CERTIFICATE_MISSING, &[&name])
            )
            .indeterminate(report);
            return false;
        };

        let (validation_date, time_based) = self.validation_time(chain);
        let context = ValidationContext::new(
            ValidatorContext::SignatureValidator,
            CertificateSource::SignerCert,
            time_based,
        );

        log::debug!("validating signer of {name} at {validation_date}");

        let chain = chain.with_known_certificates(signature.certificates());
        report.merge(chain.validate_certificate(&context, &signer, validation_date));
        true
    }

    /// Verifies a timestamp token and its TSA chain. On success the
    /// token's time becomes the validation time of everything older.
    fn validate_timestamp(
        &mut self,
        chain: &ValidatorChain,
        token: &dyn TimeStampToken,
        report: &mut ValidationReport,
    ) -> bool {
        match token.verify() {
            Ok(true) => {}
            Ok(false) => {
                report_item!(TIMESTAMP_VERIFICATION, CANNOT_VERIFY_TIMESTAMP).invalid(report);
                return false;
            }
            Err(err) => {
                log::warn!("timestamp token could not be read: {err}");
                report_item!(TIMESTAMP_VERIFICATION, CANNOT_READ_TIMESTAMP)
                    .caused_by(err)
                    .indeterminate(report);
                return false;
            }
        }

        let Some(tsa) = token.signer_certificate() else {
            report_item!(TIMESTAMP_VERIFICATION, TSA_CERTIFICATE_MISSING).indeterminate(report);
            return false;
        };

        let (validation_date, time_based) = self.validation_time(chain);
        let context = ValidationContext::new(
            ValidatorContext::TimestampValidator,
            CertificateSource::Timestamp,
            time_based,
        );

        let chain = chain.with_known_certificates(token.certificates());
        let tsa_report = chain.validate_certificate(&context, &tsa, validation_date);
        let usable = tsa_report.validation_result() != ValidationResult::Invalid;
        report.merge(tsa_report);

        if usable {
            log::debug!("timestamp verified, genTime {}", token.gen_time());
            self.last_timestamp = Some(token.gen_time());
        }

        usable
    }
}

fn read_signatures(
    document: &dyn SignedDocument,
    report: &mut ValidationReport,
) -> Option<Vec<Arc<dyn PdfSignature>>> {
    match document.signatures() {
        Ok(signatures) => Some(signatures),
        Err(err) => {
            log::warn!("document signatures could not be read: {err}");
            report_item!(SIGNATURE_VERIFICATION, CANNOT_READ_SIGNATURES)
                .caused_by(err)
                .indeterminate(report);
            None
        }
    }
}
