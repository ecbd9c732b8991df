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

use chrono::{DateTime, TimeDelta, Utc};
use pdfsig_crypto::{
    certificate::{same_certificate, Certificate, CertificateRef},
    crl::CrlReason,
    ocsp::{CertStatus, OcspResponseRef, SingleResponse},
};
use pdfsig_report::{format_message, report_item, ValidationReport};

use super::add_responder_report;
use crate::{
    context::{CertificateSource, TimeBasedContext, ValidationContext, ValidatorContext},
    validator_chain::{OcspValidation, ValidatorChain},
};

pub const OCSP_CHECK: &str = "OCSP response check.";

pub const CERT_IS_REVOKED: &str = "Certificate status is revoked since {0}.";
pub const CERT_STATUS_IS_GOOD: &str = "Certificate status is good.";
pub const CERT_STATUS_IS_UNKNOWN: &str = "Certificate status is unknown.";
pub const FRESHNESS_CHECK: &str = "OCSP response is not fresh enough: this update: {0}, validation date: {1}, freshness: {2}.";
pub const INVALID_OCSP: &str = "OCSP response is invalid.";
pub const ISSUERS_DO_NOT_MATCH: &str = "OCSP: Issuers don't match.";
pub const OCSP_COULD_NOT_BE_VERIFIED: &str = "OCSP response could not be verified: it does not contain responder in the certificate chain and response is not signed by issuer certificate or any from the trusted store.";
pub const OCSP_IS_NO_LONGER_VALID: &str = "OCSP is no longer valid: {0} after {1}.";
pub const SERIAL_NUMBERS_DO_NOT_MATCH: &str = "OCSP: Serial numbers don't match.";
pub const VALID_CERTIFICATE_IS_REVOKED: &str = "The certificate was revoked on {0}, after the validation date {1}.";

/// Seconds `thisUpdate` may lie in the future when validating at the
/// present time, to absorb clock skew between responder and validator.
pub const OCSP_TIME_TOLERANCE_SECONDS: i64 = 120;

/// Checks a certificate against an OCSP single response.
#[derive(Debug, Default)]
pub struct OcspValidator;

impl OcspValidator {
    /// Finds a responder that signed `basic_response` and validates it.
    /// Returns `false` if validation of this response should stop.
    fn verify_responder(
        &self,
        chain: &ValidatorChain,
        report: &mut ValidationReport,
        context: &ValidationContext,
        certificate: &CertificateRef,
        basic_response: &OcspResponseRef,
        response_generation_date: DateTime<Utc>,
    ) -> bool {
        let responder_id = basic_response.responder_id();
        let retriever = chain.retriever();
        let ocsp_context = context.with_certificate_source(CertificateSource::OcspIssuer);

        let mut candidates: Vec<(CertificateRef, ValidationContext)> = Vec::new();

        // The issuer signed the response itself.
        for issuer in retriever.retrieve_issuer_certificates(certificate.as_ref()) {
            if responder_id.matches(issuer.as_ref()) {
                candidates.push((
                    issuer,
                    ocsp_context.with_certificate_source(CertificateSource::CertIssuer),
                ));
            }
        }

        // A delegated responder shipped inside the response.
        for embedded in basic_response.certificates() {
            if !responder_id.matches(embedded.as_ref())
                || candidates
                    .iter()
                    .any(|(c, _)| same_certificate(c.as_ref(), embedded.as_ref()))
            {
                continue;
            }

            if embedded.issuer() != certificate.issuer() {
                report_item!(OCSP_CHECK, ISSUERS_DO_NOT_MATCH)
                    .certificate(certificate)
                    .indeterminate(report);
                return false;
            }

            candidates.push((embedded.clone(), ocsp_context.clone()));
        }

        for trusted in retriever.retrieve_ocsp_responder_certificates(responder_id) {
            if !candidates
                .iter()
                .any(|(c, _)| same_certificate(c.as_ref(), trusted.as_ref()))
            {
                candidates.push((trusted, ocsp_context.clone()));
            }
        }

        if candidates.is_empty() {
            report_item!(OCSP_CHECK, OCSP_COULD_NOT_BE_VERIFIED)
                .certificate(certificate)
                .indeterminate(report);
            return false;
        }

        let Some((responder, responder_context)) = candidates
            .into_iter()
            .find(|(c, _)| basic_response.verify(c.as_ref()))
        else {
            report_item!(OCSP_CHECK, INVALID_OCSP)
                .certificate(certificate)
                .invalid(report);
            return false;
        };

        log::debug!(
            "OCSP response for {} signed by {}",
            certificate.subject(),
            responder.subject()
        );

        let mut responder_report = ValidationReport::new();
        chain.certificate_chain_validator().validate(
            chain,
            &mut responder_report,
            &responder_context,
            &responder,
            response_generation_date,
        );

        let responder_failed = responder_report.failures().next().is_some();
        add_responder_report(report, responder_report);

        !responder_failed
    }
}

impl OcspValidation for OcspValidator {
    fn validate(
        &self,
        chain: &ValidatorChain,
        report: &mut ValidationReport,
        context: &ValidationContext,
        certificate: &CertificateRef,
        single_response: &SingleResponse,
        basic_response: &OcspResponseRef,
        validation_date: DateTime<Utc>,
        response_generation_date: DateTime<Utc>,
    ) {
        let local_context = context.with_validator_context(ValidatorContext::OcspValidator);

        if single_response.serial_number != certificate.serial_number() {
            report_item!(OCSP_CHECK, SERIAL_NUMBERS_DO_NOT_MATCH)
                .certificate(certificate)
                .indeterminate(report);
            return;
        }

        let freshness = chain.properties().freshness(&local_context);
        let this_update = single_response.this_update;
        let too_old = this_update < validation_date - freshness;
        let too_new = local_context.time_based_context() == TimeBasedContext::Present
            && this_update > validation_date + TimeDelta::seconds(OCSP_TIME_TOLERANCE_SECONDS);

        if too_old || too_new {
            report_item!(
                OCSP_CHECK,
                format_message(FRESHNESS_CHECK, &[&this_update, &validation_date, &freshness])
            )
            .certificate(certificate)
            .indeterminate(report);
            return;
        }

        if let Some(next_update) = single_response.next_update {
            if validation_date > next_update {
                report_item!(
                    OCSP_CHECK,
                    format_message(OCSP_IS_NO_LONGER_VALID, &[&validation_date, &next_update])
                )
                .certificate(certificate)
                .indeterminate(report);
                return;
            }
        }

        if !self.verify_responder(
            chain,
            report,
            &local_context,
            certificate,
            basic_response,
            response_generation_date,
        ) {
            return;
        }

        match &single_response.cert_status {
            CertStatus::Revoked {
                revocation_time,
                reason,
            } if *reason != Some(CrlReason::RemoveFromCrl) => {
                if *revocation_time <= validation_date {
                    report_item!(
                        OCSP_CHECK,
                        format_message(CERT_IS_REVOKED, &[revocation_time])
                    )
                    .certificate(certificate)
                    .invalid(report);
                } else {
                    report_item!(
                        OCSP_CHECK,
                        format_message(
                            VALID_CERTIFICATE_IS_REVOKED,
                            &[revocation_time, &validation_date]
                        )
                    )
                    .certificate(certificate)
                    .info(report);
                }
            }

            CertStatus::Unknown => {
                report_item!(OCSP_CHECK, CERT_STATUS_IS_UNKNOWN)
                    .certificate(certificate)
                    .indeterminate(report);
            }

            // GOOD, or an entry taken off hold
            _ => {
                report_item!(OCSP_CHECK, CERT_STATUS_IS_GOOD)
                    .certificate(certificate)
                    .info(report);
            }
        }
    }
}
