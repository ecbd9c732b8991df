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

use std::{collections::HashMap, sync::Mutex};

use chrono::{DateTime, Utc};
use pdfsig_crypto::{
    certificate::{display_name, fingerprint, same_certificate, Certificate, CertificateRef},
    crl::{CrlReason, CrlRef, ReasonFlags},
};
use pdfsig_report::{format_message, report_item, ValidationReport};

use super::add_responder_report;
use crate::{
    context::{CertificateSource, ValidationContext, ValidatorContext},
    validator_chain::{CrlValidation, ValidatorChain},
};

pub const CRL_CHECK: &str = "CRL response check.";

pub const ATTRIBUTE_CERTS_ASSERTED: &str = "The onlyContainsAttributeCerts is asserted. Conforming CRLs issuers MUST set the onlyContainsAttributeCerts boolean to FALSE.";
pub const CERTIFICATE_EXPIRED: &str = "Certificate expired on {0}, before the CRL was issued on {1}, and the CRL does not cover expired certificates.";
pub const CERTIFICATE_IN_ISSUER_CHAIN: &str = "Unable to validate CRL response: validated certificate is part of issuer certificate chain.";
pub const CERTIFICATE_IS_NOT_IN_THE_CRL_SCOPE: &str = "The certificate isn't in the current CRL scope.";
pub const CERTIFICATE_IS_UNREVOKED: &str = "The certificate was unrevoked.";
pub const CERTIFICATE_REVOKED: &str = "Certificate was revoked by {0} on {1}.";
pub const CRL_INVALID: &str = "CRL response is invalid.";
pub const CRL_ISSUER_NO_COMMON_ROOT: &str = "The CRL issuer does not share the root of the inspected certificate.";
pub const CRL_ISSUER_NOT_FOUND: &str = "Unable to validate CRL response: no issuer certificate found.";
pub const FRESHNESS_CHECK: &str = "CRL response is not fresh enough: this update: {0}, validation date: {1}, freshness: {2}.";
pub const ONLY_SOME_REASONS_CHECKED: &str = "Revocation status cannot be determined since not all reason codes are covered by the current CRL.";
pub const SAME_REASONS_CHECK: &str = "CRLs that cover the same reason codes were already verified.";
pub const UPDATE_DATE_BEFORE_CHECK_DATE: &str = "nextUpdate: {0} of CRLResponse is before validation date {1}.";
pub const VALID_CERTIFICATE_IS_REVOKED: &str = "The certificate was revoked on {0}, after the validation date {1}.";

/// Revocation reasons already covered by conclusive CRLs, per
/// certificate fingerprint.
///
/// One record lives for one top-level validation, so partial CRLs checked
/// one after another can together give a conclusive answer without
/// leaking coverage into later validations.
#[derive(Debug, Default)]
pub struct CheckedCrlReasons(Mutex<HashMap<String, ReasonFlags>>);

impl CheckedCrlReasons {
    pub fn get(&self, certificate: &dyn Certificate) -> ReasonFlags {
        let reasons = match self.0.lock() {
            Ok(reasons) => reasons,
            Err(poisoned) => poisoned.into_inner(),
        };
        reasons
            .get(&fingerprint(certificate))
            .copied()
            .unwrap_or_else(ReasonFlags::empty)
    }

    pub fn set(&self, certificate: &dyn Certificate, mask: ReasonFlags) {
        let mut reasons = match self.0.lock() {
            Ok(reasons) => reasons,
            Err(poisoned) => poisoned.into_inner(),
        };
        reasons.insert(fingerprint(certificate), mask);
    }
}

/// Checks a certificate against a CRL.
///
/// Covered reasons are recorded in the chain's [`CheckedCrlReasons`].
#[derive(Debug, Default)]
pub struct CrlValidator;

impl CrlValidator {
    pub fn new() -> Self {
        Self
    }

    /// Finds the certificate that signed the CRL and validates its chain.
    #[allow(clippy::too_many_arguments)]
    fn verify_crl_issuer(
        &self,
        chain: &ValidatorChain,
        report: &mut ValidationReport,
        context: &ValidationContext,
        certificate: &CertificateRef,
        crl: &CrlRef,
        response_generation_date: DateTime<Utc>,
    ) -> Option<CertificateRef> {
        let candidates = chain.retriever().retrieve_crl_issuer_certificates(crl.as_ref());
        if candidates.is_empty() {
            report_item!(CRL_CHECK, CRL_ISSUER_NOT_FOUND)
                .certificate(certificate)
                .indeterminate(report);
            return None;
        }

        let Some(issuer) = candidates
            .into_iter()
            .find(|candidate| crl.verify(candidate.as_ref()))
        else {
            report_item!(CRL_CHECK, CRL_INVALID)
                .certificate(certificate)
                .indeterminate(report);
            return None;
        };

        if same_certificate(issuer.as_ref(), certificate.as_ref()) {
            report_item!(CRL_CHECK, CERTIFICATE_IN_ISSUER_CHAIN)
                .certificate(certificate)
                .indeterminate(report);
            return None;
        }

        // The certificate's own issuer signing the CRL is walked as an
        // issuer, so CA trust applies to it.
        let crl_context = context.with_certificate_source(CertificateSource::CrlIssuer);
        let issuer_context = if certificate.issuer() == issuer.subject()
            && certificate.verify(issuer.as_ref())
        {
            crl_context.with_certificate_source(CertificateSource::CertIssuer)
        } else {
            crl_context
        };

        let mut responder_report = ValidationReport::new();
        chain.certificate_chain_validator().validate(
            chain,
            &mut responder_report,
            &issuer_context,
            &issuer,
            response_generation_date,
        );
        add_responder_report(report, responder_report);

        let retriever = chain.retriever();
        if let (Some(cert_root), Some(issuer_root)) =
            (retriever.retrieve_root(certificate), retriever.retrieve_root(&issuer))
        {
            if !same_certificate(cert_root.as_ref(), issuer_root.as_ref()) {
                report_item!(CRL_CHECK, CRL_ISSUER_NO_COMMON_ROOT)
                    .certificate(certificate)
                    .indeterminate(report);
            }
        }

        Some(issuer)
    }

    /// Returns `false` if the certificate is outside the CRL's scope.
    fn check_scope(
        &self,
        report: &mut ValidationReport,
        certificate: &CertificateRef,
        crl: &CrlRef,
    ) -> bool {
        let Some(idp) = crl.issuing_distribution_point() else {
            return true;
        };

        if idp.only_contains_attribute_certs {
            report_item!(CRL_CHECK, ATTRIBUTE_CERTS_ASSERTED)
                .certificate(certificate)
                .indeterminate(report);
            return false;
        }

        let is_ca = certificate.basic_constraints().is_some_and(|bc| bc.ca);
        if (idp.only_contains_user_certs && is_ca) || (idp.only_contains_ca_certs && !is_ca) {
            report_item!(CRL_CHECK, CERTIFICATE_IS_NOT_IN_THE_CRL_SCOPE)
                .certificate(certificate)
                .indeterminate(report);
            return false;
        }

        true
    }

    fn check_revocation(
        &self,
        report: &mut ValidationReport,
        certificate: &CertificateRef,
        crl: &CrlRef,
        issuer: &CertificateRef,
        validation_date: DateTime<Utc>,
    ) {
        let entry = crl
            .revoked_certificate(certificate.serial_number())
            .filter(|entry| entry.reason != Some(CrlReason::RemoveFromCrl));

        if let Some(entry) = entry {
            if entry.revocation_date <= validation_date {
                report_item!(
                    CRL_CHECK,
                    format_message(
                        CERTIFICATE_REVOKED,
                        &[&display_name(issuer.as_ref()), &entry.revocation_date]
                    )
                )
                .certificate(certificate)
                .invalid(report);
            } else {
                report_item!(
                    CRL_CHECK,
                    format_message(
                        VALID_CERTIFICATE_IS_REVOKED,
                        &[&entry.revocation_date, &validation_date]
                    )
                )
                .certificate(certificate)
                .info(report);
            }
            return;
        }

        // A CRL issued after the certificate expired may have dropped its entry.
        if certificate.not_after() < crl.this_update() {
            let covered = crl
                .expired_certs_on_crl()
                .is_some_and(|cutoff| cutoff <= certificate.not_after());

            if !covered {
                report_item!(
                    CRL_CHECK,
                    format_message(
                        CERTIFICATE_EXPIRED,
                        &[&certificate.not_after(), &crl.this_update()]
                    )
                )
                .certificate(certificate)
                .indeterminate(report);
                return;
            }
        }

        report_item!(CRL_CHECK, CERTIFICATE_IS_UNREVOKED)
            .certificate(certificate)
            .info(report);
    }
}

impl CrlValidation for CrlValidator {
    fn validate(
        &self,
        chain: &ValidatorChain,
        report: &mut ValidationReport,
        context: &ValidationContext,
        certificate: &CertificateRef,
        crl: &CrlRef,
        validation_date: DateTime<Utc>,
        response_generation_date: DateTime<Utc>,
    ) {
        let local_context = context.with_validator_context(ValidatorContext::CrlValidator);
        let failures_at_start = report.failures().count();

        let Some(issuer) = self.verify_crl_issuer(
            chain,
            report,
            &local_context,
            certificate,
            crl,
            response_generation_date,
        ) else {
            return;
        };

        let freshness = chain.properties().freshness(&local_context);
        if crl.this_update() < validation_date - freshness {
            report_item!(
                CRL_CHECK,
                format_message(
                    FRESHNESS_CHECK,
                    &[&crl.this_update(), &validation_date, &freshness]
                )
            )
            .certificate(certificate)
            .indeterminate(report);
            return;
        }

        if let Some(next_update) = crl.next_update() {
            if validation_date > next_update {
                report_item!(
                    CRL_CHECK,
                    format_message(UPDATE_DATE_BEFORE_CHECK_DATE, &[&next_update, &validation_date])
                )
                .certificate(certificate)
                .indeterminate(report);
                return;
            }
        }

        if !self.check_scope(report, certificate, crl) {
            return;
        }

        let crl_reasons = crl
            .issuing_distribution_point()
            .and_then(|idp| idp.only_some_reasons)
            .unwrap_or(ReasonFlags::ALL_REASONS);
        let checked = chain.checked_crl_reasons().get(certificate.as_ref());

        if checked != ReasonFlags::empty() && checked.contains(crl_reasons) {
            report_item!(CRL_CHECK, SAME_REASONS_CHECK)
                .certificate(certificate)
                .info(report);
        }

        let covered = checked | crl_reasons;
        let partial = !covered.is_all();
        if partial {
            report_item!(CRL_CHECK, ONLY_SOME_REASONS_CHECKED)
                .certificate(certificate)
                .indeterminate(report);
        }

        self.check_revocation(report, certificate, crl, &issuer, validation_date);

        // Only a CRL that was otherwise conclusive counts towards the
        // covered reasons.
        let added = report.failures().count() - failures_at_start;
        if added == usize::from(partial) {
            chain.checked_crl_reasons().set(certificate.as_ref(), covered);
        }
    }
}
