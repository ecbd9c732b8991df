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

//! Certificate chain walking.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use pdfsig_crypto::certificate::{display_name, fingerprint, is_self_signed, CertificateRef};
use pdfsig_report::{format_message, report_item, ValidationReport, ValidationResult};

use crate::{
    context::{CertificateSource, ValidationContext, ValidatorContext},
    trust::{TrustClass, TrustedCertificatesStore},
    validator_chain::{CertificateChainValidation, ValidatorChain},
};

pub const CERTIFICATE_CHECK: &str = "Certificate check.";
pub const EXTENSIONS_CHECK: &str = "Required certificate extensions check.";
pub const VALIDITY_CHECK: &str = "Certificate validity period check.";

pub const CERTIFICATE_TRUSTED: &str = "Certificate {0} is trusted, revocation data checks are not required.";
pub const CERTIFICATE_TRUSTED_FOR_DIFFERENT_CONTEXT: &str = "Certificate {0} is trusted for {1}, but it is not used in this context.";
pub const CERTIFICATE_REPEATED_IN_CHAIN: &str = "Certificate {0} appears more than once in its own issuer chain.";
pub const CONTEXT_TOO_DEEP: &str = "Validation of certificate {0} stopped: nested validations exceed {1} levels.";
pub const EXPIRED_CERTIFICATE: &str = "Certificate {0} is expired.";
pub const EXTENSION_MISSING: &str = "Required extension {0} is missing or incorrect.";
pub const ISSUER_CANNOT_BE_VERIFIED: &str = "Issuer certificate {0} for subject certificate {1} cannot be mathematically verified.";
pub const ISSUER_MISSING: &str = "Certificate {0} isn't trusted and issuer certificate isn't provided.";
pub const NOT_YET_VALID_CERTIFICATE: &str = "Certificate {0} is not yet valid.";
pub const SELF_SIGNED_CERTIFICATE: &str = "Certificate {0} is self-signed, revocation data check is not needed.";
pub const SELF_SIGNED_NOT_TRUSTED: &str = "Certificate {0} is self-signed but isn't trusted.";

/// Deepest context history a walk may run in. Revocation checks of CRL
/// and OCSP signers nest chain walks inside chain walks.
pub const MAX_CONTEXT_DEPTH: usize = 64;

enum Trust {
    Trusted,
    WrongContext(TrustClass),
    NotTrusted,
}

/// Where a certificate sits in the walk.
#[derive(Clone)]
struct Step {
    context: ValidationContext,
    certificate: CertificateRef,
    certificates_below: usize,
}

/// Walks from a certificate towards a trusted root.
#[derive(Debug, Default)]
pub struct CertificateChainValidator;

impl CertificateChainValidator {
    fn trust(store: &TrustedCertificatesStore, step: &Step) -> Trust {
        let cert = step.certificate.as_ref();
        if store.is_generally_trusted(cert) {
            return Trust::Trusted;
        }

        let ctx = &step.context;
        let classes = [
            (
                TrustClass::Ca,
                matches!(
                    ctx.certificate_source(),
                    CertificateSource::CertIssuer | CertificateSource::RootCert
                ),
            ),
            (
                TrustClass::Ocsp,
                ctx.contains_certificate_source(CertificateSource::OcspIssuer),
            ),
            (
                TrustClass::Crl,
                ctx.contains_certificate_source(CertificateSource::CrlIssuer),
            ),
            (
                TrustClass::Timestamp,
                ctx.contains_certificate_source(CertificateSource::Timestamp),
            ),
        ];

        let mut other = None;
        for (class, applies) in classes {
            if store.is_trusted_for(class, cert) {
                if applies {
                    return Trust::Trusted;
                }
                other.get_or_insert(class);
            }
        }

        other.map_or(Trust::NotTrusted, Trust::WrongContext)
    }

    fn stop(
        chain: &ValidatorChain,
        context: &ValidationContext,
        report: &ValidationReport,
    ) -> bool {
        !chain.properties().continue_after_failure(context)
            && report.validation_result() != ValidationResult::Valid
    }

    /// Checks one certificate. Returns the issuer steps to walk next; an
    /// empty list ends this branch.
    fn check_certificate(
        &self,
        chain: &ValidatorChain,
        report: &mut ValidationReport,
        step: &Step,
        validation_date: DateTime<Utc>,
    ) -> Vec<Step> {
        let ctx = &step.context;
        let cert = &step.certificate;
        let name = display_name(cert.as_ref());

        match Self::trust(chain.retriever().trusted_store(), step) {
            Trust::Trusted => {
                report_item!(CERTIFICATE_CHECK, format_message(CERTIFICATE_TRUSTED, &[&name]))
                    .certificate(cert)
                    .info(report);
                return Vec::new();
            }
            Trust::WrongContext(class) => {
                report_item!(
                    CERTIFICATE_CHECK,
                    format_message(CERTIFICATE_TRUSTED_FOR_DIFFERENT_CONTEXT, &[&name, &class])
                )
                .certificate(cert)
                .indeterminate(report);
                return Vec::new();
            }
            Trust::NotTrusted => {}
        }

        for extension in chain.properties().required_extensions(ctx) {
            if !extension.is_satisfied_by(cert.as_ref(), step.certificates_below) {
                report_item!(
                    EXTENSIONS_CHECK,
                    format_message(EXTENSION_MISSING, &[&extension])
                )
                .certificate(cert)
                .invalid(report);

                if Self::stop(chain, ctx, report) {
                    return Vec::new();
                }
            }
        }

        if cert.not_after() < validation_date {
            report_item!(VALIDITY_CHECK, format_message(EXPIRED_CERTIFICATE, &[&name]))
                .certificate(cert)
                .invalid(report);
        } else if cert.not_before() > validation_date {
            report_item!(VALIDITY_CHECK, format_message(NOT_YET_VALID_CERTIFICATE, &[&name]))
                .certificate(cert)
                .invalid(report);
        }

        if Self::stop(chain, ctx, report) {
            return Vec::new();
        }

        if is_self_signed(cert.as_ref()) {
            report_item!(CERTIFICATE_CHECK, format_message(SELF_SIGNED_CERTIFICATE, &[&name]))
                .certificate(cert)
                .info(report);
            report_item!(CERTIFICATE_CHECK, format_message(SELF_SIGNED_NOT_TRUSTED, &[&name]))
                .certificate(cert)
                .indeterminate(report);
            return Vec::new();
        }

        chain
            .revocation_data_validator()
            .validate(chain, report, ctx, cert, validation_date);

        if Self::stop(chain, ctx, report) {
            return Vec::new();
        }

        let issuers = chain
            .retriever()
            .retrieve_issuer_certificates(cert.as_ref());

        if issuers.is_empty() {
            report_item!(CERTIFICATE_CHECK, format_message(ISSUER_MISSING, &[&name]))
                .certificate(cert)
                .indeterminate(report);
            return Vec::new();
        }

        issuers
            .into_iter()
            .map(|issuer| {
                let source = if is_self_signed(issuer.as_ref()) {
                    CertificateSource::RootCert
                } else {
                    CertificateSource::CertIssuer
                };

                Step {
                    context: ctx.with_certificate_source(source),
                    certificate: issuer,
                    certificates_below: step.certificates_below + 1,
                }
            })
            .collect()
    }

    fn walk(
        &self,
        chain: &ValidatorChain,
        report: &mut ValidationReport,
        start: Step,
        validation_date: DateTime<Utc>,
        mut visited: HashSet<String>,
    ) {
        let mut pending = vec![start];

        while let Some(step) = pending.pop() {
            let name = display_name(step.certificate.as_ref());

            if step.context.depth() > MAX_CONTEXT_DEPTH {
                report_item!(
                    CERTIFICATE_CHECK,
                    format_message(CONTEXT_TOO_DEEP, &[&name, &MAX_CONTEXT_DEPTH])
                )
                .certificate(&step.certificate)
                .indeterminate(report);
                return;
            }

            if !visited.insert(fingerprint(step.certificate.as_ref())) {
                report_item!(
                    CERTIFICATE_CHECK,
                    format_message(CERTIFICATE_REPEATED_IN_CHAIN, &[&name])
                )
                .certificate(&step.certificate)
                .indeterminate(report);
                return;
            }

            let mut next = self.check_certificate(chain, report, &step, validation_date);

            match next.len() {
                0 => {}
                1 => {
                    let issuer_step = next.remove(0);
                    if self.verify_issuer(report, &step, &issuer_step) {
                        pending.push(issuer_step);
                    }
                }
                _ => {
                    self.walk_candidates(chain, report, &step, next, validation_date, &visited);
                }
            }
        }
    }

    /// Returns `false` and records the failure if `issuer` did not sign
    /// the certificate.
    fn verify_issuer(&self, report: &mut ValidationReport, step: &Step, issuer: &Step) -> bool {
        if step.certificate.verify(issuer.certificate.as_ref()) {
            return true;
        }

        report_item!(
            CERTIFICATE_CHECK,
            format_message(
                ISSUER_CANNOT_BE_VERIFIED,
                &[
                    &display_name(issuer.certificate.as_ref()),
                    &display_name(step.certificate.as_ref()),
                ]
            )
        )
        .certificate(&step.certificate)
        .invalid(report);

        false
    }

    /// Walks each candidate issuer separately. The first branch that ends
    /// valid is kept; otherwise every branch's findings are kept.
    fn walk_candidates(
        &self,
        chain: &ValidatorChain,
        report: &mut ValidationReport,
        step: &Step,
        candidates: Vec<Step>,
        validation_date: DateTime<Utc>,
        visited: &HashSet<String>,
    ) {
        let mut branches = ValidationReport::new();

        for candidate in candidates {
            let mut branch = ValidationReport::new();

            if self.verify_issuer(&mut branch, step, &candidate) {
                self.walk(chain, &mut branch, candidate, validation_date, visited.clone());
            }

            if branch.validation_result() == ValidationResult::Valid {
                report.merge(branch);
                return;
            }

            branches.merge(branch);
        }

        report.merge(branches);
    }
}

impl CertificateChainValidation for CertificateChainValidator {
    fn validate(
        &self,
        chain: &ValidatorChain,
        report: &mut ValidationReport,
        context: &ValidationContext,
        certificate: &CertificateRef,
        validation_date: DateTime<Utc>,
    ) {
        let start = Step {
            context: context.with_validator_context(ValidatorContext::CertificateChainValidator),
            certificate: certificate.clone(),
            certificates_below: 0,
        };

        log::debug!(
            "validating chain of {} at {validation_date}",
            certificate.subject()
        );

        self.walk(chain, report, start, validation_date, HashSet::new());
    }
}
