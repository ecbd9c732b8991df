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
use pdfsig_crypto::{
    certificate::{Certificate, CertificateRef},
    crl::CrlRef,
    oids,
    ocsp::{OcspResponseRef, SingleResponse},
};
use pdfsig_report::{report_item, ValidationReport, ValidationResult};

use crate::{
    context::{CertificateSource, ValidationContext, ValidatorContext},
    properties::OnlineFetching,
    validator_chain::{RevocationDataValidation, ValidatorChain},
};

pub const REVOCATION_DATA_CHECK: &str = "Revocation data check.";

pub const CRL_CLIENT_FAILURE: &str = "Unable to retrieve CRL from a CRL client.";
pub const CRL_PARSING_ERROR: &str = "CRL is malformed.";
pub const NO_REVOCATION_DATA: &str = "Certificate revocation status cannot be checked: no revocation data available or the status cannot be determined.";
pub const OCSP_CLIENT_FAILURE: &str = "Unable to retrieve OCSP response from an OCSP client.";
pub const OCSP_PARSING_ERROR: &str = "OCSP response is malformed.";
pub const TRUSTED_OCSP_RESPONDER: &str = "Authorized OCSP Responder certificate has id-pkix-ocsp-nocheck extension so it is trusted by the definition and no revocation checking is performed.";
pub const VALIDITY_ASSURED: &str = "Certificate is trusted due to validity assured - short term extension.";

/// One piece of revocation evidence awaiting evaluation.
#[derive(Debug)]
enum Evidence {
    Crl {
        crl: CrlRef,
        generation_date: DateTime<Utc>,
    },
    Ocsp {
        response: OcspResponseRef,
        single: SingleResponse,
        generation_date: DateTime<Utc>,
    },
}

impl Evidence {
    fn issued_at(&self) -> DateTime<Utc> {
        match self {
            Evidence::Crl { crl, .. } => crl.this_update(),
            Evidence::Ocsp { response, .. } => response.produced_at(),
        }
    }
}

/// Gathers CRLs and OCSP responses for a certificate and decides on its
/// revocation status from the most recent conclusive one.
#[derive(Debug, Default)]
pub struct RevocationDataValidator;

impl RevocationDataValidator {
    fn supplied_evidence(
        &self,
        chain: &ValidatorChain,
        certificate: &dyn Certificate,
    ) -> Vec<Evidence> {
        let supplied = chain.supplied_revocation_data();
        let mut evidence = Vec::new();

        for crl in supplied.crls() {
            if crl.issuer() == certificate.issuer() {
                evidence.push(Evidence::Crl {
                    crl: crl.clone(),
                    generation_date: crl.this_update(),
                });
            }
        }

        for response in supplied.ocsp_responses() {
            Self::push_ocsp(&mut evidence, response, certificate, response.produced_at());
        }

        evidence
    }

    fn push_ocsp(
        evidence: &mut Vec<Evidence>,
        response: &OcspResponseRef,
        certificate: &dyn Certificate,
        generation_date: DateTime<Utc>,
    ) {
        for single in response.responses() {
            if single.serial_number == certificate.serial_number() {
                evidence.push(Evidence::Ocsp {
                    response: response.clone(),
                    single: single.clone(),
                    generation_date,
                });
            }
        }
    }

    /// Queries every registered client. Failures are recorded in
    /// `failures` and do not stop the other clients.
    fn online_evidence(
        &self,
        chain: &ValidatorChain,
        failures: &mut ValidationReport,
        certificate: &CertificateRef,
    ) -> Vec<Evidence> {
        let mut evidence = Vec::new();
        let now = chain.now();
        let issuers = chain
            .retriever()
            .retrieve_issuer_certificates(certificate.as_ref());

        for client in chain.ocsp_clients() {
            for issuer in &issuers {
                match client.get_encoded(certificate.as_ref(), issuer.as_ref()) {
                    Ok(Some(encoded)) => match chain.decoder().decode_ocsp_response(&encoded) {
                        Ok(response) => {
                            Self::push_ocsp(&mut evidence, &response, certificate.as_ref(), now)
                        }
                        Err(err) => {
                            log::warn!("could not decode OCSP response: {err}");
                            report_item!(REVOCATION_DATA_CHECK, OCSP_PARSING_ERROR)
                                .certificate(certificate)
                                .caused_by(err)
                                .indeterminate(failures);
                        }
                    },
                    Ok(None) => {}
                    Err(err) => {
                        log::warn!("OCSP client failed for {}: {err}", certificate.subject());
                        report_item!(REVOCATION_DATA_CHECK, OCSP_CLIENT_FAILURE)
                            .certificate(certificate)
                            .caused_by(err)
                            .indeterminate(failures);
                    }
                }
            }
        }

        let issuer = issuers.first().map(|issuer| issuer.as_ref());
        for client in chain.crl_clients() {
            match client.get_encoded(certificate.as_ref(), issuer) {
                Ok(encoded_crls) => {
                    for encoded in encoded_crls {
                        match chain.decoder().decode_crl(&encoded) {
                            Ok(crl) => evidence.push(Evidence::Crl {
                                crl,
                                generation_date: now,
                            }),
                            Err(err) => {
                                log::warn!("could not decode CRL: {err}");
                                report_item!(REVOCATION_DATA_CHECK, CRL_PARSING_ERROR)
                                    .certificate(certificate)
                                    .caused_by(err)
                                    .indeterminate(failures);
                            }
                        }
                    }
                }
                Err(err) => {
                    log::warn!("CRL client failed for {}: {err}", certificate.subject());
                    report_item!(REVOCATION_DATA_CHECK, CRL_CLIENT_FAILURE)
                        .certificate(certificate)
                        .caused_by(err)
                        .indeterminate(failures);
                }
            }
        }

        evidence
    }
}

impl RevocationDataValidation for RevocationDataValidator {
    fn validate(
        &self,
        chain: &ValidatorChain,
        report: &mut ValidationReport,
        context: &ValidationContext,
        certificate: &CertificateRef,
        validation_date: DateTime<Utc>,
    ) {
        let local_context =
            context.with_validator_context(ValidatorContext::RevocationDataValidator);

        if certificate.has_extension(oids::VALIDITY_ASSURED_SHORT_TERM) {
            report_item!(REVOCATION_DATA_CHECK, VALIDITY_ASSURED)
                .certificate(certificate)
                .info(report);
            return;
        }

        if local_context.certificate_source() == CertificateSource::OcspIssuer
            && certificate.has_extension(oids::OCSP_NO_CHECK)
        {
            report_item!(REVOCATION_DATA_CHECK, TRUSTED_OCSP_RESPONDER)
                .certificate(certificate)
                .info(report);
            return;
        }

        let mut evidence = self.supplied_evidence(chain, certificate.as_ref());
        let mut fetch_failures = ValidationReport::new();

        let fetch = match chain.properties().revocation_online_fetching(&local_context) {
            OnlineFetching::AlwaysFetch => true,
            OnlineFetching::FetchIfNoOtherData => evidence.is_empty(),
            OnlineFetching::NeverFetch => false,
        };

        if fetch {
            evidence.extend(self.online_evidence(chain, &mut fetch_failures, certificate));
        }

        // Newest first; ties keep the order they were gathered in.
        evidence.sort_by_key(|e| std::cmp::Reverse(e.issued_at()));

        log::debug!(
            "{} revocation candidates for {}",
            evidence.len(),
            certificate.subject()
        );

        let mut inconclusive = ValidationReport::new();

        for candidate in &evidence {
            let mut local_report = ValidationReport::new();

            match candidate {
                Evidence::Crl {
                    crl,
                    generation_date,
                } => chain.crl_validator().validate(
                    chain,
                    &mut local_report,
                    &local_context,
                    certificate,
                    crl,
                    validation_date,
                    *generation_date,
                ),

                Evidence::Ocsp {
                    response,
                    single,
                    generation_date,
                } => chain.ocsp_validator().validate(
                    chain,
                    &mut local_report,
                    &local_context,
                    certificate,
                    single,
                    response,
                    validation_date,
                    *generation_date,
                ),
            }

            if local_report.validation_result() != ValidationResult::Indeterminate {
                report.merge(local_report);
                return;
            }

            inconclusive.merge(local_report);
        }

        report.merge(inconclusive);
        report.merge(fetch_failures);
        report_item!(REVOCATION_DATA_CHECK, NO_REVOCATION_DATA)
            .certificate(certificate)
            .indeterminate(report);
    }
}
