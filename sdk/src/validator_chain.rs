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

//! Wiring between the validation stages.
//!
//! Each stage is a trait object held by a [`ValidatorChain`]. Stages
//! receive the chain on every call and reach the next stage through it,
//! so a test can replace any one stage with a double.

use std::{fmt::Debug, sync::Arc};

use chrono::{DateTime, Utc};
use pdfsig_crypto::{
    certificate::CertificateRef,
    client::{CrlClient, OcspClient},
    crl::CrlRef,
    decoder::{default_decoder, RevocationDecoder},
    ocsp::{OcspResponseRef, SingleResponse},
    utc_now,
};
use pdfsig_report::ValidationReport;

use crate::{
    chain_validator::CertificateChainValidator,
    context::ValidationContext,
    properties::SignatureValidationProperties,
    revocation::{
        crl_validator::CheckedCrlReasons, CrlValidator, OcspValidator, RevocationDataValidator,
        SuppliedRevocationData,
    },
    signature::SignatureValidator,
    trust::IssuingCertificateRetriever,
};

/// Validates a certificate and its issuers.
pub trait CertificateChainValidation: Debug + Send + Sync {
    fn validate(
        &self,
        chain: &ValidatorChain,
        report: &mut ValidationReport,
        context: &ValidationContext,
        certificate: &CertificateRef,
        validation_date: DateTime<Utc>,
    );
}

/// Decides whether a certificate was revoked at the validation date.
pub trait RevocationDataValidation: Debug + Send + Sync {
    fn validate(
        &self,
        chain: &ValidatorChain,
        report: &mut ValidationReport,
        context: &ValidationContext,
        certificate: &CertificateRef,
        validation_date: DateTime<Utc>,
    );
}

/// Checks a certificate against one CRL.
pub trait CrlValidation: Debug + Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn validate(
        &self,
        chain: &ValidatorChain,
        report: &mut ValidationReport,
        context: &ValidationContext,
        certificate: &CertificateRef,
        crl: &CrlRef,
        validation_date: DateTime<Utc>,
        response_generation_date: DateTime<Utc>,
    );
}

/// Checks a certificate against one OCSP single response.
pub trait OcspValidation: Debug + Send + Sync {
    #[allow(clippy::too_many_arguments)]
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
    );
}

/// The configured set of validators and the data they share.
///
/// Cloning is cheap; everything inside is reference counted.
#[derive(Clone, Debug)]
pub struct ValidatorChain {
    properties: Arc<SignatureValidationProperties>,
    retriever: Arc<IssuingCertificateRetriever>,
    crl_clients: Vec<Arc<dyn CrlClient>>,
    ocsp_clients: Vec<Arc<dyn OcspClient>>,
    decoder: Arc<dyn RevocationDecoder>,
    supplied: Arc<SuppliedRevocationData>,
    chain_validator: Arc<dyn CertificateChainValidation>,
    revocation_validator: Arc<dyn RevocationDataValidation>,
    crl_validator: Arc<dyn CrlValidation>,
    ocsp_validator: Arc<dyn OcspValidation>,
    current_time: Option<DateTime<Utc>>,
    validate_document_revisions: bool,
    checked_crl_reasons: Arc<CheckedCrlReasons>,
}

impl Default for ValidatorChain {
    fn default() -> Self {
        ValidatorChainBuilder::new().build()
    }
}

impl ValidatorChain {
    pub fn builder() -> ValidatorChainBuilder {
        ValidatorChainBuilder::new()
    }

    /// Validates `certificate` and its chain in `context` and returns the
    /// findings.
    pub fn validate_certificate(
        &self,
        context: &ValidationContext,
        certificate: &CertificateRef,
        validation_date: DateTime<Utc>,
    ) -> ValidationReport {
        // CRL reason coverage never carries over from an earlier validation.
        let mut chain = self.clone();
        chain.checked_crl_reasons = Arc::default();

        let mut report = ValidationReport::new();
        chain
            .chain_validator
            .validate(&chain, &mut report, context, certificate, validation_date);
        report
    }

    /// A validator for the signatures of a document, sharing this chain.
    pub fn signature_validator(&self) -> SignatureValidator {
        SignatureValidator::new(self.clone())
    }

    /// Copy of this chain that also knows `certificates`.
    pub fn with_known_certificates<I>(&self, certificates: I) -> Self
    where
        I: IntoIterator<Item = CertificateRef>,
    {
        let mut chain = self.clone();
        Arc::make_mut(&mut chain.retriever).add_known_certificates(certificates);
        chain
    }

    /// Copy of this chain that also considers `supplied` revocation data.
    pub fn with_supplied_revocation_data(&self, supplied: SuppliedRevocationData) -> Self {
        let mut chain = self.clone();
        Arc::make_mut(&mut chain.supplied).extend(supplied);
        chain
    }

    /// The time validation happens at. Fixed when the builder set one.
    pub fn now(&self) -> DateTime<Utc> {
        self.current_time.unwrap_or_else(utc_now)
    }

    pub fn properties(&self) -> &SignatureValidationProperties {
        &self.properties
    }

    pub fn retriever(&self) -> &IssuingCertificateRetriever {
        &self.retriever
    }

    pub fn crl_clients(&self) -> &[Arc<dyn CrlClient>] {
        &self.crl_clients
    }

    pub fn ocsp_clients(&self) -> &[Arc<dyn OcspClient>] {
        &self.ocsp_clients
    }

    pub fn decoder(&self) -> &dyn RevocationDecoder {
        self.decoder.as_ref()
    }

    pub fn supplied_revocation_data(&self) -> &SuppliedRevocationData {
        &self.supplied
    }

    pub fn certificate_chain_validator(&self) -> &dyn CertificateChainValidation {
        self.chain_validator.as_ref()
    }

    pub fn revocation_data_validator(&self) -> &dyn RevocationDataValidation {
        self.revocation_validator.as_ref()
    }

    pub fn crl_validator(&self) -> &dyn CrlValidation {
        self.crl_validator.as_ref()
    }

    pub fn ocsp_validator(&self) -> &dyn OcspValidation {
        self.ocsp_validator.as_ref()
    }

    /// Whether signature validation first checks the document revisions.
    pub fn validate_document_revisions(&self) -> bool {
        self.validate_document_revisions
    }

    /// CRL reasons covered so far in the current validation.
    pub fn checked_crl_reasons(&self) -> &CheckedCrlReasons {
        &self.checked_crl_reasons
    }
}

/// Assembles a [`ValidatorChain`]. Every stage defaults to the standard
/// validator.
#[derive(Debug)]
pub struct ValidatorChainBuilder {
    properties: SignatureValidationProperties,
    retriever: IssuingCertificateRetriever,
    crl_clients: Vec<Arc<dyn CrlClient>>,
    ocsp_clients: Vec<Arc<dyn OcspClient>>,
    decoder: Option<Arc<dyn RevocationDecoder>>,
    supplied: SuppliedRevocationData,
    chain_validator: Option<Arc<dyn CertificateChainValidation>>,
    revocation_validator: Option<Arc<dyn RevocationDataValidation>>,
    crl_validator: Option<Arc<dyn CrlValidation>>,
    ocsp_validator: Option<Arc<dyn OcspValidation>>,
    current_time: Option<DateTime<Utc>>,
    validate_document_revisions: bool,
}

impl Default for ValidatorChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorChainBuilder {
    pub fn new() -> Self {
        Self {
            properties: SignatureValidationProperties::default(),
            retriever: IssuingCertificateRetriever::default(),
            crl_clients: Vec::new(),
            ocsp_clients: Vec::new(),
            decoder: None,
            supplied: SuppliedRevocationData::default(),
            chain_validator: None,
            revocation_validator: None,
            crl_validator: None,
            ocsp_validator: None,
            current_time: None,
            validate_document_revisions: true,
        }
    }

    pub fn properties(mut self, properties: SignatureValidationProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn retriever(mut self, retriever: IssuingCertificateRetriever) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn trusted_certificates<I>(mut self, certificates: I) -> Self
    where
        I: IntoIterator<Item = CertificateRef>,
    {
        self.retriever.add_trusted_certificates(certificates);
        self
    }

    pub fn known_certificates<I>(mut self, certificates: I) -> Self
    where
        I: IntoIterator<Item = CertificateRef>,
    {
        self.retriever.add_known_certificates(certificates);
        self
    }

    /// Registers a CRL source. All registered sources are queried.
    pub fn crl_client(mut self, client: Arc<dyn CrlClient>) -> Self {
        self.crl_clients.push(client);
        self
    }

    /// Registers an OCSP source. All registered sources are queried.
    pub fn ocsp_client(mut self, client: Arc<dyn OcspClient>) -> Self {
        self.ocsp_clients.push(client);
        self
    }

    pub fn decoder(mut self, decoder: Arc<dyn RevocationDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn supplied_revocation_data(mut self, supplied: SuppliedRevocationData) -> Self {
        self.supplied = supplied;
        self
    }

    pub fn certificate_chain_validator(
        mut self,
        validator: Arc<dyn CertificateChainValidation>,
    ) -> Self {
        self.chain_validator = Some(validator);
        self
    }

    pub fn revocation_data_validator(
        mut self,
        validator: Arc<dyn RevocationDataValidation>,
    ) -> Self {
        self.revocation_validator = Some(validator);
        self
    }

    pub fn crl_validator(mut self, validator: Arc<dyn CrlValidation>) -> Self {
        self.crl_validator = Some(validator);
        self
    }

    pub fn ocsp_validator(mut self, validator: Arc<dyn OcspValidation>) -> Self {
        self.ocsp_validator = Some(validator);
        self
    }

    /// Fixes the time used as "now" instead of reading the clock.
    pub fn current_time(mut self, now: DateTime<Utc>) -> Self {
        self.current_time = Some(now);
        self
    }

    pub fn validate_document_revisions(mut self, enabled: bool) -> Self {
        self.validate_document_revisions = enabled;
        self
    }

    pub fn build(self) -> ValidatorChain {
        ValidatorChain {
            properties: Arc::new(self.properties),
            retriever: Arc::new(self.retriever),
            crl_clients: self.crl_clients,
            ocsp_clients: self.ocsp_clients,
            decoder: self.decoder.unwrap_or_else(default_decoder),
            supplied: Arc::new(self.supplied),
            chain_validator: self
                .chain_validator
                .unwrap_or_else(|| Arc::new(CertificateChainValidator)),
            revocation_validator: self
                .revocation_validator
                .unwrap_or_else(|| Arc::new(RevocationDataValidator)),
            crl_validator: self
                .crl_validator
                .unwrap_or_else(|| Arc::new(CrlValidator::new())),
            ocsp_validator: self
                .ocsp_validator
                .unwrap_or_else(|| Arc::new(OcspValidator)),
            current_time: self.current_time,
            validate_document_revisions: self.validate_document_revisions,
            checked_crl_reasons: Arc::default(),
        }
    }
}
