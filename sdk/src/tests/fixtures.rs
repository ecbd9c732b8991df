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

//! Shared builders for the unit tests: an in-memory PKI, revocation
//! client doubles, a PDF revision builder and fake signatures.

#![allow(clippy::unwrap_used)]

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use pdfsig_crypto::{
    certificate::{Certificate, CertificateRef, KeyUsage},
    client::{CrlClient, OcspClient},
    oids,
    test_utils::{CertificateBuilder, TestCertificate, TestDecoder},
    CryptoError,
};
use pdfsig_report::ValidationReport;

use crate::{
    context::{CertificateSource, TimeBasedContext, ValidationContext, ValidatorContext},
    document::{DocumentRevision, ObjectRef, PdfDictionary, PdfObject, RevisionReader},
    signature::{Dss, PdfSignature, SignedDocument, TimeStampToken},
    validator_chain::{RevocationDataValidation, ValidatorChain, ValidatorChainBuilder},
    Error, Result,
};

pub(crate) fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// The fixed "now" of every test chain.
pub(crate) fn now() -> DateTime<Utc> {
    date(2024, 6, 1)
}

pub(crate) fn days(n: i64) -> TimeDelta {
    TimeDelta::days(n)
}

pub(crate) fn ctx(
    validator: ValidatorContext,
    source: CertificateSource,
    time_based: TimeBasedContext,
) -> ValidationContext {
    ValidationContext::new(validator, source, time_based)
}

/// Context of a signer certificate checked at the present time.
pub(crate) fn signer_ctx() -> ValidationContext {
    ctx(
        ValidatorContext::SignatureValidator,
        CertificateSource::SignerCert,
        TimeBasedContext::Present,
    )
}

pub(crate) fn cert_with<F>(f: F) -> CertificateRef
where
    F: FnOnce(CertificateBuilder) -> CertificateBuilder,
{
    f(TestCertificate::builder("CN=Test Certificate")).build()
}

/// A root CA and an end-entity certificate it issued.
pub(crate) struct Pki {
    pub root: CertificateRef,
    pub signer: CertificateRef,
}

impl Pki {
    pub fn new() -> Self {
        let root = TestCertificate::builder("CN=Root CA").ca(None).build();
        let signer = TestCertificate::builder("CN=Signer")
            .issued_by(root.as_ref())
            .serial(2)
            .key_usage(KeyUsage::DIGITAL_SIGNATURE | KeyUsage::NON_REPUDIATION)
            .build();

        Self { root, signer }
    }

    /// An intermediate CA issued by the root.
    pub fn intermediate(&self, subject: &str, serial: u64) -> CertificateRef {
        TestCertificate::builder(subject)
            .issued_by(self.root.as_ref())
            .serial(serial)
            .ca(None)
            .build()
    }

    /// An end-entity certificate issued by the root.
    pub fn leaf<F>(&self, subject: &str, serial: u64, f: F) -> CertificateRef
    where
        F: FnOnce(CertificateBuilder) -> CertificateBuilder,
    {
        f(TestCertificate::builder(subject)
            .issued_by(self.root.as_ref())
            .serial(serial))
        .build()
    }

    pub fn tsa(&self) -> CertificateRef {
        self.leaf("CN=Timestamp Authority", 3, |b| {
            b.extended_key_usage(&[oids::TIME_STAMPING])
        })
    }

    /// A chain builder that trusts the root, decodes test encodings and
    /// runs at [`now`].
    pub fn chain(&self) -> ValidatorChainBuilder {
        test_chain().trusted_certificates([self.root.clone()])
    }
}

pub(crate) fn test_chain() -> ValidatorChainBuilder {
    ValidatorChain::builder()
        .decoder(Arc::new(TestDecoder))
        .current_time(now())
}

/// Revocation stage that checks nothing.
#[derive(Debug, Default)]
pub(crate) struct NoRevocationCheck;

impl RevocationDataValidation for NoRevocationCheck {
    fn validate(
        &self,
        _chain: &ValidatorChain,
        _report: &mut ValidationReport,
        _context: &ValidationContext,
        _certificate: &CertificateRef,
        _validation_date: DateTime<Utc>,
    ) {
    }
}

/// CRL client answering with fixed encodings and counting its calls.
#[derive(Debug, Default)]
pub(crate) struct StaticCrlClient {
    pub encoded: Vec<Vec<u8>>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StaticCrlClient {
    pub fn returning(encoded: Vec<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            encoded,
            ..Default::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CrlClient for StaticCrlClient {
    fn get_encoded(
        &self,
        _certificate: &dyn Certificate,
        _issuer: Option<&dyn Certificate>,
    ) -> std::result::Result<Vec<Vec<u8>>, CryptoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CryptoError::FetchFailed {
                url: "http://crl.example.com/root.crl".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(self.encoded.clone())
    }
}

/// OCSP client answering with a fixed encoding.
#[derive(Debug, Default)]
pub(crate) struct StaticOcspClient {
    pub encoded: Option<Vec<u8>>,
    pub calls: AtomicUsize,
}

impl StaticOcspClient {
    pub fn returning(encoded: Option<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            encoded,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcspClient for StaticOcspClient {
    fn get_encoded(
        &self,
        _certificate: &dyn Certificate,
        _issuer: &dyn Certificate,
    ) -> std::result::Result<Option<Vec<u8>>, CryptoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.encoded.clone())
    }
}

pub(crate) fn messages(report: &ValidationReport) -> Vec<String> {
    report.logs().iter().map(|item| item.message.to_string()).collect()
}

pub(crate) fn failure_messages(report: &ValidationReport) -> Vec<String> {
    report.failures().map(|item| item.message.to_string()).collect()
}

pub(crate) fn has_message(report: &ValidationReport, message: &str) -> bool {
    report.logs().iter().any(|item| item.message == message)
}

const CATALOG: u32 = 1;
const PAGES: u32 = 2;
const PAGE: u32 = 3;
const ACROFORM: u32 = 4;

/// Builds a document one incremental update at a time.
///
/// Starts with a catalog, a single page and an empty AcroForm. Every
/// object written between two [`commit`](Self::commit) calls lands in the
/// next revision's modified set.
#[derive(Clone, Debug)]
pub(crate) struct DocBuilder {
    objects: BTreeMap<ObjectRef, PdfObject>,
    trailer: PdfDictionary,
    modified: BTreeSet<ObjectRef>,
    next_number: u32,
    revisions: Vec<DocumentRevision>,
    fail: bool,
}

impl DocBuilder {
    pub fn new() -> Self {
        let mut doc = Self {
            objects: BTreeMap::new(),
            trailer: BTreeMap::new(),
            modified: BTreeSet::new(),
            next_number: ACROFORM + 1,
            revisions: Vec::new(),
            fail: false,
        };

        doc.set(
            CATALOG,
            PdfObject::dict([
                ("Type", PdfObject::name("Catalog")),
                ("Pages", PdfObject::reference(PAGES)),
                ("AcroForm", PdfObject::reference(ACROFORM)),
            ]),
        );
        doc.set(
            PAGES,
            PdfObject::dict([
                ("Type", PdfObject::name("Pages")),
                ("Kids", PdfObject::Array(vec![PdfObject::reference(PAGE)])),
                ("Count", PdfObject::Integer(1)),
            ]),
        );
        doc.set(
            PAGE,
            PdfObject::dict([
                ("Type", PdfObject::name("Page")),
                ("Parent", PdfObject::reference(PAGES)),
                ("Annots", PdfObject::Array(Vec::new())),
            ]),
        );
        doc.set(
            ACROFORM,
            PdfObject::dict([("Fields", PdfObject::Array(Vec::new()))]),
        );
        doc.trailer
            .insert("Root".to_string(), PdfObject::reference(CATALOG));

        doc
    }

    /// A reader whose revisions cannot be read.
    pub fn broken() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn set(&mut self, number: u32, object: PdfObject) {
        let reference = ObjectRef::new(number, 0);
        self.objects.insert(reference, object);
        self.modified.insert(reference);
    }

    pub fn add(&mut self, object: PdfObject) -> ObjectRef {
        let number = self.next_number;
        self.next_number += 1;
        self.set(number, object);
        ObjectRef::new(number, 0)
    }

    /// Mutable access to a dictionary object; marks it modified.
    pub fn dict_mut(&mut self, reference: ObjectRef) -> &mut PdfDictionary {
        self.modified.insert(reference);
        self.objects
            .get_mut(&reference)
            .and_then(PdfObject::as_dict_mut)
            .unwrap()
    }

    pub fn catalog_mut(&mut self) -> &mut PdfDictionary {
        self.dict_mut(ObjectRef::new(CATALOG, 0))
    }

    pub fn page_ref(&self) -> ObjectRef {
        ObjectRef::new(PAGE, 0)
    }

    fn push_array(&mut self, reference: ObjectRef, key: &str, value: PdfObject) {
        if let Some(PdfObject::Array(items)) = self.dict_mut(reference).get_mut(key) {
            items.push(value);
        }
    }

    /// Adds a widget annotation that is also a form field.
    fn add_widget_field(&mut self, mut field: PdfDictionary) -> ObjectRef {
        field.insert("Type".into(), PdfObject::name("Annot"));
        field.insert("Subtype".into(), PdfObject::name("Widget"));
        field.insert("P".into(), PdfObject::reference(PAGE));

        let reference = self.add(PdfObject::Dictionary(field));
        self.push_array(ObjectRef::new(ACROFORM, 0), "Fields", PdfObject::Reference(reference));
        self.push_array(self.page_ref(), "Annots", PdfObject::Reference(reference));
        reference
    }

    /// Adds a signed signature field; returns the field and the
    /// signature dictionary references.
    pub fn sign(&mut self, name: &str, signature: PdfObject) -> (ObjectRef, ObjectRef) {
        let sig = self.add(signature);
        let field = self.add_widget_field(BTreeMap::from([
            ("FT".to_string(), PdfObject::name("Sig")),
            ("T".to_string(), PdfObject::string(name)),
            ("V".to_string(), PdfObject::Reference(sig)),
        ]));
        (field, sig)
    }

    /// Adds a certification signature and points `/Perms /DocMDP` at it.
    pub fn certify(&mut self, name: &str, p: i64) -> ObjectRef {
        let (field, sig) = self.sign(name, certification_signature(p));
        self.catalog_mut().insert(
            "Perms".into(),
            PdfObject::dict([("DocMDP", PdfObject::Reference(sig))]),
        );
        field
    }

    pub fn add_text_field(&mut self, name: &str, value: &str) -> ObjectRef {
        self.add_widget_field(BTreeMap::from([
            ("FT".to_string(), PdfObject::name("Tx")),
            ("T".to_string(), PdfObject::string(name)),
            ("V".to_string(), PdfObject::string(value)),
        ]))
    }

    pub fn add_empty_signature_field(&mut self, name: &str) -> ObjectRef {
        self.add_widget_field(BTreeMap::from([
            ("FT".to_string(), PdfObject::name("Sig")),
            ("T".to_string(), PdfObject::string(name)),
        ]))
    }

    /// Adds a non-widget annotation to the page.
    pub fn annotate(&mut self, contents: &str) -> ObjectRef {
        let annot = self.add(PdfObject::dict([
            ("Type", PdfObject::name("Annot")),
            ("Subtype", PdfObject::name("Text")),
            ("Contents", PdfObject::string(contents)),
            ("P", PdfObject::reference(PAGE)),
        ]));
        self.push_array(self.page_ref(), "Annots", PdfObject::Reference(annot));
        annot
    }

    pub fn add_dss(&mut self) -> ObjectRef {
        let dss = self.add(PdfObject::dict([
            ("Certs", PdfObject::Array(Vec::new())),
            ("CRLs", PdfObject::Array(Vec::new())),
        ]));
        self.catalog_mut().insert("DSS".into(), PdfObject::Reference(dss));
        dss
    }

    /// Closes the current incremental update.
    pub fn commit(&mut self) -> &mut Self {
        let size = (self.revisions.len() as u64 + 1) * 1000;
        self.revisions.push(DocumentRevision::new(
            self.objects.clone(),
            self.trailer.clone(),
            std::mem::take(&mut self.modified),
            (0, size),
        ));
        self
    }

    pub fn revisions(&self) -> Vec<DocumentRevision> {
        self.revisions.clone()
    }

    pub fn last(&self) -> DocumentRevision {
        self.revisions.last().cloned().unwrap()
    }
}

impl RevisionReader for DocBuilder {
    fn all_revisions(&self) -> Result<Vec<DocumentRevision>> {
        if self.fail {
            return Err(Error::RevisionReadError("truncated cross-reference table".into()));
        }
        Ok(self.revisions())
    }
}

pub(crate) fn transform_reference(method: &str, params: PdfObject) -> PdfObject {
    PdfObject::dict([
        ("Type", PdfObject::name("SigRef")),
        ("TransformMethod", PdfObject::name(method)),
        ("TransformParams", params),
    ])
}

pub(crate) fn certification_signature(p: i64) -> PdfObject {
    PdfObject::dict([
        ("Type", PdfObject::name("Sig")),
        ("Filter", PdfObject::name("Adobe.PPKLite")),
        ("SubFilter", PdfObject::name("ETSI.CAdES.detached")),
        (
            "Reference",
            PdfObject::Array(vec![transform_reference(
                "DocMDP",
                PdfObject::dict([
                    ("Type", PdfObject::name("TransformParams")),
                    ("P", PdfObject::Integer(p)),
                    ("V", PdfObject::name("1.2")),
                ]),
            )]),
        ),
    ])
}

pub(crate) fn approval_signature() -> PdfObject {
    PdfObject::dict([
        ("Type", PdfObject::name("Sig")),
        ("Filter", PdfObject::name("Adobe.PPKLite")),
        ("SubFilter", PdfObject::name("ETSI.CAdES.detached")),
    ])
}

pub(crate) fn document_timestamp() -> PdfObject {
    PdfObject::dict([
        ("Type", PdfObject::name("DocTimeStamp")),
        ("SubFilter", PdfObject::name("ETSI.RFC3161")),
    ])
}

/// Timestamp token double.
#[derive(Debug)]
pub(crate) struct TestToken {
    pub verifies: bool,
    pub gen_time: DateTime<Utc>,
    pub signer: Option<CertificateRef>,
}

impl TimeStampToken for TestToken {
    fn verify(&self) -> Result<bool> {
        Ok(self.verifies)
    }

    fn gen_time(&self) -> DateTime<Utc> {
        self.gen_time
    }

    fn signer_certificate(&self) -> Option<CertificateRef> {
        self.signer.clone()
    }

    fn certificates(&self) -> Vec<CertificateRef> {
        self.signer.iter().cloned().collect()
    }
}

/// Outcome of [`TestSignature::verify_integrity`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Integrity {
    Intact,
    Broken,
    Unreadable,
}

/// Signature double.
#[derive(Debug)]
pub(crate) struct TestSignature {
    pub name: String,
    pub covers_whole_document: bool,
    pub integrity: Integrity,
    pub signer: Option<CertificateRef>,
    pub certificates: Vec<CertificateRef>,
    pub document_timestamp: bool,
    pub token: Option<Arc<TestToken>>,
    pub crls: Vec<Vec<u8>>,
}

impl TestSignature {
    pub fn signed_by(name: &str, signer: &CertificateRef) -> Self {
        Self {
            name: name.to_string(),
            covers_whole_document: true,
            integrity: Integrity::Intact,
            signer: Some(signer.clone()),
            certificates: vec![signer.clone()],
            document_timestamp: false,
            token: None,
            crls: Vec::new(),
        }
    }

    pub fn timestamp(name: &str, token: TestToken) -> Self {
        Self {
            name: name.to_string(),
            covers_whole_document: true,
            integrity: Integrity::Intact,
            signer: None,
            certificates: Vec::new(),
            document_timestamp: true,
            token: Some(Arc::new(token)),
            crls: Vec::new(),
        }
    }
}

impl PdfSignature for TestSignature {
    fn name(&self) -> &str {
        &self.name
    }

    fn covers_whole_document(&self) -> bool {
        self.covers_whole_document
    }

    fn verify_integrity(&self) -> Result<bool> {
        match self.integrity {
            Integrity::Intact => Ok(true),
            Integrity::Broken => Ok(false),
            Integrity::Unreadable => Err(Error::SignatureContainerError(
                "unexpected end of SignedData".into(),
            )),
        }
    }

    fn signing_certificate(&self) -> Option<CertificateRef> {
        self.signer.clone()
    }

    fn certificates(&self) -> Vec<CertificateRef> {
        self.certificates.clone()
    }

    fn is_document_timestamp(&self) -> bool {
        self.document_timestamp
    }

    fn timestamp_token(&self) -> Option<Arc<dyn TimeStampToken>> {
        self.token.clone().map(|t| t as Arc<dyn TimeStampToken>)
    }

    fn crls(&self) -> Vec<Vec<u8>> {
        self.crls.clone()
    }
}

/// Signed document double.
#[derive(Debug, Default)]
pub(crate) struct TestDocument {
    pub revisions: Option<DocBuilder>,
    pub signatures: Vec<Arc<TestSignature>>,
    pub dss: Dss,
    pub unreadable: bool,
}

impl TestDocument {
    pub fn with_signatures(signatures: Vec<TestSignature>) -> Self {
        Self {
            signatures: signatures.into_iter().map(Arc::new).collect(),
            ..Default::default()
        }
    }
}

impl RevisionReader for TestDocument {
    fn all_revisions(&self) -> Result<Vec<DocumentRevision>> {
        match &self.revisions {
            Some(doc) => doc.all_revisions(),
            None => Ok(Vec::new()),
        }
    }
}

impl SignedDocument for TestDocument {
    fn signatures(&self) -> Result<Vec<Arc<dyn PdfSignature>>> {
        if self.unreadable {
            return Err(Error::SignatureContainerError("no /ByteRange".into()));
        }
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
