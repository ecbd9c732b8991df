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

//! The view of a signed document that signature validation needs.
//!
//! Parsing PDF files and CMS containers happens outside this crate; a
//! caller hands the validator a [`SignedDocument`] whose signatures
//! already know how to check their own bytes.

use std::{fmt::Debug, sync::Arc};

use chrono::{DateTime, Utc};
use pdfsig_crypto::certificate::CertificateRef;

use crate::{document::RevisionReader, Result};

mod signature_validator;

pub use signature_validator::*;

/// An RFC 3161 timestamp token.
pub trait TimeStampToken: Debug + Send + Sync {
    /// Checks the token signature and its message imprint. `Ok(false)`
    /// means the token is well formed but does not verify.
    fn verify(&self) -> Result<bool>;

    /// `genTime` from the token's `TSTInfo`.
    fn gen_time(&self) -> DateTime<Utc>;

    fn signer_certificate(&self) -> Option<CertificateRef>;

    /// Certificates carried in the token's `SignedData`.
    fn certificates(&self) -> Vec<CertificateRef> {
        Vec::new()
    }
}

/// One signature dictionary of a document and its CMS container.
pub trait PdfSignature: Debug + Send + Sync {
    /// Fully qualified name of the signature field.
    fn name(&self) -> &str;

    /// Returns `true` if the byte range covers the whole file.
    fn covers_whole_document(&self) -> bool;

    /// Checks the signed digest and the signature value. `Err` is
    /// returned when the container cannot be read at all.
    fn verify_integrity(&self) -> Result<bool>;

    fn signing_certificate(&self) -> Option<CertificateRef>;

    /// Every certificate carried in the signature container.
    fn certificates(&self) -> Vec<CertificateRef>;

    /// Returns `true` for a document timestamp (`/Type /DocTimeStamp`).
    fn is_document_timestamp(&self) -> bool;

    /// For a document timestamp, the token itself; otherwise the
    /// signature timestamp attribute, if any.
    fn timestamp_token(&self) -> Option<Arc<dyn TimeStampToken>>;

    /// Encoded CRLs from the `adbe-revocationInfoArchival` attribute.
    fn crls(&self) -> Vec<Vec<u8>> {
        Vec::new()
    }

    /// Encoded OCSP responses from the `adbe-revocationInfoArchival`
    /// attribute.
    fn ocsp_responses(&self) -> Vec<Vec<u8>> {
        Vec::new()
    }
}

/// Contents of the document security store.
#[derive(Clone, Debug, Default)]
pub struct Dss {
    pub certificates: Vec<CertificateRef>,
    pub crls: Vec<Vec<u8>>,
    pub ocsp_responses: Vec<Vec<u8>>,
}

/// A signed PDF document.
pub trait SignedDocument: RevisionReader {
    /// Signatures in the order they were applied.
    fn signatures(&self) -> Result<Vec<Arc<dyn PdfSignature>>>;

    fn dss(&self) -> Dss;
}
