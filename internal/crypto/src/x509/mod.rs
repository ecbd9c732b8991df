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

//! DER adapters for the certificate and revocation abstractions.
//!
//! Certificates and CRLs are read with `x509-parser`; OCSP responses are
//! read with `rasn-ocsp`, as in the rest of this crate.

mod certificate;
mod crl;
mod ocsp;

pub use certificate::X509Cert;
pub use crl::X509Crl;
pub use ocsp::DerOcspResponse;
use x509_parser::pem::Pem;

use crate::{
    certificate::CertificateRef, crl::CrlRef, decoder::RevocationDecoder,
    ocsp::OcspResponseRef, CryptoError,
};

/// Decodes DER CRLs and OCSP responses.
#[derive(Debug, Default)]
pub struct DerDecoder;

impl RevocationDecoder for DerDecoder {
    fn decode_crl(&self, encoded: &[u8]) -> Result<CrlRef, CryptoError> {
        Ok(std::sync::Arc::new(X509Crl::from_der(encoded)?))
    }

    fn decode_ocsp_response(&self, encoded: &[u8]) -> Result<OcspResponseRef, CryptoError> {
        Ok(std::sync::Arc::new(DerOcspResponse::from_der(encoded)?))
    }
}

/// Reads every certificate from a PEM bundle.
pub fn certificates_from_pem(pem: &[u8]) -> Result<Vec<CertificateRef>, CryptoError> {
    let mut certs: Vec<CertificateRef> = Vec::new();

    for pem_result in Pem::iter_from_buffer(pem) {
        let pem = pem_result.map_err(|e| CryptoError::InvalidPem(e.to_string()))?;

        if pem.label == "CERTIFICATE" || pem.label == "TRUSTED CERTIFICATE" {
            certs.push(std::sync::Arc::new(X509Cert::from_der(&pem.contents)?));
        }
    }

    Ok(certs)
}

/// Strips the sign padding from a DER integer's content octets.
pub(crate) fn serial_magnitude(raw: &[u8]) -> Vec<u8> {
    let first = raw.iter().position(|b| *b != 0).unwrap_or(raw.len().saturating_sub(1));
    raw[first..].to_vec()
}

pub(crate) fn timestamp_to_utc(ts: i64) -> Result<chrono::DateTime<chrono::Utc>, String> {
    chrono::DateTime::from_timestamp(ts, 0).ok_or_else(|| format!("time {ts} out of range"))
}
