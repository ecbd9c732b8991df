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
use rasn_ocsp::{BasicOcspResponse as RasnBasicResponse, OcspResponseStatus};
use x509_parser::{prelude::*, x509::AlgorithmIdentifier};

use super::{serial_magnitude, X509Cert};
use crate::{
    certificate::{Certificate, CertificateRef},
    crl::CrlReason,
    ocsp::{BasicOcspResponse, CertStatus, ResponderId, SingleResponse},
    CryptoError,
};

/// A DER OCSP response with its basic response decoded.
#[derive(Clone, Debug)]
pub struct DerOcspResponse {
    der: Vec<u8>,
    responder_id: ResponderId,
    produced_at: DateTime<Utc>,
    responses: Vec<SingleResponse>,
    certificates: Vec<CertificateRef>,
    tbs_response_data: Vec<u8>,
    signature_algorithm: Vec<u8>,
    signature: Vec<u8>,
}

fn invalid<E: std::fmt::Display>(e: E) -> CryptoError {
    CryptoError::InvalidOcspResponse(e.to_string())
}

impl DerOcspResponse {
    /// Decodes a complete `OCSPResponse`. Only successful responses
    /// carrying a basic response are accepted.
    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        let ocsp_response = rasn::der::decode::<rasn_ocsp::OcspResponse>(der).map_err(invalid)?;

        if ocsp_response.status != OcspResponseStatus::Successful {
            return Err(invalid("response status is not successful"));
        }

        let Some(response_bytes) = ocsp_response.bytes else {
            return Err(invalid("response carries no response bytes"));
        };

        let basic = rasn::der::decode::<RasnBasicResponse>(&response_bytes.response)
            .map_err(invalid)?;

        let data = &basic.tbs_response_data;

        let responder_id = match &data.responder_id {
            rasn_ocsp::ResponderId::ByName(name) => {
                let name_der = rasn::der::encode(name).map_err(invalid)?;
                let (_, name) = X509Name::from_der(&name_der).map_err(invalid)?;
                ResponderId::ByName(name.to_string())
            }
            rasn_ocsp::ResponderId::ByKey(key_hash) => ResponderId::ByKey(key_hash.to_vec()),
        };

        let mut responses = Vec::new();
        for single in &data.responses {
            let serial_der = rasn::der::encode(&single.cert_id.serial_number).map_err(invalid)?;

            let cert_status = match &single.cert_status {
                rasn_ocsp::CertStatus::Good => CertStatus::Good,
                rasn_ocsp::CertStatus::Revoked(info) => CertStatus::Revoked {
                    revocation_time: info.revocation_time.with_timezone(&Utc),
                    reason: info
                        .revocation_reason
                        .clone()
                        .and_then(|reason| CrlReason::from_code(reason as u8)),
                },
                rasn_ocsp::CertStatus::Unknown(_) => CertStatus::Unknown,
            };

            responses.push(SingleResponse {
                serial_number: serial_magnitude(der_integer_content(&serial_der)?),
                issuer_name_hash: Some(single.cert_id.issuer_name_hash.to_vec()),
                cert_status,
                this_update: single.this_update.with_timezone(&Utc),
                next_update: single.next_update.map(|t| t.with_timezone(&Utc)),
            });
        }

        let mut certificates: Vec<CertificateRef> = Vec::new();
        if let Some(certs) = &basic.certs {
            for cert in certs {
                let cert_der = rasn::der::encode(cert).map_err(invalid)?;
                certificates.push(Arc::new(X509Cert::from_der(&cert_der)?));
            }
        }

        Ok(Self {
            der: der.to_vec(),
            responder_id,
            produced_at: data.produced_at.with_timezone(&Utc),
            responses,
            certificates,
            tbs_response_data: rasn::der::encode(data).map_err(invalid)?,
            signature_algorithm: rasn::der::encode(&basic.signature_algorithm).map_err(invalid)?,
            signature: basic.signature.as_raw_slice().to_vec(),
        })
    }
}

/// Content octets of a DER `INTEGER` encoding.
fn der_integer_content(der: &[u8]) -> Result<&[u8], CryptoError> {
    let len_byte = *der.get(1).ok_or_else(|| invalid("truncated integer"))?;

    let (len, start) = if len_byte < 0x80 {
        (len_byte as usize, 2)
    } else {
        let n = (len_byte & 0x7f) as usize;
        let len = der
            .get(2..2 + n)
            .ok_or_else(|| invalid("truncated integer"))?
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize);
        (len, 2 + n)
    };

    der.get(start..start + len)
        .ok_or_else(|| invalid("truncated integer"))
}

impl BasicOcspResponse for DerOcspResponse {
    fn encoded(&self) -> &[u8] {
        &self.der
    }

    fn responder_id(&self) -> &ResponderId {
        &self.responder_id
    }

    fn produced_at(&self) -> DateTime<Utc> {
        self.produced_at
    }

    fn responses(&self) -> &[SingleResponse] {
        &self.responses
    }

    fn certificates(&self) -> &[CertificateRef] {
        &self.certificates
    }

    fn verify(&self, responder: &dyn Certificate) -> bool {
        let Ok((_, responder)) = X509Certificate::from_der(responder.encoded()) else {
            return false;
        };
        let Ok((_, algorithm)) = AlgorithmIdentifier::from_der(&self.signature_algorithm) else {
            return false;
        };

        let signature = asn1_rs::BitString::new(0, &self.signature);

        x509_parser::verify::verify_signature(
            responder.public_key(),
            &algorithm,
            &signature,
            &self.tbs_response_data,
        )
        .is_ok()
    }
}
