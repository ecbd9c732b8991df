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

use std::time::Duration;

use log::debug;
use rasn::prelude::*;

use crate::{
    base64,
    certificate::Certificate,
    client::OcspClient,
    fetch::{agent, read_body, DEFAULT_TIMEOUT},
    CryptoError,
};

/// Queries the OCSP responders named in the certificate's authority
/// information access extension with RFC 6960 GET requests.
#[derive(Debug)]
pub struct HttpOcspClient {
    agent: ureq::Agent,
}

impl HttpOcspClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            agent: agent(timeout),
        }
    }
}

impl Default for HttpOcspClient {
    fn default() -> Self {
        Self::new()
    }
}

fn request_error<E: std::fmt::Display>(e: E) -> CryptoError {
    CryptoError::InvalidCertificate(e.to_string())
}

/// Builds the DER `OCSPRequest` for `certificate`.
fn build_request(
    certificate: &dyn Certificate,
    issuer: &dyn Certificate,
) -> Result<Vec<u8>, CryptoError> {
    let subject: rasn_pkix::Certificate =
        rasn::der::decode(certificate.encoded()).map_err(request_error)?;
    let issuer: rasn_pkix::Certificate =
        rasn::der::decode(issuer.encoded()).map_err(request_error)?;

    let sha1_oid = rasn::types::Oid::new(&[1, 3, 14, 3, 2, 26])
        .ok_or_else(|| request_error("bad SHA-1 OID"))?;
    let alg = rasn::types::ObjectIdentifier::from(sha1_oid);

    let sha1_ai = rasn_pkix::AlgorithmIdentifier {
        algorithm: alg,
        // Many OCSP responders expect this to be NULL not None.
        parameters: Some(Any::new(rasn::der::encode(&()).map_err(request_error)?)),
    };

    let issuer_name_raw =
        rasn::der::encode(&issuer.tbs_certificate.subject).map_err(request_error)?;

    let issuer_key_raw = issuer
        .tbs_certificate
        .subject_public_key_info
        .subject_public_key
        .as_raw_slice();

    let req_cert = rasn_ocsp::CertId {
        hash_algorithm: sha1_ai,
        issuer_name_hash: OctetString::from(crate::hash::sha1(&issuer_name_raw)),
        issuer_key_hash: OctetString::from(crate::hash::sha1(issuer_key_raw)),
        serial_number: subject.tbs_certificate.serial_number,
    };

    let tbs_request = rasn_ocsp::TbsRequest {
        version: rasn_ocsp::Version::from(0u8),
        requestor_name: None,
        request_list: vec![rasn_ocsp::Request {
            req_cert,
            single_request_extensions: None,
        }],
        request_extensions: None,
    };

    let ocsp_request = rasn_ocsp::OcspRequest {
        tbs_request,
        optional_signature: None,
    };

    rasn::der::encode(&ocsp_request).map_err(request_error)
}

impl OcspClient for HttpOcspClient {
    fn get_encoded(
        &self,
        certificate: &dyn Certificate,
        issuer: &dyn Certificate,
    ) -> Result<Option<Vec<u8>>, CryptoError> {
        let responders = certificate.ocsp_responder_urls();
        if responders.is_empty() {
            return Err(CryptoError::NoRevocationLocation);
        }

        let request_str = base64::encode(&build_request(certificate, issuer)?);

        for responder in responders {
            let fetch_failed = |reason: String| CryptoError::FetchFailed {
                url: responder.clone(),
                reason,
            };

            let url = url::Url::parse(&responder).map_err(|e| fetch_failed(e.to_string()))?;
            let req_url = url
                .join(&request_str)
                .map_err(|e| fetch_failed(e.to_string()))?;

            debug!("requesting OCSP response from {responder}");

            // for responders that don't support http 1.0
            let request = self.agent.get(req_url.as_str());
            let request = match url.host() {
                Some(host) => request.set("Host", &host.to_string()),
                None => request,
            };

            match request.call() {
                Ok(response) if response.status() == 200 => {
                    return read_body(&responder, response).map(Some);
                }
                Ok(response) => {
                    debug!("OCSP responder {responder} answered {}", response.status());
                }
                Err(e) => {
                    debug!("OCSP responder {responder} failed: {e}");
                }
            }
        }

        Ok(None)
    }
}
