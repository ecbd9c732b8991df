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

//! Tools for working with OCSP responses.

use std::{fmt::Debug, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    certificate::{Certificate, CertificateRef},
    crl::CrlReason,
    hash::sha1,
};

#[cfg(all(feature = "fetch", not(target_arch = "wasm32")))]
pub(crate) mod fetch;

/// A decoded `BasicOCSPResponse` (RFC 6960 section 4.2.1).
pub trait BasicOcspResponse: Debug + Send + Sync {
    /// DER encoding of the enclosing `OCSPResponse`.
    fn encoded(&self) -> &[u8];

    fn responder_id(&self) -> &ResponderId;

    fn produced_at(&self) -> DateTime<Utc>;

    fn responses(&self) -> &[SingleResponse];

    /// Certificates carried in the response's `certs` field.
    fn certificates(&self) -> &[CertificateRef];

    /// Returns `true` if `responder`'s public key verifies the response
    /// signature.
    fn verify(&self, responder: &dyn Certificate) -> bool;
}

pub type OcspResponseRef = Arc<dyn BasicOcspResponse>;

/// How the responder identifies itself.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ResponderId {
    /// Subject distinguished name of the responder certificate.
    ByName(String),

    /// SHA-1 hash of the responder's public key bits.
    ByKey(Vec<u8>),
}

impl ResponderId {
    /// Returns `true` if `cert` is the certificate this id names.
    pub fn matches(&self, cert: &dyn Certificate) -> bool {
        match self {
            ResponderId::ByName(name) => name == cert.subject(),
            ResponderId::ByKey(key_hash) => *key_hash == sha1(cert.public_key()),
        }
    }
}

/// Status of one certificate inside an OCSP response.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SingleResponse {
    /// Serial number from the `CertID`.
    pub serial_number: Vec<u8>,

    /// SHA-1 hash of the issuer's distinguished name, if known.
    pub issuer_name_hash: Option<Vec<u8>>,

    pub cert_status: CertStatus,

    pub this_update: DateTime<Utc>,

    pub next_update: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum CertStatus {
    Good,
    Revoked {
        revocation_time: DateTime<Utc>,
        reason: Option<CrlReason>,
    },
    Unknown,
}
