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

//! The certificate abstraction the validators are written against.

use std::{
    fmt::{self, Debug, Display},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{base64, hash::sha256};

/// An X.509 certificate as seen by the trust validators.
///
/// Decoding and signature math are left to the implementation; the
/// validators only ask questions about names, dates and extensions.
pub trait Certificate: Debug + Send + Sync {
    /// DER encoding of the certificate. Two certificates with the same
    /// encoding are the same certificate.
    fn encoded(&self) -> &[u8];

    /// Subject distinguished name in RFC 4514 string form.
    fn subject(&self) -> &str;

    /// Issuer distinguished name in RFC 4514 string form.
    fn issuer(&self) -> &str;

    /// Serial number as big-endian magnitude bytes.
    fn serial_number(&self) -> &[u8];

    fn not_before(&self) -> DateTime<Utc>;

    fn not_after(&self) -> DateTime<Utc>;

    /// Raw bits of the subject public key (without the algorithm
    /// identifier). Used to match OCSP `ResponderID::ByKey`.
    fn public_key(&self) -> &[u8];

    /// Key usage extension, if present.
    fn key_usage(&self) -> Option<KeyUsage>;

    /// Extended key usage purposes as dotted OID strings, if the
    /// extension is present.
    fn extended_key_usage(&self) -> Option<Vec<String>>;

    /// Basic constraints extension, if present.
    fn basic_constraints(&self) -> Option<BasicConstraints>;

    /// Returns `true` if an extension with the given dotted OID is present.
    fn has_extension(&self, oid: &str) -> bool;

    /// URIs from the CRL distribution points extension.
    fn crl_distribution_points(&self) -> Vec<String> {
        Vec::new()
    }

    /// OCSP responder URIs from the authority information access extension.
    fn ocsp_responder_urls(&self) -> Vec<String> {
        Vec::new()
    }

    /// Returns `true` if `issuer`'s public key verifies the signature on
    /// this certificate.
    fn verify(&self, issuer: &dyn Certificate) -> bool;
}

/// Shared handle to a certificate. Report items and stores hold these
/// rather than copies.
pub type CertificateRef = Arc<dyn Certificate>;

/// Returns `true` if the two handles refer to the same certificate.
pub fn same_certificate(a: &dyn Certificate, b: &dyn Certificate) -> bool {
    a.encoded() == b.encoded()
}

/// Base64 SHA-256 fingerprint of the certificate's encoding.
pub fn fingerprint(cert: &dyn Certificate) -> String {
    base64::encode(&sha256(cert.encoded()))
}

/// A certificate is self-signed when it names itself as issuer and its
/// own key verifies its signature.
pub fn is_self_signed(cert: &dyn Certificate) -> bool {
    cert.subject() == cert.issuer() && cert.verify(cert)
}

/// Short human-readable form used in report messages.
pub fn display_name(cert: &dyn Certificate) -> String {
    format!(
        "{} (serial {})",
        cert.subject(),
        hex::encode(cert.serial_number())
    )
}

/// Key usage bits (RFC 5280 section 4.2.1.3).
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct KeyUsage(u16);

impl KeyUsage {
    pub const DIGITAL_SIGNATURE: KeyUsage = KeyUsage(1);
    pub const NON_REPUDIATION: KeyUsage = KeyUsage(1 << 1);
    pub const KEY_ENCIPHERMENT: KeyUsage = KeyUsage(1 << 2);
    pub const DATA_ENCIPHERMENT: KeyUsage = KeyUsage(1 << 3);
    pub const KEY_AGREEMENT: KeyUsage = KeyUsage(1 << 4);
    pub const KEY_CERT_SIGN: KeyUsage = KeyUsage(1 << 5);
    pub const CRL_SIGN: KeyUsage = KeyUsage(1 << 6);
    pub const ENCIPHER_ONLY: KeyUsage = KeyUsage(1 << 7);
    pub const DECIPHER_ONLY: KeyUsage = KeyUsage(1 << 8);

    pub const fn empty() -> Self {
        KeyUsage(0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        KeyUsage(bits & 0x1ff)
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: KeyUsage) -> bool {
        self.0 & other.0 == other.0
    }

    /// Parses one RFC 5280 key usage name such as `keyCertSign`.
    pub fn from_name(name: &str) -> Option<KeyUsage> {
        KEY_USAGE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|bit| KeyUsage(1 << bit))
    }
}

const KEY_USAGE_NAMES: [&str; 9] = [
    "digitalSignature",
    "nonRepudiation",
    "keyEncipherment",
    "dataEncipherment",
    "keyAgreement",
    "keyCertSign",
    "cRLSign",
    "encipherOnly",
    "decipherOnly",
];

impl std::ops::BitOr for KeyUsage {
    type Output = KeyUsage;

    fn bitor(self, rhs: KeyUsage) -> KeyUsage {
        KeyUsage(self.0 | rhs.0)
    }
}

impl Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = KEY_USAGE_NAMES
            .iter()
            .enumerate()
            .filter(|(bit, _)| self.0 & (1 << bit) != 0)
            .map(|(_, name)| *name)
            .collect();

        write!(f, "{}", names.join(", "))
    }
}

/// Basic constraints (RFC 5280 section 4.2.1.9).
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BasicConstraints {
    pub ca: bool,
    pub path_len_constraint: Option<u32>,
}
