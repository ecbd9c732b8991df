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

//! Certificate revocation lists.

use std::{fmt::Debug, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::certificate::Certificate;

/// A decoded certificate revocation list.
pub trait Crl: Debug + Send + Sync {
    /// DER encoding of the CRL.
    fn encoded(&self) -> &[u8];

    /// Issuer distinguished name in RFC 4514 string form.
    fn issuer(&self) -> &str;

    fn this_update(&self) -> DateTime<Utc>;

    fn next_update(&self) -> Option<DateTime<Utc>>;

    /// Looks up the entry for a certificate serial number.
    fn revoked_certificate(&self, serial_number: &[u8]) -> Option<RevokedCertificate>;

    /// Issuing distribution point extension, if present.
    fn issuing_distribution_point(&self) -> Option<IssuingDistributionPoint>;

    /// Value of the expired-certs-on-CRL extension (2.5.29.60), if present.
    fn expired_certs_on_crl(&self) -> Option<DateTime<Utc>>;

    /// Returns `true` if `issuer`'s public key verifies the CRL signature.
    fn verify(&self, issuer: &dyn Certificate) -> bool;
}

pub type CrlRef = Arc<dyn Crl>;

/// One revoked certificate entry.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RevokedCertificate {
    pub serial_number: Vec<u8>,
    pub revocation_date: DateTime<Utc>,
    pub reason: Option<CrlReason>,
}

/// CRL entry reason codes (RFC 5280 section 5.3.1).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum CrlReason {
    Unspecified,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
    RemoveFromCrl,
    PrivilegeWithdrawn,
    AaCompromise,
}

impl CrlReason {
    /// Maps the ASN.1 enumerated value. Value 7 is unassigned.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => CrlReason::Unspecified,
            1 => CrlReason::KeyCompromise,
            2 => CrlReason::CaCompromise,
            3 => CrlReason::AffiliationChanged,
            4 => CrlReason::Superseded,
            5 => CrlReason::CessationOfOperation,
            6 => CrlReason::CertificateHold,
            8 => CrlReason::RemoveFromCrl,
            9 => CrlReason::PrivilegeWithdrawn,
            10 => CrlReason::AaCompromise,
            _ => return None,
        })
    }
}

/// Issuing distribution point (RFC 5280 section 5.2.5).
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct IssuingDistributionPoint {
    pub only_contains_user_certs: bool,
    pub only_contains_ca_certs: bool,
    pub only_contains_attribute_certs: bool,
    pub only_some_reasons: Option<ReasonFlags>,
    pub indirect_crl: bool,
}

/// `ReasonFlags` bit string. Bit 0 (`unused`) is never set.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ReasonFlags(u16);

impl ReasonFlags {
    pub const KEY_COMPROMISE: ReasonFlags = ReasonFlags(1 << 1);
    pub const CA_COMPROMISE: ReasonFlags = ReasonFlags(1 << 2);
    pub const AFFILIATION_CHANGED: ReasonFlags = ReasonFlags(1 << 3);
    pub const SUPERSEDED: ReasonFlags = ReasonFlags(1 << 4);
    pub const CESSATION_OF_OPERATION: ReasonFlags = ReasonFlags(1 << 5);
    pub const CERTIFICATE_HOLD: ReasonFlags = ReasonFlags(1 << 6);
    pub const PRIVILEGE_WITHDRAWN: ReasonFlags = ReasonFlags(1 << 7);
    pub const AA_COMPROMISE: ReasonFlags = ReasonFlags(1 << 8);

    /// Every reason a CRL can cover.
    pub const ALL_REASONS: ReasonFlags = ReasonFlags(0x1fe);

    pub const fn empty() -> Self {
        ReasonFlags(0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Builds flags from the bit positions of the ASN.1 `BIT STRING`.
    pub fn from_bit_positions<I: IntoIterator<Item = u8>>(positions: I) -> Self {
        positions
            .into_iter()
            .filter(|p| (1..=8).contains(p))
            .fold(ReasonFlags(0), |acc, p| ReasonFlags(acc.0 | (1 << p)))
    }

    pub const fn contains(self, other: ReasonFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: ReasonFlags) -> Self {
        ReasonFlags(self.0 | other.0)
    }

    pub const fn is_all(self) -> bool {
        self.contains(ReasonFlags::ALL_REASONS)
    }
}

impl std::ops::BitOr for ReasonFlags {
    type Output = ReasonFlags;

    fn bitor(self, rhs: ReasonFlags) -> ReasonFlags {
        self.union(rhs)
    }
}
