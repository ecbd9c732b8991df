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

//! Dotted object identifiers the validators look for.

/// id-kp-serverAuth
pub const SERVER_AUTH: &str = "1.3.6.1.5.5.7.3.1";

/// id-kp-clientAuth
pub const CLIENT_AUTH: &str = "1.3.6.1.5.5.7.3.2";

/// id-kp-codeSigning
pub const CODE_SIGNING: &str = "1.3.6.1.5.5.7.3.3";

/// id-kp-emailProtection
pub const EMAIL_PROTECTION: &str = "1.3.6.1.5.5.7.3.4";

/// id-kp-timeStamping
pub const TIME_STAMPING: &str = "1.3.6.1.5.5.7.3.8";

/// id-kp-OCSPSigning
pub const OCSP_SIGNING: &str = "1.3.6.1.5.5.7.3.9";

/// anyExtendedKeyUsage
pub const ANY_EXTENDED_KEY_USAGE: &str = "2.5.29.37.0";

pub const KEY_USAGE: &str = "2.5.29.15";
pub const BASIC_CONSTRAINTS: &str = "2.5.29.19";
pub const EXTENDED_KEY_USAGE: &str = "2.5.29.37";
pub const CRL_DISTRIBUTION_POINTS: &str = "2.5.29.31";
pub const ISSUING_DISTRIBUTION_POINT: &str = "2.5.29.28";
pub const AUTHORITY_INFO_ACCESS: &str = "1.3.6.1.5.5.7.1.1";

/// Expired certificates on CRL (X.509 8th edition).
pub const EXPIRED_CERTS_ON_CRL: &str = "2.5.29.60";

/// id-pkix-ocsp-nocheck: the responder certificate needs no revocation
/// check of its own.
pub const OCSP_NO_CHECK: &str = "1.3.6.1.5.5.7.48.1.5";

/// ETSI EN 319 412-1 ext-etsi-valassured-ST-certs: a short-term
/// certificate whose validity is assured without revocation data.
pub const VALIDITY_ASSURED_SHORT_TERM: &str = "0.4.0.194121.2.1";

/// id-ad-ocsp
pub const AD_OCSP: &str = "1.3.6.1.5.5.7.48.1";

/// SHA-1 hash algorithm, used in OCSP `CertID`.
pub const SHA1: &str = "1.3.14.3.2.26";
