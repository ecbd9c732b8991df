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

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};

use crate::{
    certificate::Certificate,
    crl::{Crl, CrlReason, ReasonFlags},
    test_utils::{TestCertificate, TestCrl},
};

#[test]
fn reason_flags_from_bit_positions() {
    let flags = ReasonFlags::from_bit_positions([1, 2, 0, 9]);
    assert_eq!(
        flags,
        ReasonFlags::KEY_COMPROMISE | ReasonFlags::CA_COMPROMISE
    );
    assert!(!flags.is_all());
}

#[test]
fn reason_flags_union_covers_all() {
    let first = ReasonFlags::KEY_COMPROMISE | ReasonFlags::CA_COMPROMISE;
    let rest = ReasonFlags::from_bit_positions(3..=8);

    assert!(!first.is_all());
    assert!(!rest.is_all());
    assert!(first.union(rest).is_all());
    assert_eq!(first | rest, ReasonFlags::ALL_REASONS);
}

#[test]
fn crl_reason_codes() {
    assert_eq!(CrlReason::from_code(0), Some(CrlReason::Unspecified));
    assert_eq!(CrlReason::from_code(8), Some(CrlReason::RemoveFromCrl));
    assert_eq!(CrlReason::from_code(7), None);
    assert_eq!(CrlReason::from_code(10), Some(CrlReason::AaCompromise));
}

#[test]
fn revoked_lookup_and_signature() {
    let ca = TestCertificate::builder("CN=CA").ca(None).build();
    let leaf = TestCertificate::builder("CN=Leaf")
        .issued_by(ca.as_ref())
        .serial(7)
        .build();
    let other = TestCertificate::builder("CN=Other")
        .issued_by(ca.as_ref())
        .serial(8)
        .build();

    let this_update = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let revoked_at = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();

    let crl = TestCrl::builder(ca.as_ref(), this_update)
        .revoke_with_reason(leaf.as_ref(), revoked_at, Some(CrlReason::KeyCompromise))
        .build();

    let entry = crl.revoked_certificate(leaf.serial_number()).unwrap();
    assert_eq!(entry.revocation_date, revoked_at);
    assert_eq!(entry.reason, Some(CrlReason::KeyCompromise));
    assert!(crl.revoked_certificate(other.serial_number()).is_none());

    assert!(crl.verify(ca.as_ref()));
    assert!(!crl.verify(leaf.as_ref()));
    assert_eq!(crl.issuer(), "CN=CA");
}
