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
    certificate::{
        display_name, fingerprint, is_self_signed, same_certificate, BasicConstraints,
        Certificate, KeyUsage,
    },
    oids,
    test_utils::TestCertificate,
};

#[test]
fn self_signed_root() {
    let root = TestCertificate::builder("CN=Root").ca(None).build();
    assert!(is_self_signed(root.as_ref()));
    assert_eq!(root.subject(), root.issuer());
}

#[test]
fn issued_certificate_is_not_self_signed() {
    let root = TestCertificate::builder("CN=Root").ca(None).build();
    let leaf = TestCertificate::builder("CN=Leaf")
        .issued_by(root.as_ref())
        .serial(2)
        .build();

    assert!(!is_self_signed(leaf.as_ref()));
    assert!(leaf.verify(root.as_ref()));
    assert!(!root.verify(leaf.as_ref()));
    assert_eq!(leaf.issuer(), "CN=Root");
}

#[test]
fn same_name_but_different_key_does_not_verify() {
    let root = TestCertificate::builder("CN=Root").build();
    let impostor = TestCertificate::builder("CN=Root")
        .key_id("key:impostor")
        .build();
    let leaf = TestCertificate::builder("CN=Leaf")
        .issued_by(root.as_ref())
        .build();

    assert!(leaf.verify(root.as_ref()));
    assert!(!leaf.verify(impostor.as_ref()));
    assert!(is_self_signed(impostor.as_ref()));
}

#[test]
fn fingerprint_identifies_encoding() {
    let a = TestCertificate::builder("CN=A").serial(1).build();
    let a2 = TestCertificate::builder("CN=A").serial(1).build();
    let b = TestCertificate::builder("CN=A").serial(2).build();

    assert_eq!(fingerprint(a.as_ref()), fingerprint(a2.as_ref()));
    assert_ne!(fingerprint(a.as_ref()), fingerprint(b.as_ref()));
    assert!(same_certificate(a.as_ref(), a2.as_ref()));
    assert!(!same_certificate(a.as_ref(), b.as_ref()));
}

#[test]
fn display_name_includes_serial() {
    let cert = TestCertificate::builder("CN=Signer").serial(0x1234).build();
    assert_eq!(display_name(cert.as_ref()), "CN=Signer (serial 1234)");
}

#[test]
fn key_usage_bits() {
    let ku = KeyUsage::KEY_CERT_SIGN | KeyUsage::CRL_SIGN;

    assert!(ku.contains(KeyUsage::CRL_SIGN));
    assert!(ku.contains(KeyUsage::KEY_CERT_SIGN | KeyUsage::CRL_SIGN));
    assert!(!ku.contains(KeyUsage::DIGITAL_SIGNATURE));
    assert_eq!(ku.to_string(), "keyCertSign, cRLSign");
    assert_eq!(KeyUsage::from_bits(ku.bits()), ku);
    assert_eq!(KeyUsage::from_name("cRLSign"), Some(KeyUsage::CRL_SIGN));
    assert_eq!(KeyUsage::from_name("crlSign"), None);
}

#[test]
fn extension_accessors() {
    let nb = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let na = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

    let cert = TestCertificate::builder("CN=OCSP")
        .validity(nb, na)
        .extended_key_usage(&[oids::OCSP_SIGNING])
        .basic_constraints(BasicConstraints {
            ca: false,
            path_len_constraint: None,
        })
        .extension(oids::OCSP_NO_CHECK)
        .crl_distribution_point("http://crl.example.com/ca.crl")
        .ocsp_url("http://ocsp.example.com")
        .build();

    assert_eq!(cert.not_before(), nb);
    assert_eq!(cert.not_after(), na);
    assert_eq!(
        cert.extended_key_usage(),
        Some(vec![oids::OCSP_SIGNING.to_string()])
    );
    assert!(!cert.basic_constraints().unwrap().ca);
    assert!(cert.has_extension(oids::OCSP_NO_CHECK));
    assert!(!cert.has_extension(oids::VALIDITY_ASSURED_SHORT_TERM));
    assert_eq!(
        cert.crl_distribution_points(),
        vec!["http://crl.example.com/ca.crl".to_string()]
    );
    assert_eq!(
        cert.ocsp_responder_urls(),
        vec!["http://ocsp.example.com".to_string()]
    );
}
