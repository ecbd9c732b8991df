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
    hash::sha1,
    ocsp::{BasicOcspResponse, CertStatus, ResponderId},
    test_utils::{TestCertificate, TestOcspResponse},
};

#[test]
fn responder_id_by_name() {
    let responder = TestCertificate::builder("CN=Responder").build();
    let other = TestCertificate::builder("CN=Other").build();

    let id = ResponderId::ByName("CN=Responder".to_string());
    assert!(id.matches(responder.as_ref()));
    assert!(!id.matches(other.as_ref()));
}

#[test]
fn responder_id_by_key() {
    let responder = TestCertificate::builder("CN=Responder").build();
    let other = TestCertificate::builder("CN=Other").build();

    let id = ResponderId::ByKey(sha1(responder.public_key()));
    assert!(id.matches(responder.as_ref()));
    assert!(!id.matches(other.as_ref()));
}

#[test]
fn embedded_certificates_survive_building() {
    let ca = TestCertificate::builder("CN=CA").ca(None).build();
    let responder = TestCertificate::builder("CN=Responder")
        .issued_by(ca.as_ref())
        .serial(3)
        .build();
    let leaf = TestCertificate::builder("CN=Leaf")
        .issued_by(ca.as_ref())
        .serial(4)
        .build();

    let produced_at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let response = TestOcspResponse::builder(responder.as_ref(), produced_at)
        .good(leaf.as_ref(), produced_at)
        .embed(&responder)
        .build();

    assert_eq!(response.certificates().len(), 1);
    assert_eq!(
        response.certificates()[0].encoded(),
        responder.encoded()
    );
    assert!(response.verify(responder.as_ref()));
    assert!(!response.verify(ca.as_ref()));

    let single = &response.responses()[0];
    assert_eq!(single.serial_number, leaf.serial_number());
    assert_eq!(single.cert_status, CertStatus::Good);
}
