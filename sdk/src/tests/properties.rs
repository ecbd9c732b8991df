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

use chrono::TimeDelta;
use pdfsig_crypto::{certificate::KeyUsage, oids};

use crate::{
    context::{CertificateSource, TimeBasedContext, ValidatorContext},
    properties::{
        CertificateExtension, ContextSelector, OnlineFetching, RuleValues,
        SignatureValidationProperties,
    },
    tests::fixtures::{cert_with, ctx},
};

#[test]
fn test_defaults() {
    let props = SignatureValidationProperties::default();
    let present = ctx(
        ValidatorContext::CrlValidator,
        CertificateSource::SignerCert,
        TimeBasedContext::Present,
    );
    let historical = present.with_time_based_context(TimeBasedContext::Historical);

    assert!(props.continue_after_failure(&present));
    assert_eq!(props.freshness(&present), TimeDelta::days(30));
    assert_eq!(props.freshness(&historical), TimeDelta::minutes(1));
    assert_eq!(
        props.revocation_online_fetching(&present),
        OnlineFetching::FetchIfNoOtherData
    );
    assert!(props.required_extensions(&present).is_empty());

    let crl_issuer = present.with_certificate_source(CertificateSource::CrlIssuer);
    assert_eq!(
        props.required_extensions(&crl_issuer),
        vec![CertificateExtension::KeyUsage(KeyUsage::CRL_SIGN)]
    );

    let cert_issuer = present.with_certificate_source(CertificateSource::CertIssuer);
    assert_eq!(props.required_extensions(&cert_issuer).len(), 2);
}

#[test]
fn test_most_specific_rule_wins() {
    let mut props = SignatureValidationProperties::default();
    props
        .set_continue_after_failure(
            ContextSelector::any().validators([ValidatorContext::OcspValidator]),
            false,
        )
        .set_continue_after_failure(ContextSelector::any(), true);

    let ocsp = ctx(
        ValidatorContext::OcspValidator,
        CertificateSource::SignerCert,
        TimeBasedContext::Present,
    );
    let crl = ocsp.with_validator_context(ValidatorContext::CrlValidator);

    // the broad rule was added later but the narrow one still wins
    assert!(!props.continue_after_failure(&ocsp));
    assert!(props.continue_after_failure(&crl));
}

#[test]
fn test_later_rule_wins_on_tie() {
    let mut props = SignatureValidationProperties::empty();
    let selector = ContextSelector::any().time_based([TimeBasedContext::Present]);
    props
        .set_freshness(selector.clone(), TimeDelta::seconds(10))
        .set_freshness(selector, TimeDelta::seconds(20));

    let present = ctx(
        ValidatorContext::OcspValidator,
        CertificateSource::SignerCert,
        TimeBasedContext::Present,
    );
    assert_eq!(props.freshness(&present), TimeDelta::seconds(20));
}

#[test]
fn test_empty_falls_back() {
    let props = SignatureValidationProperties::empty();
    let historical = ctx(
        ValidatorContext::CrlValidator,
        CertificateSource::CrlIssuer,
        TimeBasedContext::Historical,
    );

    assert!(props.continue_after_failure(&historical));
    assert_eq!(props.freshness(&historical), TimeDelta::minutes(1));
    assert!(props.required_extensions(&historical).is_empty());
}

#[test]
fn test_add_rule_from_values() {
    let mut props = SignatureValidationProperties::default();
    props
        .add_rule(
            ContextSelector::any().certificate_sources([CertificateSource::SignerCert]),
            &RuleValues {
                required_extensions: Some(vec!["key_usage:nonRepudiation".into()]),
                ..Default::default()
            },
        )
        .unwrap();

    let signer = ctx(
        ValidatorContext::CertificateChainValidator,
        CertificateSource::SignerCert,
        TimeBasedContext::Present,
    );
    assert_eq!(
        props.required_extensions(&signer),
        vec![CertificateExtension::KeyUsage(KeyUsage::NON_REPUDIATION)]
    );

    assert!(props
        .add_rule(
            ContextSelector::any(),
            &RuleValues {
                required_extensions: Some(vec!["frobnicate".into()]),
                ..Default::default()
            },
        )
        .is_err());
}

#[test]
fn test_extension_strings() {
    for s in [
        "key_usage:keyCertSign, cRLSign",
        "extended_key_usage:1.3.6.1.5.5.7.3.9",
        "basic_constraints_ca",
        "dynamic_basic_constraints",
        "present:2.5.29.60",
    ] {
        let ext: CertificateExtension = s.parse().unwrap();
        let again: CertificateExtension = ext.to_string().parse().unwrap();
        assert_eq!(ext, again);
    }

    assert!("key_usage:".parse::<CertificateExtension>().is_err());
    assert!("key_usage:bogus".parse::<CertificateExtension>().is_err());
    assert!("present".parse::<CertificateExtension>().is_err());
}

#[test]
fn test_extension_predicates() {
    let ca = cert_with(|b| b.ca(Some(0)));
    let leaf = cert_with(|b| {
        b.key_usage(KeyUsage::DIGITAL_SIGNATURE)
            .extended_key_usage(&[oids::TIME_STAMPING])
    });
    let any_eku = cert_with(|b| b.extended_key_usage(&[oids::ANY_EXTENDED_KEY_USAGE]));

    let key_cert_sign = CertificateExtension::KeyUsage(KeyUsage::KEY_CERT_SIGN);
    assert!(key_cert_sign.is_satisfied_by(ca.as_ref(), 1));
    assert!(!key_cert_sign.is_satisfied_by(leaf.as_ref(), 1));

    let tsa = CertificateExtension::ExtendedKeyUsage(vec![oids::TIME_STAMPING.into()]);
    assert!(tsa.is_satisfied_by(leaf.as_ref(), 0));
    assert!(tsa.is_satisfied_by(any_eku.as_ref(), 0));
    assert!(!tsa.is_satisfied_by(ca.as_ref(), 0));

    // path length 0 allows the CA to sign the leaf only
    let dynamic = CertificateExtension::DynamicBasicConstraints;
    assert!(dynamic.is_satisfied_by(ca.as_ref(), 1));
    assert!(!dynamic.is_satisfied_by(ca.as_ref(), 2));
    assert!(!dynamic.is_satisfied_by(leaf.as_ref(), 1));

    assert!(CertificateExtension::BasicConstraints { ca: true }.is_satisfied_by(ca.as_ref(), 0));
}
