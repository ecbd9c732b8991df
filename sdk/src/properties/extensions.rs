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

//! Certificate extension requirements.

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use pdfsig_crypto::{
    certificate::{Certificate, KeyUsage},
    oids,
};

use crate::Error;

/// A requirement a certificate's extensions must meet in some context.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CertificateExtension {
    /// Key usage extension present with at least these bits.
    KeyUsage(KeyUsage),

    /// Extended key usage present with every one of these purposes, or
    /// with `anyExtendedKeyUsage`.
    ExtendedKeyUsage(Vec<String>),

    /// Basic constraints present with the given CA flag.
    BasicConstraints { ca: bool },

    /// Basic constraints mark a CA whose path length constraint leaves
    /// room for the CA certificates already below it in the chain.
    DynamicBasicConstraints,

    /// An extension with this OID is present.
    Present(String),
}

impl CertificateExtension {
    /// `certificates_below` is the number of certificates between this
    /// one and the end of the chain, the leaf included.
    pub fn is_satisfied_by(
        &self,
        certificate: &dyn Certificate,
        certificates_below: usize,
    ) -> bool {
        match self {
            CertificateExtension::KeyUsage(required) => certificate
                .key_usage()
                .is_some_and(|ku| ku.contains(*required)),

            CertificateExtension::ExtendedKeyUsage(required) => {
                certificate.extended_key_usage().is_some_and(|eku| {
                    eku.iter().any(|p| p == oids::ANY_EXTENDED_KEY_USAGE)
                        || required.iter().all(|r| eku.contains(r))
                })
            }

            CertificateExtension::BasicConstraints { ca } => certificate
                .basic_constraints()
                .is_some_and(|bc| bc.ca == *ca),

            CertificateExtension::DynamicBasicConstraints => {
                certificate.basic_constraints().is_some_and(|bc| {
                    let intermediates_below = certificates_below.saturating_sub(1);
                    bc.ca
                        && bc
                            .path_len_constraint
                            .map_or(true, |len| len as usize >= intermediates_below)
                })
            }

            CertificateExtension::Present(oid) => certificate.has_extension(oid),
        }
    }
}

impl Display for CertificateExtension {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CertificateExtension::KeyUsage(ku) => write!(f, "key_usage:{ku}"),
            CertificateExtension::ExtendedKeyUsage(purposes) => {
                write!(f, "extended_key_usage:{}", purposes.join(","))
            }
            CertificateExtension::BasicConstraints { ca: true } => {
                f.write_str("basic_constraints_ca")
            }
            CertificateExtension::BasicConstraints { ca: false } => {
                f.write_str("basic_constraints_end_entity")
            }
            CertificateExtension::DynamicBasicConstraints => {
                f.write_str("dynamic_basic_constraints")
            }
            CertificateExtension::Present(oid) => write!(f, "present:{oid}"),
        }
    }
}

/// Parses the form produced by `Display`, for example
/// `key_usage:keyCertSign,cRLSign` or `extended_key_usage:1.3.6.1.5.5.7.3.9`.
impl FromStr for CertificateExtension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || Error::BadParam(format!("unknown certificate extension requirement: {s}"));

        let (kind, args) = match s.split_once(':') {
            Some((kind, args)) => (kind.trim(), Some(args)),
            None => (s.trim(), None),
        };

        let list = |args: Option<&str>| -> Vec<String> {
            args.unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from)
                .collect()
        };

        match kind {
            "key_usage" => {
                let names = list(args);
                if names.is_empty() {
                    return Err(bad());
                }
                names
                    .iter()
                    .map(|n| KeyUsage::from_name(n))
                    .try_fold(KeyUsage::empty(), |acc, ku| ku.map(|ku| acc | ku))
                    .map(CertificateExtension::KeyUsage)
                    .ok_or_else(bad)
            }
            "extended_key_usage" => {
                let purposes = list(args);
                if purposes.is_empty() {
                    return Err(bad());
                }
                Ok(CertificateExtension::ExtendedKeyUsage(purposes))
            }
            "basic_constraints_ca" => Ok(CertificateExtension::BasicConstraints { ca: true }),
            "basic_constraints_end_entity" => {
                Ok(CertificateExtension::BasicConstraints { ca: false })
            }
            "dynamic_basic_constraints" => Ok(CertificateExtension::DynamicBasicConstraints),
            "present" => match args.map(str::trim) {
                Some(oid) if !oid.is_empty() => Ok(CertificateExtension::Present(oid.to_string())),
                _ => Err(bad()),
            },
            _ => Err(bad()),
        }
    }
}
