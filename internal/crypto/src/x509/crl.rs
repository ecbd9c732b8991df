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

use chrono::{DateTime, Utc};
use x509_parser::{prelude::*, revocation_list::CertificateRevocationList};

use super::{serial_magnitude, timestamp_to_utc};
use crate::{
    certificate::Certificate,
    crl::{Crl, CrlReason, IssuingDistributionPoint, ReasonFlags, RevokedCertificate},
    oids, CryptoError,
};

/// A DER CRL with its entries extracted up front.
#[derive(Clone, Debug)]
pub struct X509Crl {
    der: Vec<u8>,
    issuer: String,
    this_update: DateTime<Utc>,
    next_update: Option<DateTime<Utc>>,
    revoked: Vec<RevokedCertificate>,
    issuing_distribution_point: Option<IssuingDistributionPoint>,
    expired_certs_on_crl: Option<DateTime<Utc>>,
}

impl X509Crl {
    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        let (_rem, crl) = CertificateRevocationList::from_der(der)
            .map_err(|e| CryptoError::InvalidCrl(e.to_string()))?;

        let this_update =
            timestamp_to_utc(crl.last_update().timestamp()).map_err(CryptoError::InvalidCrl)?;

        let next_update = crl
            .next_update()
            .map(|t| timestamp_to_utc(t.timestamp()))
            .transpose()
            .map_err(CryptoError::InvalidCrl)?;

        let mut revoked = Vec::new();
        for entry in crl.iter_revoked_certificates() {
            revoked.push(RevokedCertificate {
                serial_number: serial_magnitude(entry.raw_serial()),
                revocation_date: timestamp_to_utc(entry.revocation_date.timestamp())
                    .map_err(CryptoError::InvalidCrl)?,
                reason: entry
                    .reason_code()
                    .and_then(|(_critical, code)| CrlReason::from_code(code.0)),
            });
        }

        let mut issuing_distribution_point = None;
        let mut expired_certs_on_crl = None;

        for ext in crl.extensions() {
            let oid = ext.oid.to_id_string();

            if oid == oids::ISSUING_DISTRIBUTION_POINT {
                let idp = rasn::der::decode::<rasn_pkix::IssuingDistributionPoint>(ext.value)
                    .map_err(|e| CryptoError::InvalidCrl(e.to_string()))?;

                issuing_distribution_point = Some(IssuingDistributionPoint {
                    only_contains_user_certs: idp.only_contains_user_certs,
                    only_contains_ca_certs: idp.only_contains_ca_certs,
                    only_contains_attribute_certs: idp.only_contains_attribute_certs,
                    only_some_reasons: idp.only_some_reasons.as_ref().map(|flags| {
                        ReasonFlags::from_bit_positions(flags.iter_ones().map(|i| i as u8))
                    }),
                    indirect_crl: idp.indirect_crl,
                });
            } else if oid == oids::EXPIRED_CERTS_ON_CRL {
                let cutoff = rasn::der::decode::<rasn::types::GeneralizedTime>(ext.value)
                    .map_err(|e| CryptoError::InvalidCrl(e.to_string()))?;

                expired_certs_on_crl = Some(cutoff.with_timezone(&Utc));
            }
        }

        Ok(Self {
            der: der.to_vec(),
            issuer: crl.issuer().to_string(),
            this_update,
            next_update,
            revoked,
            issuing_distribution_point,
            expired_certs_on_crl,
        })
    }
}

impl Crl for X509Crl {
    fn encoded(&self) -> &[u8] {
        &self.der
    }

    fn issuer(&self) -> &str {
        &self.issuer
    }

    fn this_update(&self) -> DateTime<Utc> {
        self.this_update
    }

    fn next_update(&self) -> Option<DateTime<Utc>> {
        self.next_update
    }

    fn revoked_certificate(&self, serial_number: &[u8]) -> Option<RevokedCertificate> {
        self.revoked
            .iter()
            .find(|r| r.serial_number == serial_number)
            .cloned()
    }

    fn issuing_distribution_point(&self) -> Option<IssuingDistributionPoint> {
        self.issuing_distribution_point.clone()
    }

    fn expired_certs_on_crl(&self) -> Option<DateTime<Utc>> {
        self.expired_certs_on_crl
    }

    fn verify(&self, issuer: &dyn Certificate) -> bool {
        let Ok((_, crl)) = CertificateRevocationList::from_der(&self.der) else {
            return false;
        };
        let Ok((_, issuer)) = X509Certificate::from_der(issuer.encoded()) else {
            return false;
        };

        crl.verify_signature(issuer.public_key()).is_ok()
    }
}
