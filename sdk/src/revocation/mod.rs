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

//! Revocation checking.

pub mod crl_validator;
pub mod ocsp_validator;
pub mod revocation_data_validator;

use pdfsig_crypto::{crl::CrlRef, ocsp::OcspResponseRef};
use pdfsig_report::{ReportItemStatus, ValidationReport};

pub use self::{
    crl_validator::CrlValidator, ocsp_validator::OcspValidator,
    revocation_data_validator::RevocationDataValidator,
};

/// Revocation data that came with the document rather than from a client.
#[derive(Clone, Debug, Default)]
pub struct SuppliedRevocationData {
    crls: Vec<CrlRef>,
    ocsp_responses: Vec<OcspResponseRef>,
}

impl SuppliedRevocationData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_crl(&mut self, crl: CrlRef) {
        self.crls.push(crl);
    }

    pub fn add_ocsp_response(&mut self, response: OcspResponseRef) {
        self.ocsp_responses.push(response);
    }

    pub fn crls(&self) -> &[CrlRef] {
        &self.crls
    }

    pub fn ocsp_responses(&self) -> &[OcspResponseRef] {
        &self.ocsp_responses
    }

    pub fn extend(&mut self, other: SuppliedRevocationData) {
        self.crls.extend(other.crls);
        self.ocsp_responses.extend(other.ocsp_responses);
    }

    pub fn is_empty(&self) -> bool {
        self.crls.is_empty() && self.ocsp_responses.is_empty()
    }
}

/// Copies the findings about a CRL or OCSP signer into `report`.
///
/// A broken signer chain leaves the revocation status unknown rather than
/// making the checked certificate invalid, so `INVALID` items are
/// recorded as `INDETERMINATE`.
pub(crate) fn add_responder_report(
    report: &mut ValidationReport,
    responder_report: ValidationReport,
) {
    for item in responder_report.logs().iter().cloned() {
        if item.status == ReportItemStatus::Invalid {
            report.add_report_item(item.with_status(ReportItemStatus::Indeterminate));
        } else {
            report.add_report_item(item);
        }
    }
}
