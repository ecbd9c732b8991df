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

use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
};

use pdfsig_crypto::certificate::{display_name, same_certificate, CertificateRef};

use crate::ValidationReport;

/// Severity of a single finding. The order is significant:
/// `Info < Indeterminate < Invalid`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ReportItemStatus {
    /// Informational; does not affect the result.
    Info,

    /// The check could not reach a conclusion.
    Indeterminate,

    /// The check failed.
    Invalid,
}

impl Display for ReportItemStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportItemStatus::Info => "INFO",
            ReportItemStatus::Indeterminate => "INDETERMINATE",
            ReportItemStatus::Invalid => "INVALID",
        })
    }
}

/// One finding recorded during validation.
///
/// Items carrying a certificate are the certificate report items; the
/// certificate is shared, not copied.
#[derive(Clone, Debug)]
pub struct ReportItem {
    /// Name of the check that produced this item.
    pub check_name: Cow<'static, str>,

    /// Formatted description of the finding.
    pub message: Cow<'static, str>,

    pub status: ReportItemStatus,

    /// Description of the underlying error, when the finding was caused
    /// by one (for example undecodable revocation data).
    pub exception_cause: Option<Cow<'static, str>>,

    /// Certificate this finding is about, if any.
    pub certificate: Option<CertificateRef>,

    /// Source file where the item was created.
    pub file: Cow<'static, str>,

    /// Source line where the item was created.
    pub line: u32,
}

impl ReportItem {
    /// Creates an informational item. Prefer the [`report_item!`] macro,
    /// which fills in `file` and `line`.
    ///
    /// [`report_item!`]: crate::report_item
    pub fn new<S1, S2, S3>(check_name: S1, message: S2, file: S3, line: u32) -> Self
    where
        S1: Into<Cow<'static, str>>,
        S2: Into<Cow<'static, str>>,
        S3: Into<Cow<'static, str>>,
    {
        ReportItem {
            check_name: check_name.into(),
            message: message.into(),
            status: ReportItemStatus::Info,
            exception_cause: None,
            certificate: None,
            file: file.into(),
            line,
        }
    }

    /// Attaches the certificate this finding is about.
    pub fn certificate(self, certificate: &CertificateRef) -> Self {
        ReportItem {
            certificate: Some(certificate.clone()),
            ..self
        }
    }

    /// Captures the description of the error that caused this finding.
    pub fn caused_by<E: Display>(self, err: E) -> Self {
        ReportItem {
            exception_cause: Some(err.to_string().into()),
            ..self
        }
    }

    pub fn with_status(self, status: ReportItemStatus) -> Self {
        ReportItem { status, ..self }
    }

    /// Adds this item to `report` as informational.
    pub fn info(self, report: &mut ValidationReport) {
        report.add_report_item(self.with_status(ReportItemStatus::Info));
    }

    /// Adds this item to `report` as indeterminate.
    pub fn indeterminate(self, report: &mut ValidationReport) {
        report.add_report_item(self.with_status(ReportItemStatus::Indeterminate));
    }

    /// Adds this item to `report` as invalid.
    pub fn invalid(self, report: &mut ValidationReport) {
        report.add_report_item(self.with_status(ReportItemStatus::Invalid));
    }

    /// Returns `true` for certificate report items.
    pub fn is_certificate_item(&self) -> bool {
        self.certificate.is_some()
    }

    pub fn is_failure(&self) -> bool {
        self.status != ReportItemStatus::Info
    }
}

impl PartialEq for ReportItem {
    fn eq(&self, other: &Self) -> bool {
        let same_cert = match (&self.certificate, &other.certificate) {
            (Some(a), Some(b)) => same_certificate(a.as_ref(), b.as_ref()),
            (None, None) => true,
            _ => false,
        };

        same_cert
            && self.check_name == other.check_name
            && self.message == other.message
            && self.status == other.status
            && self.exception_cause == other.exception_cause
    }
}

impl Display for ReportItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.check_name, self.message, self.status)?;

        if let Some(cert) = &self.certificate {
            write!(f, " [{}]", display_name(cert.as_ref()))?;
        }

        if let Some(cause) = &self.exception_cause {
            write!(f, " caused by: {cause}")?;
        }

        Ok(())
    }
}

/// Creates a [`ReportItem`] recording the current source location.
///
/// ## Example
///
/// ```
/// # use pdfsig_report::{report_item, ReportItemStatus, ValidationReport};
/// let mut report = ValidationReport::new();
/// report_item!("CRL response check.", "CRL response is invalid.").indeterminate(&mut report);
///
/// assert_eq!(report.logs()[0].status, ReportItemStatus::Indeterminate);
/// ```
#[macro_export]
macro_rules! report_item {
    ($check_name:expr, $message:expr) => {{
        $crate::ReportItem::new($check_name, $message, file!(), line!())
    }};
}
