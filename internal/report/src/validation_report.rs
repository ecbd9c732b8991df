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

use std::fmt::{self, Display, Formatter};

use crate::{ReportItem, ReportItemStatus};

/// Overall verdict of a validation, derived from the items of a report.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ValidationResult {
    Valid,
    Indeterminate,
    Invalid,
}

impl From<ReportItemStatus> for ValidationResult {
    fn from(status: ReportItemStatus) -> Self {
        match status {
            ReportItemStatus::Info => ValidationResult::Valid,
            ReportItemStatus::Indeterminate => ValidationResult::Indeterminate,
            ReportItemStatus::Invalid => ValidationResult::Invalid,
        }
    }
}

impl Display for ValidationResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValidationResult::Valid => "VALID",
            ValidationResult::Indeterminate => "INDETERMINATE",
            ValidationResult::Invalid => "INVALID",
        })
    }
}

/// Ordered, append-only record of everything a validation checked.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    items: Vec<ReportItem>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_report_item(&mut self, item: ReportItem) {
        self.items.push(item);
    }

    /// Appends every item of `other`, preserving order.
    pub fn merge(&mut self, other: ValidationReport) {
        self.items.extend(other.items);
    }

    /// All items, in the order they were added.
    pub fn logs(&self) -> &[ReportItem] {
        &self.items
    }

    /// Items whose status is not [`ReportItemStatus::Info`].
    pub fn failures(&self) -> impl Iterator<Item = &ReportItem> {
        self.items.iter().filter(|item| item.is_failure())
    }

    /// Items that concern a certificate.
    pub fn certificate_logs(&self) -> impl Iterator<Item = &ReportItem> {
        self.items.iter().filter(|item| item.is_certificate_item())
    }

    /// Failures that concern a certificate.
    pub fn certificate_failures(&self) -> impl Iterator<Item = &ReportItem> {
        self.certificate_logs().filter(|item| item.is_failure())
    }

    /// Maximum severity over all items; `Valid` for an empty report.
    pub fn validation_result(&self) -> ValidationResult {
        self.items
            .iter()
            .map(|item| item.status)
            .max()
            .map(ValidationResult::from)
            .unwrap_or(ValidationResult::Valid)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "ValidationReport{{validationResult={}", self.validation_result())?;

        writeln!(f, "reportItems=")?;
        for item in &self.items {
            writeln!(f, "  {item}")?;
        }

        write!(f, "}}")
    }
}
