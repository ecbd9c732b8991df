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

use pdfsig_crypto::test_utils::TestCertificate;

use crate::{report_item, ReportItemStatus, ValidationReport, ValidationResult};

fn report_with(statuses: &[ReportItemStatus]) -> ValidationReport {
    let mut report = ValidationReport::new();
    for (i, status) in statuses.iter().enumerate() {
        report.add_report_item(report_item!("check", format!("item {i}")).with_status(*status));
    }
    report
}

#[test]
fn empty_report_is_valid() {
    let report = ValidationReport::new();
    assert!(report.is_empty());
    assert_eq!(report.validation_result(), ValidationResult::Valid);
    assert_eq!(report.failures().count(), 0);
}

#[test]
fn result_is_max_severity() {
    use ReportItemStatus::*;

    assert_eq!(
        report_with(&[Info, Info]).validation_result(),
        ValidationResult::Valid
    );
    assert_eq!(
        report_with(&[Info, Indeterminate, Info]).validation_result(),
        ValidationResult::Indeterminate
    );
    assert_eq!(
        report_with(&[Invalid, Indeterminate]).validation_result(),
        ValidationResult::Invalid
    );
    assert_eq!(
        report_with(&[Indeterminate, Invalid, Info]).validation_result(),
        ValidationResult::Invalid
    );
}

#[test]
fn failures_are_ordered_subsequence_of_logs() {
    use ReportItemStatus::*;

    let report = report_with(&[Info, Invalid, Info, Indeterminate, Info, Invalid]);

    let failures: Vec<&str> = report.failures().map(|i| i.message.as_ref()).collect();
    assert_eq!(failures, vec!["item 1", "item 3", "item 5"]);

    let non_info = report.logs().iter().filter(|i| i.status != Info).count();
    assert_eq!(report.failures().count(), non_info);
    assert_eq!(report.len(), 6);
}

#[test]
fn certificate_logs_and_failures() {
    let cert = TestCertificate::builder("CN=Leaf").build();
    let mut report = ValidationReport::new();

    report_item!("check", "plain").invalid(&mut report);
    report_item!("check", "cert info")
        .certificate(&cert)
        .info(&mut report);
    report_item!("check", "cert failure")
        .certificate(&cert)
        .indeterminate(&mut report);

    let logs: Vec<&str> = report
        .certificate_logs()
        .map(|i| i.message.as_ref())
        .collect();
    assert_eq!(logs, vec!["cert info", "cert failure"]);

    let failures: Vec<&str> = report
        .certificate_failures()
        .map(|i| i.message.as_ref())
        .collect();
    assert_eq!(failures, vec!["cert failure"]);
}

#[test]
fn merge_appends_in_order() {
    let mut first = ValidationReport::new();
    report_item!("check", "one").info(&mut first);

    let mut second = ValidationReport::new();
    report_item!("check", "two").indeterminate(&mut second);
    report_item!("check", "three").info(&mut second);

    first.merge(second);

    let messages: Vec<&str> = first.logs().iter().map(|i| i.message.as_ref()).collect();
    assert_eq!(messages, vec!["one", "two", "three"]);
    assert_eq!(first.validation_result(), ValidationResult::Indeterminate);
}

#[test]
fn display_lists_items() {
    let mut report = ValidationReport::new();
    report_item!("check", "bad").invalid(&mut report);

    let text = report.to_string();
    assert!(text.starts_with("ValidationReport{validationResult=INVALID"));
    assert!(text.contains("check: bad (INVALID)"));
}
