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

//! Checks that the incremental updates made after each signature stay
//! within what that signature allows.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use pdfsig_report::{format_message, report_item, ValidationReport, ValidationResult};

use super::{
    object::{ObjectRef, PdfDictionary, PdfObject},
    permissions::{AccessPermissions, FieldLock, SignatureRestrictions},
    revision::{deep_equal, DocumentRevision, RevisionReader},
};
use crate::{
    context::{CertificateSource, TimeBasedContext, ValidationContext, ValidatorContext},
    validator_chain::ValidatorChain,
};

pub const DOC_MDP_CHECK: &str = "DocMDP check.";
pub const FIELD_MDP_CHECK: &str = "FieldMDP check.";

pub const ACCESS_PERMISSIONS_ADDED: &str = "Access permissions level specified for \"{0}\" signature field is higher than previous one. Specified level is ignored.";
pub const CATALOG_MISSING: &str = "Document catalog could not be read in one of the revisions.";
pub const DEVELOPER_EXTENSION_REMOVED: &str = "Developer extension \"{0}\" dictionary was removed or unexpectedly modified.";
pub const DOCUMENT_WITHOUT_SIGNATURES: &str = "Document doesn't contain any signatures.";
pub const DSS_REMOVED: &str = "DSS dictionary was removed from catalog.";
pub const EXTENSION_LEVEL_DECREASED: &str = "Extension level number in developer extension \"{0}\" dictionary was decreased.";
pub const EXTENSIONS_REMOVED: &str = "Extensions dictionary was removed from the catalog.";
pub const FIELD_MODIFIED: &str = "Form field \"{0}\" was unexpectedly modified.";
pub const FIELD_REMOVED: &str = "Form field \"{0}\" was removed or unexpectedly modified.";
pub const LOCKED_FIELD_MODIFIED: &str = "Locked form field \"{0}\" or one of its widgets was modified.";
pub const NOT_ALLOWED_ACROFORM_CHANGES: &str = "PDF document AcroForm contains changes other than document timestamp (docMDP level >= 1), form fill-in and digital signatures (docMDP level >= 2), adding or editing annotations (docMDP level 3), which are not allowed.";
pub const NOT_ALLOWED_CATALOG_CHANGES: &str = "PDF document catalog contains changes other than DSS dictionary and DTS addition (docMDP level >= 1), form fill-in and digital signatures (docMDP level >= 2), adding or editing annotations (docMDP level 3).";
pub const NOT_ALLOWED_CERTIFICATION_SIGNATURE: &str = "Certification signature is applied after the approval signature which is not allowed.";
pub const PAGE_ANNOTATIONS_MODIFIED: &str = "Page {0} annotations were unexpectedly modified.";
pub const PAGE_MODIFIED: &str = "Page {0} was unexpectedly modified.";
pub const PAGES_COUNT_MODIFIED: &str = "Number of pages changed from {0} to {1}.";
pub const PERMISSION_REMOVED: &str = "Permission \"{0}\" dictionary was removed or unexpectedly modified.";
pub const REVISIONS_RETRIEVAL_FAILED: &str = "Wasn't possible to retrieve document revisions.";
pub const TOO_MANY_CERTIFICATION_SIGNATURES: &str = "Document contains more than one certification signature.";
pub const UNEXPECTED_ENTRY_IN_XREF: &str = "New PDF document revision contains unexpected entry \"{0}\" in XREF table.";
pub const UNEXPECTED_FORM_FIELD: &str = "New PDF document revision contains unexpected form field \"{0}\".";
pub const UNKNOWN_ACCESS_PERMISSIONS: &str = "Access permissions level number specified for \"{0}\" signature field is unknown: {1}. Level is ignored.";

/// Catalog entries that have dedicated checks.
const CATALOG_CHECKED_KEYS: [&str; 5] = ["DSS", "Perms", "Extensions", "AcroForm", "Pages"];

/// AcroForm entries that form fill-in and signing may change.
const ACROFORM_MUTABLE_KEYS: [&str; 5] = ["Fields", "SigFlags", "DR", "DA", "NeedAppearances"];

/// Field entries that change when a field is filled in or signed.
const FIELD_VALUE_KEYS: [&str; 6] = ["V", "AP", "AS", "Kids", "Parent", "P"];

/// Entries not followed when collecting what a change brings with it.
const BACK_REFERENCE_KEYS: [&str; 3] = ["Parent", "P", "Data"];

#[derive(Clone, Debug)]
struct FieldInfo {
    object: PdfObject,
    dict: PdfDictionary,
    field_type: Option<String>,
}

impl FieldInfo {
    fn is_signature(&self) -> bool {
        self.field_type.as_deref() == Some("Sig")
    }

    /// The signature dictionary of a signed signature field.
    fn signature_dict<'a>(&'a self, revision: &'a DocumentRevision) -> Option<&'a PdfDictionary> {
        if !self.is_signature() {
            return None;
        }
        revision.get_dict(&self.dict, "V")
    }
}

fn is_doc_timestamp(sig: &PdfDictionary) -> bool {
    sig.get("Type").and_then(PdfObject::as_name) == Some("DocTimeStamp")
        || sig.get("SubFilter").and_then(PdfObject::as_name) == Some("ETSI.RFC3161")
}

/// Terminal form fields by fully qualified name.
fn collect_fields(revision: &DocumentRevision) -> BTreeMap<String, FieldInfo> {
    let mut fields = BTreeMap::new();

    let Some(acroform) = revision
        .catalog()
        .and_then(|catalog| revision.get_dict(catalog, "AcroForm"))
    else {
        return fields;
    };

    let roots = revision
        .get(acroform, "Fields")
        .and_then(PdfObject::as_array)
        .unwrap_or_default();

    let mut pending: Vec<(&PdfObject, String, Option<String>)> = roots
        .iter()
        .rev()
        .map(|f| (f, String::new(), None))
        .collect();
    let mut visited = HashSet::new();

    while let Some((object, prefix, inherited_type)) = pending.pop() {
        if let Some(r) = object.as_reference() {
            if !visited.insert(r) {
                continue;
            }
        }

        let Some(dict) = revision.resolve(object).and_then(PdfObject::as_dict) else {
            continue;
        };

        // Kids without a partial name are widgets, not fields.
        let Some(partial) = revision.get(dict, "T").and_then(PdfObject::as_text) else {
            continue;
        };

        let name = if prefix.is_empty() {
            partial
        } else {
            format!("{prefix}.{partial}")
        };

        let field_type = revision
            .get(dict, "FT")
            .and_then(PdfObject::as_name)
            .map(String::from)
            .or(inherited_type);

        let kids = revision
            .get(dict, "Kids")
            .and_then(PdfObject::as_array)
            .unwrap_or_default();
        let field_kids: Vec<&PdfObject> = kids
            .iter()
            .filter(|kid| {
                revision
                    .resolve(kid)
                    .and_then(|k| k.get("T"))
                    .is_some()
            })
            .collect();

        if field_kids.is_empty() {
            fields.insert(
                name,
                FieldInfo {
                    object: object.clone(),
                    dict: dict.clone(),
                    field_type,
                },
            );
        } else {
            for kid in field_kids.into_iter().rev() {
                pending.push((kid, name.clone(), field_type.clone()));
            }
        }
    }

    fields
}

#[derive(Clone, Debug)]
struct PageInfo {
    object: PdfObject,
}

/// Pages in document order, plus the references of every node of the
/// page tree.
fn collect_pages(revision: &DocumentRevision) -> (Vec<PageInfo>, BTreeSet<ObjectRef>) {
    let mut pages = Vec::new();
    let mut nodes = BTreeSet::new();

    let Some(root) = revision.catalog().and_then(|catalog| catalog.get("Pages")) else {
        return (pages, nodes);
    };

    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        if let Some(r) = node.as_reference() {
            if !nodes.insert(r) {
                continue;
            }
        }

        let Some(dict) = revision.resolve(node).and_then(PdfObject::as_dict) else {
            continue;
        };

        let kids = revision.get(dict, "Kids").and_then(PdfObject::as_array);
        let is_page =
            dict.get("Type").and_then(PdfObject::as_name) == Some("Page") || kids.is_none();

        if is_page {
            pages.push(PageInfo {
                object: node.clone(),
            });
        } else if let Some(kids) = kids {
            pending.extend(kids.iter().rev());
        }
    }

    (pages, nodes)
}

/// Two entries are the same when they name the same indirect object or
/// hold equal direct values.
fn same_entry(
    previous: &DocumentRevision,
    a: Option<&PdfObject>,
    next: &DocumentRevision,
    b: Option<&PdfObject>,
) -> bool {
    match (a, b) {
        (Some(PdfObject::Reference(ra)), Some(PdfObject::Reference(rb))) => ra == rb,
        (Some(a), Some(b)) => deep_equal(previous, a, next, b, &[]),
        (Some(x), None) => previous.resolve(x).map_or(true, PdfObject::is_null),
        (None, Some(y)) => next.resolve(y).map_or(true, PdfObject::is_null),
        (None, None) => true,
    }
}

fn extension_level(revision: &DocumentRevision, extension: &PdfObject) -> i64 {
    let level = |dict: &PdfDictionary| {
        revision
            .get(dict, "ExtensionLevel")
            .and_then(PdfObject::as_integer)
            .unwrap_or(0)
    };

    match revision.resolve(extension) {
        Some(PdfObject::Array(items)) => items
            .iter()
            .filter_map(|item| revision.resolve(item).and_then(PdfObject::as_dict))
            .map(level)
            .max()
            .unwrap_or(0),
        Some(other) => other.as_dict().map(level).unwrap_or(0),
        None => 0,
    }
}

/// A signed signature field as found in one revision.
#[derive(Clone, Debug)]
struct SignedField {
    name: String,
    value: PdfObject,
    timestamp: bool,
    restrictions: SignatureRestrictions,
    lock: Option<FieldLock>,
}

fn signed_fields(revision: &DocumentRevision) -> Vec<SignedField> {
    collect_fields(revision)
        .into_iter()
        .filter_map(|(name, field)| {
            let sig = field.signature_dict(revision)?;
            Some(SignedField {
                value: field.dict.get("V").cloned().unwrap_or(PdfObject::Null),
                timestamp: is_doc_timestamp(sig),
                restrictions: SignatureRestrictions::from_signature_dict(revision, sig),
                lock: revision
                    .get_dict(&field.dict, "Lock")
                    .and_then(|lock| FieldLock::from_dict(revision, lock)),
                name,
            })
        })
        .collect()
}

/// Diffs consecutive document revisions against the permissions the
/// signatures so far allow.
#[derive(Clone, Debug)]
pub struct DocumentRevisionsValidator {
    chain: ValidatorChain,
    access_permissions: AccessPermissions,
    field_locks: Vec<FieldLock>,
}

/// Per-document bookkeeping of the signatures seen so far.
#[derive(Default)]
struct SignatureHistory {
    signed: BTreeMap<String, PdfObject>,
    certifications: usize,
    approvals: usize,
    too_many_reported: bool,
}

impl DocumentRevisionsValidator {
    pub fn new(chain: &ValidatorChain) -> Self {
        Self {
            chain: chain.clone(),
            access_permissions: AccessPermissions::Unspecified,
            field_locks: Vec::new(),
        }
    }

    /// Starts from `access_permissions` instead of no restriction.
    pub fn with_access_permissions(mut self, access_permissions: AccessPermissions) -> Self {
        self.access_permissions = access_permissions;
        self
    }

    pub fn with_field_lock(mut self, lock: FieldLock) -> Self {
        self.field_locks.push(lock);
        self
    }

    pub fn access_permissions(&self) -> AccessPermissions {
        self.access_permissions
    }

    fn context() -> ValidationContext {
        ValidationContext::new(
            ValidatorContext::DocumentRevisionsValidator,
            CertificateSource::SignerCert,
            TimeBasedContext::Present,
        )
    }

    fn is_locked(&self, field_name: &str) -> bool {
        self.field_locks.iter().any(|lock| lock.locks(field_name))
    }

    /// Validates every update made after the first signature.
    pub fn validate_all_document_revisions(
        &mut self,
        reader: &dyn RevisionReader,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();

        let revisions = match reader.all_revisions() {
            Ok(revisions) => revisions,
            Err(err) => {
                log::warn!("could not read document revisions: {err}");
                report_item!(DOC_MDP_CHECK, REVISIONS_RETRIEVAL_FAILED)
                    .caused_by(err)
                    .indeterminate(&mut report);
                return report;
            }
        };

        let context = Self::context();
        let mut history = SignatureHistory::default();

        for (index, revision) in revisions.iter().enumerate() {
            if index > 0 && !history.signed.is_empty() {
                self.validate_revision(&revisions[index - 1], revision, &mut report);
            }

            self.record_new_signatures(revision, &mut history, &mut report);

            if !self.chain.properties().continue_after_failure(&context)
                && report.validation_result() != ValidationResult::Valid
            {
                return report;
            }
        }

        if history.signed.is_empty() {
            report_item!(DOC_MDP_CHECK, DOCUMENT_WITHOUT_SIGNATURES).info(&mut report);
        }

        report
    }

    fn record_new_signatures(
        &mut self,
        revision: &DocumentRevision,
        history: &mut SignatureHistory,
        report: &mut ValidationReport,
    ) {
        for field in signed_fields(revision) {
            if history.signed.get(&field.name) == Some(&field.value) {
                continue;
            }
            history.signed.insert(field.name.clone(), field.value.clone());

            if field.timestamp {
                continue;
            }

            if let Some(p) = field.restrictions.doc_mdp {
                history.certifications += 1;

                if history.certifications > 1 {
                    if !history.too_many_reported {
                        report_item!(DOC_MDP_CHECK, TOO_MANY_CERTIFICATION_SIGNATURES)
                            .invalid(report);
                        history.too_many_reported = true;
                    }
                } else if history.approvals > 0 {
                    report_item!(DOC_MDP_CHECK, NOT_ALLOWED_CERTIFICATION_SIGNATURE)
                        .invalid(report);
                } else {
                    self.apply_level(&field.name, p, report);
                }
            } else {
                history.approvals += 1;
                if self.access_permissions == AccessPermissions::Unspecified {
                    self.access_permissions = AccessPermissions::AnnotationModification;
                }
            }

            for lock in field.lock.iter().chain(&field.restrictions.field_locks) {
                if let Some(p) = lock.permissions {
                    self.apply_level(&field.name, p, report);
                }
                self.field_locks.push(lock.clone());
            }
        }
    }

    /// Narrows the access permissions to DocMDP level `p`. Attempts to
    /// widen them are reported and ignored.
    fn apply_level(&mut self, field_name: &str, p: i64, report: &mut ValidationReport) {
        match AccessPermissions::from_p(p) {
            Some(level) if level > self.access_permissions => {
                report_item!(
                    FIELD_MDP_CHECK,
                    format_message(ACCESS_PERMISSIONS_ADDED, &[&field_name])
                )
                .indeterminate(report);
            }
            Some(level) => self.access_permissions = level,
            None => {
                report_item!(
                    DOC_MDP_CHECK,
                    format_message(UNKNOWN_ACCESS_PERMISSIONS, &[&field_name, &p])
                )
                .indeterminate(report);
            }
        }
    }

    /// Classifies every difference between two consecutive revisions.
    pub fn validate_revision(
        &self,
        previous: &DocumentRevision,
        next: &DocumentRevision,
        report: &mut ValidationReport,
    ) {
        let (Some(prev_catalog), Some(next_catalog)) = (previous.catalog(), next.catalog()) else {
            report_item!(DOC_MDP_CHECK, CATALOG_MISSING).indeterminate(report);
            return;
        };

        let mut explained = BTreeSet::new();
        explained.extend(next.catalog_ref());

        match (prev_catalog.get("DSS"), next_catalog.get("DSS")) {
            (Some(_), None) => report_item!(DOC_MDP_CHECK, DSS_REMOVED).invalid(report),
            (_, Some(dss)) => explained.extend(next.reachable_from(dss, &[])),
            (None, None) => {}
        }

        self.check_permissions(previous, prev_catalog, next, next_catalog, report, &mut explained);
        self.check_extensions(previous, prev_catalog, next, next_catalog, report, &mut explained);

        if self.access_permissions == AccessPermissions::Unspecified {
            return;
        }

        let catalog_changed = prev_catalog
            .keys()
            .chain(next_catalog.keys())
            .filter(|k| !CATALOG_CHECKED_KEYS.contains(&k.as_str()))
            .any(|k| !same_entry(previous, prev_catalog.get(k), next, next_catalog.get(k)));

        if catalog_changed {
            report_item!(DOC_MDP_CHECK, NOT_ALLOWED_CATALOG_CHANGES).invalid(report);
        }

        self.check_acroform(previous, prev_catalog, next, next_catalog, report, &mut explained);
        self.check_fields(previous, next, report, &mut explained);
        self.check_pages(previous, next, report, &mut explained);

        for reference in next.modified_objects() {
            if explained.contains(reference) {
                continue;
            }

            if previous.object(*reference) != next.object(*reference) {
                report_item!(
                    DOC_MDP_CHECK,
                    format_message(UNEXPECTED_ENTRY_IN_XREF, &[reference])
                )
                .invalid(report);
            }
        }
    }

    fn check_permissions(
        &self,
        previous: &DocumentRevision,
        prev_catalog: &PdfDictionary,
        next: &DocumentRevision,
        next_catalog: &PdfDictionary,
        report: &mut ValidationReport,
        explained: &mut BTreeSet<ObjectRef>,
    ) {
        explained.extend(next_catalog.get("Perms").and_then(PdfObject::as_reference));

        let Some(prev_perms) = previous.get_dict(prev_catalog, "Perms") else {
            return;
        };
        let next_perms = next.get_dict(next_catalog, "Perms");

        for (key, value) in prev_perms {
            let kept = next_perms.and_then(|perms| perms.get(key)).is_some_and(|next_value| {
                same_entry(previous, Some(value), next, Some(next_value))
            });

            if !kept {
                report_item!(DOC_MDP_CHECK, format_message(PERMISSION_REMOVED, &[key]))
                    .invalid(report);
            }
        }
    }

    fn check_extensions(
        &self,
        previous: &DocumentRevision,
        prev_catalog: &PdfDictionary,
        next: &DocumentRevision,
        next_catalog: &PdfDictionary,
        report: &mut ValidationReport,
        explained: &mut BTreeSet<ObjectRef>,
    ) {
        if let Some(extensions) = next_catalog.get("Extensions") {
            explained.extend(next.reachable_from(extensions, &[]));
        }

        let Some(prev_extensions) = previous.get_dict(prev_catalog, "Extensions") else {
            return;
        };

        let Some(next_extensions) = next.get_dict(next_catalog, "Extensions") else {
            report_item!(DOC_MDP_CHECK, EXTENSIONS_REMOVED).invalid(report);
            return;
        };

        for (prefix, value) in prev_extensions.iter().filter(|(k, _)| *k != "Type") {
            match next_extensions.get(prefix) {
                None => {
                    report_item!(
                        DOC_MDP_CHECK,
                        format_message(DEVELOPER_EXTENSION_REMOVED, &[prefix])
                    )
                    .invalid(report);
                }
                Some(next_value) => {
                    if extension_level(next, next_value) < extension_level(previous, value) {
                        report_item!(
                            DOC_MDP_CHECK,
                            format_message(EXTENSION_LEVEL_DECREASED, &[prefix])
                        )
                        .invalid(report);
                    }
                }
            }
        }
    }

    fn check_acroform(
        &self,
        previous: &DocumentRevision,
        prev_catalog: &PdfDictionary,
        next: &DocumentRevision,
        next_catalog: &PdfDictionary,
        report: &mut ValidationReport,
        explained: &mut BTreeSet<ObjectRef>,
    ) {
        let empty = PdfDictionary::new();
        let prev_acroform = previous.get_dict(prev_catalog, "AcroForm");
        let next_acroform = next.get_dict(next_catalog, "AcroForm");

        if prev_acroform.is_some() && next_acroform.is_none() {
            report_item!(DOC_MDP_CHECK, NOT_ALLOWED_ACROFORM_CHANGES).invalid(report);
            return;
        }

        let Some(next_acroform) = next_acroform else {
            return;
        };
        let prev_acroform = prev_acroform.unwrap_or(&empty);

        explained.extend(next_catalog.get("AcroForm").and_then(PdfObject::as_reference));
        explained.extend(next_acroform.get("Fields").and_then(PdfObject::as_reference));
        for key in ["DR", "DA"] {
            if let Some(value) = next_acroform.get(key) {
                explained.extend(next.reachable_from(value, &[]));
            }
        }

        let changed = prev_acroform
            .keys()
            .chain(next_acroform.keys())
            .filter(|k| !ACROFORM_MUTABLE_KEYS.contains(&k.as_str()))
            .any(|k| !same_entry(previous, prev_acroform.get(k), next, next_acroform.get(k)));

        if changed {
            report_item!(DOC_MDP_CHECK, NOT_ALLOWED_ACROFORM_CHANGES).invalid(report);
        }
    }

    fn check_fields(
        &self,
        previous: &DocumentRevision,
        next: &DocumentRevision,
        report: &mut ValidationReport,
        explained: &mut BTreeSet<ObjectRef>,
    ) {
        let prev_fields = collect_fields(previous);
        let next_fields = collect_fields(next);
        let fill_in_allowed = self.access_permissions >= AccessPermissions::FormFieldsModification;

        for name in prev_fields.keys().filter(|name| !next_fields.contains_key(*name)) {
            report_item!(DOC_MDP_CHECK, format_message(FIELD_REMOVED, &[name])).invalid(report);
        }

        for (name, field) in &next_fields {
            let Some(prev_field) = prev_fields.get(name) else {
                if !field.is_signature() {
                    report_item!(DOC_MDP_CHECK, format_message(UNEXPECTED_FORM_FIELD, &[name]))
                        .invalid(report);
                } else if fill_in_allowed
                    || field.signature_dict(next).is_some_and(is_doc_timestamp)
                {
                    explained.extend(next.reachable_from(&field.object, &BACK_REFERENCE_KEYS));
                } else {
                    report_item!(DOC_MDP_CHECK, NOT_ALLOWED_ACROFORM_CHANGES).invalid(report);
                }
                continue;
            };

            if !deep_equal(previous, &prev_field.object, next, &field.object, &FIELD_VALUE_KEYS) {
                report_item!(DOC_MDP_CHECK, format_message(FIELD_MODIFIED, &[name]))
                    .invalid(report);
                continue;
            }

            if deep_equal(previous, &prev_field.object, next, &field.object, &BACK_REFERENCE_KEYS) {
                continue;
            }

            if field.is_signature() {
                let newly_signed = prev_field.signature_dict(previous).is_none();
                let timestamp = field.signature_dict(next).is_some_and(is_doc_timestamp);

                if !newly_signed {
                    report_item!(DOC_MDP_CHECK, format_message(FIELD_MODIFIED, &[name]))
                        .invalid(report);
                } else if fill_in_allowed || timestamp {
                    explained.extend(next.reachable_from(&field.object, &BACK_REFERENCE_KEYS));
                } else {
                    report_item!(DOC_MDP_CHECK, NOT_ALLOWED_ACROFORM_CHANGES).invalid(report);
                }
            } else if self.is_locked(name) {
                report_item!(FIELD_MDP_CHECK, format_message(LOCKED_FIELD_MODIFIED, &[name]))
                    .invalid(report);
            } else if fill_in_allowed {
                explained.extend(next.reachable_from(&field.object, &BACK_REFERENCE_KEYS));
            } else {
                report_item!(DOC_MDP_CHECK, NOT_ALLOWED_ACROFORM_CHANGES).invalid(report);
            }
        }
    }

    fn check_pages(
        &self,
        previous: &DocumentRevision,
        next: &DocumentRevision,
        report: &mut ValidationReport,
        explained: &mut BTreeSet<ObjectRef>,
    ) {
        let (prev_pages, _) = collect_pages(previous);
        let (next_pages, nodes) = collect_pages(next);
        explained.extend(nodes);

        if prev_pages.len() != next_pages.len() {
            report_item!(
                DOC_MDP_CHECK,
                format_message(PAGES_COUNT_MODIFIED, &[&prev_pages.len(), &next_pages.len()])
            )
            .invalid(report);
            return;
        }

        let annotations_allowed =
            self.access_permissions >= AccessPermissions::AnnotationModification;

        for (index, (prev_page, next_page)) in prev_pages.iter().zip(&next_pages).enumerate() {
            let page_number = index + 1;

            let page_unchanged = deep_equal(
                previous,
                &prev_page.object,
                next,
                &next_page.object,
                &["Annots", "Parent"],
            );
            if !page_unchanged {
                report_item!(DOC_MDP_CHECK, format_message(PAGE_MODIFIED, &[&page_number]))
                    .invalid(report);
                continue;
            }

            let annots = |revision: &DocumentRevision, page: &PageInfo| -> Vec<PdfObject> {
                revision
                    .resolve(&page.object)
                    .and_then(|p| p.as_dict())
                    .and_then(|p| revision.get(p, "Annots"))
                    .and_then(PdfObject::as_array)
                    .map(<[PdfObject]>::to_vec)
                    .unwrap_or_default()
            };

            if let Some(r) = next
                .resolve(&next_page.object)
                .and_then(|p| p.get("Annots"))
                .and_then(PdfObject::as_reference)
            {
                explained.insert(r);
            }

            let prev_annots = annots(previous, prev_page);
            let next_annots = annots(next, next_page);
            let prev_refs: BTreeSet<ObjectRef> =
                prev_annots.iter().filter_map(PdfObject::as_reference).collect();
            let next_refs: BTreeSet<ObjectRef> =
                next_annots.iter().filter_map(PdfObject::as_reference).collect();

            let mut modified =
                prev_refs.difference(&next_refs).next().is_some() && !annotations_allowed;

            for annot in &next_annots {
                let acceptable = match annot.as_reference() {
                    Some(r) if explained.contains(&r) => true,
                    Some(r) if prev_refs.contains(&r) => {
                        previous.object(r) == next.object(r) || annotations_allowed
                    }
                    Some(_) => annotations_allowed,
                    None => {
                        annotations_allowed
                            || prev_annots.iter().any(|p| {
                                p.as_reference().is_none()
                                    && deep_equal(previous, p, next, annot, &[])
                            })
                    }
                };

                if !acceptable {
                    modified = true;
                } else if annotations_allowed {
                    explained.extend(next.reachable_from(annot, &BACK_REFERENCE_KEYS));
                }
            }

            if modified {
                report_item!(
                    DOC_MDP_CHECK,
                    format_message(PAGE_ANNOTATIONS_MODIFIED, &[&page_number])
                )
                .invalid(report);
            }
        }
    }
}
