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
    collections::BTreeSet,
    fmt::{self, Display, Formatter},
};

use super::{
    object::{PdfDictionary, PdfObject},
    revision::DocumentRevision,
};

/// What may change after a signature. Ordered from most to least
/// restrictive.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AccessPermissions {
    /// DocMDP level 1.
    NoChangesPermitted,

    /// DocMDP level 2: form fill-in and signing.
    FormFieldsModification,

    /// DocMDP level 3: level 2 plus annotations.
    AnnotationModification,

    /// No restriction was declared.
    Unspecified,
}

impl AccessPermissions {
    /// Maps a DocMDP `/P` value. Unknown values yield `None`.
    pub fn from_p(p: i64) -> Option<Self> {
        match p {
            1 => Some(AccessPermissions::NoChangesPermitted),
            2 => Some(AccessPermissions::FormFieldsModification),
            3 => Some(AccessPermissions::AnnotationModification),
            _ => None,
        }
    }
}

impl Display for AccessPermissions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessPermissions::NoChangesPermitted => "NO_CHANGES_PERMITTED",
            AccessPermissions::FormFieldsModification => "FORM_FIELDS_MODIFICATION",
            AccessPermissions::AnnotationModification => "ANNOTATION_MODIFICATION",
            AccessPermissions::Unspecified => "UNSPECIFIED",
        })
    }
}

/// DocMDP level used when a certification signature omits `/P`.
pub const DEFAULT_DOC_MDP_LEVEL: i64 = 2;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LockAction {
    All,
    Include(BTreeSet<String>),
    Exclude(BTreeSet<String>),
}

/// A FieldMDP lock: which fields a signature freezes and, optionally, a
/// new DocMDP level.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldLock {
    pub action: LockAction,

    /// Raw `/P` value, if the lock sets one.
    pub permissions: Option<i64>,
}

impl FieldLock {
    /// Reads a `/Lock` dictionary or FieldMDP `/TransformParams`.
    pub fn from_dict(revision: &DocumentRevision, dict: &PdfDictionary) -> Option<Self> {
        let fields = || -> BTreeSet<String> {
            revision
                .get(dict, "Fields")
                .and_then(PdfObject::as_array)
                .unwrap_or_default()
                .iter()
                .filter_map(|f| revision.resolve(f).and_then(PdfObject::as_text))
                .collect()
        };

        let action = match revision.get(dict, "Action").and_then(PdfObject::as_name)? {
            "All" => LockAction::All,
            "Include" => LockAction::Include(fields()),
            "Exclude" => LockAction::Exclude(fields()),
            _ => return None,
        };

        Some(FieldLock {
            action,
            permissions: revision.get(dict, "P").and_then(PdfObject::as_integer),
        })
    }

    pub fn locks(&self, field_name: &str) -> bool {
        match &self.action {
            LockAction::All => true,
            LockAction::Include(fields) => fields.contains(field_name),
            LockAction::Exclude(fields) => !fields.contains(field_name),
        }
    }
}

/// How a signature dictionary asks to restrict later changes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SignatureRestrictions {
    /// DocMDP `/P`, when this is a certification signature.
    pub doc_mdp: Option<i64>,

    /// FieldMDP transforms in the signature's `/Reference` array.
    pub field_locks: Vec<FieldLock>,
}

impl SignatureRestrictions {
    pub fn from_signature_dict(revision: &DocumentRevision, sig: &PdfDictionary) -> Self {
        let mut restrictions = SignatureRestrictions::default();

        let references = revision
            .get(sig, "Reference")
            .and_then(PdfObject::as_array)
            .unwrap_or_default();

        for reference in references {
            let Some(reference) = revision.resolve(reference).and_then(PdfObject::as_dict) else {
                continue;
            };
            let params = revision.get_dict(reference, "TransformParams");

            match revision.get(reference, "TransformMethod").and_then(PdfObject::as_name) {
                Some("DocMDP") => {
                    restrictions.doc_mdp = Some(
                        params
                            .and_then(|p| revision.get(p, "P"))
                            .and_then(PdfObject::as_integer)
                            .unwrap_or(DEFAULT_DOC_MDP_LEVEL),
                    );
                }
                Some("FieldMDP") => {
                    if let Some(lock) = params.and_then(|p| FieldLock::from_dict(revision, p)) {
                        restrictions.field_locks.push(lock);
                    }
                }
                _ => {}
            }
        }

        restrictions
    }

    pub fn is_certification(&self) -> bool {
        self.doc_mdp.is_some()
    }
}
