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

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::object::{ObjectRef, PdfDictionary, PdfObject};
use crate::Result;

/// Longest chain of references followed when resolving an object.
const MAX_REFERENCE_CHAIN: usize = 32;

/// The document as it stood after one incremental update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentRevision {
    objects: BTreeMap<ObjectRef, PdfObject>,
    trailer: PdfDictionary,
    modified: BTreeSet<ObjectRef>,
    byte_range: (u64, u64),
}

impl DocumentRevision {
    /// `objects` is the full object graph visible in this revision;
    /// `modified` lists the objects its cross-reference section wrote.
    pub fn new(
        objects: BTreeMap<ObjectRef, PdfObject>,
        trailer: PdfDictionary,
        modified: BTreeSet<ObjectRef>,
        byte_range: (u64, u64),
    ) -> Self {
        Self {
            objects,
            trailer,
            modified,
            byte_range,
        }
    }

    pub fn trailer(&self) -> &PdfDictionary {
        &self.trailer
    }

    pub fn object(&self, reference: ObjectRef) -> Option<&PdfObject> {
        self.objects.get(&reference)
    }

    pub fn objects(&self) -> &BTreeMap<ObjectRef, PdfObject> {
        &self.objects
    }

    pub fn modified_objects(&self) -> &BTreeSet<ObjectRef> {
        &self.modified
    }

    /// Offset and length of the bytes this revision occupies.
    pub fn byte_range(&self) -> (u64, u64) {
        self.byte_range
    }

    /// Follows references until a direct object is reached. A dangling
    /// reference resolves to `None`, which PDF treats as `null`.
    pub fn resolve<'a>(&'a self, object: &'a PdfObject) -> Option<&'a PdfObject> {
        let mut current = object;

        for _ in 0..MAX_REFERENCE_CHAIN {
            match current {
                PdfObject::Reference(r) => current = self.objects.get(r)?,
                direct => return Some(direct),
            }
        }

        None
    }

    /// Resolved dictionary entry `key` of `dict`.
    pub fn get<'a>(&'a self, dict: &'a PdfDictionary, key: &str) -> Option<&'a PdfObject> {
        dict.get(key).and_then(|value| self.resolve(value))
    }

    /// Resolved dictionary entry `key` of `dict`, if it is a dictionary.
    pub fn get_dict<'a>(&'a self, dict: &'a PdfDictionary, key: &str) -> Option<&'a PdfDictionary> {
        self.get(dict, key).and_then(PdfObject::as_dict)
    }

    /// The document catalog named by the trailer's `/Root`.
    pub fn catalog(&self) -> Option<&PdfDictionary> {
        self.get_dict(&self.trailer, "Root")
    }

    /// Reference of the catalog, if it is indirect.
    pub fn catalog_ref(&self) -> Option<ObjectRef> {
        self.trailer.get("Root").and_then(PdfObject::as_reference)
    }

    /// Every reference reachable from `object`, not descending into the
    /// entries named in `skip_keys`.
    pub fn reachable_from(&self, object: &PdfObject, skip_keys: &[&str]) -> BTreeSet<ObjectRef> {
        let mut found = BTreeSet::new();
        let mut pending = vec![object];

        while let Some(current) = pending.pop() {
            match current {
                PdfObject::Reference(r) => {
                    if found.insert(*r) {
                        if let Some(target) = self.objects.get(r) {
                            pending.push(target);
                        }
                    }
                }
                PdfObject::Array(items) => pending.extend(items.iter()),
                PdfObject::Dictionary(dict) | PdfObject::Stream { dict, .. } => {
                    pending.extend(
                        dict.iter()
                            .filter(|(k, _)| !skip_keys.contains(&k.as_str()))
                            .map(|(_, v)| v),
                    );
                }
                _ => {}
            }
        }

        found
    }
}

/// Compares `a` as read in `a_rev` with `b` as read in `b_rev`, following
/// references on both sides. Dictionary entries named in `ignore_keys`
/// are skipped at the top level only.
pub fn deep_equal(
    a_rev: &DocumentRevision,
    a: &PdfObject,
    b_rev: &DocumentRevision,
    b: &PdfObject,
    ignore_keys: &[&str],
) -> bool {
    let mut visited = HashSet::new();
    compare(a_rev, a, b_rev, b, ignore_keys, &mut visited)
}

fn compare(
    a_rev: &DocumentRevision,
    a: &PdfObject,
    b_rev: &DocumentRevision,
    b: &PdfObject,
    ignore_keys: &[&str],
    visited: &mut HashSet<(ObjectRef, ObjectRef)>,
) -> bool {
    if let (PdfObject::Reference(ra), PdfObject::Reference(rb)) = (a, b) {
        // A pair already under comparison is assumed equal; any
        // difference is found on the first visit.
        if !visited.insert((*ra, *rb)) {
            return true;
        }
    }

    let (Some(a), Some(b)) = (a_rev.resolve(a), b_rev.resolve(b)) else {
        return a_rev.resolve(a).map_or(true, PdfObject::is_null)
            && b_rev.resolve(b).map_or(true, PdfObject::is_null);
    };

    match (a, b) {
        (PdfObject::Array(xs), PdfObject::Array(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| compare(a_rev, x, b_rev, y, &[], visited))
        }

        (PdfObject::Dictionary(da), PdfObject::Dictionary(db)) => {
            compare_dicts(a_rev, da, b_rev, db, ignore_keys, visited)
        }

        (
            PdfObject::Stream { dict: da, data: xa },
            PdfObject::Stream { dict: db, data: xb },
        ) => xa == xb && compare_dicts(a_rev, da, b_rev, db, ignore_keys, visited),

        (a, b) => a == b,
    }
}

fn compare_dicts(
    a_rev: &DocumentRevision,
    a: &PdfDictionary,
    b_rev: &DocumentRevision,
    b: &PdfDictionary,
    ignore_keys: &[&str],
    visited: &mut HashSet<(ObjectRef, ObjectRef)>,
) -> bool {
    let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();

    keys.into_iter()
        .filter(|k| !ignore_keys.contains(&k.as_str()))
        .all(|k| match (a.get(k), b.get(k)) {
            (Some(x), Some(y)) => compare(a_rev, x, b_rev, y, &[], visited),
            (Some(x), None) => a_rev.resolve(x).map_or(true, PdfObject::is_null),
            (None, Some(y)) => b_rev.resolve(y).map_or(true, PdfObject::is_null),
            (None, None) => true,
        })
}

/// Source of the revisions of a document, oldest first.
pub trait RevisionReader {
    fn all_revisions(&self) -> Result<Vec<DocumentRevision>>;
}
