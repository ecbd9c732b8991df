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

//! An in-memory model of a PDF document's revisions and the checks run
//! over the changes between them.

mod object;
mod permissions;
mod revision;
mod revisions_validator;

pub use object::{ObjectRef, PdfDictionary, PdfObject};
pub use permissions::{
    AccessPermissions, FieldLock, LockAction, SignatureRestrictions, DEFAULT_DOC_MDP_LEVEL,
};
pub use revision::{deep_equal, DocumentRevision, RevisionReader};
pub use revisions_validator::*;
