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
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
};

/// Indirect object reference `number generation R`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectRef {
    pub number: u32,
    pub generation: u16,
}

impl ObjectRef {
    pub const fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }
}

impl Display for ObjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// Dictionary keys are stored without the leading `/`.
pub type PdfDictionary = BTreeMap<String, PdfObject>;

/// A PDF object as read from one revision.
#[derive(Clone, Debug, PartialEq)]
pub enum PdfObject {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// Name without the leading `/`.
    Name(String),
    String(Vec<u8>),
    Array(Vec<PdfObject>),
    Dictionary(PdfDictionary),
    Stream {
        dict: PdfDictionary,
        data: Vec<u8>,
    },
    Reference(ObjectRef),
}

impl PdfObject {
    pub fn name(name: &str) -> Self {
        PdfObject::Name(name.to_string())
    }

    pub fn string(value: &str) -> Self {
        PdfObject::String(value.as_bytes().to_vec())
    }

    pub fn reference(number: u32) -> Self {
        PdfObject::Reference(ObjectRef::new(number, 0))
    }

    /// Builds a dictionary from key/value pairs.
    pub fn dict<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, PdfObject)>,
        K: Into<String>,
    {
        PdfObject::Dictionary(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// The dictionary of a dictionary or stream.
    pub fn as_dict(&self) -> Option<&PdfDictionary> {
        match self {
            PdfObject::Dictionary(dict) | PdfObject::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut PdfDictionary> {
        match self {
            PdfObject::Dictionary(dict) | PdfObject::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            PdfObject::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PdfObject::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PdfObject]> {
        match self {
            PdfObject::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            PdfObject::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Text of a string object, decoded lossily.
    pub fn as_text(&self) -> Option<String> {
        match self {
            PdfObject::String(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PdfObject::Null)
    }

    /// Entry `key` of a dictionary or stream.
    pub fn get(&self, key: &str) -> Option<&PdfObject> {
        self.as_dict().and_then(|dict| dict.get(key))
    }
}
