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

#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]
#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg, doc_cfg_hide))]

pub mod base64;
pub mod certificate;
pub mod client;
pub mod crl;
pub mod decoder;
pub mod hash;
pub(crate) mod internal;
pub mod ocsp;
pub mod oids;

mod error;
pub use error::CryptoError;

#[cfg(all(feature = "fetch", not(target_arch = "wasm32")))]
pub mod fetch;

#[cfg(feature = "x509")]
pub mod x509;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use internal::time::utc_now;

#[cfg(test)]
pub(crate) mod tests;
