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
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg, doc_cfg_hide))]

//! This library decides whether the signatures of a PDF document can be
//! trusted: it walks certificate chains to configured trust anchors,
//! checks revocation through CRLs and OCSP responses, and checks that
//! the changes made after each signature are ones the signer allowed.
//!
//! Every finding is recorded in a [`ValidationReport`]; validation calls
//! never fail because of what they find.
//!
//! # Example: Configuring a validator
//!
//! ```
//! # use pdfsig::Result;
//! use pdfsig::settings::Settings;
//!
//! # fn main() -> Result<()> {
//! let settings = Settings::from_toml(
//!     r#"
//!     [validation]
//!     continue_after_failure = false
//!     revocation_online_fetching = "never_fetch"
//!     "#,
//! )?;
//!
//! let chain = settings.validator_chain()?;
//! let _validator = chain.signature_validator();
//! # Ok(())
//! # }
//! ```

/// Walking a certificate to its trust anchors.
pub mod chain_validator;
pub mod context;
/// PDF revisions and the checks run on incremental updates.
pub mod document;
pub mod properties;
/// CRL and OCSP checking.
pub mod revocation;
pub mod settings;
pub mod signature;
pub mod trust;
pub mod validator_chain;

mod error;
pub use error::{Error, Result};

pub use pdfsig_crypto as crypto;
pub use pdfsig_report::{
    format_message, ReportItem, ReportItemStatus, ValidationReport, ValidationResult,
};

pub use context::{CertificateSource, TimeBasedContext, ValidationContext, ValidatorContext};
pub use properties::SignatureValidationProperties;
pub use signature::SignatureValidator;
pub use trust::{IssuingCertificateRetriever, TrustedCertificatesStore};
pub use validator_chain::{ValidatorChain, ValidatorChainBuilder};

#[cfg(test)]
pub(crate) mod tests;
