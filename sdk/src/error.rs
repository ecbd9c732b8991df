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

use pdfsig_crypto::CryptoError;
use thiserror::Error;

/// Errors returned for configuration and usage problems.
///
/// Findings about certificates, revocation data and documents are never
/// reported through this type; they are recorded in a
/// [`ValidationReport`](crate::ValidationReport).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("bad parameter: {0}")]
    BadParam(String),

    #[error("required feature missing: {0}")]
    MissingFeature(String),

    /// The settings could not be parsed or failed validation.
    #[error("invalid settings: {0}")]
    BadSettings(String),

    /// A trust anchor bundle could not be loaded.
    #[error("unable to load trust anchors: {0}")]
    TrustAnchorError(String),

    /// The revision reader could not produce the document revisions.
    #[error("unable to read document revisions: {0}")]
    RevisionReadError(String),

    /// The signature container could not be interpreted.
    #[error("malformed signature container: {0}")]
    SignatureContainerError(String),

    #[error(transparent)]
    CryptoError(#[from] CryptoError),
}

/// A specialized `Result` type for validation setup operations.
pub type Result<T> = std::result::Result<T, Error>;
