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

use thiserror::Error;

/// Describes errors that can occur while decoding or fetching
/// certificates and revocation data.
#[derive(Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum CryptoError {
    /// The certificate could not be parsed.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// The CRL could not be parsed.
    #[error("invalid CRL: {0}")]
    InvalidCrl(String),

    /// The OCSP response could not be parsed or was not successful.
    #[error("invalid OCSP response: {0}")]
    InvalidOcspResponse(String),

    /// No decoder for this kind of data was compiled in.
    #[error("no decoder available for {0}")]
    UnsupportedEncoding(String),

    /// The PEM bundle could not be read.
    #[error("invalid PEM data: {0}")]
    InvalidPem(String),

    /// The remote endpoint could not be reached or answered with an error.
    #[error("unable to fetch {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    /// The certificate offers no location to fetch revocation data from.
    #[error("no revocation data location in certificate")]
    NoRevocationLocation,
}
