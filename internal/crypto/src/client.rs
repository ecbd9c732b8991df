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

//! Pluggable sources of revocation data.

use std::fmt::Debug;

use crate::{certificate::Certificate, CryptoError};

/// Fetches CRLs for a certificate.
///
/// Implementations perform their own I/O and apply their own timeouts.
pub trait CrlClient: Debug + Send + Sync {
    /// Returns the encoded CRLs that may cover `certificate`.
    fn get_encoded(
        &self,
        certificate: &dyn Certificate,
        issuer: Option<&dyn Certificate>,
    ) -> Result<Vec<Vec<u8>>, CryptoError>;
}

/// Fetches OCSP responses for a certificate.
pub trait OcspClient: Debug + Send + Sync {
    /// Returns an encoded `OCSPResponse` for `certificate`, if the
    /// responder produced one.
    fn get_encoded(
        &self,
        certificate: &dyn Certificate,
        issuer: &dyn Certificate,
    ) -> Result<Option<Vec<u8>>, CryptoError>;
}
