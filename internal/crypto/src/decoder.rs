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

use std::fmt::Debug;

use crate::{crl::CrlRef, ocsp::OcspResponseRef, CryptoError};

/// Turns encoded revocation data into the objects the validators consume.
///
/// Revocation clients and document security stores hand out bytes; the
/// decoder is the single place where those bytes are interpreted.
pub trait RevocationDecoder: Debug + Send + Sync {
    fn decode_crl(&self, encoded: &[u8]) -> Result<CrlRef, CryptoError>;

    /// Decodes a complete `OCSPResponse` and returns its basic response.
    fn decode_ocsp_response(&self, encoded: &[u8]) -> Result<OcspResponseRef, CryptoError>;
}

/// Decoder used when no DER support is compiled in.
#[derive(Debug, Default)]
pub struct UnsupportedDecoder;

impl RevocationDecoder for UnsupportedDecoder {
    fn decode_crl(&self, _encoded: &[u8]) -> Result<CrlRef, CryptoError> {
        Err(CryptoError::UnsupportedEncoding("CRL".to_string()))
    }

    fn decode_ocsp_response(&self, _encoded: &[u8]) -> Result<OcspResponseRef, CryptoError> {
        Err(CryptoError::UnsupportedEncoding("OCSP response".to_string()))
    }
}

/// Returns the best decoder available with the enabled features.
pub fn default_decoder() -> std::sync::Arc<dyn RevocationDecoder> {
    #[cfg(feature = "x509")]
    {
        std::sync::Arc::new(crate::x509::DerDecoder)
    }

    #[cfg(not(feature = "x509"))]
    {
        std::sync::Arc::new(UnsupportedDecoder)
    }
}
