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

//! Blocking HTTP clients for CRL distribution points and OCSP responders.

mod crl;

pub use crl::HttpCrlClient;

pub use crate::ocsp::fetch::HttpOcspClient;

use std::{io::Read, time::Duration};

use crate::CryptoError;

/// Upper bound on the size of a downloaded CRL or OCSP response.
const MAX_RESPONSE_SIZE: u64 = 10_000_000;

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

pub(crate) fn read_body(url: &str, response: ureq::Response) -> Result<Vec<u8>, CryptoError> {
    let len = response
        .header("Content-Length")
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10000)
        .min(MAX_RESPONSE_SIZE as usize);

    let mut body: Vec<u8> = Vec::with_capacity(len);

    response
        .into_reader()
        .take(MAX_RESPONSE_SIZE)
        .read_to_end(&mut body)
        .map_err(|e| CryptoError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    Ok(body)
}
