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

use std::time::Duration;

use log::debug;

use super::{agent, read_body, DEFAULT_TIMEOUT};
use crate::{certificate::Certificate, client::CrlClient, CryptoError};

/// Downloads CRLs from the HTTP distribution points named in the
/// certificate.
#[derive(Debug)]
pub struct HttpCrlClient {
    agent: ureq::Agent,
}

impl HttpCrlClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            agent: agent(timeout),
        }
    }
}

impl Default for HttpCrlClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CrlClient for HttpCrlClient {
    fn get_encoded(
        &self,
        certificate: &dyn Certificate,
        _issuer: Option<&dyn Certificate>,
    ) -> Result<Vec<Vec<u8>>, CryptoError> {
        let urls: Vec<String> = certificate
            .crl_distribution_points()
            .into_iter()
            .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
            .collect();

        if urls.is_empty() {
            return Err(CryptoError::NoRevocationLocation);
        }

        let mut crls = Vec::new();
        let mut last_error = None;

        for url in urls {
            debug!("fetching CRL from {url}");

            match self.agent.get(&url).call() {
                Ok(response) if response.status() == 200 => {
                    crls.push(read_body(&url, response)?);
                }
                Ok(response) => {
                    last_error = Some(CryptoError::FetchFailed {
                        url,
                        reason: format!("HTTP status {}", response.status()),
                    });
                }
                Err(e) => {
                    last_error = Some(CryptoError::FetchFailed {
                        url,
                        reason: e.to_string(),
                    });
                }
            }
        }

        match (crls.is_empty(), last_error) {
            (true, Some(err)) => Err(err),
            _ => Ok(crls),
        }
    }
}
