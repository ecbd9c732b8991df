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

//! The context a check runs in.

use std::{
    fmt::{self, Display, Formatter},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

/// The validator that is currently running.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum ValidatorContext {
    OcspValidator,
    CrlValidator,
    RevocationDataValidator,
    CertificateChainValidator,
    SignatureValidator,
    TimestampValidator,
    DocumentRevisionsValidator,
}

impl ValidatorContext {
    pub const ALL: [ValidatorContext; 7] = [
        ValidatorContext::OcspValidator,
        ValidatorContext::CrlValidator,
        ValidatorContext::RevocationDataValidator,
        ValidatorContext::CertificateChainValidator,
        ValidatorContext::SignatureValidator,
        ValidatorContext::TimestampValidator,
        ValidatorContext::DocumentRevisionsValidator,
    ];
}

/// The role of the certificate under test.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum CertificateSource {
    SignerCert,
    CertIssuer,
    CrlIssuer,
    OcspIssuer,
    Timestamp,
    RootCert,
}

impl CertificateSource {
    pub const ALL: [CertificateSource; 6] = [
        CertificateSource::SignerCert,
        CertificateSource::CertIssuer,
        CertificateSource::CrlIssuer,
        CertificateSource::OcspIssuer,
        CertificateSource::Timestamp,
        CertificateSource::RootCert,
    ];
}

/// Whether the check date is "now" or a point in the signed past.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum TimeBasedContext {
    Present,
    Historical,
}

impl TimeBasedContext {
    pub const ALL: [TimeBasedContext; 2] =
        [TimeBasedContext::Present, TimeBasedContext::Historical];
}

/// Immutable (validator, certificate source, time base) triple.
///
/// The `with_*` methods return a new context and leave `self` untouched.
/// Every derived context remembers the one it came from, so a check deep
/// in a chain can still ask which certificate sources led to it.
#[derive(Clone, Debug)]
pub struct ValidationContext {
    validator_context: ValidatorContext,
    certificate_source: CertificateSource,
    time_based_context: TimeBasedContext,
    previous: Option<Arc<ValidationContext>>,
}

impl ValidationContext {
    pub fn new(
        validator_context: ValidatorContext,
        certificate_source: CertificateSource,
        time_based_context: TimeBasedContext,
    ) -> Self {
        Self {
            validator_context,
            certificate_source,
            time_based_context,
            previous: None,
        }
    }

    pub fn validator_context(&self) -> ValidatorContext {
        self.validator_context
    }

    pub fn certificate_source(&self) -> CertificateSource {
        self.certificate_source
    }

    pub fn time_based_context(&self) -> TimeBasedContext {
        self.time_based_context
    }

    pub fn previous(&self) -> Option<&ValidationContext> {
        self.previous.as_deref()
    }

    pub fn with_validator_context(&self, validator_context: ValidatorContext) -> Self {
        Self {
            validator_context,
            ..self.derived()
        }
    }

    pub fn with_certificate_source(&self, certificate_source: CertificateSource) -> Self {
        Self {
            certificate_source,
            ..self.derived()
        }
    }

    pub fn with_time_based_context(&self, time_based_context: TimeBasedContext) -> Self {
        Self {
            time_based_context,
            ..self.derived()
        }
    }

    fn derived(&self) -> Self {
        Self {
            previous: Some(Arc::new(self.clone())),
            ..self.clone()
        }
    }

    /// Returns `true` if `source` is the source of this context or of any
    /// context it was derived from.
    pub fn contains_certificate_source(&self, source: CertificateSource) -> bool {
        self.history().any(|ctx| ctx.certificate_source == source)
    }

    /// Number of contexts in the derivation history, including this one.
    pub fn depth(&self) -> usize {
        self.history().count()
    }

    fn history(&self) -> impl Iterator<Item = &ValidationContext> {
        std::iter::successors(Some(self), |ctx| ctx.previous.as_deref())
    }
}

impl PartialEq for ValidationContext {
    fn eq(&self, other: &Self) -> bool {
        self.validator_context == other.validator_context
            && self.certificate_source == other.certificate_source
            && self.time_based_context == other.time_based_context
    }
}

impl Eq for ValidationContext {}

impl Display for ValidationContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ValidationContext{{validatorContext={:?}, certificateSource={:?}, timeBasedContext={:?}}}",
            self.validator_context, self.certificate_source, self.time_based_context
        )
    }
}
