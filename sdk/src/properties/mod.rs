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

//! Validation policy.
//!
//! Every policy question is asked with a [`ValidationContext`]. Settings
//! are stored as an ordered list of rules; each rule names the contexts
//! it applies to and the values it sets. When several rules match, the
//! most specific one wins, and among equally specific rules the one added
//! last wins.

mod extensions;

use std::collections::BTreeSet;

use chrono::TimeDelta;
use pdfsig_crypto::{certificate::KeyUsage, oids};
use serde::{Deserialize, Serialize};

pub use self::extensions::CertificateExtension;
use crate::context::{CertificateSource, TimeBasedContext, ValidationContext, ValidatorContext};

/// Default freshness of revocation data: 30 days when validating at the
/// present time and one minute when validating in the past.
pub fn default_freshness(time_based_context: TimeBasedContext) -> TimeDelta {
    match time_based_context {
        TimeBasedContext::Present => TimeDelta::days(30),
        TimeBasedContext::Historical => TimeDelta::minutes(1),
    }
}

/// Converts a configured freshness to a duration.
pub(crate) fn freshness_from_seconds(seconds: i64) -> crate::Result<TimeDelta> {
    TimeDelta::try_seconds(seconds)
        .ok_or_else(|| crate::Error::BadParam(format!("freshness out of range: {seconds}s")))
}

/// When the revocation data validator may use its online clients.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OnlineFetching {
    /// Always query the clients, even when evidence was supplied.
    AlwaysFetch,

    /// Query the clients only when no supplied evidence covers the certificate.
    #[default]
    FetchIfNoOtherData,

    /// Never go online.
    NeverFetch,
}

/// The set of contexts a rule applies to. `None` on an axis matches
/// every value of that axis.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ContextSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validators: Option<BTreeSet<ValidatorContext>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_sources: Option<BTreeSet<CertificateSource>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_based: Option<BTreeSet<TimeBasedContext>>,
}

impl ContextSelector {
    /// Matches every context.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn validators<I: IntoIterator<Item = ValidatorContext>>(self, validators: I) -> Self {
        Self {
            validators: Some(validators.into_iter().collect()),
            ..self
        }
    }

    pub fn certificate_sources<I: IntoIterator<Item = CertificateSource>>(
        self,
        sources: I,
    ) -> Self {
        Self {
            certificate_sources: Some(sources.into_iter().collect()),
            ..self
        }
    }

    pub fn time_based<I: IntoIterator<Item = TimeBasedContext>>(self, times: I) -> Self {
        Self {
            time_based: Some(times.into_iter().collect()),
            ..self
        }
    }

    pub fn matches(&self, ctx: &ValidationContext) -> bool {
        fn axis<T: Ord>(set: &Option<BTreeSet<T>>, value: &T) -> bool {
            set.as_ref().map_or(true, |s| s.contains(value))
        }

        axis(&self.validators, &ctx.validator_context())
            && axis(&self.certificate_sources, &ctx.certificate_source())
            && axis(&self.time_based, &ctx.time_based_context())
    }

    /// Number of distinct contexts this selector matches. Smaller is
    /// more specific.
    fn breadth(&self) -> usize {
        self.validators.as_ref().map_or(ValidatorContext::ALL.len(), BTreeSet::len)
            * self
                .certificate_sources
                .as_ref()
                .map_or(CertificateSource::ALL.len(), BTreeSet::len)
            * self.time_based.as_ref().map_or(TimeBasedContext::ALL.len(), BTreeSet::len)
    }
}

/// Values a rule sets. Unset values leave the decision to other rules.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RuleValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_after_failure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness_in_seconds: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_online_fetching: Option<OnlineFetching>,

    /// Required extensions in their string form, see [`CertificateExtension`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_extensions: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq)]
struct Rule {
    selector: ContextSelector,
    continue_after_failure: Option<bool>,
    freshness: Option<TimeDelta>,
    online_fetching: Option<OnlineFetching>,
    required_extensions: Option<Vec<CertificateExtension>>,
}

impl Rule {
    fn new(selector: ContextSelector) -> Self {
        Self {
            selector,
            continue_after_failure: None,
            freshness: None,
            online_fetching: None,
            required_extensions: None,
        }
    }
}

/// Per-context validation policy.
#[derive(Clone, Debug, PartialEq)]
pub struct SignatureValidationProperties {
    rules: Vec<Rule>,
}

impl Default for SignatureValidationProperties {
    fn default() -> Self {
        let mut properties = Self { rules: Vec::new() };

        properties
            .set_continue_after_failure(ContextSelector::any(), true)
            .set_revocation_online_fetching(
                ContextSelector::any(),
                OnlineFetching::FetchIfNoOtherData,
            )
            .set_freshness(
                ContextSelector::any().time_based([TimeBasedContext::Present]),
                default_freshness(TimeBasedContext::Present),
            )
            .set_freshness(
                ContextSelector::any().time_based([TimeBasedContext::Historical]),
                default_freshness(TimeBasedContext::Historical),
            )
            .set_required_extensions(
                ContextSelector::any().certificate_sources([CertificateSource::SignerCert]),
                Vec::new(),
            )
            .set_required_extensions(
                ContextSelector::any().certificate_sources([CertificateSource::CrlIssuer]),
                vec![CertificateExtension::KeyUsage(KeyUsage::CRL_SIGN)],
            )
            .set_required_extensions(
                ContextSelector::any().certificate_sources([CertificateSource::OcspIssuer]),
                vec![CertificateExtension::ExtendedKeyUsage(vec![
                    oids::OCSP_SIGNING.to_string()
                ])],
            )
            .set_required_extensions(
                ContextSelector::any().certificate_sources([CertificateSource::Timestamp]),
                vec![CertificateExtension::ExtendedKeyUsage(vec![
                    oids::TIME_STAMPING.to_string()
                ])],
            )
            .set_required_extensions(
                ContextSelector::any().certificate_sources([
                    CertificateSource::CertIssuer,
                    CertificateSource::RootCert,
                ]),
                vec![
                    CertificateExtension::DynamicBasicConstraints,
                    CertificateExtension::KeyUsage(KeyUsage::KEY_CERT_SIGN),
                ],
            );

        properties
    }
}

impl SignatureValidationProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy with no rules at all. Every question answers with the
    /// built-in fallback.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Whether validation continues after a failure in `ctx`.
    pub fn continue_after_failure(&self, ctx: &ValidationContext) -> bool {
        self.lookup(ctx, |r| r.continue_after_failure).unwrap_or(true)
    }

    /// Maximum age of revocation data relative to the validation date.
    ///
    /// A negative value requires data issued after the validation date.
    pub fn freshness(&self, ctx: &ValidationContext) -> TimeDelta {
        self.lookup(ctx, |r| r.freshness)
            .unwrap_or_else(|| default_freshness(ctx.time_based_context()))
    }

    pub fn revocation_online_fetching(&self, ctx: &ValidationContext) -> OnlineFetching {
        self.lookup(ctx, |r| r.online_fetching).unwrap_or_default()
    }

    /// Extensions a certificate validated in `ctx` must carry.
    pub fn required_extensions(&self, ctx: &ValidationContext) -> Vec<CertificateExtension> {
        self.lookup(ctx, |r| r.required_extensions.clone())
            .unwrap_or_default()
    }

    pub fn set_continue_after_failure(
        &mut self,
        selector: ContextSelector,
        value: bool,
    ) -> &mut Self {
        self.rules.push(Rule {
            continue_after_failure: Some(value),
            ..Rule::new(selector)
        });
        self
    }

    pub fn set_freshness(&mut self, selector: ContextSelector, value: TimeDelta) -> &mut Self {
        self.rules.push(Rule {
            freshness: Some(value),
            ..Rule::new(selector)
        });
        self
    }

    pub fn set_revocation_online_fetching(
        &mut self,
        selector: ContextSelector,
        value: OnlineFetching,
    ) -> &mut Self {
        self.rules.push(Rule {
            online_fetching: Some(value),
            ..Rule::new(selector)
        });
        self
    }

    pub fn set_required_extensions(
        &mut self,
        selector: ContextSelector,
        value: Vec<CertificateExtension>,
    ) -> &mut Self {
        self.rules.push(Rule {
            required_extensions: Some(value),
            ..Rule::new(selector)
        });
        self
    }

    /// Adds a rule read from settings.
    pub fn add_rule(
        &mut self,
        selector: ContextSelector,
        values: &RuleValues,
    ) -> crate::Result<&mut Self> {
        let freshness = values
            .freshness_in_seconds
            .map(freshness_from_seconds)
            .transpose()?;

        let required_extensions = values
            .required_extensions
            .as_ref()
            .map(|list| {
                list.iter()
                    .map(|s| s.parse::<CertificateExtension>())
                    .collect::<crate::Result<Vec<_>>>()
            })
            .transpose()?;

        self.rules.push(Rule {
            selector,
            continue_after_failure: values.continue_after_failure,
            freshness,
            online_fetching: values.revocation_online_fetching,
            required_extensions,
        });

        Ok(self)
    }

    fn lookup<T, F>(&self, ctx: &ValidationContext, value: F) -> Option<T>
    where
        F: Fn(&Rule) -> Option<T>,
    {
        let mut best: Option<(usize, T)> = None;

        for rule in &self.rules {
            if !rule.selector.matches(ctx) {
                continue;
            }

            let Some(v) = value(rule) else {
                continue;
            };

            // Later rules replace earlier ones of equal breadth.
            let breadth = rule.selector.breadth();
            if best.as_ref().map_or(true, |(b, _)| breadth <= *b) {
                best = Some((breadth, v));
            }
        }

        best.map(|(_, v)| v)
    }
}
