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

//! User-facing configuration.
//!
//! Settings are plain serde structures overlaid from TOML or JSON with
//! the `config` crate, so a partial document only changes the keys it
//! names.

use config::{Config, FileFormat};
use pdfsig_crypto::certificate::CertificateRef;
use serde::{Deserialize, Serialize};

use crate::{
    context::{CertificateSource, TimeBasedContext, ValidatorContext},
    properties::{
        default_freshness, freshness_from_seconds, CertificateExtension, ContextSelector,
        OnlineFetching, RuleValues, SignatureValidationProperties,
    },
    trust::{IssuingCertificateRetriever, TrustClass},
    validator_chain::ValidatorChain,
    Error, Result,
};

const VERSION: u32 = 1;

/// Freshness values beyond a century are rejected.
const MAX_FRESHNESS_SECONDS: i64 = 100 * 365 * 24 * 60 * 60;

fn validate_freshness(seconds: i64) -> Result<()> {
    if seconds.abs() > MAX_FRESHNESS_SECONDS {
        return Err(Error::BadSettings(format!(
            "freshness of {seconds} seconds is out of range"
        )));
    }
    Ok(())
}

// trait used to validate user input to make sure user supplied configurations are valid
pub(crate) trait SettingsValidate {
    // returns error if settings are invalid
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// PEM bundles of trust anchors, one per trust class, plus certificates
/// that may be used to build chains but are not trusted.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Trust {
    /// Anchors trusted for any purpose.
    pub trust_anchors: Option<String>,
    /// Anchors trusted to issue certificates.
    pub ca_anchors: Option<String>,
    /// Anchors trusted to sign OCSP responses.
    pub ocsp_anchors: Option<String>,
    /// Anchors trusted to sign CRLs.
    pub crl_anchors: Option<String>,
    /// Anchors trusted to sign timestamps.
    pub timestamp_anchors: Option<String>,
    /// Untrusted intermediates.
    pub known_certificates: Option<String>,
}

impl Trust {
    fn bundles(&self) -> [(Option<TrustClass>, &Option<String>); 6] {
        [
            (Some(TrustClass::Generic), &self.trust_anchors),
            (Some(TrustClass::Ca), &self.ca_anchors),
            (Some(TrustClass::Ocsp), &self.ocsp_anchors),
            (Some(TrustClass::Crl), &self.crl_anchors),
            (Some(TrustClass::Timestamp), &self.timestamp_anchors),
            (None, &self.known_certificates),
        ]
    }

    fn is_empty(&self) -> bool {
        self.bundles().iter().all(|(_, pem)| pem.is_none())
    }
}

// load PEMs
#[cfg(feature = "x509")]
fn load_certificates(pem: &str) -> Result<Vec<CertificateRef>> {
    // allow for JSON-encoded PEMs with \n
    let pem = pem.replace("\\n", "\n");
    pdfsig_crypto::x509::certificates_from_pem(pem.as_bytes())
        .map_err(|e| Error::TrustAnchorError(e.to_string()))
}

#[cfg(not(feature = "x509"))]
fn load_certificates(_pem: &str) -> Result<Vec<CertificateRef>> {
    Err(Error::MissingFeature("x509".to_string()))
}

impl SettingsValidate for Trust {
    fn validate(&self) -> Result<()> {
        for (_, pem) in self.bundles() {
            if let Some(pem) = pem {
                if !pem.contains("-----BEGIN") {
                    return Err(Error::BadSettings(
                        "trust bundles must be PEM encoded".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// One `[[validation.rules]]` entry.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ValidationRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validators: Option<Vec<ValidatorContext>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_sources: Option<Vec<CertificateSource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_based: Option<Vec<TimeBasedContext>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_after_failure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness_in_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_online_fetching: Option<OnlineFetching>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_extensions: Option<Vec<String>>,
}

impl ValidationRule {
    fn selector(&self) -> ContextSelector {
        let mut selector = ContextSelector::any();
        if let Some(validators) = &self.validators {
            selector = selector.validators(validators.iter().copied());
        }
        if let Some(sources) = &self.certificate_sources {
            selector = selector.certificate_sources(sources.iter().copied());
        }
        if let Some(time_based) = &self.time_based {
            selector = selector.time_based(time_based.iter().copied());
        }
        selector
    }

    fn values(&self) -> RuleValues {
        RuleValues {
            continue_after_failure: self.continue_after_failure,
            freshness_in_seconds: self.freshness_in_seconds,
            revocation_online_fetching: self.revocation_online_fetching,
            required_extensions: self.required_extensions.clone(),
        }
    }
}

impl SettingsValidate for ValidationRule {
    fn validate(&self) -> Result<()> {
        if let Some(seconds) = self.freshness_in_seconds {
            validate_freshness(seconds)?;
        }
        for extension in self.required_extensions.iter().flatten() {
            extension
                .parse::<CertificateExtension>()
                .map_err(|e| Error::BadSettings(e.to_string()))?;
        }
        Ok(())
    }
}

/// Settings for the validators.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Validation {
    /// Whether checks go on after the first failure.
    ///
    /// The default value is true.
    pub continue_after_failure: bool,
    /// How old revocation data may be when validating at the present time.
    pub present_freshness_in_seconds: i64,
    /// How old revocation data may be when validating at a past time.
    pub historical_freshness_in_seconds: i64,
    pub revocation_online_fetching: OnlineFetching,
    /// Whether the changes made after each signature are checked.
    pub validate_document_revisions: bool,
    /// Timeout of the HTTP revocation clients (`fetch` feature).
    pub fetch_timeout_in_seconds: u64,
    /// Context-specific overrides, applied in order.
    #[serde(default)]
    pub rules: Vec<ValidationRule>,
}

impl Default for Validation {
    fn default() -> Self {
        Validation {
            continue_after_failure: true,
            present_freshness_in_seconds: default_freshness(TimeBasedContext::Present)
                .num_seconds(),
            historical_freshness_in_seconds: default_freshness(TimeBasedContext::Historical)
                .num_seconds(),
            revocation_online_fetching: OnlineFetching::default(),
            validate_document_revisions: true,
            fetch_timeout_in_seconds: 30,
            rules: Vec::new(),
        }
    }
}

impl SettingsValidate for Validation {
    fn validate(&self) -> Result<()> {
        if self.fetch_timeout_in_seconds == 0 {
            return Err(Error::BadSettings(
                "fetch_timeout_in_seconds must be positive".to_string(),
            ));
        }
        validate_freshness(self.present_freshness_in_seconds)?;
        validate_freshness(self.historical_freshness_in_seconds)?;
        for rule in &self.rules {
            rule.validate()?;
        }
        Ok(())
    }
}

/// Settings for the validation engine.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Settings {
    version: u32,
    pub trust: Trust,
    pub validation: Validation,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings overlaid with a TOML document.
    pub fn from_toml(toml: &str) -> Result<Self> {
        Settings::default().with_toml(toml)
    }

    /// Default settings overlaid with a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Settings::default().with_json(json)
    }

    pub fn with_toml(self, toml: &str) -> Result<Self> {
        self.with_string(toml, FileFormat::Toml)
    }

    pub fn with_json(self, json: &str) -> Result<Self> {
        self.with_string(json, FileFormat::Json)
    }

    fn with_string(self, settings_str: &str, format: FileFormat) -> Result<Self> {
        // Convert current settings to Config
        let current_config =
            Config::try_from(&self).map_err(|e| Error::BadSettings(e.to_string()))?;

        // Parse new config and overlay it on current
        let updated_config = Config::builder()
            .add_source(current_config)
            .add_source(config::File::from_str(settings_str, format))
            .build()
            .map_err(|e| Error::BadSettings(format!("could not parse configuration: {e}")))?;

        let settings = updated_config
            .try_deserialize::<Settings>()
            .map_err(|e| Error::BadSettings(e.to_string()))?;

        settings.validate()?;

        Ok(settings)
    }

    /// Serializes these settings as pretty-printed JSON, suitable for
    /// [`Settings::from_json`].
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::BadSettings(e.to_string()))
    }

    /// Sets the value at a dot-separated path, for example
    /// `validation.continue_after_failure`.
    pub fn with_value<T: Into<config::Value>>(self, path: &str, value: T) -> Result<Self> {
        let config = Config::try_from(&self).map_err(|e| Error::BadSettings(e.to_string()))?;

        let updated_config = Config::builder()
            .add_source(config)
            .set_override(path, value)
            .map_err(|e| Error::BadParam(format!("Invalid path '{path}': {e}")))?
            .build()
            .map_err(|e| Error::BadSettings(e.to_string()))?;

        let updated_settings = updated_config
            .try_deserialize::<Settings>()
            .map_err(|e| Error::BadParam(format!("Invalid value for '{path}': {e}")))?;

        updated_settings.validate()?;

        Ok(updated_settings)
    }

    /// Reads the value at a dot-separated path.
    pub fn get_value<'de, T: serde::de::Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let config = Config::try_from(self).map_err(|e| Error::BadSettings(e.to_string()))?;

        config
            .get::<T>(path)
            .map_err(|e| Error::BadParam(format!("Failed to get value at '{path}': {e}")))
    }

    /// The validation policy these settings describe.
    pub fn validation_properties(&self) -> Result<SignatureValidationProperties> {
        let validation = &self.validation;
        let mut properties = SignatureValidationProperties::default();

        properties
            .set_continue_after_failure(ContextSelector::any(), validation.continue_after_failure)
            .set_revocation_online_fetching(
                ContextSelector::any(),
                validation.revocation_online_fetching,
            )
            .set_freshness(
                ContextSelector::any().time_based([TimeBasedContext::Present]),
                freshness_from_seconds(validation.present_freshness_in_seconds)?,
            )
            .set_freshness(
                ContextSelector::any().time_based([TimeBasedContext::Historical]),
                freshness_from_seconds(validation.historical_freshness_in_seconds)?,
            );

        for rule in &validation.rules {
            properties.add_rule(rule.selector(), &rule.values())?;
        }

        Ok(properties)
    }

    /// A retriever loaded with the configured trust anchors. PEM bundles
    /// need the `x509` feature.
    pub fn certificate_retriever(&self) -> Result<IssuingCertificateRetriever> {
        let mut retriever = IssuingCertificateRetriever::new();

        if self.trust.is_empty() {
            return Ok(retriever);
        }

        for (class, pem) in self.trust.bundles() {
            let Some(pem) = pem else {
                continue;
            };
            let certificates = load_certificates(pem)?;
            log::debug!("loaded {} certificates for {:?}", certificates.len(), class);

            match class {
                Some(class) => retriever
                    .trusted_store_mut()
                    .add_certificates(class, certificates),
                None => retriever.add_known_certificates(certificates),
            }
        }

        Ok(retriever)
    }

    /// A validator chain configured from these settings. With the `fetch`
    /// feature, HTTP revocation clients are registered unless online
    /// fetching is disabled.
    pub fn validator_chain(&self) -> Result<ValidatorChain> {
        #[allow(unused_mut)]
        let mut builder = ValidatorChain::builder()
            .properties(self.validation_properties()?)
            .retriever(self.certificate_retriever()?)
            .validate_document_revisions(self.validation.validate_document_revisions);

        #[cfg(all(feature = "fetch", not(target_arch = "wasm32")))]
        if self.validation.revocation_online_fetching != OnlineFetching::NeverFetch {
            let timeout = std::time::Duration::from_secs(self.validation.fetch_timeout_in_seconds);
            builder = builder
                .crl_client(std::sync::Arc::new(
                    pdfsig_crypto::fetch::HttpCrlClient::with_timeout(timeout),
                ))
                .ocsp_client(std::sync::Arc::new(
                    pdfsig_crypto::fetch::HttpOcspClient::with_timeout(timeout),
                ));
        }

        Ok(builder.build())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            version: VERSION,
            trust: Default::default(),
            validation: Default::default(),
        }
    }
}

impl SettingsValidate for Settings {
    fn validate(&self) -> Result<()> {
        if self.version > VERSION {
            return Err(Error::BadSettings("settings version too new".into()));
        }
        self.trust.validate()?;
        self.validation.validate()
    }
}
