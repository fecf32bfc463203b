use serde::{Deserialize, Serialize};
use std::time::Duration;
use xslbridge_fetch::FetchBridgeConfig;
use xslbridge_traits::{EngineOptions, SecurityPolicy};

/// Settings applied to every transformation run of a driver.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformConfig {
    /// Drop the `<?xml …?>` declaration from XML output.
    pub omit_xml_declaration: bool,
    /// Upper bound on variables the engine may bind in one run.
    pub max_variables: usize,
    /// Register the EXSLT extension functions.
    pub exslt: bool,
    pub security: SecurityPolicy,
    /// Give up on a fetch after this many milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_timeout_ms: Option<u64>,
    /// Collation locale for sort keys that declare no `lang`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_locale: Option<String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        let engine = EngineOptions::default();
        Self {
            omit_xml_declaration: engine.omit_xml_declaration,
            max_variables: engine.max_variables,
            exslt: engine.exslt,
            security: engine.security,
            fetch_timeout_ms: None,
            default_locale: None,
        }
    }
}

impl TransformConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_omit_xml_declaration(mut self, omit: bool) -> Self {
        self.omit_xml_declaration = omit;
        self
    }

    pub fn with_max_variables(mut self, max_variables: usize) -> Self {
        self.max_variables = max_variables;
        self
    }

    pub fn with_exslt(mut self, exslt: bool) -> Self {
        self.exslt = exslt;
        self
    }

    pub fn with_security(mut self, security: SecurityPolicy) -> Self {
        self.security = security;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    pub(crate) fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            omit_xml_declaration: self.omit_xml_declaration,
            max_variables: self.max_variables,
            exslt: self.exslt,
            security: self.security.clone(),
        }
    }

    pub(crate) fn bridge_config(&self) -> FetchBridgeConfig {
        FetchBridgeConfig {
            timeout: self.fetch_timeout(),
            security: self.security.clone(),
        }
    }
}
