use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

pub const DEFAULT_API_BASE: &str = "https://tainacan.ufsm.br/acervo-artistico/wp-json/tainacan/v2";
pub const DEFAULT_COLLECTION_ID: u64 = 2174;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_PROBE_CANDIDATES: [u32; 6] = [10, 25, 50, 100, 200, 500];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct GalleryConfig {
    pub version: u32,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub viewer: ViewerSettings,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            version: 1,
            catalog: CatalogSettings::default(),
            discovery: DiscoverySettings::default(),
            viewer: ViewerSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub base_url: String,
    pub collection_id: u64,
    pub page_size: u32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    pub attachment_concurrency: usize,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            collection_id: DEFAULT_COLLECTION_ID,
            page_size: DEFAULT_PAGE_SIZE,
            timeout: default_timeout(),
            attachment_concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    pub candidates: Vec<u32>,
    pub window_below: u32,
    pub window_above: u32,
    pub trust_reported_total: bool,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_PROBE_CANDIDATES.to_vec(),
            window_below: 10,
            window_above: 20,
            trust_reported_total: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub build_path: String,
    pub build_name: String,
    pub width: u32,
    pub height: u32,
    pub company_name: String,
    pub product_name: String,
    pub product_version: String,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            build_path: "/unity/Build".to_string(),
            build_name: "buildteste".to_string(),
            width: 960,
            height: 600,
            company_name: "MyCompany".to_string(),
            product_name: "MyUnityApp".to_string(),
            product_version: "1.0".to_string(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl GalleryConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: GalleryConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        let catalog = &self.catalog;
        let base = catalog.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "catalog.base_url '{}' must be an http(s) url",
                catalog.base_url
            )));
        }
        if catalog.collection_id == 0 {
            return Err(ConfigError::Invalid(
                "catalog.collection_id must be greater than zero".into(),
            ));
        }
        if catalog.page_size == 0 {
            return Err(ConfigError::Invalid(
                "catalog.page_size must be greater than zero".into(),
            ));
        }
        if catalog.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "catalog.timeout must be greater than zero".into(),
            ));
        }
        if catalog.attachment_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "catalog.attachment_concurrency must be at least 1".into(),
            ));
        }

        let candidates = &self.discovery.candidates;
        if candidates.is_empty() {
            return Err(ConfigError::Invalid(
                "discovery.candidates must list at least one page".into(),
            ));
        }
        if candidates.contains(&0) {
            return Err(ConfigError::Invalid(
                "discovery.candidates must be positive page numbers".into(),
            ));
        }
        if candidates.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::Invalid(format!(
                "discovery.candidates must be strictly ascending, got {candidates:?}"
            )));
        }

        let viewer = &self.viewer;
        if viewer.build_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "viewer.build_name must not be empty".into(),
            ));
        }
        if viewer.width == 0 || viewer.height == 0 {
            return Err(ConfigError::Invalid(
                "viewer dimensions must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
