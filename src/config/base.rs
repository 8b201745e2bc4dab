//! `[base]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in stanza.toml - site metadata.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title, used as a fallback route title.
    #[serde(default)]
    pub title: String,

    /// Short site description.
    #[serde(default)]
    pub description: String,

    /// Public base URL of the deployed site.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_base_config() {
        let config: SiteConfig = toml::from_str(
            r#"
            [base]
            title = "Docs"
            description = "Project documentation"
            url = "https://docs.example.com"
        "#,
        )
        .unwrap();

        assert_eq!(config.base.title, "Docs");
        assert_eq!(config.base.url.as_deref(), Some("https://docs.example.com"));
    }

    #[test]
    fn test_base_defaults() {
        let config = SiteConfig::default();
        assert_eq!(config.base.title, "");
        assert!(config.base.url.is_none());
    }
}
