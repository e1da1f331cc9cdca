//! Tunables for building and scanning a document model

use anyhow::{anyhow, Result};

/// Default cap on characters of element text per digest line
pub const DEFAULT_DIGEST_TEXT_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GdsmConfig {
    /// Characters of element text kept per line of a semantic digest
    pub digest_text_limit: usize,
    /// Limit applied to scans that don't set their own
    pub default_scan_limit: Option<usize>,
    /// Prefix for generated document IDs when the tree carries none
    pub document_id_prefix: String,
}

impl Default for GdsmConfig {
    fn default() -> Self {
        Self {
            digest_text_limit: DEFAULT_DIGEST_TEXT_LIMIT,
            default_scan_limit: None,
            document_id_prefix: "doc".to_string(),
        }
    }
}

impl GdsmConfig {
    pub fn with_digest_text_limit(mut self, limit: usize) -> Self {
        self.digest_text_limit = limit;
        self
    }

    pub fn with_default_scan_limit(mut self, limit: usize) -> Self {
        self.default_scan_limit = Some(limit);
        self
    }

    pub fn with_document_id_prefix(mut self, prefix: &str) -> Self {
        self.document_id_prefix = prefix.to_string();
        self
    }

    /// Load configuration from environment variables
    ///
    /// Expected variables (all optional):
    /// - GDSM_DIGEST_TEXT_LIMIT: characters per digest line (default: 200)
    /// - GDSM_DEFAULT_SCAN_LIMIT: result cap for scans without their own limit
    /// - GDSM_DOCUMENT_ID_PREFIX: prefix for generated document IDs (default: "doc")
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("GDSM_DIGEST_TEXT_LIMIT") {
            config.digest_text_limit = parse_count("GDSM_DIGEST_TEXT_LIMIT", &raw)?;
        }

        if let Some(raw) = lookup("GDSM_DEFAULT_SCAN_LIMIT") {
            config.default_scan_limit = Some(parse_count("GDSM_DEFAULT_SCAN_LIMIT", &raw)?);
        }

        if let Some(prefix) = lookup("GDSM_DOCUMENT_ID_PREFIX") {
            if !prefix.trim().is_empty() {
                config.document_id_prefix = prefix.trim().to_string();
            }
        }

        Ok(config)
    }
}

fn parse_count(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| anyhow!("Invalid value for {}: {}", key, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GdsmConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, GdsmConfig::default());
        assert_eq!(config.digest_text_limit, 200);
        assert_eq!(config.default_scan_limit, None);
    }

    #[test]
    fn test_overrides() {
        let config = GdsmConfig::from_lookup(lookup_from(&[
            ("GDSM_DIGEST_TEXT_LIMIT", "80"),
            ("GDSM_DEFAULT_SCAN_LIMIT", " 25 "),
            ("GDSM_DOCUMENT_ID_PREFIX", "lease"),
        ]))
        .unwrap();
        assert_eq!(config.digest_text_limit, 80);
        assert_eq!(config.default_scan_limit, Some(25));
        assert_eq!(config.document_id_prefix, "lease");
    }

    #[test]
    fn test_rejects_non_numeric_limit() {
        let result = GdsmConfig::from_lookup(lookup_from(&[("GDSM_DIGEST_TEXT_LIMIT", "lots")]));
        assert!(result.is_err());
    }
}
