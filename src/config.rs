use anyhow::{anyhow, Context, Result};

use crate::reading_time::{validate_rate, DEFAULT_WORDS_PER_MINUTE};

pub const ENDPOINT_VAR: &str = "SPACETRAVELING_API_ENDPOINT";
pub const ACCESS_TOKEN_VAR: &str = "SPACETRAVELING_ACCESS_TOKEN";
pub const PAGE_SIZE_VAR: &str = "SPACETRAVELING_PAGE_SIZE";
pub const WORDS_PER_MINUTE_VAR: &str = "SPACETRAVELING_WORDS_PER_MINUTE";

/// Listing pages hold one post each, like the published blog
pub const DEFAULT_PAGE_SIZE: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Prismic API root, e.g. `https://<repo>.cdn.prismic.io/api/v2`
    pub api_endpoint: String,
    pub access_token: Option<String>,
    pub page_size: u32,
    pub words_per_minute: f64,
}

/// Values given on the command line; they win over the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_endpoint: Option<String>,
    pub page_size: Option<u32>,
    pub words_per_minute: Option<f64>,
}

impl Config {
    /// Loads the configuration from the process environment
    pub fn from_env(overrides: Overrides) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), overrides)
    }

    /// Builds the configuration from any key lookup, then validates it
    pub fn from_lookup<F>(lookup: F, overrides: Overrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_endpoint = overrides
            .api_endpoint
            .or_else(|| lookup(ENDPOINT_VAR))
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| anyhow!("No API endpoint configured. Set {} or pass --endpoint.", ENDPOINT_VAR))?;

        let access_token = lookup(ACCESS_TOKEN_VAR).filter(|t| !t.is_empty());

        let page_size = match overrides.page_size {
            Some(size) => size,
            None => match lookup(PAGE_SIZE_VAR) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid {}: {:?}", PAGE_SIZE_VAR, raw))?,
                None => DEFAULT_PAGE_SIZE,
            },
        };
        if page_size == 0 {
            return Err(anyhow!("Page size must be at least 1"));
        }

        let words_per_minute = match overrides.words_per_minute {
            Some(wpm) => wpm,
            None => match lookup(WORDS_PER_MINUTE_VAR) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid {}: {:?}", WORDS_PER_MINUTE_VAR, raw))?,
                None => DEFAULT_WORDS_PER_MINUTE,
            },
        };
        validate_rate(words_per_minute)?;

        Ok(Self {
            api_endpoint: api_endpoint.trim_end_matches('/').to_string(),
            access_token,
            page_size,
            words_per_minute,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(
            lookup(&[(ENDPOINT_VAR, "https://blog.cdn.prismic.io/api/v2/")]),
            Overrides::default(),
        )
        .unwrap();

        assert_eq!(config.api_endpoint, "https://blog.cdn.prismic.io/api/v2");
        assert_eq!(config.access_token, None);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.words_per_minute, 200.0);
    }

    #[test]
    fn test_overrides_win() {
        let config = Config::from_lookup(
            lookup(&[
                (ENDPOINT_VAR, "https://env.example/api/v2"),
                (ACCESS_TOKEN_VAR, "secret"),
                (PAGE_SIZE_VAR, "5"),
                (WORDS_PER_MINUTE_VAR, "250"),
            ]),
            Overrides {
                api_endpoint: Some("https://cli.example/api/v2".into()),
                page_size: Some(3),
                words_per_minute: None,
            },
        )
        .unwrap();

        assert_eq!(config.api_endpoint, "https://cli.example/api/v2");
        assert_eq!(config.access_token.as_deref(), Some("secret"));
        assert_eq!(config.page_size, 3);
        assert_eq!(config.words_per_minute, 250.0);
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(Config::from_lookup(lookup(&[]), Overrides::default()).is_err());

        let endpoint = (ENDPOINT_VAR, "https://blog.cdn.prismic.io/api/v2");
        assert!(Config::from_lookup(lookup(&[endpoint, (PAGE_SIZE_VAR, "0")]), Overrides::default()).is_err());
        assert!(Config::from_lookup(lookup(&[endpoint, (PAGE_SIZE_VAR, "many")]), Overrides::default()).is_err());
        assert!(Config::from_lookup(lookup(&[endpoint, (WORDS_PER_MINUTE_VAR, "-5")]), Overrides::default()).is_err());
    }
}
