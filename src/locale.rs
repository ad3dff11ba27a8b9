//! Locale key resolution

use tracing::debug;

use crate::config::ConfigStore;
use crate::constants::text::{LANGUAGE_KEY, LOCALE_SECTION};

/// Maps locale keys to display strings
pub trait Locale {
    fn resolve(&self, config: &ConfigStore, key: &str) -> Option<String>;
}

/// Resolves keys in the section named by `[Locale] Language`
#[derive(Debug, Clone, Default)]
pub struct ConfigLocale {
    language: Option<String>,
}

impl ConfigLocale {
    /// Follow whatever language the config selects
    pub fn new() -> Self {
        Self::default()
    }

    /// Always use `language`, ignoring the config's selection
    pub fn with_language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
        }
    }

    fn language(&self, config: &ConfigStore) -> Option<String> {
        match &self.language {
            Some(language) => Some(language.clone()),
            None => config
                .get_value(LOCALE_SECTION, LANGUAGE_KEY)
                .map(|cell| cell.unescaped_item(0))
                .filter(|language| !language.is_empty()),
        }
    }
}

impl Locale for ConfigLocale {
    fn resolve(&self, config: &ConfigStore, key: &str) -> Option<String> {
        let Some(language) = self.language(config) else {
            debug!(key = %key, "No language selected");
            return None;
        };
        let value = config
            .get_value(&language, key)
            .map(|cell| cell.unescaped_item(0));
        if value.is_none() {
            debug!(language = %language, key = %key, "Locale key not found");
        }
        value
    }
}
