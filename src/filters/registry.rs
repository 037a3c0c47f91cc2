use std::collections::HashMap;

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::filters::{CinematicFilter, CoolFilter, Filter, WarmFilter};
use crate::video::types::Frame;

/// Registry dispatching filter names to implementations
pub struct FilterRegistry {
    filters: HashMap<String, Box<dyn Filter>>,
}

impl FilterRegistry {
    /// Create a registry with all built-in filters
    pub fn new() -> Self {
        let mut registry = Self {
            filters: HashMap::new(),
        };

        registry.register(Box::new(WarmFilter::new()));
        registry.register(Box::new(CoolFilter::new()));
        registry.register(Box::new(CinematicFilter::new()));
        registry
    }

    /// Register a filter under its own name
    pub fn register(&mut self, filter: Box<dyn Filter>) {
        self.filters.insert(filter.name().to_string(), filter);
    }

    /// Apply the named filter to a frame in place
    ///
    /// `None`, an unknown name, or a filter disabled in the config leaves
    /// the frame bit-identical to its input.
    pub fn process(&self, frame: &mut Frame, name: Option<&str>, config: &Config) -> Result<()> {
        let Some(name) = name else {
            return Ok(());
        };

        let Some(filter) = self.filters.get(name) else {
            debug!("Unknown filter '{}', passing frame through", name);
            return Ok(());
        };

        let Some(settings) = config.filter_settings(name) else {
            return Ok(());
        };

        if !settings.enabled {
            return Ok(());
        }

        filter.apply(frame, settings)
    }

    /// Names of all registered filters
    pub fn available_filters(&self) -> Vec<String> {
        self.filters.keys().cloned().collect()
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_filters_available() {
        let registry = FilterRegistry::new();

        assert!(registry.has_filter("warm"));
        assert!(registry.has_filter("cool"));
        assert!(registry.has_filter("cinematic"));
        assert!(!registry.has_filter("sepia"));
    }

    #[test]
    fn test_unknown_filter_is_identity() {
        let registry = FilterRegistry::new();
        let config = Config::default();

        let mut frame = Frame::new_filled(4, 4, [12, 34, 56]);
        let original = frame.clone();

        registry.process(&mut frame, Some("nonexistent"), &config).unwrap();
        assert_eq!(frame, original);
    }

    #[test]
    fn test_none_filter_is_identity() {
        let registry = FilterRegistry::new();
        let config = Config::default();

        let mut frame = Frame::new_filled(4, 4, [12, 34, 56]);
        let original = frame.clone();

        registry.process(&mut frame, None, &config).unwrap();
        assert_eq!(frame, original);
    }

    #[test]
    fn test_disabled_filter_is_identity() {
        let registry = FilterRegistry::new();
        let mut config = Config::default();
        config.filters.get_mut("warm").unwrap().enabled = false;

        let mut frame = Frame::new_filled(4, 4, [12, 34, 56]);
        let original = frame.clone();

        registry.process(&mut frame, Some("warm"), &config).unwrap();
        assert_eq!(frame, original);
    }

    #[test]
    fn test_enabled_filter_changes_frame() {
        let registry = FilterRegistry::new();
        let config = Config::default();

        let mut frame = Frame::new_filled(4, 4, [12, 34, 56]);
        let original = frame.clone();

        registry.process(&mut frame, Some("warm"), &config).unwrap();
        assert_ne!(frame, original);
    }
}
