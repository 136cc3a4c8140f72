//! Engine settings
//!
//! Global switches that influence how fragments are built and how mapper
//! calls are bound. Loaded from the `[settings]` table of a manifest.

use serde::Deserialize;

/// Global engine settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Attach declared caches to statements
    pub cache_enabled: bool,

    /// Default fetch mode for nested selects
    pub lazy_loading_enabled: bool,

    /// Use declared parameter identifiers as logical names when available
    pub use_actual_param_name: bool,

    /// Insert statements use driver-generated keys by default
    pub use_generated_keys: bool,

    /// Auto-mapping matches `blog_title` to `blogTitle`
    pub map_underscore_to_camel_case: bool,

    /// Memoize reflector metadata per type
    pub reflector_cache_enabled: bool,

    /// Statement timeout (seconds) applied when a statement declares none
    pub default_statement_timeout: Option<u64>,

    /// Fetch size applied when a statement declares none
    pub default_fetch_size: Option<u64>,

    /// Active database vendor id used to select vendor-specific statements
    pub database_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            lazy_loading_enabled: false,
            use_actual_param_name: true,
            use_generated_keys: false,
            map_underscore_to_camel_case: false,
            reflector_cache_enabled: true,
            default_statement_timeout: None,
            default_fetch_size: None,
            database_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.cache_enabled);
        assert!(settings.use_actual_param_name);
        assert!(!settings.map_underscore_to_camel_case);
        assert!(settings.database_id.is_none());
    }

    #[test]
    fn test_partial_deserialize() {
        let settings: Settings =
            serde_json::from_str(r#"{"map_underscore_to_camel_case": true, "database_id": "pg"}"#)
                .unwrap();
        assert!(settings.map_underscore_to_camel_case);
        assert_eq!(settings.database_id.as_deref(), Some("pg"));
        assert!(settings.cache_enabled);
    }
}
