//! Generator configuration.
//!
//! Loaded from JSON by the build script; every field has a default, so an
//! empty object (or no file at all) yields the standard bindings.

use crate::error::GenError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

const CLASS_NAME_PATTERN: &str = r"^[A-Za-z_$][A-Za-z0-9_$]*(/[A-Za-z_$][A-Za-z0-9_$]*)*$";
const METHOD_PREFIX_PATTERN: &str = r"^([a-z][A-Za-z0-9]*)?$";

const DEFAULT_COPYRIGHT: &str = "\
Copyright ksqlite contributors.

Licensed under the Apache License, Version 2.0 (the \"License\");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an \"AS IS\" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Binary name of the Java class declaring the native methods.
    pub jni_class: String,
    /// Prefix of every native method name (`native` -> `nativeStep`).
    pub method_prefix: String,
    /// Path of the logical API the trampolines delegate to.
    pub api_path: String,
    /// Path of the crate providing `marshal`, `handles` and `exception`.
    pub runtime_path: String,
    /// Header placed at the top of the generated file.
    pub copyright: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            jni_class: "com/birbit/sqlite3/internal/SqliteApi".to_string(),
            method_prefix: "native".to_string(),
            api_path: "::ksqlite_sqlite::SqliteApi".to_string(),
            runtime_path: "crate".to_string(),
            copyright: Some(DEFAULT_COPYRIGHT.to_string()),
        }
    }
}

impl GeneratorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, GenError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, GenError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no generator config, using defaults");
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), GenError> {
        check(CLASS_NAME_PATTERN, &self.jni_class, "jni_class")?;
        check(METHOD_PREFIX_PATTERN, &self.method_prefix, "method_prefix")?;
        self.api_path()?;
        self.runtime_path()?;
        Ok(())
    }

    pub(crate) fn api_path(&self) -> Result<syn::Path, GenError> {
        parse_path(&self.api_path, "api_path")
    }

    pub(crate) fn runtime_path(&self) -> Result<syn::Path, GenError> {
        parse_path(&self.runtime_path, "runtime_path")
    }
}

fn check(pattern: &str, value: &str, field: &str) -> Result<(), GenError> {
    let regex = Regex::new(pattern)
        .map_err(|e| GenError::InvalidConfig(format!("invalid pattern for {}: {}", field, e)))?;
    if regex.is_match(value) {
        Ok(())
    } else {
        Err(GenError::InvalidConfig(format!(
            "{} {:?} does not match {}",
            field, value, pattern
        )))
    }
}

fn parse_path(value: &str, field: &str) -> Result<syn::Path, GenError> {
    syn::parse_str(value)
        .map_err(|e| GenError::InvalidConfig(format!("{} {:?} is not a path: {}", field, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        GeneratorConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GeneratorConfig::from_json(r#"{"jni_class": "org/example/Native"}"#).unwrap();
        assert_eq!(config.jni_class, "org/example/Native");
        assert_eq!(config.method_prefix, "native");
        assert_eq!(config.api_path, "::ksqlite_sqlite::SqliteApi");
    }

    #[test]
    fn test_dotted_class_name_rejected() {
        let err = GeneratorConfig::from_json(r#"{"jni_class": "org.example.Native"}"#).unwrap_err();
        assert!(matches!(err, GenError::InvalidConfig(_)));
    }

    #[test]
    fn test_bad_prefix_rejected() {
        let err = GeneratorConfig::from_json(r#"{"method_prefix": "Native_"}"#).unwrap_err();
        assert!(matches!(err, GenError::InvalidConfig(_)));
    }

    #[test]
    fn test_bad_api_path_rejected() {
        let err = GeneratorConfig::from_json(r#"{"api_path": "not a path"}"#).unwrap_err();
        assert!(matches!(err, GenError::InvalidConfig(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = GeneratorConfig::from_json(r#"{"jni_klass": "x"}"#).unwrap_err();
        assert!(matches!(err, GenError::Json(_)));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::load_or_default(&dir.path().join("none.json")).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }
}
