//! # Factory Configuration and Class Schemas
//!
//! Both are plain TOML, loaded once at startup:
//!
//! ```toml
//! # factory.toml
//! probe_key = "testKey"
//! register_classes = true
//! ```
//!
//! ```toml
//! # window.toml
//! name = "Window"
//! owner = "Application"
//!
//! [[slots]]
//! name = "width"
//! type = "int"
//! access = "setter"
//! default = 640
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use warden_core::{Capability, ClassError, ClassResult, Value};

/// Errors raised while loading configuration or schemas.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for the expected shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The content parsed but is not usable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for ClassError {
    fn from(err: ConfigError) -> Self {
        Self::State(err.to_string())
    }
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Class factory configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Key written during the namespace probe.
    pub probe_key: String,
    /// Value written during the namespace probe.
    pub probe_value: String,
    /// Prefix of the generated absent key.
    pub missing_key_prefix: String,
    /// First counter tried for the absent key.
    pub missing_key_seed: u64,
    /// Candidates tried before the absent-key search gives up.
    pub max_probe_attempts: u32,
    /// Register built classes in the factory's global registry.
    pub register_classes: bool,
    /// Degrade unknown schema access names to secret instead of failing.
    pub lenient_access_names: bool,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            probe_key: "testKey".to_string(),
            probe_value: "testValue".to_string(),
            missing_key_prefix: "__absent_".to_string(),
            missing_key_seed: 69_420,
            max_probe_attempts: 1024,
            register_classes: true,
            lenient_access_names: true,
        }
    }
}

impl FactoryConfig {
    /// Strict preset: unknown access names in schemas are errors and the
    /// absent-key search is short.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_probe_attempts: 16,
            lenient_access_names: false,
            ..Self::default()
        }
    }

    /// Isolated preset: built classes are not registered globally.
    #[must_use]
    pub fn isolated() -> Self {
        Self {
            register_classes: false,
            ..Self::default()
        }
    }

    /// Parses a configuration from TOML. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`FactoryConfig::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Checks the configuration for unusable values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on an empty probe key or prefix,
    /// or a zero attempt limit.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.probe_key.is_empty() {
            return Err(ConfigError::Invalid("probe_key must not be empty".into()));
        }
        if self.missing_key_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "missing_key_prefix must not be empty".into(),
            ));
        }
        if self.max_probe_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_probe_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Resolves a schema access name under this configuration.
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`ClassError::NotFound`] for names other
    /// than `none`, `getter`, `setter` and `delete`.
    pub fn capability_for(&self, access: &str) -> ClassResult<Capability> {
        let level = Capability::from_access_name(access);
        if !self.lenient_access_names && level.access_name() != access {
            return Err(ClassError::NotFound(format!("access name '{access}'")));
        }
        Ok(level)
    }
}

/// Declarative description of one slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotSchema {
    /// Attribute name.
    pub name: String,
    /// Type name, as accepted by `TypeTag::from_name`.
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
    /// Access name: `none`, `getter`, `setter` or `delete`.
    #[serde(default)]
    pub access: Option<String>,
    /// Default value.
    #[serde(default)]
    pub default: Option<toml::Value>,
    /// Declare a constant instead of a field.
    #[serde(default)]
    pub constant: bool,
}

/// Declarative description of a class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassSchema {
    /// Class name.
    pub name: String,
    /// Owner name, resolved lazily.
    #[serde(default)]
    pub owner: Option<String>,
    /// Slots, in declaration order.
    #[serde(default)]
    pub slots: Vec<SlotSchema>,
}

impl ClassSchema {
    /// Parses a schema from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`], or [`ConfigError::Invalid`] on an
    /// empty class name or a slot name used twice.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let schema: Self = toml::from_str(source)?;
        if schema.name.is_empty() {
            return Err(ConfigError::Invalid("class name must not be empty".into()));
        }
        for (i, slot) in schema.slots.iter().enumerate() {
            if schema.slots[..i].iter().any(|prior| prior.name == slot.name) {
                return Err(ConfigError::Invalid(format!(
                    "slot '{}' declared twice in '{}'",
                    slot.name, schema.name
                )));
            }
        }
        Ok(schema)
    }

    /// Loads a schema file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`ClassSchema::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }
}

/// Converts a TOML value into a runtime value.
///
/// # Errors
///
/// Returns a type mismatch for datetimes and tables.
pub fn value_from_toml(value: &toml::Value) -> ClassResult<Value> {
    match value {
        toml::Value::Boolean(b) => Ok(Value::Bool(*b)),
        toml::Value::Integer(i) => Ok(Value::Int(*i)),
        toml::Value::Float(x) => Ok(Value::Float(*x)),
        toml::Value::String(s) => Ok(Value::Text(s.clone())),
        toml::Value::Array(items) => items
            .iter()
            .map(value_from_toml)
            .collect::<ClassResult<Vec<_>>>()
            .map(Value::List),
        other => Err(ClassError::type_mismatch(
            "bool, int, float, str or list",
            other.type_str(),
            "schema default",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FactoryConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.register_classes);
        assert_eq!(config.missing_key_seed, 69_420);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = FactoryConfig::from_toml_str("probe_key = \"canary\"").unwrap();
        assert_eq!(config.probe_key, "canary");
        assert_eq!(config.probe_value, FactoryConfig::default().probe_value);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            FactoryConfig::from_toml_str("probe_key = \"\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            FactoryConfig::from_toml_str("max_probe_attempts = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_strict_access_names() {
        let lenient = FactoryConfig::default();
        let strict = FactoryConfig::strict();
        assert_eq!(lenient.capability_for("bogus").unwrap(), Capability::Secret);
        assert!(strict.capability_for("bogus").unwrap_err().is_not_found());
        assert_eq!(strict.capability_for("setter").unwrap(), Capability::Protected);
    }

    #[test]
    fn test_schema_parsing() {
        let schema = ClassSchema::from_toml_str(
            r#"
            name = "Window"
            owner = "Application"

            [[slots]]
            name = "width"
            type = "int"
            access = "setter"
            default = 640

            [[slots]]
            name = "kind"
            default = "main"
            constant = true
            "#,
        )
        .unwrap();
        assert_eq!(schema.owner.as_deref(), Some("Application"));
        assert_eq!(schema.slots.len(), 2);
        assert_eq!(schema.slots[0].type_name.as_deref(), Some("int"));
        assert!(schema.slots[1].constant);
    }

    #[test]
    fn test_duplicate_slot_rejected() {
        let source = r#"
            name = "Dup"
            [[slots]]
            name = "x"
            [[slots]]
            name = "x"
        "#;
        assert!(matches!(
            ClassSchema::from_toml_str(source),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_value_from_toml() {
        let list = toml::Value::Array(vec![toml::Value::Integer(1), toml::Value::Boolean(true)]);
        assert_eq!(
            value_from_toml(&list).unwrap(),
            Value::List(vec![Value::Int(1), Value::Bool(true)])
        );
        let table = toml::Value::Table(toml::map::Map::new());
        assert!(value_from_toml(&table).is_err());
    }
}
