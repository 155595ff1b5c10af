// src/recipe/options.rs

//! Recipe options: declarations, values and resolved option sets

use crate::error::{Error, Result};
use crate::recipe::condition::Condition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Parse a boolean the way option values are usually written
///
/// Accepts `True`/`False` in any case, `1`/`0`, `yes`/`no` and `on`/`off`.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a `key=value` assignment from the command line
pub fn parse_assignment(s: &str) -> Result<(String, String)> {
    let (key, value) = s.split_once('=').ok_or_else(|| {
        Error::ConfigurationError(format!("Expected key=value, got '{}'", s))
    })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(Error::ConfigurationError(format!(
            "Missing key in assignment '{}'",
            s
        )));
    }

    Ok((key.to_string(), value.trim().to_string()))
}

/// Value of a single option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Text(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            OptionValue::Text(_) => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(true) => f.write_str("True"),
            OptionValue::Bool(false) => f.write_str("False"),
            OptionValue::Text(s) => f.write_str(s),
        }
    }
}

/// An option as declared in the recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDecl {
    /// Default value; its type decides whether the option is boolean
    pub default: OptionValue,

    /// Allowed values for enumerated (non-boolean) options
    #[serde(default)]
    pub values: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Remove the option from the set when any of these conditions holds
    ///
    /// Used for options that are meaningless in some configurations,
    /// e.g. `fPIC` for shared builds.
    #[serde(default)]
    pub remove_when: Vec<Condition>,

    /// Sanitizer name passed as `-fsanitize=<name>` when enabled
    ///
    /// Sanitizer options require the `compiler.sanitizers` setting.
    #[serde(default)]
    pub sanitizer: Option<String>,
}

impl OptionDecl {
    pub fn is_bool(&self) -> bool {
        matches!(self.default, OptionValue::Bool(_))
    }

    /// Parse a raw command-line value against this declaration
    pub fn parse_value(&self, name: &str, raw: &str) -> Result<OptionValue> {
        if self.is_bool() {
            return parse_bool(raw).map(OptionValue::Bool).ok_or_else(|| {
                Error::ConfigurationError(format!(
                    "Option '{}' expects True or False, got '{}'",
                    name, raw
                ))
            });
        }

        if !self.values.is_empty() && !self.values.iter().any(|v| v == raw) {
            return Err(Error::ConfigurationError(format!(
                "Invalid value '{}' for option '{}' (allowed: {})",
                raw,
                name,
                self.values.join(", ")
            )));
        }

        Ok(OptionValue::Text(raw.to_string()))
    }
}

/// Resolved options for one invocation
///
/// Ordered by name so that iteration (and the package id) is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionSet {
    values: BTreeMap<String, OptionValue>,
}

impl OptionSet {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    /// Boolean value of an option; absent or non-boolean options read as false
    pub fn get_bool(&self, name: &str) -> bool {
        self.values
            .get(name)
            .and_then(OptionValue::as_bool)
            .unwrap_or(false)
    }

    pub fn insert(&mut self, name: &str, value: OptionValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.values {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bool_decl(default: bool) -> OptionDecl {
        OptionDecl {
            default: OptionValue::Bool(default),
            values: Vec::new(),
            description: None,
            remove_when: Vec::new(),
            sanitizer: None,
        }
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("shared=True").unwrap(),
            ("shared".to_string(), "True".to_string())
        );
        assert_eq!(
            parse_assignment(" os = Linux ").unwrap(),
            ("os".to_string(), "Linux".to_string())
        );
        assert!(parse_assignment("shared").is_err());
        assert!(parse_assignment("=True").is_err());
    }

    #[test]
    fn test_bool_option_values() {
        let decl = bool_decl(false);
        assert_eq!(
            decl.parse_value("shared", "True").unwrap(),
            OptionValue::Bool(true)
        );
        assert!(matches!(
            decl.parse_value("shared", "static"),
            Err(Error::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_enumerated_option_values() {
        let decl = OptionDecl {
            default: OptionValue::Text("select".to_string()),
            values: vec!["select".to_string(), "epoll".to_string()],
            ..bool_decl(false)
        };
        assert!(!decl.is_bool());
        assert_eq!(
            decl.parse_value("backend", "epoll").unwrap(),
            OptionValue::Text("epoll".to_string())
        );
        assert!(decl.parse_value("backend", "kqueue").is_err());
    }

    #[test]
    fn test_option_set_display_is_sorted() {
        let mut set = OptionSet::default();
        set.insert("shared", OptionValue::Bool(true));
        set.insert("fPIC", OptionValue::Bool(false));
        assert_eq!(set.to_string(), "fPIC=False, shared=True");
        assert!(set.get_bool("shared"));
        assert!(!set.get_bool("missing"));
    }

    #[test]
    fn test_decl_from_toml() {
        let decl: OptionDecl = toml::from_str(
            r#"
default = true
remove_when = ["shared", "os == Windows"]
"#,
        )
        .unwrap();
        assert!(decl.is_bool());
        assert_eq!(decl.remove_when.len(), 2);
    }
}
