// src/recipe/condition.rs

//! Conditions attached to recipe entries
//!
//! Syntax, terms joined with `&&`:
//! - `shared` - boolean option is true
//! - `!shared` - boolean option is false or was removed
//! - `os == Windows` / `os != Windows` - compare a setting
//! - `variant == fast` - compare an option value
//!
//! Setting comparisons are case-insensitive.

use crate::error::{Error, Result};
use crate::recipe::options::OptionSet;
use crate::recipe::settings::{SETTING_KEYS, Settings};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparison operator in a condition term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

/// A single term of a condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Boolean option check, optionally negated with `!`
    Flag { option: String, negated: bool },
    /// `key == value` or `key != value` against a setting or option
    Compare {
        key: String,
        op: CompareOp,
        value: String,
    },
}

impl Term {
    fn evaluate(&self, options: &OptionSet, settings: &Settings) -> bool {
        match self {
            Term::Flag { option, negated } => options.get_bool(option) != *negated,
            Term::Compare { key, op, value } => {
                let actual = if SETTING_KEYS.contains(&key.as_str()) {
                    settings.get(key)
                } else {
                    options.get(key).map(|v| v.to_string())
                };
                let equal = actual.is_some_and(|a| a.eq_ignore_ascii_case(value));
                match op {
                    CompareOp::Eq => equal,
                    CompareOp::Ne => !equal,
                }
            }
        }
    }

    fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::ParseError("Empty condition term".to_string()));
        }

        for (token, op) in [("==", CompareOp::Eq), ("!=", CompareOp::Ne)] {
            if let Some((key, value)) = s.split_once(token) {
                let key = key.trim();
                let value = value.trim();
                if !is_identifier(key) || value.is_empty() {
                    return Err(Error::ParseError(format!(
                        "Invalid comparison in condition: {}",
                        s
                    )));
                }
                return Ok(Term::Compare {
                    key: key.to_string(),
                    op,
                    value: value.to_string(),
                });
            }
        }

        let (negated, name) = match s.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, s),
        };

        if !is_identifier(name) {
            return Err(Error::ParseError(format!(
                "Invalid option name in condition: {}",
                s
            )));
        }

        Ok(Term::Flag {
            option: name.to_string(),
            negated,
        })
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// A parsed condition, kept together with its source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Condition {
    terms: Vec<Term>,
    source: String,
}

impl Condition {
    /// Evaluate against a resolved option set and settings
    pub fn evaluate(&self, options: &OptionSet, settings: &Settings) -> bool {
        self.terms.iter().all(|t| t.evaluate(options, settings))
    }

    /// Option names this condition reads (settings keys excluded)
    pub fn referenced_options(&self) -> Vec<&str> {
        self.terms
            .iter()
            .filter_map(|t| match t {
                Term::Flag { option, .. } => Some(option.as_str()),
                Term::Compare { key, .. } if !SETTING_KEYS.contains(&key.as_str()) => {
                    Some(key.as_str())
                }
                Term::Compare { .. } => None,
            })
            .collect()
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }
}

/// Evaluate an optional condition; absent conditions always hold
pub fn holds(condition: Option<&Condition>, options: &OptionSet, settings: &Settings) -> bool {
    condition.is_none_or(|c| c.evaluate(options, settings))
}

impl FromStr for Condition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let terms = s
            .split("&&")
            .map(Term::parse)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            terms,
            source: s.trim().to_string(),
        })
    }
}

impl TryFrom<String> for Condition {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Condition> for String {
    fn from(c: Condition) -> Self {
        c.source
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::options::OptionValue;
    use crate::recipe::settings::Os;

    fn options(pairs: &[(&str, bool)]) -> OptionSet {
        let mut set = OptionSet::default();
        for (name, value) in pairs {
            set.insert(name, OptionValue::Bool(*value));
        }
        set
    }

    fn linux() -> Settings {
        Settings {
            os: Os::Linux,
            ..Settings::default()
        }
    }

    #[test]
    fn test_flag_terms() {
        let opts = options(&[("shared", true), ("with_openssl", false)]);
        let settings = linux();

        assert!("shared".parse::<Condition>().unwrap().evaluate(&opts, &settings));
        assert!(!"!shared".parse::<Condition>().unwrap().evaluate(&opts, &settings));
        assert!("!with_openssl".parse::<Condition>().unwrap().evaluate(&opts, &settings));
        // Removed options read as false
        assert!("!fPIC".parse::<Condition>().unwrap().evaluate(&opts, &settings));
    }

    #[test]
    fn test_setting_comparison() {
        let opts = OptionSet::default();
        let settings = linux();

        assert!("os == Linux".parse::<Condition>().unwrap().evaluate(&opts, &settings));
        assert!("os == linux".parse::<Condition>().unwrap().evaluate(&opts, &settings));
        assert!("os != Windows".parse::<Condition>().unwrap().evaluate(&opts, &settings));
        assert!(!"os == Windows".parse::<Condition>().unwrap().evaluate(&opts, &settings));
    }

    #[test]
    fn test_conjunction() {
        let cond: Condition = "!disable_threads && os != Windows".parse().unwrap();
        let settings = linux();

        assert!(cond.evaluate(&options(&[("disable_threads", false)]), &settings));
        assert!(!cond.evaluate(&options(&[("disable_threads", true)]), &settings));

        let windows = Settings {
            os: Os::Windows,
            ..Settings::default()
        };
        assert!(!cond.evaluate(&options(&[("disable_threads", false)]), &windows));
        assert_eq!(cond.referenced_options(), vec!["disable_threads"]);
    }

    #[test]
    fn test_invalid_conditions() {
        assert!("".parse::<Condition>().is_err());
        assert!("shared &&".parse::<Condition>().is_err());
        assert!("os ==".parse::<Condition>().is_err());
        assert!("bad name".parse::<Condition>().is_err());
    }

    #[test]
    fn test_serde_roundtrip_keeps_source() {
        #[derive(Deserialize, Serialize)]
        struct Holder {
            when: Condition,
        }

        let holder: Holder = toml::from_str(r#"when = "shared && os == Linux""#).unwrap();
        assert_eq!(holder.when.to_string(), "shared && os == Linux");
        assert_eq!(holder.when.terms().len(), 2);
    }
}
