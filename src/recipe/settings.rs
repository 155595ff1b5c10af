// src/recipe/settings.rs

//! Target platform and toolchain settings
//!
//! Settings are detected from the host, then overridden by a profile file
//! and finally by `-s key=value` arguments.
//!
//! # Profile format
//!
//! ```toml
//! [settings]
//! os = "Linux"
//! arch = "x86_64"
//! build_type = "Release"
//! "compiler" = "clang"
//! "compiler.version" = "16"
//! "compiler.sanitizers" = true
//!
//! [options]
//! shared = true
//! ```

use crate::error::{Error, Result};
use crate::recipe::options::parse_bool;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

/// Setting keys understood by [`Settings::set`] and [`Settings::get`]
pub const SETTING_KEYS: &[&str] = &[
    "os",
    "arch",
    "build_type",
    "compiler",
    "compiler.version",
    "compiler.sanitizers",
    "generator",
];

/// Target operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(ascii_case_insensitive)]
pub enum Os {
    Linux,
    Windows,
    #[strum(to_string = "Macos", serialize = "darwin")]
    Macos,
    FreeBSD,
}

impl Os {
    /// Detect the host operating system
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "windows" => Os::Windows,
            "macos" => Os::Macos,
            "freebsd" => Os::FreeBSD,
            _ => Os::Linux,
        }
    }
}

/// Target architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(ascii_case_insensitive)]
pub enum Arch {
    #[strum(to_string = "x86", serialize = "i686")]
    #[serde(rename = "x86")]
    X86,
    #[strum(to_string = "x86_64", serialize = "amd64")]
    #[serde(rename = "x86_64")]
    X86_64,
    #[strum(to_string = "armv7", serialize = "arm")]
    #[serde(rename = "armv7")]
    Armv7,
    #[strum(to_string = "armv8", serialize = "aarch64", serialize = "arm64")]
    #[serde(rename = "armv8")]
    Armv8,
}

impl Arch {
    /// Detect the host architecture
    pub fn detect() -> Self {
        match std::env::consts::ARCH {
            "x86" => Arch::X86,
            "arm" => Arch::Armv7,
            "aarch64" => Arch::Armv8,
            _ => Arch::X86_64,
        }
    }
}

/// CMake build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(ascii_case_insensitive)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

/// Platform/toolchain descriptor for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub os: Os,
    pub arch: Arch,
    pub build_type: BuildType,
    /// Compiler name (informational, part of the package id)
    pub compiler: Option<String>,
    pub compiler_version: Option<String>,
    /// Toolchain supports sanitizer instrumentation
    ///
    /// Sanitizer options are rejected unless this is set.
    pub sanitizers: bool,
    /// CMake generator (`-G`), not part of the package id
    pub generator: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::detect()
    }
}

impl Settings {
    /// Detect settings for the host
    pub fn detect() -> Self {
        Self {
            os: Os::detect(),
            arch: Arch::detect(),
            build_type: BuildType::default(),
            compiler: None,
            compiler_version: None,
            sanitizers: false,
            generator: None,
        }
    }

    /// Set a single setting by key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |kind: &str| {
            Error::ConfigurationError(format!("Invalid {} setting: '{}'", kind, value))
        };

        match key {
            "os" => self.os = Os::from_str(value).map_err(|_| invalid("os"))?,
            "arch" => self.arch = Arch::from_str(value).map_err(|_| invalid("arch"))?,
            "build_type" => {
                self.build_type = BuildType::from_str(value).map_err(|_| invalid("build_type"))?
            }
            "compiler" => self.compiler = Some(value.to_string()),
            "compiler.version" => self.compiler_version = Some(value.to_string()),
            "compiler.sanitizers" => {
                self.sanitizers = parse_bool(value).ok_or_else(|| invalid("compiler.sanitizers"))?
            }
            "generator" => self.generator = Some(value.to_string()),
            _ => {
                return Err(Error::ConfigurationError(format!(
                    "Unknown setting '{}' (known: {})",
                    key,
                    SETTING_KEYS.join(", ")
                )));
            }
        }

        Ok(())
    }

    /// Read a setting by key as text
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "os" => Some(self.os.to_string()),
            "arch" => Some(self.arch.to_string()),
            "build_type" => Some(self.build_type.to_string()),
            "compiler" => self.compiler.clone(),
            "compiler.version" => self.compiler_version.clone(),
            "compiler.sanitizers" => Some(self.sanitizers.to_string()),
            "generator" => self.generator.clone(),
            _ => None,
        }
    }

    /// Settings that identify the produced binaries, in a fixed order
    ///
    /// The generator only changes how the build runs, not what it produces.
    pub fn binary_fields(&self) -> BTreeMap<String, String> {
        SETTING_KEYS
            .iter()
            .filter(|k| **k != "generator")
            .filter_map(|k| self.get(k).map(|v| (k.to_string(), v)))
            .collect()
    }
}

/// A profile file: settings plus option values
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub settings: BTreeMap<String, toml::Value>,
    #[serde(default)]
    pub options: BTreeMap<String, toml::Value>,
}

impl Profile {
    /// Parse a profile from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid profile: {}", e)))
    }

    /// Load a profile file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!(
                "Failed to read profile {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::parse(&content)
    }

    /// Apply the profile's settings on top of `settings`
    pub fn apply_settings(&self, settings: &mut Settings) -> Result<()> {
        for (key, value) in &self.settings {
            settings.set(key, &value_to_string(value))?;
        }
        Ok(())
    }

    /// Option values as raw `(name, value)` pairs
    pub fn option_values(&self) -> Vec<(String, String)> {
        self.options
            .iter()
            .map(|(k, v)| (k.clone(), value_to_string(v)))
            .collect()
    }
}

fn value_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_parsing() {
        assert_eq!(Os::from_str("Linux").unwrap(), Os::Linux);
        assert_eq!(Os::from_str("windows").unwrap(), Os::Windows);
        assert_eq!(Os::from_str("Darwin").unwrap(), Os::Macos);
        assert_eq!(Os::Macos.to_string(), "Macos");
        assert!(Os::from_str("plan9").is_err());
    }

    #[test]
    fn test_arch_aliases() {
        assert_eq!(Arch::from_str("aarch64").unwrap(), Arch::Armv8);
        assert_eq!(Arch::from_str("amd64").unwrap(), Arch::X86_64);
        assert_eq!(Arch::Armv8.to_string(), "armv8");
    }

    #[test]
    fn test_set_and_get() {
        let mut settings = Settings::detect();
        settings.set("os", "Windows").unwrap();
        settings.set("build_type", "debug").unwrap();
        settings.set("compiler.sanitizers", "True").unwrap();

        assert_eq!(settings.os, Os::Windows);
        assert_eq!(settings.build_type, BuildType::Debug);
        assert!(settings.sanitizers);
        assert_eq!(settings.get("os").as_deref(), Some("Windows"));

        assert!(settings.set("os", "beos").is_err());
        assert!(settings.set("color", "blue").is_err());
    }

    #[test]
    fn test_binary_fields_skip_generator() {
        let mut settings = Settings::detect();
        settings.set("generator", "Ninja").unwrap();
        let fields = settings.binary_fields();
        assert!(!fields.contains_key("generator"));
        assert!(fields.contains_key("os"));
        assert!(fields.contains_key("compiler.sanitizers"));
    }

    #[test]
    fn test_profile() {
        let profile = Profile::parse(
            r#"
[settings]
os = "Linux"
arch = "armv8"
"compiler.sanitizers" = true

[options]
shared = true
"#,
        )
        .unwrap();

        let mut settings = Settings::detect();
        profile.apply_settings(&mut settings).unwrap();
        assert_eq!(settings.arch, Arch::Armv8);
        assert!(settings.sanitizers);
        assert_eq!(
            profile.option_values(),
            vec![("shared".to_string(), "true".to_string())]
        );
    }
}
