// src/recipe/configure.rs

//! Configuration: turn a request into a validated option set
//!
//! This is the single validation step that runs before any stage touches
//! the filesystem. In order it:
//! 1. Applies option defaults, then the requested values
//! 2. Rejects unknown options and values outside the declared domain
//! 3. Removes options whose `remove_when` conditions hold
//! 4. Rejects sanitizer options without `compiler.sanitizers`
//! 5. Resolves active requirements against the provided install paths
//! 6. Computes the package id

use crate::error::{Error, Result};
use crate::hash::Hasher;
use crate::recipe::condition;
use crate::recipe::format::Recipe;
use crate::recipe::options::OptionSet;
use crate::recipe::settings::Settings;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// What the client asks for
#[derive(Debug, Clone, Default)]
pub struct ConfigureRequest {
    pub settings: Settings,
    /// Raw `(name, value)` option assignments, applied in order
    pub options: Vec<(String, String)>,
    /// Install paths of resolved requirements, by package name
    pub dependencies: BTreeMap<String, PathBuf>,
}

impl ConfigureRequest {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn with_option(mut self, name: &str, value: &str) -> Self {
        self.options.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_dependency(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.dependencies.insert(name.to_string(), path.into());
        self
    }
}

/// An active requirement with its install path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRequirement {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
    pub cmake_root: Option<String>,
}

impl ResolvedRequirement {
    pub fn reference(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }
}

/// Validated inputs shared by every stage of one invocation
#[derive(Debug, Clone)]
pub struct Configuration {
    pub settings: Settings,
    /// Normalized options
    pub options: OptionSet,
    /// Options removed during normalization
    pub removed: Vec<String>,
    pub requires: Vec<ResolvedRequirement>,
    pub package_id: String,
}

impl Configuration {
    /// Evaluate an optional recipe condition against this configuration
    pub fn holds(&self, when: Option<&condition::Condition>) -> bool {
        condition::holds(when, &self.options, &self.settings)
    }

    /// Short form of the package id for directory names and logs
    pub fn short_id(&self) -> &str {
        &self.package_id[..12.min(self.package_id.len())]
    }
}

/// Configure a recipe for one invocation
pub fn configure(recipe: &Recipe, request: &ConfigureRequest) -> Result<Configuration> {
    let settings = request.settings.clone();

    let mut options = OptionSet::default();
    for (name, decl) in &recipe.options {
        options.insert(name, decl.default.clone());
    }

    for (name, raw) in &request.options {
        let decl = recipe.options.get(name).ok_or_else(|| {
            Error::ConfigurationError(format!(
                "Unknown option '{}' for {} (known: {})",
                name,
                recipe.reference(),
                recipe.options.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })?;
        options.insert(name, decl.parse_value(name, raw)?);
    }

    // Removal conditions see the options as requested, not partially normalized
    let requested = options.clone();
    let mut removed = Vec::new();
    for (name, decl) in &recipe.options {
        if decl
            .remove_when
            .iter()
            .any(|c| c.evaluate(&requested, &settings))
        {
            debug!("Removing option {} for this configuration", name);
            options.remove(name);
            removed.push(name.clone());
        }
    }

    let sanitizers: Vec<&str> = recipe
        .options
        .iter()
        .filter(|(name, decl)| decl.sanitizer.is_some() && options.get_bool(name))
        .map(|(name, _)| name.as_str())
        .collect();

    if !sanitizers.is_empty() && !settings.sanitizers {
        return Err(Error::ConfigurationError(format!(
            "Sanitizer option(s) {} require a sanitizer-capable toolchain \
             (set compiler.sanitizers=True)",
            sanitizers.join(", ")
        )));
    }

    let mut requires = Vec::new();
    for req in &recipe.requires {
        if !condition::holds(req.when.as_ref(), &options, &settings) {
            continue;
        }

        let path = request.dependencies.get(&req.name).ok_or_else(|| {
            Error::ConfigurationError(format!(
                "Requirement {} is not resolved (provide its install path with --dep {}=<path>)",
                req.reference(),
                req.name
            ))
        })?;

        requires.push(ResolvedRequirement {
            name: req.name.clone(),
            version: req.version.clone(),
            path: path.clone(),
            cmake_root: req.cmake_root.clone(),
        });
    }

    let package_id = package_id(recipe, &settings, &options, &requires);

    Ok(Configuration {
        settings,
        options,
        removed,
        requires,
        package_id,
    })
}

/// Digest identifying the binaries one configuration produces
///
/// Covers the recipe identity, the binary-relevant settings, the normalized
/// options and the requirement references. Install paths are left out so the
/// id does not depend on where the client keeps its packages.
pub fn package_id(
    recipe: &Recipe,
    settings: &Settings,
    options: &OptionSet,
    requires: &[ResolvedRequirement],
) -> String {
    let mut hasher = Hasher::new();

    hasher.update_field("name", &recipe.package.name);
    hasher.update_field("version", &recipe.package.version);
    hasher.update_field("release", &recipe.package.release);

    for (key, value) in settings.binary_fields() {
        hasher.update_field(&format!("settings.{}", key), &value);
    }
    for (name, value) in options.iter() {
        hasher.update_field(&format!("options.{}", name), &value.to_string());
    }
    for req in requires {
        hasher.update_field("requires", &req.reference());
    }

    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::builtin;
    use crate::recipe::settings::Os;

    fn linux() -> Settings {
        Settings {
            os: Os::Linux,
            ..Settings::detect()
        }
    }

    #[test]
    fn test_defaults() {
        let recipe = builtin::libevent().unwrap();
        let config = configure(&recipe, &ConfigureRequest::new(linux())).unwrap();

        assert!(!config.options.get_bool("shared"));
        assert!(config.options.get_bool("fPIC"));
        assert!(config.requires.is_empty());
        assert!(config.removed.is_empty());
        assert_eq!(config.package_id.len(), 64);
    }

    #[test]
    fn test_fpic_removed_when_shared() {
        let recipe = builtin::libevent().unwrap();
        let request = ConfigureRequest::new(linux()).with_option("shared", "True");
        let config = configure(&recipe, &request).unwrap();

        assert!(!config.options.contains("fPIC"));
        assert_eq!(config.removed, vec!["fPIC".to_string()]);
    }

    #[test]
    fn test_fpic_removed_on_windows_even_if_requested() {
        let recipe = builtin::libevent().unwrap();
        let settings = Settings {
            os: Os::Windows,
            ..Settings::detect()
        };
        let request = ConfigureRequest::new(settings).with_option("fPIC", "True");
        let config = configure(&recipe, &request).unwrap();
        assert!(!config.options.contains("fPIC"));
    }

    #[test]
    fn test_unknown_option_rejected() {
        let recipe = builtin::libevent().unwrap();
        let request = ConfigureRequest::new(linux()).with_option("with_gnutls", "True");
        let err = configure(&recipe, &request).unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(ref m) if m.contains("with_gnutls")));
    }

    #[test]
    fn test_sanitizer_requires_toolchain() {
        let recipe = builtin::libevent().unwrap();
        let request = ConfigureRequest::new(linux()).with_option("enable_asan", "True");
        let err = configure(&recipe, &request).unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(ref m) if m.contains("enable_asan")));

        let mut settings = linux();
        settings.sanitizers = true;
        let request = ConfigureRequest::new(settings).with_option("enable_asan", "True");
        assert!(configure(&recipe, &request).is_ok());
    }

    #[test]
    fn test_openssl_requirement_must_be_resolved() {
        let recipe = builtin::libevent().unwrap();
        let request = ConfigureRequest::new(linux()).with_option("with_openssl", "True");
        let err = configure(&recipe, &request).unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(ref m) if m.contains("openssl/")));

        let request = request.with_dependency("openssl", "/opt/openssl");
        let config = configure(&recipe, &request).unwrap();
        assert_eq!(config.requires.len(), 1);
        assert_eq!(config.requires[0].path, PathBuf::from("/opt/openssl"));
        assert_eq!(
            config.requires[0].cmake_root.as_deref(),
            Some("OPENSSL_ROOT_DIR")
        );
    }

    #[test]
    fn test_package_id_stability() {
        let recipe = builtin::libevent().unwrap();
        let a = configure(&recipe, &ConfigureRequest::new(linux())).unwrap();
        let b = configure(&recipe, &ConfigureRequest::new(linux())).unwrap();
        assert_eq!(a.package_id, b.package_id);

        let shared = configure(
            &recipe,
            &ConfigureRequest::new(linux()).with_option("shared", "True"),
        )
        .unwrap();
        assert_ne!(a.package_id, shared.package_id);

        // The generator does not change the binaries
        let mut ninja = linux();
        ninja.generator = Some("Ninja".to_string());
        let c = configure(&recipe, &ConfigureRequest::new(ninja)).unwrap();
        assert_eq!(a.package_id, c.package_id);
    }
}
