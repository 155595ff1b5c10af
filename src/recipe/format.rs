// src/recipe/format.rs

//! Recipe file format definitions
//!
//! Recipes are TOML files. Template strings support `%(version)s`,
//! `%(name)s` and any key from the `[variables]` table.

use crate::recipe::condition::{self, Condition};
use crate::recipe::options::{OptionDecl, OptionSet};
use crate::recipe::settings::Settings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A complete recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Package metadata
    pub package: PackageSection,

    /// Build options keyed by name
    #[serde(default)]
    pub options: BTreeMap<String, OptionDecl>,

    /// Upstream packages resolved by the client
    #[serde(default)]
    pub requires: Vec<Requirement>,

    /// Where the upstream source comes from
    pub source: SourceSection,

    /// Substitutions and patch files
    #[serde(default)]
    pub patches: PatchSection,

    /// Build tool configuration
    #[serde(default)]
    pub build: BuildSection,

    /// What goes into the package
    #[serde(default)]
    pub layout: LayoutSection,

    /// Exported package info
    #[serde(default)]
    pub info: InfoSection,

    /// Variables for substitution (optional)
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    /// Directory the recipe was loaded from; patch files resolve against it
    #[serde(skip)]
    pub recipe_dir: Option<PathBuf>,
}

impl Recipe {
    /// Substitute variables in a string
    ///
    /// Replaces `%(name)s` patterns with their values from:
    /// 1. Built-in variables (version, name)
    /// 2. Custom variables from the [variables] section
    pub fn substitute(&self, template: &str) -> String {
        let mut result = template.to_string();

        result = result.replace("%(version)s", &self.package.version);
        result = result.replace("%(name)s", &self.package.name);

        for (key, value) in &self.variables {
            result = result.replace(&format!("%({})s", key), value);
        }

        result
    }

    /// `name/version` reference
    pub fn reference(&self) -> String {
        format!("{}/{}", self.package.name, self.package.version)
    }

    /// Git tag for this version
    pub fn tag(&self) -> String {
        self.substitute(&self.source.tag)
    }

    /// Git URL with variables substituted
    pub fn source_url(&self) -> String {
        self.substitute(&self.source.git)
    }

    /// Resolve a path from the recipe against the recipe directory
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        match &self.recipe_dir {
            Some(dir) if p.is_relative() => dir.join(p),
            _ => p.to_path_buf(),
        }
    }

    /// All conditions in the recipe, with a label for error messages
    pub(crate) fn conditions(&self) -> Vec<(String, &Condition)> {
        let mut all = Vec::new();

        for (name, decl) in &self.options {
            for cond in &decl.remove_when {
                all.push((format!("options.{}.remove_when", name), cond));
            }
        }
        for req in &self.requires {
            if let Some(cond) = &req.when {
                all.push((format!("requires.{}", req.name), cond));
            }
        }
        for r in &self.patches.replace {
            if let Some(cond) = &r.when {
                all.push((format!("patches.replace[{}]", r.file), cond));
            }
        }
        for p in &self.patches.files {
            if let Some(cond) = &p.when {
                all.push((format!("patches.files[{}]", p.file), cond));
            }
        }
        for a in &self.layout.artifacts {
            if let Some(cond) = &a.when {
                all.push((format!("layout.artifacts[{}]", a.pattern), cond));
            }
        }
        for (section, entries) in [
            ("info.libs", &self.info.libs),
            ("info.system_libs", &self.info.system_libs),
            ("info.defines", &self.info.defines),
        ] {
            for entry in entries {
                if let Entry::Conditional { name, when } = entry {
                    all.push((format!("{}[{}]", section, name), when));
                }
            }
        }

        all
    }
}

/// Package metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    /// Package name
    pub name: String,

    /// Package version
    pub version: String,

    /// Release number (for rebuilds of same version)
    #[serde(default = "default_release")]
    pub release: String,

    /// Short description
    #[serde(default)]
    pub summary: Option<String>,

    /// Full description
    #[serde(default)]
    pub description: Option<String>,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,

    /// Homepage URL
    #[serde(default)]
    pub homepage: Option<String>,

    /// Upstream repository URL
    #[serde(default)]
    pub url: Option<String>,
}

fn default_release() -> String {
    "1".to_string()
}

/// A required upstream package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,

    /// Version or channel, as understood by the client
    pub version: String,

    /// Only required when this condition holds
    #[serde(default)]
    pub when: Option<Condition>,

    /// CMake variable that receives the resolved install path
    #[serde(default)]
    pub cmake_root: Option<String>,
}

impl Requirement {
    pub fn reference(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }
}

/// Source section: a tagged git revision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Repository URL
    pub git: String,

    /// Tag to check out, supports `%(version)s`
    pub tag: String,

    /// Subfolder the checkout must land in
    pub folder: String,

    /// License file, relative to the checkout
    #[serde(default = "default_license_file")]
    pub license_file: String,
}

fn default_license_file() -> String {
    "LICENSE".to_string()
}

/// Patch configuration section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PatchSection {
    /// Literal text substitutions, applied first
    #[serde(default)]
    pub replace: Vec<Replacement>,

    /// Patch files, applied in order after substitutions
    #[serde(default)]
    pub files: Vec<PatchInfo>,
}

/// A literal text substitution in a source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replacement {
    /// File relative to the checkout
    pub file: String,

    /// Text that must be present
    pub search: String,

    /// Replacement text
    pub replace: String,

    #[serde(default)]
    pub when: Option<Condition>,
}

/// Information about a single patch file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchInfo {
    /// Patch file, relative to the recipe directory
    pub file: String,

    /// Optional `sha256:` checksum
    #[serde(default)]
    pub checksum: Option<String>,

    /// Strip level for patch (default: 1)
    #[serde(default = "default_strip")]
    pub strip: u32,

    /// Apply only if condition is met (optional)
    #[serde(default)]
    pub when: Option<Condition>,
}

fn default_strip() -> u32 {
    1
}

/// Build tool section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BuildSection {
    /// Fixed CMake cache definitions (`-DKEY=VALUE`)
    #[serde(default)]
    pub definitions: BTreeMap<String, String>,

    /// Option to CMake variable mappings
    #[serde(default)]
    pub option_map: Vec<OptionMapping>,

    /// Number of parallel jobs, unless the kitchen config sets `jobs`
    #[serde(default)]
    pub jobs: Option<u32>,
}

/// Maps one option onto a CMake variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionMapping {
    pub option: String,
    pub variable: String,

    /// Map `true` to the `off` value and the reverse
    #[serde(default)]
    pub invert: bool,

    /// Value for true (default `ON`)
    #[serde(default)]
    pub on: Option<String>,

    /// Value for false (default `OFF`)
    #[serde(default)]
    pub off: Option<String>,
}

impl OptionMapping {
    /// CMake value for a boolean option value
    pub fn value_for(&self, enabled: bool) -> String {
        if enabled != self.invert {
            self.on.clone().unwrap_or_else(|| "ON".to_string())
        } else {
            self.off.clone().unwrap_or_else(|| "OFF".to_string())
        }
    }
}

/// Package layout section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LayoutSection {
    /// Allow-listed headers; every file is required
    #[serde(default)]
    pub headers: Vec<HeaderGroup>,

    /// Binary artifacts collected from the build folder
    #[serde(default)]
    pub artifacts: Vec<ArtifactRule>,

    /// Paths removed from the package after copying
    #[serde(default)]
    pub remove: Vec<String>,
}

/// Where a header group is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderRoot {
    /// The checked out source folder
    Source,
    /// The build folder (generated headers)
    Build,
}

/// Headers copied with their relative path preserved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderGroup {
    pub root: HeaderRoot,
    pub files: Vec<String>,
}

/// Artifacts matching `pattern` in the build folder go to `dst`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRule {
    /// Glob on the file name, e.g. `*.so`, or on the path relative to the
    /// build folder when it contains a `/`, e.g. `lib/pkgconfig/*.pc`
    pub pattern: String,

    /// Destination directory inside the package
    pub dst: String,

    #[serde(default)]
    pub when: Option<Condition>,
}

impl ArtifactRule {
    /// Whether the pattern is matched against the relative path
    pub fn matches_path(&self) -> bool {
        self.pattern.contains('/')
    }
}

/// Exported package info section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InfoSection {
    /// Libraries consumers link, in link order
    #[serde(default)]
    pub libs: Vec<Entry>,

    /// System libraries consumers link
    #[serde(default)]
    pub system_libs: Vec<Entry>,

    /// Preprocessor defines for consumers
    #[serde(default)]
    pub defines: Vec<Entry>,
}

/// A plain name, or a name with a condition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    Plain(String),
    Conditional { name: String, when: Condition },
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::Plain(name) => name,
            Entry::Conditional { name, .. } => name,
        }
    }

    pub fn applies(&self, options: &OptionSet, settings: &Settings) -> bool {
        match self {
            Entry::Plain(_) => true,
            Entry::Conditional { when, .. } => condition::holds(Some(when), options, settings),
        }
    }
}
