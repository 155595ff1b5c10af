// src/recipe/mod.rs

//! Recipe system for building packages from upstream sources
//!
//! A recipe describes how to turn an upstream git tag into an installable
//! package:
//! - Identity (name, version, license, homepage)
//! - Build options and how they normalize
//! - Requirements resolved by the client
//! - Text substitutions and patch files
//! - CMake definitions derived from the options
//! - Which headers and artifacts end up in the package
//! - Exported package info for consumers
//!
//! # Culinary Terminology
//!
//! - **Recipe**: The build specification (like a recipe card)
//! - **Kitchen**: The engine that runs recipes
//! - **Cook**: One run of the pipeline in an isolated work directory
//!
//! # Pipeline
//!
//! `configure → source → patch → build → package → export`
//!
//! Every stage fails fast. Nothing is retried and partially produced trees
//! are left as they are.

pub mod builtin;
pub mod condition;
pub mod configure;
mod format;
pub mod info;
mod kitchen;
pub mod options;
pub mod parser;
pub mod settings;

pub use condition::Condition;
pub use configure::{Configuration, ConfigureRequest, ResolvedRequirement, configure};
pub use format::{
    ArtifactRule, BuildSection, Entry, HeaderGroup, HeaderRoot, InfoSection, LayoutSection,
    OptionMapping, PackageSection, PatchInfo, PatchSection, Recipe, Replacement, Requirement,
    SourceSection,
};
pub use info::{PACKAGE_INFO_FILE, PackageInfo};
pub use kitchen::{
    BUILD_INFO_FILE, Cook, CookResult, Invocation, Kitchen, KitchenConfig, Layout,
    PackageSummary, SystemRunner, ToolOutput, ToolRunner, replace_in_file,
};
pub use options::{OptionDecl, OptionSet, OptionValue};
pub use parser::{parse_recipe, parse_recipe_file, validate_recipe};
pub use settings::{Arch, BuildType, Os, Profile, Settings};

use strum_macros::{Display, EnumString};

/// One ordered phase of the recipe pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    /// Option normalization and validation, before anything touches disk
    Configure,
    /// Source acquisition
    Source,
    /// Patch application
    Patch,
    /// Build tool invocation
    Build,
    /// Package assembly
    Package,
    /// Package info export
    Export,
}
