// src/recipe/parser.rs

//! Recipe file parsing

use crate::error::{Error, Result};
use crate::hash::SHA256_PREFIX;
use crate::recipe::format::Recipe;
use crate::recipe::options::OptionValue;
use std::path::{Component, Path};

/// Parse a recipe from a TOML string
pub fn parse_recipe(content: &str) -> Result<Recipe> {
    toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid recipe: {}", e)))
}

/// Parse a recipe from a file
///
/// Patch files in the recipe resolve relative to the file's directory.
pub fn parse_recipe_file(path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::IoError(format!("Failed to read recipe file: {}", e)))?;

    let mut recipe = parse_recipe(&content)?;
    recipe.recipe_dir = path.parent().map(Path::to_path_buf);
    Ok(recipe)
}

/// Validate a recipe for completeness and correctness
///
/// Returns warnings for things that are allowed but probably unintended.
pub fn validate_recipe(recipe: &Recipe) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    // Check for empty name/version
    if recipe.package.name.is_empty() {
        return Err(Error::ParseError("Recipe package name cannot be empty".to_string()));
    }
    if recipe.package.version.is_empty() {
        return Err(Error::ParseError("Recipe package version cannot be empty".to_string()));
    }

    if recipe.source.git.is_empty() || recipe.source.tag.is_empty() {
        return Err(Error::ParseError(
            "Recipe source needs both git and tag".to_string(),
        ));
    }
    if !is_plain_relative(&recipe.source.folder) {
        return Err(Error::ParseError(format!(
            "Source folder must be a plain relative path: {}",
            recipe.source.folder
        )));
    }

    for (name, decl) in &recipe.options {
        if let OptionValue::Text(default) = &decl.default
            && !decl.values.is_empty()
            && !decl.values.contains(default)
        {
            return Err(Error::ParseError(format!(
                "Default '{}' of option '{}' is not one of its values",
                default, name
            )));
        }
        if decl.sanitizer.is_some() && !decl.is_bool() {
            return Err(Error::ParseError(format!(
                "Sanitizer option '{}' must be boolean",
                name
            )));
        }
    }

    for (label, condition) in recipe.conditions() {
        for option in condition.referenced_options() {
            if !recipe.options.contains_key(option) {
                return Err(Error::ParseError(format!(
                    "Condition '{}' in {} references unknown option '{}'",
                    condition, label, option
                )));
            }
        }
    }

    for mapping in &recipe.build.option_map {
        if !recipe.options.contains_key(&mapping.option) {
            return Err(Error::ParseError(format!(
                "build.option_map references unknown option '{}'",
                mapping.option
            )));
        }
    }

    for patch in &recipe.patches.files {
        if let Some(checksum) = &patch.checksum
            && !checksum.starts_with(SHA256_PREFIX)
        {
            return Err(Error::ParseError(format!(
                "Invalid checksum format for {}: {}. Expected sha256:...",
                patch.file, checksum
            )));
        }
    }

    for rule in &recipe.layout.artifacts {
        glob::Pattern::new(&rule.pattern).map_err(|e| {
            Error::ParseError(format!("Invalid artifact pattern '{}': {}", rule.pattern, e))
        })?;
        if !is_plain_relative(&rule.dst) {
            return Err(Error::ParseError(format!(
                "Artifact destination must be a plain relative path: {}",
                rule.dst
            )));
        }
    }

    // Warn about missing fields
    if recipe.package.summary.is_none() && recipe.package.description.is_none() {
        warnings.push("Missing package summary".to_string());
    }
    if recipe.package.license.is_none() {
        warnings.push("Missing package license".to_string());
    }
    if recipe.layout.headers.iter().all(|g| g.files.is_empty()) {
        warnings.push("No headers in the package layout".to_string());
    }
    if recipe.layout.artifacts.is_empty() {
        warnings.push("No artifact rules in the package layout".to_string());
    }

    Ok(warnings)
}

fn is_plain_relative(path: &str) -> bool {
    let p = Path::new(path);
    !path.is_empty() && p.components().all(|c| matches!(c, Component::Normal(_)))
}
