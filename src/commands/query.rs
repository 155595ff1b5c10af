// src/commands/query.rs

//! Read-only commands: info, inspect, check

use super::{build_request, load_recipe};
use crate::cli::ConfigArgs;
use anyhow::{Context, Result};
use libevent_kitchen::recipe::validate_recipe;
use libevent_kitchen::{Kitchen, KitchenConfig, PackageInfo};

/// Print the package info a cook would export, as JSON
pub fn cmd_info(config_args: &ConfigArgs) -> Result<()> {
    let recipe = load_recipe(config_args.recipe.as_deref())?;
    let request = build_request(config_args)?;
    let kitchen = Kitchen::new(KitchenConfig::default());
    let configuration = kitchen.configure(&recipe, &request)?;

    let info = PackageInfo::compute(&recipe, &configuration);
    let json = serde_json::to_string_pretty(&info).context("Failed to serialize package info")?;
    println!("{}", json);
    Ok(())
}

/// Show the recipe's identity and options
pub fn cmd_inspect(recipe_path: Option<&str>) -> Result<()> {
    let recipe = load_recipe(recipe_path)?;
    let warnings = validate_recipe(&recipe).context("Recipe validation failed")?;

    let pkg = &recipe.package;
    println!("{} {}-{}", pkg.name, pkg.version, pkg.release);
    if let Some(summary) = &pkg.summary {
        println!("  {}", summary);
    }
    if let Some(license) = &pkg.license {
        println!("  License: {}", license);
    }
    if let Some(homepage) = &pkg.homepage {
        println!("  Homepage: {}", homepage);
    }
    println!("  Source: {} @ {}", recipe.source_url(), recipe.tag());

    println!("\nOptions:");
    for (name, decl) in &recipe.options {
        let mut line = format!("  {} = {}", name, decl.default);
        if !decl.values.is_empty() {
            line.push_str(&format!(" [{}]", decl.values.join(", ")));
        }
        if let Some(description) = &decl.description {
            line.push_str(&format!("  # {}", description));
        }
        println!("{}", line);
    }

    if !recipe.requires.is_empty() {
        println!("\nRequires:");
        for req in &recipe.requires {
            match &req.when {
                Some(when) => println!("  {} (when {})", req.reference(), when),
                None => println!("  {}", req.reference()),
            }
        }
    }

    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    Ok(())
}

/// Configure only and print the result
pub fn cmd_check(config_args: &ConfigArgs) -> Result<()> {
    let recipe = load_recipe(config_args.recipe.as_deref())?;
    let request = build_request(config_args)?;
    let kitchen = Kitchen::new(KitchenConfig::default());
    let configuration = kitchen
        .configure(&recipe, &request)
        .with_context(|| format!("Invalid configuration for {}", recipe.reference()))?;

    println!("[OK] {} configured", recipe.reference());
    println!("  Package id: {}", configuration.package_id);
    println!("  Options: {}", configuration.options);
    if !configuration.removed.is_empty() {
        println!("  Removed: {}", configuration.removed.join(", "));
    }
    for req in &configuration.requires {
        println!("  Requires: {} at {}", req.reference(), req.path.display());
    }

    Ok(())
}
