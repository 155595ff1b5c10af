// src/commands/stages.rs

//! Single-stage commands over local folders
//!
//! These run one part of the pipeline in caller-chosen folders instead of an
//! isolated work directory, so a developer can inspect or rerun each stage.

use super::{build_request, load_recipe};
use crate::cli::ConfigArgs;
use anyhow::{Context, Result};
use libevent_kitchen::recipe::Layout;
use libevent_kitchen::{Cook, Kitchen, KitchenConfig};
use std::path::Path;

fn local_layout(
    recipe: &libevent_kitchen::Recipe,
    source_folder: &str,
    build_folder: &str,
    package_folder: &str,
) -> Layout {
    Layout::local(
        recipe,
        Path::new(source_folder),
        Path::new(build_folder),
        Path::new(package_folder),
    )
}

/// Fetch and patch the source into `source_folder`
pub fn cmd_source(config_args: &ConfigArgs, source_folder: &str) -> Result<()> {
    let recipe = load_recipe(config_args.recipe.as_deref())?;
    let request = build_request(config_args)?;
    let kitchen = Kitchen::new(KitchenConfig::default());
    let configuration = kitchen.configure(&recipe, &request)?;

    let layout = local_layout(&recipe, source_folder, "build", "package");
    let mut cook = Cook::with_layout(&kitchen, &recipe, &configuration, layout);

    cook.source()
        .with_context(|| format!("Failed to fetch {}", recipe.reference()))?;
    cook.patch()
        .with_context(|| format!("Failed to patch {}", recipe.reference()))?;

    println!("[COMPLETE] Source ready in {}", cook.layout().source_dir.display());
    Ok(())
}

/// Build `source_folder` into `build_folder`
pub fn cmd_build(
    config_args: &ConfigArgs,
    source_folder: &str,
    build_folder: &str,
    jobs: Option<u32>,
) -> Result<()> {
    let recipe = load_recipe(config_args.recipe.as_deref())?;
    let request = build_request(config_args)?;

    let config = KitchenConfig {
        jobs,
        ..KitchenConfig::default()
    };
    let kitchen = Kitchen::new(config);
    let configuration = kitchen.configure(&recipe, &request)?;

    let layout = local_layout(&recipe, source_folder, build_folder, "package");
    let mut cook = Cook::with_layout(&kitchen, &recipe, &configuration, layout);

    cook.build()
        .with_context(|| format!("Failed to build {}", recipe.reference()))?;

    println!("[COMPLETE] Built into {}", build_folder);
    Ok(())
}

/// Package `source_folder` and `build_folder` into `package_folder`
pub fn cmd_package(
    config_args: &ConfigArgs,
    source_folder: &str,
    build_folder: &str,
    package_folder: &str,
) -> Result<()> {
    let recipe = load_recipe(config_args.recipe.as_deref())?;
    let request = build_request(config_args)?;
    let kitchen = Kitchen::new(KitchenConfig::default());
    let configuration = kitchen.configure(&recipe, &request)?;

    let layout = local_layout(&recipe, source_folder, build_folder, package_folder);
    let mut cook = Cook::with_layout(&kitchen, &recipe, &configuration, layout);

    let summary = cook
        .package()
        .with_context(|| format!("Failed to package {}", recipe.reference()))?;
    cook.export_info()
        .with_context(|| format!("Failed to export package info for {}", recipe.reference()))?;

    println!(
        "[COMPLETE] Packaged {} header(s) and {} artifact(s) into {}",
        summary.headers.len(),
        summary.artifacts.len(),
        package_folder
    );
    for warning in cook.warnings() {
        println!("  Warning: {}", warning);
    }

    Ok(())
}
