// src/commands/cook.rs

//! Cook command - run the whole pipeline into the package store

use super::{build_request, load_recipe};
use crate::cli::ConfigArgs;
use anyhow::{Context, Result};
use libevent_kitchen::{Kitchen, KitchenConfig};
use std::path::PathBuf;
use tracing::info;

/// Kitchen overrides from the `cook` command line
#[derive(Debug, Default)]
pub struct CookArgs {
    pub output: Option<String>,
    pub work_root: Option<String>,
    pub source_cache: Option<String>,
    pub no_source_cache: bool,
    pub jobs: Option<u32>,
    pub keep_builddir: bool,
    pub offline: bool,
}

impl CookArgs {
    fn kitchen_config(&self) -> KitchenConfig {
        let mut config = KitchenConfig {
            keep_builddir: self.keep_builddir,
            offline: self.offline,
            ..Default::default()
        };

        if let Some(output) = &self.output {
            config.output_root = PathBuf::from(output);
        }
        if let Some(work_root) = &self.work_root {
            config.work_root = PathBuf::from(work_root);
        }
        if let Some(cache) = &self.source_cache {
            config.source_cache = Some(PathBuf::from(cache));
        }
        if self.no_source_cache {
            config.source_cache = None;
        }
        if self.jobs.is_some() {
            config.jobs = self.jobs;
        }

        config
    }
}

/// Cook a package
pub fn cmd_cook(config_args: &ConfigArgs, args: &CookArgs) -> Result<()> {
    let recipe = load_recipe(config_args.recipe.as_deref())?;
    let request = build_request(config_args)?;

    let kitchen = Kitchen::new(args.kitchen_config());
    let config = kitchen.config();

    println!("Recipe: {} version {}", recipe.package.name, recipe.package.version);
    println!(
        "Cooking with {} parallel jobs...",
        config.build_jobs(recipe.build.jobs)
    );
    if config.offline {
        println!("  - Offline: using the cached mirror only");
    } else if kitchen.sources_cached(&recipe) {
        println!("  - Source mirror already cached");
    }

    let result = kitchen
        .cook(&recipe, &request)
        .with_context(|| format!("Failed to cook {}", recipe.reference()))?;

    println!("\n[COMPLETE] Cooked: {}", result.package_dir.display());
    println!("  Package id: {}", result.package_id);
    println!("  Options: {}", result.info.options);

    if let Some(work_dir) = &result.work_dir {
        println!("  Work directory kept at {}", work_dir.display());
    }

    if !result.warnings.is_empty() {
        println!("\nBuild warnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }

    info!(
        "Successfully cooked {} to {}",
        recipe.package.name,
        result.package_dir.display()
    );

    Ok(())
}

/// Mirror the upstream repository for offline cooking
pub fn cmd_fetch(recipe_path: Option<&str>, source_cache: Option<&str>) -> Result<()> {
    let recipe = load_recipe(recipe_path)?;

    let mut config = KitchenConfig::default();
    if let Some(cache) = source_cache {
        config.source_cache = Some(PathBuf::from(cache));
    }
    let kitchen = Kitchen::new(config);

    let mirror = kitchen
        .fetch(&recipe)
        .with_context(|| format!("Failed to fetch sources for {}", recipe.package.name))?;

    println!("[COMPLETE] Mirrored {} into {}", recipe.source_url(), mirror.display());
    if kitchen.sources_cached(&recipe) {
        println!("[OK] Sources are cached. Ready for offline cook.");
    }

    Ok(())
}
