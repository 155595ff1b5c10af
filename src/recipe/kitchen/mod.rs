// src/recipe/kitchen/mod.rs

//! Kitchen: the engine that cooks recipes
//!
//! The Kitchen runs the recipe pipeline for one configuration at a time:
//! - Configure: normalize and validate options before touching disk
//! - Source: check out the upstream tag (optionally through a local mirror)
//! - Patch: apply substitutions and patch files
//! - Build: configure and build with CMake
//! - Package: copy headers, artifacts and license into the package layout
//! - Export: write `package-info.json`
//!
//! Each cook works in its own temporary directory under the work root and
//! assembles the package next to its final location before moving it into
//! place.

mod cmake;
mod config;
mod cook;
mod package;
mod patch;
mod runner;
mod source;

pub use cmake::BUILD_INFO_FILE;
pub use config::{CookResult, KitchenConfig};
pub use cook::{Cook, Layout};
pub use package::PackageSummary;
pub use patch::replace_in_file;
pub use runner::{Invocation, SystemRunner, ToolOutput, ToolRunner};

use crate::error::{Error, Result};
use crate::recipe::configure::{self, Configuration, ConfigureRequest};
use crate::recipe::format::Recipe;
use crate::recipe::parser::validate_recipe;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The Kitchen: where recipes are cooked
pub struct Kitchen {
    pub(crate) config: KitchenConfig,
    /// Runs git, cmake and patch
    runner: Arc<dyn ToolRunner>,
}

impl Kitchen {
    /// Create a new Kitchen that runs real tools
    pub fn new(config: KitchenConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    /// Create a new Kitchen with a custom tool runner
    pub fn with_runner(config: KitchenConfig, runner: Arc<dyn ToolRunner>) -> Self {
        Self { config, runner }
    }

    /// Create a Kitchen with default configuration
    pub fn with_defaults() -> Self {
        Self::new(KitchenConfig::default())
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// Validate the recipe and configure it for one invocation
    ///
    /// Nothing is fetched or written; a configuration error here means no
    /// stage runs at all.
    pub fn configure(&self, recipe: &Recipe, request: &ConfigureRequest) -> Result<Configuration> {
        for warning in validate_recipe(recipe)? {
            debug!("Recipe {}: {}", recipe.reference(), warning);
        }

        let configuration = configure::configure(recipe, request)?;

        info!(
            "Configured {} ({}): {}",
            recipe.reference(),
            configuration.short_id(),
            configuration.options
        );
        if !configuration.removed.is_empty() {
            debug!(
                "Options removed for this configuration: {}",
                configuration.removed.join(", ")
            );
        }

        Ok(configuration)
    }

    /// Cook a recipe into a package
    ///
    /// This is the main entry point. The stages run in order and the first
    /// failure ends the cook; nothing is retried and partial trees are not
    /// rolled back. After a failure the work directory stays on disk; after
    /// a success it is removed unless `keep_builddir` is set.
    ///
    /// ## Cooking Process
    /// 1. **Configure**: validate options, resolve requirements, compute the package id
    /// 2. **Source**: check out the upstream tag
    /// 3. **Patch**: apply substitutions and patch files
    /// 4. **Build**: CMake configure and build
    /// 5. **Package**: assemble headers, artifacts and license
    /// 6. **Export**: write the package info and move the package into place
    pub fn cook(&self, recipe: &Recipe, request: &ConfigureRequest) -> Result<CookResult> {
        info!(
            "Cooking {} version {}",
            recipe.package.name, recipe.package.version
        );

        let configuration = self.configure(recipe, request)?;
        let mut cook = Cook::new(self, recipe, &configuration)?;

        match cook.run_all() {
            Ok(info) => cook.finish(info),
            Err(e) => {
                match e.stage() {
                    Some(stage) => warn!("Cooking {} failed in {} stage", recipe.reference(), stage),
                    None => warn!("Cooking {} failed", recipe.reference()),
                }
                if let Some(dir) = cook.release_work_dir() {
                    warn!("Work directory left at {}", dir.display());
                }
                Err(e)
            }
        }
    }

    /// Path of the bare mirror for a recipe, if a source cache is configured
    pub fn mirror_path(&self, recipe: &Recipe) -> Option<PathBuf> {
        self.config
            .source_cache
            .as_ref()
            .map(|cache| cache.join(format!("{}.git", recipe.package.name)))
    }

    /// Check if the recipe's repository is mirrored in the source cache
    ///
    /// Returns `true` when a cook can check out the source without network
    /// access.
    pub fn sources_cached(&self, recipe: &Recipe) -> bool {
        self.mirror_path(recipe).is_some_and(|p| p.is_dir())
    }

    /// Mirror the recipe's repository into the source cache without building
    ///
    /// Useful to warm the cache before cooking offline.
    pub fn fetch(&self, recipe: &Recipe) -> Result<PathBuf> {
        info!("Fetching sources for {}", recipe.reference());
        self.ensure_mirror(recipe)?.ok_or_else(|| {
            Error::ConfigurationError("No source cache configured".to_string())
        })
    }

    /// Create or refresh the mirror for a recipe
    ///
    /// Returns `None` when no source cache is configured. Offline, an
    /// existing mirror is used as is and a missing one is an error.
    pub(crate) fn ensure_mirror(&self, recipe: &Recipe) -> Result<Option<PathBuf>> {
        let Some(mirror) = self.mirror_path(recipe) else {
            return Ok(None);
        };

        if mirror.is_dir() {
            if self.config.offline {
                debug!("Offline, using mirror {} as is", mirror.display());
            } else {
                info!("Updating mirror {}", mirror.display());
                let update = self
                    .git()
                    .arg("--git-dir")
                    .path_arg(&mirror)
                    .args(["remote", "update", "--prune"]);
                self.run_tool(&update, Error::FetchError)?;
            }
            return Ok(Some(mirror));
        }

        if self.config.offline {
            return Err(Error::FetchError(format!(
                "Offline and no mirror of {} in {}",
                recipe.source_url(),
                mirror.display()
            )));
        }

        if let Some(parent) = mirror.parent() {
            fs::create_dir_all(parent)?;
        }

        info!("Mirroring {} into {}", recipe.source_url(), mirror.display());
        let clone = self
            .git()
            .args(["clone", "--mirror"])
            .arg(recipe.source_url())
            .path_arg(&mirror);
        self.run_tool(&clone, Error::FetchError)?;

        Ok(Some(mirror))
    }

    /// A git invocation that fails instead of prompting for credentials
    pub(crate) fn git(&self) -> Invocation {
        Invocation::new(&self.config.git).env("GIT_TERMINAL_PROMPT", "0")
    }

    /// Run a tool and turn a failure into the given stage error
    pub(crate) fn run_tool(
        &self,
        invocation: &Invocation,
        stage_error: fn(String) -> Error,
    ) -> Result<ToolOutput> {
        let output = self
            .runner
            .run(invocation)
            .map_err(|e| stage_error(format!("Failed to run `{}`: {}", invocation, e)))?;

        if !output.success() {
            return Err(stage_error(output.describe_failure(invocation)));
        }

        Ok(output)
    }
}
