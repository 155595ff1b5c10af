// src/recipe/kitchen/cook.rs

//! Cook: one pipeline run for a single configuration

use crate::error::{Error, Result};
use crate::recipe::configure::Configuration;
use crate::recipe::format::Recipe;
use crate::recipe::info::PackageInfo;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

use super::Kitchen;
use super::config::CookResult;
use super::runner::{Invocation, ToolOutput};

/// Directories one cook works in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Directory the checkout is placed in
    pub source_root: PathBuf,
    /// The checkout itself (`source_root/<folder>`)
    pub source_dir: PathBuf,
    /// CMake binary directory
    pub build_dir: PathBuf,
    /// Where the package is assembled
    pub package_dir: PathBuf,
    /// Where the package is moved once complete (`None` keeps it in place)
    pub final_dir: Option<PathBuf>,
}

impl Layout {
    /// Layout over caller-provided folders, packaging in place
    pub fn local(recipe: &Recipe, source_root: &Path, build_dir: &Path, package_dir: &Path) -> Self {
        Self {
            source_root: source_root.to_path_buf(),
            source_dir: source_root.join(&recipe.source.folder),
            build_dir: build_dir.to_path_buf(),
            package_dir: package_dir.to_path_buf(),
            final_dir: None,
        }
    }

    /// Final location of the package
    pub fn output_dir(&self) -> &Path {
        self.final_dir.as_deref().unwrap_or(&self.package_dir)
    }
}

/// A single cook operation
pub struct Cook<'a> {
    pub(super) kitchen: &'a Kitchen,
    pub(super) recipe: &'a Recipe,
    pub(super) configuration: &'a Configuration,
    /// Isolated work directory, removed on drop unless released
    work_dir: Option<TempDir>,
    pub(super) layout: Layout,
    /// Build log accumulator
    pub(super) log: String,
    /// Warnings
    pub(super) warnings: Vec<String>,
}

impl<'a> Cook<'a> {
    /// Start a cook in a fresh work directory under the kitchen's work root
    ///
    /// The directory name carries the package name, version and short package
    /// id, plus a random suffix, so concurrent cooks never share a tree.
    pub fn new(
        kitchen: &'a Kitchen,
        recipe: &'a Recipe,
        configuration: &'a Configuration,
    ) -> Result<Self> {
        let config = kitchen.config();
        fs::create_dir_all(&config.work_root).map_err(|e| {
            Error::IoError(format!(
                "Failed to create work root {}: {}",
                config.work_root.display(),
                e
            ))
        })?;

        let prefix = format!(
            "{}-{}-{}-",
            recipe.package.name,
            recipe.package.version,
            configuration.short_id()
        );
        let work_dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(&config.work_root)
            .map_err(|e| Error::IoError(format!("Failed to create work directory: {}", e)))?;

        let source_root = work_dir.path().join("src");
        let build_dir = work_dir.path().join("build");
        fs::create_dir_all(&source_root)?;

        let version_dir = config
            .output_root
            .join(&recipe.package.name)
            .join(&recipe.package.version);
        let layout = Layout {
            source_dir: source_root.join(&recipe.source.folder),
            source_root,
            build_dir,
            package_dir: version_dir.join(format!(".{}.partial", configuration.package_id)),
            final_dir: Some(version_dir.join(&configuration.package_id)),
        };

        debug!("Work directory: {}", work_dir.path().display());

        Ok(Self {
            kitchen,
            recipe,
            configuration,
            work_dir: Some(work_dir),
            layout,
            log: String::new(),
            warnings: Vec::new(),
        })
    }

    /// Run stages over caller-provided folders
    pub fn with_layout(
        kitchen: &'a Kitchen,
        recipe: &'a Recipe,
        configuration: &'a Configuration,
        layout: Layout,
    ) -> Self {
        Self {
            kitchen,
            recipe,
            configuration,
            work_dir: None,
            layout,
            log: String::new(),
            warnings: Vec::new(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn configuration(&self) -> &Configuration {
        self.configuration
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Run every stage after configuration, in order
    pub fn run_all(&mut self) -> Result<PackageInfo> {
        info!("Fetching source...");
        self.source()?;

        info!("Patching source...");
        self.patch()?;

        info!("Building with CMake...");
        self.build()?;

        info!("Packaging...");
        self.package()?;

        self.export_info()
    }

    /// Move the package into its final place and wrap up
    pub fn finish(mut self, info: PackageInfo) -> Result<CookResult> {
        let package_dir = match self.layout.final_dir.clone() {
            Some(final_dir) => {
                if final_dir.exists() {
                    debug!("Replacing existing package at {}", final_dir.display());
                    fs::remove_dir_all(&final_dir)?;
                }
                fs::rename(&self.layout.package_dir, &final_dir).map_err(|e| {
                    Error::PackagingError(format!(
                        "Failed to move package into {}: {}",
                        final_dir.display(),
                        e
                    ))
                })?;
                final_dir
            }
            None => self.layout.package_dir.clone(),
        };

        self.log_line(&format!("Package: {}", package_dir.display()));
        info!("Cooked: {}", package_dir.display());

        let work_dir = self.keep_work_dir();

        Ok(CookResult {
            package_dir,
            package_id: self.configuration.package_id.clone(),
            info,
            log: self.log,
            warnings: self.warnings,
            work_dir,
        })
    }

    /// Keep the work directory on disk if the kitchen is configured to
    pub(super) fn keep_work_dir(&mut self) -> Option<PathBuf> {
        if !self.kitchen.config().keep_builddir {
            return None;
        }
        self.release_work_dir()
    }

    /// Leave the work directory on disk regardless of configuration
    pub(super) fn release_work_dir(&mut self) -> Option<PathBuf> {
        self.work_dir.take().map(TempDir::keep)
    }

    /// Run an external tool, log its output and map a failure to a stage error
    pub(super) fn run_tool(
        &mut self,
        phase: &str,
        invocation: &Invocation,
        stage_error: fn(String) -> Error,
    ) -> Result<ToolOutput> {
        let kitchen = self.kitchen;
        match kitchen.run_tool(invocation, stage_error) {
            Ok(output) => {
                self.log_build_output(phase, &output.stdout, &output.stderr);
                Ok(output)
            }
            Err(e) => {
                self.log_line(&format!("=== {} ===", phase));
                self.log_line(&e.to_string());
                Err(e)
            }
        }
    }

    pub(super) fn log_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }

    /// Log tool output (stdout/stderr) with a phase header
    fn log_build_output(&mut self, phase: &str, stdout: &str, stderr: &str) {
        self.log_line(&format!("=== {} ===", phase));
        if !stdout.is_empty() {
            self.log.push_str(stdout);
            self.log.push('\n');
        }
        if !stderr.is_empty() {
            self.log.push_str(stderr);
            self.log.push('\n');
        }
    }

    pub(super) fn warn(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }
}
