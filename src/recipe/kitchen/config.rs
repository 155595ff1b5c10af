// src/recipe/kitchen/config.rs

//! Configuration types for the Kitchen

use crate::recipe::info::PackageInfo;
use std::path::PathBuf;

/// Configuration for the Kitchen
#[derive(Debug, Clone)]
pub struct KitchenConfig {
    /// Isolated per-invocation work directories are created here
    pub work_root: PathBuf,
    /// Packages land in `<output_root>/<name>/<version>/<package_id>`
    pub output_root: PathBuf,
    /// Bare git mirrors of upstream repositories (`None` clones directly)
    pub source_cache: Option<PathBuf>,
    /// Number of parallel build jobs; overrides the recipe when set
    pub jobs: Option<u32>,
    /// Keep the work directory after cooking (for debugging)
    pub keep_builddir: bool,
    /// Never contact the remote; requires a cached mirror
    pub offline: bool,
    /// Program names for the external tools
    pub git: String,
    pub cmake: String,
    pub patch: String,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            work_root: std::env::temp_dir().join("libevent-kitchen"),
            output_root: dirs::data_local_dir()
                .map(|d| d.join("libevent-kitchen").join("packages"))
                .unwrap_or_else(|| PathBuf::from("packages")),
            source_cache: dirs::cache_dir().map(|d| d.join("libevent-kitchen").join("sources")),
            jobs: None,
            keep_builddir: false,
            offline: false,
            git: "git".to_string(),
            cmake: "cmake".to_string(),
            patch: "patch".to_string(),
        }
    }
}

impl KitchenConfig {
    /// Configuration rooted in a single directory
    ///
    /// Work, output and source cache all live below `root`.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            work_root: root.join("work"),
            output_root: root.join("packages"),
            source_cache: Some(root.join("sources")),
            ..Self::default()
        }
    }

    /// Parallel jobs for a build: the configured count, then the recipe's,
    /// then the number of CPUs
    pub fn build_jobs(&self, recipe_jobs: Option<u32>) -> u32 {
        self.jobs
            .or(recipe_jobs)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|p| p.get() as u32)
                    .unwrap_or(4)
            })
            .max(1)
    }
}

/// Result of cooking a recipe
#[derive(Debug)]
pub struct CookResult {
    /// Final package directory
    pub package_dir: PathBuf,
    pub package_id: String,
    /// Exported package info, as written to the package
    pub info: PackageInfo,
    /// Build log
    pub log: String,
    /// Warnings generated during the cook
    pub warnings: Vec<String>,
    /// Work directory, when kept
    pub work_dir: Option<PathBuf>,
}
