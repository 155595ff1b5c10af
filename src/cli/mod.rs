// src/cli/mod.rs
//! CLI definitions for libevent-kitchen
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! - `cook` - Run the whole pipeline into the package store
//! - `source` / `build` / `package` - Run single stages over local folders
//! - `info` - Print the exported package info without building
//! - `inspect` - Show the recipe and its options
//! - `check` - Configure only; print the normalized options and package id
//! - `fetch` - Mirror the upstream repository into the source cache

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "libevent-kitchen")]
#[command(author = "libevent-kitchen Contributors")]
#[command(version)]
#[command(about = "Fetch, patch, build and package libevent with CMake", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Recipe selection and configuration, shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Recipe file (default: the built-in libevent recipe)
    #[arg(short, long)]
    pub recipe: Option<String>,

    /// Profile file with [settings] and [options] tables
    #[arg(long)]
    pub profile: Option<String>,

    /// Set an option, e.g. -o shared=True (repeatable)
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<String>,

    /// Set a setting, e.g. -s os=Windows (repeatable)
    #[arg(short = 's', long = "setting", value_name = "KEY=VALUE")]
    pub settings: Vec<String>,

    /// Install path of a requirement, e.g. --dep openssl=/opt/openssl (repeatable)
    #[arg(long = "dep", value_name = "NAME=PATH")]
    pub deps: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cook a package: configure, source, patch, build, package, export
    Cook {
        #[command(flatten)]
        config: ConfigArgs,

        /// Package store root (default: platform data dir)
        #[arg(long)]
        output: Option<String>,

        /// Root for isolated work directories (default: system temp dir)
        #[arg(long)]
        work_root: Option<String>,

        /// Directory for git mirrors of upstream repositories
        #[arg(long)]
        source_cache: Option<String>,

        /// Clone straight from the remote instead of a cached mirror
        #[arg(long, conflicts_with = "source_cache")]
        no_source_cache: bool,

        /// Number of parallel build jobs; overrides the recipe (default: recipe, else number of CPUs)
        #[arg(short, long)]
        jobs: Option<u32>,

        /// Keep the work directory after cooking (for debugging)
        #[arg(long)]
        keep_builddir: bool,

        /// Never contact the remote; requires a cached mirror
        #[arg(long)]
        offline: bool,
    },

    /// Fetch and patch the source into a folder
    Source {
        #[command(flatten)]
        config: ConfigArgs,

        /// Folder the checkout is placed in
        #[arg(long, default_value = "source")]
        source_folder: String,
    },

    /// Build a fetched source folder with CMake
    Build {
        #[command(flatten)]
        config: ConfigArgs,

        /// Folder holding the checkout
        #[arg(long, default_value = "source")]
        source_folder: String,

        /// CMake build folder
        #[arg(long, default_value = "build")]
        build_folder: String,

        /// Number of parallel build jobs; overrides the recipe (default: recipe, else number of CPUs)
        #[arg(short, long)]
        jobs: Option<u32>,
    },

    /// Package a built tree and export its info
    Package {
        #[command(flatten)]
        config: ConfigArgs,

        /// Folder holding the checkout
        #[arg(long, default_value = "source")]
        source_folder: String,

        /// CMake build folder
        #[arg(long, default_value = "build")]
        build_folder: String,

        /// Folder the package is assembled in
        #[arg(long, default_value = "package")]
        package_folder: String,
    },

    /// Print the exported package info as JSON without building
    Info {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Show recipe identity, options and defaults
    Inspect {
        /// Recipe file (default: the built-in libevent recipe)
        #[arg(short, long)]
        recipe: Option<String>,
    },

    /// Configure only: print the normalized options and the package id
    Check {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Mirror the upstream repository into the source cache
    Fetch {
        /// Recipe file (default: the built-in libevent recipe)
        #[arg(short, long)]
        recipe: Option<String>,

        /// Directory for git mirrors of upstream repositories
        #[arg(long)]
        source_cache: Option<String>,
    },
}
