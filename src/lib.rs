// src/lib.rs

//! libevent kitchen
//!
//! Turns the upstream libevent sources into installable packages for a
//! given set of build options and target settings.
//!
//! # Architecture
//!
//! - Recipes: declarative TOML describing source, patches, CMake mapping,
//!   package layout and exported info
//! - Configuration: one validation step that normalizes options and
//!   computes the package id before anything touches disk
//! - Kitchen: runs the fixed stage sequence in an isolated work directory
//! - Tool runner: every external process goes through one trait

mod error;
pub mod hash;
pub mod recipe;

pub use error::{Error, Result};
pub use recipe::{
    ConfigureRequest, Configuration, Cook, CookResult, Kitchen, KitchenConfig, PackageInfo,
    Recipe, Settings, Stage,
};
