// src/commands/mod.rs
//! Command handlers for the libevent-kitchen CLI

mod cook;
mod query;
mod stages;

pub use cook::{cmd_cook, cmd_fetch, CookArgs};
pub use query::{cmd_check, cmd_info, cmd_inspect};
pub use stages::{cmd_build, cmd_package, cmd_source};

use crate::cli::ConfigArgs;
use anyhow::{Context, Result};
use libevent_kitchen::recipe::builtin;
use libevent_kitchen::recipe::options::parse_assignment;
use libevent_kitchen::recipe::{parse_recipe_file, Profile};
use libevent_kitchen::{ConfigureRequest, Recipe, Settings};
use std::path::Path;
use tracing::debug;

/// Load a recipe file, or the built-in libevent recipe
pub(crate) fn load_recipe(path: Option<&str>) -> Result<Recipe> {
    match path {
        Some(path) => {
            let path = Path::new(path);
            debug!("Reading recipe: {}", path.display());
            parse_recipe_file(path)
                .with_context(|| format!("Failed to parse recipe: {}", path.display()))
        }
        None => builtin::libevent().context("Failed to parse the built-in libevent recipe"),
    }
}

/// Build a configure request from the command line
///
/// Settings start from the host, then the profile, then `-s` arguments.
/// Options from the profile come before `-o` arguments, so the command line
/// wins.
pub(crate) fn build_request(args: &ConfigArgs) -> Result<ConfigureRequest> {
    let mut settings = Settings::detect();
    let mut request_options = Vec::new();

    if let Some(profile_path) = &args.profile {
        let profile = Profile::load(Path::new(profile_path))
            .with_context(|| format!("Failed to load profile: {}", profile_path))?;
        profile
            .apply_settings(&mut settings)
            .with_context(|| format!("Invalid settings in profile: {}", profile_path))?;
        request_options.extend(profile.option_values());
    }

    for assignment in &args.settings {
        let (key, value) = parse_assignment(assignment)?;
        settings.set(&key, &value)?;
    }

    for assignment in &args.options {
        request_options.push(parse_assignment(assignment)?);
    }

    let mut request = ConfigureRequest::new(settings);
    request.options = request_options;

    for assignment in &args.deps {
        let (name, path) = parse_assignment(assignment)?;
        request = request.with_dependency(&name, path);
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libevent_kitchen::recipe::Os;

    #[test]
    fn test_build_request_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let profile = dir.path().join("windows.toml");
        std::fs::write(
            &profile,
            "[settings]\nos = \"Windows\"\n\n[options]\nshared = true\n",
        )
        .unwrap();

        let args = ConfigArgs {
            profile: Some(profile.to_string_lossy().into_owned()),
            options: vec!["shared=False".to_string()],
            settings: vec!["build_type=Debug".to_string()],
            deps: vec!["openssl=/opt/openssl".to_string()],
            ..Default::default()
        };

        let request = build_request(&args).unwrap();
        assert_eq!(request.settings.os, Os::Windows);
        assert_eq!(request.settings.build_type.to_string(), "Debug");
        // Command line comes last and wins
        assert_eq!(
            request.options,
            vec![
                ("shared".to_string(), "true".to_string()),
                ("shared".to_string(), "False".to_string()),
            ]
        );
        assert_eq!(
            request.dependencies["openssl"],
            std::path::PathBuf::from("/opt/openssl")
        );
    }

    #[test]
    fn test_bad_assignment() {
        let args = ConfigArgs {
            options: vec!["shared".to_string()],
            ..Default::default()
        };
        assert!(build_request(&args).is_err());
    }

    #[test]
    fn test_load_builtin_recipe() {
        let recipe = load_recipe(None).unwrap();
        assert_eq!(recipe.package.name, "libevent");
    }
}
