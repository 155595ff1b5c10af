// src/recipe/kitchen/package.rs

//! Package stage: assemble the package directory and export its info

use crate::error::{Error, Result};
use crate::recipe::format::{ArtifactRule, HeaderRoot};
use crate::recipe::info::PackageInfo;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::cook::Cook;

/// What the package stage put into the package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSummary {
    /// Headers, relative to the package directory
    pub headers: Vec<PathBuf>,
    /// Artifacts, relative to the package directory
    pub artifacts: Vec<PathBuf>,
    /// Removed paths that existed
    pub removed: Vec<String>,
    /// License, relative to the package directory
    pub license: Option<PathBuf>,
}

/// `*` in path patterns stops at directory separators
const PATH_MATCH: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst).map_err(|e| {
        Error::PackagingError(format!(
            "Failed to copy {} to {}: {}",
            src.display(),
            dst.display(),
            e
        ))
    })?;
    Ok(())
}

fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

impl Cook<'_> {
    /// Stage: copy headers, artifacts and the license into the package
    ///
    /// The package directory is recreated from scratch, so packaging the
    /// same trees twice gives the same result.
    pub fn package(&mut self) -> Result<PackageSummary> {
        let package_dir = self.layout.package_dir.clone();
        reset_dir(&package_dir)?;

        let recipe = self.recipe;
        let mut summary = PackageSummary::default();

        for group in &recipe.layout.headers {
            let (root, label) = match group.root {
                HeaderRoot::Source => (&self.layout.source_dir, "source"),
                HeaderRoot::Build => (&self.layout.build_dir, "build"),
            };
            for file in &group.files {
                let src = root.join(file);
                if !src.is_file() {
                    return Err(Error::PackagingError(format!(
                        "Required header {} is missing from the {} folder {}",
                        file,
                        label,
                        root.display()
                    )));
                }
                copy_file(&src, &package_dir.join(file))?;
                summary.headers.push(PathBuf::from(file));
            }
        }

        summary.artifacts = self.collect_artifacts(&package_dir)?;

        for path in &recipe.layout.remove {
            let target = package_dir.join(path);
            if target.is_dir() {
                fs::remove_dir_all(&target)?;
            } else if target.exists() {
                fs::remove_file(&target)?;
            } else {
                continue;
            }
            debug!("Removed {}", path);
            summary.removed.push(path.clone());
        }

        let license_file = &recipe.source.license_file;
        let license_src = self.layout.source_dir.join(license_file);
        if license_src.is_file() {
            let name = Path::new(license_file)
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("LICENSE"));
            let rel = Path::new("licenses").join(name);
            copy_file(&license_src, &package_dir.join(&rel))?;
            summary.license = Some(rel);
        } else {
            self.warn(format!("License file {} not found in source", license_file));
        }

        self.log_line(&format!(
            "Packaged {} header(s) and {} artifact(s) into {}",
            summary.headers.len(),
            summary.artifacts.len(),
            package_dir.display()
        ));
        info!(
            "Packaged {} header(s), {} artifact(s)",
            summary.headers.len(),
            summary.artifacts.len()
        );

        Ok(summary)
    }

    /// Copy build outputs matching the active artifact rules
    ///
    /// The build folder is walked in name order and the first matching rule
    /// wins. Path patterns are matched against the path relative to the
    /// build folder, name patterns against the file name. A second file with
    /// the same name and destination is skipped with a warning.
    fn collect_artifacts(&mut self, package_dir: &Path) -> Result<Vec<PathBuf>> {
        let recipe = self.recipe;
        let mut rules: Vec<(&ArtifactRule, glob::Pattern)> = Vec::new();
        for rule in &recipe.layout.artifacts {
            if !self.configuration.holds(rule.when.as_ref()) {
                continue;
            }
            let pattern = glob::Pattern::new(&rule.pattern).map_err(|e| {
                Error::PackagingError(format!("Invalid artifact pattern '{}': {}", rule.pattern, e))
            })?;
            rules.push((rule, pattern));
        }

        let mut artifacts = Vec::new();
        let build_dir = self.layout.build_dir.clone();
        let walker = WalkDir::new(&build_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.path() != package_dir);

        for entry in walker {
            let entry = entry.map_err(|e| {
                Error::PackagingError(format!("Failed to walk {}: {}", build_dir.display(), e))
            })?;
            if entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            let rel_build = entry.path().strip_prefix(&build_dir).unwrap_or(entry.path());
            let Some((rule, _)) = rules.iter().find(|(rule, p)| {
                if rule.matches_path() {
                    p.matches_path_with(rel_build, PATH_MATCH)
                } else {
                    p.matches(&name)
                }
            }) else {
                continue;
            };

            let rel = Path::new(&rule.dst).join(name.as_ref());
            let dst = package_dir.join(&rel);
            if dst.exists() {
                self.warn(format!(
                    "Skipping duplicate artifact {} (already packaged as {})",
                    entry.path().display(),
                    rel.display()
                ));
                continue;
            }

            copy_file(entry.path(), &dst)?;
            debug!("Packaged {}", rel.display());
            artifacts.push(rel);
        }

        Ok(artifacts)
    }

    /// Stage: write the exported package info into the package
    pub fn export_info(&mut self) -> Result<PackageInfo> {
        let info = PackageInfo::compute(self.recipe, self.configuration);
        let path = info.write(&self.layout.package_dir)?;
        self.log_line(&format!("Exported package info: {}", path.display()));
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::builtin;
    use crate::recipe::configure::{Configuration, ConfigureRequest, configure};
    use crate::recipe::format::Recipe;
    use crate::recipe::kitchen::cook::Layout;
    use crate::recipe::kitchen::{Kitchen, KitchenConfig};
    use crate::recipe::settings::{Os, Settings};
    use tempfile::TempDir;

    struct Fixture {
        _root: TempDir,
        kitchen: Kitchen,
        recipe: Recipe,
        layout: Layout,
    }

    impl Fixture {
        fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            let recipe = builtin::libevent().unwrap();
            let layout = Layout::local(
                &recipe,
                &root.path().join("src"),
                &root.path().join("build"),
                &root.path().join("pkg"),
            );

            for group in &recipe.layout.headers {
                let base = match group.root {
                    HeaderRoot::Source => &layout.source_dir,
                    HeaderRoot::Build => &layout.build_dir,
                };
                for file in &group.files {
                    let path = base.join(file);
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    fs::write(&path, format!("/* {} */\n", file)).unwrap();
                }
            }
            fs::write(layout.source_dir.join("LICENSE"), "BSD\n").unwrap();

            let kitchen = Kitchen::new(KitchenConfig::rooted_at(root.path()));
            Self {
                _root: root,
                kitchen,
                recipe,
                layout,
            }
        }

        fn artifact(&self, rel: &str) {
            let path = self.layout.build_dir.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"\x7fELF").unwrap();
        }

        fn configuration(&self, os: Os, options: &[(&str, &str)]) -> Configuration {
            let mut request = ConfigureRequest::new(Settings {
                os,
                ..Settings::detect()
            });
            for (name, value) in options {
                request = request.with_option(name, value);
            }
            configure(&self.recipe, &request).unwrap()
        }
    }

    #[test]
    fn test_static_linux_package() {
        let fx = Fixture::new();
        fx.artifact("lib/libevent_core.a");
        fx.artifact("lib/libevent_core.so");
        let configuration = fx.configuration(Os::Linux, &[]);

        let mut cook = Cook::with_layout(&fx.kitchen, &fx.recipe, &configuration, fx.layout.clone());
        let summary = cook.package().unwrap();

        assert_eq!(summary.headers.len(), 26);
        assert_eq!(summary.artifacts, vec![PathBuf::from("lib/libevent_core.a")]);
        assert_eq!(summary.license, Some(PathBuf::from("licenses/LICENSE")));
        assert!(fx.layout.package_dir.join("include/event2/event-config.h").is_file());
        assert!(!fx.layout.package_dir.join("lib/libevent_core.so").exists());
    }

    #[test]
    fn test_shared_windows_package() {
        let fx = Fixture::new();
        fx.artifact("bin/Release/event_core.dll");
        fx.artifact("lib/Release/event_core.lib");
        let configuration = fx.configuration(Os::Windows, &[("shared", "True")]);

        let mut cook = Cook::with_layout(&fx.kitchen, &fx.recipe, &configuration, fx.layout.clone());
        cook.package().unwrap();

        assert!(fx.layout.package_dir.join("bin/event_core.dll").is_file());
        assert!(fx.layout.package_dir.join("lib/event_core.lib").is_file());
    }

    #[test]
    fn test_missing_header_fails() {
        let fx = Fixture::new();
        fs::remove_file(fx.layout.build_dir.join("include/event2/event-config.h")).unwrap();
        let configuration = fx.configuration(Os::Linux, &[]);

        let mut cook = Cook::with_layout(&fx.kitchen, &fx.recipe, &configuration, fx.layout.clone());
        let err = cook.package().unwrap_err();
        assert!(matches!(err, Error::PackagingError(ref m) if m.contains("event-config.h")));
    }

    #[test]
    fn test_missing_license_warns() {
        let fx = Fixture::new();
        fs::remove_file(fx.layout.source_dir.join("LICENSE")).unwrap();
        let configuration = fx.configuration(Os::Linux, &[]);

        let mut cook = Cook::with_layout(&fx.kitchen, &fx.recipe, &configuration, fx.layout.clone());
        let summary = cook.package().unwrap();
        assert!(summary.license.is_none());
        assert_eq!(cook.warnings().len(), 1);
    }

    #[test]
    fn test_duplicate_artifact_skipped() {
        let fx = Fixture::new();
        fx.artifact("a/libevent.a");
        fx.artifact("b/libevent.a");
        let configuration = fx.configuration(Os::Linux, &[]);

        let mut cook = Cook::with_layout(&fx.kitchen, &fx.recipe, &configuration, fx.layout.clone());
        let summary = cook.package().unwrap();
        assert_eq!(summary.artifacts, vec![PathBuf::from("lib/libevent.a")]);
        assert!(cook.warnings().iter().any(|w| w.contains("duplicate")));
    }

    #[test]
    fn test_build_tool_metadata_removed() {
        let fx = Fixture::new();
        fx.artifact("lib/libevent.a");
        fx.artifact("lib/pkgconfig/libevent.pc");
        fx.artifact("lib/cmake/libevent/LibeventConfig.cmake");
        let configuration = fx.configuration(Os::Linux, &[]);

        let mut cook = Cook::with_layout(&fx.kitchen, &fx.recipe, &configuration, fx.layout.clone());
        let summary = cook.package().unwrap();

        assert_eq!(summary.removed, vec!["lib/pkgconfig", "lib/cmake"]);
        assert!(!fx.layout.package_dir.join("lib/pkgconfig").exists());
        assert!(!fx.layout.package_dir.join("lib/cmake").exists());
        assert!(fx.layout.package_dir.join("lib/libevent.a").is_file());
        assert!(!summary.artifacts.iter().any(|a| a.starts_with("lib/pkgconfig")));
    }

    #[test]
    fn test_path_pattern_matches_relative_path() {
        let mut fx = Fixture::new();
        fx.recipe.layout.remove.clear();
        fx.artifact("lib/pkgconfig/libevent.pc");
        fx.artifact("misc/pkgconfig/libevent.pc");
        fx.artifact("lib/pkgconfig/nested/extra.pc");
        let configuration = fx.configuration(Os::Linux, &[]);

        let mut cook = Cook::with_layout(&fx.kitchen, &fx.recipe, &configuration, fx.layout.clone());
        let summary = cook.package().unwrap();

        assert!(summary.removed.is_empty());
        assert!(fx.layout.package_dir.join("lib/pkgconfig/libevent.pc").is_file());
        assert!(summary.artifacts.contains(&PathBuf::from("lib/pkgconfig/libevent.pc")));
        assert!(!fx.layout.package_dir.join("lib/pkgconfig/extra.pc").exists());
        assert!(cook.warnings().is_empty());
    }

    #[test]
    fn test_export_info() {
        let fx = Fixture::new();
        let configuration = fx.configuration(Os::Linux, &[]);

        let mut cook = Cook::with_layout(&fx.kitchen, &fx.recipe, &configuration, fx.layout.clone());
        cook.package().unwrap();
        let info = cook.export_info().unwrap();

        let read = PackageInfo::read(
            &fx.layout
                .package_dir
                .join(crate::recipe::info::PACKAGE_INFO_FILE),
        )
        .unwrap();
        assert_eq!(read, info);
    }
}
