// src/recipe/info.rs

//! Exported package info
//!
//! What a consumer needs to link against a cooked package: library names in
//! link order, system libraries, preprocessor defines and the package
//! directories. Written as `package-info.json` next to the package contents.

use crate::error::{Error, Result};
use crate::recipe::configure::Configuration;
use crate::recipe::format::{Entry, Recipe};
use crate::recipe::options::OptionSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the exported info inside a package directory
pub const PACKAGE_INFO_FILE: &str = "package-info.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub package_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    pub settings: BTreeMap<String, String>,
    pub options: OptionSet,
    /// `name/version` of each active requirement
    pub requires: Vec<String>,
    pub libs: Vec<String>,
    pub system_libs: Vec<String>,
    pub defines: Vec<String>,
    pub include_dirs: Vec<String>,
    pub lib_dirs: Vec<String>,
    pub bin_dirs: Vec<String>,
}

impl PackageInfo {
    /// Compute the info for one configuration of a recipe
    pub fn compute(recipe: &Recipe, configuration: &Configuration) -> Self {
        let select = |entries: &[Entry]| -> Vec<String> {
            entries
                .iter()
                .filter(|e| e.applies(&configuration.options, &configuration.settings))
                .map(|e| e.name().to_string())
                .collect()
        };

        Self {
            name: recipe.package.name.clone(),
            version: recipe.package.version.clone(),
            package_id: configuration.package_id.clone(),
            license: recipe.package.license.clone(),
            homepage: recipe.package.homepage.clone(),
            settings: configuration.settings.binary_fields(),
            options: configuration.options.clone(),
            requires: configuration
                .requires
                .iter()
                .map(|r| r.reference())
                .collect(),
            libs: select(&recipe.info.libs),
            system_libs: select(&recipe.info.system_libs),
            defines: select(&recipe.info.defines),
            include_dirs: vec!["include".to_string()],
            lib_dirs: vec!["lib".to_string()],
            bin_dirs: vec!["bin".to_string()],
        }
    }

    pub fn has_define(&self, name: &str) -> bool {
        self.defines.iter().any(|d| d == name)
    }

    /// Write `package-info.json` into a package directory
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(PACKAGE_INFO_FILE);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::PackagingError(format!("Failed to serialize package info: {}", e)))?;
        fs::write(&path, json + "\n").map_err(|e| {
            Error::PackagingError(format!("Failed to write {}: {}", path.display(), e))
        })?;
        Ok(path)
    }

    /// Read a previously exported `package-info.json`
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::ParseError(format!("Invalid package info {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::builtin;
    use crate::recipe::configure::{ConfigureRequest, configure};
    use crate::recipe::settings::{Os, Settings};

    fn info_for(os: Os, options: &[(&str, &str)]) -> PackageInfo {
        let recipe = builtin::libevent().unwrap();
        let mut request = ConfigureRequest::new(Settings {
            os,
            ..Settings::detect()
        })
        .with_dependency("openssl", "/opt/openssl");
        for (name, value) in options {
            request = request.with_option(name, value);
        }
        let configuration = configure(&recipe, &request).unwrap();
        PackageInfo::compute(&recipe, &configuration)
    }

    #[test]
    fn test_linux_defaults() {
        let info = info_for(Os::Linux, &[]);
        assert_eq!(info.libs, vec!["event_extra", "event_pthreads", "event_core"]);
        assert_eq!(info.system_libs, vec!["rt"]);
        assert!(!info.has_define("EVENT__HAVE_OPENSSL"));
        assert!(info.requires.is_empty());
    }

    #[test]
    fn test_windows_openssl() {
        let info = info_for(Os::Windows, &[("with_openssl", "True")]);
        assert_eq!(info.libs, vec!["event_extra", "event_openssl", "event_core"]);
        assert_eq!(info.system_libs, vec!["ws2_32"]);
        assert!(info.has_define("EVENT__HAVE_OPENSSL"));
        assert_eq!(info.requires, vec!["openssl/1.1.1g"]);
    }

    #[test]
    fn test_disable_threads_drops_pthreads() {
        let info = info_for(Os::Linux, &[("disable_threads", "True")]);
        assert!(!info.libs.iter().any(|l| l == "event_pthreads"));
    }

    #[test]
    fn test_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let info = info_for(Os::Linux, &[("shared", "True")]);

        let path = info.write(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), PACKAGE_INFO_FILE);

        let read = PackageInfo::read(&path).unwrap();
        assert_eq!(read, info);
        assert!(read.options.get_bool("shared"));
    }
}
