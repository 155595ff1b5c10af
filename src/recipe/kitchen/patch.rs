// src/recipe/kitchen/patch.rs

//! Patch stage: text substitutions and patch files

use crate::error::{Error, Result};
use crate::hash::verify_file_checksum;
use std::fs;
use std::path::Path;
use tracing::info;

use super::cook::Cook;
use super::runner::Invocation;

/// Replace every occurrence of `search` in a file
///
/// Returns the number of replacements. A missing file or a missing pattern
/// means upstream drifted away from what the recipe expects.
pub fn replace_in_file(path: &Path, search: &str, replace: &str) -> Result<usize> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::PatchError(format!("Cannot read patch target {}: {}", path.display(), e))
    })?;

    let count = content.matches(search).count();
    if count == 0 {
        return Err(Error::PatchError(format!(
            "Pattern not found in {}: {:?}",
            path.display(),
            search
        )));
    }

    fs::write(path, content.replace(search, replace)).map_err(|e| {
        Error::PatchError(format!("Cannot write patch target {}: {}", path.display(), e))
    })?;

    Ok(count)
}

impl Cook<'_> {
    /// Stage: apply substitutions, then patch files, in recipe order
    pub fn patch(&mut self) -> Result<()> {
        let recipe = self.recipe;

        for replacement in &recipe.patches.replace {
            if !self.configuration.holds(replacement.when.as_ref()) {
                continue;
            }

            let target = self
                .layout
                .source_dir
                .join(recipe.substitute(&replacement.file));
            let count = replace_in_file(
                &target,
                &recipe.substitute(&replacement.search),
                &recipe.substitute(&replacement.replace),
            )?;
            self.log_line(&format!(
                "Replaced {} occurrence(s) in {}",
                count, replacement.file
            ));
        }

        for patch_info in &recipe.patches.files {
            if !self.configuration.holds(patch_info.when.as_ref()) {
                continue;
            }

            let file = recipe.substitute(&patch_info.file);
            let patch_path = recipe.resolve_path(&file);
            if !patch_path.is_file() {
                return Err(Error::PatchError(format!(
                    "Patch file not found: {}",
                    patch_path.display()
                )));
            }
            if let Some(checksum) = &patch_info.checksum {
                verify_file_checksum(&patch_path, checksum)?;
            }

            info!("Applying patch: {}", file);
            let invocation = Invocation::new(&self.kitchen.config().patch)
                .arg(format!("-p{}", patch_info.strip))
                .arg("-i")
                .path_arg(&patch_path)
                .args(["--forward", "--batch"])
                .current_dir(&self.layout.source_dir);
            self.run_tool(&format!("patch {}", file), &invocation, Error::PatchError)?;
            self.log_line(&format!("Applied patch: {}", file));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CMakeLists.txt");
        fs::write(&path, "cmake_minimum_required(VERSION 3.1)\nproject(libevent C)\n").unwrap();

        let count = replace_in_file(&path, "project(libevent C)", "project(libevent C)\nhook()").unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "cmake_minimum_required(VERSION 3.1)\nproject(libevent C)\nhook()\n"
        );
    }

    #[test]
    fn test_replace_missing_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CMakeLists.txt");
        fs::write(&path, "project(libevent)\n").unwrap();

        let err = replace_in_file(&path, "project(libevent C)", "x").unwrap_err();
        assert!(matches!(err, Error::PatchError(_)));
        // File untouched
        assert_eq!(fs::read_to_string(&path).unwrap(), "project(libevent)\n");
    }

    #[test]
    fn test_replace_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = replace_in_file(&dir.path().join("nope.txt"), "a", "b").unwrap_err();
        assert!(matches!(err, Error::PatchError(_)));
    }
}
