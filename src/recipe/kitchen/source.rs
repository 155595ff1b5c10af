// src/recipe/kitchen/source.rs

//! Source stage: check out the upstream tag

use crate::error::{Error, Result};
use std::fs;
use tracing::info;

use super::cook::Cook;

impl Cook<'_> {
    /// Stage: fetch the tagged upstream revision into the source root
    ///
    /// With a source cache the tag is cloned from a local bare mirror that is
    /// refreshed first (unless offline). Without one it is cloned shallowly
    /// from the remote. Either way the checkout must produce the recipe's
    /// source folder.
    pub fn source(&mut self) -> Result<()> {
        let tag = self.recipe.tag();
        let dest = self.layout.source_dir.clone();

        if dest.exists() {
            return Err(Error::FetchError(format!(
                "Source folder already exists: {}",
                dest.display()
            )));
        }
        fs::create_dir_all(&self.layout.source_root)?;

        let clone = self
            .kitchen
            .git()
            .args(["-c", "advice.detachedHead=false", "clone", "--branch"])
            .arg(tag.as_str());

        let clone = match self.kitchen.ensure_mirror(self.recipe)? {
            Some(mirror) => {
                info!("Checking out {} from {}", tag, mirror.display());
                self.log_line(&format!("Using mirror: {}", mirror.display()));
                clone.path_arg(&mirror)
            }
            None if self.kitchen.config().offline => {
                return Err(Error::FetchError(
                    "Offline mode needs a source cache with a mirror of the repository".to_string(),
                ));
            }
            None => {
                let url = self.recipe.source_url();
                info!("Checking out {} from {}", tag, url);
                clone.args(["--depth", "1"]).arg(url)
            }
        };
        let clone = clone.path_arg(&dest);

        self.run_tool(&format!("git clone {}", tag), &clone, Error::FetchError)?;

        if !dest.is_dir() {
            return Err(Error::FetchError(format!(
                "Checkout of {} did not produce folder {}",
                tag,
                dest.display()
            )));
        }

        self.log_line(&format!("Fetched source: {} ({})", self.recipe.source_url(), tag));
        Ok(())
    }
}
