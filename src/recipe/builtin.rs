// src/recipe/builtin.rs

//! Recipes shipped inside the binary

use crate::error::Result;
use crate::recipe::format::Recipe;
use crate::recipe::parser::parse_recipe;

/// The libevent recipe from `recipes/libevent.toml`
pub const LIBEVENT_RECIPE: &str = include_str!("../../recipes/libevent.toml");

/// Parse the embedded libevent recipe
pub fn libevent() -> Result<Recipe> {
    parse_recipe(LIBEVENT_RECIPE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::format::HeaderRoot;

    #[test]
    fn test_libevent_recipe_shape() {
        let recipe = libevent().unwrap();

        assert_eq!(recipe.package.name, "libevent");
        assert_eq!(recipe.tag(), format!("release-{}-stable", recipe.package.version));
        assert_eq!(recipe.source.folder, "libevent");

        for option in [
            "shared",
            "fPIC",
            "with_openssl",
            "disable_threads",
            "enable_ubsan",
            "enable_asan",
            "enable_msan",
            "enable_tsan",
        ] {
            assert!(recipe.options.contains_key(option), "missing {}", option);
        }

        let build_headers: Vec<&String> = recipe
            .layout
            .headers
            .iter()
            .filter(|g| g.root == HeaderRoot::Build)
            .flat_map(|g| &g.files)
            .collect();
        assert_eq!(build_headers, vec!["include/event2/event-config.h"]);
    }
}
