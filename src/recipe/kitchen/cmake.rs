// src/recipe/kitchen/cmake.rs

//! Build stage: CMake configure and build
//!
//! The option set is translated into `-D` cache definitions. Before CMake
//! runs, a `kitchenbuildinfo.cmake` file is written into the build folder
//! with the include and library directories of the resolved requirements.
//! The patched upstream CMakeLists includes it and calls
//! `kitchen_basic_setup()`.

use crate::error::{Error, Result};
use crate::recipe::configure::Configuration;
use crate::recipe::format::Recipe;
use crate::recipe::options::OptionValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::cook::Cook;
use super::runner::Invocation;

/// Generated CMake include, written into the build folder
pub const BUILD_INFO_FILE: &str = "kitchenbuildinfo.cmake";

fn on_off(enabled: bool) -> String {
    if enabled { "ON" } else { "OFF" }.to_string()
}

fn cmake_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// CMake cache definitions for one configuration
pub fn definitions(recipe: &Recipe, configuration: &Configuration) -> BTreeMap<String, String> {
    let options = &configuration.options;
    let mut defs = BTreeMap::new();

    defs.insert(
        "CMAKE_BUILD_TYPE".to_string(),
        configuration.settings.build_type.to_string(),
    );
    defs.insert(
        "BUILD_SHARED_LIBS".to_string(),
        on_off(options.get_bool("shared")),
    );
    if options.contains("fPIC") {
        defs.insert(
            "CMAKE_POSITION_INDEPENDENT_CODE".to_string(),
            on_off(options.get_bool("fPIC")),
        );
    }

    for (key, value) in &recipe.build.definitions {
        defs.insert(key.clone(), recipe.substitute(value));
    }

    for mapping in &recipe.build.option_map {
        // Removed options leave the upstream default alone
        let value = match options.get(&mapping.option) {
            Some(OptionValue::Bool(enabled)) => mapping.value_for(*enabled),
            Some(OptionValue::Text(text)) => text.clone(),
            None => continue,
        };
        defs.insert(mapping.variable.clone(), value);
    }

    let sanitizers: Vec<&str> = recipe
        .options
        .iter()
        .filter(|(name, _)| options.get_bool(name))
        .filter_map(|(_, decl)| decl.sanitizer.as_deref())
        .collect();
    if !sanitizers.is_empty() {
        let fsanitize = format!("-fsanitize={}", sanitizers.join(","));
        defs.insert(
            "CMAKE_C_FLAGS".to_string(),
            format!("{} -fno-omit-frame-pointer", fsanitize),
        );
        defs.insert("CMAKE_EXE_LINKER_FLAGS".to_string(), fsanitize.clone());
        defs.insert("CMAKE_SHARED_LINKER_FLAGS".to_string(), fsanitize);
    }

    for req in &configuration.requires {
        if let Some(var) = &req.cmake_root {
            defs.insert(var.clone(), cmake_path(&req.path));
        }
    }
    if !configuration.requires.is_empty() {
        let prefixes: Vec<String> = configuration
            .requires
            .iter()
            .map(|r| cmake_path(&r.path))
            .collect();
        defs.insert("CMAKE_PREFIX_PATH".to_string(), prefixes.join(";"));
    }

    defs
}

/// `cmake -S <src> -B <build> [-G <generator>] -D...`
pub fn configure_invocation(
    cmake: &str,
    source_dir: &Path,
    build_dir: &Path,
    generator: Option<&str>,
    defs: &BTreeMap<String, String>,
) -> Invocation {
    let mut invocation = Invocation::new(cmake)
        .arg("-S")
        .path_arg(source_dir)
        .arg("-B")
        .path_arg(build_dir);

    if let Some(generator) = generator {
        invocation = invocation.arg("-G").arg(generator);
    }

    invocation.args(defs.iter().map(|(k, v)| format!("-D{}={}", k, v)))
}

/// `cmake --build <build> --config <type> --parallel <jobs>`
pub fn build_invocation(cmake: &str, build_dir: &Path, build_type: &str, jobs: u32) -> Invocation {
    Invocation::new(cmake)
        .arg("--build")
        .path_arg(build_dir)
        .args(["--config", build_type, "--parallel"])
        .arg(jobs.to_string())
}

/// Contents of the generated build info include
pub fn render_build_info(recipe: &Recipe, configuration: &Configuration) -> String {
    let include_dirs: Vec<String> = configuration
        .requires
        .iter()
        .map(|r| cmake_path(&r.path.join("include")))
        .collect();
    let lib_dirs: Vec<String> = configuration
        .requires
        .iter()
        .map(|r| cmake_path(&r.path.join("lib")))
        .collect();

    let mut out = format!(
        "# Generated by libevent-kitchen for {} ({})\n\n",
        recipe.reference(),
        configuration.package_id
    );

    for req in &configuration.requires {
        out.push_str(&format!(
            "set(KITCHEN_{}_ROOT \"{}\")\n",
            req.name.to_ascii_uppercase().replace('-', "_"),
            cmake_path(&req.path)
        ));
    }
    out.push_str(&format!(
        "set(KITCHEN_INCLUDE_DIRS \"{}\")\n",
        include_dirs.join(";")
    ));
    out.push_str(&format!("set(KITCHEN_LIB_DIRS \"{}\")\n\n", lib_dirs.join(";")));

    out.push_str(
        "macro(kitchen_basic_setup)\n\
         \x20   if(KITCHEN_INCLUDE_DIRS)\n\
         \x20       include_directories(${KITCHEN_INCLUDE_DIRS})\n\
         \x20   endif()\n\
         \x20   if(KITCHEN_LIB_DIRS)\n\
         \x20       link_directories(${KITCHEN_LIB_DIRS})\n\
         \x20   endif()\n\
         endmacro()\n",
    );

    out
}

impl Cook<'_> {
    /// Stage: configure and build with CMake
    pub fn build(&mut self) -> Result<()> {
        let build_dir = self.layout.build_dir.clone();
        fs::create_dir_all(&build_dir).map_err(|e| {
            Error::BuildError(format!(
                "Failed to create build folder {}: {}",
                build_dir.display(),
                e
            ))
        })?;

        let info_path = build_dir.join(BUILD_INFO_FILE);
        fs::write(&info_path, render_build_info(self.recipe, self.configuration)).map_err(|e| {
            Error::BuildError(format!("Failed to write {}: {}", info_path.display(), e))
        })?;
        debug!("Wrote {}", info_path.display());

        let config = self.kitchen.config();
        let defs = definitions(self.recipe, self.configuration);
        let settings = &self.configuration.settings;
        let jobs = config.build_jobs(self.recipe.build.jobs);

        let configure = configure_invocation(
            &config.cmake,
            &self.layout.source_dir,
            &build_dir,
            settings.generator.as_deref(),
            &defs,
        );
        let build = build_invocation(
            &config.cmake,
            &build_dir,
            &settings.build_type.to_string(),
            jobs,
        );

        self.run_tool("cmake configure", &configure, Error::BuildError)?;
        self.run_tool("cmake build", &build, Error::BuildError)?;

        self.log_line(&format!("Built with {} job(s)", jobs));
        Ok(())
    }
}
