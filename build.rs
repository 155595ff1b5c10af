// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: recipe file
fn recipe_arg() -> Arg {
    Arg::new("recipe")
        .short('r')
        .long("recipe")
        .value_name("PATH")
        .help("Recipe file (default: the built-in libevent recipe)")
}

/// Common arguments: options, settings, profile and dependencies
fn config_args() -> Vec<Arg> {
    vec![
        recipe_arg(),
        Arg::new("profile")
            .long("profile")
            .value_name("PATH")
            .help("Profile file with [settings] and [options] tables"),
        Arg::new("option")
            .short('o')
            .long("option")
            .value_name("NAME=VALUE")
            .action(ArgAction::Append)
            .help("Set an option, e.g. -o shared=True"),
        Arg::new("setting")
            .short('s')
            .long("setting")
            .value_name("KEY=VALUE")
            .action(ArgAction::Append)
            .help("Set a setting, e.g. -s os=Windows"),
        Arg::new("dep")
            .long("dep")
            .value_name("NAME=PATH")
            .action(ArgAction::Append)
            .help("Install path of a requirement, e.g. --dep openssl=/opt/openssl"),
    ]
}

fn folder_arg(name: &'static str, long: &'static str, default: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(long).default_value(default).help(help)
}

fn jobs_arg() -> Arg {
    Arg::new("jobs")
        .short('j')
        .long("jobs")
        .help("Number of parallel build jobs; overrides the recipe (default: recipe, else number of CPUs)")
}

fn build_cli() -> Command {
    Command::new("libevent-kitchen")
        .version(env!("CARGO_PKG_VERSION"))
        .author("libevent-kitchen Contributors")
        .about("Fetch, patch, build and package libevent with CMake")
        .subcommand_required(false)
        .subcommand(
            Command::new("cook")
                .about("Cook a package: configure, source, patch, build, package, export")
                .args(config_args())
                .arg(Arg::new("output").long("output").help("Package store root"))
                .arg(
                    Arg::new("work_root")
                        .long("work-root")
                        .help("Root for isolated work directories"),
                )
                .arg(
                    Arg::new("source_cache")
                        .long("source-cache")
                        .help("Directory for git mirrors of upstream repositories"),
                )
                .arg(
                    Arg::new("no_source_cache")
                        .long("no-source-cache")
                        .action(ArgAction::SetTrue)
                        .help("Clone straight from the remote instead of a cached mirror"),
                )
                .arg(jobs_arg())
                .arg(
                    Arg::new("keep_builddir")
                        .long("keep-builddir")
                        .action(ArgAction::SetTrue)
                        .help("Keep the work directory after cooking"),
                )
                .arg(
                    Arg::new("offline")
                        .long("offline")
                        .action(ArgAction::SetTrue)
                        .help("Never contact the remote; requires a cached mirror"),
                ),
        )
        .subcommand(
            Command::new("source")
                .about("Fetch and patch the source into a folder")
                .args(config_args())
                .arg(folder_arg("source_folder", "source-folder", "source", "Folder the checkout is placed in")),
        )
        .subcommand(
            Command::new("build")
                .about("Build a fetched source folder with CMake")
                .args(config_args())
                .arg(folder_arg("source_folder", "source-folder", "source", "Folder holding the checkout"))
                .arg(folder_arg("build_folder", "build-folder", "build", "CMake build folder"))
                .arg(jobs_arg()),
        )
        .subcommand(
            Command::new("package")
                .about("Package a built tree and export its info")
                .args(config_args())
                .arg(folder_arg("source_folder", "source-folder", "source", "Folder holding the checkout"))
                .arg(folder_arg("build_folder", "build-folder", "build", "CMake build folder"))
                .arg(folder_arg("package_folder", "package-folder", "package", "Folder the package is assembled in")),
        )
        .subcommand(
            Command::new("info")
                .about("Print the exported package info as JSON without building")
                .args(config_args()),
        )
        .subcommand(
            Command::new("inspect")
                .about("Show recipe identity, options and defaults")
                .arg(recipe_arg()),
        )
        .subcommand(
            Command::new("check")
                .about("Configure only: print the normalized options and the package id")
                .args(config_args()),
        )
        .subcommand(
            Command::new("fetch")
                .about("Mirror the upstream repository into the source cache")
                .arg(recipe_arg())
                .arg(
                    Arg::new("source_cache")
                        .long("source-cache")
                        .help("Directory for git mirrors of upstream repositories"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("libevent-kitchen.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
