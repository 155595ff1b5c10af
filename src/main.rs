// src/main.rs

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::CookArgs;

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Cook {
            config,
            output,
            work_root,
            source_cache,
            no_source_cache,
            jobs,
            keep_builddir,
            offline,
        }) => commands::cmd_cook(
            &config,
            &CookArgs {
                output,
                work_root,
                source_cache,
                no_source_cache,
                jobs,
                keep_builddir,
                offline,
            },
        ),
        Some(Commands::Source {
            config,
            source_folder,
        }) => commands::cmd_source(&config, &source_folder),
        Some(Commands::Build {
            config,
            source_folder,
            build_folder,
            jobs,
        }) => commands::cmd_build(&config, &source_folder, &build_folder, jobs),
        Some(Commands::Package {
            config,
            source_folder,
            build_folder,
            package_folder,
        }) => commands::cmd_package(&config, &source_folder, &build_folder, &package_folder),
        Some(Commands::Info { config }) => commands::cmd_info(&config),
        Some(Commands::Inspect { recipe }) => commands::cmd_inspect(recipe.as_deref()),
        Some(Commands::Check { config }) => commands::cmd_check(&config),
        Some(Commands::Fetch {
            recipe,
            source_cache,
        }) => commands::cmd_fetch(recipe.as_deref(), source_cache.as_deref()),
        None => {
            // No command provided, show help
            println!("libevent-kitchen v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'libevent-kitchen --help' for usage information");
            Ok(())
        }
    }
}
