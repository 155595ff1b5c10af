// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.
//!
//! `FakeRunner` stands in for git, cmake and patch. It records every
//! invocation and produces on disk what the real tools would: a libevent
//! checkout, the generated `event-config.h` and the configured artifacts.

#![allow(dead_code)]

use libevent_kitchen::recipe::{HeaderRoot, Invocation, Os, ToolOutput, ToolRunner};
use libevent_kitchen::{ConfigureRequest, Kitchen, KitchenConfig, Settings};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use walkdir::WalkDir;

/// CMakeLists.txt content of a fake upstream checkout
pub const UPSTREAM_CMAKELISTS: &str = "cmake_minimum_required(VERSION 3.1.2)\n\
                                       project(libevent C)\n\
                                       add_library(event_core STATIC event.c)\n";

pub struct FakeRunner {
    calls: Mutex<Vec<Invocation>>,
    cmakelists: String,
    /// Files created in the build folder by `cmake --build`
    artifacts: Vec<String>,
    /// stderr of a failing `cmake --build`
    build_failure: Option<String>,
}

impl FakeRunner {
    pub fn new(artifacts: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            cmakelists: UPSTREAM_CMAKELISTS.to_string(),
            artifacts: artifacts.iter().map(|s| s.to_string()).collect(),
            build_failure: None,
        }
    }

    /// Upstream checkout with different CMakeLists.txt content
    pub fn with_cmakelists(mut self, content: &str) -> Self {
        self.cmakelists = content.to_string();
        self
    }

    /// Make `cmake --build` fail with this stderr
    pub fn failing_build(mut self, stderr: &str) -> Self {
        self.build_failure = Some(stderr.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }

    fn checkout(&self, dest: &Path) -> io::Result<()> {
        let recipe = libevent_kitchen::recipe::builtin::libevent()
            .map_err(|e| io::Error::other(e.to_string()))?;

        fs::create_dir_all(dest)?;
        fs::write(dest.join("CMakeLists.txt"), &self.cmakelists)?;
        fs::write(dest.join("LICENSE"), "Copyright (c) 2000-2007 Niels Provos\n")?;

        for group in recipe.layout.headers.iter().filter(|g| g.root == HeaderRoot::Source) {
            for file in &group.files {
                let path = dest.join(file);
                fs::create_dir_all(path.parent().unwrap())?;
                fs::write(&path, format!("/* {} */\n", file))?;
            }
        }
        Ok(())
    }
}

fn arg_after(invocation: &Invocation, flag: &str) -> Option<PathBuf> {
    let pos = invocation.args.iter().position(|a| a == flag)?;
    invocation.args.get(pos + 1).map(PathBuf::from)
}

fn last_arg(invocation: &Invocation) -> PathBuf {
    PathBuf::from(invocation.args.last().cloned().unwrap_or_default())
}

impl ToolRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        match invocation.program.as_str() {
            "git" if invocation.has_arg("--mirror") => {
                fs::create_dir_all(last_arg(invocation))?;
            }
            "git" if invocation.has_arg("remote") => {}
            "git" if invocation.has_arg("clone") => {
                self.checkout(&last_arg(invocation))?;
            }
            "cmake" if invocation.has_arg("--build") => {
                if let Some(stderr) = &self.build_failure {
                    return Ok(ToolOutput {
                        code: Some(2),
                        stdout: String::new(),
                        stderr: stderr.clone(),
                    });
                }
                let build_dir = arg_after(invocation, "--build").unwrap();
                for artifact in &self.artifacts {
                    let path = build_dir.join(artifact);
                    fs::create_dir_all(path.parent().unwrap())?;
                    fs::write(&path, format!("artifact {}\n", artifact))?;
                }
            }
            "cmake" => {
                let build_dir = arg_after(invocation, "-B").unwrap();
                let config_h = build_dir.join("include/event2/event-config.h");
                fs::create_dir_all(config_h.parent().unwrap())?;
                fs::write(&config_h, "#define EVENT__HAVE_EPOLL 1\n")?;
            }
            _ => {}
        }

        Ok(ToolOutput {
            code: Some(0),
            stdout: format!("{} ok", invocation.program),
            stderr: String::new(),
        })
    }
}

/// Kitchen rooted in `root` that clones straight from the remote
pub fn kitchen(root: &Path, runner: Arc<FakeRunner>) -> Kitchen {
    let mut config = KitchenConfig::rooted_at(root);
    config.source_cache = None;
    config.jobs = Some(2);
    Kitchen::with_runner(config, runner)
}

pub fn request(os: Os, options: &[(&str, &str)]) -> ConfigureRequest {
    let mut request = ConfigureRequest::new(Settings {
        os,
        ..Settings::detect()
    });
    for (name, value) in options {
        request = request.with_option(name, value);
    }
    request
}

/// Every file below `dir`, relative to it, in name order
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect()
}
