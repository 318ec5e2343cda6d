//! Stamps the binary with its build time and source revision for `--version`.

use std::process::Command;

const BUILD_VARS: [&str; 2] = ["BUILD_DATETIME", "BUILD_GIT_HASH"];

fn main() {
    let built_at = env_override("BUILD_DATETIME")
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string());
    let revision = env_override("BUILD_GIT_HASH")
        .or_else(source_revision)
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=BUILD_DATETIME={built_at}");
    println!("cargo:rustc-env=BUILD_GIT_HASH={revision}");

    println!("cargo:rerun-if-changed=build.rs");
    for var in BUILD_VARS {
        println!("cargo:rerun-if-env-changed={var}");
    }
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Abbreviated commit, `-dirty` when the work tree has local edits.
/// `None` outside a git checkout, e.g. when built from a published crate.
fn source_revision() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|revision| !revision.is_empty())
}
