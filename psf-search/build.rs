//! Build identification for psf-search
//!
//! Exposes `GIT_HASH`, `BUILD_TIMESTAMP` and `BUILD_PROFILE` to the crate
//! through `env!`. The root page and the startup log print them.

use std::process::Command;

const UNKNOWN: &str = "unknown";

/// Trimmed stdout of a command, if it ran and succeeded
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn set_env(name: &str, value: &str) {
    println!("cargo:rustc-env={}={}", name, value);
}

fn main() {
    // "-dirty" marks builds from a modified working tree
    let git_hash = command_output("git", &["describe", "--always", "--dirty", "--abbrev=8"])
        .unwrap_or_else(|| UNKNOWN.to_string());

    let build_timestamp = chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| UNKNOWN.to_string());

    set_env("GIT_HASH", &git_hash);
    set_env("BUILD_TIMESTAMP", &build_timestamp);
    set_env("BUILD_PROFILE", &profile);
}
