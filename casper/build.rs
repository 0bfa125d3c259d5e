//! Build script for casper
//! Stamps the binary with the commit and build date shown by `casper version`

use chrono::Utc;
use std::process::Command;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!hash.is_empty()).then_some(hash)
}

fn main() {
    let git_hash = git_short_hash().unwrap_or_else(|| "unknown".to_string());
    let build_time = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

    println!("cargo:rustc-env=CASPER_GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=CASPER_BUILD_TIME={}", build_time);

    println!("cargo:rerun-if-changed=../.git/HEAD");
}
