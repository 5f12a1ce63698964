// SPDX-License-Identifier: MPL-2.0

use std::process::Command;

fn main() {
    // Re-run build script if git HEAD changes
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=CAMERA_PREVIEW_VERSION");

    // Packagers may pin the version explicitly
    let version = std::env::var("CAMERA_PREVIEW_VERSION").unwrap_or_else(|_| describe_version());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Build a version string from `git describe`, falling back to the crate version.
///
/// - "0.1.0-abcdef1" when HEAD sits on a tag
/// - "0.1.0-dirty-abcdef1" when HEAD is ahead of the tag
fn describe_version() -> String {
    let crate_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".into());

    let described = Command::new("git")
        .args(["describe", "--tags", "--always", "--match", "v*"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string());

    let Some(described) = described else {
        return crate_version;
    };

    let described = described.strip_prefix('v').unwrap_or(&described);
    let Some(commit_hash) = commit_hash() else {
        return described.to_string();
    };

    let parts: Vec<&str> = described.rsplitn(3, '-').collect();
    match parts.as_slice() {
        [hash, _commits, base] => {
            let hash = hash.strip_prefix('g').unwrap_or(hash);
            format!("{}-dirty-{}", base, hash)
        }
        // No tag reachable: describe printed the bare hash
        _ if described == commit_hash => format!("{}-{}", crate_version, commit_hash),
        _ => format!("{}-{}", described, commit_hash),
    }
}

fn commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}
