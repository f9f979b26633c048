//! Build script for sfx-trim
//!
//! Embeds build identification shown by `sfx-trim --version`:
//! `GIT_HASH` (short commit or "unknown"), `BUILD_TIMESTAMP` (RFC 3339, UTC)
//! and `BUILD_PROFILE` (debug/release).

use std::process::Command;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_owned())
}

fn main() {
    let hash = git_short_hash().unwrap_or_else(|| "unknown".to_owned());
    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_owned());

    println!("cargo:rustc-env=GIT_HASH={hash}");
    println!("cargo:rustc-env=BUILD_TIMESTAMP={built_at}");
    println!("cargo:rustc-env=BUILD_PROFILE={profile}");
}
