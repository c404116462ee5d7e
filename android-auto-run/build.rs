use std::env;
use std::process::Command;
use time::OffsetDateTime;

fn main() {
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rustc-env=APP_BUILD_YEAR={}", build_year());

    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    println!("cargo:rustc-env=APP_VERSION_DISPLAY={}", display_version(&version));
}

/// Reproducible builds pin the year through SOURCE_DATE_EPOCH
fn build_year() -> i32 {
    env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(|epoch| OffsetDateTime::from_unix_timestamp(epoch).ok())
        .map_or_else(|| OffsetDateTime::now_utc().year(), |dt| dt.year())
}

/// Release builds and builds of the matching `v<version>` tag report the
/// plain version; anything else is marked `-dev`.
fn display_version(version: &str) -> String {
    if env::var("PROFILE").as_deref() == Ok("release") {
        return version.to_string();
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");

    let on_tag = Command::new("git")
        .args(["describe", "--tags", "--exact-match"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .is_some_and(|tag| tag.trim() == format!("v{version}"));

    if on_tag {
        version.to_string()
    } else {
        format!("{version}-dev")
    }
}
