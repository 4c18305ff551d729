// build.rs

use std::env;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    // --- 1. Build date, honouring reproducible-build conventions ---
    let epoch = env::var("SOURCE_DATE_EPOCH").unwrap_or_else(|_| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs().to_string())
            .unwrap_or_else(|_| "0".to_string())
    });
    let build_date = epoch
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|date| date.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or(epoch);

    // --- 2. Target system and profile are provided by Cargo ---
    let build_system = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    let build_options = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    // --- 3. Ask the compiler Cargo is using for its version string ---
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let build_compiler = Command::new(rustc)
        .arg("--version")
        .output()
        .ok()
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "rustc".to_string());

    println!("cargo:rustc-env=STAGEKIT_BUILD_DATE={}", build_date);
    println!("cargo:rustc-env=STAGEKIT_BUILD_SYSTEM={}", build_system);
    println!("cargo:rustc-env=STAGEKIT_BUILD_COMPILER={}", build_compiler);
    println!("cargo:rustc-env=STAGEKIT_BUILD_OPTIONS={}", build_options);

    // --- 4. Inform Cargo about rerun triggers ---
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-changed=build.rs");
}
