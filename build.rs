//! Build script for mamdani
//!
//! Embeds version and target information for the CLI banner.

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Set version for embedding
    if let Ok(version) = env::var("CARGO_PKG_VERSION") {
        println!("cargo:rustc-env=MAMDANI_VERSION={}", version);
    }

    // Emit target info
    if let Ok(target) = env::var("TARGET") {
        println!("cargo:rustc-env=MAMDANI_TARGET={}", target);
    }
}
