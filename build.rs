//! Build script for the fight-stick firmware.
//!
//! Places `memory.x` where the `cortex-m-rt` linker script can find it and
//! adds the RP2040 and defmt linker scripts.

use std::{env, fs, path::PathBuf};

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let target = env::var("TARGET").unwrap_or_default();

    // Host builds of the library (IDEs, docs) do not link.
    if !target.starts_with("thumbv6m") {
        return;
    }

    let memory_x = fs::read_to_string("memory.x").expect("Failed to read memory.x");
    fs::write(out_dir.join("memory.x"), memory_x).expect("Failed to write memory.x");
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
