//! Generates the JNI trampolines into `$OUT_DIR/generated_jni.rs`.

use ksqlite_jnigen::{GeneratorConfig, write_bindings};
use std::env;
use std::path::PathBuf;

fn main() {
    let manifest_dir =
        PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"));
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));

    let config_path = manifest_dir.join("jni-bindings.json");
    println!("cargo:rerun-if-changed={}", config_path.display());
    println!("cargo:rerun-if-changed=build.rs");

    let config = GeneratorConfig::load_or_default(&config_path)
        .unwrap_or_else(|e| panic!("{}: {}", config_path.display(), e));
    let output = out_dir.join("generated_jni.rs");
    if let Err(e) = write_bindings(&output, &config) {
        panic!("failed to generate JNI bindings: {}", e);
    }
}
