fn main() {
    // The web UI is embedded with include_dir!, which cargo cannot see
    // through; rebuild whenever the bundle changes.
    println!("cargo:rerun-if-changed=frontend/dist");
    println!("cargo:rerun-if-changed=build.rs");
}
