// Build script for linking the Embree library
//
// Only needed with the `embree` feature.
// Windows: vcpkg install embree[geometry-triangle]:x64-windows
// Linux/macOS: install embree4 through the system package manager

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=EMBREE_DIR");

    if std::env::var_os("CARGO_FEATURE_EMBREE").is_none() {
        return;
    }

    // Embree 4 library name (vcpkg installs embree4.lib)
    println!("cargo:rustc-link-lib=embree4");

    if let Ok(embree_dir) = std::env::var("EMBREE_DIR") {
        println!("cargo:rustc-link-search=native={}/lib", embree_dir);
    } else if let Ok(vcpkg_root) = std::env::var("VCPKG_ROOT") {
        let lib_path = format!("{}\\installed\\x64-windows\\lib", vcpkg_root);
        println!("cargo:rustc-link-search=native={}", lib_path);
    }
}
