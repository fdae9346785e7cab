fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // The inference shim is built as an ESP-IDF component; only the
    // link-time search path is needed here.
    if std::env::var("CARGO_FEATURE_TFLITE").is_ok() {
        if let Ok(dir) = std::env::var("GRIDGUARD_MODEL_LIB_DIR") {
            println!("cargo:rustc-link-search=native={dir}");
            println!("cargo:rustc-link-lib=static=gridguard_model");
        } else {
            println!("cargo:warning=tflite feature enabled without GRIDGUARD_MODEL_LIB_DIR");
        }
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
