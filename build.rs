fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Stamp the binary so `--version` shows when it was built
    let build_time = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    println!("cargo:rustc-env=BUILD_TIME={}", build_time);
}
