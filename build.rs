// build.rs
//
// Stamps the build time into OUT_DIR/build_info.rs for the startup banner.

use chrono::Utc;
use std::{env, fs, path::PathBuf};

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let build_date = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

    fs::write(
        out_dir.join("build_info.rs"),
        format!("pub const BUILD_DATE: &str = \"{build_date}\";\n"),
    )
    .expect("write build_info.rs");

    println!("cargo:rerun-if-changed=build.rs");
}
