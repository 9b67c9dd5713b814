//! Build script for the VorPlay service.
//!
//! Copies the `.env.example` template into the platform data directory so a
//! fresh install finds a configuration skeleton next to the `.env` the
//! service reads at startup:
//!
//! - Linux: `~/.local/share/vorplay/.env.example`
//! - macOS: `~/Library/Application Support/vorplay/.env.example`
//! - Windows: `%LOCALAPPDATA%/vorplay/.env.example`
//!
//! A missing template only produces a cargo warning. Directory or write
//! failures abort the build.

use std::{env, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");
    println!("cargo:rerun-if-changed=migrations");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("vorplay");
    fs::create_dir_all(&out_dir)?;

    if env_example_path.is_file() {
        let contents = fs::read_to_string(&env_example_path)?;
        fs::write(out_dir.join(".env.example"), contents)?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
    }

    Ok(())
}
