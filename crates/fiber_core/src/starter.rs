//! Starter template handling.
//!
//! The starter is a complete Vite + React Three Fiber project checked into
//! the repository. A run begins by copying it into the output directory and
//! installing its npm dependencies; generation then fills in the declared
//! files on top.

use std::fs;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{CoreError, CoreResult};

/// Entries never copied from the starter tree.
const SKIPPED_ENTRIES: [&str; 2] = ["node_modules", "package-lock.json"];

/// Copy the starter tree into the output directory.
///
/// A pre-existing output directory is removed first so every run starts from
/// a clean copy. `node_modules` and `package-lock.json` are skipped.
pub fn copy_starter(starter_dir: &Path, output_dir: &Path) -> CoreResult<()> {
    if !starter_dir.is_dir() {
        return Err(CoreError::StarterMissing(starter_dir.to_path_buf()));
    }

    if output_dir.exists() {
        fs::remove_dir_all(output_dir)?;
    }
    fs::create_dir_all(output_dir)?;

    info!("Copying starter {:?} to {:?}", starter_dir, output_dir);

    for entry in WalkDir::new(starter_dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| {
            e.file_name()
                .to_str()
                .map(|name| !SKIPPED_ENTRIES.contains(&name))
                .unwrap_or(true)
        })
        .filter_map(|e| e.ok())
    {
        let source = entry.path();
        let relative = source.strip_prefix(starter_dir).unwrap_or(source);
        let target = output_dir.join(relative);

        if source.is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(source, &target)?;
            debug!("Copied: {:?}", relative);
        }
    }

    Ok(())
}

/// Run `npm install` in the output directory with suppressed output.
pub async fn install_dependencies(output_dir: &Path) -> CoreResult<()> {
    info!("Installing dependencies in {:?}", output_dir);

    let npm = if cfg!(windows) { "npm.cmd" } else { "npm" };
    let status = Command::new(npm)
        .arg("install")
        .current_dir(output_dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| CoreError::InstallFailed(e.to_string()))?;

    if !status.success() {
        return Err(CoreError::InstallFailed(format!(
            "npm install exited with {}",
            status.code().unwrap_or(-1)
        )));
    }

    info!("Dependencies installed");
    Ok(())
}
