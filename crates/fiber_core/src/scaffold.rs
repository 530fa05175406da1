//! Project tree scaffolding.
//!
//! Materializes the empty directory/file skeleton for a plan before any
//! content generation happens.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::CoreResult;
use crate::plan::ProjectPlan;

/// Scaffold generator rooted at an output directory.
pub struct Scaffolder {
    output_root: PathBuf,
}

impl Scaffolder {
    /// Create a new scaffolder.
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    /// Ensure every declared path exists as an empty file.
    ///
    /// Containing directories are created recursively. Existing files are
    /// never truncated or overwritten, so re-running on an already
    /// scaffolded tree is a no-op.
    pub fn materialize(&self, plan: &ProjectPlan) -> CoreResult<()> {
        info!("Scaffolding {} files at {:?}", plan.len(), self.output_root);

        for path in plan.files() {
            let target = self.output_root.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            if !target.exists() {
                fs::File::create(&target)?;
                debug!("Created empty file: {}", path);
            }
        }

        Ok(())
    }
}
