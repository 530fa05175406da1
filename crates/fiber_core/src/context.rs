//! Run configuration threaded through the pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fiber_llm::TextGenerator;

/// Explicit configuration for one generation run.
///
/// Everything a component needs is carried here instead of living in
/// process-wide state: the output root all relative paths resolve against,
/// and the generator handle.
#[derive(Clone)]
pub struct PipelineContext {
    output_root: PathBuf,
    generator: Arc<dyn TextGenerator>,
}

impl PipelineContext {
    pub fn new(output_root: impl Into<PathBuf>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            output_root: output_root.into(),
            generator,
        }
    }

    /// Directory all declared paths are rooted at.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Resolve a declared relative path against the output root.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.output_root.join(relative)
    }

    pub fn generator(&self) -> &dyn TextGenerator {
        self.generator.as_ref()
    }
}
