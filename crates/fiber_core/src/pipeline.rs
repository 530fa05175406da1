//! Pipeline orchestration.
//!
//! Sequences the root task before all leaf tasks, dispatches leaves either
//! one at a time or through a bounded worker pool, retries each task with a
//! fixed delay, and aggregates per-path results. Partial failure is a
//! reported condition, never a fatal one.

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::context::PipelineContext;
use crate::plan::{ProjectPlan, ROOT_FILE};
use crate::task::GenerationTask;

/// Upper bound on concurrent leaf workers.
const MAX_WORKERS: usize = 10;

/// How leaf tasks are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// One at a time, in declaration order.
    Sequential,
    /// Bounded worker pool; completion order is unspecified.
    Parallel { max_workers: usize },
}

impl DispatchMode {
    /// Parallel mode bounded by min(10, number of leaf tasks).
    pub fn parallel_for(leaf_count: usize) -> Self {
        Self::Parallel {
            max_workers: MAX_WORKERS.min(leaf_count.max(1)),
        }
    }
}

/// Per-task retry policy: bounded attempts with a fixed delay in between.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Outcome of one generation task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    pub target_path: String,
    pub succeeded: bool,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Aggregated outcome of a run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub results: Vec<TaskResult>,
}

impl RunSummary {
    fn record(&mut self, result: TaskResult) {
        self.results.push(result);
    }

    /// Results for paths that generated successfully.
    pub fn succeeded(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.iter().filter(|r| r.succeeded)
    }

    /// Results for paths that exhausted their retries.
    pub fn failed(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.iter().filter(|r| !r.succeeded)
    }

    pub fn succeeded_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }
}

/// Orchestrates one generation run over a plan.
pub struct PipelineOrchestrator {
    ctx: PipelineContext,
    mode: DispatchMode,
    retry: RetryPolicy,
    exclusions: HashSet<String>,
    include_root_context: bool,
}

impl PipelineOrchestrator {
    /// Create an orchestrator with sequential dispatch and default retry.
    pub fn new(ctx: PipelineContext) -> Self {
        Self {
            ctx,
            mode: DispatchMode::Sequential,
            retry: RetryPolicy::default(),
            exclusions: HashSet::new(),
            include_root_context: false,
        }
    }

    /// Set the dispatch mode.
    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Paths the template already supplies; they are never regenerated.
    pub fn with_exclusions(mut self, exclusions: HashSet<String>) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Feed the generated root file to leaf tasks as extra context.
    ///
    /// Best effort: leaves proceed without it when the root is absent.
    pub fn with_root_context(mut self, enabled: bool) -> Self {
        self.include_root_context = enabled;
        self
    }

    /// Run the two-phase pipeline: root first, then every non-excluded leaf.
    pub async fn run(&self, plan: &ProjectPlan) -> RunSummary {
        let mut summary = RunSummary::default();

        // Phase 1: the root must complete, successfully or not, before any
        // leaf is dispatched.
        if self.exclusions.contains(ROOT_FILE) {
            info!("Root file {} is excluded, skipping", ROOT_FILE);
        } else {
            let result = self
                .run_with_retry(GenerationTask::root(plan), plan, None)
                .await;
            summary.record(result);
        }

        let root_context = self.read_root_context();

        let leaves: Vec<GenerationTask> = plan
            .leaf_paths(&self.exclusions)
            .map(|path| {
                GenerationTask::leaf(
                    path,
                    plan.description(path).unwrap_or("No description provided"),
                )
            })
            .collect();

        info!(
            "Phase 2: dispatching {} leaf tasks ({})",
            leaves.len(),
            match self.mode {
                DispatchMode::Sequential => "sequential".to_string(),
                DispatchMode::Parallel { max_workers } =>
                    format!("parallel, {} workers", max_workers),
            }
        );

        match self.mode {
            DispatchMode::Sequential => {
                for task in leaves {
                    let result = self
                        .run_with_retry(task, plan, root_context.as_deref())
                        .await;
                    summary.record(result);
                }
            }
            DispatchMode::Parallel { max_workers } => {
                let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
                let mut inflight = FuturesUnordered::new();

                for task in leaves {
                    let semaphore = semaphore.clone();
                    let root_context = root_context.as_deref();
                    inflight.push(async move {
                        let _permit = semaphore
                            .acquire()
                            .await
                            .expect("worker semaphore is never closed");
                        self.run_with_retry(task, plan, root_context).await
                    });
                }

                // Results arrive in completion order, not submission order
                while let Some(result) = inflight.next().await {
                    summary.record(result);
                }
            }
        }

        info!(
            "Run complete: {} succeeded, {} failed",
            summary.succeeded_count(),
            summary.failed_count()
        );
        summary
    }

    fn read_root_context(&self) -> Option<String> {
        if !self.include_root_context {
            return None;
        }
        fs::read_to_string(self.ctx.resolve(ROOT_FILE))
            .ok()
            .filter(|content| !content.trim().is_empty())
    }

    async fn run_with_retry(
        &self,
        task: GenerationTask,
        plan: &ProjectPlan,
        root_context: Option<&str>,
    ) -> TaskResult {
        let target_path = task.target_path().to_string();
        let mut last_error = None;

        for attempt in 1..=self.retry.max_attempts {
            match task.execute(&self.ctx, plan, root_context).await {
                Ok(()) => {
                    info!("Generated {} on attempt {}", target_path, attempt);
                    return TaskResult {
                        target_path,
                        succeeded: true,
                        attempts: attempt,
                        last_error: None,
                    };
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt, self.retry.max_attempts, target_path, e
                    );
                    last_error = Some(e.to_string());
                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        TaskResult {
            target_path,
            succeeded: false,
            attempts: self.retry.max_attempts,
            last_error,
        }
    }
}
