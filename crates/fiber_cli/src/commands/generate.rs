//! Generate command - plan, generate and serve an application.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use fiber_core::{
    copy_starter, generate_plan, install_dependencies, DispatchMode, PipelineContext,
    PipelineOrchestrator, Scaffolder,
};
use fiber_llm::{LlmError, LlmProvider};
use fiber_server::{
    find_available_port, launch, open_in_browser, server_url, wait_until_ready,
    write_port_config, LaunchSpec, DEFAULT_PORT,
};

/// Template-supplied files that must never be regenerated.
const TEMPLATE_FILES: [&str; 2] = ["index.html", "src/index.jsx"];

const PORT_ATTEMPTS: u16 = 10;
const READINESS_ATTEMPTS: u32 = 30;
const READINESS_DELAY: Duration = Duration::from_secs(1);

#[derive(Args)]
pub struct GenerateArgs {
    /// Description of the project to generate
    #[arg(short, long)]
    prompt: String,

    /// Starter template directory
    #[arg(long, default_value = "starter")]
    starter: PathBuf,

    /// Output directory for the generated project
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Generation provider (openai, anthropic); detected from env when omitted
    #[arg(long)]
    provider: Option<String>,

    /// Model override
    #[arg(long)]
    model: Option<String>,

    /// Dispatch leaf generation through a bounded worker pool
    #[arg(long)]
    parallel: bool,

    /// Worker bound in parallel mode (default: min(10, leaf count))
    #[arg(long)]
    workers: Option<usize>,

    /// Feed the generated root file to leaf tasks as extra context
    #[arg(long)]
    root_context: bool,

    /// Skip npm install after copying the starter
    #[arg(long)]
    skip_install: bool,

    /// Do not open the browser when the server is ready
    #[arg(long)]
    no_open: bool,
}

pub async fn execute(args: GenerateArgs) -> Result<()> {
    info!("Generating app from prompt: {}", args.prompt);

    let provider = match &args.provider {
        Some(name) => Some(
            LlmProvider::from_str(name)
                .ok_or_else(|| LlmError::UnknownProvider(name.clone()))?,
        ),
        None => None,
    };
    let generator = fiber_llm::from_env(provider, args.model.clone())
        .context("Failed to configure generation backend")?;

    // Plan the project structure; a malformed plan aborts before any file I/O
    let plan = generate_plan(generator.as_ref(), &args.prompt)
        .await
        .context("Failed to generate project structure")?;

    println!("Planned files:");
    for path in plan.files() {
        println!("  {}", path);
    }

    // Materialize the starter and the declared tree
    copy_starter(&args.starter, &args.output).context("Failed to copy starter template")?;
    if !args.skip_install {
        install_dependencies(&args.output)
            .await
            .context("Failed to install dependencies")?;
    }
    Scaffolder::new(&args.output)
        .materialize(&plan)
        .context("Failed to scaffold project tree")?;

    // Generate: root first, then leaves
    let exclusions: HashSet<String> = TEMPLATE_FILES.iter().map(|s| s.to_string()).collect();
    let leaf_count = plan.leaf_paths(&exclusions).count();
    let mode = if args.parallel {
        match args.workers {
            Some(workers) => DispatchMode::Parallel {
                max_workers: workers.max(1),
            },
            None => DispatchMode::parallel_for(leaf_count),
        }
    } else {
        DispatchMode::Sequential
    };

    let ctx = PipelineContext::new(&args.output, generator);
    let summary = PipelineOrchestrator::new(ctx)
        .with_mode(mode)
        .with_exclusions(exclusions)
        .with_root_context(args.root_context)
        .run(&plan)
        .await;

    println!();
    println!(
        "Generation finished: {} succeeded, {} failed",
        summary.succeeded_count(),
        summary.failed_count()
    );
    for result in summary.failed() {
        println!(
            "  failed: {} after {} attempts ({})",
            result.target_path,
            result.attempts,
            result.last_error.as_deref().unwrap_or("unknown error")
        );
    }

    // Serve the result
    let port = match find_available_port(DEFAULT_PORT, PORT_ATTEMPTS).await {
        Ok(port) => port,
        Err(e) => {
            warn!("{}; falling back to port {}", e, DEFAULT_PORT);
            DEFAULT_PORT
        }
    };
    if port != DEFAULT_PORT {
        write_port_config(&args.output, port).context("Failed to pin dev-server port")?;
    }

    let mut handle = launch(&LaunchSpec::dev_server(&args.output), port)
        .context("Failed to launch dev server")?;
    let url = server_url(port);
    handle.ready = wait_until_ready(&url, READINESS_ATTEMPTS, READINESS_DELAY).await;

    if handle.ready {
        println!("Server is ready at {}", url);
        if !args.no_open {
            if let Err(e) = open_in_browser(&url) {
                warn!("Could not open browser: {}", e);
            }
        }
    } else {
        println!("The server did not report ready in time.");
        println!("You can open {} manually once it finishes starting.", url);
    }

    Ok(())
}
