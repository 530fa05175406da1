//! Port selection, process launch and readiness polling.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{ServerError, ServerResult};

/// Vite's default dev-server port.
pub const DEFAULT_PORT: u16 = 5173;

const PROBE_TIMEOUT: Duration = Duration::from_millis(250);

/// Command line for the dev-server process.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: std::path::PathBuf,
}

impl LaunchSpec {
    /// `npm run dev` in the given project directory.
    pub fn dev_server(cwd: impl Into<std::path::PathBuf>) -> Self {
        let npm = if cfg!(windows) { "npm.cmd" } else { "npm" };
        Self {
            program: npm.to_string(),
            args: vec!["run".to_string(), "dev".to_string()],
            cwd: cwd.into(),
        }
    }
}

/// A launched dev-server process.
///
/// Owned by the lifecycle manager from launch until the orchestrating
/// process exits; no graceful shutdown is modeled.
pub struct ServerHandle {
    pub port: u16,
    pub ready: bool,
    child: Child,
}

impl ServerHandle {
    /// OS process id, if the child is still running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

/// URL the dev server serves on.
pub fn server_url(port: u16) -> String {
    format!("http://localhost:{}", port)
}

/// Probe ports starting at `start`, incrementing by one, and return the
/// first where a TCP connect fails (port free).
///
/// Returns [`ServerError::PortExhausted`] when the attempt budget runs out;
/// callers degrade to the start port on that error.
pub async fn find_available_port(start: u16, max_attempts: u16) -> ServerResult<u16> {
    for offset in 0..max_attempts {
        let port = match start.checked_add(offset) {
            Some(port) => port,
            None => break,
        };
        match timeout(PROBE_TIMEOUT, TcpStream::connect(("127.0.0.1", port))).await {
            Ok(Ok(_)) => debug!("Port {} is in use", port),
            _ => {
                info!("Selected port {}", port);
                return Ok(port);
            }
        }
    }
    Err(ServerError::PortExhausted {
        start,
        attempts: max_attempts,
    })
}

/// Start the dev-server process detached, with its output redirected away
/// from the controlling terminal.
///
/// A launch failure is fatal to the run: it is surfaced, never retried.
pub fn launch(spec: &LaunchSpec, port: u16) -> ServerResult<ServerHandle> {
    info!(
        "Launching dev server: {} {} in {:?}",
        spec.program,
        spec.args.join(" "),
        spec.cwd
    );

    let child = Command::new(&spec.program)
        .args(&spec.args)
        .current_dir(&spec.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(false)
        .spawn()
        .map_err(ServerError::LaunchFailed)?;

    Ok(ServerHandle {
        port,
        ready: false,
        child,
    })
}

/// Poll `url` at fixed intervals until it answers with a non-error status
/// (< 400) or `max_attempts` probes have been made.
///
/// Returns whether the server became ready. The process is left running
/// either way; its lifetime is not tied to readiness.
pub async fn wait_until_ready(url: &str, max_attempts: u32, delay: Duration) -> bool {
    info!("Waiting for server at {} to start", url);

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(1))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!("Could not build readiness probe client: {}", e);
            return false;
        }
    };

    for attempt in 1..=max_attempts {
        match client.get(url).send().await {
            Ok(response) if response.status().as_u16() < 400 => {
                info!("Server is ready after {} attempts", attempt);
                return true;
            }
            Ok(response) => {
                debug!("Attempt {}: server answered {}", attempt, response.status());
            }
            Err(_) => {
                if attempt % 5 == 1 {
                    info!("Waiting for server... (attempt {}/{})", attempt, max_attempts);
                }
            }
        }
        if attempt < max_attempts {
            tokio::time::sleep(delay).await;
        }
    }

    warn!("Server did not start within the expected time");
    false
}

/// Open a URL in the platform's default browser, best effort.
pub fn open_in_browser(url: &str) -> ServerResult<()> {
    let (program, args): (&str, Vec<&str>) = if cfg!(target_os = "windows") {
        ("cmd", vec!["/C", "start", "", url])
    } else if cfg!(target_os = "macos") {
        ("open", vec![url])
    } else {
        ("xdg-open", vec![url])
    };

    std::process::Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

/// Write a vite config into the project that pins the dev-server port.
///
/// Used when the selected port differs from the Vite default, so the
/// launched process listens where the readiness probe looks.
pub fn write_port_config(project_dir: &Path, port: u16) -> ServerResult<()> {
    let config = vite_config(port);
    std::fs::write(project_dir.join("vite.config.js"), config)?;
    info!("Pinned dev-server port {} in vite.config.js", port);
    Ok(())
}

fn vite_config(port: u16) -> String {
    format!(
        r#"import {{ defineConfig }} from 'vite'
import react from '@vitejs/plugin-react'

export default defineConfig({{
  plugins: [react()],
  server: {{
    port: {port},
    strictPort: true,
  }},
}})
"#
    )
}
