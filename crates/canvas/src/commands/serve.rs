//! `canvas serve` command implementation.

use std::path::PathBuf;

use canvas_config::{CliSettings, Config};
use clap::Args;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover canvas.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Canvas root directory (overrides config).
    #[arg(short, long)]
    root_dir: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to, 0 = OS-assigned (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Start even under automated-test/CI execution.
    #[arg(long, env = "CANVAS_HOST_ALLOW_IN_TESTS")]
    allow_in_tests: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the host fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            root_dir: self.root_dir,
            allow_in_tests: self.allow_in_tests.then_some(true),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let host = canvas_server::start(canvas_server::opts_from_config(&config)).await?;
        if host.is_disabled() {
            output.warning(
                "Canvas host disabled under test/CI environment (use --allow-in-tests to override)",
            );
            return Ok(());
        }

        output.info(&format!("Canvas root: {}", host.root_dir().display()));
        output.success(&format!(
            "Listening on http://{}:{}",
            config.server.host,
            host.port()
        ));
        output.info("Press Ctrl-C to stop");

        tokio::signal::ctrl_c().await?;
        output.info("Shutting down...");
        host.close().await;

        Ok(())
    }
}
