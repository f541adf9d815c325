//! Lifecycle of the driver child process.

use crate::driver::locate_driver;
use crate::error::{Error, Result};
use tokio::process::{Child, Command};

/// Wraps the Node.js child process running the automation driver.
///
/// Communication happens over the child's stdio pipes; the child's stderr is
/// inherited so driver diagnostics reach the terminal.
#[derive(Debug)]
pub struct DriverServer {
    /// The driver child process.
    ///
    /// Public so the session can take the stdin/stdout pipes for the
    /// transport. Everything after launch should go through the connection.
    pub process: Child,
}

impl DriverServer {
    /// Launches the driver with `node cli.js run-driver`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DriverNotFound`] if the driver cannot be located and
    /// [`Error::LaunchFailed`] if the process does not start or exits
    /// immediately.
    pub async fn launch() -> Result<Self> {
        let (node_exe, cli_js) = locate_driver()?;

        let mut cmd = Command::new(&node_exe);
        cmd.arg(&cli_js)
            .arg("run-driver")
            .env("PW_LANG_NAME", "rust")
            .env("PW_LANG_NAME_VERSION", env!("CARGO_PKG_RUST_VERSION"))
            .env("PW_CLI_DISPLAY_VERSION", env!("CARGO_PKG_VERSION"))
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit());

        // Pass through browser install overrides for hosts with relocated
        // browser caches.
        if let Ok(browsers_path) = std::env::var("PLAYWRIGHT_BROWSERS_PATH") {
            cmd.env("PLAYWRIGHT_BROWSERS_PATH", browsers_path);
        }
        if let Ok(skip_download) = std::env::var("PLAYWRIGHT_SKIP_BROWSER_DOWNLOAD") {
            cmd.env("PLAYWRIGHT_SKIP_BROWSER_DOWNLOAD", skip_download);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::LaunchFailed(format!("Failed to spawn process: {e}")))?;

        // Give the process a moment to fail fast on bad installs.
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        match child.try_wait() {
            Ok(Some(status)) => {
                return Err(Error::LaunchFailed(format!(
                    "Driver process exited immediately with status: {status}"
                )));
            }
            Ok(None) => {}
            Err(e) => {
                return Err(Error::LaunchFailed(format!(
                    "Failed to check process status: {e}"
                )));
            }
        }

        Ok(Self { process: child })
    }

    /// Shuts the driver down and waits for it to exit.
    ///
    /// On Windows the stdio pipes must be closed before killing the process;
    /// tokio drives child stdio through a blocking threadpool there and an
    /// open pipe can hang the wait indefinitely.
    pub async fn shutdown(mut self) -> Result<()> {
        #[cfg(windows)]
        {
            drop(self.process.stdin.take());
            drop(self.process.stdout.take());
            drop(self.process.stderr.take());

            self.process
                .kill()
                .await
                .map_err(|e| Error::LaunchFailed(format!("Failed to kill process: {e}")))?;

            match tokio::time::timeout(std::time::Duration::from_secs(5), self.process.wait()).await
            {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(e)) => Err(Error::LaunchFailed(format!(
                    "Failed to wait for process: {e}"
                ))),
                Err(_) => {
                    let _ = self.process.start_kill();
                    Err(Error::LaunchFailed(
                        "Process shutdown timeout after 5 seconds".to_string(),
                    ))
                }
            }
        }

        #[cfg(not(windows))]
        {
            self.process
                .kill()
                .await
                .map_err(|e| Error::LaunchFailed(format!("Failed to kill process: {e}")))?;

            let _ = self.process.wait().await;

            Ok(())
        }
    }
}
