//! Locating the Node.js automation driver on the host.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::warn;

/// Locates the driver's Node.js executable and `cli.js`.
///
/// Search order:
/// 1. `PLAYWRIGHT_NODE_EXE` and `PLAYWRIGHT_CLI_JS` environment variables
/// 2. `PLAYWRIGHT_DRIVER_PATH` environment variable (driver directory layout)
/// 3. Global npm installation (`npm root -g`)
/// 4. Local npm installation (`npm root`)
///
/// Each candidate's node binary is checked to be runnable before being
/// accepted, so a broken override falls through to the next source.
///
/// Returns `(node_executable, cli_js)`.
pub fn locate_driver() -> Result<(PathBuf, PathBuf)> {
    if let Some((node, cli)) = try_node_cli_env() {
        if node_is_usable(&node) {
            return Ok((node, cli));
        }
        warn!(
            node = %node.display(),
            cli = %cli.display(),
            "PLAYWRIGHT_NODE_EXE is set but node is not runnable; falling back"
        );
    }

    if let Some((node, cli)) = try_driver_path_env() {
        if node_is_usable(&node) {
            return Ok((node, cli));
        }
        warn!(
            node = %node.display(),
            cli = %cli.display(),
            "PLAYWRIGHT_DRIVER_PATH is set but node is not runnable; falling back"
        );
    }

    if let Some((node, cli)) = try_npm_root(true) {
        if node_is_usable(&node) {
            return Ok((node, cli));
        }
    }

    if let Some((node, cli)) = try_npm_root(false) {
        if node_is_usable(&node) {
            return Ok((node, cli));
        }
    }

    Err(Error::DriverNotFound)
}

/// Driver override via explicit node and cli.js paths.
fn try_node_cli_env() -> Option<(PathBuf, PathBuf)> {
    let (node_exe, cli_js) = (
        std::env::var("PLAYWRIGHT_NODE_EXE").ok()?,
        std::env::var("PLAYWRIGHT_CLI_JS").ok()?,
    );
    let node_path = PathBuf::from(node_exe);
    let cli_path = PathBuf::from(cli_js);

    if node_path.exists() && cli_path.exists() {
        Some((node_path, cli_path))
    } else {
        None
    }
}

/// Driver override via an unpacked driver directory.
fn try_driver_path_env() -> Option<(PathBuf, PathBuf)> {
    let driver_dir = PathBuf::from(std::env::var("PLAYWRIGHT_DRIVER_PATH").ok()?);
    let node_exe = if cfg!(windows) {
        driver_dir.join("node.exe")
    } else {
        driver_dir.join("node")
    };
    let cli_js = driver_dir.join("package").join("cli.js");

    if node_exe.exists() && cli_js.exists() {
        Some((node_exe, cli_js))
    } else {
        None
    }
}

/// npm installation lookup, global or local.
fn try_npm_root(global: bool) -> Option<(PathBuf, PathBuf)> {
    let args: &[&str] = if global { &["root", "-g"] } else { &["root"] };
    let output = Command::new("npm").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let npm_root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let node_modules = PathBuf::from(npm_root);
    if !node_modules.exists() {
        return None;
    }

    find_driver_in_node_modules(&node_modules)
}

fn find_driver_in_node_modules(node_modules: &Path) -> Option<(PathBuf, PathBuf)> {
    let candidate_dirs = [
        node_modules.join("playwright"),
        node_modules.join("@playwright").join("test"),
    ];

    for dir in &candidate_dirs {
        let cli_js = dir.join("cli.js");
        if !cli_js.exists() {
            continue;
        }
        if let Some(node_exe) = find_node_executable() {
            return Some((node_exe, cli_js));
        }
    }

    None
}

/// Finds the node executable in PATH or common install locations.
fn find_node_executable() -> Option<PathBuf> {
    #[cfg(not(windows))]
    let which_cmd = "which";
    #[cfg(windows)]
    let which_cmd = "where";

    if let Ok(output) = Command::new(which_cmd).arg("node").output() {
        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if let Some(first) = stdout.lines().next() {
                let path = PathBuf::from(first.trim());
                if path.exists() {
                    return Some(path);
                }
            }
        }
    }

    #[cfg(not(windows))]
    let common_locations = [
        "/usr/local/bin/node",
        "/usr/bin/node",
        "/opt/homebrew/bin/node",
        "/opt/local/bin/node",
    ];

    #[cfg(windows)]
    let common_locations = [
        "C:\\Program Files\\nodejs\\node.exe",
        "C:\\Program Files (x86)\\nodejs\\node.exe",
    ];

    common_locations
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn node_is_usable(node: &Path) -> bool {
    Command::new(node)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_driver_returns_existing_paths_or_not_found() {
        match locate_driver() {
            Ok((node, cli)) => {
                assert!(node.exists());
                assert!(cli.exists());
            }
            Err(Error::DriverNotFound) => {
                // No driver installed on this host; nothing to assert.
            }
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }
}
