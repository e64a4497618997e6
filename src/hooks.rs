// Side effects that run around a render: opening artifacts and URLs

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// Called after an artifact has been written. Failures never fail the render.
pub trait PostRenderHook: Send + Sync {
    fn after_render(&self, artifact: &Path);
}

/// Opens the artifact with the host's default viewer.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenInViewer;

impl PostRenderHook for OpenInViewer {
    fn after_render(&self, artifact: &Path) {
        let target = artifact.to_string_lossy();
        match system_open(&target) {
            Ok(()) => info!(path = %artifact.display(), "opened artifact in viewer"),
            Err(e) => warn!(path = %artifact.display(), error = %e, "could not open artifact"),
        }
    }
}

/// Headless hook.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl PostRenderHook for NoopHook {
    fn after_render(&self, _artifact: &Path) {}
}

pub trait UrlLauncher: Send + Sync {
    fn launch(&self, url: &str) -> Result<()>;
}

/// Hands URLs to the OS default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl UrlLauncher for SystemBrowser {
    fn launch(&self, url: &str) -> Result<()> {
        system_open(url)
    }
}

/// Prefix `https://` unless the URL already carries an http(s) scheme.
pub fn with_scheme(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Characters a shell or launcher could read as syntax rather than as
/// part of the target.
const UNSAFE_TARGET_CHARS: &[char] = &['"', '^', '|', '<', '>', '`'];

/// Reject targets that could be read as options or extra commands.
fn check_target(target: &str) -> Result<()> {
    if target.is_empty() {
        bail!("Nothing to open");
    }
    if target.starts_with('-') {
        bail!("Refusing to open '{}': looks like a command line option", target);
    }
    if let Some(c) = target.chars().find(|c| c.is_control() || UNSAFE_TARGET_CHARS.contains(c)) {
        bail!("Refusing to open '{}': contains {:?}", target, c);
    }
    Ok(())
}

/// Launcher command for `os`. No shell is involved on any platform.
fn open_command(target: &str, os: &str) -> Result<Command> {
    check_target(target)?;
    let command = match os {
        "windows" => {
            let mut c = Command::new("rundll32");
            c.arg("url.dll,FileProtocolHandler").arg(target);
            c
        }
        "macos" => {
            let mut c = Command::new("open");
            c.arg(target);
            c
        }
        _ => {
            let mut c = Command::new("xdg-open");
            c.arg(target);
            c
        }
    };
    Ok(command)
}

fn system_open(target: &str) -> Result<()> {
    let status = open_command(target, std::env::consts::OS)?
        .status()
        .with_context(|| format!("Failed to launch viewer for {}", target))?;
    if !status.success() {
        bail!("Viewer exited with {} for {}", status, target);
    }
    Ok(())
}
