// Render pipeline: input -> spec -> artifact on disk -> side effects

use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::compiler::compile_with_level;
use crate::config::{AppConfig, ChartsConfig};
use crate::document::assemble;
use crate::error::{ChartError, Result};
use crate::hooks::{NoopHook, OpenInViewer, PostRenderHook};
use crate::model::{ChartKind, Labels};
use crate::normalize::{normalize, ChartInput};
use crate::notify::{LogNotifier, NotificationSink, Severity};
use crate::raster::{self, LegacyStyle, RasterOptions};

/// Give up bumping filename suffixes after this many collisions.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// A written artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    pub kind: ChartKind,
    pub file_path: PathBuf,
    /// Path as served to web clients, e.g. `/static/charts/<file>`.
    pub web_path: String,
    /// Human readable summary handed back to the caller.
    pub description: String,
}

pub struct ChartRenderer {
    charts: ChartsConfig,
    raster: RasterOptions,
    sender: String,
    hook: Box<dyn PostRenderHook>,
    notifier: Box<dyn NotificationSink>,
}

impl ChartRenderer {
    pub fn new(config: &AppConfig, hook: Box<dyn PostRenderHook>, notifier: Box<dyn NotificationSink>) -> Self {
        Self {
            charts: config.charts.clone(),
            raster: RasterOptions::from_config(&config.charts),
            sender: config.notifications.sender.clone(),
            hook,
            notifier,
        }
    }

    /// Renderer wired from configuration alone: the viewer hook follows
    /// `open_after_render`, notifications follow the configured endpoint.
    pub fn from_config(config: &AppConfig) -> Self {
        let hook: Box<dyn PostRenderHook> = if config.charts.open_after_render {
            Box::new(OpenInViewer)
        } else {
            Box::new(NoopHook)
        };
        Self::new(config, hook, crate::notify::from_config(&config.notifications))
    }

    /// No viewer, log-only notifications.
    pub fn headless(config: &AppConfig) -> Self {
        Self::new(config, Box::new(NoopHook), Box::new(LogNotifier))
    }

    pub fn output_dir(&self) -> &Path {
        &self.charts.output_dir
    }

    /// Block until queued notifications have been delivered or timed out.
    pub fn flush_notifications(&self) {
        self.notifier.flush();
    }

    /// Compile any chart kind into a self-contained HTML document.
    pub fn render_document(&self, input: ChartInput, labels: &Labels) -> Result<RenderOutcome> {
        let spec = normalize(input, labels)?;
        let kind = spec.kind();
        info!(%kind, title = spec.title(), "rendering chart document");

        let (config, level) = compile_with_level(&spec).inspect_err(|e| error!(%kind, error = %e, "compilation failed"))?;
        let html = assemble(&config, spec.title(), &level.map_id)?;

        let path = write_artifact(&self.charts.output_dir, "dynamic_chart", "html", html.as_bytes())?;
        let web_path = self.web_path(&path);
        let description = format!("动态图表 '{}' 已生成，文件路径: {}", spec.title(), web_path);
        Ok(self.finish(kind, path, web_path, description))
    }

    /// Draw a bar/line chart as a PNG image.
    pub fn render_raster(&self, input: ChartInput, labels: &Labels, style: &LegacyStyle) -> Result<RenderOutcome> {
        let spec = normalize(input, labels)?;
        let kind = spec.kind();
        info!(%kind, title = spec.title(), "rendering chart image");

        let png = raster::render_png(&spec, style, &self.raster)
            .inspect_err(|e| error!(%kind, error = %e, "image rendering failed"))?;
        let prefix = format!("{}_chart", raster::file_stem(&spec));

        let path = write_artifact(&self.charts.output_dir, &prefix, "png", &png)?;
        let web_path = self.web_path(&path);
        let description = format!("图片保存至: {}", web_path);
        Ok(self.finish(kind, path, web_path, description))
    }

    fn web_path(&self, path: &Path) -> String {
        let file_name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        format!("{}/{}", self.charts.web_prefix.trim_end_matches('/'), file_name)
    }

    fn finish(&self, kind: ChartKind, file_path: PathBuf, web_path: String, description: String) -> RenderOutcome {
        info!(%kind, path = %file_path.display(), "chart written");
        self.hook.after_render(&file_path);
        self.notifier.notify(&description, &self.sender, Severity::Success);
        RenderOutcome {
            kind,
            file_path,
            web_path,
            description,
        }
    }
}

/// Write `contents` to `<dir>/<prefix>_<timestamp>.<ext>` without ever
/// replacing an existing file.
pub fn write_artifact(dir: &Path, prefix: &str, ext: &str, contents: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|source| ChartError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S_%6f").to_string();
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = if attempt == 0 {
            format!("{}_{}.{}", prefix, stamp, ext)
        } else {
            format!("{}_{}_{}.{}", prefix, stamp, attempt, ext)
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                if let Err(source) = file.write_all(contents) {
                    drop(file);
                    let _ = fs::remove_file(&path);
                    return Err(ChartError::Io { path, source });
                }
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(ChartError::Io { path, source }),
        }
    }

    Err(ChartError::Io {
        path: dir.join(format!("{}_{}.{}", prefix, stamp, ext)),
        source: std::io::Error::new(ErrorKind::AlreadyExists, "no free artifact name"),
    })
}
