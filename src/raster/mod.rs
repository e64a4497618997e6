// Legacy PNG renderer for bar/line charts
//
// Kept apart from the ConfigTree compilers: a mixed chart is laid out as a
// scene of drawing commands, then painted onto a plotters bitmap.

pub mod canvas;
pub mod palette;
pub mod scene;

use tracing::debug;

use crate::config::ChartsConfig;
use crate::error::{ChartError, Result};
use crate::model::{ChartBody, ChartKind, ChartSpec};

use canvas::Canvas;
use scene::build_scene;

/// Caller overrides from the legacy drawing call.
#[derive(Debug, Clone, Default)]
pub struct LegacyStyle {
    pub y_label: Option<String>,
    /// Replaces the first series color and disables the bar gradient.
    pub color: Option<String>,
    pub bar_width: Option<f64>,
    pub marker: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RasterOptions {
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
    pub background_color: String,
    pub font_family: String,
}

impl Default for RasterOptions {
    fn default() -> Self {
        RasterOptions::from_config(&ChartsConfig::default())
    }
}

impl RasterOptions {
    /// Pixel size is the figure size in inches times the DPI.
    pub fn from_config(charts: &ChartsConfig) -> Self {
        let dpi = charts.dpi.max(1);
        let [w, h] = charts.figsize;
        RasterOptions {
            width: (w * dpi as f64).round().max(1.0) as u32,
            height: (h * dpi as f64).round().max(1.0) as u32,
            dpi,
            background_color: charts.background_color.clone(),
            font_family: charts.font_family.clone(),
        }
    }

    pub fn figure_width_in(&self) -> f64 {
        self.width as f64 / self.dpi.max(1) as f64
    }
}

/// Render a mixed chart spec to PNG bytes.
pub fn render_png(spec: &ChartSpec, style: &LegacyStyle, options: &RasterOptions) -> Result<Vec<u8>> {
    let ChartBody::Mixed(chart) = &spec.body else {
        return Err(ChartError::schema(
            spec.kind(),
            "chart_type",
            "cannot be drawn as an image, only bar and line charts can",
        ));
    };

    let scene = build_scene(chart, &spec.labels, style, options.figure_width_in())?;
    debug!(
        commands = scene.commands.len(),
        axes = scene.value_ranges.len(),
        rotate = scene.rotate_labels,
        "built raster scene"
    );

    let mut canvas = Canvas::new(options)?;
    canvas.draw(&scene)?;
    Ok(canvas.render()?)
}

/// Filename stem for an image of this spec: the render type of a single
/// series, or `mixed` when several series are drawn.
pub fn file_stem(spec: &ChartSpec) -> &'static str {
    match &spec.body {
        ChartBody::Mixed(chart) if chart.series.len() == 1 => chart.series[0].render_type.as_str(),
        _ => ChartKind::Mixed.as_str(),
    }
}
