use std::ops::Range;

use crate::error::{ChartError, Result};
use crate::model::{ChartKind, Labels, MixedChart, RenderType};
use crate::normalize::distinct_units;

use super::LegacyStyle;

/// Fraction of a category slot covered by its bars.
const DEFAULT_BAR_WIDTH: f64 = 0.5;
const BAR_ALPHA: f64 = 0.8;
const LINE_WIDTH: f64 = 2.0;
/// Labels longer than this force rotation.
const LONG_LABEL_CHARS: usize = 10;
/// Minimum figure width per label, in inches, before labels rotate.
const MIN_INCHES_PER_LABEL: f64 = 0.5;

// =============================================================================
// Scene graph
// =============================================================================

/// Everything the canvas needs, in data coordinates. Category `i` is
/// centered on `x = i`.
#[derive(Debug, Clone)]
pub struct RasterScene {
    pub title: String,
    pub x_label: String,
    /// One label per value axis (primary first).
    pub axis_labels: Vec<String>,
    pub value_ranges: Vec<Range<f64>>,
    pub categories: Vec<String>,
    pub rotate_labels: bool,
    pub commands: Vec<DrawCommand>,
}

impl RasterScene {
    pub fn x_range(&self) -> Range<f64> {
        -0.5..(self.categories.len() as f64 - 0.5)
    }

    pub fn has_legend(&self) -> bool {
        self.commands.iter().filter(|c| c.legend().is_some()).count() > 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BarFill {
    Solid(String),
    /// Position on the gradient, 0 to 1.
    Gradient(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarStyle {
    pub fill: BarFill,
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: String,
    pub width: f64,
    pub marker: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    DrawBar {
        // Top-Left, Bottom-Right
        tl: (f64, f64),
        br: (f64, f64),
        value: f64,
        axis: usize,
        style: BarStyle,
        legend: Option<String>,
    },
    DrawLine {
        points: Vec<(f64, f64)>,
        axis: usize,
        style: LineStyle,
        legend: Option<String>,
    },
}

impl DrawCommand {
    pub fn legend(&self) -> Option<&str> {
        match self {
            DrawCommand::DrawBar { legend, .. } | DrawCommand::DrawLine { legend, .. } => legend.as_deref(),
        }
    }

    pub fn axis(&self) -> usize {
        match self {
            DrawCommand::DrawBar { axis, .. } | DrawCommand::DrawLine { axis, .. } => *axis,
        }
    }
}

// =============================================================================
// Compilation
// =============================================================================

/// Lay out a mixed chart as primitive drawing commands.
///
/// Bars sharing a category are dodged side by side around the category
/// center; lines stay on the center.
pub fn build_scene(
    chart: &MixedChart,
    labels: &Labels,
    style: &LegacyStyle,
    figure_width_in: f64,
) -> Result<RasterScene> {
    if chart.categories.is_empty() || chart.series.is_empty() {
        return Err(ChartError::missing(ChartKind::Mixed, "series"));
    }
    let units = distinct_units(&chart.series);
    if units.len() > 2 {
        return Err(ChartError::schema(
            ChartKind::Mixed,
            "series[].y_unit",
            format!("uses {} distinct units, at most 2 are allowed", units.len()),
        ));
    }
    for (i, s) in chart.series.iter().enumerate() {
        if s.data.len() != chart.categories.len() {
            return Err(ChartError::schema(
                ChartKind::Mixed,
                format!("series[{}].data", i),
                "must have one value per category",
            ));
        }
    }

    let bar_width = style.bar_width.filter(|w| *w > 0.0 && *w <= 1.0).unwrap_or(DEFAULT_BAR_WIDTH);
    let bar_series: Vec<usize> = chart
        .series
        .iter()
        .enumerate()
        .filter(|(_, s)| s.render_type == RenderType::Bar)
        .map(|(i, _)| i)
        .collect();
    let single_series = chart.series.len() == 1;

    let mut commands = Vec::new();
    for (series_idx, series) in chart.series.iter().enumerate() {
        let axis = units.iter().position(|u| *u == series.y_axis_unit).unwrap_or(0);
        let color = match (&style.color, series_idx) {
            (Some(color), 0) => color.clone(),
            _ => series.color.clone(),
        };

        match series.render_type {
            RenderType::Line => {
                let points = series
                    .data
                    .iter()
                    .enumerate()
                    .map(|(cat_idx, &y)| (cat_idx as f64, y))
                    .collect();
                commands.push(DrawCommand::DrawLine {
                    points,
                    axis,
                    style: LineStyle {
                        color,
                        width: LINE_WIDTH,
                        marker: series.marker.clone().or_else(|| style.marker.clone()),
                    },
                    legend: Some(series.name.clone()),
                });
            }
            RenderType::Bar => {
                let n_points = series.data.len();
                for (cat_idx, &value) in series.data.iter().enumerate() {
                    // Every category holds every bar series, so the rank is fixed
                    let (slot_width, x_offset) = match bar_series.iter().position(|&s| s == series_idx) {
                        Some(rank) => {
                            let num_at_x = bar_series.len() as f64;
                            let slot = bar_width / num_at_x;
                            (slot, (rank as f64 - (num_at_x - 1.0) / 2.0) * slot)
                        }
                        None => (bar_width, 0.0),
                    };

                    let x_final = cat_idx as f64 + x_offset;
                    let half_width = slot_width / 2.0;

                    // Single bar series without an explicit color get the gradient
                    let fill = if single_series && style.color.is_none() {
                        let t = if n_points > 1 {
                            cat_idx as f64 / (n_points - 1) as f64
                        } else {
                            0.0
                        };
                        BarFill::Gradient(t)
                    } else {
                        BarFill::Solid(color.clone())
                    };

                    commands.push(DrawCommand::DrawBar {
                        tl: (x_final - half_width, value),
                        br: (x_final + half_width, 0.0),
                        value,
                        axis,
                        style: BarStyle {
                            fill,
                            alpha: BAR_ALPHA,
                        },
                        legend: if cat_idx == 0 { Some(series.name.clone()) } else { None },
                    });
                }
            }
        }
    }

    let value_ranges = (0..units.len())
        .map(|axis| {
            let values: Vec<f64> = chart
                .series
                .iter()
                .filter(|s| units.iter().position(|u| *u == s.y_axis_unit) == Some(axis))
                .flat_map(|s| s.data.iter().copied())
                .collect();
            value_range(&values)
        })
        .collect();

    let mut axis_labels: Vec<String> = units.iter().map(|u| u.to_string()).collect();
    if let Some(y_label) = style.y_label.as_ref().filter(|l| !l.trim().is_empty()) {
        axis_labels[0] = y_label.clone();
    }

    Ok(RasterScene {
        title: labels.title.clone(),
        x_label: labels.x_axis.clone(),
        axis_labels,
        value_ranges,
        rotate_labels: needs_rotation(&chart.categories, figure_width_in),
        categories: chart.categories.clone(),
        commands,
    })
}

/// Rotate when any label is long or labels would be packed too tightly.
pub fn needs_rotation(categories: &[String], figure_width_in: f64) -> bool {
    if categories.is_empty() {
        return false;
    }
    let long = categories.iter().any(|c| c.chars().count() > LONG_LABEL_CHARS);
    long || figure_width_in / (categories.len() as f64) < MIN_INCHES_PER_LABEL
}

/// Value range including zero, with headroom for value labels.
fn value_range(values: &[f64]) -> Range<f64> {
    let min = values.iter().copied().fold(0.0_f64, f64::min);
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if min == max {
        return (min - 1.0)..(max + 1.0);
    }
    let padding = (max - min) * 0.1;
    let lower = if min < 0.0 { min - padding } else { 0.0 };
    lower..(max + padding)
}
