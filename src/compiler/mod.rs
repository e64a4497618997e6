//! Chart spec to visualization config compilation.
//!
//! Each chart kind has its own compiler. All of them are pure: the same spec
//! always compiles to the same tree. Object keys are kept sorted by
//! `serde_json`, so serializing a tree is deterministic too.

mod funnel;
mod heatmap;
mod map;
mod mixed;
mod network;
mod pie;
mod radar;
mod wordcloud;

use serde_json::{json, Value};
use tracing::debug;

use crate::error::Result;
use crate::model::{ChartBody, ChartSpec};
use crate::region::MapLevel;

pub use map::map_level;

/// Declarative chart configuration, serialized verbatim into documents.
pub type ConfigTree = Value;

pub(crate) const BACKGROUND_COLOR: &str = "#1a1a1a";
pub(crate) const TEXT_COLOR: &str = "#ffffff";
pub(crate) const GRID_LINE_COLOR: &str = "#333333";

/// Compile a chart spec into its config tree.
pub fn compile(spec: &ChartSpec) -> Result<ConfigTree> {
    let title = spec.title();
    let config = match &spec.body {
        ChartBody::Mixed(chart) => mixed::compile(chart, &spec.labels)?,
        ChartBody::Pie(items) => pie::compile_pie(items, title),
        ChartBody::Rose(items) => pie::compile_rose(items, title),
        ChartBody::Radar(chart) => radar::compile(chart, title)?,
        ChartBody::Funnel(items) => funnel::compile(items, title),
        ChartBody::Wordcloud(words) => wordcloud::compile(words, title),
        ChartBody::Heatmap(chart) => heatmap::compile(chart, title),
        ChartBody::Sankey(chart) => network::compile_sankey(chart, title)?,
        ChartBody::Graph(chart) => network::compile_graph(chart, title)?,
        ChartBody::Map(chart) => map::compile(chart, title, &map_level(spec)),
    };
    debug!(kind = %spec.kind(), "compiled chart config");
    Ok(config)
}

/// Compile a spec and resolve the map it is drawn on (the nation for
/// anything that is not a map chart).
pub fn compile_with_level(spec: &ChartSpec) -> Result<(ConfigTree, MapLevel)> {
    Ok((compile(spec)?, map_level(spec)))
}

// =============================================================================
// Shared building blocks
// =============================================================================

/// How the tooltip is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    /// Category-axis cross-hair.
    Axis,
    /// One data item at a time.
    Item,
}

pub(crate) fn title_block(title: &str) -> Value {
    json!({
        "text": title,
        "textStyle": {"color": TEXT_COLOR, "fontSize": 20, "fontWeight": "bold"},
        "left": "center",
        "top": 20
    })
}

pub(crate) fn tooltip(trigger: Trigger) -> Value {
    let mut tooltip = json!({
        "backgroundColor": "rgba(0, 0, 0, 0.8)",
        "borderColor": "#333",
        "textStyle": {"color": "#fff"}
    });
    match trigger {
        Trigger::Axis => {
            tooltip["trigger"] = json!("axis");
            tooltip["axisPointer"] = json!({
                "type": "cross",
                "animation": true,
                "crossStyle": {"color": "#999"}
            });
        }
        Trigger::Item => tooltip["trigger"] = json!("item"),
    }
    tooltip
}

/// Tooltip with a fixed formatter string.
pub(crate) fn tooltip_with_formatter(trigger: Trigger, formatter: &str) -> Value {
    let mut tooltip = tooltip(trigger);
    tooltip["formatter"] = json!(formatter);
    tooltip
}

pub(crate) fn legend<'a>(names: impl IntoIterator<Item = &'a str>) -> Value {
    let names: Vec<&str> = names.into_iter().collect();
    json!({
        "data": names,
        "textStyle": {"color": TEXT_COLOR},
        "top": 60,
        "left": "center"
    })
}

pub(crate) fn vertical_legend<'a>(names: impl IntoIterator<Item = &'a str>) -> Value {
    let names: Vec<&str> = names.into_iter().collect();
    json!({
        "orient": "vertical",
        "left": "left",
        "textStyle": {"color": TEXT_COLOR},
        "data": names
    })
}

pub(crate) fn emphasis_shadow() -> Value {
    json!({
        "itemStyle": {
            "shadowBlur": 10,
            "shadowOffsetX": 0,
            "shadowColor": "rgba(0, 0, 0, 0.5)"
        }
    })
}
