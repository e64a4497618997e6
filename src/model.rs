// Canonical chart model shared by every stage
//
// Every render call builds exactly one `ChartSpec` from raw input (see
// `normalize`), hands it to one compiler and drops it afterwards.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TITLE: &str = "动态图表";
pub const DEFAULT_X_LABEL: &str = "X轴";
pub const DEFAULT_Y_UNIT: &str = "数值";
pub const LEGACY_SERIES_NAME: &str = "数据系列";

/// Series colors, assigned by series index when none is given.
pub const SERIES_PALETTE: [&str; 5] = ["#00ff9f", "#ff6b6b", "#4ecdc4", "#45b7d1", "#f9ca24"];

pub fn palette_color(index: usize) -> String {
    SERIES_PALETTE[index % SERIES_PALETTE.len()].to_string()
}

/// The ten visualization shapes the compiler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Mixed,
    Pie,
    Rose,
    Radar,
    Funnel,
    Wordcloud,
    Heatmap,
    Sankey,
    Graph,
    Map,
}

impl ChartKind {
    pub const ALL: [ChartKind; 10] = [
        ChartKind::Mixed,
        ChartKind::Pie,
        ChartKind::Rose,
        ChartKind::Radar,
        ChartKind::Funnel,
        ChartKind::Wordcloud,
        ChartKind::Heatmap,
        ChartKind::Sankey,
        ChartKind::Graph,
        ChartKind::Map,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Mixed => "mixed",
            ChartKind::Pie => "pie",
            ChartKind::Rose => "rose",
            ChartKind::Radar => "radar",
            ChartKind::Funnel => "funnel",
            ChartKind::Wordcloud => "wordcloud",
            ChartKind::Heatmap => "heatmap",
            ChartKind::Sankey => "sankey",
            ChartKind::Graph => "graph",
            ChartKind::Map => "map",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ChartKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| format!("unknown chart kind '{}'", s))
    }
}

/// How a mixed-chart series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderType {
    #[default]
    Bar,
    Line,
}

impl RenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderType::Bar => "bar",
            RenderType::Line => "line",
        }
    }

    /// Only "bar" (or a blank type) draws as bars, anything else as a line.
    pub fn parse_lenient(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("bar") {
            RenderType::Bar
        } else {
            RenderType::Line
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub data: Vec<f64>,
    pub render_type: RenderType,
    pub y_axis_unit: String,
    pub color: String,
    pub marker: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

impl NamedValue {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    pub name: String,
    pub max_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: Option<String>,
    pub name: String,
    pub size_hint: Option<f64>,
    pub category_index: Option<usize>,
}

impl Node {
    /// Identity used by graph links: the id, falling back to the name.
    pub fn graph_key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub value: f64,
}

/// One heatmap cell: (x index, y index, value).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatCell {
    pub x: usize,
    pub y: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub value: f64,
}

/// A weighted geographic point for the map heat layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MixedChart {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadarChart {
    pub indicators: Vec<Indicator>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapChart {
    pub x_categories: Vec<String>,
    pub y_categories: Vec<String>,
    pub cells: Vec<HeatCell>,
    pub max_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkChart {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    /// Legend categories (graph only).
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapChart {
    pub regions: Vec<NamedValue>,
    pub scatter_points: Vec<ScatterPoint>,
    pub heat_points: Vec<HeatPoint>,
    pub max_value: Option<f64>,
    /// Explicit map id, only consulted when there are no regions.
    pub map_hint: Option<String>,
}

/// Kind-specific payload. Each variant carries exactly what its compiler needs.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartBody {
    Mixed(MixedChart),
    Pie(Vec<NamedValue>),
    Rose(Vec<NamedValue>),
    Radar(RadarChart),
    Funnel(Vec<NamedValue>),
    Wordcloud(Vec<NamedValue>),
    Heatmap(HeatmapChart),
    Sankey(NetworkChart),
    Graph(NetworkChart),
    Map(MapChart),
}

impl ChartBody {
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartBody::Mixed(_) => ChartKind::Mixed,
            ChartBody::Pie(_) => ChartKind::Pie,
            ChartBody::Rose(_) => ChartKind::Rose,
            ChartBody::Radar(_) => ChartKind::Radar,
            ChartBody::Funnel(_) => ChartKind::Funnel,
            ChartBody::Wordcloud(_) => ChartKind::Wordcloud,
            ChartBody::Heatmap(_) => ChartKind::Heatmap,
            ChartBody::Sankey(_) => ChartKind::Sankey,
            ChartBody::Graph(_) => ChartKind::Graph,
            ChartBody::Map(_) => ChartKind::Map,
        }
    }
}

/// Display strings shared by every chart kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Labels {
    pub title: String,
    pub x_axis: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            x_axis: DEFAULT_X_LABEL.to_string(),
        }
    }
}

impl Labels {
    pub fn new(title: Option<&str>, x_axis: Option<&str>) -> Self {
        let defaults = Labels::default();
        Self {
            title: title
                .filter(|t| !t.trim().is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.title),
            x_axis: x_axis
                .filter(|x| !x.trim().is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.x_axis),
        }
    }
}

/// Canonical, validated chart description.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub labels: Labels,
    pub body: ChartBody,
}

impl ChartSpec {
    pub fn kind(&self) -> ChartKind {
        self.body.kind()
    }

    pub fn title(&self) -> &str {
        &self.labels.title
    }
}
