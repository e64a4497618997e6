use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::hooks::{with_scheme, UrlLauncher};
use crate::model::Labels;
use crate::normalize::ChartInput;
use crate::raster::LegacyStyle;
use crate::runtime::{ChartRenderer, RenderOutcome};
use crate::store::{format_table, TableStore};
use crate::tools::{Tool, ToolRegistry};

/// Every built-in tool, sharing one renderer.
pub fn registry(
    renderer: Arc<ChartRenderer>,
    store: Arc<dyn TableStore>,
    launcher: Arc<dyn UrlLauncher>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(RenderChartTool::new(Arc::clone(&renderer))));
    registry.register(Box::new(DrawChartTool::new(renderer)));
    registry.register(Box::new(ReadTableTool::new(store)));
    registry.register(Box::new(OpenUrlTool::new(launcher)));
    registry
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| anyhow!("{} is required", key))
}

/// First non-empty string among `keys`.
fn optional_str<'a>(args: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| args.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

fn outcome_json(outcome: &RenderOutcome) -> Value {
    json!({
        "path": outcome.web_path,
        "chart_type": outcome.kind.as_str(),
        "message": outcome.description
    })
}

pub struct RenderChartTool {
    renderer: Arc<ChartRenderer>,
}

impl RenderChartTool {
    pub fn new(renderer: Arc<ChartRenderer>) -> Self {
        Self { renderer }
    }
}

impl Tool for RenderChartTool {
    fn name(&self) -> &str {
        "renderChart"
    }

    fn description(&self) -> &str {
        "Render an interactive HTML chart (mixed bar/line, pie, rose, radar, funnel, wordcloud, heatmap, sankey, graph, map)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "data": {
                    "description": "Chart data: a JSON object or JSON text with chart_type and its fields, or a legacy [x_csv, y_csv, type?] array",
                    "anyOf": [
                        {"type": "string"},
                        {"type": "object"},
                        {"type": "array", "items": {"type": "string"}, "minItems": 2, "maxItems": 3}
                    ]
                },
                "title": {"type": "string", "description": "Chart title"},
                "x_label": {"type": "string", "description": "X axis label for mixed charts"}
            },
            "required": ["data"]
        })
    }

    fn execute(&self, args: Value) -> Result<Value> {
        let data = args.get("data").cloned().ok_or_else(|| anyhow!("data is required"))?;
        let labels = Labels::new(
            optional_str(&args, &["title"]),
            optional_str(&args, &["x_label", "xAxisLabel"]),
        );
        let outcome = self.renderer.render_document(ChartInput::from_value(data)?, &labels)?;
        Ok(outcome_json(&outcome))
    }
}

pub struct DrawChartTool {
    renderer: Arc<ChartRenderer>,
}

impl DrawChartTool {
    pub fn new(renderer: Arc<ChartRenderer>) -> Self {
        Self { renderer }
    }
}

impl Tool for DrawChartTool {
    fn name(&self) -> &str {
        "drawChart"
    }

    fn description(&self) -> &str {
        "Draw a bar/line chart as a PNG image, from comma separated x and y values or a multi-series mixed chart spec"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "data": {
                    "description": "Mixed chart spec (x_data plus series), as a JSON object or JSON text. Replaces x_str/y_str.",
                    "anyOf": [{"type": "string"}, {"type": "object"}]
                },
                "x_str": {"type": "string", "description": "Comma separated categories, e.g. \"1月,2月,3月\""},
                "y_str": {"type": "string", "description": "Comma separated numbers, e.g. \"10,20,15\""},
                "chart_type": {"type": "string", "enum": ["bar", "line"], "default": "bar"},
                "title": {"type": "string"},
                "x_label": {"type": "string"},
                "y_label": {"type": "string"},
                "color": {"type": "string", "description": "Hex or named color"},
                "bar_width": {"type": "number", "description": "Bar width as a fraction of the category slot"},
                "marker": {"type": "string", "description": "Line marker: o, s or ^"}
            }
        })
    }

    fn execute(&self, args: Value) -> Result<Value> {
        let input = match args.get("data").filter(|d| !d.is_null()) {
            Some(data) => ChartInput::from_value(data.clone())?,
            None => ChartInput::legacy(
                required_str(&args, "x_str")?,
                required_str(&args, "y_str")?,
                optional_str(&args, &["chart_type"]),
            ),
        };
        let labels = Labels::new(optional_str(&args, &["title"]), optional_str(&args, &["x_label"]));
        let style = LegacyStyle {
            y_label: optional_str(&args, &["y_label"]).map(str::to_string),
            color: optional_str(&args, &["color"]).map(str::to_string),
            bar_width: args.get("bar_width").and_then(Value::as_f64),
            marker: optional_str(&args, &["marker"]).map(str::to_string),
        };

        let outcome = self.renderer.render_raster(input, &labels, &style)?;
        Ok(outcome_json(&outcome))
    }
}

pub struct ReadTableTool {
    store: Arc<dyn TableStore>,
}

impl ReadTableTool {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }
}

impl Tool for ReadTableTool {
    fn name(&self) -> &str {
        "readTable"
    }

    fn description(&self) -> &str {
        "Read every row of a table from the data store as formatted text"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "table_name": {"type": "string", "description": "Name of the table to read"}
            },
            "required": ["table_name"]
        })
    }

    fn execute(&self, args: Value) -> Result<Value> {
        let name = required_str(&args, "table_name")?.trim();
        let table = self.store.read_table(name)?;
        Ok(Value::String(format_table(name, &table)))
    }
}

pub struct OpenUrlTool {
    launcher: Arc<dyn UrlLauncher>,
}

impl OpenUrlTool {
    pub fn new(launcher: Arc<dyn UrlLauncher>) -> Self {
        Self { launcher }
    }
}

impl Tool for OpenUrlTool {
    fn name(&self) -> &str {
        "openUrl"
    }

    fn description(&self) -> &str {
        "Open a website in the default browser"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {"type": "string", "description": "Address to open; https:// is added when no scheme is given"}
            },
            "required": ["url"]
        })
    }

    fn execute(&self, args: Value) -> Result<Value> {
        let url = with_scheme(required_str(&args, "url")?);
        self.launcher.launch(&url)?;
        Ok(Value::String(format!("Opened website: {}", url)))
    }
}
