//! Chart input normalization.
//!
//! Two input generations feed the compiler:
//!
//! * the legacy positional form `(x_csv, y_csv, render_type?)`, and
//! * a structured mapping (already parsed, or as JSON text) keyed by
//!   `chart_type`.
//!
//! Both are turned into one validated [`ChartSpec`] here. Nothing past this
//! module ever looks at the raw input shape again.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ChartError, Result};
use crate::model::{
    palette_color, ChartBody, ChartKind, ChartSpec, HeatCell, HeatPoint, HeatmapChart, Indicator,
    Labels, Link, MapChart, MixedChart, NamedValue, NetworkChart, Node, RadarChart, RenderType,
    ScatterPoint, Series, DEFAULT_Y_UNIT, LEGACY_SERIES_NAME,
};
use crate::parser::legacy::parse_legacy_axes;

const DEFAULT_INDICATOR_MAX: f64 = 100.0;

/// Raw chart input as received from a caller.
#[derive(Debug, Clone)]
pub enum ChartInput {
    /// `(x_csv, y_csv, render_type?)`
    Legacy {
        x_csv: String,
        y_csv: String,
        render_type: Option<String>,
    },
    /// A JSON document describing the chart.
    Text(String),
    /// An already parsed JSON mapping.
    Structured(Value),
}

impl ChartInput {
    pub fn legacy(x_csv: impl Into<String>, y_csv: impl Into<String>, render_type: Option<&str>) -> Self {
        ChartInput::Legacy {
            x_csv: x_csv.into(),
            y_csv: y_csv.into(),
            render_type: render_type.map(str::to_string),
        }
    }

    /// Classify a loosely typed tool argument.
    ///
    /// Strings are JSON text, objects are structured specs and arrays of two
    /// or three strings are legacy tuples. Anything else is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(ChartInput::Text(text)),
            Value::Object(_) => Ok(ChartInput::Structured(value)),
            Value::Array(items) if (2..=3).contains(&items.len()) => {
                let parts: Option<Vec<String>> = items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect();
                match parts {
                    Some(mut parts) => {
                        let render_type = if parts.len() == 3 { parts.pop() } else { None };
                        let y_csv = parts.pop().unwrap_or_default();
                        let x_csv = parts.pop().unwrap_or_default();
                        Ok(ChartInput::Legacy {
                            x_csv,
                            y_csv,
                            render_type,
                        })
                    }
                    None => Err(ChartError::UnsupportedInputShape {
                        found: "array whose elements are not all strings".to_string(),
                    }),
                }
            }
            other => Err(ChartError::UnsupportedInputShape {
                found: describe_shape(&other),
            }),
        }
    }
}

fn describe_shape(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(items) => format!("array of {} elements", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}

/// Turn any accepted input into a validated chart spec.
pub fn normalize(input: ChartInput, labels: &Labels) -> Result<ChartSpec> {
    let body = match input {
        ChartInput::Legacy {
            x_csv,
            y_csv,
            render_type,
        } => normalize_legacy(&x_csv, &y_csv, render_type.as_deref())?,
        ChartInput::Text(text) => {
            let value: Value = serde_json::from_str(&text)
                .map_err(|e| ChartError::malformed(format!("JSON格式错误: {}", e)))?;
            if !value.is_object() {
                return Err(ChartError::UnsupportedInputShape {
                    found: format!("JSON {}", describe_shape(&value)),
                });
            }
            normalize_structured(value)?
        }
        ChartInput::Structured(value) => {
            if !value.is_object() {
                return Err(ChartError::UnsupportedInputShape {
                    found: describe_shape(&value),
                });
            }
            normalize_structured(value)?
        }
    };

    debug!(kind = %body.kind(), title = %labels.title, "normalized chart input");

    Ok(ChartSpec {
        labels: labels.clone(),
        body,
    })
}

fn normalize_legacy(x_csv: &str, y_csv: &str, render_type: Option<&str>) -> Result<ChartBody> {
    let (categories, values) = parse_legacy_axes(x_csv, y_csv)?;
    let render_type = render_type.map(RenderType::parse_lenient).unwrap_or_default();

    Ok(ChartBody::Mixed(MixedChart {
        categories,
        series: vec![Series {
            name: LEGACY_SERIES_NAME.to_string(),
            data: values,
            render_type,
            y_axis_unit: DEFAULT_Y_UNIT.to_string(),
            color: palette_color(0),
            marker: None,
        }],
    }))
}

fn chart_kind_of(value: &Value) -> Result<ChartKind> {
    let raw = ["chart_type", "chartKind", "chart_kind"]
        .iter()
        .find_map(|key| value.get(*key));

    match raw {
        None | Some(Value::Null) => Ok(ChartKind::Mixed),
        Some(Value::String(s)) => s.parse::<ChartKind>().map_err(ChartError::malformed),
        Some(other) => Err(ChartError::malformed(format!(
            "chart_type must be a string, got {}",
            describe_shape(other)
        ))),
    }
}

fn normalize_structured(value: Value) -> Result<ChartBody> {
    let kind = chart_kind_of(&value)?;
    match kind {
        ChartKind::Mixed => build_mixed(parse_raw(kind, value)?).map(ChartBody::Mixed),
        ChartKind::Pie => build_items(kind, parse_raw::<RawItems>(kind, value)?.data, "data").map(ChartBody::Pie),
        ChartKind::Rose => build_items(kind, parse_raw::<RawItems>(kind, value)?.data, "data").map(ChartBody::Rose),
        ChartKind::Funnel => {
            build_items(kind, parse_raw::<RawItems>(kind, value)?.data, "data").map(ChartBody::Funnel)
        }
        ChartKind::Wordcloud => {
            build_items(kind, parse_raw::<RawWords>(kind, value)?.words, "words").map(ChartBody::Wordcloud)
        }
        ChartKind::Radar => build_radar(parse_raw(kind, value)?).map(ChartBody::Radar),
        ChartKind::Heatmap => build_heatmap(parse_raw(kind, value)?).map(ChartBody::Heatmap),
        ChartKind::Sankey => build_network(kind, parse_raw(kind, value)?).map(ChartBody::Sankey),
        ChartKind::Graph => build_network(kind, parse_raw(kind, value)?).map(ChartBody::Graph),
        ChartKind::Map => build_map(parse_raw(kind, value)?).map(ChartBody::Map),
    }
}

fn parse_raw<T: for<'de> Deserialize<'de>>(kind: ChartKind, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ChartError::schema(kind, "<payload>", e.to_string()))
}

// =============================================================================
// Raw (wire) shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawSeries {
    name: Option<Value>,
    data: Option<Vec<f64>>,
    #[serde(rename = "type", alias = "renderType", alias = "render_type")]
    render_type: Option<String>,
    #[serde(alias = "yAxisUnit", alias = "y_axis_unit")]
    y_unit: Option<String>,
    color: Option<String>,
    marker: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMixed {
    #[serde(alias = "categories", alias = "xData")]
    x_data: Option<Vec<Value>>,
    series: Option<Vec<RawSeries>>,
}

#[derive(Debug, Deserialize)]
struct RawNamedValue {
    name: Option<Value>,
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawItems {
    #[serde(alias = "items")]
    data: Option<Vec<RawNamedValue>>,
}

#[derive(Debug, Deserialize)]
struct RawWords {
    #[serde(alias = "items")]
    words: Option<Vec<RawNamedValue>>,
}

#[derive(Debug, Deserialize)]
struct RawIndicator {
    name: Option<Value>,
    #[serde(alias = "maxValue", alias = "max_value")]
    max: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawRadar {
    indicators: Option<Vec<RawIndicator>>,
    series: Option<Vec<RawSeries>>,
}

#[derive(Debug, Deserialize)]
struct RawHeatmap {
    #[serde(alias = "categories", alias = "xData")]
    x_data: Option<Vec<Value>>,
    #[serde(alias = "yData", alias = "yCategories")]
    y_data: Option<Vec<Value>>,
    data: Option<Vec<Vec<f64>>>,
    #[serde(alias = "maxValue")]
    max_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    id: Option<Value>,
    name: Option<Value>,
    #[serde(alias = "symbolSize", alias = "sizeHint")]
    symbol_size: Option<f64>,
    #[serde(alias = "categoryIndex")]
    category: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    source: Option<Value>,
    target: Option<Value>,
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawNetwork {
    nodes: Option<Vec<RawNode>>,
    links: Option<Vec<RawLink>>,
    #[serde(default)]
    categories: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawMap {
    #[serde(default)]
    regions: Vec<RawNamedValue>,
    #[serde(default, alias = "scatterPoints")]
    scatter_data: Vec<Value>,
    #[serde(default, alias = "heatPoints")]
    heatmap_data: Vec<Vec<f64>>,
    #[serde(alias = "maxValue")]
    max_value: Option<f64>,
    #[serde(alias = "mapType")]
    map_type: Option<String>,
}

// =============================================================================
// Builders
// =============================================================================

/// Render a scalar JSON value as a label. Numbers become their text form.
fn label_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map.get("name").and_then(label_of),
        _ => None,
    }
}

fn labels_of(kind: ChartKind, field: &str, values: Option<Vec<Value>>) -> Result<Vec<String>> {
    let values = values.filter(|v| !v.is_empty()).ok_or_else(|| ChartError::missing(kind, field))?;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            label_of(v).ok_or_else(|| ChartError::schema(kind, format!("{}[{}]", field, i), "must be a string or number"))
        })
        .collect()
}

fn build_series(kind: ChartKind, raw: Vec<RawSeries>, expected_len: usize, len_field: &str) -> Result<Vec<Series>> {
    raw.into_iter()
        .enumerate()
        .map(|(i, s)| {
            let data = s.data.ok_or_else(|| ChartError::missing(kind, format!("series[{}].data", i)))?;
            if data.len() != expected_len {
                return Err(ChartError::schema(
                    kind,
                    format!("series[{}].data", i),
                    format!("has {} values but {} has {}", data.len(), len_field, expected_len),
                ));
            }
            Ok(Series {
                name: s
                    .name
                    .as_ref()
                    .and_then(label_of)
                    .unwrap_or_else(|| format!("系列{}", i + 1)),
                data,
                render_type: s.render_type.as_deref().map(RenderType::parse_lenient).unwrap_or_default(),
                y_axis_unit: s.y_unit.unwrap_or_else(|| DEFAULT_Y_UNIT.to_string()),
                color: s.color.unwrap_or_else(|| palette_color(i)),
                marker: s.marker,
            })
        })
        .collect()
}

/// Distinct y-axis units in first-seen order.
pub fn distinct_units(series: &[Series]) -> Vec<&str> {
    let mut units: Vec<&str> = Vec::new();
    for s in series {
        if !units.contains(&s.y_axis_unit.as_str()) {
            units.push(&s.y_axis_unit);
        }
    }
    units
}

fn build_mixed(raw: RawMixed) -> Result<MixedChart> {
    let kind = ChartKind::Mixed;
    let categories = labels_of(kind, "x_data", raw.x_data)?;
    let raw_series = raw.series.filter(|s| !s.is_empty()).ok_or_else(|| ChartError::missing(kind, "series"))?;
    let series = build_series(kind, raw_series, categories.len(), "x_data")?;

    let units = distinct_units(&series);
    if units.len() > 2 {
        return Err(ChartError::schema(
            kind,
            "series[].y_unit",
            format!("uses {} distinct units ({}), at most 2 are allowed", units.len(), units.join(", ")),
        ));
    }

    Ok(MixedChart { categories, series })
}

fn build_items(kind: ChartKind, raw: Option<Vec<RawNamedValue>>, field: &str) -> Result<Vec<NamedValue>> {
    let raw = raw.filter(|v| !v.is_empty()).ok_or_else(|| ChartError::missing(kind, field))?;
    raw.into_iter()
        .enumerate()
        .map(|(i, item)| named_value(kind, field, i, item))
        .collect()
}

fn named_value(kind: ChartKind, field: &str, i: usize, item: RawNamedValue) -> Result<NamedValue> {
    let name = item
        .name
        .as_ref()
        .and_then(label_of)
        .ok_or_else(|| ChartError::missing(kind, format!("{}[{}].name", field, i)))?;
    let value = item
        .value
        .ok_or_else(|| ChartError::missing(kind, format!("{}[{}].value", field, i)))?;
    Ok(NamedValue { name, value })
}

fn build_radar(raw: RawRadar) -> Result<RadarChart> {
    let kind = ChartKind::Radar;
    let raw_indicators = raw.indicators.filter(|v| !v.is_empty()).ok_or_else(|| ChartError::missing(kind, "indicators"))?;

    let indicators = raw_indicators
        .into_iter()
        .enumerate()
        .map(|(i, ind)| {
            let name = ind
                .name
                .as_ref()
                .and_then(label_of)
                .ok_or_else(|| ChartError::missing(kind, format!("indicators[{}].name", i)))?;
            let max_value = ind.max.unwrap_or(DEFAULT_INDICATOR_MAX);
            if max_value <= 0.0 {
                return Err(ChartError::schema(kind, format!("indicators[{}].max", i), "must be positive"));
            }
            Ok(Indicator { name, max_value })
        })
        .collect::<Result<Vec<_>>>()?;

    let raw_series = raw.series.filter(|s| !s.is_empty()).ok_or_else(|| ChartError::missing(kind, "series"))?;
    let series = build_series(kind, raw_series, indicators.len(), "indicators")?;

    Ok(RadarChart { indicators, series })
}

fn as_index(value: f64) -> Option<usize> {
    if value >= 0.0 && value.fract() == 0.0 {
        Some(value as usize)
    } else {
        None
    }
}

fn build_heatmap(raw: RawHeatmap) -> Result<HeatmapChart> {
    let kind = ChartKind::Heatmap;
    let x_categories = labels_of(kind, "x_data", raw.x_data)?;
    let y_categories = labels_of(kind, "y_data", raw.y_data)?;
    let data = raw.data.filter(|d| !d.is_empty()).ok_or_else(|| ChartError::missing(kind, "data"))?;

    let cells = data
        .into_iter()
        .enumerate()
        .map(|(i, triple)| {
            let field = format!("data[{}]", i);
            if triple.len() != 3 {
                return Err(ChartError::schema(kind, field, "must be an [x_index, y_index, value] triple"));
            }
            let x = as_index(triple[0])
                .filter(|&x| x < x_categories.len())
                .ok_or_else(|| ChartError::schema(kind, field.clone(), "x index is out of range"))?;
            let y = as_index(triple[1])
                .filter(|&y| y < y_categories.len())
                .ok_or_else(|| ChartError::schema(kind, field.clone(), "y index is out of range"))?;
            Ok(HeatCell { x, y, value: triple[2] })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(HeatmapChart {
        x_categories,
        y_categories,
        cells,
        max_value: raw.max_value,
    })
}

fn build_network(kind: ChartKind, raw: RawNetwork) -> Result<NetworkChart> {
    let raw_nodes = raw.nodes.filter(|n| !n.is_empty()).ok_or_else(|| ChartError::missing(kind, "nodes"))?;
    let raw_links = raw.links.ok_or_else(|| ChartError::missing(kind, "links"))?;

    let categories = raw
        .categories
        .iter()
        .enumerate()
        .map(|(i, c)| {
            label_of(c).ok_or_else(|| ChartError::schema(kind, format!("categories[{}]", i), "must be a name or {name}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let nodes = raw_nodes
        .into_iter()
        .enumerate()
        .map(|(i, n)| {
            let id = n.id.as_ref().and_then(label_of);
            let name = n
                .name
                .as_ref()
                .and_then(label_of)
                .or_else(|| id.clone())
                .ok_or_else(|| ChartError::missing(kind, format!("nodes[{}].name", i)))?;
            if let Some(c) = n.category {
                if !categories.is_empty() && c >= categories.len() {
                    return Err(ChartError::schema(
                        kind,
                        format!("nodes[{}].category", i),
                        format!("refers to category {} but only {} are defined", c, categories.len()),
                    ));
                }
            }
            Ok(Node {
                id,
                name,
                size_hint: n.symbol_size,
                category_index: n.category,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let node_matches = |reference: &str| -> bool {
        match kind {
            ChartKind::Graph => nodes.iter().any(|n| n.graph_key() == reference),
            _ => nodes
                .iter()
                .any(|n| n.name == reference || n.id.as_deref() == Some(reference)),
        }
    };

    let links = raw_links
        .into_iter()
        .enumerate()
        .map(|(i, l)| {
            let endpoint = |value: Option<Value>, side: &str| -> Result<String> {
                let field = format!("links[{}].{}", i, side);
                let reference = value
                    .as_ref()
                    .and_then(label_of)
                    .ok_or_else(|| ChartError::missing(kind, field.clone()))?;
                if !node_matches(&reference) {
                    return Err(ChartError::schema(kind, field, format!("refers to unknown node '{}'", reference)));
                }
                Ok(reference)
            };
            let source = endpoint(l.source, "source")?;
            let target = endpoint(l.target, "target")?;
            let value = match (kind, l.value) {
                (_, Some(v)) => v,
                (ChartKind::Sankey, None) => return Err(ChartError::missing(kind, format!("links[{}].value", i))),
                (_, None) => 1.0,
            };
            Ok(Link { source, target, value })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(NetworkChart { nodes, links, categories })
}

fn scatter_point(i: usize, value: &Value) -> Result<ScatterPoint> {
    let kind = ChartKind::Map;
    let field = format!("scatter_data[{}]", i);
    let bad = || ChartError::schema(kind, field.clone(), "must be {name, value: [lng, lat, v]} or [lng, lat, v, name?]");

    let (name, coords) = match value {
        Value::Object(map) => {
            let name = map.get("name").and_then(label_of).ok_or_else(bad)?;
            let coords = map.get("value").and_then(Value::as_array).ok_or_else(bad)?;
            (name, coords.as_slice())
        }
        Value::Array(items) => {
            let name = items
                .get(3)
                .and_then(label_of)
                .unwrap_or_else(|| format!("点{}", i + 1));
            (name, items.as_slice())
        }
        _ => return Err(bad()),
    };

    let numbers: Vec<f64> = coords.iter().take(3).filter_map(Value::as_f64).collect();
    if numbers.len() != 3 {
        return Err(bad());
    }

    Ok(ScatterPoint {
        name,
        longitude: numbers[0],
        latitude: numbers[1],
        value: numbers[2],
    })
}

fn build_map(raw: RawMap) -> Result<MapChart> {
    let kind = ChartKind::Map;
    if raw.regions.is_empty() && raw.scatter_data.is_empty() && raw.heatmap_data.is_empty() {
        return Err(ChartError::schema(
            kind,
            "regions|scatter_data|heatmap_data",
            "at least one of them must be present",
        ));
    }

    let regions = raw
        .regions
        .into_iter()
        .enumerate()
        .map(|(i, r)| named_value(kind, "regions", i, r))
        .collect::<Result<Vec<_>>>()?;

    let scatter_points = raw
        .scatter_data
        .iter()
        .enumerate()
        .map(|(i, v)| scatter_point(i, v))
        .collect::<Result<Vec<_>>>()?;

    let heat_points = raw
        .heatmap_data
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            if p.len() < 3 {
                return Err(ChartError::schema(kind, format!("heatmap_data[{}]", i), "must be [lng, lat, value]"));
            }
            Ok(HeatPoint {
                longitude: p[0],
                latitude: p[1],
                value: p[2],
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(MapChart {
        regions,
        scatter_points,
        heat_points,
        max_value: raw.max_value,
        map_hint: raw.map_type.filter(|m| !m.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn structured(value: Value) -> Result<ChartSpec> {
        normalize(ChartInput::Structured(value), &Labels::default())
    }

    #[test]
    fn test_legacy_tuple_matches_structured_form() {
        let legacy = normalize(ChartInput::legacy("A,B,C", "1,2,3", Some("line")), &Labels::default()).unwrap();
        let structured = structured(json!({
            "categories": ["A", "B", "C"],
            "series": [{"name": "数据系列", "data": [1, 2, 3], "renderType": "line", "yAxisUnit": "数值"}]
        }))
        .unwrap();
        assert_eq!(legacy, structured);
    }

    #[test]
    fn test_legacy_defaults_to_bar() {
        let spec = normalize(ChartInput::legacy("A,B", "1,2", None), &Labels::default()).unwrap();
        match spec.body {
            ChartBody::Mixed(m) => assert_eq!(m.series[0].render_type, RenderType::Bar),
            other => panic!("expected mixed, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_render_type_defaults_to_bar() {
        let spec = structured(json!({
            "x_data": ["1月", "2月"],
            "series": [{"data": [1, 2]}, {"data": [3, 4], "type": "line"}]
        }))
        .unwrap();
        let ChartBody::Mixed(m) = spec.body else { panic!("expected mixed") };
        assert_eq!(m.series[0].render_type, RenderType::Bar);
        assert_eq!(m.series[0].name, "系列1");
        assert_eq!(m.series[1].render_type, RenderType::Line);
        assert_eq!(m.series[1].color, "#ff6b6b");
    }

    #[test]
    fn test_text_input_is_parsed() {
        let text = r#"{"chart_type": "pie", "data": [{"name": "A", "value": 1}]}"#;
        let spec = normalize(ChartInput::Text(text.to_string()), &Labels::default()).unwrap();
        assert_eq!(spec.kind(), ChartKind::Pie);
    }

    #[test]
    fn test_malformed_text() {
        let err = normalize(ChartInput::Text("{not json".to_string()), &Labels::default()).unwrap_err();
        assert!(matches!(err, ChartError::MalformedInput { .. }));
    }

    #[test]
    fn test_text_that_is_not_an_object() {
        let err = normalize(ChartInput::Text("[1, 2]".to_string()), &Labels::default()).unwrap_err();
        assert!(matches!(err, ChartError::UnsupportedInputShape { .. }));
    }

    #[test]
    fn test_from_value_shapes() {
        assert!(matches!(ChartInput::from_value(json!("{}")).unwrap(), ChartInput::Text(_)));
        assert!(matches!(ChartInput::from_value(json!({})).unwrap(), ChartInput::Structured(_)));
        match ChartInput::from_value(json!(["A,B", "1,2", "line"])).unwrap() {
            ChartInput::Legacy { x_csv, y_csv, render_type } => {
                assert_eq!(x_csv, "A,B");
                assert_eq!(y_csv, "1,2");
                assert_eq!(render_type.as_deref(), Some("line"));
            }
            other => panic!("expected legacy, got {:?}", other),
        }
        assert!(matches!(
            ChartInput::from_value(json!(42)).unwrap_err(),
            ChartError::UnsupportedInputShape { .. }
        ));
        assert!(matches!(
            ChartInput::from_value(json!(["A"])).unwrap_err(),
            ChartError::UnsupportedInputShape { .. }
        ));
    }

    #[test]
    fn test_unknown_chart_kind() {
        let err = structured(json!({"chart_type": "donut"})).unwrap_err();
        assert!(matches!(err, ChartError::MalformedInput { .. }));
    }

    #[test]
    fn test_mixed_requires_series() {
        let err = structured(json!({"x_data": ["A"]})).unwrap_err();
        match err {
            ChartError::SchemaValidation { kind, field, .. } => {
                assert_eq!(kind, ChartKind::Mixed);
                assert_eq!(field, "series");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_mixed_series_length_mismatch() {
        let err = structured(json!({
            "x_data": ["A", "B", "C"],
            "series": [{"name": "s", "data": [1, 2]}]
        }))
        .unwrap_err();
        assert!(matches!(err, ChartError::SchemaValidation { .. }));
        assert!(err.to_string().contains("series[0].data"));
    }

    #[test]
    fn test_mixed_rejects_three_units() {
        let err = structured(json!({
            "x_data": ["A"],
            "series": [
                {"data": [1], "y_unit": "万元"},
                {"data": [2], "y_unit": "%"},
                {"data": [3], "y_unit": "个"}
            ]
        }))
        .unwrap_err();
        assert!(matches!(err, ChartError::SchemaValidation { .. }));
    }

    #[test]
    fn test_mixed_accepts_two_units() {
        let spec = structured(json!({
            "x_data": ["A"],
            "series": [
                {"data": [1], "y_unit": "万元"},
                {"data": [2], "y_unit": "%"},
                {"data": [3], "y_unit": "万元"}
            ]
        }))
        .unwrap();
        let ChartBody::Mixed(m) = spec.body else { panic!("expected mixed") };
        assert_eq!(distinct_units(&m.series), vec!["万元", "%"]);
    }

    #[test]
    fn test_radar_length_must_match_indicators() {
        let err = structured(json!({
            "chart_type": "radar",
            "indicators": [{"name": "a", "max": 10}, {"name": "b"}],
            "series": [{"name": "s", "data": [1, 2, 3]}]
        }))
        .unwrap_err();
        assert!(matches!(err, ChartError::SchemaValidation { kind: ChartKind::Radar, .. }));
    }

    #[test]
    fn test_radar_default_indicator_max() {
        let spec = structured(json!({
            "chart_type": "radar",
            "indicators": [{"name": "a"}],
            "series": [{"name": "s", "data": [50]}]
        }))
        .unwrap();
        let ChartBody::Radar(r) = spec.body else { panic!("expected radar") };
        assert_eq!(r.indicators[0].max_value, 100.0);
    }

    #[test]
    fn test_pie_requires_data() {
        let err = structured(json!({"chart_type": "pie"})).unwrap_err();
        assert!(err.to_string().contains("data"));
    }

    #[test]
    fn test_pie_item_missing_value() {
        let err = structured(json!({"chart_type": "pie", "data": [{"name": "A"}]})).unwrap_err();
        assert!(err.to_string().contains("data[0].value"));
    }

    #[test]
    fn test_wordcloud_reads_words() {
        let spec = structured(json!({
            "chart_type": "wordcloud",
            "words": [{"name": "Rust", "value": 10}]
        }))
        .unwrap();
        assert_eq!(spec.body, ChartBody::Wordcloud(vec![NamedValue::new("Rust", 10.0)]));
    }

    #[test]
    fn test_heatmap_index_out_of_range() {
        let err = structured(json!({
            "chart_type": "heatmap",
            "x_data": ["a"],
            "y_data": ["b"],
            "data": [[1, 0, 5]]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("x index"));
    }

    #[test]
    fn test_sankey_unknown_link_endpoint() {
        let err = structured(json!({
            "chart_type": "sankey",
            "nodes": [{"name": "A"}, {"name": "B"}],
            "links": [{"source": "A", "target": "C", "value": 1}]
        }))
        .unwrap_err();
        assert!(matches!(err, ChartError::SchemaValidation { kind: ChartKind::Sankey, .. }));
        assert!(err.to_string().contains("unknown node 'C'"));
    }

    #[test]
    fn test_graph_links_use_node_id() {
        let spec = structured(json!({
            "chart_type": "graph",
            "nodes": [{"id": "u", "name": "用户", "symbolSize": 50, "category": 0}, {"id": "p", "name": "产品"}],
            "links": [{"source": "u", "target": "p"}],
            "categories": [{"name": "用户相关"}]
        }))
        .unwrap();
        let ChartBody::Graph(g) = spec.body else { panic!("expected graph") };
        assert_eq!(g.links[0].value, 1.0);
        assert_eq!(g.categories, vec!["用户相关"]);

        let err = structured(json!({
            "chart_type": "graph",
            "nodes": [{"id": "u", "name": "用户"}],
            "links": [{"source": "用户", "target": "u"}]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("unknown node"));
    }

    #[test]
    fn test_map_requires_some_layer() {
        let err = structured(json!({"chart_type": "map"})).unwrap_err();
        assert!(matches!(err, ChartError::SchemaValidation { kind: ChartKind::Map, .. }));
    }

    #[test]
    fn test_map_scatter_formats() {
        let spec = structured(json!({
            "chart_type": "map",
            "scatter_data": [
                {"name": "北京", "value": [116.46, 39.92, 95]},
                [121.48, 31.22, 85]
            ]
        }))
        .unwrap();
        let ChartBody::Map(m) = spec.body else { panic!("expected map") };
        assert_eq!(m.scatter_points[0].name, "北京");
        assert_eq!(m.scatter_points[1].name, "点2");
        assert_eq!(m.scatter_points[1].value, 85.0);
    }
}
