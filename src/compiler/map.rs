// Geographic charts: choropleth regions, scatter points and heat layers

use serde_json::{json, Value};
use tracing::info;

use super::{title_block, tooltip_with_formatter, vertical_legend, Trigger, BACKGROUND_COLOR, TEXT_COLOR};
use crate::gazetteer::GAZETTEER;
use crate::model::{ChartBody, ChartSpec, MapChart};
use crate::region::{resolve_map_level, MapLevel};

const DEFAULT_MAX_VALUE: f64 = 1000.0;
const SCALE_COLORS: [&str; 3] = ["#50a3ba", "#eac736", "#d94e5d"];

const REGION_SERIES: &str = "数据";
const SCATTER_SERIES: &str = "散点数据";
const HEAT_SERIES: &str = "热力分布";

const AREA_COLOR: &str = "#323c48";
const HIGHLIGHT_COLOR: &str = "#f4e925";

const MIN_SYMBOL_SIZE: f64 = 8.0;
const MAX_SYMBOL_SIZE: f64 = 30.0;

/// The map a spec is drawn on. Regions decide first; an explicit map hint is
/// used when they only resolve to the nation. Non-map charts get the nation.
pub fn map_level(spec: &ChartSpec) -> MapLevel {
    let ChartBody::Map(chart) = &spec.body else {
        return MapLevel::nation(&GAZETTEER);
    };

    let names: Vec<&str> = chart.regions.iter().map(|r| r.name.as_str()).collect();
    let resolved = resolve_map_level(&names);
    if resolved.map_id != MapLevel::nation(&GAZETTEER).map_id {
        info!(?names, map_id = %resolved.map_id, "detected map level from regions");
        return resolved;
    }

    match &chart.map_hint {
        Some(hint) => MapLevel::for_map_id(&GAZETTEER, hint),
        None => resolved,
    }
}

pub(super) fn compile(chart: &MapChart, title: &str, level: &MapLevel) -> Value {
    let max_value = chart.max_value.unwrap_or(DEFAULT_MAX_VALUE);
    let mut series = Vec::new();
    let mut legend_names = Vec::new();
    let mut geo: Option<Value> = None;

    if chart.scatter_points.is_empty() {
        if !chart.regions.is_empty() {
            series.push(region_series(chart, level));
            legend_names.push(REGION_SERIES);
        }
    } else {
        let mut layer = geo_layer(level);
        layer["label"] = json!({"show": true, "color": TEXT_COLOR, "fontSize": 8});
        if !chart.regions.is_empty() {
            // Regions become outlines over the coordinate layer
            let outlines: Vec<Value> = chart
                .regions
                .iter()
                .map(|r| {
                    json!({
                        "name": r.name,
                        "itemStyle": {"areaColor": AREA_COLOR, "borderColor": "#389BB7"},
                        "emphasis": {"itemStyle": {"areaColor": HIGHLIGHT_COLOR}}
                    })
                })
                .collect();
            layer["regions"] = json!(outlines);
        }
        geo = Some(layer);
        series.push(scatter_series(chart, max_value));
        legend_names.push(SCATTER_SERIES);
    }

    if !chart.heat_points.is_empty() {
        if geo.is_none() {
            geo = Some(geo_layer(level));
        }
        let data: Vec<Value> = chart
            .heat_points
            .iter()
            .map(|p| json!([p.longitude, p.latitude, p.value]))
            .collect();
        series.push(json!({
            "name": HEAT_SERIES,
            "type": "heatmap",
            "coordinateSystem": "geo",
            "data": data,
            "pointSize": 5,
            "blurSize": 6
        }));
        legend_names.push(HEAT_SERIES);
    }

    let mut config = json!({
        "title": title_block(title),
        "tooltip": tooltip_with_formatter(Trigger::Item, "{b}<br/>{c}"),
        "legend": vertical_legend(legend_names),
        "visualMap": {
            "min": 0,
            "max": max_value,
            "left": "left",
            "top": "bottom",
            "text": ["高", "低"],
            "calculable": true,
            "textStyle": {"color": TEXT_COLOR},
            "inRange": {"color": SCALE_COLORS}
        },
        "series": series,
        "backgroundColor": BACKGROUND_COLOR
    });
    if let Some(geo) = geo {
        config["geo"] = geo;
    }
    config
}

fn region_series(chart: &MapChart, level: &MapLevel) -> Value {
    let data: Vec<Value> = chart
        .regions
        .iter()
        .map(|r| json!({"name": r.name, "value": r.value}))
        .collect();
    json!({
        "name": REGION_SERIES,
        "type": "map",
        "map": level.map_id,
        "roam": true,
        "zoom": level.zoom,
        "center": [level.center.0, level.center.1],
        "data": data,
        "emphasis": {
            "itemStyle": {"areaColor": HIGHLIGHT_COLOR},
            "label": {"show": true, "color": "#000"}
        },
        "itemStyle": {"areaColor": AREA_COLOR, "borderColor": "#389BB7", "borderWidth": 1},
        "label": {"show": true, "color": TEXT_COLOR, "fontSize": 8}
    })
}

fn geo_layer(level: &MapLevel) -> Value {
    json!({
        "map": level.map_id,
        "roam": true,
        "zoom": level.zoom,
        "center": [level.center.0, level.center.1],
        "itemStyle": {"areaColor": AREA_COLOR, "borderColor": "#404a59", "borderWidth": 1},
        "emphasis": {"itemStyle": {"areaColor": "#2a333d"}}
    })
}

fn scatter_series(chart: &MapChart, max_value: f64) -> Value {
    let data: Vec<Value> = chart
        .scatter_points
        .iter()
        .map(|p| {
            json!({
                "name": p.name,
                "value": [p.longitude, p.latitude, p.value],
                "symbolSize": symbol_size(p.value, max_value)
            })
        })
        .collect();
    json!({
        "name": SCATTER_SERIES,
        "type": "scatter",
        "coordinateSystem": "geo",
        "data": data,
        "label": {
            "show": true,
            "position": "right",
            "formatter": "{b}",
            "color": TEXT_COLOR,
            "fontSize": 10
        },
        "itemStyle": {"color": "#00ff9f", "shadowBlur": 10, "shadowColor": "#333"},
        "emphasis": {"itemStyle": {"color": "#ff6b6b"}}
    })
}

/// Marker size grows linearly with the value, clamped to the scale.
fn symbol_size(value: f64, max_value: f64) -> f64 {
    if max_value <= 0.0 {
        return MIN_SYMBOL_SIZE;
    }
    let ratio = (value / max_value).clamp(0.0, 1.0);
    MIN_SYMBOL_SIZE + (MAX_SYMBOL_SIZE - MIN_SYMBOL_SIZE) * ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::Granularity;
    use crate::model::{HeatPoint, Labels, NamedValue, ScatterPoint};

    fn map_chart(regions: &[(&str, f64)], scatter: bool, heat: bool) -> MapChart {
        MapChart {
            regions: regions.iter().map(|(n, v)| NamedValue::new(*n, *v)).collect(),
            scatter_points: if scatter {
                vec![ScatterPoint {
                    name: "济南".to_string(),
                    longitude: 117.0,
                    latitude: 36.6,
                    value: 500.0,
                }]
            } else {
                vec![]
            },
            heat_points: if heat {
                vec![HeatPoint { longitude: 117.0, latitude: 36.6, value: 3.0 }]
            } else {
                vec![]
            },
            max_value: None,
            map_hint: None,
        }
    }

    fn spec(chart: MapChart) -> ChartSpec {
        ChartSpec {
            labels: Labels::default(),
            body: ChartBody::Map(chart),
        }
    }

    #[test]
    fn test_regions_only_is_choropleth() {
        let s = spec(map_chart(&[("济南", 100.0), ("青岛", 200.0)], false, false));
        let level = map_level(&s);
        assert_eq!(level.map_id, "shandong");
        let ChartBody::Map(chart) = &s.body else { unreachable!() };
        let config = compile(chart, "T", &level);

        let series = config["series"].as_array().unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0]["type"], "map");
        assert_eq!(series[0]["map"], "shandong");
        assert_eq!(series[0]["zoom"], 1.8);
        assert!(config.get("geo").is_none());
        assert_eq!(config["visualMap"]["max"], 1000.0);
        assert_eq!(config["visualMap"]["inRange"]["color"][0], "#50a3ba");
    }

    #[test]
    fn test_scatter_switches_to_geo_layer() {
        let s = spec(map_chart(&[("济南", 100.0)], true, false));
        let level = map_level(&s);
        assert_eq!(level.granularity, Granularity::City);
        let ChartBody::Map(chart) = &s.body else { unreachable!() };
        let config = compile(chart, "T", &level);

        assert_eq!(config["geo"]["map"], "jinan");
        assert_eq!(config["geo"]["regions"][0]["name"], "济南");
        let series = config["series"].as_array().unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0]["type"], "scatter");
        assert_eq!(series[0]["coordinateSystem"], "geo");
        assert_eq!(series[0]["data"][0]["symbolSize"], 19.0);
    }

    #[test]
    fn test_heat_layer_adds_geo() {
        let s = spec(map_chart(&[], false, true));
        let level = map_level(&s);
        let ChartBody::Map(chart) = &s.body else { unreachable!() };
        let config = compile(chart, "T", &level);
        assert_eq!(config["geo"]["map"], "china");
        assert_eq!(config["series"][0]["type"], "heatmap");
        assert_eq!(config["legend"]["data"][0], "热力分布");
    }

    #[test]
    fn test_map_hint_used_without_regions() {
        let mut chart = map_chart(&[], true, false);
        chart.map_hint = Some("guangdong".to_string());
        assert_eq!(map_level(&spec(chart)).map_id, "guangdong");
    }

    #[test]
    fn test_symbol_size_is_clamped() {
        assert_eq!(symbol_size(0.0, 100.0), MIN_SYMBOL_SIZE);
        assert_eq!(symbol_size(500.0, 100.0), MAX_SYMBOL_SIZE);
        assert_eq!(symbol_size(5.0, 0.0), MIN_SYMBOL_SIZE);
    }
}
