use serde_json::{json, Value};

use super::{legend, title_block, tooltip, Trigger, BACKGROUND_COLOR, GRID_LINE_COLOR, TEXT_COLOR};
use crate::error::{ChartError, Result};
use crate::model::{ChartKind, RadarChart};

pub(super) fn compile(chart: &RadarChart, title: &str) -> Result<Value> {
    for (i, s) in chart.series.iter().enumerate() {
        if s.data.len() != chart.indicators.len() {
            return Err(ChartError::schema(
                ChartKind::Radar,
                format!("series[{}].data", i),
                format!("has {} values but there are {} indicators", s.data.len(), chart.indicators.len()),
            ));
        }
    }

    let indicators: Vec<Value> = chart
        .indicators
        .iter()
        .map(|ind| json!({"name": ind.name, "max": ind.max_value}))
        .collect();

    let data: Vec<Value> = chart
        .series
        .iter()
        .map(|s| {
            json!({
                "value": s.data,
                "name": s.name,
                "itemStyle": {"color": s.color},
                "areaStyle": {"opacity": 0.3}
            })
        })
        .collect();

    Ok(json!({
        "title": title_block(title),
        "tooltip": tooltip(Trigger::Item),
        "legend": legend(chart.series.iter().map(|s| s.name.as_str())),
        "radar": {
            "indicator": indicators,
            "name": {"textStyle": {"color": TEXT_COLOR}},
            "splitLine": {"lineStyle": {"color": GRID_LINE_COLOR}},
            "splitArea": {"show": false},
            "axisLine": {"lineStyle": {"color": GRID_LINE_COLOR}}
        },
        "series": [{
            "type": "radar",
            "data": data,
            "animationDuration": 1000
        }],
        "backgroundColor": BACKGROUND_COLOR
    }))
}
