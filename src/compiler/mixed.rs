// Mixed bar/line charts with up to two value axes

use serde_json::{json, Value};

use super::{legend, title_block, tooltip, Trigger, BACKGROUND_COLOR, GRID_LINE_COLOR, TEXT_COLOR};
use crate::error::{ChartError, Result};
use crate::model::{ChartKind, Labels, MixedChart, RenderType, Series};
use crate::normalize::distinct_units;

/// Categories at least this long get rotated axis labels.
const ROTATE_LABELS_AT: usize = 8;

pub(super) fn compile(chart: &MixedChart, labels: &Labels) -> Result<Value> {
    let units = distinct_units(&chart.series);
    if units.len() > 2 {
        return Err(ChartError::schema(
            ChartKind::Mixed,
            "series[].y_unit",
            format!("uses {} distinct units, at most 2 are allowed", units.len()),
        ));
    }
    if let Some((i, s)) = chart
        .series
        .iter()
        .enumerate()
        .find(|(_, s)| s.data.len() != chart.categories.len())
    {
        return Err(ChartError::schema(
            ChartKind::Mixed,
            format!("series[{}].data", i),
            format!("has {} values but there are {} categories", s.data.len(), chart.categories.len()),
        ));
    }

    let series: Vec<Value> = chart
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let axis_index = units.iter().position(|u| *u == s.y_axis_unit).unwrap_or(0);
            series_config(i, s, axis_index)
        })
        .collect();

    let y_axes: Vec<Value> = units
        .iter()
        .enumerate()
        .map(|(slot, unit)| value_axis(unit, slot))
        .collect();

    let longest = chart.categories.iter().map(|c| c.chars().count()).max().unwrap_or(0);
    let rotate = if longest >= ROTATE_LABELS_AT { 45 } else { 0 };

    Ok(json!({
        "title": title_block(&labels.title),
        "tooltip": tooltip(Trigger::Axis),
        "legend": legend(chart.series.iter().map(|s| s.name.as_str())),
        "grid": {
            "left": "3%",
            "right": "4%",
            "bottom": "3%",
            "containLabel": true,
            "backgroundColor": "rgba(0, 0, 0, 0.1)",
            "borderColor": "#333"
        },
        "xAxis": {
            "type": "category",
            "data": chart.categories,
            "name": labels.x_axis,
            "nameTextStyle": {"color": TEXT_COLOR, "fontSize": 12},
            "axisLine": {"lineStyle": {"color": TEXT_COLOR}},
            "axisLabel": {"color": TEXT_COLOR, "rotate": rotate}
        },
        "yAxis": y_axes,
        "series": series,
        "animationEasing": "cubicOut",
        "animationDuration": 1000,
        "backgroundColor": BACKGROUND_COLOR
    }))
}

fn value_axis(unit: &str, slot: usize) -> Value {
    // Only the primary axis draws grid lines
    let split_line = if slot == 0 {
        json!({"lineStyle": {"color": GRID_LINE_COLOR}})
    } else {
        json!({"show": false})
    };
    json!({
        "type": "value",
        "name": unit,
        "nameTextStyle": {"color": TEXT_COLOR, "fontSize": 12},
        "axisLine": {"lineStyle": {"color": TEXT_COLOR}},
        "axisLabel": {"color": TEXT_COLOR},
        "splitLine": split_line
    })
}

fn series_config(index: usize, series: &Series, axis_index: usize) -> Value {
    let mut config = json!({
        "name": series.name,
        "type": series.render_type.as_str(),
        "data": series.data,
        "yAxisIndex": axis_index,
        "itemStyle": {"color": series.color},
        "label": {"show": true, "position": "top", "color": TEXT_COLOR},
        "animationDelay": index * 100
    });

    match series.render_type {
        RenderType::Line => {
            config["smooth"] = json!(true);
            config["symbol"] = json!(series.marker.as_deref().unwrap_or("circle"));
            config["symbolSize"] = json!(8);
            config["lineStyle"] = json!({
                "width": 3,
                "shadowColor": series.color,
                "shadowBlur": 10
            });
        }
        RenderType::Bar => {
            // Bars in one category sit side by side; nothing is stacked
            config["barMaxWidth"] = json!(60);
            config["barGap"] = json!("10%");
            config["emphasis"] = super::emphasis_shadow();
        }
    }
    config
}
