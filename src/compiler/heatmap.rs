use serde_json::{json, Value};

use super::{title_block, tooltip, Trigger, BACKGROUND_COLOR, TEXT_COLOR};
use crate::model::HeatmapChart;

const DEFAULT_MAX_VALUE: f64 = 100.0;

pub(super) fn compile(chart: &HeatmapChart, title: &str) -> Value {
    let data: Vec<Value> = chart
        .cells
        .iter()
        .map(|cell| json!([cell.x, cell.y, cell.value]))
        .collect();

    let mut tip = tooltip(Trigger::Axis);
    tip["position"] = json!("top");

    json!({
        "title": title_block(title),
        "tooltip": tip,
        "grid": {"height": "50%", "top": "10%"},
        "xAxis": {
            "type": "category",
            "data": chart.x_categories,
            "splitArea": {"show": true},
            "axisLabel": {"color": TEXT_COLOR}
        },
        "yAxis": {
            "type": "category",
            "data": chart.y_categories,
            "splitArea": {"show": true},
            "axisLabel": {"color": TEXT_COLOR}
        },
        "visualMap": {
            "min": 0,
            "max": chart.max_value.unwrap_or(DEFAULT_MAX_VALUE),
            "calculable": true,
            "orient": "horizontal",
            "left": "center",
            "bottom": "15%",
            "textStyle": {"color": TEXT_COLOR}
        },
        "series": [{
            "name": title,
            "type": "heatmap",
            "data": data,
            "label": {"show": true, "color": TEXT_COLOR},
            "emphasis": {"itemStyle": {"shadowBlur": 10, "shadowColor": "rgba(0, 0, 0, 0.5)"}}
        }],
        "backgroundColor": BACKGROUND_COLOR
    })
}
