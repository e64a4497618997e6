// Pie and rose (Nightingale) charts

use serde_json::{json, Value};

use super::{emphasis_shadow, title_block, tooltip_with_formatter, vertical_legend, Trigger, BACKGROUND_COLOR};
use crate::model::NamedValue;

const SHARE_FORMATTER: &str = "{a} <br/>{b}: {c} ({d}%)";

pub(super) fn compile_pie(items: &[NamedValue], title: &str) -> Value {
    let mut series = base_series(items, title);
    series["radius"] = json!("50%");
    series["animationDelay"] = json!(200);
    wrap(items, title, series)
}

/// Rose charts scale the radius with the value and leave a hole in the middle.
pub(super) fn compile_rose(items: &[NamedValue], title: &str) -> Value {
    let mut series = base_series(items, title);
    series["radius"] = json!([30, 110]);
    series["roseType"] = json!("area");
    wrap(items, title, series)
}

pub(super) fn item_data(items: &[NamedValue]) -> Vec<Value> {
    items
        .iter()
        .map(|item| json!({"name": item.name, "value": item.value}))
        .collect()
}

fn base_series(items: &[NamedValue], title: &str) -> Value {
    json!({
        "name": title,
        "type": "pie",
        "center": ["50%", "60%"],
        "data": item_data(items),
        "emphasis": emphasis_shadow(),
        "animationType": "scale",
        "animationEasing": "elasticOut"
    })
}

fn wrap(items: &[NamedValue], title: &str, series: Value) -> Value {
    json!({
        "title": title_block(title),
        "tooltip": tooltip_with_formatter(Trigger::Item, SHARE_FORMATTER),
        "legend": vertical_legend(items.iter().map(|i| i.name.as_str())),
        "series": [series],
        "backgroundColor": BACKGROUND_COLOR
    })
}
