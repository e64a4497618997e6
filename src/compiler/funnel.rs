use serde_json::{json, Value};

use super::pie::item_data;
use super::{emphasis_shadow, legend, title_block, tooltip_with_formatter, Trigger, BACKGROUND_COLOR, TEXT_COLOR};
use crate::model::NamedValue;

pub(super) fn compile(items: &[NamedValue], title: &str) -> Value {
    // Largest stage first, whatever the input order
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| b.value.total_cmp(&a.value));

    json!({
        "title": title_block(title),
        "tooltip": tooltip_with_formatter(Trigger::Item, "{a} <br/>{b}: {c} ({d}%)"),
        "legend": legend(sorted.iter().map(|i| i.name.as_str())),
        "series": [{
            "name": title,
            "type": "funnel",
            "left": "10%",
            "top": 60,
            "width": "80%",
            "height": "80%",
            "minSize": "0%",
            "maxSize": "100%",
            "sort": "descending",
            "gap": 2,
            "label": {"show": true, "position": "inside", "color": TEXT_COLOR},
            "labelLine": {"length": 10, "lineStyle": {"width": 1, "type": "solid"}},
            "itemStyle": {"borderColor": "#fff", "borderWidth": 1},
            "emphasis": emphasis_shadow(),
            "data": item_data(&sorted)
        }],
        "backgroundColor": BACKGROUND_COLOR
    })
}
