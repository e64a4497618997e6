use serde_json::{json, Value};

use super::pie::item_data;
use super::{title_block, tooltip, Trigger, BACKGROUND_COLOR, TEXT_COLOR};
use crate::model::NamedValue;

pub(super) fn compile(words: &[NamedValue], title: &str) -> Value {
    let mut tip = tooltip(Trigger::Item);
    tip["show"] = json!(true);

    json!({
        "title": title_block(title),
        "tooltip": tip,
        "series": [{
            "type": "wordCloud",
            "shape": "circle",
            "left": "center",
            "top": "center",
            "width": "70%",
            "height": "80%",
            "sizeRange": [12, 60],
            "rotationRange": [-90, 90],
            "rotationStep": 45,
            "gridSize": 8,
            "drawOutOfBound": false,
            "textStyle": {"fontFamily": "sans-serif", "fontWeight": "bold", "color": TEXT_COLOR},
            "emphasis": {"textStyle": {"shadowBlur": 10, "shadowColor": "#333"}},
            "data": item_data(words)
        }],
        "backgroundColor": BACKGROUND_COLOR
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wordcloud_layout_constants() {
        let config = compile(&[NamedValue::new("Rust", 100.0)], "词云");
        let series = &config["series"][0];
        assert_eq!(series["type"], "wordCloud");
        assert_eq!(series["sizeRange"], json!([12, 60]));
        assert_eq!(series["rotationRange"], json!([-90, 90]));
        assert_eq!(series["rotationStep"], 45);
        assert_eq!(series["shape"], "circle");
        assert!(config.get("xAxis").is_none());
    }
}
