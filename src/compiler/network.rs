// Sankey flows and force-directed relation graphs

use serde_json::{json, Value};

use super::{legend, title_block, tooltip, Trigger, BACKGROUND_COLOR, TEXT_COLOR};
use crate::error::{ChartError, Result};
use crate::model::{ChartKind, NetworkChart, Node};

pub(super) fn compile_sankey(chart: &NetworkChart, title: &str) -> Result<Value> {
    // Sankey links may name a node by id; the renderer only knows names
    let find = |reference: &str| {
        chart
            .nodes
            .iter()
            .find(|n| n.name == reference)
            .or_else(|| chart.nodes.iter().find(|n| n.id.as_deref() == Some(reference)))
            .map(|n| n.name.as_str())
    };

    let nodes: Vec<Value> = chart.nodes.iter().map(|n| json!({"name": n.name})).collect();
    let links = chart
        .links
        .iter()
        .enumerate()
        .map(|(i, link)| {
            let source = find(&link.source).ok_or_else(|| unknown(ChartKind::Sankey, i, "source", &link.source))?;
            let target = find(&link.target).ok_or_else(|| unknown(ChartKind::Sankey, i, "target", &link.target))?;
            Ok(json!({"source": source, "target": target, "value": link.value}))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut tip = tooltip(Trigger::Item);
    tip["triggerOn"] = json!("mousemove");

    Ok(json!({
        "title": title_block(title),
        "tooltip": tip,
        "series": [{
            "type": "sankey",
            "layout": "none",
            "orient": "horizontal",
            "top": 60,
            "right": "10%",
            "bottom": "10%",
            "left": "10%",
            "nodeWidth": 20,
            "nodeGap": 8,
            "draggable": true,
            "data": nodes,
            "links": links,
            "lineStyle": {"color": "source", "curveness": 0.5},
            "label": {"color": TEXT_COLOR, "fontFamily": "Arial"},
            "emphasis": {"focus": "adjacency"}
        }],
        "backgroundColor": BACKGROUND_COLOR
    }))
}

pub(super) fn compile_graph(chart: &NetworkChart, title: &str) -> Result<Value> {
    for (i, link) in chart.links.iter().enumerate() {
        for (side, reference) in [("source", &link.source), ("target", &link.target)] {
            if !chart.nodes.iter().any(|n| n.graph_key() == reference) {
                return Err(unknown(ChartKind::Graph, i, side, reference));
            }
        }
    }

    let nodes: Vec<Value> = chart.nodes.iter().map(graph_node).collect();
    let links: Vec<Value> = chart
        .links
        .iter()
        .map(|l| json!({"source": l.source, "target": l.target, "value": l.value}))
        .collect();
    let categories: Vec<Value> = chart.categories.iter().map(|c| json!({"name": c})).collect();

    Ok(json!({
        "title": title_block(title),
        "tooltip": tooltip(Trigger::Item),
        "legend": legend(chart.categories.iter().map(String::as_str)),
        "series": [{
            "name": title,
            "type": "graph",
            "layout": "force",
            "data": nodes,
            "links": links,
            "categories": categories,
            "roam": true,
            "itemStyle": {
                "borderColor": "#fff",
                "borderWidth": 1,
                "shadowBlur": 10,
                "shadowColor": "rgba(0, 0, 0, 0.3)"
            },
            "label": {"show": true, "position": "right", "formatter": "{b}", "color": TEXT_COLOR},
            "lineStyle": {"color": "source", "curveness": 0.3},
            "emphasis": {"focus": "adjacency", "lineStyle": {"width": 10}},
            "force": {
                "repulsion": 100,
                "gravity": 0.1,
                "edgeLength": 30,
                "layoutAnimation": true
            }
        }],
        "backgroundColor": BACKGROUND_COLOR
    }))
}

fn graph_node(node: &Node) -> Value {
    let mut value = json!({"id": node.graph_key(), "name": node.name});
    if let Some(size) = node.size_hint {
        value["symbolSize"] = json!(size);
    }
    if let Some(category) = node.category_index {
        value["category"] = json!(category);
    }
    value
}

fn unknown(kind: ChartKind, index: usize, side: &str, reference: &str) -> ChartError {
    ChartError::schema(
        kind,
        format!("links[{}].{}", index, side),
        format!("refers to unknown node '{}'", reference),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Link;

    fn node(id: Option<&str>, name: &str) -> Node {
        Node {
            id: id.map(str::to_string),
            name: name.to_string(),
            size_hint: Some(30.0),
            category_index: Some(0),
        }
    }

    fn link(source: &str, target: &str) -> Link {
        Link {
            source: source.to_string(),
            target: target.to_string(),
            value: 5.0,
        }
    }

    #[test]
    fn test_sankey_resolves_ids_to_names() {
        let chart = NetworkChart {
            nodes: vec![node(Some("a"), "访问"), node(None, "注册")],
            links: vec![link("a", "注册")],
            categories: vec![],
        };
        let config = compile_sankey(&chart, "流向").unwrap();
        let series = &config["series"][0];
        assert_eq!(series["layout"], "none");
        assert_eq!(series["links"][0]["source"], "访问");
        assert_eq!(series["links"][0]["target"], "注册");
    }

    #[test]
    fn test_sankey_unknown_endpoint() {
        let chart = NetworkChart {
            nodes: vec![node(None, "A")],
            links: vec![link("A", "Z")],
            categories: vec![],
        };
        assert!(matches!(
            compile_sankey(&chart, "T").unwrap_err(),
            ChartError::SchemaValidation { kind: ChartKind::Sankey, .. }
        ));
    }

    #[test]
    fn test_graph_uses_force_layout_and_ids() {
        let chart = NetworkChart {
            nodes: vec![node(Some("u"), "用户"), node(None, "产品")],
            links: vec![link("u", "产品")],
            categories: vec!["核心".to_string()],
        };
        let config = compile_graph(&chart, "关系").unwrap();
        let series = &config["series"][0];
        assert_eq!(series["layout"], "force");
        assert_eq!(series["force"]["repulsion"], 100);
        assert_eq!(series["data"][0]["id"], "u");
        assert_eq!(series["data"][1]["id"], "产品");
        assert_eq!(series["data"][0]["symbolSize"], 30.0);
        assert_eq!(series["categories"][0]["name"], "核心");
        assert_eq!(config["legend"]["data"][0], "核心");
    }

    #[test]
    fn test_graph_rejects_name_when_id_present() {
        let chart = NetworkChart {
            nodes: vec![node(Some("u"), "用户")],
            links: vec![link("用户", "u")],
            categories: vec![],
        };
        assert!(compile_graph(&chart, "T").is_err());
    }
}
