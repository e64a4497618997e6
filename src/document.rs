//! Self-contained HTML documents for compiled charts.
//!
//! The document loads the chart runtime from a CDN, embeds the config tree
//! as a literal and adds the viewer affordances (refresh, export, theme
//! toggle, resize). Map charts also get a client-side boundary loader that
//! walks an ordered list of sources and falls back to rendering without
//! geometry once every source has failed.

use serde_json::Value;

use crate::compiler::ConfigTree;
use crate::error::{ChartError, Result};
use crate::gazetteer::GAZETTEER;

pub const ECHARTS_CDN: &str = "https://unpkg.com/echarts@5.4.3/dist/echarts.min.js";
pub const WORDCLOUD_CDN: &str = "https://cdn.jsdelivr.net/npm/echarts-wordcloud@2.0.0/dist/echarts-wordcloud.min.js";

/// Delay before the boundary loader starts, in milliseconds.
const MAP_LOAD_DELAY_MS: u32 = 1000;

/// Build the HTML document for a compiled config.
///
/// `map_id` selects the boundary sources; it is ignored unless the config
/// actually draws a map.
pub fn assemble(config: &ConfigTree, title: &str, map_id: &str) -> Result<String> {
    let option = serde_json::to_string_pretty(config)
        .map_err(|e| ChartError::malformed(format!("config cannot be serialized: {}", e)))?;

    let is_map = draws_map(config);
    let sources: Vec<String> = if is_map {
        GAZETTEER.boundary_sources(map_id)
    } else {
        Vec::new()
    };
    let sources = serde_json::to_string(&sources)
        .map_err(|e| ChartError::malformed(format!("map sources cannot be serialized: {}", e)))?;
    let title_js = serde_json::to_string(title)
        .map_err(|e| ChartError::malformed(format!("title cannot be serialized: {}", e)))?;
    let map_id_js = serde_json::to_string(map_id)
        .map_err(|e| ChartError::malformed(format!("map id cannot be serialized: {}", e)))?;

    let is_map_js = if is_map { "true" } else { "false" };
    let delay = MAP_LOAD_DELAY_MS.to_string();
    let title_html = html_escape(title);
    let title_js = script_safe(&title_js);
    let map_id_js = script_safe(&map_id_js);
    let sources = script_safe(&sources);
    let option = script_safe(&option);

    Ok(fill_template(
        TEMPLATE,
        &[
            ("__ECHARTS_CDN__", ECHARTS_CDN),
            ("__WORDCLOUD_CDN__", WORDCLOUD_CDN),
            ("__TITLE_HTML__", title_html.as_str()),
            ("__TITLE_JS__", title_js.as_str()),
            ("__MAP_ID__", map_id_js.as_str()),
            ("__MAP_SOURCES__", sources.as_str()),
            ("__IS_MAP__", is_map_js),
            ("__MAP_DELAY__", delay.as_str()),
            ("__CHART_OPTION__", option.as_str()),
        ],
    ))
}

/// Substitute every marker in a single left-to-right pass. Substituted
/// text is never scanned again, so values may contain marker names.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find("__") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match values.iter().find(|(marker, _)| tail.starts_with(marker)) {
            Some((marker, value)) => {
                out.push_str(value);
                rest = &tail[marker.len()..];
            }
            None => {
                out.push('_');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// True when the config needs registered boundary geometry.
pub fn draws_map(config: &ConfigTree) -> bool {
    let has_map_series = config
        .get("series")
        .and_then(Value::as_array)
        .map(|series| series.iter().any(|s| s.get("type").and_then(Value::as_str) == Some("map")))
        .unwrap_or(false);
    has_map_series || config.get("geo").is_some()
}

fn html_escape(text: &str) -> String {
    askama_escape::escape(text, askama_escape::Html).to_string()
}

/// Keep embedded JSON from closing the surrounding script element.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

const TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="zh-CN">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>__TITLE_HTML__</title>
    <script src="__ECHARTS_CDN__"></script>
    <script src="__WORDCLOUD_CDN__"></script>
    <style>
        body {
            margin: 0;
            padding: 20px;
            background: linear-gradient(135deg, #1a1a1a 0%, #2d2d2d 100%);
            font-family: 'Microsoft YaHei', Arial, sans-serif;
            min-height: 100vh;
        }
        .container {
            max-width: 1200px;
            margin: 0 auto;
            background: rgba(255, 255, 255, 0.05);
            border-radius: 15px;
            padding: 20px;
            box-shadow: 0 8px 32px rgba(0, 0, 0, 0.3);
            border: 1px solid rgba(255, 255, 255, 0.1);
            animation: fadeIn 0.8s ease-out;
        }
        #chart {
            width: 100%;
            height: 600px;
            border-radius: 10px;
            background: rgba(0, 0, 0, 0.2);
        }
        .info {
            text-align: center;
            color: #ffffff;
            margin-bottom: 20px;
            font-size: 14px;
            opacity: 0.8;
        }
        .controls {
            display: flex;
            justify-content: center;
            gap: 15px;
            margin-top: 20px;
        }
        .btn {
            padding: 10px 20px;
            border: none;
            border-radius: 25px;
            background: linear-gradient(45deg, #00ff9f, #00cc7f);
            color: white;
            cursor: pointer;
            font-size: 14px;
            transition: all 0.3s ease;
            box-shadow: 0 4px 15px rgba(0, 255, 159, 0.3);
        }
        .btn:hover { transform: translateY(-2px); }
        @keyframes fadeIn {
            from { opacity: 0; transform: translateY(20px); }
            to { opacity: 1; transform: translateY(0); }
        }
    </style>
</head>
<body>
    <div class="container">
        <div class="info">
            <h2 style="color: #00ff9f; margin: 0;">__TITLE_HTML__</h2>
            <p>动态交互式图表 - 鼠标悬停查看详细数据</p>
        </div>
        <div id="chart"></div>
        <div class="controls">
            <button class="btn" onclick="refreshChart()">刷新动画</button>
            <button class="btn" onclick="downloadChart()">下载图片</button>
            <button class="btn" onclick="toggleTheme()">切换主题</button>
        </div>
    </div>

    <script>
        const CHART_TITLE = __TITLE_JS__;
        const CHART_OPTION = __CHART_OPTION__;
        const IS_MAP_CHART = __IS_MAP__;
        const MAP_ID = __MAP_ID__;
        const MAP_SOURCES = __MAP_SOURCES__;
        const DARK_TEXT = ['#ffffff', '#fff'];
        const LIGHT_TEXT = '#333333';
        let isDarkTheme = true;

        function freshOption() {
            return JSON.parse(JSON.stringify(CHART_OPTION));
        }

        function handleError(error, context) {
            console.error('图表错误 (' + context + '):', error);
            const chartDom = document.getElementById('chart');
            chartDom.innerHTML = '<div style="display: flex; align-items: center; justify-content: center; height: 100%; color: #ff6b6b; text-align: center; flex-direction: column;">' +
                '<h3>图表加载失败</h3>' +
                '<p>错误信息: ' + (error && error.message ? error.message : error) + '</p>' +
                '<p>上下文: ' + context + '</p>' +
                '<p>请检查网络连接或刷新页面重试</p>' +
                '</div>';
        }

        // Boundary data is accepted either as a plain GeoJSON collection or
        // as a world collection filtered down to the target features.
        function extractGeometry(geoData) {
            if (!geoData || !Array.isArray(geoData.features)) {
                return null;
            }
            if (MAP_ID !== 'china') {
                return geoData;
            }
            const china = geoData.features.filter(f => f.properties && (
                f.properties.NAME_ZH === '中国' || f.properties.name === '中国' ||
                f.properties.NAME === 'China' || f.properties.name === 'China'));
            if (china.length > 0) {
                return { type: 'FeatureCollection', features: china };
            }
            return geoData;
        }

        function tryLoadMapData(chart, urls, index) {
            if (index >= urls.length) {
                console.warn('所有在线地图数据源加载失败，使用简化显示');
                chart.setOption(freshOption());
                return;
            }
            console.log('尝试加载地图数据:', urls[index]);
            fetch(urls[index])
                .then(response => {
                    if (!response.ok) {
                        throw new Error('HTTP ' + response.status);
                    }
                    return response.json();
                })
                .then(geoData => {
                    const geometry = extractGeometry(geoData);
                    if (!geometry) {
                        throw new Error('无法识别地图数据格式');
                    }
                    echarts.registerMap(MAP_ID, geometry);
                    chart.setOption(freshOption());
                    console.log('地图数据加载成功:', MAP_ID);
                })
                .catch(error => {
                    console.warn('地图数据加载失败:', urls[index], error.message);
                    tryLoadMapData(chart, urls, index + 1);
                });
        }

        function initChart() {
            try {
                if (typeof echarts === 'undefined') {
                    throw new Error('ECharts未加载');
                }
                const chart = echarts.init(document.getElementById('chart'));
                window.myChart = chart;

                if (IS_MAP_CHART) {
                    setTimeout(() => {
                        try {
                            tryLoadMapData(chart, MAP_SOURCES, 0);
                        } catch (mapError) {
                            handleError(mapError, '地图数据加载');
                        }
                    }, __MAP_DELAY__);
                } else {
                    chart.setOption(freshOption());
                }

                chart.on('error', params => handleError(params, '图表渲染'));
            } catch (error) {
                handleError(error, '图表初始化');
            }
        }

        if (document.readyState === 'loading') {
            document.addEventListener('DOMContentLoaded', initChart);
        } else {
            initChart();
        }

        window.addEventListener('resize', function() {
            if (window.myChart) {
                window.myChart.resize();
            }
        });

        function refreshChart() {
            if (window.myChart) {
                window.myChart.clear();
                window.myChart.setOption(themedOption());
            }
        }

        function downloadChart() {
            if (window.myChart) {
                const url = window.myChart.getDataURL({
                    type: 'png',
                    pixelRatio: 2,
                    backgroundColor: isDarkTheme ? '#1a1a1a' : '#ffffff'
                });
                const link = document.createElement('a');
                link.download = CHART_TITLE + '_' + new Date().toISOString().slice(0, 19).replace(/:/g, '-') + '.png';
                link.href = url;
                link.click();
            }
        }

        // Rewrites text colors only; series data is never visited.
        function recolorText(node, color) {
            if (Array.isArray(node)) {
                node.forEach(child => recolorText(child, color));
                return;
            }
            if (!node || typeof node !== 'object') {
                return;
            }
            Object.keys(node).forEach(key => {
                if (key === 'data' || key === 'links') {
                    return;
                }
                const value = node[key];
                if (key === 'color' && typeof value === 'string' && DARK_TEXT.includes(value.toLowerCase())) {
                    node[key] = color;
                } else {
                    recolorText(value, color);
                }
            });
        }

        function themedOption() {
            const option = freshOption();
            if (!isDarkTheme) {
                option.backgroundColor = '#ffffff';
                recolorText(option, LIGHT_TEXT);
            }
            return option;
        }

        function toggleTheme() {
            if (!window.myChart) {
                return;
            }
            isDarkTheme = !isDarkTheme;
            document.body.style.background = isDarkTheme
                ? 'linear-gradient(135deg, #1a1a1a 0%, #2d2d2d 100%)'
                : 'linear-gradient(135deg, #f5f5f5 0%, #e8e8e8 100%)';
            window.myChart.setOption(themedOption(), true);
        }
    </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pie_config() -> ConfigTree {
        json!({
            "title": {"text": "T"},
            "series": [{"type": "pie", "data": [{"name": "A", "value": 1}]}]
        })
    }

    /// Pull the embedded option back out of a document.
    fn embedded_option(html: &str) -> Value {
        let start = html.find("const CHART_OPTION = ").unwrap() + "const CHART_OPTION = ".len();
        let end = html[start..].find(";\n        const IS_MAP_CHART").unwrap() + start;
        serde_json::from_str(&html[start..end]).unwrap()
    }

    #[test]
    fn test_embeds_config_verbatim() {
        let html = assemble(&pie_config(), "T", "china").unwrap();
        assert_eq!(embedded_option(&html), pie_config());
        assert!(html.contains(ECHARTS_CDN));
        assert!(html.contains("typeof echarts === 'undefined'"));
        assert!(html.contains("function refreshChart()"));
        assert!(html.contains("function downloadChart()"));
        assert!(html.contains("function toggleTheme()"));
        assert!(html.contains("addEventListener('resize'"));
        assert!(!html.contains("__"));
    }

    #[test]
    fn test_non_map_has_no_sources() {
        let html = assemble(&pie_config(), "T", "shandong").unwrap();
        assert!(html.contains("const IS_MAP_CHART = false;"));
        assert!(html.contains("const MAP_SOURCES = [];"));
    }

    #[test]
    fn test_map_document_lists_sources_in_order() {
        let config = json!({"series": [{"type": "map", "map": "shandong"}]});
        let html = assemble(&config, "地图", "shandong").unwrap();
        assert!(html.contains("const IS_MAP_CHART = true;"));
        let full = html.find("370000_full.json").unwrap();
        let plain = html.find("370000.json").unwrap();
        assert!(full < plain);
        assert!(html.contains("const MAP_ID = \"shandong\";"));
    }

    #[test]
    fn test_title_is_escaped() {
        let html = assemble(&pie_config(), "<b>A&B</b>", "china").unwrap();
        assert!(html.contains("<title>&lt;b&gt;A&amp;B&lt;"));
        assert!(!html.contains("</b>\";"));
    }

    #[test]
    fn test_marker_named_title_is_not_expanded() {
        let html = assemble(&pie_config(), "__IS_MAP__", "china").unwrap();
        assert!(html.contains("<title>__IS_MAP__</title>"));
        assert!(html.contains("const CHART_TITLE = \"__IS_MAP__\";"));
        assert!(html.contains("const IS_MAP_CHART = false;"));

        let config = json!({"series": [{"type": "pie", "data": [{"name": "<img src=x onerror=alert(1)>", "value": 1}]}]});
        let html = assemble(&config, "__CHART_OPTION__", "china").unwrap();
        assert!(html.contains("<title>__CHART_OPTION__</title>"));
        assert_eq!(html.matches("<img").count(), 1);
        assert_eq!(embedded_option(&html), config);
    }

    #[test]
    fn test_fill_template_single_pass() {
        let filled = fill_template("a __X__ b __Y__ c__", &[("__X__", "__Y__"), ("__Y__", "y")]);
        assert_eq!(filled, "a __Y__ b y c__");
    }

    #[test]
    fn test_script_close_in_data_is_neutralized() {
        let config = json!({"series": [{"type": "pie", "data": [{"name": "</script>", "value": 1}]}]});
        let html = assemble(&config, "T", "china").unwrap();
        assert_eq!(html.matches("</script>").count(), 3);
        assert_eq!(embedded_option(&html), config);
    }

    #[test]
    fn test_geo_counts_as_map() {
        assert!(draws_map(&json!({"geo": {}, "series": []})));
        assert!(!draws_map(&json!({"series": [{"type": "bar"}]})));
    }
}
