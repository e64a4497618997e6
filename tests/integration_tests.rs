use serde_json::{json, Value};
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::Command;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use chartforge::config::AppConfig;
use chartforge::hooks::SystemBrowser;
use chartforge::runtime::ChartRenderer;
use chartforge::store::{CsvTableStore, SqliteTableStore};
use chartforge::tools::{builtin, ToolRegistry};

fn test_config(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.charts.output_dir = dir.join("charts");
    config.charts.figsize = [6.0, 4.0];
    config.charts.dpi = 72;
    config.charts.open_after_render = false;
    config.database.data_dir = dir.join("data");
    config.logging.file = None;
    config
}

fn registry(dir: &Path) -> ToolRegistry {
    let config = test_config(dir);
    builtin::registry(
        Arc::new(ChartRenderer::headless(&config)),
        Arc::new(CsvTableStore::new(&config.database.data_dir)),
        Arc::new(SystemBrowser),
    )
}

/// Artifact on disk for a `/static/charts/<file>` path.
fn artifact(dir: &Path, web_path: &str) -> std::path::PathBuf {
    let name = web_path.rsplit('/').next().unwrap();
    dir.join("charts").join(name)
}

fn embedded_option(html: &str) -> Value {
    let marker = "const CHART_OPTION = ";
    let start = html.find(marker).unwrap() + marker.len();
    let end = html[start..].find(";\n").unwrap() + start;
    serde_json::from_str(&html[start..end]).unwrap()
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

#[test]
fn test_end_to_end_pie_document() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());

    let response = registry.call(
        "renderChart",
        json!({
            "data": {"chartKind": "pie", "items": [{"name": "A", "value": 60}, {"name": "B", "value": 40}]},
            "title": "T"
        }),
    );
    assert!(response.success, "{:?}", response.error);

    let result = response.result.unwrap();
    let web_path = result["path"].as_str().unwrap();
    assert!(web_path.starts_with("/static/charts/dynamic_chart_"));
    assert!(web_path.ends_with(".html"));

    let html = fs::read_to_string(artifact(dir.path(), web_path)).unwrap();
    let option = embedded_option(&html);
    assert_eq!(option["series"][0]["type"], "pie");
    let data = option["series"][0]["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    let total: f64 = data.iter().map(|d| d["value"].as_f64().unwrap()).sum();
    assert_eq!(total, 100.0);
}

#[test]
fn test_mixed_json_text_with_two_axes() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());

    let spec = json!({
        "chart_type": "mixed",
        "x_data": ["1月", "2月", "3月"],
        "series": [
            {"name": "销售额", "type": "bar", "data": [120, 200, 150], "y_unit": "万元"},
            {"name": "增长率", "type": "line", "data": [5.2, 8.1, 6.3], "y_unit": "%"}
        ]
    });
    let response = registry.call("renderChart", json!({"data": spec.to_string(), "x_label": "月份"}));
    assert!(response.success, "{:?}", response.error);

    let web_path = response.result.unwrap()["path"].as_str().unwrap().to_string();
    let html = fs::read_to_string(artifact(dir.path(), &web_path)).unwrap();
    let option = embedded_option(&html);
    assert_eq!(option["yAxis"].as_array().unwrap().len(), 2);
    assert_eq!(option["series"][1]["yAxisIndex"], 1);
    assert_eq!(option["xAxis"]["name"], "月份");
}

#[test]
fn test_map_document_resolves_province() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());

    let response = registry.call(
        "renderChart",
        json!({"data": {"chart_type": "map", "regions": [{"name": "济南", "value": 10}, {"name": "青岛", "value": 20}]}}),
    );
    assert!(response.success, "{:?}", response.error);

    let web_path = response.result.unwrap()["path"].as_str().unwrap().to_string();
    let html = fs::read_to_string(artifact(dir.path(), &web_path)).unwrap();
    assert!(html.contains("const IS_MAP_CHART = true;"));
    assert!(html.contains("const MAP_ID = \"shandong\";"));
    assert_eq!(embedded_option(&html)["series"][0]["map"], "shandong");
}

#[test]
fn test_schema_errors_are_failure_responses() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());

    let three_units = json!({
        "x_data": ["A"],
        "series": [
            {"name": "a", "data": [1], "y_unit": "x"},
            {"name": "b", "data": [1], "y_unit": "y"},
            {"name": "c", "data": [1], "y_unit": "z"}
        ]
    });
    let response = registry.call("renderChart", json!({"data": three_units}));
    assert!(!response.success);
    assert!(response.error.unwrap().contains("mixed"));

    let bad_link = json!({
        "chart_type": "sankey",
        "nodes": [{"name": "a"}],
        "links": [{"source": "a", "target": "ghost", "value": 1}]
    });
    let response = registry.call("renderChart", json!({"data": bad_link}));
    assert!(!response.success);
    assert!(response.error.unwrap().contains("ghost"));

    assert!(!dir.path().join("charts").exists() || fs::read_dir(dir.path().join("charts")).unwrap().count() == 0);
}

#[test]
fn test_draw_chart_writes_png() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());

    let response = registry.call(
        "drawChart",
        json!({"x_str": "一月,二月,三月", "y_str": "10,20,15", "chart_type": "bar", "title": "销量"}),
    );
    assert!(response.success, "{:?}", response.error);

    let web_path = response.result.unwrap()["path"].as_str().unwrap().to_string();
    assert!(web_path.starts_with("/static/charts/bar_chart_"));
    let bytes = fs::read(artifact(dir.path(), &web_path)).unwrap();
    assert!(is_valid_png(&bytes), "Output is not a valid PNG");
}

#[test]
fn test_draw_chart_mixed_spec_writes_png() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());

    let spec = json!({
        "x_data": ["Q1", "Q2", "Q3"],
        "series": [
            {"name": "营收", "type": "bar", "data": [120, 200, 150], "y_unit": "万元"},
            {"name": "利润", "type": "bar", "data": [20, 45, 30], "y_unit": "万元"},
            {"name": "增长率", "type": "line", "data": [5.2, 8.1, 6.3], "y_unit": "%"}
        ]
    });
    let response = registry.call("drawChart", json!({"data": spec, "title": "季度"}));
    assert!(response.success, "{:?}", response.error);

    let web_path = response.result.unwrap()["path"].as_str().unwrap().to_string();
    assert!(web_path.starts_with("/static/charts/mixed_chart_"));
    assert!(web_path.ends_with(".png"));
    let bytes = fs::read(artifact(dir.path(), &web_path)).unwrap();
    assert!(is_valid_png(&bytes), "Output is not a valid PNG");
}

#[test]
fn test_draw_chart_length_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());
    let response = registry.call("drawChart", json!({"x_str": "A,B,C", "y_str": "1,2"}));
    assert!(!response.success);
}

#[test]
fn test_read_table_formats_rows() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data").join("rainfall.csv"), "month,mm\n1月,30\n2月,45\n").unwrap();

    let registry = registry(dir.path());
    let response = registry.call("readTable", json!({"table_name": "rainfall"}));
    assert!(response.success, "{:?}", response.error);
    let text = response.result.unwrap();
    let text = text.as_str().unwrap();
    assert!(text.contains("表 rainfall 的数据:"));
    assert!(text.contains("共 2 条记录"));

    let response = registry.call("readTable", json!({"table_name": "../rainfall"}));
    assert!(!response.success);
}

#[test]
fn test_read_sqlite_table() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("project_storage.db");
    let conn = rusqlite::Connection::open(&db).unwrap();
    conn.execute_batch("CREATE TABLE sales (city TEXT, amount INTEGER); INSERT INTO sales VALUES ('济南', 10), ('青岛', 20);")
        .unwrap();
    drop(conn);

    let config = test_config(dir.path());
    let registry = builtin::registry(
        Arc::new(ChartRenderer::headless(&config)),
        Arc::new(SqliteTableStore::new(&db)),
        Arc::new(SystemBrowser),
    );
    let response = registry.call("readTable", json!({"table_name": "sales"}));
    assert!(response.success, "{:?}", response.error);
    let text = response.result.unwrap();
    let text = text.as_str().unwrap();
    assert!(text.contains("表 sales 的数据:"));
    assert!(text.contains("青岛"));
    assert!(text.contains("共 2 条记录"));

    let response = registry.call("readTable", json!({"table_name": "missing"}));
    assert!(!response.success);
}

#[test]
fn test_cli_lists_tools() {
    let output = Command::new(env!("CARGO_BIN_EXE_chartforge"))
        .args(["--config", "/nonexistent/none.json", "tools"])
        .output()
        .unwrap();
    // An explicit config path must exist
    assert!(!output.status.success());

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("chartforge.json");
    fs::write(&config_path, r#"{"logging": {"file": null, "level": "warn"}}"#).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_chartforge"))
        .args(["--config", config_path.to_str().unwrap(), "tools"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let definitions: Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = definitions
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["drawChart", "openUrl", "readTable", "renderChart"]);
}

#[test]
fn test_cli_render_headless() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("chartforge.json");
    let config = json!({
        "charts": {"output_dir": dir.path().join("charts"), "open_after_render": false},
        "logging": {"file": null}
    });
    fs::write(&config_path, config.to_string()).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_chartforge"))
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "render",
            "--data",
            r#"{"chart_type":"funnel","data":[{"name":"a","value":3},{"name":"b","value":9}]}"#,
            "--title",
            "漏斗",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let response: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["success"], true);
    assert_eq!(response["result"]["chart_type"], "funnel");
}

#[test]
fn test_cli_render_delivers_notification() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = vec![0u8; 16 * 1024];
        let n = stream.read(&mut buf).unwrap();
        let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let _ = tx.send(String::from_utf8_lossy(&buf[..n]).to_string());
    });

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("chartforge.json");
    let config = json!({
        "charts": {"output_dir": dir.path().join("charts"), "open_after_render": false},
        "logging": {"file": null},
        "notifications": {"endpoint": endpoint, "timeout_secs": 5}
    });
    fs::write(&config_path, config.to_string()).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_chartforge"))
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "render",
            "--data",
            r#"{"chart_type":"pie","data":[{"name":"a","value":3},{"name":"b","value":9}]}"#,
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let request = rx.recv_timeout(Duration::from_secs(5)).expect("notification was not delivered");
    assert!(request.starts_with("POST /api/external-message"));
}
