use anyhow::{anyhow, bail, Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::config::{DatabaseConfig, TableBackend};

/// A table read from the persistent store, every cell as text.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }
}

pub trait TableStore: Send + Sync {
    fn read_table(&self, name: &str) -> Result<TableData>;
}

/// Store selected by the `database` config section.
pub fn from_config(config: &DatabaseConfig) -> Arc<dyn TableStore> {
    match config.backend {
        TableBackend::Sqlite => Arc::new(SqliteTableStore::new(&config.path)),
        TableBackend::Csv => Arc::new(CsvTableStore::new(&config.data_dir)),
    }
}

/// Tables of one SQLite database file, opened read-only per call.
#[derive(Debug, Clone)]
pub struct SqliteTableStore {
    path: PathBuf,
}

impl SqliteTableStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn connect(&self) -> Result<Connection> {
        if !self.path.exists() {
            bail!("Database file does not exist: {}", self.path.display());
        }
        Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open database: {}", self.path.display()))
    }

    /// User tables, internal `sqlite_*` tables excluded.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        list_tables(&conn)
    }
}

impl TableStore for SqliteTableStore {
    fn read_table(&self, name: &str) -> Result<TableData> {
        validate_table_name(name)?;
        let conn = self.connect()?;
        // Only names listed by the catalog ever reach the query text
        if !list_tables(&conn)?.iter().any(|t| t == name) {
            bail!("Table '{}' does not exist", name);
        }

        let sql = format!("SELECT * FROM {}", quote_identifier(name));
        let mut stmt = conn
            .prepare(&sql)
            .with_context(|| format!("Failed to query table '{}'", name))?;
        let headers: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut cells = Vec::with_capacity(headers.len());
            for i in 0..headers.len() {
                cells.push(cell_text(row.get_ref(i)?));
            }
            rows.push(cells);
        }

        debug!(table = name, rows = rows.len(), "read table");
        Ok(TableData::new(headers, rows))
    }
}

fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to list tables")?;
    Ok(names)
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn cell_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// One `<name>.csv` file per table under a data directory.
#[derive(Debug, Clone)]
pub struct CsvTableStore {
    data_dir: PathBuf,
}

impl CsvTableStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn table_path(&self, name: &str) -> Result<PathBuf> {
        validate_table_name(name)?;
        Ok(self.data_dir.join(format!("{}.csv", name)))
    }
}

impl TableStore for CsvTableStore {
    fn read_table(&self, name: &str) -> Result<TableData> {
        let path = self.table_path(name)?;
        if !path.exists() {
            bail!("Table '{}' does not exist", name);
        }
        let table = read_csv(&path)?;
        debug!(table = name, rows = table.rows.len(), "read table");
        Ok(table)
    }
}

/// Table names are plain identifiers, never paths.
fn validate_table_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Table name must not be empty");
    }
    if name.contains("..") || name.contains('/') || name.contains('\\') || Path::new(name).is_absolute() {
        return Err(anyhow!("Invalid table name '{}'", name));
    }
    Ok(())
}

fn read_csv(path: &Path) -> Result<TableData> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open table file: {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read table header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read row {}", i + 1))?;
        let mut row: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok(TableData::new(headers, rows))
}

/// Render a table as aligned text columns with a record count.
pub fn format_table(name: &str, table: &TableData) -> String {
    if table.rows.is_empty() {
        return format!("表 {} 没有数据", name);
    }

    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (i, value) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(value.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:w$}", c, w = *w))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let mut output = vec![format!("\n表 {} 的数据:", name), line(&table.headers)];
    output.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"));
    output.extend(table.rows.iter().map(|r| line(r)));
    output.push(format!("\n共 {} 条记录", table.rows.len()));
    output.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn table() -> TableData {
        TableData::new(
            vec!["id".to_string(), "city".to_string()],
            vec![
                vec!["1".to_string(), "济南".to_string()],
                vec!["22".to_string(), "Qingdao".to_string()],
            ],
        )
    }

    #[test]
    fn test_format_table() {
        let text = format_table("cities", &table());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "表 cities 的数据:");
        assert_eq!(lines[2], "id | city   ");
        assert_eq!(lines[3], "---+--------");
        assert_eq!(lines[4], "1  | 济南     ");
        assert!(text.ends_with("共 2 条记录"));
    }

    #[test]
    fn test_format_empty_table() {
        let empty = TableData::new(vec!["id".to_string()], vec![]);
        assert_eq!(format_table("t", &empty), "表 t 没有数据");
    }

    #[test]
    fn test_rejects_path_names() {
        assert!(validate_table_name("../secrets").is_err());
        assert!(validate_table_name("a/b").is_err());
        assert!(validate_table_name("  ").is_err());
        assert!(validate_table_name("rainfall_2024").is_ok());
    }

    fn sqlite_fixture(dir: &Path) -> PathBuf {
        let path = dir.join("project_storage.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE rainfall (month TEXT, mm REAL, note TEXT);
             INSERT INTO rainfall VALUES ('1月', 12.5, NULL), ('2月', 30, 'wet');
             CREATE TABLE \"odd \"\"name\"\"\" (id INTEGER);
             CREATE TABLE empty (id INTEGER);",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_read_sqlite_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteTableStore::new(sqlite_fixture(dir.path()));

        let data = store.read_table("rainfall").unwrap();
        assert_eq!(data.headers, vec!["month", "mm", "note"]);
        assert_eq!(data.rows[0], vec!["1月", "12.5", "NULL"]);
        assert_eq!(data.rows[1], vec!["2月", "30", "wet"]);

        assert!(store.read_table("empty").unwrap().rows.is_empty());
        assert!(store.read_table("odd \"name\"").unwrap().rows.is_empty());
        assert_eq!(store.table_names().unwrap(), vec!["empty", "odd \"name\"", "rainfall"]);
    }

    #[test]
    fn test_sqlite_rejects_unknown_tables() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteTableStore::new(sqlite_fixture(dir.path()));
        let err = store.read_table("rainfall; DROP TABLE rainfall").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert_eq!(store.read_table("rainfall").unwrap().rows.len(), 2);

        let missing = SqliteTableStore::new(dir.path().join("none.db"));
        assert!(missing.read_table("rainfall").is_err());
    }

    #[test]
    fn test_read_csv_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rain.csv"), "month, mm\n1,12.5\n2\n").unwrap();

        let store = CsvTableStore::new(dir.path());
        let data = store.read_table("rain").unwrap();
        assert_eq!(data.headers, vec!["month", "mm"]);
        assert_eq!(data.rows[0], vec!["1", "12.5"]);
        assert_eq!(data.rows[1], vec!["2", ""]);
        assert!(store.read_table("missing").is_err());
    }
}
