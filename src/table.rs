//! 表格数据模块
//!
//! 定义单元格、原始表格和两行表头，并提供CSV读写。
//! 输入文件约定：第0行为列标签，第1行为列代码（视数据源而定），其余为数据行。

// 标准库导入
use std::fmt;
use std::path::Path;

// 第三方crate导入
use tracing::debug;

// 本地模块导入
use crate::error::Result;
use crate::reconcile_error;

/// 单元格值
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// 缺失值
    Empty,
    /// 数值
    Number(f64),
    /// 文本（保留原样，不做裁剪）
    Text(String),
}

impl Cell {
    /// 从CSV字段解析单元格
    ///
    /// 只有写回时与原字段逐字相同的数值才解析为 `Number`；
    /// `007`、`1.50`、`1e3` 等写法保留为文本，保证读写往返不改变内容。
    pub fn parse(field: &str) -> Self {
        if field.trim().is_empty() {
            return Cell::Empty;
        }
        match field.parse::<f64>() {
            Ok(n) if n.is_finite() && Cell::Number(n).to_string() == field => Cell::Number(n),
            _ => Cell::Text(field.to_string()),
        }
    }

    /// 创建文本单元格
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// 若为文本则返回其内容
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 是否为缺失值（空单元格或仅含空白的文本）
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

/// 两行表头：可读标签与简短代码，按列下标对齐
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Header {
    pub labels: Vec<String>,
    pub codes: Option<Vec<String>>,
}

impl Header {
    /// 从表头行构造；第二行存在时作为代码行
    pub fn from_rows(rows: &[Vec<Cell>]) -> Self {
        let to_strings = |row: &Vec<Cell>| row.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        Self {
            labels: rows.first().map(to_strings).unwrap_or_default(),
            codes: rows.get(1).map(to_strings),
        }
    }

    /// 表头列数
    pub fn width(&self) -> usize {
        self.labels.len()
    }

    /// 是否同时具备标签与代码
    pub fn has_codes(&self) -> bool {
        self.codes.is_some()
    }

    /// 追加一列（标签、代码）
    pub fn push_column(&mut self, label: &str, code: &str) {
        self.labels.push(label.to_string());
        if let Some(codes) = self.codes.as_mut() {
            codes.push(code.to_string());
        }
    }

    /// 转换为表格行
    pub fn to_rows(&self) -> Vec<Vec<Cell>> {
        let to_cells = |values: &Vec<String>| {
            values
                .iter()
                .map(|v| if v.is_empty() { Cell::Empty } else { Cell::text(v.as_str()) })
                .collect::<Vec<_>>()
        };
        let mut rows = vec![to_cells(&self.labels)];
        if let Some(codes) = &self.codes {
            rows.push(to_cells(codes));
        }
        rows
    }
}

/// 原始表格（含表头行）
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// 列数（以第一行为准）
    pub fn width(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    /// 行数（含表头）
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// 所有行是否等宽
    pub fn is_rectangular(&self) -> bool {
        let width = self.width();
        self.rows.iter().all(|r| r.len() == width)
    }

    /// 拆分为表头与数据行
    pub fn split_header(&self, header_rows: usize) -> (Header, &[Vec<Cell>]) {
        let split = header_rows.min(self.rows.len());
        let (head, body) = self.rows.split_at(split);
        (Header::from_rows(head), body)
    }
}

/// 读取CSV表格
///
/// 不做隐式表头处理；行宽不齐视为输入错误。
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| reconcile_error!(file_op, path.display(), "读取", e))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::parse).collect::<Vec<_>>());
    }

    let table = RawTable::new(rows);
    if !table.is_rectangular() {
        return Err(reconcile_error!(
            input_validation,
            path.display(),
            "各行列数不一致"
        ));
    }

    debug!(
        "读取表格 {}: {} 行 x {} 列",
        path.display(),
        table.height(),
        table.width()
    );
    Ok(table)
}

/// 写入CSV表格，自动创建父目录
pub fn write_table<P: AsRef<Path>>(path: P, rows: &[Vec<Cell>]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| reconcile_error!(file_op, parent.display(), "创建目录", e))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_path(path)
        .map_err(|e| reconcile_error!(file_op, path.display(), "写入", e))?;

    for row in rows {
        writer
            .write_record(row.iter().map(|c| c.to_string()))
            .map_err(|e| reconcile_error!(file_op, path.display(), "写入", e))?;
    }
    writer
        .flush()
        .map_err(|e| reconcile_error!(file_op, path.display(), "写入", e))?;

    debug!("写入表格 {}: {} 行", path.display(), rows.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;

    #[test]
    fn test_cell_parse() {
        assert_eq!(Cell::parse(""), Cell::Empty);
        assert_eq!(Cell::parse("   "), Cell::Empty);
        assert_eq!(Cell::parse("25"), Cell::Number(25.0));
        assert_eq!(Cell::parse("3.5"), Cell::Number(3.5));
        assert_eq!(Cell::parse("Ж"), Cell::text("Ж"));
        assert_eq!(Cell::parse(" Донна "), Cell::text(" Донна "));
        // NaN/inf 不当作数值
        assert_eq!(Cell::parse("NaN"), Cell::text("NaN"));
        assert_eq!(Cell::parse("-4"), Cell::Number(-4.0));
    }

    #[test]
    fn test_non_canonical_numbers_stay_text() {
        for field in ["007", "1.50", "1e3", "+5", "12345678901234567890", " 25", "-0"] {
            assert_eq!(Cell::parse(field), Cell::text(field), "{field}");
        }
    }

    #[test]
    fn test_csv_round_trip_preserves_field_text() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        let line = "007,1.50,1e3,+5,12345678901234567890,42,0.25\n";
        std::fs::write(&input, line).unwrap();

        let table = read_table(&input).unwrap();
        write_table(&output, &table.rows).unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), line);
        assert_eq!(table.rows[0][5], Cell::Number(42.0));
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(25.0).to_string(), "25");
        assert_eq!(Cell::Number(2.5).to_string(), "2.5");
        assert_eq!(Cell::Empty.to_string(), "");
        assert_eq!(Cell::text("abc").to_string(), "abc");
    }

    #[test]
    fn test_header_push_column() {
        let mut header = Header {
            labels: vec!["Age".into()],
            codes: Some(vec!["age".into()]),
        };
        header.push_column("source", "");
        assert_eq!(header.width(), 2);
        assert_eq!(header.codes.as_ref().unwrap().len(), 2);

        let rows = header.to_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], Cell::Empty);
    }

    #[test]
    fn test_split_header() {
        let table = RawTable::new(vec![
            vec![Cell::text("Age"), Cell::text("Sex")],
            vec![Cell::text("age"), Cell::text("sex")],
            vec![Cell::Number(30.0), Cell::text("F")],
        ]);
        let (header, body) = table.split_header(2);
        assert_eq!(header.labels, vec!["Age", "Sex"]);
        assert_eq!(header.codes, Some(vec!["age".to_string(), "sex".to_string()]));
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_csv_round_trip_keeps_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("table.csv");
        let rows = vec![
            vec![Cell::text("Дата"), Cell::text("Возраст, лет")],
            vec![Cell::text("2023-01-01"), Cell::Number(41.0)],
            vec![Cell::Empty, Cell::text("нет")],
        ];

        write_table(&path, &rows).unwrap();
        let table = read_table(&path).unwrap();

        assert_eq!(table.height(), 3);
        assert_eq!(table.width(), 2);
        assert_eq!(table.rows, rows);
    }

    #[test]
    fn test_ragged_input_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        std::fs::write(&path, "a,b,c\n1,2\n").unwrap();

        let err = read_table(&path).unwrap_err();
        assert!(matches!(err, ReconcileError::InputValidation { .. }));
    }
}
