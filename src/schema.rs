//! 结构对齐模块
//!
//! 将各数据源的原始列布局映射到规范布局：固定的人口学前缀、固定顺序的题目后缀。
//! 题目列不足时以缺失值补齐；列数与描述不符立即报错，不做静默吸收。

// 第三方crate导入
use tracing::{debug, info};

// 本地模块导入
use crate::api_constants::schema_config;
use crate::error::Result;
use crate::normalize::{CategoryTable, NormalizeReport};
use crate::reconcile_error;
use crate::table::{Cell, Header, RawTable};

/// 规范人口学字段的取值来源
#[derive(Debug, Clone, PartialEq)]
pub enum DemographicSource {
    /// 原样取原始列
    Column(usize),
    /// 取原始列并按查找表中的字段规范化
    Normalized { column: usize, field: String },
    /// 取原始列，空值时填"未询问"占位
    ColumnOrUnknown(usize),
    /// 该数据源未询问此字段，填"未询问"占位
    Unknown,
}

/// 规范布局
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalLayout {
    /// 人口学字段名称
    pub demographic_fields: Vec<String>,
    /// 题目字段数量
    pub item_count: usize,
}

impl CanonicalLayout {
    pub fn new(demographic_fields: &[&str], item_count: usize) -> Self {
        Self {
            demographic_fields: demographic_fields.iter().map(|s| s.to_string()).collect(),
            item_count,
        }
    }

    /// 参考布局：5个人口学字段 + 214道题目
    pub fn reference() -> Self {
        Self::new(
            &schema_config::DEMOGRAPHIC_NAMES,
            schema_config::CANONICAL_ITEMS,
        )
    }

    /// 规范宽度（不含来源列）
    pub fn width(&self) -> usize {
        self.demographic_fields.len() + self.item_count
    }
}

/// 数据源描述
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDescriptor {
    /// 数据源名称（用于日志与错误信息）
    pub name: String,
    /// 来源标记，写入合并结果的来源列
    pub provenance: String,
    /// 期望的原始列数
    pub raw_width: usize,
    /// 表头行数
    pub header_rows: usize,
    /// 每个规范人口学字段的来源，按规范顺序
    pub demographics: Vec<DemographicSource>,
    /// 题目列在原始表中的起始下标
    pub item_offset: usize,
    /// 题目列数量
    pub item_count: usize,
}

impl DatasetDescriptor {
    /// 旧版俄文导出：1行表头，5个人口学列 + 205道题
    ///
    /// 原始列：0 日期, 1 年龄, 2 性别, 3 专业/教育, 4 意见（不进入规范布局）。
    /// 该版本未询问人文背景。
    pub fn legacy() -> Self {
        Self {
            name: "legacy".to_string(),
            provenance: schema_config::LEGACY_TAG.to_string(),
            raw_width: schema_config::DEMOGRAPHIC_FIELDS + schema_config::LEGACY_ITEMS,
            header_rows: 1,
            demographics: vec![
                DemographicSource::Column(0),
                DemographicSource::Column(1),
                DemographicSource::Normalized {
                    column: 2,
                    field: crate::normalize::SEX_FIELD.to_string(),
                },
                DemographicSource::Unknown,
                DemographicSource::ColumnOrUnknown(3),
            ],
            item_offset: schema_config::DEMOGRAPHIC_FIELDS,
            item_count: schema_config::LEGACY_ITEMS,
        }
    }

    /// 新版英文导出：2行表头（标签、代码），已是规范布局
    pub fn current() -> Self {
        Self {
            name: "current".to_string(),
            provenance: schema_config::CURRENT_TAG.to_string(),
            raw_width: schema_config::DEMOGRAPHIC_FIELDS + schema_config::CANONICAL_ITEMS,
            header_rows: 2,
            demographics: (0..schema_config::DEMOGRAPHIC_FIELDS)
                .map(DemographicSource::Column)
                .collect(),
            item_offset: schema_config::DEMOGRAPHIC_FIELDS,
            item_count: schema_config::CANONICAL_ITEMS,
        }
    }

    /// 校验描述与规范布局是否相容
    pub fn validate(&self, layout: &CanonicalLayout) -> Result<()> {
        if self.demographics.len() != layout.demographic_fields.len() {
            return Err(reconcile_error!(
                config,
                format!("{}.demographics", self.name),
                format!(
                    "人口学字段数 {} 与规范布局 {} 不一致",
                    self.demographics.len(),
                    layout.demographic_fields.len()
                )
            ));
        }
        if self.item_count > layout.item_count {
            return Err(reconcile_error!(
                config,
                format!("{}.item_count", self.name),
                format!(
                    "题目列 {} 多于规范布局 {}，不允许截断",
                    self.item_count, layout.item_count
                )
            ));
        }
        if self.item_offset + self.item_count > self.raw_width {
            return Err(reconcile_error!(
                config,
                format!("{}.item_offset", self.name),
                "题目列超出原始列范围"
            ));
        }
        let out_of_range = self.demographics.iter().any(|source| match source {
            DemographicSource::Column(c)
            | DemographicSource::ColumnOrUnknown(c)
            | DemographicSource::Normalized { column: c, .. } => *c >= self.raw_width,
            DemographicSource::Unknown => false,
        });
        if out_of_range {
            return Err(reconcile_error!(
                config,
                format!("{}.demographics", self.name),
                "人口学列下标超出原始列范围"
            ));
        }
        Ok(())
    }
}

/// 对齐后的数据源
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    /// 来源标记
    pub provenance: String,
    /// 原始表头
    pub header: Header,
    /// 规范宽度的数据行
    pub rows: Vec<Vec<Cell>>,
}

/// 结构对齐器
#[derive(Debug, Clone)]
pub struct SchemaAligner {
    layout: CanonicalLayout,
    categories: CategoryTable,
}

impl SchemaAligner {
    pub fn new(layout: CanonicalLayout, categories: CategoryTable) -> Self {
        Self { layout, categories }
    }

    pub fn layout(&self) -> &CanonicalLayout {
        &self.layout
    }

    /// 将原始表格对齐到规范布局
    ///
    /// 输出行数恒等于原始行数减去表头行数。
    pub fn align(
        &self,
        raw: &RawTable,
        descriptor: &DatasetDescriptor,
        report: &mut NormalizeReport,
    ) -> Result<AlignedTable> {
        descriptor.validate(&self.layout)?;

        if raw.width() != descriptor.raw_width {
            return Err(reconcile_error!(
                schema,
                descriptor.name,
                descriptor.raw_width,
                raw.width()
            ));
        }
        if let Some(bad) = raw.rows.iter().find(|r| r.len() != descriptor.raw_width) {
            return Err(reconcile_error!(
                schema,
                descriptor.name,
                descriptor.raw_width,
                bad.len()
            ));
        }

        let (header, body) = raw.split_header(descriptor.header_rows);
        let padding = self.layout.item_count - descriptor.item_count;

        let rows = body
            .iter()
            .map(|row| self.align_row(row, descriptor, padding, report))
            .collect::<Vec<_>>();

        if padding > 0 {
            debug!("{}: 每行补齐 {} 个缺失题目列", descriptor.name, padding);
        }
        info!(
            "📐 {} 对齐完成: {} 行 -> {} 列",
            descriptor.name,
            rows.len(),
            self.layout.width()
        );

        Ok(AlignedTable {
            provenance: descriptor.provenance.clone(),
            header,
            rows,
        })
    }

    fn align_row(
        &self,
        row: &[Cell],
        descriptor: &DatasetDescriptor,
        padding: usize,
        report: &mut NormalizeReport,
    ) -> Vec<Cell> {
        let mut out = Vec::with_capacity(self.layout.width());

        for source in &descriptor.demographics {
            let cell = match source {
                DemographicSource::Column(c) => row[*c].clone(),
                DemographicSource::Normalized { column, field } => {
                    self.categories.normalize(field, &row[*column], report)
                }
                DemographicSource::ColumnOrUnknown(c) if row[*c].is_missing() => {
                    Cell::text(schema_config::UNKNOWN_MARKER)
                }
                DemographicSource::ColumnOrUnknown(c) => row[*c].clone(),
                DemographicSource::Unknown => Cell::text(schema_config::UNKNOWN_MARKER),
            };
            out.push(cell);
        }

        let items = &row[descriptor.item_offset..descriptor.item_offset + descriptor.item_count];
        out.extend(items.iter().cloned());
        out.extend(std::iter::repeat(Cell::Empty).take(padding));
        out
    }
}

impl Default for SchemaAligner {
    fn default() -> Self {
        Self::new(CanonicalLayout::reference(), CategoryTable::reference())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;

    fn legacy_row(sex: &str, education: Cell) -> Vec<Cell> {
        let mut row = vec![
            Cell::text("2023-03-01"),
            Cell::Number(34.0),
            Cell::text(sex),
            education,
            Cell::text("пожелания"),
        ];
        row.extend((0..schema_config::LEGACY_ITEMS).map(|i| Cell::Number((i % 2) as f64)));
        row
    }

    fn legacy_table(rows: Vec<Vec<Cell>>) -> RawTable {
        let header = (0..schema_config::DEMOGRAPHIC_FIELDS + schema_config::LEGACY_ITEMS)
            .map(|i| Cell::text(format!("Вопрос {}", i)))
            .collect();
        let mut all = vec![header];
        all.extend(rows);
        RawTable::new(all)
    }

    #[test]
    fn test_reference_descriptors_valid() {
        let layout = CanonicalLayout::reference();
        assert_eq!(layout.width(), 219);
        DatasetDescriptor::legacy().validate(&layout).unwrap();
        DatasetDescriptor::current().validate(&layout).unwrap();
    }

    #[test]
    fn test_legacy_row_padded_with_nine_missing() {
        let aligner = SchemaAligner::default();
        let raw = legacy_table(vec![legacy_row("Ж", Cell::text("филолог"))]);
        let mut report = NormalizeReport::default();

        let aligned = aligner.align(&raw, &DatasetDescriptor::legacy(), &mut report).unwrap();
        let row = &aligned.rows[0];

        assert_eq!(row.len(), 219);
        assert!(row[210..].iter().all(|c| *c == Cell::Empty));
        assert_eq!(row[210..].len(), 9);
        // 最后一个真实题目保留
        assert_eq!(row[209], Cell::Number(0.0));
    }

    #[test]
    fn test_legacy_demographics_mapping() {
        let aligner = SchemaAligner::default();
        let raw = legacy_table(vec![
            legacy_row("Ж", Cell::text("филолог")),
            legacy_row("м", Cell::Empty),
        ]);
        let mut report = NormalizeReport::default();

        let aligned = aligner.align(&raw, &DatasetDescriptor::legacy(), &mut report).unwrap();

        assert_eq!(aligned.rows[0][2], Cell::text("F"));
        assert_eq!(aligned.rows[0][3], Cell::text("-"));
        assert_eq!(aligned.rows[0][4], Cell::text("филолог"));
        assert_eq!(aligned.rows[1][2], Cell::text("M"));
        assert_eq!(aligned.rows[1][4], Cell::text("-"));
        assert_eq!(aligned.provenance, schema_config::LEGACY_TAG);
        assert_eq!(report.recognized, 2);
    }

    #[test]
    fn test_row_count_invariant() {
        let aligner = SchemaAligner::default();
        let rows = (0..7).map(|_| legacy_row("F", Cell::Empty)).collect();
        let raw = legacy_table(rows);
        let mut report = NormalizeReport::default();

        let aligned = aligner.align(&raw, &DatasetDescriptor::legacy(), &mut report).unwrap();
        assert_eq!(aligned.rows.len(), raw.height() - 1);
    }

    #[test]
    fn test_width_mismatch_fails_fast() {
        let aligner = SchemaAligner::default();
        let mut row = legacy_row("F", Cell::Empty);
        row.pop();
        let raw = RawTable::new(vec![row]);
        let mut report = NormalizeReport::default();

        let err = aligner
            .align(&raw, &DatasetDescriptor::legacy(), &mut report)
            .unwrap_err();
        match err {
            ReconcileError::SchemaMismatch { expected, actual, .. } => {
                assert_eq!(expected, 210);
                assert_eq!(actual, 209);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_descriptor_with_too_many_items_rejected() {
        let layout = CanonicalLayout::new(&["a"], 2);
        let descriptor = DatasetDescriptor {
            name: "wide".into(),
            provenance: "wide".into(),
            raw_width: 4,
            header_rows: 0,
            demographics: vec![DemographicSource::Column(0)],
            item_offset: 1,
            item_count: 3,
        };
        assert!(matches!(
            descriptor.validate(&layout),
            Err(ReconcileError::Configuration { .. })
        ));
    }

    #[test]
    fn test_current_source_passes_through() {
        let layout = CanonicalLayout::new(&["date", "age"], 3);
        let descriptor = DatasetDescriptor {
            name: "small".into(),
            provenance: "small".into(),
            raw_width: 5,
            header_rows: 2,
            demographics: vec![DemographicSource::Column(0), DemographicSource::Column(1)],
            item_offset: 2,
            item_count: 3,
        };
        let raw = RawTable::new(vec![
            ["Date", "Age", "Q1", "Q2", "Q3"].iter().map(|s| Cell::text(*s)).collect(),
            ["date", "age", "q1", "q2", "q3"].iter().map(|s| Cell::text(*s)).collect(),
            vec![
                Cell::text("2024-01-01"),
                Cell::Number(20.0),
                Cell::Number(1.0),
                Cell::Empty,
                Cell::Number(0.0),
            ],
        ]);
        let aligner = SchemaAligner::new(layout, CategoryTable::reference());
        let mut report = NormalizeReport::default();

        let aligned = aligner.align(&raw, &descriptor, &mut report).unwrap();
        assert_eq!(aligned.rows, vec![raw.rows[2].clone()]);
        assert!(aligned.header.has_codes());
    }
}
