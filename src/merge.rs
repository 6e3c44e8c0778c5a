//! 合并模块
//!
//! 按固定顺序拼接已对齐、已翻译的数据源（旧版在前，新版在后），
//! 为每行追加来源列，并以表头最完整的数据源构建两行表头。

// 第三方crate导入
use tracing::info;

// 本地模块导入
use crate::api_constants::schema_config;
use crate::error::Result;
use crate::reconcile_error;
use crate::schema::AlignedTable;
use crate::table::{Cell, Header};

/// 合并结果
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    /// 两行表头，已含来源列
    pub header: Header,
    /// 数据行，每行宽度 = 规范宽度 + 1
    pub rows: Vec<Vec<Cell>>,
}

impl MergedTable {
    /// 列数（含来源列）
    pub fn width(&self) -> usize {
        self.header.width()
    }

    /// 表头行 + 数据行
    pub fn to_rows(&self) -> Vec<Vec<Cell>> {
        let mut rows = self.header.to_rows();
        rows.extend(self.rows.iter().cloned());
        rows
    }
}

/// 选出表头最完整的数据源：具备代码行且宽度等于规范宽度；并列时取靠后者
fn richest_header<'a>(tables: &'a [AlignedTable], canonical_width: usize) -> Option<&'a Header> {
    tables
        .iter()
        .map(|t| &t.header)
        .filter(|h| h.width() == canonical_width)
        .max_by_key(|h| h.has_codes())
}

/// 合并已对齐的数据源
///
/// 输出行数恒等于各输入行数之和；任一行宽度不等于 `canonical_width` 时报错。
pub fn merge(tables: &[AlignedTable], canonical_width: usize) -> Result<MergedTable> {
    let mut header = richest_header(tables, canonical_width)
        .cloned()
        .ok_or_else(|| {
            reconcile_error!(
                config,
                "header",
                format!("没有数据源提供 {} 列的规范表头", canonical_width)
            )
        })?;
    header.push_column(schema_config::PROVENANCE_LABEL, schema_config::PROVENANCE_CODE);

    let total: usize = tables.iter().map(|t| t.rows.len()).sum();
    let mut rows = Vec::with_capacity(total);

    for table in tables {
        for row in &table.rows {
            if row.len() != canonical_width {
                return Err(reconcile_error!(
                    schema,
                    table.provenance,
                    canonical_width,
                    row.len()
                ));
            }
            let mut out = Vec::with_capacity(canonical_width + 1);
            out.extend(row.iter().cloned());
            out.push(Cell::text(table.provenance.as_str()));
            rows.push(out);
        }
        info!("🔗 合并 {}: {} 行", table.provenance, table.rows.len());
    }

    info!("✅ 合并完成: {} 行, {} 列", rows.len(), header.width());
    Ok(MergedTable { header, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;

    fn table(tag: &str, header: Header, rows: usize, width: usize) -> AlignedTable {
        AlignedTable {
            provenance: tag.to_string(),
            header,
            rows: (0..rows)
                .map(|r| (0..width).map(|c| Cell::Number((r * width + c) as f64)).collect())
                .collect(),
        }
    }

    fn labelled(width: usize, with_codes: bool) -> Header {
        Header {
            labels: (0..width).map(|i| format!("L{}", i)).collect(),
            codes: with_codes.then(|| (0..width).map(|i| format!("c{}", i)).collect()),
        }
    }

    #[test]
    fn test_row_count_and_width() {
        let a = table("legacy", labelled(2, false), 3, 4);
        let b = table("current", labelled(4, true), 5, 4);

        let merged = merge(&[a, b], 4).unwrap();

        assert_eq!(merged.rows.len(), 8);
        assert!(merged.rows.iter().all(|r| r.len() == 5));
        assert_eq!(merged.width(), 5);
    }

    #[test]
    fn test_order_and_provenance() {
        let a = table("legacy", labelled(3, false), 2, 3);
        let b = table("current", labelled(3, true), 1, 3);

        let merged = merge(&[a, b], 3).unwrap();

        let tags: Vec<_> = merged.rows.iter().map(|r| r[3].clone()).collect();
        assert_eq!(
            tags,
            vec![Cell::text("legacy"), Cell::text("legacy"), Cell::text("current")]
        );
        // 旧版第一行排在最前
        assert_eq!(merged.rows[0][0], Cell::Number(0.0));
    }

    #[test]
    fn test_header_from_richest_source() {
        let a = table("legacy", labelled(3, false), 1, 3);
        let b = table("current", labelled(3, true), 1, 3);

        let merged = merge(&[a, b], 3).unwrap();

        assert_eq!(merged.header.labels.last().map(String::as_str), Some("source"));
        let codes = merged.header.codes.as_ref().unwrap();
        assert_eq!(codes.len(), 4);
        assert_eq!(codes[3], "");
        assert_eq!(merged.to_rows().len(), 2 + 2);
    }

    #[test]
    fn test_misaligned_row_rejected() {
        let mut a = table("legacy", labelled(3, true), 1, 3);
        a.rows.push(vec![Cell::Empty]);

        let err = merge(&[a], 3).unwrap_err();
        assert!(matches!(err, ReconcileError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_missing_canonical_header_rejected() {
        let a = table("legacy", labelled(5, false), 1, 3);
        assert!(merge(&[a], 3).is_err());
    }

    #[test]
    fn test_empty_sources_merge_to_header_only() {
        let a = table("legacy", labelled(3, false), 0, 3);
        let b = table("current", labelled(3, true), 0, 3);

        let merged = merge(&[a, b], 3).unwrap();
        assert!(merged.rows.is_empty());
        assert_eq!(merged.width(), 4);
    }
}
