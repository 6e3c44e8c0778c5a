//! 分类字段规范化
//!
//! 以声明式查找表描述"字段名 → {识别值 → 规范值}"，加载时校验重复与歧义。
//! 未识别的值原样透传（去除首尾空白），并计入报告以便排查源数据中的笔误。

// 标准库导入
use std::collections::HashMap;

// 第三方crate导入
use tracing::debug;

// 本地模块导入
use crate::error::Result;
use crate::reconcile_error;
use crate::table::Cell;

/// 性别字段名
pub const SEX_FIELD: &str = "sex";

/// 分类查找表
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    /// 字段名 → (大写识别值 → 规范值)
    fields: HashMap<String, HashMap<String, String>>,
}

/// 规范化统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    /// 命中查找表的次数
    pub recognized: usize,
    /// 透传的非空未识别值
    pub passed_through: usize,
}

impl CategoryTable {
    /// 构建查找表
    ///
    /// `entries` 为 (字段名, [(识别值, 规范值)])。同一字段中同一识别值
    /// 对应不同规范值，或识别值为空，均为配置错误。
    pub fn build<'a, I, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut fields: HashMap<String, HashMap<String, String>> = HashMap::new();

        for (field, pairs) in entries {
            let lookup = fields.entry(field.to_string()).or_default();
            for (variant, canonical) in pairs {
                let key = variant.trim().to_uppercase();
                if key.is_empty() {
                    return Err(reconcile_error!(config, field, "识别值不能为空"));
                }
                match lookup.get(&key) {
                    Some(existing) if existing != canonical => {
                        return Err(reconcile_error!(
                            config,
                            field,
                            format!(
                                "识别值 {:?} 同时映射到 {:?} 和 {:?}",
                                variant, existing, canonical
                            )
                        ));
                    }
                    _ => {
                        lookup.insert(key, canonical.to_string());
                    }
                }
            }
        }

        Ok(Self { fields })
    }

    /// 内置查找表：性别代码
    pub fn reference() -> Self {
        let table = Self::build([(
            SEX_FIELD,
            [
                ("Ж", "F"),
                ("F", "F"),
                ("FEMALE", "F"),
                ("М", "M"),
                ("M", "M"),
                ("МУЖ", "M"),
                ("MALE", "M"),
            ],
        )]);
        // 内置表在测试中校验过，不会产生冲突
        table.unwrap_or_default()
    }

    /// 字段是否在表中
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// 查找规范值（不区分大小写，忽略首尾空白）
    pub fn lookup(&self, field: &str, value: &str) -> Option<&str> {
        self.fields
            .get(field)?
            .get(&value.trim().to_uppercase())
            .map(String::as_str)
    }

    /// 规范化单元格
    ///
    /// 数值与空值原样返回；文本命中时返回规范值，否则返回去除空白后的原值。
    pub fn normalize(&self, field: &str, cell: &Cell, report: &mut NormalizeReport) -> Cell {
        let Some(text) = cell.as_text() else {
            return cell.clone();
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }

        match self.lookup(field, trimmed) {
            Some(canonical) => {
                report.recognized += 1;
                Cell::text(canonical)
            }
            None => {
                report.passed_through += 1;
                debug!("未识别的{}取值，原样保留: {:?}", field, trimmed);
                Cell::text(trimmed)
            }
        }
    }
}
