//! 西里尔字母检测
//!
//! 判断单元格是否包含需要翻译的内容：仅依据 U+0400–U+04FF 码位范围，不做语言识别。

use std::sync::LazyLock;

use regex::Regex;

use crate::table::Cell;

static CYRILLIC: LazyLock<Regex> = LazyLock::new(|| {
    // 字面量正则，编译不会失败
    Regex::new(r"[\u{0400}-\u{04FF}]").expect("cyrillic pattern")
});

/// 字符串是否含有西里尔字母；空串或仅含空白返回false
pub fn has_cyrillic(value: &str) -> bool {
    !value.trim().is_empty() && CYRILLIC.is_match(value)
}

/// 单元格是否可翻译：非空文本且含西里尔字母
pub fn cell_has_cyrillic(cell: &Cell) -> bool {
    cell.as_text().is_some_and(has_cyrillic)
}
