//! # HEMCO_Config.rc 重写器与年份解析
//!
//! 为每个分段改写 `HEMCO_Config.rc` 中的气象年与排放年。
//!
//! ## 年份写法
//! - `2016`            固定年份
//! - `+2` / `-1`       相对分段开始年份的偏移，绝对值不超过 `MAX_YEAR_OFFSET`
//! - `2014,2015,2016`  逐分段列表，超出列表长度的分段沿用最后一项
//!
//! ## 格式说明
//! ```text
//! EmisYear:                    2016
//! MetYear:                     2016
//! ```
//! 冒号之后的数值右对齐，保持原有行宽。
//!
//! ## 依赖关系
//! - 被 `commands/schedule.rs`、`models/options.rs` 使用
//! - 使用 `parsers/mod.rs`

use super::split_ending;
use crate::error::{Result, ScheduleError};

use chrono::{Datelike, NaiveDate};

/// 文件名
pub const HEMCO_CONFIG: &str = "HEMCO_Config.rc";

const EMISSION_YEAR_MARKERS: [&str; 2] = ["Emission year: ", "EmisYear: "];
const MET_YEAR_MARKER: &str = "MetYear: ";

/// 年份偏移的最大绝对值
pub const MAX_YEAR_OFFSET: i32 = 9999;

/// 解析后的年份写法
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearSpec {
    Literal(i32),
    Offset(i32),
    List(Vec<i32>),
}

impl YearSpec {
    /// 解析年份写法，无法识别时返回 `AmbiguousYearSpec`
    pub fn parse(spec: &str) -> Result<Self> {
        let ambiguous = || ScheduleError::AmbiguousYearSpec {
            spec: spec.to_string(),
        };
        let text = spec.trim();

        if text.contains(',') {
            let years = text
                .split(',')
                .map(|item| parse_literal(item.trim()))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(ambiguous)?;
            return Ok(YearSpec::List(years));
        }

        if let Some(year) = parse_literal(text) {
            return Ok(YearSpec::Literal(year));
        }

        let (sign, digits) = match text.as_bytes().first() {
            Some(b'+') => (1, &text[1..]),
            Some(b'-') => (-1, &text[1..]),
            _ => return Err(ambiguous()),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ambiguous());
        }
        let offset: i32 = digits
            .parse()
            .ok()
            .filter(|o| *o <= MAX_YEAR_OFFSET)
            .ok_or_else(ambiguous)?;
        Ok(YearSpec::Offset(sign * offset))
    }

    /// 为第 `chunk_index` 个分段给出具体年份，偏移后溢出时返回 `None`
    pub fn resolve(&self, chunk_index: usize, chunk_start: NaiveDate) -> Option<i32> {
        match self {
            YearSpec::Literal(year) => Some(*year),
            YearSpec::Offset(offset) => chunk_start.year().checked_add(*offset),
            YearSpec::List(years) => {
                let i = chunk_index.min(years.len().saturating_sub(1));
                years.get(i).copied()
            }
        }
    }
}

fn parse_literal(text: &str) -> Option<i32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// 解析年份写法并计算具体年份
pub fn resolve_year(year_spec: &str, chunk_index: usize, chunk_start: NaiveDate) -> Result<i32> {
    YearSpec::parse(year_spec)?
        .resolve(chunk_index, chunk_start)
        .ok_or_else(|| ScheduleError::AmbiguousYearSpec {
            spec: year_spec.to_string(),
        })
}

/// 生成新的 HEMCO_Config.rc 行
pub fn rewrite_hemco_config(template_lines: &[String], met_year: i32, emis_year: i32) -> Vec<String> {
    template_lines
        .iter()
        .map(|line| {
            if EMISSION_YEAR_MARKERS.iter().any(|m| line.starts_with(m)) {
                replace_year(line, emis_year)
            } else if line.starts_with(MET_YEAR_MARKER) {
                replace_year(line, met_year)
            } else {
                line.clone()
            }
        })
        .collect()
}

/// 冒号后的值替换为右对齐的年份
fn replace_year(line: &str, year: i32) -> String {
    let (body, ending) = split_ending(line);
    // 标记本身包含冒号
    let colon = body.find(':').unwrap_or(body.len().saturating_sub(1));
    let (label, value) = body.split_at(colon + 1);
    let year = year.to_string();
    let width = value.chars().count().max(year.len());
    format!("{}{:>width$}{}", label, year, ending, width = width)
}
