//! # input.geos 重写器
//!
//! 按固定列偏移改写 GEOS-Chem 的 `input.geos` 配置文件。
//!
//! ## 格式说明
//! ```text
//! Start YYYYMMDD, hhmmss  : 20120101 000000
//! End   YYYYMMDD, hhmmss  : 20120109 000000
//! Read and save CSPEC_FULL: f
//! Schedule output for JAN : 3000000000000000000000000000000
//! 0         1         2         3
//! 0123456789012345678901234567890123456789
//! ```
//! - 日期字段位于第 26..34 列
//! - CSPEC 标志位于第 26 列
//! - 输出计划行的月份缩写位于第 20..23 列，逐日位图从第 26 列开始，
//!   第 d 天对应第 25+d 列
//!
//! 其余所有字节原样保留。
//!
//! ## 依赖关系
//! - 被 `commands/schedule.rs` 使用
//! - 使用 `calendar.rs`、`parsers/mod.rs`

use super::split_ending;
use crate::calendar::{format_date, parse_date, Step};
use crate::error::{Result, ScheduleError};

use chrono::{Datelike, NaiveDate};
use std::ops::Range;

/// 文件名（用于错误信息）
pub const INPUT_GEOS: &str = "input.geos";

pub const START_MARKER: &str = "Start YYYYMMDD";
pub const END_MARKER: &str = "End   YYYYMMDD";
pub const CSPEC_MARKER: &str = "Read and save CSPEC_FULL:";
pub const SCHEDULE_MARKER: &str = "Schedule output for";

/// 开始/结束日期字段
pub const DATE_FIELD: Range<usize> = 26..34;
/// CSPEC 标志所在列
pub const CSPEC_FLAG_COLUMN: usize = 26;
/// 强制写入的 CSPEC 标志
pub const CSPEC_FLAG_TOKEN: &str = "T";
/// 输出计划行中的月份缩写
pub const SCHEDULE_MONTH_FIELD: Range<usize> = 20..23;
/// 输出计划位图起始列（第 1 天）
pub const SCHEDULE_BITMAP_START: usize = 26;
/// 表示“在该日输出”的位图数字
pub const OUTPUT_SENTINEL: u8 = b'3';

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// 为一个分段生成新的 input.geos
///
/// 输出与输入行数相同、顺序相同；未识别的行逐字复制。
pub fn rewrite_config(
    start: NaiveDate,
    end: NaiveDate,
    template_lines: &[String],
    step: Step,
) -> Result<Vec<String>> {
    template_lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            rewrite_line(line, start, end, step)
                .map_err(|reason| ScheduleError::malformed(INPUT_GEOS, Some(i + 1), reason))
        })
        .collect()
}

fn rewrite_line(
    line: &str,
    start: NaiveDate,
    end: NaiveDate,
    step: Step,
) -> std::result::Result<String, String> {
    if line.starts_with(START_MARKER) {
        replace_date_field(line, start)
    } else if line.starts_with(END_MARKER) {
        replace_date_field(line, end)
    } else if line.starts_with(CSPEC_MARKER) {
        force_cspec_flag(line)
    } else if line.starts_with(SCHEDULE_MARKER) {
        update_output_line(line, end, step)
    } else {
        Ok(line.to_string())
    }
}

/// 读取模拟的开始与结束日期
pub fn read_run_dates(lines: &[String]) -> Result<(NaiveDate, NaiveDate)> {
    let mut start = None;
    let mut end = None;

    for (i, line) in lines.iter().enumerate() {
        let slot = if line.starts_with(START_MARKER) {
            &mut start
        } else if line.starts_with(END_MARKER) {
            &mut end
        } else {
            continue;
        };
        let date = read_date_field(line).ok_or_else(|| {
            ScheduleError::malformed(
                INPUT_GEOS,
                Some(i + 1),
                format!("expected a YYYYMMDD date in columns {:?}", DATE_FIELD),
            )
        })?;
        *slot = Some(date);
    }

    match (start, end) {
        (Some(s), Some(e)) => Ok((s, e)),
        (None, _) => Err(ScheduleError::malformed(
            INPUT_GEOS,
            None,
            format!("no '{}' line", START_MARKER),
        )),
        (_, None) => Err(ScheduleError::malformed(
            INPUT_GEOS,
            None,
            format!("no '{}' line", END_MARKER),
        )),
    }
}

/// 读取日期字段
pub fn read_date_field(line: &str) -> Option<NaiveDate> {
    line.get(DATE_FIELD).and_then(parse_date)
}

/// 替换日期字段，字段外的字节（包括时分秒）保持不变
pub fn replace_date_field(line: &str, date: NaiveDate) -> std::result::Result<String, String> {
    let (body, ending) = split_ending(line);
    let field = body
        .get(DATE_FIELD)
        .filter(|f| f.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| format!("expected an 8 digit date in columns {:?}", DATE_FIELD))?;
    debug_assert_eq!(field.len(), DATE_FIELD.len());

    Ok(format!(
        "{}{}{}{}",
        &body[..DATE_FIELD.start],
        format_date(date),
        &body[DATE_FIELD.end..],
        ending
    ))
}

/// 强制 CSPEC 标志为 `T`，丢弃原值
pub fn force_cspec_flag(line: &str) -> std::result::Result<String, String> {
    let (body, ending) = split_ending(line);
    let prefix = body
        .get(..CSPEC_FLAG_COLUMN)
        .ok_or_else(|| format!("expected a flag in column {}", CSPEC_FLAG_COLUMN))?;
    Ok(format!("{}{}{}", prefix, CSPEC_FLAG_TOKEN, ending))
}

/// 改写单个输出计划行
///
/// 清零整个位图，再把 `end` 的日号位置设为 `3`。仅当该行月份与 `end`
/// 的月份相同时才设置；按月步进时每个月份行都设置，因为分段总是落在
/// 相同的日号上。
pub fn update_output_line(
    line: &str,
    end: NaiveDate,
    step: Step,
) -> std::result::Result<String, String> {
    let (body, ending) = split_ending(line);

    let month = body
        .get(SCHEDULE_MONTH_FIELD)
        .filter(|m| MONTH_ABBREVIATIONS.contains(m))
        .ok_or_else(|| {
            format!(
                "expected a month name (JAN..DEC) in columns {:?}",
                SCHEDULE_MONTH_FIELD
            )
        })?;

    let bitmap_len = body
        .get(SCHEDULE_BITMAP_START..)
        .map(|rest| rest.bytes().take_while(u8::is_ascii_digit).count())
        .unwrap_or(0);
    if bitmap_len == 0 {
        return Err(format!(
            "expected a day-of-month bitmap from column {}",
            SCHEDULE_BITMAP_START
        ));
    }

    let mut bitmap = vec![b'0'; bitmap_len];
    let end_month = MONTH_ABBREVIATIONS[end.month0() as usize];
    if month == end_month || step.is_monthly() {
        // 位图比日号短（例如 30 天的月份遇到 31 日）时不设置
        if let Some(slot) = bitmap.get_mut(end.day0() as usize) {
            *slot = OUTPUT_SENTINEL;
        }
    }

    let bitmap_end = SCHEDULE_BITMAP_START + bitmap_len;
    Ok(format!(
        "{}{}{}{}",
        &body[..SCHEDULE_BITMAP_START],
        String::from_utf8_lossy(&bitmap),
        &body[bitmap_end..],
        ending
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    const WEEK: Step = Step::Weeks(1);
    const MONTH: Step = Step::Months(1);

    #[test]
    fn test_field_columns() {
        let line = "Start YYYYMMDD, hhmmss  : 20120101 000000\n";
        assert_eq!(&line[DATE_FIELD], "20120101");
        assert_eq!(&line[..CSPEC_FLAG_COLUMN], "Start YYYYMMDD, hhmmss  : ");

        let line = "Schedule output for MAR : 3000000000000000000000000000000\n";
        assert_eq!(&line[SCHEDULE_MONTH_FIELD], "MAR");
        assert_eq!(line.as_bytes()[SCHEDULE_BITMAP_START], b'3');
    }

    #[test]
    fn test_update_output_line_same_month() {
        let out = update_output_line(
            "Schedule output for MAR : 3000000000000000000000000000000\n",
            d("20140305"),
            WEEK,
        )
        .unwrap();
        assert_eq!(out, "Schedule output for MAR : 0000300000000000000000000000000\n");
    }

    #[test]
    fn test_update_output_line_other_month_clears() {
        let out = update_output_line(
            "Schedule output for MAR : 3000000000000000000000000000000\n",
            d("20140405"),
            WEEK,
        )
        .unwrap();
        assert_eq!(out, "Schedule output for MAR : 0000000000000000000000000000000\n");
    }

    #[test]
    fn test_update_output_line_last_day() {
        let out = update_output_line(
            "Schedule output for AUG : 0000000000030000000000000000000\n",
            d("20140831"),
            WEEK,
        )
        .unwrap();
        assert_eq!(out, "Schedule output for AUG : 0000000000000000000000000000003\n");

        let out = update_output_line(
            "Schedule output for JUN : 333333333333333333333333333333\n",
            d("20150630"),
            WEEK,
        )
        .unwrap();
        assert_eq!(out, "Schedule output for JUN : 000000000000000000000000000003\n");
    }

    #[test]
    fn test_update_output_line_short_month_unchanged() {
        let line = "Schedule output for APR : 000000000000000000000000000000\n";
        assert_eq!(update_output_line(line, d("20140831"), WEEK).unwrap(), line);
        // 按月步进也不能越过 30 天位图
        assert_eq!(update_output_line(line, d("20140831"), MONTH).unwrap(), line);
    }

    #[test]
    fn test_update_output_line_monthly_flags_every_month() {
        let out = update_output_line(
            "Schedule output for JUL : 0000000000000000000000000000000\n",
            d("20140201"),
            MONTH,
        )
        .unwrap();
        assert_eq!(out, "Schedule output for JUL : 3000000000000000000000000000000\n");
    }

    #[test]
    fn test_update_output_line_keeps_trailing_text() {
        let out = update_output_line(
            "Schedule output for MAR : 3000000000000000000000000000000  ! comment\r\n",
            d("20140302"),
            WEEK,
        )
        .unwrap();
        assert_eq!(
            out,
            "Schedule output for MAR : 0300000000000000000000000000000  ! comment\r\n"
        );
    }

    #[test]
    fn test_update_output_line_malformed() {
        let err = update_output_line(
            "Schedule output for ??? : 3000000000000000000000000000000\n",
            d("20140305"),
            WEEK,
        )
        .unwrap_err();
        assert!(err.contains("JAN..DEC"));

        assert!(update_output_line("Schedule output for MAR : \n", d("20140305"), WEEK).is_err());
        assert!(update_output_line("Schedule output for", d("20140305"), WEEK).is_err());
    }

    #[test]
    fn test_rewrite_config() {
        let template = lines(&[
            "Start YYYYMMDD, hhmmss  : 20120101 000000\n",
            "End   YYYYMMDD, hhmmss  : 20120109 000000\n",
            "Read and save CSPEC_FULL: f\n",
            "Schedule output for JAN : 3000000000000000000000000000000\n",
            "Schedule output for JUL : 3000000000000000000000000000000\n",
            "Schedule output for JUN : 300000000000000000000000000000\n",
        ]);
        let expected = lines(&[
            "Start YYYYMMDD, hhmmss  : 20130601 000000\n",
            "End   YYYYMMDD, hhmmss  : 20130608 000000\n",
            "Read and save CSPEC_FULL: T\n",
            "Schedule output for JAN : 0000000000000000000000000000000\n",
            "Schedule output for JUL : 0000000000000000000000000000000\n",
            "Schedule output for JUN : 000000030000000000000000000000\n",
        ]);

        let out = rewrite_config(d("20130601"), d("20130608"), &template, WEEK).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_rewrite_config_is_idempotent_and_copies_other_lines() {
        let template = lines(&[
            "GEOS-CHEM UNIT TEST SIMULATION: v11-01\n",
            "------------------------+------------------------------------------------------\n",
            "%%% SIMULATION MENU %%% :\n",
            "Start YYYYMMDD, hhmmss  : 20120101 000000\n",
            "End   YYYYMMDD, hhmmss  : 20130101 000000\n",
            "Run directory           : ./\n",
            "Schedule output for FEB : 33333333333333333333333333333\n",
            "END OF FILE             :",
        ]);

        let a = rewrite_config(d("20120201"), d("20120301"), &template, MONTH).unwrap();
        let b = rewrite_config(d("20120201"), d("20120301"), &template, MONTH).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), template.len());

        for i in [0, 1, 2, 5, 7] {
            assert_eq!(a[i], template[i]);
        }
        assert_eq!(a[3], "Start YYYYMMDD, hhmmss  : 20120201 000000\n");
        assert_eq!(a[4], "End   YYYYMMDD, hhmmss  : 20120301 000000\n");
        assert_eq!(a[6], "Schedule output for FEB : 30000000000000000000000000000\n");
    }

    #[test]
    fn test_rewrite_config_reports_line() {
        let template = lines(&["Run directory : ./\n", "Start YYYYMMDD, hhmm\n"]);
        match rewrite_config(d("20120201"), d("20120301"), &template, MONTH) {
            Err(ScheduleError::MalformedTemplate { location, .. }) => {
                assert_eq!(location, "line 2")
            }
            other => panic!("expected MalformedTemplate, got {:?}", other),
        }
    }

    #[test]
    fn test_read_run_dates() {
        let template = lines(&[
            "Start YYYYMMDD, hhmmss  : 20100102 123456\n",
            "End   YYYYMMDD, hhmmss  : 20110102 123456",
        ]);
        let (start, end) = read_run_dates(&template).unwrap();
        assert_eq!(start, d("20100102"));
        assert_eq!(end, d("20110102"));

        let missing = lines(&["Start YYYYMMDD, hhmmss  : 20100102 123456\n"]);
        assert!(read_run_dates(&missing).is_err());
    }
}
