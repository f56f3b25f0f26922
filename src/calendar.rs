//! # 日历步进器
//!
//! 把 (开始日期, 结束日期, 步长) 切分成有序的分段边界日期列表。
//!
//! ## 步长
//! - 月: `12month`, `9month`, `6month`, `3month`, `2month`, `1month`, `month`
//! - 周: `2week`, `fortnight`, `1week`, `week`
//! - 日: `3day`, `1day`, `day`
//!
//! ## 边界规则
//! 每次步进后才检查是否已到达结束日期，因此最后一个边界总是 ≥ 结束日期，
//! 不会被截回到结束日期。步长不能整除时最后一段会略微越过名义结束日期。
//!
//! 月步长总是从开始日期累加 `k * N` 个月（日号不存在时取该月最后一天），
//! 所以 1 月 31 日开始的月步长不会漂移成 28 日。
//!
//! ## 依赖关系
//! - 被 `commands/schedule.rs`、`parsers/` 使用
//! - 使用 `models/chunk.rs`
//! - 使用 `chrono`

use crate::error::{Result, ScheduleError};
use crate::models::ChunkBoundaryList;

use chrono::{Days, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// GEOS-Chem 日期格式
pub const DATE_FORMAT: &str = "%Y%m%d";

/// 分段步长
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Months(u32),
    Weeks(u32),
    Days(u32),
}

/// 可接受的步长记号
pub const STEP_TOKENS: &[(&str, Step)] = &[
    ("12month", Step::Months(12)),
    ("9month", Step::Months(9)),
    ("6month", Step::Months(6)),
    ("3month", Step::Months(3)),
    ("2month", Step::Months(2)),
    ("1month", Step::Months(1)),
    ("month", Step::Months(1)),
    ("2week", Step::Weeks(2)),
    ("fortnight", Step::Weeks(2)),
    ("1week", Step::Weeks(1)),
    ("week", Step::Weeks(1)),
    ("3day", Step::Days(3)),
    ("1day", Step::Days(1)),
    ("day", Step::Days(1)),
];

impl Step {
    /// 是否为按月步进
    pub fn is_monthly(&self) -> bool {
        matches!(self, Step::Months(_))
    }

    /// 从 `origin` 前进 `k` 个步长
    pub fn advance(&self, origin: NaiveDate, k: u32) -> Option<NaiveDate> {
        match *self {
            Step::Months(n) => origin.checked_add_months(Months::new(n.checked_mul(k)?)),
            Step::Weeks(n) => origin.checked_add_days(Days::new(7 * u64::from(n) * u64::from(k))),
            Step::Days(n) => origin.checked_add_days(Days::new(u64::from(n) * u64::from(k))),
        }
    }

    fn allowed_tokens() -> String {
        STEP_TOKENS
            .iter()
            .map(|(token, _)| *token)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for Step {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim().to_lowercase();
        STEP_TOKENS
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, step)| *step)
            .ok_or_else(|| ScheduleError::InvalidStep {
                value: s.to_string(),
                allowed: Step::allowed_tokens(),
            })
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Months(n) => write!(f, "{}month", n),
            Step::Weeks(n) => write!(f, "{}week", n),
            Step::Days(n) => write!(f, "{}day", n),
        }
    }
}

/// 计算分段边界
///
/// 返回列表首元素为 `start`，末元素 ≥ `end`。`end <= start` 时只含 `start`。
pub fn compute_boundaries(start: NaiveDate, end: NaiveDate, step: Step) -> Result<ChunkBoundaryList> {
    let mut dates = vec![start];
    let mut current = start;
    let mut k: u32 = 0;

    while current < end {
        k += 1;
        current = step
            .advance(start, k)
            .ok_or_else(|| ScheduleError::DateOutOfRange {
                date: format_date(current),
            })?;
        dates.push(current);
    }

    Ok(ChunkBoundaryList::new(dates))
}

/// 解析 YYYYMMDD
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

/// 格式化为 YYYYMMDD
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn stamps(list: &ChunkBoundaryList) -> Vec<String> {
        list.dates().iter().map(|x| format_date(*x)).collect()
    }

    #[test]
    fn test_monthly_boundaries() {
        let step: Step = "month".parse().unwrap();
        let list = compute_boundaries(d("20070101"), d("20080101"), step).unwrap();
        assert_eq!(
            stamps(&list),
            vec![
                "20070101", "20070201", "20070301", "20070401", "20070501", "20070601",
                "20070701", "20070801", "20070901", "20071001", "20071101", "20071201",
                "20080101",
            ]
        );
    }

    #[test]
    fn test_weekly_boundaries() {
        let step: Step = "week".parse().unwrap();
        let list = compute_boundaries(d("20140720"), d("20140831"), step).unwrap();
        assert_eq!(
            stamps(&list),
            vec!["20140720", "20140727", "20140803", "20140810", "20140817", "20140824", "20140831"]
        );
    }

    #[test]
    fn test_daily_boundaries() {
        let step: Step = "day".parse().unwrap();
        let list = compute_boundaries(d("20000101"), d("20000106"), step).unwrap();
        assert_eq!(
            stamps(&list),
            vec!["20000101", "20000102", "20000103", "20000104", "20000105", "20000106"]
        );
    }

    #[test]
    fn test_last_boundary_overruns_end() {
        // 2 周步长不能整除 3 周跨度
        let step: Step = "fortnight".parse().unwrap();
        let list = compute_boundaries(d("20140701"), d("20140722"), step).unwrap();
        assert_eq!(stamps(&list), vec!["20140701", "20140715", "20140729"]);
        assert!(*list.last() > d("20140722"));
    }

    #[test]
    fn test_month_end_does_not_drift() {
        let step: Step = "1month".parse().unwrap();
        let list = compute_boundaries(d("20150131"), d("20150430"), step).unwrap();
        assert_eq!(
            stamps(&list),
            vec!["20150131", "20150228", "20150331", "20150430"]
        );
    }

    #[test]
    fn test_multi_month_and_multi_day_steps() {
        let six: Step = "6month".parse().unwrap();
        let list = compute_boundaries(d("20100101"), d("20110101"), six).unwrap();
        assert_eq!(stamps(&list), vec!["20100101", "20100701", "20110101"]);

        let three_day: Step = "3day".parse().unwrap();
        let list = compute_boundaries(d("20100101"), d("20100107"), three_day).unwrap();
        assert_eq!(stamps(&list), vec!["20100101", "20100104", "20100107"]);
    }

    #[test]
    fn test_strictly_increasing() {
        for (token, _) in STEP_TOKENS {
            let step: Step = token.parse().unwrap();
            let list = compute_boundaries(d("20120115"), d("20141231"), step).unwrap();
            assert!(list.dates().len() >= 2, "{}", token);
            assert_eq!(list.dates()[0], d("20120115"));
            assert!(*list.last() >= d("20141231"));
            assert!(list.dates().windows(2).all(|w| w[0] < w[1]), "{}", token);
        }
    }

    #[test]
    fn test_end_not_after_start() {
        let step: Step = "week".parse().unwrap();
        let list = compute_boundaries(d("20140720"), d("20140720"), step).unwrap();
        assert_eq!(stamps(&list), vec!["20140720"]);
        assert!(list.chunks().is_empty());
    }

    #[test]
    fn test_step_tokens() {
        assert_eq!("fortnight".parse::<Step>().unwrap(), Step::Weeks(2));
        assert_eq!("MONTH".parse::<Step>().unwrap(), Step::Months(1));
        assert!("12month".parse::<Step>().unwrap().is_monthly());
        assert!(!"3day".parse::<Step>().unwrap().is_monthly());

        match "bob".parse::<Step>() {
            Err(ScheduleError::InvalidStep { value, allowed }) => {
                assert_eq!(value, "bob");
                assert!(allowed.contains("fortnight"));
            }
            other => panic!("expected InvalidStep, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("2014073").is_none());
        assert!(parse_date("2014x720").is_none());
        assert!(parse_date("20140230").is_none());
        assert_eq!(format_date(d("20140720")), "20140720");
    }
}
