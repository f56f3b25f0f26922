//! # 分段数据模型
//!
//! 定义分段边界列表 `ChunkBoundaryList` 与相邻边界组成的 `Chunk`。
//!
//! ## 依赖关系
//! - 被 `calendar.rs`、`parsers/`、`scheduler/`、`commands/` 使用
//! - 使用 `chrono`

use chrono::NaiveDate;

/// 有序、严格递增的分段边界日期列表
///
/// 计算一次后不再修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkBoundaryList {
    dates: Vec<NaiveDate>,
}

impl ChunkBoundaryList {
    /// 由已排序的日期构造（至少一个元素）
    pub(crate) fn new(dates: Vec<NaiveDate>) -> Self {
        debug_assert!(!dates.is_empty());
        debug_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        Self { dates }
    }

    /// 所有边界日期
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// 最后一个边界
    pub fn last(&self) -> &NaiveDate {
        &self.dates[self.dates.len() - 1]
    }

    /// N 个边界产生 N-1 个分段
    pub fn chunks(&self) -> Vec<Chunk> {
        let count = self.dates.len().saturating_sub(1);
        self.dates
            .windows(2)
            .enumerate()
            .map(|(index, pair)| Chunk {
                index,
                start: pair[0],
                end: pair[1],
                is_final: index + 1 == count,
            })
            .collect()
    }
}

/// 单个时间分段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// 分段序号（从 0 开始）
    pub index: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// 是否为最后一段
    pub is_final: bool,
}

impl Chunk {
    /// 开始日期 YYYYMMDD，也是该分段所有文件名的前缀
    pub fn start_stamp(&self) -> String {
        crate::calendar::format_date(self.start)
    }

    /// 结束日期 YYYYMMDD，同时是下一分段的文件名前缀
    pub fn end_stamp(&self) -> String {
        crate::calendar::format_date(self.end)
    }
}
