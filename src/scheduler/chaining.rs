//! # 作业链策略
//!
//! 两种互斥的串联方式，每次运行只选择一次：
//! - `SelfChaining`: 每个分段结束时由脚本自己提交下一个分段
//! - `PreDeclared`: 启动脚本一次性提交所有分段，并声明 afterok 依赖
//!
//! 同一个策略值同时交给提交脚本渲染和启动脚本生成，两者不会出现分歧。
//!
//! ## 依赖关系
//! - 被 `scheduler/render.rs`、`scheduler/run_script.rs`、`commands/schedule.rs` 使用
//! - 使用 `models/`

use super::Scheduler;
use crate::models::{Chunk, JobOptions};

/// 作业链策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainingStrategy {
    SelfChaining,
    PreDeclared,
}

impl ChainingStrategy {
    /// 由 “submit jobs together” 选项决定
    pub fn from_options(options: &JobOptions) -> Self {
        if options.submit_jobs_together {
            ChainingStrategy::PreDeclared
        } else {
            ChainingStrategy::SelfChaining
        }
    }

    /// 该分段的脚本是否负责提交下一个分段
    pub fn submits_next(&self, chunk: &Chunk) -> bool {
        matches!(self, ChainingStrategy::SelfChaining) && !chunk.is_final
    }

    /// 提交下一个分段的命令；不负责提交时为空
    pub fn next_submission(&self, scheduler: Scheduler, chunk: &Chunk) -> String {
        if !self.submits_next(chunk) {
            return String::new();
        }
        scheduler.submit_capturing(&scheduler.queue_file(&chunk.end_stamp()), None)
    }
}
