//! # 数据模型模块
//!
//! 定义时间分段与校验后的作业选项。
//!
//! ## 依赖关系
//! - 被 `calendar.rs`、`parsers/`、`scheduler/` 和 `commands/` 使用
//! - 子模块: chunk, options

pub mod chunk;
pub mod options;

pub use chunk::{Chunk, ChunkBoundaryList};
pub use options::JobOptions;
