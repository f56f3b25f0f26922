//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `scheduler/`, `models/`, `utils/`
//! - 子模块: schedule, setup

pub mod schedule;
pub mod setup;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Schedule(args) => schedule::execute(args),
        Commands::Setup(args) => setup::execute(args),
    }
}
