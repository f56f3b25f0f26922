//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `schedule`: 把一次 GEOS-Chem 模拟切分成串联的调度器作业
//! - `setup`: 写入默认设置文件并给出 PATH 配置命令
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: schedule, setup

pub mod schedule;
pub mod setup;

use clap::{Parser, Subcommand};

/// geos-chem-schedule - 把长时间 GEOS-Chem 模拟拆成串联作业
#[derive(Parser)]
#[command(name = "geos-chem-schedule")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Split a GEOS-Chem run into chained PBS/SLURM jobs", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Split the run in the current directory into chunks and write job scripts
    Schedule(schedule::ScheduleArgs),

    /// Create the default settings file and print PATH setup commands
    Setup(setup::SetupArgs),
}
