//! # geos-chem-schedule - GEOS-Chem 长时间模拟分段调度工具
//!
//! 把一次长时间 GEOS-Chem 模拟按日历步长切分成若干分段，为每个分段
//! 生成 input.geos（以及可选的 HEMCO_Config.rc）和 PBS / SLURM 提交脚本，
//! 再生成一个启动整条作业链的脚本。
//!
//! ## 子命令
//! - `schedule` - 切分模拟并生成作业文件
//! - `setup`    - 写入默认设置文件
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── calendar.rs (分段边界)
//!   │     ├── parsers/    (input.geos / HEMCO_Config.rc 改写)
//!   │     ├── scheduler/  (提交脚本与启动脚本)
//!   │     ├── models/     (数据模型)
//!   │     └── settings.rs (设置文件)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod calendar;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod scheduler;
mod settings;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
