//! # setup 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/setup.rs`

use crate::settings::DEFAULT_SETTINGS_FILE;

use clap::Args;
use std::path::PathBuf;

/// setup 子命令参数
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Settings file to create
    #[arg(long, env = "GEOS_CHEM_SCHEDULE_SETTINGS", default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Directory that should be on PATH
    #[arg(long, default_value = "$HOME/bin")]
    pub bin_dir: String,
}
