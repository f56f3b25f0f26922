//! # setup 命令实现
//!
//! 写入默认设置文件，并打印把可执行文件加入 PATH 的 shell 命令。
//!
//! ## 依赖关系
//! - 使用 `cli/setup.rs` 定义的参数
//! - 使用 `settings.rs`、`utils/output.rs`

use crate::cli::setup::SetupArgs;
use crate::error::Result;
use crate::settings::Settings;
use crate::utils::output;

/// 执行 setup 命令
pub fn execute(args: SetupArgs) -> Result<()> {
    output::print_header("geos-chem-schedule setup");

    let (_, created) = Settings::load_or_create(&args.settings)?;
    if created {
        output::print_success(&format!(
            "Wrote default settings to {}",
            args.settings.display()
        ));
    } else {
        output::print_skip(&format!("{} already exists", args.settings.display()));
    }

    output::print_info("To run geos-chem-schedule from any run directory, execute:");
    for line in path_commands(&args.bin_dir) {
        println!("    {}", line);
    }

    output::print_done("Setup complete. Change your defaults in the settings file.");
    Ok(())
}

/// 把 `bin_dir` 加入 PATH 的命令
fn path_commands(bin_dir: &str) -> Vec<String> {
    vec![
        "echo \"## Written by geos-chem-schedule\" >> $HOME/.bashrc".to_string(),
        format!("echo \"export PATH=\\$PATH:{}\" >> $HOME/.bashrc", bin_dir),
        "source $HOME/.bashrc".to_string(),
    ]
}
