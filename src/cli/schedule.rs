//! # schedule 子命令 CLI 定义
//!
//! 所有作业选项都可以在命令行覆盖设置文件中的值。
//! 覆盖值保持字符串形式，合并后统一交给 `JobOptions` 校验。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/schedule.rs`

use crate::settings::{Settings, DEFAULT_SETTINGS_FILE};

use clap::Args;
use std::path::PathBuf;

/// schedule 子命令参数
#[derive(Args, Debug, Default)]
pub struct ScheduleArgs {
    /// Settings file holding the default options
    #[arg(long, env = "GEOS_CHEM_SCHEDULE_SETTINGS", default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    // ─────────────────────────────────────────────────────────────
    // Run directory
    // ─────────────────────────────────────────────────────────────
    /// GEOS-Chem run directory
    #[arg(long, default_value = ".")]
    pub run_dir: PathBuf,

    /// input.geos file name inside the run directory
    #[arg(long, default_value = "input.geos")]
    pub input: PathBuf,

    /// HEMCO configuration file name inside the run directory
    #[arg(long, default_value = "HEMCO_Config.rc")]
    pub hemco_config: PathBuf,

    /// Directory with PBS_queue_script_template / SLURM_queue_script_template overrides
    #[arg(long)]
    pub template_dir: Option<PathBuf>,

    // ─────────────────────────────────────────────────────────────
    // Job options (override settings)
    // ─────────────────────────────────────────────────────────────
    /// Job name prefix (the chunk start date is appended)
    #[arg(long)]
    pub job_name: Option<String>,

    /// Chunk length (e.g. month, 3month, week, fortnight, day)
    #[arg(long)]
    pub step: Option<String>,

    /// Queue / partition name
    #[arg(long)]
    pub queue_name: Option<String>,

    /// Queue priority between -1024 and 1023
    #[arg(long, allow_hyphen_values = true)]
    pub queue_priority: Option<String>,

    /// Wall time per chunk (HH:MM:SS)
    #[arg(long)]
    pub wall_time: Option<String>,

    /// Memory per chunk (e.g. 2Gb, 200Mb)
    #[arg(long)]
    pub memory_need: Option<String>,

    /// CPUs per chunk
    #[arg(long)]
    pub cpus_need: Option<String>,

    /// Email an alert when the final chunk finishes (yes/no)
    #[arg(long)]
    pub send_email: Option<String>,

    /// Email address for alerts
    #[arg(long)]
    pub email_address: Option<String>,

    /// Email setting (PBS -m letters, e.g. e, ae)
    #[arg(long)]
    pub email_setting: Option<String>,

    /// Only run outside working hours (yes/no, PBS only)
    #[arg(long)]
    pub out_of_hours: Option<String>,

    /// Submit all chunks at once with dependencies (yes/no)
    #[arg(long)]
    pub submit_jobs_together: Option<String>,

    /// Scheduler (PBS or SLURM)
    #[arg(long)]
    pub scheduler: Option<String>,

    /// Write per-chunk HEMCO_Config.rc files (yes/no)
    #[arg(long)]
    pub manage_hemco_files: Option<String>,

    /// Meteorology year: 2016, +1, -2 or 2014,2015,...
    #[arg(long, allow_hyphen_values = true)]
    pub met_year: Option<String>,

    /// Emissions year: 2016, +1, -2 or 2014,2015,...
    #[arg(long, allow_hyphen_values = true)]
    pub emis_year: Option<String>,

    /// Run the generated run script immediately (yes/no)
    #[arg(long)]
    pub submit: Option<String>,

    // ─────────────────────────────────────────────────────────────
    // Execution control
    // ─────────────────────────────────────────────────────────────
    /// Render and summarise only, write nothing
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Store the merged options back into the settings file
    #[arg(long, default_value_t = false)]
    pub save_settings: bool,

    /// Print the resolved options and per-chunk plan
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl ScheduleArgs {
    /// 命令行覆盖值写入设置记录
    pub fn apply_overrides(&self, settings: &mut Settings) {
        let overrides: [(&Option<String>, &mut String); 17] = [
            (&self.job_name, &mut settings.job_name),
            (&self.step, &mut settings.step),
            (&self.queue_name, &mut settings.queue_name),
            (&self.queue_priority, &mut settings.queue_priority),
            (&self.wall_time, &mut settings.wall_time),
            (&self.memory_need, &mut settings.memory_need),
            (&self.cpus_need, &mut settings.cpus_need),
            (&self.send_email, &mut settings.send_email),
            (&self.email_address, &mut settings.email_address),
            (&self.email_setting, &mut settings.email_setting),
            (&self.out_of_hours, &mut settings.out_of_hours),
            (&self.submit_jobs_together, &mut settings.submit_jobs_together),
            (&self.scheduler, &mut settings.scheduler),
            (&self.manage_hemco_files, &mut settings.manage_hemco_files),
            (&self.met_year, &mut settings.met_year),
            (&self.emis_year, &mut settings.emis_year),
            (&self.submit, &mut settings.run_script),
        ];

        for (value, field) in overrides {
            if let Some(value) = value {
                *field = value.clone();
            }
        }
    }
}
