//! # 作业选项模型
//!
//! `JobOptions` 是经过校验、类型明确的不可变选项记录。
//! 由 `settings.rs` + 命令行参数合并后一次性构造，之后只读传递给各组件。
//!
//! ## 依赖关系
//! - 被 `scheduler/`、`commands/` 使用
//! - 使用 `settings.rs`、`calendar.rs`、`parsers/hemco.rs`

use crate::calendar::Step;
use crate::error::{Result, ScheduleError};
use crate::parsers::hemco::YearSpec;
use crate::scheduler::Scheduler;
use crate::settings::Settings;

use regex::Regex;
use std::sync::OnceLock;

/// 队列优先级下限
pub const MIN_PRIORITY: i32 = -1024;
/// 队列优先级上限
pub const MAX_PRIORITY: i32 = 1023;

/// 表示“是”的字符串
pub const YES_VALUES: &[&str] = &["yes", "YES", "Yes", "Y", "y", "true", "True"];
/// 表示“否”的字符串
pub const NO_VALUES: &[&str] = &["no", "NO", "No", "N", "n", "false", "False"];

/// 校验后的作业选项
#[derive(Debug, Clone, PartialEq)]
pub struct JobOptions {
    pub job_name: String,
    pub step: Step,
    pub queue_name: String,
    pub queue_priority: i32,
    pub wall_time: String,
    pub memory_need: String,
    pub cpus_need: u32,
    pub send_email: bool,
    pub email_address: String,
    pub email_setting: String,
    pub out_of_hours: bool,
    pub submit_jobs_together: bool,
    /// 生成后立即执行运行脚本
    pub run_script: bool,
    pub scheduler: Scheduler,
    pub manage_hemco_files: bool,
    pub met_year: String,
    pub emis_year: String,
}

impl JobOptions {
    /// 校验设置记录并构造选项
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let job_name = settings.job_name.trim().to_string();
        if job_name.is_empty() || job_name.chars().any(char::is_whitespace) {
            return Err(ScheduleError::invalid_option(
                "job_name",
                &settings.job_name,
                "a non-empty name without whitespace",
            ));
        }

        let step: Step = settings.step.parse()?;
        let scheduler: Scheduler = settings.scheduler.parse()?;

        let queue_priority = parse_priority(&settings.queue_priority)?;

        let queue_name = settings.queue_name.trim().to_string();
        if !settings.queue_names.is_empty() && !settings.queue_names.contains(&queue_name) {
            return Err(ScheduleError::invalid_option(
                "queue_name",
                &queue_name,
                format!("one of {}", settings.queue_names.join(", ")),
            ));
        }

        let wall_time = settings.wall_time.trim().to_string();
        if !wall_time_pattern().is_match(&wall_time) {
            return Err(ScheduleError::invalid_option("wall_time", &wall_time, "HH:MM:SS"));
        }

        let memory_need = settings.memory_need.trim().to_string();
        if !memory_pattern().is_match(&memory_need) {
            return Err(ScheduleError::invalid_option(
                "memory_need",
                &memory_need,
                "an amount with a unit, e.g. 2Gb, 4.8Gb, 200Mb, 200000kb",
            ));
        }

        let cpus_need: u32 = settings
            .cpus_need
            .trim()
            .parse()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| {
                ScheduleError::invalid_option("cpus_need", &settings.cpus_need, "a positive integer")
            })?;

        let send_email = parse_yes_no("send_email", &settings.send_email)?;
        let email_address = settings.email_address.trim().to_string();
        if send_email && !email_address.contains('@') {
            return Err(ScheduleError::invalid_option(
                "email_address",
                &email_address,
                "an email address",
            ));
        }
        let email_setting = settings.email_setting.trim().to_string();
        if send_email && !scheduler.accepts_mail_setting(&email_setting) {
            return Err(ScheduleError::invalid_option(
                "email_setting",
                &email_setting,
                scheduler.mail_setting_help(),
            ));
        }

        let manage_hemco_files = parse_yes_no("manage_hemco_files", &settings.manage_hemco_files)?;
        if manage_hemco_files {
            YearSpec::parse(&settings.met_year)?;
            YearSpec::parse(&settings.emis_year)?;
        }

        let out_of_hours = parse_yes_no("out_of_hours", &settings.out_of_hours)?;
        let submit_jobs_together =
            parse_yes_no("submit_jobs_together", &settings.submit_jobs_together)?;
        // 非工作时段检查会自行重新提交当前分段，依赖链无法表达
        if out_of_hours && submit_jobs_together {
            return Err(ScheduleError::invalid_option(
                "submit_jobs_together",
                &settings.submit_jobs_together,
                "'no' when out_of_hours is enabled",
            ));
        }

        Ok(JobOptions {
            job_name,
            step,
            queue_name,
            queue_priority,
            wall_time,
            memory_need,
            cpus_need,
            send_email,
            email_address,
            email_setting,
            out_of_hours,
            submit_jobs_together,
            run_script: parse_yes_no("submit", &settings.run_script)?,
            scheduler,
            manage_hemco_files,
            met_year: settings.met_year.trim().to_string(),
            emis_year: settings.emis_year.trim().to_string(),
        })
    }
}

/// 解析 yes/no 风格的布尔值
pub fn parse_yes_no(name: &str, value: &str) -> Result<bool> {
    let value = value.trim();
    if YES_VALUES.contains(&value) {
        Ok(true)
    } else if NO_VALUES.contains(&value) {
        Ok(false)
    } else {
        Err(ScheduleError::invalid_option(
            name,
            value,
            format!("one of {} / {}", YES_VALUES.join(", "), NO_VALUES.join(", ")),
        ))
    }
}

/// 解析队列优先级 [-1024, 1023]
pub fn parse_priority(value: &str) -> Result<i32> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|p| (MIN_PRIORITY..=MAX_PRIORITY).contains(p))
        .ok_or_else(|| {
            ScheduleError::invalid_option(
                "queue_priority",
                value,
                format!("an integer between {} and {}", MIN_PRIORITY, MAX_PRIORITY),
            )
        })
}

fn wall_time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{1,3}:[0-5]\d:[0-5]\d$").unwrap())
}

fn memory_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^\d+(\.\d+)?\s*(b|kb|mb|gb|tb|k|m|g|t)$").unwrap())
}
