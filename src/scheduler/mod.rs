//! # 调度器模块
//!
//! 生成 PBS / SLURM 提交脚本与启动脚本。
//!
//! ## 结构
//! - `Scheduler`: 封闭的调度器种类 {PBS, SLURM}，提供各自的语法片段
//! - `chaining`: 自链式提交与预声明依赖两种互斥策略
//! - `template`: `tera` 模板，片段的 shell 文本都写在模板里
//! - `render`: 单个分段的提交脚本
//! - `run_script`: 启动整条作业链的脚本
//!
//! ## 依赖关系
//! - 被 `commands/schedule.rs`、`models/options.rs` 使用
//! - 使用 `models/`

pub mod chaining;
pub mod render;
pub mod run_script;
pub mod template;

pub use chaining::ChainingStrategy;
pub use render::render_script;
pub use run_script::{build_run_script, RunScript};
pub use template::ScriptTemplate;

use crate::error::{Result, ScheduleError};

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// 作业名长度上限
pub const JOB_NAME_LIMIT: usize = 14;

/// GEOS-Chem 正常结束时日志最后一行包含的标志
pub const COMPLETION_BANNER: &str = "E N D   O F   G E O S -- C H E M";

/// 调度器种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheduler {
    Pbs,
    Slurm,
}

impl Scheduler {
    /// 所有调度器
    pub const ALL: [Scheduler; 2] = [Scheduler::Pbs, Scheduler::Slurm];

    /// 提交脚本所在目录
    pub fn queue_dir(&self) -> &'static str {
        match self {
            Scheduler::Pbs => "PBS_queue_files",
            Scheduler::Slurm => "SLURM_queue_files",
        }
    }

    /// 提交脚本扩展名
    pub fn extension(&self) -> &'static str {
        match self {
            Scheduler::Pbs => "pbs",
            Scheduler::Slurm => "sbatch",
        }
    }

    /// 某个分段的提交脚本相对路径
    pub fn queue_file(&self, stamp: &str) -> String {
        format!("{}/{}.{}", self.queue_dir(), stamp, self.extension())
    }

    /// 模板文件名
    pub fn template_file_name(&self) -> &'static str {
        match self {
            Scheduler::Pbs => "PBS_queue_script_template",
            Scheduler::Slurm => "SLURM_queue_script_template",
        }
    }

    /// 提交命令
    pub fn submit_command(&self) -> &'static str {
        match self {
            Scheduler::Pbs => "qsub",
            Scheduler::Slurm => "sbatch",
        }
    }

    /// 取消作业命令
    pub fn cancel_command(&self) -> &'static str {
        match self {
            Scheduler::Pbs => "qdel",
            Scheduler::Slurm => "scancel",
        }
    }

    /// 提交并只输出作业号的命令，可选依赖于某个作业号变量成功结束
    pub fn submit_capturing(&self, script: &str, after_var: Option<&str>) -> String {
        let flags = match (self, after_var) {
            (Scheduler::Pbs, None) => String::new(),
            (Scheduler::Pbs, Some(var)) => format!(" -W depend=afterok:\"${}\"", var),
            (Scheduler::Slurm, None) => " --parsable".to_string(),
            (Scheduler::Slurm, Some(var)) => {
                format!(" --parsable --dependency=afterok:\"${}\"", var)
            }
        };
        format!("{}{} {}", self.submit_command(), flags, script)
    }

    /// 邮件事件设置，按调度器语法书写
    pub fn mail_type(&self, setting: &str) -> String {
        match self {
            Scheduler::Pbs => setting.trim().to_string(),
            Scheduler::Slurm => slurm_mail_type(setting),
        }
    }

    /// 邮件事件设置是否可用
    ///
    /// PBS 只接受 `-m` 字母；SLURM 另外接受逗号分隔的 `--mail-type` 事件名。
    pub fn accepts_mail_setting(&self, setting: &str) -> bool {
        let setting = setting.trim();
        if setting.is_empty() {
            return false;
        }
        if setting.chars().all(|c| PBS_MAIL_LETTERS.contains(&c)) {
            return true;
        }
        *self == Scheduler::Slurm
            && setting
                .split(',')
                .all(|word| SLURM_MAIL_TYPES.contains(&word.trim().to_uppercase().as_str()))
    }

    /// 邮件事件设置的可用写法，用于错误信息
    pub fn mail_setting_help(&self) -> String {
        let letters: String = PBS_MAIL_LETTERS.iter().collect();
        match self {
            Scheduler::Pbs => format!("PBS -m letters from {} (e.g. e, ae)", letters),
            Scheduler::Slurm => format!(
                "letters from {} (e.g. e, ae) or SLURM mail types from {}",
                letters,
                SLURM_MAIL_TYPES.join(", ")
            ),
        }
    }

    /// 队列优先级对应的 SLURM `--nice` 值
    ///
    /// PBS 优先级越高越先运行，nice 值正好相反；普通用户只能设置正的 nice，
    /// 所以只有负优先级会得到非零结果。
    pub fn slurm_nice(priority: i32) -> u32 {
        if priority < 0 {
            priority.unsigned_abs()
        } else {
            0
        }
    }

    /// 按调度器语法书写内存需求
    ///
    /// PBS 原样接受 `2Gb` 之类的写法；SLURM 只接受整数加 K/M/G/T，
    /// 小数会换算成 M。
    pub fn format_memory(&self, memory: &str) -> String {
        match self {
            Scheduler::Pbs => memory.to_string(),
            Scheduler::Slurm => slurm_memory(memory).unwrap_or_else(|| memory.to_string()),
        }
    }
}

impl FromStr for Scheduler {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "PBS" => Ok(Scheduler::Pbs),
            "SLURM" => Ok(Scheduler::Slurm),
            _ => Err(ScheduleError::invalid_option(
                "scheduler",
                s,
                format!(
                    "one of {}",
                    Scheduler::ALL.map(|x| x.to_string()).join(", ")
                ),
            )),
        }
    }
}

impl fmt::Display for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheduler::Pbs => write!(f, "PBS"),
            Scheduler::Slurm => write!(f, "SLURM"),
        }
    }
}

/// PBS `-m` 可用的邮件事件字母
pub const PBS_MAIL_LETTERS: &[char] = &['a', 'b', 'e', 'n'];

/// SLURM `--mail-type` 可用的事件名
pub const SLURM_MAIL_TYPES: &[&str] = &[
    "NONE",
    "BEGIN",
    "END",
    "FAIL",
    "REQUEUE",
    "ALL",
    "INVALID_DEPEND",
    "STAGE_OUT",
    "TIME_LIMIT",
    "TIME_LIMIT_90",
    "TIME_LIMIT_80",
    "TIME_LIMIT_50",
    "ARRAY_TASKS",
];

/// PBS 风格的 `-m` 字母映射为 SLURM 的 `--mail-type`
fn slurm_mail_type(setting: &str) -> String {
    let setting = setting.trim();
    let mapped: Option<Vec<&str>> = setting
        .chars()
        .map(|c| match c {
            'a' => Some("FAIL"),
            'b' => Some("BEGIN"),
            'e' => Some("END"),
            'n' => Some("NONE"),
            _ => None,
        })
        .collect();

    match mapped {
        Some(types) if !types.is_empty() => types.join(","),
        _ => setting.to_uppercase(),
    }
}

fn slurm_memory(memory: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*([kmgt]?)b?\s*$").unwrap()
    });

    let caps = pattern.captures(memory)?;
    let amount = &caps[1];
    let unit = caps[2].to_uppercase();

    if !amount.contains('.') {
        return Some(format!("{}{}", amount, if unit.is_empty() { "M" } else { unit.as_str() }));
    }

    let value: f64 = amount.parse().ok()?;
    let megabytes = match unit.as_str() {
        "K" => value / 1024.0,
        "G" => value * 1024.0,
        "T" => value * 1024.0 * 1024.0,
        _ => value,
    };
    Some(format!("{}M", megabytes.ceil() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scheduler() {
        assert_eq!("PBS".parse::<Scheduler>().unwrap(), Scheduler::Pbs);
        assert_eq!("slurm".parse::<Scheduler>().unwrap(), Scheduler::Slurm);
        match "LSF".parse::<Scheduler>() {
            Err(ScheduleError::InvalidOption { expected, .. }) => {
                assert!(expected.contains("PBS") && expected.contains("SLURM"))
            }
            other => panic!("expected InvalidOption, got {:?}", other),
        }
        for s in Scheduler::ALL {
            assert_eq!(s.to_string().parse::<Scheduler>().unwrap(), s);
        }
    }

    #[test]
    fn test_queue_files() {
        assert_eq!(Scheduler::Pbs.queue_file("20070101"), "PBS_queue_files/20070101.pbs");
        assert_eq!(
            Scheduler::Slurm.queue_file("20070101"),
            "SLURM_queue_files/20070101.sbatch"
        );
    }

    #[test]
    fn test_submit_capturing() {
        assert_eq!(
            Scheduler::Slurm.submit_capturing("SLURM_queue_files/a.sbatch", Some("job_num_x")),
            "sbatch --parsable --dependency=afterok:\"$job_num_x\" SLURM_queue_files/a.sbatch"
        );
        assert_eq!(
            Scheduler::Pbs.submit_capturing("PBS_queue_files/a.pbs", Some("job_num_x")),
            "qsub -W depend=afterok:\"$job_num_x\" PBS_queue_files/a.pbs"
        );
        assert_eq!(
            Scheduler::Pbs.submit_capturing("PBS_queue_files/a.pbs", None),
            "qsub PBS_queue_files/a.pbs"
        );
    }

    #[test]
    fn test_mail_type() {
        assert_eq!(Scheduler::Pbs.mail_type("ae"), "ae");
        assert_eq!(Scheduler::Slurm.mail_type("ae"), "FAIL,END");
        assert_eq!(Scheduler::Slurm.mail_type("ALL"), "ALL");
    }

    #[test]
    fn test_mail_setting_validation() {
        for s in Scheduler::ALL {
            assert!(s.accepts_mail_setting("e"));
            assert!(s.accepts_mail_setting("abe"));
            assert!(!s.accepts_mail_setting(""));
            assert!(!s.accepts_mail_setting("  "));
            assert!(!s.accepts_mail_setting("x"));
        }
        assert!(Scheduler::Slurm.accepts_mail_setting("END,FAIL"));
        assert!(Scheduler::Slurm.accepts_mail_setting("all"));
        assert!(!Scheduler::Slurm.accepts_mail_setting("END,SOMETIMES"));
        assert!(!Scheduler::Pbs.accepts_mail_setting("END"));
        assert!(Scheduler::Pbs.mail_setting_help().contains("aben"));
    }

    #[test]
    fn test_slurm_nice() {
        assert_eq!(Scheduler::slurm_nice(0), 0);
        assert_eq!(Scheduler::slurm_nice(100), 0);
        assert_eq!(Scheduler::slurm_nice(-5), 5);
        assert_eq!(Scheduler::slurm_nice(-1024), 1024);
    }

    #[test]
    fn test_format_memory() {
        assert_eq!(Scheduler::Pbs.format_memory("2Gb"), "2Gb");
        assert_eq!(Scheduler::Slurm.format_memory("2Gb"), "2G");
        assert_eq!(Scheduler::Slurm.format_memory("200Mb"), "200M");
        assert_eq!(Scheduler::Slurm.format_memory("200000kb"), "200000K");
        assert_eq!(Scheduler::Slurm.format_memory("4.8Gb"), "4916M");
        assert_eq!(Scheduler::Slurm.format_memory("512"), "512M");
    }
}
