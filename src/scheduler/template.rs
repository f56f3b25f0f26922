//! # 提交脚本模板
//!
//! 模板是纯文本数据，用 `tera` 渲染：值写作 `{{ name }}`，
//! 邮件指令、非工作时段检查、HEMCO 链接和串联提交等 shell 片段
//! 都以 `{% if ... %}` 块写在模板里，代码只负责提供布尔量和值。
//! 内置 PBS / SLURM 模板编译进二进制，也可以从目录加载覆盖版本。
//!
//! 加载时编译模板，语法错误立即报告；渲染时未定义的变量是错误，
//! 不会留下未填充的占位符。
//!
//! ## 依赖关系
//! - 被 `scheduler/render.rs`、`commands/schedule.rs` 使用
//! - 使用 `tera`

use super::Scheduler;
use crate::error::{Result, ScheduleError};

use regex::Regex;
use std::error::Error as _;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tera::{Context, Tera};

const PBS_TEMPLATE: &str = include_str!("../../templates/PBS_queue_script_template");
const SLURM_TEMPLATE: &str = include_str!("../../templates/SLURM_queue_script_template");

/// 编译好的提交脚本模板
#[derive(Debug, Clone)]
pub struct ScriptTemplate {
    name: String,
    tera: Tera,
}

impl ScriptTemplate {
    /// 从文本编译模板
    pub fn new(name: impl Into<String>, text: &str) -> Result<Self> {
        let name = name.into();
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.add_raw_template(&name, text)
            .map_err(|e| template_error(&name, &e))?;
        Ok(ScriptTemplate { name, tera })
    }

    /// 内置模板
    pub fn builtin(scheduler: Scheduler) -> Result<Self> {
        let text = match scheduler {
            Scheduler::Pbs => PBS_TEMPLATE,
            Scheduler::Slurm => SLURM_TEMPLATE,
        };
        ScriptTemplate::new(scheduler.template_file_name(), text)
    }

    /// 从目录加载模板（文件名由调度器决定）
    pub fn from_dir(dir: &Path, scheduler: Scheduler) -> Result<Self> {
        let path = dir.join(scheduler.template_file_name());
        if !path.exists() {
            return Err(ScheduleError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let text = fs::read_to_string(&path).map_err(|e| ScheduleError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        ScriptTemplate::new(path.display().to_string(), &text)
    }

    /// 模板名称（文件名或路径）
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 用给定上下文渲染模板
    pub fn render(&self, context: &Context) -> Result<String> {
        self.tera.render(&self.name, context).map_err(|e| {
            match undefined_variable(&e) {
                Some(name) => ScheduleError::UnknownPlaceholder {
                    source_name: self.name.clone(),
                    name,
                    known: known_names(context),
                },
                None => template_error(&self.name, &e),
            }
        })
    }
}

/// tera 错误链拼成一条原因，并尽量取出行号
fn template_error(name: &str, err: &tera::Error) -> ScheduleError {
    let mut reason = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(cause.to_string().trim());
        source = cause.source();
    }

    let line = line_pattern()
        .captures(&reason)
        .and_then(|caps| caps[1].parse().ok());
    ScheduleError::malformed(name, line, reason)
}

fn undefined_variable(err: &tera::Error) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"Variable `([^`]+)` not found").unwrap());

    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(caps) = pattern.captures(&e.to_string()) {
            return Some(caps[1].to_string());
        }
        current = e.source();
    }
    None
}

fn known_names(context: &Context) -> String {
    match context.clone().into_json() {
        serde_json::Value::Object(map) => map.keys().cloned().collect::<Vec<_>>().join(", "),
        _ => String::new(),
    }
}

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-->\s*(\d+):\d+").unwrap())
}
