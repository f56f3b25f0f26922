//! # 统一错误处理模块
//!
//! 定义 geos-chem-schedule 的所有错误类型，使用 `thiserror` 派生。
//!
//! 所有错误对当前调用都是致命的：要么所有分段文件都生成，要么一个都不写。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// geos-chem-schedule 统一错误类型
#[derive(Error, Debug)]
pub enum ScheduleError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 选项错误
    // ─────────────────────────────────────────────────────────────
    #[error("Unrecognised step size '{value}'. Try one of: {allowed}")]
    InvalidStep { value: String, allowed: String },

    #[error("Invalid value '{value}' for option '{name}'. Expected: {expected}")]
    InvalidOption {
        name: String,
        value: String,
        expected: String,
    },

    #[error(
        "Year specification '{spec}' is neither a year (e.g. 2016), \
         an offset (e.g. +2, -1) nor a list of years (e.g. 2014,2015)"
    )]
    AmbiguousYearSpec { spec: String },

    // ─────────────────────────────────────────────────────────────
    // 模板错误
    // ─────────────────────────────────────────────────────────────
    #[error("Malformed template {source_name} ({location}): {reason}")]
    MalformedTemplate {
        source_name: String,
        location: String,
        reason: String,
    },

    #[error("Template {source_name} uses unknown placeholder '{{{{ {name} }}}}'. Known: {known}")]
    UnknownPlaceholder {
        source_name: String,
        name: String,
        known: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 日历错误
    // ─────────────────────────────────────────────────────────────
    #[error("Date arithmetic left the supported calendar range after {date}")]
    DateOutOfRange { date: String },

    #[error("Run ends ({end}) before or on its start ({start}); nothing to schedule")]
    EmptySchedule { start: String, end: String },

    // ─────────────────────────────────────────────────────────────
    // 设置文件错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse settings file: {path}")]
    SettingsError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 外部命令错误
    // ─────────────────────────────────────────────────────────────
    #[error("External command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },
}

impl ScheduleError {
    /// 构造 `InvalidOption` 的便捷方法
    pub fn invalid_option(name: &str, value: impl ToString, expected: impl ToString) -> Self {
        ScheduleError::InvalidOption {
            name: name.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }

    /// 构造 `MalformedTemplate` 的便捷方法（行号从 1 开始，`None` 表示整个文件）
    pub fn malformed(source_name: &str, line: Option<usize>, reason: impl Into<String>) -> Self {
        ScheduleError::MalformedTemplate {
            source_name: source_name.to_string(),
            location: match line {
                Some(n) => format!("line {}", n),
                None => "whole file".to_string(),
            },
            reason: reason.into(),
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, ScheduleError>;
