//! # 解析器模块
//!
//! 提供 GEOS-Chem 固定列格式配置文件的读取与改写。
//!
//! 行以 `String` 保存且包含原始行尾（`\n`、`\r\n` 或无），
//! 因此未改动的行可以逐字节写回。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `calendar.rs`、`models/`
//! - 子模块: input_geos, hemco

pub mod hemco;
pub mod input_geos;

use crate::error::{Result, ScheduleError};
use std::fs;
use std::path::Path;

/// 读取文件并按行拆分（保留行尾）
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(ScheduleError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path).map_err(|e| ScheduleError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(split_lines(&content))
}

/// 按行拆分字符串，每行保留其行尾
pub fn split_lines(content: &str) -> Vec<String> {
    content.split_inclusive('\n').map(str::to_string).collect()
}

/// 把一行拆成 (正文, 行尾)
pub fn split_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, &line[body.len()..])
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, &line[body.len()..])
    } else {
        (line, "")
    }
}
