//! # 文件写入工具
//!
//! 写文件、设置可执行权限以及一次性备份原始输入。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 无外部模块依赖

use crate::error::{Result, ScheduleError};

use std::fs;
use std::path::{Path, PathBuf};

/// 备份文件后缀
pub const BACKUP_SUFFIX: &str = "orig";

/// 创建目录（含父目录）
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| ScheduleError::FileWriteError {
        path: dir.display().to_string(),
        source: e,
    })
}

/// 写入文件，必要时创建父目录
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    fs::write(path, content).map_err(|e| ScheduleError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 设置 0755 权限
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| {
        ScheduleError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        }
    })
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// 备份文件路径：`input.geos` -> `input.geos.orig`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// 首次运行时备份原始文件
///
/// 备份已存在时不覆盖，返回 `Ok(None)`。
pub fn backup_once(path: &Path) -> Result<Option<PathBuf>> {
    let backup = backup_path(path);
    if backup.exists() {
        return Ok(None);
    }
    fs::copy(path, &backup).map_err(|e| ScheduleError::FileWriteError {
        path: backup.display().to_string(),
        source: e,
    })?;
    Ok(Some(backup))
}
