//! # 设置文件
//!
//! 读写持久化的默认选项（`settings.json`）。
//!
//! ## 格式
//! ```text
//! {
//!     "EmisYear": "2016",
//!     "MetYear": "2016",
//!     "cpus_need": "20",
//!     "job_name": "GEOS",
//!     "queue_priority": "0",
//!     "scheduler": "SLURM",
//!     "send_email": "yes",
//!     ...
//! }
//! ```
//! 数值和布尔值既可以写成 JSON 原生类型，也可以写成字符串。
//! 缺失的键使用默认值。
//!
//! ## 依赖关系
//! - 被 `commands/` 和 `models/options.rs` 使用
//! - 使用 `serde`、`serde_json`

use crate::error::{Result, ScheduleError};

use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

/// 默认设置文件名
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// 未校验的设置记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "lenient_string")]
    pub job_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub step: String,
    #[serde(deserialize_with = "lenient_string")]
    pub queue_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub queue_priority: String,
    #[serde(rename = "run_script_string", deserialize_with = "lenient_string")]
    pub run_script: String,
    #[serde(rename = "out_of_hours_string", deserialize_with = "lenient_string")]
    pub out_of_hours: String,
    #[serde(deserialize_with = "lenient_string")]
    pub wall_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub send_email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email_address: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email_setting: String,
    #[serde(deserialize_with = "lenient_string")]
    pub memory_need: String,
    #[serde(deserialize_with = "lenient_string")]
    pub submit_jobs_together: String,
    #[serde(rename = "MetYear", deserialize_with = "lenient_string")]
    pub met_year: String,
    #[serde(rename = "EmisYear", deserialize_with = "lenient_string")]
    pub emis_year: String,
    #[serde(deserialize_with = "lenient_string")]
    pub cpus_need: String,
    #[serde(deserialize_with = "lenient_string")]
    pub scheduler: String,
    #[serde(deserialize_with = "lenient_string")]
    pub manage_hemco_files: String,
    /// 允许的队列名，空列表表示不检查
    pub queue_names: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            job_name: "GEOS".to_string(),
            step: "month".to_string(),
            queue_name: "nodes".to_string(),
            queue_priority: "0".to_string(),
            run_script: "yes".to_string(),
            out_of_hours: "no".to_string(),
            wall_time: "48:00:00".to_string(),
            send_email: "yes".to_string(),
            email_address: "example@example.com".to_string(),
            email_setting: "e".to_string(),
            memory_need: "2Gb".to_string(),
            submit_jobs_together: "yes".to_string(),
            met_year: "2016".to_string(),
            emis_year: "2016".to_string(),
            cpus_need: "20".to_string(),
            scheduler: "SLURM".to_string(),
            manage_hemco_files: "no".to_string(),
            queue_names: [
                "interactive",
                "month",
                "week",
                "gpu",
                "himem_week",
                "himem",
                "test",
                "nodes",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Settings {
    /// 读取设置文件
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ScheduleError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| ScheduleError::SettingsError {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// 读取设置文件；不存在时写入默认设置
    ///
    /// 返回值第二项表示文件是否为新建。
    pub fn load_or_create(path: &Path) -> Result<(Self, bool)> {
        if path.exists() {
            return Ok((Self::load(path)?, false));
        }
        let settings = Settings::default();
        settings.save(path)?;
        Ok((settings, true))
    }

    /// 写入设置文件（键按字母排序，缩进 4 空格）
    pub fn save(&self, path: &Path) -> Result<()> {
        let value = serde_json::to_value(self).map_err(|e| ScheduleError::SettingsError {
            path: path.display().to_string(),
            source: e,
        })?;

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value
            .serialize(&mut ser)
            .map_err(|e| ScheduleError::SettingsError {
                path: path.display().to_string(),
                source: e,
            })?;
        buf.push(b'\n');

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ScheduleError::FileWriteError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        fs::write(path, buf).map_err(|e| ScheduleError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// 接受字符串、数字或布尔值，统一转换为字符串
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string, number or boolean, found {}",
            other
        ))),
    }
}
