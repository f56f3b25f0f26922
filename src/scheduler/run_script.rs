//! # 启动脚本
//!
//! 生成启动整条作业链的 shell 脚本。
//!
//! - 自链式：只提交第一个分段，其余分段由前一个分段提交
//! - 预声明：一次性提交所有分段，第 i 个分段依赖第 i-1 个分段成功结束
//!
//! ## 依赖关系
//! - 被 `commands/schedule.rs` 使用
//! - 使用 `scheduler/chaining.rs`、`models/`

use super::{ChainingStrategy, Scheduler};
use crate::models::{Chunk, JobOptions};

/// 生成的启动脚本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunScript {
    /// 运行目录下的文件名
    pub file_name: String,
    pub content: String,
}

/// 启动脚本文件名
pub fn run_script_name(scheduler: Scheduler, strategy: ChainingStrategy) -> String {
    match strategy {
        ChainingStrategy::SelfChaining => format!("run_geos_{}.sh", scheduler),
        ChainingStrategy::PreDeclared => format!("run_geos_{}_queue_all_jobs.sh", scheduler),
    }
}

/// 生成启动脚本
pub fn build_run_script(chunks: &[Chunk], options: &JobOptions, strategy: ChainingStrategy) -> RunScript {
    let scheduler = options.scheduler;
    let mut content = String::from("#!/bin/bash\n");

    match strategy {
        ChainingStrategy::SelfChaining => {
            if let Some(first) = chunks.first() {
                let script = scheduler.queue_file(&first.start_stamp());
                let submit = format!("{} {}", scheduler.submit_command(), script);
                match scheduler {
                    Scheduler::Pbs => content.push_str(&format!("{}\n", submit)),
                    Scheduler::Slurm => {
                        content.push_str(&format!("job_number=$({})\n", submit));
                        content.push_str("echo \"$job_number\"\n");
                    }
                }
            }
        }
        ChainingStrategy::PreDeclared => {
            let mut previous: Option<String> = None;
            for chunk in chunks {
                let var = job_variable(chunk);
                let script = scheduler.queue_file(&chunk.start_stamp());
                let submit = scheduler.submit_capturing(&script, previous.as_deref());
                content.push_str(&format!("{}=$({})\n", var, submit));
                content.push_str(&format!("echo \"${}\"\n", var));
                previous = Some(var);
            }
        }
    }

    RunScript {
        file_name: run_script_name(scheduler, strategy),
        content,
    }
}

fn job_variable(chunk: &Chunk) -> String {
    format!("job_num_{}", chunk.start_stamp())
}
