//! # 提交脚本渲染
//!
//! 为单个分段准备模板上下文，生成 PBS 或 SLURM 提交脚本。
//! shell 片段写在模板里，这里只计算控制它们的布尔量和填充值：
//! - `email`: 只在最后一个分段且开启邮件通知时为真
//! - `out_of_hours`: 开启非工作时段运行且调度器为 PBS
//! - `manage_hemco`: 把本分段的 HEMCO_Config.rc 链接到运行目录
//! - `submit_next`: 由 `ChainingStrategy` 决定
//!
//! ## 依赖关系
//! - 被 `commands/schedule.rs` 使用
//! - 使用 `scheduler/chaining.rs`、`scheduler/template.rs`、`models/`

use super::{ChainingStrategy, Scheduler, ScriptTemplate, COMPLETION_BANNER, JOB_NAME_LIMIT};
use crate::error::Result;
use crate::models::{Chunk, JobOptions};
use crate::parsers::hemco::HEMCO_CONFIG;

use tera::Context;

/// 渲染某个分段的提交脚本
pub fn render_script(
    chunk: &Chunk,
    options: &JobOptions,
    strategy: ChainingStrategy,
    template: &ScriptTemplate,
) -> Result<String> {
    template.render(&script_context(chunk, options, strategy))
}

/// 模板上下文
fn script_context(chunk: &Chunk, options: &JobOptions, strategy: ChainingStrategy) -> Context {
    let scheduler = options.scheduler;
    let stamp = chunk.start_stamp();
    let mut context = Context::new();

    context.insert("job_name", &job_name(&options.job_name, chunk));
    context.insert("queue_name", &options.queue_name);
    context.insert("queue_priority", &options.queue_priority);
    context.insert("nice", &Scheduler::slurm_nice(options.queue_priority));
    context.insert("wall_time", &options.wall_time);
    context.insert("memory_need", &scheduler.format_memory(&options.memory_need));
    context.insert("cpus_need", &options.cpus_need);
    context.insert("start_time", &stamp);
    context.insert("end_time", &chunk.end_stamp());
    context.insert("queue_file", &scheduler.queue_file(&stamp));

    context.insert("email", &(options.send_email && chunk.is_final));
    context.insert("email_address", &options.email_address);
    context.insert("mail_type", &scheduler.mail_type(&options.email_setting));

    context.insert("out_of_hours", &(options.out_of_hours && scheduler == Scheduler::Pbs));

    context.insert("manage_hemco", &options.manage_hemco_files);
    context.insert("hemco_config", HEMCO_CONFIG);

    context.insert("submit_next", &strategy.submits_next(chunk));
    context.insert("submit_next_command", &strategy.next_submission(scheduler, chunk));
    context.insert("completion_banner", COMPLETION_BANNER);

    context
}

/// 作业名 = 名称 + 开始日期，截断到调度器允许的长度
fn job_name(base: &str, chunk: &Chunk) -> String {
    format!("{}{}", base, chunk.start_stamp())
        .chars()
        .take(JOB_NAME_LIMIT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_date;
    use crate::settings::Settings;

    fn chunk(index: usize, start: &str, end: &str, is_final: bool) -> Chunk {
        Chunk {
            index,
            start: parse_date(start).unwrap(),
            end: parse_date(end).unwrap(),
            is_final,
        }
    }

    fn options(scheduler: &str, together: &str, out_of_hours: &str) -> JobOptions {
        let settings = Settings {
            scheduler: scheduler.to_string(),
            submit_jobs_together: together.to_string(),
            out_of_hours: out_of_hours.to_string(),
            send_email: "yes".to_string(),
            email_address: "me@york.ac.uk".to_string(),
            ..Settings::default()
        };
        JobOptions::from_settings(&settings).unwrap()
    }

    fn render(c: &Chunk, o: &JobOptions) -> String {
        let strategy = ChainingStrategy::from_options(o);
        let template = ScriptTemplate::builtin(o.scheduler).unwrap();
        render_script(c, o, strategy, &template).unwrap()
    }

    #[test]
    fn test_middle_chunk_self_chaining() {
        let o = options("SLURM", "no", "no");
        let script = render(&chunk(0, "20070101", "20070201", false), &o);

        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("#SBATCH --job-name=GEOS20070101\n"));
        assert!(script.contains("#SBATCH --mem=2G\n"));
        assert!(script.contains("ln -s input_files/20070101.input.geos input.geos"));
        assert!(script.contains("job_number=$(sbatch --parsable SLURM_queue_files/20070201.sbatch)\n"));
        assert!(script.contains("tail -n 1 logs/20070101.geos.log | grep -q \"E N D   O F   G E O S -- C H E M\""));
        assert!(script.contains("echo \"scancel $job_number\" > exit_geos.sh"));
        assert!(!script.contains("--mail-user"));
        assert!(!script.contains("--nice"));
        assert!(!script.contains("{{") && !script.contains("{%"));
    }

    #[test]
    fn test_final_chunk_emails_and_stops() {
        let o = options("SLURM", "no", "no");
        let script = render(&chunk(2, "20070301", "20070401", true), &o);

        assert!(script.contains("#SBATCH --mail-type=END\n#SBATCH --mail-user=me@york.ac.uk\n"));
        assert!(!script.contains("20070401.sbatch"));
        assert!(!script.contains("exit_geos.sh"));
        assert!(script.ends_with("./geos > logs/20070301.geos.log\n"));
    }

    #[test]
    fn test_pbs_final_chunk_email() {
        let o = options("PBS", "no", "no");
        let script = render(&chunk(2, "20070301", "20070401", true), &o);
        assert!(script.contains("#PBS -p 0\n#PBS -m e\n#PBS -M me@york.ac.uk\n#\n"));

        let script = render(&chunk(0, "20070101", "20070201", false), &o);
        assert!(script.contains("#PBS -p 0\n#\n"));
        assert!(script.contains("job_number=$(qsub PBS_queue_files/20070201.pbs)\n"));
        assert!(script.contains("echo \"qdel $job_number\" > exit_geos.sh"));
    }

    #[test]
    fn test_pre_declared_has_no_self_submission() {
        let o = options("PBS", "yes", "no");
        let script = render(&chunk(0, "20070101", "20070201", false), &o);

        assert!(!script.contains("PBS_queue_files/20070201.pbs"));
        assert!(!script.contains("qsub"));
        assert!(script.contains("#PBS -N GEOS20070101\n"));
        assert!(script.contains("#PBS -l mem=2Gb\n"));
    }

    #[test]
    fn test_out_of_hours_pbs_only() {
        let o = options("PBS", "no", "yes");
        let script = render(&chunk(0, "20070101", "20070201", false), &o);
        assert!(script.contains("job_number=$(qsub -a 1810 PBS_queue_files/20070101.pbs)"));
        assert!(script.contains("\"${out_of_hours_override:-no}\" != \"yes\""));
        assert!(script.contains("$(date +%u) -lt 6"));

        let o = options("SLURM", "no", "yes");
        let script = render(&chunk(0, "20070101", "20070201", false), &o);
        assert!(!script.contains("1810"));
        assert!(!script.contains("out_of_hours_override"));
    }

    #[test]
    fn test_job_name_truncated() {
        let c = chunk(0, "20070101", "20070201", false);
        assert_eq!(job_name("GEOS", &c), "GEOS20070101");
        assert_eq!(job_name("LongJobName", &c), "LongJobName200");
        assert_eq!(job_name("LongJobName", &c).chars().count(), JOB_NAME_LIMIT);
    }

    #[test]
    fn test_job_name_with_braces() {
        let mut o = options("SLURM", "no", "no");
        o.job_name = "a{{b".to_string();
        let script = render(&chunk(0, "20070101", "20070201", false), &o);
        assert!(script.contains("#SBATCH --job-name=a{{b20070101\n"));
    }

    #[test]
    fn test_hemco_relink() {
        let mut o = options("SLURM", "no", "no");
        let c = chunk(0, "20070101", "20070201", false);
        assert!(!render(&c, &o).contains(HEMCO_CONFIG));

        o.manage_hemco_files = true;
        let script = render(&c, &o);
        assert!(script.contains(
            "rm -f HEMCO_Config.rc\nln -s input_files/20070101.HEMCO_Config.rc HEMCO_Config.rc\nsrun"
        ));
    }

    #[test]
    fn test_slurm_priority_as_nice() {
        let mut o = options("SLURM", "no", "no");
        o.queue_priority = -100;
        let script = render(&chunk(0, "20070101", "20070201", false), &o);
        assert!(script.contains("#SBATCH --error=logs/20070101.error\n#SBATCH --nice=100\n"));

        o.queue_priority = 100;
        let script = render(&chunk(0, "20070101", "20070201", false), &o);
        assert!(!script.contains("--nice"));
    }
}
