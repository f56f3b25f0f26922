//! # schedule 命令实现
//!
//! 把一次 GEOS-Chem 模拟切分成按时间串联的调度器作业。
//!
//! ## 流程
//! 1. 读取设置文件并合并命令行覆盖值，校验为 `JobOptions`
//! 2. 从 `input.geos` 读取模拟起止日期并计算分段边界
//! 3. 在内存中为所有分段渲染 input.geos / HEMCO_Config.rc / 提交脚本
//! 4. 备份原始输入，写出所有文件与启动脚本
//! 5. 可选：用 bash 执行启动脚本
//!
//! 任何一步失败都在写文件之前返回，不会留下半套分段文件。
//!
//! ## 依赖关系
//! - 使用 `cli/schedule.rs` 定义的参数
//! - 使用 `calendar.rs`、`parsers/`、`scheduler/`、`settings.rs`、`utils/`

use crate::calendar::{compute_boundaries, format_date};
use crate::cli::schedule::ScheduleArgs;
use crate::error::{Result, ScheduleError};
use crate::models::{Chunk, JobOptions};
use crate::parsers::hemco::{resolve_year, rewrite_hemco_config, HEMCO_CONFIG};
use crate::parsers::input_geos::{read_run_dates, rewrite_config, INPUT_GEOS};
use crate::parsers::read_lines;
use crate::scheduler::{
    build_run_script, render_script, ChainingStrategy, RunScript, Scheduler, ScriptTemplate,
};
use crate::settings::Settings;
use crate::utils::{fs as files, output, progress};

use rayon::prelude::*;
use std::path::Path;
use std::process::Command;
use tabled::{Table, Tabled};

/// 分段输入文件目录
pub const INPUT_FILES_DIR: &str = "input_files";
/// 日志目录
pub const LOGS_DIR: &str = "logs";

/// 单个分段渲染后的文件内容
#[derive(Debug, Clone)]
pub struct ChunkFiles {
    pub chunk: Chunk,
    pub input_geos: String,
    /// (气象年, 排放年, 文件内容)，仅在管理 HEMCO 文件时存在
    pub hemco: Option<(i32, i32, String)>,
    /// 提交脚本相对路径
    pub queue_path: String,
    pub queue_script: String,
}

/// 完整的调度计划（尚未写盘）
#[derive(Debug, Clone)]
pub struct SchedulePlan {
    pub start: String,
    pub end: String,
    pub chunks: Vec<ChunkFiles>,
    pub run_script: RunScript,
}

/// 汇总表行
#[derive(Debug, Clone, Tabled)]
struct PlanRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "MetYear")]
    met_year: String,
    #[tabled(rename = "EmisYear")]
    emis_year: String,
    #[tabled(rename = "Queue script")]
    queue_script: String,
}

/// 执行 schedule 命令
pub fn execute(args: ScheduleArgs) -> Result<()> {
    output::print_header("GEOS-Chem Run Schedule");

    let (settings, settings_exist) = load_settings(&args)?;
    let options = JobOptions::from_settings(&settings)?;
    let strategy = ChainingStrategy::from_options(&options);
    print_options(&options, strategy, args.verbose);

    let plan = plan_schedule(&args, &options, strategy)?;
    print_summary(&plan, args.verbose);

    if args.dry_run {
        output::print_info("Dry run: no files written");
        return Ok(());
    }

    store_settings(&args, &settings, settings_exist)?;
    write_plan(&args, &options, &plan)?;

    if options.run_script {
        run_script(&args.run_dir, &plan.run_script)?;
    } else {
        output::print_info(&format!(
            "Start the run with: bash {}",
            plan.run_script.file_name
        ));
    }

    output::print_separator();
    output::print_done(&format!(
        "Scheduled {} chunk(s) from {} to {} ({})",
        plan.chunks.len(),
        plan.start,
        plan.end,
        options.scheduler
    ));

    Ok(())
}

/// 读取设置文件并应用命令行覆盖值
///
/// 设置文件不存在时使用默认值；返回值的第二项表示文件是否已存在。
/// 这里不写任何文件，默认设置等校验和渲染都成功后才由 `store_settings` 写出。
fn load_settings(args: &ScheduleArgs) -> Result<(Settings, bool)> {
    let exists = args.settings.exists();
    let mut settings = if exists {
        Settings::load(&args.settings)?
    } else {
        output::print_warning(&format!(
            "{} not found, using default settings",
            args.settings.display()
        ));
        Settings::default()
    };

    args.apply_overrides(&mut settings);
    Ok((settings, exists))
}

/// 写出设置文件：`--save-settings` 时保存合并后的选项，文件不存在时写出默认值
fn store_settings(args: &ScheduleArgs, settings: &Settings, existed: bool) -> Result<()> {
    if args.save_settings {
        settings.save(&args.settings)?;
        output::print_success(&format!("Saved options to {}", args.settings.display()));
    } else if !existed {
        Settings::default().save(&args.settings)?;
        output::print_info(&format!(
            "Created default settings file {}",
            args.settings.display()
        ));
    }
    Ok(())
}

/// 在内存中渲染所有分段
pub fn plan_schedule(
    args: &ScheduleArgs,
    options: &JobOptions,
    strategy: ChainingStrategy,
) -> Result<SchedulePlan> {
    let input_lines = read_lines(&args.run_dir.join(&args.input))?;
    let (start, end) = read_run_dates(&input_lines)?;

    let boundaries = compute_boundaries(start, end, options.step)?;
    let chunks = boundaries.chunks();
    if chunks.is_empty() {
        return Err(ScheduleError::EmptySchedule {
            start: format_date(start),
            end: format_date(end),
        });
    }
    if *boundaries.last() > end {
        output::print_warning(&format!(
            "Step {} does not divide the run evenly; the last chunk ends on {} instead of {}",
            options.step,
            format_date(*boundaries.last()),
            format_date(end)
        ));
    }
    output::print_detail(
        args.verbose,
        &format!(
            "boundaries: {}",
            boundaries
                .dates()
                .iter()
                .map(|d| format_date(*d))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    );

    let hemco_lines = if options.manage_hemco_files {
        Some(read_lines(&args.run_dir.join(&args.hemco_config))?)
    } else {
        None
    };

    let template = match &args.template_dir {
        Some(dir) => ScriptTemplate::from_dir(dir, options.scheduler)?,
        None => ScriptTemplate::builtin(options.scheduler)?,
    };
    output::print_detail(args.verbose, &format!("template: {}", template.name()));

    // 各分段互不依赖，collect 保持分段顺序
    let rendered = chunks
        .par_iter()
        .map(|chunk| {
            render_chunk(
                chunk,
                options,
                strategy,
                &template,
                &input_lines,
                hemco_lines.as_deref(),
            )
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SchedulePlan {
        start: format_date(start),
        end: format_date(end),
        chunks: rendered,
        run_script: build_run_script(&chunks, options, strategy),
    })
}

fn render_chunk(
    chunk: &Chunk,
    options: &JobOptions,
    strategy: ChainingStrategy,
    template: &ScriptTemplate,
    input_lines: &[String],
    hemco_lines: Option<&[String]>,
) -> Result<ChunkFiles> {
    let input_geos = rewrite_config(chunk.start, chunk.end, input_lines, options.step)?.concat();

    let hemco = match hemco_lines {
        Some(lines) => {
            let met = resolve_year(&options.met_year, chunk.index, chunk.start)?;
            let emis = resolve_year(&options.emis_year, chunk.index, chunk.start)?;
            Some((met, emis, rewrite_hemco_config(lines, met, emis).concat()))
        }
        None => None,
    };

    Ok(ChunkFiles {
        chunk: *chunk,
        input_geos,
        hemco,
        queue_path: options.scheduler.queue_file(&chunk.start_stamp()),
        queue_script: render_script(chunk, options, strategy, template)?,
    })
}

/// 备份原始输入并写出所有文件
fn write_plan(args: &ScheduleArgs, options: &JobOptions, plan: &SchedulePlan) -> Result<()> {
    let run_dir = &args.run_dir;

    let mut originals = vec![run_dir.join(&args.input)];
    if options.manage_hemco_files {
        originals.push(run_dir.join(&args.hemco_config));
    }
    for original in &originals {
        match files::backup_once(original)? {
            Some(backup) => output::print_info(&format!("Backed up to {}", backup.display())),
            None => output::print_skip(&format!(
                "Backup of {} already exists",
                original.display()
            )),
        }
    }

    let input_dir = run_dir.join(INPUT_FILES_DIR);
    files::ensure_dir(&input_dir)?;
    files::ensure_dir(&run_dir.join(options.scheduler.queue_dir()))?;
    files::ensure_dir(&run_dir.join(LOGS_DIR))?;

    let pb = progress::create_progress_bar(plan.chunks.len() as u64, "Writing chunks");
    for files_for_chunk in &plan.chunks {
        let stamp = files_for_chunk.chunk.start_stamp();

        let input_path = input_dir.join(format!("{}.{}", stamp, INPUT_GEOS));
        files::write_file(&input_path, &files_for_chunk.input_geos)?;

        if let Some((_, _, hemco)) = &files_for_chunk.hemco {
            let hemco_path = input_dir.join(format!("{}.{}", stamp, HEMCO_CONFIG));
            files::write_file(&hemco_path, hemco)?;
        }

        let queue_path = run_dir.join(&files_for_chunk.queue_path);
        files::write_file(&queue_path, &files_for_chunk.queue_script)?;
        files::make_executable(&queue_path)?;

        pb.suspend(|| {
            output::print_detail(args.verbose, &format!("wrote {}", queue_path.display()))
        });
        pb.inc(1);
    }
    pb.finish_and_clear();

    let run_path = run_dir.join(&plan.run_script.file_name);
    files::write_file(&run_path, &plan.run_script.content)?;
    files::make_executable(&run_path)?;

    output::print_generated(
        "input files",
        &format!("{}/", input_dir.display()),
    );
    output::print_generated(
        "queue scripts",
        &format!("{}/", run_dir.join(options.scheduler.queue_dir()).display()),
    );
    output::print_generated("run script", &run_path.display().to_string());

    Ok(())
}

/// 用 bash 执行启动脚本
fn run_script(run_dir: &Path, script: &RunScript) -> Result<()> {
    let command = format!("bash {}", script.file_name);
    let spinner = progress::create_spinner(&format!("Running {}", command));

    let result = Command::new("bash")
        .arg(&script.file_name)
        .current_dir(run_dir)
        .output();
    spinner.finish_and_clear();

    let out = result.map_err(|e| ScheduleError::CommandFailed {
        command: command.clone(),
        stderr: e.to_string(),
    })?;
    if !out.status.success() {
        return Err(ScheduleError::CommandFailed {
            command,
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&out.stdout);
    output::print_success(&format!("Submitted: {}", stdout.trim().replace('\n', ", ")));
    Ok(())
}

fn print_options(options: &JobOptions, strategy: ChainingStrategy, verbose: bool) {
    output::print_info(&format!(
        "{} jobs on queue '{}', step {}, {}",
        options.scheduler,
        options.queue_name,
        options.step,
        match strategy {
            ChainingStrategy::SelfChaining => "each chunk submits the next",
            ChainingStrategy::PreDeclared => "all chunks submitted with dependencies",
        }
    ));
    if options.scheduler == Scheduler::Slurm && options.queue_priority > 0 {
        output::print_warning(&format!(
            "SLURM only lowers priority (--nice) for normal users; queue_priority {} is not applied",
            options.queue_priority
        ));
    }

    let details = [
        ("job name", options.job_name.clone()),
        ("priority", options.queue_priority.to_string()),
        ("wall time", options.wall_time.clone()),
        ("memory", options.memory_need.clone()),
        ("cpus", options.cpus_need.to_string()),
        ("email", format!("{} ({})", options.send_email, options.email_address)),
        ("out of hours", options.out_of_hours.to_string()),
        ("manage HEMCO", options.manage_hemco_files.to_string()),
        ("MetYear", options.met_year.clone()),
        ("EmisYear", options.emis_year.clone()),
        ("run script", options.run_script.to_string()),
    ];
    for (name, value) in details {
        output::print_detail(verbose, &format!("{:<14} {}", name, value));
    }
}

fn print_summary(plan: &SchedulePlan, verbose: bool) {
    output::print_info(&format!(
        "Run {} -> {} split into {} chunk(s)",
        plan.start,
        plan.end,
        plan.chunks.len()
    ));

    let rows: Vec<PlanRow> = plan
        .chunks
        .iter()
        .map(|c| {
            let (met, emis) = match &c.hemco {
                Some((met, emis, _)) => (met.to_string(), emis.to_string()),
                None => ("-".to_string(), "-".to_string()),
            };
            PlanRow {
                index: c.chunk.index + 1,
                start: c.chunk.start_stamp(),
                end: c.chunk.end_stamp(),
                met_year: met,
                emis_year: emis,
                queue_script: c.queue_path.clone(),
            }
        })
        .collect();
    println!("{}", Table::new(rows));

    if verbose {
        for line in plan.run_script.content.lines() {
            output::print_detail(true, line);
        }
    }
}
