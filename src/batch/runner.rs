//! # 批量解析执行器
//!
//! 并行解析多个计算目录。每个目录的解析相互独立，不共享可变状态。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代
//! - 进度条显示
//! - 按状态汇总（完成 / 未完成 / 失败）
//!
//! ## 依赖关系
//! - 被 `commands/collect.rs` 调用
//! - 使用 `parsers/` 与 `bundle.rs`
//! - 使用 `utils/progress.rs` 创建进度条

use crate::bundle::DirBundle;
use crate::config::ParserConfig;
use crate::error::{Cp2kError, Result};
use crate::parsers::{self, ParsedCalculation};
use crate::utils::progress;

use rayon::prelude::*;
use std::path::PathBuf;

/// 单个计算目录的解析结果
#[derive(Debug)]
pub struct CalcOutcome {
    pub dir: PathBuf,
    pub result: Result<ParsedCalculation>,
}

/// 批量解析结果统计
#[derive(Debug, Default)]
pub struct BatchResult {
    /// 正常结束
    pub finished: usize,
    /// 未到达结束横幅
    pub incomplete: usize,
    /// 其他错误
    pub failed: usize,
    /// 全部结果（与输入顺序一致）
    pub outcomes: Vec<CalcOutcome>,
}

impl BatchResult {
    /// 合并单个结果
    pub fn merge(&mut self, outcome: CalcOutcome) {
        match &outcome.result {
            Ok(_) => self.finished += 1,
            Err(Cp2kError::IncompleteRun) => self.incomplete += 1,
            Err(_) => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    /// 总数
    pub fn total(&self) -> usize {
        self.finished + self.incomplete + self.failed
    }
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
    config: ParserConfig,
}

impl BatchRunner {
    /// 创建新的批量执行器（jobs 为 0 时使用全部核心）
    pub fn new(jobs: usize, config: ParserConfig) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs, config }
    }

    /// 并行解析目录列表
    pub fn run(&self, dirs: Vec<PathBuf>) -> Result<BatchResult> {
        let pb = progress::create_progress_bar(dirs.len() as u64, "Parsing");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| Cp2kError::Other(e.to_string()))?;

        let outcomes: Vec<CalcOutcome> = pool.install(|| {
            dirs.into_par_iter()
                .map(|dir| {
                    let bundle = DirBundle::new(dir.clone());
                    let result = parsers::parse_outputs(&bundle, &self.config);
                    pb.inc(1);
                    CalcOutcome { dir, result }
                })
                .collect()
        });

        pb.finish_and_clear();

        let mut batch_result = BatchResult::default();
        for outcome in outcomes {
            batch_result.merge(outcome);
        }

        Ok(batch_result)
    }
}
