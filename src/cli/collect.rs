//! # collect 子命令 CLI 定义
//!
//! 批量解析计算目录并汇总为 CSV
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/collect.rs`

use clap::Args;
use std::path::PathBuf;

/// collect 子命令参数
#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Root directory containing CP2K calculation folders
    pub root: PathBuf,

    /// Search calculation folders recursively
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs (0 = all cores)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Filename for the summary CSV
    #[arg(long, default_value = "cp2k_summary.csv")]
    pub output: PathBuf,
}
