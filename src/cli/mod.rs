//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `parse`: 解析单个取回的计算目录
//! - `collect`: 批量解析并汇总多个计算目录
//!
//! 文件名配置 (`--output-file`, `--restart-file`) 对所有子命令生效。
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 使用 `config.rs`
//! - 子模块: parse, collect

pub mod collect;
pub mod parse;

use crate::config::ParserConfig;
use clap::{Parser, Subcommand};

/// cp2k-parse - CP2K 输出解析工具
#[derive(Parser)]
#[command(name = "cp2k-parse")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Parse CP2K logs and restart files into structured results", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub config: ParserConfig,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Parse one retrieved CP2K calculation folder
    Parse(parse::ParseArgs),

    /// Parse every calculation folder under a root directory and summarize
    Collect(collect::CollectArgs),
}
