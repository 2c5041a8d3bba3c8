//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `batch/`, `export.rs`, `utils/`
//! - 子模块: parse, collect

pub mod collect;
pub mod parse;

use crate::cli::{Cli, Commands};
use crate::error::Result;

/// 执行命令
pub fn run(cli: Cli) -> Result<()> {
    let config = cli.config;
    match cli.command {
        Commands::Parse(args) => parse::execute(args, &config),
        Commands::Collect(args) => collect::execute(args, &config),
    }
}
