//! # parse 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/parse.rs`

use clap::Args;
use std::path::PathBuf;

/// parse 子命令参数
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Retrieved calculation folder containing the CP2K log
    pub dir: PathBuf,

    /// Write band energies to this CSV file
    #[arg(long)]
    pub bands_csv: Option<PathBuf>,

    /// Plot the band structure to this PNG file
    #[arg(long)]
    pub bands_plot: Option<PathBuf>,

    /// Write the final structure to this extended XYZ file
    #[arg(long)]
    pub xyz: Option<PathBuf>,

    /// Write the final structure back as CP2K &CELL/&COORD blocks
    #[arg(long)]
    pub restart_blocks: Option<PathBuf>,
}
