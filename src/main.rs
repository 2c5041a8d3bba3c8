//! # cp2k-parse - CP2K 输出解析工具
//!
//! 将 CP2K 的自由格式文本日志和重启文件解析为结构化结果：
//! 运行元数据、可选的能带结构、可选的最终原子结构。
//!
//! ## 子命令
//! - `parse`   - 解析单个取回的计算目录
//! - `collect` - 批量解析并汇总
//!
//! ## 退出码
//! - 0: 成功
//! - 2: 没有取回的主日志
//! - 3: 计算未正常结束
//! - 1: 其他错误
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── batch/     (批量并行解析)
//!   │     ├── parsers/   (日志/能带/重启文件解析器)
//!   │     ├── export.rs  (CSV/XYZ/PNG 导出)
//!   │     └── models/    (数据模型)
//!   ├── bundle.rs   (输出文件包)
//!   ├── config.rs   (文件名配置)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod bundle;
mod cli;
mod commands;
mod config;
mod error;
mod export;
mod models;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(e.exit_code());
    }
}
