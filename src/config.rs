//! # 解析配置
//!
//! 期望的输出文件名由外部计算类型描述提供，这里只保存默认值并允许命令行覆盖。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `batch/`, `commands/` 使用
//! - 通过 `#[command(flatten)]` 嵌入 `cli/` 的参数结构

use clap::Args;

/// 主日志文件默认名
pub const DEFAULT_OUTPUT_FILE: &str = "aiida.out";

/// 重启文件默认名
pub const DEFAULT_RESTART_FILE: &str = "aiida-1.restart";

/// 解析器配置
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Name of the primary CP2K log inside the retrieved folder
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE, global = true)]
    pub output_file: String,

    /// Name of the CP2K restart file holding the final structure
    #[arg(long, default_value = DEFAULT_RESTART_FILE, global = true)]
    pub restart_file: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            restart_file: DEFAULT_RESTART_FILE.to_string(),
        }
    }
}
