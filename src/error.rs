//! # 统一错误处理模块
//!
//! 定义 cp2k-parse 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分级
//! - 致命: `MissingOutputFile`, `IncompleteRun`, `MalformedLogLine`, `MalformedBandSection`
//! - 非致命 (由 `parsers::parse_calculation` 吸收): `MissingTrajectoryFile`, `MalformedRestartFile`
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// cp2k-parse 统一错误类型
#[derive(Error, Debug)]
pub enum Cp2kError {
    // ─────────────────────────────────────────────────────────────
    // 输出包错误
    // ─────────────────────────────────────────────────────────────
    #[error("CP2K output file not retrieved: {name}")]
    MissingOutputFile { name: String },

    #[error("Parsing trajectory requested, but no trajectory file available: {name}")]
    MissingTrajectoryFile { name: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("CP2K did not finish properly (no warning-count banner found)")]
    IncompleteRun,

    #[error("Malformed log line {line}: {reason}")]
    MalformedLogLine { line: usize, reason: String },

    #[error("Malformed band structure section at line {line}: {reason}")]
    MalformedBandSection { line: usize, reason: String },

    #[error("Malformed restart file: {reason}")]
    MalformedRestartFile { reason: String },

    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 导出错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Plotting failed: {0}")]
    PlotError(String),

    #[error("{0}")]
    Other(String),
}

impl Cp2kError {
    /// 进程退出码：区分“没有输出”与“计算未完成”
    pub fn exit_code(&self) -> i32 {
        match self {
            Cp2kError::MissingOutputFile { .. } => 2,
            Cp2kError::IncompleteRun => 3,
            _ => 1,
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, Cp2kError>;
