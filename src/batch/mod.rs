//! # 批量处理模块
//!
//! 对大量计算目录统一执行解析。
//!
//! ## 功能
//! - 收集包含主日志的计算目录
//! - 并行解析
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/collect.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::CalcDirCollector;
pub use runner::{BatchRunner, CalcOutcome};
