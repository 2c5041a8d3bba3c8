//! # 数据模型模块
//!
//! 定义解析结果的三类记录：运行元数据、能带结构、原子结构。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`export.rs` 和 `commands/` 使用
//! - 子模块: metadata, bands, structure

pub mod bands;
pub mod metadata;
pub mod structure;

pub use bands::{BandStructure, BandTable, KPoint};
pub use metadata::RunMetadata;
pub use structure::{Atom, AtomicStructure, Lattice};
