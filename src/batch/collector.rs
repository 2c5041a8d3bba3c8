//! # 计算目录收集器
//!
//! 在根目录下查找包含主日志文件的计算目录。
//!
//! ## 功能
//! - 根目录本身也可以是一个计算目录
//! - 可选递归搜索
//! - 结果按路径排序
//!
//! ## 依赖关系
//! - 被 `commands/collect.rs` 调用
//! - 使用 `walkdir` 遍历目录

use std::path::PathBuf;
use walkdir::WalkDir;

/// 计算目录收集器
pub struct CalcDirCollector {
    /// 根目录
    root: PathBuf,
    /// 判定计算目录的文件名
    output_file: String,
    /// 是否递归
    recursive: bool,
}

impl CalcDirCollector {
    /// 创建新的收集器
    pub fn new(root: PathBuf, output_file: &str) -> Self {
        Self {
            root,
            output_file: output_file.to_string(),
            recursive: false,
        }
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 收集所有包含主日志的目录
    pub fn collect(&self) -> Vec<PathBuf> {
        if !self.root.is_dir() {
            return vec![];
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        WalkDir::new(&self.root)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .filter(|e| e.path().join(&self.output_file).is_file())
            .map(|e| e.path().to_path_buf())
            .collect()
    }
}
