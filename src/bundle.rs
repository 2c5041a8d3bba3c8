//! # 输出文件包
//!
//! 解析器只通过文件名查询计算取回的文件，不关心它们存放在哪里。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `batch/`, `commands/` 使用
//! - 无外部模块依赖

use crate::error::{Cp2kError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 按文件名解析内容的只读文件包
pub trait OutputBundle {
    /// 是否包含指定文件
    fn has(&self, name: &str) -> bool;

    /// 读取原始字节
    fn read_bytes(&self, name: &str) -> Result<Vec<u8>>;

    /// 读取文本（按 UTF-8 解码）
    fn read_text(&self, name: &str) -> Result<String> {
        let bytes = self.read_bytes(name)?;
        String::from_utf8(bytes).map_err(|e| Cp2kError::FileReadError {
            path: name.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }
}

/// 基于目录的文件包（取回的计算目录）
#[derive(Debug, Clone)]
pub struct DirBundle {
    root: PathBuf,
}

impl DirBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirBundle { root: root.into() }
    }

    /// 打开已存在的目录
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Cp2kError::DirectoryNotFound {
                path: root.display().to_string(),
            });
        }
        Ok(DirBundle::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputBundle for DirBundle {
    fn has(&self, name: &str) -> bool {
        self.root.join(name).is_file()
    }

    fn read_bytes(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.root.join(name);
        fs::read(&path).map_err(|e| Cp2kError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// 内存文件包（测试用）
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryBundle {
    files: std::collections::HashMap<String, Vec<u8>>,
}

#[cfg(test)]
impl MemoryBundle {
    pub fn with_file(mut self, name: &str, content: &str) -> Self {
        self.files.insert(name.to_string(), content.as_bytes().to_vec());
        self
    }
}

#[cfg(test)]
impl OutputBundle for MemoryBundle {
    fn has(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    fn read_bytes(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| Cp2kError::FileReadError {
                path: name.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }
}
