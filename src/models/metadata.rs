//! # 运行元数据模型
//!
//! 从 CP2K 主日志中提取的标量信息（对应输出标签 `output_parameters`）。
//!
//! ## 依赖关系
//! - 被 `parsers/stdout.rs` 构建
//! - 被 `commands/` 展示和导出

use serde::{Deserialize, Serialize};

/// 能量单位（CP2K 日志原生使用原子单位）
pub const ENERGY_UNITS: &str = "a.u.";

/// 运行元数据
///
/// `nwarnings` 只有在日志到达正常结束横幅时才会出现，
/// 因此能构造出本结构就说明计算正常结束。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// 是否超过请求的运行时间
    pub exceeded_walltime: bool,

    /// 最后一次出现的总能量 (a.u.)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,

    /// 能量单位，仅与 `energy` 同时出现
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_units: Option<String>,

    /// 警告数
    pub nwarnings: u64,
}

impl RunMetadata {
    pub fn new(nwarnings: u64) -> Self {
        RunMetadata {
            exceeded_walltime: false,
            energy: None,
            energy_units: None,
            nwarnings,
        }
    }

    /// 设置能量，同时写入单位
    pub fn with_energy(mut self, energy: Option<f64>) -> Self {
        self.energy_units = energy.map(|_| ENERGY_UNITS.to_string());
        self.energy = energy;
        self
    }

    pub fn with_exceeded_walltime(mut self, exceeded: bool) -> Self {
        self.exceeded_walltime = exceeded;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_and_units_co_occur() {
        let meta = RunMetadata::new(0).with_energy(Some(-17.1));
        assert_eq!(meta.energy, Some(-17.1));
        assert_eq!(meta.energy_units.as_deref(), Some("a.u."));

        let meta = RunMetadata::new(2).with_energy(None);
        assert!(meta.energy.is_none());
        assert!(meta.energy_units.is_none());
        assert!(!meta.exceeded_walltime);
    }
}
