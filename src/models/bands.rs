//! # 能带结构数据模型
//!
//! CP2K 能带计算段落的解析结果（对应输出标签 `output_bands`）。
//!
//! ## 依赖关系
//! - 被 `parsers/bands.rs` 构建
//! - 被 `export.rs`, `commands/` 使用

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// 能带能量单位
pub const BAND_UNITS: &str = "eV";

/// k 点坐标（按日志中的原样读取）
///
/// 作为查找键使用：相等与哈希都按每个分量的精确位模式比较，没有容差。
/// `-0.0` 视同 `0.0`，与浮点相等语义一致。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KPoint(pub [f64; 3]);

impl KPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        KPoint([x, y, z])
    }

    fn key(&self) -> [u64; 3] {
        // -0.0 + 0.0 == +0.0
        self.0.map(|v| (v + 0.0).to_bits())
    }
}

impl PartialEq for KPoint {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for KPoint {}

impl Hash for KPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// 能带能量表，形状 [kpoint][band]
///
/// 单自旋时为一个二维数组；出现第二自旋通道时为两个平行的二维数组。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BandTable {
    Single(Vec<Vec<f64>>),
    SpinPolarized {
        up: Vec<Vec<f64>>,
        down: Vec<Vec<f64>>,
    },
}

impl BandTable {
    /// 按自旋通道依次返回各二维数组
    pub fn channels(&self) -> Vec<&[Vec<f64>]> {
        match self {
            BandTable::Single(rows) => vec![rows.as_slice()],
            BandTable::SpinPolarized { up, down } => vec![up.as_slice(), down.as_slice()],
        }
    }
}

/// 能带结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandStructure {
    /// k 点序列（自旋 1 首次出现的顺序）
    pub kpoints: Vec<KPoint>,

    /// 高对称点标签 (k 点下标, 标签)
    pub labels: Vec<(usize, String)>,

    /// 能带能量
    pub bands: BandTable,

    /// 能量单位
    pub units: String,
}

impl BandStructure {
    pub fn new(kpoints: Vec<KPoint>, labels: Vec<(usize, String)>, bands: BandTable) -> Self {
        BandStructure {
            kpoints,
            labels,
            bands,
            units: BAND_UNITS.to_string(),
        }
    }

    pub fn nkpoints(&self) -> usize {
        self.kpoints.len()
    }

    /// 每个 k 点的能带数（取第一行的长度）
    pub fn nbands(&self) -> usize {
        self.bands
            .channels()
            .first()
            .and_then(|rows| rows.first())
            .map_or(0, |row| row.len())
    }

    pub fn is_spin_polarized(&self) -> bool {
        matches!(self.bands, BandTable::SpinPolarized { .. })
    }

    /// 查找 k 点下标对应的标签
    pub fn label_of(&self, index: usize) -> Option<&str> {
        self.labels
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, l)| l.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_kpoint_exact_equality() {
        let a = KPoint::new(0.5, 0.0, 0.0);
        let b = KPoint::new(0.5, 0.0, 0.0);
        let c = KPoint::new(0.5 + 1e-12, 0.0, 0.0);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_kpoint_negative_zero_is_zero() {
        let mut labels = HashMap::new();
        labels.insert(KPoint::new(0.0, 0.0, 0.0), "GAMMA");
        assert_eq!(labels.get(&KPoint::new(-0.0, 0.0, -0.0)), Some(&"GAMMA"));
    }

    #[test]
    fn test_band_structure_shape_helpers() {
        let single = BandStructure::new(
            vec![KPoint::new(0.0, 0.0, 0.0)],
            vec![(0, "GAMMA".to_string())],
            BandTable::Single(vec![vec![-1.0, 2.0, 3.0]]),
        );
        assert_eq!(single.nkpoints(), 1);
        assert_eq!(single.nbands(), 3);
        assert!(!single.is_spin_polarized());
        assert_eq!(single.label_of(0), Some("GAMMA"));
        assert_eq!(single.label_of(1), None);
        assert_eq!(single.units, "eV");

        let polarized = BandStructure::new(
            vec![KPoint::new(0.0, 0.0, 0.0)],
            vec![],
            BandTable::SpinPolarized {
                up: vec![vec![1.0, 2.0]],
                down: vec![vec![1.5, 2.5]],
            },
        );
        assert!(polarized.is_spin_polarized());
        assert_eq!(polarized.bands.channels().len(), 2);
        assert_eq!(polarized.nbands(), 2);
    }
}
