//! # 原子结构数据模型
//!
//! CP2K 重启文件中的最终结构：元素 + 笛卡尔坐标 (Å) + 晶胞矩阵。
//! 数值从文本直接解析后原样保存，不做任何单位或精度变换。
//!
//! ## 依赖关系
//! - 被 `parsers/restart.rs`, `export.rs` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};

/// 晶胞表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，第 i 行为晶格向量 A/B/C
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)，角度单位：度
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let [a_vec, b_vec, c_vec] = self.matrix;

        let a = norm(&a_vec);
        let b = norm(&b_vec);
        let c = norm(&c_vec);

        let alpha = (dot(&b_vec, &c_vec) / (b * c)).acos().to_degrees();
        let beta = (dot(&a_vec, &c_vec) / (a * c)).acos().to_degrees();
        let gamma = (dot(&a_vec, &b_vec) / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 计算晶胞体积（带符号的行列式）
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.matrix;
        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }
}

fn dot(u: &[f64; 3], v: &[f64; 3]) -> f64 {
    u.iter().zip(v.iter()).map(|(x, y)| x * y).sum()
}

fn norm(u: &[f64; 3]) -> f64 {
    dot(u, u).sqrt()
}

/// 原子信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号（按文件原样，如 "H", "O"）
    pub element: String,

    /// 笛卡尔坐标 [x, y, z] (Å)
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
        }
    }
}

/// 原子结构（每次解析新建，之后不再修改）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicStructure {
    /// 原子列表（保持文件中的顺序）
    pub atoms: Vec<Atom>,

    /// 晶胞
    pub lattice: Lattice,
}

impl AtomicStructure {
    pub fn new(atoms: Vec<Atom>, lattice: Lattice) -> Self {
        AtomicStructure { atoms, lattice }
    }

    /// 原子数
    pub fn natoms(&self) -> usize {
        self.atoms.len()
    }

    /// 计算化学式（按元素符号排序）
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for atom in &self.atoms {
            *counts.entry(atom.element.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 两个原子之间的距离 (Å)
    pub fn distance(&self, i: usize, j: usize) -> Option<f64> {
        let p = self.atoms.get(i)?.position;
        let q = self.atoms.get(j)?.position;
        let d = [q[0] - p[0], q[1] - p[1], q[2] - p[2]];
        Some(norm(&d))
    }

    /// 最近原子间距（不考虑周期性镜像）
    pub fn min_distance(&self) -> Option<f64> {
        let n = self.natoms();
        (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .filter_map(|(i, j)| self.distance(i, j))
            .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |m| m.min(d))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lattice_parameters_cubic() {
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]);
        let (a, b, c, alpha, beta, gamma) = lattice.parameters();

        assert!((a - 4.0).abs() < 1e-6);
        assert!((b - 4.0).abs() < 1e-6);
        assert!((c - 4.0).abs() < 1e-6);
        assert!((alpha - 90.0).abs() < 1e-6);
        assert!((beta - 90.0).abs() < 1e-6);
        assert!((gamma - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_lattice_volume_keeps_sign() {
        // 左手系晶胞，行列式为负
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, -4.0, 0.0], [0.0, 0.0, 4.0]]);
        assert!((lattice.volume() + 64.0).abs() < 1e-9);
    }

    #[test]
    fn test_formula_and_distance() {
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]);
        let structure = AtomicStructure::new(
            vec![
                Atom::new("O", [0.0, 0.0, 0.0]),
                Atom::new("H", [0.0, 0.0, 0.96]),
                Atom::new("H", [0.0, 0.93, -0.24]),
            ],
            lattice,
        );

        assert_eq!(structure.formula(), "H2O");
        assert_eq!(structure.natoms(), 3);
        assert!((structure.distance(0, 1).unwrap() - 0.96).abs() < 1e-12);
        assert!(structure.distance(0, 7).is_none());
        assert!((structure.min_distance().unwrap() - 0.96).abs() < 1e-12);

        let single = AtomicStructure::new(vec![Atom::new("He", [0.0; 3])], structure.lattice.clone());
        assert!(single.min_distance().is_none());
    }
}
