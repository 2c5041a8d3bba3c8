//! # CP2K 重启文件结构解析器
//!
//! 从重启文件中提取 `&COORD` 和 `&CELL` 块，构建最终原子结构。
//!
//! ## 重启文件格式（节选）
//! ```text
//!      &CELL
//!        A     4.0000000000000000E+00    0.0000000000000000E+00    0.0000000000000000E+00
//!        B     0.0000000000000000E+00   -4.0000000000000000E+00    0.0000000000000000E+00
//!        C     0.0000000000000000E+00    0.0000000000000000E+00    4.0000000001000000E+00
//!        PERIODIC  XYZ
//!      &END CELL
//!      &COORD
//! H    0.0000000000000000E+00    0.0000000000000000E+00    0.0000000000000000E+00
//! H    0.0000000000000000E+00    0.0000000000000000E+00    7.4000000010000003E-01
//!      &END COORD
//! ```
//! 坐标和晶胞按文本直接转换为 f64，不经过任何单位换算。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 调用
//! - 使用 `models/structure.rs`

use crate::error::{Cp2kError, Result};
use crate::models::{Atom, AtomicStructure, Lattice};
use regex::Regex;

/// 晶胞向量标签，依次对应矩阵的第 0/1/2 行
const CELL_LABELS: [&str; 3] = ["A", "B", "C"];

/// 从重启文件内容解析原子结构
pub fn parse_structure(content: &str) -> Result<AtomicStructure> {
    let coord_body = find_block(content, "COORD")?;
    let atoms = parse_coord_block(coord_body)?;

    let cell_body = find_block(content, "CELL")?;
    let lattice = parse_cell_block(cell_body)?;

    Ok(AtomicStructure::new(atoms, lattice))
}

/// 查找 `&NAME` ... `&END NAME` 之间的内容（不含标记行）
fn find_block<'a>(content: &'a str, name: &str) -> Result<&'a str> {
    let pattern = Regex::new(&format!(
        r"(?s)\r?\n\s*&{name}\r?\n(.*?)\r?\n\s*&END {name}\r?\n"
    ))
        .map_err(|e| Cp2kError::Other(e.to_string()))?;

    pattern
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| Cp2kError::MalformedRestartFile {
            reason: format!("missing &{} block", name),
        })
}

/// 解析坐标块：`元素 x y z`
fn parse_coord_block(body: &str) -> Result<Vec<Atom>> {
    let mut atoms = Vec::new();

    for line in body.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        if parts.len() < 4 {
            return Err(Cp2kError::MalformedRestartFile {
                reason: format!("incomplete coordinate line '{}'", line.trim()),
            });
        }

        let position = parse_vector(&parts[1..4])?;
        atoms.push(Atom::new(parts[0], position));
    }

    if atoms.is_empty() {
        return Err(Cp2kError::MalformedRestartFile {
            reason: "empty &COORD block".to_string(),
        });
    }

    Ok(atoms)
}

/// 解析晶胞块，只保留 A/B/C 行；嵌套子段（如 `&CELL_REF`）被跳过
fn parse_cell_block(body: &str) -> Result<Lattice> {
    let mut rows: [Option<[f64; 3]>; 3] = [None; 3];
    let mut depth = 0usize;

    for line in body.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = parts.first() else {
            continue;
        };

        if first.eq_ignore_ascii_case("&END") {
            depth = depth.saturating_sub(1);
            continue;
        }
        if first.starts_with('&') {
            depth += 1;
            continue;
        }
        if depth > 0 {
            continue;
        }

        let Some(row) = CELL_LABELS.iter().position(|l| l == first) else {
            continue;
        };
        if parts.len() < 4 {
            return Err(Cp2kError::MalformedRestartFile {
                reason: format!("incomplete cell vector '{}'", line.trim()),
            });
        }
        if rows[row].is_some() {
            return Err(Cp2kError::MalformedRestartFile {
                reason: format!("duplicate cell vector {}", first),
            });
        }
        rows[row] = Some(parse_vector(&parts[1..4])?);
    }

    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in rows.iter().enumerate() {
        matrix[i] = row.ok_or_else(|| Cp2kError::MalformedRestartFile {
            reason: format!("missing cell vector {}", CELL_LABELS[i]),
        })?;
    }

    Ok(Lattice::from_vectors(matrix))
}

fn parse_vector(tokens: &[&str]) -> Result<[f64; 3]> {
    let mut v = [0.0; 3];
    for (c, token) in v.iter_mut().zip(tokens) {
        *c = token.parse().map_err(|_| Cp2kError::MalformedRestartFile {
            reason: format!("invalid number '{}'", token),
        })?;
    }
    Ok(v)
}

/// 将结构写成重启文件中的 `&CELL` / `&COORD` 块
///
/// 使用 17 位有效数字，解析回来与原值逐位相同。
pub fn to_restart_blocks(structure: &AtomicStructure) -> String {
    let mut result = String::new();

    result.push_str(" &FORCE_EVAL\n   &SUBSYS\n     &CELL\n");
    for (label, row) in CELL_LABELS.iter().zip(structure.lattice.matrix.iter()) {
        result.push_str(&format!(
            "       {}  {:>26.16E}  {:>26.16E}  {:>26.16E}\n",
            label, row[0], row[1], row[2]
        ));
    }
    result.push_str("       PERIODIC  XYZ\n");
    result.push_str("     &END CELL\n     &COORD\n");
    for atom in &structure.atoms {
        result.push_str(&format!(
            "{:<4} {:>26.16E}  {:>26.16E}  {:>26.16E}\n",
            atom.element, atom.position[0], atom.position[1], atom.position[2]
        ));
    }
    result.push_str("     &END COORD\n   &END SUBSYS\n &END FORCE_EVAL\n");

    result
}
