//! # CP2K 能带结构段落解析器
//!
//! 从 `KPOINTS| Band Structure Calculation` 所在行开始扫描到文件末尾。
//!
//! ## 段落格式
//! ```text
//!  KPOINTS| Special K-Point     1       GAMMA      0.00000000    0.00000000    0.00000000
//!  KPOINTS| Special K-Point     2  not specified   0.50000000    0.00000000    0.00000000
//!   Nr.    1    Spin 1        K-Point  0.00000000    0.00000000    0.00000000
//!              5
//!     -10.1000     -1.2000      3.4000      3.4000
//!       7.8000
//! ```
//! 头行之后的一行给出能带数 n，随后 ceil(n/4) 行每行至多 4 个能量值。
//!
//! ## 依赖关系
//! - 被 `parsers/stdout.rs` 调用
//! - 使用 `models/bands.rs`

use crate::error::{Cp2kError, Result};
use crate::models::{BandStructure, BandTable, KPoint};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// 高对称点声明行标记
pub const SPECIAL_KPOINT_TAG: &str = "KPOINTS| Special K-Point";

/// 每行能量值的最大个数
pub const VALUES_PER_LINE: usize = 4;

/// k 点/自旋头行：从行首开始，依次包含 "Nr"、"Spin"、"K-Point"
fn header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)^.*?Nr.*?Spin.*?K-Point").expect("valid regex"))
}

/// 判断是否为 k 点/自旋头行
pub fn is_kpoint_header(line: &str) -> bool {
    header_pattern().is_match(line)
}

/// n 个能量值占用的行数
pub fn value_line_count(count: usize) -> usize {
    count.div_ceil(VALUES_PER_LINE)
}

/// 解析能带段落
///
/// `start` 为段落标题在 `lines` 中的下标；错误中的行号为整个日志中的 1-based 行号。
pub fn extract_bands(lines: &[&str], start: usize) -> Result<BandStructure> {
    let section = lines.get(start..).unwrap_or(&[]);

    let mut kpoints: Vec<KPoint> = Vec::new();
    let mut labels: Vec<(usize, String)> = Vec::new();
    let mut bands_s1: Vec<Vec<f64>> = Vec::new();
    let mut bands_s2: Vec<Vec<f64>> = Vec::new();
    let mut known_kpoints: HashMap<KPoint, String> = HashMap::new();

    let mut i = 0;
    while i < section.len() {
        let line = section[i];
        let line_no = start + i + 1;

        if line.contains(SPECIAL_KPOINT_TAG) {
            let (kpoint, label) = parse_special_kpoint(line, line_no)?;
            if let Some(label) = label {
                known_kpoints.insert(kpoint, label);
            }
            i += 1;
        } else if is_kpoint_header(line) {
            let (spin, kpoint) = parse_kpoint_header(line, line_no)?;

            let count_line = section
                .get(i + 1)
                .ok_or_else(|| malformed(line_no + 1, "missing band count line"))?;
            let count: usize = count_line.trim().parse().map_err(|_| {
                malformed(
                    line_no + 1,
                    &format!("invalid band count '{}'", count_line.trim()),
                )
            })?;

            let first = i + 2;
            let nlines = value_line_count(count);
            let end = first.saturating_add(nlines);
            if end > section.len() {
                return Err(malformed(
                    line_no,
                    &format!(
                        "expected {} band value lines, found {}",
                        nlines,
                        section.len().saturating_sub(first)
                    ),
                ));
            }

            let band = parse_band_values(&section[first..end], count, start + first + 1)?;

            match spin {
                1 => {
                    // 标签下标为该 k 点即将占据的位置
                    if let Some(label) = known_kpoints.get(&kpoint) {
                        labels.push((kpoints.len(), label.clone()));
                    }
                    kpoints.push(kpoint);
                    bands_s1.push(band);
                }
                2 => bands_s2.push(band),
                _ => {}
            }

            i = end;
        } else {
            i += 1;
        }
    }

    check_rows(&bands_s1, 1, start)?;
    check_rows(&bands_s2, 2, start)?;

    let bands = if bands_s2.is_empty() {
        BandTable::Single(bands_s1)
    } else {
        BandTable::SpinPolarized {
            up: bands_s1,
            down: bands_s2,
        }
    };

    Ok(BandStructure::new(kpoints, labels, bands))
}

/// 解析高对称点声明行，返回 (k 点, 可选标签)
fn parse_special_kpoint(line: &str, line_no: usize) -> Result<(KPoint, Option<String>)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return Err(malformed(line_no, "special k-point line too short"));
    }

    let n = parts.len();
    let kpoint = parse_kpoint(&parts[n - 3..], line_no)?;

    let label = if parts[n - 5..n - 3].join(" ") != "not specified" {
        Some(parts[n - 4].to_string())
    } else {
        None
    };

    Ok((kpoint, label))
}

/// 解析头行，返回 (自旋, k 点)
fn parse_kpoint_header(line: &str, line_no: usize) -> Result<(u32, KPoint)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 7 {
        return Err(malformed(line_no, "k-point header line too short"));
    }

    let spin: u32 = parts[3]
        .parse()
        .map_err(|_| malformed(line_no, &format!("invalid spin index '{}'", parts[3])))?;
    let kpoint = parse_kpoint(&parts[parts.len() - 3..], line_no)?;

    Ok((spin, kpoint))
}

fn parse_kpoint(tokens: &[&str], line_no: usize) -> Result<KPoint> {
    let mut coords = [0.0; 3];
    for (c, token) in coords.iter_mut().zip(tokens) {
        *c = token
            .parse()
            .map_err(|_| malformed(line_no, &format!("invalid k-point coordinate '{}'", token)))?;
    }
    Ok(KPoint::new(coords[0], coords[1], coords[2]))
}

/// 拼接换行的能量值并按顺序解析
fn parse_band_values(value_lines: &[&str], count: usize, first_line_no: usize) -> Result<Vec<f64>> {
    let mut band = Vec::with_capacity(count);
    for (offset, line) in value_lines.iter().enumerate() {
        for token in line.split_whitespace() {
            let value: f64 = token.parse().map_err(|_| {
                malformed(first_line_no + offset, &format!("invalid band energy '{}'", token))
            })?;
            band.push(value);
        }
    }

    if band.len() != count {
        return Err(malformed(
            first_line_no,
            &format!("expected {} band energies, found {}", count, band.len()),
        ));
    }

    Ok(band)
}

/// 同一自旋的所有行长度必须一致
fn check_rows(rows: &[Vec<f64>], spin: u32, start: usize) -> Result<()> {
    if let Some(first) = rows.first() {
        if let Some(bad) = rows.iter().position(|r| r.len() != first.len()) {
            return Err(malformed(
                start + 1,
                &format!(
                    "spin {} k-point {} has {} bands, expected {}",
                    spin,
                    bad + 1,
                    rows[bad].len(),
                    first.len()
                ),
            ));
        }
    }
    Ok(())
}

fn malformed(line: usize, reason: &str) -> Cp2kError {
    Cp2kError::MalformedBandSection {
        line,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPIN_POLARIZED: &str = r#" KPOINTS| Band Structure Calculation
 KPOINTS| Number of K-Point Sets                                             1
 KPOINTS| Special K-Point     1       GAMMA      0.00000000    0.00000000    0.00000000
 KPOINTS| Special K-Point     2  not specified   0.50000000    0.00000000    0.00000000
  Nr.    1    Spin 1        K-Point  0.00000000    0.00000000    0.00000000
             5
    -10.10000000     -1.20000000      3.40000000      3.40000000
      7.80000000
  Nr.    1    Spin 2        K-Point  0.00000000    0.00000000    0.00000000
             5
    -10.00000000     -1.10000000      3.50000000      3.50000000
      7.90000000
  Nr.    2    Spin 1        K-Point  0.50000000    0.00000000    0.00000000
             5
     -9.10000000     -2.20000000      1.40000000      5.40000000
      8.80000000
  Nr.    2    Spin 2        K-Point  0.50000000    0.00000000    0.00000000
             5
     -9.00000000     -2.10000000      1.50000000      5.50000000
      8.90000000
"#;

    const SINGLE_SPIN: &str = r#" KPOINTS| Band Structure Calculation
 KPOINTS| Special K-Point     1       X          0.50000000    0.00000000    0.50000000
  Nr.    1    Spin 1        K-Point  0.00000000    0.00000000    0.00000000
             4
     -5.00000000     -1.00000000      2.00000000      4.00000000
  Nr.    2    Spin 1        K-Point  0.50000000    0.00000000    0.50000000
             4
     -4.00000000     -2.00000000      3.00000000      5.00000000
"#;

    #[test]
    fn test_value_line_count() {
        assert_eq!(value_line_count(0), 0);
        assert_eq!(value_line_count(1), 1);
        assert_eq!(value_line_count(4), 1);
        assert_eq!(value_line_count(5), 2);
        assert_eq!(value_line_count(8), 2);
        assert_eq!(value_line_count(9), 3);
        assert_eq!(value_line_count(usize::MAX), usize::MAX / 4 + 1);
    }

    #[test]
    fn test_huge_band_count_is_error() {
        let text = "  Nr. 1 Spin 1 K-Point 0.0 0.0 0.0\n 18446744073709551615\n 1.0";
        let lines: Vec<&str> = text.lines().collect();
        assert!(matches!(
            extract_bands(&lines, 0),
            Err(Cp2kError::MalformedBandSection { line: 1, .. })
        ));
    }

    #[test]
    fn test_header_pattern() {
        assert!(is_kpoint_header("  Nr.    1    Spin 1        K-Point  0.0 0.0 0.0"));
        assert!(!is_kpoint_header("  Spin 1 Nr. 1 K-Point 0.0 0.0 0.0"));
        assert!(!is_kpoint_header("  nr.    1    spin 1        k-point  0.0 0.0 0.0"));
    }

    #[test]
    fn test_spin_polarized_section() {
        let lines: Vec<&str> = SPIN_POLARIZED.lines().collect();
        let bands = extract_bands(&lines, 0).unwrap();

        assert_eq!(
            bands.kpoints,
            vec![KPoint::new(0.0, 0.0, 0.0), KPoint::new(0.5, 0.0, 0.0)]
        );
        assert_eq!(bands.labels, vec![(0, "GAMMA".to_string())]);

        match &bands.bands {
            BandTable::SpinPolarized { up, down } => {
                assert_eq!(up.len(), 2);
                assert_eq!(down.len(), 2);
                assert_eq!(up[0], vec![-10.1, -1.2, 3.4, 3.4, 7.8]);
                assert_eq!(down[1], vec![-9.0, -2.1, 1.5, 5.5, 8.9]);
            }
            BandTable::Single(_) => panic!("expected two spin channels"),
        }
    }

    #[test]
    fn test_single_spin_section() {
        let lines: Vec<&str> = SINGLE_SPIN.lines().collect();
        let bands = extract_bands(&lines, 0).unwrap();

        assert_eq!(bands.nkpoints(), 2);
        assert_eq!(bands.nbands(), 4);
        // 标签下标指向第二个 k 点
        assert_eq!(bands.labels, vec![(1, "X".to_string())]);

        match &bands.bands {
            BandTable::Single(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[1], vec![-4.0, -2.0, 3.0, 5.0]);
            }
            BandTable::SpinPolarized { .. } => panic!("expected a single channel"),
        }
    }

    #[test]
    fn test_lines_before_start_are_ignored() {
        let mut lines = vec!["  Nr.    9    Spin 1        K-Point  0.1 0.1 0.1", " 1", " 1.0"];
        lines.extend(SINGLE_SPIN.lines());
        let bands = extract_bands(&lines, 3).unwrap();
        assert_eq!(bands.nkpoints(), 2);
    }

    #[test]
    fn test_truncated_values_is_error() {
        let text = " KPOINTS| Band Structure Calculation\n  Nr.    1    Spin 1        K-Point  0.0 0.0 0.0\n             5\n  1.0 2.0 3.0 4.0\n";
        let lines: Vec<&str> = text.lines().collect();
        let err = extract_bands(&lines, 0).unwrap_err();
        assert!(matches!(err, Cp2kError::MalformedBandSection { line: 2, .. }));
    }

    #[test]
    fn test_missing_count_line_is_error() {
        let text = " KPOINTS| Band Structure Calculation\n  Nr.    1    Spin 1        K-Point  0.0 0.0 0.0\n";
        let lines: Vec<&str> = text.lines().collect();
        assert!(matches!(
            extract_bands(&lines, 0),
            Err(Cp2kError::MalformedBandSection { line: 3, .. })
        ));
    }

    #[test]
    fn test_value_count_mismatch_is_error() {
        let text = "  Nr.    1    Spin 1        K-Point  0.0 0.0 0.0\n             3\n  1.0 2.0\n";
        let lines: Vec<&str> = text.lines().collect();
        assert!(matches!(
            extract_bands(&lines, 0),
            Err(Cp2kError::MalformedBandSection { .. })
        ));
    }

    #[test]
    fn test_label_requires_exact_coordinates() {
        let text = r#" KPOINTS| Special K-Point     1       L          0.50000000    0.50000000    0.50000000
  Nr.    1    Spin 1        K-Point  0.50000001    0.50000000    0.50000000
             1
      1.00000000
"#;
        let lines: Vec<&str> = text.lines().collect();
        let bands = extract_bands(&lines, 0).unwrap();
        assert!(bands.labels.is_empty());
    }
}
