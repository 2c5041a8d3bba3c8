//! # 解析结果导出
//!
//! ## 支持格式
//! - CSV: 能带能量（每个 k 点、每个自旋一行）
//! - XYZ: 扩展 XYZ 结构文件，晶胞写在注释行
//! - CP2K: `&CELL` / `&COORD` 块，可直接放回输入文件
//! - PNG: 能带图
//!
//! ## 依赖关系
//! - 被 `commands/parse.rs` 调用
//! - 使用 `models/`
//! - 使用 `csv` 写入 CSV，`plotters` 绘图

use crate::error::{Cp2kError, Result};
use crate::models::{AtomicStructure, BandStructure};
use crate::parsers::restart;

use std::fs;
use std::path::Path;

/// 导出能带为 CSV
pub fn bands_to_csv(bands: &BandStructure, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    let mut header = vec![
        "kpoint".to_string(),
        "label".to_string(),
        "kx".to_string(),
        "ky".to_string(),
        "kz".to_string(),
        "spin".to_string(),
    ];
    header.extend((1..=bands.nbands()).map(|i| format!("band_{}_{}", i, bands.units)));
    wtr.write_record(&header)?;

    for (spin, rows) in bands.bands.channels().iter().enumerate() {
        for (k, row) in rows.iter().enumerate() {
            let kpoint = bands.kpoints.get(k).map(|kp| kp.0);
            let mut record = vec![
                (k + 1).to_string(),
                bands.label_of(k).unwrap_or_default().to_string(),
            ];
            match kpoint {
                Some(c) => record.extend(c.iter().map(|v| v.to_string())),
                None => record.extend(std::iter::repeat(String::new()).take(3)),
            }
            record.push((spin + 1).to_string());
            record.extend(row.iter().map(|e| e.to_string()));
            wtr.write_record(&record)?;
        }
    }

    wtr.flush().map_err(|e| Cp2kError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 将结构转换为扩展 XYZ 字符串（数值使用最短往返格式）
pub fn to_xyz_string(structure: &AtomicStructure) -> String {
    let lattice = structure
        .lattice
        .matrix
        .iter()
        .flatten()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    let mut result = format!(
        "{}\nLattice=\"{}\" Properties=species:S:1:pos:R:3 pbc=\"T T T\"\n",
        structure.natoms(),
        lattice
    );

    for atom in &structure.atoms {
        result.push_str(&format!(
            "{:<4} {} {} {}\n",
            atom.element, atom.position[0], atom.position[1], atom.position[2]
        ));
    }

    result
}

/// 导出结构为 XYZ 文件
pub fn structure_to_xyz(structure: &AtomicStructure, output_path: &Path) -> Result<()> {
    fs::write(output_path, to_xyz_string(structure)).map_err(|e| Cp2kError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })
}

/// 导出结构为 CP2K `&CELL` / `&COORD` 块
pub fn structure_to_restart_blocks(structure: &AtomicStructure, output_path: &Path) -> Result<()> {
    fs::write(output_path, restart::to_restart_blocks(structure)).map_err(|e| {
        Cp2kError::FileWriteError {
            path: output_path.display().to_string(),
            source: e,
        }
    })
}

/// 沿 k 点序列的累积距离（按日志中的坐标直接计算）
pub fn kpath_distances(bands: &BandStructure) -> Vec<f64> {
    let mut distances = Vec::with_capacity(bands.nkpoints());
    let mut total = 0.0;

    for (i, kp) in bands.kpoints.iter().enumerate() {
        if i > 0 {
            let prev = bands.kpoints[i - 1].0;
            let d: f64 = kp
                .0
                .iter()
                .zip(prev.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();
            total += d.sqrt();
        }
        distances.push(total);
    }

    distances
}

/// 绘制能带图
pub fn plot_bands(bands: &BandStructure, output_path: &Path) -> Result<()> {
    use plotters::prelude::*;

    let x = kpath_distances(bands);
    if x.len() < 2 {
        return Err(Cp2kError::PlotError(
            "need at least two k-points to plot".to_string(),
        ));
    }

    let energies = bands
        .bands
        .channels()
        .iter()
        .flat_map(|rows| rows.iter().flatten().copied())
        .collect::<Vec<f64>>();
    if energies.is_empty() {
        return Err(Cp2kError::PlotError("no band energies to plot".to_string()));
    }
    let y_min = energies.iter().copied().fold(f64::INFINITY, f64::min);
    let y_max = energies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let y_margin = ((y_max - y_min).abs() * 0.05).max(0.1);
    let x_max = x[x.len() - 1];

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| Cp2kError::PlotError(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Band Structure", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, (y_min - y_margin)..(y_max + y_margin))
        .map_err(|e| Cp2kError::PlotError(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("k-path")
        .y_desc(format!("Energy ({})", bands.units))
        .draw()
        .map_err(|e| Cp2kError::PlotError(e.to_string()))?;

    // 高对称点竖线和标签
    for (idx, label) in &bands.labels {
        let Some(&kx) = x.get(*idx) else {
            continue;
        };
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(kx, y_min - y_margin), (kx, y_max + y_margin)],
                BLACK.mix(0.4),
            )))
            .map_err(|e| Cp2kError::PlotError(e.to_string()))?;
        chart
            .draw_series(std::iter::once(Text::new(
                label.clone(),
                (kx, y_max + y_margin),
                ("sans-serif", 14),
            )))
            .map_err(|e| Cp2kError::PlotError(e.to_string()))?;
    }

    let colors = [RED, BLUE];
    for (spin, rows) in bands.bands.channels().iter().enumerate() {
        let color = colors[spin % colors.len()];
        for band in 0..bands.nbands() {
            let points = rows
                .iter()
                .zip(x.iter())
                .filter_map(|(row, kx)| row.get(band).map(|e| (*kx, *e)));
            let series = chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))
                .map_err(|e| Cp2kError::PlotError(e.to_string()))?;
            if band == 0 && bands.is_spin_polarized() {
                let name = if spin == 0 { "Spin up" } else { "Spin down" };
                series
                    .label(name)
                    .legend(move |(lx, ly)| PathElement::new(vec![(lx, ly), (lx + 20, ly)], color));
            }
        }
    }

    if bands.is_spin_polarized() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(|e| Cp2kError::PlotError(e.to_string()))?;
    }

    root.present()
        .map_err(|e| Cp2kError::PlotError(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, BandTable, KPoint, Lattice};

    fn sample_bands() -> BandStructure {
        BandStructure::new(
            vec![
                KPoint::new(0.0, 0.0, 0.0),
                KPoint::new(0.5, 0.0, 0.0),
                KPoint::new(0.5, 0.5, 0.0),
            ],
            vec![(0, "GAMMA".to_string()), (2, "M".to_string())],
            BandTable::SpinPolarized {
                up: vec![vec![-1.0, 1.0], vec![-0.5, 1.5], vec![-0.2, 2.0]],
                down: vec![vec![-0.9, 1.1], vec![-0.4, 1.6], vec![-0.1, 2.1]],
            },
        )
    }

    #[test]
    fn test_kpath_distances() {
        let d = kpath_distances(&sample_bands());
        assert_eq!(d.len(), 3);
        assert!((d[0] - 0.0).abs() < 1e-12);
        assert!((d[1] - 0.5).abs() < 1e-12);
        assert!((d[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_plot_without_energies_is_error() {
        let bands = BandStructure::new(
            vec![KPoint::new(0.0, 0.0, 0.0), KPoint::new(0.5, 0.0, 0.0)],
            vec![],
            BandTable::Single(vec![vec![], vec![]]),
        );
        let path = std::env::temp_dir().join(format!("cp2k-parse-empty-{}.png", std::process::id()));

        assert!(matches!(
            plot_bands(&bands, &path),
            Err(Cp2kError::PlotError(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_xyz_string() {
        let structure = AtomicStructure::new(
            vec![
                Atom::new("H", [0.0, 0.0, 0.0]),
                Atom::new("H", [0.0, 0.0, 0.7400000001]),
            ],
            Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, -4.0, 0.0], [0.0, 0.0, 4.0]]),
        );
        let xyz = to_xyz_string(&structure);
        let lines: Vec<&str> = xyz.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "2");
        assert!(lines[1].starts_with("Lattice=\"4 0 0 0 -4 0 0 0 4\""));
        assert!(lines[3].ends_with("0.7400000001"));
    }

    #[test]
    fn test_bands_csv() {
        let path = std::env::temp_dir().join(format!("cp2k-parse-bands-{}.csv", std::process::id()));
        bands_to_csv(&sample_bands(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        // 表头 + 3 个 k 点 x 2 个自旋
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "kpoint,label,kx,ky,kz,spin,band_1_eV,band_2_eV");
        assert_eq!(lines[1], "1,GAMMA,0,0,0,1,-1,1");
        assert_eq!(lines[6], "3,M,0.5,0.5,0,2,-0.1,2.1");

        fs::remove_file(&path).ok();
    }
}
