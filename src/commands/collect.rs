//! # collect 命令实现
//!
//! 批量解析计算目录，输出汇总表格和 CSV。
//!
//! ## 功能
//! - 查找包含主日志的计算目录
//! - 并行解析
//! - 未完成/失败的目录单独报告，不中断整体流程
//!
//! ## 依赖关系
//! - 使用 `cli/collect.rs` 定义的参数
//! - 使用 `batch/`
//! - 使用 `utils/output.rs`

use crate::batch::{BatchRunner, CalcDirCollector, CalcOutcome};
use crate::cli::collect::CollectArgs;
use crate::config::ParserConfig;
use crate::error::{Cp2kError, Result};
use crate::utils::output;

use serde::Serialize;
use std::path::Path;
use tabled::{Table, Tabled};

/// CSV 汇总行
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub directory: String,
    pub status: String,
    pub energy: Option<f64>,
    pub energy_units: Option<String>,
    pub nwarnings: Option<u64>,
    pub exceeded_walltime: Option<bool>,
    pub nkpoints: Option<usize>,
    pub nbands: Option<usize>,
    pub spin_polarized: Option<bool>,
    pub natoms: Option<usize>,
    pub formula: Option<String>,
}

impl SummaryRow {
    /// 从单个目录的解析结果构建
    pub fn from_outcome(outcome: &CalcOutcome) -> Self {
        let mut row = SummaryRow {
            directory: outcome.dir.display().to_string(),
            status: status_of(outcome).to_string(),
            energy: None,
            energy_units: None,
            nwarnings: None,
            exceeded_walltime: None,
            nkpoints: None,
            nbands: None,
            spin_polarized: None,
            natoms: None,
            formula: None,
        };

        if let Ok(parsed) = &outcome.result {
            if let Some(meta) = &parsed.metadata {
                row.energy = meta.energy;
                row.energy_units = meta.energy_units.clone();
                row.nwarnings = Some(meta.nwarnings);
                row.exceeded_walltime = Some(meta.exceeded_walltime);
            }
            if let Some(bands) = &parsed.bands {
                row.nkpoints = Some(bands.nkpoints());
                row.nbands = Some(bands.nbands());
                row.spin_polarized = Some(bands.is_spin_polarized());
            }
            if let Some(structure) = &parsed.structure {
                row.natoms = Some(structure.natoms());
                row.formula = Some(structure.formula());
            }
        }

        row
    }
}

/// 终端表格行
#[derive(Debug, Clone, Tabled)]
struct TableRow {
    #[tabled(rename = "Directory")]
    directory: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Energy (a.u.)")]
    energy: String,
    #[tabled(rename = "Warnings")]
    nwarnings: String,
    #[tabled(rename = "Formula")]
    formula: String,
}

impl From<&SummaryRow> for TableRow {
    fn from(row: &SummaryRow) -> Self {
        let name = Path::new(&row.directory)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| row.directory.clone());

        TableRow {
            directory: name,
            status: row.status.clone(),
            energy: row.energy.map(|e| format!("{:.8}", e)).unwrap_or_default(),
            nwarnings: row.nwarnings.map(|n| n.to_string()).unwrap_or_default(),
            formula: row.formula.clone().unwrap_or_default(),
        }
    }
}

/// 结果状态标签
fn status_of(outcome: &CalcOutcome) -> &'static str {
    match &outcome.result {
        Ok(_) => "finished",
        Err(Cp2kError::IncompleteRun) => "incomplete",
        Err(Cp2kError::MissingOutputFile { .. }) => "missing_output",
        Err(_) => "error",
    }
}

/// 执行 collect 命令
pub fn execute(args: CollectArgs, config: &ParserConfig) -> Result<()> {
    output::print_header("Collecting CP2K Results");

    if !args.root.is_dir() {
        return Err(Cp2kError::DirectoryNotFound {
            path: args.root.display().to_string(),
        });
    }

    let dirs = CalcDirCollector::new(args.root.clone(), &config.output_file)
        .recursive(args.recursive)
        .collect();

    if dirs.is_empty() {
        output::print_warning(&format!(
            "No folders containing '{}' found under {}",
            config.output_file,
            args.root.display()
        ));
        return Ok(());
    }

    output::print_info(&format!("Found {} calculation folders", dirs.len()));

    let result = BatchRunner::new(args.jobs, config.clone()).run(dirs)?;

    for outcome in &result.outcomes {
        if let Err(e) = &outcome.result {
            output::print_warning(&format!("{}: {}", outcome.dir.display(), e));
        }
    }

    let rows: Vec<SummaryRow> = result.outcomes.iter().map(SummaryRow::from_outcome).collect();

    let table_rows: Vec<TableRow> = rows.iter().map(TableRow::from).collect();
    println!("{}", Table::new(&table_rows));

    write_summary_csv(&rows, &args.output)?;
    output::print_success(&format!("Summary saved to '{}'", args.output.display()));

    output::print_done(&format!(
        "{} finished, {} incomplete, {} failed (total {})",
        result.finished,
        result.incomplete,
        result.failed,
        result.total()
    ));

    Ok(())
}

/// 保存汇总 CSV
fn write_summary_csv(rows: &[SummaryRow], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for row in rows {
        wtr.serialize(row)?;
    }

    wtr.flush().map_err(|e| Cp2kError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunMetadata;
    use crate::parsers::ParsedCalculation;
    use std::fs;
    use std::path::PathBuf;

    fn finished_outcome() -> CalcOutcome {
        let parsed = ParsedCalculation {
            metadata: Some(RunMetadata::new(1).with_energy(Some(-17.5))),
            ..ParsedCalculation::default()
        };
        CalcOutcome {
            dir: PathBuf::from("/calcs/h2o"),
            result: Ok(parsed),
        }
    }

    #[test]
    fn test_summary_row_from_outcome() {
        let row = SummaryRow::from_outcome(&finished_outcome());
        assert_eq!(row.status, "finished");
        assert_eq!(row.energy, Some(-17.5));
        assert_eq!(row.nwarnings, Some(1));
        assert!(row.natoms.is_none());

        let incomplete = CalcOutcome {
            dir: PathBuf::from("/calcs/running"),
            result: Err(Cp2kError::IncompleteRun),
        };
        let row = SummaryRow::from_outcome(&incomplete);
        assert_eq!(row.status, "incomplete");
        assert!(row.energy.is_none());

        let table = TableRow::from(&row);
        assert_eq!(table.directory, "running");
    }

    #[test]
    fn test_write_summary_csv() {
        let path = std::env::temp_dir().join(format!("cp2k-parse-summary-{}.csv", std::process::id()));
        let rows = vec![SummaryRow::from_outcome(&finished_outcome())];
        write_summary_csv(&rows, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "directory,status,energy,energy_units,nwarnings,exceeded_walltime,nkpoints,nbands,spin_polarized,natoms,formula"
        );
        assert_eq!(lines[1], "/calcs/h2o,finished,-17.5,a.u.,1,false,,,,,");

        fs::remove_file(&path).ok();
    }
}
