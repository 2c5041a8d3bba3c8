//! # parse 命令实现
//!
//! 解析单个取回的计算目录并展示/导出结果。
//!
//! ## 功能
//! - 运行元数据表格
//! - 能带结构摘要，可导出 CSV 和 PNG
//! - 最终结构摘要，可导出 XYZ 或 CP2K 块
//!
//! ## 依赖关系
//! - 使用 `cli/parse.rs` 定义的参数
//! - 使用 `parsers/`, `export.rs`
//! - 使用 `utils/output.rs`

use crate::bundle::DirBundle;
use crate::cli::parse::ParseArgs;
use crate::config::ParserConfig;
use crate::error::{Cp2kError, Result};
use crate::export;
use crate::models::{AtomicStructure, BandStructure, RunMetadata};
use crate::parsers::{
    self, ParsedCalculation, ParserOutput, ResultSink, StructureStatus, OUTPUT_BANDS,
    OUTPUT_PARAMETERS, OUTPUT_STRUCTURE,
};
use crate::utils::output;

use tabled::{Table, Tabled};

/// 键值表格行
#[derive(Debug, Clone, Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl FieldRow {
    fn new(field: &str, value: impl ToString) -> Self {
        FieldRow {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// 边收集边报告的接收端
#[derive(Default)]
struct ReportingSink {
    collected: ParsedCalculation,
}

impl ResultSink for ReportingSink {
    fn emit(&mut self, output: ParserOutput) {
        output::print_info(&format!("Emitted {}", output.label()));
        self.collected.emit(output);
    }
}

/// 执行 parse 命令
pub fn execute(args: ParseArgs, config: &ParserConfig) -> Result<()> {
    output::print_header("Parsing CP2K Output");

    let bundle = DirBundle::open(&args.dir)?;
    output::print_info(&format!(
        "Reading '{}' from {}",
        config.output_file,
        bundle.root().display()
    ));

    let mut sink = ReportingSink::default();
    let status = parsers::parse_calculation(&bundle, config, &mut sink)?;
    let mut parsed = sink.collected;
    parsed.structure_status = status;

    let metadata = parsed
        .metadata
        .ok_or_else(|| Cp2kError::Other(format!("{} was not produced", OUTPUT_PARAMETERS)))?;
    print_metadata(&metadata);

    match &parsed.bands {
        Some(bands) => {
            print_bands(bands);
            if let Some(ref path) = args.bands_csv {
                export::bands_to_csv(bands, path)?;
                output::print_success(&format!("Band energies saved to '{}'", path.display()));
            }
            if let Some(ref path) = args.bands_plot {
                export::plot_bands(bands, path)?;
                output::print_success(&format!("Band plot saved to '{}'", path.display()));
            }
        }
        None => {
            output::print_skip(&format!("{}: no band structure section", OUTPUT_BANDS));
            if args.bands_csv.is_some() || args.bands_plot.is_some() {
                output::print_warning("Band export requested but the log has no band structure");
            }
        }
    }

    match (&parsed.structure, &parsed.structure_status) {
        (Some(structure), _) => {
            print_structure(structure);
            if let Some(ref path) = args.xyz {
                export::structure_to_xyz(structure, path)?;
                output::print_success(&format!("Structure saved to '{}'", path.display()));
            }
            if let Some(ref path) = args.restart_blocks {
                export::structure_to_restart_blocks(structure, path)?;
                output::print_success(&format!("CP2K blocks saved to '{}'", path.display()));
            }
        }
        (None, StructureStatus::Malformed(reason)) => {
            output::print_warning(&format!("{}: restart file ignored ({})", OUTPUT_STRUCTURE, reason));
        }
        (None, _) => {
            output::print_skip(&format!(
                "{}: '{}' not found",
                OUTPUT_STRUCTURE, config.restart_file
            ));
        }
    }

    output::print_done(&format!("Parsed {}", args.dir.display()));

    Ok(())
}

fn print_metadata(metadata: &RunMetadata) {
    let mut rows = vec![
        FieldRow::new("nwarnings", metadata.nwarnings),
        FieldRow::new("exceeded_walltime", metadata.exceeded_walltime),
    ];
    if let Some(energy) = metadata.energy {
        rows.push(FieldRow::new("energy", format!("{:.10}", energy)));
        rows.push(FieldRow::new(
            "energy_units",
            metadata.energy_units.as_deref().unwrap_or_default(),
        ));
    }

    output::print_header(OUTPUT_PARAMETERS);
    println!("{}", Table::new(&rows));

    if metadata.exceeded_walltime {
        output::print_warning("CP2K exceeded the requested execution time");
    }
}

fn print_bands(bands: &BandStructure) {
    let labels = bands
        .labels
        .iter()
        .map(|(i, l)| format!("{}@{}", l, i))
        .collect::<Vec<_>>()
        .join(", ");

    let rows = vec![
        FieldRow::new("kpoints", bands.nkpoints()),
        FieldRow::new("bands", bands.nbands()),
        FieldRow::new("spin_polarized", bands.is_spin_polarized()),
        FieldRow::new("labels", labels),
        FieldRow::new("units", &bands.units),
    ];

    output::print_header(OUTPUT_BANDS);
    println!("{}", Table::new(&rows));
}

fn print_structure(structure: &AtomicStructure) {
    let (a, b, c, alpha, beta, gamma) = structure.lattice.parameters();

    let mut rows = vec![
        FieldRow::new("formula", structure.formula()),
        FieldRow::new("natoms", structure.natoms()),
        FieldRow::new("a, b, c (Å)", format!("{:.6} {:.6} {:.6}", a, b, c)),
        FieldRow::new(
            "alpha, beta, gamma (°)",
            format!("{:.3} {:.3} {:.3}", alpha, beta, gamma),
        ),
        FieldRow::new("volume (Å³)", format!("{:.6}", structure.lattice.volume().abs())),
    ];
    if let Some(d) = structure.min_distance() {
        rows.push(FieldRow::new("min distance (Å)", format!("{:.6}", d)));
    }

    output::print_header(OUTPUT_STRUCTURE);
    println!("{}", Table::new(&rows));
}
