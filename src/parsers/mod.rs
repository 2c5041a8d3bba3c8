//! # 解析器模块
//!
//! 顶层调度：先解析主日志（必需，失败即致命），再尝试解析重启文件中的结构
//! （可选，任何失败都只意味着“没有结构输出”）。
//!
//! ## 输出标签
//! - `output_parameters`: 运行元数据（总是输出）
//! - `output_bands`: 能带结构（日志含能带段落时）
//! - `output_structure`: 最终结构（重启文件可用时）
//!
//! ## 依赖关系
//! - 被 `batch/`, `commands/` 使用
//! - 使用 `bundle.rs`, `config.rs`, `models/`
//! - 子模块: stdout, bands, restart

pub mod bands;
pub mod restart;
pub mod stdout;

use crate::bundle::OutputBundle;
use crate::config::ParserConfig;
use crate::error::{Cp2kError, Result};
use crate::models::{AtomicStructure, BandStructure, RunMetadata};

pub const OUTPUT_PARAMETERS: &str = "output_parameters";
pub const OUTPUT_BANDS: &str = "output_bands";
pub const OUTPUT_STRUCTURE: &str = "output_structure";

/// 交给结果接收端的单条输出
#[derive(Debug, Clone, PartialEq)]
pub enum ParserOutput {
    Parameters(RunMetadata),
    Bands(BandStructure),
    Structure(AtomicStructure),
}

impl ParserOutput {
    /// 固定的输出标签
    pub fn label(&self) -> &'static str {
        match self {
            ParserOutput::Parameters(_) => OUTPUT_PARAMETERS,
            ParserOutput::Bands(_) => OUTPUT_BANDS,
            ParserOutput::Structure(_) => OUTPUT_STRUCTURE,
        }
    }
}

/// 结果接收端
pub trait ResultSink {
    fn emit(&mut self, output: ParserOutput);
}

/// 可选结构输出的去向（仅供报告，不是错误）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureStatus {
    Parsed,
    /// 重启文件不存在（如单点能计算）
    Absent,
    /// 重启文件存在但无法解析
    Malformed(String),
}

/// 收集全部输出的接收端
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCalculation {
    pub metadata: Option<RunMetadata>,
    pub bands: Option<BandStructure>,
    pub structure: Option<AtomicStructure>,
    pub structure_status: StructureStatus,
}

impl Default for ParsedCalculation {
    fn default() -> Self {
        ParsedCalculation {
            metadata: None,
            bands: None,
            structure: None,
            structure_status: StructureStatus::Absent,
        }
    }
}

impl ResultSink for ParsedCalculation {
    fn emit(&mut self, output: ParserOutput) {
        match output {
            ParserOutput::Parameters(m) => self.metadata = Some(m),
            ParserOutput::Bands(b) => self.bands = Some(b),
            ParserOutput::Structure(s) => self.structure = Some(s),
        }
    }
}

/// 解析一次计算的全部输出并交给 `sink`
///
/// 致命错误发生时不输出任何内容。
pub fn parse_calculation<B, S>(
    bundle: &B,
    config: &ParserConfig,
    sink: &mut S,
) -> Result<StructureStatus>
where
    B: OutputBundle + ?Sized,
    S: ResultSink + ?Sized,
{
    if !bundle.has(&config.output_file) {
        return Err(Cp2kError::MissingOutputFile {
            name: config.output_file.clone(),
        });
    }

    let content = bundle.read_text(&config.output_file)?;
    let parsed = stdout::parse_log_content(&content)?;

    let structure = parse_trajectory(bundle, config);

    sink.emit(ParserOutput::Parameters(parsed.metadata));
    if let Some(bands) = parsed.bands {
        sink.emit(ParserOutput::Bands(bands));
    }

    let status = match structure {
        Ok(structure) => {
            sink.emit(ParserOutput::Structure(structure));
            StructureStatus::Parsed
        }
        Err(Cp2kError::MissingTrajectoryFile { .. }) => StructureStatus::Absent,
        Err(e) => StructureStatus::Malformed(e.to_string()),
    };

    Ok(status)
}

/// 便捷入口：返回收集好的输出
pub fn parse_outputs<B: OutputBundle + ?Sized>(
    bundle: &B,
    config: &ParserConfig,
) -> Result<ParsedCalculation> {
    let mut collected = ParsedCalculation::default();
    let status = parse_calculation(bundle, config, &mut collected)?;
    collected.structure_status = status;
    Ok(collected)
}

/// 从重启文件解析最终结构
pub fn parse_trajectory<B: OutputBundle + ?Sized>(
    bundle: &B,
    config: &ParserConfig,
) -> Result<AtomicStructure> {
    if !bundle.has(&config.restart_file) {
        return Err(Cp2kError::MissingTrajectoryFile {
            name: config.restart_file.clone(),
        });
    }

    let content = bundle.read_text(&config.restart_file)?;
    restart::parse_structure(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::MemoryBundle;

    const LOG: &str = r#" ENERGY| Total FORCE_EVAL ( QS ) energy [a.u.]:              -1.117506311
 KPOINTS| Band Structure Calculation
  Nr.    1    Spin 1        K-Point  0.00000000    0.00000000    0.00000000
             1
     -0.50000000
 The number of warnings for this run is : 0
"#;

    const RESTART: &str = "\n     &CELL\n A 4 0 0\n B 0 -4 0\n C 0 0 4\n     &END CELL\n     &COORD\nH 0 0 0\nH 0 0 0.74\n     &END COORD\n";

    /// 只记录标签顺序的接收端
    #[derive(Default)]
    struct LabelSink(Vec<&'static str>);

    impl ResultSink for LabelSink {
        fn emit(&mut self, output: ParserOutput) {
            self.0.push(output.label());
        }
    }

    #[test]
    fn test_full_bundle() {
        let config = ParserConfig::default();
        let bundle = MemoryBundle::default()
            .with_file("aiida.out", LOG)
            .with_file("aiida-1.restart", RESTART);

        let mut sink = LabelSink::default();
        let status = parse_calculation(&bundle, &config, &mut sink).unwrap();

        assert_eq!(status, StructureStatus::Parsed);
        assert_eq!(
            sink.0,
            vec![OUTPUT_PARAMETERS, OUTPUT_BANDS, OUTPUT_STRUCTURE]
        );
    }

    #[test]
    fn test_missing_output_file() {
        let bundle = MemoryBundle::default().with_file("aiida-1.restart", RESTART);
        let mut sink = LabelSink::default();

        let err = parse_calculation(&bundle, &ParserConfig::default(), &mut sink).unwrap_err();
        assert!(matches!(err, Cp2kError::MissingOutputFile { .. }));
        assert!(sink.0.is_empty());
    }

    #[test]
    fn test_incomplete_run_emits_nothing() {
        let truncated = LOG.replace(" The number of warnings for this run is : 0\n", "");
        let bundle = MemoryBundle::default()
            .with_file("aiida.out", &truncated)
            .with_file("aiida-1.restart", RESTART);
        let mut sink = LabelSink::default();

        let err = parse_calculation(&bundle, &ParserConfig::default(), &mut sink).unwrap_err();
        assert!(matches!(err, Cp2kError::IncompleteRun));
        assert!(sink.0.is_empty());
    }

    #[test]
    fn test_missing_restart_is_not_an_error() {
        let bundle = MemoryBundle::default().with_file("aiida.out", LOG);
        let parsed = parse_outputs(&bundle, &ParserConfig::default()).unwrap();

        assert_eq!(parsed.metadata.unwrap().energy, Some(-1.117506311));
        assert!(parsed.bands.is_some());
        assert!(parsed.structure.is_none());
        assert_eq!(parsed.structure_status, StructureStatus::Absent);
    }

    #[test]
    fn test_malformed_restart_is_absorbed() {
        let bundle = MemoryBundle::default()
            .with_file("aiida.out", LOG)
            .with_file("aiida-1.restart", "\n&COORD\nH 0 0 0\n&END COORD\n");
        let parsed = parse_outputs(&bundle, &ParserConfig::default()).unwrap();

        assert!(parsed.metadata.is_some());
        assert!(parsed.structure.is_none());
        assert!(matches!(parsed.structure_status, StructureStatus::Malformed(_)));
    }

    #[test]
    fn test_custom_file_names() {
        let config = ParserConfig {
            output_file: "cp2k.log".to_string(),
            restart_file: "run-1.restart".to_string(),
        };
        let bundle = MemoryBundle::default()
            .with_file("cp2k.log", LOG)
            .with_file("run-1.restart", RESTART);

        let parsed = parse_outputs(&bundle, &config).unwrap();
        let structure = parsed.structure.unwrap();
        assert_eq!(structure.natoms(), 2);
        assert_eq!(structure.lattice.matrix[1], [0.0, -4.0, 0.0]);
    }
}
