//! # CP2K 主日志解析器
//!
//! 单次顺序扫描日志，把每一行归入固定的几类之一，累积运行元数据；
//! 遇到能带计算段落时交给 `parsers/bands.rs`。
//!
//! ## 识别的行
//! ```text
//!  ENERGY| Total FORCE_EVAL ( QS ) energy [a.u.]:              -17.165945691002209
//!  The number of warnings for this run is : 0
//!  *** exceeded requested execution time ***
//!  KPOINTS| Band Structure Calculation
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 调用
//! - 使用 `parsers/bands.rs`, `models/`

use super::bands;
use crate::error::{Cp2kError, Result};
use crate::models::{BandStructure, RunMetadata};

/// 能量行前缀
pub const ENERGY_TAG: &str = " ENERGY| ";

/// 能量值在能量行中的 token 位置（0-based）
pub const ENERGY_TOKEN: usize = 8;

/// 正常结束横幅中的警告计数行
pub const WARNINGS_MARKER: &str = "The number of warnings for this run is";

/// 超时标记
pub const WALLTIME_MARKER: &str = "exceeded requested execution time";

/// 能带段落标题
pub const BAND_SECTION_MARKER: &str = "KPOINTS| Band Structure Calculation";

/// 日志行分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Energy,
    WarningCount,
    WalltimeExceeded,
    BandSectionStart,
    Other,
}

/// 按固定顺序判断行类别，先匹配者优先
pub fn classify(line: &str) -> LineKind {
    if line.starts_with(ENERGY_TAG) {
        LineKind::Energy
    } else if line.contains(WARNINGS_MARKER) {
        LineKind::WarningCount
    } else if line.contains(WALLTIME_MARKER) {
        LineKind::WalltimeExceeded
    } else if line.contains(BAND_SECTION_MARKER) {
        LineKind::BandSectionStart
    } else {
        LineKind::Other
    }
}

/// 主日志解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLog {
    pub metadata: RunMetadata,
    pub bands: Option<BandStructure>,
}

/// 解析日志全文
pub fn parse_log_content(content: &str) -> Result<ParsedLog> {
    let lines: Vec<&str> = content.lines().collect();
    parse_log(&lines)
}

/// 解析日志行
///
/// 多个能量行时取最后一个；未找到警告计数行则说明计算未正常结束。
pub fn parse_log(lines: &[&str]) -> Result<ParsedLog> {
    let mut energy: Option<f64> = None;
    let mut nwarnings: Option<u64> = None;
    let mut exceeded_walltime = false;
    let mut band_structure: Option<BandStructure> = None;

    for (i, line) in lines.iter().enumerate() {
        match classify(line) {
            LineKind::Energy => {
                energy = Some(parse_token(line, Some(ENERGY_TOKEN), i + 1)?);
            }
            LineKind::WarningCount => {
                nwarnings = Some(parse_token(line, None, i + 1)?);
            }
            LineKind::WalltimeExceeded => exceeded_walltime = true,
            LineKind::BandSectionStart => {
                // 第一次提取已经扫描到文件末尾
                if band_structure.is_none() {
                    band_structure = Some(bands::extract_bands(lines, i)?);
                }
            }
            LineKind::Other => {}
        }
    }

    let nwarnings = nwarnings.ok_or(Cp2kError::IncompleteRun)?;

    let metadata = RunMetadata::new(nwarnings)
        .with_energy(energy)
        .with_exceeded_walltime(exceeded_walltime);

    Ok(ParsedLog {
        metadata,
        bands: band_structure,
    })
}

/// 取指定位置（`None` 为最后一个）的空白分隔 token 并解析
fn parse_token<T: std::str::FromStr>(
    line: &str,
    index: Option<usize>,
    line_no: usize,
) -> Result<T> {
    let token = match index {
        Some(idx) => line.split_whitespace().nth(idx),
        None => line.split_whitespace().last(),
    };

    let token = token.ok_or_else(|| Cp2kError::MalformedLogLine {
        line: line_no,
        reason: "value token missing".to_string(),
    })?;

    token.parse().map_err(|_| Cp2kError::MalformedLogLine {
        line: line_no,
        reason: format!("cannot parse '{}'", token),
    })
}
