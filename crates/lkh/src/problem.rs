//! TSPLIB problem model: writer for LKH input files and parser for
//! TSP / ATSP instances.

use std::{
    fmt::{Display, Formatter},
    fs,
    path::Path,
};

use crate::{
    LkhError, LkhResult,
    spec_writer::SpecWriter,
    tsplib_text::{EOF_MARKER, is_section_header, parse_value, split_header},
};
use lkh_derive::LkhKeyword;

const TSPLIB_NODE_ID_BASE: usize = 1;

/// TSPLIB `TYPE` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, LkhKeyword)]
pub enum TsplibProblemType {
    Tsp,
    Atsp,
    Hcp,
    Tour,
}

/// TSPLIB `EDGE_WEIGHT_TYPE` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, LkhKeyword)]
#[lkh(separator = "_")]
pub enum EdgeWeightType {
    Explicit,
    #[lkh("EUC_2D")]
    Euc2d,
    #[lkh("MAX_2D")]
    Max2d,
    #[lkh("MAN_2D")]
    Man2d,
    #[lkh("CEIL_2D")]
    Ceil2d,
    Geo,
    Att,
}

/// TSPLIB `EDGE_WEIGHT_FORMAT` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, LkhKeyword)]
#[lkh(separator = "_")]
pub enum EdgeWeightFormat {
    Function,
    FullMatrix,
    UpperRow,
    LowerRow,
    UpperDiagRow,
    LowerDiagRow,
}

/// TSPLIB `NODE_COORD_TYPE` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, LkhKeyword)]
#[lkh(separator = "_")]
pub enum NodeCoordType {
    TwodCoords,
    NoCoords,
}

/// Entry in `NODE_COORD_SECTION`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeCoord {
    pub id: usize,
    pub x: f64,
    pub y: f64,
}

impl NodeCoord {
    pub const fn new(id: usize, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }
}

impl Display for NodeCoord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.id, self.x, self.y)
    }
}

/// TSPLIB problem model used both for LKH input files and for reading
/// instances from disk.
#[derive(Clone, Debug, PartialEq)]
pub struct TsplibProblem {
    pub name: String,
    pub problem_type: TsplibProblemType,
    pub comment_lines: Vec<String>,
    pub dimension: Option<usize>,
    pub edge_weight_type: Option<EdgeWeightType>,
    pub edge_weight_format: Option<EdgeWeightFormat>,
    pub node_coord_type: Option<NodeCoordType>,
    pub node_coord_section: Vec<NodeCoord>,
    /// Rows exactly as written; parsed files keep one row per input line.
    pub edge_weight_section: Vec<Vec<i64>>,
    pub emit_eof: bool,
}

impl TsplibProblem {
    pub fn new(name: impl Into<String>, problem_type: TsplibProblemType) -> Self {
        Self {
            name: name.into(),
            problem_type,
            comment_lines: Vec::new(),
            dimension: None,
            edge_weight_type: None,
            edge_weight_format: None,
            node_coord_type: None,
            node_coord_section: Vec::new(),
            edge_weight_section: Vec::new(),
            emit_eof: true,
        }
    }

    /// Builds an `EXPLICIT` / `FULL_MATRIX` problem from square rows.
    pub fn from_full_matrix(name: impl Into<String>, rows: Vec<Vec<i64>>, symmetric: bool) -> Self {
        let problem_type = if symmetric {
            TsplibProblemType::Tsp
        } else {
            TsplibProblemType::Atsp
        };

        let mut problem = Self::new(name, problem_type);
        problem.dimension = Some(rows.len());
        problem.edge_weight_type = Some(EdgeWeightType::Explicit);
        problem.edge_weight_format = Some(EdgeWeightFormat::FullMatrix);
        problem.edge_weight_section = rows;
        problem
    }

    pub fn from_file(path: &Path) -> LkhResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn write_to_file(&self, path: &Path) -> LkhResult<()> {
        fs::write(path, self.to_string())?;
        Ok(())
    }

    pub fn is_symmetric_type(&self) -> bool {
        self.problem_type != TsplibProblemType::Atsp
    }

    /// Parses TSPLIB text. Unknown header keys are ignored.
    pub fn parse(text: &str) -> LkhResult<Self> {
        let mut problem = Self::new("", TsplibProblemType::Tsp);
        problem.emit_eof = false;
        let mut saw_type = false;
        let mut section: Option<String> = None;

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if line.eq_ignore_ascii_case(EOF_MARKER) {
                problem.emit_eof = true;
                break;
            }

            if is_section_header(line) {
                section = Some(line.trim_end_matches(':').trim().to_ascii_uppercase());
                continue;
            }

            match section.as_deref() {
                Some("NODE_COORD_SECTION") => {
                    problem.node_coord_section.push(parse_node_coord(line)?);
                    continue;
                }
                Some("EDGE_WEIGHT_SECTION") => {
                    problem.edge_weight_section.push(parse_weight_row(line)?);
                    continue;
                }
                Some(_) => continue,
                None => {}
            }

            let Some((key, value)) = split_header(line) else {
                return Err(LkhError::invalid_data(format!(
                    "Unexpected line outside of a section: '{line}'"
                )));
            };

            match key.as_str() {
                "NAME" => problem.name = value.to_string(),
                "COMMENT" => problem.comment_lines.push(value.to_string()),
                "TYPE" => {
                    problem.problem_type = value.parse()?;
                    saw_type = true;
                }
                "DIMENSION" => problem.dimension = Some(parse_value(&key, value)?),
                "EDGE_WEIGHT_TYPE" => problem.edge_weight_type = Some(value.parse()?),
                "EDGE_WEIGHT_FORMAT" => problem.edge_weight_format = Some(value.parse()?),
                "NODE_COORD_TYPE" => problem.node_coord_type = Some(value.parse()?),
                _ => {}
            }
        }

        if !saw_type {
            return Err(LkhError::invalid_data("Missing TYPE header"));
        }
        if problem.dimension.is_none() {
            return Err(LkhError::invalid_data("Missing DIMENSION header"));
        }

        Ok(problem)
    }

    /// Expands `EDGE_WEIGHT_SECTION` into a full `n x n` matrix following
    /// `EDGE_WEIGHT_FORMAT`.
    pub fn explicit_matrix(&self) -> LkhResult<Vec<Vec<i64>>> {
        let n = self
            .dimension
            .ok_or_else(|| LkhError::invalid_data("Missing DIMENSION header"))?;
        let format = self
            .edge_weight_format
            .ok_or_else(|| LkhError::invalid_data("Missing EDGE_WEIGHT_FORMAT header"))?;
        let weights: Vec<i64> = self.edge_weight_section.iter().flatten().copied().collect();

        let expected = match format {
            EdgeWeightFormat::FullMatrix => n * n,
            EdgeWeightFormat::UpperRow | EdgeWeightFormat::LowerRow => n * n.saturating_sub(1) / 2,
            EdgeWeightFormat::UpperDiagRow | EdgeWeightFormat::LowerDiagRow => n * (n + 1) / 2,
            EdgeWeightFormat::Function => {
                return Err(LkhError::invalid_data(
                    "EDGE_WEIGHT_FORMAT FUNCTION has no explicit weights",
                ));
            }
        };
        if weights.len() != expected {
            return Err(LkhError::invalid_data(format!(
                "EDGE_WEIGHT_SECTION has {} values, {format} with DIMENSION {n} needs {expected}",
                weights.len()
            )));
        }

        let mut matrix = vec![vec![0_i64; n]; n];
        let mut values = weights.into_iter();

        match format {
            EdgeWeightFormat::FullMatrix => {
                for (idx, value) in values.enumerate() {
                    matrix[idx / n][idx % n] = value;
                }
            }
            EdgeWeightFormat::UpperRow => {
                for i in 0..n {
                    for j in (i + 1)..n {
                        set_symmetric(&mut matrix, i, j, values.next().unwrap_or_default());
                    }
                }
            }
            EdgeWeightFormat::LowerRow => {
                for i in 0..n {
                    for j in 0..i {
                        set_symmetric(&mut matrix, i, j, values.next().unwrap_or_default());
                    }
                }
            }
            EdgeWeightFormat::UpperDiagRow => {
                for i in 0..n {
                    for j in i..n {
                        set_symmetric(&mut matrix, i, j, values.next().unwrap_or_default());
                    }
                }
            }
            EdgeWeightFormat::LowerDiagRow => {
                for i in 0..n {
                    for j in 0..=i {
                        set_symmetric(&mut matrix, i, j, values.next().unwrap_or_default());
                    }
                }
            }
            EdgeWeightFormat::Function => {}
        }

        Ok(matrix)
    }
}

fn set_symmetric(matrix: &mut [Vec<i64>], i: usize, j: usize, value: i64) {
    matrix[i][j] = value;
    matrix[j][i] = value;
}

fn parse_node_coord(line: &str) -> LkhResult<NodeCoord> {
    let mut tokens = line.split_whitespace();
    let mut next = |what: &str| {
        tokens
            .next()
            .ok_or_else(|| LkhError::invalid_data(format!("Missing {what} in '{line}'")))
    };

    let id = parse_value("NODE_COORD_SECTION id", next("node id")?)?;
    let x = parse_value("NODE_COORD_SECTION x", next("x coordinate")?)?;
    let y = parse_value("NODE_COORD_SECTION y", next("y coordinate")?)?;
    if id < TSPLIB_NODE_ID_BASE {
        return Err(LkhError::invalid_data(format!(
            "Bad node id {id}; TSPLIB ids must be >= {TSPLIB_NODE_ID_BASE}"
        )));
    }

    Ok(NodeCoord::new(id, x, y))
}

fn parse_weight_row(line: &str) -> LkhResult<Vec<i64>> {
    line.split_whitespace()
        .map(|token| {
            // Some instances store integral weights as "12.0".
            token.parse::<i64>().or_else(|_| {
                token
                    .parse::<f64>()
                    .map(|value| value as i64)
                    .map_err(|e| LkhError::invalid_data(format!("Bad weight '{token}': {e}")))
            })
        })
        .collect()
}

impl Display for TsplibProblem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut writer = SpecWriter::new(f);

        writer.kv_colon("NAME", &self.name)?;
        writer.kv_colon("TYPE", self.problem_type)?;

        for comment in &self.comment_lines {
            writer.kv_colon("COMMENT", comment)?;
        }

        writer.opt_kv_colon("DIMENSION", self.dimension)?;
        writer.opt_kv_colon("EDGE_WEIGHT_TYPE", self.edge_weight_type)?;
        writer.opt_kv_colon("EDGE_WEIGHT_FORMAT", self.edge_weight_format)?;
        writer.opt_kv_colon("NODE_COORD_TYPE", self.node_coord_type)?;
        writer.lines("NODE_COORD_SECTION", &self.node_coord_section)?;

        if !self.edge_weight_section.is_empty() {
            writer.line("EDGE_WEIGHT_SECTION")?;
            for row in &self.edge_weight_section {
                writer.row(row)?;
            }
        }

        if self.emit_eof {
            writer.line(EOF_MARKER)?;
        }

        Ok(())
    }
}
