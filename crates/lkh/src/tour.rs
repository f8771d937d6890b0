//! TSPLIB `.tour` files, as written by LKH and by the BTSP front end.

use std::{
    fmt::{Display, Formatter},
    fs,
    path::PathBuf,
    str::FromStr,
};

use crate::{
    LkhError, LkhResult,
    spec_writer::SpecWriter,
    tsplib_text::{EOF_MARKER, SECTION_END_MARKER, parse_value, split_header},
};
use lkh_derive::{LkhKeyword, WithMethods};

const TOUR_SECTION_HEADER: &str = "TOUR_SECTION";
/// TSPLIB numbers nodes from one.
const FIRST_NODE_ID: usize = 1;

/// TSPLIB `.tour` `TYPE` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, LkhKeyword)]
pub enum TsplibTourType {
    Tour,
}

#[derive(Clone, Debug, PartialEq, WithMethods)]
pub struct TsplibTour {
    pub name: Option<String>,
    pub comment_lines: Vec<String>,
    pub tour_type: Option<TsplibTourType>,
    pub dimension: Option<usize>,
    /// `OPTIMUM`, which LKH sets to the best length it knows of.
    pub optimum: Option<f64>,
    /// One-based node ids in visiting order.
    #[with(skip)]
    pub tour_section: Vec<usize>,
    pub emit_eof: bool,
}

impl TsplibTour {
    pub fn new() -> Self {
        Self {
            name: None,
            comment_lines: Vec::new(),
            tour_type: None,
            dimension: None,
            optimum: None,
            tour_section: Vec::new(),
            emit_eof: true,
        }
    }

    /// A `TYPE: TOUR` file visiting the zero-based nodes of `order`.
    pub fn from_zero_based(name: impl Into<String>, order: &[usize]) -> Self {
        Self::new()
            .with_name(name)
            .with_tour_type(TsplibTourType::Tour)
            .with_dimension(order.len())
            .with_zero_based(order)
    }

    pub fn with_zero_based(mut self, order: &[usize]) -> Self {
        self.tour_section = order.iter().map(|&node| node + FIRST_NODE_ID).collect();
        self
    }

    pub fn from_file(file_path: impl Into<PathBuf>) -> LkhResult<Self> {
        fs::read_to_string(file_path.into())
            .map_err(LkhError::Io)?
            .parse()
    }

    pub fn zero_based_tour(&self) -> LkhResult<Vec<usize>> {
        self.tour_section
            .iter()
            .map(|&id| {
                id.checked_sub(FIRST_NODE_ID).ok_or_else(|| {
                    LkhError::invalid_data(format!("Node id {id} is below {FIRST_NODE_ID}"))
                })
            })
            .collect()
    }

    pub fn write_to_file(&self, file_path: impl Into<PathBuf>) -> LkhResult<()> {
        fs::write(file_path.into(), self.to_string()).map_err(LkhError::Io)
    }

    fn read_header(&mut self, line: &str) -> LkhResult<()> {
        let Some((key, value)) = split_header(line) else {
            return Ok(());
        };
        match key.as_str() {
            "NAME" => self.name = Some(value.to_string()),
            "COMMENT" => self.comment_lines.push(value.to_string()),
            "TYPE" => self.tour_type = Some(value.parse()?),
            "DIMENSION" => self.dimension = Some(parse_value(&key, value)?),
            "OPTIMUM" => self.optimum = Some(parse_value(&key, value)?),
            _ => {}
        }
        Ok(())
    }

    /// Reads ids from one section line. Returns `true` once the `-1` or
    /// `EOF` terminator is seen. Other non-positive ids are skipped.
    fn read_ids(&mut self, line: &str) -> LkhResult<bool> {
        for token in line.split_whitespace() {
            if token == SECTION_END_MARKER {
                return Ok(true);
            }
            if token.eq_ignore_ascii_case(EOF_MARKER) {
                self.emit_eof = true;
                return Ok(true);
            }
            let id: i64 = token
                .parse()
                .map_err(|e| LkhError::invalid_data(format!("Bad tour token '{token}': {e}")))?;
            if let Ok(id) = usize::try_from(id)
                && id >= FIRST_NODE_ID
            {
                self.tour_section.push(id);
            }
        }
        Ok(false)
    }
}

impl Default for TsplibTour {
    fn default() -> Self {
        Self::new()
    }
}

/// Permissive parse: unknown headers are ignored and the tour section may
/// end at `-1`, `EOF` or the end of the text.
impl FromStr for TsplibTour {
    type Err = LkhError;

    fn from_str(text: &str) -> LkhResult<Self> {
        let mut tour = Self::new();
        tour.emit_eof = false;
        let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

        let mut has_section = false;
        for line in lines.by_ref() {
            if line.eq_ignore_ascii_case(EOF_MARKER) {
                tour.emit_eof = true;
                break;
            }
            if line.eq_ignore_ascii_case(TOUR_SECTION_HEADER) {
                has_section = true;
                break;
            }
            tour.read_header(line)?;
        }
        if !has_section {
            return Err(LkhError::invalid_data("Missing TOUR_SECTION"));
        }

        for line in lines {
            if tour.read_ids(line)? {
                break;
            }
        }

        match tour.dimension {
            Some(dimension) if dimension != tour.tour_section.len() => {
                Err(LkhError::invalid_data(format!(
                    "DIMENSION is {dimension}, but TOUR_SECTION has {} nodes",
                    tour.tour_section.len()
                )))
            }
            _ => Ok(tour),
        }
    }
}

impl Display for TsplibTour {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut writer = SpecWriter::new(f);

        writer.opt_kv_colon("NAME", self.name.as_deref())?;
        writer.opt_kv_colon("TYPE", self.tour_type)?;
        for comment in &self.comment_lines {
            writer.kv_colon("COMMENT", comment)?;
        }
        writer.opt_kv_colon("DIMENSION", self.dimension)?;
        writer.opt_kv_colon("OPTIMUM", self.optimum)?;

        if !self.tour_section.is_empty() {
            writer.lines(TOUR_SECTION_HEADER, &self.tour_section)?;
            writer.line(SECTION_END_MARKER)?;
        }
        if self.emit_eof {
            writer.line(EOF_MARKER)?;
        }
        Ok(())
    }
}
