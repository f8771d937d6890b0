//! TSPLIB instances into cost matrices.

use std::path::Path;

use lkh::problem::{EdgeWeightType, NodeCoord, TsplibProblem, TsplibProblemType};

use crate::{
    Error, Result,
    problem::{Coord, DistanceKind, MatrixProblem, Problem},
};

/// A parsed instance and the name it was stored under.
#[derive(Clone, Debug)]
pub struct LoadedProblem {
    pub name: String,
    pub problem: MatrixProblem,
}

pub fn read_problem(path: &Path) -> Result<LoadedProblem> {
    let tsplib = TsplibProblem::from_file(path).map_err(|e| {
        Error::invalid_input(format!("Could not read {}: {e}", path.display()))
    })?;
    let mut loaded = from_tsplib(&tsplib)?;
    if loaded.name.is_empty() {
        loaded.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    log::info!(
        "input.read: name={} n={} symmetric={}",
        loaded.name,
        loaded.problem.size(),
        loaded.problem.is_symmetric()
    );
    Ok(loaded)
}

/// Builds the cost matrix of a `TSP` or `ATSP` instance, either from its
/// explicit weights or from node coordinates and a distance function.
pub fn from_tsplib(tsplib: &TsplibProblem) -> Result<LoadedProblem> {
    if !matches!(
        tsplib.problem_type,
        TsplibProblemType::Tsp | TsplibProblemType::Atsp
    ) {
        return Err(Error::invalid_input(format!(
            "Unsupported TYPE {}, expected TSP or ATSP",
            tsplib.problem_type
        )));
    }

    let rows = match tsplib.edge_weight_type {
        Some(EdgeWeightType::Explicit) | None => tsplib
            .explicit_matrix()
            .map_err(|e| Error::invalid_input(e.to_string()))?,
        Some(kind) => coordinate_matrix(tsplib, DistanceKind::try_from(kind)?)?,
    };

    Ok(LoadedProblem {
        name: tsplib.name.clone(),
        problem: MatrixProblem::from_rows(rows)?,
    })
}

fn coordinate_matrix(tsplib: &TsplibProblem, distance: DistanceKind) -> Result<Vec<Vec<i64>>> {
    let n = tsplib.dimension.unwrap_or_default();
    let mut nodes: Vec<NodeCoord> = tsplib.node_coord_section.clone();
    nodes.sort_by_key(|node| node.id);

    let ids_match = nodes.len() == n && nodes.iter().enumerate().all(|(i, node)| node.id == i + 1);
    if !ids_match {
        return Err(Error::invalid_input(format!(
            "NODE_COORD_SECTION must list nodes 1..={n} exactly once, got {} entries",
            nodes.len()
        )));
    }

    let coords: Vec<Coord> = nodes.iter().map(|node| Coord::new(node.x, node.y)).collect();
    Ok(coords
        .iter()
        .map(|&a| coords.iter().map(|&b| distance.distance(a, b)).collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        time::{SystemTime, UNIX_EPOCH},
    };

    use lkh::problem::TsplibProblem;

    use super::{from_tsplib, read_problem};
    use crate::{Error, problem::Problem};

    fn unique_temp_dir(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("btsp-tests-{name}-{nanos}"))
    }

    fn parse(text: &str) -> TsplibProblem {
        TsplibProblem::parse(text).expect("valid tsplib")
    }

    #[test]
    fn euclidean_coordinates_round_to_nearest() {
        let loaded = from_tsplib(&parse(
            "NAME: tri\nTYPE: TSP\nDIMENSION: 3\nEDGE_WEIGHT_TYPE: EUC_2D\n\
             NODE_COORD_SECTION\n1 0 0\n2 3 4\n3 0 2.4\nEOF\n",
        ))
        .expect("load");

        let problem = &loaded.problem;
        assert_eq!(loaded.name, "tri");
        assert!(problem.is_symmetric());
        assert_eq!(problem.cost(0, 1), 5);
        assert_eq!(problem.cost(0, 2), 2);
        assert_eq!(problem.cost(2, 1), 3);
    }

    #[test]
    fn coordinates_may_come_out_of_order() {
        let loaded = from_tsplib(&parse(
            "NAME: t\nTYPE: TSP\nDIMENSION: 2\nEDGE_WEIGHT_TYPE: MAN_2D\n\
             NODE_COORD_SECTION\n2 1 1\n1 0 0\nEOF\n",
        ))
        .expect("load");
        assert_eq!(loaded.problem.cost(0, 1), 2);
    }

    #[test]
    fn explicit_atsp_matrices_stay_directed() {
        let loaded = from_tsplib(&parse(
            "NAME: d3\nTYPE: ATSP\nDIMENSION: 3\nEDGE_WEIGHT_TYPE: EXPLICIT\n\
             EDGE_WEIGHT_FORMAT: FULL_MATRIX\nEDGE_WEIGHT_SECTION\n\
             0 2 9\n7 0 3\n4 8 0\nEOF\n",
        ))
        .expect("load");

        let problem = &loaded.problem;
        assert!(!problem.is_symmetric());
        assert_eq!(problem.cost(0, 1), 2);
        assert_eq!(problem.cost(1, 0), 7);
    }

    #[test]
    fn upper_row_matrices_are_mirrored() {
        let loaded = from_tsplib(&parse(
            "NAME: u\nTYPE: TSP\nDIMENSION: 3\nEDGE_WEIGHT_TYPE: EXPLICIT\n\
             EDGE_WEIGHT_FORMAT: UPPER_ROW\nEDGE_WEIGHT_SECTION\n4 6\n5\nEOF\n",
        ))
        .expect("load");

        let problem = &loaded.problem;
        assert!(problem.is_symmetric());
        assert_eq!(problem.cost(2, 0), 6);
        assert_eq!(problem.cost(2, 1), 5);
    }

    #[test]
    fn missing_coordinates_are_rejected() {
        let err = from_tsplib(&parse(
            "NAME: t\nTYPE: TSP\nDIMENSION: 3\nEDGE_WEIGHT_TYPE: EUC_2D\n\
             NODE_COORD_SECTION\n1 0 0\n2 1 1\nEOF\n",
        ))
        .expect_err("two of three nodes");
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn short_weight_sections_are_rejected() {
        let err = from_tsplib(&parse(
            "NAME: u\nTYPE: TSP\nDIMENSION: 3\nEDGE_WEIGHT_TYPE: EXPLICIT\n\
             EDGE_WEIGHT_FORMAT: UPPER_ROW\nEDGE_WEIGHT_SECTION\n4 6\nEOF\n",
        ))
        .expect_err("two of three weights");
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn read_problem_falls_back_to_the_file_stem() {
        let dir = unique_temp_dir("input-read");
        fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("square.tsp");
        fs::write(
            &path,
            "TYPE: TSP\nDIMENSION: 4\nEDGE_WEIGHT_TYPE: CEIL_2D\n\
             NODE_COORD_SECTION\n1 0 0\n2 1 0\n3 1 1\n4 0 1\nEOF\n",
        )
        .expect("write problem");

        let loaded = read_problem(&path).expect("read");
        assert_eq!(loaded.name, "square");
        assert_eq!(loaded.problem.size(), 4);
        assert_eq!(loaded.problem.cost(0, 2), 2);

        fs::remove_dir_all(&dir).expect("remove temp dir");
    }

    #[test]
    fn read_problem_reports_missing_files() {
        let err = read_problem(&unique_temp_dir("input-missing").join("none.tsp"))
            .expect_err("missing file");
        assert!(err.to_string().contains("Could not read"));
    }
}
