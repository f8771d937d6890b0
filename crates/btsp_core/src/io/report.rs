//! Run summaries: a text report for the terminal, an XML summary and the
//! TSPLIB `.tour` file of the best tour.

use std::{
    fmt::{self, Display, Formatter},
    fs,
    io::{self, Write},
    path::Path,
    time::Duration,
};

use lkh::tour::TsplibTour;

use crate::{
    Error, Result,
    bound::BoundResult,
    problem::Cost,
    result::SearchResult,
    runner::{Outcome, RunReport, TourOutcome},
    solver::SolverKind,
};

pub fn write_pretty(report: &RunReport, out: &mut impl Write) -> io::Result<()> {
    match &report.outcome {
        Outcome::Costs(costs) => {
            writeln!(out, "Distinct Costs: {}", costs.len())?;
            if let (Some(min), Some(max)) = (costs.first(), costs.last()) {
                writeln!(out, "Min Cost: {min}")?;
                writeln!(out, "Max Cost: {max}")?;
            }
            let listed: Vec<String> = costs.iter().map(ToString::to_string).collect();
            writeln!(out, "Costs: {}", listed.join(" "))?;
        }
        Outcome::Bound(bound) => {
            writeln!(out, "{} Objective: {}", report.mode, bound.objective)?;
            writeln!(out, "Bound Time: {:.2}", bound.elapsed.as_secs_f64())?;
        }
        Outcome::Tour(tour) => write_pretty_tour(tour, out)?,
    }
    writeln!(out, "Total Time: {:.2}", report.elapsed.as_secs_f64())
}

fn write_pretty_tour(outcome: &TourOutcome, out: &mut impl Write) -> io::Result<()> {
    let result = &outcome.result;
    writeln!(out, "Found Tour: {}", yes_no(result.found_tour))?;
    if result.found_tour {
        write_opt(out, "Objective Value", result.objective)?;
        write_opt(out, "Min Cost", result.min_cost)?;
        write_opt(out, "Max Cost", result.max_cost)?;
        write_opt(out, "Tour Length", result.tour_length)?;
    }
    writeln!(
        out,
        "Optimal?: {}",
        if result.optimal { "Yes" } else { "???" }
    )?;
    writeln!(out, "Binary Search Steps: {}", result.binary_search_steps)?;

    writeln!(out, "Solver Information:")?;
    for kind in SolverKind::ALL {
        let stats = result.solvers.get(kind);
        if stats.attempts == 0 {
            continue;
        }
        writeln!(out, " - {kind}")?;
        writeln!(out, "   - Calls: {}", stats.attempts)?;
        writeln!(
            out,
            "   - Avg Time: {:.2}",
            stats.average_time().as_secs_f64()
        )?;
    }
    writeln!(out, "Search Time: {:.2}", result.elapsed.as_secs_f64())?;

    writeln!(out, "Initial Lower Bound: {}", outcome.lower_bound.objective)?;
    writeln!(
        out,
        "Lower Bound Time: {:.2}",
        outcome.lower_bound.elapsed.as_secs_f64()
    )?;
    write_opt(out, "Infinity", outcome.infinity)?;
    write_opt(out, "Max Length", outcome.max_length)
}

fn write_opt(out: &mut impl Write, label: &str, value: Option<Cost>) -> io::Result<()> {
    match value {
        Some(value) => writeln!(out, "{label}: {value}"),
        None => Ok(()),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

/// XML summary of one run, rendered through [`Display`].
pub struct XmlReport<'a> {
    pub report: &'a RunReport,
    pub problem_file: &'a str,
    pub command_args: &'a str,
}

impl XmlReport<'_> {
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_string()).map_err(|e| {
            Error::other(format!("Could not write xml file {}: {e}", path.display()))
        })?;
        log::info!("report.xml: path={}", path.display());
        Ok(())
    }
}

impl Display for XmlReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "<btsp mode=\"{}\" problem_file=\"{}\" command_args=\"{}\">",
            escape(&self.report.mode.to_string()),
            escape(self.problem_file),
            escape(self.command_args)
        )?;
        writeln!(f, "    <size>{}</size>", self.report.size)?;
        writeln!(f, "    <symmetric>{}</symmetric>", self.report.symmetric)?;

        match &self.report.outcome {
            Outcome::Costs(costs) => {
                writeln!(f, "    <distinct_costs>{}</distinct_costs>", costs.len())?;
                if let (Some(min), Some(max)) = (costs.first(), costs.last()) {
                    writeln!(f, "    <min_cost>{min}</min_cost>")?;
                    writeln!(f, "    <max_cost>{max}</max_cost>")?;
                }
            }
            Outcome::Bound(bound) => xml_bound(f, "objective_value", "bound_time", bound)?,
            Outcome::Tour(tour) => xml_tour(f, tour)?,
        }

        xml_secs(f, "total_time", self.report.elapsed)?;
        writeln!(f, "</btsp>")
    }
}

fn xml_tour(f: &mut Formatter<'_>, outcome: &TourOutcome) -> fmt::Result {
    let result: &SearchResult = &outcome.result;
    writeln!(f, "    <found_tour>{}</found_tour>", result.found_tour)?;
    // -1 stands for "no tour" so every summary carries the same elements.
    let or_none = |value: Option<Cost>| value.filter(|_| result.found_tour).unwrap_or(-1);
    writeln!(
        f,
        "    <objective_value>{}</objective_value>",
        or_none(result.objective)
    )?;
    writeln!(f, "    <tour_min_cost>{}</tour_min_cost>", or_none(result.min_cost))?;
    writeln!(f, "    <tour_max_cost>{}</tour_max_cost>", or_none(result.max_cost))?;
    writeln!(f, "    <tour_length>{}</tour_length>", or_none(result.tour_length))?;
    writeln!(f, "    <optimal>{}</optimal>", result.optimal)?;
    xml_bound(f, "lower_bound", "lower_bound_time", &outcome.lower_bound)?;
    writeln!(
        f,
        "    <binary_search_steps>{}</binary_search_steps>",
        result.binary_search_steps
    )?;

    for kind in SolverKind::ALL {
        let stats = result.solvers.get(kind);
        if stats.attempts == 0 {
            continue;
        }
        let tag = kind.to_string().replace('-', "_");
        writeln!(f, "    <{tag}_attempts>{}</{tag}_attempts>", stats.attempts)?;
        xml_secs(f, &format!("{tag}_avg_time"), stats.average_time())?;
    }

    if let Some(infinity) = outcome.infinity {
        writeln!(f, "    <infinity>{infinity}</infinity>")?;
    }
    if let Some(max_length) = outcome.max_length {
        writeln!(f, "    <max_length>{max_length}</max_length>")?;
    }
    xml_secs(f, "search_time", result.elapsed)
}

fn xml_bound(f: &mut Formatter<'_>, tag: &str, time_tag: &str, bound: &BoundResult) -> fmt::Result {
    writeln!(f, "    <{tag}>{}</{tag}>", bound.objective)?;
    xml_secs(f, time_tag, bound.elapsed)
}

fn xml_secs(f: &mut Formatter<'_>, tag: &str, elapsed: Duration) -> fmt::Result {
    writeln!(f, "    <{tag}>{:.2}</{tag}>", elapsed.as_secs_f64())
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Writes the best tour of `result` as a TSPLIB `.tour` file.
pub fn write_tour(path: &Path, name: &str, result: &SearchResult) -> Result<()> {
    let (true, Some(objective), Some(length)) =
        (result.found_tour, result.objective, result.tour_length)
    else {
        return Err(Error::invalid_data("No tour was found, nothing to write"));
    };

    let mut tour = TsplibTour::from_zero_based(format!("{name}.tour"), &result.tour);
    tour.comment_lines
        .push(format!("BTSP Tour; Length {length}, Objective {objective}."));
    tour.write_to_file(path).map_err(|e| {
        Error::other(format!("Could not write tour file {}: {e}", path.display()))
    })?;
    log::info!("report.tour: path={} n={}", path.display(), result.tour.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        time::{Duration, SystemTime, UNIX_EPOCH},
    };

    use lkh::tour::TsplibTour;

    use super::{XmlReport, escape, write_pretty, write_tour};
    use crate::{
        bound::BoundResult,
        io::options::Mode,
        result::SearchResult,
        runner::{Outcome, RunReport, TourOutcome},
        solver::SolverKind,
    };

    fn unique_temp_dir(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("btsp-tests-{name}-{nanos}"))
    }

    fn found_result() -> SearchResult {
        let mut result = SearchResult {
            found_tour: true,
            objective: Some(4),
            min_cost: Some(1),
            max_cost: Some(4),
            tour_length: Some(13),
            optimal: true,
            binary_search_steps: 2,
            tour: vec![0, 2, 3, 1, 4],
            ..SearchResult::default()
        };
        result
            .solvers
            .record(SolverKind::LinKernighan, Duration::from_millis(300));
        result
            .solvers
            .record(SolverKind::LinKernighan, Duration::from_millis(100));
        result
    }

    fn tour_report(result: SearchResult) -> RunReport {
        RunReport {
            mode: Mode::Btsp,
            size: 5,
            symmetric: true,
            outcome: Outcome::Tour(TourOutcome {
                lower_bound: BoundResult {
                    objective: 3,
                    elapsed: Duration::from_millis(10),
                },
                result,
                infinity: Some(70),
                max_length: None,
            }),
            elapsed: Duration::from_secs(1),
        }
    }

    fn pretty(report: &RunReport) -> String {
        let mut out = Vec::new();
        write_pretty(report, &mut out).expect("write");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn pretty_tour_report_lists_the_used_solvers() {
        let text = pretty(&tour_report(found_result()));

        assert!(text.contains("Found Tour: Yes\n"));
        assert!(text.contains("Objective Value: 4\n"));
        assert!(text.contains("Tour Length: 13\n"));
        assert!(text.contains("Optimal?: Yes\n"));
        assert!(text.contains(" - lin-kernighan\n   - Calls: 2\n   - Avg Time: 0.20\n"));
        assert!(!text.contains(" - exact"));
        assert!(text.contains("Initial Lower Bound: 3\n"));
        assert!(text.ends_with("Total Time: 1.00\n"));
    }

    #[test]
    fn pretty_report_without_a_tour_skips_its_values() {
        let text = pretty(&tour_report(SearchResult::default()));
        assert!(text.contains("Found Tour: No\n"));
        assert!(text.contains("Optimal?: ???\n"));
        assert!(!text.contains("Tour Length"));
    }

    #[test]
    fn pretty_costs_and_bounds() {
        let costs = RunReport {
            mode: Mode::Costs,
            size: 3,
            symmetric: true,
            outcome: Outcome::Costs(vec![2, 5, 9]),
            elapsed: Duration::ZERO,
        };
        let text = pretty(&costs);
        assert!(text.contains("Distinct Costs: 3\nMin Cost: 2\nMax Cost: 9\nCosts: 2 5 9\n"));

        let bound = RunReport {
            mode: Mode::Bap,
            outcome: Outcome::Bound(BoundResult {
                objective: 7,
                elapsed: Duration::ZERO,
            }),
            ..costs
        };
        assert!(pretty(&bound).contains("bap Objective: 7\n"));
    }

    #[test]
    fn xml_report_carries_the_result_elements() {
        let report = tour_report(found_result());
        let xml = XmlReport {
            report: &report,
            problem_file: "five.tsp",
            command_args: "--input five.tsp --mode btsp",
        }
        .to_string();

        assert!(xml.starts_with(
            "<btsp mode=\"btsp\" problem_file=\"five.tsp\" \
             command_args=\"--input five.tsp --mode btsp\">\n"
        ));
        assert!(xml.contains("<found_tour>true</found_tour>"));
        assert!(xml.contains("<objective_value>4</objective_value>"));
        assert!(xml.contains("<lower_bound>3</lower_bound>"));
        assert!(xml.contains("<lower_bound_time>0.01</lower_bound_time>"));
        assert!(xml.contains("<lin_kernighan_attempts>2</lin_kernighan_attempts>"));
        assert!(xml.contains("<lin_kernighan_avg_time>0.20</lin_kernighan_avg_time>"));
        assert!(!xml.contains("exact_attempts"));
        assert!(xml.contains("<infinity>70</infinity>"));
        assert!(xml.ends_with("<total_time>1.00</total_time>\n</btsp>\n"));
    }

    #[test]
    fn xml_report_marks_missing_tours() {
        let report = tour_report(SearchResult::default());
        let xml = XmlReport {
            report: &report,
            problem_file: "p.tsp",
            command_args: "",
        }
        .to_string();
        assert!(xml.contains("<found_tour>false</found_tour>"));
        assert!(xml.contains("<objective_value>-1</objective_value>"));
        assert!(xml.contains("<tour_length>-1</tour_length>"));
    }

    #[test]
    fn xml_attributes_are_escaped() {
        assert_eq!(escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn xml_report_writes_to_disk() {
        let dir = unique_temp_dir("report-xml");
        fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("run.xml");
        let report = tour_report(found_result());

        XmlReport {
            report: &report,
            problem_file: "five.tsp",
            command_args: "",
        }
        .write_to_file(&path)
        .expect("write xml");
        let text = fs::read_to_string(&path).expect("read xml");
        assert!(text.contains("<optimal>true</optimal>"));

        fs::remove_dir_all(&dir).expect("remove temp dir");
    }

    #[test]
    fn tour_file_holds_the_one_based_tour() {
        let dir = unique_temp_dir("report-tour");
        fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("five.tour");

        write_tour(&path, "five", &found_result()).expect("write tour");
        let tour = TsplibTour::from_file(&path).expect("parse tour");
        assert_eq!(tour.zero_based_tour().expect("ids"), vec![0, 2, 3, 1, 4]);
        assert_eq!(tour.name.as_deref(), Some("five.tour"));
        assert!(tour.comment_lines[0].contains("Length 13"));

        fs::remove_dir_all(&dir).expect("remove temp dir");
    }

    #[test]
    fn tour_file_needs_a_tour() {
        let path = unique_temp_dir("report-no-tour").join("none.tour");
        assert!(write_tour(&path, "none", &SearchResult::default()).is_err());
        assert!(!path.exists());
    }
}
