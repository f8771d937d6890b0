use std::{env, io, time::Instant};

use log::info;

use btsp_core::{
    Error, Outcome, Result, SolverOptions, XmlReport, logging, read_problem, run, write_pretty,
    write_tour,
};

fn main() -> Result<()> {
    let now = Instant::now();
    let options = SolverOptions::from_args()?;
    logging::init_logger(&options)?;
    info!("options: {options}");

    let input = options
        .input_path()
        .ok_or_else(|| Error::invalid_input("Missing required option --input"))?;
    let loaded = read_problem(input)?;
    let report = run(&loaded.problem, &options)?;

    write_pretty(&report, &mut io::stdout().lock())?;

    if let Some(path) = options.xml_path() {
        let command_args = env::args().skip(1).collect::<Vec<_>>().join(" ");
        XmlReport {
            report: &report,
            problem_file: &input.display().to_string(),
            command_args: &command_args,
        }
        .write_to_file(path)?;
    }

    if let (Some(path), Outcome::Tour(tour)) = (options.tour_path(), &report.outcome) {
        if tour.result.found_tour {
            write_tour(path, &loaded.name, &tour.result)?;
        } else {
            log::warn!("output.tour: no tour found, {} not written", path.display());
        }
    }

    info!(
        "output: mode={} n={} time={:.2}s",
        report.mode,
        report.size,
        now.elapsed().as_secs_f32()
    );

    Ok(())
}
