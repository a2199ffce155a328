use{
    std::{
        process::exit,
        time::Instant
    },
    structopt::StructOpt,
    indicatif::*,
    log::{error, info, LevelFilter},
};

pub mod error;
pub mod misc_types;
pub mod seir_model;
pub mod stats_methods;
pub mod vaccination;
pub mod json_parsing;
pub mod population_input;
pub mod logging;
pub mod seed_sweep;
pub mod outbreak_trials;
pub mod vaccination_sweep;
pub mod community_curves;


pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let start_time = Instant::now();
    let opt = Opt::from_args();
    if let Err(e) = logging::init_logging(opt.log_level) {
        eprintln!("{e}");
        exit(1);
    }
    info!("campus_seir v{VERSION}");

    let res = match opt.cmd{
        CmdOption::OutbreakTrials(o) => o.execute(),
        CmdOption::VaccinationSweep(o) => o.execute(),
        CmdOption::CommunityCurves(o) => o.execute(),
    };
    if let Err(e) = res {
        error!("{e}");
        exit(1);
    }
    println!("Execution took {}",humantime::format_duration(start_time.elapsed()))
}

pub fn indication_bar(len: u64) -> ProgressBar
{
        // for indication on when it is finished
        let bar = ProgressBar::new(len);
        bar.set_style(ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise} - {eta_precise}] {wide_bar}"));
        bar
}

#[derive(Debug, StructOpt, Clone)]
#[structopt(about = "SEIR epidemics on campus contact graphs, with vaccination!")]
pub struct Opt
{
    /// off, error, warn, info, debug or trace
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,

    #[structopt(subcommand)]
    cmd: CmdOption
}

#[derive(Debug, StructOpt, Clone)]
pub enum CmdOption
{
    OutbreakTrials(outbreak_trials::OutbreakTrials),
    VaccinationSweep(vaccination_sweep::VaccinationSweep),
    CommunityCurves(community_curves::CommunityCurves),
}
