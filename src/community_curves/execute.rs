use {
    super::parser::*,
    serde_json::Value,
    std::{
        num::*,
        fs::File,
        io::{BufWriter, Write},
    },
    rand::SeedableRng,
    rand_pcg::Pcg64,
    log::info,
    crate::{
        indication_bar,
        error::*,
        misc_types::*,
        seir_model::*,
        stats_methods::*,
        vaccination::*,
        population_input::Campus,
        seed_sweep::*,
    },
};

/// Trickle outcome of all seeds of one community.
#[derive(Clone, Debug, Default)]
pub struct CommunityOutcome
{
    pub peak: TrialAggregator,
    pub peak_day: TrialAggregator,
    pub ever_infected: TrialAggregator,
    pub daily: DailyAggregator
}

impl CommunityOutcome
{
    pub fn from_runs(runs: &[SeedRun]) -> Self
    {
        let mut outcome = Self::default();
        for run in runs
        {
            outcome.peak.push(run.summary.peak_infected);
            outcome.peak_day.push(run.summary.peak_day_infected as f64);
            outcome.ever_infected.push(run.summary.total_ever_infected);
            outcome.daily.push_curve(&run.curve);
        }
        outcome
    }
}

pub fn run_community_curves(
    param: CommunityCurvesParams,
    json: Value,
    num_threads: Option<NonZeroUsize>
) -> Result<(), AppError>
{
    param.validate()?;
    let campus = param.campus.load()?;
    let j = num_threads.map_or(1, NonZeroUsize::get);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(j)
        .build()?;

    match param.campus.graph_mode
    {
        GraphMode::Static => {
            let sim = campus.static_simulation(param.campus.disease)?;
            pool.install(|| execute_curves(sim, &campus, &param, json, num_threads))
        },
        GraphMode::Dynamic => {
            let sim = campus.dynamic_simulation(param.campus.disease)?;
            pool.install(|| execute_curves(sim, &campus, &param, json, num_threads))
        }
    }
}

fn execute_curves<S>(
    mut sim: Simulation<S>,
    campus: &Campus,
    param: &CommunityCurvesParams,
    json: Value,
    num_threads: Option<NonZeroUsize>
) -> Result<(), AppError>
where S: ContactSchedule + Clone + Send + Sync
{
    if let Some(policy) = &param.vaccination {
        let mut rng = Pcg64::seed_from_u64(param.vaccine_seed);
        apply_policy(&mut sim, policy, &campus.policy_context(), &mut rng)?;
    }

    let stem = param.quick_name(num_threads);
    let jsons = [json];
    let name = format!("{stem}.dat");
    info!("creating {name}");
    let mut writer = BufWriter::new(File::create(&name)?);
    write_jsons(&jsons, &mut writer)?;
    writeln!(
        writer,
        "#community members seeds peak_mean peak_std peak_err peak_day_mean peak_day_std peak_day_err C_mean C_std C_err"
    )?;
    let mut curves = SeirWriter::new(&stem)?;
    curves.write_header(&jsons)?;

    let bar = indication_bar(campus.population.len() as u64);
    for (&community, members) in campus.meta.all_members()
    {
        let seeds = unvaccinated(&sim, members);
        let runs = trickle_sweep(&sim, &seeds, &bar)?;
        let outcome = CommunityOutcome::from_runs(&runs);
        bar.inc((members.len() - seeds.len()) as u64);

        writeln!(
            writer,
            "{community} {} {} {} {} {}",
            members.len(),
            seeds.len(),
            stats_columns(outcome.peak.stats()),
            stats_columns(outcome.peak_day.stats()),
            stats_columns(outcome.ever_infected.stats())
        )?;
        curves.write_run(community, &outcome.daily.mean_curve())?;
    }
    bar.finish_with_message("Done");
    sim.reset(true);

    writer.flush()?;
    curves.flush()?;
    Ok(())
}
