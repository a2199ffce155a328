use {
    super::parser::*,
    serde_json::Value,
    std::{
        num::*,
        fs::File,
        io::{BufWriter, Write},
    },
    rand::{Rng, SeedableRng},
    rand_pcg::Pcg64,
    log::{info, warn},
    crate::{
        indication_bar,
        error::*,
        misc_types::*,
        seir_model::*,
        stats_methods::*,
        vaccination::*,
        population_input::Campus,
        seed_sweep::{run_stochastic_seed, unvaccinated},
    },
};

/// Accepted outbreaks of one seed vertex.
#[derive(Clone, Debug, Default)]
pub struct SeedTrials
{
    pub resistant: TrialAggregator,
    pub peak: TrialAggregator,
    pub peak_day: TrialAggregator,
    pub daily: DailyAggregator,
    pub discarded: usize
}

#[derive(Clone, Debug)]
pub enum TrialOutcome
{
    Outbreaks(SeedTrials),
    /// too many small runs in a row, the seed is left out of the aggregates
    NoOutbreak{discarded: usize}
}

/// Stochastic runs from `seed` until `param.num_trials` of them reached
/// the outbreak threshold. Runs below the threshold are discarded.
pub fn seed_trials<S, R>(
    sim: &mut Simulation<S>,
    seed: usize,
    param: &OutbreakTrialsParams,
    threshold: f64,
    rng: &mut R
) -> Result<TrialOutcome, SimError>
where S: ContactSchedule,
    R: Rng + ?Sized
{
    let mut trials = SeedTrials::default();
    let mut in_a_row = 0;
    while trials.resistant.len() < param.num_trials
    {
        let run = run_stochastic_seed(sim, seed, &mut *rng)?;
        if run.summary.num_resistant < threshold {
            trials.discarded += 1;
            in_a_row += 1;
            if in_a_row > param.outbreak_trial_threshold {
                return Ok(TrialOutcome::NoOutbreak{discarded: trials.discarded});
            }
            continue;
        }
        in_a_row = 0;
        trials.resistant.push(run.summary.num_resistant);
        trials.peak.push(run.summary.peak_infected);
        trials.peak_day.push(run.summary.peak_day_infected as f64);
        let days = run.curve.len().min(param.num_days);
        trials.daily.push_curve(&run.curve[..days]);
    }
    Ok(TrialOutcome::Outbreaks(trials))
}

pub fn run_outbreak_trials(
    param: OutbreakTrialsParams,
    json: Value,
    num_threads: Option<NonZeroUsize>
) -> Result<(), AppError>
{
    param.validate()?;
    if num_threads.map_or(false, |j| j.get() > 1) {
        warn!("stochastic trials share one random stream, running on a single thread");
    }
    let campus = param.campus.load()?;
    match param.campus.graph_mode
    {
        GraphMode::Static => {
            let sim = campus.static_simulation(param.campus.disease)?;
            execute_trials(sim, &campus, &param, json, num_threads)
        },
        GraphMode::Dynamic => {
            let sim = campus.dynamic_simulation(param.campus.disease)?;
            execute_trials(sim, &campus, &param, json, num_threads)
        }
    }
}

fn execute_trials<S>(
    mut sim: Simulation<S>,
    campus: &Campus,
    param: &OutbreakTrialsParams,
    json: Value,
    num_threads: Option<NonZeroUsize>
) -> Result<(), AppError>
where S: ContactSchedule
{
    let mut rng = Pcg64::seed_from_u64(param.seir_seed);
    if let Some(policy) = &param.vaccination {
        apply_policy(&mut sim, policy, &campus.policy_context(), &mut rng)?;
    }
    let chosen = campus.seed_indices(&param.seeds)?;
    let seeds = unvaccinated(&sim, &chosen);
    if seeds.len() < chosen.len() {
        info!("skipping {} vaccinated seeds", chosen.len() - seeds.len());
    }
    let threshold = param.outbreak_threshold(campus.population.len());
    info!("{} seeds, {} trials each, outbreak threshold {threshold}", seeds.len(), param.num_trials);

    let stem = param.quick_name(num_threads);
    let jsons = [json];
    let name = format!("{stem}.dat");
    info!("creating {name}");
    let mut writer = BufWriter::new(File::create(&name)?);
    write_jsons(&jsons, &mut writer)?;
    writeln!(
        writer,
        "#seed accepted discarded resistant_mean resistant_std resistant_err peak_mean peak_std peak_err peak_day_mean peak_day_std peak_day_err"
    )?;

    let mut daily_writer = BufWriter::new(File::create(format!("{stem}.daily"))?);
    write_jsons(&jsons, &mut daily_writer)?;
    writeln!(daily_writer, "#day trials S_mean E_mean I_mean R_mean S_std E_std I_std R_std")?;

    let mut curves = SeirWriter::new(&stem)?;
    curves.write_header(&jsons)?;

    let bar = indication_bar(seeds.len() as u64);
    let mut no_outbreak = 0;
    for &seed in seeds.iter()
    {
        let id = &campus.population.vertex(seed).id;
        match seed_trials(&mut sim, seed, param, threshold, &mut rng)?
        {
            TrialOutcome::NoOutbreak{discarded} => {
                warn!("seed {id}: no outbreak observed, {discarded} runs discarded");
                writeln!(writer, "#{id} no outbreak observed")?;
                no_outbreak += 1;
            },
            TrialOutcome::Outbreaks(trials) => {
                writeln!(
                    writer,
                    "{id} {} {} {} {} {}",
                    trials.resistant.len(),
                    trials.discarded,
                    stats_columns(trials.resistant.stats()),
                    stats_columns(trials.peak.stats()),
                    stats_columns(trials.peak_day.stats())
                )?;

                writeln!(daily_writer, "#seed {id}")?;
                for (day, [s, e, i, r]) in trials.daily.iter_stats().enumerate()
                {
                    writeln!(
                        daily_writer,
                        "{day} {} {} {} {} {} {} {} {} {}",
                        s.samples,
                        s.mean, e.mean, i.mean, r.mean,
                        s.std_dev, e.std_dev, i.std_dev, r.std_dev
                    )?;
                }
                writeln!(daily_writer)?;

                curves.write_run(id, &trials.daily.mean_curve())?;
            }
        }
        bar.inc(1);
    }
    bar.finish_with_message("Done");

    if no_outbreak > 0 {
        warn!("{no_outbreak} of {} seeds produced no outbreak", seeds.len());
    }
    writer.flush()?;
    daily_writer.flush()?;
    curves.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seir_model::static_sim::tests::{graph, population};

    fn params(num_trials: usize, outbreak_trial_threshold: usize) -> OutbreakTrialsParams
    {
        OutbreakTrialsParams{
            num_trials,
            num_days: 3,
            outbreak_trial_threshold,
            ..Default::default()
        }
    }

    fn disease(t: f64) -> SeirParams
    {
        SeirParams{
            transmission_prob: t,
            latent_period: 0,
            infectious_period: 1,
            ..SeirParams::default()
        }
    }

    #[test]
    fn certain_outbreaks_are_all_accepted()
    {
        let g = graph(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)]);
        let mut sim = StaticSimulation::new(g, population(4, 2), disease(1.0)).unwrap();
        let mut rng = Pcg64::seed_from_u64(743);
        let outcome = seed_trials(&mut sim, 0, &params(5, 2), 4.0, &mut rng).unwrap();
        match outcome
        {
            TrialOutcome::Outbreaks(trials) => {
                assert_eq!(trials.discarded, 0);
                let resistant = trials.resistant.stats().unwrap();
                assert_eq!((resistant.mean, resistant.std_dev), (4.0, 0.0));
                // curves are cut to `num_days`
                assert_eq!(trials.daily.len(), 3);
                assert_eq!(trials.daily.reached(2), 5);
            },
            TrialOutcome::NoOutbreak{..} => panic!("path with T = 1 always spreads")
        }
        assert!(sim.is_idle());
    }

    #[test]
    fn gives_up_after_too_many_small_runs()
    {
        let g = graph(3, &[(0, 1, 1.0), (1, 2, 1.0)]);
        let mut sim = StaticSimulation::new(g, population(3, 2), disease(0.0)).unwrap();
        let mut rng = Pcg64::seed_from_u64(743);
        let outcome = seed_trials(&mut sim, 1, &params(5, 4), 2.0, &mut rng).unwrap();
        assert!(matches!(outcome, TrialOutcome::NoOutbreak{discarded: 5}));
        assert!(sim.population().iter().all(|v| !v.ever_infected()));
    }
}
