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
    rayon::ThreadPool,
    log::{info, warn},
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

/// One vaccination followed by one sweep. `target` is set when the sweep
/// only seeds inside the targeted community.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepRound
{
    pub target: Option<CommunityId>,
    pub policy: VaccinationPolicy
}

/// Ring vaccination without a target becomes one round per community.
pub fn sweep_rounds(policy: &VaccinationPolicy, communities: &[CommunityId]) -> Vec<SweepRound>
{
    match policy
    {
        VaccinationPolicy::Ring(ring) if ring.target_community.is_none() => {
            communities.iter()
                .map(|&c| SweepRound{
                    target: Some(c),
                    policy: VaccinationPolicy::Ring(ring.with_target(c))
                })
                .collect()
        },
        _ => vec![SweepRound{target: None, policy: policy.clone()}]
    }
}

pub fn run_vaccination_sweep(
    param: VaccinationSweepParams,
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
    if param.monte_carlo && j > 1 {
        warn!("stochastic sweeps share one random stream, running on a single thread");
    }

    match param.campus.graph_mode
    {
        GraphMode::Static => {
            let sim = campus.static_simulation(param.campus.disease)?;
            execute_sweep(sim, &campus, &param, json, num_threads, &pool)
        },
        GraphMode::Dynamic => {
            let sim = campus.dynamic_simulation(param.campus.disease)?;
            execute_sweep(sim, &campus, &param, json, num_threads, &pool)
        }
    }
}

fn execute_sweep<S>(
    mut sim: Simulation<S>,
    campus: &Campus,
    param: &VaccinationSweepParams,
    json: Value,
    num_threads: Option<NonZeroUsize>,
    pool: &ThreadPool
) -> Result<(), AppError>
where S: ContactSchedule + Clone + Send + Sync
{
    let mut rng = Pcg64::seed_from_u64(param.seir_seed);
    let stem = param.quick_name(num_threads);
    let jsons = [json];
    let name = format!("{stem}.dat");
    info!("creating {name}");
    let mut writer = BufWriter::new(File::create(&name)?);
    write_jsons(&jsons, &mut writer)?;
    writeln!(writer, "#seed community total_ever_infected resistant peak peak_day days")?;
    let mut curves = SeirWriter::new(&stem)?;
    curves.write_header(&jsons)?;

    let [measure_c, measure_r] = param.measure_types();
    let mut ever_infected = TrialAggregator::new();
    let mut resistant = TrialAggregator::new();

    for round in sweep_rounds(&param.vaccination, campus.meta.ids())
    {
        sim.reset(true);
        let applied = apply_policy(&mut sim, &round.policy, &campus.policy_context(), &mut rng);
        match (applied, round.target)
        {
            (Err(AppError::Policy(PolicyError::UnreachableTarget(c))), Some(_)) => {
                warn!("community {c} has no path to any other community, skipped");
                writeln!(writer, "#community {c} unreachable")?;
                continue;
            },
            (res, _) => {
                res?;
            }
        }

        let candidates = match round.target
        {
            Some(c) => {
                writeln!(writer, "#community {c}")?;
                campus.meta
                    .members(c)
                    .map(<[usize]>::to_vec)
                    .unwrap_or_default()
            },
            None => (0..campus.population.len()).collect()
        };
        let seeds = unvaccinated(&sim, &candidates);
        info!(
            "{}: {} seeds, {} vaccinated",
            vaccination_naming_string(Some(&round.policy)),
            seeds.len(),
            sim.population().vaccinated_count()
        );

        let bar = indication_bar(seeds.len() as u64);
        let runs = if param.monte_carlo {
            stochastic_sweep(&mut sim, &seeds, &mut rng, &bar)?
        } else {
            pool.install(|| trickle_sweep(&sim, &seeds, &bar))?
        };
        bar.finish_with_message("Done");

        let mut round_c = TrialAggregator::new();
        for run in runs
        {
            let vertex = campus.population.vertex(run.seed);
            let s = run.summary;
            writeln!(
                writer,
                "{} {} {} {} {} {} {}",
                vertex.id,
                vertex.community,
                s.total_ever_infected,
                s.num_resistant,
                s.peak_infected,
                s.peak_day_infected,
                s.days
            )?;
            match round.target
            {
                Some(c) => curves.write_run(format!("{c}:{}", vertex.id), &run.curve)?,
                None => curves.write_run(&vertex.id, &run.curve)?
            }
            round_c.push(s.total_ever_infected);
            ever_infected.push(s.total_ever_infected);
            resistant.push(s.num_resistant);
        }
        if let Some(stats) = round_c.stats() {
            info!("mean {} {:.4} +- {:.4}", measure_c.name(), stats.mean, stats.std_error);
        }
    }
    sim.reset(true);

    writeln!(writer, "#{} {}", measure_c.name(), stats_columns(ever_infected.stats()))?;
    writeln!(writer, "#{} {}", measure_r.name(), stats_columns(resistant.stats()))?;
    writer.flush()?;
    curves.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untargeted_ring_splits_into_rounds()
    {
        let ring = RingVaccination{
            target_community: None,
            budget: 4,
            trait_index: 0,
            pick_high: true
        };
        let rounds = sweep_rounds(&VaccinationPolicy::Ring(ring.clone()), &[3, 7]);
        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[1].target, Some(7));
        assert_eq!(rounds[1].policy, VaccinationPolicy::Ring(ring.with_target(7)));

        let random = VaccinationPolicy::Random(RandomVaccination{budget: 2});
        assert_eq!(sweep_rounds(&random, &[3, 7]), vec![SweepRound{target: None, policy: random.clone()}]);

        let targeted = VaccinationPolicy::Ring(ring.with_target(3));
        assert_eq!(sweep_rounds(&targeted, &[3, 7])[0].target, None);
    }
}
