//! One run per seed vertex, in either run mode.

use {
    indicatif::ProgressBar,
    rand::Rng,
    rayon::prelude::*,
    log::debug,
    crate::{
        error::SimError,
        seir_model::*,
    },
};

/// Outcome of the run seeded at `seed`.
#[derive(Clone, Debug)]
pub struct SeedRun{
    pub seed: usize,
    pub summary: RunSummary,
    pub curve: Vec<DayCounts>,
}

fn finish_run<S: ContactSchedule>(sim: &mut Simulation<S>, seed: usize) -> SeedRun
{
    let run = SeedRun{
        seed,
        summary: sim.summary(),
        curve: sim.get_data().to_vec()
    };
    sim.reset(false);
    run
}

pub fn run_trickle_seed<S>(sim: &mut Simulation<S>, seed: usize) -> Result<SeedRun, SimError>
where S: ContactSchedule
{
    sim.start_week_of(seed)?;
    sim.set_trickler_index(seed)?;
    sim.trickle_simul()?;
    Ok(finish_run(sim, seed))
}

pub fn run_stochastic_seed<S, R>(sim: &mut Simulation<S>, seed: usize, rng: &mut R) -> Result<SeedRun, SimError>
where S: ContactSchedule,
    R: Rng + ?Sized
{
    sim.start_week_of(seed)?;
    sim.set_infected_index(seed)?;
    sim.simul(rng)?;
    Ok(finish_run(sim, seed))
}

/// Vaccinated vertices cannot be seeded.
pub fn unvaccinated<S>(sim: &Simulation<S>, seeds: &[usize]) -> Vec<usize>
where S: ContactSchedule
{
    seeds.iter()
        .copied()
        .filter(|&i| !sim.population().vertex(i).is_vaccinated())
        .collect()
}

/// Trickle runs of all `seeds`. Every worker of the current rayon pool
/// gets its own clone of `sim`; the result is in seed order.
pub fn trickle_sweep<S>(sim: &Simulation<S>, seeds: &[usize], bar: &ProgressBar) -> Result<Vec<SeedRun>, SimError>
where S: ContactSchedule + Clone + Send + Sync
{
    if seeds.is_empty() {
        return Ok(Vec::new());
    }
    let threads = rayon::current_num_threads().max(1);
    let chunk_size = (seeds.len() + threads - 1) / threads;
    debug!("trickle sweep over {} seeds in chunks of {chunk_size}", seeds.len());

    let chunks: Vec<Result<Vec<SeedRun>, SimError>> = seeds
        .par_chunks(chunk_size)
        .map(|chunk| {
            let mut sim = sim.clone();
            chunk.iter()
                .map(|&seed| {
                    let run = run_trickle_seed(&mut sim, seed);
                    bar.inc(1);
                    run
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect();

    let mut runs = Vec::with_capacity(seeds.len());
    for chunk in chunks
    {
        runs.extend(chunk?);
    }
    Ok(runs)
}

/// Stochastic runs of all `seeds`, one after the other on one random
/// stream.
pub fn stochastic_sweep<S, R>(sim: &mut Simulation<S>, seeds: &[usize], rng: &mut R, bar: &ProgressBar) -> Result<Vec<SeedRun>, SimError>
where S: ContactSchedule,
    R: Rng + ?Sized
{
    let mut runs = Vec::with_capacity(seeds.len());
    for &seed in seeds
    {
        runs.push(run_stochastic_seed(sim, seed, &mut *rng)?);
        bar.inc(1);
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seir_model::static_sim::tests::{graph, population};
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn ring_sim() -> StaticSimulation
    {
        let n = 12;
        let edges: Vec<_> = (0..n).map(|a| (a, (a + 1) % n, 0.3 + 0.05 * a as f64)).collect();
        let params = SeirParams{
            transmission_prob: 0.8,
            latent_period: 1,
            infectious_period: 2,
            ..SeirParams::default()
        };
        StaticSimulation::new(graph(n, &edges), population(n, 2), params).unwrap()
    }

    #[test]
    fn trickle_sweep_independent_of_thread_count()
    {
        let mut sim = ring_sim();
        sim.apply_vaccination(&[4]).unwrap();
        let seeds = unvaccinated(&sim, &(0..12).collect::<Vec<_>>());
        assert_eq!(seeds.len(), 11);

        let sweep = |threads: usize| {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
            pool.install(|| trickle_sweep(&sim, &seeds, &ProgressBar::hidden())).unwrap()
        };
        let one = sweep(1);
        let four = sweep(4);
        assert_eq!(one.len(), 11);
        for (a, b) in one.iter().zip(four.iter()) {
            assert_eq!(a.seed, b.seed);
            assert_eq!(a.summary, b.summary);
            assert_eq!(a.curve, b.curve);
        }

        let mut serial = Vec::new();
        for &seed in seeds.iter() {
            serial.push(run_trickle_seed(&mut sim, seed).unwrap());
        }
        assert_eq!(serial[3].curve, one[3].curve);
        assert!(sim.is_idle());
        assert_eq!(sim.population().vaccinated_count(), 1);
    }

    #[test]
    fn stochastic_sweep_is_reproducible()
    {
        let seeds: Vec<usize> = (0..12).collect();
        let run = || {
            let mut sim = ring_sim();
            let mut rng = Pcg64::seed_from_u64(743);
            stochastic_sweep(&mut sim, &seeds, &mut rng, &ProgressBar::hidden())
                .unwrap()
                .into_iter()
                .map(|r| r.curve)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
