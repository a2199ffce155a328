use {
    rand::{Rng, distributions::{Distribution, Uniform}, seq::index::sample as sample_indices},
    serde::{Serialize, Deserialize},
    log::debug,
    super::*,
    crate::{
        error::*,
        misc_types::*,
    },
};

/// Disease and run-control parameters shared by both run modes.
#[derive(Serialize, Deserialize, Clone, Debug, Copy, PartialEq)]
pub struct SeirParams{
    pub transmission_prob: f64,
    /// days spent exposed, 0 means infectious right away
    pub latent_period: u32,
    pub infectious_period: u32,
    /// trickle runs stop once daily changes fall below this
    pub convergence_threshold: f64,
    /// hard cap on simulated days of a trickle run
    pub max_days: usize,
}

impl Default for SeirParams{
    fn default() -> Self{
        Self{
            transmission_prob: DEFAULT_TRANSMISSION_PROB,
            latent_period: DEFAULT_LATENT_PERIOD,
            infectious_period: DEFAULT_INFECTIOUS_PERIOD,
            convergence_threshold: DEFAULT_F_THRESHOLD,
            max_days: DEFAULT_MAX_DAYS
        }
    }
}

impl SeirParams{
    pub fn validate(&self) -> Result<(), ConfigError>
    {
        let t = self.transmission_prob;
        if !(0.0..=1.0).contains(&t) {
            return Err(ConfigError::TransmissionProbability(t));
        }
        if self.infectious_period == 0 {
            return Err(ConfigError::InfectiousPeriod);
        }
        let c = self.convergence_threshold;
        if !c.is_finite() || c <= 0.0 {
            return Err(ConfigError::ConvergenceThreshold(c));
        }
        if self.max_days == 0 {
            return Err(ConfigError::MaxDays);
        }
        Ok(())
    }

    fn stage_count(&self) -> usize
    {
        (self.latent_period + self.infectious_period) as usize
    }
}

/// Which contact graph is active on the current simulated day and how
/// many contacts a vertex makes on it.
pub trait ContactSchedule{
    fn graph(&self) -> &ContactGraph;

    fn contact_budget(&self, vertex: &Vertex) -> u32;

    /// called once after every simulated day
    fn next_day(&mut self);

    /// back to the first day of a run
    fn rewind(&mut self);

    /// Weekday the next run starts on. A schedule without weekdays
    /// accepts every day.
    fn set_start_day(&mut self, _day: usize) -> bool
    {
        true
    }

    fn vertex_count(&self) -> usize;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode{
    Stochastic,
    Trickle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunPhase{
    Idle,
    Seeded(RunMode),
    Finished(RunMode),
}

/// Scalar outcome of one run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary{
    pub total_ever_infected: f64,
    pub peak_infected: f64,
    pub peak_day_infected: usize,
    pub num_resistant: f64,
    pub days: usize,
}

#[derive(Clone, Copy, Debug, Default)]
struct Compartments{
    s: usize,
    e: usize,
    i: usize,
    r: usize,
}

impl Compartments{
    fn as_counts(&self) -> DayCounts
    {
        DayCounts{
            s: self.s as f64,
            e: self.e as f64,
            i: self.i as f64,
            r: self.r as f64
        }
    }
}

/// SEIR engine bound to a contact schedule and the population it mutates.
///
/// A run is: seed (`set_infected` or `set_trickler`), run (`simul` or
/// `trickle_simul`), read the outcome, `reset`. Seeding again without a
/// reset is rejected.
#[derive(Clone)]
pub struct Simulation<S>{
    schedule: S,
    population: Population,
    params: SeirParams,
    phase: RunPhase,
    data: Vec<DayCounts>,
    infectious_list: Vec<usize>,
    exposed_list: Vec<usize>,
    new_exposed_list: Vec<usize>,
    neighbor_buf: Vec<(usize, f64)>,
    contact_buf: Vec<(usize, f64)>,
    escape: Vec<f64>,
    compartments: Compartments,
}

impl<S> Simulation<S>
where S: ContactSchedule
{
    pub fn from_schedule(schedule: S, population: Population, params: SeirParams) -> Result<Self, SimError>
    {
        params.validate()?;
        if schedule.vertex_count() != population.len(){
            return Err(
                GraphError::SizeMismatch{
                    graph: schedule.vertex_count(),
                    population: population.len()
                }.into()
            );
        }
        let n = population.len();
        Ok(
            Self{
                schedule,
                population,
                params,
                phase: RunPhase::Idle,
                data: Vec::new(),
                infectious_list: Vec::new(),
                exposed_list: Vec::new(),
                new_exposed_list: Vec::new(),
                neighbor_buf: Vec::new(),
                contact_buf: Vec::new(),
                escape: vec![1.0; n],
                compartments: Compartments::default()
            }
        )
    }

    pub fn params(&self) -> &SeirParams
    {
        &self.params
    }

    pub fn population(&self) -> &Population
    {
        &self.population
    }

    pub fn schedule(&self) -> &S
    {
        &self.schedule
    }

    pub(crate) fn schedule_mut(&mut self) -> &mut S
    {
        &mut self.schedule
    }

    pub fn is_idle(&self) -> bool
    {
        self.phase == RunPhase::Idle
    }

    /// Vaccinates the given vertices. Allowed before seeding and after a
    /// finished run, never between seeding and the end of the run.
    pub fn apply_vaccination(&mut self, indices: &[usize]) -> Result<usize, SimError>
    {
        if let RunPhase::Seeded(_) = self.phase {
            return Err(SimError::RunInProgress);
        }
        Ok(self.population.vaccinate(indices))
    }

    /// Aligns the next run with the personal week of the vertex at `index`.
    pub fn start_week_of(&mut self, index: usize) -> Result<(), SimError>
    {
        let day = self.population.vertex(index).start_day;
        if self.schedule.set_start_day(day) {
            Ok(())
        } else {
            Err(SimError::StartDay(day))
        }
    }

    fn seed_index(&self, id: &str) -> Result<usize, SimError>
    {
        self.population
            .index_of(id)
            .map_err(|_| SimError::UnknownSeed(id.to_owned()))
    }

    fn begin_run(&mut self, index: usize) -> Result<(), SimError>
    {
        if self.phase != RunPhase::Idle {
            return Err(SimError::ResetRequired);
        }
        if index >= self.population.len() {
            return Err(SimError::UnknownSeed(index.to_string()));
        }
        let vertex = self.population.vertex(index);
        if vertex.epi().is_immune() {
            return Err(SimError::SeedVaccinated(vertex.id.clone()));
        }
        self.data.clear();
        self.schedule.rewind();
        Ok(())
    }

    /// Seeds a stochastic run: `id` becomes infectious.
    pub fn set_infected(&mut self, id: &str) -> Result<(), SimError>
    {
        let index = self.seed_index(id)?;
        self.set_infected_index(index)
    }

    pub fn set_infected_index(&mut self, index: usize) -> Result<(), SimError>
    {
        self.begin_run(index)?;
        let epi = self.population.vertex_mut(index).epi_mut();
        epi.state = InfectionState::Infectious(self.params.infectious_period);
        epi.ever_infected = true;
        self.infectious_list.push(index);
        self.phase = RunPhase::Seeded(RunMode::Stochastic);
        Ok(())
    }

    /// Seeds a trickle run: `id` is infected with certainty, every other
    /// vertex starts with infection probability 0.
    pub fn set_trickler(&mut self, id: &str) -> Result<(), SimError>
    {
        let index = self.seed_index(id)?;
        self.set_trickler_index(index)
    }

    pub fn set_trickler_index(&mut self, index: usize) -> Result<(), SimError>
    {
        self.begin_run(index)?;
        let stages = self.params.stage_count();
        for v in self.population.iter_mut()
        {
            let trickle = &mut v.epi_mut().trickle;
            trickle.stages.clear();
            trickle.stages.resize(stages, 0.0);
        }
        let latent = self.params.latent_period as usize;
        let epi = self.population.vertex_mut(index).epi_mut();
        epi.trickle.not_infected = 0.0;
        epi.trickle.stages[latent] = 1.0;
        epi.ever_infected = true;
        self.phase = RunPhase::Seeded(RunMode::Trickle);
        Ok(())
    }

    /// Runs a seeded stochastic simulation until no vertex is exposed or
    /// infectious. All draws come from `rng`.
    pub fn simul<R>(&mut self, rng: &mut R) -> Result<(), SimError>
    where R: Rng + ?Sized
    {
        if self.phase != RunPhase::Seeded(RunMode::Stochastic) {
            return Err(SimError::NotSeeded);
        }
        let counts = self.population.discrete_counts();
        self.compartments = Compartments{
            s: counts.s as usize,
            e: counts.e as usize,
            i: counts.i as usize,
            r: counts.r as usize
        };
        self.data.push(counts);

        while !(self.infectious_list.is_empty() && self.exposed_list.is_empty())
        {
            self.propagate_one_time_step(&mut *rng);
            self.schedule.next_day();
            let counts = self.compartments.as_counts();
            debug_assert_eq!(counts, self.population.discrete_counts());
            self.data.push(counts);
        }
        self.phase = RunPhase::Finished(RunMode::Stochastic);
        debug!(
            "stochastic run finished after {} days, {} ever infected",
            self.data.len() - 1,
            self.total_ever_infected()
        );
        Ok(())
    }

    fn propagate_one_time_step<R>(&mut self, rng: &mut R)
    where R: Rng + ?Sized
    {
        debug_assert!(self.new_exposed_list.is_empty());
        let prob_dist = Uniform::new(0.0, 1.0);
        let trans_prob = self.params.transmission_prob;
        let latent = self.params.latent_period;
        let infectious = self.params.infectious_period;

        let Self{
            schedule,
            population,
            infectious_list,
            exposed_list,
            new_exposed_list,
            neighbor_buf,
            contact_buf,
            compartments,
            ..
        } = self;
        let graph = schedule.graph();

        // transmission along today's contacts
        for &index in infectious_list.iter()
        {
            let budget = schedule.contact_budget(population.vertex(index)) as usize;
            neighbor_buf.clear();
            neighbor_buf.extend(graph.neighbors_weighted(index));
            contact_buf.clear();
            if neighbor_buf.len() <= budget {
                contact_buf.extend_from_slice(neighbor_buf);
            } else {
                contact_buf.extend(
                    sample_indices(&mut *rng, neighbor_buf.len(), budget)
                        .iter()
                        .map(|pos| neighbor_buf[pos])
                );
            }

            for &(n_index, weight) in contact_buf.iter()
            {
                let epi = population.vertex_mut(n_index).epi_mut();
                if !epi.state.sus_check() {
                    continue;
                }
                let prob = (trans_prob * weight).min(1.0) * epi.immune_override;
                if prob_dist.sample(&mut *rng) < prob {
                    epi.state = InfectionState::Exposed(latent);
                    epi.ever_infected = true;
                    new_exposed_list.push(n_index);
                }
            }
        }

        // countdowns of everyone who was already exposed or infectious
        for i in (0..infectious_list.len()).rev()
        {
            let epi = population.vertex_mut(infectious_list[i]).epi_mut();
            if let InfectionState::Infectious(left) = epi.state {
                if left <= 1 {
                    epi.state = InfectionState::Recovered;
                    infectious_list.swap_remove(i);
                    compartments.i -= 1;
                    compartments.r += 1;
                } else {
                    epi.state = InfectionState::Infectious(left - 1);
                }
            }
        }
        for i in (0..exposed_list.len()).rev()
        {
            let index = exposed_list[i];
            let epi = population.vertex_mut(index).epi_mut();
            if let InfectionState::Exposed(left) = epi.state {
                if left <= 1 {
                    epi.state = InfectionState::Infectious(infectious);
                    exposed_list.swap_remove(i);
                    infectious_list.push(index);
                    compartments.e -= 1;
                    compartments.i += 1;
                } else {
                    epi.state = InfectionState::Exposed(left - 1);
                }
            }
        }

        for index in new_exposed_list.drain(..)
        {
            compartments.s -= 1;
            if latent == 0 {
                population.vertex_mut(index).epi_mut().state = InfectionState::Infectious(infectious);
                infectious_list.push(index);
                compartments.i += 1;
            } else {
                exposed_list.push(index);
                compartments.e += 1;
            }
        }
    }

    /// Runs a seeded trickle simulation: propagates expected values until
    /// the daily change of the not-yet-infected mass and the remaining
    /// exposed plus infectious mass are both negligible.
    pub fn trickle_simul(&mut self) -> Result<(), SimError>
    {
        if self.phase != RunPhase::Seeded(RunMode::Trickle) {
            return Err(SimError::NotSeeded);
        }
        let threshold = self.params.convergence_threshold;
        let mut counts = self.trickle_counts();
        self.data.push(counts);

        for _ in 0..self.params.max_days
        {
            let prev_s = counts.s;
            self.trickle_one_time_step();
            self.schedule.next_day();
            counts = self.trickle_counts();
            self.data.push(counts);
            if (prev_s - counts.s).abs() < threshold && counts.e + counts.i < threshold {
                break;
            }
        }
        self.phase = RunPhase::Finished(RunMode::Trickle);
        debug!(
            "trickle run finished after {} days, {} expected ever infected",
            self.data.len() - 1,
            self.total_ever_infected()
        );
        Ok(())
    }

    fn trickle_one_time_step(&mut self)
    {
        let trans_prob = self.params.transmission_prob;
        let latent = self.params.latent_period as usize;
        let Self{
            schedule,
            population,
            escape,
            ..
        } = self;
        let graph = schedule.graph();

        escape.iter_mut().for_each(|e| *e = 1.0);
        for (index, vertex) in population.iter().enumerate()
        {
            let infectious = vertex.epi().trickle.infectious_mass(latent);
            if infectious <= 0.0 {
                continue;
            }
            let degree = graph.degree(index);
            if degree == 0 {
                continue;
            }
            let contact_frac = (schedule.contact_budget(vertex) as f64 / degree as f64).min(1.0);
            if contact_frac <= 0.0 {
                continue;
            }
            for (n_index, weight) in graph.neighbors_weighted(index)
            {
                escape[n_index] *= 1.0 - (trans_prob * weight).min(1.0) * contact_frac * infectious;
            }
        }

        for (vertex, &esc) in population.iter_mut().zip(escape.iter())
        {
            let epi = vertex.epi_mut();
            let newly_infected = if epi.vaccinated {
                0.0
            } else {
                epi.trickle.not_infected * epi.immune_override * (1.0 - esc)
            };
            epi.trickle.age_one_day(newly_infected);
            if newly_infected > 0.0 {
                epi.ever_infected = true;
            }
        }
    }

    fn trickle_counts(&self) -> DayCounts
    {
        let latent = self.params.latent_period as usize;
        let mut counts = DayCounts::default();
        for v in self.population.iter()
        {
            let t = &v.epi().trickle;
            counts.s += t.not_infected;
            counts.e += t.exposed_mass(latent);
            counts.i += t.infectious_mass(latent);
            counts.r += t.recovered;
        }
        counts
    }

    fn current_mode(&self) -> Option<RunMode>
    {
        match self.phase
        {
            RunPhase::Idle => None,
            RunPhase::Seeded(mode) | RunPhase::Finished(mode) => Some(mode)
        }
    }

    /// Number of vertices that left susceptible in this run, or the
    /// expected number in trickle mode.
    pub fn total_ever_infected(&self) -> f64
    {
        match self.current_mode()
        {
            Some(RunMode::Trickle) => self.population
                .iter()
                .map(|v| 1.0 - v.epi().trickle.not_infected)
                .sum(),
            _ => self.population
                .iter()
                .filter(|v| v.ever_infected())
                .count() as f64
        }
    }

    /// Maximum simultaneous infectious (expected) count and the first
    /// day it was reached.
    pub fn peak(&self) -> (f64, usize)
    {
        let mut peak = 0.0;
        let mut peak_day = 0;
        for (day, counts) in self.data.iter().enumerate()
        {
            if counts.i > peak {
                peak = counts.i;
                peak_day = day;
            }
        }
        (peak, peak_day)
    }

    pub fn peak_infected(&self) -> f64
    {
        self.peak().0
    }

    pub fn peak_day_infected(&self) -> usize
    {
        self.peak().1
    }

    /// recovered (expected) count at termination
    pub fn num_resistant(&self) -> f64
    {
        self.data
            .last()
            .map(|c| c.r)
            .unwrap_or(0.0)
    }

    /// one entry per simulated day, day 0 is the seeded state
    pub fn get_data(&self) -> &[DayCounts]
    {
        &self.data
    }

    pub fn summary(&self) -> RunSummary
    {
        let (peak_infected, peak_day_infected) = self.peak();
        RunSummary{
            total_ever_infected: self.total_ever_infected(),
            peak_infected,
            peak_day_infected,
            num_resistant: self.num_resistant(),
            days: self.data.len().saturating_sub(1)
        }
    }

    /// Restores every vertex to susceptible and not-ever-infected.
    /// `affect_vaccinated` also removes all vaccinations.
    pub fn reset(&mut self, affect_vaccinated: bool)
    {
        self.population.reset(affect_vaccinated);
        self.infectious_list.clear();
        self.exposed_list.clear();
        self.new_exposed_list.clear();
        self.data.clear();
        self.compartments = Compartments::default();
        self.schedule.rewind();
        self.phase = RunPhase::Idle;
    }
}
