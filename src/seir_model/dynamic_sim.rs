use {
    super::*,
    crate::{
        error::*,
        misc_types::NUM_DAY_GRAPHS,
    },
};

/// Monday..Friday graphs, one simulated day per graph, wrapping around
/// the end of the week.
#[derive(Clone)]
pub struct WeekSchedule{
    graphs: Vec<ContactGraph>,
    clock: WeekClock,
}

impl ContactSchedule for WeekSchedule{
    fn graph(&self) -> &ContactGraph
    {
        &self.graphs[self.clock.current_day()]
    }

    fn contact_budget(&self, vertex: &Vertex) -> u32
    {
        vertex.contacts_per_day[self.clock.current_day()]
    }

    fn next_day(&mut self)
    {
        self.clock.plus_1();
    }

    fn rewind(&mut self)
    {
        self.clock.rewind();
    }

    fn vertex_count(&self) -> usize
    {
        self.graphs[0].vertex_count()
    }

    fn set_start_day(&mut self, day: usize) -> bool
    {
        self.clock.set_start_day(day)
    }
}

pub type DynamicSimulation = Simulation<WeekSchedule>;

impl Simulation<WeekSchedule>{
    pub fn new(graphs: Vec<ContactGraph>, population: Population, params: SeirParams) -> Result<Self, SimError>
    {
        if graphs.len() != NUM_DAY_GRAPHS {
            return Err(
                GraphError::DayGraphCount{
                    expected: NUM_DAY_GRAPHS,
                    got: graphs.len()
                }.into()
            );
        }
        let n = graphs[0].vertex_count();
        if let Some(g) = graphs.iter().find(|g| g.vertex_count() != n) {
            return Err(
                GraphError::SizeMismatch{
                    graph: g.vertex_count(),
                    population: population.len()
                }.into()
            );
        }
        let schedule = WeekSchedule{
            graphs,
            clock: WeekClock::new(NUM_DAY_GRAPHS)
        };
        Self::from_schedule(schedule, population, params)
    }

    /// Weekday on which the next run starts, usually the seed vertex's
    /// own `start_day`.
    pub fn set_start_day(&mut self, day: usize) -> Result<(), SimError>
    {
        if self.schedule_mut().set_start_day(day) {
            Ok(())
        } else {
            Err(SimError::StartDay(day))
        }
    }

    pub fn start_day(&self) -> usize
    {
        self.schedule().clock.start_day()
    }

    pub fn current_day(&self) -> usize
    {
        self.schedule().clock.current_day()
    }

    pub fn day_graph(&self, day: usize) -> Option<&ContactGraph>
    {
        self.schedule().graphs.get(day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::static_sim::tests::{graph, population};
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn params(t: f64, latent: u32, infectious: u32) -> SeirParams
    {
        SeirParams{
            transmission_prob: t,
            latent_period: latent,
            infectious_period: infectious,
            ..SeirParams::default()
        }
    }

    /// the edge 0 - 1 only exists on `day`
    fn week_with_edge_on(day: usize) -> Vec<ContactGraph>
    {
        (0..NUM_DAY_GRAPHS)
            .map(|d| {
                if d == day {
                    graph(2, &[(0, 1, 1.0)])
                } else {
                    ContactGraph::new(2, d)
                }
            })
            .collect()
    }

    #[test]
    fn needs_five_graphs()
    {
        let res = DynamicSimulation::new(vec![ContactGraph::new(2, 0)], population(2, 1), params(0.5, 0, 1));
        assert!(matches!(res, Err(SimError::Graph(GraphError::DayGraphCount{expected: 5, got: 1}))));
    }

    #[test]
    fn start_day_decides_outcome()
    {
        // edge only on Wednesday, seed infectious for one day
        let mut sim = DynamicSimulation::new(week_with_edge_on(2), population(2, 3), params(1.0, 0, 1)).unwrap();
        let mut rng = Pcg64::seed_from_u64(7);

        sim.set_start_day(2).unwrap();
        sim.set_infected("0").unwrap();
        sim.simul(&mut rng).unwrap();
        assert_eq!(sim.total_ever_infected(), 2.0);
        sim.reset(true);

        sim.set_start_day(0).unwrap();
        sim.set_infected("0").unwrap();
        sim.simul(&mut rng).unwrap();
        assert_eq!(sim.total_ever_infected(), 1.0);
        sim.reset(true);

        assert_eq!(sim.set_start_day(5), Err(SimError::StartDay(5)));
    }

    #[test]
    fn rotation_reaches_later_days()
    {
        // infectious for 4 days starting Monday, edge only on Thursday
        let mut sim = DynamicSimulation::new(week_with_edge_on(3), population(2, 3), params(1.0, 0, 4)).unwrap();
        let mut rng = Pcg64::seed_from_u64(8);
        sim.set_infected("0").unwrap();
        sim.set_start_day(0).unwrap();
        sim.simul(&mut rng).unwrap();
        assert_eq!(sim.total_ever_infected(), 2.0);
        // infected during the Thursday step, counted from day 4 on
        assert_eq!(sim.get_data()[3].s, 1.0);
        assert_eq!(sim.get_data()[4].s, 0.0);

        sim.reset(true);
        assert_eq!(sim.current_day(), 0);
    }

    #[test]
    fn seed_week_alignment()
    {
        let mut pop = population(2, 3);
        pop.vertex_mut(1).start_day = 2;
        let mut sim = DynamicSimulation::new(week_with_edge_on(2), pop, params(1.0, 0, 1)).unwrap();
        let mut rng = Pcg64::seed_from_u64(10);
        sim.start_week_of(1).unwrap();
        assert_eq!(sim.start_day(), 2);
        sim.set_infected_index(1).unwrap();
        sim.simul(&mut rng).unwrap();
        assert_eq!(sim.total_ever_infected(), 2.0);
    }

    #[test]
    fn weekday_budgets_apply()
    {
        let mut pop = population(2, 0);
        pop.vertex_mut(0).contacts_per_day = [0, 0, 0, 0, 1];
        let graphs = (0..NUM_DAY_GRAPHS)
            .map(|_| graph(2, &[(0, 1, 1.0)]))
            .collect();
        let mut sim = DynamicSimulation::new(graphs, pop, params(1.0, 0, 2)).unwrap();
        let mut rng = Pcg64::seed_from_u64(9);

        sim.set_start_day(3).unwrap();
        sim.set_infected("0").unwrap();
        sim.simul(&mut rng).unwrap();
        // Thursday budget 0, Friday budget 1
        assert_eq!(sim.get_data()[1].s, 1.0);
        assert_eq!(sim.get_data()[2].s, 0.0);
    }

    #[test]
    fn trickle_conserves_mass_across_days()
    {
        let graphs: Vec<_> = (0..NUM_DAY_GRAPHS)
            .map(|d| {
                let w = 0.2 + 0.1 * d as f64;
                graph(4, &[(0, 1, w), (1, 2, w), (2, 3, 1.0 - w)])
            })
            .collect();
        let mut sim = DynamicSimulation::new(graphs, population(4, 2), params(0.5, 1, 2)).unwrap();
        sim.set_start_day(1).unwrap();
        sim.set_trickler("1").unwrap();
        sim.trickle_simul().unwrap();
        for counts in sim.get_data() {
            assert!((counts.total() - 4.0).abs() < 1e-9);
        }
        let total = sim.total_ever_infected();
        assert!(total > 1.0 && total < 4.0);
        sim.reset(false);
        assert!(sim.population().is_baseline());
    }
}
