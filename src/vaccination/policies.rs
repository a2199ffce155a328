use {
    std::collections::{HashMap, VecDeque},
    rand::{Rng, seq::SliceRandom},
    serde::{Serialize, Deserialize},
    log::info,
    super::*,
    crate::{
        error::{AppError, PolicyError},
        misc_types::CommunityId,
        seir_model::{ContactGraph, ContactSchedule, Population, Simulation},
    },
};

/// What a policy may look at besides the population.
#[derive(Clone, Copy)]
pub struct PolicyContext<'a>{
    pub full_graph: &'a ContactGraph,
    /// only the ring and community connector policies need it
    pub meta: Option<&'a CommunityMetaGraph>,
}

/// Picks the vertices to vaccinate before a run. Implementors never
/// return a vertex that was infected in the current run, except the
/// community policy which vaccinates unconditionally.
pub trait SelectVaccinees{
    fn select<R>(&self, population: &Population, ctx: &PolicyContext, rng: &mut R) -> Result<Vec<usize>, PolicyError>
    where R: Rng + ?Sized;
}

/// Stable sort of `candidates` by an extracted key, highest first if
/// `pick_high`.
pub fn rank_by_key<F>(candidates: &[usize], key: F, pick_high: bool) -> Vec<usize>
where F: Fn(usize) -> f64
{
    let mut keyed: Vec<(f64, usize)> = candidates.iter()
        .map(|&i| (key(i), i))
        .collect();
    if pick_high {
        keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    } else {
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
    keyed.into_iter()
        .map(|(_, i)| i)
        .collect()
}

pub fn rank_by_trait(population: &Population, candidates: &[usize], trait_index: usize, pick_high: bool) -> Result<Vec<usize>, PolicyError>
{
    if let Some(&short) = candidates.iter().find(|&&i| population.vertex(i).centralities.len() <= trait_index) {
        return Err(
            PolicyError::TraitIndex{
                index: trait_index,
                available: population.vertex(short).centralities.len()
            }
        );
    }
    Ok(
        rank_by_key(
            candidates,
            |i| population.vertex(i).centralities[trait_index],
            pick_high
        )
    )
}

fn eligible(population: &Population) -> Vec<usize>
{
    population.iter()
        .enumerate()
        .filter(|(_, v)| v.is_eligible())
        .map(|(i, _)| i)
        .collect()
}

/// The `budget` vertices with the highest (or lowest) value of one
/// centrality.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TopTrait{
    pub trait_index: usize,
    pub pick_high: bool,
    pub budget: usize,
}

impl SelectVaccinees for TopTrait{
    fn select<R>(&self, population: &Population, _ctx: &PolicyContext, _rng: &mut R) -> Result<Vec<usize>, PolicyError>
    where R: Rng + ?Sized
    {
        let mut ranked = rank_by_trait(population, &eligible(population), self.trait_index, self.pick_high)?;
        ranked.truncate(self.budget);
        Ok(ranked)
    }
}

/// The `budget` vertices with the highest connector score.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TopConnector{
    pub budget: usize,
}

impl SelectVaccinees for TopConnector{
    fn select<R>(&self, population: &Population, _ctx: &PolicyContext, _rng: &mut R) -> Result<Vec<usize>, PolicyError>
    where R: Rng + ?Sized
    {
        let mut ranked = rank_by_key(
            &eligible(population),
            |i| population.vertex(i).connector_score,
            true
        );
        ranked.truncate(self.budget);
        Ok(ranked)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RandomVaccination{
    pub budget: usize,
}

impl SelectVaccinees for RandomVaccination{
    fn select<R>(&self, population: &Population, _ctx: &PolicyContext, rng: &mut R) -> Result<Vec<usize>, PolicyError>
    where R: Rng + ?Sized
    {
        let mut order: Vec<usize> = (0..population.len()).collect();
        order.shuffle(rng);
        Ok(
            order.into_iter()
                .filter(|&i| population.vertex(i).is_eligible())
                .take(self.budget)
                .collect()
        )
    }
}

/// Every member of one community.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CommunityVaccination{
    pub community: CommunityId,
}

impl SelectVaccinees for CommunityVaccination{
    fn select<R>(&self, population: &Population, _ctx: &PolicyContext, _rng: &mut R) -> Result<Vec<usize>, PolicyError>
    where R: Rng + ?Sized
    {
        population.communities()
            .remove(&self.community)
            .ok_or(PolicyError::UnknownCommunity(self.community))
    }
}

/// Everyone within `depth` hops of `seed` on the full graph, the seed
/// itself excluded.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NeighborFlood{
    pub seed: String,
    pub depth: usize,
}

impl SelectVaccinees for NeighborFlood{
    fn select<R>(&self, population: &Population, ctx: &PolicyContext, _rng: &mut R) -> Result<Vec<usize>, PolicyError>
    where R: Rng + ?Sized
    {
        let seed = population.index_of(&self.seed)
            .map_err(|_| PolicyError::UnknownVertex(self.seed.clone()))?;
        let mut selected = Vec::new();
        if self.depth == 0 {
            return Ok(selected);
        }

        let mut visited: HashMap<usize, usize> = HashMap::new();
        let mut frontier = VecDeque::new();
        visited.insert(seed, 0);
        frontier.push_back(seed);

        while let Some(index) = frontier.pop_front()
        {
            let depth = visited[&index];
            if depth == self.depth {
                continue;
            }
            for n_index in ctx.full_graph.neighbors(index)
            {
                if visited.contains_key(&n_index) {
                    continue;
                }
                visited.insert(n_index, depth + 1);
                frontier.push_back(n_index);
                if population.vertex(n_index).is_eligible() {
                    selected.push(n_index);
                }
            }
        }
        Ok(selected)
    }
}

/// Cuts communities apart: for every pair of communities the smaller of
/// the two bridging vertex sets is vaccinated as a whole, heaviest pairs
/// first, as long as the remaining budget covers the whole set.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CommunityConnector{
    pub budget: usize,
}

impl SelectVaccinees for CommunityConnector{
    fn select<R>(&self, population: &Population, ctx: &PolicyContext, _rng: &mut R) -> Result<Vec<usize>, PolicyError>
    where R: Rng + ?Sized
    {
        let meta = ctx.meta.ok_or(PolicyError::MissingMetaGraph)?;
        let sets = meta.bridging_sets(population, ctx.full_graph);

        let mut ranked = Vec::new();
        for (&(x, y), b_xy) in sets.iter()
        {
            if x >= y {
                continue;
            }
            let b_yx = match sets.get(&(y, x))
            {
                Some(set) => set,
                None => continue
            };
            let smaller = if b_xy.len() < b_yx.len() {
                b_xy
            } else {
                b_yx
            };
            ranked.push((meta.weight(x, y), smaller));
        }
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut left = self.budget;
        let mut taken = vec![false; population.len()];
        let mut selected = Vec::new();
        for (_, set) in ranked
        {
            let cost: Vec<usize> = set.iter()
                .copied()
                .filter(|&i| !taken[i] && population.vertex(i).is_eligible())
                .collect();
            if cost.is_empty() || cost.len() > left {
                continue;
            }
            left -= cost.len();
            for i in cost
            {
                taken[i] = true;
                selected.push(i);
            }
        }
        Ok(selected)
    }
}

/// All vaccination strategies an experiment can be configured with.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum VaccinationPolicy{
    TopTrait(TopTrait),
    TopConnector(TopConnector),
    Random(RandomVaccination),
    Community(CommunityVaccination),
    NeighborFlood(NeighborFlood),
    Ring(RingVaccination),
    CommunityConnector(CommunityConnector),
}

impl SelectVaccinees for VaccinationPolicy{
    fn select<R>(&self, population: &Population, ctx: &PolicyContext, rng: &mut R) -> Result<Vec<usize>, PolicyError>
    where R: Rng + ?Sized
    {
        match self
        {
            Self::TopTrait(p) => p.select(population, ctx, rng),
            Self::TopConnector(p) => p.select(population, ctx, rng),
            Self::Random(p) => p.select(population, ctx, rng),
            Self::Community(p) => p.select(population, ctx, rng),
            Self::NeighborFlood(p) => p.select(population, ctx, rng),
            Self::Ring(p) => p.select(population, ctx, rng),
            Self::CommunityConnector(p) => p.select(population, ctx, rng),
        }
    }
}

/// Lets `policy` choose from the simulation's population and vaccinates
/// the chosen vertices. Returns how many were newly vaccinated.
pub fn apply_policy<S, R>(
    sim: &mut Simulation<S>,
    policy: &VaccinationPolicy,
    ctx: &PolicyContext,
    rng: &mut R
) -> Result<usize, AppError>
where S: ContactSchedule,
    R: Rng + ?Sized
{
    let chosen = policy.select(sim.population(), ctx, rng)?;
    let newly = sim.apply_vaccination(&chosen)?;
    info!(
        "{} vaccinated {} vertices, {} in total",
        vaccination_naming_string(Some(policy)),
        newly,
        sim.population().vaccinated_count()
    );
    Ok(newly)
}

pub fn vaccination_naming_string(policy: Option<&VaccinationPolicy>) -> String
{
    match policy
    {
        None => "None".to_owned(),
        Some(VaccinationPolicy::TopTrait(p)) => {
            let side = if p.pick_high {"High"} else {"Low"};
            format!("Trait{}{side}B{}", p.trait_index, p.budget)
        },
        Some(VaccinationPolicy::TopConnector(p)) => format!("ConnectorB{}", p.budget),
        Some(VaccinationPolicy::Random(p)) => format!("RandomB{}", p.budget),
        Some(VaccinationPolicy::Community(p)) => format!("Community{}", p.community),
        Some(VaccinationPolicy::NeighborFlood(p)) => format!("Flood{}D{}", p.seed, p.depth),
        Some(VaccinationPolicy::Ring(p)) => {
            let target = match p.target_community
            {
                Some(c) => c.to_string(),
                None => "Each".to_owned()
            };
            let side = if p.pick_high {"High"} else {"Low"};
            format!("Ring{target}Trait{}{side}B{}", p.trait_index, p.budget)
        },
        Some(VaccinationPolicy::CommunityConnector(p)) => format!("CommConnectorB{}", p.budget),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::meta_graph::tests::chain;
    use crate::seir_model::static_sim::tests::{graph, population};
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn select_with(policy: &VaccinationPolicy, pop: &Population, g: &ContactGraph) -> Result<Vec<usize>, PolicyError>
    {
        let meta = CommunityMetaGraph::build(pop, g);
        let ctx = PolicyContext{full_graph: g, meta: Some(&meta)};
        let mut rng = Pcg64::seed_from_u64(11);
        policy.select(pop, &ctx, &mut rng)
    }

    #[test]
    fn top_trait_both_directions()
    {
        let (pop, g) = chain();
        let high = VaccinationPolicy::TopTrait(TopTrait{trait_index: 0, pick_high: true, budget: 2});
        assert_eq!(select_with(&high, &pop, &g).unwrap(), vec![5, 4]);
        let low = VaccinationPolicy::TopTrait(TopTrait{trait_index: 0, pick_high: false, budget: 2});
        assert_eq!(select_with(&low, &pop, &g).unwrap(), vec![0, 1]);

        let bad = VaccinationPolicy::TopTrait(TopTrait{trait_index: 3, pick_high: true, budget: 2});
        assert_eq!(select_with(&bad, &pop, &g), Err(PolicyError::TraitIndex{index: 3, available: 1}));
    }

    #[test]
    fn ties_keep_vertex_order()
    {
        let ranked = rank_by_key(&[0, 1, 2, 3], |i| if i == 2 {1.0} else {0.0}, true);
        assert_eq!(ranked, vec![2, 0, 1, 3]);
        let ranked = rank_by_key(&[0, 1, 2, 3], |i| if i == 2 {1.0} else {0.0}, false);
        assert_eq!(ranked, vec![0, 1, 3, 2]);
    }

    #[test]
    fn top_connector_skips_vaccinated()
    {
        let (mut pop, g) = chain();
        let meta = CommunityMetaGraph::build(&pop, &g);
        for (index, score) in connector_scores(&pop, &g, &meta).into_iter().enumerate() {
            pop.vertex_mut(index).connector_score = score;
        }
        pop.vaccinate(&[3]);
        let policy = VaccinationPolicy::TopConnector(TopConnector{budget: 1});
        // vertex 3 has the highest score but is already immune, 4 follows with 0.5 / 0.5
        assert_eq!(select_with(&policy, &pop, &g).unwrap(), vec![4]);
    }

    #[test]
    fn zero_weight_bridge_does_not_outrank_connectors()
    {
        let (mut pop, mut g) = chain();
        g.add_weighted_edge(4, 5, 0.0).unwrap();
        let meta = CommunityMetaGraph::build(&pop, &g);
        for (index, score) in connector_scores(&pop, &g, &meta).into_iter().enumerate() {
            pop.vertex_mut(index).connector_score = score;
        }
        let policy = VaccinationPolicy::TopConnector(TopConnector{budget: 2});
        // vertex 3 scores 1.5, vertex 4 scores 1.0, vertex 5 only has the empty bridge
        assert_eq!(select_with(&policy, &pop, &g).unwrap(), vec![3, 4]);
    }

    #[test]
    fn random_is_unique_eligible_and_reproducible()
    {
        let mut pop = population(20, 1);
        pop.vaccinate(&[0, 1, 2]);
        let g = graph(20, &[]);
        let policy = VaccinationPolicy::Random(RandomVaccination{budget: 10});
        let first = select_with(&policy, &pop, &g).unwrap();
        assert_eq!(first.len(), 10);
        let mut unique = first.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 10);
        assert!(first.iter().all(|&i| i > 2));
        assert_eq!(first, select_with(&policy, &pop, &g).unwrap());

        let greedy = VaccinationPolicy::Random(RandomVaccination{budget: 100});
        assert_eq!(select_with(&greedy, &pop, &g).unwrap().len(), 17);
    }

    #[test]
    fn community_is_unconditional()
    {
        let (pop, g) = chain();
        let policy = VaccinationPolicy::Community(CommunityVaccination{community: 1});
        assert_eq!(select_with(&policy, &pop, &g).unwrap(), vec![2, 3]);
        let missing = VaccinationPolicy::Community(CommunityVaccination{community: 8});
        assert_eq!(select_with(&missing, &pop, &g), Err(PolicyError::UnknownCommunity(8)));
    }

    #[test]
    fn flood_is_bounded_by_depth()
    {
        // path 0 - 1 - 2 - 3 - 4 plus a triangle at the start
        let g = graph(5, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0), (0, 2, 1.0)]);
        let pop = population(5, 1);
        let flood = |depth| {
            let policy = VaccinationPolicy::NeighborFlood(NeighborFlood{seed: "0".to_owned(), depth});
            let mut picked = select_with(&policy, &pop, &g).unwrap();
            picked.sort_unstable();
            picked
        };

        assert!(flood(0).is_empty());
        assert_eq!(flood(1), vec![1, 2]);
        assert_eq!(flood(2), vec![1, 2, 3]);
        assert_eq!(flood(9), vec![1, 2, 3, 4]);

        let unknown = VaccinationPolicy::NeighborFlood(NeighborFlood{seed: "x".to_owned(), depth: 1});
        assert_eq!(select_with(&unknown, &pop, &g), Err(PolicyError::UnknownVertex("x".to_owned())));
    }

    #[test]
    fn flood_handles_dense_graphs()
    {
        let n = 300;
        let mut edges = Vec::new();
        for a in 0..n {
            for b in a + 1..n {
                edges.push((a, b, 1.0));
            }
        }
        let g = graph(n, &edges);
        let pop = population(n, 1);
        let policy = VaccinationPolicy::NeighborFlood(NeighborFlood{seed: "7".to_owned(), depth: 50});
        assert_eq!(select_with(&policy, &pop, &g).unwrap().len(), n - 1);
    }

    #[test]
    fn connector_sets_are_whole_or_skipped()
    {
        let (pop, g) = chain();
        let policy = |budget| VaccinationPolicy::CommunityConnector(CommunityConnector{budget});
        // pair (0, 1) weighs 4 with bridge set {2, 3}, pair (1, 2) weighs 0.5 with {4}
        assert_eq!(select_with(&policy(2), &pop, &g).unwrap(), vec![2, 3]);
        assert_eq!(select_with(&policy(1), &pop, &g).unwrap(), vec![4]);
        assert_eq!(select_with(&policy(3), &pop, &g).unwrap(), vec![2, 3, 4]);
        assert!(select_with(&policy(0), &pop, &g).unwrap().is_empty());
    }

    #[test]
    fn applied_policy_survives_soft_reset()
    {
        use crate::seir_model::{StaticSimulation, SeirParams};
        let (pop, g) = chain();
        let meta = CommunityMetaGraph::build(&pop, &g);
        let ctx = PolicyContext{full_graph: &g, meta: Some(&meta)};
        let mut sim = StaticSimulation::new(g.clone(), pop, SeirParams::default()).unwrap();
        let mut rng = Pcg64::seed_from_u64(3);
        let policy = VaccinationPolicy::Community(CommunityVaccination{community: 0});
        assert_eq!(apply_policy(&mut sim, &policy, &ctx, &mut rng).unwrap(), 2);
        sim.reset(false);
        assert_eq!(sim.population().vaccinated_count(), 2);
        sim.reset(true);
        assert_eq!(sim.population().vaccinated_count(), 0);
    }

    #[test]
    fn policies_round_trip_as_json()
    {
        let policy = VaccinationPolicy::Ring(RingVaccination{
            target_community: None,
            budget: 5,
            trait_index: 1,
            pick_high: false
        });
        let s = serde_json::to_string(&policy).unwrap();
        let back: VaccinationPolicy = serde_json::from_str(&s).unwrap();
        assert_eq!(policy, back);
        assert_eq!(vaccination_naming_string(Some(&back)), "RingEachTrait1LowB5");
    }
}
