use {
    std::collections::BTreeMap,
    serde::{Serialize, Deserialize},
    super::*,
    crate::{
        error::PolicyError,
        misc_types::CommunityId,
        seir_model::Population,
    },
};

/// Splits `budget` vaccines over all communities proportionally to the
/// inverse meta-graph distance from `target`.
///
/// Shares are floored and capped at `capacity`. Each leftover dose goes to
/// the first community, in id order, that still has room, so the total is
/// `min(budget, sum of capacities)`. The target's distance to itself is 0,
/// it only receives leftover doses.
pub fn ring_partition(
    meta: &CommunityMetaGraph,
    capacity: &BTreeMap<CommunityId, usize>,
    target: CommunityId,
    budget: usize
) -> Result<BTreeMap<CommunityId, usize>, PolicyError>
{
    let t = meta.position(target)
        .ok_or(PolicyError::UnknownCommunity(target))?;
    let inverse: Vec<f64> = meta.distances_from(t)
        .iter()
        .enumerate()
        .map(|(pos, &d)| {
            if pos == t || d.is_infinite() {
                0.0
            } else {
                1.0 / d
            }
        })
        .collect();
    let total: f64 = inverse.iter().sum();
    if total <= 0.0 {
        return Err(PolicyError::UnreachableTarget(target));
    }

    let caps: Vec<usize> = meta.ids()
        .iter()
        .map(|id| capacity.get(id).copied().unwrap_or(0))
        .collect();
    let mut shares: Vec<usize> = inverse.iter()
        .zip(caps.iter())
        .map(|(inv, &cap)| {
            let share = (inv / total * budget as f64).floor() as usize;
            share.min(cap)
        })
        .collect();

    let mut left = budget.saturating_sub(shares.iter().sum());
    let n = shares.len();
    while left > 0 {
        match (0..n).find(|&pos| shares[pos] < caps[pos])
        {
            Some(pos) => {
                shares[pos] += 1;
                left -= 1;
            },
            None => break
        }
    }

    Ok(
        meta.ids()
            .iter()
            .copied()
            .zip(shares)
            .collect()
    )
}

/// Ring vaccination around one community. Within every community the
/// allotted doses go to the eligible members ranked by a centrality.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RingVaccination{
    /// `None` means every community is targeted in turn by the sweep
    pub target_community: Option<CommunityId>,
    pub budget: usize,
    pub trait_index: usize,
    pub pick_high: bool,
}

impl RingVaccination{
    pub fn with_target(&self, target: CommunityId) -> Self
    {
        Self{
            target_community: Some(target),
            ..self.clone()
        }
    }
}

impl SelectVaccinees for RingVaccination{
    fn select<R>(&self, population: &Population, ctx: &PolicyContext, _rng: &mut R) -> Result<Vec<usize>, PolicyError>
    where R: rand::Rng + ?Sized
    {
        let target = self.target_community.ok_or(PolicyError::MissingTarget)?;
        let meta = ctx.meta.ok_or(PolicyError::MissingMetaGraph)?;

        let eligible: BTreeMap<CommunityId, Vec<usize>> = meta.all_members()
            .iter()
            .map(|(&c, members)| {
                let list = members.iter()
                    .copied()
                    .filter(|&i| population.vertex(i).is_eligible())
                    .collect();
                (c, list)
            })
            .collect();
        let capacity = eligible.iter()
            .map(|(&c, list)| (c, list.len()))
            .collect();
        let partition = ring_partition(meta, &capacity, target, self.budget)?;

        let mut selected = Vec::with_capacity(self.budget);
        for (c, share) in partition
        {
            if share == 0 {
                continue;
            }
            let ranked = rank_by_trait(population, &eligible[&c], self.trait_index, self.pick_high)?;
            selected.extend_from_slice(&ranked[..share]);
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::meta_graph::tests::chain;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn full_capacity(meta: &CommunityMetaGraph) -> BTreeMap<CommunityId, usize>
    {
        meta.all_members()
            .iter()
            .map(|(&c, m)| (c, m.len()))
            .collect()
    }

    #[test]
    fn shares_sum_to_budget_or_capacity()
    {
        let (pop, g) = chain();
        let meta = CommunityMetaGraph::build(&pop, &g);
        let capacity = full_capacity(&meta);
        for budget in 0..10 {
            let part = ring_partition(&meta, &capacity, 0, budget).unwrap();
            let sum: usize = part.values().sum();
            assert_eq!(sum, budget.min(pop.len()));
            for (c, share) in part.iter() {
                assert!(*share <= capacity[c]);
            }
        }
    }

    #[test]
    fn nearer_communities_get_more()
    {
        let (pop, g) = chain();
        let meta = CommunityMetaGraph::build(&pop, &g);
        let capacity: BTreeMap<_, _> = meta.ids().iter().map(|&c| (c, 100)).collect();
        // inverse distances from 0: community 1 -> 4, community 2 -> 1 / 2.25
        let part = ring_partition(&meta, &capacity, 0, 15).unwrap();
        assert_eq!(part[&1], 13);
        assert_eq!(part[&2], 1);
        // leftover dose goes to the first community with room
        assert_eq!(part[&0], 1);
        assert_eq!(part[&3], 0);
    }

    #[test]
    fn leftover_fills_first_open_community()
    {
        let (pop, g) = chain();
        let meta = CommunityMetaGraph::build(&pop, &g);
        let capacity = BTreeMap::from([(0, 100), (1, 1), (2, 100), (3, 100)]);
        // community 1 capped at 1 instead of 22, community 2 gets floor(2.5)
        let part = ring_partition(&meta, &capacity, 0, 25).unwrap();
        assert_eq!(part[&1], 1);
        assert_eq!(part[&2], 2);
        assert_eq!(part[&0], 22);
        assert_eq!(part[&3], 0);

        // once community 0 is full the next one in id order takes over
        let capacity = BTreeMap::from([(0, 3), (1, 1), (2, 100), (3, 100)]);
        let part = ring_partition(&meta, &capacity, 0, 25).unwrap();
        assert_eq!(part[&0], 3);
        assert_eq!(part[&2], 21);
        assert_eq!(part[&3], 0);
    }

    #[test]
    fn degenerate_targets()
    {
        let (pop, g) = chain();
        let meta = CommunityMetaGraph::build(&pop, &g);
        let capacity = full_capacity(&meta);
        assert_eq!(ring_partition(&meta, &capacity, 3, 2), Err(PolicyError::UnreachableTarget(3)));
        assert_eq!(ring_partition(&meta, &capacity, 42, 2), Err(PolicyError::UnknownCommunity(42)));
    }

    #[test]
    fn ring_vaccinates_by_trait_within_communities()
    {
        let (pop, g) = chain();
        let meta = CommunityMetaGraph::build(&pop, &g);
        let ctx = PolicyContext{full_graph: &g, meta: Some(&meta)};
        let mut rng = Pcg64::seed_from_u64(1);
        let ring = RingVaccination{
            target_community: Some(0),
            budget: 3,
            trait_index: 0,
            pick_high: true
        };
        let mut picked = ring.select(&pop, &ctx, &mut rng).unwrap();
        picked.sort_unstable();
        // community 1 gets 2 (both members), the leftover goes to community 0, highest trait is vertex 1
        assert_eq!(picked, vec![1, 2, 3]);

        let untargeted = RingVaccination{target_community: None, ..ring.clone()};
        assert_eq!(untargeted.select(&pop, &ctx, &mut rng), Err(PolicyError::MissingTarget));
        let no_meta = PolicyContext{full_graph: &g, meta: None};
        assert_eq!(ring.select(&pop, &no_meta, &mut rng), Err(PolicyError::MissingMetaGraph));
    }
}
