use {
    std::collections::{BTreeMap, BTreeSet},
    crate::{
        misc_types::CommunityId,
        seir_model::{ContactGraph, Population},
    },
};

/// Coarse graph whose vertices are communities. Two communities are
/// joined by the summed weight of all individual edges between them.
#[derive(Clone, Debug)]
pub struct CommunityMetaGraph{
    ids: Vec<CommunityId>,
    position: BTreeMap<CommunityId, usize>,
    members: BTreeMap<CommunityId, Vec<usize>>,
    weights: Vec<Vec<f64>>,
    dist: Vec<Vec<f64>>,
}

impl CommunityMetaGraph{
    pub fn build(population: &Population, full_graph: &ContactGraph) -> Self
    {
        let members = population.communities();
        let ids: Vec<CommunityId> = members.keys().copied().collect();
        let position: BTreeMap<_, _> = ids.iter()
            .enumerate()
            .map(|(pos, &id)| (id, pos))
            .collect();

        let n = ids.len();
        let mut weights = vec![vec![0.0; n]; n];
        for (a, b, w) in full_graph.edges()
        {
            let ca = position[&population.vertex(a).community];
            let cb = position[&population.vertex(b).community];
            if ca != cb {
                weights[ca][cb] += w;
                weights[cb][ca] += w;
            }
        }
        let dist = floyd_warshall(&weights);

        Self{
            ids,
            position,
            members,
            weights,
            dist
        }
    }

    /// community ids, ascending
    pub fn ids(&self) -> &[CommunityId]
    {
        &self.ids
    }

    pub fn len(&self) -> usize
    {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.ids.is_empty()
    }

    pub fn position(&self, id: CommunityId) -> Option<usize>
    {
        self.position.get(&id).copied()
    }

    pub fn members(&self, id: CommunityId) -> Option<&[usize]>
    {
        self.members.get(&id).map(Vec::as_slice)
    }

    pub fn all_members(&self) -> &BTreeMap<CommunityId, Vec<usize>>
    {
        &self.members
    }

    /// summed crossing weight, 0 for unknown or unconnected pairs
    pub fn weight(&self, a: CommunityId, b: CommunityId) -> f64
    {
        match (self.position(a), self.position(b))
        {
            (Some(a), Some(b)) => self.weights[a][b],
            _ => 0.0
        }
    }

    /// shortest path length with edge length 1 / weight
    pub fn distance(&self, a: CommunityId, b: CommunityId) -> Option<f64>
    {
        Some(self.dist[self.position(a)?][self.position(b)?])
    }

    /// distance row of the community at `position`, indexed like `ids`
    pub fn distances_from(&self, position: usize) -> &[f64]
    {
        &self.dist[position]
    }

    /// For every ordered pair (x, y) of distinct communities the vertices
    /// of x with at least one edge into y.
    pub fn bridging_sets(&self, population: &Population, full_graph: &ContactGraph)
        -> BTreeMap<(CommunityId, CommunityId), BTreeSet<usize>>
    {
        let mut sets: BTreeMap<_, BTreeSet<usize>> = BTreeMap::new();
        for (index, vertex) in population.iter().enumerate()
        {
            for n_index in full_graph.neighbors(index)
            {
                let other = population.vertex(n_index).community;
                if other != vertex.community {
                    sets.entry((vertex.community, other))
                        .or_default()
                        .insert(index);
                }
            }
        }
        sets
    }
}

fn floyd_warshall(weights: &[Vec<f64>]) -> Vec<Vec<f64>>
{
    let n = weights.len();
    let mut dist: Vec<Vec<f64>> = weights.iter()
        .map(|row| {
            row.iter()
                .map(|&w| if w > 0.0 { 1.0 / w } else { f64::INFINITY })
                .collect()
        })
        .collect();
    for (i, row) in dist.iter_mut().enumerate()
    {
        row[i] = 0.0;
    }

    for k in 0..n {
        for i in 0..n {
            let via = dist[i][k];
            if via.is_infinite() {
                continue;
            }
            for j in 0..n {
                let candidate = via + dist[k][j];
                if candidate < dist[i][j] {
                    dist[i][j] = candidate;
                }
            }
        }
    }
    dist
}

/// Connector score (FC) of every vertex: for each foreign community c it
/// touches, the vertex's edge weight into c divided by the meta weight
/// between its own community and c, summed over all such c. Community pairs
/// with zero meta weight add nothing.
pub fn connector_scores(population: &Population, full_graph: &ContactGraph, meta: &CommunityMetaGraph) -> Vec<f64>
{
    let mut into: BTreeMap<CommunityId, f64> = BTreeMap::new();
    (0..population.len())
        .map(|index| {
            into.clear();
            let own = population.vertex(index).community;
            for (n_index, w) in full_graph.neighbors_weighted(index)
            {
                let other = population.vertex(n_index).community;
                if other != own {
                    *into.entry(other).or_insert(0.0) += w;
                }
            }
            into.iter()
                .filter_map(|(&c, &w)| {
                    let total = meta.weight(own, c);
                    (total > 0.0).then(|| w / total)
                })
                .sum::<f64>()
        })
        .collect()
}
