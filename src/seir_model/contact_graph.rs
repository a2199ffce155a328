use {
    serde::{Serialize, Deserialize},
    net_ensembles::{Graph, Node},
    std::collections::HashMap,
    crate::error::GraphError,
};

/// Node payload of a contact graph: the summed weight of all edges
/// touching the vertex.
#[derive(Clone, Debug, PartialEq, Default)]
#[derive(Serialize, Deserialize)]
pub struct ContactNode{
    pub strength: f64,
}

impl Node for ContactNode{
    fn new_from_index(_index: usize) -> Self{
        ContactNode::default()
    }
}

/// Immutable per-day snapshot of who meets whom and how intensely.
///
/// Vertex `i` of the graph is vertex `i` of the population it was built
/// for. Edges are undirected, the weight is stored once per vertex pair.
#[derive(Clone)]
pub struct ContactGraph{
    day: usize,
    graph: Graph<ContactNode>,
    weights: HashMap<(usize, usize), f64>,
}

#[inline]
fn pair_key(a: usize, b: usize) -> (usize, usize)
{
    if a < b { (a, b) } else { (b, a) }
}

impl ContactGraph{
    pub fn new(vertex_count: usize, day: usize) -> Self
    {
        Self{
            day,
            graph: Graph::new(vertex_count),
            weights: HashMap::new()
        }
    }

    /// Adds the edge `a - b`. A second edge between the same pair adds
    /// its weight to the existing one.
    pub fn add_weighted_edge(&mut self, a: usize, b: usize, weight: f64) -> Result<(), GraphError>
    {
        if a == b {
            return Err(GraphError::SelfLoop(a.to_string()));
        }
        let n = self.vertex_count();
        if a >= n || b >= n {
            return Err(GraphError::UnknownVertex(a.max(b).to_string()));
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(GraphError::InvalidWeight{a: a.to_string(), b: b.to_string(), weight});
        }
        let key = pair_key(a, b);
        match self.weights.get_mut(&key) {
            Some(w) => *w += weight,
            None => {
                self.graph.add_edge(a, b)
                    .map_err(|e| GraphError::Adjacency(format!("{e:?}")))?;
                self.weights.insert(key, weight);
            }
        }
        self.graph.at_mut(a).strength += weight;
        self.graph.at_mut(b).strength += weight;
        Ok(())
    }

    /// Union of several graphs over the same vertex set, weights summed
    /// per vertex pair.
    pub fn union<'a, I>(graphs: I, vertex_count: usize) -> Result<Self, GraphError>
    where I: IntoIterator<Item = &'a ContactGraph>
    {
        let mut res = Self::new(vertex_count, 0);
        for g in graphs {
            if g.vertex_count() != vertex_count {
                return Err(GraphError::SizeMismatch{graph: g.vertex_count(), population: vertex_count});
            }
            for (a, b, w) in g.edges() {
                res.add_weighted_edge(a, b, w)?;
            }
        }
        Ok(res)
    }

    pub fn day(&self) -> usize
    {
        self.day
    }

    pub fn vertex_count(&self) -> usize
    {
        self.graph.vertex_count()
    }

    pub fn edge_count(&self) -> usize
    {
        self.weights.len()
    }

    pub fn degree(&self, index: usize) -> usize
    {
        self.graph.degree(index).unwrap_or(0)
    }

    pub fn strength(&self, index: usize) -> f64
    {
        self.graph.at(index).strength
    }

    pub fn neighbors(&'_ self, index: usize) -> impl Iterator<Item=usize> + '_
    {
        self.graph
            .contained_iter_neighbors_with_index(index)
            .map(|(n_index, _)| n_index)
    }

    pub fn neighbors_weighted(&'_ self, index: usize) -> impl Iterator<Item=(usize, f64)> + '_
    {
        self.neighbors(index)
            .map(move |n_index| (n_index, self.weight(index, n_index)))
    }

    /// weight of the edge `a - b`, 0 if there is none
    pub fn weight(&self, a: usize, b: usize) -> f64
    {
        self.weights
            .get(&pair_key(a, b))
            .copied()
            .unwrap_or(0.0)
    }

    /// every edge once as `(smaller index, larger index, weight)`,
    /// sorted by index pair
    pub fn edges(&self) -> Vec<(usize, usize, f64)>
    {
        let mut edges: Vec<_> = self.weights
            .iter()
            .map(|(&(a, b), &w)| (a, b, w))
            .collect();
        edges.sort_unstable_by_key(|&(a, b, _)| (a, b));
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_edges_merge()
    {
        let mut g = ContactGraph::new(3, 2);
        g.add_weighted_edge(0, 1, 1.5).unwrap();
        g.add_weighted_edge(1, 0, 0.5).unwrap();
        g.add_weighted_edge(1, 2, 1.0).unwrap();

        assert_eq!(g.day(), 2);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.degree(1), 2);
        assert_eq!(g.weight(0, 1), 2.0);
        assert_eq!(g.weight(0, 2), 0.0);
        assert_eq!(g.strength(1), 3.0);
        let mut n: Vec<_> = g.neighbors(1).collect();
        n.sort_unstable();
        assert_eq!(n, vec![0, 2]);
    }

    #[test]
    fn rejects_bad_edges()
    {
        let mut g = ContactGraph::new(2, 0);
        assert!(matches!(g.add_weighted_edge(1, 1, 1.0), Err(GraphError::SelfLoop(_))));
        assert!(matches!(g.add_weighted_edge(0, 5, 1.0), Err(GraphError::UnknownVertex(_))));
        assert!(matches!(g.add_weighted_edge(0, 1, -1.0), Err(GraphError::InvalidWeight{..})));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn union_sums_weights()
    {
        let mut mon = ContactGraph::new(3, 0);
        mon.add_weighted_edge(0, 1, 1.0).unwrap();
        let mut tue = ContactGraph::new(3, 1);
        tue.add_weighted_edge(0, 1, 2.0).unwrap();
        tue.add_weighted_edge(1, 2, 1.0).unwrap();

        let full = ContactGraph::union([&mon, &tue], 3).unwrap();
        assert_eq!(full.edges(), vec![(0, 1, 3.0), (1, 2, 1.0)]);
    }
}
