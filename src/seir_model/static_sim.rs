use {
    super::*,
    crate::error::*,
};

/// The full (union) graph, same adjacency on every day.
#[derive(Clone)]
pub struct StaticSchedule{
    graph: ContactGraph,
}

impl ContactSchedule for StaticSchedule{
    fn graph(&self) -> &ContactGraph
    {
        &self.graph
    }

    fn contact_budget(&self, vertex: &Vertex) -> u32
    {
        vertex.static_contacts
    }

    fn next_day(&mut self){}

    fn rewind(&mut self){}

    fn vertex_count(&self) -> usize
    {
        self.graph.vertex_count()
    }
}

pub type StaticSimulation = Simulation<StaticSchedule>;

impl Simulation<StaticSchedule>{
    pub fn new(graph: ContactGraph, population: Population, params: SeirParams) -> Result<Self, SimError>
    {
        Self::from_schedule(StaticSchedule{graph}, population, params)
    }

    pub fn graph(&self) -> &ContactGraph
    {
        &self.schedule().graph
    }
}
