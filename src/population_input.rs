//! JSON description of a campus: the vertex table, the weekday contact
//! graphs and optionally the full graph.

use {
    serde::{Serialize, Deserialize},
    log::{info, debug},
    crate::{
        error::*,
        misc_types::*,
        seir_model::*,
        vaccination::{CommunityMetaGraph, PolicyContext, connector_scores},
        json_parsing::read_json,
    },
};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VertexRecord{
    pub id: String,
    #[serde(default)]
    pub centralities: Vec<f64>,
    pub community: CommunityId,
    /// hours in class on Monday..Friday
    #[serde(default)]
    pub class_hours: [f64; NUM_DAY_GRAPHS],
    #[serde(default)]
    pub start_day: usize,
    #[serde(default)]
    pub connector_score: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EdgeRecord{
    pub a: String,
    pub b: String,
    pub weight: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct PopulationInput{
    pub vertices: Vec<VertexRecord>,
    /// if missing, the union of the day graphs is used
    #[serde(default)]
    pub full_edges: Option<Vec<EdgeRecord>>,
    /// one edge list per weekday, Monday first
    #[serde(default)]
    pub day_edges: Vec<Vec<EdgeRecord>>,
}

/// Where the campus comes from and how the disease behaves on it. Shared
/// by all experiments.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CampusParams{
    pub population_file: String,
    pub graph_mode: GraphMode,
    pub disease: SeirParams,
    pub contacts_per_hour: f64,
}

impl Default for CampusParams{
    fn default() -> Self
    {
        Self{
            population_file: "campus.json".to_owned(),
            graph_mode: GraphMode::Dynamic,
            disease: SeirParams::default(),
            contacts_per_hour: DEFAULT_CONTACTS_PER_HOUR
        }
    }
}

impl CampusParams{
    pub fn validate(&self) -> Result<(), ConfigError>
    {
        self.disease.validate()?;
        let cph = self.contacts_per_hour;
        if !cph.is_finite() || cph < 0.0 {
            return Err(ConfigError::ContactsPerHour(cph));
        }
        Ok(())
    }

    pub fn load(&self) -> Result<Campus, AppError>
    {
        self.validate()?;
        PopulationInput::from_file(&self.population_file)?
            .build(self.contacts_per_hour)
    }

    /// part of the output file names
    pub fn name(&self) -> String
    {
        format!(
            "{}T{}L{}I{}CPH{}",
            self.graph_mode.name(),
            self.disease.transmission_prob,
            self.disease.latent_period,
            self.disease.infectious_period,
            self.contacts_per_hour
        )
    }
}

/// Everything an experiment needs from the input file.
#[derive(Clone)]
pub struct Campus{
    pub population: Population,
    pub full_graph: ContactGraph,
    /// empty if the input only has a full graph
    pub day_graphs: Vec<ContactGraph>,
    pub meta: CommunityMetaGraph,
}

impl Campus{
    pub fn has_day_graphs(&self) -> bool
    {
        self.day_graphs.len() == NUM_DAY_GRAPHS
    }

    pub fn static_simulation(&self, params: SeirParams) -> Result<StaticSimulation, SimError>
    {
        StaticSimulation::new(self.full_graph.clone(), self.population.clone(), params)
    }

    pub fn dynamic_simulation(&self, params: SeirParams) -> Result<DynamicSimulation, SimError>
    {
        DynamicSimulation::new(self.day_graphs.clone(), self.population.clone(), params)
    }

    pub fn policy_context(&self) -> PolicyContext<'_>
    {
        PolicyContext{
            full_graph: &self.full_graph,
            meta: Some(&self.meta)
        }
    }

    /// Vertex indices of the chosen seeds, in vertex order for `All` and
    /// `Community`, in the given order for `Ids`.
    pub fn seed_indices(&self, selection: &SeedSelection) -> Result<Vec<usize>, AppError>
    {
        let indices: Vec<usize> = match selection
        {
            SeedSelection::All => (0..self.population.len()).collect(),
            SeedSelection::Ids(ids) => ids.iter()
                .map(|id| self.population.index_of(id))
                .collect::<Result<Vec<_>, _>>()?,
            SeedSelection::Community(c) => self.meta
                .members(*c)
                .ok_or(PolicyError::UnknownCommunity(*c))?
                .to_vec()
        };
        Ok(indices)
    }
}

impl PopulationInput{
    pub fn from_file(path: &str) -> Result<Self, AppError>
    {
        read_json(path)
    }

    pub fn build(&self, contacts_per_hour: f64) -> Result<Campus, AppError>
    {
        if !contacts_per_hour.is_finite() || contacts_per_hour < 0.0 {
            return Err(ConfigError::ContactsPerHour(contacts_per_hour).into());
        }

        let vertices = self.vertices
            .iter()
            .map(|rec| {
                let mut v = Vertex::new(rec.id.clone(), rec.community)
                    .with_centralities(rec.centralities.clone());
                v.set_contacts_by_duration(&rec.class_hours, contacts_per_hour);
                v.start_day = rec.start_day;
                v.connector_score = rec.connector_score.unwrap_or(0.0);
                v
            })
            .collect();
        let mut population = Population::new(vertices)?;
        let n = population.len();

        if !self.day_edges.is_empty() && self.day_edges.len() != NUM_DAY_GRAPHS {
            return Err(
                GraphError::DayGraphCount{
                    expected: NUM_DAY_GRAPHS,
                    got: self.day_edges.len()
                }.into()
            );
        }
        let day_graphs = self.day_edges
            .iter()
            .enumerate()
            .map(|(day, edges)| build_graph(&population, edges, day))
            .collect::<Result<Vec<_>, _>>()?;

        let full_graph = match &self.full_edges
        {
            Some(edges) => build_graph(&population, edges, 0)?,
            None if !day_graphs.is_empty() => ContactGraph::union(day_graphs.iter(), n)?,
            None => return Err(
                GraphError::DayGraphCount{
                    expected: NUM_DAY_GRAPHS,
                    got: 0
                }.into()
            )
        };

        let meta = CommunityMetaGraph::build(&population, &full_graph);
        if self.vertices.iter().any(|rec| rec.connector_score.is_none()) {
            debug!("computing missing connector scores");
            let scores = connector_scores(&population, &full_graph, &meta);
            for (index, rec) in self.vertices.iter().enumerate()
            {
                if rec.connector_score.is_none() {
                    population.vertex_mut(index).connector_score = scores[index];
                }
            }
        }

        info!(
            "campus with {} vertices, {} communities, {} edges in the full graph, {} day graphs",
            n,
            meta.len(),
            full_graph.edge_count(),
            day_graphs.len()
        );

        Ok(
            Campus{
                population,
                full_graph,
                day_graphs,
                meta
            }
        )
    }
}

fn build_graph(population: &Population, edges: &[EdgeRecord], day: usize) -> Result<ContactGraph, GraphError>
{
    let mut graph = ContactGraph::new(population.len(), day);
    for edge in edges
    {
        let a = population.index_of(&edge.a)?;
        let b = population.index_of(&edge.b)?;
        if a == b {
            return Err(GraphError::SelfLoop(edge.a.clone()));
        }
        if !edge.weight.is_finite() || edge.weight < 0.0 {
            return Err(
                GraphError::InvalidWeight{
                    a: edge.a.clone(),
                    b: edge.b.clone(),
                    weight: edge.weight
                }
            );
        }
        graph.add_weighted_edge(a, b, edge.weight)?;
    }
    Ok(graph)
}
