use {
    std::collections::{BTreeMap, HashMap},
    super::seir_states::*,
    crate::{
        error::GraphError,
        misc_types::*,
    },
};

/// One individual: static metadata from the loader plus the epidemic
/// fields the simulations write.
#[derive(Clone, Debug)]
pub struct Vertex{
    pub id: String,
    /// precomputed trait values, only used as sort keys by vaccination policies
    pub centralities: Vec<f64>,
    pub community: CommunityId,
    pub contacts_per_day: [u32; NUM_DAY_GRAPHS],
    /// contact budget of the static (full graph) simulation
    pub static_contacts: u32,
    /// weekday at which this vertex's personal week begins
    pub start_day: usize,
    pub connector_score: f64,
    epi: EpiState,
}

impl Vertex{
    pub fn new(id: impl Into<String>, community: CommunityId) -> Self
    {
        Self{
            id: id.into(),
            centralities: Vec::new(),
            community,
            contacts_per_day: [0; NUM_DAY_GRAPHS],
            static_contacts: 0,
            start_day: 0,
            connector_score: 0.0,
            epi: EpiState::default()
        }
    }

    /// same budget on every weekday and in static mode
    pub fn with_uniform_contacts(mut self, contacts: u32) -> Self
    {
        self.contacts_per_day = [contacts; NUM_DAY_GRAPHS];
        self.static_contacts = contacts;
        self
    }

    pub fn with_centralities(mut self, centralities: Vec<f64>) -> Self
    {
        self.centralities = centralities;
        self
    }

    /// Contact budgets from the hours spent in class on each weekday.
    /// The static budget is the rounded weekly average.
    pub fn set_contacts_by_duration(&mut self, class_hours: &[f64; NUM_DAY_GRAPHS], contacts_per_hour: f64)
    {
        let mut sum = 0.0;
        for (slot, hours) in self.contacts_per_day.iter_mut().zip(class_hours.iter())
        {
            let contacts = hours * contacts_per_hour;
            sum += contacts;
            *slot = round_contacts(contacts);
        }
        self.static_contacts = round_contacts(sum / NUM_DAY_GRAPHS as f64);
    }

    pub fn epi(&self) -> &EpiState
    {
        &self.epi
    }

    pub(crate) fn epi_mut(&mut self) -> &mut EpiState
    {
        &mut self.epi
    }

    pub fn state(&self) -> InfectionState
    {
        self.epi.state
    }

    pub fn is_vaccinated(&self) -> bool
    {
        self.epi.vaccinated
    }

    pub fn ever_infected(&self) -> bool
    {
        self.epi.ever_infected
    }

    /// not vaccinated and not infected in the current run
    pub fn is_eligible(&self) -> bool
    {
        !self.epi.is_immune() && !self.epi.ever_infected
    }
}

fn round_contacts(contacts: f64) -> u32
{
    if contacts.is_finite() && contacts > 0.0 {
        contacts.round() as u32
    } else {
        0
    }
}

/// Compartment sizes of one day. Counts in stochastic mode, expected
/// counts in trickle mode.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DayCounts{
    pub s: f64,
    pub e: f64,
    pub i: f64,
    pub r: f64,
}

impl DayCounts{
    pub fn total(&self) -> f64
    {
        self.s + self.e + self.i + self.r
    }

    pub fn as_array(&self) -> [f64; 4]
    {
        [self.s, self.e, self.i, self.r]
    }
}

/// The vertex table shared by every run of an experiment.
#[derive(Clone, Debug, Default)]
pub struct Population{
    vertices: Vec<Vertex>,
    lookup: HashMap<String, usize>,
}

impl Population{
    pub fn new(vertices: Vec<Vertex>) -> Result<Self, GraphError>
    {
        let mut lookup = HashMap::with_capacity(vertices.len());
        for (index, v) in vertices.iter().enumerate()
        {
            if v.start_day >= NUM_DAY_GRAPHS {
                return Err(GraphError::StartDay(v.start_day));
            }
            if lookup.insert(v.id.clone(), index).is_some(){
                return Err(GraphError::DuplicateVertex(v.id.clone()));
            }
        }
        Ok(
            Self{
                vertices,
                lookup
            }
        )
    }

    pub fn len(&self) -> usize
    {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.vertices.is_empty()
    }

    /// Index of the vertex with this id. A missing id is a broken
    /// input, never skipped.
    pub fn index_of(&self, id: &str) -> Result<usize, GraphError>
    {
        self.lookup
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownVertex(id.to_owned()))
    }

    pub fn vertex(&self, index: usize) -> &Vertex
    {
        &self.vertices[index]
    }

    pub fn vertex_mut(&mut self, index: usize) -> &mut Vertex
    {
        &mut self.vertices[index]
    }

    pub fn vertices(&self) -> &[Vertex]
    {
        &self.vertices
    }

    pub fn iter(&self) -> impl Iterator<Item=&Vertex>
    {
        self.vertices.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item=&mut Vertex>
    {
        self.vertices.iter_mut()
    }

    /// members of each community in vertex index order
    pub fn communities(&self) -> BTreeMap<CommunityId, Vec<usize>>
    {
        let mut map: BTreeMap<CommunityId, Vec<usize>> = BTreeMap::new();
        for (index, v) in self.vertices.iter().enumerate()
        {
            map.entry(v.community).or_default().push(index);
        }
        map
    }

    /// Marks the given vertices vaccinated, returns how many were not
    /// vaccinated before.
    pub fn vaccinate(&mut self, indices: &[usize]) -> usize
    {
        let mut newly = 0;
        for &index in indices
        {
            let epi = self.vertices[index].epi_mut();
            if !epi.vaccinated {
                newly += 1;
            }
            epi.vaccinate();
        }
        newly
    }

    pub fn vaccinated_count(&self) -> usize
    {
        self.vertices.iter().filter(|v| v.is_vaccinated()).count()
    }

    pub fn reset(&mut self, affect_vaccinated: bool)
    {
        self.vertices
            .iter_mut()
            .for_each(|v| v.epi_mut().reset(affect_vaccinated));
    }

    /// true if every vertex is in the pre-any-run state
    pub fn is_baseline(&self) -> bool
    {
        let baseline = EpiState::default();
        self.vertices.iter().all(|v| *v.epi() == baseline)
    }

    /// compartment counts of the discrete states
    pub fn discrete_counts(&self) -> DayCounts
    {
        let mut counts = DayCounts::default();
        for v in self.vertices.iter()
        {
            match v.state()
            {
                InfectionState::Susceptible => counts.s += 1.0,
                InfectionState::Exposed(_) => counts.e += 1.0,
                InfectionState::Infectious(_) => counts.i += 1.0,
                InfectionState::Recovered => counts.r += 1.0,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contacts_by_duration()
    {
        let mut v = Vertex::new("a", 0);
        v.set_contacts_by_duration(&[1.5, 0.0, 1.0, 0.0, 2.0], 3.0);
        assert_eq!(v.contacts_per_day, [5, 0, 3, 0, 6]);
        // (4.5 + 3 + 6) / 5 = 2.7
        assert_eq!(v.static_contacts, 3);
    }

    #[test]
    fn lookup_fails_fast()
    {
        let pop = Population::new(vec![Vertex::new("a", 0), Vertex::new("b", 1)]).unwrap();
        assert_eq!(pop.index_of("b"), Ok(1));
        assert_eq!(pop.index_of("zz"), Err(GraphError::UnknownVertex("zz".to_owned())));

        let dup = Population::new(vec![Vertex::new("a", 0), Vertex::new("a", 1)]);
        assert!(matches!(dup, Err(GraphError::DuplicateVertex(_))));
    }

    #[test]
    fn vaccinate_and_reset()
    {
        let mut pop = Population::new(
            (0..4).map(|i| Vertex::new(i.to_string(), i % 2)).collect()
        ).unwrap();
        assert_eq!(pop.vaccinate(&[1, 3, 3]), 2);
        assert_eq!(pop.vaccinated_count(), 2);
        assert_eq!(pop.communities()[&1], vec![1, 3]);

        pop.reset(false);
        assert_eq!(pop.vaccinated_count(), 2);
        assert!(!pop.is_baseline());
        pop.reset(true);
        assert!(pop.is_baseline());
    }
}
