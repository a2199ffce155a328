use {
    serde::{Serialize, Deserialize},
    std::collections::VecDeque,
};

/// Discrete state of a vertex during a stochastic run.
/// Exposed and Infectious carry the days left in that state.
#[derive(Clone, Debug, PartialEq, Eq, Copy)]
#[derive(Serialize, Deserialize)]
pub enum InfectionState{
    Susceptible,
    Exposed(u32),
    Infectious(u32),
    Recovered,
}
impl InfectionState{
    pub fn sus_check(&self) -> bool{
        matches!(self, InfectionState::Susceptible)
    }
}

impl Default for InfectionState{
    fn default() -> Self{
        InfectionState::Susceptible
    }
}

/// Expected-value state of a vertex during a trickle run.
///
/// `stages[a]` is the probability that the vertex was infected exactly `a`
/// days ago and has not yet recovered. Ages below the latent period are
/// exposed, the following `infectious_period` ages are infectious.
#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct TrickleState{
    pub not_infected: f64,
    pub stages: VecDeque<f64>,
    pub recovered: f64,
}

impl Default for TrickleState{
    fn default() -> Self{
        Self{
            not_infected: 1.0,
            stages: VecDeque::new(),
            recovered: 0.0
        }
    }
}

impl TrickleState{
    pub fn exposed_mass(&self, latent: usize) -> f64
    {
        self.stages.iter().take(latent).sum()
    }

    pub fn infectious_mass(&self, latent: usize) -> f64
    {
        self.stages.iter().skip(latent).sum()
    }

    /// ages all stages by one day, the oldest stage recovers and
    /// `newly_infected` becomes age zero
    pub fn age_one_day(&mut self, newly_infected: f64)
    {
        if let Some(oldest) = self.stages.pop_back(){
            self.recovered += oldest;
        }
        self.stages.push_front(newly_infected);
        self.not_infected -= newly_infected;
    }
}

/// Epidemic fields of one vertex. `EpiState::default()` is the
/// pre-any-run baseline that `reset(true)` restores.
#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct EpiState{
    pub state: InfectionState,
    pub vaccinated: bool,
    /// probability of remaining susceptible on contact, 0 once vaccinated
    pub immune_override: f64,
    pub ever_infected: bool,
    pub trickle: TrickleState,
}

pub const DEFAULT_IMMUNE_OVERRIDE: f64 = 1.0;

impl Default for EpiState{
    fn default() -> Self{
        Self{
            state: InfectionState::Susceptible,
            vaccinated: false,
            immune_override: DEFAULT_IMMUNE_OVERRIDE,
            ever_infected: false,
            trickle: TrickleState::default()
        }
    }
}

impl EpiState{
    pub fn vaccinate(&mut self)
    {
        self.vaccinated = true;
        self.immune_override = 0.0;
    }

    pub fn is_immune(&self) -> bool
    {
        self.vaccinated || self.immune_override == 0.0
    }

    /// clears everything a run wrote. Vaccination survives unless
    /// `affect_vaccinated` is set.
    pub fn reset(&mut self, affect_vaccinated: bool)
    {
        self.state = InfectionState::Susceptible;
        self.ever_infected = false;
        self.trickle = TrickleState::default();
        if affect_vaccinated{
            self.vaccinated = false;
            self.immune_override = DEFAULT_IMMUNE_OVERRIDE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_keeps_vaccination_unless_asked()
    {
        let mut epi = EpiState::default();
        epi.vaccinate();
        epi.ever_infected = true;
        epi.state = InfectionState::Recovered;

        epi.reset(false);
        assert!(epi.vaccinated);
        assert_eq!(epi.immune_override, 0.0);
        assert!(!epi.ever_infected);
        assert_eq!(epi.state, InfectionState::Susceptible);

        epi.reset(true);
        assert_eq!(epi, EpiState::default());
    }

    #[test]
    fn trickle_ageing_conserves_mass()
    {
        let mut t = TrickleState::default();
        t.stages.resize(3, 0.0);
        t.age_one_day(0.25);
        t.age_one_day(0.5);
        let total = t.not_infected + t.stages.iter().sum::<f64>() + t.recovered;
        assert!((total - 1.0).abs() < 1e-12);
        assert!((t.exposed_mass(1) - 0.5).abs() < 1e-12);
        assert!((t.infectious_mass(1) - 0.25).abs() < 1e-12);
    }
}
