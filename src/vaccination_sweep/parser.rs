use{
    structopt::StructOpt,
    serde::{Serialize, Deserialize},
    serde_json::Value,
    std::num::*,
    crate::{
        error::*,
        misc_types::*,
        json_parsing::*,
        population_input::CampusParams,
        vaccination::*,
    },
};

#[derive(Debug, StructOpt, Clone)]
/// Vaccinate with one policy, then seed every unvaccinated vertex once.
/// Ring vaccination without a target community targets every community
/// in turn and only seeds inside the targeted community
pub struct VaccinationSweep
{
    /// Specify the json file with the options
    /// If not given, an example json will be printed
    #[structopt(long)]
    json: Option<String>,

    /// Number of threads to use
    #[structopt(long)]
    num_threads: Option<NonZeroUsize>
}

impl VaccinationSweep {
    pub fn parse(&self) -> Result<(VaccinationSweepParams, Value), AppError>
    {
        parse(self.json.as_ref())
    }

    pub fn execute(&self) -> Result<(), AppError>
    {
        let (param, json) = self.parse()?;
        super::execute::run_vaccination_sweep(param, json, self.num_threads)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VaccinationSweepParams
{
    pub campus: CampusParams,
    pub vaccination: VaccinationPolicy,
    /// stochastic runs instead of the trickle recurrence
    pub monte_carlo: bool,
    /// used by stochastic runs and the random policy
    pub seir_seed: u64,
}

impl VaccinationSweepParams
{
    pub fn validate(&self) -> Result<(), ConfigError>
    {
        self.campus.validate()
    }

    pub fn measure_types(&self) -> [MeasureType; 2]
    {
        [MeasureType::C, MeasureType::R]
    }

    /// file name without ending
    pub fn quick_name(
        &self,
        num_threads: Option<NonZeroUsize>
    ) -> String
    {
        let j = match num_threads
        {
            None => "".to_owned(),
            Some(v) => format!("j{}", v)
        };
        let mode = if self.monte_carlo {
            format!("MonteCarloSS{}", self.seir_seed)
        } else {
            "Trickle".to_owned()
        };
        format!(
            "v{}VaccinationSweep_{}_Vacc{}_{mode}{j}",
            crate::VERSION,
            self.campus.name(),
            vaccination_naming_string(Some(&self.vaccination))
        )
    }
}

impl Default for VaccinationSweepParams
{
    fn default() -> Self {
        Self{
            campus: CampusParams::default(),
            vaccination: VaccinationPolicy::TopTrait(
                TopTrait{
                    trait_index: 0,
                    pick_high: true,
                    budget: 10
                }
            ),
            monte_carlo: false,
            seir_seed: DEFAULT_SEIR_SEED
        }
    }
}
