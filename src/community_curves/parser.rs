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
/// Trickle runs from every member of every community, averaged per
/// community: peak, peak day and the mean S, E, I, R curves
pub struct CommunityCurves
{
    /// Specify the json file with the options
    /// If not given, an example json will be printed
    #[structopt(long)]
    json: Option<String>,

    /// Number of threads to use
    #[structopt(long)]
    num_threads: Option<NonZeroUsize>
}

impl CommunityCurves {
    pub fn parse(&self) -> Result<(CommunityCurvesParams, Value), AppError>
    {
        parse(self.json.as_ref())
    }

    pub fn execute(&self) -> Result<(), AppError>
    {
        let (param, json) = self.parse()?;
        super::execute::run_community_curves(param, json, self.num_threads)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CommunityCurvesParams
{
    pub campus: CampusParams,
    /// applied once before any community is swept
    pub vaccination: Option<VaccinationPolicy>,
    /// only used by the random policy
    pub vaccine_seed: u64,
}

impl CommunityCurvesParams
{
    pub fn validate(&self) -> Result<(), ConfigError>
    {
        self.campus.validate()
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
        format!(
            "v{}CommunityCurves_{}_Vacc{}VS{}{j}",
            crate::VERSION,
            self.campus.name(),
            vaccination_naming_string(self.vaccination.as_ref()),
            self.vaccine_seed
        )
    }
}

impl Default for CommunityCurvesParams
{
    fn default() -> Self {
        Self{
            campus: CampusParams{
                graph_mode: GraphMode::Static,
                ..CampusParams::default()
            },
            vaccination: None,
            vaccine_seed: DEFAULT_SEIR_SEED
        }
    }
}
