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
/// Repeated stochastic outbreaks from chosen seed vertices. Reports the
/// resistant count, the peak and the per day compartments
pub struct OutbreakTrials
{
    /// Specify the json file with the options
    /// If not given, an example json will be printed
    #[structopt(long)]
    json: Option<String>,

    /// Number of threads to use
    #[structopt(long)]
    num_threads: Option<NonZeroUsize>
}

impl OutbreakTrials {
    pub fn parse(&self) -> Result<(OutbreakTrialsParams, Value), AppError>
    {
        parse(self.json.as_ref())
    }

    pub fn execute(&self) -> Result<(), AppError>
    {
        let (param, json) = self.parse()?;
        super::execute::run_outbreak_trials(param, json, self.num_threads)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OutbreakTrialsParams
{
    pub campus: CampusParams,
    pub seeds: SeedSelection,
    /// accepted outbreaks per seed
    pub num_trials: usize,
    /// only the first `num_days` days enter the per day averages
    pub num_days: usize,
    /// a run with fewer resistant vertices than this fraction of the
    /// population is not an outbreak
    pub outbreak_fraction: f64,
    /// discarded runs in a row before a seed counts as "no outbreak"
    pub outbreak_trial_threshold: usize,
    pub vaccination: Option<VaccinationPolicy>,
    pub seir_seed: u64,
}

impl OutbreakTrialsParams
{
    pub fn validate(&self) -> Result<(), ConfigError>
    {
        self.campus.validate()?;
        if self.num_trials == 0 {
            return Err(ConfigError::NumTrials);
        }
        if !(0.0..=1.0).contains(&self.outbreak_fraction) {
            return Err(
                ConfigError::Invalid(
                    format!("outbreak_fraction must lie in [0, 1], got {}", self.outbreak_fraction)
                )
            );
        }
        Ok(())
    }

    /// minimum resistant count of an accepted outbreak
    pub fn outbreak_threshold(&self, population: usize) -> f64
    {
        (population as f64 * self.outbreak_fraction).floor()
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
            "v{}OutbreakTrials_{}_Vacc{}_Seeds{}Trials{}Days{}OF{}OT{}SS{}{j}",
            crate::VERSION,
            self.campus.name(),
            vaccination_naming_string(self.vaccination.as_ref()),
            self.seeds.name(),
            self.num_trials,
            self.num_days,
            self.outbreak_fraction,
            self.outbreak_trial_threshold,
            self.seir_seed
        )
    }
}

impl Default for OutbreakTrialsParams
{
    fn default() -> Self {
        Self{
            campus: CampusParams::default(),
            seeds: SeedSelection::Ids(vec!["0".to_owned()]),
            num_trials: DEFAULT_NUM_TRIALS,
            num_days: DEFAULT_NUM_DAYS,
            outbreak_fraction: DEFAULT_OUTBREAK_FRACTION,
            outbreak_trial_threshold: DEFAULT_OUTBREAK_TRIAL_THRESHOLD,
            vaccination: None,
            seir_seed: DEFAULT_SEIR_SEED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_named()
    {
        let param = OutbreakTrialsParams::default();
        param.validate().unwrap();
        assert_eq!(param.outbreak_threshold(1000), 200.0);
        let name = param.quick_name(None);
        assert!(name.contains("OutbreakTrials_dynamic"));
        assert!(name.ends_with("SS743"));
        assert!(param.quick_name(NonZeroUsize::new(2)).ends_with("SS743j2"));

        let json = serde_json::to_value(&param).unwrap();
        let back: OutbreakTrialsParams = parse_value(json).unwrap();
        assert_eq!(back.num_trials, DEFAULT_NUM_TRIALS);
    }

    #[test]
    fn rejects_bad_trials()
    {
        let mut param = OutbreakTrialsParams{num_trials: 0, ..Default::default()};
        assert_eq!(param.validate(), Err(ConfigError::NumTrials));
        param.num_trials = 3;
        param.outbreak_fraction = 1.5;
        assert!(matches!(param.validate(), Err(ConfigError::Invalid(_))));
    }
}
