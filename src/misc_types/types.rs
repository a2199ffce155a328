use{
    serde::{Serialize, Deserialize},
};

pub const DEFAULT_TRANSMISSION_PROB: f64 = 0.1;
pub const DEFAULT_LATENT_PERIOD: u32 = 1;
pub const DEFAULT_INFECTIOUS_PERIOD: u32 = 3;
pub const DEFAULT_CONTACTS_PER_HOUR: f64 = 3.0;
pub const DEFAULT_SEIR_SEED: u64 = 743;
pub const DEFAULT_NUM_TRIALS: usize = 100;
pub const DEFAULT_NUM_DAYS: usize = 150;
pub const DEFAULT_OUTBREAK_FRACTION: f64 = 0.2;
pub const DEFAULT_OUTBREAK_TRIAL_THRESHOLD: usize = 30;
pub const DEFAULT_MAX_DAYS: usize = 10_000;

/// convergence threshold of the trickle recurrence
pub const DEFAULT_F_THRESHOLD: f64 = 0.0000001;

/// number of graphs rotated through in the dynamic graph
pub const NUM_DAY_GRAPHS: usize = 5;

pub type CommunityId = i64;

/// Which contact graph(s) the simulation runs on
#[derive(Serialize, Deserialize, Clone, Debug, Copy, PartialEq, Eq)]
pub enum GraphMode{
    // full (union) graph, one averaged contact budget
    Static,
    // Monday..Friday graphs, rotated daily
    Dynamic,
}

impl GraphMode{
    pub fn name(self) -> &'static str
    {
        match self
        {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Copy, PartialEq, Eq)]
pub enum MeasureType {
    // total ever infected
    C,
    // recovered at termination
    R,
}

impl MeasureType{
    pub fn name(self) -> &'static str
    {
        match self{
            Self::C => "C",
            Self::R => "R",
        }
    }
}

/// Which vertices are used as patient zero
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum SeedSelection{
    All,
    Ids(Vec<String>),
    Community(CommunityId),
}

impl SeedSelection{
    pub fn name(&self) -> String
    {
        match self
        {
            Self::All => "all".to_owned(),
            Self::Ids(ids) => format!("ids{}", ids.len()),
            Self::Community(c) => format!("comm{c}"),
        }
    }
}
