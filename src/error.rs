//! Error types shared by the simulation core, the vaccination policies and
//! the experiment drivers.

use thiserror::Error;

use crate::misc_types::CommunityId;

/// Rejected run configuration. Raised before any simulation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("transmission probability must lie in [0, 1], got {0}")]
    TransmissionProbability(f64),

    #[error("infectious period must be at least one day")]
    InfectiousPeriod,

    #[error("contacts per hour must be finite and non-negative, got {0}")]
    ContactsPerHour(f64),

    #[error("convergence threshold must be finite and positive, got {0}")]
    ConvergenceThreshold(f64),

    #[error("max_days must be at least one")]
    MaxDays,

    #[error("num_trials must be at least one")]
    NumTrials,

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("vertex `{0}` is referenced but missing from the vertex table")]
    UnknownVertex(String),

    #[error("vertex `{0}` appears twice in the vertex table")]
    DuplicateVertex(String),

    #[error("self loop on vertex `{0}`")]
    SelfLoop(String),

    #[error("edge {a} - {b} has invalid weight {weight}")]
    InvalidWeight { a: String, b: String, weight: f64 },

    #[error("dynamic mode needs exactly {expected} day graphs, got {got}")]
    DayGraphCount { expected: usize, got: usize },

    #[error("graph has {graph} vertices but the population has {population}")]
    SizeMismatch { graph: usize, population: usize },

    #[error("start day {0} is outside the week")]
    StartDay(usize),

    #[error("adjacency error: {0}")]
    Adjacency(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("no vertex with id `{0}`")]
    UnknownSeed(String),

    #[error("previous run was not reset, call reset before seeding again")]
    ResetRequired,

    #[error("simulation was not seeded for this run mode")]
    NotSeeded,

    #[error("vaccination is only allowed between runs")]
    RunInProgress,

    #[error("seed vertex `{0}` is vaccinated")]
    SeedVaccinated(String),

    #[error("start day {0} is outside the week")]
    StartDay(usize),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("community {0} does not exist")]
    UnknownCommunity(CommunityId),

    #[error("community {0} has no path to any other community, cannot partition vaccines")]
    UnreachableTarget(CommunityId),

    #[error("trait index {index} out of range, vertices carry {available} traits")]
    TraitIndex { index: usize, available: usize },

    #[error("no vertex with id `{0}`")]
    UnknownVertex(String),

    #[error("policy needs the community meta graph")]
    MissingMetaGraph,

    #[error("ring vaccination needs a target community")]
    MissingTarget,
}

/// Everything an experiment subcommand can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("logger setup failed: {0}")]
    Logging(String),

    #[error("thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
