pub mod seir_states;
pub use seir_states::*;

pub mod contact_graph;
pub use contact_graph::*;

pub mod population;
pub use population::*;

pub mod week_clock;
pub use week_clock::*;

pub mod propagation;
pub use propagation::*;

pub mod static_sim;
pub use static_sim::*;

pub mod dynamic_sim;
pub use dynamic_sim::*;

pub mod seir_writer;
pub use seir_writer::*;
