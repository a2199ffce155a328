pub mod meta_graph;
pub use meta_graph::*;

pub mod policies;
pub use policies::*;

pub mod ring;
pub use ring::*;
