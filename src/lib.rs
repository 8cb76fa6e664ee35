#![doc = "Flip-walk Markov chain sampling of districting plans"]
mod accept;
mod chain;
mod constraints;
mod error;
mod graph;
mod partition;
mod proposals;
mod updaters;

#[doc(inline)]
pub use graph::{AdjacencyJson, Edge, Graph, GraphSource, Grid};

#[doc(inline)]
pub use partition::{Flip, Partition, SwapSet};

#[doc(inline)]
pub use updaters::{CountySplits, RESERVED_NAMES, StatId, Updater, UpdaterSet, Updaters, Value};

#[doc(inline)]
pub use constraints::{
    Constraint, ConstraintKind, Score, Validator,
    lower_bound, upper_bound, upper_bound_from, within_percent_of_ideal_population,
};

#[doc(inline)]
pub use proposals::{Proposal, RandomFlip};

#[doc(inline)]
pub use accept::{Acceptance, AlwaysAccept, Metropolis};

#[doc(inline)]
pub use chain::{
    AcceptanceConfig, ChainConfig, ChainState, ConstraintConfig, MarkovChain,
    SelfLoopCounts, SelfLoopReason, basic_chain, default_chain, grid_chain,
};

#[doc(inline)]
pub use error::{ChainError, Result};
