mod chain;
mod config;
mod presets;
mod self_loops;

pub use chain::{ChainState, MarkovChain};
pub use config::{AcceptanceConfig, ChainConfig, ConstraintConfig};
pub use presets::{basic_chain, default_chain, grid_chain};
pub use self_loops::{SelfLoopCounts, SelfLoopReason};
