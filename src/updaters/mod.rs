mod boundaries;
mod compactness;
mod counties;
mod cut_edges;
mod election;
mod registry;
mod tally;
mod value;

pub use counties::CountySplits;
pub use registry::{RESERVED_NAMES, StatId, Updater, UpdaterSet, Updaters};
pub use value::Value;
