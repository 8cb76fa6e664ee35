mod contiguity;
mod ops;
mod partition;
mod structures;

pub use ops::Flip;
pub(crate) use ops::Flips;
pub use partition::Partition;
pub use structures::SwapSet;
