mod flip;

pub use flip::Flip;
pub(crate) use flip::Flips;
