mod assignment;
mod swap_set;

pub(crate) use assignment::Assignment;
pub use swap_set::SwapSet;
