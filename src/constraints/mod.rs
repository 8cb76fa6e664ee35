mod constraint;
mod score;
mod validator;

pub use constraint::{Constraint, ConstraintKind, lower_bound, upper_bound, upper_bound_from, within_percent_of_ideal_population};
pub use score::Score;
pub use validator::Validator;
