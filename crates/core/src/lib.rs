#![forbid(unsafe_code)]

pub mod aggregate;
pub mod classifier;
pub mod error;
pub mod model;
pub mod time;

pub use aggregate::{best_attempt, module_completion};
pub use classifier::{ScoreBand, classify, classify_value};
pub use error::Error;
pub use time::Clock;
