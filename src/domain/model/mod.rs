mod assignment;
mod group;

pub use assignment::Assignment;
pub use group::{Group, RaffleStatus};
