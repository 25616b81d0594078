mod group_service;
mod raffle_service;

pub use group_service::GroupService;
pub use raffle_service::{AssignmentView, RaffleOutcome, RaffleService, ServiceResult};
