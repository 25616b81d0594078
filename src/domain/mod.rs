pub mod error;
pub mod model;
pub mod raffle;
pub mod repository;
