//! MongoDB persistence implementation

mod assignment_repo;
mod connection;
mod group_repo;

pub use assignment_repo::MongoAssignmentRepository;
pub use connection::{init_mongodb, MongoConnection};
pub use group_repo::MongoGroupRepository;
