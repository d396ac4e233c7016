pub mod initdb;
pub mod scheduler;
pub mod serve;

pub use initdb::init_database;
pub use scheduler::{build_runner, run_scheduler, tick};
pub use serve::serve;
