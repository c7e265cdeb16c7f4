pub mod posts;
pub mod sql;
pub mod users;
