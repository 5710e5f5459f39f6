pub mod ingest;
pub mod user;

pub use ingest::*;
pub use user::*;
