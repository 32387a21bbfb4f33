pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::DatabaseError;
pub use memory::InMemoryProfileStore;
pub use models::profile::{NewProfile, Profile, ProfileUpdate};
pub use postgres::PgProfileStore;
pub use store::ProfileStore;
