pub mod collection;
pub mod record;
pub mod utils;

// Re-export handler functions for use in routing
pub use collection::bulk;
pub use collection::create_full;
pub use collection::create_username_only;
pub use collection::list;

pub use record::delete as record_delete;
pub use record::get as record_get;
pub use record::put as record_put;
