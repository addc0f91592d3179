pub mod error;
pub mod memory;
pub mod store;
pub mod supabase;
pub mod supabase_store;
pub mod timed;

pub use error::StoreError;
pub use memory::{FixtureData, InMemoryStore};
pub use store::SchedulingStore;
pub use supabase::SupabaseClient;
pub use supabase_store::SupabaseStore;
pub use timed::TimedStore;
