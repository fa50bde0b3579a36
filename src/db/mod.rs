pub mod applicationdb;
pub mod db;
pub mod error;
pub mod jobdb;
pub mod memory;
pub mod notificationdb;
pub mod reviewdb;
pub mod userdb;

pub use applicationdb::ApplicationExt;
pub use db::DBClient;
pub use error::StoreError;
pub use jobdb::JobExt;
pub use memory::MemoryStore;
pub use notificationdb::NotificationExt;
pub use reviewdb::ReviewExt;
pub use userdb::UserExt;

/// Everything the services need from persistence. Implemented by the Postgres
/// client and the in-memory store.
pub trait MarketStore:
    UserExt + JobExt + ApplicationExt + ReviewExt + NotificationExt + std::fmt::Debug + Send + Sync
{
}

impl<T> MarketStore for T where
    T: UserExt
        + JobExt
        + ApplicationExt
        + ReviewExt
        + NotificationExt
        + std::fmt::Debug
        + Send
        + Sync
{
}
