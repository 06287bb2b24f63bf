pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod services;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use db::{MemoryStore, PgStore, Store};
pub use error::{Result, ServiceError};
pub use models::{
    AdminAction, BorrowAction, BorrowRequest, BorrowStatus, FlaggingRule, Item, RuleKind, User,
    UserReport,
};
pub use services::{
    BorrowEvent, BorrowService, NotificationDispatcher, SuspensionPolicy, TrustSafetyService,
};
