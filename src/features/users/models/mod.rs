mod user;

pub use user::{NewUser, UserRecord, UserRole, UserStatus};
