pub mod models;
pub mod state;

pub use models::{Credentials, ProfileUpdate, Registration, Role, User};
pub use state::{AuthOperation, AuthStore};
