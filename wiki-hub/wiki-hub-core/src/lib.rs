pub mod auth;
pub mod error;
pub mod events;
pub mod paths;
pub mod relocation;

pub use error::{Result, WikiError};
