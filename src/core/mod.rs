pub mod browser;
pub mod direct;
pub mod dump;
pub mod fetch_chain;
pub mod formatter;

pub use crate::domain::model::{ApiEnvelope, DrawResult};
pub use crate::domain::ports::DrawSource;
pub use crate::utils::error::Result;
