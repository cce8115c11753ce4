//! REST API operations

mod custom_tags;
mod entities;
pub mod query;

pub use custom_tags::*;
pub use entities::*;
