//! Database models split into domain-specific modules.

pub mod common;
pub mod lead;
pub mod like;
pub mod listing;
pub mod stats;
pub mod user;

pub use common::*;
pub use lead::*;
pub use like::*;
pub use listing::*;
pub use stats::*;
pub use user::*;
