//! Profile reads and updates.

mod service;


pub use service::{ProfileService, ProfileUpdate};
