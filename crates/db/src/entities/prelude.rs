//! Entity re-exports.

pub use super::mutations::Entity as Mutations;
pub use super::otps::Entity as Otps;
pub use super::users::Entity as Users;
