//! Repository implementations of the core store traits.
//!
//! Repositories hide the `SeaORM` details from the services that use them.

pub mod mutation;
pub mod otp;
pub mod user;

pub use mutation::MutationRepository;
pub use otp::OtpRepository;
pub use user::UserRepository;
