//! `SeaORM` entities.

pub mod prelude;

pub mod mutations;
pub mod otps;
pub mod sea_orm_active_enums;
pub mod users;
