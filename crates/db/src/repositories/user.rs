//! User repository for database operations.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};
use uuid::Uuid;

use crate::entities::users;
use rupi_core::user::{
    ContactKind, DEFAULT_AVATAR, NewUser, UserAccount, UserError, UserStore as UserStoreTrait,
};
use rupi_shared::types::UserId;

/// User repository implementation.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Map a write error, turning unique violations into the signup messages.
fn write_error(err: DbErr) -> UserError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        for (needle, message) in [
            ("username", "Username already taken"),
            ("email", "Email already registered"),
            ("phone", "Phone number already registered"),
        ] {
            if detail.contains(needle) {
                return UserError::validation(message);
            }
        }
    }
    UserError::repository(err.to_string())
}

fn read_error(err: DbErr) -> UserError {
    UserError::repository(err.to_string())
}

impl UserStoreTrait for UserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserAccount>, UserError> {
        let model = users::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(read_error)?;
        Ok(model.map(to_domain))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, UserError> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(read_error)?;
        Ok(model.map(to_domain))
    }

    async fn find_contact_owner(
        &self,
        kind: ContactKind,
        value: &str,
    ) -> Result<Option<UserId>, UserError> {
        let column = match kind {
            ContactKind::Email => users::Column::Email,
            ContactKind::Phone => users::Column::Phone,
        };
        let model = users::Entity::find()
            .filter(column.eq(value))
            .one(&self.db)
            .await
            .map_err(read_error)?;
        Ok(model.map(|m| UserId::from_uuid(m.id)))
    }

    async fn account_number_exists(&self, account_number: &str) -> Result<bool, UserError> {
        let count = users::Entity::find()
            .filter(users::Column::AccountNumber.eq(account_number))
            .count(&self.db)
            .await
            .map_err(read_error)?;
        Ok(count > 0)
    }

    async fn create(&self, input: NewUser) -> Result<UserAccount, UserError> {
        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            username: Set(input.username),
            full_name: Set(input.full_name),
            alias: Set(None),
            email: Set(input.email),
            phone: Set(input.phone),
            password_hash: Set(input.password_hash),
            pin_hash: Set(None),
            avatar: Set(DEFAULT_AVATAR.to_string()),
            email_verified: Set(false),
            account_number: Set(input.account_number),
            balance: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = user.insert(&self.db).await.map_err(write_error)?;
        Ok(to_domain(model))
    }

    async fn save(&self, user: &UserAccount) -> Result<(), UserError> {
        // balance is owned by the ledger and never written from here
        let active = users::ActiveModel {
            id: Set(user.id.into_inner()),
            full_name: Set(user.full_name.clone()),
            alias: Set(user.alias.clone()),
            email: Set(user.email.clone()),
            phone: Set(user.phone.clone()),
            password_hash: Set(user.password_hash.clone()),
            pin_hash: Set(user.pin_hash.clone()),
            avatar: Set(user.avatar.clone()),
            email_verified: Set(user.email_verified),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        active.update(&self.db).await.map_err(write_error)?;
        Ok(())
    }
}

/// Convert a database row to the domain account.
pub(crate) fn to_domain(model: users::Model) -> UserAccount {
    UserAccount {
        id: UserId::from_uuid(model.id),
        username: model.username,
        full_name: model.full_name,
        alias: model.alias,
        email: model.email,
        phone: model.phone,
        password_hash: model.password_hash,
        pin_hash: model.pin_hash,
        avatar: model.avatar,
        email_verified: model.email_verified,
        account_number: model.account_number,
        balance: model.balance,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
