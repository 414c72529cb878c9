//! One-time code repository for database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::entities::{otps, sea_orm_active_enums::OtpPurpose as DbOtpPurpose};
use rupi_core::otp::{OtpPurpose, OtpRecord, OtpStore as OtpStoreTrait};
use rupi_core::user::UserError;
use rupi_shared::types::{OtpId, UserId};

/// OTP repository implementation.
#[derive(Debug, Clone)]
pub struct OtpRepository {
    db: DatabaseConnection,
}

impl OtpRepository {
    /// Creates a new OTP repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn repo_error(err: DbErr) -> UserError {
    UserError::repository(err.to_string())
}

impl OtpStoreTrait for OtpRepository {
    async fn find(
        &self,
        user_id: UserId,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>, UserError> {
        let model = otps::Entity::find()
            .filter(otps::Column::UserId.eq(user_id.into_inner()))
            .filter(otps::Column::Purpose.eq(to_db_purpose(purpose)))
            .one(&self.db)
            .await
            .map_err(repo_error)?;
        Ok(model.map(to_domain))
    }

    /// Delete-then-insert in one transaction. A concurrent replace for the
    /// same pair trips `uq_otps_user_purpose` and fails instead of leaving
    /// two live codes.
    async fn replace(&self, record: OtpRecord) -> Result<(), UserError> {
        let txn = self.db.begin().await.map_err(repo_error)?;

        otps::Entity::delete_many()
            .filter(otps::Column::UserId.eq(record.user_id.into_inner()))
            .filter(otps::Column::Purpose.eq(to_db_purpose(record.purpose)))
            .exec(&txn)
            .await
            .map_err(repo_error)?;

        otps::ActiveModel {
            id: Set(record.id.into_inner()),
            user_id: Set(record.user_id.into_inner()),
            purpose: Set(to_db_purpose(record.purpose)),
            code_hash: Set(record.code_hash),
            pending_value: Set(record.pending_value),
            expires_at: Set(record.expires_at.into()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .map_err(repo_error)?;

        txn.commit().await.map_err(repo_error)
    }

    async fn delete(&self, user_id: UserId, purpose: OtpPurpose) -> Result<(), UserError> {
        otps::Entity::delete_many()
            .filter(otps::Column::UserId.eq(user_id.into_inner()))
            .filter(otps::Column::Purpose.eq(to_db_purpose(purpose)))
            .exec(&self.db)
            .await
            .map_err(repo_error)?;
        Ok(())
    }
}

/// Convert domain purpose to database enum.
fn to_db_purpose(purpose: OtpPurpose) -> DbOtpPurpose {
    match purpose {
        OtpPurpose::ChangeEmail => DbOtpPurpose::ChangeEmail,
        OtpPurpose::ChangePhone => DbOtpPurpose::ChangePhone,
        OtpPurpose::VerifyEmail => DbOtpPurpose::VerifyEmail,
        OtpPurpose::ForgotPassword => DbOtpPurpose::ForgotPassword,
    }
}

/// Convert database purpose to domain enum.
fn from_db_purpose(purpose: DbOtpPurpose) -> OtpPurpose {
    match purpose {
        DbOtpPurpose::ChangeEmail => OtpPurpose::ChangeEmail,
        DbOtpPurpose::ChangePhone => OtpPurpose::ChangePhone,
        DbOtpPurpose::VerifyEmail => OtpPurpose::VerifyEmail,
        DbOtpPurpose::ForgotPassword => OtpPurpose::ForgotPassword,
    }
}

fn to_domain(model: otps::Model) -> OtpRecord {
    OtpRecord {
        id: OtpId::from_uuid(model.id),
        user_id: UserId::from_uuid(model.user_id),
        purpose: from_db_purpose(model.purpose),
        code_hash: model.code_hash,
        pending_value: model.pending_value,
        expires_at: model.expires_at.with_timezone(&Utc),
    }
}
