//! Mutation persistence seam.

use chrono::{DateTime, Utc};
use rupi_shared::types::{MutationId, PageRequest, UserId};

use super::error::MutationError;
use super::range::MutationFilter;
use super::types::Mutation;

/// Read access to a user's mutations.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait MutationStore: Send + Sync {
    /// All mutations of `user_id` booked in `[start, end]`, oldest first.
    fn list_in_range(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<Mutation>, MutationError>> + Send;

    /// One page of filtered mutations, newest first, plus the total match count.
    fn page(
        &self,
        user_id: UserId,
        filter: &MutationFilter,
        page: PageRequest,
    ) -> impl std::future::Future<Output = Result<(Vec<Mutation>, u64), MutationError>> + Send;

    /// A mutation owned by `user_id`.
    fn find(
        &self,
        user_id: UserId,
        id: MutationId,
    ) -> impl std::future::Future<Output = Result<Option<Mutation>, MutationError>> + Send;
}
