//! Mutation query service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rupi_shared::types::{MAX_PAGE_SIZE, MutationId, PageRequest, PageResponse, UserId};

use super::error::MutationError;
use super::range::{MutationFilter, SummaryRange};
use super::store::MutationStore;
use super::summary::{MutationSummary, summarize};
use super::types::Mutation;

/// Service for mutation history and summaries.
pub struct MutationService<M: MutationStore> {
    mutations: Arc<M>,
}

impl<M: MutationStore> MutationService<M> {
    /// Create a new mutation service.
    #[must_use]
    pub fn new(mutations: Arc<M>) -> Self {
        Self { mutations }
    }

    /// Summarize a month of mutations, or the current month so far.
    ///
    /// # Errors
    ///
    /// Returns `MutationError::Validation` for a bad `year`/`month` pair.
    pub async fn summary(
        &self,
        user_id: UserId,
        year: Option<i32>,
        month: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<MutationSummary, MutationError> {
        let range = SummaryRange::resolve(year, month, now)?;
        let mutations = self
            .mutations
            .list_in_range(user_id, range.start, range.end)
            .await?;

        tracing::debug!(
            user_id = %user_id,
            start = %range.start,
            end = %range.end,
            count = mutations.len(),
            "summarizing mutations"
        );
        Ok(summarize(mutations, range))
    }

    /// List mutations page by page, newest first.
    ///
    /// # Errors
    ///
    /// Returns `MutationError::Validation` for an out-of-order date filter or
    /// a page size outside `1..=100`.
    pub async fn list(
        &self,
        user_id: UserId,
        filter: &MutationFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Mutation>, MutationError> {
        filter.validate()?;
        if !page.is_valid() {
            return Err(MutationError::validation(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let (content, total) = self.mutations.page(user_id, filter, page).await?;
        Ok(PageResponse::new(content, page, total))
    }

    /// Load one of the caller's mutations.
    ///
    /// # Errors
    ///
    /// Returns `MutationError::NotFound` when the mutation does not exist or
    /// belongs to another user.
    pub async fn get(&self, user_id: UserId, id: MutationId) -> Result<Mutation, MutationError> {
        self.mutations
            .find(user_id, id)
            .await?
            .ok_or(MutationError::NotFound)
    }
}
