//! Date ranges and listing filters, anchored to Western Indonesia Time.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};

use super::error::MutationError;
use super::types::{Mutation, TransactionType};

/// WIB is UTC+7 all year.
pub const WIB_OFFSET_SECS: i32 = 7 * 3600;

/// The WIB offset.
#[must_use]
pub fn wib() -> FixedOffset {
    FixedOffset::east_opt(WIB_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    wib()
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .single()
        .map(|d| d.with_timezone(&Utc))
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    start_of_day(NaiveDate::from_ymd_opt(year, month, 1)?)
}

/// Inclusive instant range a summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryRange {
    /// First instant.
    pub start: DateTime<Utc>,
    /// Last instant, inclusive.
    pub end: DateTime<Utc>,
}

impl SummaryRange {
    /// Resolve the optional `year`/`month` query into a range.
    ///
    /// Without parameters the range runs from the start of the current WIB
    /// month to `now`. An explicit month runs to its last nanosecond.
    ///
    /// # Errors
    ///
    /// Returns `MutationError::Validation` when only one parameter is given,
    /// either is out of bounds, or the month has not started yet.
    pub fn resolve(
        year: Option<i32>,
        month: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Self, MutationError> {
        let invalid = || MutationError::validation("Invalid year or month");

        match (year, month) {
            (None, None) => {
                let today = now.with_timezone(&wib()).date_naive();
                let start = month_start(today.year(), today.month()).ok_or_else(invalid)?;
                Ok(Self { start, end: now })
            }
            (Some(year), Some(month)) => {
                if !(1900..=2100).contains(&year) {
                    return Err(MutationError::validation(
                        "Year must be between 1900 and 2100",
                    ));
                }
                if !(1..=12).contains(&month) {
                    return Err(MutationError::validation("Month must be between 1 and 12"));
                }

                let start = month_start(year, month).ok_or_else(invalid)?;
                if start > now {
                    return Err(MutationError::validation(
                        "Cannot query data for future dates.",
                    ));
                }

                let (next_year, next_month) = if month == 12 {
                    (year + 1, 1)
                } else {
                    (year, month + 1)
                };
                let end = month_start(next_year, next_month).ok_or_else(invalid)?
                    - Duration::nanoseconds(1);
                Ok(Self { start, end })
            }
            _ => Err(MutationError::validation(
                "Both 'year' and 'month' parameters must be provided, or none at all.",
            )),
        }
    }

    /// Whether `at` falls inside the range.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// Start as WIB wall-clock time.
    #[must_use]
    pub fn start_local(&self) -> NaiveDateTime {
        self.start.with_timezone(&wib()).naive_local()
    }

    /// End as WIB wall-clock time.
    #[must_use]
    pub fn end_local(&self) -> NaiveDateTime {
        self.end.with_timezone(&wib()).naive_local()
    }
}

/// Optional criteria for the mutation listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationFilter {
    /// First WIB day to include.
    pub start_date: Option<NaiveDate>,
    /// Last WIB day to include.
    pub end_date: Option<NaiveDate>,
    /// Only credits or only debits.
    pub category: Option<TransactionType>,
    /// Matches counterparty name or description, case-insensitively.
    pub search: Option<String>,
}

impl MutationFilter {
    /// Check that the dates are in order.
    ///
    /// # Errors
    ///
    /// Returns `MutationError::Validation` when `start_date > end_date`.
    pub fn validate(&self) -> Result<(), MutationError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start > end => Err(MutationError::validation(
                "start_date must not be after end_date",
            )),
            _ => Ok(()),
        }
    }

    /// Inclusive lower bound.
    #[must_use]
    pub fn from_instant(&self) -> Option<DateTime<Utc>> {
        self.start_date.and_then(start_of_day)
    }

    /// Exclusive upper bound: the start of the day after `end_date`.
    #[must_use]
    pub fn until_instant(&self) -> Option<DateTime<Utc>> {
        self.end_date
            .and_then(|d| d.succ_opt())
            .and_then(start_of_day)
    }

    /// Trimmed search term, if any.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Whether a mutation passes every criterion.
    #[must_use]
    pub fn matches(&self, mutation: &Mutation) -> bool {
        if self.from_instant().is_some_and(|from| mutation.created_at < from) {
            return false;
        }
        if self.until_instant().is_some_and(|until| mutation.created_at >= until) {
            return false;
        }
        if self.category.is_some_and(|c| c != mutation.transaction_type) {
            return false;
        }
        match self.search_term() {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                mutation.counterparty_name.to_lowercase().contains(&term)
                    || mutation
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&term))
            }
        }
    }
}

/// WIB calendar date of an instant.
#[must_use]
pub fn wib_date(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&wib()).date_naive()
}

/// `HH:MM WIB` label of an instant.
#[must_use]
pub fn wib_time_label(at: DateTime<Utc>) -> String {
    format!("{} WIB", at.with_timezone(&wib()).format("%H:%M"))
}
