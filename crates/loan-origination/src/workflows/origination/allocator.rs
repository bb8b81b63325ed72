use chrono::NaiveDate;

use super::codec::{DateToken, IdFormatError, TransactionId};
use super::repository::{OriginationRepository, RepositoryError};

/// Errors raised while drawing a transaction id.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("transaction id capacity exhausted for date token {date_token}: {max} ids already drawn")]
    CapacityExceeded { date_token: DateToken, max: u32 },
    #[error(transparent)]
    Storage(#[from] RepositoryError),
    #[error(transparent)]
    Format(#[from] IdFormatError),
}

/// Draws date-scoped transaction ids backed by the repository's counters.
///
/// Each date token carries its own counter, so sequences restart at 0001
/// whenever the token changes and ids stay unique per calendar day. A draw
/// past [`TransactionId::SEQUENCE_MAX`] burns the counter value and fails;
/// the counter never wraps and a drawn value is never handed out again.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdAllocator;

impl IdAllocator {
    pub fn allocate<R>(
        &self,
        repository: &R,
        submission_date: NaiveDate,
    ) -> Result<TransactionId, AllocationError>
    where
        R: OriginationRepository + ?Sized,
    {
        self.allocate_for_token(repository, DateToken::from_date(submission_date))
    }

    pub fn allocate_for_token<R>(
        &self,
        repository: &R,
        date_token: DateToken,
    ) -> Result<TransactionId, AllocationError>
    where
        R: OriginationRepository + ?Sized,
    {
        let sequence = repository.next_sequence(date_token)?;
        if sequence > TransactionId::SEQUENCE_MAX {
            return Err(AllocationError::CapacityExceeded {
                date_token,
                max: TransactionId::SEQUENCE_MAX,
            });
        }

        Ok(TransactionId::new(date_token, sequence)?)
    }
}
