//! Rolling-window change detection
//!
//! Relative delta of the current value against the oldest sample in
//! the lookback window: `(current - baseline) / baseline`.

use sea_orm::DbErr;
use tracing::debug;

use crate::services::store::OiStore;

/// Lookback window used for baseline selection, in minutes.
pub const LOOKBACK_MINUTES: i64 = 15;

/// Which snapshot field the change rate is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeField {
    OpenInterest,
    Price,
}

pub struct ChangeDetector {
    store: OiStore,
    lookback_minutes: i64,
}

impl ChangeDetector {
    pub fn new(store: OiStore) -> Self {
        Self {
            store,
            lookback_minutes: LOOKBACK_MINUTES,
        }
    }

    /// Relative change of `current` against the window baseline.
    ///
    /// `None` means "cannot compute": fewer than two samples exist for
    /// the symbol (the current snapshot alone is no baseline), or the
    /// baseline value is exactly zero.
    pub async fn change_rate(
        &self,
        symbol: &str,
        current: f64,
        field: ChangeField,
    ) -> Result<Option<f64>, DbErr> {
        let window = self.store.recent_window(symbol, self.lookback_minutes).await?;

        if window.len() < 2 {
            debug!(symbol, samples = window.len(), "not enough history for a change rate");
            return Ok(None);
        }

        // Ascending order: index 0 is the oldest sample in the window.
        let baseline_row = &window[0];
        let baseline = match field {
            ChangeField::OpenInterest => baseline_row.open_interest,
            ChangeField::Price => baseline_row.price,
        };

        if baseline == 0.0 {
            debug!(symbol, ?field, "baseline is zero, change rate unavailable");
            return Ok(None);
        }

        Ok(Some((current - baseline) / baseline))
    }
}
