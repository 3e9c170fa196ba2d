//! Auto-dismiss delay for non-error alerts.

use std::time::Duration;

use crate::error::Anomaly;
use crate::holder::HolderStats;

/// Time a newly armed alert stays visible:
/// `(count - error_count) * additional + init`.
///
/// Counts are the holder's live counters at arming time. Error alerts do not
/// add to the delay because they are never dismissed on a timer. Counters
/// where errors outnumber alerts are reported and the delay falls back to
/// `init`.
pub fn compute_delay(stats: HolderStats, init: Duration, additional: Duration) -> Duration {
    let Some(visible) = stats.count.checked_sub(stats.error_count) else {
        Anomaly::NegativeVisibleCount {
            count: stats.count,
            error_count: stats.error_count,
        }
        .report();
        return init;
    };
    let factor = u32::try_from(visible).unwrap_or(u32::MAX);
    additional.saturating_mul(factor).saturating_add(init)
}
