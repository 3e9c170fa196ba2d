//! Severity ordering of batched requests.

use crate::request::AlertRequest;
use crate::severity::SeverityTable;

/// Sort a batch by ascending severity rank, keeping the original index.
///
/// The sort is stable: requests of equal rank keep their submission order.
pub fn sort_batch(
    requests: Vec<AlertRequest>,
    table: &SeverityTable,
) -> Vec<(usize, AlertRequest)> {
    let mut indexed: Vec<(usize, AlertRequest)> = requests.into_iter().enumerate().collect();
    indexed.sort_by_key(|(_, req)| table.rank(&req.severity));
    indexed
}
