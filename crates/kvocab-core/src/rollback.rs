use std::collections::HashSet;

use crate::merger::{Stamp, clear_def};
use crate::store::Store;

/// Clear definitions produced by any of `request_ids`.
///
/// Returns the number of entries cleared. Empty ids never match, so
/// undefined entries are left alone.
pub fn clear_by_request_ids(store: &mut Store, request_ids: &HashSet<String>, stamp: &Stamp) -> usize {
    let mut cleared = 0;

    for entry in store.values_mut() {
        if entry.def_request_id.is_empty() || !request_ids.contains(&entry.def_request_id) {
            continue;
        }
        tracing::debug!(rank = entry.rank, request_id = %entry.def_request_id, "Clearing definition");
        clear_def(entry, stamp);
        cleared += 1;
    }

    cleared
}
