//! Restore target selection
//!
//! The default policy picks the object with the *minimum* last-modified
//! timestamp. Callers that want the most recent snapshot must ask for
//! [`SelectionPolicy::Newest`] explicitly.

use spacer_core::RemoteObject;

pub use spacer_core::SelectionPolicy;

/// Pick the object to restore from a listing.
///
/// Scans the whole slice; ties go to the first object seen. Returns `None`
/// only for an empty slice.
pub fn select_restore_target(
    objects: &[RemoteObject],
    policy: SelectionPolicy,
) -> Option<&RemoteObject> {
    let mut iter = objects.iter();
    let first = iter.next()?;

    Some(iter.fold(first, |best, candidate| {
        let better = match policy {
            SelectionPolicy::Oldest => candidate.last_modified < best.last_modified,
            SelectionPolicy::Newest => candidate.last_modified > best.last_modified,
        };
        if better {
            candidate
        } else {
            best
        }
    }))
}
