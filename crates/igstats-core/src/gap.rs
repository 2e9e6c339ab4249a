//! Follow-back differential.
//!
//! The one derived set of the whole pipeline: followees that are not also
//! followers. Pure set arithmetic; exporting and logging the result is the
//! caller's job.

use crate::model::AccountSet;

/// Computes the set of followees that do not follow back.
///
/// Returns `followees − followers`. Empty inputs yield an empty result.
/// The result is a fresh set; insertion order carries no meaning.
pub fn follow_back_gap(followers: &AccountSet, followees: &AccountSet) -> AccountSet {
    followees.difference(followers).cloned().collect()
}
