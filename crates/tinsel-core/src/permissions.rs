//! Ownership and deletion eligibility.
//!
//! Pure derivations over the current identity, the tree's owner, and the
//! selected ornament. They gate what the UI offers; the store's access rules
//! remain the authority.

use crate::id::UserId;
use crate::model::{Identity, Ornament};

/// True iff someone is signed in, the tree has an owner, and they match.
pub fn is_owner(identity: Option<&Identity>, tree_owner: Option<UserId>) -> bool {
    match (identity, tree_owner) {
        (Some(identity), Some(owner)) => identity.id == owner,
        _ => false,
    }
}

/// Whether the selected ornament may be deleted.
///
/// The tree owner may delete anything; otherwise a signed-in user may
/// delete only ornaments they created. Nothing selected means nothing to
/// delete.
pub fn can_delete(
    identity: Option<&Identity>,
    tree_owner: Option<UserId>,
    selected: Option<&Ornament>,
) -> bool {
    let Some(selected) = selected else {
        return false;
    };
    if is_owner(identity, tree_owner) {
        return true;
    }
    match (identity, selected.creator_id) {
        (Some(identity), Some(creator)) => identity.id == creator,
        _ => false,
    }
}
