//! Location routing: `/tree/<id>` selects a tree, anything else creates one.
//!
//! Built on `winnow` 0.7, like the rest of the crate's parsers.

use crate::error::RouteError;
use crate::id::DocId;
use winnow::combinator::{eof, opt, preceded, terminated};
use winnow::prelude::*;
use winnow::token::take_while;

fn tree_route(input: &mut &str) -> ModalResult<DocId> {
    terminated(
        preceded("/tree/", take_while(1.., |c: char| c != '/')),
        (opt('/'), eof),
    )
    .map(DocId::intern)
    .parse_next(input)
}

/// Extract the tree id from a location path. A single trailing slash is
/// tolerated; nested segments are not a tree route.
pub fn parse_tree_route(path: &str) -> Result<DocId, RouteError> {
    let mut rest = path;
    tree_route
        .parse_next(&mut rest)
        .map_err(|_| RouteError(path.to_string()))
}

/// The canonical path for a tree.
pub fn tree_path(id: DocId) -> String {
    format!("/tree/{id}")
}

/// Absolute URL for sharing the current location.
pub fn share_link(origin: &str, path: &str) -> String {
    format!("{}{}", origin.trim_end_matches('/'), path)
}
