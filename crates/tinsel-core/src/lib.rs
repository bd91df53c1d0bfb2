pub mod coords;
pub mod document;
pub mod error;
pub mod id;
pub mod model;
pub mod order;
pub mod permissions;
pub mod route;

pub use coords::{DropZone, map_pointer};
pub use document::{Document, Fields};
pub use error::{DecodeError, RouteError};
pub use id::{DocId, UserId};
pub use model::*;
pub use order::order_snapshot;
pub use permissions::{can_delete, is_owner};
pub use route::{parse_tree_route, share_link, tree_path};

// Re-export kurbo's point type so callers can build pointer positions
// without a direct dependency.
pub use kurbo::Point;
