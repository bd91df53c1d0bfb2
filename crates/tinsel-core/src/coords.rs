//! Pointer → canvas coordinate mapping.
//!
//! Ornament positions are stored as percentages of the drop zone so the
//! tree renders the same at any viewport size. Both the "new ornament" and
//! the "move ornament" paths go through [`map_pointer`], so the clamp
//! policy is applied identically to each.

use crate::model::Position;
use kurbo::{Point, Rect};

/// The measured screen rectangle of the drop target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropZone {
    rect: Rect,
}

impl DropZone {
    /// Build from a bounding client rect (`left`, `top`, `width`, `height`).
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            rect: Rect::new(left, top, left + width, top + height),
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// A zone with no area (not yet laid out) cannot map anything.
    pub fn is_measurable(&self) -> bool {
        let (w, h) = (self.rect.width(), self.rect.height());
        w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0
    }
}

/// Map a pointer's client coordinates into percentage canvas coordinates.
///
/// Returns `None` when the zone has no measurable area, or when the pointer
/// (or the percentage it maps to) is not finite: a NaN stored as a position
/// would poison every later snapshot. With `clamp` set, drops outside the
/// zone are pulled onto its nearest edge; otherwise the raw (possibly
/// out-of-range) percentages are returned.
pub fn map_pointer(pointer: Point, zone: &DropZone, clamp: bool) -> Option<Position> {
    if !pointer.is_finite() || !zone.is_measurable() {
        return None;
    }
    let rect = zone.rect;
    let position = Position {
        x: (pointer.x - rect.x0) / rect.width() * 100.0,
        y: (pointer.y - rect.y0) / rect.height() * 100.0,
    };
    if !(position.x.is_finite() && position.y.is_finite()) {
        return None;
    }
    Some(if clamp { position.clamped() } else { position })
}
