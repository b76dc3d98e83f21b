//! Smart guides for aligning a dragged node with its neighbours.

use kurbo::{Point, Rect, Size, Vec2};

/// Snap tolerance in screen pixels.
pub const SMART_GUIDE_THRESHOLD: f64 = 8.0;

/// Orientation of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideAxis {
    /// A vertical line at some x; produced by horizontal alignment.
    Vertical,
    /// A horizontal line at some y; produced by vertical alignment.
    Horizontal,
}

/// An alignment line to draw while dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmartGuide {
    pub axis: GuideAxis,
    /// The shared coordinate (x for vertical guides, y for horizontal ones).
    pub position: f64,
    /// Extent of the line along the other axis, covering both aligned boxes.
    pub start: f64,
    pub end: f64,
}

/// Result of a smart guide query.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartGuideResult {
    /// The top-left corner after snapping.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
    /// Guides to show, at most one per axis.
    pub guides: Vec<SmartGuide>,
}

impl SmartGuideResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
            guides: Vec::new(),
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Closest alignment found on one axis.
#[derive(Debug, Clone, Copy)]
struct AxisMatch {
    /// Amount to add to the dragged box on this axis.
    offset: f64,
    /// Coordinate the two reference lines share after snapping.
    position: f64,
    /// The box aligned against.
    other: Rect,
}

/// Leading edge, centre, trailing edge.
fn reference_lines(min: f64, max: f64) -> [f64; 3] {
    [min, (min + max) / 2.0, max]
}

fn closest_on_axis<F>(target: Rect, others: &[Rect], span: F) -> Option<AxisMatch>
where
    F: Fn(Rect) -> (f64, f64),
{
    let (min, max) = span(target);
    let dragged = reference_lines(min, max);
    let mut best: Option<AxisMatch> = None;

    for other in others {
        let (other_min, other_max) = span(*other);
        for line in reference_lines(other_min, other_max) {
            for own in dragged {
                let offset = line - own;
                // Strict comparison keeps the first candidate on ties.
                if best.is_none_or(|b| offset.abs() < b.offset.abs()) {
                    best = Some(AxisMatch {
                        offset,
                        position: line,
                        other: *other,
                    });
                }
            }
        }
    }
    best
}

/// Find alignments between `target` and `others`.
///
/// Each axis is handled independently: the closest pair of reference lines
/// (edges or centres) snaps when it is strictly closer than `threshold`.
/// The threshold is in document units.
pub fn detect_smart_guides(target: Rect, others: &[Rect], threshold: f64) -> SmartGuideResult {
    let mut result = SmartGuideResult::none(target.origin());
    let x_match = closest_on_axis(target, others, |r| (r.x0, r.x1))
        .filter(|m| m.offset.abs() < threshold);
    let y_match = closest_on_axis(target, others, |r| (r.y0, r.y1))
        .filter(|m| m.offset.abs() < threshold);

    let mut snapped = target;
    if let Some(m) = x_match {
        snapped = snapped + Vec2::new(m.offset, 0.0);
        result.snapped_x = true;
    }
    if let Some(m) = y_match {
        snapped = snapped + Vec2::new(0.0, m.offset);
        result.snapped_y = true;
    }
    result.point = snapped.origin();

    if let Some(m) = x_match {
        result.guides.push(SmartGuide {
            axis: GuideAxis::Vertical,
            position: m.position,
            start: snapped.y0.min(m.other.y0),
            end: snapped.y1.max(m.other.y1),
        });
    }
    if let Some(m) = y_match {
        result.guides.push(SmartGuide {
            axis: GuideAxis::Horizontal,
            position: m.position,
            start: snapped.x0.min(m.other.x0),
            end: snapped.x1.max(m.other.x1),
        });
    }
    result
}

/// Snap a node whose top-left corner would land on `position`.
///
/// `threshold` is in screen pixels and is divided by `zoom`, so the snap
/// feels the same at every zoom level.
pub fn snap_node_position(
    position: Point,
    size: Size,
    others: &[Rect],
    threshold: f64,
    zoom: f64,
) -> SmartGuideResult {
    if others.is_empty() || zoom <= 0.0 {
        return SmartGuideResult::none(position);
    }
    detect_smart_guides(Rect::from_origin_size(position, size), others, threshold / zoom)
}
