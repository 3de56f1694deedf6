use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Pointer input, already reduced to canvas coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gesture {
    Click { at: Point },
    Drag { from: Point, to: Point },
    Freehand { points: Vec<Point> },
}

impl Gesture {
    pub fn click(x: f32, y: f32) -> Self {
        Gesture::Click {
            at: Point::new(x, y),
        }
    }

    pub fn drag(from: impl Into<Point>, to: impl Into<Point>) -> Self {
        Gesture::Drag {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn freehand<P: Into<Point>>(points: impl IntoIterator<Item = P>) -> Self {
        Gesture::Freehand {
            points: points.into_iter().map(Into::into).collect(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Gesture::Click { .. } => "click",
            Gesture::Drag { .. } => "drag",
            Gesture::Freehand { .. } => "freehand",
        }
    }

    /// All coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        match self {
            Gesture::Click { at } => at.is_finite(),
            Gesture::Drag { from, to } => from.is_finite() && to.is_finite(),
            Gesture::Freehand { points } => points.iter().all(|p| p.is_finite()),
        }
    }
}
