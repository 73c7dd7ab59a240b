use serde::{Deserialize, Serialize};

/// Space between a chart's container edge and its drawing area, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    /// Width left for drawing inside a container `width` wide. Never negative.
    pub fn inner_width(&self, width: f64) -> f64 {
        (width - self.left - self.right).max(0.0)
    }

    /// Height left for drawing inside a container `height` tall. Never negative.
    pub fn inner_height(&self, height: f64) -> f64 {
        (height - self.top - self.bottom).max(0.0)
    }
}
