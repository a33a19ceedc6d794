//! Chart rendering.
//!
//! Charts are rendered in memory as PNG bytes and handed to the publisher
//! under their chart name.

pub mod glyphs;
pub mod hourly_sales;

pub use hourly_sales::{render_hourly_sales, ChartOptions, MAX_CANVAS_SIDE};

/// Name of the hourly sales chart artifact.
pub const HOURLY_SALES_CHART: &str = "hourly_sales";

/// A rendered chart ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartArtifact {
    /// Chart name, used in the storage key.
    pub name: String,
    /// Encoded PNG image.
    pub png: Vec<u8>,
}

/// Failure while rendering a chart.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("revenue overflowed in hour {hour}")]
    RevenueOverflow { hour: u32 },

    #[error("chart canvas {width}x{height} is too small")]
    CanvasTooSmall { width: u32, height: u32 },

    #[error("chart canvas {width}x{height} is too large")]
    CanvasTooLarge { width: u32, height: u32 },

    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}
