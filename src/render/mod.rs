// Chart rendering for session reports

pub mod best_times;
pub mod degradation;
pub mod format;

use std::fmt::Display;
use std::panic;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::RacePaceError;
use crate::tiers::Tier;

pub use best_times::BestTimesChart;
pub use degradation::DegradationChart;
pub use format::format_lap_time;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 850,
            format: ImageFormat::Jpeg,
        }
    }
}

/// The charts a report can produce
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    BestTimes,
    Degradation(Tier),
}

impl ChartKind {
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::BestTimes => "best_times",
            Self::Degradation(tier) => tier.file_stem(),
        }
    }

    pub fn file_name(&self, format: ImageFormat) -> String {
        format!("{}.{}", self.file_stem(), format.extension())
    }
}

pub(crate) fn chart_error<E: Display>(e: E) -> RacePaceError {
    RacePaceError::ChartRenderError {
        reason: e.to_string(),
    }
}

/// Something that can be drawn onto any plotters backend
pub trait Chart {
    fn draw<DB: DrawingBackend>(&self, root: DrawingArea<DB, Shift>) -> Result<(), RacePaceError>;
}

/// Render onto the backend matching the configured format. Font lookups inside the
/// plotting backend can panic on hosts without system fonts, which is reported as a
/// render error instead of aborting the run.
pub fn render_chart<C: Chart>(
    path: &Path,
    style: &ChartStyle,
    chart: &C,
) -> Result<(), RacePaceError> {
    let size = (style.width, style.height);
    let render = || match style.format {
        ImageFormat::Jpeg | ImageFormat::Png => {
            chart.draw(BitMapBackend::new(path, size).into_drawing_area())
        }
        ImageFormat::Svg => chart.draw(SVGBackend::new(path, size).into_drawing_area()),
    };

    panic::catch_unwind(panic::AssertUnwindSafe(render)).map_err(|_| {
        RacePaceError::ChartRenderError {
            reason: format!("plotting backend panicked while drawing {:?}", path),
        }
    })?
}
