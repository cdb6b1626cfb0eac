use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{Chart, chart_error, format_lap_time};
use crate::RacePaceError;
use crate::aggregate::BestTimes;

const RACE_COLOR: RGBColor = RGBColor(31, 119, 180);
const QUALIFYING_COLOR: RGBColor = RGBColor(255, 127, 14);

/// Horizontal bars of each driver's best race-run lap with the best overall lap
/// overlaid, fastest driver at the top
pub struct BestTimesChart<'a> {
    pub best: &'a BestTimes,
}

impl BestTimesChart<'_> {
    /// `[fastest - 1, slowest race-run + 0.2]`, falling back to the slowest overall
    /// best when nobody has a race run
    pub fn x_range(&self) -> Option<(f64, f64)> {
        let fastest = self.best.fastest_q()?;
        let slowest = self
            .best
            .slowest_rr()
            .or_else(|| self.best.slowest_q())?;
        Some((fastest - 1., slowest + 0.2))
    }
}

fn bar(
    from: f64,
    to: f64,
    row: usize,
    color: RGBColor,
) -> Rectangle<(f64, SegmentValue<usize>)> {
    let mut rect = Rectangle::new(
        [
            (from, SegmentValue::Exact(row)),
            (to, SegmentValue::Exact(row + 1)),
        ],
        color.filled(),
    );
    rect.set_margin(3, 3, 0, 0);
    rect
}

impl Chart for BestTimesChart<'_> {
    fn draw<DB: DrawingBackend>(&self, root: DrawingArea<DB, Shift>) -> Result<(), RacePaceError> {
        let Some((x_min, x_max)) = self.x_range() else {
            return Err(RacePaceError::ChartRenderError {
                reason: "no lap times to plot".to_string(),
            });
        };
        let rows = &self.best.rows;
        let n = rows.len();
        // rank 0 is drawn on the top row
        let row_of = |rank: usize| n - 1 - rank;

        root.fill(&WHITE).map_err(chart_error)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("Best Lap Times", ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, (0..n).into_segmented())
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n)
            .x_desc("Lap Time")
            .x_label_formatter(&|x| format_lap_time(*x))
            .y_label_formatter(&|y| match y {
                SegmentValue::CenterOf(row) if *row < n => rows[n - 1 - row].driver.clone(),
                _ => String::new(),
            })
            .draw()
            .map_err(chart_error)?;

        chart
            .draw_series(rows.iter().enumerate().filter_map(|(rank, row)| {
                row.best_rr_s
                    .map(|rr| bar(x_min, rr, row_of(rank), RACE_COLOR))
            }))
            .map_err(chart_error)?
            .label("Race")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], RACE_COLOR.filled()));

        chart
            .draw_series(
                rows.iter()
                    .enumerate()
                    .map(|(rank, row)| bar(x_min, row.best_q_s, row_of(rank), QUALIFYING_COLOR)),
            )
            .map_err(chart_error)?
            .label("Qualifying")
            .legend(|(x, y)| {
                Rectangle::new([(x, y - 5), (x + 15, y + 5)], QUALIFYING_COLOR.filled())
            });

        // time labels sit inside the end of each qualifying bar
        let label_style = ("sans-serif", 14)
            .into_font()
            .color(&WHITE)
            .pos(Pos::new(HPos::Right, VPos::Center));
        let padding = (x_max - x_min) * 0.005;
        chart
            .draw_series(rows.iter().enumerate().map(|(rank, row)| {
                Text::new(
                    format_lap_time(row.best_q_s),
                    (row.best_q_s - padding, SegmentValue::CenterOf(row_of(rank))),
                    label_style.clone(),
                )
            }))
            .map_err(chart_error)?;

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .position(SeriesLabelPosition::LowerRight)
            .draw()
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
        Ok(())
    }
}
