use plotters::coord::Shift;
use plotters::prelude::*;

use super::{Chart, chart_error, format_lap_time};
use crate::RacePaceError;
use crate::report::StintSeries;
use crate::tiers::Tier;

/// Tyre life against lap time, one line per race-run stint of a tier
pub struct DegradationChart<'a> {
    pub tier: Tier,
    pub series: &'a [StintSeries],
}

impl DegradationChart<'_> {
    /// Axis ranges padded around every plotted point, `None` when nothing can be plotted
    pub fn ranges(&self) -> Option<((f64, f64), (f64, f64))> {
        let points = self.series.iter().flat_map(|s| s.points.iter());
        let (mut x_min, mut x_max) = (f64::MAX, f64::MIN);
        let (mut y_min, mut y_max) = (f64::MAX, f64::MIN);
        let mut any = false;
        for (x, y) in points {
            any = true;
            x_min = x_min.min(*x);
            x_max = x_max.max(*x);
            y_min = y_min.min(*y);
            y_max = y_max.max(*y);
        }
        any.then_some(((x_min - 1., x_max + 1.), (y_min - 0.5, y_max + 0.5)))
    }
}

impl Chart for DegradationChart<'_> {
    fn draw<DB: DrawingBackend>(&self, root: DrawingArea<DB, Shift>) -> Result<(), RacePaceError> {
        let Some(((x_min, x_max), (y_min, y_max))) = self.ranges() else {
            return Err(RacePaceError::ChartRenderError {
                reason: format!("no race-run laps with tyre life for {}", self.tier.title()),
            });
        };

        root.fill(&WHITE).map_err(chart_error)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(self.tier.title(), ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .x_desc("Tyre Life")
            .y_desc("Lap Time")
            .y_label_formatter(&|y| format_lap_time(*y))
            .bold_line_style(BLACK.mix(0.3).stroke_width(2))
            .light_line_style(BLACK.mix(0.1))
            .draw()
            .map_err(chart_error)?;

        for (idx, stint) in self.series.iter().enumerate() {
            let color = Palette99::pick(idx).mix(0.9);
            chart
                .draw_series(LineSeries::new(
                    stint.points.iter().copied(),
                    color.stroke_width(2),
                ))
                .map_err(chart_error)?
                .label(stint.label())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            chart
                .draw_series(
                    stint
                        .points
                        .iter()
                        .map(|point| Cross::new(*point, 4, color.stroke_width(2))),
                )
                .map_err(chart_error)?;
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .position(SeriesLabelPosition::UpperLeft)
            .draw()
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: Vec<(f64, f64)>) -> StintSeries {
        StintSeries {
            driver: "OCO".to_string(),
            stint: 2,
            team: "Alpine".to_string(),
            compound: "HARD".to_string(),
            points,
        }
    }

    #[test]
    fn test_ranges_pad_points() {
        let all = vec![
            series(vec![(3., 90.5), (4., 90.8)]),
            series(vec![(10., 91.2)]),
        ];
        let chart = DegradationChart {
            tier: Tier::Mid,
            series: &all,
        };

        let ((x_min, x_max), (y_min, y_max)) = chart.ranges().unwrap();
        assert_eq!((x_min, x_max), (2., 11.));
        assert!((y_min - 90.0).abs() < 1e-9);
        assert!((y_max - 91.7).abs() < 1e-9);
    }

    #[test]
    fn test_ranges_without_points() {
        let all = vec![series(Vec::new())];
        let chart = DegradationChart {
            tier: Tier::Top,
            series: &all,
        };
        assert_eq!(chart.ranges(), None);
    }
}
