// src/visualize/charts.rs

use anyhow::{Context, Result};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use std::{fs, io::ErrorKind, path::Path};
use tracing::warn;

use crate::analyze::{PairedPoint, TrendPoint, TrendSeries};

const SIZE: (u32, u32) = (1000, 600);
const FONT: &str = "sans-serif";

/// Title and axis descriptions of one chart.
#[derive(Debug, Clone)]
pub struct Labels {
    pub title: String,
    pub x: String,
    pub y: String,
}

/// Draw into a temp file next to `path`, then rename over it. A failed
/// drawing leaves neither file behind.
fn render_to<F>(path: &Path, draw: F) -> Result<()>
where
    F: FnOnce(&DrawingArea<SVGBackend, plotters::coord::Shift>) -> Result<()>,
{
    let tmp_path = path.with_extension("svg.tmp");
    // the backend flushes on drop, so clean up only after it is gone
    let drawn = (|| -> Result<()> {
        let root = SVGBackend::new(&tmp_path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        Ok(())
    })();
    if let Err(e) = drawn {
        if let Err(rm) = fs::remove_file(&tmp_path) {
            if rm.kind() != ErrorKind::NotFound {
                warn!(path = %tmp_path.display(), "could not remove partial chart: {}", rm);
            }
        }
        return Err(e);
    }
    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))?;
    Ok(())
}

/// Value range padded by 10% (or 1.0 for a flat series). With
/// `include_zero` the range always reaches the baseline.
fn padded_range<I: IntoIterator<Item = f64>>(values: I, include_zero: bool) -> (f64, f64) {
    let (mut lo, mut hi) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    let pad = if (hi - lo).abs() > 1e-9 {
        (hi - lo) * 0.1
    } else {
        1.0
    };
    (
        if include_zero && lo == 0.0 { 0.0 } else { lo - pad },
        if include_zero && hi == 0.0 { 0.0 } else { hi + pad },
    )
}

fn year_range<I: IntoIterator<Item = i32>>(years: I) -> (i32, i32) {
    let (lo, hi) = years
        .into_iter()
        .fold((i32::MAX, i32::MIN), |(lo, hi), y| (lo.min(y), hi.max(y)));
    if lo > hi {
        (0, 1)
    } else if lo == hi {
        (lo - 1, hi + 1)
    } else {
        (lo, hi)
    }
}

/// One bar per category, in the given order.
pub fn bar_chart(path: &Path, labels: &Labels, bars: &[(String, f64)], color: RGBColor) -> Result<()> {
    render_to(path, |root| {
        let (lo, hi) = padded_range(bars.iter().map(|b| b.1), true);
        let mut chart = ChartBuilder::on(root)
            .caption(&labels.title, (FONT, 28))
            .margin(20)
            .x_label_area_size(70)
            .y_label_area_size(70)
            .build_cartesian_2d((0..bars.len()).into_segmented(), lo..hi)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len())
            .x_label_formatter(&|seg| match seg {
                SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                    bars.get(*i).map(|b| b.0.clone()).unwrap_or_default()
                }
                SegmentValue::Last => String::new(),
            })
            .x_desc(labels.x.as_str())
            .y_desc(labels.y.as_str())
            .light_line_style(BLACK.mix(0.1))
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(color.mix(0.8).filled())
                .margin(8)
                .data(bars.iter().enumerate().map(|(i, b)| (i, b.1))),
        )?;
        Ok(())
    })
}

/// One or more yearly series on a shared year axis. A legend is drawn when
/// there is more than one series.
pub fn line_chart(path: &Path, labels: &Labels, series: &[TrendSeries]) -> Result<()> {
    render_to(path, |root| {
        let (x_lo, x_hi) = year_range(series.iter().flat_map(|s| s.points.iter().map(|p| p.year)));
        let (y_lo, y_hi) = padded_range(
            series.iter().flat_map(|s| s.points.iter().map(|p| p.mean)),
            false,
        );
        let mut chart = ChartBuilder::on(root)
            .caption(&labels.title, (FONT, 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

        chart
            .configure_mesh()
            .x_desc(labels.x.as_str())
            .y_desc(labels.y.as_str())
            .x_label_formatter(&|y| y.to_string())
            .light_line_style(BLACK.mix(0.1))
            .draw()?;

        for (i, s) in series.iter().enumerate() {
            let color = if series.len() == 1 {
                RGBColor(255, 140, 0)
            } else {
                let (r, g, b) = Palette99::pick(i).rgb();
                RGBColor(r, g, b)
            };
            let points: Vec<(i32, f64)> = s.points.iter().map(|p: &TrendPoint| (p.year, p.mean)).collect();
            chart
                .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
                .label(s.place.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            chart.draw_series(
                points
                    .iter()
                    .map(move |&(x, y)| Circle::new((x, y), 3, color.filled())),
            )?;
        }

        if series.len() > 1 {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }
        Ok(())
    })
}

/// Scatter of the paired points with a least-squares line.
pub fn scatter_chart(path: &Path, labels: &Labels, pairs: &[PairedPoint]) -> Result<()> {
    render_to(path, |root| {
        let (x_lo, x_hi) = padded_range(pairs.iter().map(|p| p.temperature), false);
        let (y_lo, y_hi) = padded_range(pairs.iter().map(|p| p.aqi), false);
        let mut chart = ChartBuilder::on(root)
            .caption(&labels.title, (FONT, 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

        chart
            .configure_mesh()
            .x_desc(labels.x.as_str())
            .y_desc(labels.y.as_str())
            .light_line_style(BLACK.mix(0.1))
            .draw()?;

        let green = RGBColor(34, 139, 34);
        chart.draw_series(
            pairs
                .iter()
                .map(|p| Circle::new((p.temperature, p.aqi), 5, green.mix(0.8).filled())),
        )?;

        if let Some((slope, intercept)) = least_squares(pairs) {
            let ends = [x_lo, x_hi].map(|x| (x, slope * x + intercept));
            chart.draw_series(LineSeries::new(ends, green.stroke_width(2)))?;
        }
        Ok(())
    })
}

fn least_squares(pairs: &[PairedPoint]) -> Option<(f64, f64)> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.temperature).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.aqi).sum::<f64>() / n;
    let sxx: f64 = pairs.iter().map(|p| (p.temperature - mx).powi(2)).sum();
    if sxx <= f64::EPSILON {
        return None;
    }
    let sxy: f64 = pairs
        .iter()
        .map(|p| (p.temperature - mx) * (p.aqi - my))
        .sum();
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges() {
        assert_eq!(padded_range([10.0, 20.0], false), (9.0, 21.0));
        assert_eq!(padded_range([10.0, 20.0], true), (0.0, 22.0));
        assert_eq!(padded_range([5.0], false), (4.0, 6.0));
        assert_eq!(padded_range(std::iter::empty(), false), (0.0, 1.0));
        assert_eq!(year_range([1850, 2024, 1900]), (1850, 2024));
        assert_eq!(year_range([2000]), (1999, 2001));
    }

    #[test]
    fn failed_drawing_leaves_no_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.svg");

        let err = render_to(&path, |_| anyhow::bail!("no data to draw")).unwrap_err();
        assert!(err.to_string().contains("no data to draw"));
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);

        render_to(&path, |_| Ok(()))?;
        assert!(path.exists());
        assert!(!dir.path().join("broken.svg.tmp").exists());
        Ok(())
    }

    #[test]
    fn least_squares_line() {
        let p = |t, a| PairedPoint {
            place: "x".into(),
            year: 2000,
            temperature: t,
            aqi: a,
        };
        let (m, b) = least_squares(&[p(0.0, 1.0), p(1.0, 3.0), p(2.0, 5.0)]).unwrap();
        assert!((m - 2.0).abs() < 1e-12 && (b - 1.0).abs() < 1e-12);
        assert!(least_squares(&[p(1.0, 1.0), p(1.0, 2.0)]).is_none());
    }
}
