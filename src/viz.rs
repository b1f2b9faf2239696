//! Chart rendering with Plotters: ranking bars, RFM histograms and segment counts

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use plotters::prelude::*;

use crate::dashboard::{BarOrientation, DashboardReport, Panel};
use crate::rfm::{CustomerSegment, RfmTable};

const BAR_COLOR: RGBColor = RGBColor(76, 114, 176);

/// One color per tier, in [`CustomerSegment::DISPLAY_ORDER`]
const SEGMENT_COLORS: [RGBColor; 4] = [
    RGBColor(85, 168, 104),
    RGBColor(76, 114, 176),
    RGBColor(221, 132, 82),
    RGBColor(196, 78, 82),
];

const HISTOGRAM_BINS: usize = 20;

/// An equal-width histogram bucket
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Split `values` into `bins` equal-width buckets over [min, max]
///
/// The last bucket is closed on both ends. A constant input produces a single
/// unit-wide bucket centred on the value. Non-finite values are ignored.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = finite.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = finite.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    if max <= min {
        return vec![HistogramBin {
            lower: min - 0.5,
            upper: min + 0.5,
            count: finite.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in &finite {
        let index = (((value - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + i as f64 * width,
            upper: min + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

/// Draw a ranking as a bar chart, or a placeholder when it has no rows
pub fn create_ranking_chart(panel: &Panel<'_>, output_path: &Path) -> crate::Result<()> {
    let root = BitMapBackend::new(output_path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let ranking = panel.ranking;
    if ranking.is_empty() {
        let area = root.titled(panel.title, ("sans-serif", 30))?;
        area.draw(&Text::new(
            "No data available",
            (420, 260),
            ("sans-serif", 24).into_font(),
        ))?;
        root.present()?;
        return Ok(());
    }

    let labels = ranking.labels();
    let n = labels.len();
    let max_value = ranking.values().iter().fold(0.0_f64, |a, &b| a.max(b));
    let value_range = 0f64..(max_value * 1.1).max(1.0);

    match panel.orientation {
        BarOrientation::Horizontal => {
            let mut chart = ChartBuilder::on(&root)
                .caption(panel.title, ("sans-serif", 30))
                .margin(10)
                .x_label_area_size(50)
                .y_label_area_size(260)
                .build_cartesian_2d(value_range, (0..n).into_segmented())?;

            // Segment 0 sits at the bottom; the top-ranked row goes on top
            let label_for = |v: &SegmentValue<usize>| match v {
                SegmentValue::CenterOf(i) if *i < n => labels[n - 1 - *i].to_string(),
                _ => String::new(),
            };
            chart
                .configure_mesh()
                .disable_y_mesh()
                .y_labels(n)
                .y_label_formatter(&label_for)
                .x_desc(ranking.measure_header)
                .axis_desc_style(("sans-serif", 15))
                .draw()?;

            chart.draw_series(ranking.rows.iter().enumerate().map(|(rank, row)| {
                let slot = n - 1 - rank;
                let mut bar = Rectangle::new(
                    [
                        (0.0, SegmentValue::Exact(slot)),
                        (row.value, SegmentValue::Exact(slot + 1)),
                    ],
                    BAR_COLOR.filled(),
                );
                bar.set_margin(6, 6, 0, 0);
                bar
            }))?;
        }
        BarOrientation::Vertical => {
            let mut chart = ChartBuilder::on(&root)
                .caption(panel.title, ("sans-serif", 30))
                .margin(10)
                .x_label_area_size(140)
                .y_label_area_size(80)
                .build_cartesian_2d((0..n).into_segmented(), value_range)?;

            let label_for = |v: &SegmentValue<usize>| match v {
                SegmentValue::CenterOf(i) if *i < n => labels[*i].to_string(),
                _ => String::new(),
            };
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(n)
                .x_label_formatter(&label_for)
                .x_label_style(
                    ("sans-serif", 14)
                        .into_font()
                        .transform(FontTransform::Rotate90),
                )
                .y_desc(ranking.measure_header)
                .axis_desc_style(("sans-serif", 15))
                .draw()?;

            chart.draw_series(ranking.rows.iter().enumerate().map(|(i, row)| {
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(i), 0.0),
                        (SegmentValue::Exact(i + 1), row.value),
                    ],
                    BAR_COLOR.filled(),
                );
                bar.set_margin(0, 0, 12, 12);
                bar
            }))?;
        }
    }

    root.present()?;
    debug!("{} chart saved to: {}", panel.title, output_path.display());
    Ok(())
}

/// Recency, Frequency and Monetary histograms side by side
pub fn create_rfm_histograms(rfm: &RfmTable, output_path: &Path) -> crate::Result<()> {
    let root = BitMapBackend::new(output_path, (1800, 500)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 3));

    let metrics = [
        (
            rfm.recency_values(),
            BLUE,
            "Recency Distribution",
            "Days Since Last Transaction",
        ),
        (
            rfm.frequency_values(),
            GREEN,
            "Frequency Distribution",
            "Number of Unique Transactions",
        ),
        (
            rfm.monetary_values(),
            RED,
            "Monetary Distribution",
            "Total Payment (R$)",
        ),
    ];

    for (area, (values, color, title, x_desc)) in panels.iter().zip(metrics.iter()) {
        let bins = histogram_bins(values, HISTOGRAM_BINS);
        let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
            continue;
        };
        let max_count = bins.iter().map(|b| b.count).max().unwrap_or(1) as f64;

        let mut chart = ChartBuilder::on(area)
            .caption(*title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(first.lower..last.upper, 0f64..(max_count * 1.1))?;

        chart
            .configure_mesh()
            .x_desc(*x_desc)
            .y_desc("Count")
            .axis_desc_style(("sans-serif", 15))
            .draw()?;

        chart.draw_series(bins.iter().map(|bin| {
            Rectangle::new(
                [(bin.lower, 0.0), (bin.upper, bin.count as f64)],
                color.mix(0.6).filled(),
            )
        }))?;
    }

    root.present()?;
    debug!("RFM distribution saved to: {}", output_path.display());
    Ok(())
}

/// Customer count per tier, each bar annotated with its count
pub fn create_segment_chart(rfm: &RfmTable, output_path: &Path) -> crate::Result<()> {
    let counts = rfm.segment_counts();
    let max_count = counts.iter().map(|(_, c)| *c).max().unwrap_or(0) as f64;
    let top = (max_count * 1.15).max(1.0);

    let root = BitMapBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Customer Count per RFM Segment", ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..counts.len()).into_segmented(), 0f64..top)?;

    let segment_label = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) => CustomerSegment::DISPLAY_ORDER
            .get(*i)
            .map(|s| s.label().to_string())
            .unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(counts.len())
        .x_label_formatter(&segment_label)
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, (_, count))| {
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(i), 0.0),
                (SegmentValue::Exact(i + 1), *count as f64),
            ],
            SEGMENT_COLORS[i % SEGMENT_COLORS.len()].filled(),
        );
        bar.set_margin(0, 0, 15, 15);
        bar
    }))?;

    chart.draw_series(counts.iter().enumerate().map(|(i, (_, count))| {
        Text::new(
            count.to_string(),
            (SegmentValue::CenterOf(i), *count as f64 + top * 0.03),
            ("sans-serif", 16).into_font(),
        )
    }))?;

    root.present()?;
    debug!("Segment chart saved to: {}", output_path.display());
    Ok(())
}

/// Render every chart of `report` into `output_dir`
///
/// RFM charts are skipped when the RFM table is empty.
///
/// # Returns
/// * Paths of the files written, in dashboard order
pub fn generate_dashboard_charts(
    report: &DashboardReport,
    output_dir: &Path,
) -> crate::Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();

    for panel in report.panels() {
        let path = output_dir.join(panel.file_name);
        create_ranking_chart(&panel, &path)?;
        written.push(path);
    }

    if !report.rfm.is_empty() {
        let path = output_dir.join("rfm_distribution.png");
        create_rfm_histograms(&report.rfm, &path)?;
        written.push(path);

        let path = output_dir.join("rfm_segments.png");
        create_segment_chart(&report.rfm, &path)?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_bins_cover_range() {
        let values: Vec<f64> = (0..=20).map(f64::from).collect();
        let bins = histogram_bins(&values, 4);

        assert_eq!(bins.len(), 4);
        assert_eq!(bins[0].lower, 0.0);
        assert_eq!(bins[3].upper, 20.0);
        // The maximum lands in the closed last bin
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 21);
        assert_eq!(bins[0].count, 5);
        assert_eq!(bins[3].count, 6);
    }

    #[test]
    fn test_histogram_constant_input() {
        let bins = histogram_bins(&[7.0, 7.0, 7.0], HISTOGRAM_BINS);
        assert_eq!(
            bins,
            vec![HistogramBin {
                lower: 6.5,
                upper: 7.5,
                count: 3
            }]
        );
    }

    #[test]
    fn test_histogram_ignores_non_finite() {
        assert!(histogram_bins(&[], 20).is_empty());
        assert!(histogram_bins(&[f64::NAN], 20).is_empty());

        let bins = histogram_bins(&[1.0, f64::INFINITY, 3.0], 2);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
    }
}
