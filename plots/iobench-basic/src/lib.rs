use std::path::{Path, PathBuf};

use common::{
    stats::{ReducedSeries, reduce_test},
    store::ResultStore,
    util::compare_data_sizes,
};
use eyre::{Context, Result};
use itertools::Itertools;
use plotters::prelude::*;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::debug;

const CHART_SIZE: (u32, u32) = (1024, 768);
const CHART_EXTENSION: &str = "png";
const X_LABEL: &str = "Thread Count";
const Y_LABEL: &str = "Total Throughput (MB/sec)";

/// Total width taken by the bars of one thread count group
const GROUP_WIDTH: f64 = 0.5;

const COLORS: &[RGBColor] = &[
    RGBColor(31, 119, 180),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(0, 0, 0),
    RGBColor(255, 127, 14),
    RGBColor(148, 103, 189),
];

/// Bars of one test, sizes sorted ascending
#[derive(Debug, Clone, PartialEq)]
pub struct ThroughputChart {
    pub test_name: String,
    pub series: Vec<ReducedSeries>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    /// Index into [`ThroughputChart::series`]
    pub series: usize,
    pub x_left: f64,
    pub x_right: f64,
    pub mean: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarLayout {
    /// Thread count shown at x position `i`
    pub ticks: Vec<usize>,
    pub bar_width: f64,
    pub bars: Vec<Bar>,
}

impl BarLayout {
    fn y_max(&self) -> f64 {
        let max = self
            .bars
            .iter()
            .map(|bar| bar.mean + bar.std_dev)
            .fold(0.0, f64::max);
        if max > 0.0 { max * 1.1 } else { 1.0 }
    }
}

/// `iobench sw with IO size of 16K` -> `iobench_sw_with_IO_size_of_16K.png`
pub fn chart_filename(test_name: &str) -> String {
    format!(
        "{}.{CHART_EXTENSION}",
        test_name.split_whitespace().join("_")
    )
}

impl ThroughputChart {
    pub fn new(test_name: &str, mut series: Vec<ReducedSeries>) -> Self {
        series.sort_by(|a, b| compare_data_sizes(&a.size, &b.size));
        Self {
            test_name: test_name.to_owned(),
            series,
        }
    }

    /// One chart per test in the store
    pub fn from_store(store: &ResultStore) -> Vec<Self> {
        store
            .tests()
            .map(|(test, sizes)| Self::new(test, reduce_test(sizes)))
            .collect()
    }

    pub fn filename(&self) -> String {
        chart_filename(&self.test_name)
    }

    /// Places every defined point as a bar. Groups sit on the sorted thread
    /// counts of all series, bars inside a group are offset per series.
    pub fn layout(&self) -> BarLayout {
        let ticks = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.threads))
            .sorted()
            .dedup()
            .collect::<Vec<_>>();
        let count = self.series.len().max(1) as f64;
        let bar_width = GROUP_WIDTH / count;

        let mut bars = Vec::new();
        for (idx, series) in self.series.iter().enumerate() {
            let offset = (idx as f64 - (count - 1.0) / 2.0) * bar_width;
            for point in &series.points {
                let Some(summary) = point.summary else {
                    continue;
                };
                let Ok(x) = ticks.binary_search(&point.threads) else {
                    continue;
                };
                let center = x as f64 + offset;
                bars.push(Bar {
                    series: idx,
                    x_left: center - bar_width / 2.0,
                    x_right: center + bar_width / 2.0,
                    mean: summary.mean,
                    std_dev: summary.std_dev,
                });
            }
        }

        BarLayout {
            ticks,
            bar_width,
            bars,
        }
    }

    /// Draws the chart into `out_dir`. Returns `None` when there is nothing to plot.
    pub fn render(&self, out_dir: &Path) -> Result<Option<PathBuf>> {
        let layout = self.layout();
        if layout.bars.is_empty() {
            debug!("No valid points for {}, skipping chart", self.test_name);
            return Ok(None);
        }

        let path = out_dir.join(self.filename());
        self.draw(&path, &layout)
            .context(format!("Render chart {}", path.display()))?;
        debug!("Rendered {}", path.display());
        Ok(Some(path))
    }

    fn draw(&self, path: &Path, layout: &BarLayout) -> Result<()> {
        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let num_ticks = layout.ticks.len();
        let mut chart = ChartBuilder::on(&root)
            .caption(&self.test_name, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(-0.5..(num_ticks as f64 - 0.5), 0.0..layout.y_max())?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(num_ticks)
            .x_label_formatter(&|x| {
                let idx = x.round();
                if idx >= 0.0 && (x - idx).abs() < 0.3 {
                    layout
                        .ticks
                        .get(idx as usize)
                        .map(|t| t.to_string())
                        .unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .x_desc(X_LABEL)
            .y_desc(Y_LABEL)
            .draw()?;

        for (idx, series) in self.series.iter().enumerate() {
            let color = COLORS[idx % COLORS.len()];
            let bars = layout.bars.iter().filter(|bar| bar.series == idx);

            chart
                .draw_series(bars.clone().map(|bar| {
                    Rectangle::new(
                        [(bar.x_left, 0.0), (bar.x_right, bar.mean)],
                        color.filled(),
                    )
                }))?
                .label(series.label())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled())
                });

            chart.draw_series(bars.map(|bar| {
                ErrorBar::new_vertical(
                    (bar.x_left + bar.x_right) / 2.0,
                    (bar.mean - bar.std_dev).max(0.0),
                    bar.mean,
                    bar.mean + bar.std_dev,
                    BLACK.stroke_width(1),
                    6,
                )
            }))?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

/// Renders one chart per test of `store`, returning the written files
pub fn render_charts(store: &ResultStore, out_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .context(format!("Create chart directory {}", out_dir.display()))?;

    let results = ThroughputChart::from_store(store)
        .into_par_iter()
        .map(|chart| chart.render(out_dir))
        .collect::<Vec<_>>();

    let mut written = Vec::new();
    for item in results {
        if let Some(path) = item? {
            written.push(path);
        }
    }
    Ok(written)
}
