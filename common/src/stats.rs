use itertools::Itertools;

use crate::store::{SizeEntries, ThreadSamples};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub threads: usize,
    /// `None` when no sample of this thread count is a valid measurement
    pub summary: Option<Summary>,
}

/// One bar series of a chart: a dataset size and its points by thread count
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedSeries {
    pub size: String,
    pub points: Vec<Point>,
}

impl ReducedSeries {
    pub fn label(&self) -> String {
        format!("{} (IO/thread)", self.size)
    }
}

/// Zero, negative and non-finite values mark aborted trials rather than measurements
fn is_measurement(sample: f64) -> bool {
    sample.is_finite() && sample > 0.0
}

/// Mean and population standard deviation of the valid samples
pub fn summarize(samples: &[f64]) -> Option<Summary> {
    let valid = samples
        .iter()
        .copied()
        .filter(|x| is_measurement(*x))
        .collect::<Vec<_>>();
    if valid.is_empty() {
        return None;
    }

    let n = valid.len() as f64;
    let mean = valid.iter().sum::<f64>() / n;
    let variance = valid.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Some(Summary {
        mean,
        std_dev: variance.sqrt(),
    })
}

pub fn reduce_entries(size: &str, entries: &[ThreadSamples]) -> ReducedSeries {
    let points = entries
        .iter()
        .sorted_by_key(|entry| entry.threads())
        .map(|entry| Point {
            threads: entry.threads(),
            summary: summarize(entry.samples()),
        })
        .collect();
    ReducedSeries {
        size: size.to_owned(),
        points,
    }
}

/// Reduces every size of one test, keeping the store's size order
pub fn reduce_test(sizes: &SizeEntries) -> Vec<ReducedSeries> {
    sizes
        .iter()
        .map(|(size, entries)| reduce_entries(size, entries))
        .collect()
}
