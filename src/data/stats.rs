use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::model::{Datasets, Locus, PeakRecord};

/// Length of the "top cell types by mean accessibility" ranking.
pub const TOP_N: usize = 5;

// ---------------------------------------------------------------------------
// Per-slice statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CellTypeMean {
    pub cell_type: String,
    pub mean: f64,
}

/// Descriptive statistics of a peak slice.  Undefined aggregates are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliceStats {
    pub cell_type_count: usize,
    pub max_score: Option<f64>,
    pub mean_score: Option<f64>,
    /// Sample standard deviation; needs at least two scores.
    pub std_score: Option<f64>,
    /// Only filled when the slice covers more than one cell type.
    pub top_by_mean: Vec<CellTypeMean>,
}

/// Summarise a peak slice.  Null cell types and NaN scores are skipped.
pub fn slice_stats(slice: &[PeakRecord]) -> SliceStats {
    let scores: Vec<f64> = present_scores(slice.iter()).collect();

    let mut by_cell_type: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for p in slice {
        if let Some(ct) = p.cell_type.as_deref() {
            let entry = by_cell_type.entry(ct).or_default();
            if !p.accessibility_score.is_nan() {
                entry.push(p.accessibility_score);
            }
        }
    }
    let cell_type_count = by_cell_type.len();

    let top_by_mean = if cell_type_count > 1 {
        let mut means: Vec<CellTypeMean> = by_cell_type
            .into_iter()
            .filter_map(|(cell_type, scores)| {
                mean(&scores).map(|mean| CellTypeMean {
                    cell_type: cell_type.to_string(),
                    mean,
                })
            })
            .collect();
        means.sort_by(|a, b| {
            b.mean
                .partial_cmp(&a.mean)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.cell_type.cmp(&b.cell_type))
        });
        means.truncate(TOP_N);
        means
    } else {
        Vec::new()
    };

    SliceStats {
        cell_type_count,
        max_score: scores.iter().copied().reduce(f64::max),
        mean_score: mean(&scores),
        std_score: sample_std(&scores),
        top_by_mean,
    }
}

fn present_scores<'a>(
    peaks: impl Iterator<Item = &'a PeakRecord> + 'a,
) -> impl Iterator<Item = f64> + 'a {
    peaks
        .map(|p| p.accessibility_score)
        .filter(|s| !s.is_nan())
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mu = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - mu).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

// ---------------------------------------------------------------------------
// Enhancer summary table
// ---------------------------------------------------------------------------

/// One line of the overview table shown when no single enhancer is chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancerSummary {
    pub enhancer_id: String,
    pub locus: Locus,
    pub cell_types: usize,
    pub mean_score: Option<f64>,
    pub max_score: Option<f64>,
}

/// Summarise each listed enhancer that has peak data, keeping list order.
pub fn summarize_enhancers(datasets: &Datasets, enhancers: &[String]) -> Vec<EnhancerSummary> {
    let mut by_enhancer: BTreeMap<&str, Vec<&PeakRecord>> = BTreeMap::new();
    for p in &datasets.peaks {
        by_enhancer.entry(p.enhancer_id.as_str()).or_default().push(p);
    }

    enhancers
        .iter()
        .filter_map(|id| {
            let peaks = by_enhancer.get(id.as_str())?;
            let first = peaks.first()?;
            let scores: Vec<f64> = present_scores(peaks.iter().copied()).collect();
            let cell_types: BTreeSet<&str> =
                peaks.iter().filter_map(|p| p.cell_type.as_deref()).collect();
            Some(EnhancerSummary {
                enhancer_id: id.clone(),
                locus: Locus::from(*first),
                cell_types: cell_types.len(),
                mean_score: mean(&scores),
                max_score: scores.iter().copied().reduce(f64::max),
            })
        })
        .collect()
}

/// Number of distinct sampled positions of an enhancer.
pub fn position_count(slice: &[PeakRecord]) -> usize {
    slice
        .iter()
        .map(|p| p.position_index)
        .collect::<BTreeSet<_>>()
        .len()
}
