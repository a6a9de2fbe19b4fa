use std::collections::BTreeMap;

use thiserror::Error;

use super::model::{Locus, PeakRecord, cmp_cell_types};

/// Rows shown in the table that replaces a figure which could not be built.
pub const FALLBACK_ROWS: usize = 20;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("no peak rows to draw")]
    EmptySlice,

    #[error("row {row} has no cell type")]
    MissingCellType { row: usize },

    #[error("row {row} has non-finite accessibility score {score}")]
    NonFiniteScore { row: usize, score: f64 },

    #[error("invalid genomic window {0}: start must be below end")]
    InvalidLocus(Locus),

    #[error("slice mixes enhancers '{expected}' and '{found}'")]
    MixedEnhancers { expected: String, found: String },
}

// ---------------------------------------------------------------------------
// Figure model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub position_index: i64,
    /// `position_index` mapped into the enhancer's genomic window.
    pub genomic_position: f64,
    pub score: f64,
}

/// One cell type's accessibility profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub cell_type: String,
    /// Sorted by `position_index`.
    pub points: Vec<TrackPoint>,
    /// Upper bound of this track's own y-axis.
    pub y_max: f64,
}

impl Track {
    /// A lone point is drawn as a marker instead of a line.
    pub fn is_single_point(&self) -> bool {
        self.points.len() == 1
    }
}

/// Stacked per-cell-type tracks sharing one genomic x-axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackFigure {
    pub enhancer_id: String,
    pub locus: Locus,
    pub tracks: Vec<Track>,
}

impl TrackFigure {
    pub fn title(&self) -> String {
        format!("{} ({})", self.enhancer_id, self.locus)
    }

    /// Shared x-domain.
    pub fn x_range(&self) -> (f64, f64) {
        (self.locus.start as f64, self.locus.end as f64)
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Build the figure for one enhancer's peak slice.
pub fn render(slice: &[PeakRecord], locus: &Locus) -> Result<TrackFigure, RenderError> {
    let first = slice.first().ok_or(RenderError::EmptySlice)?;
    if locus.start >= locus.end {
        return Err(RenderError::InvalidLocus(locus.clone()));
    }

    let mut by_cell_type: BTreeMap<&str, Vec<(i64, f64)>> = BTreeMap::new();
    for (row, p) in slice.iter().enumerate() {
        if p.enhancer_id != first.enhancer_id {
            return Err(RenderError::MixedEnhancers {
                expected: first.enhancer_id.clone(),
                found: p.enhancer_id.clone(),
            });
        }
        let cell_type = p
            .cell_type
            .as_deref()
            .ok_or(RenderError::MissingCellType { row })?;
        if !p.accessibility_score.is_finite() {
            return Err(RenderError::NonFiniteScore {
                row,
                score: p.accessibility_score,
            });
        }
        by_cell_type
            .entry(cell_type)
            .or_default()
            .push((p.position_index, p.accessibility_score));
    }

    let (lo, hi) = slice
        .iter()
        .map(|p| p.position_index)
        .fold((i64::MAX, i64::MIN), |(lo, hi), i| (lo.min(i), hi.max(i)));
    // Float arithmetic: the index span may not fit in an i64.
    let to_genomic = |index: i64| -> f64 {
        let (start, end) = (locus.start as f64, locus.end as f64);
        if hi == lo {
            (start + end) / 2.0
        } else {
            start + (index as f64 - lo as f64) / (hi as f64 - lo as f64) * (end - start)
        }
    };

    let mut cell_types: Vec<&str> = by_cell_type.keys().copied().collect();
    cell_types.sort_by(|a, b| cmp_cell_types(a, b));

    let tracks = cell_types
        .into_iter()
        .map(|cell_type| {
            let mut raw = by_cell_type.remove(cell_type).unwrap_or_default();
            raw.sort_by_key(|(index, _)| *index);
            let points: Vec<TrackPoint> = raw
                .into_iter()
                .map(|(position_index, score)| TrackPoint {
                    position_index,
                    genomic_position: to_genomic(position_index),
                    score,
                })
                .collect();
            let peak = points.iter().map(|p| p.score).fold(0.0, f64::max);
            Track {
                cell_type: cell_type.to_string(),
                points,
                y_max: if peak > 0.0 { peak } else { 1.0 },
            }
        })
        .collect();

    Ok(TrackFigure {
        enhancer_id: first.enhancer_id.clone(),
        locus: locus.clone(),
        tracks,
    })
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// A row of the tabular stand-in for a figure.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackRow {
    pub cell_type: Option<String>,
    pub position_index: i64,
    pub accessibility_score: f64,
}

/// Either the figure, or the first rows of the slice with the reason the
/// figure could not be built.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    Figure(TrackFigure),
    Fallback { reason: String, rows: Vec<FallbackRow> },
}

/// Render, or degrade to the tabular view.  Never fails.
pub fn render_or_fallback(slice: &[PeakRecord], locus: &Locus) -> TrackOutcome {
    match render(slice, locus) {
        Ok(figure) => TrackOutcome::Figure(figure),
        Err(e) => {
            log::warn!("Falling back to peak table: {e}");
            TrackOutcome::Fallback {
                reason: e.to_string(),
                rows: slice
                    .iter()
                    .take(FALLBACK_ROWS)
                    .map(|p| FallbackRow {
                        cell_type: p.cell_type.clone(),
                        position_index: p.position_index,
                        accessibility_score: p.accessibility_score,
                    })
                    .collect(),
            }
        }
    }
}
