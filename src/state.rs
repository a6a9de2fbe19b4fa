use hof_explorer::color::TrackPalette;
use hof_explorer::config::{AppConfig, DataPaths};
use hof_explorer::data::filter::{self, Criteria, FilterOptions, FilterOutcome};
use hof_explorer::data::loader;
use hof_explorer::data::model::{Datasets, DatasetOverview, EnhancerMetadataRow, Locus, Selection};
use hof_explorer::data::stats::{self, EnhancerSummary, SliceStats};
use hof_explorer::data::tracks::{self, TrackOutcome};

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// Everything shown for one selected enhancer.
pub struct EnhancerDetail {
    pub enhancer_id: String,
    pub metadata: Option<EnhancerMetadataRow>,
    pub locus: Option<Locus>,
    pub cell_types: usize,
    pub positions: usize,
    /// Cell type the peak slice was restricted to, if any.
    pub cell_type: Option<String>,
    /// `None` when the enhancer has no peaks under the current filters.
    pub peaks: Option<PeakView>,
}

pub struct PeakView {
    pub tracks: TrackOutcome,
    pub stats: SliceStats,
}

/// What the central panel shows.
pub enum MainView {
    NoData,
    NoMatches,
    Summary(Vec<EnhancerSummary>),
    Detail(Vec<EnhancerDetail>),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// Loaded datasets (None until the user loads a folder).
    pub datasets: Option<Datasets>,

    pub options: FilterOptions,
    pub overview: Option<DatasetOverview>,
    pub palette: TrackPalette,

    /// Current filter selections.
    pub criteria: Criteria,

    /// Result of the last filter run.
    pub outcome: FilterOutcome,

    pub view: MainView,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let mut state = Self {
            config,
            datasets: None,
            options: FilterOptions::default(),
            overview: None,
            palette: TrackPalette::default(),
            criteria: Criteria::default(),
            outcome: FilterOutcome::default(),
            view: MainView::NoData,
            status_message: None,
        };
        if let Some(paths) = state.config.startup_paths() {
            state.load(&paths);
        }
        state
    }

    /// Load the three tables and reset the filters.  Failures are kept as
    /// a status message.
    pub fn load(&mut self, paths: &DataPaths) {
        match loader::load_datasets(paths) {
            Ok(datasets) => self.set_datasets(datasets),
            Err(e) => {
                log::error!("Failed to load data: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest newly loaded datasets, initialise filters and colours.
    pub fn set_datasets(&mut self, datasets: Datasets) {
        self.options = FilterOptions::from_datasets(&datasets);
        self.overview = Some(datasets.overview());
        self.palette = TrackPalette::new(&self.options.cell_types);
        self.criteria = Criteria::default();
        self.datasets = Some(datasets);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the filter outcome and the view after a criteria change.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.datasets else {
            self.view = MainView::NoData;
            return;
        };
        self.outcome = filter::apply(ds, &self.criteria);
        self.view = if self.outcome.is_empty() {
            MainView::NoMatches
        } else if self.criteria.enhancer.is_all() {
            MainView::Summary(stats::summarize_enhancers(ds, &self.outcome.enhancers))
        } else {
            MainView::Detail(
                self.outcome
                    .enhancers
                    .iter()
                    .map(|id| enhancer_detail(ds, &self.outcome, id, &self.criteria.cell_type))
                    .collect(),
            )
        };
    }

    pub fn set_selection(&mut self, which: CriterionKind, value: Selection) {
        let slot = match which {
            CriterionKind::Enhancer => &mut self.criteria.enhancer,
            CriterionKind::Cargo => &mut self.criteria.cargo,
            CriterionKind::Experiment => &mut self.criteria.experiment,
            CriterionKind::Gene => &mut self.criteria.gene,
            CriterionKind::CellType => &mut self.criteria.cell_type,
        };
        if *slot != value {
            *slot = value;
            self.refilter();
        }
    }

    pub fn reset_filters(&mut self) {
        self.criteria = Criteria::default();
        self.refilter();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionKind {
    Enhancer,
    Cargo,
    Experiment,
    Gene,
    CellType,
}

fn enhancer_detail(
    ds: &Datasets,
    outcome: &FilterOutcome,
    enhancer_id: &str,
    cell_type: &Selection,
) -> EnhancerDetail {
    let all_peaks = ds.peak_slice(enhancer_id, &Selection::All);
    let overall = stats::slice_stats(&all_peaks);
    let locus = ds.locus_for(enhancer_id);

    let slice = ds.peak_slice(enhancer_id, cell_type);
    let peaks = match (&locus, slice.is_empty()) {
        (Some(locus), false) => Some(PeakView {
            tracks: tracks::render_or_fallback(&slice, locus),
            stats: stats::slice_stats(&slice),
        }),
        _ => None,
    };

    EnhancerDetail {
        enhancer_id: enhancer_id.to_string(),
        metadata: outcome.metadata_for(enhancer_id).cloned(),
        locus,
        cell_types: overall.cell_type_count,
        positions: stats::position_count(&all_peaks),
        cell_type: cell_type.as_only().map(str::to_string),
        peaks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hof_explorer::data::model::{HofMembership, PeakRecord};

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn peak(id: &str, cell_type: Option<&str>, position: i64) -> PeakRecord {
        PeakRecord {
            enhancer_id: id.into(),
            chr: "chr3".into(),
            start: 10,
            end: 60,
            cell_type: cell_type.map(String::from),
            position_index: position,
            accessibility_score: 0.5,
        }
    }

    #[fixture]
    fn state() -> AppState {
        let mut state = AppState::new(AppConfig::default());
        state.set_datasets(Datasets {
            metadata: vec![EnhancerMetadataRow {
                enhancer_id: "e1".into(),
                cargo: Some("AAV".into()),
                ..Default::default()
            }],
            peaks: vec![
                peak("e1", Some("1-Exc"), 0),
                peak("e1", Some("Astro"), 1),
                peak("e2", Some("1-Exc"), 0),
                peak("e2", None, 1),
            ],
            hof: HofMembership::new(["e1", "e2"]),
        });
        state
    }

    #[rstest]
    fn test_all_enhancers_shows_summary(state: AppState) {
        let MainView::Summary(rows) = &state.view else {
            panic!("expected summary");
        };
        let ids: Vec<&str> = rows.iter().map(|r| r.enhancer_id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2"]);
    }

    #[rstest]
    fn test_summary_is_sorted_by_id() {
        let mut state = AppState::new(AppConfig::default());
        state.set_datasets(Datasets {
            peaks: vec![
                peak("e2", Some("1-Exc"), 0),
                peak("e10", Some("1-Exc"), 0),
                peak("e1", Some("Astro"), 0),
            ],
            hof: HofMembership::new(["e2", "e10", "e1"]),
            ..Default::default()
        });
        let MainView::Summary(rows) = &state.view else {
            panic!("expected summary");
        };
        let ids: Vec<&str> = rows.iter().map(|r| r.enhancer_id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e10", "e2"]);
        assert_eq!(state.options.enhancers, vec!["e1", "e10", "e2"]);
    }

    #[rstest]
    fn test_unmatched_cargo_reports_no_matches(mut state: AppState) {
        state.set_selection(CriterionKind::Cargo, Selection::only("Lenti"));
        assert!(matches!(state.view, MainView::NoMatches));
        state.reset_filters();
        assert!(matches!(state.view, MainView::Summary(_)));
    }

    #[rstest]
    fn test_null_cell_type_shows_fallback_table(mut state: AppState) {
        state.set_selection(CriterionKind::Enhancer, Selection::only("e2"));
        let MainView::Detail(details) = &state.view else {
            panic!("expected detail");
        };
        let peaks = details[0].peaks.as_ref().unwrap();
        assert!(matches!(peaks.tracks, TrackOutcome::Fallback { .. }));
        assert_eq!(peaks.stats.cell_type_count, 1);
    }

    #[rstest]
    fn test_cell_type_restricts_tracks(mut state: AppState) {
        state.set_selection(CriterionKind::Enhancer, Selection::only("e1"));
        state.set_selection(CriterionKind::CellType, Selection::only("Astro"));
        let MainView::Detail(details) = &state.view else {
            panic!("expected detail");
        };
        let detail = &details[0];
        assert_eq!(detail.cell_types, 2);
        assert_eq!(detail.metadata.as_ref().and_then(|m| m.cargo.as_deref()), Some("AAV"));
        let TrackOutcome::Figure(figure) = &detail.peaks.as_ref().unwrap().tracks else {
            panic!("expected figure");
        };
        assert_eq!(figure.tracks.len(), 1);
        assert_eq!(figure.tracks[0].cell_type, "Astro");
    }
}
