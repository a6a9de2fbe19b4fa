use std::collections::BTreeSet;

use super::model::{Datasets, EnhancerMetadataRow, MetadataField, Selection, sorted_cell_types};

// ---------------------------------------------------------------------------
// Criteria: one selection per filter control
// ---------------------------------------------------------------------------

/// The user's current filter selections.  `Default` selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Criteria {
    pub enhancer: Selection,
    pub cargo: Selection,
    pub experiment: Selection,
    pub gene: Selection,
    /// Restricts which peak rows are shown; never narrows the enhancer set.
    pub cell_type: Selection,
}

impl Criteria {
    fn metadata_selections(&self) -> [(MetadataField, &Selection); 3] {
        [
            (MetadataField::Cargo, &self.cargo),
            (MetadataField::Experiment, &self.experiment),
            (MetadataField::ProximalGene, &self.gene),
        ]
    }
}

// ---------------------------------------------------------------------------
// Filter options
// ---------------------------------------------------------------------------

/// Values offered by each filter control (without the leading "All").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub enhancers: Vec<String>,
    pub cargos: Vec<String>,
    pub experiments: Vec<String>,
    pub genes: Vec<String>,
    pub cell_types: Vec<String>,
}

impl FilterOptions {
    /// Build the option lists.  Metadata-derived lists only consider rows of
    /// enhancers in the HOF set; absent values are skipped.
    pub fn from_datasets(datasets: &Datasets) -> Self {
        let in_scope: Vec<&EnhancerMetadataRow> = datasets
            .metadata
            .iter()
            .filter(|m| datasets.hof.contains(&m.enhancer_id))
            .collect();
        let distinct = |field: MetadataField| -> Vec<String> {
            in_scope
                .iter()
                .filter_map(|m| m.field(field))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(str::to_string)
                .collect()
        };

        FilterOptions {
            enhancers: datasets.hof.ids().iter().cloned().collect(),
            cargos: distinct(MetadataField::Cargo),
            experiments: distinct(MetadataField::Experiment),
            genes: distinct(MetadataField::ProximalGene),
            cell_types: sorted_cell_types(
                datasets.peaks.iter().filter_map(|p| p.cell_type.as_deref()),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter outcome
// ---------------------------------------------------------------------------

/// Enhancers passing the criteria, and the metadata rows of exactly those.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    /// Sorted, always a subset of the HOF set.
    pub enhancers: Vec<String>,
    /// Every metadata row of a passing enhancer, in table order.
    pub metadata: Vec<EnhancerMetadataRow>,
}

impl FilterOutcome {
    /// An empty outcome is a normal result the caller reports to the user.
    pub fn is_empty(&self) -> bool {
        self.enhancers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.enhancers.len()
    }

    /// Authoritative metadata row for an enhancer: the first one in table
    /// order.  Later duplicates are not reconciled.
    pub fn metadata_for(&self, enhancer_id: &str) -> Option<&EnhancerMetadataRow> {
        self.metadata.iter().find(|m| m.enhancer_id == enhancer_id)
    }
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

/// Compute the enhancers in scope for `criteria`.
///
/// * A specific enhancer short-circuits the other criteria; it passes only
///   if it belongs to the HOF set.
/// * Otherwise each selected metadata field narrows the metadata rows by
///   equality, and the ids of the surviving rows are intersected with the
///   HOF set.  "All" is a no-op.
/// * `cell_type` is applied later, to the peak slice.
pub fn apply(datasets: &Datasets, criteria: &Criteria) -> FilterOutcome {
    let hof = datasets.hof.ids();

    let ids: BTreeSet<&str> = match criteria.enhancer.as_only() {
        Some(id) => hof.iter().map(String::as_str).filter(|h| *h == id).collect(),
        None => {
            let mut ids: BTreeSet<&str> = hof.iter().map(String::as_str).collect();
            let mut rows: Vec<&EnhancerMetadataRow> = datasets.metadata.iter().collect();
            for (field, selection) in criteria.metadata_selections() {
                if selection.is_all() {
                    continue;
                }
                rows.retain(|m| selection.matches(m.field(field)));
                let surviving: BTreeSet<&str> =
                    rows.iter().map(|m| m.enhancer_id.as_str()).collect();
                ids = ids.intersection(&surviving).copied().collect();
            }
            ids
        }
    };

    let metadata = datasets
        .metadata
        .iter()
        .filter(|m| ids.contains(m.enhancer_id.as_str()))
        .cloned()
        .collect();
    let outcome = FilterOutcome {
        enhancers: ids.into_iter().map(str::to_string).collect(),
        metadata,
    };
    log::debug!("filter {criteria:?} -> {} enhancers", outcome.len());
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{HofMembership, PeakRecord};

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn meta(id: &str, cargo: &str, experiment: &str, gene: &str) -> EnhancerMetadataRow {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        EnhancerMetadataRow {
            enhancer_id: id.into(),
            cargo: opt(cargo),
            experiment: opt(experiment),
            proximal_gene: opt(gene),
            ..Default::default()
        }
    }

    fn peak(id: &str, cell_type: &str) -> PeakRecord {
        PeakRecord {
            enhancer_id: id.into(),
            chr: "chr1".into(),
            start: 100,
            end: 200,
            cell_type: Some(cell_type.into()),
            position_index: 0,
            accessibility_score: 0.5,
        }
    }

    #[fixture]
    fn datasets() -> Datasets {
        Datasets {
            metadata: vec![
                meta("e1", "AAV", "exp1", "Gad1"),
                meta("e1", "AAV", "exp2", "Gad1"),
                meta("e2", "AAV", "exp1", "Slc17a7"),
                meta("e3", "Plasmid", "exp2", ""),
                // e9 is not in the HOF set.
                meta("e9", "Lenti", "exp9", "Pvalb"),
            ],
            peaks: vec![peak("e1", "10-Inh"), peak("e1", "Astro"), peak("e2", "2-Exc")],
            hof: HofMembership::new(["e1", "e2", "e3", "e4"]),
        }
    }

    fn criteria(cargo: &str, experiment: &str, gene: &str) -> Criteria {
        let sel = |s: &str| {
            if s == "All" {
                Selection::All
            } else {
                Selection::only(s)
            }
        };
        Criteria {
            cargo: sel(cargo),
            experiment: sel(experiment),
            gene: sel(gene),
            ..Default::default()
        }
    }

    #[rstest]
    fn test_options_restricted_to_hof(datasets: Datasets) {
        let options = FilterOptions::from_datasets(&datasets);
        assert_eq!(options.enhancers, vec!["e1", "e2", "e3", "e4"]);
        assert_eq!(options.cargos, vec!["AAV", "Plasmid"]);
        assert_eq!(options.experiments, vec!["exp1", "exp2"]);
        assert_eq!(options.genes, vec!["Gad1", "Slc17a7"]);
        assert_eq!(options.cell_types, vec!["2-Exc", "10-Inh", "Astro"]);
    }

    #[rstest]
    fn test_no_criteria_selects_whole_hof(datasets: Datasets) {
        let outcome = apply(&datasets, &Criteria::default());
        assert_eq!(outcome.enhancers, vec!["e1", "e2", "e3", "e4"]);
        assert_eq!(outcome.metadata.len(), 4);
    }

    #[rstest]
    #[case(criteria("AAV", "All", "All"), vec!["e1", "e2"])]
    #[case(criteria("AAV", "exp2", "All"), vec!["e1"])]
    #[case(criteria("All", "exp1", "Slc17a7"), vec!["e2"])]
    #[case(criteria("Plasmid", "exp1", "All"), vec![])]
    fn test_criteria_intersect(
        datasets: Datasets,
        #[case] criteria: Criteria,
        #[case] expected: Vec<&str>,
    ) {
        assert_eq!(apply(&datasets, &criteria).enhancers, expected);
    }

    #[rstest]
    fn test_specific_enhancer_short_circuits(datasets: Datasets) {
        let criteria = Criteria {
            enhancer: Selection::only("e3"),
            cargo: Selection::only("AAV"),
            ..Default::default()
        };
        let outcome = apply(&datasets, &criteria);
        assert_eq!(outcome.enhancers, vec!["e3"]);
        assert_eq!(outcome.metadata, vec![meta("e3", "Plasmid", "exp2", "")]);
    }

    #[rstest]
    fn test_first_metadata_row_wins(datasets: Datasets) {
        let outcome = apply(&datasets, &criteria("All", "exp2", "All"));
        assert_eq!(outcome.enhancers, vec!["e1", "e3"]);
        // Both e1 rows are kept, the first one is authoritative.
        assert_eq!(outcome.metadata.len(), 3);
        let e1 = outcome.metadata_for("e1").unwrap();
        assert_eq!(e1.experiment.as_deref(), Some("exp1"));
        assert!(outcome.metadata_for("e2").is_none());
    }

    #[rstest]
    fn test_specific_enhancer_outside_hof_is_empty(datasets: Datasets) {
        let criteria = Criteria {
            enhancer: Selection::only("e9"),
            ..Default::default()
        };
        assert!(apply(&datasets, &criteria).is_empty());
    }

    #[rstest]
    fn test_cargo_only_outside_hof_gives_empty_result(datasets: Datasets) {
        let outcome = apply(&datasets, &criteria("Lenti", "All", "All"));
        assert!(outcome.is_empty());
        assert!(outcome.metadata.is_empty());
    }

    #[rstest]
    fn test_cell_type_does_not_narrow(datasets: Datasets) {
        let criteria = Criteria {
            cell_type: Selection::only("Astro"),
            ..Default::default()
        };
        assert_eq!(apply(&datasets, &criteria).len(), 4);
    }

    #[rstest]
    fn test_subset_and_monotonic_narrowing(datasets: Datasets) {
        let hof = datasets.hof.ids().clone();
        let options = FilterOptions::from_datasets(&datasets);
        let with_all = |v: &[String]| {
            std::iter::once("All".to_string())
                .chain(v.iter().cloned())
                .collect::<Vec<_>>()
        };
        let fields = [
            with_all(&options.cargos),
            with_all(&options.experiments),
            with_all(&options.genes),
        ];
        for cargo in &fields[0] {
            for experiment in &fields[1] {
                for gene in &fields[2] {
                    let base = [cargo.as_str(), experiment.as_str(), gene.as_str()];
                    let base_ids = apply(&datasets, &criteria(base[0], base[1], base[2])).enhancers;
                    assert!(base_ids.iter().all(|id| hof.contains(id)));
                    // Idempotent on identical inputs.
                    assert_eq!(
                        apply(&datasets, &criteria(base[0], base[1], base[2])).enhancers,
                        base_ids
                    );

                    // Replacing any "All" with a concrete value never widens.
                    for (slot, values) in fields.iter().enumerate() {
                        if base[slot] != "All" {
                            continue;
                        }
                        for value in &values[1..] {
                            let mut narrowed = base;
                            narrowed[slot] = value.as_str();
                            let narrowed_ids =
                                apply(&datasets, &criteria(narrowed[0], narrowed[1], narrowed[2]))
                                    .enhancers;
                            assert!(
                                narrowed_ids.iter().all(|id| base_ids.contains(id)),
                                "{narrowed:?} widened {base:?}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[rstest]
    fn test_empty_metadata_with_criterion_is_empty() {
        let datasets = Datasets {
            hof: HofMembership::new(["e1"]),
            ..Default::default()
        };
        assert!(apply(&datasets, &criteria("AAV", "All", "All")).is_empty());
        assert_eq!(apply(&datasets, &Criteria::default()).enhancers, vec!["e1"]);
    }
}
