use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Column names of the three input tables
// ---------------------------------------------------------------------------

pub const ENHANCER_ID: &str = "enhancer_id";

pub const CARGO: &str = "cargo";
pub const EXPERIMENT: &str = "experiment";
pub const PROXIMAL_GENE: &str = "proximal_gene";
pub const IMAGE_LINK: &str = "Image_link";
pub const NEUROGLANCER_1: &str = "Neuroglancer 1";
pub const NEUROGLANCER_3: &str = "Neuroglancer 3";
pub const NEUROGLANCER_URL: &str = "neuroglancer_url";
pub const CORONAL_MIP: &str = "Coronal_MIP";
pub const SAGITTAL_MIP: &str = "Sagittal_MIP";

pub const CHR: &str = "chr";
pub const START: &str = "start";
pub const END: &str = "end";
pub const CELL_TYPE: &str = "cell_type";
pub const POSITION_INDEX: &str = "position_index";
pub const ACCESSIBILITY_SCORE: &str = "accessibility_score";

/// Rank given to cell-type labels without a leading number.  Always sorts
/// after every label that has one.
pub const NON_NUMERIC_RANK: u64 = u64::MAX;

// ---------------------------------------------------------------------------
// Schema errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("{table} table is missing required column '{column}'")]
    MissingColumn { table: &'static str, column: &'static str },

    #[error("{table} table, row {row}: column '{column}' expected {expected}, got {found}")]
    CellType {
        table: &'static str,
        row: usize,
        column: &'static str,
        expected: &'static str,
        found: String,
    },
}

// ---------------------------------------------------------------------------
// CellValue – a single cell of a loaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed table cell, the common currency of every file format
/// the loader understands.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Text form of the cell.  Null and empty strings are treated alike as
    /// "absent", which is how the source tables encode missing labels.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) if s.is_empty() => None,
            CellValue::Float(v) if v.is_nan() => None,
            other => Some(other.to_string()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            CellValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

static NULL_CELL: CellValue = CellValue::Null;

// ---------------------------------------------------------------------------
// Table – a loaded file before it is given a schema
// ---------------------------------------------------------------------------

/// Column-named rows of cells, as read from any supported file format.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `(row, column)`; a missing column reads as null.
    fn cell(&self, row: usize, column: Option<usize>) -> &CellValue {
        column
            .and_then(|c| self.rows[row].get(c))
            .unwrap_or(&NULL_CELL)
    }
}

// ---------------------------------------------------------------------------
// EnhancerMetadataRow
// ---------------------------------------------------------------------------

/// One row of the metadata table.  Several rows may share an `enhancer_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnhancerMetadataRow {
    pub enhancer_id: String,
    pub cargo: Option<String>,
    pub experiment: Option<String>,
    pub proximal_gene: Option<String>,
    pub image_link: Option<String>,
    pub neuroglancer_1: Option<String>,
    pub neuroglancer_3: Option<String>,
    pub neuroglancer_url: Option<String>,
    pub coronal_mip: Option<String>,
    pub sagittal_mip: Option<String>,
}

/// Metadata field a filter criterion can select on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    Cargo,
    Experiment,
    ProximalGene,
}

impl EnhancerMetadataRow {
    pub fn field(&self, field: MetadataField) -> Option<&str> {
        match field {
            MetadataField::Cargo => self.cargo.as_deref(),
            MetadataField::Experiment => self.experiment.as_deref(),
            MetadataField::ProximalGene => self.proximal_gene.as_deref(),
        }
    }

    /// Imaging links that look like URLs, titled, in display order.
    pub fn imaging_links(&self) -> Vec<(&'static str, &str)> {
        [
            ("Contact Sheet", &self.image_link),
            ("Neuroglancer 1", &self.neuroglancer_1),
            ("Neuroglancer 3", &self.neuroglancer_3),
            ("Viewer", &self.neuroglancer_url),
            ("Coronal MIP", &self.coronal_mip),
            ("Sagittal MIP", &self.sagittal_mip),
        ]
        .into_iter()
        .filter_map(|(title, link)| {
            link.as_deref()
                .filter(|url| url.starts_with("http"))
                .map(|url| (title, url))
        })
        .collect()
    }

    /// Read the metadata table.  Rows without an id are skipped; a table
    /// without an `enhancer_id` column yields no rows.
    pub fn from_table(table: &Table) -> Vec<Self> {
        let Some(id) = table.column_index(ENHANCER_ID) else {
            log::warn!("Metadata table has no '{ENHANCER_ID}' column; no metadata is usable");
            return Vec::new();
        };
        let cols = [
            CARGO,
            EXPERIMENT,
            PROXIMAL_GENE,
            IMAGE_LINK,
            NEUROGLANCER_1,
            NEUROGLANCER_3,
            NEUROGLANCER_URL,
            CORONAL_MIP,
            SAGITTAL_MIP,
        ]
        .map(|name| table.column_index(name));

        (0..table.len())
            .filter_map(|row| {
                let enhancer_id = table.cell(row, Some(id)).as_text()?;
                let [cargo, experiment, gene, image, ng1, ng3, ng_url, coronal, sagittal] =
                    cols.map(|c| table.cell(row, c).as_text());
                Some(EnhancerMetadataRow {
                    enhancer_id,
                    cargo,
                    experiment,
                    proximal_gene: gene,
                    image_link: image,
                    neuroglancer_1: ng1,
                    neuroglancer_3: ng3,
                    neuroglancer_url: ng_url,
                    coronal_mip: coronal,
                    sagittal_mip: sagittal,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// PeakRecord
// ---------------------------------------------------------------------------

/// One accessibility measurement: enhancer × cell type × sampled position.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakRecord {
    pub enhancer_id: String,
    pub chr: String,
    pub start: i64,
    pub end: i64,
    /// `None` when the source cell is null; such rows cannot be drawn.
    pub cell_type: Option<String>,
    pub position_index: i64,
    pub accessibility_score: f64,
}

impl PeakRecord {
    /// Read the peak table.  A missing `cell_type` column reads as null in
    /// every row; the other columns are required.
    pub fn from_table(table: &Table) -> Result<Vec<Self>, SchemaError> {
        let require = |column: &'static str| {
            table.column_index(column).ok_or(SchemaError::MissingColumn {
                table: "peak",
                column,
            })
        };
        let id = require(ENHANCER_ID)?;
        let chr = require(CHR)?;
        let start = require(START)?;
        let end = require(END)?;
        let cell_type = table.column_index(CELL_TYPE);
        if cell_type.is_none() {
            log::warn!("Peak table has no '{CELL_TYPE}' column; tracks cannot be drawn");
        }
        let position = require(POSITION_INDEX)?;
        let score = require(ACCESSIBILITY_SCORE)?;

        let bad = |row: usize, column: &'static str, expected: &'static str, found: &CellValue| {
            SchemaError::CellType {
                table: "peak",
                row,
                column,
                expected,
                found: found.to_string(),
            }
        };
        let text = |row: usize, col: usize, name: &'static str| {
            let cell = table.cell(row, Some(col));
            cell.as_text().ok_or_else(|| bad(row, name, "text", cell))
        };
        let int = |row: usize, col: usize, name: &'static str| {
            let cell = table.cell(row, Some(col));
            cell.as_i64().ok_or_else(|| bad(row, name, "integer", cell))
        };

        (0..table.len())
            .map(|row| {
                let score_cell = table.cell(row, Some(score));
                // Null scores are kept as NaN and skipped by the aggregates.
                let accessibility_score = match score_cell {
                    CellValue::Null => f64::NAN,
                    cell => cell
                        .as_f64()
                        .ok_or_else(|| bad(row, ACCESSIBILITY_SCORE, "number", cell))?,
                };
                Ok(PeakRecord {
                    enhancer_id: text(row, id, ENHANCER_ID)?,
                    chr: text(row, chr, CHR)?,
                    start: int(row, start, START)?,
                    end: int(row, end, END)?,
                    cell_type: table.cell(row, cell_type).as_text(),
                    position_index: int(row, position, POSITION_INDEX)?,
                    accessibility_score,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// HofMembership
// ---------------------------------------------------------------------------

/// The curated set of enhancer ids in scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HofMembership {
    ids: BTreeSet<String>,
}

impl HofMembership {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        HofMembership {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Read the HOF table.  A table without an `enhancer_id` column yields an
    /// empty set rather than an error.
    pub fn from_table(table: &Table) -> Self {
        match table.column_index(ENHANCER_ID) {
            Some(col) => HofMembership::new(
                (0..table.len()).filter_map(|row| table.cell(row, Some(col)).as_text()),
            ),
            None => {
                log::warn!("HOF table has no '{ENHANCER_ID}' column; no enhancers are in scope");
                HofMembership::default()
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Datasets – the three immutable snapshots of a session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Datasets {
    pub metadata: Vec<EnhancerMetadataRow>,
    pub peaks: Vec<PeakRecord>,
    pub hof: HofMembership,
}

/// Headline numbers shown above the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetOverview {
    pub total_enhancers: usize,
    pub cell_types: usize,
    pub peak_records: usize,
}

impl Datasets {
    pub fn overview(&self) -> DatasetOverview {
        let cell_types: BTreeSet<&str> = self
            .peaks
            .iter()
            .filter_map(|p| p.cell_type.as_deref())
            .collect();
        DatasetOverview {
            total_enhancers: self.hof.len(),
            cell_types: cell_types.len(),
            peak_records: self.peaks.len(),
        }
    }

    /// The enhancer's locus, taken from its first peak row.
    pub fn locus_for(&self, enhancer_id: &str) -> Option<Locus> {
        self.peaks
            .iter()
            .find(|p| p.enhancer_id == enhancer_id)
            .map(Locus::from)
    }

    /// Peak rows of one enhancer, optionally restricted to one cell type.
    pub fn peak_slice(&self, enhancer_id: &str, cell_type: &Selection) -> Vec<PeakRecord> {
        self.peaks
            .iter()
            .filter(|p| p.enhancer_id == enhancer_id)
            .filter(|p| cell_type.matches(p.cell_type.as_deref()))
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Locus
// ---------------------------------------------------------------------------

/// Genomic window of an enhancer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locus {
    pub chr: String,
    pub start: i64,
    pub end: i64,
}

impl Locus {
    pub fn length(&self) -> i64 {
        self.end - self.start
    }
}

impl From<&PeakRecord> for Locus {
    fn from(p: &PeakRecord) -> Self {
        Locus {
            chr: p.chr.clone(),
            start: p.start,
            end: p.end,
        }
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chr, self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Selection – one filter criterion
// ---------------------------------------------------------------------------

/// A criterion value: either no constraint, or one specific label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn only(value: impl Into<String>) -> Self {
        Selection::Only(value.into())
    }

    pub fn as_only(&self) -> Option<&str> {
        match self {
            Selection::All => None,
            Selection::Only(v) => Some(v),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// A null value only passes the "All" selection.
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(v) => value == Some(v.as_str()),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "All"),
            Selection::Only(v) => write!(f, "{v}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Cell-type ordering
// ---------------------------------------------------------------------------

/// Leading decimal number of a label, e.g. `"10-Inh"` → `Some(10)`.
pub fn leading_number(label: &str) -> Option<u64> {
    let digits = label.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    // Overlong digit runs still rank before non-numeric labels.
    Some(label[..digits].parse().unwrap_or(NON_NUMERIC_RANK - 1))
}

/// Order cell types by leading number, then lexically.
pub fn cmp_cell_types(a: &str, b: &str) -> Ordering {
    let rank = |s: &str| leading_number(s).unwrap_or(NON_NUMERIC_RANK);
    rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
}

/// Sort and deduplicate cell-type labels.
pub fn sorted_cell_types<'a, I>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut unique: Vec<String> = labels
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    unique.sort_by(|a, b| cmp_cell_types(a, b));
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn text(s: &str) -> CellValue {
        CellValue::String(s.to_string())
    }

    #[rstest]
    fn test_cell_type_ordering() {
        let sorted = sorted_cell_types(["3-Exc", "10-Inh", "Astro", "1-Exc"]);
        assert_eq!(sorted, vec!["1-Exc", "3-Exc", "10-Inh", "Astro"]);
    }

    #[rstest]
    fn test_cell_type_ordering_dedups_and_breaks_ties_lexically() {
        let sorted = sorted_cell_types(["Oligo", "2b", "Astro", "2a", "2a", "999x"]);
        assert_eq!(sorted, vec!["2a", "2b", "999x", "Astro", "Oligo"]);
    }

    #[rstest]
    #[case("10-Inh", Some(10))]
    #[case("007", Some(7))]
    #[case("Astro", None)]
    #[case("", None)]
    #[case("99999999999999999999999_L2", Some(NON_NUMERIC_RANK - 1))]
    fn test_leading_number(#[case] label: &str, #[case] expected: Option<u64>) {
        assert_eq!(leading_number(label), expected);
    }

    #[rstest]
    fn test_huge_leading_number_still_before_non_numeric() {
        assert_eq!(
            cmp_cell_types("99999999999999999999999_L2", "Astro"),
            Ordering::Less
        );
    }

    #[rstest]
    fn test_selection_matches() {
        assert!(Selection::All.matches(None));
        assert!(Selection::only("x").matches(Some("x")));
        assert!(!Selection::only("x").matches(Some("y")));
        assert!(!Selection::only("x").matches(None));
        assert_eq!(Selection::All.to_string(), "All");
    }

    #[rstest]
    fn test_metadata_from_table_tolerates_missing_optional_columns() {
        let table = Table {
            columns: vec![ENHANCER_ID.into(), CARGO.into()],
            rows: vec![
                vec![text("e1"), text("AAV")],
                vec![text("e2"), text("")],
                vec![CellValue::Null, text("AAV")],
            ],
        };
        let rows = EnhancerMetadataRow::from_table(&table);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cargo.as_deref(), Some("AAV"));
        assert_eq!(rows[1].cargo, None);
        assert_eq!(rows[0].experiment, None);
    }

    #[rstest]
    fn test_metadata_without_enhancer_id_is_empty() {
        let table = Table {
            columns: vec![CARGO.into(), EXPERIMENT.into()],
            rows: vec![vec![text("AAV"), text("Retro")]],
        };
        assert!(EnhancerMetadataRow::from_table(&table).is_empty());
    }

    #[rstest]
    fn test_peak_without_cell_type_column_reads_null() {
        let table = Table {
            columns: [ENHANCER_ID, CHR, START, END, POSITION_INDEX, ACCESSIBILITY_SCORE]
                .map(String::from)
                .to_vec(),
            rows: vec![vec![
                text("e1"),
                text("chr1"),
                CellValue::Integer(100),
                CellValue::Integer(600),
                CellValue::Integer(0),
                CellValue::Float(0.5),
            ]],
        };
        let peaks = PeakRecord::from_table(&table).unwrap();
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].cell_type, None);
    }

    #[rstest]
    fn test_peak_requires_position_columns() {
        let table = Table {
            columns: [ENHANCER_ID, CHR, START, END].map(String::from).to_vec(),
            rows: vec![],
        };
        assert_eq!(
            PeakRecord::from_table(&table).unwrap_err(),
            SchemaError::MissingColumn {
                table: "peak",
                column: POSITION_INDEX
            }
        );
    }

    #[rstest]
    fn test_peak_from_table() {
        let table = Table {
            columns: [
                ENHANCER_ID,
                CHR,
                START,
                END,
                CELL_TYPE,
                POSITION_INDEX,
                ACCESSIBILITY_SCORE,
            ]
            .map(String::from)
            .to_vec(),
            rows: vec![
                vec![
                    text("e1"),
                    text("chr1"),
                    CellValue::Integer(100),
                    CellValue::Integer(600),
                    text("1-Exc"),
                    CellValue::Float(3.0),
                    CellValue::Float(0.25),
                ],
                vec![
                    text("e1"),
                    text("chr1"),
                    CellValue::Integer(100),
                    CellValue::Integer(600),
                    CellValue::Null,
                    CellValue::Integer(4),
                    CellValue::Null,
                ],
            ],
        };
        let peaks = PeakRecord::from_table(&table).unwrap();
        assert_eq!(peaks[0].position_index, 3);
        assert_eq!(peaks[0].cell_type.as_deref(), Some("1-Exc"));
        assert_eq!(peaks[1].cell_type, None);
        assert!(peaks[1].accessibility_score.is_nan());
    }

    #[rstest]
    fn test_peak_bad_cell_is_reported_with_row() {
        let table = Table {
            columns: [
                ENHANCER_ID,
                CHR,
                START,
                END,
                CELL_TYPE,
                POSITION_INDEX,
                ACCESSIBILITY_SCORE,
            ]
            .map(String::from)
            .to_vec(),
            rows: vec![vec![
                text("e1"),
                text("chr1"),
                text("one hundred"),
                CellValue::Integer(600),
                text("1-Exc"),
                CellValue::Integer(0),
                CellValue::Float(0.1),
            ]],
        };
        let err = PeakRecord::from_table(&table).unwrap_err();
        assert!(matches!(err, SchemaError::CellType { row: 0, column: START, .. }));
    }

    #[rstest]
    fn test_hof_without_id_column_is_empty() {
        let table = Table {
            columns: vec!["name".into()],
            rows: vec![vec![text("e1")]],
        };
        assert!(HofMembership::from_table(&table).is_empty());
    }

    #[rstest]
    fn test_imaging_links_keep_http_only_in_order() {
        let row = EnhancerMetadataRow {
            enhancer_id: "e1".into(),
            sagittal_mip: Some("https://example.org/sag.png".into()),
            image_link: Some("http://example.org/sheet.png".into()),
            neuroglancer_1: Some("not a link".into()),
            ..Default::default()
        };
        assert_eq!(
            row.imaging_links(),
            vec![
                ("Contact Sheet", "http://example.org/sheet.png"),
                ("Sagittal MIP", "https://example.org/sag.png"),
            ]
        );
    }
}
