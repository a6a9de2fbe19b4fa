use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use hof_explorer::config::AppConfig;
use hof_explorer::data::model as col;
use parquet::arrow::ArrowWriter;

const CELL_TYPES: [&str; 10] = [
    "1-L2/3 IT",
    "2-L4/5 IT",
    "3-L5 ET",
    "4-L6 CT",
    "8-Pvalb",
    "9-Sst",
    "12-Vip",
    "21-Lamp5",
    "Astro",
    "Oligo",
];
const POSITIONS: i64 = 50;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}

struct Enhancer {
    id: String,
    chr: String,
    start: i64,
    in_hof: bool,
}

fn text_column(values: Vec<Option<String>>) -> ArrayRef {
    Arc::new(StringArray::from(values))
}

fn main() -> Result<()> {
    env_logger::init();
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let paths = AppConfig::default().paths_in(&out_dir);

    let mut rng = SimpleRng::new(42);
    let cargos = ["SYFP2", "SYFP2-FLAG", "tdTomato"];
    let experiments = ["retro-orbital", "stereotaxic"];
    let genes = ["Gad2", "Slc17a7", "Pvalb", "Sst", "Vip", ""];

    let enhancers: Vec<Enhancer> = (1..=24)
        .map(|i| Enhancer {
            id: format!("AiE{i:04}m"),
            chr: format!("chr{}", 1 + rng.below(19)),
            start: 3_000_000 + rng.below(150_000_000) as i64,
            // Every fourth enhancer is outside the curated set.
            in_hof: i % 4 != 0,
        })
        .collect();

    // ---- metadata (feather) ----
    let mut meta_ids = Vec::new();
    let mut meta_cargo = Vec::new();
    let mut meta_experiment = Vec::new();
    let mut meta_gene = Vec::new();
    let mut meta_image = Vec::new();
    for (i, e) in enhancers.iter().enumerate() {
        // Some enhancers carry a second, conflicting metadata record.
        let records = if i % 5 == 0 { 2 } else { 1 };
        for _ in 0..records {
            meta_ids.push(Some(e.id.clone()));
            meta_cargo.push(Some(cargos[rng.below(cargos.len())].to_string()));
            meta_experiment.push(Some(experiments[rng.below(experiments.len())].to_string()));
            let gene = genes[rng.below(genes.len())];
            meta_gene.push((!gene.is_empty()).then(|| gene.to_string()));
            meta_image.push(
                (i % 3 == 0).then(|| format!("https://example.org/contact_sheets/{}.png", e.id)),
            );
        }
    }
    // A cargo used only outside the curated set: selecting it matches nothing.
    meta_ids.push(Some("AiE9999m".to_string()));
    meta_cargo.push(Some("Cre".to_string()));
    meta_experiment.push(Some("stereotaxic".to_string()));
    meta_gene.push(None);
    meta_image.push(None);

    let meta_schema = Arc::new(Schema::new(vec![
        Field::new(col::ENHANCER_ID, DataType::Utf8, false),
        Field::new(col::CARGO, DataType::Utf8, true),
        Field::new(col::EXPERIMENT, DataType::Utf8, true),
        Field::new(col::PROXIMAL_GENE, DataType::Utf8, true),
        Field::new(col::IMAGE_LINK, DataType::Utf8, true),
    ]));
    let meta_batch = RecordBatch::try_new(
        meta_schema.clone(),
        vec![
            text_column(meta_ids),
            text_column(meta_cargo),
            text_column(meta_experiment),
            text_column(meta_gene),
            text_column(meta_image),
        ],
    )
    .context("building metadata batch")?;
    let file = std::fs::File::create(&paths.metadata).context("creating metadata file")?;
    let mut writer = FileWriter::try_new(file, &meta_schema).context("creating feather writer")?;
    writer.write(&meta_batch)?;
    writer.finish()?;
    log::info!("Wrote {} metadata rows to {}", meta_batch.num_rows(), paths.metadata.display());

    // ---- peaks (parquet) ----
    let mut ids = Vec::new();
    let mut chrs = Vec::new();
    let mut starts = Vec::new();
    let mut ends = Vec::new();
    let mut cell_types = Vec::new();
    let mut positions = Vec::new();
    let mut scores = Vec::new();
    for e in &enhancers {
        let width = 400 + rng.below(800) as i64;
        let summit = rng.next_f64() * POSITIONS as f64;
        for ct in CELL_TYPES {
            let amplitude = rng.next_f64().powi(2);
            for pos in 0..POSITIONS {
                ids.push(Some(e.id.clone()));
                chrs.push(Some(e.chr.clone()));
                starts.push(e.start);
                ends.push(e.start + width);
                cell_types.push(Some(ct.to_string()));
                positions.push(pos);
                let noise = rng.next_f64() * 0.02;
                scores.push(gaussian(pos as f64, summit, 6.0, amplitude) + noise);
            }
        }
    }
    let n_peaks = scores.len();

    let peak_schema = Arc::new(Schema::new(vec![
        Field::new(col::ENHANCER_ID, DataType::Utf8, false),
        Field::new(col::CHR, DataType::Utf8, false),
        Field::new(col::START, DataType::Int64, false),
        Field::new(col::END, DataType::Int64, false),
        Field::new(col::CELL_TYPE, DataType::Utf8, false),
        Field::new(col::POSITION_INDEX, DataType::Int64, false),
        Field::new(col::ACCESSIBILITY_SCORE, DataType::Float64, false),
    ]));
    let peak_batch = RecordBatch::try_new(
        peak_schema.clone(),
        vec![
            text_column(ids),
            text_column(chrs),
            Arc::new(Int64Array::from(starts)),
            Arc::new(Int64Array::from(ends)),
            text_column(cell_types),
            Arc::new(Int64Array::from(positions)),
            Arc::new(Float64Array::from(scores)),
        ],
    )
    .context("building peak batch")?;
    let file = std::fs::File::create(&paths.peaks).context("creating peak file")?;
    let mut writer = ArrowWriter::try_new(file, peak_schema, None).context("creating parquet writer")?;
    writer.write(&peak_batch)?;
    writer.close()?;
    log::info!("Wrote {n_peaks} peak records to {}", paths.peaks.display());

    // ---- HOF set (csv) ----
    let mut hof = csv::Writer::from_path(&paths.hof).context("creating HOF file")?;
    hof.write_record([col::ENHANCER_ID])?;
    for e in enhancers.iter().filter(|e| e.in_hof) {
        hof.write_record([e.id.as_str()])?;
    }
    hof.flush()?;
    log::info!(
        "Wrote {} HOF enhancers to {}",
        enhancers.iter().filter(|e| e.in_hof).count(),
        paths.hof.display()
    );

    println!(
        "Wrote {} enhancers ({n_peaks} peak records) to {}",
        enhancers.len(),
        out_dir.display()
    );
    Ok(())
}
