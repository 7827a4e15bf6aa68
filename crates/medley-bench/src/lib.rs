//! Synthetic record generator for benchmarking `medley-core`'s indexing
//! and query paths.
//!
//! Produces deterministic populations of near-duplicate name/address
//! records at a few size tiers, so the indexing and query benchmarks in
//! this crate can be compared run over run.
use std::collections::HashMap;

use medley_core::ID_t;
use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A relative population size for generated benchmark fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTier {
    /// 100 records.
    Small,
    /// 1,000 records.
    Medium,
    /// 10,000 records.
    Large,
    /// 100,000 records.
    XLarge,
}

impl SizeTier {
    /// Builds the [`GeneratorConfig`] for this tier, seeded with `seed`.
    pub fn config(self, seed: u64) -> GeneratorConfig {
        let record_count = match self {
            Self::Small => 100,
            Self::Medium => 1_000,
            Self::Large => 10_000,
            Self::XLarge => 100_000,
        };
        GeneratorConfig { record_count, seed }
    }
}

/// Parameters controlling synthetic record generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// How many records to produce.
    pub record_count: usize,
    /// RNG seed, for reproducible fixtures across runs.
    pub seed: u64,
}

const FIRST_NAMES: &[&str] = &["Alice", "Robert", "Freddie", "Maria", "Wei", "Olga", "Sam", "Priya"];
const LAST_NAMES: &[&str] = &["Smith", "Johnson", "Garcia", "Müller", "Nguyen", "Kowalski", "Lund"];
const CITIES: &[&str] = &["Springfield", "Riverton", "Fairview", "Georgetown", "Clinton"];

/// One generated record: an id paired with a JSON-shaped field map
/// compatible with [`medley_core::RecordView`].
pub type GeneratedRecord = (ID_t, HashMap<String, serde_json::Value>);

/// Generates `config.record_count` synthetic name/address records.
///
/// Roughly one in five records is a near-duplicate of an earlier one with
/// a single-character perturbation in the first name, so indexing and
/// query benchmarks exercise the string-neighborhood path rather than
/// only exact matches.
pub fn generate_population(config: &GeneratorConfig) -> Vec<GeneratedRecord> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut out: Vec<GeneratedRecord> = Vec::with_capacity(config.record_count);

    for i in 0..config.record_count {
        let id = ID_t::new(i as u64).unwrap_or(ID_t::ZERO);

        let fname = if i > 0 && rng.gen_ratio(1, 5) {
            let (_, base) = &out[rng.gen_range(0..i)];
            let base_fname = base.get("fname").and_then(|v| v.as_str()).unwrap_or("Alice");
            perturb(base_fname, &mut rng)
        } else {
            FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())].to_owned()
        };

        let lname = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())].to_owned();
        let city = CITIES[rng.gen_range(0..CITIES.len())].to_owned();

        let mut record = HashMap::new();
        record.insert("fname".to_owned(), serde_json::Value::String(fname));
        record.insert("lname".to_owned(), serde_json::Value::String(lname));
        record.insert("city".to_owned(), serde_json::Value::String(city));
        out.push((id, record));
    }

    out
}

fn perturb(s: &str, rng: &mut StdRng) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 2 {
        return s.to_owned();
    }
    let drop_at = rng.gen_range(0..chars.len());
    chars
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != drop_at)
        .map(|(_, c)| *c)
        .collect()
}
