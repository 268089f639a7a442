use crate::DseError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::path::Path;

pub type DimensionIndex = usize;
pub type OptionIndex = u16;
/// Allowed functional-unit counts, in [Large, Medium, Small] order.
pub type FuCount = [u32; 3];

/// Field offsets of area and latency in the legacy flat result record
/// (Method,Iteration,ATTR,AREA,...,Latency,...).
pub const AREA_FIELD: usize = 3;
pub const LATENCY_FIELD: usize = 21;

/// The 21 metric columns of the legacy record, in file order. The result
/// header is Method,Iteration,ATTR followed by these.
pub const METRIC_COLUMNS: [&str; 21] = [
    "AREA",
    "state",
    "FU",
    "REG",
    "MUX",
    "DEC",
    "pin_pair",
    "net",
    "max",
    "min",
    "ave",
    "MISC",
    "MEM",
    "cp_delay",
    "sim",
    "Pmax",
    "Pmin",
    "Pave",
    "Latency",
    "BlockMemoryBit",
    "DSP",
];

/// One tunable knob of the synthesis flow: a group of discrete options,
/// one of which is active in any given configuration.
#[derive(Debug, Clone)]
pub struct Dimension {
    pub label: String,
    pub options: usize,
}

/// The enumerable configuration space, one `Dimension` per pragma group.
///
/// Dimension 0 is a reserved placeholder with a single no-op option. It
/// exists only so option indices line up with the attribute library, which
/// numbers pragma groups from 1. Every traversal skips it.
#[derive(Debug, Clone)]
pub struct ConfigurationSpace {
    dims: Vec<Dimension>,
}

impl ConfigurationSpace {
    /// Build a space from the real dimensions (library groups 1..). Fails
    /// if any group ended up with zero options, which means the library
    /// file is malformed.
    pub fn new(real_dims: Vec<Dimension>) -> Result<Self, DseError> {
        for (i, d) in real_dims.iter().enumerate() {
            if d.options == 0 {
                return Err(DseError::EmptyDimension { dim: i + 1 });
            }
        }
        let mut dims = vec![Dimension {
            label: String::from("reserved"),
            options: 1,
        }];
        dims.extend(real_dims);
        Ok(ConfigurationSpace { dims })
    }

    pub fn dimension_count(&self) -> usize {
        self.dims.len()
    }

    /// Number of options in a dimension, the reserved no-op slot included.
    pub fn options(&self, dim: DimensionIndex) -> usize {
        self.dims[dim].options
    }

    pub fn dimension(&self, dim: DimensionIndex) -> &Dimension {
        &self.dims[dim]
    }

    /// Human-readable attribute label: the option indices of the real
    /// dimensions, concatenated. Only a label; lookups use `PositionKey`,
    /// which stays unambiguous for dimensions with more than 9 options.
    pub fn encode(&self, pos: &Position) -> String {
        let mut label = String::new();
        for d in 1..self.dims.len() {
            label.push_str(&pos.get(d).to_string());
        }
        label
    }

    /// All real dimensions at option 0, the odometer start.
    pub fn first_position(&self) -> Position {
        Position {
            idx: vec![0; self.dims.len()],
        }
    }

    /// Uniformly random option per real dimension, reserved slot fixed at 0.
    pub fn random_position<R: rand::Rng>(&self, rng: &mut R) -> Position {
        let mut idx = vec![0 as OptionIndex];
        for d in 1..self.dims.len() {
            idx.push(rng.gen_range(0..self.dims[d].options) as OptionIndex);
        }
        Position { idx }
    }

    /// Number of distinct configurations the cross-product visits.
    pub fn combinations(&self) -> u64 {
        self.dims[1..]
            .iter()
            .fold(1u64, |acc, d| acc.saturating_mul(d.options as u64))
    }
}

/// One option index per dimension of the space. Index 0 always holds the
/// reserved no-op option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    idx: Vec<OptionIndex>,
}

impl Position {
    pub fn get(&self, dim: DimensionIndex) -> OptionIndex {
        self.idx[dim]
    }

    pub fn set(&mut self, dim: DimensionIndex, option: OptionIndex) {
        self.idx[dim] = option;
    }

    pub fn len(&self) -> usize {
        self.idx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    pub fn key(&self) -> PositionKey {
        PositionKey(self.idx.clone().into_boxed_slice())
    }
}

/// Typed lookup key for a `Position`. Concatenating the option digits
/// into a string collides once a dimension has more than 9 options; the
/// full index tuple does not, so lookups use it and the digit string is
/// label-only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionKey(Box<[OptionIndex]>);

/// Parsed synthesis outcome for one configuration.
///
/// `area` and `latency` stay `None` when the tool produced no usable
/// record, which is different from a measured zero. `metrics` carries the
/// raw metric fields through to the result sink unmodified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityResult {
    pub success: bool,
    pub area: Option<f64>,
    pub latency: Option<f64>,
    pub metrics: Vec<String>,
}

impl QualityResult {
    /// An empty/absent result, as produced by a failed synthesis run.
    pub fn failed() -> Self {
        QualityResult::default()
    }

    /// Parse the legacy flat record (full 24-field line, labels included).
    /// Short or unparseable records are tolerated: the affected metrics
    /// stay absent and the record is marked unsuccessful.
    pub fn from_flat_record(record: &str) -> Self {
        let record = record.trim_end();
        if record.is_empty() {
            return QualityResult::failed();
        }
        let fields: Vec<&str> = record.split(',').collect();
        let area = fields.get(AREA_FIELD).and_then(|s| s.parse::<f64>().ok());
        let latency = fields
            .get(LATENCY_FIELD)
            .and_then(|s| s.parse::<f64>().ok());
        let metrics = fields
            .iter()
            .skip(3)
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        QualityResult {
            success: area.is_some() && latency.is_some(),
            area,
            latency,
            metrics,
        }
    }

    /// The (area, latency) pair the exhaustive sweeps compare on.
    pub fn pair(&self) -> (Option<f64>, Option<f64>) {
        (self.area, self.latency)
    }
}

/// Write-once memoization of evaluated configurations. The first
/// evaluation of a key wins; later lookups short-circuit without calling
/// the synthesizer again.
///
/// Generic over the key so the FU sweep (keyed by counts) and the pragma
/// strategies (keyed by `PositionKey`) share it.
#[derive(Debug)]
pub struct ResultLedger<K> {
    entries: HashMap<K, QualityResult>,
}

impl<K: Eq + Hash> ResultLedger<K> {
    pub fn new() -> Self {
        ResultLedger {
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&QualityResult> {
        self.entries.get(key)
    }

    /// Look up `key`, running `eval` only on a miss. Returns whether the
    /// evaluation was fresh along with the stored result.
    pub fn evaluate_with<F>(&mut self, key: K, eval: F) -> (bool, &QualityResult)
    where
        F: FnOnce() -> QualityResult,
    {
        use std::collections::hash_map::Entry;
        match self.entries.entry(key) {
            Entry::Occupied(e) => (false, e.into_mut()),
            Entry::Vacant(v) => (true, v.insert(eval())),
        }
    }
}

impl<K: Eq + Hash> Default for ResultLedger<K> {
    fn default() -> Self {
        ResultLedger::new()
    }
}

// Snapshots keep expensive synthesis results across runs. Stored as an
// entry list because JSON maps only take string keys.
impl<K: Eq + Hash + Serialize> ResultLedger<K> {
    pub fn save_to_file(&self, path: &Path) -> Result<(), DseError> {
        let entries: Vec<(&K, &QualityResult)> = self.entries.iter().collect();
        let blob = serde_json::to_vec_pretty(&entries)?;
        std::fs::write(path, blob)?;
        Ok(())
    }
}

impl<K: Eq + Hash + DeserializeOwned> ResultLedger<K> {
    pub fn load_from_file(path: &Path) -> Result<Self, DseError> {
        if !path.exists() {
            return Ok(ResultLedger::new());
        }
        let data = std::fs::read(path)?;
        let entries: Vec<(K, QualityResult)> = serde_json::from_slice(&data)?;
        Ok(ResultLedger {
            entries: entries.into_iter().collect(),
        })
    }
}
