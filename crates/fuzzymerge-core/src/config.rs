//! Merge configuration
//!
//! Options are set by name through [`MergeConfig::set_parameter`], which
//! validates the name and value before touching any state. A failed call
//! leaves the configuration unchanged.
//!
//! | name | value | default |
//! |---|---|---|
//! | `left_on`, `right_on` | column name | constructor arguments |
//! | `how` | `"inner"`, `"left"`, `"outer"` | `"inner"` |
//! | `threshold` | number in `[0, 1]` | [`DEFAULT_THRESHOLD`] |
//! | `parallel` | bool | `false` |
//! | `n_threads` | integer, `0` = all cores | `1` |
//! | `dask_client` | cluster handle or none | none |
//! | `num_batches` | integer >= 1 or none | none (one chunk per worker) |
//! | `scorer` | metric name or scorer handle | `"levenshtein_ratio"` |
//! | `suffixes` | pair of distinct strings | `("_x", "_y")` |
//! | `score_column` | column name or none | none |
//! | `timeout` | seconds > 0 or none | none |

use crate::backend::SharedCluster;
use crate::error::{MergeError, Result};
use crate::scorer::{Metric, SharedScorer, SimilarityScorer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Minimum score for a best match to be accepted (`score >= threshold`).
///
/// Tuned for the default indel-ratio scorer: pairs differing by one edit in
/// a four-letter word (0.75-0.89) pass, unrelated words do not.
pub const DEFAULT_THRESHOLD: f64 = 0.75;

/// Default suffixes for column names present in both tables
pub const DEFAULT_SUFFIXES: (&str, &str) = ("_x", "_y");

/// Every recognized option name
pub const PARAMETERS: [&str; 12] = [
    "left_on",
    "right_on",
    "how",
    "threshold",
    "parallel",
    "n_threads",
    "dask_client",
    "num_batches",
    "scorer",
    "suffixes",
    "score_column",
    "timeout",
];

/// Join semantics: which unmatched rows survive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinHow {
    /// Matched left rows only
    #[default]
    Inner,
    /// Every left row, null-filled when unmatched
    Left,
    /// Every left row plus right rows nobody matched
    Outer,
}

impl JoinHow {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinHow::Inner => "inner",
            JoinHow::Left => "left",
            JoinHow::Outer => "outer",
        }
    }
}

impl fmt::Display for JoinHow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinHow {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inner" => Ok(JoinHow::Inner),
            "left" => Ok(JoinHow::Left),
            "outer" => Ok(JoinHow::Outer),
            other => Err(format!("expected 'inner', 'left' or 'outer', got '{}'", other)),
        }
    }
}

/// A dynamically typed option value
#[derive(Debug, Clone)]
pub enum ParamValue {
    /// Clears optional settings
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Pair(String, String),
    Cluster(SharedCluster),
    Scorer(SharedScorer),
}

impl ParamValue {
    /// Wrap a cluster handle for the `dask_client` option.
    pub fn cluster(cluster: impl crate::backend::Cluster + 'static) -> Self {
        ParamValue::Cluster(Arc::new(cluster))
    }

    /// Wrap a custom scorer for the `scorer` option.
    pub fn scorer(scorer: impl SimilarityScorer + 'static) -> Self {
        ParamValue::Scorer(Arc::new(scorer))
    }

    /// Convert a JSON option value. Objects and non-pair arrays are rejected.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value as Json;
        match value {
            Json::Null => Some(ParamValue::None),
            Json::Bool(b) => Some(ParamValue::Bool(*b)),
            Json::Number(n) => n
                .as_i64()
                .map(ParamValue::Int)
                .or_else(|| n.as_f64().map(ParamValue::Float)),
            Json::String(s) => Some(ParamValue::Str(s.clone())),
            Json::Array(items) => match items.as_slice() {
                [Json::String(a), Json::String(b)] => Some(ParamValue::Pair(a.clone(), b.clone())),
                _ => None,
            },
            Json::Object(_) => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ParamValue::None => "none",
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Str(_) => "string",
            ParamValue::Pair(..) => "pair",
            ParamValue::Cluster(_) => "cluster handle",
            ParamValue::Scorer(_) => "scorer",
        }
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Int(i as i64)
    }
}

impl From<usize> for ParamValue {
    fn from(u: usize) -> Self {
        ParamValue::Int(i64::try_from(u).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        ParamValue::Float(x)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<(&str, &str)> for ParamValue {
    fn from((a, b): (&str, &str)) -> Self {
        ParamValue::Pair(a.to_string(), b.to_string())
    }
}

impl From<Metric> for ParamValue {
    fn from(m: Metric) -> Self {
        ParamValue::Scorer(Arc::new(m))
    }
}

impl From<SharedScorer> for ParamValue {
    fn from(s: SharedScorer) -> Self {
        ParamValue::Scorer(s)
    }
}

impl From<SharedCluster> for ParamValue {
    fn from(c: SharedCluster) -> Self {
        ParamValue::Cluster(c)
    }
}

impl From<Duration> for ParamValue {
    fn from(d: Duration) -> Self {
        ParamValue::Float(d.as_secs_f64())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ParamValue::None)
    }
}

/// Validated merge options. Read-only while a merge runs.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    left_on: String,
    right_on: String,
    how: JoinHow,
    threshold: f64,
    parallel: bool,
    n_threads: usize,
    cluster: Option<SharedCluster>,
    num_batches: Option<usize>,
    scorer: SharedScorer,
    suffixes: (String, String),
    score_column: Option<String>,
    timeout: Option<Duration>,
}

impl MergeConfig {
    /// Defaults for everything but the join columns.
    pub fn new(left_on: impl Into<String>, right_on: impl Into<String>) -> Self {
        Self {
            left_on: left_on.into(),
            right_on: right_on.into(),
            how: JoinHow::default(),
            threshold: DEFAULT_THRESHOLD,
            parallel: false,
            n_threads: 1,
            cluster: None,
            num_batches: None,
            scorer: Arc::new(Metric::default()),
            suffixes: (DEFAULT_SUFFIXES.0.to_string(), DEFAULT_SUFFIXES.1.to_string()),
            score_column: None,
            timeout: None,
        }
    }

    /// Set a single option by name.
    pub fn set_parameter(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<()> {
        let value = value.into();
        match name {
            "left_on" => self.left_on = column_name(name, value)?,
            "right_on" => self.right_on = column_name(name, value)?,
            "how" => {
                self.how = match value {
                    ParamValue::Str(s) => s.parse().map_err(|e| MergeError::invalid(name, e))?,
                    other => return Err(wrong_type(name, "string", &other)),
                }
            }
            "threshold" => {
                let t = number(name, value)?;
                if !(0.0..=1.0).contains(&t) {
                    return Err(MergeError::invalid(
                        name,
                        format!("{} is outside [0, 1]", t),
                    ));
                }
                self.threshold = t;
            }
            "parallel" => {
                self.parallel = match value {
                    ParamValue::Bool(b) => b,
                    other => return Err(wrong_type(name, "bool", &other)),
                }
            }
            "n_threads" => self.n_threads = count(name, value)?,
            "dask_client" => {
                self.cluster = match value {
                    ParamValue::Cluster(c) => Some(c),
                    ParamValue::None => None,
                    other => return Err(wrong_type(name, "cluster handle", &other)),
                }
            }
            "num_batches" => {
                self.num_batches = match value {
                    ParamValue::None => None,
                    other => match count(name, other)? {
                        0 => return Err(MergeError::invalid(name, "must be at least 1")),
                        n => Some(n),
                    },
                }
            }
            "scorer" => {
                self.scorer = match value {
                    ParamValue::Scorer(s) => s,
                    ParamValue::Str(s) => {
                        let metric: Metric = s.parse().map_err(|e| MergeError::invalid(name, e))?;
                        Arc::new(metric)
                    }
                    other => return Err(wrong_type(name, "scorer or metric name", &other)),
                }
            }
            "suffixes" => {
                self.suffixes = match value {
                    ParamValue::Pair(a, b) if a == b => {
                        return Err(MergeError::invalid(name, "left and right suffixes must differ"))
                    }
                    ParamValue::Pair(a, b) => (a, b),
                    other => return Err(wrong_type(name, "pair of strings", &other)),
                }
            }
            "score_column" => {
                self.score_column = match value {
                    ParamValue::None => None,
                    other => Some(column_name(name, other)?),
                }
            }
            "timeout" => {
                self.timeout = match value {
                    ParamValue::None => None,
                    other => {
                        let secs = number(name, other)?;
                        if secs <= 0.0 {
                            return Err(MergeError::invalid(name, "must be positive"));
                        }
                        Some(Duration::try_from_secs_f64(secs).map_err(|e| MergeError::invalid(name, e.to_string()))?)
                    }
                }
            }
            unknown => {
                return Err(MergeError::invalid(
                    unknown,
                    format!("unknown parameter, expected one of: {}", PARAMETERS.join(", ")),
                ))
            }
        }
        Ok(())
    }

    /// Apply a JSON object of options, in key order.
    ///
    /// Stops at the first invalid option; options before it stay applied.
    pub fn configure(&mut self, options: &serde_json::Map<String, serde_json::Value>) -> Result<()> {
        for (name, value) in options {
            let value = ParamValue::from_json(value).ok_or_else(|| {
                MergeError::invalid(name.as_str(), format!("unsupported JSON value {}", value))
            })?;
            self.set_parameter(name, value)?;
        }
        Ok(())
    }

    pub fn left_on(&self) -> &str {
        &self.left_on
    }

    pub fn right_on(&self) -> &str {
        &self.right_on
    }

    pub fn how(&self) -> JoinHow {
        self.how
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Configured worker count; `0` means all available cores.
    pub fn n_threads(&self) -> usize {
        self.n_threads
    }

    pub fn cluster(&self) -> Option<&SharedCluster> {
        self.cluster.as_ref()
    }

    pub fn num_batches(&self) -> Option<usize> {
        self.num_batches
    }

    pub fn scorer(&self) -> &SharedScorer {
        &self.scorer
    }

    pub fn suffixes(&self) -> (&str, &str) {
        (&self.suffixes.0, &self.suffixes.1)
    }

    pub fn score_column(&self) -> Option<&str> {
        self.score_column.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Worker count with `0` resolved to the number of available cores.
    pub fn resolved_workers(&self) -> usize {
        match self.n_threads {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }
}

fn wrong_type(name: &str, expected: &str, got: &ParamValue) -> MergeError {
    MergeError::invalid(name, format!("expected {}, got {}", expected, got.kind()))
}

fn column_name(name: &str, value: ParamValue) -> Result<String> {
    match value {
        ParamValue::Str(s) if s.is_empty() => Err(MergeError::invalid(name, "column name is empty")),
        ParamValue::Str(s) => Ok(s),
        other => Err(wrong_type(name, "string", &other)),
    }
}

fn number(name: &str, value: ParamValue) -> Result<f64> {
    let x = match value {
        ParamValue::Float(x) => x,
        ParamValue::Int(i) => i as f64,
        other => return Err(wrong_type(name, "number", &other)),
    };
    if x.is_finite() {
        Ok(x)
    } else {
        Err(MergeError::invalid(name, format!("{} is not finite", x)))
    }
}

fn count(name: &str, value: ParamValue) -> Result<usize> {
    match value {
        ParamValue::Int(i) => {
            usize::try_from(i).map_err(|_| MergeError::invalid(name, format!("{} is negative", i)))
        }
        other => Err(wrong_type(name, "integer", &other)),
    }
}
