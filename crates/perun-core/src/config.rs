//! Layered engine configuration.
//!
//! Tuning knobs are loaded from `Scan.toml` and `SCAN_`-prefixed environment
//! variables (environment wins), then applied once via
//! [`crate::kernels::configure`]. The engine runs with built-in defaults when
//! no configuration is present; only a malformed source is an error.
//!
//! ```toml
//! simd = "auto"            # auto | avx2 | neon | scalar
//!
//! [prefetch]
//! lookahead = 8            # rows prefetched ahead of a gather group
//!
//! [batch]
//! multi_round_threshold = 32
//! ```

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// Default dimension at which batch kernels switch from the reduced-chunked
/// path to the full-chunked path with software prefetch.
pub const DEFAULT_MULTI_ROUND_THRESHOLD: usize = 32;

/// Upper bound for the gather-scan prefetch lookahead (rows).
pub const MAX_PREFETCH_LOOKAHEAD: usize = 16;

/// Ceiling on the SIMD capability the engine is allowed to use.
///
/// The cap can only lower the detected level, never raise it; requesting
/// `avx2` on an aarch64 host degrades to the portable scalar path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimdCap {
    /// Use the best level the CPU reports.
    #[default]
    Auto,
    /// Allow at most AVX2+FMA kernels.
    Avx2,
    /// Allow at most NEON kernels.
    Neon,
    /// Force the portable scalar kernels.
    Scalar,
}

/// Gather-scan prefetch tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefetchConfig {
    /// Rows prefetched ahead of the group currently being scanned.
    ///
    /// Unset means the distance is derived from the vector dimension
    /// (one cache line of lookahead per 64 bytes of row, clamped to 4..=16).
    pub lookahead: Option<usize>,
}

/// Batch kernel tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Dimension at which batch kernels start issuing software prefetch for
    /// the next query/row chunk while computing on the current one.
    pub multi_round_threshold: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            multi_round_threshold: DEFAULT_MULTI_ROUND_THRESHOLD,
        }
    }
}

/// Engine configuration, merged from file and environment layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// SIMD capability cap, see [`SimdCap`].
    pub simd: SimdCap,
    /// Gather-scan prefetch tuning.
    pub prefetch: PrefetchConfig,
    /// Batch kernel tuning.
    pub batch: BatchConfig,
}

impl ScanConfig {
    /// Loads configuration from `Scan.toml` (if present) overlaid with
    /// `SCAN_`-prefixed environment variables (`SCAN_SIMD=scalar`,
    /// `SCAN_BATCH__MULTI_ROUND_THRESHOLD=64`, ...).
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("Scan.toml"))
                .merge(Env::prefixed("SCAN_").split("__")),
        )
    }

    /// Loads configuration from an explicit TOML file, without the
    /// environment overlay.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        Self::from_figment(Figment::new().merge(Toml::file(path)))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment
            .extract()
            .map_err(|e| ScanError::Config(e.to_string()))?;
        Ok(config.normalized())
    }

    /// Clamps out-of-range tuning values to their documented envelopes.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        // Threshold is rounded down to a whole number of 8-lane chunks so the
        // full-chunked path never starts mid-register.
        let t = self.batch.multi_round_threshold;
        self.batch.multi_round_threshold = (t.max(8) / 8) * 8;
        if let Some(ahead) = self.prefetch.lookahead {
            self.prefetch.lookahead = Some(ahead.clamp(1, MAX_PREFETCH_LOOKAHEAD));
        }
        self
    }
}
