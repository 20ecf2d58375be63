//! Optimization request model and validation.
//!
//! The browser and the engine both speak the engine library's parameter
//! names (`mini`, `maxi`, `hairpin_window`, `location`, ...). Those names are
//! what we serialize; descriptive aliases are accepted on input.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelayError;
use crate::threshold_validation::{validate_int_range, validate_unit_range};

/// Longest sequence accepted for optimization, in symbols.
pub const MAX_SEQUENCE_LENGTH: usize = 100_000;

/// Smallest hairpin search window the engine handles sensibly.
pub const MIN_HAIRPIN_WINDOW: u32 = 50;

/// Inclusive bounds on the hairpin stem size.
pub const MIN_STEM_SIZE: u32 = 3;
pub const MAX_STEM_SIZE: u32 = 10;

/// Nucleotides per codon.
pub const CODON_LENGTH: usize = 3;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Restriction sites the engine knows how to avoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RestrictionSite {
    #[serde(rename = "BsaI_site")]
    BsaI,
    #[serde(rename = "BsmBI_site")]
    BsmBI,
    #[serde(rename = "BbsI_site")]
    BbsI,
    #[serde(rename = "SapI_site")]
    SapI,
    #[serde(rename = "EcoRI_site")]
    EcoRI,
    #[serde(rename = "BamHI_site")]
    BamHI,
    #[serde(rename = "XhoI_site")]
    XhoI,
    #[serde(rename = "NdeI_site")]
    NdeI,
}

/// Organisms with codon usage tables available to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    #[serde(rename = "e_coli")]
    EColi,
    #[serde(rename = "h_sapiens")]
    HSapiens,
    #[serde(rename = "s_cerevisiae")]
    SCerevisiae,
    #[serde(rename = "c_elegans")]
    CElegans,
    #[serde(rename = "b_subtilis")]
    BSubtilis,
    #[serde(rename = "d_melanogaster")]
    DMelanogaster,
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// 0-based half-open coordinates into the request sequence.
///
/// Serialized as `[start, end]`; accepted as either `[start, end]` or
/// `{"start": .., "end": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RegionRepr", into = "[usize; 2]")]
pub struct Region {
    pub start: usize,
    pub end: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RegionRepr {
    Pair([usize; 2]),
    Bounds { start: usize, end: usize },
}

impl TryFrom<RegionRepr> for Region {
    type Error = String;

    fn try_from(repr: RegionRepr) -> Result<Self, Self::Error> {
        let (start, end) = match repr {
            RegionRepr::Pair([start, end]) => (start, end),
            RegionRepr::Bounds { start, end } => (start, end),
        };
        if start >= end {
            return Err(format!(
                "region start ({start}) must be less than region end ({end})"
            ));
        }
        Ok(Self { start, end })
    }
}

impl From<Region> for [usize; 2] {
    fn from(region: Region) -> Self {
        [region.start, region.end]
    }
}

impl Region {
    /// Number of nucleotides covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shrink the region so it covers whole codons only.
    ///
    /// Returns `None` when the region is shorter than a single codon.
    pub fn codon_aligned(self) -> Option<Self> {
        let whole = self.len() / CODON_LENGTH * CODON_LENGTH;
        (whole > 0).then_some(Self {
            start: self.start,
            end: self.start + whole,
        })
    }
}

// ---------------------------------------------------------------------------
// Constraints and objectives
// ---------------------------------------------------------------------------

/// A hard requirement the optimized sequence must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Constraint {
    EnforceGCContent {
        #[serde(rename = "mini", alias = "minFraction")]
        min_fraction: f64,
        #[serde(rename = "maxi", alias = "maxFraction")]
        max_fraction: f64,
        #[serde(rename = "window", alias = "windowSize")]
        window_size: u32,
    },
    AvoidPattern {
        #[serde(rename = "pattern", alias = "patternId")]
        pattern: RestrictionSite,
    },
    AvoidHairpins {
        #[serde(rename = "hairpin_window", alias = "windowSize")]
        window_size: u32,
        #[serde(rename = "stem_size", alias = "minStemSize", alias = "min_stem_size")]
        stem_size: u32,
    },
}

impl Constraint {
    /// Discriminator as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EnforceGCContent { .. } => "EnforceGCContent",
            Self::AvoidPattern { .. } => "AvoidPattern",
            Self::AvoidHairpins { .. } => "AvoidHairpins",
        }
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), RelayError> {
        match *self {
            Self::EnforceGCContent {
                min_fraction,
                max_fraction,
                window_size,
            } => {
                validate_unit_range(min_fraction, "EnforceGCContent.mini")?;
                validate_unit_range(max_fraction, "EnforceGCContent.maxi")?;
                if min_fraction > max_fraction {
                    return Err(RelayError::validation(format!(
                        "EnforceGCContent.mini ({min_fraction}) must not exceed maxi ({max_fraction})"
                    )));
                }
                if window_size == 0 {
                    return Err(RelayError::validation(
                        "EnforceGCContent.window must be greater than 0",
                    ));
                }
                Ok(())
            }
            Self::AvoidPattern { .. } => Ok(()),
            Self::AvoidHairpins {
                window_size,
                stem_size,
            } => {
                if window_size < MIN_HAIRPIN_WINDOW {
                    return Err(RelayError::validation(format!(
                        "AvoidHairpins.hairpin_window must be at least {MIN_HAIRPIN_WINDOW}, got {window_size}"
                    )));
                }
                validate_int_range(
                    stem_size,
                    MIN_STEM_SIZE,
                    MAX_STEM_SIZE,
                    "AvoidHairpins.stem_size",
                )
            }
        }
    }
}

/// A soft goal the optimization should pursue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Objective {
    CodonOptimize {
        #[serde(alias = "speciesId")]
        species: Species,
        #[serde(rename = "location", alias = "region")]
        region: Region,
    },
}

impl Objective {
    /// Discriminator as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CodonOptimize { .. } => "CodonOptimize",
        }
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A validated optimization job description.
///
/// Serializes to exactly the document the engine reads from its input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationRequest {
    pub sequence: String,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub objectives: Vec<Objective>,
    #[serde(default)]
    pub is_circular: bool,
}

impl OptimizationRequest {
    /// Validate a raw request body and build a request from it.
    ///
    /// Checks run cheapest first: sequence presence and type, length,
    /// alphabet, then the typed constraint/objective parameters. Codon
    /// regions whose length is not a multiple of three are shrunk to whole
    /// codons rather than rejected.
    pub fn from_json(body: Value) -> Result<Self, RelayError> {
        if !body.is_object() {
            return Err(RelayError::validation("Request body must be a JSON object"));
        }

        match body.get("sequence") {
            None | Some(Value::Null) => return Err(RelayError::validation("Sequence is required")),
            Some(Value::String(s)) if s.is_empty() => {
                return Err(RelayError::validation("Sequence is required"))
            }
            Some(Value::String(s)) => validate_sequence(s)?,
            Some(_) => return Err(RelayError::validation("Sequence must be a string")),
        }

        let mut request: Self = serde_json::from_value(body).map_err(|e| {
            RelayError::validation_with_details("Invalid optimization parameters", e.to_string())
        })?;

        for constraint in &request.constraints {
            constraint.validate()?;
        }
        request.align_codon_regions()?;

        Ok(request)
    }

    /// Wire discriminators of the constraints, in request order.
    pub fn constraint_kinds(&self) -> Vec<&'static str> {
        self.constraints.iter().map(Constraint::kind).collect()
    }

    /// Wire discriminators of the objectives, in request order.
    pub fn objective_kinds(&self) -> Vec<&'static str> {
        self.objectives.iter().map(Objective::kind).collect()
    }

    fn align_codon_regions(&mut self) -> Result<(), RelayError> {
        let sequence_len = self.sequence.len();
        for objective in &mut self.objectives {
            match objective {
                Objective::CodonOptimize { region, .. } => {
                    if region.end > sequence_len {
                        return Err(RelayError::validation(format!(
                            "CodonOptimize.location end ({}) exceeds sequence length ({sequence_len})",
                            region.end
                        )));
                    }
                    let aligned = region.codon_aligned().ok_or_else(|| {
                        RelayError::validation(format!(
                            "CodonOptimize.location must cover at least one codon, got {} bp",
                            region.len()
                        ))
                    })?;
                    if aligned != *region {
                        tracing::warn!(
                            start = region.start,
                            end = region.end,
                            adjusted_end = aligned.end,
                            "Codon region length not divisible by 3, trimming to whole codons"
                        );
                        *region = aligned;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Check sequence length and alphabet (`A`, `C`, `G`, `T`, `N`, any case).
pub fn validate_sequence(sequence: &str) -> Result<(), RelayError> {
    let length = sequence.chars().count();
    if length > MAX_SEQUENCE_LENGTH {
        return Err(RelayError::validation_with_details(
            "Sequence too long",
            "Sequences longer than 100,000 bp are not supported for optimization",
        ));
    }

    if let Some((position, symbol)) = sequence
        .chars()
        .enumerate()
        .find(|(_, c)| !matches!(c.to_ascii_uppercase(), 'A' | 'C' | 'G' | 'T' | 'N'))
    {
        return Err(RelayError::validation_with_details(
            "Sequence contains invalid characters",
            format!("Unexpected symbol {symbol:?} at position {position}; allowed symbols are A, C, G, T, N"),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
