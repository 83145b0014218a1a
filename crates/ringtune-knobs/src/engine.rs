//! Knob transform engine: knob amplitudes → absolute physical
//! setpoints.

use crate::error::KnobError;
use crate::matrix::KnobMatrix;
use crate::vector::KnobVector;

// =============================================================================
// KnobFamily — one calibration matrix bound to its strengths channel
// =============================================================================

/// One knob family: a calibration matrix plus the channel its actuator
/// vector is written to.
#[derive(Debug, Clone)]
pub struct KnobFamily {
    pub matrix: KnobMatrix,
    /// Channel carrying the actuator strength vector for this family.
    pub strengths_channel: String,
}

impl KnobFamily {
    pub fn new(matrix: KnobMatrix, strengths_channel: impl Into<String>) -> Self {
        Self {
            matrix,
            strengths_channel: strengths_channel.into(),
        }
    }

    pub fn name(&self) -> &str {
        self.matrix.family()
    }

    /// A knob belongs to this family iff its name carries the family
    /// tag prefix.
    fn owns(&self, knob: &str) -> bool {
        knob.starts_with(&format!("{}-", self.name()))
    }
}

// =============================================================================
// Baseline — per-session reference setpoints
// =============================================================================

/// Actuator setpoints observed before any knob was applied, one vector
/// per family. Captured exactly once at environment construction; every
/// knob application is a delta on top of this, never on the actuators'
/// current state.
#[derive(Debug, Clone, Default)]
pub struct Baseline {
    entries: Vec<(String, Vec<f64>)>,
}

impl Baseline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, family: impl Into<String>, values: Vec<f64>) {
        self.entries.push((family.into(), values));
    }

    pub fn family(&self, name: &str) -> Option<&[f64]> {
        self.entries
            .iter()
            .find(|(f, _)| f == name)
            .map(|(_, v)| v.as_slice())
    }
}

// =============================================================================
// FamilySetpoints — the engine's output
// =============================================================================

/// Absolute setpoints for one family's actuators. Writing them is the
/// caller's responsibility.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilySetpoints {
    pub family: String,
    pub channel: String,
    pub values: Vec<f64>,
}

// =============================================================================
// KnobSet — the transform engine
// =============================================================================

/// All knob families of one environment.
#[derive(Debug, Clone)]
pub struct KnobSet {
    families: Vec<KnobFamily>,
}

impl KnobSet {
    pub fn new(families: Vec<KnobFamily>) -> Result<Self, KnobError> {
        for (i, fam) in families.iter().enumerate() {
            if families[..i].iter().any(|f| f.name() == fam.name()) {
                return Err(KnobError::configuration(
                    fam.name(),
                    "family registered twice",
                ));
            }
        }
        Ok(Self { families })
    }

    pub fn families(&self) -> &[KnobFamily] {
        &self.families
    }

    /// All knob names across all families, family-major, storage order.
    pub fn all_names(&self) -> Vec<String> {
        self.families
            .iter()
            .flat_map(|f| f.matrix.names().iter().cloned())
            .collect()
    }

    /// Resolve a knob name to its family. Total, non-overlapping: a
    /// name matching zero or more than one family is a classification
    /// error.
    pub fn classify(&self, knob: &str) -> Result<&KnobFamily, KnobError> {
        let mut matches = self.families.iter().filter(|f| f.owns(knob));
        match (matches.next(), matches.next()) {
            (Some(family), None) => Ok(family),
            (first, second) => Err(KnobError::Classification {
                name: knob.to_string(),
                matched: first.is_some() as usize + second.is_some() as usize,
            }),
        }
    }

    /// Transform a knob vector into absolute setpoints.
    ///
    /// Per family with at least one requested knob: the calibration
    /// matrix is projected onto the requested names, each amplitude is
    /// matched against its projected row **by name**, and the physical
    /// delta is the amplitude-weighted sum of rows. The returned
    /// setpoints are `baseline + delta`; this function performs no
    /// channel writes.
    pub fn apply(
        &self,
        knobs: &KnobVector,
        baseline: &Baseline,
    ) -> Result<Vec<FamilySetpoints>, KnobError> {
        // Partition the requested names by family, preserving input
        // order within each family.
        let mut partitions: Vec<Vec<&str>> = vec![Vec::new(); self.families.len()];
        for (name, _) in knobs.iter() {
            let family = self.classify(name)?;
            let idx = self
                .families
                .iter()
                .position(|f| f.name() == family.name())
                .unwrap();
            if family.matrix.row_index(name).is_none() {
                return Err(KnobError::configuration(
                    family.name(),
                    format!("no calibration row named '{}'", name),
                ));
            }
            partitions[idx].push(name);
        }

        let mut out = Vec::new();
        for (family, requested) in self.families.iter().zip(&partitions) {
            if requested.is_empty() {
                continue;
            }
            let base = baseline
                .family(family.name())
                .ok_or_else(|| KnobError::MissingBaseline(family.name().to_string()))?;
            let width = family.matrix.actuator_count();
            if base.len() != width {
                return Err(KnobError::BaselineMismatch {
                    family: family.name().to_string(),
                    want: width,
                    got: base.len(),
                });
            }

            let projected = family.matrix.project(requested);
            let mut delta = vec![0.0; width];
            for (name, row) in projected.iter() {
                // Projection order and amplitude order are reconciled
                // by name, so the input ordering is irrelevant.
                let amplitude = knobs
                    .amplitude(name)
                    .expect("projected row name came from the knob vector");
                for (d, c) in delta.iter_mut().zip(row) {
                    *d += amplitude * c;
                }
            }

            let values = base.iter().zip(&delta).map(|(b, d)| b + d).collect();
            out.push(FamilySetpoints {
                family: family.name().to_string(),
                channel: family.strengths_channel.clone(),
                values,
            });
        }
        Ok(out)
    }
}
