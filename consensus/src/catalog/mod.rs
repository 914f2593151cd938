//! Specialist catalog: the static pool of narrow-domain responders
//!
//! Every specialist is a [`SpecialistTemplate`]: a dotted species path, a
//! keyword set, the application identifiers it has affinity for, and the
//! fitness prior written back by the [`FitnessRegistry`](crate::fitness::FitnessRegistry).
//!
//! The built-in pool is assembled from domain-family tables in
//! [`families`]. Language entries fan out into sub-specialties
//! (`code.swift` → `code.swift.debug`, `code.swift.perf`, ...) that inherit
//! the parent's keywords plus their specialization terms.

pub mod families;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Error type for catalog validation
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Template at index {0} has an empty species")]
    EmptySpecies(usize),

    #[error("Duplicate species: {0}")]
    DuplicateSpecies(String),

    #[error("Species {species} has fitness {fitness} outside [0, 1]")]
    FitnessOutOfRange { species: String, fitness: f64 },
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Shared, immutable view of a catalog used by an in-flight scoring pass
pub type SharedCatalog = Arc<SpecialistCatalog>;

/// Fitness prior every template starts with before any evidence exists
pub const NEUTRAL_FITNESS: f64 = 0.5;

/// Domain family, derived from the first segment of a species path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainFamily {
    /// Programming languages and their ecosystems (`code.*`)
    Language,
    /// Writing, music, design (`creative.*`)
    Creative,
    /// Cloud, containers, CI, databases (`infra.*`)
    Infrastructure,
    /// Science, academic reading, data analysis (`research.*`)
    Research,
    /// Finance, marketing, product (`business.*`)
    Business,
    /// Sleep, focus, stress (`wellbeing.*`)
    Wellbeing,
    /// Locale-specific responders (`locale.*`)
    Localized,
    /// Anything outside the known prefixes
    General,
}

impl DomainFamily {
    /// Derive the family from a dotted species path
    pub fn from_species(species: &str) -> Self {
        match species.split('.').next().unwrap_or_default() {
            "code" => Self::Language,
            "creative" => Self::Creative,
            "infra" => Self::Infrastructure,
            "research" => Self::Research,
            "business" => Self::Business,
            "wellbeing" => Self::Wellbeing,
            "locale" => Self::Localized,
            _ => Self::General,
        }
    }

    /// Human-readable family name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Language => "language",
            Self::Creative => "creative",
            Self::Infrastructure => "infrastructure",
            Self::Research => "research",
            Self::Business => "business",
            Self::Wellbeing => "wellbeing",
            Self::Localized => "localized",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for DomainFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static blueprint for one specialist responder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialistTemplate {
    /// Dotted domain path, e.g. `code.swift.debug`
    pub species: String,
    /// Display label used in attribution headers
    pub label: String,
    /// Coarse domain name, e.g. `swift` or `music`
    pub domain: String,
    /// Lower-cased trigger keywords; entries containing a space are bigrams
    pub keywords: Vec<String>,
    /// Application identifiers that boost this specialist when active
    pub affinities: Vec<String>,
    /// Historical win-rate prior in [0, 1]
    pub fitness_score: f64,
    /// Spawns recorded at the last fitness write-back
    pub spawn_count: u64,
    /// Wins recorded at the last fitness write-back
    pub success_count: u64,
}

impl SpecialistTemplate {
    /// Create a template with a neutral fitness prior
    pub fn new(
        species: impl Into<String>,
        label: impl Into<String>,
        domain: impl Into<String>,
        keywords: &[&str],
    ) -> Self {
        Self {
            species: species.into(),
            label: label.into(),
            domain: domain.into(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            affinities: Vec::new(),
            fitness_score: NEUTRAL_FITNESS,
            spawn_count: 0,
            success_count: 0,
        }
    }

    /// Attach application affinities
    pub fn with_affinities(mut self, affinities: &[&str]) -> Self {
        self.affinities = affinities.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Override the fitness prior (clamped to [0, 1])
    pub fn with_fitness(mut self, fitness: f64) -> Self {
        self.fitness_score = fitness.clamp(0.0, 1.0);
        self
    }

    /// Family tag used to pick a synthesis strategy
    pub fn family(&self) -> DomainFamily {
        DomainFamily::from_species(&self.species)
    }

    /// Number of dotted segments in the species path
    pub fn depth(&self) -> usize {
        self.species.split('.').count()
    }

    /// Iterate over the dotted species segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.species.split('.')
    }

    /// Whether `app_id` is in the affinity set (case-insensitive)
    pub fn has_affinity(&self, app_id: &str) -> bool {
        self.affinities
            .iter()
            .any(|a| a.eq_ignore_ascii_case(app_id))
    }

    /// Derive a sub-specialty whose species extends this one
    pub fn specialize(&self, suffix: &str, label_suffix: &str, extra_keywords: &[&str]) -> Self {
        let mut keywords = self.keywords.clone();
        for kw in extra_keywords {
            let kw = kw.to_lowercase();
            if !keywords.contains(&kw) {
                keywords.push(kw);
            }
        }
        Self {
            species: format!("{}.{}", self.species, suffix),
            label: format!("{} {}", self.label, label_suffix),
            domain: self.domain.clone(),
            keywords,
            affinities: self.affinities.clone(),
            fitness_score: NEUTRAL_FITNESS,
            spawn_count: 0,
            success_count: 0,
        }
    }
}

/// The full specialist pool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecialistCatalog {
    templates: Vec<SpecialistTemplate>,
}

impl SpecialistCatalog {
    /// Build the built-in catalog from every domain family
    pub fn standard() -> Self {
        Self {
            templates: families::build_all(),
        }
    }

    /// Catalog over a caller-supplied pool
    pub fn from_templates(templates: Vec<SpecialistTemplate>) -> Self {
        Self { templates }
    }

    /// Catalog with no specialists
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap in an `Arc` for sharing with scoring workers
    pub fn shared(self) -> SharedCatalog {
        Arc::new(self)
    }

    pub fn all(&self) -> &[SpecialistTemplate] {
        &self.templates
    }

    pub fn count(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Look up a template by species
    pub fn get(&self, species: &str) -> Option<&SpecialistTemplate> {
        self.templates.iter().find(|t| t.species == species)
    }

    /// Mutable iteration, used by the fitness write-back
    pub(crate) fn templates_mut(&mut self) -> impl Iterator<Item = &mut SpecialistTemplate> {
        self.templates.iter_mut()
    }

    /// Drop every template for which `keep` returns false
    pub(crate) fn retain(&mut self, keep: impl FnMut(&SpecialistTemplate) -> bool) {
        self.templates.retain(keep);
    }

    /// Check structural invariants: non-empty, unique species and in-range fitness
    pub fn validate(&self) -> CatalogResult<()> {
        let mut seen = HashSet::new();
        for (idx, template) in self.templates.iter().enumerate() {
            if template.species.trim().is_empty() {
                return Err(CatalogError::EmptySpecies(idx));
            }
            if !seen.insert(template.species.as_str()) {
                return Err(CatalogError::DuplicateSpecies(template.species.clone()));
            }
            if !(0.0..=1.0).contains(&template.fitness_score) {
                return Err(CatalogError::FitnessOutOfRange {
                    species: template.species.clone(),
                    fitness: template.fitness_score,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_from_species() {
        assert_eq!(DomainFamily::from_species("code.swift.debug"), DomainFamily::Language);
        assert_eq!(DomainFamily::from_species("wellbeing.sleep"), DomainFamily::Wellbeing);
        assert_eq!(DomainFamily::from_species("locale.es"), DomainFamily::Localized);
        assert_eq!(DomainFamily::from_species("misc"), DomainFamily::General);
    }

    #[test]
    fn test_specialize_extends_species_and_keywords() {
        let parent = SpecialistTemplate::new("code.rust", "Rust", "rust", &["rust", "cargo"])
            .with_affinities(&["com.jetbrains.rustrover"]);
        let child = parent.specialize("debug", "Debugger", &["bug", "cargo"]);

        assert_eq!(child.species, "code.rust.debug");
        assert_eq!(child.depth(), 3);
        assert_eq!(child.keywords, vec!["rust", "cargo", "bug"]);
        assert!(child.has_affinity("COM.JETBRAINS.RUSTROVER"));
        assert_eq!(child.fitness_score, NEUTRAL_FITNESS);
    }

    #[test]
    fn test_standard_catalog_is_large_and_valid() {
        let catalog = SpecialistCatalog::standard();
        assert!(catalog.count() >= 200, "got {}", catalog.count());
        catalog.validate().unwrap();
        assert!(catalog.get("code.swift.debug").is_some());
    }

    #[test]
    fn test_validate_rejects_duplicates_and_empty_species() {
        let dup = SpecialistCatalog::from_templates(vec![
            SpecialistTemplate::new("a.b", "A", "a", &["x"]),
            SpecialistTemplate::new("a.b", "A2", "a", &["y"]),
        ]);
        assert!(matches!(dup.validate(), Err(CatalogError::DuplicateSpecies(s)) if s == "a.b"));

        let empty = SpecialistCatalog::from_templates(vec![SpecialistTemplate::new(
            " ",
            "Blank",
            "none",
            &[],
        )]);
        assert!(matches!(empty.validate(), Err(CatalogError::EmptySpecies(0))));
    }

    #[test]
    fn test_with_fitness_clamps() {
        let t = SpecialistTemplate::new("x.y", "X", "x", &[]).with_fitness(1.7);
        assert_eq!(t.fitness_score, 1.0);
    }
}
