//! Fixed clinical category taxonomy.
//!
//! One ordered list consumed by both the prompt builder (so the model is
//! told which categories exist) and the report renderer (so sections appear
//! in a stable order regardless of the order the model emitted them).

/// Clinical domains in display order.
pub const CATEGORIES: &[&str] = &[
    "Haematology",
    "Iron Status",
    "Renal Function & Metabolic",
    "Liver Function",
    "Lipids & Cardiovascular Risk",
    "Inflammatory Marker & CVD Risk",
    "Diabetes & Pancreatic",
    "Infectious Disease Serology",
    "Thyroid Function",
    "Tumour Markers",
    "Immunoserology",
    "Urinalysis",
    "Other",
];

/// Case-insensitive, whitespace-trimmed category comparison.
pub fn matches(category: &str, candidate: &str) -> bool {
    category.trim().eq_ignore_ascii_case(candidate.trim())
}

/// Resolve a free-form category name to its canonical taxonomy entry.
/// Returns `None` for names outside the taxonomy.
pub fn canonical(name: &str) -> Option<&'static str> {
    CATEGORIES.iter().find(|c| matches(c, name)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_has_thirteen_categories() {
        assert_eq!(CATEGORIES.len(), 13);
        assert_eq!(CATEGORIES[0], "Haematology");
        assert_eq!(*CATEGORIES.last().unwrap(), "Other");
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(matches("Haematology", "haematology"));
        assert!(matches("Thyroid Function", "THYROID FUNCTION"));
    }

    #[test]
    fn matching_trims_whitespace() {
        assert!(matches("Liver Function", "  Liver Function \n"));
    }

    #[test]
    fn canonical_resolves_sloppy_names() {
        assert_eq!(canonical(" urinalysis "), Some("Urinalysis"));
        assert_eq!(canonical("Bone Density"), None);
    }
}
