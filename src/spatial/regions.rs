// ============================================================
// Layer 5 — Recognised Regions
// ============================================================
// The first-order administrative regions a GPE-only key may
// name in full. Matching is on the whole trimmed, lower-cased
// string: "florida" matches, "Florida Panhandle" does not.

use std::collections::HashSet;

use crate::domain::location::CanonicalLocationKey;

pub const US_STATES: [&str; 50] = [
    "Alabama", "Alaska", "Arizona", "Arkansas", "California", "Colorado", "Connecticut", "Delaware",
    "Florida", "Georgia", "Hawaii", "Idaho", "Illinois", "Indiana", "Iowa", "Kansas", "Kentucky",
    "Louisiana", "Maine", "Maryland", "Massachusetts", "Michigan", "Minnesota", "Mississippi",
    "Missouri", "Montana", "Nebraska", "Nevada", "New Hampshire", "New Jersey", "New Mexico",
    "New York", "North Carolina", "North Dakota", "Ohio", "Oklahoma", "Oregon", "Pennsylvania",
    "Rhode Island", "South Carolina", "South Dakota", "Tennessee", "Texas", "Utah", "Vermont",
    "Virginia", "Washington", "West Virginia", "Wisconsin", "Wyoming",
];

/// Normalised form used on both sides of every region comparison
pub fn region_lookup_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A fixed list of region names, stored normalised.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    names: HashSet<String>,
}

impl RegionCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names.into_iter().map(|n| region_lookup_key(n.as_ref())).collect(),
        }
    }

    pub fn us_states() -> Self {
        Self::new(US_STATES)
    }

    /// Exact, case-insensitive match of the whole value
    pub fn is_region(&self, value: &str) -> bool {
        self.names.contains(&region_lookup_key(value))
    }

    /// True when a key names one region and nothing else
    pub fn is_region_only(&self, key: &CanonicalLocationKey) -> bool {
        key.fac.is_empty() && key.loc.is_empty() && self.is_region(&key.gpe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_case_insensitive_match() {
        let catalog = RegionCatalog::us_states();
        assert!(catalog.is_region("Florida"));
        assert!(catalog.is_region("  florida "));
        assert!(catalog.is_region("NEW YORK"));
        assert!(!catalog.is_region("Florida Panhandle"));
        assert!(!catalog.is_region("Tampa, Florida"));
    }

    #[test]
    fn test_region_only_requires_empty_fac_and_loc() {
        let catalog = RegionCatalog::us_states();
        assert!(catalog.is_region_only(&CanonicalLocationKey::new("", "", "Ohio")));
        assert!(!catalog.is_region_only(&CanonicalLocationKey::new("Airport", "", "Ohio")));
        assert!(!catalog.is_region_only(&CanonicalLocationKey::new("", "River", "Ohio")));
    }

    #[test]
    fn test_custom_catalog() {
        let catalog = RegionCatalog::new(["Ontario", "Quebec"]);
        assert!(catalog.is_region("ontario"));
        assert!(!catalog.is_region("Ohio"));
    }
}
