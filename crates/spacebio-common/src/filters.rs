//! Filter object narrowing the paper list by year range and categorical tags.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::paper::Paper;

/// The categorical dimensions a filter can select values in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Organism,
    Mission,
    Environment,
    Tissue,
    Assay,
    Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    pub year_gte: Option<i32>,
    pub year_lte: Option<i32>,
    #[serde(default)]
    pub organisms: BTreeSet<String>,
    #[serde(default)]
    pub missions: BTreeSet<String>,
    #[serde(default)]
    pub environments: BTreeSet<String>,
    #[serde(default)]
    pub tissues: BTreeSet<String>,
    #[serde(default)]
    pub assays: BTreeSet<String>,
    #[serde(default)]
    pub outcomes: BTreeSet<String>,
    #[serde(default)]
    pub osdr_only: bool,
    pub has_doi: Option<bool>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.year_gte.is_none()
            && self.year_lte.is_none()
            && self.organisms.is_empty()
            && self.missions.is_empty()
            && self.environments.is_empty()
            && self.tissues.is_empty()
            && self.assays.is_empty()
            && self.outcomes.is_empty()
            && !self.osdr_only
            && self.has_doi.is_none()
    }

    fn set_mut(&mut self, kind: FilterKind) -> &mut BTreeSet<String> {
        match kind {
            FilterKind::Organism    => &mut self.organisms,
            FilterKind::Mission     => &mut self.missions,
            FilterKind::Environment => &mut self.environments,
            FilterKind::Tissue      => &mut self.tissues,
            FilterKind::Assay       => &mut self.assays,
            FilterKind::Outcome     => &mut self.outcomes,
        }
    }

    pub fn values(&self, kind: FilterKind) -> &BTreeSet<String> {
        match kind {
            FilterKind::Organism    => &self.organisms,
            FilterKind::Mission     => &self.missions,
            FilterKind::Environment => &self.environments,
            FilterKind::Tissue      => &self.tissues,
            FilterKind::Assay       => &self.assays,
            FilterKind::Outcome     => &self.outcomes,
        }
    }

    /// Select `value` if absent, deselect it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, kind: FilterKind, value: impl Into<String>) -> bool {
        let value = value.into();
        let set = self.set_mut(kind);
        if set.remove(&value) {
            false
        } else {
            set.insert(value);
            true
        }
    }

    pub fn clear(&mut self) {
        *self = FilterSet::default();
    }

    pub fn matches(&self, paper: &Paper) -> bool {
        if let Some(min) = self.year_gte {
            if !paper.year.is_some_and(|y| y >= min) {
                return false;
            }
        }
        if let Some(max) = self.year_lte {
            if !paper.year.is_some_and(|y| y <= max) {
                return false;
            }
        }
        if self.osdr_only && !paper.has_osdr {
            return false;
        }
        if let Some(want) = self.has_doi {
            if paper.has_doi != want {
                return false;
            }
        }

        let organism = paper.organism.as_deref().unwrap_or("");
        if !any_field_match(&self.organisms, organism)
            || !any_field_match(&self.missions, &paper.mission)
            || !any_field_match(&self.environments, &paper.environment)
        {
            return false;
        }

        if self.tissues.is_empty() && self.assays.is_empty() && self.outcomes.is_empty() {
            return true;
        }
        let text = paper.searchable_text().to_lowercase();
        any_text_match(&self.tissues, &text)
            && any_text_match(&self.assays, &text)
            && any_text_match(&self.outcomes, &text)
    }
}

/// Empty selection passes; otherwise any selected value must equal or occur in `field`.
fn any_field_match(selected: &BTreeSet<String>, field: &str) -> bool {
    if selected.is_empty() {
        return true;
    }
    let field = field.to_lowercase();
    selected.iter().any(|v| {
        let v = v.to_lowercase();
        !v.is_empty() && field.contains(&v)
    })
}

fn any_text_match(selected: &BTreeSet<String>, lowered_text: &str) -> bool {
    selected.is_empty()
        || selected.iter().any(|v| lowered_text.contains(&v.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(year: Option<i32>, organism: Option<&str>) -> Paper {
        let mut p = Paper::with_defaults("1", "Muscle atrophy in spaceflown mice", "https://example.org/1");
        p.year = year;
        p.organism = organism.map(String::from);
        p.mission = "ISS Rodent Research-1".to_string();
        p.abstract_text = "Soleus muscle RNA-seq after 37 days on the ISS.".to_string();
        p
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let f = FilterSet::default();
        assert!(f.is_empty());
        assert!(f.matches(&paper(None, None)));
    }

    #[test]
    fn test_year_bounds_inclusive_and_exclude_missing() {
        let f = FilterSet { year_gte: Some(2015), year_lte: Some(2020), ..Default::default() };
        assert!(f.matches(&paper(Some(2015), None)));
        assert!(f.matches(&paper(Some(2020), None)));
        assert!(!f.matches(&paper(Some(2021), None)));
        assert!(!f.matches(&paper(None, None)));
    }

    #[test]
    fn test_toggle_and_clear() {
        let mut f = FilterSet::default();
        assert!(f.toggle(FilterKind::Organism, "Mus musculus"));
        assert!(!f.is_empty());
        assert!(!f.toggle(FilterKind::Organism, "Mus musculus"));
        assert!(f.is_empty());

        f.toggle(FilterKind::Assay, "RNA-seq");
        f.osdr_only = true;
        f.clear();
        assert_eq!(f, FilterSet::default());
    }

    #[test]
    fn test_categorical_matching() {
        let mut f = FilterSet::default();
        f.toggle(FilterKind::Organism, "mus");
        assert!(f.matches(&paper(Some(2019), Some("Mus musculus"))));
        assert!(!f.matches(&paper(Some(2019), Some("Arabidopsis"))));

        let mut f = FilterSet::default();
        f.toggle(FilterKind::Mission, "rodent research");
        f.toggle(FilterKind::Tissue, "soleus");
        assert!(f.matches(&paper(Some(2019), None)));

        f.toggle(FilterKind::Outcome, "bone density");
        assert!(!f.matches(&paper(Some(2019), None)));
    }

    #[test]
    fn test_osdr_and_doi_flags() {
        let mut p = paper(Some(2019), None);
        let f = FilterSet { osdr_only: true, ..Default::default() };
        assert!(!f.matches(&p));
        p.has_osdr = true;
        assert!(f.matches(&p));

        let f = FilterSet { has_doi: Some(false), ..Default::default() };
        assert!(f.matches(&p));
        p.has_doi = true;
        assert!(!f.matches(&p));
    }
}
