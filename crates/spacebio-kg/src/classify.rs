//! Keyword bucketing of papers.
//!
//! Each dimension is an ordered list of `(keyword, bucket)` pairs. The first
//! keyword found as a case-insensitive substring decides the bucket.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use spacebio_common::Paper;
use thiserror::Error;

pub const UNKNOWN_ORGANISM: &str = "Unknown Organism";
pub const UNKNOWN_AREA: &str = "Unknown Area";
pub const UNKNOWN_ENVIRONMENT: &str = "Unknown Environment";

/// Organism keywords. Rodent models come first since most rodent papers
/// also mention human health.
const ORGANISM_KEYWORDS: &[(&str, &str)] = &[
    ("mus musculus", "Rodent"),
    ("mouse", "Rodent"),
    ("mice", "Rodent"),
    ("murine", "Rodent"),
    ("rodent", "Rodent"),
    ("rattus", "Rodent"),
    ("rats", "Rodent"),
    ("arabidopsis", "Plant"),
    ("plant", "Plant"),
    ("seedling", "Plant"),
    ("lettuce", "Plant"),
    ("wheat", "Plant"),
    ("brassica", "Plant"),
    ("bacteria", "Microbe"),
    ("bacterial", "Microbe"),
    ("microbe", "Microbe"),
    ("microbial", "Microbe"),
    ("yeast", "Microbe"),
    ("e. coli", "Microbe"),
    ("salmonella", "Microbe"),
    ("fungi", "Microbe"),
    ("fungal", "Microbe"),
    ("drosophila", "Invertebrate"),
    ("fruit fly", "Invertebrate"),
    ("c. elegans", "Invertebrate"),
    ("caenorhabditis", "Invertebrate"),
    ("nematode", "Invertebrate"),
    ("tardigrade", "Invertebrate"),
    ("squid", "Invertebrate"),
    ("zebrafish", "Fish"),
    ("medaka", "Fish"),
    ("fish", "Fish"),
    ("cell culture", "Cell Culture"),
    ("cell line", "Cell Culture"),
    ("cultured cells", "Cell Culture"),
    ("in vitro", "Cell Culture"),
    ("homo sapiens", "Human"),
    ("astronaut", "Human"),
    ("cosmonaut", "Human"),
    ("crew", "Human"),
    ("human", "Human"),
];

const AREA_KEYWORDS: &[(&str, &str)] = &[
    ("bone", "Bone & Muscle"),
    ("muscle", "Bone & Muscle"),
    ("skeletal", "Bone & Muscle"),
    ("osteo", "Bone & Muscle"),
    ("atrophy", "Bone & Muscle"),
    ("cardiac", "Cardiovascular"),
    ("heart", "Cardiovascular"),
    ("cardiovascular", "Cardiovascular"),
    ("vascular", "Cardiovascular"),
    ("blood pressure", "Cardiovascular"),
    ("immune", "Immune System"),
    ("immunity", "Immune System"),
    ("lymphocyte", "Immune System"),
    ("cytokine", "Immune System"),
    ("t cell", "Immune System"),
    ("inflammat", "Immune System"),
    ("radiation", "Radiation"),
    ("irradiat", "Radiation"),
    ("cosmic ray", "Radiation"),
    ("ionizing", "Radiation"),
    ("heavy ion", "Radiation"),
    ("gene expression", "Gene Expression"),
    ("transcriptom", "Gene Expression"),
    ("rna-seq", "Gene Expression"),
    ("microarray", "Gene Expression"),
    ("proteom", "Gene Expression"),
    ("epigenet", "Gene Expression"),
    ("arabidopsis", "Plant Biology"),
    ("plant", "Plant Biology"),
    ("gravitropism", "Plant Biology"),
    ("photosynth", "Plant Biology"),
    ("seedling", "Plant Biology"),
    ("bacteria", "Microbiology"),
    ("microb", "Microbiology"),
    ("biofilm", "Microbiology"),
    ("virulence", "Microbiology"),
    ("yeast", "Microbiology"),
    ("brain", "Neuroscience"),
    ("neur", "Neuroscience"),
    ("cognit", "Neuroscience"),
    ("vestibular", "Neuroscience"),
    ("behavior", "Neuroscience"),
    ("stem cell", "Cell Biology"),
    ("mitochond", "Cell Biology"),
    ("cytoskelet", "Cell Biology"),
    ("apoptosis", "Cell Biology"),
    ("cell", "Cell Biology"),
];

/// Environment keywords. Ground analogs precede the generic spaceflight
/// terms since analog studies routinely cite spaceflight.
const ENVIRONMENT_KEYWORDS: &[(&str, &str)] = &[
    ("international space station", "ISS"),
    ("space station", "ISS"),
    ("(iss)", "ISS"),
    ("aboard the iss", "ISS"),
    ("on the iss", "ISS"),
    ("simulated microgravity", "Simulated Microgravity"),
    ("hindlimb unload", "Simulated Microgravity"),
    ("hindlimb suspension", "Simulated Microgravity"),
    ("clinostat", "Simulated Microgravity"),
    ("random positioning machine", "Simulated Microgravity"),
    ("rotating wall vessel", "Simulated Microgravity"),
    ("bed rest", "Simulated Microgravity"),
    ("head-down tilt", "Simulated Microgravity"),
    ("space radiation laboratory", "Radiation Facility"),
    ("nsrl", "Radiation Facility"),
    ("brookhaven", "Radiation Facility"),
    ("accelerator", "Radiation Facility"),
    ("lunar", "Lunar/Mars Analog"),
    ("moon", "Lunar/Mars Analog"),
    ("mars", "Lunar/Mars Analog"),
    ("martian", "Lunar/Mars Analog"),
    ("regolith", "Lunar/Mars Analog"),
    ("spaceflight", "Spaceflight"),
    ("space flight", "Spaceflight"),
    ("space shuttle", "Spaceflight"),
    ("sts-", "Spaceflight"),
    ("bion-m", "Spaceflight"),
    ("foton", "Spaceflight"),
    ("rodent research", "Spaceflight"),
    ("microgravity", "Spaceflight"),
    ("orbit", "Spaceflight"),
    ("ground control", "Ground Control"),
    ("ground-based", "Ground Control"),
    ("vivarium", "Ground Control"),
];

/// A classification axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Organism,
    Area,
    Environment,
}

#[derive(Debug, Error)]
#[error("unknown dimension '{0}' (expected organism, area or environment)")]
pub struct UnknownDimension(pub String);

impl FromStr for Dimension {
    type Err = UnknownDimension;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "organism" => Ok(Dimension::Organism),
            "area" => Ok(Dimension::Area),
            "environment" => Ok(Dimension::Environment),
            _ => Err(UnknownDimension(s.to_string())),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dimension::Organism => "organism",
            Dimension::Area => "area",
            Dimension::Environment => "environment",
        })
    }
}

impl Dimension {
    fn keywords(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Dimension::Organism    => ORGANISM_KEYWORDS,
            Dimension::Area        => AREA_KEYWORDS,
            Dimension::Environment => ENVIRONMENT_KEYWORDS,
        }
    }

    pub fn unknown(self) -> &'static str {
        match self {
            Dimension::Organism    => UNKNOWN_ORGANISM,
            Dimension::Area        => UNKNOWN_AREA,
            Dimension::Environment => UNKNOWN_ENVIRONMENT,
        }
    }

    /// Every bucket of this dimension in vocabulary order, "Unknown" last.
    pub fn buckets(self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = Vec::new();
        for &(_, bucket) in self.keywords() {
            if !out.contains(&bucket) {
                out.push(bucket);
            }
        }
        out.push(self.unknown());
        out
    }

    /// Stored paper fields consulted before the free text, in order.
    fn stored_fields(self, paper: &Paper) -> Vec<&str> {
        match self {
            Dimension::Organism => paper.organism.as_deref().into_iter().collect(),
            Dimension::Area => Vec::new(),
            Dimension::Environment => vec![paper.environment.as_str(), paper.mission.as_str()],
        }
    }
}

fn first_match(text_lower: &str, keywords: &'static [(&'static str, &'static str)]) -> Option<&'static str> {
    keywords
        .iter()
        .find(|(kw, _)| text_lower.contains(kw))
        .map(|(_, bucket)| *bucket)
}

/// Title, abstract and summary, lowercased.
fn paper_text(paper: &Paper) -> String {
    format!("{} {} {}", paper.title, paper.abstract_text, paper.summary).to_lowercase()
}

pub fn classify(paper: &Paper, dimension: Dimension) -> &'static str {
    let keywords = dimension.keywords();
    for field in dimension.stored_fields(paper) {
        let field = field.trim();
        if field.is_empty() {
            continue;
        }
        if let Some(bucket) = first_match(&field.to_lowercase(), keywords) {
            return bucket;
        }
    }
    first_match(&paper_text(paper), keywords).unwrap_or(dimension.unknown())
}

/// All vocabulary keywords (across dimensions) present in the paper text.
pub fn extract_keywords(paper: &Paper) -> BTreeSet<&'static str> {
    let text = paper_text(paper);
    [ORGANISM_KEYWORDS, AREA_KEYWORDS, ENVIRONMENT_KEYWORDS]
        .iter()
        .flat_map(|kws| kws.iter())
        .filter(|(kw, _)| text.contains(kw))
        .map(|(kw, _)| *kw)
        .collect()
}
