use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyIdentity {
    pub canonical_name: String,
    pub aliases: BTreeSet<String>,
    pub acquired_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    pub matched_companies: BTreeSet<String>,
    /// Canonical name to the distinct alias strings that matched, lowercased.
    pub alias_hits: BTreeMap<String, Vec<String>>,
    pub total_matches: usize,
    pub confidence_score: f64,
    /// Matched alias to the canonical name of its acquirer.
    pub acquisition_mappings: BTreeMap<String, String>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.matched_companies.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AcquisitionChain {
    pub acquired: String,
    pub immediate_parent: String,
    pub ultimate_parent: String,
    /// Every name on the path, starting with the acquired name.
    pub path: Vec<String>,
}

impl AcquisitionChain {
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AcquisitionIntelligence {
    pub direct_acquisitions: BTreeMap<String, String>,
    pub parent_companies: BTreeSet<String>,
    pub acquisition_chains: Vec<AcquisitionChain>,
}

impl AcquisitionIntelligence {
    pub fn is_empty(&self) -> bool {
        self.direct_acquisitions.is_empty()
    }
}
