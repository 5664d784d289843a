use regex::Regex;
use std::collections::BTreeSet;

use crate::companies::CompanyTable;
use crate::error::{Error, Result};
use crate::models::{AcquisitionChain, AcquisitionIntelligence, MatchResult};
use crate::text::{normalize_phrase, phrase_alternation, word_count};

/// Upper bound on acquirer hops followed when resolving an acquisition chain.
pub const MAX_ACQUISITION_HOPS: usize = 3;

const DENSITY_WEIGHT: f64 = 0.4;
const DIVERSITY_WEIGHT: f64 = 0.3;
const RICHNESS_WEIGHT: f64 = 0.3;
const RICHNESS_FULL_CHARS: f64 = 500.0;
const ACQUISITION_BONUS: f64 = 0.10;
const BUSINESS_TERM_BONUS: f64 = 0.10;
const CONFIDENCE_SCALE: f64 = 1.5;
const MIN_CONFIDENCE: f64 = 0.2;
const MAX_CONFIDENCE: f64 = 1.0;

const BUSINESS_TERMS: &str = r"(?i)\b(pric\w*|licens\w*|acquisition\w*|merger\w*|partnership\w*)\b";

struct CompanyPattern {
    canonical: String,
    regex: Regex,
}

/// Maps free text to canonical vendor identities.
///
/// Holds one compiled alternation per company; every call only reads these,
/// so a single matcher can be shared across threads behind an `Arc`.
pub struct AliasMatcher {
    table: CompanyTable,
    patterns: Vec<CompanyPattern>,
    business_terms: Regex,
}

impl AliasMatcher {
    pub fn new(table: CompanyTable) -> Result<Self> {
        let mut patterns = Vec::with_capacity(table.len());

        for company in table.companies() {
            let names: BTreeSet<&str> = std::iter::once(company.canonical_name.as_str())
                .chain(company.aliases.iter().map(|a| a.as_str()))
                .collect();
            let branches = names
                .iter()
                .copied()
                .filter(|name| !is_compound_of(name, &names));
            let source = phrase_alternation(branches).ok_or_else(|| {
                Error::InvalidTable(format!("no matchable names for {}", company.canonical_name))
            })?;

            patterns.push(CompanyPattern {
                canonical: company.canonical_name.clone(),
                regex: Regex::new(&source)?,
            });
        }

        tracing::debug!("Compiled alias patterns for {} companies", patterns.len());

        Ok(Self {
            table,
            patterns,
            business_terms: Regex::new(BUSINESS_TERMS)?,
        })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(CompanyTable::builtin()?)
    }

    pub fn table(&self) -> &CompanyTable {
        &self.table
    }

    pub fn find_companies_in_text(&self, text: &str) -> MatchResult {
        let mut result = MatchResult::default();
        if text.trim().is_empty() {
            return result;
        }

        for pattern in &self.patterns {
            let mut hits: Vec<String> = Vec::new();
            let mut count = 0;

            for m in pattern.regex.find_iter(text) {
                count += 1;
                let hit = normalize_phrase(m.as_str());
                if !hits.contains(&hit) {
                    hits.push(hit);
                }
            }

            if count == 0 {
                continue;
            }

            let company_parent = self
                .table
                .get(&pattern.canonical)
                .and_then(|identity| identity.acquired_by.as_deref());
            for hit in &hits {
                if let Some(parent) = self.table.acquirer_of(hit).or(company_parent) {
                    result
                        .acquisition_mappings
                        .insert(hit.clone(), parent.to_string());
                }
            }

            result.total_matches += count;
            result.matched_companies.insert(pattern.canonical.clone());
            result.alias_hits.insert(pattern.canonical.clone(), hits);
        }

        result.confidence_score = self.calculate_confidence(text, &result);
        result
    }

    /// Weighted blend of match density, company diversity and text richness,
    /// plus flat bonuses, scaled and clamped into `[0.2, 1.0]`.
    fn calculate_confidence(&self, text: &str, result: &MatchResult) -> f64 {
        if result.matched_companies.is_empty() {
            return 0.0;
        }

        let words = word_count(text).max(1) as f64;
        let density = (result.total_matches as f64 / words).min(1.0);
        let diversity = result.matched_companies.len() as f64 / self.table.len().max(1) as f64;
        let richness = (text.chars().count() as f64 / RICHNESS_FULL_CHARS).min(1.0);

        let mut raw =
            density * DENSITY_WEIGHT + diversity * DIVERSITY_WEIGHT + richness * RICHNESS_WEIGHT;

        if !result.acquisition_mappings.is_empty() {
            raw += ACQUISITION_BONUS;
        }
        if self.business_terms.is_match(text) {
            raw += BUSINESS_TERM_BONUS;
        }

        (raw * CONFIDENCE_SCALE).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }

    pub fn normalize_company_name(&self, name: &str) -> Option<String> {
        self.table.resolve(name).map(|s| s.to_string())
    }

    /// Broadens a keyword list: every keyword is kept, and keywords naming a
    /// known company pull in its canonical name and all of its aliases.
    pub fn expand_keyword_list<S: AsRef<str>>(&self, keywords: &[S]) -> Vec<String> {
        let mut expanded: Vec<String> = Vec::with_capacity(keywords.len());
        let mut added: BTreeSet<String> = BTreeSet::new();

        for keyword in keywords {
            let keyword = keyword.as_ref();
            expanded.push(keyword.to_string());
            added.insert(normalize_phrase(keyword));

            let Some(canonical) = self.table.resolve(keyword) else {
                continue;
            };
            let Some(company) = self.table.get(canonical) else {
                continue;
            };

            let names = std::iter::once(&company.canonical_name).chain(company.aliases.iter());
            for name in names {
                if added.insert(name.clone()) {
                    expanded.push(name.clone());
                }
            }
        }

        expanded
    }

    /// Follows acquirers from `name`, stopping after `MAX_ACQUISITION_HOPS`
    /// or when a name repeats.
    pub fn resolve_acquisition_chain(&self, name: &str) -> Option<AcquisitionChain> {
        let start = normalize_phrase(name);
        let mut path = vec![start.clone()];
        let mut visited = BTreeSet::new();
        visited.insert(start.clone());

        let mut current = start.clone();
        while path.len() <= MAX_ACQUISITION_HOPS {
            let Some(parent) = self.table.parent_of(&current) else {
                break;
            };
            if !visited.insert(parent.to_string()) {
                tracing::warn!("Acquisition cycle while resolving {}: {}", start, parent);
                break;
            }
            path.push(parent.to_string());
            current = parent.to_string();
        }

        if path.len() < 2 {
            return None;
        }

        Some(AcquisitionChain {
            acquired: start,
            immediate_parent: path[1].clone(),
            ultimate_parent: path[path.len() - 1].clone(),
            path,
        })
    }

    pub fn get_acquisition_intelligence(&self, text: &str) -> AcquisitionIntelligence {
        let matches = self.find_companies_in_text(text);
        let mut intel = AcquisitionIntelligence::default();

        for (alias, parent) in &matches.acquisition_mappings {
            intel.direct_acquisitions.insert(alias.clone(), parent.clone());
            intel.parent_companies.insert(parent.clone());

            if let Some(chain) = self.resolve_acquisition_chain(alias) {
                intel
                    .parent_companies
                    .extend(chain.path.iter().skip(1).cloned());
                intel.acquisition_chains.push(chain);
            }
        }

        intel
    }
}

/// True when `name` is two other names of the same company joined by a
/// space, e.g. "microsoft azure". Such compounds are left out of the
/// alternation so each part is matched and counted on its own.
fn is_compound_of(name: &str, names: &BTreeSet<&str>) -> bool {
    name.match_indices(' ').any(|(i, _)| {
        let (left, right) = (&name[..i], &name[i + 1..]);
        names.contains(left) && names.contains(right)
    })
}
