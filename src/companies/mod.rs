pub mod matcher;

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::CompanyIdentity;
use crate::text::normalize_phrase;

pub use matcher::{AliasMatcher, MAX_ACQUISITION_HOPS};

const BUILTIN_COMPANIES: &str = include_str!("../../data/companies.yaml");

#[derive(Debug, Deserialize)]
struct RawCompanyTable {
    #[serde(default)]
    companies: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    acquisitions: BTreeMap<String, String>,
}

/// Validated vendor identity table: canonical names, aliases and acquisitions.
#[derive(Debug, Clone)]
pub struct CompanyTable {
    companies: BTreeMap<String, CompanyIdentity>,
    aliases: HashMap<String, String>,
    acquisitions: BTreeMap<String, String>,
}

impl CompanyTable {
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_COMPANIES)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!("Loaded company table from {}", path.as_ref().display());
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let parsed: RawCompanyTable = serde_yaml::from_str(raw)?;
        Self::from_entries(parsed.companies, parsed.acquisitions)
    }

    pub fn from_entries(
        companies: BTreeMap<String, Vec<String>>,
        acquisitions: BTreeMap<String, String>,
    ) -> Result<Self> {
        let mut table = Self {
            companies: BTreeMap::new(),
            aliases: HashMap::new(),
            acquisitions: BTreeMap::new(),
        };

        for name in companies.keys() {
            let canonical = normalize_phrase(name);
            if canonical.is_empty() {
                return Err(Error::InvalidTable("empty canonical company name".to_string()));
            }
            if table.companies.contains_key(&canonical) {
                return Err(Error::InvalidTable(format!(
                    "duplicate canonical company name: {}",
                    canonical
                )));
            }
            table.aliases.insert(canonical.clone(), canonical.clone());
            table.companies.insert(
                canonical.clone(),
                CompanyIdentity {
                    canonical_name: canonical,
                    aliases: BTreeSet::new(),
                    acquired_by: None,
                },
            );
        }

        for (name, aliases) in &companies {
            let canonical = normalize_phrase(name);
            for alias in aliases {
                let alias = normalize_phrase(alias);
                if alias.is_empty() {
                    return Err(Error::InvalidTable(format!("empty alias for {}", canonical)));
                }
                if alias == canonical {
                    continue;
                }
                match table.aliases.get(&alias) {
                    Some(existing) if existing != &canonical => {
                        return Err(Error::InvalidTable(format!(
                            "alias '{}' maps to both '{}' and '{}'",
                            alias, existing, canonical
                        )));
                    }
                    _ => {}
                }
                table.aliases.insert(alias.clone(), canonical.clone());
                if let Some(identity) = table.companies.get_mut(&canonical) {
                    identity.aliases.insert(alias);
                }
            }
        }

        for (acquired, parent) in acquisitions {
            let acquired = normalize_phrase(&acquired);
            let parent = normalize_phrase(&parent);
            if !table.aliases.contains_key(&acquired) {
                return Err(Error::InvalidTable(format!(
                    "acquisition of unknown company '{}'",
                    acquired
                )));
            }
            if !table.companies.contains_key(&parent) {
                return Err(Error::InvalidTable(format!(
                    "acquirer '{}' of '{}' is not a canonical company",
                    parent, acquired
                )));
            }
            table.acquisitions.insert(acquired, parent);
        }

        table.check_acquisition_cycles()?;

        for (acquired, parent) in &table.acquisitions {
            if let Some(identity) = table.companies.get_mut(acquired) {
                identity.acquired_by = Some(parent.clone());
            }
        }

        tracing::debug!(
            "Company table: {} companies, {} names, {} acquisitions",
            table.companies.len(),
            table.aliases.len(),
            table.acquisitions.len()
        );

        Ok(table)
    }

    fn check_acquisition_cycles(&self) -> Result<()> {
        for start in self.acquisitions.keys() {
            let mut visited = BTreeSet::new();
            let mut path = vec![start.clone()];
            let mut current = start.as_str();
            visited.insert(current);

            while let Some(parent) = self.next_acquirer(current) {
                path.push(parent.to_string());
                if !visited.insert(parent) {
                    return Err(Error::AcquisitionCycle(path.join(" -> ")));
                }
                current = parent;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    pub fn companies(&self) -> impl Iterator<Item = &CompanyIdentity> {
        self.companies.values()
    }

    pub fn get(&self, canonical: &str) -> Option<&CompanyIdentity> {
        self.companies.get(&normalize_phrase(canonical))
    }

    /// Exact, case-insensitive lookup of a canonical name or alias.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.aliases.get(&normalize_phrase(name)).map(|s| s.as_str())
    }

    /// Acquirer recorded for exactly this name.
    pub fn acquirer_of(&self, name: &str) -> Option<&str> {
        self.acquisitions.get(&normalize_phrase(name)).map(|s| s.as_str())
    }

    /// Acquirer for a name or, failing that, for the company it belongs to,
    /// so product aliases inherit their vendor's parent.
    pub fn parent_of(&self, name: &str) -> Option<&str> {
        let name = normalize_phrase(name);
        self.acquirer_of(&name).or_else(|| {
            self.resolve(&name)
                .and_then(|canonical| self.companies.get(canonical))
                .and_then(|identity| identity.acquired_by.as_deref())
        })
    }

    fn next_acquirer(&self, name: &str) -> Option<&str> {
        self.acquisitions.get(name).map(|s| s.as_str()).or_else(|| {
            self.aliases
                .get(name)
                .filter(|canonical| canonical.as_str() != name)
                .and_then(|canonical| self.acquisitions.get(canonical))
                .map(|s| s.as_str())
        })
    }

    pub fn acquisitions(&self) -> &BTreeMap<String, String> {
        &self.acquisitions
    }
}
