use regex::Regex;

use crate::config::IntelConfig;
use crate::error::Result;
use crate::text::phrase_alternation;

pub const PRICING_KEYWORDS: &str = "pricing_keywords";
pub const PRICE_POINTS: &str = "price_points";
pub const MARGIN_KEYWORDS: &str = "margin_keywords";
pub const COMPETITIVE_KEYWORDS: &str = "competitive_keywords";
pub const URGENCY_HIGH: &str = "urgency_high";
pub const URGENCY_MEDIUM: &str = "urgency_medium";
pub const MSP_CONTEXT: &str = "msp_context";
pub const CNAPP_PRICING: &str = "cnapp_pricing_intelligence";
pub const MA_INTELLIGENCE: &str = "ma_intelligence";
pub const CHANNEL_INTELLIGENCE: &str = "channel_intelligence";

pub const PRICE_SHOCK: &str = "price_shock";
pub const LICENSE_ENFORCEMENT: &str = "license_enforcement";
pub const PARTNER_PROGRAM: &str = "partner_program";
pub const MIGRATION: &str = "migration";
pub const ACQUISITION: &str = "acquisition";
pub const DEADLINE: &str = "deadline";
pub const CLOUD_SECURITY: &str = "cloud_security";
pub const BUSINESS_CONTEXT: &str = "business_context";

/// A literal phrase list compiled into one word-bounded alternation.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    regex: Option<Regex>,
}

impl KeywordMatcher {
    pub fn compile<S: AsRef<str>>(phrases: &[S]) -> Result<Self> {
        let regex = match phrase_alternation(phrases.iter().map(|p| p.as_ref())) {
            Some(source) => Some(Regex::new(&source)?),
            None => None,
        };
        Ok(Self { regex })
    }

    pub fn count(&self, text: &str) -> usize {
        self.regex
            .as_ref()
            .map(|re| re.find_iter(text).count())
            .unwrap_or(0)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().map(|re| re.is_match(text)).unwrap_or(false)
    }
}

/// A family of raw regexes describing one kind of phrase ("pricing doubled").
#[derive(Debug, Clone)]
pub struct PhraseFamily {
    patterns: Vec<Regex>,
}

impl PhraseFamily {
    pub fn compile(sources: &[String]) -> Result<Self> {
        let patterns = sources
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| Regex::new(&format!("(?i){}", s)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }

    pub fn count(&self, text: &str) -> usize {
        self.patterns.iter().map(|re| re.find_iter(text).count()).sum()
    }
}

/// Every compiled table the pattern scorer reads.
#[derive(Debug, Clone)]
pub struct PatternTables {
    pub pricing: KeywordMatcher,
    pub price_points: KeywordMatcher,
    pub margin: KeywordMatcher,
    pub competitive: KeywordMatcher,
    pub urgency_high: KeywordMatcher,
    pub urgency_medium: KeywordMatcher,
    pub msp_context: KeywordMatcher,
    pub cnapp: KeywordMatcher,
    pub ma: KeywordMatcher,
    pub channel: KeywordMatcher,
    pub vendors: KeywordMatcher,

    pub price_shock: PhraseFamily,
    pub license_enforcement: PhraseFamily,
    pub partner_program: PhraseFamily,
    pub migration: PhraseFamily,
    pub acquisition: PhraseFamily,
    pub deadline: PhraseFamily,
    pub cloud_security: PhraseFamily,
    pub business_context: PhraseFamily,
}

impl PatternTables {
    pub fn compile(config: &IntelConfig, vendors: &[String]) -> Result<Self> {
        let keywords = |name: &str| KeywordMatcher::compile(config.keyword_list(name));
        let family = |name: &str| PhraseFamily::compile(config.pattern_list(name));

        Ok(Self {
            pricing: keywords(PRICING_KEYWORDS)?,
            price_points: keywords(PRICE_POINTS)?,
            margin: keywords(MARGIN_KEYWORDS)?,
            competitive: keywords(COMPETITIVE_KEYWORDS)?,
            urgency_high: keywords(URGENCY_HIGH)?,
            urgency_medium: keywords(URGENCY_MEDIUM)?,
            msp_context: keywords(MSP_CONTEXT)?,
            cnapp: keywords(CNAPP_PRICING)?,
            ma: keywords(MA_INTELLIGENCE)?,
            channel: keywords(CHANNEL_INTELLIGENCE)?,
            vendors: KeywordMatcher::compile(vendors)?,

            price_shock: family(PRICE_SHOCK)?,
            license_enforcement: family(LICENSE_ENFORCEMENT)?,
            partner_program: family(PARTNER_PROGRAM)?,
            migration: family(MIGRATION)?,
            acquisition: family(ACQUISITION)?,
            deadline: family(DEADLINE)?,
            cloud_security: family(CLOUD_SECURITY)?,
            business_context: family(BUSINESS_CONTEXT)?,
        })
    }
}
