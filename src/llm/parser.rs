use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::models::LLMInsight;

static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[\]}])").expect("valid trailing comma regex"));

#[derive(Deserialize)]
#[serde(untagged)]
enum InsightPayload {
    List(Vec<LLMInsight>),
    Wrapped { insights: Vec<LLMInsight> },
    Single(LLMInsight),
}

pub fn parse_llm_response(response: &str) -> Result<Vec<LLMInsight>> {
    let json_str = extract_json(response)?;

    let payload: InsightPayload = match serde_json::from_str(&json_str) {
        Ok(payload) => payload,
        Err(first) => {
            let repaired = repair_json(&json_str);
            tracing::debug!("Retrying LLM response parse after repair ({})", first);
            serde_json::from_str(&repaired)
                .map_err(|e| Error::ParseError(format!("Failed to parse LLM response: {}", e)))?
        }
    };

    Ok(match payload {
        InsightPayload::List(list) => list,
        InsightPayload::Wrapped { insights } => insights,
        InsightPayload::Single(one) => vec![one],
    })
}

/// Fixes defects models commonly emit: smart quotes and trailing commas.
pub fn repair_json(json: &str) -> String {
    let straightened = json
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    TRAILING_COMMA_RE.replace_all(&straightened, "$1").into_owned()
}

fn extract_json(text: &str) -> Result<String> {
    // Try to find JSON block in markdown code blocks
    if let Some(start) = text.find("```json") {
        let start = start + 7;
        if let Some(end) = text[start..].find("```") {
            return Ok(text[start..start + end].trim().to_string());
        }
    }

    // Try plain code block
    if let Some(start) = text.find("```") {
        let start = start + 3;
        let start = text[start..]
            .find('\n')
            .map(|i| start + i + 1)
            .unwrap_or(start);
        if let Some(end) = text[start..].find("```") {
            let content = text[start..start + end].trim();
            if content.starts_with('[') || content.starts_with('{') {
                return Ok(content.to_string());
            }
        }
    }

    // Raw balanced array or object, whichever opens first
    let open = text.char_indices().find(|(_, c)| *c == '[' || *c == '{');
    if let Some((start, opener)) = open {
        let closer = if opener == '[' { ']' } else { '}' };
        let mut depth = 0i32;
        let mut in_string = false;
        let mut escape_next = false;

        for (i, c) in text[start..].char_indices() {
            if escape_next {
                escape_next = false;
                continue;
            }

            match c {
                '\\' if in_string => escape_next = true,
                '"' => in_string = !in_string,
                c if c == opener && !in_string => depth += 1,
                c if c == closer && !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(text[start..start + i + c.len_utf8()].to_string());
                    }
                }
                _ => {}
            }
        }
    }

    Err(Error::ParseError("No valid JSON found in response".to_string()))
}
