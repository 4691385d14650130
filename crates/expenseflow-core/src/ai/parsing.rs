//! Parsing helpers for inference responses
//!
//! Models often wrap the payload in prose or code fences, so these helpers
//! look for the structure they need instead of expecting a clean reply.

use serde::Deserialize;

use crate::error::{Error, Result};

use super::types::{ParsedExpense, ParsedGuidance};

/// Minimum length for a prose paragraph to count as a summary
const MIN_SUMMARY_LEN: usize = 20;

fn truncate(s: &str) -> String {
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s.to_string()
    }
}

/// Slice out the outermost `{...}` of a response
pub fn extract_json_object(response: &str) -> Result<&str> {
    let response = response.trim();
    match (response.find('{'), response.rfind('}')) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            truncate(response)
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct RawParsedExpense {
    #[serde(default)]
    description: Option<String>,
    amount: serde_json::Value,
}

/// Parse `{"description": ..., "amount": ...}` from a response.
///
/// The amount may be a number or a numeric string (either decimal separator).
/// It must be finite and non-negative. A missing or blank description falls
/// back to `original_text`.
pub fn parse_expense_response(response: &str, original_text: &str) -> Result<ParsedExpense> {
    let json_str = extract_json_object(response)?;
    let raw: RawParsedExpense = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid JSON from AI: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })?;

    let amount = match &raw.amount {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| Error::InvalidData(format!("Amount is not numeric: {}", raw.amount)))?;

    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidData(format!(
            "Amount out of range: {}",
            amount
        )));
    }

    let description = raw
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| original_text.trim().to_string());

    Ok(ParsedExpense {
        description,
        amount,
    })
}

/// Strip an enumeration marker (`1.`, `12)`, `-`, `*`, `•`) from a line
fn strip_enumeration(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    let rest = if digits > 0 {
        let after = &line[digits..];
        after.strip_prefix('.').or_else(|| after.strip_prefix(')'))?
    } else {
        line.strip_prefix('-')
            .or_else(|| line.strip_prefix('•'))
            .or_else(|| line.strip_prefix('*'))?
    };

    // "**Bold**" is emphasis, not a bullet
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let item = rest.trim();
    (!item.is_empty()).then_some(item)
}

/// Headers (`# ...`) and label lines (`**Recommendations:**`)
fn is_label(line: &str) -> bool {
    if line.starts_with('#') || line.chars().all(|c| c == '-' || c == '=' || c == '*') {
        return true;
    }
    let bare = line.trim_matches(|c: char| c == '*' || c == '_' || c.is_whitespace());
    bare.ends_with(':')
}

fn clean_markup(s: &str) -> String {
    s.replace("**", "").trim().to_string()
}

/// Split free-form guidance into a summary and recommendations.
///
/// The summary is the first prose paragraph of at least
/// [`MIN_SUMMARY_LEN`] characters. Enumerated lines anywhere in the text are
/// recommendations. Returns `None` when there is no summary.
pub fn parse_guidance_text(text: &str) -> Option<ParsedGuidance> {
    let mut summary: Option<String> = None;
    let mut paragraph: Vec<String> = Vec::new();
    let mut recommendations = Vec::new();

    let close_paragraph = |paragraph: &mut Vec<String>, summary: &mut Option<String>| {
        if summary.is_none() && !paragraph.is_empty() {
            let joined = paragraph.join(" ");
            if joined.chars().count() >= MIN_SUMMARY_LEN {
                *summary = Some(joined);
            }
        }
        paragraph.clear();
    };

    for line in text.lines().map(str::trim) {
        if line.is_empty() || is_label(line) {
            close_paragraph(&mut paragraph, &mut summary);
            continue;
        }
        if let Some(item) = strip_enumeration(line) {
            close_paragraph(&mut paragraph, &mut summary);
            let item = clean_markup(item);
            if !item.is_empty() {
                recommendations.push(item);
            }
            continue;
        }
        paragraph.push(clean_markup(line));
    }
    close_paragraph(&mut paragraph, &mut summary);

    summary.map(|summary| ParsedGuidance {
        summary,
        recommendations,
    })
}
