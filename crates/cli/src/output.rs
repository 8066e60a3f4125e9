//! Rendering of answers and citations.

use cropwise_core::AppResult;
use cropwise_knowledge::{source_refs, AskMode, AskOutcome, ScoredDocument, SourceRef};
use serde::Serialize;

pub fn print_json(value: &impl Serialize) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Numbered citation list.
pub fn format_sources(refs: &[SourceRef]) -> String {
    let mut out = String::from("Sources:");
    for (i, r) in refs.iter().enumerate() {
        out.push_str(&format!("\n  {}. {} ({})", i + 1, r.source, r.topic));
        if !r.url.is_empty() {
            out.push_str(&format!(" - {}", r.url));
        }
    }
    out
}

/// Plain-text rendering of an exchange.
pub fn format_outcome(outcome: &AskOutcome) -> String {
    match outcome {
        AskOutcome::Restricted { message } => message.clone(),
        AskOutcome::Answered { documents, answer } => {
            let mut out = match answer {
                Ok(text) => text.trim().to_string(),
                Err(e) => e.user_message(),
            };
            if !documents.is_empty() {
                out.push_str("\n\n");
                out.push_str(&format_sources(&source_refs(documents)));
            }
            out
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeJson<'a> {
    status: &'static str,
    mode: &'static str,
    question: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    sources: Vec<SourceRef>,
}

pub fn outcome_json(
    question: &str,
    mode: AskMode,
    outcome: &AskOutcome,
) -> AppResult<serde_json::Value> {
    let mode = match mode {
        AskMode::Retrieval => "retrieval",
        AskMode::Direct => "direct",
    };

    let json = match outcome {
        AskOutcome::Restricted { message } => OutcomeJson {
            status: "restricted",
            mode,
            question,
            answer: Some(message.clone()),
            error: None,
            sources: Vec::new(),
        },
        AskOutcome::Answered { documents, answer } => OutcomeJson {
            status: if answer.is_ok() { "answered" } else { "failed" },
            mode,
            question,
            answer: answer.as_ref().ok().cloned(),
            error: answer.as_ref().err().map(|e| e.user_message()),
            sources: source_refs(documents),
        },
    };

    Ok(serde_json::to_value(json)?)
}

/// Score table for `search`.
pub fn format_results(result: &[ScoredDocument]) -> String {
    result
        .iter()
        .enumerate()
        .map(|(i, scored)| {
            let r = SourceRef::from(scored);
            format!(
                "{}. [{:.3}] {} ({})\n   {}",
                i + 1,
                r.score,
                r.topic,
                r.source,
                r.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
