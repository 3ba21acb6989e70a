//! Splits raw model output into a reasoning trace and a user-facing answer.
//!
//! The scanner has two states. In `Answer` it copies text until an opening
//! marker; in `Reasoning` it copies text until a closing marker. Edge cases
//! are explicit transitions:
//!
//! - no markers at all: everything is answer
//! - closing marker before any opening marker: the output began inside a
//!   reasoning block (the prompt itself ended with the opening marker)
//! - opening marker never closed: the reasoning runs to the end of the output
//! - several reasoning blocks: joined with a blank line

/// A pair of reasoning delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerPair {
    pub open: &'static str,
    pub close: &'static str,
}

/// Recognised delimiters, in priority order. Only the first pair that occurs
/// in an output is used for that output.
pub const REASONING_MARKERS: [MarkerPair; 2] = [
    MarkerPair {
        open: "<thinking>",
        close: "</thinking>",
    },
    MarkerPair {
        open: "<think>",
        close: "</think>",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Answer,
    Reasoning,
}

/// Output of [`split_reasoning`]. Both parts are trimmed; either may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedOutput {
    pub answer: String,
    pub reasoning: Option<String>,
}

/// Split `raw` into answer and reasoning.
pub fn split_reasoning(raw: &str) -> ScannedOutput {
    let Some(markers) = REASONING_MARKERS
        .iter()
        .find(|m| raw.contains(m.open) || raw.contains(m.close))
    else {
        return ScannedOutput {
            answer: raw.trim().to_string(),
            reasoning: None,
        };
    };

    let first_open = raw.find(markers.open);
    let first_close = raw.find(markers.close);
    let mut state = match (first_open, first_close) {
        (None, Some(_)) => ScanState::Reasoning,
        (Some(open), Some(close)) if close < open => ScanState::Reasoning,
        _ => ScanState::Answer,
    };

    let mut answer = String::new();
    let mut blocks: Vec<&str> = Vec::new();
    let mut rest = raw;

    loop {
        match state {
            ScanState::Answer => match rest.find(markers.open) {
                Some(at) => {
                    answer.push_str(&rest[..at]);
                    rest = &rest[at + markers.open.len()..];
                    state = ScanState::Reasoning;
                }
                None => {
                    answer.push_str(rest);
                    break;
                }
            },
            ScanState::Reasoning => match rest.find(markers.close) {
                Some(at) => {
                    blocks.push(&rest[..at]);
                    rest = &rest[at + markers.close.len()..];
                    state = ScanState::Answer;
                }
                None => {
                    tracing::debug!("Reasoning block was never closed");
                    blocks.push(rest);
                    break;
                }
            },
        }
    }

    // a stray closing marker in answer text carries no content
    let answer = answer.replace(markers.close, "");

    let reasoning = blocks
        .iter()
        .map(|b| b.trim())
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    ScannedOutput {
        answer: answer.trim().to_string(),
        reasoning: (!reasoning.is_empty()).then_some(reasoning),
    }
}
