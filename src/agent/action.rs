// ABOUTME: AiAction - the closed set of editing actions a run can perform.
// ABOUTME: Each action carries a default task instruction for the prompt.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownAction;

/// What the caller wants done to the current content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiAction {
    Continue,
    Rewrite,
    Expand,
    Shorten,
    Summarize,
    Outline,
    Proofread,
}

impl AiAction {
    pub const ALL: [AiAction; 7] = [
        AiAction::Continue,
        AiAction::Rewrite,
        AiAction::Expand,
        AiAction::Shorten,
        AiAction::Summarize,
        AiAction::Outline,
        AiAction::Proofread,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AiAction::Continue => "continue",
            AiAction::Rewrite => "rewrite",
            AiAction::Expand => "expand",
            AiAction::Shorten => "shorten",
            AiAction::Summarize => "summarize",
            AiAction::Outline => "outline",
            AiAction::Proofread => "proofread",
        }
    }

    /// Built-in task instruction, used unless settings override it.
    pub fn default_instruction(&self) -> &'static str {
        match self {
            AiAction::Continue => {
                "Continue the current content. Match its voice, tense and point of view, \
                 and return only the new text."
            }
            AiAction::Rewrite => {
                "Rewrite the current content to improve clarity and flow while keeping \
                 its meaning. Return only the rewritten text."
            }
            AiAction::Expand => {
                "Expand the current content with more detail, description and depth. \
                 Return only the expanded text."
            }
            AiAction::Shorten => {
                "Condense the current content, keeping every essential point. \
                 Return only the shortened text."
            }
            AiAction::Summarize => "Summarize the current content concisely.",
            AiAction::Outline => {
                "Produce a structured outline of the current content as a list of \
                 sections and key points."
            }
            AiAction::Proofread => {
                "Correct spelling, grammar and punctuation in the current content without \
                 changing its style. Return only the corrected text."
            }
        }
    }
}

impl fmt::Display for AiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        AiAction::ALL
            .into_iter()
            .find(|action| action.as_str() == name)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        for action in AiAction::ALL {
            assert_eq!(action.as_str().parse::<AiAction>().unwrap(), action);
        }
        assert_eq!(" Continue ".parse::<AiAction>().unwrap(), AiAction::Continue);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "translate".parse::<AiAction>().unwrap_err();
        assert_eq!(err, UnknownAction("translate".to_string()));
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&AiAction::Summarize).unwrap(),
            "\"summarize\""
        );
    }
}
