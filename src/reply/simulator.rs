//! Canned assistant replies.

use rand::Rng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;

/// A known prompt and its scripted answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Suggestion {
    /// Prompt text, matched case-insensitively.
    pub question: &'static str,
    /// Reply returned on a match.
    pub answer: &'static str,
}

/// Prompts with scripted answers, also offered to users as quick picks.
pub const SUGGESTIONS: &[Suggestion] = &[
    Suggestion {
        question: "What is the weather like today?",
        answer: "The weather today is sunny with a high of 25°C and a low of 15°C.",
    },
    Suggestion {
        question: "Tell me a fun fact about space.",
        answer: "Did you know? A day on Venus is longer than a year on Venus!",
    },
    Suggestion {
        question: "How do I improve my productivity?",
        answer: "Try breaking tasks into smaller steps and using the Pomodoro technique.",
    },
    Suggestion {
        question: "What's a healthy breakfast idea?",
        answer: "A healthy breakfast could be oatmeal with fruits and nuts, or Greek yogurt with berries.",
    },
    Suggestion {
        question: "Explain quantum computing in simple terms.",
        answer: "Quantum computing uses quantum bits that can be both 0 and 1 at the same time, allowing for powerful computations.",
    },
];

/// Fallback replies for anything without a scripted answer.
pub const GENERIC_REPLIES: &[&str] = &[
    "That's an interesting question! Let me think about that for a moment.",
    "I understand what you're asking. Here's my perspective on that topic.",
    "Great point! I'd be happy to help you explore this further.",
    "Based on what you've shared, I think there are several ways to approach this.",
    "That's a complex topic with many facets. Let me break it down for you.",
    "I appreciate you sharing that with me. Here's what I think about it.",
    "Excellent question! This reminds me of some related concepts.",
    "I see where you're coming from. Let me offer some insights on this.",
];

/// Scripted answer for `message`, if one exists.
#[must_use]
pub fn scripted_answer(message: &str) -> Option<&'static str> {
    let needle = message.trim().to_lowercase();
    SUGGESTIONS
        .iter()
        .find(|s| s.question.to_lowercase() == needle)
        .map(|s| s.answer)
}

/// Reply to `message`: the scripted answer, or a generic one drawn from `rng`.
#[must_use]
pub fn generate_reply<R: Rng + ?Sized>(message: &str, rng: &mut R) -> String {
    if let Some(answer) = scripted_answer(message) {
        return answer.to_string();
    }
    let idx = rng.gen_range(0..GENERIC_REPLIES.len());
    GENERIC_REPLIES[idx].to_string()
}

/// Reply generator owning its random source.
pub struct ReplySimulator {
    rng: Mutex<StdRng>,
}

impl ReplySimulator {
    /// Create a simulator drawing from `rng`.
    #[must_use]
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Reply to the latest user message.
    pub async fn reply_to(&self, message: &str) -> String {
        let mut rng = self.rng.lock().await;
        generate_reply(message, &mut *rng)
    }
}
