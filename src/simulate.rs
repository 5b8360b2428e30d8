//! Locally synthesized replies for offline use
//!
//! When simulated mode is on, failed dispatches are answered from a small set
//! of templates instead of an error message. Replies go through the same
//! segmentation as real ones and arrive after an artificial delay so the
//! front-end's busy handling can be exercised without a backend.

use crate::response::{ActionGroup, CanonicalResponse, CtaItem, Usage, VideoLink};
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Number of reply templates available
pub const TEMPLATE_COUNT: usize = 2;

const DEFAULT_LATENCY_MS: RangeInclusive<u64> = 500..=1500;

/// Produces simulated replies with configurable latency
#[derive(Debug, Clone)]
pub struct Simulator {
    latency_ms: RangeInclusive<u64>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY_MS)
    }
}

impl Simulator {
    pub fn new(latency_ms: RangeInclusive<u64>) -> Self {
        Self { latency_ms }
    }

    /// Simulator that replies without delay
    pub fn instant() -> Self {
        Self::new(0..=0)
    }

    /// Pick a template at random and resolve it after the configured latency.
    pub async fn reply(&self, message: &str) -> CanonicalResponse {
        let (template, delay_ms) = {
            let mut rng = rand::thread_rng();
            let delay_ms = if self.latency_ms.is_empty() {
                *self.latency_ms.start()
            } else {
                rng.gen_range(self.latency_ms.clone())
            };
            (rng.gen_range(0..TEMPLATE_COUNT), delay_ms)
        };

        tracing::debug!(template, delay_ms, "Generating simulated reply");
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        simulated_reply(message, template)
    }
}

/// Build the simulated reply for `message` from the given template.
///
/// Template indices wrap around [`TEMPLATE_COUNT`].
pub fn simulated_reply(message: &str, template: usize) -> CanonicalResponse {
    let input_tokens = message.chars().count() as u64;

    match template % TEMPLATE_COUNT {
        0 => CanonicalResponse::new(
            format!(
                "I understand you said: \"{message}\". \
                 This is a simulated reply for development purposes.\
                 |1. This is a simulated reply for part 2 purposes.\
                 |2. This is a simulated reply for part 3 purposes."
            ),
            vec![ActionGroup::buttons(vec![
                CtaItem::new("Tell me more", "more_info"),
                CtaItem::new("Ask another question", "new_question"),
            ])],
            Usage {
                input_tokens,
                output_tokens: 50,
                cost: 0.001,
                duration_ms: 500,
                is_estimated: true,
            },
        ),
        _ => CanonicalResponse::new(
            format!(
                "That's an interesting question about \"{message}\". Here's what I think...\
                 |Additional details about your question with more information.\
                 |Final thoughts and recommendations for your consideration.\
                 |Here's a bonus tip that might help you further."
            ),
            vec![ActionGroup::buttons(vec![
                CtaItem::new("Learn more", "learn_more"),
                CtaItem::new("See examples", "examples"),
            ])
            .with_videos(vec![
                VideoLink::new(
                    "Tutorial Video",
                    "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                ),
                VideoLink::new("Demo Video", "https://www.youtube.com/watch?v=oHg5SJYRHA0"),
            ])],
            Usage {
                input_tokens,
                output_tokens: 75,
                cost: 0.0015,
                duration_ms: 750,
                is_estimated: true,
            },
        ),
    }
}
