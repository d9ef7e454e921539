use crate::engines::generation::chromosome::Chromosome;
use crate::engines::metrics::AdvisorStats;
use crate::engines::suggestion::client::SuggestionClient;
use crate::engines::suggestion::prompt::crossover_prompt;
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Asks the language model where to cut two parents for crossover.
/// A single submission, no retry; any doubt falls back to a random cut.
pub struct CrossoverAdvisor {
    client: Arc<dyn SuggestionClient>,
    usage_probability: f64,
    model: String,
}

impl CrossoverAdvisor {
    pub fn new(client: Arc<dyn SuggestionClient>, usage_probability: f64, model: impl Into<String>) -> Self {
        Self {
            client,
            usage_probability,
            model: model.into(),
        }
    }

    /// Cut positions for `first` and `second`, or `None` when the advisor is
    /// not consulted or its answer is unusable.
    pub fn suggest(
        &self,
        first: &Chromosome,
        second: &Chromosome,
        rng: &mut dyn RngCore,
        stats: &mut AdvisorStats,
    ) -> Option<(usize, usize)> {
        if rng.gen::<f64>() >= self.usage_probability {
            return None;
        }
        stats.attempts += 1;

        let reply = self.client.submit(&crossover_prompt(first, second), &self.model);
        let positions = reply
            .text()
            .and_then(|text| parse_positions(&text))
            .filter(|&(p1, p2)| valid_cut(p1, first.size()) && valid_cut(p2, second.size()));

        match positions {
            Some(p) => {
                stats.successes += 1;
                Some(p)
            }
            None => {
                log::debug!("Unusable crossover advice, using a random split");
                stats.fallbacks += 1;
                None
            }
        }
    }
}

/// A cut must leave at least one action on both sides
fn valid_cut(position: usize, len: usize) -> bool {
    position >= 1 && position < len
}

/// Parse the first `[x1, x2]` array in `text`
pub fn parse_positions(text: &str) -> Option<(usize, usize)> {
    let text = text.replace("\\n", "").replace('\\', "");
    let start = text.find('[')?;
    let end = start + text[start..].find(']')?;
    let values: Vec<i64> = serde_json::from_str(&text[start..=end]).ok()?;
    match values.as_slice() {
        &[a, b] if a >= 0 && b >= 0 => Some((a as usize, b as usize)),
        _ => None,
    }
}
