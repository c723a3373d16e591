//! Deterministic stand-ins for the neural model, used by unit tests.

use anyhow::Result;

use crate::embeddings::Encoder;

/// Topic axes for [`KeywordEncoder`]. A token counts toward an axis when it
/// starts with one of the axis stems.
const TOPICS: &[&[&str]] = &[
    // food
    &[
        "food", "recipe", "ingredient", "dinner", "lunch", "menu", "vegetarian", "flour",
        "sugar", "bake", "cook", "meal", "dish", "salad", "vegan", "mix",
    ],
    // travel
    &[
        "paris", "france", "capital", "city", "travel", "trip", "hotel", "beach", "tour",
    ],
    // forms / office software
    &["form", "pdf", "sign", "fill", "field", "acrobat", "export"],
];

/// Bag-of-topics encoder: one dimension per topic, value = matching tokens.
///
/// Text with no topical words maps to the zero vector, like an empty page.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordEncoder;

impl Encoder for KeywordEncoder {
    fn dimension(&self) -> usize {
        TOPICS.len()
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }
}

fn keyword_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; TOPICS.len()];
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let token = token.to_lowercase();
        for (axis, stems) in TOPICS.iter().enumerate() {
            if stems.iter().any(|stem| token.starts_with(stem)) {
                vector[axis] += 1.0;
            }
        }
    }
    vector
}

/// Encoder whose inference always fails, for degradation paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingEncoder;

impl Encoder for FailingEncoder {
    fn dimension(&self) -> usize {
        TOPICS.len()
    }

    fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        anyhow::bail!("inference unavailable")
    }
}

/// Encoder that fails on any batch containing `poison`, and otherwise
/// behaves like [`KeywordEncoder`].
#[derive(Debug, Clone, Copy)]
pub struct PoisonEncoder {
    pub poison: &'static str,
}

impl Encoder for PoisonEncoder {
    fn dimension(&self) -> usize {
        TOPICS.len()
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.contains(self.poison)) {
            anyhow::bail!("cannot encode text");
        }
        KeywordEncoder.embed_batch(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_vector_counts_topics() {
        let v = keyword_vector("Ingredients: flour, sugar. Instructions: mix and bake.");
        assert_eq!(v, vec![5.0, 0.0, 0.0]);

        let v = keyword_vector("Paris is the capital of France.");
        assert_eq!(v, vec![0.0, 3.0, 0.0]);
    }

    #[test]
    fn test_keyword_vector_no_topics_is_zero() {
        assert_eq!(keyword_vector("the quick brown fox"), vec![0.0; 3]);
        assert_eq!(keyword_vector(""), vec![0.0; 3]);
    }
}
