//! Subsection refinement: a short title and a readable paragraph per section.
//!
//! Classification runs once per section and produces a [`TextKind`];
//! rendering dispatches on that tag. Recipe detection is a plain keyword
//! heuristic and will also fire on prose that happens to say
//! "ingredients". Every path falls back to paragraph cleaning, so
//! refinement cannot fail.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::selection::SelectedSection;

/// Longest title, in words
const MAX_TITLE_WORDS: usize = 15;

/// Longest title, in characters
const MAX_TITLE_CHARS: usize = 120;

/// Longest refined paragraph, in words
const MAX_REFINED_WORDS: usize = 150;

/// Longest preamble still treated as a recipe name, in words
const MAX_RECIPE_NAME_WORDS: usize = 12;

/// Characters stripped from the ends of titles and segments
const SEPARATORS: &[char] = &[':', '-', '–', '—'];

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[•▪◦‣●∙·]").expect("valid regex"));

static O_BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*o[ \t]+").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static MISSING_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])\.([A-Z])").expect("valid regex"));

static INGREDIENTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bingredients\b").expect("valid regex"));

/// A run of step heading words ("Preparation method:") with its separator
static STEPS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:instructions|directions|steps|method|preparation)(?:\s+(?:instructions|directions|steps|method|preparation))*\b\s*[:\-–]?",
    )
    .expect("valid regex")
});

static STEP_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)\d{1,2}[.)]\s+").expect("valid regex"));

static LIST_DASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[-*][ \t]*").expect("valid regex"));

static SENTENCE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+(?:\s+|$)|\n+").expect("valid regex"));

static ITEM_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,;\n]").expect("valid regex"));

/// Shape of a section's text, decided once before rendering.
///
/// Spans are byte ranges into the section's raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextKind {
    Generic,
    RecipeLike {
        /// Text before the ingredients marker
        name_span: Range<usize>,
        /// Text after the ingredients marker, up to the steps marker
        ingredients_span: Range<usize>,
        /// Text after the steps marker, if there is one
        instructions_span: Option<Range<usize>>,
    },
}

/// A selected section with its derived title and paragraph
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedSection {
    pub section: SelectedSection,
    pub kind: TextKind,
    pub section_title: String,
    pub refined_text: String,
}

/// Decide whether text looks like a recipe
pub fn classify(text: &str) -> TextKind {
    let Some(marker) = INGREDIENTS_RE.find(text) else {
        return TextKind::Generic;
    };

    let steps = STEPS_RE.find_at(text, marker.end());
    let ingredients_end = steps.map(|m| m.start()).unwrap_or(text.len());

    TextKind::RecipeLike {
        name_span: 0..marker.start(),
        ingredients_span: marker.end()..ingredients_end,
        instructions_span: steps.map(|m| m.end()..text.len()),
    }
}

/// Refine every selected section, keeping rank order
pub fn refine_sections(sections: Vec<SelectedSection>) -> Vec<RefinedSection> {
    sections.into_iter().map(refine_section).collect()
}

/// Derive title and refined paragraph for one section
pub fn refine_section(section: SelectedSection) -> RefinedSection {
    let text = section.scored.unit.raw_text.as_str();
    let kind = classify(text);
    let section_title = section_title(text, section.scored.unit.page_number);
    let refined_text = refine_text(text, &kind);

    RefinedSection {
        section,
        kind,
        section_title,
        refined_text,
    }
}

/// Title from the first one or two non-empty lines.
///
/// A short first line (under three words) is joined with the next one.
/// Blank text is titled by its page number.
pub fn section_title(text: &str, page_number: u32) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let raw = match lines.as_slice() {
        [] => String::new(),
        [first, second, ..] if first.split_whitespace().count() < 3 => {
            format!("{} {}", first, second)
        }
        [first, ..] => first.to_string(),
    };

    let cleaned = collapse_whitespace(&BULLET_RE.replace_all(&raw, "-"));
    let trimmed = cleaned.trim_end_matches(|c: char| SEPARATORS.contains(&c) || c.is_whitespace());
    let title: String = first_words(trimmed, MAX_TITLE_WORDS)
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect();
    let title = title.trim();

    if title.is_empty() {
        format!("Page {}", page_number)
    } else {
        title.to_string()
    }
}

/// Render text according to its kind
pub fn refine_text(text: &str, kind: &TextKind) -> String {
    match kind {
        TextKind::Generic => clean_paragraph(text),
        TextKind::RecipeLike {
            name_span,
            ingredients_span,
            instructions_span,
        } => summarize_recipe(
            text,
            name_span.clone(),
            ingredients_span.clone(),
            instructions_span.clone(),
        )
        .unwrap_or_else(|| clean_paragraph(text)),
    }
}

/// Collapse text into one readable paragraph, capped in length
pub fn clean_paragraph(text: &str) -> String {
    let text = O_BULLET_RE.replace_all(text, "- ");
    let text = BULLET_RE.replace_all(&text, "-");
    let text = collapse_whitespace(&text);
    let text = MISSING_SPACE_RE.replace_all(&text, "$1. $2");
    cap_words(&text, MAX_REFINED_WORDS)
}

fn summarize_recipe(
    text: &str,
    name_span: Range<usize>,
    ingredients_span: Range<usize>,
    instructions_span: Option<Range<usize>>,
) -> Option<String> {
    let ingredients = split_items(&text[ingredients_span]);
    let steps = instructions_span
        .map(|span| split_steps(&text[span]))
        .unwrap_or_default();

    if ingredients.is_empty() && steps.is_empty() {
        return None;
    }

    let subject = recipe_name(&text[name_span]).unwrap_or_else(|| "This recipe".to_string());
    let mut summary = String::new();

    if !ingredients.is_empty() {
        summary.push_str(&format!(
            "{} includes {} {}: {}.",
            subject,
            ingredients.len(),
            plural(ingredients.len(), "ingredient"),
            ingredients.join(", ")
        ));
    }

    if !steps.is_empty() {
        let lead = if summary.is_empty() {
            format!("{} takes", subject)
        } else {
            summary.push(' ');
            "To prepare, follow".to_string()
        };
        summary.push_str(&format!(
            "{} {} {}: {}.",
            lead,
            steps.len(),
            plural(steps.len(), "step"),
            lowercase_first(&steps.join("; "))
        ));
    }

    Some(cap_words(&summary, MAX_REFINED_WORDS))
}

fn recipe_name(preamble: &str) -> Option<String> {
    let name = collapse_whitespace(&BULLET_RE.replace_all(preamble, " "));
    let name = name.trim_matches(|c: char| SEPARATORS.contains(&c) || c.is_whitespace());
    let words = name.split_whitespace().count();
    (1..=MAX_RECIPE_NAME_WORDS)
        .contains(&words)
        .then(|| name.to_string())
}

fn split_items(segment: &str) -> Vec<String> {
    let segment = BULLET_RE.replace_all(segment, "\n");
    let segment = LIST_DASH_RE.replace_all(&segment, "\n");
    ITEM_SPLIT_RE
        .split(&segment)
        .map(|item| trim_piece(item).trim_end_matches('.').trim().to_string())
        .filter(|item| item.chars().any(char::is_alphanumeric))
        .collect()
}

fn split_steps(segment: &str) -> Vec<String> {
    let segment = STEP_NUMBER_RE.replace_all(segment, "\n");
    let segment = BULLET_RE.replace_all(&segment, "\n");
    SENTENCE_END_RE
        .split(&segment)
        .map(trim_piece)
        .filter(|step| step.chars().any(char::is_alphabetic))
        .collect()
}

fn trim_piece(piece: &str) -> String {
    collapse_whitespace(piece.trim_matches(|c: char| SEPARATORS.contains(&c) || c.is_whitespace()))
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

fn first_words(text: &str, max: usize) -> String {
    text.split_whitespace()
        .take(max)
        .collect::<Vec<_>>()
        .join(" ")
}

fn cap_words(text: &str, max: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > max {
        format!("{}...", words[..max].join(" "))
    } else {
        words.join(" ")
    }
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{}s", noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::TextUnit;
    use crate::scoring::ScoredUnit;

    fn selected(text: &str) -> SelectedSection {
        SelectedSection {
            scored: ScoredUnit {
                unit: TextUnit {
                    document_id: "doc.pdf".into(),
                    page_number: 4,
                    raw_text: text.into(),
                },
                position: 0,
                embedding: None,
                similarity_score: Some(0.5),
            },
            rank: 1,
        }
    }

    #[test]
    fn test_classify_generic() {
        assert_eq!(classify("Paris is the capital of France."), TextKind::Generic);
        assert_eq!(classify(""), TextKind::Generic);
    }

    #[test]
    fn test_classify_recipe_spans() {
        let text = "Falafel\nIngredients: chickpeas, garlic\nInstructions: blend and fry.";
        let kind = classify(text);

        let TextKind::RecipeLike {
            name_span,
            ingredients_span,
            instructions_span,
        } = kind
        else {
            panic!("expected recipe");
        };
        assert_eq!(&text[name_span], "Falafel\n");
        assert_eq!(&text[ingredients_span], ": chickpeas, garlic\n");
        assert_eq!(&text[instructions_span.unwrap()], " blend and fry.");
    }

    #[test]
    fn test_classify_marker_is_case_insensitive() {
        assert!(matches!(
            classify("INGREDIENTS\n- rice"),
            TextKind::RecipeLike {
                instructions_span: None,
                ..
            }
        ));
    }

    #[test]
    fn test_recipe_summary_counts() {
        let text = "Ingredients: flour, sugar. Instructions: mix and bake.";
        let refined = refine_text(text, &classify(text));

        assert_eq!(
            refined,
            "This recipe includes 2 ingredients: flour, sugar. To prepare, follow 1 step: mix and bake."
        );
    }

    #[test]
    fn test_recipe_summary_named_with_numbered_steps() {
        let text = "Vegetable Lasagna\nIngredients\n• 9 noodles\n• 2 cups ricotta\n• 1 jar sauce\nDirections\n1. Boil the noodles.\n2. Layer everything.\n3. Bake for 45 minutes.";
        let refined = refine_text(text, &classify(text));

        assert!(refined.starts_with("Vegetable Lasagna includes 3 ingredients: 9 noodles, 2 cups ricotta, 1 jar sauce."));
        assert!(refined.contains("follow 3 steps: boil the noodles; Layer everything; Bake for 45 minutes."));
    }

    #[test]
    fn test_compound_step_heading_is_not_a_step() {
        let text = "Pasta\nIngredients: 200g pasta, salt, basil\nPreparation method: boil the pasta. Drain and serve.";
        let refined = refine_text(text, &classify(text));

        assert_eq!(
            refined,
            "Pasta includes 3 ingredients: 200g pasta, salt, basil. To prepare, follow 2 steps: boil the pasta; Drain and serve."
        );
    }

    #[test]
    fn test_recipe_without_steps_marker() {
        let text = "Ingredients: lentils, onion, cumin";
        let refined = refine_text(text, &classify(text));

        assert_eq!(refined, "This recipe includes 3 ingredients: lentils, onion, cumin.");
    }

    #[test]
    fn test_bare_marker_falls_back_to_paragraph() {
        let text = "Ingredients:";
        let refined = refine_text(text, &classify(text));

        assert_eq!(refined, "Ingredients:");
    }

    #[test]
    fn test_clean_paragraph_normalizes() {
        let text = "Day trips\n\n•  Nice   old town\no Monaco\nSee the harbour.Then eat.";
        let cleaned = clean_paragraph(text);

        assert_eq!(
            cleaned,
            "Day trips - Nice old town - Monaco See the harbour. Then eat."
        );
    }

    #[test]
    fn test_clean_paragraph_caps_length() {
        let text = "word ".repeat(400);
        let cleaned = clean_paragraph(&text);

        assert!(cleaned.ends_with("..."));
        assert_eq!(cleaned.split_whitespace().count(), MAX_REFINED_WORDS);
    }

    #[test]
    fn test_title_first_line() {
        let text = "Coastal Adventures in the South of France\nThe coast offers...";
        assert_eq!(
            section_title(text, 1),
            "Coastal Adventures in the South of France"
        );
    }

    #[test]
    fn test_title_joins_short_first_line() {
        let text = "\n  Chapter 3:\nCreating Fillable Forms\nBody text";
        assert_eq!(section_title(text, 1), "Chapter 3: Creating Fillable Forms");
    }

    #[test]
    fn test_title_strips_trailing_separators() {
        assert_eq!(section_title("Packing Tips and Tricks:\nbody", 1), "Packing Tips and Tricks");
    }

    #[test]
    fn test_title_without_line_breaks_uses_first_words() {
        let text = "one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen sixteen seventeen";
        let title = section_title(text, 1);

        assert_eq!(title.split_whitespace().count(), MAX_TITLE_WORDS);
        assert!(title.ends_with("fifteen"));
    }

    #[test]
    fn test_title_very_long_token() {
        let text = "x".repeat(10_000);
        assert_eq!(section_title(&text, 1).chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_title_blank_text_uses_page() {
        assert_eq!(section_title("", 7), "Page 7");
        assert_eq!(section_title("  \n\n ", 2), "Page 2");
    }

    #[test]
    fn test_refine_section_generic() {
        let refined = refine_section(selected("Paris is the capital of France."));

        assert_eq!(refined.kind, TextKind::Generic);
        assert_eq!(refined.refined_text, "Paris is the capital of France.");
        assert_eq!(refined.section_title, "Paris is the capital of France.");
        assert_eq!(refined.section.rank, 1);
    }

    #[test]
    fn test_refine_section_empty_text() {
        let refined = refine_section(selected(""));

        assert_eq!(refined.refined_text, "");
        assert_eq!(refined.section_title, "Page 4");
    }

    #[test]
    fn test_whitespace_only_text_counts_as_empty() {
        let refined = refine_section(selected(" \n\t "));

        assert_eq!(refined.kind, TextKind::Generic);
        assert_eq!(refined.refined_text, "");
        assert_eq!(refined.section_title, "Page 4");
    }

    #[test]
    fn test_refined_text_never_empty_for_content() {
        for text in ["o", "•", "-", "Ingredients", "1.", "Steps:"] {
            let refined = refine_text(text, &classify(text));
            assert!(!refined.is_empty(), "empty refinement for {:?}", text);
        }
    }

    #[test]
    fn test_multibyte_text_does_not_panic() {
        let text = "Crème brûlée — ingrédients\nIngredients: œufs, crème, sucre\nÉtapes: cuire";
        let refined = refine_section(selected(text));

        assert!(refined.refined_text.contains("œufs"));
    }
}
