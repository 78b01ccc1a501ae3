//! Structural document heuristics.
//!
//! The engine does not understand document semantics, but it can cheaply
//! check that a generated translation kept the source's structural skeleton
//! (fenced code blocks, links, headings) and measure raw similarity between
//! two texts. Structure checks gate generated content before it is written;
//! similarity feeds reason strings when no ledger record exists.

use std::fmt;

use similar::TextDiff;

/// Minimum generated/source length ratio before a translation is considered
/// truncated.
const MIN_LENGTH_RATIO: f64 = 0.3;

/// Line-level similarity of two texts in `[0, 1]`; `1.0` means identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    f64::from(TextDiff::from_lines(a, b).ratio())
}

/// A structural defect in a candidate translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureIssue {
    Empty,
    Truncated { source_len: usize, candidate_len: usize },
    CodeFenceMismatch { source: usize, candidate: usize },
    LinkMismatch { source: usize, candidate: usize },
    HeadingMismatch { source: usize, candidate: usize },
}

impl fmt::Display for StructureIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureIssue::Empty => write!(f, "generated content is empty"),
            StructureIssue::Truncated {
                source_len,
                candidate_len,
            } => write!(
                f,
                "generated content looks truncated ({candidate_len} bytes vs {source_len} source bytes)"
            ),
            StructureIssue::CodeFenceMismatch { source, candidate } => write!(
                f,
                "code fence count changed ({source} in source, {candidate} generated)"
            ),
            StructureIssue::LinkMismatch { source, candidate } => write!(
                f,
                "link count changed ({source} in source, {candidate} generated)"
            ),
            StructureIssue::HeadingMismatch { source, candidate } => write!(
                f,
                "heading count changed ({source} in source, {candidate} generated)"
            ),
        }
    }
}

/// Verify that `candidate` preserves the structural skeleton of `source`.
///
/// A translation is free to change every word, but it must keep the same
/// number of fenced code blocks, markdown links, and headings, and must not
/// be empty or drastically shorter than the source.
pub fn structure_preserved(source: &str, candidate: &str) -> Result<(), StructureIssue> {
    if candidate.trim().is_empty() {
        return Err(StructureIssue::Empty);
    }

    let source_len = source.len();
    let candidate_len = candidate.len();
    if source_len > 0 && (candidate_len as f64) < (source_len as f64) * MIN_LENGTH_RATIO {
        return Err(StructureIssue::Truncated {
            source_len,
            candidate_len,
        });
    }

    let source_fences = count_code_fences(source);
    let candidate_fences = count_code_fences(candidate);
    if source_fences != candidate_fences {
        return Err(StructureIssue::CodeFenceMismatch {
            source: source_fences,
            candidate: candidate_fences,
        });
    }

    let source_links = count_links(source);
    let candidate_links = count_links(candidate);
    if source_links != candidate_links {
        return Err(StructureIssue::LinkMismatch {
            source: source_links,
            candidate: candidate_links,
        });
    }

    let source_headings = count_headings(source);
    let candidate_headings = count_headings(candidate);
    if source_headings != candidate_headings {
        return Err(StructureIssue::HeadingMismatch {
            source: source_headings,
            candidate: candidate_headings,
        });
    }

    Ok(())
}

/// Remove `<think>…</think>` blocks some models emit ahead of the actual
/// content, along with the blank lines that follow them.
pub fn strip_reasoning_tags(content: &str) -> String {
    const OPEN: &str = "<think>";
    const CLOSE: &str = "</think>";

    let mut out = content.to_string();
    while let Some(start) = out.find(OPEN) {
        let Some(close) = out[start..].find(CLOSE) else {
            break;
        };
        let mut end = start + close + CLOSE.len();
        while out[end..].starts_with('\n') || out[end..].starts_with("\r\n") {
            end += if out[end..].starts_with("\r\n") { 2 } else { 1 };
        }
        out.replace_range(start..end, "");
    }
    out
}

/// Number of complete fenced code blocks (pairs of ``` lines).
fn count_code_fences(text: &str) -> usize {
    text.lines()
        .filter(|l| l.trim_start().starts_with("```"))
        .count()
        / 2
}

/// Number of inline markdown links (`[text](target)` occurrences).
fn count_links(text: &str) -> usize {
    text.matches("](").count()
}

/// Number of ATX heading lines (`#` through `######` followed by a space).
fn count_headings(text: &str) -> usize {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim_start_matches('#');
            let hashes = line.len() - trimmed.len();
            (1..=6).contains(&hashes) && trimmed.starts_with(' ')
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "# Title\n\nIntro with a [link](https://example.com).\n\n```rust\nfn main() {}\n```\n\n## Section\n\nMore text.\n";

    #[test]
    fn identical_text_has_full_similarity() {
        assert_eq!(similarity(SOURCE, SOURCE), 1.0);
    }

    #[test]
    fn disjoint_text_has_low_similarity() {
        assert!(similarity("alpha\nbeta\n", "gamma\ndelta\n") < 0.5);
    }

    #[test]
    fn faithful_translation_passes() {
        let translated = "# Titre\n\nIntroduction avec un [lien](https://example.com).\n\n```rust\nfn main() {}\n```\n\n## Partie\n\nPlus de texte.\n";
        structure_preserved(SOURCE, translated).expect("structure kept");
    }

    #[test]
    fn dropped_code_fence_fails() {
        let broken = "# Titre\n\nIntro avec un [lien](https://example.com).\n\n## Partie\n\nfn main() {} sans bloc, plus de texte pour garder la longueur au dessus du seuil minimal.\n";
        assert!(matches!(
            structure_preserved(SOURCE, broken),
            Err(StructureIssue::CodeFenceMismatch { .. })
        ));
    }

    #[test]
    fn empty_candidate_fails() {
        assert_eq!(
            structure_preserved(SOURCE, "  \n"),
            Err(StructureIssue::Empty)
        );
    }

    #[test]
    fn truncated_candidate_fails() {
        assert!(matches!(
            structure_preserved(SOURCE, "# T\n"),
            Err(StructureIssue::Truncated { .. })
        ));
    }

    #[test]
    fn heading_count_change_fails() {
        let flattened = "Titre sans dièse\n\nIntro avec un [lien](https://example.com) et du texte.\n\n```rust\nfn main() {}\n```\n\nPartie sans titre non plus, avec assez de contenu.\n";
        assert!(matches!(
            structure_preserved(SOURCE, flattened),
            Err(StructureIssue::HeadingMismatch { .. })
        ));
    }

    #[test]
    fn reasoning_tags_are_stripped() {
        let raw = "<think>let me reason about this</think>\n\n# Actual content\n";
        assert_eq!(strip_reasoning_tags(raw), "# Actual content\n");
    }

    #[test]
    fn unterminated_tag_left_alone() {
        let raw = "<think>never closed\n# body\n";
        assert_eq!(strip_reasoning_tags(raw), raw);
    }

    #[test]
    fn heading_requires_space_after_hashes() {
        assert_eq!(count_headings("#no space\n# yes\n####### seven\n"), 1);
    }
}
