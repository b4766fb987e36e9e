//! The passage parser (§4.1): splits the raw DSL source into [Passage]s.
//! Purely syntactic — link and macro syntax inside a body is left
//! untouched; the macro interpreter resolves it at render time.

use indexmap::IndexMap;
use itertools::Itertools;

use crate::error::{Diagnostic, DiagnosticKind, InterpError};
use crate::model::Passage;
use crate::scan::{self, Special};

/// Split `source` into passages at `:: ` header lines. Last declaration
/// with a given name wins, per §3's documented name-uniqueness behavior —
/// `IndexMap::insert` already does this, just reordering the key to the
/// position of its *first* occurrence, so callers additionally get a stable
/// iteration order keyed by first-seen position rather than last.
pub(crate) fn parse_passages(source: &str) -> (IndexMap<String, Passage>, Vec<Diagnostic>) {
    let mut passages = IndexMap::new();
    let mut errors = Vec::new();

    let mut header_starts: Vec<usize> = Vec::new();
    if source.starts_with("::") {
        header_starts.push(0);
    }
    for (i, _) in source.match_indices('\n') {
        let next = i + 1;
        if source[next..].starts_with("::") {
            header_starts.push(next);
        }
    }

    for (idx, &start) in header_starts.iter().enumerate() {
        let end = header_starts.get(idx + 1).copied().unwrap_or(source.len());
        let section = &source[start..end];
        if let Some(passage) = parse_header_section(section, start, &mut errors) {
            passages.insert(passage.name.clone(), passage);
        }
    }

    (passages, errors)
}

/// Parse one `:: NAME [TAGS]\n...body...` section. `offset` is the byte
/// position of the section's leading `::`, used for diagnostic context.
/// Returns `None` if the header is malformed beyond recovery (§4.1's
/// failure modes: "a header without a name is skipped with a recorded
/// error").
fn parse_header_section(
    section: &str,
    offset: usize,
    errors: &mut Vec<Diagnostic>,
) -> Option<Passage> {
    debug_assert!(section.starts_with("::"));
    let after_colons = &section[2..];
    let header_line_end = after_colons.find('\n').unwrap_or(after_colons.len());
    let header_line = &after_colons[..header_line_end];
    let body = after_colons[header_line_end..]
        .strip_prefix('\n')
        .unwrap_or(&after_colons[header_line_end..]);

    let Some(rest) = header_line.strip_prefix(' ') else {
        errors.push(Diagnostic::from(InterpError::HeaderMissingName).at(offset));
        return None;
    };
    let rest = rest.trim_end_matches('\r');

    let name_end = rest
        .find(|c: char| c.is_whitespace() || c == '[')
        .unwrap_or(rest.len());
    let name = &rest[..name_end];
    if name.is_empty() {
        errors.push(Diagnostic::from(InterpError::HeaderMissingName).at(offset));
        return None;
    }

    let tags = parse_tags(rest[name_end..].trim_start(), name, offset, errors);
    let image_url = extract_image_url(body);

    Some(Passage {
        name: name.to_owned(),
        tags,
        raw_body: body.to_owned(),
        image_url,
    })
}

/// Parse the optional `[TAG1 TAG2 ...]` suffix of a header line. Absence of
/// brackets, or empty brackets, both yield an empty tag list. An
/// unterminated bracket is reported but the partial tag list inside it is
/// kept (§4.1: "the partial tag list is kept").
fn parse_tags(
    tag_part: &str,
    passage_name: &str,
    offset: usize,
    errors: &mut Vec<Diagnostic>,
) -> Vec<String> {
    let Some(inner) = tag_part.strip_prefix('[') else {
        return Vec::new();
    };
    match inner.find(']') {
        Some(close) => inner[..close]
            .split_whitespace()
            .map(str::to_owned)
            .unique()
            .collect(),
        None => {
            errors.push(
                Diagnostic::from(InterpError::UnterminatedTagBracket {
                    name: passage_name.to_owned(),
                })
                .at(offset),
            );
            inner.split_whitespace().map(str::to_owned).unique().collect()
        }
    }
}

/// Find the first `[img[URL]]` marker anywhere in `body`, skipping over any
/// macros or links that appear before it. The marker is left in place in
/// `raw_body`; the macro interpreter strips it at render time (§4.1).
fn extract_image_url(body: &str) -> Option<String> {
    let mut rest = body;
    loop {
        match scan::next_special(rest)? {
            (_, Special::Image { url }, _) => return Some(url.to_owned()),
            (_, _, after) => rest = after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_passage_no_tags() {
        let (passages, errors) = parse_passages(":: Start\nhello");
        assert!(errors.is_empty());
        let passage = &passages["Start"];
        assert_eq!(passage.name, "Start");
        assert!(passage.tags.is_empty());
        assert_eq!(passage.raw_body, "hello");
    }

    #[test]
    fn test_tags_are_parsed_in_order() {
        let (passages, _) = parse_passages(":: Start [intro hub]\nbody");
        assert_eq!(passages["Start"].tags, vec!["intro", "hub"]);
    }

    #[test]
    fn test_duplicate_tags_are_deduplicated_preserving_order() {
        let (passages, _) = parse_passages(":: Start [intro hub intro]\nbody");
        assert_eq!(passages["Start"].tags, vec!["intro", "hub"]);
    }

    #[test]
    fn test_empty_brackets_yield_empty_tags() {
        let (passages, _) = parse_passages(":: Start []\nbody");
        assert!(passages["Start"].tags.is_empty());
    }

    #[test]
    fn test_multiple_passages_split_correctly() {
        let source = ":: A\nbody a\n:: B [t]\nbody b";
        let (passages, errors) = parse_passages(source);
        assert!(errors.is_empty());
        assert_eq!(passages.len(), 2);
        assert_eq!(passages["A"].raw_body, "body a\n");
        assert_eq!(passages["B"].raw_body, "body b");
        assert_eq!(passages["B"].tags, vec!["t"]);
    }

    #[test]
    fn test_last_declaration_with_duplicate_name_wins() {
        let source = ":: A\nfirst\n:: A\nsecond";
        let (passages, _) = parse_passages(source);
        assert_eq!(passages.len(), 1);
        assert_eq!(passages["A"].raw_body, "second");
    }

    #[test]
    fn test_header_missing_name_is_skipped_with_error() {
        let (passages, errors) = parse_passages(":: \nbody");
        assert!(passages.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, DiagnosticKind::StructuralError);
    }

    #[test]
    fn test_unterminated_tag_bracket_keeps_partial_tags() {
        let (passages, errors) = parse_passages(":: A [intro hub\nbody");
        assert_eq!(errors.len(), 1);
        assert_eq!(passages["A"].tags, vec!["intro", "hub"]);
    }

    #[test]
    fn test_image_url_is_captured_and_left_in_body() {
        let (passages, _) = parse_passages(":: A\nsee [img[pic.png]] here");
        let passage = &passages["A"];
        assert_eq!(passage.image_url.as_deref(), Some("pic.png"));
        assert!(passage.raw_body.contains("[img[pic.png]]"));
    }

    #[test]
    fn test_no_headers_yields_no_passages() {
        let (passages, errors) = parse_passages("just plain text, no headers");
        assert!(passages.is_empty());
        assert!(errors.is_empty());
    }
}
