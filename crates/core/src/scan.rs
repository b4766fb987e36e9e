//! Low-level body scanning shared by the live macro interpreter
//! ([crate::interp]) and the special-passage driver ([crate::special]).
//!
//! This is the "streaming state machine" the design notes call for: rather
//! than building a full AST of the macro body, everything here works
//! directly on string slices and byte offsets, splitting off one token at a
//! time.

/// A recognized non-text token in a passage body.
pub(crate) enum Special<'a> {
    /// Inside of a `<<...>>` macro tag, with the macro name already split
    /// from its argument text.
    Macro { name: &'a str, args: &'a str },
    /// `<<...` with no closing `>>` before end of input.
    UnterminatedMacro { tag_start: &'a str },
    /// Inside of an `[[...]]` link marker, not yet split into
    /// display/target/setters.
    Link { raw: &'a str },
    /// `[[...` with no closing `]]`.
    UnterminatedLink,
    /// The URL inside `[img[...]]`.
    Image { url: &'a str },
}

/// Find the next special token in `body`. Returns `(text_before, special,
/// rest)`, or `None` if there are no more special tokens (in which case the
/// whole of `body` is plain text).
pub(crate) fn next_special(body: &str) -> Option<(&str, Special<'_>, &str)> {
    let macro_pos = body.find("<<");
    let image_pos = body.find("[img[");
    let link_pos = body.find("[[");

    let pos = [macro_pos, image_pos, link_pos].into_iter().flatten().min()?;
    let before = &body[..pos];
    let tail = &body[pos..];

    if tail.starts_with("<<") {
        let after_open = &tail[2..];
        if let Some(end) = after_open.find(">>") {
            let tag = &after_open[..end];
            let rest = &after_open[end + 2..];
            let (name, args) = split_macro_name(tag);
            Some((before, Special::Macro { name, args }, rest))
        } else {
            Some((
                before,
                Special::UnterminatedMacro { tag_start: tail },
                "",
            ))
        }
    } else if tail.starts_with("[img[") {
        let after_open = &tail[5..];
        if let Some(end) = after_open.find("]]") {
            let url = &after_open[..end];
            let rest = &after_open[end + 2..];
            Some((before, Special::Image { url }, rest))
        } else {
            Some((before, Special::UnterminatedLink, ""))
        }
    } else {
        debug_assert!(tail.starts_with("[["));
        let after_open = &tail[2..];
        if let Some(end) = after_open.find("]]") {
            let raw = &after_open[..end];
            let rest = &after_open[end + 2..];
            Some((before, Special::Link { raw }, rest))
        } else {
            Some((before, Special::UnterminatedLink, ""))
        }
    }
}

/// Split `<<name args>>`'s inner text into the macro name and its (still raw)
/// argument text.
pub(crate) fn split_macro_name(tag: &str) -> (&str, &str) {
    let trimmed = tag.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim_start()),
        None => (trimmed, ""),
    }
}

/// Where a `scan_to_boundary` walk stopped.
pub(crate) enum Boundary<'a> {
    Elseif(&'a str),
    Else,
    Endif,
    /// End of input reached without finding a depth-0 boundary tag: an
    /// unterminated `<<if>>`.
    Eof,
}

/// Scan `body` for the next depth-0 `<<elseif>>`/`<<else>>`/`<<endif>>` tag,
/// treating any nested `<<if>>...<<endif>>` pair as opaque. Returns the text
/// before the boundary, the boundary itself, and the remaining text after it.
pub(crate) fn scan_to_boundary(body: &str) -> (&str, Boundary<'_>, &str) {
    let mut depth = 0usize;
    let mut offset = 0usize;

    loop {
        let remaining = &body[offset..];
        let Some(rel) = remaining.find("<<") else {
            return (body, Boundary::Eof, "");
        };
        let after_open = &remaining[rel + 2..];
        let Some(end_rel) = after_open.find(">>") else {
            return (body, Boundary::Eof, "");
        };
        let tag = &after_open[..end_rel];
        let (name, args) = split_macro_name(tag);
        let tag_start = offset + rel;
        let after_tag_offset = offset + rel + 2 + end_rel + 2;

        match name {
            "if" => {
                depth += 1;
                offset = after_tag_offset;
            }
            "endif" if depth > 0 => {
                depth -= 1;
                offset = after_tag_offset;
            }
            "endif" => {
                return (&body[..tag_start], Boundary::Endif, &body[after_tag_offset..]);
            }
            "elseif" if depth == 0 => {
                return (
                    &body[..tag_start],
                    Boundary::Elseif(args),
                    &body[after_tag_offset..],
                );
            }
            "else" if depth == 0 => {
                return (&body[..tag_start], Boundary::Else, &body[after_tag_offset..]);
            }
            _ => {
                offset = after_tag_offset;
            }
        }
    }
}

/// Skip an entire `<<if>>...<<endif>>` block, including all of its
/// `<<elseif>>`/`<<else>>` branches, returning the text after the matching
/// `<<endif>>`. Used when the whole construct is suppressed (outer context
/// not emitting) and no branch needs to be selected.
pub(crate) fn skip_whole_if(body: &str) -> &str {
    let mut rest = body;
    loop {
        let (_seg, boundary, after) = scan_to_boundary(rest);
        match boundary {
            Boundary::Elseif(_) | Boundary::Else => rest = after,
            Boundary::Endif | Boundary::Eof => return after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_whole_if_nested() {
        let body = "A<<if $x>>B<<if $y>>C<<endif>>D<<else>>E<<endif>>REST";
        // body here starts *inside* an outer if's branch text; skip_whole_if
        // expects to be called on the text right after the outer `<<if>>`.
        let after_outer_if = "B<<if $y>>C<<endif>>D<<else>>E<<endif>>REST";
        assert_eq!(skip_whole_if(after_outer_if), "REST");
    }

    #[test]
    fn test_scan_to_boundary_finds_endif() {
        let (seg, boundary, rest) = scan_to_boundary("hello<<endif>>world");
        assert_eq!(seg, "hello");
        assert!(matches!(boundary, Boundary::Endif));
        assert_eq!(rest, "world");
    }

    #[test]
    fn test_scan_to_boundary_skips_nested_if() {
        let (seg, boundary, rest) =
            scan_to_boundary("A<<if $x>>B<<endif>>C<<elseif $y>>D<<endif>>E");
        assert_eq!(seg, "A<<if $x>>B<<endif>>C");
        assert!(matches!(boundary, Boundary::Elseif("$y")));
        assert_eq!(rest, "D<<endif>>E");
    }

    #[test]
    fn test_next_special_link() {
        let (before, special, rest) =
            next_special("hi [[North|N]] there").unwrap();
        assert_eq!(before, "hi ");
        assert!(matches!(special, Special::Link { raw: "North|N" }));
        assert_eq!(rest, " there");
    }

    #[test]
    fn test_next_special_image_before_link() {
        let (before, special, rest) = next_special("[img[pic.png]]x").unwrap();
        assert_eq!(before, "");
        assert!(matches!(special, Special::Image { url: "pic.png" }));
        assert_eq!(rest, "x");
    }

    #[test]
    fn test_next_special_macro() {
        let (before, special, rest) =
            next_special("go <<print $x>>now").unwrap();
        assert_eq!(before, "go ");
        assert!(matches!(
            special,
            Special::Macro {
                name: "print",
                args: "$x"
            }
        ));
        assert_eq!(rest, "now");
    }
}
