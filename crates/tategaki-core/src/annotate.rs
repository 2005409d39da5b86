//! In-place text annotation and search/replace
//!
//! Commands mutate a live content tree over a caller-supplied selection
//! range. Invalid input (collapsed or unresolvable range, empty ruby
//! reading, empty query) is a silent no-op: the editing surface can always
//! retry, so nothing here is an error surface.
//!
//! Search queries are always literal text; every regex metacharacter is
//! escaped before compilation. Matching is leaf-local: a match spanning two
//! text leaves (for example across a run boundary left behind by an earlier
//! annotation) is not found. See `replace_all` for the consequence.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::models::Settings;
use crate::richtext::range::Position;
use crate::richtext::{walk, EmphasisStyle, Fragment, Inline, Range};

/// Runs of 2-6 ASCII digits, delimited by ASCII word boundaries.
///
/// The boundaries must be ASCII: a Unicode `\b` treats kana and kanji as
/// word characters, so `は1234個` would never match inside Japanese prose.
const DIGIT_RUN_PATTERN: &str = r"(?-u:\b)[0-9]{2,6}(?-u:\b)";

fn digit_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DIGIT_RUN_PATTERN).expect("hard-coded pattern"))
}

fn literal_regex(query: &str, case_sensitive: bool) -> Option<Regex> {
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(!case_sensitive)
        .build()
        .ok()
}

/// Replace the selection with a ruby annotation
///
/// The base text is the selection's plain-text projection; the original
/// node(s) in the range are destroyed. A ruby without a reading is
/// meaningless, so an empty reading aborts without mutating.
pub fn insert_ruby(fragment: &mut Fragment, range: &Range, reading: &str) -> bool {
    if range.is_collapsed() || reading.is_empty() {
        return false;
    }
    let Some(base) = range.text(fragment) else {
        return false;
    };
    range.splice(fragment, |_| {
        vec![Inline::Ruby {
            base,
            reading: reading.to_string(),
        }]
    })
}

/// Wrap the selection in a combined-horizontal run
///
/// No nesting detection: applying this to an already-wrapped selection
/// nests wrappers, and avoiding that is the caller's concern.
pub fn insert_tcy(fragment: &mut Fragment, range: &Range) -> bool {
    if range.is_collapsed() {
        return false;
    }
    range.surround_contents(fragment, Inline::Tcy)
}

/// Wrap the selection in an emphasis run with the given mark style
pub fn insert_emphasis(fragment: &mut Fragment, range: &Range, style: EmphasisStyle) -> bool {
    if range.is_collapsed() {
        return false;
    }
    range.surround_contents(fragment, |children| Inline::Emphasis { style, children })
}

/// Restyle existing emphasis runs to the given mark style
///
/// Applied when the project-wide emphasis setting changes. Only emphasis
/// runs are touched; ruby and combined runs are never retroactively
/// restyled. Returns the number of runs that changed.
pub fn retag_emphasis(fragment: &mut Fragment, style: EmphasisStyle) -> usize {
    let mut changed = 0;
    for block in &mut fragment.blocks {
        retag_children(block.children_mut(), style, &mut changed);
    }
    changed
}

fn retag_children(children: &mut [Inline], style: EmphasisStyle, changed: &mut usize) {
    for child in children {
        match child {
            Inline::Emphasis {
                style: current,
                children: inner,
            } => {
                if *current != style {
                    *current = style;
                    *changed += 1;
                }
                retag_children(inner, style, changed);
            }
            Inline::Tcy(inner) => retag_children(inner, style, changed),
            _ => {}
        }
    }
}

/// Apply digit-run wrapping when the project setting enables it
///
/// This is the entry point for the blur and page-leave triggers: the
/// `autoTCY` setting gates the pass, and a disabled setting leaves the
/// tree untouched and reports zero.
pub fn apply_auto_tcy(fragment: &mut Fragment, settings: &Settings) -> usize {
    if !settings.auto_tcy {
        return 0;
    }
    auto_wrap_digit_runs(fragment)
}

/// Wrap word-bounded runs of 2-6 digits in combined-horizontal runs
///
/// Scans every plain text leaf and splices the surrounding text back in as
/// siblings. Text already inside a combined run is left alone so repeated
/// passes (this runs on blur and page-leave) do not nest wrappers. Returns
/// the number of runs wrapped. Ungated; callers honoring the project
/// setting go through [`apply_auto_tcy`].
pub fn auto_wrap_digit_runs(fragment: &mut Fragment) -> usize {
    let regex = digit_run_regex();
    let mut wrapped = 0;
    for block in &mut fragment.blocks {
        wrap_digits_in(block.children_mut(), regex, &mut wrapped);
    }
    wrapped
}

fn wrap_digits_in(children: &mut Vec<Inline>, regex: &Regex, wrapped: &mut usize) {
    let mut out = Vec::with_capacity(children.len());
    for child in children.drain(..) {
        match child {
            Inline::Text(text) => {
                let mut last = 0;
                for found in regex.find_iter(&text) {
                    if found.start() > last {
                        out.push(Inline::Text(text[last..found.start()].to_string()));
                    }
                    out.push(Inline::Tcy(vec![Inline::Text(found.as_str().to_string())]));
                    *wrapped += 1;
                    last = found.end();
                }
                if last == 0 {
                    out.push(Inline::Text(text));
                } else if last < text.len() {
                    out.push(Inline::Text(text[last..].to_string()));
                }
            }
            Inline::Emphasis {
                style,
                mut children,
            } => {
                wrap_digits_in(&mut children, regex, wrapped);
                out.push(Inline::Emphasis { style, children });
            }
            other => out.push(other),
        }
    }
    *children = out;
}

/// Find the first occurrence of `query` over text leaves in document order
///
/// The query is literal text. Returns a range within the matching leaf, or
/// `None` when no leaf contains the full query.
pub fn find_next(fragment: &Fragment, query: &str, case_sensitive: bool) -> Option<Range> {
    if query.is_empty() {
        return None;
    }
    let regex = literal_regex(query, case_sensitive)?;
    for (path, text) in walk::text_leaves(fragment) {
        if let Some(found) = regex.find(text) {
            let start = text[..found.start()].chars().count();
            let length = found.as_str().chars().count();
            return Some(Range::new(
                Position::new(path.clone(), start),
                Position::new(path, start + length),
            ));
        }
    }
    None
}

/// Replace the range's content with a single plain text run
///
/// Returns whether a replacement occurred; collapsed or unresolvable
/// ranges leave the tree untouched.
pub fn replace_one(fragment: &mut Fragment, range: &Range, replacement: &str) -> bool {
    if range.is_collapsed() {
        return false;
    }
    range.splice(fragment, |_| {
        if replacement.is_empty() {
            Vec::new()
        } else {
            vec![Inline::Text(replacement.to_string())]
        }
    })
}

/// Replace every leaf-local occurrence of `query` with `replacement`
///
/// The replace is applied independently per text leaf: a match spanning a
/// boundary between two leaves is not found. Returns the number of
/// occurrences replaced.
pub fn replace_all(
    fragment: &mut Fragment,
    query: &str,
    replacement: &str,
    case_sensitive: bool,
) -> usize {
    if query.is_empty() {
        return 0;
    }
    let Some(regex) = literal_regex(query, case_sensitive) else {
        return 0;
    };
    let mut replaced = 0;
    walk::for_each_text_mut(fragment, &mut |text| {
        let count = regex.find_iter(text).count();
        if count > 0 {
            *text = regex
                .replace_all(text, regex::NoExpand(replacement))
                .into_owned();
            replaced += count;
        }
    });
    replaced
}
