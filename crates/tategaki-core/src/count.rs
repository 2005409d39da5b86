//! Character counting
//!
//! Display counts are derived from the plain-text projection of a content
//! tree: markup stripped, ruby readings excluded, only visible text
//! counted. Pure functions of tree state; nothing here mutates.

use tracing::warn;

use crate::richtext::Fragment;

/// Count the visible characters of a tree
pub fn count_chars(fragment: &Fragment) -> usize {
    fragment.plain_text().chars().count()
}

/// Count the visible characters of stored markup
///
/// Unparseable markup counts as zero rather than failing; counts are
/// display hints, not data.
pub fn count_markup(markup: &str) -> usize {
    match Fragment::from_markup(markup) {
        Ok(fragment) => count_chars(&fragment),
        Err(error) => {
            warn!(%error, "uncountable markup");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ruby_reading_excluded() {
        // Base "感" with reading "かん" counts as 1, not 3
        assert_eq!(
            count_markup("<p><ruby><rb>感</rb><rt>かん</rt></ruby></p>"),
            1
        );
    }

    #[test]
    fn test_markup_stripped() {
        assert_eq!(
            count_markup("<p>第<span class=\"tcy\">12</span>話<span class=\"emph\">だ</span></p>"),
            5
        );
    }

    #[test]
    fn test_stable_under_format_round_trip() {
        let markup = "<p>雨<ruby><rb>傘</rb><rt>かさ</rt></ruby></p><p><span class=\"tcy\">45</span>本</p>";
        let fragment = Fragment::from_markup(markup).unwrap();
        let count = count_chars(&fragment);
        let reparsed = Fragment::from_markup(&fragment.to_markup()).unwrap();
        assert_eq!(count_chars(&reparsed), count);
        assert_eq!(count, 5);
    }

    #[test]
    fn test_counting_does_not_mutate() {
        let fragment = Fragment::from_markup("<p>不変</p>").unwrap();
        let before = fragment.clone();
        count_chars(&fragment);
        assert_eq!(fragment, before);
    }

    #[test]
    fn test_unparseable_markup_counts_zero() {
        assert_eq!(count_markup("<p>壊れた"), 0);
    }

    #[test]
    fn test_empty_paragraph_counts_zero() {
        assert_eq!(count_markup("<p></p>"), 0);
    }
}
