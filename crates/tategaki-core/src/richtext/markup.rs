//! Canonical markup for the rich-text tree
//!
//! The stored form of a chapter body is a small HTML subset:
//!
//! - `<p>…</p>` paragraphs (loose `div`/`h1`–`h3` are accepted as blocks)
//! - `<ruby><rb>base</rb><rt>reading</rt></ruby>` ruby annotations
//! - `<span class="tcy">…</span>` combined-horizontal runs
//! - `<span class="emph">…</span>` / `<span class="emph sesame">…</span>`
//!   emphasis runs
//!
//! Unknown tags are dropped and their text content kept inline; bare text
//! outside any block is wrapped into a paragraph, the same funneling the
//! editing surface applies to stray content.

use thiserror::Error;

use super::{Block, EmphasisStyle, Fragment, Inline};

/// Errors produced while parsing stored markup
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// A `<` was never closed by `>`
    #[error("unterminated tag at byte {0}")]
    UnterminatedTag(usize),
    /// A closing tag appeared with no matching open element
    #[error("unexpected closing tag </{0}>")]
    UnexpectedClose(String),
    /// An element was never closed
    #[error("missing closing tag for <{0}>")]
    MissingClose(String),
}

/// Parse stored markup into a tree
pub fn parse(input: &str) -> Result<Fragment, ParseError> {
    Parser { input, pos: 0 }.parse_document()
}

/// Serialize a tree to its canonical stored form
pub fn serialize(fragment: &Fragment) -> String {
    let mut out = String::new();
    for block in &fragment.blocks {
        let Block::Paragraph(children) = block;
        out.push_str("<p>");
        for child in children {
            write_inline(&mut out, child);
        }
        out.push_str("</p>");
    }
    out
}

fn write_inline(out: &mut String, node: &Inline) {
    match node {
        Inline::Text(text) => out.push_str(&escape_text(text)),
        Inline::Ruby { base, reading } => {
            out.push_str("<ruby><rb>");
            out.push_str(&escape_text(base));
            out.push_str("</rb><rt>");
            out.push_str(&escape_text(reading));
            out.push_str("</rt></ruby>");
        }
        Inline::Tcy(children) => {
            out.push_str("<span class=\"tcy\">");
            for child in children {
                write_inline(out, child);
            }
            out.push_str("</span>");
        }
        Inline::Emphasis { style, children } => {
            out.push_str(match style {
                EmphasisStyle::Dot => "<span class=\"emph\">",
                EmphasisStyle::Sesame => "<span class=\"emph sesame\">",
            });
            for child in children {
                write_inline(out, child);
            }
            out.push_str("</span>");
        }
    }
}

/// Escape text content for embedding in markup
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let entity_end = rest
            .char_indices()
            .take(8)
            .find(|(_, c)| *c == ';')
            .map(|(i, _)| i);
        let replaced = entity_end.and_then(|end| {
            let name = &rest[1..end];
            let ch = match name {
                "amp" => '&',
                "lt" => '<',
                "gt" => '>',
                "quot" => '"',
                "apos" | "#39" => '\'',
                "nbsp" => '\u{a0}',
                _ => return None,
            };
            Some((ch, end + 1))
        });
        match replaced {
            Some((ch, skip)) => {
                out.push(ch);
                rest = &rest[skip..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_block_tag(name: &str) -> bool {
    matches!(name, "p" | "div" | "h1" | "h2" | "h3")
}

fn is_void_tag(name: &str) -> bool {
    matches!(name, "br" | "hr" | "img" | "input" | "meta" | "wbr")
}

struct Tag {
    name: String,
    class: Option<String>,
    closing: bool,
    self_closing: bool,
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn parse_document(&mut self) -> Result<Fragment, ParseError> {
        let mut blocks = Vec::new();
        let mut pending: Vec<Inline> = Vec::new();
        while self.pos < self.input.len() {
            if self.rest().starts_with('<') {
                let save = self.pos;
                let tag = self.read_tag()?;
                if tag.closing {
                    return Err(ParseError::UnexpectedClose(tag.name));
                }
                if is_block_tag(&tag.name) && !tag.self_closing {
                    flush_pending(&mut pending, &mut blocks);
                    let children = self.parse_inlines(&tag.name)?;
                    blocks.push(Block::Paragraph(children));
                } else {
                    self.pos = save;
                    pending.extend(self.parse_inline_item()?);
                }
            } else {
                let text = self.read_text();
                if !text.is_empty() {
                    pending.push(Inline::Text(text));
                }
            }
        }
        flush_pending(&mut pending, &mut blocks);
        Ok(Fragment { blocks })
    }

    /// Parse inline content up to (and consuming) `</closing>`
    fn parse_inlines(&mut self, closing: &str) -> Result<Vec<Inline>, ParseError> {
        let mut out = Vec::new();
        loop {
            if self.pos >= self.input.len() {
                return Err(ParseError::MissingClose(closing.to_string()));
            }
            if self.rest().starts_with("</") {
                let tag = self.read_tag()?;
                if tag.name == closing {
                    return Ok(out);
                }
                return Err(ParseError::UnexpectedClose(tag.name));
            }
            out.extend(self.parse_inline_item()?);
        }
    }

    /// Parse one text run or element; unknown elements dissolve into their
    /// inline content
    fn parse_inline_item(&mut self) -> Result<Vec<Inline>, ParseError> {
        if !self.rest().starts_with('<') {
            let text = self.read_text();
            return Ok(if text.is_empty() {
                Vec::new()
            } else {
                vec![Inline::Text(text)]
            });
        }
        let tag = self.read_tag()?;
        if tag.closing {
            return Err(ParseError::UnexpectedClose(tag.name));
        }
        if tag.self_closing || is_void_tag(&tag.name) {
            return Ok(Vec::new());
        }
        match tag.name.as_str() {
            "ruby" => Ok(vec![self.parse_ruby()?]),
            "span" => {
                let children = self.parse_inlines("span")?;
                let class = tag.class.unwrap_or_default();
                let classes: Vec<&str> = class.split_whitespace().collect();
                if classes.contains(&"tcy") {
                    Ok(vec![Inline::Tcy(children)])
                } else if classes.contains(&"emph") {
                    let style = if classes.contains(&"sesame") {
                        EmphasisStyle::Sesame
                    } else {
                        EmphasisStyle::Dot
                    };
                    Ok(vec![Inline::Emphasis { style, children }])
                } else {
                    Ok(children)
                }
            }
            other => self.parse_inlines(other),
        }
    }

    /// Parse the interior of a `<ruby>` element (opening tag consumed)
    fn parse_ruby(&mut self) -> Result<Inline, ParseError> {
        let mut base = String::new();
        let mut reading = String::new();
        loop {
            if self.pos >= self.input.len() {
                return Err(ParseError::MissingClose("ruby".to_string()));
            }
            if self.rest().starts_with("</") {
                let tag = self.read_tag()?;
                if tag.name == "ruby" {
                    break;
                }
                return Err(ParseError::UnexpectedClose(tag.name));
            }
            if self.rest().starts_with('<') {
                let tag = self.read_tag()?;
                if tag.self_closing || is_void_tag(&tag.name) {
                    continue;
                }
                match tag.name.as_str() {
                    "rb" => base.push_str(&self.read_text_until_close("rb")?),
                    "rt" => reading.push_str(&self.read_text_until_close("rt")?),
                    // Parenthesis fallback for renderers without ruby support
                    "rp" => {
                        self.read_text_until_close("rp")?;
                    }
                    other => {
                        let inner = self.parse_inlines(other)?;
                        for node in inner {
                            base.push_str(&node.plain_text());
                        }
                    }
                }
            } else {
                // Loose text inside <ruby> is base text
                base.push_str(&self.read_text());
            }
        }
        Ok(Inline::Ruby { base, reading })
    }

    /// Read text content until `</name>` and consume the closing tag
    fn read_text_until_close(&mut self, name: &str) -> Result<String, ParseError> {
        let needle = format!("</{}", name);
        match self.rest().find(&needle) {
            Some(idx) => {
                let text = unescape_text(&self.rest()[..idx]);
                self.pos += idx;
                self.read_tag()?;
                Ok(text)
            }
            None => Err(ParseError::MissingClose(name.to_string())),
        }
    }

    /// Read raw text up to the next tag, unescaping entities
    fn read_text(&mut self) -> String {
        let end = self.rest().find('<').unwrap_or(self.rest().len());
        let text = unescape_text(&self.rest()[..end]);
        self.pos += end;
        text
    }

    fn read_tag(&mut self) -> Result<Tag, ParseError> {
        let start = self.pos;
        self.pos += 1; // consume '<'
        let closing = self.rest().starts_with('/');
        if closing {
            self.pos += 1;
        }
        let name_len = self
            .rest()
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(self.rest().len());
        let name = self.rest()[..name_len].to_ascii_lowercase();
        self.pos += name_len;

        let mut class = None;
        let mut self_closing = false;
        loop {
            let rest = self.rest();
            let mut chars = rest.char_indices();
            match chars.next() {
                None => return Err(ParseError::UnterminatedTag(start)),
                Some((_, '>')) => {
                    self.pos += 1;
                    break;
                }
                Some((_, '/')) => {
                    self.pos += 1;
                    if self.rest().starts_with('>') {
                        self.pos += 1;
                        self_closing = true;
                        break;
                    }
                }
                Some((_, c)) if c.is_whitespace() => {
                    self.pos += c.len_utf8();
                }
                _ => {
                    let (attr_name, value) = self.read_attr(start)?;
                    if attr_name == "class" {
                        class = value;
                    }
                }
            }
        }
        Ok(Tag {
            name,
            class,
            closing,
            self_closing,
        })
    }

    fn read_attr(&mut self, tag_start: usize) -> Result<(String, Option<String>), ParseError> {
        let name_len = self
            .rest()
            .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
            .ok_or(ParseError::UnterminatedTag(tag_start))?;
        let name = self.rest()[..name_len].to_ascii_lowercase();
        self.pos += name_len;
        self.skip_whitespace();
        if !self.rest().starts_with('=') {
            return Ok((name, None));
        }
        self.pos += 1;
        self.skip_whitespace();
        let rest = self.rest();
        let value = if let Some(quote) = rest.chars().next().filter(|&c| c == '"' || c == '\'') {
            let body = &rest[1..];
            let end = body
                .find(quote)
                .ok_or(ParseError::UnterminatedTag(tag_start))?;
            self.pos += 1 + end + 1;
            body[..end].to_string()
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
                .ok_or(ParseError::UnterminatedTag(tag_start))?;
            self.pos += end;
            rest[..end].to_string()
        };
        Ok((name, Some(value)))
    }

    fn skip_whitespace(&mut self) {
        let skipped = self
            .rest()
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(self.rest().len());
        self.pos += skipped;
    }
}

fn flush_pending(pending: &mut Vec<Inline>, blocks: &mut Vec<Block>) {
    if pending.is_empty() {
        return;
    }
    let only_whitespace = pending
        .iter()
        .all(|node| matches!(node, Inline::Text(text) if text.trim().is_empty()));
    if only_whitespace {
        pending.clear();
        return;
    }
    blocks.push(Block::Paragraph(std::mem::take(pending)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(fragment: &Fragment, index: usize) -> &Vec<Inline> {
        let Block::Paragraph(children) = &fragment.blocks[index];
        children
    }

    #[test]
    fn test_parse_plain_paragraphs() {
        let fragment = parse("<p>春が来た。</p><p>雪が解けた。</p>").unwrap();
        assert_eq!(fragment.blocks.len(), 2);
        assert_eq!(
            paragraph(&fragment, 0),
            &vec![Inline::text("春が来た。")]
        );
    }

    #[test]
    fn test_parse_ruby() {
        let fragment = parse("<p>と<ruby><rb>蜻蛉</rb><rt>とんぼ</rt></ruby>が</p>").unwrap();
        assert_eq!(
            paragraph(&fragment, 0)[1],
            Inline::Ruby {
                base: "蜻蛉".to_string(),
                reading: "とんぼ".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_ruby_loose_base() {
        // <ruby>漢<rt>かん</rt></ruby> is valid: bare text is the base
        let fragment = parse("<p><ruby>漢<rt>かん</rt></ruby></p>").unwrap();
        assert_eq!(
            paragraph(&fragment, 0)[0],
            Inline::Ruby {
                base: "漢".to_string(),
                reading: "かん".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_tcy_and_emphasis() {
        let fragment = parse(
            "<p><span class=\"tcy\">12</span><span class=\"emph sesame\">ここ</span></p>",
        )
        .unwrap();
        assert_eq!(
            paragraph(&fragment, 0),
            &vec![
                Inline::Tcy(vec![Inline::text("12")]),
                Inline::Emphasis {
                    style: EmphasisStyle::Sesame,
                    children: vec![Inline::text("ここ")],
                },
            ]
        );
    }

    #[test]
    fn test_parse_wraps_bare_text_in_paragraph() {
        let fragment = parse("裸のテキスト").unwrap();
        assert_eq!(fragment.blocks.len(), 1);
        assert_eq!(fragment.plain_text(), "裸のテキスト");
    }

    #[test]
    fn test_parse_skips_interblock_whitespace() {
        let fragment = parse("<p>一</p>\n  <p>二</p>").unwrap();
        assert_eq!(fragment.blocks.len(), 2);
    }

    #[test]
    fn test_unknown_tags_dissolve() {
        let fragment = parse("<p>前<b>太字</b>後<br></p>").unwrap();
        assert_eq!(fragment.plain_text(), "前太字後");
    }

    #[test]
    fn test_entities_round_trip() {
        let original = Fragment {
            blocks: vec![Block::Paragraph(vec![Inline::text("A & B < C")])],
        };
        let markup = serialize(&original);
        assert_eq!(markup, "<p>A &amp; B &lt; C</p>");
        assert_eq!(parse(&markup).unwrap(), original);
    }

    #[test]
    fn test_quotes_escape_and_round_trip() {
        let original = Fragment {
            blocks: vec![Block::Paragraph(vec![Inline::text("「彼は \"yes\" と'言った'」")])],
        };
        let markup = serialize(&original);
        assert_eq!(markup, "<p>「彼は &quot;yes&quot; と&#39;言った&#39;」</p>");
        assert_eq!(parse(&markup).unwrap(), original);
    }

    #[test]
    fn test_nbsp_entity() {
        let fragment = parse("<p>a&nbsp;b</p>").unwrap();
        assert_eq!(fragment.plain_text(), "a\u{a0}b");
    }

    #[test]
    fn test_serialize_round_trip() {
        let markup = "<p>昔々、<ruby><rb>竜</rb><rt>りゅう</rt></ruby>が<span class=\"tcy\">100</span>年<span class=\"emph\">眠った</span>。</p>";
        let fragment = parse(markup).unwrap();
        assert_eq!(serialize(&fragment), markup);
    }

    #[test]
    fn test_missing_close_is_error() {
        assert_eq!(
            parse("<p>開いたまま"),
            Err(ParseError::MissingClose("p".to_string()))
        );
    }

    #[test]
    fn test_unexpected_close_is_error() {
        assert!(matches!(
            parse("</p>"),
            Err(ParseError::UnexpectedClose(_))
        ));
    }

    #[test]
    fn test_unterminated_tag_is_error() {
        assert!(matches!(
            parse("<p class=\"x"),
            Err(ParseError::UnterminatedTag(_))
        ));
    }

    #[test]
    fn test_empty_input_is_empty_fragment() {
        assert_eq!(parse("").unwrap(), Fragment::default());
    }
}
