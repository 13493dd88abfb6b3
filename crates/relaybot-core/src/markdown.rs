//! CommonMark → Telegram MarkdownV2 normalization.
//!
//! Model output is ordinary markdown (`**bold**`, `# Heading`, fenced code).
//! Telegram's MarkdownV2 dialect uses different markers and rejects any
//! reserved character that is not escaped, so every reply is re-rendered
//! through `pulldown-cmark` before it is sent.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Prefix for level-1 headings.
pub const HEADING_SYMBOL: &str = "📌";
/// Prefix for links and images.
pub const LINK_SYMBOL: &str = "🔗";

/// Escape special characters for Telegram MarkdownV2 body text.
///
/// MarkdownV2 requires escaping: `_ * [ ] ( ) ~ ` > # + - = | { } . ! \`
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '='
            | '|' | '{' | '}' | '.' | '!' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Inside `pre` and `code` entities only `` ` `` and `\` are escaped.
fn escape_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '`' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Inside the `(...)` part of an inline link only `)` and `\` are escaped.
fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for ch in url.chars() {
        if ch == ')' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Render `source` markdown as Telegram MarkdownV2.
pub fn to_markdown_v2(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut r = Renderer::default();
    for event in Parser::new_ext(source, options) {
        r.event(event);
    }
    r.out.trim_end().to_string()
}

#[derive(Default)]
struct Renderer {
    out: String,
    /// One entry per open list: `Some(next_number)` for ordered lists.
    lists: Vec<Option<u64>>,
    /// Destinations of currently open links/images.
    links: Vec<String>,
    quote_depth: usize,
    /// A quoted block just ended; the next quoted line needs a bare `>` before it.
    quote_gap: bool,
    in_heading: bool,
    in_code_block: bool,
}

impl Renderer {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.write(&escape_code(&text));
                } else {
                    self.write(&escape_markdown_v2(&text));
                }
            }
            Event::Code(code) => {
                self.write("`");
                self.write(&escape_code(&code));
                self.write("`");
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                self.write(&escape_markdown_v2(&html));
            }
            Event::SoftBreak | Event::HardBreak => self.write("\n"),
            Event::Rule => {
                self.ensure_newline();
                self.write("————————");
                self.ensure_blank_line();
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.ensure_newline();
                if level == HeadingLevel::H1 {
                    self.write(HEADING_SYMBOL);
                    self.write(" ");
                }
                self.write("*");
                self.in_heading = true;
            }
            Tag::Emphasis => {
                // `__` is read as underline; `\r` is ignored by Telegram and splits it.
                if self.out.ends_with('_') {
                    self.write("\r");
                }
                self.write("_");
            }
            Tag::Strong => {
                if !self.in_heading {
                    self.write("*");
                }
            }
            Tag::Strikethrough => self.write("~"),
            Tag::CodeBlock(kind) => {
                self.ensure_newline();
                self.write("```");
                if let CodeBlockKind::Fenced(lang) = kind {
                    self.write(&escape_code(lang.trim()));
                }
                self.write("\n");
                self.in_code_block = true;
            }
            Tag::List(first) => {
                self.ensure_newline();
                self.lists.push(first);
            }
            Tag::Item => {
                self.ensure_newline();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                self.write(&indent);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let m = format!("{n}\\. ");
                        *n += 1;
                        m
                    }
                    _ => "• ".to_string(),
                };
                self.write(&marker);
            }
            Tag::BlockQuote(_) => {
                self.ensure_newline();
                self.quote_depth += 1;
            }
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.write(LINK_SYMBOL);
                self.write(" [");
                self.links.push(dest_url.to_string());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.write("*");
                self.in_heading = false;
                self.end_block();
            }
            TagEnd::Paragraph => self.end_block(),
            TagEnd::Emphasis => self.write("_"),
            TagEnd::Strong => {
                if !self.in_heading {
                    self.write("*");
                }
            }
            TagEnd::Strikethrough => self.write("~"),
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.ensure_newline();
                self.write("```");
                self.end_block();
            }
            TagEnd::Item => self.ensure_newline(),
            TagEnd::List(_) => {
                self.lists.pop();
                self.end_block();
            }
            TagEnd::BlockQuote(_) => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.quote_gap = false;
                self.end_block();
            }
            TagEnd::Link | TagEnd::Image => {
                let dest = self.links.pop().unwrap_or_default();
                self.write("](");
                self.write(&escape_url(&dest));
                self.write(")");
            }
            _ => {}
        }
    }

    /// Blank line between top-level blocks, a single newline inside lists.
    /// Inside a quote the separator is a bare `>` line, written lazily so
    /// the quote does not end with one (an empty line would end the quote).
    fn end_block(&mut self) {
        if self.quote_depth > 0 {
            self.ensure_newline();
            if self.lists.is_empty() {
                self.quote_gap = true;
            }
        } else if self.lists.is_empty() {
            self.ensure_blank_line();
        } else {
            self.ensure_newline();
        }
    }

    fn write(&mut self, s: &str) {
        for ch in s.chars() {
            if self.quote_depth > 0 && ch != '\n' && self.at_line_start() {
                if self.quote_gap {
                    self.out.push_str(">\n");
                    self.quote_gap = false;
                }
                self.out.push('>');
            }
            self.out.push(ch);
        }
    }

    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn ensure_newline(&mut self) {
        if !self.at_line_start() {
            self.out.push('\n');
        }
    }

    fn ensure_blank_line(&mut self) {
        if self.out.is_empty() || self.out.ends_with("\n\n") {
            return;
        }
        self.ensure_newline();
        self.out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_markdown_v2_escapes_specials() {
        let escaped = escape_markdown_v2("Hello. World! (test) [link] ~strike~ a>b");
        for needle in ["\\.", "\\!", "\\(", "\\)", "\\[", "\\]", "\\~", "\\>"] {
            assert!(escaped.contains(needle), "missing {needle} in {escaped}");
        }
    }

    #[test]
    fn escape_markdown_v2_leaves_normal_chars() {
        let input = "Hello world 123 abc";
        assert_eq!(escape_markdown_v2(input), input);
    }

    #[test]
    fn plain_text_is_escaped() {
        assert_eq!(to_markdown_v2("Hello. World!"), "Hello\\. World\\!");
    }

    #[test]
    fn strong_and_emphasis_use_telegram_markers() {
        assert_eq!(to_markdown_v2("**bold** and *it*"), "*bold* and _it_");
    }

    #[test]
    fn strikethrough_is_rendered() {
        assert_eq!(to_markdown_v2("~~gone~~"), "~gone~");
    }

    #[test]
    fn h1_gets_symbol_and_bold() {
        assert_eq!(to_markdown_v2("# Title"), "📌 *Title*");
    }

    #[test]
    fn lower_headings_are_bold_only() {
        assert_eq!(to_markdown_v2("## **Sub**"), "*Sub*");
    }

    #[test]
    fn inline_code_keeps_reserved_chars() {
        assert_eq!(to_markdown_v2("run `a.b()`"), "run `a.b()`");
    }

    #[test]
    fn fenced_code_block_preserved() {
        let out = to_markdown_v2("```rust\nlet x = a.b();\n```");
        assert_eq!(out, "```rust\nlet x = a.b();\n```");
    }

    #[test]
    fn link_gets_symbol() {
        assert_eq!(
            to_markdown_v2("[docs](https://example.com)"),
            "🔗 [docs](https://example.com)"
        );
    }

    #[test]
    fn bullet_list() {
        assert_eq!(to_markdown_v2("- a\n- b"), "• a\n• b");
    }

    #[test]
    fn ordered_list_escapes_dot() {
        assert_eq!(to_markdown_v2("1. a\n2. b"), "1\\. a\n2\\. b");
    }

    #[test]
    fn block_quote_prefixes_lines() {
        assert_eq!(to_markdown_v2("> hi"), ">hi");
    }

    #[test]
    fn quoted_paragraphs_keep_separator_line() {
        assert_eq!(to_markdown_v2("> q\n>\n> r"), ">q\n>\n>r");
        assert_eq!(to_markdown_v2("> q\n\nafter"), ">q\n\nafter");
    }

    #[test]
    fn adjacent_emphasis_is_not_read_as_underline() {
        assert_eq!(to_markdown_v2("*a*_b_"), "_a_\r_b_");
    }

    #[test]
    fn paragraphs_separated_by_blank_line() {
        assert_eq!(to_markdown_v2("# T\n\npara"), "📌 *T*\n\npara");
    }

    #[test]
    fn empty_input_renders_empty() {
        assert_eq!(to_markdown_v2(""), "");
    }
}
