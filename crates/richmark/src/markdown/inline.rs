//! Inline Markdown: a single left-to-right lexer plus a delimiter stack.
//!
//! Code spans are matched first and are opaque to everything else. Link and
//! image brackets are resolved as soon as their `](` destination is read;
//! emphasis is resolved last, inside each finished link and then over the
//! whole span. The lexer never backtracks.

use std::collections::HashMap;

use crate::url_policy::{is_safe_image_src, is_safe_link, MAX_URL_LEN};
use crate::utilities::{escape_html_attr, escape_html_text, starts_with_entity, unescape_markdown};

/// Render the inline content of one block to HTML
pub(crate) fn parse_inline(text: &str) -> String {
    let mut lexer = Lexer::new(text);
    lexer.run();
    lexer.finish()
}

enum Token {
    /// Finished HTML
    Html(String),
    Delim(Delim),
}

/// An emphasis delimiter run (`*`, `_` or `~~`)
struct Delim {
    ch: u8,
    /// Characters not yet used by a match
    count: usize,
    can_open: bool,
    can_close: bool,
    /// Tags emitted after the run, innermost last
    open_tags: String,
    /// Tags emitted before the run, innermost first
    close_tags: String,
}

struct Bracket {
    image: bool,
    /// Index of the `[` / `![` token
    token: usize,
    /// Byte offset of the bracketed text
    text_start: usize,
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    brackets: Vec<Bracket>,
    /// Link openers below this stack index are inactive (no links in links)
    inactive_below: usize,
    backticks: BacktickRuns,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            tokens: Vec::new(),
            brackets: Vec::new(),
            inactive_below: 0,
            backticks: BacktickRuns::new(src),
        }
    }

    fn run(&mut self) {
        let src = self.src;
        let bytes = src.as_bytes();

        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\\' => self.backslash(),
                b'`' => self.code_span(),
                b'<' => self.less_than(),
                b'>' => self.literal(1, "&gt;"),
                b'&' => self.ampersand(),
                b'!' if bytes.get(self.pos + 1) == Some(&b'[') => self.open_bracket(true),
                b'[' => self.open_bracket(false),
                b']' => self.close_bracket(),
                b'*' | b'_' | b'~' => self.delimiter_run(),
                b'\n' => self.line_break(),
                _ => self.text(),
            }
        }
    }

    fn finish(mut self) -> String {
        resolve_emphasis(&mut self.tokens);

        let mut out = String::with_capacity(self.src.len() + 16);
        for token in self.tokens {
            if let Token::Html(html) = token {
                out.push_str(&html);
            }
        }
        out
    }

    fn push(&mut self, html: impl Into<String>) {
        self.tokens.push(Token::Html(html.into()));
    }

    fn literal(&mut self, len: usize, html: &str) {
        self.push(html);
        self.pos += len;
    }

    /// Plain text up to the next special character
    fn text(&mut self) {
        let src = self.src;
        let rest = &src[self.pos..];
        // The first byte is consumed even when special (a lone `!`); special
        // characters are ASCII, so the end is always a char boundary.
        let len = rest
            .bytes()
            .skip(1)
            .position(is_special)
            .map_or(rest.len(), |offset| offset + 1);
        self.push(escape_html_text(&rest[..len]));
        self.pos += len;
    }

    fn backslash(&mut self) {
        match self.src.as_bytes().get(self.pos + 1) {
            Some(b'\n') => {
                self.push("<br>\n");
                self.pos += 2;
                self.skip_leading_spaces();
            }
            Some(&b) if b.is_ascii_punctuation() => {
                let escaped = escape_html_text(&(b as char).to_string());
                self.literal(2, &escaped);
            }
            _ => self.literal(1, "\\"),
        }
    }

    fn code_span(&mut self) {
        let start = self.pos;
        let len = run_length(self.src.as_bytes(), start, b'`');

        match self.backticks.next_after(len, start) {
            Some(close) => {
                let content = self.src[start + len..close].replace('\n', " ");
                let content = match content.strip_prefix(' ').and_then(|c| c.strip_suffix(' ')) {
                    Some(inner) if !content.bytes().all(|b| b == b' ') => inner,
                    _ => content.as_str(),
                };
                let html = format!("<code>{}</code>", escape_html_text(content));
                self.push(html);
                self.pos = close + len;
            }
            None => {
                let ticks = "`".repeat(len);
                self.literal(len, &ticks);
            }
        }
    }

    /// Raw inline tags pass through; the sanitizer decides what survives
    fn less_than(&mut self) {
        match raw_tag_len(&self.src[self.pos..]) {
            Some(len) => {
                let tag = self.src[self.pos..self.pos + len].to_string();
                self.literal(len, &tag);
            }
            None => self.literal(1, "&lt;"),
        }
    }

    fn ampersand(&mut self) {
        if starts_with_entity(&self.src[self.pos..]) {
            let len = self.src[self.pos..].find(';').map_or(1, |end| end + 1);
            let entity = self.src[self.pos..self.pos + len].to_string();
            self.literal(len, &entity);
        } else {
            self.literal(1, "&amp;");
        }
    }

    fn line_break(&mut self) {
        let mut hard = false;
        if let Some(Token::Html(last)) = self.tokens.last_mut() {
            let trimmed = last.trim_end_matches(' ').len();
            hard = last.len() - trimmed >= 2;
            last.truncate(trimmed);
        }
        self.literal(1, if hard { "<br>\n" } else { "\n" });
        self.skip_leading_spaces();
    }

    fn skip_leading_spaces(&mut self) {
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() && matches!(bytes[self.pos], b' ' | b'\t') {
            self.pos += 1;
        }
    }

    fn delimiter_run(&mut self) {
        let bytes = self.src.as_bytes();
        let start = self.pos;
        let ch = bytes[start];
        let count = run_length(bytes, start, ch);
        let end = start + count;

        // Only `~~` is a strikethrough delimiter
        if ch == b'~' && count != 2 {
            let tildes = "~".repeat(count);
            self.literal(count, &tildes);
            return;
        }

        let before = self.src[..start].chars().next_back();
        let after = self.src[end..].chars().next();
        let left = is_left_flanking(before, after);
        let right = is_left_flanking(after, before);

        let (can_open, can_close) = if ch == b'_' {
            (
                left && (!right || before.is_some_and(is_punctuation)),
                right && (!left || after.is_some_and(is_punctuation)),
            )
        } else {
            (left, right)
        };

        self.tokens.push(Token::Delim(Delim {
            ch,
            count,
            can_open,
            can_close,
            open_tags: String::new(),
            close_tags: String::new(),
        }));
        self.pos = end;
    }

    fn open_bracket(&mut self, image: bool) {
        let len = if image { 2 } else { 1 };
        self.brackets.push(Bracket {
            image,
            token: self.tokens.len(),
            text_start: self.pos + len,
        });
        self.literal(len, if image { "![" } else { "[" });
    }

    fn close_bracket(&mut self) {
        let close = self.pos;
        let Some(opener) = self.brackets.pop() else {
            self.literal(1, "]");
            return;
        };
        let index = self.brackets.len();
        let active = opener.image || index >= self.inactive_below;
        self.inactive_below = self.inactive_below.min(index);

        let destination = if active && self.src[close + 1..].starts_with('(') {
            scan_destination(self.src, close + 2)
        } else {
            None
        };

        let Some((url, end)) = destination else {
            self.literal(1, "]");
            return;
        };

        if opener.image {
            if !is_safe_image_src(&url) {
                self.literal(1, "]");
                return;
            }
            let alt = unescape_markdown(&self.src[opener.text_start..close]);
            self.tokens.truncate(opener.token);
            self.push(format!(
                "<img src=\"{}\" alt=\"{}\">",
                escape_html_attr(&url),
                escape_html_attr(alt.trim())
            ));
        } else {
            if !is_safe_link(&url) {
                self.literal(1, "]");
                return;
            }
            resolve_emphasis(&mut self.tokens[opener.token + 1..]);
            self.tokens[opener.token] =
                Token::Html(format!("<a href=\"{}\">", escape_html_attr(&url)));
            self.push("</a>");
            self.inactive_below = self.brackets.len();
        }
        self.pos = end;
    }
}

fn is_special(b: u8) -> bool {
    matches!(
        b,
        b'\\' | b'`' | b'<' | b'>' | b'&' | b'!' | b'[' | b']' | b'*' | b'_' | b'~' | b'\n'
    )
}

fn run_length(bytes: &[u8], start: usize, ch: u8) -> usize {
    bytes[start..].iter().take_while(|&&b| b == ch).count()
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_whitespace() && !c.is_control())
}

/// A run is left-flanking when it is not followed by whitespace, and when
/// followed by punctuation it is preceded by whitespace or punctuation.
/// Swapping the arguments gives the right-flanking test.
fn is_left_flanking(before: Option<char>, after: Option<char>) -> bool {
    let Some(after) = after.filter(|c| !c.is_whitespace()) else {
        return false;
    };
    !is_punctuation(after) || before.map_or(true, |c| c.is_whitespace() || is_punctuation(c))
}

/// Length of an inline tag (`<name ...>` or `</name>`) at the start of `s`.
/// The scan stops at the next `<` or line end so repeated attempts stay linear.
fn raw_tag_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let name_start = if bytes.get(1) == Some(&b'/') { 2 } else { 1 };
    if !bytes.get(name_start)?.is_ascii_alphabetic() {
        return None;
    }

    let mut i = name_start;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }
    match *bytes.get(i)? {
        b'>' => return Some(i + 1),
        b' ' | b'\t' | b'/' => {}
        _ => return None,
    }

    for (offset, &b) in bytes[i..].iter().enumerate() {
        match b {
            b'>' => return Some(i + offset + 1),
            b'<' | b'\n' => return None,
            _ => {}
        }
    }
    None
}

/// Read a link destination starting just after `](`.
///
/// Returns the unescaped URL and the byte offset after the closing `)`.
fn scan_destination(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let mut i = start;
    skip_spaces(bytes, &mut i);

    let mut url = String::new();
    if bytes.get(i) == Some(&b'<') {
        i += 1;
        let len = src[i..].find(|c| matches!(c, '>' | '<' | '\n'))?;
        if bytes.get(i + len) != Some(&b'>') || len > MAX_URL_LEN {
            return None;
        }
        url.push_str(&unescape_markdown(&src[i..i + len]));
        i += len + 1;
    } else {
        let url_start = i;
        let mut depth = 0usize;
        while i < bytes.len() {
            if i - url_start > MAX_URL_LEN {
                return None;
            }
            match bytes[i] {
                b'\\' if bytes.get(i + 1).is_some_and(u8::is_ascii_punctuation) => i += 2,
                b'(' => {
                    depth += 1;
                    i += 1;
                }
                b')' if depth == 0 => break,
                b')' => {
                    depth -= 1;
                    i += 1;
                }
                b if b.is_ascii_whitespace() || b.is_ascii_control() => break,
                _ => i += 1,
            }
        }
        if depth != 0 {
            return None;
        }
        url.push_str(&unescape_markdown(&src[url_start..i]));
    }

    skip_spaces(bytes, &mut i);

    // Optional title, accepted and discarded
    if let Some(&quote @ (b'"' | b'\'')) = bytes.get(i) {
        let len = src[i + 1..].find(quote as char)?;
        if len > MAX_URL_LEN {
            return None;
        }
        i += len + 2;
        skip_spaces(bytes, &mut i);
    }

    (bytes.get(i) == Some(&b')')).then_some((url, i + 1))
}

fn skip_spaces(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && matches!(bytes[*i], b' ' | b'\t') {
        *i += 1;
    }
}

/// Backtick runs of the whole input, indexed by length, so each code span
/// closer is found in amortized constant time.
struct BacktickRuns {
    starts: HashMap<usize, Vec<usize>>,
    cursors: HashMap<usize, usize>,
}

impl BacktickRuns {
    fn new(src: &str) -> Self {
        let bytes = src.as_bytes();
        let mut starts: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'`' {
                let len = run_length(bytes, i, b'`');
                starts.entry(len).or_default().push(i);
                i += len;
            } else {
                i += 1;
            }
        }
        Self {
            starts,
            cursors: HashMap::new(),
        }
    }

    /// First run of exactly `len` backticks starting after `pos`.
    /// Queries must come with non-decreasing `pos`.
    fn next_after(&mut self, len: usize, pos: usize) -> Option<usize> {
        let starts = self.starts.get(&len)?;
        let cursor = self.cursors.entry(len).or_insert(0);
        while *cursor < starts.len() && starts[*cursor] <= pos {
            *cursor += 1;
        }
        starts.get(*cursor).copied()
    }
}

/// Match emphasis delimiters in `tokens` and turn every run into HTML.
///
/// A closer takes the nearest opener of the same character; openers in
/// between are dropped from the stack and stay literal. Two characters are
/// used (strong) when both runs have at least two left, otherwise one (em).
fn resolve_emphasis(tokens: &mut [Token]) {
    let mut openers: Vec<usize> = Vec::new();
    let mut open_counts: HashMap<u8, usize> = HashMap::new();

    for i in 0..tokens.len() {
        let (ch, can_open, can_close) = match &tokens[i] {
            Token::Delim(delim) => (delim.ch, delim.can_open, delim.can_close),
            Token::Html(_) => continue,
        };

        if can_close {
            while delim_count(tokens, i) > 0 && open_counts.get(&ch).copied().unwrap_or(0) > 0 {
                // An opener with this character is on the stack; drop everything above it
                let mut found = None;
                while let Some(j) = openers.pop() {
                    let opener_ch = delim_ch(tokens, j);
                    if let Some(count) = open_counts.get_mut(&opener_ch) {
                        *count -= 1;
                    }
                    if opener_ch == ch {
                        found = Some(j);
                        break;
                    }
                }
                let Some(opener) = found else {
                    break;
                };

                let n = if ch == b'~' || (delim_count(tokens, opener) >= 2 && delim_count(tokens, i) >= 2) {
                    2
                } else {
                    1
                };
                let (open_tag, close_tag) = match (ch, n) {
                    (b'~', _) => ("<s>", "</s>"),
                    (_, 2) => ("<strong>", "</strong>"),
                    _ => ("<em>", "</em>"),
                };

                if let Token::Delim(delim) = &mut tokens[opener] {
                    delim.count -= n;
                    delim.open_tags.insert_str(0, open_tag);
                }
                if let Token::Delim(delim) = &mut tokens[i] {
                    delim.count -= n;
                    delim.close_tags.push_str(close_tag);
                }

                if delim_count(tokens, opener) > 0 {
                    openers.push(opener);
                    *open_counts.entry(ch).or_default() += 1;
                }
            }
        }

        if can_open && delim_count(tokens, i) > 0 {
            openers.push(i);
            *open_counts.entry(ch).or_default() += 1;
        }
    }

    for token in tokens.iter_mut() {
        if let Token::Delim(delim) = token {
            let literal = (delim.ch as char).to_string().repeat(delim.count);
            *token = Token::Html(format!("{}{}{}", delim.close_tags, literal, delim.open_tags));
        }
    }
}

fn delim_count(tokens: &[Token], i: usize) -> usize {
    match &tokens[i] {
        Token::Delim(delim) => delim.count,
        Token::Html(_) => 0,
    }
}

fn delim_ch(tokens: &[Token], i: usize) -> u8 {
    match &tokens[i] {
        Token::Delim(delim) => delim.ch,
        Token::Html(_) => 0,
    }
}
