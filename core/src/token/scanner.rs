//! ChoiceScript scanner.
//!
//! Tokenizes one logical line at a time. Every line is classified once,
//! before any of its tokens are produced: a line whose first significant
//! character is `*` followed by a letter is a command line, anything else
//! is a prose line, and the two use different token rules. The
//! classification holds until the synthesized end-of-line token.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `*` on a command line (command marker or multiply).
    Asterisk,
    /// Identifier or keyword on a command line.
    Word,
    /// Integer or decimal literal.
    Number,
    /// Double-quoted string, including the quotes. May be unterminated.
    String,
    /// `%+`
    FairMathAdd,
    /// `%-`
    FairMathSub,
    /// Single- or two-character operator (`+ - / % ^ & # < > = != <= >= , . : |`).
    Operator,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    /// `#` on a prose line (choice option marker).
    Hash,
    /// `${`, `$!{`, `$!!{` or `$!!!{` — variable replacement opener.
    ReplacementStart,
    /// `@{`, `@!{`, `@!!{` or `@!!!{` — multireplace opener.
    MultiReplaceStart,
    /// Everything after a `*comment` prefix, up to end of line.
    Comment,
    /// Prose word run (apostrophes count as word characters), or a stray
    /// character neither line mode has a rule for.
    Text,
    /// Leading whitespace run, only ever produced at column 0.
    Indentation,
    /// Synthesized end of logical line; stands for the line terminator.
    EndOfLine,
    EndOfFile,
    /// A line shape neither classification matches (`*` not followed by a
    /// letter). Covers the whole rest of the line.
    Unscannable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: usize,
    pub length: usize,
}

impl Token {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})@{}", self.kind, self.text, self.offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
    Command,
    Prose,
}

/// Full cursor state. A mark is a copy of this value; restoring is plain
/// reassignment, which is what makes parser backtracking cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerState {
    /// Index of the current logical line.
    line: usize,
    /// Character column within the current line's text.
    column: usize,
    /// Classification of the current line, decided on first use.
    mode: Option<LineMode>,
    /// Open replacement braces; while non-zero, command rules apply even
    /// on prose lines so `${...}` and `@{...}` interiors tokenize as
    /// expressions.
    replacement_depth: usize,
    /// Set right after scanning the `comment` word of a `*comment` line.
    comment_pending: bool,
}

impl ScannerState {
    fn start() -> Self {
        Self {
            line: 0,
            column: 0,
            mode: None,
            replacement_depth: 0,
            comment_pending: false,
        }
    }
}

#[derive(Debug)]
struct ScanLine {
    /// Absolute character offset of the first character of the line.
    start: usize,
    chars: Vec<char>,
    /// Terminator length in chars (2 for `\r\n`, 1 for `\n`/`\r`, 0 at EOF).
    terminator: usize,
}

#[derive(Debug, Default)]
pub struct Scanner {
    lines: Vec<ScanLine>,
    /// Total source length in chars.
    len: usize,
    state: ScannerState,
}

impl Default for ScannerState {
    fn default() -> Self {
        Self::start()
    }
}

fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_word_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_line_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the scanner onto new source text, pre-split into logical lines.
    pub fn set_source(&mut self, text: &str) {
        self.lines.clear();
        self.state = ScannerState::start();

        let mut chars = text.chars().peekable();
        let mut offset = 0;
        let mut line_start = 0;
        let mut line_chars: Vec<char> = Vec::new();
        while let Some(c) = chars.next() {
            offset += 1;
            match c {
                '\n' => {
                    self.lines.push(ScanLine {
                        start: line_start,
                        chars: std::mem::take(&mut line_chars),
                        terminator: 1,
                    });
                    line_start = offset;
                }
                '\r' => {
                    let mut terminator = 1;
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                        offset += 1;
                        terminator = 2;
                    }
                    self.lines.push(ScanLine {
                        start: line_start,
                        chars: std::mem::take(&mut line_chars),
                        terminator,
                    });
                    line_start = offset;
                }
                c => line_chars.push(c),
            }
        }
        if !line_chars.is_empty() {
            self.lines.push(ScanLine {
                start: line_start,
                chars: line_chars,
                terminator: 0,
            });
        }
        self.len = offset;
    }

    pub fn mark(&self) -> ScannerState {
        self.state.clone()
    }

    pub fn restore_at(&mut self, mark: ScannerState) {
        self.state = mark;
    }

    /// Classification of the current line, if it has been decided yet.
    pub fn line_mode(&self) -> Option<LineMode> {
        self.state.mode
    }

    /// First raw space character at or after `from` on the current line.
    /// Used to bound a multireplace selector without consuming anything.
    pub fn next_raw_space(&self, from: usize) -> Option<usize> {
        let line = self.lines.get(self.state.line)?;
        let begin = from.saturating_sub(line.start);
        for (i, c) in line.chars.iter().enumerate().skip(begin) {
            if *c == ' ' {
                return Some(line.start + i);
            }
        }
        None
    }

    pub fn scan(&mut self) -> Token {
        loop {
            let Some(line) = self.lines.get(self.state.line) else {
                return Token {
                    kind: TokenKind::EndOfFile,
                    text: String::new(),
                    offset: self.len,
                    length: 0,
                };
            };

            if self.state.column >= line.chars.len() {
                let token = Token {
                    kind: TokenKind::EndOfLine,
                    text: String::new(),
                    offset: line.start + line.chars.len(),
                    length: line.terminator,
                };
                self.state.line += 1;
                self.state.column = 0;
                self.state.mode = None;
                self.state.replacement_depth = 0;
                self.state.comment_pending = false;
                return token;
            }

            // Indentation is its own token and only exists at column 0.
            if self.state.column == 0 && is_line_space(line.chars[0]) {
                let mut end = 0;
                while end < line.chars.len() && is_line_space(line.chars[end]) {
                    end += 1;
                }
                self.state.column = end;
                return self.token(TokenKind::Indentation, line, 0, end);
            }

            if self.state.mode.is_none() {
                match classify(line, self.state.column) {
                    Some(mode) => self.state.mode = Some(mode),
                    None => {
                        let from = self.state.column;
                        self.state.column = line.chars.len();
                        return self.token(TokenKind::Unscannable, line, from, line.chars.len());
                    }
                }
            }

            if self.state.comment_pending {
                self.state.comment_pending = false;
                let mut from = self.state.column;
                while from < line.chars.len() && is_line_space(line.chars[from]) {
                    from += 1;
                }
                if from >= line.chars.len() {
                    self.state.column = from;
                    continue;
                }
                self.state.column = line.chars.len();
                return self.token(TokenKind::Comment, line, from, line.chars.len());
            }

            let command_rules = self.state.replacement_depth > 0
                || self.state.mode == Some(LineMode::Command);
            let scanned = if command_rules {
                self.scan_command(self.state.line)
            } else {
                self.scan_prose(self.state.line)
            };
            if let Some(token) = scanned {
                return token;
            }
            // Only trailing whitespace was left; loop to emit the EOL.
        }
    }

    fn token(&self, kind: TokenKind, line: &ScanLine, from: usize, to: usize) -> Token {
        Token {
            kind,
            text: line.chars[from..to].iter().collect(),
            offset: line.start + from,
            length: to - from,
        }
    }

    fn scan_command(&mut self, line_idx: usize) -> Option<Token> {
        let line = &self.lines[line_idx];
        let chars = &line.chars;
        let mut at = self.state.column;
        while at < chars.len() && is_line_space(chars[at]) {
            at += 1;
        }
        if at >= chars.len() {
            self.state.column = at;
            return None;
        }

        let from = at;
        let c = chars[at];
        let (kind, to) = match c {
            '*' => (TokenKind::Asterisk, at + 1),
            '"' => {
                at += 1;
                while at < chars.len() {
                    match chars[at] {
                        '\\' if at + 1 < chars.len() => at += 2,
                        '"' => {
                            at += 1;
                            break;
                        }
                        _ => at += 1,
                    }
                }
                (TokenKind::String, at)
            }
            '0'..='9' => {
                at += 1;
                while at < chars.len() && chars[at].is_ascii_digit() {
                    at += 1;
                }
                if at < chars.len()
                    && chars[at] == '.'
                    && chars.get(at + 1).is_some_and(|c| c.is_ascii_digit())
                {
                    at += 1;
                    while at < chars.len() && chars[at].is_ascii_digit() {
                        at += 1;
                    }
                }
                (TokenKind::Number, at)
            }
            '%' => match chars.get(at + 1) {
                Some('+') => (TokenKind::FairMathAdd, at + 2),
                Some('-') => (TokenKind::FairMathSub, at + 2),
                _ => (TokenKind::Operator, at + 1),
            },
            '$' | '@' => match sigil_end(chars, at) {
                Some(end) => {
                    self.state.replacement_depth += 1;
                    let kind = if c == '$' {
                        TokenKind::ReplacementStart
                    } else {
                        TokenKind::MultiReplaceStart
                    };
                    (kind, end)
                }
                None => (TokenKind::Text, at + 1),
            },
            '(' => (TokenKind::LParen, at + 1),
            ')' => (TokenKind::RParen, at + 1),
            '{' => (TokenKind::LBrace, at + 1),
            '}' => {
                if self.state.replacement_depth > 0 {
                    self.state.replacement_depth -= 1;
                }
                (TokenKind::RBrace, at + 1)
            }
            '[' => (TokenKind::LBracket, at + 1),
            ']' => (TokenKind::RBracket, at + 1),
            '<' | '>' | '!' => {
                if chars.get(at + 1) == Some(&'=') {
                    (TokenKind::Operator, at + 2)
                } else {
                    (TokenKind::Operator, at + 1)
                }
            }
            '+' | '-' | '/' | '^' | '&' | '#' | '=' | ',' | '.' | ':' | '|' => {
                (TokenKind::Operator, at + 1)
            }
            c if is_word_start(c) => {
                at += 1;
                while at < chars.len() && is_word_continue(chars[at]) {
                    at += 1;
                }
                (TokenKind::Word, at)
            }
            _ => (TokenKind::Text, at + 1),
        };

        self.state.column = to;
        let token = self.token(kind, &self.lines[line_idx], from, to);

        // `*comment` swallows the rest of the line, quotes and all. Only
        // the word directly after the line-leading asterisk qualifies.
        if kind == TokenKind::Word && token.text == "comment" {
            let line = &self.lines[line_idx];
            let indent = line.chars.iter().take_while(|c| is_line_space(**c)).count();
            if from == indent + 1 {
                self.state.comment_pending = true;
            }
        }
        Some(token)
    }

    fn scan_prose(&mut self, line_idx: usize) -> Option<Token> {
        let line = &self.lines[line_idx];
        let chars = &line.chars;
        let mut at = self.state.column;
        while at < chars.len() && is_line_space(chars[at]) {
            at += 1;
        }
        if at >= chars.len() {
            self.state.column = at;
            return None;
        }

        let from = at;
        let c = chars[at];
        let (kind, to) = match c {
            '#' => (TokenKind::Hash, at + 1),
            '$' | '@' => match sigil_end(chars, at) {
                Some(end) => {
                    self.state.replacement_depth += 1;
                    let kind = if c == '$' {
                        TokenKind::ReplacementStart
                    } else {
                        TokenKind::MultiReplaceStart
                    };
                    (kind, end)
                }
                None => (TokenKind::Text, at + 1),
            },
            _ => {
                at += 1;
                while at < chars.len() {
                    let c = chars[at];
                    if is_line_space(c) || c == '#' {
                        break;
                    }
                    if (c == '$' || c == '@') && sigil_end(chars, at).is_some() {
                        break;
                    }
                    at += 1;
                }
                (TokenKind::Text, at)
            }
        };

        self.state.column = to;
        Some(self.token(kind, &self.lines[line_idx], from, to))
    }
}

/// End of a `${`/`@{` replacement sigil starting at `at`, allowing up to
/// three `!` capitalization markers between the sigil and the brace.
fn sigil_end(chars: &[char], at: usize) -> Option<usize> {
    let mut i = at + 1;
    let mut bangs = 0;
    while bangs < 3 && chars.get(i) == Some(&'!') {
        bangs += 1;
        i += 1;
    }
    if chars.get(i) == Some(&'{') {
        Some(i + 1)
    } else {
        None
    }
}

/// Decide the line mode once per line: `*` followed by a letter is a
/// command line, a bare or mis-followed `*` matches neither shape.
fn classify(line: &ScanLine, column: usize) -> Option<LineMode> {
    match line.chars.get(column) {
        Some('*') => match line.chars.get(column + 1) {
            Some(c) if c.is_ascii_alphabetic() => Some(LineMode::Command),
            _ => None,
        },
        _ => Some(LineMode::Prose),
    }
}
