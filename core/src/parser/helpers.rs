use super::SceneParser;
use crate::node::{Issue, NodeId, NodeKind, Rule};
use crate::token::{ScannerState, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndentStyle {
    Tabs,
    Spaces,
}

/// Snapshot of everything a speculative parse can touch. Restoring also
/// truncates the arena, dropping nodes allocated on the failed path.
pub(super) struct Mark {
    scanner: ScannerState,
    token: Token,
    prev_end: usize,
    arena_len: usize,
    last_error: Option<usize>,
}

impl SceneParser {
    pub(super) fn advance(&mut self) {
        self.prev_end = self.token.end();
        self.token = self.scanner.scan();
    }

    pub(super) fn at(&self, kind: TokenKind) -> bool {
        self.token.kind == kind
    }

    pub(super) fn at_operator(&self, text: &str) -> bool {
        self.token.kind == TokenKind::Operator && self.token.text == text
    }

    pub(super) fn at_line_end(&self) -> bool {
        matches!(self.token.kind, TokenKind::EndOfLine | TokenKind::EndOfFile)
    }

    pub(super) fn accept(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            return true;
        }
        false
    }

    pub(super) fn mark(&self) -> Mark {
        Mark {
            scanner: self.scanner.mark(),
            token: self.token.clone(),
            prev_end: self.prev_end,
            arena_len: self.arena.len(),
            last_error: self.last_error,
        }
    }

    pub(super) fn restore(&mut self, mark: Mark) {
        self.scanner.restore_at(mark.scanner);
        self.token = mark.token;
        self.prev_end = mark.prev_end;
        self.arena.truncate(mark.arena_len);
        self.last_error = mark.last_error;
    }

    /// Open a node at the current token.
    pub(super) fn start(&mut self, kind: NodeKind) -> NodeId {
        self.arena.alloc(kind, self.token.offset)
    }

    /// Single-token node: allocated over the current token, which is
    /// consumed.
    pub(super) fn leaf(&mut self, kind: NodeKind) -> NodeId {
        let id = self.arena.alloc(kind, self.token.offset);
        self.arena.set_length(id, self.token.length);
        self.advance();
        id
    }

    /// Close a node: its length runs to the end of the last consumed token.
    pub(super) fn finish(&mut self, id: NodeId) {
        let offset = self.arena[id].offset;
        let length = self.prev_end.saturating_sub(offset);
        self.arena.set_length(id, length);
    }

    /// Close a node with an error and resynchronize to a recovery set.
    pub(super) fn finish_err(&mut self, id: NodeId, rule: Rule, resync: &[TokenKind]) {
        self.flag(id, rule);
        self.resync(resync);
        self.finish(id);
    }

    /// Attach a parse error pointing at the current (unconsumed) token.
    /// At most one error is attached per token position.
    pub(super) fn flag(&mut self, id: NodeId, rule: Rule) {
        let (offset, length) = (self.token.offset, self.token.length);
        self.flag_at(id, rule, offset, length, None);
    }

    pub(super) fn flag_at(
        &mut self,
        id: NodeId,
        rule: Rule,
        offset: usize,
        length: usize,
        message: Option<String>,
    ) {
        if self.last_error == Some(offset) {
            return;
        }
        self.last_error = Some(offset);
        let issue = match message {
            Some(message) => Issue::with_message(rule, message, offset, length),
            None => Issue::new(rule, offset, length),
        };
        self.arena.add_issue(id, issue);
    }

    /// Attach a lint over the node's own range. Not subject to the
    /// parse-error dedup guard.
    pub(super) fn flag_node(&mut self, id: NodeId, rule: Rule) {
        self.arena.add_issue_for_node(id, rule);
    }

    pub(super) fn resync(&mut self, kinds: &[TokenKind]) {
        while !self.at(TokenKind::EndOfFile) && !kinds.contains(&self.token.kind) {
            self.advance();
        }
    }

    /// Flag trailing junk and skip it, leaving the cursor at the EOL.
    pub(super) fn expect_line_end(&mut self, id: NodeId) {
        if !self.at_line_end() {
            self.flag(id, Rule::DeadTextAfterCommand);
            self.resync(&[TokenKind::EndOfLine]);
        }
    }

    /// Like `expect_line_end`, but also consumes the EOL. Used by block
    /// commands that own the following lines.
    pub(super) fn consume_line_end(&mut self, id: NodeId) {
        self.expect_line_end(id);
        if self.at(TokenKind::EndOfLine) {
            self.advance();
        }
    }

    /// Record the indentation token as a node under `line` and translate
    /// its width to a block depth. The first indentation seen locks the
    /// character style and the unit width; later runs are only checked
    /// for character-kind consistency, never width.
    pub(super) fn parse_indentation(&mut self, line: NodeId) -> usize {
        let token = self.token.clone();
        let node = self.leaf(NodeKind::Indentation);
        self.arena.add_child(line, node);

        let has_tab = token.text.contains('\t');
        let has_space = token.text.contains(' ');
        let mut mixed = has_tab && has_space;
        let depth = match self.indent_unit {
            None => {
                let style = if has_tab {
                    IndentStyle::Tabs
                } else {
                    IndentStyle::Spaces
                };
                self.indent_unit = Some((style, token.length.max(1)));
                1
            }
            Some((style, unit)) => {
                match style {
                    IndentStyle::Tabs if has_space => mixed = true,
                    IndentStyle::Spaces if has_tab => mixed = true,
                    _ => {}
                }
                token.length / unit
            }
        };
        if mixed {
            self.flag_node(node, Rule::MixedIndentation);
        }
        depth
    }

    /// Depth the current Indentation token would map to, without locking
    /// anything in.
    pub(super) fn measure_depth_of_current(&self) -> usize {
        match self.indent_unit {
            None => 1,
            Some((_, unit)) => self.token.length / unit,
        }
    }
}
