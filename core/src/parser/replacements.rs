use super::SceneParser;
use crate::node::{NodeId, NodeKind, Rule};
use crate::token::TokenKind;

impl SceneParser {
    /// `${expr}` or `@{selector a|b|...}`, with 0-2 leading `!`
    /// capitalization markers. Three or more `!` means the replacement is
    /// ignored outright and kept as plain text.
    pub(super) fn parse_replacement(&mut self) -> NodeId {
        let opener = self.token.clone();
        let bangs = opener.text.chars().filter(|c| *c == '!').count();
        if bangs >= 3 {
            return self.swallow_ignored_replacement();
        }
        if opener.kind == TokenKind::ReplacementStart {
            let node = self.start(NodeKind::VariableReplacement);
            self.advance();
            match self.parse_cs_expr(Some(TokenKind::RBrace), None) {
                Some(expression) => self.arena.add_child(node, expression),
                None => {
                    self.flag(node, Rule::ExpectedExpression);
                    self.resync(&[TokenKind::RBrace, TokenKind::EndOfLine]);
                    self.accept(TokenKind::RBrace);
                }
            }
            self.finish(node);
            node
        } else {
            self.parse_multireplace()
        }
    }

    fn swallow_ignored_replacement(&mut self) -> NodeId {
        let node = self.start(NodeKind::Text);
        self.advance();
        let mut depth = 1usize;
        while depth > 0 && !self.at_line_end() {
            match self.token.kind {
                TokenKind::ReplacementStart | TokenKind::MultiReplaceStart => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            self.advance();
        }
        self.finish(node);
        node
    }

    /// `@{selector one|two|...}`. The selector expression is bounded by
    /// the first raw space after the opener, located by looking at the
    /// source without consuming tokens; the variants follow, separated by
    /// `|`, and fewer than two of them is an error.
    fn parse_multireplace(&mut self) -> NodeId {
        let node = self.start(NodeKind::MultiReplace);
        self.advance(); // '@{'

        if self.at(TokenKind::RBrace) {
            self.flag(node, Rule::EmptyMultiReplace);
            self.advance();
            self.finish(node);
            return node;
        }

        let bound = self.scanner.next_raw_space(self.token.offset);
        match self.parse_cs_expr(None, bound) {
            Some(selector) => self.arena.add_child(node, selector),
            None => self.flag(node, Rule::ExpectedExpression),
        }

        let mut variants = 0;
        while !self.at(TokenKind::RBrace) && !self.at_line_end() {
            let option = self.parse_multireplace_option();
            self.arena.add_child(node, option);
            variants += 1;
            if self.at_operator("|") {
                self.advance();
                if self.at(TokenKind::RBrace) {
                    // trailing empty variant still occupies a slot
                    let empty = self.start(NodeKind::MultiReplaceOption);
                    self.finish(empty);
                    self.arena.add_child(node, empty);
                    variants += 1;
                }
            }
        }
        if !self.accept(TokenKind::RBrace) {
            self.flag(node, Rule::UnbalancedParens);
        }
        self.finish(node);
        if variants < 2 {
            self.flag_node(node, Rule::NotEnoughMultiReplaceOptions);
        }
        node
    }

    /// One variant: text runs and nested replacements up to `|` or `}`.
    fn parse_multireplace_option(&mut self) -> NodeId {
        let node = self.start(NodeKind::MultiReplaceOption);
        while !self.at(TokenKind::RBrace) && !self.at_line_end() && !self.at_operator("|") {
            if self.at(TokenKind::ReplacementStart) || self.at(TokenKind::MultiReplaceStart) {
                let replacement = self.parse_replacement();
                self.arena.add_child(node, replacement);
            } else {
                let run = self.start(NodeKind::Text);
                while !matches!(
                    self.token.kind,
                    TokenKind::ReplacementStart
                        | TokenKind::MultiReplaceStart
                        | TokenKind::RBrace
                        | TokenKind::EndOfLine
                        | TokenKind::EndOfFile
                ) && !self.at_operator("|")
                {
                    self.advance();
                }
                self.finish(run);
                self.arena.add_child(node, run);
            }
        }
        self.finish(node);
        node
    }
}
