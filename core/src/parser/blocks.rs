use super::SceneParser;
use crate::node::{IfKeyword, LineType, NodeId, NodeKind, Rule};
use crate::token::TokenKind;

/// What the next physical line looks like, measured without consuming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BlockPeek {
    Eof,
    Blank,
    Depth(usize),
}

impl SceneParser {
    pub(super) fn peek_block_line(&mut self) -> BlockPeek {
        match self.token.kind {
            TokenKind::EndOfFile => BlockPeek::Eof,
            TokenKind::EndOfLine => BlockPeek::Blank,
            TokenKind::Indentation => {
                let depth = self.measure_depth_of_current();
                let mark = self.mark();
                self.advance();
                let blank = self.at(TokenKind::EndOfLine);
                self.restore(mark);
                if blank { BlockPeek::Blank } else { BlockPeek::Depth(depth) }
            }
            _ => BlockPeek::Depth(0),
        }
    }

    pub(super) fn next_line_deeper(&mut self) -> bool {
        matches!(self.peek_block_line(), BlockPeek::Depth(depth) if depth > self.indent_level)
    }

    /// An indented block: lines at exactly one level deeper than the
    /// owning command. A shallower line ends the block unconsumed; a
    /// deeper line is an indentation error but stays in the block.
    pub(super) fn parse_code_block(&mut self) -> NodeId {
        let block = self.start(NodeKind::CodeBlock);
        self.indent_level += 1;
        loop {
            match self.peek_block_line() {
                BlockPeek::Eof => break,
                BlockPeek::Blank => {
                    let line = self.parse_line();
                    self.arena.add_child(block, line);
                }
                BlockPeek::Depth(depth) if depth < self.indent_level => break,
                BlockPeek::Depth(depth) => {
                    let line = self.parse_line();
                    if depth > self.indent_level {
                        self.flag_node(line, Rule::IndentationTooDeep);
                    }
                    self.arena.add_child(block, line);
                }
            }
        }
        self.indent_level -= 1;
        self.finish(block);
        block
    }

    /// A `#` option line plus its indented body.
    pub(super) fn parse_choice_option(&mut self, line: NodeId) -> LineType {
        let option = self.start(NodeKind::ChoiceOption);
        self.advance(); // '#'
        self.parse_text(option);
        self.finish(option);
        self.arena.add_child(line, option);

        if self.at(TokenKind::EndOfLine) {
            self.advance();
            if self.next_line_deeper() {
                let block = self.parse_code_block();
                self.arena.add_child(option, block);
                self.finish(option);
            }
        }
        LineType::ChoiceOption
    }

    /// `*choice` / `*fake_choice` and its option block.
    pub(super) fn parse_choice(&mut self, star: usize, fake: bool) -> NodeId {
        let node = self.arena.alloc(NodeKind::ChoiceCommand { fake }, star);
        self.consume_line_end(node);

        let mut options = 0;
        self.indent_level += 1;
        loop {
            match self.peek_block_line() {
                BlockPeek::Eof => break,
                BlockPeek::Blank => {
                    let line = self.parse_line();
                    self.arena.add_child(node, line);
                }
                BlockPeek::Depth(depth) if depth < self.indent_level => break,
                BlockPeek::Depth(depth) => {
                    let line = self.parse_line();
                    if depth > self.indent_level {
                        self.flag_node(line, Rule::IndentationTooDeep);
                    }
                    match self.arena[line].kind {
                        NodeKind::Line {
                            line_type: LineType::ChoiceOption,
                            ..
                        } => options += 1,
                        NodeKind::Line {
                            line_type: LineType::Text,
                            ..
                        } => self.flag_node(line, Rule::ExpectedChoiceOption),
                        // *if / *comment lines between options are fine
                        _ => {}
                    }
                    self.arena.add_child(node, line);
                }
            }
        }
        self.indent_level -= 1;
        self.finish(node);
        if options == 0 {
            self.flag_node(node, Rule::ExpectedChoiceOption);
        }
        node
    }

    /// `*if` and its continuations. The chain is committed one link at a
    /// time by peeking the next line's keyword; anything else rewinds.
    pub(super) fn parse_if(&mut self, star: usize, keyword: IfKeyword) -> NodeId {
        let node = self.arena.alloc(NodeKind::IfCommand { keyword }, star);
        if keyword != IfKeyword::Else {
            if self.at_line_end() {
                self.flag(node, Rule::ExpectedExpression);
            } else {
                match self.parse_cs_expr(None, None) {
                    Some(condition) => self.arena.add_child(node, condition),
                    None => self.flag(node, Rule::ExpectedExpression),
                }
            }
        }
        self.consume_line_end(node);

        if self.next_line_deeper() {
            let block = self.parse_code_block();
            self.arena.add_child(node, block);
        }

        if keyword != IfKeyword::Else {
            if let Some((next_keyword, next_star)) = self.peek_chain_keyword() {
                let next = self.parse_if(next_star, next_keyword);
                self.arena.add_child(node, next);
            }
        }
        self.finish(node);
        node
    }

    /// Commit to an `*elsif`/`*elseif`/`*else` continuation at the same
    /// indent level, or rewind and report none.
    fn peek_chain_keyword(&mut self) -> Option<(IfKeyword, usize)> {
        let mark = self.mark();
        let mut depth = 0;
        if self.at(TokenKind::Indentation) {
            depth = self.measure_depth_of_current();
            self.advance();
        }
        if depth != self.indent_level || !self.at(TokenKind::Asterisk) {
            self.restore(mark);
            return None;
        }
        let star = self.token.offset;
        self.advance();
        if !self.at(TokenKind::Word) {
            self.restore(mark);
            return None;
        }
        let keyword = match self.token.text.as_str() {
            "elsif" | "elseif" => IfKeyword::ElseIf,
            "else" => IfKeyword::Else,
            _ => {
                self.restore(mark);
                return None;
            }
        };
        self.advance(); // keyword word
        Some((keyword, star))
    }
}
