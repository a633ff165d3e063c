use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

use super::SceneParser;
use crate::node::{IfKeyword, LineType, NodeId, NodeKind, Rule};
use crate::token::TokenKind;

/// Commands with no dedicated grammar beyond their argument text.
static STANDARD_COMMANDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "achieve",
        "achievement",
        "advertisement",
        "allow_reuse",
        "author",
        "bug",
        "check_achievements",
        "check_purchase",
        "check_registration",
        "delay_break",
        "delay_ending",
        "delete",
        "disable_reuse",
        "ending",
        "finish",
        "hide_reuse",
        "ifid",
        "image",
        "input_number",
        "input_text",
        "line_break",
        "link",
        "looplimit",
        "more_games",
        "page_break",
        "params",
        "print",
        "product",
        "purchase",
        "rand",
        "redirect_scene",
        "restart",
        "restore_game",
        "restore_purchases",
        "save_game",
        "script",
        "selectable_if",
        "share_this_game",
        "show_password",
        "sound",
        "stat_chart",
        "subscribe",
        "text_image",
        "title",
    ]
    .into_iter()
    .collect()
});

static FLOW_COMMANDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    ["goto", "gosub", "goto_scene", "gosub_scene", "goto_random_scene", "return"]
        .into_iter()
        .collect()
});

/// Commands only valid at the top of startup.txt, before the first
/// non-initial command.
static INITIAL_COMMANDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    ["achievement", "author", "create", "ifid", "product", "scene_list", "title"]
        .into_iter()
        .collect()
});

/// Commands that may appear at most once per scene.
static UNIQUE_COMMANDS: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| ["author", "ifid", "title"].into_iter().collect());

impl SceneParser {
    /// Dispatch a `*` statement line across the command grammar, in a
    /// fixed priority order. Unrecognized commands still produce a node
    /// so later tooling has something to attach to.
    pub(super) fn parse_cs_statement(&mut self, line: NodeId) -> LineType {
        let star = self.token.offset;
        self.advance(); // '*'
        if !self.at(TokenKind::Word) {
            let node = self.arena.alloc(NodeKind::StandardCommand { name: String::new() }, star);
            self.finish_err(node, Rule::ExpectedCommand, &[TokenKind::EndOfLine]);
            self.arena.add_child(line, node);
            return LineType::ChoiceScript;
        }

        let name = self.token.text.clone();
        let name_token = self.token.clone();
        self.advance(); // command word

        let is_initial = INITIAL_COMMANDS.contains(name.as_str());
        let initial_misplaced = is_initial && (!self.is_startup || self.seen_non_initial);
        if !is_initial && name != "comment" {
            self.seen_non_initial = true;
        }

        let node = match name.as_str() {
            "comment" => {
                let node = self.parse_comment(star);
                self.arena.add_child(line, node);
                return LineType::Comment;
            }
            "scene_list" => self.parse_scene_list(star),
            "create" => self.parse_variable_declaration(star, true),
            "temp" => self.parse_variable_declaration(star, false),
            "label" => self.parse_label_declaration(star),
            "set" => self.parse_set(star),
            "choice" => self.parse_choice(star, false),
            "fake_choice" => self.parse_choice(star, true),
            _ if FLOW_COMMANDS.contains(name.as_str()) => self.parse_flow(star, &name),
            "if" => self.parse_if(star, IfKeyword::If),
            "elsif" | "elseif" => self.parse_if(star, IfKeyword::ElseIf),
            "else" => self.parse_if(star, IfKeyword::Else),
            _ if STANDARD_COMMANDS.contains(name.as_str()) => self.parse_standard(star, &name),
            _ => {
                let node = self.arena.alloc(NodeKind::StandardCommand { name: name.clone() }, star);
                self.flag_at(
                    node,
                    Rule::UnknownCommand,
                    name_token.offset,
                    name_token.length,
                    Some(format!("unknown command '*{}'", name)),
                );
                self.resync(&[TokenKind::EndOfLine]);
                self.finish(node);
                node
            }
        };

        if initial_misplaced {
            self.flag_node(node, Rule::InvalidInitialCommand);
        }
        self.arena.add_child(line, node);
        LineType::ChoiceScript
    }

    /// `*comment ...` — the scanner already collapsed the remainder of
    /// the line into one token.
    fn parse_comment(&mut self, star: usize) -> NodeId {
        let node = self.arena.alloc(NodeKind::Comment, star);
        if self.at(TokenKind::Comment) {
            self.advance();
        }
        self.finish(node);
        node
    }

    /// `*create name expr` / `*temp name [expr]`.
    fn parse_variable_declaration(&mut self, star: usize, global: bool) -> NodeId {
        let node = self.arena.alloc(NodeKind::VariableDeclaration { global }, star);
        if !self.at(TokenKind::Word) {
            self.finish_err(node, Rule::ExpectedIdentifier, &[TokenKind::EndOfLine]);
            return node;
        }

        let name = self.token.text.clone();
        let reserved = name.starts_with("choice_");
        let variable = self.leaf(NodeKind::Variable { name });
        self.arena.add_child(node, variable);
        if reserved {
            self.flag_node(variable, Rule::ReservedVariablePrefix);
        }

        if !self.at_line_end() {
            match self.parse_cs_expr(None, None) {
                Some(value) => self.arena.add_child(node, value),
                None => self.flag(node, Rule::ExpectedExpression),
            }
            self.expect_line_end(node);
        } else if global {
            // *create always takes an initial value
            self.flag(node, Rule::ExpectedExpression);
        }
        self.finish(node);
        node
    }

    /// `*label name`.
    fn parse_label_declaration(&mut self, star: usize) -> NodeId {
        let node = self.arena.alloc(NodeKind::LabelDeclaration, star);
        if !self.at(TokenKind::Word) {
            self.finish_err(node, Rule::ExpectedIdentifier, &[TokenKind::EndOfLine]);
            return node;
        }
        let name = self.token.text.clone();
        let label = self.leaf(NodeKind::Label { name });
        self.arena.add_child(node, label);
        self.expect_line_end(node);
        self.finish(node);
        node
    }

    /// `*set name expr`, including the `*set n +5` / `*set n %+20`
    /// operator shorthand and `{...}` dynamic references.
    fn parse_set(&mut self, star: usize) -> NodeId {
        let node = self.arena.alloc(NodeKind::SetCommand, star);
        if self.at(TokenKind::Word) {
            let name = self.token.text.clone();
            let variable = self.leaf(NodeKind::Variable { name });
            self.arena.add_child(node, variable);
        } else if self.at(TokenKind::LBrace) {
            let reference = self.parse_bracketed(TokenKind::RBrace);
            self.arena.add_child(node, reference);
        } else {
            self.finish_err(node, Rule::ExpectedIdentifier, &[TokenKind::EndOfLine]);
            return node;
        }

        if self.at_line_end() {
            self.flag(node, Rule::ExpectedExpression);
        } else {
            match self.parse_set_value() {
                Some(value) => self.arena.add_child(node, value),
                None => self.flag(node, Rule::ExpectedExpression),
            }
            self.expect_line_end(node);
        }
        self.finish(node);
        node
    }

    /// `*goto label`, `*goto_scene scene [label]`, `*return`, ...
    fn parse_flow(&mut self, star: usize, name: &str) -> NodeId {
        let node = self.arena.alloc(NodeKind::FlowCommand { name: name.to_string() }, star);
        match name {
            "goto" | "gosub" => {
                if self.at(TokenKind::Word) {
                    let label = self.token.text.clone();
                    let reference = self.leaf(NodeKind::LabelRef { name: label });
                    self.arena.add_child(node, reference);
                } else {
                    self.flag(node, Rule::ExpectedIdentifier);
                }
            }
            "goto_scene" | "gosub_scene" => {
                if self.at(TokenKind::Word) {
                    let scene = self.token.text.clone();
                    let reference = self.leaf(NodeKind::SceneRef { name: scene });
                    self.arena.add_child(node, reference);
                    if self.at(TokenKind::Word) {
                        let label = self.token.text.clone();
                        let reference = self.leaf(NodeKind::LabelRef { name: label });
                        self.arena.add_child(node, reference);
                    }
                } else {
                    self.flag(node, Rule::ExpectedIdentifier);
                }
            }
            _ => {}
        }
        self.expect_line_end(node);
        self.finish(node);
        node
    }

    /// Any other recognized command: keep its argument text as one node.
    fn parse_standard(&mut self, star: usize, name: &str) -> NodeId {
        let node = self.arena.alloc(NodeKind::StandardCommand { name: name.to_string() }, star);
        if !self.at_line_end() {
            let args = self.start(NodeKind::Text);
            while !self.at_line_end() {
                self.advance();
            }
            self.finish(args);
            self.arena.add_child(node, args);
        }
        self.finish(node);
        if UNIQUE_COMMANDS.contains(name) && !self.seen_unique.insert(name.to_string()) {
            self.flag_node(node, Rule::DuplicateUniqueCommand);
        }
        node
    }

    /// `*scene_list` with an indented block of scene names.
    fn parse_scene_list(&mut self, star: usize) -> NodeId {
        let node = self.arena.alloc(NodeKind::SceneList, star);
        self.consume_line_end(node);
        if self.next_line_deeper() {
            self.indent_level += 1;
            loop {
                match self.peek_block_line() {
                    super::blocks::BlockPeek::Eof => break,
                    super::blocks::BlockPeek::Blank => {
                        let line = self.parse_line();
                        self.arena.add_child(node, line);
                    }
                    super::blocks::BlockPeek::Depth(depth) if depth < self.indent_level => break,
                    super::blocks::BlockPeek::Depth(depth) => {
                        let line = self.parse_scene_entry();
                        if depth > self.indent_level {
                            self.flag_node(line, Rule::IndentationTooDeep);
                        }
                        self.arena.add_child(node, line);
                    }
                }
            }
            self.indent_level -= 1;
        }
        self.finish(node);
        node
    }

    /// One `*scene_list` entry line; the first word is a scene reference.
    fn parse_scene_entry(&mut self) -> NodeId {
        let line = self.start(NodeKind::Line {
            line_type: LineType::Text,
            indent: 0,
        });
        let mut indent = 0;
        if self.at(TokenKind::Indentation) {
            indent = self.parse_indentation(line);
        }
        if matches!(self.token.kind, TokenKind::Text | TokenKind::Word) {
            let name = self.token.text.clone();
            let reference = self.leaf(NodeKind::SceneRef { name });
            self.arena.add_child(line, reference);
        }
        if !self.at_line_end() {
            let rest = self.start(NodeKind::Text);
            while !self.at_line_end() {
                self.advance();
            }
            self.finish(rest);
            self.arena.add_child(line, rest);
        }
        if self.at(TokenKind::EndOfLine) {
            self.advance();
        }
        self.arena[line].kind = NodeKind::Line {
            line_type: LineType::Text,
            indent,
        };
        self.finish(line);
        line
    }
}
