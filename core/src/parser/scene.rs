use super::{Scene, SceneParser};
use crate::node::{LineType, NodeId, NodeKind, Rule};
use crate::token::TokenKind;

impl SceneParser {
    /// A scene is a sequence of lines until end of file.
    pub fn parse(mut self) -> Scene {
        let root = self.arena.alloc(
            NodeKind::Scene {
                is_startup: self.is_startup,
                is_stats: self.is_stats,
            },
            0,
        );
        while !self.at(TokenKind::EndOfFile) {
            let line = self.parse_line();
            self.arena.add_child(root, line);
        }
        self.arena.set_length(root, self.source.chars().count());
        if let Some(name) = crate::doc::scene_name_of(&self.uri) {
            self.arena.set_data(root, "scene-name", name);
        }
        self.arena.attach_source(root, self.source.clone());
        Scene {
            arena: self.arena,
            root,
            uri: self.uri,
        }
    }

    /// One physical line. Tries a choice option first, then a `*`
    /// statement, and falls back to prose; an empty line still yields a
    /// prose-typed Line node.
    pub(super) fn parse_line(&mut self) -> NodeId {
        let line = self.start(NodeKind::Line {
            line_type: LineType::Text,
            indent: 0,
        });
        let mut indent = 0;
        if self.at(TokenKind::Indentation) {
            indent = self.parse_indentation(line);
        }

        let line_type = if self.at(TokenKind::Hash) {
            self.parse_choice_option(line)
        } else if self.at(TokenKind::Asterisk) {
            self.parse_cs_statement(line)
        } else if self.at(TokenKind::Unscannable) {
            let text = self.leaf(NodeKind::Text);
            self.arena.add_child(line, text);
            self.flag_node(text, Rule::UnscannableLine);
            LineType::Text
        } else {
            self.parse_text(line);
            LineType::Text
        };

        if self.at(TokenKind::EndOfLine) {
            self.advance();
        }
        self.arena[line].kind = NodeKind::Line { line_type, indent };
        self.finish(line);
        line
    }

    /// Prose content up to the end of the line: text runs interleaved
    /// with `${...}` and `@{...}` replacements.
    pub(super) fn parse_text(&mut self, parent: NodeId) {
        while !self.at_line_end() {
            if self.at(TokenKind::ReplacementStart) || self.at(TokenKind::MultiReplaceStart) {
                let replacement = self.parse_replacement();
                self.arena.add_child(parent, replacement);
            } else {
                let run = self.start(NodeKind::Text);
                while !matches!(
                    self.token.kind,
                    TokenKind::ReplacementStart
                        | TokenKind::MultiReplaceStart
                        | TokenKind::EndOfLine
                        | TokenKind::EndOfFile
                ) {
                    self.advance();
                }
                self.finish(run);
                self.arena.add_child(parent, run);
            }
        }
    }
}
