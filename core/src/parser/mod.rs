//! Recursive-descent parser for ChoiceScript scenes.
//!
//! The parser consumes the scanner's token stream one lookahead token at
//! a time, building nodes in an arena. Speculative paths capture a mark
//! first and restore it on failure; malformed-but-intended productions
//! produce a best-effort node with an attached issue instead of failing.

mod blocks;
mod commands;
mod expressions;
mod helpers;
mod replacements;
mod scene;

#[cfg(test)]
mod parser_test;

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::debug;
use url::Url;

use crate::doc::TextDocument;
use crate::node::{Diagnostic, NodeArena, NodeId, NodeKind};
use crate::token::{Scanner, Token};

pub(crate) use helpers::IndentStyle;

/// A parsed scene: the owning arena plus the root node handle.
#[derive(Debug)]
pub struct Scene {
    pub arena: NodeArena,
    pub root: NodeId,
    pub uri: Url,
}

impl Scene {
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.arena.collect_issues(self.root)
    }

    pub fn text_of(&self, id: NodeId) -> Option<String> {
        self.arena.text_of(id)
    }

    pub fn node_path(&self, offset: usize) -> Vec<NodeId> {
        self.arena.node_path(self.root, offset)
    }

    pub fn node_at_offset(&self, offset: usize) -> Option<NodeId> {
        self.arena.node_at_offset(self.root, offset)
    }

    pub fn is_startup(&self) -> bool {
        matches!(self.arena[self.root].kind, NodeKind::Scene { is_startup: true, .. })
    }
}

/// Parse one scene document into a tree.
pub fn parse_scene(document: &TextDocument) -> Scene {
    debug!(uri = %document.uri, version = document.version, "parsing scene");
    SceneParser::new(document).parse()
}

pub struct SceneParser {
    scanner: Scanner,
    source: Arc<str>,
    uri: Url,
    arena: NodeArena,
    /// Current lookahead token.
    token: Token,
    /// End offset of the last consumed token; `finish` closes nodes here.
    prev_end: usize,
    /// Locked on the first Indentation token seen.
    indent_unit: Option<(IndentStyle, usize)>,
    /// Nesting level blocks are currently parsed at.
    indent_level: usize,
    /// Offset of the last token an error was attached at, for dedup.
    last_error: Option<usize>,
    seen_non_initial: bool,
    seen_unique: FxHashSet<String>,
    is_startup: bool,
    is_stats: bool,
}

impl SceneParser {
    pub fn new(document: &TextDocument) -> Self {
        let text = document.text();
        let mut scanner = Scanner::new();
        scanner.set_source(&text);
        let token = scanner.scan();
        let name = document.scene_name();
        Self {
            scanner,
            source: Arc::from(text.as_str()),
            uri: document.uri.clone(),
            arena: NodeArena::new(),
            token,
            prev_end: 0,
            indent_unit: None,
            indent_level: 0,
            last_error: None,
            seen_non_initial: false,
            seen_unique: FxHashSet::default(),
            is_startup: name.as_deref() == Some("startup"),
            is_stats: name.as_deref() == Some("choicescript_stats"),
        }
    }
}
