//! Arena-backed syntax tree.
//!
//! Nodes live in a flat vector and address each other by handle, so
//! parent back-references are plain indices instead of a pointer cycle.
//! Detaching and reattaching a node is one handle update plus bounds
//! maintenance on the new ancestor chain.

use std::ops::{Index, IndexMut};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::issue::{Diagnostic, Issue, Rule};
use super::kind::NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub offset: usize,
    pub length: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub issues: Vec<Issue>,
    /// Open key/value annotations for ad hoc consumer state.
    pub data: FxHashMap<String, String>,
    /// Text provider for `text_of`; normally only set on the scene root.
    pub source: Option<Arc<str>>,
}

impl Node {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Half-open containment with an inclusive end, so a cursor sitting
    /// right after the last character still hits the node.
    pub fn encloses(&self, offset: usize) -> bool {
        offset >= self.offset && offset <= self.end()
    }
}

#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: NodeKind, offset: usize) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            offset,
            length: 0,
            parent: None,
            children: Vec::new(),
            issues: Vec::new(),
            data: FxHashMap::default(),
            source: None,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node allocated at or after `len`. Only safe while those
    /// nodes are unattached; the parser uses this to undo speculation.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Attach `child` under `parent`, growing ancestor bounds to keep the
    /// enclosure invariant. The child must not already have a parent.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self[child].parent.is_none());
        self[child].parent = Some(parent);
        self[parent].children.push(child);
        let (offset, end) = (self[child].offset, self[child].end());
        self.grow_to_include(parent, offset, end);
    }

    /// Reparent `child` under `parent`, detaching it from any previous
    /// parent first.
    pub fn adopt_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old) = self[child].parent {
            self[old].children.retain(|c| *c != child);
            self[child].parent = None;
        }
        self.add_child(parent, child);
    }

    pub fn set_length(&mut self, id: NodeId, length: usize) {
        self[id].length = length;
        let (offset, end) = (self[id].offset, self[id].end());
        if let Some(parent) = self[id].parent {
            self.grow_to_include(parent, offset, end);
        }
    }

    fn grow_to_include(&mut self, id: NodeId, offset: usize, end: usize) {
        let mut at = Some(id);
        while let Some(current) = at {
            let node = &mut self[current];
            let already_enclosed = node.offset <= offset && node.end() >= end;
            if offset < node.offset {
                node.length += node.offset - offset;
                node.offset = offset;
            }
            if end > node.end() {
                node.length = end - node.offset;
            }
            if already_enclosed {
                break;
            }
            at = node.parent;
        }
    }

    pub fn add_issue(&mut self, id: NodeId, issue: Issue) {
        self[id].issues.push(issue);
    }

    /// Attach an issue whose range defaults to the node's own range.
    pub fn add_issue_for_node(&mut self, id: NodeId, rule: Rule) {
        let (offset, length) = (self[id].offset, self[id].length);
        self.add_issue(id, Issue::new(rule, offset, length));
    }

    pub fn attach_source(&mut self, id: NodeId, source: Arc<str>) {
        self[id].source = Some(source);
    }

    pub fn set_data(&mut self, id: NodeId, key: impl Into<String>, value: impl Into<String>) {
        self[id].data.insert(key.into(), value.into());
    }

    pub fn data(&self, id: NodeId, key: &str) -> Option<&str> {
        self[id].data.get(key).map(String::as_str)
    }

    /// Node text, sliced out of the nearest ancestor that carries a text
    /// provider. Char-indexed to match document offsets.
    pub fn text_of(&self, id: NodeId) -> Option<String> {
        let (offset, length) = (self[id].offset, self[id].length);
        let mut at = Some(id);
        while let Some(current) = at {
            if let Some(source) = &self[current].source {
                return Some(source.chars().skip(offset).take(length).collect());
            }
            at = self[current].parent;
        }
        None
    }

    /// Depth-first visit; the visitor returns whether to descend.
    pub fn accept<F>(&self, root: NodeId, visitor: &mut F)
    where
        F: FnMut(NodeId, &Node) -> bool,
    {
        if visitor(root, &self[root]) {
            // children is cloned so the visitor can borrow the arena
            let children = self[root].children.clone();
            for child in children {
                self.accept(child, visitor);
            }
        }
    }

    /// Nearest enclosing node matching `pred`, starting from the node
    /// itself.
    pub fn find_parent<P>(&self, id: NodeId, pred: P) -> Option<NodeId>
    where
        P: Fn(&NodeKind) -> bool,
    {
        if pred(&self[id].kind) {
            return Some(id);
        }
        self.find_a_parent(id, pred)
    }

    /// Nearest ancestor (starting from the parent) matching `pred`.
    pub fn find_a_parent<P>(&self, id: NodeId, pred: P) -> Option<NodeId>
    where
        P: Fn(&NodeKind) -> bool,
    {
        let mut at = self[id].parent;
        while let Some(current) = at {
            if pred(&self[current].kind) {
                return Some(current);
            }
            at = self[current].parent;
        }
        None
    }

    pub fn first_child_of<P>(&self, id: NodeId, pred: P) -> Option<NodeId>
    where
        P: Fn(&NodeKind) -> bool,
    {
        self[id]
            .children
            .iter()
            .copied()
            .find(|child| pred(&self[*child].kind))
    }

    /// Root-to-leaf chain of nodes enclosing `offset`.
    pub fn node_path(&self, root: NodeId, offset: usize) -> Vec<NodeId> {
        let mut path = Vec::new();
        if !self[root].encloses(offset) {
            return path;
        }
        let mut at = root;
        loop {
            path.push(at);
            let next = self[at]
                .children
                .iter()
                .copied()
                .find(|child| self[*child].encloses(offset));
            match next {
                Some(child) => at = child,
                None => return path,
            }
        }
    }

    /// Narrowest node enclosing `offset`.
    pub fn node_at_offset(&self, root: NodeId, offset: usize) -> Option<NodeId> {
        self.node_path(root, offset).last().copied()
    }

    pub fn is_erroneous(&self, id: NodeId, recursive: bool) -> bool {
        if !self[id].issues.is_empty() {
            return true;
        }
        if recursive {
            let mut found = false;
            self.accept(id, &mut |_, node| {
                found |= !node.issues.is_empty();
                !found
            });
            return found;
        }
        false
    }

    /// All diagnostics in the subtree, ordered by offset.
    pub fn collect_issues(&self, root: NodeId) -> Vec<Diagnostic> {
        let mut out: Vec<Diagnostic> = Vec::new();
        self.accept(root, &mut |_, node| {
            out.extend(node.issues.iter().map(Diagnostic::from));
            true
        });
        out.sort_by_key(|d| (d.offset, d.length));
        out
    }
}

impl Index<NodeId> for NodeArena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}
