//! Scope tree and symbol lookup for one parsed scene.
//!
//! A single walk over the scene tree collects declarations into nested
//! scopes: the scene itself is the global scope and every `*choice` body
//! opens a child scope. Lookup walks from the innermost scope outward,
//! so inner declarations shadow outer ones.

use rustc_hash::FxHashSet;

use choicescript_core::node::{NodeId, NodeKind};
use choicescript_core::parser::Scene;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Variable,
    Label,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    /// Textual initial value, when the declaration carries one.
    pub value: Option<String>,
    /// The declaring node in the scene tree.
    pub node: NodeId,
    pub kind: ReferenceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(u32);

impl ScopeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub struct Scope {
    pub offset: usize,
    pub length: usize,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub symbols: Vec<Symbol>,
}

impl Scope {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    fn encloses(&self, offset: usize) -> bool {
        offset >= self.offset && offset <= self.end()
    }
}

#[derive(Debug)]
pub struct Symbols {
    scopes: Vec<Scope>,
    global: ScopeId,
}

impl Symbols {
    /// Build the scope tree for a scene in one pass.
    pub fn from_scene(scene: &Scene) -> Self {
        let arena = &scene.arena;
        let root = &arena[scene.root];
        let mut symbols = Symbols {
            scopes: vec![Scope {
                offset: root.offset,
                length: root.length,
                parent: None,
                children: Vec::new(),
                symbols: Vec::new(),
            }],
            global: ScopeId(0),
        };

        arena.accept(scene.root, &mut |id, node| {
            match &node.kind {
                NodeKind::ChoiceCommand { .. } => {
                    symbols.push_scope(node.offset, node.length);
                }
                NodeKind::VariableDeclaration { .. } => {
                    if let Some(symbol) = declaration_symbol(scene, id, ReferenceKind::Variable) {
                        symbols.insert(node.offset, symbol);
                    }
                }
                NodeKind::LabelDeclaration => {
                    if let Some(symbol) = declaration_symbol(scene, id, ReferenceKind::Label) {
                        symbols.insert(node.offset, symbol);
                    }
                }
                _ => {}
            }
            true
        });
        symbols
    }

    pub fn global_scope(&self) -> &Scope {
        &self.scopes[self.global.index()]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    fn push_scope(&mut self, offset: usize, length: usize) -> ScopeId {
        let parent = self.innermost_at(offset);
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            offset,
            length,
            parent: Some(parent),
            children: Vec::new(),
            symbols: Vec::new(),
        });
        self.scopes[parent.index()].children.push(id);
        id
    }

    fn insert(&mut self, offset: usize, symbol: Symbol) {
        let scope = self.innermost_at(offset);
        self.scopes[scope.index()].symbols.push(symbol);
    }

    /// Narrowest scope enclosing `offset`; falls back to the global
    /// scope for out-of-range offsets.
    fn innermost_at(&self, offset: usize) -> ScopeId {
        let mut at = self.global;
        loop {
            let next = self.scopes[at.index()]
                .children
                .iter()
                .copied()
                .find(|child| self.scopes[child.index()].encloses(offset));
            match next {
                Some(child) => at = child,
                None => return at,
            }
        }
    }

    /// Every symbol visible at `offset`, innermost first; a shadowed
    /// outer symbol of the same name and kind is omitted.
    pub fn find_symbols_at_offset(&self, offset: usize) -> Vec<&Symbol> {
        let mut out = Vec::new();
        let mut seen: FxHashSet<(&str, ReferenceKind)> = FxHashSet::default();
        let mut at = Some(self.innermost_at(offset));
        while let Some(id) = at {
            let scope = &self.scopes[id.index()];
            for symbol in &scope.symbols {
                if seen.insert((symbol.name.as_str(), symbol.kind)) {
                    out.push(symbol);
                }
            }
            at = scope.parent;
        }
        out
    }

    /// Resolve a name at an offset, innermost declaration winning.
    pub fn find_symbol(&self, name: &str, kind: ReferenceKind, offset: usize) -> Option<&Symbol> {
        let mut at = Some(self.innermost_at(offset));
        while let Some(id) = at {
            let scope = &self.scopes[id.index()];
            if let Some(symbol) = scope
                .symbols
                .iter()
                .find(|s| s.kind == kind && s.name == name)
            {
                return Some(symbol);
            }
            at = scope.parent;
        }
        None
    }

    /// Resolve the binding an occurrence node refers to.
    pub fn find_symbol_from_node(&self, scene: &Scene, node: NodeId) -> Option<&Symbol> {
        let (name, kind) = occurrence_of(scene, node)?;
        self.find_symbol(name, kind, scene.arena[node].offset)
    }

    /// Whether `node` is an occurrence of exactly this binding. This is
    /// the primitive find-references is built on.
    pub fn matches_symbol(&self, scene: &Scene, node: NodeId, symbol: &Symbol) -> bool {
        match self.find_symbol_from_node(scene, node) {
            Some(resolved) => resolved.node == symbol.node && resolved.kind == symbol.kind,
            None => false,
        }
    }
}

/// Name and namespace of a node that can refer to a binding.
fn occurrence_of(scene: &Scene, node: NodeId) -> Option<(&str, ReferenceKind)> {
    match &scene.arena[node].kind {
        NodeKind::Variable { name } | NodeKind::Identifier { name } => {
            Some((name, ReferenceKind::Variable))
        }
        NodeKind::Label { name } | NodeKind::LabelRef { name } => {
            Some((name, ReferenceKind::Label))
        }
        _ => None,
    }
}

fn declaration_symbol(scene: &Scene, declaration: NodeId, kind: ReferenceKind) -> Option<Symbol> {
    let arena = &scene.arena;
    let name_node = arena.first_child_of(declaration, |k| {
        matches!(k, NodeKind::Variable { .. } | NodeKind::Label { .. })
    })?;
    let name = arena[name_node].kind.name()?.to_string();
    let value = arena
        .first_child_of(declaration, |k| k.is_expression())
        .and_then(|value| arena.text_of(value));
    Some(Symbol {
        name,
        value,
        node: declaration,
        kind,
    })
}
