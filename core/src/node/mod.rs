mod arena;
mod issue;
mod kind;

#[cfg(test)]
mod node_test;

pub use arena::{Node, NodeArena, NodeId};
pub use issue::{Diagnostic, Issue, Rule, Severity};
pub use kind::{ChoiceScriptType, IfKeyword, LineType, NodeKind};
