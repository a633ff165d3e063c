#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::node::{Issue, LineType, NodeArena, NodeId, NodeKind, Rule};

    fn text_node(arena: &mut NodeArena, offset: usize, length: usize) -> NodeId {
        let id = arena.alloc(NodeKind::Text, offset);
        arena.set_length(id, length);
        id
    }

    fn scene_root(arena: &mut NodeArena, length: usize) -> NodeId {
        let root = arena.alloc(
            NodeKind::Scene {
                is_startup: false,
                is_stats: false,
            },
            0,
        );
        arena.set_length(root, length);
        root
    }

    #[test]
    fn parents_grow_to_enclose_children() {
        let mut arena = NodeArena::new();
        let parent = arena.alloc(NodeKind::CodeBlock, 4);
        let child = text_node(&mut arena, 2, 10);
        arena.add_child(parent, child);
        assert_eq!(arena[parent].offset, 2);
        assert_eq!(arena[parent].end(), 12);
        assert_eq!(arena[child].parent, Some(parent));
    }

    #[test]
    fn growth_propagates_up_the_ancestor_chain() {
        let mut arena = NodeArena::new();
        let root = scene_root(&mut arena, 5);
        let middle = arena.alloc(NodeKind::CodeBlock, 5);
        arena.add_child(root, middle);
        let leaf = text_node(&mut arena, 8, 4);
        arena.add_child(middle, leaf);
        assert_eq!(arena[middle].end(), 12);
        assert_eq!(arena[root].end(), 12);
    }

    #[test]
    fn adopt_detaches_from_previous_parent() {
        let mut arena = NodeArena::new();
        let first = arena.alloc(NodeKind::CodeBlock, 0);
        let second = arena.alloc(NodeKind::CodeBlock, 0);
        let child = text_node(&mut arena, 1, 2);
        arena.add_child(first, child);
        assert_eq!(arena[first].children.len(), 1);

        arena.adopt_child(second, child);
        assert!(arena[first].children.is_empty());
        assert_eq!(arena[second].children, vec![child]);
        assert_eq!(arena[child].parent, Some(second));
    }

    #[test]
    fn text_is_sliced_from_the_sourced_ancestor() {
        let mut arena = NodeArena::new();
        let source = "hello world";
        let root = scene_root(&mut arena, source.chars().count());
        arena.attach_source(root, Arc::from(source));
        let child = text_node(&mut arena, 6, 5);
        arena.add_child(root, child);
        assert_eq!(arena.text_of(child).as_deref(), Some("world"));
        assert_eq!(arena.text_of(root).as_deref(), Some("hello world"));
    }

    #[test]
    fn text_is_char_indexed() {
        let mut arena = NodeArena::new();
        let source = "héllo wörld";
        let root = scene_root(&mut arena, source.chars().count());
        arena.attach_source(root, Arc::from(source));
        let child = text_node(&mut arena, 6, 5);
        arena.add_child(root, child);
        assert_eq!(arena.text_of(child).as_deref(), Some("wörld"));
    }

    #[test]
    fn node_path_and_narrowest_node() {
        let mut arena = NodeArena::new();
        let root = scene_root(&mut arena, 20);
        let line = arena.alloc(
            NodeKind::Line {
                line_type: LineType::Text,
                indent: 0,
            },
            0,
        );
        arena.set_length(line, 10);
        arena.add_child(root, line);
        let word = text_node(&mut arena, 3, 4);
        arena.add_child(line, word);

        let path = arena.node_path(root, 5);
        assert_eq!(path, vec![root, line, word]);
        assert_eq!(arena.node_at_offset(root, 5), Some(word));
        assert_eq!(arena.node_at_offset(root, 15), Some(root));
        assert_eq!(arena.node_at_offset(root, 99), None);
    }

    #[test]
    fn accept_can_prune_descent() {
        let mut arena = NodeArena::new();
        let root = scene_root(&mut arena, 10);
        let block = arena.alloc(NodeKind::CodeBlock, 0);
        arena.set_length(block, 10);
        arena.add_child(root, block);
        let leaf = text_node(&mut arena, 1, 2);
        arena.add_child(block, leaf);

        let mut visited = Vec::new();
        arena.accept(root, &mut |id, node| {
            visited.push(id);
            !matches!(node.kind, NodeKind::CodeBlock)
        });
        assert_eq!(visited, vec![root, block]);
    }

    #[test]
    fn issues_and_erroneous_flags() {
        let mut arena = NodeArena::new();
        let root = scene_root(&mut arena, 10);
        let child = text_node(&mut arena, 2, 3);
        arena.add_child(root, child);
        assert!(!arena.is_erroneous(root, true));

        arena.add_issue(child, Issue::new(Rule::UnknownCommand, 2, 3));
        assert!(arena.is_erroneous(child, false));
        assert!(!arena.is_erroneous(root, false));
        assert!(arena.is_erroneous(root, true));

        let diagnostics = arena.collect_issues(root);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule, "unknown-command");
        assert_eq!(diagnostics[0].offset, 2);
    }

    #[test]
    fn issue_range_can_be_overridden() {
        let mut arena = NodeArena::new();
        let node = text_node(&mut arena, 0, 4);
        arena.add_issue(node, Issue::new(Rule::ExpectedIdentifier, 10, 2));
        let diagnostics = arena.collect_issues(node);
        assert_eq!((diagnostics[0].offset, diagnostics[0].length), (10, 2));
    }

    #[test]
    fn diagnostics_serialize_for_the_boundary() {
        let issue = Issue::new(Rule::MixedIndentation, 4, 2);
        let diagnostic = crate::node::Diagnostic::from(&issue);
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["rule"], "mixed-indentation");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["offset"], 4);
    }

    #[test]
    fn metadata_round_trips() {
        let mut arena = NodeArena::new();
        let root = scene_root(&mut arena, 1);
        arena.set_data(root, "scene-name", "startup");
        assert_eq!(arena.data(root, "scene-name"), Some("startup"));
        assert_eq!(arena.data(root, "missing"), None);
    }

    #[test]
    fn find_a_parent_walks_ancestors() {
        let mut arena = NodeArena::new();
        let root = scene_root(&mut arena, 10);
        let block = arena.alloc(NodeKind::CodeBlock, 0);
        arena.add_child(root, block);
        let leaf = text_node(&mut arena, 0, 1);
        arena.add_child(block, leaf);

        let found = arena.find_a_parent(leaf, |k| matches!(k, NodeKind::Scene { .. }));
        assert_eq!(found, Some(root));
        let none = arena.find_a_parent(leaf, |k| matches!(k, NodeKind::ChoiceCommand { .. }));
        assert_eq!(none, None);

        // find_parent starts from the node itself
        let own = arena.find_parent(block, |k| matches!(k, NodeKind::CodeBlock));
        assert_eq!(own, Some(block));
        let excluded = arena.find_a_parent(block, |k| matches!(k, NodeKind::CodeBlock));
        assert_eq!(excluded, None);
    }
}
