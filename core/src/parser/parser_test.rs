#[cfg(test)]
mod tests {
    use url::Url;

    use crate::doc::TextDocument;
    use crate::node::{IfKeyword, LineType, NodeId, NodeKind};
    use crate::parser::{parse_scene, Scene};

    fn parse_named(text: &str, scene: &str) -> Scene {
        let uri = Url::parse(&format!("file:///project/{scene}.txt")).unwrap();
        parse_scene(&TextDocument::new(uri, 1, text))
    }

    fn parse(text: &str) -> Scene {
        parse_named(text, "startup")
    }

    fn rules(scene: &Scene) -> Vec<&'static str> {
        scene.diagnostics().iter().map(|d| d.rule).collect()
    }

    fn find_nodes<P>(scene: &Scene, pred: P) -> Vec<NodeId>
    where
        P: Fn(&NodeKind) -> bool,
    {
        let mut out = Vec::new();
        scene.arena.accept(scene.root, &mut |id, node| {
            if pred(&node.kind) {
                out.push(id);
            }
            true
        });
        out
    }

    #[test]
    fn clean_startup_scene_has_no_diagnostics() {
        let scene = parse("*create n 0\n*set n 5+5");
        assert_eq!(scene.diagnostics(), vec![]);
    }

    #[test]
    fn every_node_round_trips_its_text() {
        let source = "*create mood 50\n*choice\n\t#Smile ${name}!\n\t\t*set mood %+ 10\n\t\tYou smile.\n\t#Frown\n\t\t*set mood %-10\nDone.";
        let scene = parse(source);
        let chars: Vec<char> = source.chars().collect();
        scene.arena.accept(scene.root, &mut |id, node| {
            let expected: String = chars[node.offset..node.end()].iter().collect();
            assert_eq!(scene.text_of(id).as_deref(), Some(expected.as_str()));
            true
        });
    }

    #[test]
    fn child_ranges_stay_inside_parents() {
        let source = "*if score > 10\n\tYou win @{fast quickly|slowly}.\n*else\n\tNothing.";
        let scene = parse(source);
        scene.arena.accept(scene.root, &mut |_, node| {
            for child in &node.children {
                let child = &scene.arena[*child];
                assert!(child.offset >= node.offset, "child starts before parent");
                assert!(child.end() <= node.end(), "child ends after parent");
            }
            true
        });
    }

    #[test]
    fn line_types_are_tagged() {
        let scene = parse("plain prose\n*set n 1\n*comment note");
        let lines = find_nodes(&scene, |k| matches!(k, NodeKind::Line { .. }));
        let types: Vec<LineType> = lines
            .iter()
            .map(|id| match scene.arena[*id].kind {
                NodeKind::Line { line_type, .. } => line_type,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(
            types,
            vec![LineType::Text, LineType::ChoiceScript, LineType::Comment]
        );
    }

    #[test]
    fn empty_line_is_a_prose_line() {
        let scene = parse("\n");
        let lines = find_nodes(&scene, |k| matches!(k, NodeKind::Line { .. }));
        assert_eq!(lines.len(), 1);
        assert!(matches!(
            scene.arena[lines[0]].kind,
            NodeKind::Line {
                line_type: LineType::Text,
                ..
            }
        ));
    }

    #[test]
    fn choice_collects_options_and_bodies() {
        let scene = parse("*choice\n\t#One\n\t\tFirst.\n\t#Two\n\t\tSecond.");
        assert_eq!(scene.diagnostics(), vec![]);

        let choices = find_nodes(&scene, |k| matches!(k, NodeKind::ChoiceCommand { .. }));
        assert_eq!(choices.len(), 1);
        let options = find_nodes(&scene, |k| matches!(k, NodeKind::ChoiceOption));
        assert_eq!(options.len(), 2);
        // each option owns its indented body
        for option in options {
            let blocks = scene
                .arena
                .first_child_of(option, |k| matches!(k, NodeKind::CodeBlock));
            assert!(blocks.is_some());
        }
    }

    #[test]
    fn fake_choice_is_tagged() {
        let scene = parse("*fake_choice\n\t#A\n\t#B");
        let choices = find_nodes(&scene, |k| matches!(k, NodeKind::ChoiceCommand { fake: true }));
        assert_eq!(choices.len(), 1);
        assert_eq!(scene.diagnostics(), vec![]);
    }

    #[test]
    fn empty_choice_is_flagged() {
        let scene = parse("*choice\nAfter");
        assert!(rules(&scene).contains(&"expected-choice-option"));
    }

    #[test]
    fn prose_inside_choice_is_flagged() {
        let scene = parse("*choice\n\tnot an option");
        assert!(rules(&scene).contains(&"expected-choice-option"));
    }

    #[test]
    fn if_chain_nests_under_the_first_link() {
        let scene = parse("*if n > 1\n\tA\n*elsif n < 1\n\tB\n*else\n\tC\nAfter");
        assert_eq!(scene.diagnostics(), vec![]);

        let ifs = find_nodes(&scene, |k| matches!(k, NodeKind::IfCommand { .. }));
        assert_eq!(ifs.len(), 3);
        let top = ifs[0];
        assert!(matches!(
            scene.arena[top].kind,
            NodeKind::IfCommand {
                keyword: IfKeyword::If
            }
        ));
        // the elsif is a child of the if, the else a child of the elsif
        let elsif = scene
            .arena
            .first_child_of(top, |k| {
                matches!(k, NodeKind::IfCommand { keyword: IfKeyword::ElseIf })
            })
            .expect("chained elsif");
        assert!(scene
            .arena
            .first_child_of(elsif, |k| {
                matches!(k, NodeKind::IfCommand { keyword: IfKeyword::Else })
            })
            .is_some());

        // the trailing prose line is back at scene level
        let lines = scene.arena[scene.root].children.clone();
        let last = *lines.last().unwrap();
        assert!(matches!(
            scene.arena[last].kind,
            NodeKind::Line {
                line_type: LineType::Text,
                ..
            }
        ));
    }

    #[test]
    fn if_without_matching_continuation_ends_the_chain() {
        let scene = parse("*if n > 1\n\tA\n*set n 2");
        let ifs = find_nodes(&scene, |k| matches!(k, NodeKind::IfCommand { .. }));
        assert_eq!(ifs.len(), 1);
        let sets = find_nodes(&scene, |k| matches!(k, NodeKind::SetCommand));
        assert_eq!(sets.len(), 1);
        // the *set line is not inside the if
        assert!(scene
            .arena
            .find_a_parent(sets[0], |k| matches!(k, NodeKind::IfCommand { .. }))
            .is_none());
    }

    #[test]
    fn flow_commands_carry_references() {
        let scene = parse("*label camp\n*goto camp\n*goto_scene forest clearing\n*return");
        assert_eq!(scene.diagnostics(), vec![]);
        let scene_refs = find_nodes(&scene, |k| matches!(k, NodeKind::SceneRef { .. }));
        assert_eq!(scene_refs.len(), 1);
        assert_eq!(
            scene.arena[scene_refs[0]].kind.name(),
            Some("forest")
        );
        let label_refs = find_nodes(&scene, |k| matches!(k, NodeKind::LabelRef { .. }));
        assert_eq!(label_refs.len(), 2);
    }

    #[test]
    fn scene_list_entries_are_scene_refs() {
        let scene = parse("*scene_list\n\tstartup\n\tforest");
        assert_eq!(scene.diagnostics(), vec![]);
        let refs = find_nodes(&scene, |k| matches!(k, NodeKind::SceneRef { .. }));
        let names: Vec<&str> = refs
            .iter()
            .filter_map(|id| scene.arena[*id].kind.name())
            .collect();
        assert_eq!(names, vec!["startup", "forest"]);
    }

    #[test]
    fn initial_commands_sour_after_first_non_initial() {
        let scene = parse("*title My Game\n*create n 0\n*set n 1\n*create m 1");
        let rules = rules(&scene);
        assert_eq!(
            rules,
            vec!["invalid-initial-command"],
            "only the create after *set is flagged"
        );
    }

    #[test]
    fn initial_commands_are_invalid_outside_startup() {
        let scene = parse_named("*title Elsewhere", "chapter_1");
        assert_eq!(rules(&scene), vec!["invalid-initial-command"]);
    }

    #[test]
    fn comments_do_not_end_the_initial_section() {
        let scene = parse("*title My Game\n*comment remember to rename\n*create n 0");
        assert_eq!(scene.diagnostics(), vec![]);
    }

    #[test]
    fn reserved_variable_prefix_is_flagged() {
        let scene = parse("*temp choice_var \"x\"");
        let diagnostics = scene.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule, "reserved-variable-prefix");
    }

    #[test]
    fn unknown_command_still_produces_a_node() {
        let scene = parse_named("*frobnicate now", "chapter_1");
        let commands = find_nodes(&scene, |k| matches!(k, NodeKind::StandardCommand { .. }));
        assert_eq!(commands.len(), 1);
        assert_eq!(scene.arena[commands[0]].kind.name(), Some("frobnicate"));
        let diagnostics = scene.diagnostics();
        assert_eq!(diagnostics[0].rule, "unknown-command");
        assert!(diagnostics[0].message.contains("frobnicate"));
    }

    #[test]
    fn duplicate_title_is_flagged() {
        let scene = parse("*title One\n*title Two");
        assert!(rules(&scene).contains(&"duplicate-unique-command"));
    }

    #[test]
    fn tab_indentation_sets_the_unit() {
        let scene = parse("*choice\n\t#One\n\t\tBody");
        assert_eq!(scene.diagnostics(), vec![]);
        let lines = find_nodes(&scene, |k| {
            matches!(k, NodeKind::Line { indent: 2, .. })
        });
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn two_space_indentation_sets_the_unit() {
        let scene = parse("*choice\n  #One\n    Body");
        assert_eq!(scene.diagnostics(), vec![]);
    }

    #[test]
    fn mixed_tabs_and_spaces_in_one_run() {
        let scene = parse("*choice\n\t #One\n\t\tBody");
        assert!(rules(&scene).contains(&"mixed-indentation"));
    }

    #[test]
    fn indent_style_switch_is_flagged() {
        let scene = parse("*choice\n\t#One\n  Body");
        assert!(rules(&scene).contains(&"mixed-indentation"));
    }

    #[test]
    fn over_indented_line_is_flagged() {
        let scene = parse("*choice\n\t#One\n\t\t\tWay too deep");
        assert!(rules(&scene).contains(&"indentation-too-deep"));
    }

    #[test]
    fn multireplace_in_prose_parses_cleanly() {
        let scene = parse("You are @{brave bold|timid} today.");
        assert_eq!(scene.diagnostics(), vec![]);
        let multis = find_nodes(&scene, |k| matches!(k, NodeKind::MultiReplace));
        assert_eq!(multis.len(), 1);
        let options = find_nodes(&scene, |k| matches!(k, NodeKind::MultiReplaceOption));
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn multireplace_with_one_option_is_flagged() {
        let scene = parse("You are @{brave bold}.");
        assert_eq!(rules(&scene), vec!["not-enough-multireplace-options"]);
    }

    #[test]
    fn replacement_in_prose() {
        let scene = parse("Hello ${name}!");
        assert_eq!(scene.diagnostics(), vec![]);
        let replacements = find_nodes(&scene, |k| matches!(k, NodeKind::VariableReplacement));
        assert_eq!(replacements.len(), 1);
    }

    #[test]
    fn triple_bang_replacement_is_ignored_text() {
        let scene = parse("Hello $!!!{name} there");
        assert_eq!(scene.diagnostics(), vec![]);
        let replacements = find_nodes(&scene, |k| matches!(k, NodeKind::VariableReplacement));
        assert!(replacements.is_empty());
    }

    #[test]
    fn scene_root_metadata_and_classification() {
        let scene = parse("Hello");
        assert!(scene.is_startup());
        assert_eq!(scene.arena.data(scene.root, "scene-name"), Some("startup"));
        let other = parse_named("Hello", "choicescript_stats");
        assert!(matches!(
            other.arena[other.root].kind,
            NodeKind::Scene {
                is_startup: false,
                is_stats: true
            }
        ));
    }
}
