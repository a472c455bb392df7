use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

use super::model::{Component, Fragment};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("duplicate component id `{0}`")]
    DuplicateId(String),
    #[error("root id `{0}` does not resolve to any component")]
    UnknownRoot(String),
    #[error("component `{parent}` references missing id `{child}`")]
    DanglingReference { parent: String, child: String },
}

/// Checks a tool-produced fragment before it enters aggregation: ids are
/// unique, the root resolves, and every id reachable from the root resolves.
/// A rejected fragment degrades that call to a text result upstream; it is
/// never partially rendered.
pub fn validate_fragment(fragment: &Fragment) -> Result<(), ValidationError> {
    let mut by_id: HashMap<&str, &Component> = HashMap::new();
    for entry in &fragment.components {
        if by_id.insert(entry.id.as_str(), &entry.component).is_some() {
            return Err(ValidationError::DuplicateId(entry.id.clone()));
        }
    }

    if !by_id.contains_key(fragment.root.as_str()) {
        return Err(ValidationError::UnknownRoot(fragment.root.clone()));
    }

    // Breadth-first walk of the reference graph from the root.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::from([fragment.root.as_str()]);
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        // Indexing is safe: ids are only queued after resolving below, and
        // the root was checked above.
        let component = by_id[id];
        for child in component.child_ids() {
            if !by_id.contains_key(child) {
                return Err(ValidationError::DanglingReference {
                    parent: id.to_string(),
                    child: child.to_string(),
                });
            }
            if !seen.contains(child) {
                queue.push_back(child);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::surface::model::{Component, ComponentEntry, Surface, TextContent};

    fn text_entry(id: &str) -> ComponentEntry {
        ComponentEntry::new(id, Component::text(TextContent::literal(id)))
    }

    fn fragment(components: Vec<ComponentEntry>, root: &str) -> Surface {
        Surface {
            surface_id: "test".to_string(),
            components,
            data_model: Vec::new(),
            root: root.to_string(),
        }
    }

    #[test]
    fn accepts_well_formed_fragment() {
        let f = fragment(
            vec![
                ComponentEntry::new(
                    "root",
                    Component::column(vec!["a".to_string(), "b".to_string()]),
                ),
                text_entry("a"),
                text_entry("b"),
            ],
            "root",
        );
        assert!(validate_fragment(&f).is_ok());
    }

    #[test]
    fn rejects_unknown_root() {
        let f = fragment(vec![text_entry("a")], "missing");
        assert!(matches!(
            validate_fragment(&f),
            Err(ValidationError::UnknownRoot(id)) if id == "missing"
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let f = fragment(vec![text_entry("a"), text_entry("a")], "a");
        assert!(matches!(
            validate_fragment(&f),
            Err(ValidationError::DuplicateId(id)) if id == "a"
        ));
    }

    #[test]
    fn rejects_dangling_reference_reachable_from_root() {
        let f = fragment(
            vec![ComponentEntry::new(
                "root",
                Component::column(vec!["gone".to_string()]),
            )],
            "root",
        );
        assert!(matches!(
            validate_fragment(&f),
            Err(ValidationError::DanglingReference { parent, child })
                if parent == "root" && child == "gone"
        ));
    }

    #[test]
    fn rejects_dangling_reference_behind_nested_container() {
        let f = fragment(
            vec![
                ComponentEntry::new("root", Component::column(vec!["row".to_string()])),
                ComponentEntry::new("row", Component::row(vec!["leaf".to_string()])),
            ],
            "root",
        );
        assert!(matches!(
            validate_fragment(&f),
            Err(ValidationError::DanglingReference { parent, .. }) if parent == "row"
        ));
    }

    #[test]
    fn unreachable_nodes_do_not_fail_validation() {
        // Only ids reachable from the root must resolve; an orphan node with
        // a bad reference is inert and renders nothing.
        let f = fragment(
            vec![
                text_entry("root"),
                ComponentEntry::new("orphan", Component::column(vec!["gone".to_string()])),
            ],
            "root",
        );
        assert!(validate_fragment(&f).is_ok());
    }

    #[test]
    fn button_child_reference_is_checked() {
        use crate::server::surface::model::Action;

        let f = fragment(
            vec![ComponentEntry::new(
                "root",
                Component::Button {
                    action: Action {
                        name: "go".to_string(),
                        context: Vec::new(),
                    },
                    child: "label".to_string(),
                },
            )],
            "root",
        );
        assert!(matches!(
            validate_fragment(&f),
            Err(ValidationError::DanglingReference { child, .. }) if child == "label"
        ));
    }
}
