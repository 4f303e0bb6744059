//! Child-list ordering.

use crate::forest::NodeSnapshot;

/// Order children for display: unread branches first, then the rest.
///
/// Relative order within each group is preserved, so repeated calls on the
/// same input produce the same output.
pub fn partition_children(children: Vec<NodeSnapshot>) -> Vec<NodeSnapshot> {
    let (unread, read): (Vec<_>, Vec<_>) =
        children.into_iter().partition(NodeSnapshot::is_unread);

    unread.into_iter().chain(read).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::{Message, NodeId, NodeMeta, NodeSnapshot, UNREAD_TAG};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn child(content: &str, unread: bool) -> NodeSnapshot {
        NodeSnapshot {
            id: NodeId::generate(),
            parent_id: Some(NodeId::generate()),
            child_ids: Vec::new(),
            message: Message::assistant(content),
            meta: if unread {
                NodeMeta::with_tag(UNREAD_TAG)
            } else {
                NodeMeta::default()
            },
            config: None,
            created_at: Utc::now(),
        }
    }

    fn contents(nodes: &[NodeSnapshot]) -> Vec<&str> {
        nodes.iter().map(|n| n.message.content.as_str()).collect()
    }

    #[test]
    fn test_unread_come_first_in_original_order() {
        let children = vec![
            child("c1", true),
            child("c2", false),
            child("c3", true),
        ];

        let ordered = partition_children(children);
        assert_eq!(contents(&ordered), vec!["c1", "c3", "c2"]);
    }

    #[test]
    fn test_partition_is_stable() {
        let children = vec![
            child("a", false),
            child("b", true),
            child("c", false),
            child("d", true),
        ];

        let once = partition_children(children.clone());
        let twice = partition_children(once.clone());
        assert_eq!(contents(&once), vec!["b", "d", "a", "c"]);
        assert_eq!(contents(&once), contents(&twice));
    }

    #[test]
    fn test_partition_preserves_length() {
        let children = vec![child("a", true), child("b", false), child("c", true)];
        assert_eq!(partition_children(children).len(), 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(partition_children(Vec::new()).is_empty());
    }
}
