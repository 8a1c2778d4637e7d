use orgbase_core::db::open_db_in_memory;
use orgbase_core::repo::tree_repo::count_nodes;
use orgbase_core::{Hierarchy, HierarchyError, SqliteTreeRepository, TreeNode, TreeRepoError};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn ids(nodes: &[TreeNode]) -> Vec<Uuid> {
    nodes.iter().map(|node| node.id.unwrap()).collect()
}

#[test]
fn chain_reports_children_descendants_and_ancestors() {
    let conn = setup();
    let hierarchy = Hierarchy::new(SqliteTreeRepository::try_new(&conn).unwrap());

    let a = hierarchy.create("A", None).unwrap();
    let b = hierarchy.create("B", a.id).unwrap();
    let c = hierarchy.create("C", b.id).unwrap();

    assert_eq!(ids(&hierarchy.children(&a).unwrap()), vec![b.id.unwrap()]);
    assert_eq!(
        ids(&hierarchy.descendants(&a).unwrap()),
        vec![b.id.unwrap(), c.id.unwrap()]
    );
    assert_eq!(
        ids(&hierarchy.ancestors(&c).unwrap()),
        vec![b.id.unwrap(), a.id.unwrap()]
    );
    assert_eq!(ids(&hierarchy.roots().unwrap()), vec![a.id.unwrap()]);
}

#[test]
fn leaf_and_root_have_empty_results() {
    let conn = setup();
    let hierarchy = Hierarchy::new(SqliteTreeRepository::try_new(&conn).unwrap());

    let root = hierarchy.create("Root", None).unwrap();
    let leaf = hierarchy.create("Leaf", root.id).unwrap();

    assert!(hierarchy.children(&leaf).unwrap().is_empty());
    assert!(hierarchy.descendants(&leaf).unwrap().is_empty());
    assert!(hierarchy.ancestors(&root).unwrap().is_empty());
}

#[test]
fn transient_node_has_no_children_or_descendants() {
    let conn = setup();
    let hierarchy = Hierarchy::new(SqliteTreeRepository::try_new(&conn).unwrap());
    hierarchy.create("Existing", None).unwrap();

    let transient = TreeNode::new("Unsaved");
    assert!(transient.is_transient());
    assert!(hierarchy.children(&transient).unwrap().is_empty());
    assert!(hierarchy.descendants(&transient).unwrap().is_empty());
    assert!(hierarchy.ancestors(&transient).unwrap().is_empty());
}

#[test]
fn children_keep_insertion_order() {
    let conn = setup();
    let hierarchy = Hierarchy::new(SqliteTreeRepository::try_new(&conn).unwrap());

    let root = hierarchy.create("Root", None).unwrap();
    let zulu = hierarchy.create("Zulu", root.id).unwrap();
    let alpha = hierarchy.create("Alpha", root.id).unwrap();
    let mike = hierarchy.create("Mike", root.id).unwrap();

    assert_eq!(
        ids(&hierarchy.children(&root).unwrap()),
        vec![zulu.id.unwrap(), alpha.id.unwrap(), mike.id.unwrap()]
    );
}

#[test]
fn self_parent_is_rejected() {
    let conn = setup();
    let hierarchy = Hierarchy::new(SqliteTreeRepository::try_new(&conn).unwrap());
    let a = hierarchy.create("A", None).unwrap();
    let a_id = a.id.unwrap();

    let err = hierarchy.set_parent(a_id, Some(a_id)).unwrap_err();
    assert!(matches!(
        err,
        HierarchyError::CycleDetected { node, parent } if node == a_id && parent == a_id
    ));
    assert_eq!(hierarchy.get(a_id).unwrap().unwrap().parent, None);
}

#[test]
fn moving_ancestor_under_descendant_is_rejected_and_leaves_parent_unchanged() {
    let conn = setup();
    let hierarchy = Hierarchy::new(SqliteTreeRepository::try_new(&conn).unwrap());

    let a = hierarchy.create("A", None).unwrap();
    let b = hierarchy.create("B", a.id).unwrap();
    let c = hierarchy.create("C", b.id).unwrap();
    let a_id = a.id.unwrap();

    let err = hierarchy.set_parent(a_id, c.id).unwrap_err();
    assert!(matches!(err, HierarchyError::CycleDetected { .. }));
    assert!(err.to_string().contains("loop is not allowed"));

    let stored = hierarchy.get(a_id).unwrap().unwrap();
    assert_eq!(stored.parent, None);
    assert_eq!(ids(&hierarchy.roots().unwrap()), vec![a_id]);
}

#[test]
fn rejected_move_rolls_back_and_later_writes_still_commit() {
    let conn = setup();
    let hierarchy = Hierarchy::new(SqliteTreeRepository::try_new(&conn).unwrap());

    let a = hierarchy.create("A", None).unwrap();
    let b = hierarchy.create("B", a.id).unwrap();
    assert!(hierarchy.set_parent(a.id.unwrap(), b.id).is_err());

    let other = hierarchy.create("Other", None).unwrap();
    let moved = hierarchy.set_parent(b.id.unwrap(), other.id).unwrap();
    assert_eq!(moved.parent, other.id);
    assert!(conn.is_autocommit());
    assert_eq!(count_nodes(&conn).unwrap(), 3);
}

#[test]
fn valid_move_reparents_subtree() {
    let conn = setup();
    let hierarchy = Hierarchy::new(SqliteTreeRepository::try_new(&conn).unwrap());

    let a = hierarchy.create("A", None).unwrap();
    let b = hierarchy.create("B", a.id).unwrap();
    let c = hierarchy.create("C", b.id).unwrap();
    let other = hierarchy.create("Other", None).unwrap();

    let moved = hierarchy.set_parent(b.id.unwrap(), other.id).unwrap();
    assert_eq!(moved.parent, other.id);
    assert!(hierarchy.descendants(&a).unwrap().is_empty());
    assert_eq!(
        ids(&hierarchy.ancestors(&c).unwrap()),
        vec![b.id.unwrap(), other.id.unwrap()]
    );

    let detached = hierarchy.set_parent(b.id.unwrap(), None).unwrap();
    assert!(detached.is_root());
}

#[test]
fn validate_no_cycle_checks_candidate_parent() {
    let conn = setup();
    let hierarchy = Hierarchy::new(SqliteTreeRepository::try_new(&conn).unwrap());

    let a = hierarchy.create("A", None).unwrap();
    let b = hierarchy.create("B", a.id).unwrap();
    let sibling = hierarchy.create("Sibling", None).unwrap();

    let candidate = a.clone().with_parent(b.id);
    assert!(matches!(
        hierarchy.validate_no_cycle(&candidate),
        Err(HierarchyError::CycleDetected { .. })
    ));

    let harmless = a.with_parent(sibling.id);
    assert!(hierarchy.validate_no_cycle(&harmless).is_ok());
}

#[test]
fn unknown_ids_are_reported() {
    let conn = setup();
    let hierarchy = Hierarchy::new(SqliteTreeRepository::try_new(&conn).unwrap());
    let a = hierarchy.create("A", None).unwrap();
    let missing = Uuid::new_v4();

    assert!(matches!(
        hierarchy.create("Orphan", Some(missing)),
        Err(HierarchyError::ParentNotFound(id)) if id == missing
    ));
    assert!(matches!(
        hierarchy.set_parent(missing, a.id),
        Err(HierarchyError::NodeNotFound(id)) if id == missing
    ));
    assert!(matches!(
        hierarchy.set_parent(a.id.unwrap(), Some(missing)),
        Err(HierarchyError::ParentNotFound(id)) if id == missing
    ));
    assert!(matches!(
        hierarchy.delete(missing),
        Err(HierarchyError::NodeNotFound(_))
    ));
    assert_eq!(count_nodes(&conn).unwrap(), 1);
}

#[test]
fn blank_label_is_rejected() {
    let conn = setup();
    let hierarchy = Hierarchy::new(SqliteTreeRepository::try_new(&conn).unwrap());

    assert!(matches!(
        hierarchy.create("   ", None),
        Err(HierarchyError::Invalid(_))
    ));

    let node = hierarchy.create("Keep", None).unwrap();
    assert!(matches!(
        hierarchy.rename(node.id.unwrap(), ""),
        Err(HierarchyError::Invalid(_))
    ));
    hierarchy.rename(node.id.unwrap(), "  Renamed ").unwrap();
    assert_eq!(
        hierarchy.get(node.id.unwrap()).unwrap().unwrap().label,
        "Renamed"
    );
}

#[test]
fn delete_cascades_to_subtree() {
    let conn = setup();
    let hierarchy = Hierarchy::new(SqliteTreeRepository::try_new(&conn).unwrap());

    let a = hierarchy.create("A", None).unwrap();
    let b = hierarchy.create("B", a.id).unwrap();
    let c = hierarchy.create("C", b.id).unwrap();
    let keep = hierarchy.create("Keep", None).unwrap();

    assert_eq!(hierarchy.delete(a.id.unwrap()).unwrap(), 3);
    assert!(hierarchy.get(b.id.unwrap()).unwrap().is_none());
    assert!(hierarchy.get(c.id.unwrap()).unwrap().is_none());
    assert_eq!(ids(&hierarchy.roots().unwrap()), vec![keep.id.unwrap()]);
}

#[test]
fn ancestors_detect_loop_in_stored_links() {
    let conn = setup();
    let hierarchy = Hierarchy::new(SqliteTreeRepository::try_new(&conn).unwrap());

    let a = hierarchy.create("A", None).unwrap();
    let b = hierarchy.create("B", a.id).unwrap();
    // Bypass the service to corrupt the stored graph.
    conn.execute(
        "UPDATE tree_nodes SET parent_uuid = ?1 WHERE node_uuid = ?2;",
        [b.id.unwrap().to_string(), a.id.unwrap().to_string()],
    )
    .unwrap();

    let b = hierarchy.get(b.id.unwrap()).unwrap().unwrap();
    assert!(matches!(
        hierarchy.ancestors(&b),
        Err(HierarchyError::CorruptedTree(_))
    ));
}

#[test]
fn malformed_stored_uuid_is_reported_as_invalid_data() {
    let conn = setup();
    let hierarchy = Hierarchy::new(SqliteTreeRepository::try_new(&conn).unwrap());
    conn.execute(
        "INSERT INTO tree_nodes (node_uuid, parent_uuid, label) VALUES ('not-a-uuid', NULL, 'Bad');",
        [],
    )
    .unwrap();

    match hierarchy.roots().unwrap_err() {
        HierarchyError::Repo(TreeRepoError::InvalidData(message)) => {
            assert!(message.contains("tree_nodes.node_uuid"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(SqliteTreeRepository::try_new(&conn).is_err());
}
