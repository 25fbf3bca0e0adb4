use rusqlite::Connection;
use storyline_core::db::open_db_in_memory;
use storyline_core::{
    CompileFlag, Handle, ItemClass, ItemLevel, ItemSubType, ItemType, ProjectMeta,
    ProjectRepoError, ProjectRepository, SqliteProjectRepository, StoredEntry, TreeItem,
};

fn handle(n: u64) -> Handle {
    Handle::parse(&format!("{n:013x}")).unwrap()
}

fn sample_entries() -> Vec<StoredEntry> {
    let mut chapter = TreeItem::new(ItemClass::Container, ItemLevel::Item, ItemType::Book, "Dawn")
        .with_subtype(ItemSubType::Chapter);
    chapter.number = Some(1);
    chapter.comment = "rewrite opening".to_string();

    vec![
        StoredEntry {
            handle: handle(1),
            parent: None,
            order: Some(0),
            item: TreeItem::new(ItemClass::Container, ItemLevel::Root, ItemType::Book, "Book"),
        },
        StoredEntry {
            handle: handle(3),
            parent: Some(handle(2)),
            order: Some(-7),
            item: TreeItem::new(ItemClass::Scene, ItemLevel::File, ItemType::Book, "Harbor")
                .with_compile(CompileFlag::No),
        },
        StoredEntry {
            handle: handle(2),
            parent: Some(handle(1)),
            order: None,
            item: chapter,
        },
    ]
}

#[test]
fn try_new_requires_migrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    match SqliteProjectRepository::try_new(&conn) {
        Err(ProjectRepoError::UninitializedConnection {
            actual_version, ..
        }) => assert_eq!(actual_version, 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection must be rejected"),
    }
}

#[test]
fn entries_round_trip_in_saved_order_with_stale_orders() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let entries = sample_entries();

    repo.save_entries(&entries).unwrap();
    assert_eq!(repo.load_entries().unwrap(), entries);
}

#[test]
fn save_entries_replaces_previous_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    repo.save_entries(&sample_entries()).unwrap();

    let kept = vec![sample_entries().remove(0)];
    repo.save_entries(&kept).unwrap();
    assert_eq!(repo.load_entries().unwrap(), kept);
}

#[test]
fn meta_is_absent_until_saved_and_upserts() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    assert_eq!(repo.load_meta().unwrap(), None);

    let mut meta = ProjectMeta::new("Night Train", "A. Writer");
    repo.save_meta(&meta).unwrap();
    meta.draft = 2;
    meta.title = "Night Train II".to_string();
    repo.save_meta(&meta).unwrap();

    assert_eq!(repo.load_meta().unwrap(), Some(meta));
}

#[test]
fn malformed_rows_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    conn.execute(
        "INSERT INTO tree_entries (
            handle, parent_handle, sort_order, item_class, item_level, item_type,
            sub_type, name, number, compile, comment, row_seq
        ) VALUES ('not-a-handle', NULL, 0, 'container', 'root', 'book', NULL, 'Book', NULL, 'yes', '', 0);",
        [],
    )
    .unwrap();

    assert!(matches!(
        repo.load_entries(),
        Err(ProjectRepoError::InvalidData(_))
    ));
}

#[test]
fn unknown_tag_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    conn.execute(
        "INSERT INTO tree_entries (
            handle, parent_handle, sort_order, item_class, item_level, item_type,
            sub_type, name, number, compile, comment, row_seq
        ) VALUES ('0000000000001', NULL, 0, 'container', 'root', 'poem', NULL, 'Book', NULL, 'yes', '', 0);",
        [],
    )
    .unwrap();

    let err = repo.load_entries().unwrap_err();
    assert!(err.to_string().contains("item_type"));
}
