use storyline_core::db::{open_db, open_db_in_memory};
use storyline_core::{
    CompileFlag, Handle, ItemClass, ItemLevel, ItemType, ProjectRepository, ProjectService,
    SqliteProjectRepository, StoredEntry, TreeItem,
};

#[test]
fn create_then_open_restores_the_same_outline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("novel.storyline");

    let expected_order;
    let meta;
    {
        let conn = open_db(&path).unwrap();
        let service = ProjectService::new(SqliteProjectRepository::try_new(&conn).unwrap());
        let mut created = service.create("Night Train", "A. Writer").unwrap();
        assert_eq!(created.summary.created_roots, 4);

        let first = created.tree.add_chapter().unwrap();
        let second = created.tree.add_chapter().unwrap();
        created.tree.add_file(&first).unwrap();
        created.tree.add_file(&second).unwrap();
        created.tree.add_plot().unwrap();
        created.tree.move_down(&first).unwrap();

        service.save(&mut created.tree, &created.meta).unwrap();
        expected_order = created.tree.global_order().to_vec();
        meta = created.meta;
    }

    let conn = open_db(&path).unwrap();
    let service = ProjectService::new(SqliteProjectRepository::try_new(&conn).unwrap());
    let opened = service.open().unwrap();

    assert_eq!(opened.meta, meta);
    assert_eq!(opened.tree.global_order(), expected_order.as_slice());
    assert_eq!(opened.summary.restored, expected_order.len());
    assert_eq!(opened.summary.repairs, 0);
    assert_eq!(opened.summary.created_roots, 0);
    assert_eq!(opened.summary.orphans, 0);
}

#[test]
fn open_empty_database_yields_repaired_tree_and_fresh_meta() {
    let conn = open_db_in_memory().unwrap();
    let service = ProjectService::new(SqliteProjectRepository::try_new(&conn).unwrap());

    let opened = service.open().unwrap();
    assert_eq!(opened.summary.restored, 0);
    assert_eq!(opened.summary.created_roots, 4);
    assert_eq!(opened.tree.len(), 4);
    assert_eq!(opened.meta.draft, 1);
}

#[test]
fn open_repairs_corrupt_storage() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let orphan = Handle::parse("00000000000b2").unwrap();
    repo.save_entries(&[
        StoredEntry {
            handle: Handle::parse("00000000000b1").unwrap(),
            parent: None,
            order: Some(3),
            item: TreeItem::new(
                ItemClass::Container,
                ItemLevel::Root,
                ItemType::Character,
                "Characters",
            ),
        },
        StoredEntry {
            handle: orphan.clone(),
            parent: Some(Handle::parse("00000000000ff").unwrap()),
            order: Some(3),
            item: TreeItem::new(ItemClass::Container, ItemLevel::Item, ItemType::Plot, "Heist"),
        },
    ])
    .unwrap();

    let service = ProjectService::new(repo);
    let opened = service.open().unwrap();

    assert_eq!(opened.summary.dropped_parents, 1);
    assert_eq!(opened.summary.created_roots, 3);
    assert_eq!(opened.summary.repairs, 1);
    let plot_root = opened.tree.roots().get(ItemType::Plot).cloned();
    assert_eq!(opened.tree.get(&orphan).unwrap().parent, plot_root);
    assert_eq!(opened.tree.global_order().len(), 5);
}

#[test]
fn save_sorts_a_stale_tree_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let service = ProjectService::new(SqliteProjectRepository::try_new(&conn).unwrap());
    let mut created = service.create("Draft", "").unwrap();

    let book = created.tree.roots().get(ItemType::Book).cloned().unwrap();
    created
        .tree
        .append(
            None,
            Some(book),
            None,
            TreeItem::new(ItemClass::Container, ItemLevel::Item, ItemType::Book, "Manual"),
        )
        .unwrap();
    assert!(created.tree.is_stale());

    service.save(&mut created.tree, &created.meta).unwrap();
    assert!(!created.tree.is_stale());
    let stored = repo.load_entries().unwrap();
    assert!(stored.iter().all(|entry| entry.order.is_some()));
}

#[test]
fn open_resets_invalid_stored_fields_instead_of_failing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let book = Handle::parse("00000000000c1").unwrap();
    let chapter = Handle::parse("00000000000c2").unwrap();
    let mut damaged = TreeItem::new(ItemClass::Container, ItemLevel::Item, ItemType::Book, " ");
    damaged.number = Some(1000);
    damaged.compile = CompileFlag::NotApplicable;
    repo.save_entries(&[
        StoredEntry {
            handle: book.clone(),
            parent: None,
            order: Some(0),
            item: TreeItem::new(ItemClass::Container, ItemLevel::Root, ItemType::Book, "Book"),
        },
        StoredEntry {
            handle: chapter.clone(),
            parent: Some(book.clone()),
            order: Some(1),
            item: damaged,
        },
    ])
    .unwrap();

    let service = ProjectService::new(repo);
    let opened = service.open().unwrap();

    assert_eq!(opened.summary.reset_fields, 3);
    assert_eq!(opened.summary.dropped_parents, 0);
    let restored = opened.tree.get(&chapter).unwrap();
    assert_eq!(restored.parent, Some(book));
    assert_eq!(restored.item.number, None);
    assert_eq!(restored.item.name, "New Chapter");
    assert_eq!(restored.item.compile, CompileFlag::Yes);
    assert!(restored.item.validate().is_ok());
}
