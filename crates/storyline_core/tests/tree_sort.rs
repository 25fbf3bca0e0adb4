use std::collections::HashSet;
use storyline_core::{
    CompileFlag, Handle, ItemClass, ItemLevel, ItemType, ProjectTree, StoredEntry, TreeItem,
};

fn handle(n: u64) -> Handle {
    Handle::parse(&format!("{n:013x}")).unwrap()
}

fn root(kind: ItemType) -> TreeItem {
    TreeItem::new(ItemClass::Container, ItemLevel::Root, kind, kind.root_name())
}

fn chapter(name: &str) -> TreeItem {
    TreeItem::new(ItemClass::Container, ItemLevel::Item, ItemType::Book, name)
}

fn scene(name: &str) -> TreeItem {
    TreeItem::new(ItemClass::Scene, ItemLevel::File, ItemType::Book, name)
        .with_compile(CompileFlag::Yes)
}

fn assert_permutation(tree: &ProjectTree) {
    let ordered: HashSet<&Handle> = tree.global_order().iter().collect();
    let stored: HashSet<&Handle> = tree.entries().map(|entry| &entry.handle).collect();
    assert_eq!(tree.global_order().len(), tree.len());
    assert_eq!(ordered, stored);
}

#[test]
fn roots_items_then_files_in_visiting_order() {
    let mut tree = ProjectTree::new();
    let book = tree.append(None, None, None, root(ItemType::Book)).unwrap();
    let c1 = tree.append(None, Some(book.clone()), None, chapter("C1")).unwrap();
    let c2 = tree.append(None, Some(book.clone()), None, chapter("C2")).unwrap();
    let f1 = tree.append(None, Some(c1.clone()), None, scene("F1")).unwrap();
    tree.validate();
    tree.sort();

    let roots = tree.roots();
    let expected = vec![
        book,
        roots.get(ItemType::Character).cloned().unwrap(),
        roots.get(ItemType::Plot).cloned().unwrap(),
        roots.get(ItemType::Note).cloned().unwrap(),
        c1,
        c2,
        f1,
    ];
    assert_eq!(tree.global_order(), expected.as_slice());
}

#[test]
fn sort_writes_positions_back_and_is_idempotent() {
    let mut tree = ProjectTree::new();
    tree.validate();
    for _ in 0..3 {
        tree.add_chapter().unwrap();
    }
    tree.add_character().unwrap();

    let first = tree.global_order().to_vec();
    let orders: Vec<Option<i64>> = first
        .iter()
        .map(|handle| tree.get(handle).unwrap().order)
        .collect();
    let expected: Vec<Option<i64>> = (0..first.len() as i64).map(Some).collect();
    assert_eq!(orders, expected);

    let report = tree.sort();
    assert!(report.is_consistent());
    assert_eq!(tree.global_order(), first.as_slice());
    assert!(!tree.is_stale());
}

#[test]
fn stored_orders_win_placement_over_insertion_order() {
    let book = handle(1);
    let early = handle(2);
    let late = handle(3);
    let stored = vec![
        StoredEntry {
            handle: book.clone(),
            parent: None,
            order: Some(0),
            item: root(ItemType::Book),
        },
        StoredEntry {
            handle: late.clone(),
            parent: Some(book.clone()),
            order: Some(2),
            item: chapter("Late"),
        },
        StoredEntry {
            handle: early.clone(),
            parent: Some(book.clone()),
            order: Some(1),
            item: chapter("Early"),
        },
    ];

    let (mut tree, dropped) = ProjectTree::restore(stored).unwrap();
    assert!(dropped.is_empty());
    tree.sort();
    assert_eq!(tree.items_of(&book), [early, late].as_slice());
}

#[test]
fn corrupt_orders_still_produce_a_complete_permutation() {
    let book = handle(1);
    let stored = vec![
        StoredEntry {
            handle: book.clone(),
            parent: None,
            order: Some(5),
            item: root(ItemType::Book),
        },
        StoredEntry {
            handle: handle(2),
            parent: Some(book.clone()),
            order: Some(5),
            item: chapter("Duplicate order"),
        },
        StoredEntry {
            handle: handle(3),
            parent: Some(book.clone()),
            order: Some(-4),
            item: chapter("Negative order"),
        },
        StoredEntry {
            handle: handle(4),
            parent: Some(book.clone()),
            order: Some(10_000),
            item: chapter("Out of range"),
        },
        StoredEntry {
            handle: handle(5),
            parent: Some(handle(3)),
            order: None,
            item: scene("No order"),
        },
    ];

    let (mut tree, _) = ProjectTree::restore(stored).unwrap();
    tree.validate();
    let report = tree.sort();

    assert!(report.is_consistent());
    assert_permutation(&tree);
    assert_eq!(tree.items_of(&book).len(), 3);
    assert_eq!(tree.files_of(&handle(3)), [handle(5)].as_slice());
}

#[test]
fn unregistered_duplicate_root_is_still_visited() {
    let mut tree = ProjectTree::new();
    let first = tree.append(None, None, None, root(ItemType::Plot)).unwrap();
    let second = tree.append(None, None, None, root(ItemType::Plot)).unwrap();
    tree.validate();
    tree.sort();

    assert_eq!(tree.roots().get(ItemType::Plot), Some(&first));
    assert_eq!(tree.root_order().len(), 5);
    assert_eq!(tree.root_order().last(), Some(&second));
    assert_permutation(&tree);
}
