use rusqlite::Connection;
use std::collections::HashMap;
use tracks_core::db::open_db_in_memory;
use tracks_core::{
    AccountService, AuthConfig, AuthScheme, ItemId, ItemKind, NewAccount, PositionError,
    PositionManager, PositionedItem, ReorderInputError, SqliteAccountRepository,
    SqliteItemRepository,
};

fn new_account(conn: &Connection, login: &str) -> i64 {
    let config = AuthConfig::new("change-me", [AuthScheme::Database]).unwrap();
    AccountService::new(SqliteAccountRepository::try_new(conn).unwrap(), config)
        .create_account(NewAccount::with_password(login, "sesame"))
        .unwrap()
        .id
}

fn projects(conn: &Connection, account_id: i64) -> PositionManager<SqliteItemRepository<'_>> {
    PositionManager::new(
        SqliteItemRepository::try_new(conn).unwrap(),
        account_id,
        ItemKind::Project,
    )
}

fn positions(manager: &PositionManager<SqliteItemRepository<'_>>) -> HashMap<ItemId, i64> {
    manager
        .items()
        .unwrap()
        .into_iter()
        .map(|item| (item.id, item.position))
        .collect()
}

fn names(items: &[PositionedItem]) -> Vec<&str> {
    items.iter().map(|item| item.name.as_str()).collect()
}

#[test]
fn append_assigns_consecutive_positions_and_slugs() {
    let conn = open_db_in_memory().unwrap();
    let manager = projects(&conn, new_account(&conn, "jane"));

    let garden = manager.append("Garden").unwrap();
    let tax = manager.append("  Tax Return 2024 ").unwrap();
    let home = manager.append("Home").unwrap();

    assert_eq!(
        (garden.position, tax.position, home.position),
        (1, 2, 3)
    );
    assert_eq!(tax.name, "Tax Return 2024");
    assert_eq!(tax.url_friendly_name, "tax_return_2024");
    assert_eq!(garden.state, "active");

    let err = manager.append("  !! ").unwrap_err();
    assert!(matches!(err, PositionError::InvalidName));
}

#[test]
fn reorder_assigns_positions_in_requested_order() {
    let conn = open_db_in_memory().unwrap();
    let manager = projects(&conn, new_account(&conn, "jane"));
    let a = manager.append("A").unwrap().id;
    let b = manager.append("B").unwrap().id;
    let c = manager.append("C").unwrap().id;

    manager.reorder(&[c, a, b]).unwrap();

    let positions = positions(&manager);
    assert_eq!(positions[&a], 2);
    assert_eq!(positions[&b], 3);
    assert_eq!(positions[&c], 1);
    assert_eq!(names(&manager.items().unwrap()), vec!["C", "A", "B"]);
}

#[test]
fn reorder_with_foreign_id_is_rejected_without_writes() {
    let conn = open_db_in_memory().unwrap();
    let jane = projects(&conn, new_account(&conn, "jane"));
    let bob = projects(&conn, new_account(&conn, "bobby"));
    let a = jane.append("A").unwrap().id;
    let b = jane.append("B").unwrap().id;
    let foreign = bob.append("Other").unwrap().id;
    let before = positions(&jane);

    let err = jane.reorder(&[b, foreign]).unwrap_err();
    assert!(matches!(
        err,
        PositionError::InvalidReorderInput(ReorderInputError::ForeignItem(id)) if id == foreign
    ));

    assert_eq!(positions(&jane), before);
    assert_eq!(positions(&jane)[&a], 1);
    assert_eq!(positions(&bob)[&foreign], 1);
}

#[test]
fn reorder_rejects_duplicates_and_omissions() {
    let conn = open_db_in_memory().unwrap();
    let manager = projects(&conn, new_account(&conn, "jane"));
    let a = manager.append("A").unwrap().id;
    let b = manager.append("B").unwrap().id;
    let c = manager.append("C").unwrap().id;
    let before = positions(&manager);

    let err = manager.reorder(&[c, c, a]).unwrap_err();
    assert!(matches!(
        err,
        PositionError::InvalidReorderInput(ReorderInputError::DuplicateItem(id)) if id == c
    ));

    let err = manager.reorder(&[c, a]).unwrap_err();
    assert!(matches!(
        err,
        PositionError::InvalidReorderInput(ReorderInputError::MissingItems(ref ids)) if ids == &vec![b]
    ));

    assert_eq!(positions(&manager), before);
}

#[test]
fn remove_closes_the_gap() {
    let conn = open_db_in_memory().unwrap();
    let manager = projects(&conn, new_account(&conn, "jane"));
    let a = manager.append("A").unwrap().id;
    let b = manager.append("B").unwrap().id;
    let c = manager.append("C").unwrap().id;

    manager.remove(b).unwrap();

    let positions = positions(&manager);
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[&a], 1);
    assert_eq!(positions[&c], 2);

    let d = manager.append("D").unwrap();
    assert_eq!(d.position, 3);

    let err = manager.remove(b).unwrap_err();
    assert!(matches!(err, PositionError::NotFound { kind: ItemKind::Project, id } if id == b));
}

#[test]
fn projects_and_contexts_are_ordered_independently() {
    let conn = open_db_in_memory().unwrap();
    let account_id = new_account(&conn, "jane");
    let projects = projects(&conn, account_id);
    let contexts = PositionManager::new(
        SqliteItemRepository::try_new(&conn).unwrap(),
        account_id,
        ItemKind::Context,
    );

    projects.append("Garden").unwrap();
    let phone = contexts.append("Phone").unwrap();

    assert_eq!(phone.position, 1);
    assert_eq!(phone.kind, ItemKind::Context);
    assert_eq!(names(&contexts.items().unwrap()), vec!["Phone"]);
}

#[test]
fn navigation_skips_items_in_other_states() {
    let conn = open_db_in_memory().unwrap();
    let manager = projects(&conn, new_account(&conn, "jane"));
    let a = manager.append("A").unwrap();
    let b = manager.append("B").unwrap();
    let c = manager.append("C").unwrap();
    manager.set_state(b.id, "completed").unwrap();

    assert_eq!(manager.next_from(&a).unwrap().unwrap().id, c.id);
    assert_eq!(manager.previous_from(&c).unwrap().unwrap().id, a.id);
    assert!(manager.previous_from(&a).unwrap().is_none());
    assert!(manager.next_from(&c).unwrap().is_none());

    let b = PositionedItem {
        state: "completed".to_string(),
        ..b
    };
    assert!(manager.next_from(&b).unwrap().is_none());
    assert!(manager.previous_from(&b).unwrap().is_none());

    assert_eq!(names(&manager.items_in_state("active").unwrap()), vec!["A", "C"]);
}

#[test]
fn navigation_from_absent_item_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let manager = projects(&conn, new_account(&conn, "jane"));
    let a = manager.append("A").unwrap();
    manager.remove(a.id).unwrap();

    assert!(manager.items().unwrap().is_empty());
    assert!(manager.next_from(&a).unwrap().is_none());
    assert!(manager.previous_from(&a).unwrap().is_none());
}

#[test]
fn set_state_on_missing_item_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let manager = projects(&conn, new_account(&conn, "jane"));

    let err = manager.set_state(42, "hidden").unwrap_err();
    assert!(matches!(err, PositionError::NotFound { id: 42, .. }));
}
