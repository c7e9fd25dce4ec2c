use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use tracks_core::db::open_db_in_memory;
use tracks_core::{
    Account, AccountId, AccountService, AuthConfig, AuthScheme, DeferredActivationScheduler,
    FixedClock, NewAccount, RepoError, RepoResult, SqliteAccountRepository, SqliteTodoRepository,
    Todo, TodoId, TodoRepository, TodoService, TodoState, TodoValidationError,
};

fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn new_account(conn: &Connection, login: &str, utc_offset_minutes: i32) -> Account {
    let config = AuthConfig::new("change-me", [AuthScheme::Database]).unwrap();
    AccountService::new(SqliteAccountRepository::try_new(conn).unwrap(), config)
        .create_account(NewAccount {
            utc_offset_minutes,
            ..NewAccount::with_password(login, "sesame")
        })
        .unwrap()
}

fn todos(conn: &Connection) -> TodoService<SqliteTodoRepository<'_>> {
    TodoService::new(SqliteTodoRepository::try_new(conn).unwrap())
}

fn scheduler(conn: &Connection) -> DeferredActivationScheduler<SqliteTodoRepository<'_>> {
    DeferredActivationScheduler::new(SqliteTodoRepository::try_new(conn).unwrap())
}

#[test]
fn activates_todos_shown_on_or_before_today() {
    let conn = open_db_in_memory().unwrap();
    let account = new_account(&conn, "jane", 0);
    let todos = todos(&conn);
    let yesterday = todos.defer_todo(account.id, "Call bank", utc(2024, 1, 9, 0)).unwrap();
    let today = todos.defer_todo(account.id, "Pay rent", utc(2024, 1, 10, 0)).unwrap();
    let later_today = todos.defer_todo(account.id, "Water plants", utc(2024, 1, 10, 8)).unwrap();
    let tomorrow = todos.defer_todo(account.id, "File taxes", utc(2024, 1, 11, 0)).unwrap();

    let report = scheduler(&conn)
        .activate_ready(&account, utc(2024, 1, 10, 12))
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.activated, vec![yesterday.id, today.id]);

    let reloaded = todos.get_todo(account.id, yesterday.id).unwrap().unwrap();
    assert_eq!(reloaded.state, TodoState::Active);
    assert_eq!(reloaded.show_from, yesterday.show_from);

    let pending: Vec<_> = todos
        .list_deferred(account.id)
        .unwrap()
        .into_iter()
        .map(|todo| todo.id)
        .collect();
    assert_eq!(pending, vec![later_today.id, tomorrow.id]);
}

#[test]
fn second_pass_has_nothing_left_to_activate() {
    let conn = open_db_in_memory().unwrap();
    let account = new_account(&conn, "jane", 0);
    todos(&conn)
        .defer_todo(account.id, "Call bank", utc(2024, 1, 9, 0))
        .unwrap();
    let clock = FixedClock(utc(2024, 1, 10, 12));

    let first = scheduler(&conn).activate_ready_now(&account, &clock).unwrap();
    let second = scheduler(&conn).activate_ready_now(&account, &clock).unwrap();

    assert_eq!(first.activated.len(), 1);
    assert!(second.activated.is_empty());
    assert!(second.is_clean());
}

#[test]
fn start_of_day_follows_account_utc_offset() {
    let conn = open_db_in_memory().unwrap();
    let sydney = new_account(&conn, "sydney", 600);
    let london = new_account(&conn, "london", 0);
    let todos = todos(&conn);
    // Local midnight of 2024-01-11 at UTC+10.
    let show_from = utc(2024, 1, 10, 14);
    let east = todos.defer_todo(sydney.id, "Morning run", show_from).unwrap();
    let west = todos.defer_todo(london.id, "Morning run", show_from).unwrap();

    let now = utc(2024, 1, 10, 15);
    let east_report = scheduler(&conn).activate_ready(&sydney, now).unwrap();
    let west_report = scheduler(&conn).activate_ready(&london, now).unwrap();

    assert_eq!(east_report.activated, vec![east.id]);
    assert!(west_report.activated.is_empty());
    let still_deferred = todos.get_todo(london.id, west.id).unwrap().unwrap();
    assert_eq!(still_deferred.state, TodoState::Deferred);
}

#[test]
fn activation_is_scoped_to_the_account() {
    let conn = open_db_in_memory().unwrap();
    let jane = new_account(&conn, "jane", 0);
    let bob = new_account(&conn, "bobby", 0);
    let todos = todos(&conn);
    let bobs = todos.defer_todo(bob.id, "Bob's errand", utc(2024, 1, 1, 0)).unwrap();

    let report = scheduler(&conn).activate_ready(&jane, utc(2024, 1, 10, 12)).unwrap();

    assert!(report.activated.is_empty());
    let untouched = todos.get_todo(bob.id, bobs.id).unwrap().unwrap();
    assert_eq!(untouched.state, TodoState::Deferred);
    assert!(todos.get_todo(jane.id, bobs.id).unwrap().is_none());
}

#[test]
fn deferred_todo_requires_show_from() {
    let conn = open_db_in_memory().unwrap();
    let account = new_account(&conn, "jane", 0);
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let err = repo
        .create_todo(&Todo {
            id: 0,
            account_id: account.id,
            description: "Someday".to_string(),
            state: TodoState::Deferred,
            show_from: None,
            created_at: 0,
            completed_at: None,
        })
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::TodoValidation(TodoValidationError::DeferredWithoutShowFrom)
    ));
    assert!(repo.list_deferred(account.id).unwrap().is_empty());
}

#[test]
fn activating_a_non_deferred_todo_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let account = new_account(&conn, "jane", 0);
    let active = todos(&conn).create_todo(account.id, "Now").unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let err = repo.activate_todo(account.id, active.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "todo", id } if id == active.id));
}

/// Todo store that refuses to activate one chosen todo.
struct RefusesOne<'conn> {
    inner: SqliteTodoRepository<'conn>,
    refused: TodoId,
}

impl TodoRepository for RefusesOne<'_> {
    fn create_todo(&self, todo: &Todo) -> RepoResult<Todo> {
        self.inner.create_todo(todo)
    }

    fn get_todo(&self, account_id: AccountId, id: TodoId) -> RepoResult<Option<Todo>> {
        self.inner.get_todo(account_id, id)
    }

    fn list_deferred(&self, account_id: AccountId) -> RepoResult<Vec<Todo>> {
        self.inner.list_deferred(account_id)
    }

    fn list_deferred_ready(&self, account_id: AccountId, cutoff_ms: i64) -> RepoResult<Vec<Todo>> {
        self.inner.list_deferred_ready(account_id, cutoff_ms)
    }

    fn activate_todo(&self, account_id: AccountId, id: TodoId) -> RepoResult<()> {
        if id == self.refused {
            return Err(RepoError::InvalidData("row locked".to_string()));
        }
        self.inner.activate_todo(account_id, id)
    }

    fn complete_todo(
        &self,
        account_id: AccountId,
        id: TodoId,
        completed_at_ms: i64,
    ) -> RepoResult<()> {
        self.inner.complete_todo(account_id, id, completed_at_ms)
    }

    fn list_completed(&self, account_id: AccountId) -> RepoResult<Vec<Todo>> {
        self.inner.list_completed(account_id)
    }

    fn list_completed_since(&self, account_id: AccountId, since_ms: i64) -> RepoResult<Vec<Todo>> {
        self.inner.list_completed_since(account_id, since_ms)
    }

    fn list_completed_until(&self, account_id: AccountId, until_ms: i64) -> RepoResult<Vec<Todo>> {
        self.inner.list_completed_until(account_id, until_ms)
    }
}

#[test]
fn one_failed_activation_does_not_undo_the_others() {
    let conn = open_db_in_memory().unwrap();
    let account = new_account(&conn, "jane", 0);
    let todos = todos(&conn);
    let first = todos.defer_todo(account.id, "Call bank", utc(2024, 1, 7, 0)).unwrap();
    let stuck = todos.defer_todo(account.id, "Pay rent", utc(2024, 1, 8, 0)).unwrap();
    let last = todos.defer_todo(account.id, "File taxes", utc(2024, 1, 9, 0)).unwrap();

    let scheduler = DeferredActivationScheduler::new(RefusesOne {
        inner: SqliteTodoRepository::try_new(&conn).unwrap(),
        refused: stuck.id,
    });
    let report = scheduler.activate_ready(&account, utc(2024, 1, 10, 12)).unwrap();

    assert!(!report.is_clean());
    assert_eq!(report.activated, vec![first.id, last.id]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].todo_id, stuck.id);
    assert!(matches!(report.failed[0].error, RepoError::InvalidData(_)));

    let state_of = |id| todos.get_todo(account.id, id).unwrap().unwrap().state;
    assert_eq!(state_of(first.id), TodoState::Active);
    assert_eq!(state_of(last.id), TodoState::Active);
    assert_eq!(state_of(stuck.id), TodoState::Deferred);
}
