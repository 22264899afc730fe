use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::OnceCell;
use socialnet_core::db::{open_db, open_db_in_memory};
use socialnet_core::{
    load_users, ImportOptions, SqliteStatusRepository, SqliteUserRepository, Status,
    StatusRepository, User, UserRepository,
};
use std::cell::RefCell;

// Records are kept per thread so tests running in parallel only see their own.
struct CaptureLogger;

thread_local! {
    static CAPTURED: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

static LOGGER: CaptureLogger = CaptureLogger;
static INSTALLED: OnceCell<()> = OnceCell::new();

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        let line = record.args().to_string();
        CAPTURED.with(|captured| captured.borrow_mut().push((record.level(), line)));
    }

    fn flush(&self) {}
}

fn captured<T>(action: impl FnOnce() -> T) -> (T, Vec<(Level, String)>) {
    INSTALLED.get_or_init(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
    CAPTURED.with(|captured| captured.borrow_mut().clear());
    let value = action();
    let records = CAPTURED.with(|captured| captured.borrow_mut().drain(..).collect());
    (value, records)
}

fn events<'a>(records: &'a [(Level, String)], event: &str) -> Vec<&'a (Level, String)> {
    let prefix = format!("event={event} ");
    records
        .iter()
        .filter(|(_, line)| line.starts_with(&prefix))
        .collect()
}

#[test]
fn user_add_is_silent_while_modify_and_delete_log_info() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let user = User::new("ann01", "ann@test.com", "Ann", "Lee");

    let (added, records) = captured(|| repo.add_user(&user));
    added.unwrap();
    assert!(records.is_empty(), "unexpected records: {records:?}");

    let renamed = User::new("ann01", "ann@test.com", "Anne", "Lee");
    let (modified, records) = captured(|| repo.modify_user(&renamed));
    modified.unwrap();
    assert_eq!(
        records,
        vec![(
            Level::Info,
            "event=user_modify module=repo status=ok user_id=ann01".to_string()
        )]
    );

    let (deleted, records) = captured(|| repo.delete_user("ann01"));
    deleted.unwrap();
    assert_eq!(
        records,
        vec![(
            Level::Info,
            "event=user_delete module=repo status=ok user_id=ann01".to_string()
        )]
    );
}

#[test]
fn user_search_logs_only_when_asked() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    repo.add_user(&User::new("dave03", "d@test.com", "Dave", "Yuen"))
        .unwrap();

    let (_, quiet) = captured(|| repo.search_user("dave03", false).unwrap());
    assert!(quiet.is_empty());

    let (_, found) = captured(|| repo.search_user("dave03", true).unwrap());
    let (_, missing) = captured(|| repo.search_user("ghost", true).unwrap());
    assert_eq!(
        found,
        vec![(
            Level::Info,
            "event=user_search module=repo status=found user_id=dave03".to_string()
        )]
    );
    assert_eq!(
        missing,
        vec![(
            Level::Info,
            "event=user_search module=repo status=not_found user_id=ghost".to_string()
        )]
    );
}

#[test]
fn rejected_user_add_is_logged_as_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let user = User::new("ann01", "ann@test.com", "Ann", "Lee");
    repo.add_user(&user).unwrap();

    let (result, records) = captured(|| repo.add_user(&user));

    assert!(result.is_err());
    assert_eq!(records.len(), 1);
    let (level, line) = &records[0];
    assert_eq!(*level, Level::Error);
    assert!(line.starts_with("event=user_add module=repo status=error"));
    assert!(line.contains("error_code=duplicate_id"));
}

#[test]
fn status_operations_follow_the_same_log_pattern() {
    let conn = open_db_in_memory().unwrap();
    SqliteUserRepository::try_new(&conn)
        .unwrap()
        .add_user(&User::new("ann01", "ann@test.com", "Ann", "Lee"))
        .unwrap();
    let repo = SqliteStatusRepository::try_new(&conn).unwrap();

    let (added, records) = captured(|| repo.add_status(&Status::new("ann01_1", "ann01", "hi")));
    added.unwrap();
    assert!(records.is_empty(), "unexpected records: {records:?}");

    let (_, quiet) = captured(|| repo.search_status("ann01_1", false).unwrap());
    assert!(quiet.is_empty());
    let (_, found) = captured(|| repo.search_status("ann01_1", true).unwrap());
    assert_eq!(
        found,
        vec![(
            Level::Info,
            "event=status_search module=repo status=found status_id=ann01_1".to_string()
        )]
    );

    let (modified, records) = captured(|| repo.modify_status("ann01_1", "hello"));
    modified.unwrap();
    assert_eq!(events(&records, "status_modify").len(), 1);
    assert_eq!(records[0].0, Level::Info);

    let (deleted, records) = captured(|| repo.delete_status("ann01_1"));
    deleted.unwrap();
    assert_eq!(
        records,
        vec![(
            Level::Info,
            "event=status_delete module=repo status=ok status_id=ann01_1".to_string()
        )]
    );
}

#[test]
fn reopening_an_up_to_date_store_reports_nothing_pending() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("social.db");

    let (first, records) = captured(|| open_db(&path));
    drop(first.unwrap());
    let migrate = events(&records, "db_migrate");
    assert_eq!(migrate.len(), 1);
    assert!(migrate[0].1.contains("from_version=0 to_version=1"));

    let (second, records) = captured(|| open_db(&path));
    drop(second.unwrap());
    let migrate = events(&records, "db_migrate");
    assert_eq!(
        migrate,
        vec![&(
            Level::Info,
            "event=db_migrate module=db status=ok version=1 pending=none".to_string()
        )]
    );
}

#[test]
fn import_summary_mentions_skipped_rows_only_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.csv");
    std::fs::write(
        &path,
        "user_id,email,name,lastname\nu1,u1@test.com,One,Uno\nu1,u1@test.com,One,Uno\n",
    )
    .unwrap();
    let mut conn = open_db_in_memory().unwrap();

    let (_, with_skips) = captured(|| load_users(&mut conn, &path, &ImportOptions::default()));
    let summary = events(&with_skips, "import_load");
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].0, Level::Info);
    assert!(summary[0].1.contains("kind=users"));
    assert!(summary[0].1.ends_with("new_count=1 skipped_count=1"));

    std::fs::write(
        &path,
        "user_id,email,name,lastname\nu2,u2@test.com,Two,Dos\n",
    )
    .unwrap();
    let (_, clean) = captured(|| load_users(&mut conn, &path, &ImportOptions::default()));
    let summary = events(&clean, "import_load");
    assert_eq!(summary.len(), 1);
    assert!(summary[0].1.ends_with("new_count=1"));
    assert!(!summary[0].1.contains("skipped_count"));

    let (_, missing) = captured(|| {
        load_users(&mut conn, dir.path().join("absent.csv"), &ImportOptions::default())
    });
    let summary = events(&missing, "import_load");
    assert_eq!(summary[0].0, Level::Error);
    assert!(summary[0].1.contains("error_code=source_unavailable"));
}
