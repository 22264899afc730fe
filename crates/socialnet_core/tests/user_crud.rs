use rusqlite::Connection;
use socialnet_core::db::schema::EntityKind;
use socialnet_core::db::{open_db_in_memory, DbError};
use socialnet_core::{
    ModelValidationError, RepoError, SqliteStatusRepository, SqliteUserRepository, Status,
    StatusRepository, User, UserRepository,
};

fn ann() -> User {
    User::new("ann01", "ann@test.com", "Ann", "Lee")
}

#[test]
fn add_then_search_returns_matching_record() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    repo.add_user(&ann()).unwrap();

    let loaded = repo.search_user("ann01", false).unwrap().unwrap();
    assert_eq!(loaded, ann());
}

#[test]
fn add_duplicate_fails_and_keeps_original() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    repo.add_user(&ann()).unwrap();

    let imposter = User::new("ann01", "other@test.com", "Other", "Person");
    let err = repo.add_user(&imposter).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Duplicate { entity: EntityKind::User, ref id } if id == "ann01"
    ));
    assert!(err.is_precondition());

    let loaded = repo.search_user("ann01", false).unwrap().unwrap();
    assert_eq!(loaded, ann());
    assert_eq!(repo.count_users().unwrap(), 1);
}

#[test]
fn add_rejects_invalid_fields_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let long_id = User::new("x".repeat(31), "a@test.com", "A", "B");
    assert!(matches!(
        repo.add_user(&long_id),
        Err(RepoError::Validation(ModelValidationError::TooLong {
            field: "user_id",
            max: 30,
            actual: 31
        }))
    ));

    let empty_id = User::new("", "a@test.com", "A", "B");
    assert!(matches!(
        repo.add_user(&empty_id),
        Err(RepoError::Validation(ModelValidationError::EmptyField {
            field: "user_id"
        }))
    ));
    assert_eq!(repo.count_users().unwrap(), 0);
}

#[test]
fn modify_missing_user_fails_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let err = repo.modify_user(&ann()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: EntityKind::User, .. }));
    assert_eq!(repo.count_users().unwrap(), 0);
}

#[test]
fn modify_overwrites_fields_and_keeps_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    repo.add_user(&ann()).unwrap();

    let changed = User::new("ann01", "ann.lee@test.com", "Annie", "Lee-Smith");
    repo.modify_user(&changed).unwrap();

    let loaded = repo.search_user("ann01", true).unwrap().unwrap();
    assert_eq!(loaded, changed);
}

#[test]
fn delete_missing_user_fails() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    assert!(matches!(
        repo.delete_user("ghost"),
        Err(RepoError::NotFound { entity: EntityKind::User, ref id }) if id == "ghost"
    ));
}

#[test]
fn delete_user_cascades_to_owned_statuses_only() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let statuses = SqliteStatusRepository::try_new(&conn).unwrap();

    users.add_user(&ann()).unwrap();
    users
        .add_user(&User::new("bob02", "bob@test.com", "Bob", "Ray"))
        .unwrap();
    statuses
        .add_status(&Status::new("ann01_1", "ann01", "hello"))
        .unwrap();
    statuses
        .add_status(&Status::new("ann01_2", "ann01", "again"))
        .unwrap();
    statuses
        .add_status(&Status::new("bob02_1", "bob02", "hi"))
        .unwrap();

    users.delete_user("ann01").unwrap();

    assert!(users.search_user("ann01", false).unwrap().is_none());
    assert!(statuses.search_status("ann01_1", false).unwrap().is_none());
    assert!(statuses.search_status("ann01_2", false).unwrap().is_none());
    assert!(statuses.search_status("bob02_1", false).unwrap().is_some());
    assert_eq!(statuses.count_statuses().unwrap(), 1);
}

#[test]
fn search_missing_user_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    assert_eq!(repo.search_user("nobody", true).unwrap(), None);
}

#[test]
fn store_failure_surfaces_as_db_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    conn.execute_batch("DROP TABLE statuses; DROP TABLE users;")
        .unwrap();

    let err = repo.add_user(&ann()).unwrap_err();
    assert!(matches!(err, RepoError::Db(DbError::Sqlite(_))));
    assert!(!err.is_precondition());
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    assert!(matches!(
        SqliteUserRepository::try_new(&conn),
        Err(RepoError::Db(DbError::UninitializedConnection { .. }))
    ));
}
