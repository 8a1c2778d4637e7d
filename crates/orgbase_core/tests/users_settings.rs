use orgbase_core::db::{open_db, open_db_in_memory};
use orgbase_core::{
    AppSettings, NewUser, RepoError, SettingsRepository, SqliteSettingsRepository,
    SqliteUserRepository, UserRepository, UserService, UserServiceError, UserValidationError,
    SETTINGS_ROW_ID,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
    }
}

fn settings_rows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM app_settings;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn register_creates_user_and_rejects_duplicate_username() {
    let conn = setup();
    let service = UserService::new(
        SqliteUserRepository::try_new(&conn).unwrap(),
        SqliteSettingsRepository::try_new(&conn).unwrap(),
    );

    let user = service.register(&new_user("tester")).unwrap();
    assert_eq!(user.username, "tester");
    assert_eq!(user.email, "tester@example.com");
    assert!(user.date_joined > 0);

    let err = service.register(&new_user("tester")).unwrap_err();
    assert!(matches!(err, UserServiceError::UsernameTaken(name) if name == "tester"));

    assert_eq!(service.get_by_username("tester").unwrap().id, user.id);
    assert_eq!(service.get(user.id).unwrap(), user);
    assert!(matches!(
        service.get_by_username("nobody"),
        Err(UserServiceError::NotFound(_))
    ));
}

#[test]
fn losing_concurrent_insert_reports_duplicate_username() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orgbase.db");
    let first_conn = open_db(&path).unwrap();
    let second_conn = open_db(&path).unwrap();
    let first = SqliteUserRepository::try_new(&first_conn).unwrap();
    let second = SqliteUserRepository::try_new(&second_conn).unwrap();

    // Both writers saw the username as free; only the UNIQUE index decides.
    assert!(second.get_by_username("racer").unwrap().is_none());
    first.create_user(&new_user("racer")).unwrap();

    let err = second.create_user(&new_user("racer")).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateUsername(name) if name == "racer"));

    let count: i64 = second_conn
        .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn register_requires_names() {
    let conn = setup();
    let service = UserService::new(
        SqliteUserRepository::try_new(&conn).unwrap(),
        SqliteSettingsRepository::try_new(&conn).unwrap(),
    );

    let mut input = new_user("nameless");
    input.first_name = String::new();
    let err = service.register(&input).unwrap_err();
    assert!(matches!(
        err,
        UserServiceError::Invalid(UserValidationError::MissingField("first_name"))
    ));
}

#[test]
fn register_is_refused_while_registration_is_closed() {
    let conn = setup();
    let settings = SqliteSettingsRepository::try_new(&conn).unwrap();
    settings
        .save(&AppSettings {
            registration_open: false,
            ..AppSettings::default()
        })
        .unwrap();

    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap(), settings);
    let err = service.register(&new_user("late")).unwrap_err();
    assert!(matches!(err, UserServiceError::RegistrationClosed));
    assert!(matches!(
        service.get_by_username("late"),
        Err(UserServiceError::NotFound(_))
    ));
}

#[test]
fn settings_load_creates_single_default_row() {
    let conn = setup();
    let settings = SqliteSettingsRepository::try_new(&conn).unwrap();
    assert_eq!(settings_rows(&conn), 0);

    let first = settings.load().unwrap();
    let second = settings.load().unwrap();

    assert_eq!(first, AppSettings::default());
    assert_eq!(first, second);
    assert_eq!(settings_rows(&conn), 1);
}

#[test]
fn settings_save_overwrites_the_singleton() {
    let conn = setup();
    let settings = SqliteSettingsRepository::try_new(&conn).unwrap();

    let updated = AppSettings {
        site_name: "Org Directory".to_string(),
        registration_open: false,
    };
    settings.save(&updated).unwrap();
    settings.save(&updated).unwrap();

    assert_eq!(settings.load().unwrap(), updated);
    assert_eq!(settings_rows(&conn), 1);

    let id: i64 = conn
        .query_row("SELECT id FROM app_settings;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(id, SETTINGS_ROW_ID);
}

#[test]
fn settings_table_rejects_second_row() {
    let conn = setup();
    let settings = SqliteSettingsRepository::try_new(&conn).unwrap();
    settings.load().unwrap();

    let result = conn.execute(
        "INSERT INTO app_settings (id, site_name, registration_open) VALUES (2, 'other', 1);",
        [],
    );
    assert!(result.is_err());
    assert_eq!(settings_rows(&conn), 1);
}
