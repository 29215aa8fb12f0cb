use chrono::NaiveDate;
use eduwatch_core::model::attendance::MarkAttendance;
use eduwatch_core::model::user::{AdminUserUpdate, NewUser, ProfileUpdate};
use eduwatch_core::{
    open_store, AttendanceRepository, ErrorKind, FixedClock, RepoError, Sha256PasswordHasher,
    SqliteAttendanceRepository, SqliteUserRepository, Store, UserRepository, ValidationError,
};

fn temp_store(dir: &tempfile::TempDir) -> Store {
    open_store(dir.path().join("eduwatch.db")).unwrap()
}

fn profile(new_username: &str, full_name: &str) -> ProfileUpdate {
    ProfileUpdate {
        new_username: new_username.to_string(),
        full_name: full_name.to_string(),
        ..ProfileUpdate::default()
    }
}

#[test]
fn create_user_hashes_password_and_defaults_status() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let hasher = Sha256PasswordHasher;
    let repo = SqliteUserRepository::new(&store, &hasher);

    let id = repo
        .create_user(&NewUser::new("grace", "secret", "Grace Hopper"))
        .unwrap();
    let user = repo.get_user(id).unwrap().unwrap();

    assert_eq!(user.username, "grace");
    assert_eq!(
        user.password,
        "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b"
    );
    assert_eq!(user.status, "Full Time");
    assert!(!user.is_admin);
    assert!(user.created_at.is_some());
}

#[test]
fn duplicate_username_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let hasher = Sha256PasswordHasher;
    let repo = SqliteUserRepository::new(&store, &hasher);

    repo.create_user(&NewUser::new("grace", "secret", "Grace Hopper"))
        .unwrap();
    let err = repo
        .create_user(&NewUser::new("grace", "other", "Another Grace"))
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateUsername(ref name) if name == "grace"));
    assert_eq!(err.kind(), ErrorKind::DuplicateUsername);
}

#[test]
fn blank_required_fields_fail_validation() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let hasher = Sha256PasswordHasher;
    let repo = SqliteUserRepository::new(&store, &hasher);

    let err = repo
        .create_user(&NewUser::new("grace", "  ", "Grace Hopper"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptyField("password"))
    ));
    assert!(repo.list_users().unwrap().is_empty());
}

#[test]
fn authenticate_rejects_unknown_user_and_wrong_password_alike() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let hasher = Sha256PasswordHasher;
    let repo = SqliteUserRepository::new(&store, &hasher);
    repo.create_user(&NewUser::new("grace", "secret", "Grace Hopper"))
        .unwrap();

    let user = repo.authenticate("grace", "secret").unwrap();
    assert_eq!(user.full_name, "Grace Hopper");

    let wrong = repo.authenticate("grace", "Secret").unwrap_err();
    let unknown = repo.authenticate("nobody", "secret").unwrap_err();
    assert_eq!(wrong.kind(), ErrorKind::InvalidCredentials);
    assert_eq!(unknown.kind(), ErrorKind::InvalidCredentials);
    assert_eq!(wrong.to_string(), unknown.to_string());
}

#[test]
fn list_users_is_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let hasher = Sha256PasswordHasher;

    let early = temp_store(&dir).with_clock(FixedClock(day.and_hms_opt(8, 0, 0).unwrap()));
    SqliteUserRepository::new(&early, &hasher)
        .create_user(&NewUser::new("first", "pw", "First User"))
        .unwrap();
    let late = temp_store(&dir).with_clock(FixedClock(day.and_hms_opt(9, 0, 0).unwrap()));
    let repo = SqliteUserRepository::new(&late, &hasher);
    repo.create_user(&NewUser::new("second", "pw", "Second User"))
        .unwrap();

    let usernames: Vec<String> = repo
        .list_users()
        .unwrap()
        .into_iter()
        .map(|user| user.username)
        .collect();
    assert_eq!(usernames, vec!["second", "first"]);
}

#[test]
fn profile_rename_propagates_into_attendance() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let hasher = Sha256PasswordHasher;
    let users = SqliteUserRepository::new(&store, &hasher);
    let attendance = SqliteAttendanceRepository::new(&store);

    let ada = users
        .create_user(&NewUser::new("ada", "pw", "Ada Byron"))
        .unwrap();
    let other = users
        .create_user(&NewUser::new("bob", "pw", "Bob Stone"))
        .unwrap();
    for full_name in ["Ada Byron", "Ada Byron", "Bob Stone"] {
        attendance
            .mark_attendance(&MarkAttendance {
                full_name: full_name.to_string(),
                status: "Present".to_string(),
                timestamp: "2024-05-01 08:00:00".to_string(),
                ..MarkAttendance::default()
            })
            .unwrap();
    }

    users
        .update_profile("ada", &profile("ada.l", "Ada Lovelace"))
        .unwrap();

    let renamed = users.get_user(ada).unwrap().unwrap();
    assert_eq!(renamed.username, "ada.l");
    assert_eq!(renamed.full_name, "Ada Lovelace");
    assert_eq!(renamed.status, "Full Time");
    assert!(users.find_by_username("ada").unwrap().is_none());

    let entries = attendance.list_attendance().unwrap();
    let names_for = |user_id| {
        entries
            .iter()
            .filter(|entry| entry.record.user.id() == Some(user_id))
            .map(|entry| entry.record.snapshot.full_name.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(names_for(ada), vec!["Ada Lovelace", "Ada Lovelace"]);
    assert_eq!(names_for(other), vec!["Bob Stone"]);
}

#[test]
fn profile_update_rejects_taken_username_and_unknown_user() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let hasher = Sha256PasswordHasher;
    let repo = SqliteUserRepository::new(&store, &hasher);
    repo.create_user(&NewUser::new("ada", "pw", "Ada Byron"))
        .unwrap();
    repo.create_user(&NewUser::new("bob", "pw", "Bob Stone"))
        .unwrap();

    let taken = repo
        .update_profile("ada", &profile("bob", "Ada Byron"))
        .unwrap_err();
    assert_eq!(taken.kind(), ErrorKind::DuplicateUsername);

    let missing = repo
        .update_profile("carol", &profile("carol", "Carol"))
        .unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::UserNotFound);

    let blank = repo
        .update_profile("ada", &profile("ada", " "))
        .unwrap_err();
    assert_eq!(blank.kind(), ErrorKind::ValidationError);
}

#[test]
fn admin_update_changes_status_and_syncs_full_name() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let hasher = Sha256PasswordHasher;
    let users = SqliteUserRepository::new(&store, &hasher);
    let attendance = SqliteAttendanceRepository::new(&store);

    let id = users
        .create_user(&NewUser::new("ada", "pw", "Ada Byron"))
        .unwrap();
    let record = attendance
        .mark_attendance(&MarkAttendance {
            full_name: "Ada Byron".to_string(),
            status: "Present".to_string(),
            timestamp: "2024-05-01 08:00:00".to_string(),
            ..MarkAttendance::default()
        })
        .unwrap();

    users
        .admin_update_user(
            id,
            &AdminUserUpdate {
                full_name: "Ada King".to_string(),
                email: Some("ada@example.com".to_string()),
                status: Some("Part Time".to_string()),
                ..AdminUserUpdate::default()
            },
        )
        .unwrap();

    let user = users.get_user(id).unwrap().unwrap();
    assert_eq!(user.status, "Part Time");
    assert_eq!(user.email.as_deref(), Some("ada@example.com"));
    let entry = attendance.get_attendance(record).unwrap().unwrap();
    assert_eq!(entry.record.snapshot.full_name, "Ada King");
    assert_eq!(entry.user_status, "Part Time");

    let err = users
        .admin_update_user(999, &AdminUserUpdate {
            full_name: "Nobody".to_string(),
            ..AdminUserUpdate::default()
        })
        .unwrap_err();
    assert!(matches!(err, RepoError::UserNotFound(_)));
}

#[test]
fn serialized_user_omits_password() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let hasher = Sha256PasswordHasher;
    let repo = SqliteUserRepository::new(&store, &hasher);
    let id = repo
        .create_user(&NewUser::new("grace", "secret", "Grace Hopper"))
        .unwrap();

    let user = repo.get_user(id).unwrap().unwrap();
    let value = serde_json::to_value(&user).unwrap();
    assert!(value.get("password").is_none());
    assert_eq!(value["username"], "grace");
    assert_eq!(value["is_admin"], false);
}
