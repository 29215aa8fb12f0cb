use chrono::NaiveDate;
use eduwatch_core::model::attendance::MarkAttendance;
use eduwatch_core::model::user::NewUser;
use eduwatch_core::{
    open_store, AttendanceRepository, ErrorKind, FixedClock, RepoError, Sha256PasswordHasher,
    SqliteAttendanceRepository, SqliteUserRepository, Store, UserRepository,
};

fn store_on_2024_05_01(dir: &tempfile::TempDir) -> Store {
    let at = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    open_store(dir.path().join("eduwatch.db"))
        .unwrap()
        .with_clock(FixedClock(at))
}

fn mark(full_name: &str, status: &str, timestamp: &str) -> MarkAttendance {
    MarkAttendance {
        full_name: full_name.to_string(),
        status: status.to_string(),
        timestamp: timestamp.to_string(),
        ..MarkAttendance::default()
    }
}

#[test]
fn register_then_mark_attendance_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_on_2024_05_01(&dir);
    let hasher = Sha256PasswordHasher;
    let users = SqliteUserRepository::new(&store, &hasher);
    let attendance = SqliteAttendanceRepository::new(&store);

    let mut new_user = NewUser::new("ada", "pw", "Ada Lovelace");
    new_user.status = Some("Part Time".to_string());
    let user_id = users.create_user(&new_user).unwrap();

    let record_id = attendance
        .mark_attendance(&MarkAttendance {
            subject: Some("Mathematics".to_string()),
            ..mark("Ada Lovelace", "Present", "2024-05-01 08:00:00")
        })
        .unwrap();

    let entry = attendance.get_attendance(record_id).unwrap().unwrap();
    assert_eq!(entry.record.user.id(), Some(user_id));
    assert_eq!(entry.record.snapshot.full_name, "Ada Lovelace");
    assert_eq!(entry.record.snapshot.subject, "Mathematics");
    assert_eq!(entry.record.status, "Present");
    assert_eq!(entry.record.created_at.as_deref(), Some("2024-05-01 12:00:00"));
    assert_eq!(entry.username.as_deref(), Some("ada"));
    assert_eq!(entry.user_status, "Part Time");
}

#[test]
fn unknown_full_name_is_user_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_on_2024_05_01(&dir);
    let attendance = SqliteAttendanceRepository::new(&store);

    let err = attendance
        .mark_attendance(&mark("Nobody Here", "Present", "2024-05-01 08:00:00"))
        .unwrap_err();
    assert!(matches!(err, RepoError::UserNotFound(ref key) if key == "Nobody Here"));
    assert!(attendance.list_attendance().unwrap().is_empty());

    let blank = attendance
        .mark_attendance(&mark("Nobody Here", " ", "2024-05-01 08:00:00"))
        .unwrap_err();
    assert_eq!(blank.kind(), ErrorKind::ValidationError);
}

#[test]
fn department_alias_and_default_subject() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_on_2024_05_01(&dir);
    let hasher = Sha256PasswordHasher;
    SqliteUserRepository::new(&store, &hasher)
        .create_user(&NewUser::new("ada", "pw", "Ada Lovelace"))
        .unwrap();
    let attendance = SqliteAttendanceRepository::new(&store);

    let by_department = attendance
        .mark_attendance(&MarkAttendance {
            department: Some("Science".to_string()),
            ..mark("Ada Lovelace", "Present", "2024-05-01 08:00:00")
        })
        .unwrap();
    let defaulted = attendance
        .mark_attendance(&mark("Ada Lovelace", "Late", "2024-05-01 09:00:00"))
        .unwrap();

    let subject_of = |id| {
        attendance
            .get_attendance(id)
            .unwrap()
            .unwrap()
            .record
            .snapshot
            .subject
    };
    assert_eq!(subject_of(by_department), "Science");
    assert_eq!(subject_of(defaulted), "General");
}

#[test]
fn shared_full_name_resolves_to_lowest_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_on_2024_05_01(&dir);
    let hasher = Sha256PasswordHasher;
    let users = SqliteUserRepository::new(&store, &hasher);
    let first = users
        .create_user(&NewUser::new("sam1", "pw", "Sam Lee"))
        .unwrap();
    users
        .create_user(&NewUser::new("sam2", "pw", "Sam Lee"))
        .unwrap();

    let attendance = SqliteAttendanceRepository::new(&store);
    let id = attendance
        .mark_attendance(&mark("Sam Lee", "Present", "2024-05-01 08:00:00"))
        .unwrap();
    let entry = attendance.get_attendance(id).unwrap().unwrap();
    assert_eq!(entry.record.user.id(), Some(first));
}

#[test]
fn dashboard_is_newest_first_and_keeps_orphaned_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_on_2024_05_01(&dir);
    let hasher = Sha256PasswordHasher;
    let users = SqliteUserRepository::new(&store, &hasher);
    let attendance = SqliteAttendanceRepository::new(&store);
    let ada = users
        .create_user(&NewUser::new("ada", "pw", "Ada Lovelace"))
        .unwrap();
    users
        .create_user(&NewUser::new("bob", "pw", "Bob Stone"))
        .unwrap();

    attendance
        .mark_attendance(&mark("Ada Lovelace", "Present", "2024-05-01 08:00:00"))
        .unwrap();
    attendance
        .mark_attendance(&mark("Bob Stone", "Absent", "2024-05-01 10:00:00"))
        .unwrap();

    // User removal leaves the record with its snapshot and no link.
    store
        .connect()
        .unwrap()
        .execute("DELETE FROM users WHERE id = ?1;", [ada])
        .unwrap();

    let entries = attendance.list_attendance().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].record.snapshot.full_name, "Bob Stone");
    assert_eq!(entries[0].user_status, "Full Time");
    assert_eq!(entries[1].record.snapshot.full_name, "Ada Lovelace");
    assert_eq!(entries[1].record.user.id(), None);
    assert_eq!(entries[1].username, None);
    assert_eq!(entries[1].user_status, "Unknown");
}

#[test]
fn statistics_count_today_by_user_status() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_on_2024_05_01(&dir);
    let hasher = Sha256PasswordHasher;
    let users = SqliteUserRepository::new(&store, &hasher);
    let attendance = SqliteAttendanceRepository::new(&store);

    users
        .create_user(&NewUser::new("ada", "pw", "Ada Lovelace"))
        .unwrap();
    let mut part_timer = NewUser::new("bob", "pw", "Bob Stone");
    part_timer.status = Some("Part Time".to_string());
    users.create_user(&part_timer).unwrap();

    for (name, timestamp) in [
        ("Ada Lovelace", "2024-05-01 08:00:00"),
        ("Ada Lovelace", "2024-04-30 08:00:00"),
        ("Bob Stone", "2024-05-01 09:00:00"),
        ("Bob Stone", "2024-05-01 13:00:00"),
    ] {
        attendance
            .mark_attendance(&mark(name, "Present", timestamp))
            .unwrap();
    }

    let stats = attendance.statistics().unwrap();
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.total_attendance, 4);
    assert_eq!(stats.today_attendance, 3);
    assert_eq!(stats.status_breakdown.get("Full Time"), Some(&1));
    assert_eq!(stats.status_breakdown.get("Part Time"), Some(&2));
    assert_eq!(stats.status_breakdown.len(), 2);
}

#[test]
fn clear_attendance_removes_every_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_on_2024_05_01(&dir);
    let hasher = Sha256PasswordHasher;
    SqliteUserRepository::new(&store, &hasher)
        .create_user(&NewUser::new("ada", "pw", "Ada Lovelace"))
        .unwrap();
    let attendance = SqliteAttendanceRepository::new(&store);
    for hour in ["08", "09"] {
        attendance
            .mark_attendance(&mark(
                "Ada Lovelace",
                "Present",
                &format!("2024-05-01 {hour}:00:00"),
            ))
            .unwrap();
    }

    assert_eq!(attendance.clear_attendance().unwrap(), 2);
    assert!(attendance.list_attendance().unwrap().is_empty());
    assert_eq!(attendance.clear_attendance().unwrap(), 0);
    assert_eq!(attendance.statistics().unwrap().total_users, 1);
}
