use eduwatch_core::seed::default_subject_count;
use eduwatch_core::{
    bootstrap, seed_defaults, AssignmentRepository, Sha256PasswordHasher,
    SqliteAssignmentRepository, SqliteSubjectRepository, SqliteUserRepository, SubjectRepository,
    UserRepository,
};

#[test]
fn bootstrap_seeds_accounts_and_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let ready = bootstrap(dir.path().join("eduwatch.db")).unwrap();

    assert_eq!(ready.seed.users_inserted, 2);
    assert_eq!(ready.seed.subjects_inserted, default_subject_count());
    assert_eq!(ready.migrations.from_version, 0);

    let hasher = Sha256PasswordHasher;
    let users = SqliteUserRepository::new(&ready.store, &hasher);
    let admin = users.authenticate("admin", "admin123").unwrap();
    assert!(admin.is_admin);
    assert_eq!(admin.full_name, "System Administrator");
    let outis = users.authenticate("outis", "123123").unwrap();
    assert!(!outis.is_admin);
    assert_eq!(outis.address.as_deref(), Some("Circulo Verde, Quezon"));

    // No assignments yet, so the whole catalog is available.
    let available = SqliteAssignmentRepository::new(&ready.store)
        .available_subjects_for_user(outis.id)
        .unwrap();
    assert_eq!(available.len(), 15);
    assert_eq!(available[0].name, "Art");
}

#[test]
fn seeding_twice_inserts_nothing_new() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eduwatch.db");
    let first = bootstrap(&path).unwrap();
    drop(first);

    let second = bootstrap(&path).unwrap();
    assert_eq!(second.seed.users_inserted, 0);
    assert_eq!(second.seed.subjects_inserted, 0);
    assert!(second.migrations.steps.is_empty());

    let again = seed_defaults(&second.store).unwrap();
    assert_eq!(again.users_inserted, 0);

    let hasher = Sha256PasswordHasher;
    assert_eq!(
        SqliteUserRepository::new(&second.store, &hasher)
            .list_users()
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        SqliteSubjectRepository::new(&second.store)
            .list_subjects()
            .unwrap()
            .len(),
        15
    );
}

#[test]
fn seed_does_not_overwrite_existing_accounts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eduwatch.db");
    let ready = bootstrap(&path).unwrap();
    let conn = ready.store.connect().unwrap();
    conn.execute(
        "UPDATE users SET full_name = 'Renamed Admin' WHERE username = 'admin';",
        [],
    )
    .unwrap();
    drop(conn);

    seed_defaults(&ready.store).unwrap();
    let hasher = Sha256PasswordHasher;
    let admin = SqliteUserRepository::new(&ready.store, &hasher)
        .find_by_username("admin")
        .unwrap()
        .unwrap();
    assert_eq!(admin.full_name, "Renamed Admin");
}
