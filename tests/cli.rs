//! Tests of the `dbaccess` binary: output and exit codes.

use assert_cmd::Command;

fn dbaccess() -> Command {
    Command::cargo_bin("dbaccess").unwrap()
}

#[test]
fn test_sqlite_only_run_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let output = dbaccess()
        .arg("--no-postgres")
        .arg("--sqlite-path")
        .arg(dir.path().join("foo.db"))
        .arg("--rows")
        .arg("4")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Showing output from statements ran against SQLite."));
    assert!(stdout.contains("3 nom003"));
    assert!(!stdout.contains("4 nom004"));
    assert!(stdout.contains("3 baz"));
    assert!(!stdout.contains("PostgreSQL"));
}

#[test]
fn test_missing_params_file_exits_with_config_code() {
    let dir = tempfile::tempdir().unwrap();
    let output = dbaccess()
        .arg(dir.path().join("pg.conf"))
        .arg("--no-sqlite")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("cannot open configuration file"));
}

#[test]
fn test_bad_port_exits_with_config_code() {
    let dir = tempfile::tempdir().unwrap();
    let params = dir.path().join("pg.conf");
    std::fs::write(&params, "host=localhost\nport=abc\n").unwrap();

    let output = dbaccess().arg(&params).arg("--no-sqlite").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_connection_failure_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let params = dir.path().join("pg.conf");
    std::fs::write(&params, "host=localhost\nsslmode=bogus\n").unwrap();

    let output = dbaccess().arg(&params).arg("--no-sqlite").output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("open the database"));
}

#[test]
fn test_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = dir.path().join("dbaccess.toml");
    let db_path = dir.path().join("from-settings.db");
    std::fs::write(
        &settings,
        format!(
            "[embedded]\npath = {:?}\n\n[client_server]\nenabled = false\n\n[pipeline]\nsample_rows = 2\nlookup_id = 1\n",
            db_path.display().to_string()
        ),
    )
    .unwrap();

    let output = dbaccess().arg("--settings").arg(&settings).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Lookup of id 1: 1 nom001"));
    assert!(db_path.exists());
}
