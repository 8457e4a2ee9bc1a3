//! End-to-end tests of the `shp2postgis` binary that need no database.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DB_VARS: [&str; 6] = [
    "DB_HOST",
    "DB_PORT",
    "DB_NAME",
    "DB_USER",
    "DB_PASSWORD",
    "DB_CONNECT_TIMEOUT",
];

/// The binary with no inherited `DB_*` variables, reading `env` as its
/// environment file.
fn shp2postgis_with_env(dir: &TempDir, env: &str) -> Command {
    let env_file = dir.path().join("test.env");
    std::fs::write(&env_file, env).unwrap();

    let mut cmd = Command::cargo_bin("shp2postgis").unwrap();
    for var in DB_VARS {
        cmd.env_remove(var);
    }
    cmd.arg("--env-file").arg(env_file);
    cmd
}

fn shp2postgis(dir: &TempDir) -> Command {
    shp2postgis_with_env(dir, "")
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    shp2postgis(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("load"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_inspect_reports_feature_count() {
    let dir = TempDir::new().unwrap();
    let shp = common::write_polygon_shapefile(dir.path(), "stations", 3);

    shp2postgis(&dir)
        .arg("inspect")
        .arg(&shp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Polygon"))
        .stdout(predicate::str::contains("Features"))
        .stdout(predicate::str::contains("| 3 "))
        .stdout(predicate::str::contains("MultiPolygon"));
}

#[test]
fn test_inspect_missing_file_fails() {
    let dir = TempDir::new().unwrap();

    shp2postgis(&dir)
        .arg("inspect")
        .arg(dir.path().join("missing.shp"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Shapefile not found"));
}

#[test]
fn test_load_without_configuration_fails() {
    let dir = TempDir::new().unwrap();
    let shp = common::write_polygon_shapefile(dir.path(), "stations", 2);

    shp2postgis(&dir)
        .arg("load")
        .arg("--shapefile")
        .arg(&shp)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Missing required option: DB_HOST"))
        .stderr(predicate::str::contains("Hint:"));
}

#[test]
fn test_load_reads_env_file() {
    let dir = TempDir::new().unwrap();
    let shp = common::write_polygon_shapefile(dir.path(), "stations", 2);
    let env = "DB_HOST=127.0.0.1\nDB_PORT=not-a-port\nDB_NAME=gis\nDB_USER=etl\nDB_PASSWORD=secret\n";

    shp2postgis_with_env(&dir, env)
        .arg("load")
        .arg("--shapefile")
        .arg(&shp)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid DB_PORT option"));
}

#[test]
fn test_load_unreachable_database_fails() {
    let dir = TempDir::new().unwrap();
    let shp = common::write_polygon_shapefile(dir.path(), "stations", 2);

    shp2postgis(&dir)
        .env("DB_HOST", "127.0.0.1")
        .env("DB_PORT", "1")
        .env("DB_NAME", "gis")
        .env("DB_USER", "etl")
        .env("DB_PASSWORD", "secret")
        .env("DB_CONNECT_TIMEOUT", "2")
        .arg("load")
        .arg("--shapefile")
        .arg(&shp)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Database error"))
        .stderr(predicate::str::contains("secret").not());
}

#[test]
fn test_check_unreachable_database_fails() {
    let dir = TempDir::new().unwrap();

    shp2postgis(&dir)
        .env("DB_HOST", "127.0.0.1")
        .env("DB_PORT", "1")
        .env("DB_NAME", "gis")
        .env("DB_USER", "etl")
        .env("DB_PASSWORD", "secret")
        .env("DB_CONNECT_TIMEOUT", "2")
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to connect to 127.0.0.1:1/gis"))
        .stderr(predicate::str::contains("refused"));
}

#[test]
fn test_environment_wins_over_env_file() {
    let dir = TempDir::new().unwrap();
    let env = "DB_HOST=127.0.0.1\nDB_PORT=not-a-port\nDB_NAME=gis\nDB_USER=etl\nDB_PASSWORD=secret\n";

    shp2postgis_with_env(&dir, env)
        .env("DB_PORT", "1")
        .env("DB_CONNECT_TIMEOUT", "2")
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to connect to 127.0.0.1:1/gis"))
        .stderr(predicate::str::contains("Invalid DB_PORT").not());
}

/// The binary run from `dir` with no `--env-file` and no inherited `DB_*`
/// variables.
fn shp2postgis_in(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shp2postgis").unwrap();
    for var in DB_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(dir.path());
    cmd
}

#[test]
fn test_missing_implicit_env_file_is_fine() {
    let dir = TempDir::new().unwrap();
    let shp = common::write_polygon_shapefile(dir.path(), "stations", 2);

    shp2postgis_in(&dir)
        .arg("inspect")
        .arg(&shp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Features"));
}

#[test]
fn test_implicit_env_file_is_read_from_working_directory() {
    let dir = TempDir::new().unwrap();
    let shp = common::write_polygon_shapefile(dir.path(), "stations", 2);
    std::fs::write(
        dir.path().join(".env"),
        "DB_HOST=127.0.0.1\nDB_PORT=not-a-port\nDB_NAME=gis\nDB_USER=etl\nDB_PASSWORD=secret\n",
    )
    .unwrap();

    shp2postgis_in(&dir)
        .arg("load")
        .arg("--shapefile")
        .arg(&shp)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid DB_PORT option"));
}

#[test]
fn test_load_rejects_invalid_table_name() {
    let dir = TempDir::new().unwrap();

    shp2postgis(&dir)
        .arg("load")
        .arg("--table")
        .arg("stations; DROP TABLE users")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid identifier"));
}
