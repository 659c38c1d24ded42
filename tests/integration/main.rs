//! Integration tests for the precache CLI

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Command pointed at an isolated config and state directory
    fn precache(dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("precache");
        cmd.env("PRECACHE_CONFIG", dir.path().join("config.toml"));
        cmd.env("PRECACHE_STATE_DIR", dir.path().join("state"));
        cmd
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("precache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("offline resource cache manager"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("precache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("precache"));
    }

    #[test]
    fn init_creates_config() {
        let dir = TempDir::new().unwrap();

        precache(&dir)
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Created config"));

        let content = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
        assert!(content.contains("[origin]"));
    }

    #[test]
    fn init_refuses_existing_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "# mine").unwrap();

        precache(&dir)
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--force"));
    }

    #[test]
    fn status_runs_on_fresh_state() {
        let dir = TempDir::new().unwrap();

        precache(&dir)
            .arg("status")
            .assert()
            .success()
            .stdout(
                predicate::str::contains("Precache Status")
                    .and(predicate::str::contains("absent"))
                    .and(predicate::str::contains("no successful activation yet")),
            );
    }

    #[test]
    fn sync_without_origin_fails_with_hint() {
        let dir = TempDir::new().unwrap();

        precache(&dir)
            .arg("sync")
            .assert()
            .failure()
            .stderr(
                predicate::str::contains("No origin configured")
                    .and(predicate::str::contains("precache init")),
            );
    }

    #[test]
    fn sync_without_manifest_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[origin]\nurl = \"https://app.example.com\"\n",
        )
        .unwrap();

        precache(&dir)
            .arg("sync")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No deploy manifest configured"));
    }

    #[test]
    fn download_requires_origin() {
        let dir = TempDir::new().unwrap();

        precache(&dir)
            .arg("download")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No origin configured"));
    }

    #[test]
    fn fetch_requires_a_path_argument() {
        let dir = TempDir::new().unwrap();

        precache(&dir).arg("fetch").assert().failure();
    }

    #[test]
    fn fetch_reports_missing_manifest_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[origin]\nurl = \"https://app.example.com\"\nmanifest = \"/nonexistent/m.json\"\n",
        )
        .unwrap();

        precache(&dir)
            .args(["fetch", "main.dart.js"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Deploy manifest not found"));
    }
}
