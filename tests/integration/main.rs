//! Integration tests for Gantry

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn gantry() -> Command {
        cargo_bin_cmd!("gantry")
    }

    #[test]
    fn help_displays() {
        gantry()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("readiness"));
    }

    #[test]
    fn version_displays() {
        gantry()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("gantry"));
    }

    #[test]
    fn build_help_displays() {
        gantry()
            .args(["build", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--tag"))
            .stdout(predicate::str::contains("--backend"));
    }

    #[test]
    fn run_help_displays() {
        gantry()
            .args(["run", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--timeout-ms"))
            .stdout(predicate::str::contains("--rm"));
    }

    #[test]
    fn pull_requires_image() {
        gantry()
            .arg("pull")
            .assert()
            .failure()
            .stderr(predicate::str::contains("IMAGE"));
    }

    #[test]
    fn unknown_subcommand_fails() {
        gantry()
            .arg("teleport")
            .assert()
            .failure()
            .stderr(predicate::str::contains("unrecognized subcommand"));
    }

    #[test]
    fn build_without_tag_fails_with_hint() {
        // Point at a nonexistent config so machine config cannot supply a tag
        gantry()
            .args(["--config", "/nonexistent/gantry.toml", "build"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no image tag"));
    }
}
