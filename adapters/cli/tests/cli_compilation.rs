use std::process::Command;

#[test]
fn monolake_targets_check_cleanly() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--package", "monolake-cli", "--all-targets"])
        .status()
        .expect("failed to invoke cargo check for the monolake package");

    assert!(status.success(), "cargo check of every monolake-cli target should succeed");
}

#[test]
fn help_lists_every_override() {
    let output = Command::new(env!("CARGO_BIN_EXE_monolake"))
        .arg("--help")
        .output()
        .expect("failed to launch monolake");
    assert!(output.status.success());

    let help = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--config",
        "--height-map",
        "--headless",
        "--ticks",
        "--no-vsync",
        "--show-fps",
        "--print-default-config",
    ] {
        assert!(help.contains(flag), "help is missing {flag}:\n{help}");
    }
}
