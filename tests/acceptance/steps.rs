use crate::IssuedagWorld;
use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use std::path::Path;

const SNAPSHOT_FILE: &str = "snapshot.json";

fn workdir(world: &mut IssuedagWorld) -> &Path {
    world
        .workdir
        .get_or_insert_with(|| tempfile::tempdir().expect("Failed to create temp dir"))
        .path()
}

fn docstring(step: &Step) -> String {
    step.docstring
        .as_ref()
        .expect("Expected docstring")
        .trim_start_matches('\n')
        .trim_end()
        .to_string()
}

#[given("the snapshot contains:")]
async fn given_snapshot_contains(world: &mut IssuedagWorld, step: &Step) {
    let content = docstring(step);
    let path = workdir(world).join(SNAPSHOT_FILE);
    std::fs::write(&path, content).expect("Failed to write snapshot file");
}

#[given(regex = r#"^the config file content is '(.*)'$"#)]
async fn given_config_file_content(world: &mut IssuedagWorld, content: String) {
    let config_dir = workdir(world).join(".issuedag");
    std::fs::create_dir_all(&config_dir).expect("Failed to create config dir");
    std::fs::write(config_dir.join("config.json"), content).expect("Failed to write config");
}

#[when(regex = r#"^I run `issuedag ([^`]*)`$"#)]
async fn when_run_issuedag(world: &mut IssuedagWorld, args: String) {
    let dir = workdir(world).to_path_buf();
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_issuedag"))
        .args(args.split_whitespace())
        .arg("--snapshot")
        .arg(dir.join(SNAPSHOT_FILE))
        .current_dir(&dir)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute issuedag: {e}"));

    world.captured_output = output.stdout;
    world.captured_error = output.stderr;
    world.command_status = Some(output.status);
}

#[then("the output should be:")]
async fn then_output_should_be_block(world: &mut IssuedagWorld, step: &Step) {
    let output = String::from_utf8(world.captured_output.clone()).expect("Invalid UTF-8");
    assert_eq!(
        output.trim_end(),
        docstring(step),
        "Expected output:\n---\n{}\n---\nActual output:\n---\n{}\n---",
        docstring(step),
        output.trim_end()
    );
}

#[then(regex = r#"^the output should be "(.*)"$"#)]
async fn then_output_should_be(world: &mut IssuedagWorld, expected_output: String) {
    let output = String::from_utf8(world.captured_output.clone()).expect("Invalid UTF-8");
    assert_eq!(
        output.trim_end(),
        expected_output,
        "Expected output '{}', but got '{}'",
        expected_output,
        output.trim_end()
    );
}

#[then(regex = r#"^the output should contain "(.*)"$"#)]
async fn then_output_should_contain(world: &mut IssuedagWorld, expected: String) {
    let output = String::from_utf8(world.captured_output.clone()).expect("Invalid UTF-8");
    assert!(
        output.contains(&expected),
        "Expected '{}' in output:\n---\n{}\n---",
        expected,
        output
    );
}

#[then(regex = r#"^the output should not contain "(.*)"$"#)]
async fn then_output_should_not_contain(world: &mut IssuedagWorld, unexpected: String) {
    let output = String::from_utf8(world.captured_output.clone()).expect("Invalid UTF-8");
    assert!(
        !output.contains(&unexpected),
        "Did not expect '{}' in output:\n---\n{}\n---",
        unexpected,
        output
    );
}

#[then(regex = r#"^the error should contain "(.*)"$"#)]
async fn then_error_should_contain(world: &mut IssuedagWorld, expected: String) {
    let error = String::from_utf8(world.captured_error.clone()).expect("Invalid UTF-8");
    assert!(
        error.contains(&expected),
        "Expected '{}' on stderr:\n---\n{}\n---",
        expected,
        error
    );
}

#[then("the command should succeed")]
async fn then_command_should_succeed(world: &mut IssuedagWorld) {
    let status = world.command_status.expect("Command was not run");
    assert!(
        status.success(),
        "Command failed with {status}; stderr:\n{}",
        String::from_utf8_lossy(&world.captured_error)
    );
}

#[then("the command should fail")]
async fn then_command_should_fail(world: &mut IssuedagWorld) {
    let status = world.command_status.expect("Command was not run");
    assert!(!status.success(), "Command unexpectedly succeeded");
}
