use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

fn demo_dir() -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos")
        .join("kurose-counseling")
}

fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("gg-cli-{}-{}.json", name, std::process::id()))
}

fn path_arg(path: &std::path::Path) -> &str {
    path.to_str().expect("path should be utf-8")
}

fn run_agent(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_gg-cli");
    Command::new(bin)
        .arg("agent")
        .args(args)
        .env_remove("GALGAME_CHAT_ENDPOINT")
        .env_remove("GALGAME_API_KEY")
        .output()
        .expect("agent command should run")
}

/// Runs one agent command that must succeed and returns its stdout.
fn agent_ok(args: &[&str]) -> String {
    let output = run_agent(args);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    assert!(
        output.status.success(),
        "agent {:?} failed\nstdout:\n{}\nstderr:\n{}",
        args,
        stdout,
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("RESULT:OK"));
    stdout
}

fn advance(from: &std::path::Path, to: &std::path::Path) -> String {
    agent_ok(&["advance", "--state-in", path_arg(from), "--state-out", path_arg(to)])
}

fn parse_state_out(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("STATE_OUT:").map(|v| v.to_string()))
        .filter(|value| value != "NONE")
}

#[test]
fn agent_special_guest_flow_reaches_free_chat() {
    let state = temp_file("guest");
    let demo = demo_dir();

    let start = agent_ok(&[
        "start",
        "--scripts-dir",
        path_arg(&demo),
        "--state-out",
        path_arg(&state),
    ]);
    assert!(start.contains("EVENT:SCENE"));
    assert!(start.contains("SCENE:1"));
    assert!(start.contains("BACKGROUND:assets/backgrounds/therapy_room.jpg"));
    assert_eq!(parse_state_out(&start), Some(path_arg(&state).to_string()));

    let mut stdout = String::new();
    for _ in 0..4 {
        stdout = advance(&state, &state);
    }
    assert!(stdout.contains("EVENT:INPUT"));
    assert!(stdout.contains("INPUT_PLACEHOLDER_JSON:\"请输入你的名字\""));

    let empty = agent_ok(&[
        "input",
        "--state-in",
        path_arg(&state),
        "--text",
        "  ",
        "--state-out",
        path_arg(&state),
    ]);
    assert!(empty.contains("EVENT:UNCHANGED"));

    let greeting = agent_ok(&[
        "input",
        "--state-in",
        path_arg(&state),
        "--text",
        "狛枝凪斗",
        "--state-out",
        path_arg(&state),
    ]);
    assert!(greeting.contains("SCENE:6"));
    assert!(greeting.contains("你昨天好像没有来学校"));
    assert!(greeting.contains("SPRITE:assets/characters/kurose_worried.png"));

    let overlay = advance(&state, &state);
    assert!(overlay.contains("SCENE:2"));
    assert!(overlay.contains("SPEAKER_JSON:\"狛枝凪斗\""));

    let choice = advance(&state, &state);
    assert!(choice.contains("EVENT:CHOICES"));
    assert!(choice.contains("CHOICE:1|\"想和你单独聊聊\""));

    let bad_choice = run_agent(&[
        "choose",
        "--state-in",
        path_arg(&state),
        "--choice",
        "9",
        "--state-out",
        path_arg(&state),
    ]);
    assert!(!bad_choice.status.success());
    let bad_stdout = String::from_utf8_lossy(&bad_choice.stdout);
    assert!(bad_stdout.contains("RESULT:ERROR"));
    assert!(bad_stdout.contains("ERROR_CODE:ENGINE_CHOICE_INDEX"));

    let free_chat = agent_ok(&[
        "choose",
        "--state-in",
        path_arg(&state),
        "--choice",
        "1",
        "--state-out",
        path_arg(&state),
    ]);
    assert!(free_chat.contains("EVENT:FREE_CHAT"));
    assert!(free_chat.contains("SPEAKER_JSON:\"黒瀨澄\""));

    let chat = agent_ok(&[
        "chat",
        "--state-in",
        path_arg(&state),
        "--text",
        "谢谢你",
        "--state-out",
        path_arg(&state),
        "--seed",
        "4",
    ]);
    assert!(chat.contains("EVENT:CHAT"));
    assert!(chat.contains("AFFECTION:1"));
    assert!(chat.contains("AFFECTION_GAIN:1"));

    let restarted = agent_ok(&[
        "chat",
        "--state-in",
        path_arg(&state),
        "--text",
        "重新开始",
        "--state-out",
        path_arg(&state),
    ]);
    assert!(restarted.contains("EVENT:SCENE"));
    assert!(restarted.contains("SCENE:1"));
    assert!(restarted.contains("AFFECTION:0"));
}

#[test]
fn agent_chat_outside_free_chat_is_rejected() {
    let state = temp_file("chat-outside");
    agent_ok(&[
        "start",
        "--scripts-dir",
        path_arg(&demo_dir()),
        "--state-out",
        path_arg(&state),
    ]);

    let output = run_agent(&[
        "chat",
        "--state-in",
        path_arg(&state),
        "--text",
        "你好",
        "--state-out",
        path_arg(&state),
    ]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ERROR_CODE:ENGINE_NOT_FREE_CHAT"));
}

#[test]
fn agent_choose_without_pending_choice_returns_error() {
    let state = temp_file("no-choice");
    agent_ok(&[
        "start",
        "--scripts-dir",
        path_arg(&demo_dir()),
        "--state-out",
        path_arg(&state),
    ]);

    let output = run_agent(&[
        "choose",
        "--state-in",
        path_arg(&state),
        "--choice",
        "0",
        "--state-out",
        path_arg(&state),
    ]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RESULT:ERROR"));
    assert!(stdout.contains("ERROR_CODE:ENGINE_NO_PENDING_CHOICE"));
}

#[test]
fn agent_start_missing_dir_returns_error_envelope() {
    let output = run_agent(&[
        "start",
        "--scripts-dir",
        "/path/does/not/exist",
        "--state-out",
        "/tmp/none.json",
    ]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RESULT:ERROR"));
    assert!(stdout.contains("ERROR_CODE:BUNDLE_NOT_FOUND"));
    assert!(stdout.contains("ERROR_MSG_JSON:"));
}

#[test]
fn agent_advance_with_missing_state_returns_error() {
    let output = run_agent(&[
        "advance",
        "--state-in",
        path_arg(&temp_file("never-written")),
        "--state-out",
        "/tmp/none.json",
    ]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ERROR_CODE:CLI_STATE_NOT_FOUND"));
}

#[test]
fn tui_supports_commands_and_quit() {
    let bin = env!("CARGO_BIN_EXE_gg-cli");
    let state_file = temp_file("tui-storage");
    let log_file = std::env::temp_dir().join(format!("gg-cli-tui-{}.log", std::process::id()));
    let _ = fs::remove_file(&state_file);

    let mut child = Command::new(bin)
        .arg("tui")
        .arg("--scripts-dir")
        .arg(path_arg(&demo_dir()))
        .arg("--state-file")
        .arg(path_arg(&state_file))
        .arg("--log-file")
        .arg(path_arg(&log_file))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("tui should spawn");

    {
        let stdin = child.stdin.as_mut().expect("stdin should be piped");
        stdin
            .write_all(":help\n\n:save\n:restart\n:load\n:quit\n".as_bytes())
            .expect("should write commands");
    }

    let output = child.wait_with_output().expect("tui should complete");
    assert!(output.status.success(), "tui should exit with success");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("黒瀨澄的心理咨询室"));
    assert!(stdout.contains("commands: :help :save :load :restart :quit"));
    assert!(stdout.contains("saved:"));
    assert!(stdout.contains("restarted"));
    assert!(stdout.contains("loaded:"));
    assert!(stdout.contains("bye"));

    let storage = fs::read_to_string(&state_file).expect("storage file should exist");
    assert!(storage.contains("galgame_save"));
    assert!(log_file.exists());
}

#[test]
fn tui_invalid_choice_reports_and_continues() {
    let bin = env!("CARGO_BIN_EXE_gg-cli");
    let log_file = std::env::temp_dir().join(format!("gg-cli-choice-{}.log", std::process::id()));

    let mut child = Command::new(bin)
        .arg("tui")
        .arg("--scripts-dir")
        .arg(path_arg(&demo_dir()))
        .arg("--state-file")
        .arg(path_arg(&temp_file("tui-choice")))
        .arg("--log-file")
        .arg(path_arg(&log_file))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("tui should spawn");

    {
        let stdin = child.stdin.as_mut().expect("stdin should be piped");
        stdin
            .write_all("\n\n\n\nRin\n\nnot-a-number\n0\n".as_bytes())
            .expect("should write inputs");
    }

    let output = child.wait_with_output().expect("tui should complete");
    assert!(output.status.success(), "line mode ends cleanly at EOF");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("啊，你好，Rin。"));
    assert!(stdout.contains("error: TUI_CHOICE_PARSE"));
    assert!(stdout.contains("压力大的时候"));
    assert!(stdout.contains("好感度: 1"));
}
