use gg_core::GalgameError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> GalgameError {
    GalgameError::new(code, error.to_string())
}

pub(crate) fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

pub(crate) fn emit_error(error: GalgameError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!("ERROR_MSG_JSON:{}", json_string(&error.message));
    1
}

pub(crate) fn map_tui_io(error: std::io::Error) -> GalgameError {
    map_error("TUI_IO", error)
}

pub(crate) fn map_cli_log_file(error: std::io::Error) -> GalgameError {
    map_error("CLI_LOG_FILE", error)
}

pub(crate) fn map_cli_state_write(error: std::io::Error) -> GalgameError {
    map_error("CLI_STATE_WRITE", error)
}

pub(crate) fn map_cli_state_read(error: std::io::Error) -> GalgameError {
    map_error("CLI_STATE_READ", error)
}

pub(crate) fn map_cli_state_invalid(error: serde_json::Error) -> GalgameError {
    map_error("CLI_STATE_INVALID", error)
}

pub(crate) fn map_cli_state_encode(error: serde_json::Error) -> GalgameError {
    map_error("CLI_STATE_ENCODE", error)
}
