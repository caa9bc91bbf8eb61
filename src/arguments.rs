/// Centralized access to raw command-line arguments
///
/// `clap` parses the command surface in `main.rs`; this module keeps the
/// process-wide copy of the raw arguments so that the logger and the debug
/// flag helpers can inspect `--debug-<module>` style flags from anywhere.
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Override the stored arguments (used by tools and tests)
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Value following a flag, e.g. `--limit 50`
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// =============================================================================

pub fn is_debug_api_enabled() -> bool {
    has_arg("--debug-api")
}

pub fn is_debug_webserver_enabled() -> bool {
    has_arg("--debug-webserver")
}

/// Flags that `clap` must tolerate because the logger consumes them
pub fn is_logger_flag(arg: &str) -> bool {
    arg.starts_with("--debug-")
        || arg.starts_with("--verbose")
        || arg == "--quiet"
        || arg == "--no-log-file"
}

/// Debug modes enabled on the command line (without the `--debug-` prefix)
pub fn get_enabled_debug_modes() -> Vec<String> {
    get_cmd_args()
        .iter()
        .filter_map(|a| a.strip_prefix("--debug-").map(|s| s.to_string()))
        .collect()
}
