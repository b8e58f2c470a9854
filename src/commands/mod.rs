pub type CmdResult<T> = stagehand::Result<(T, i32)>;

pub mod code;
pub mod config;
pub mod content;
pub mod env;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run_json($args))
    };
}

pub(crate) fn run_json(command: crate::Commands) -> (stagehand::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Content(args) => dispatch!(args, content),
        crate::Commands::Code(args) => dispatch!(args, code),
        crate::Commands::Env(args) => dispatch!(args, env),
        crate::Commands::Config(args) => dispatch!(args, config),
    }
}
