use clap::{Args, Parser, Subcommand, ValueEnum};
use gg_api::CreateChatBridgeOptions;
use gg_chat::{ChatConfig, ChatMode};

#[derive(Debug, Parser)]
#[command(name = "gg-cli")]
#[command(about = "Galgame story player: agent line protocol and terminal UI")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Agent(AgentArgs),
    Tui(TuiArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Start(StartArgs),
    Advance(AdvanceArgs),
    Choose(ChooseArgs),
    Input(InputArgs),
    Chat(ChatArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ChatModeArg {
    Proxy,
    Completion,
    Offline,
}

impl From<ChatModeArg> for ChatMode {
    fn from(value: ChatModeArg) -> Self {
        match value {
            ChatModeArg::Proxy => ChatMode::Proxy,
            ChatModeArg::Completion => ChatMode::Completion,
            ChatModeArg::Offline => ChatMode::Offline,
        }
    }
}

/// Chat transport selection shared by `agent chat` and `tui`.
#[derive(Debug, Clone, Args)]
pub(crate) struct ChatOptions {
    #[arg(long = "chat-mode", value_enum, default_value_t = ChatModeArg::Offline)]
    pub(crate) chat_mode: ChatModeArg,
    #[arg(long = "chat-endpoint", env = "GALGAME_CHAT_ENDPOINT")]
    pub(crate) chat_endpoint: Option<String>,
    #[arg(long = "api-key", env = "GALGAME_API_KEY", hide_env_values = true)]
    pub(crate) api_key: Option<String>,
    #[arg(long = "model", env = "GALGAME_MODEL")]
    pub(crate) model: Option<String>,
    #[arg(long = "chat-timeout")]
    pub(crate) chat_timeout_secs: Option<u64>,
    #[arg(long = "seed")]
    pub(crate) seed: Option<u64>,
}

impl ChatOptions {
    pub(crate) fn bridge_options(&self) -> CreateChatBridgeOptions {
        CreateChatBridgeOptions {
            config: ChatConfig {
                mode: self.chat_mode.into(),
                endpoint: self.chat_endpoint.clone(),
                api_key: self.api_key.clone(),
                model: self.model.clone(),
                timeout_secs: self.chat_timeout_secs,
            },
            random_seed: self.seed,
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
    #[arg(long = "entry-script")]
    pub(crate) entry_script: Option<String>,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct AdvanceArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ChooseArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "choice")]
    pub(crate) choice: usize,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct InputArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "text")]
    pub(crate) text: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ChatArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "text")]
    pub(crate) text: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
    #[command(flatten)]
    pub(crate) chat: ChatOptions,
}

#[derive(Debug, Args)]
pub(crate) struct TuiArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
    #[arg(long = "entry-script")]
    pub(crate) entry_script: Option<String>,
    /// Local storage file holding the `galgame_save` entry.
    #[arg(long = "state-file")]
    pub(crate) state_file: Option<String>,
    #[arg(long = "log-file")]
    pub(crate) log_file: Option<String>,
    #[command(flatten)]
    pub(crate) chat: ChatOptions,
}
