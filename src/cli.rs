use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "codegen-client")]
#[command(version)]
#[command(about = "Send a prompt to a code-generation service, browse the generated files, download them")]
pub struct Args {
    /// Prompt describing the code to generate. Omit to start the interactive loop.
    pub prompt: Option<String>,

    /// Send the prompt as-is instead of letting the service enhance it
    #[arg(long)]
    pub no_enhance: bool,

    /// Base URL of the generation service
    #[arg(long, env = "CODEGEN_BASE_URL")]
    pub base_url: Option<String>,

    /// Directory downloaded files are written to
    #[arg(long, short = 'o')]
    pub download_dir: Option<PathBuf>,

    /// Generation request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// TOML config file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Show this tab (0-based) after generation instead of the first one
    #[arg(long)]
    pub file: Option<usize>,

    /// Download the displayed file after generation
    #[arg(long, short = 'd')]
    pub download: bool,

    /// Download every generated file after generation
    #[arg(long)]
    pub download_all: bool,

    /// List sessions stored by the service and exit
    #[arg(long)]
    pub history: bool,

    /// Open a stored session by id instead of generating
    #[arg(long, value_name = "ID")]
    pub open: Option<String>,

    /// Keep prompting after the first result
    #[arg(long, short)]
    pub interactive: bool,

    /// Disable colour output
    #[arg(long)]
    pub no_color: bool,
}

impl Args {
    pub fn is_interactive(&self) -> bool {
        self.interactive || (self.prompt.is_none() && !self.history && self.open.is_none())
    }
}

/// One line typed into the interactive loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Prompt(String),
    Tab(usize),
    Download,
    DownloadAll,
    History,
    Open(String),
    Enhance(bool),
    Reload,
    Help,
    Quit,
    Empty,
}

/// Parse a line of interactive input. Lines starting with `:` are commands;
/// everything else is a prompt.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Command::Prompt(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or("").to_lowercase();
    let arg = parts.next();
    match (name.as_str(), arg) {
        ("tab" | "t", Some(n)) => n
            .parse()
            .map(Command::Tab)
            .map_err(|_| format!("Not a tab number: {n}")),
        ("tab" | "t", None) => Err("Usage: :tab N".to_string()),
        ("download" | "d", _) => Ok(Command::Download),
        ("all" | "download-all", _) => Ok(Command::DownloadAll),
        ("history" | "h", _) => Ok(Command::History),
        ("open", Some(id)) => Ok(Command::Open(id.to_string())),
        ("open", None) => Err("Usage: :open ID".to_string()),
        ("enhance", Some("on")) => Ok(Command::Enhance(true)),
        ("enhance", Some("off")) => Ok(Command::Enhance(false)),
        ("enhance", _) => Err("Usage: :enhance on|off".to_string()),
        ("reload" | "r", _) => Ok(Command::Reload),
        ("help" | "?", _) => Ok(Command::Help),
        ("quit" | "q" | "exit", _) => Ok(Command::Quit),
        _ => Err(format!("Unknown command: :{name}")),
    }
}

pub const HELP: &str = "\
  <text>           generate code for <text>
  :tab N           show file N
  :download        download the shown file
  :all             download every file
  :history         list stored sessions
  :open ID         open a stored session
  :enhance on|off  toggle server-side prompt enhancement
  :reload          reset everything
  :quit            exit";
