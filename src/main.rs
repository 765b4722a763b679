use clap::Parser;
use colored::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use codegen_client::cli::{parse_command, Args, Command, HELP};
use codegen_client::interrupt::Interrupts;
use codegen_client::{
    ClientConfig, ClientError, ControllerConfig, GenerationBackend, HttpBackend, TerminalView,
    UiController, View,
};

type Controller = UiController<HttpBackend, TerminalView>;

fn load_config(args: &Args) -> Result<ClientConfig, ClientError> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    config.apply_env()?;
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    if let Some(dir) = &args.download_dir {
        config.download_dir = dir.clone();
    }
    if let Some(secs) = args.timeout {
        config.request_timeout_secs = secs;
    }
    if args.no_enhance {
        config.enhance_prompt = false;
    }
    config.validate()?;
    Ok(config)
}

/// Run a network-bound controller call that Ctrl+C may abort.
async fn abortable<B, V, T, F>(
    controller: &UiController<B, V>,
    interrupts: &Interrupts,
    fut: F,
) -> Result<T, ClientError>
where
    B: GenerationBackend,
    V: View,
    F: std::future::Future<Output = Result<T, ClientError>>,
{
    let res = interrupts.run_abortable(fut).await;
    if matches!(res, Err(ClientError::Aborted)) {
        controller.cancel_in_flight();
        eprintln!("{}", "aborted".bright_red());
    }
    res
}

async fn print_history(controller: &Controller) -> Result<(), ClientError> {
    let entries = controller.fetch_history().await?;
    if entries.is_empty() {
        println!("{}", "No stored sessions.".bright_blue());
    }
    for entry in entries {
        let prompt = entry.prompt.as_deref().unwrap_or("");
        println!(
            "{}  {} {}",
            entry.id.bright_yellow(),
            format!("[{} files]", entry.files.len()).bright_blue(),
            prompt
        );
    }
    Ok(())
}

async fn run_once(
    controller: &Controller,
    interrupts: &Interrupts,
    args: &Args,
    enhance: bool,
) -> Result<(), ClientError> {
    if args.history {
        return abortable(controller, interrupts, print_history(controller)).await;
    }

    match (&args.open, &args.prompt) {
        (Some(id), _) => abortable(controller, interrupts, controller.open_history(id)).await?,
        (None, Some(prompt)) => {
            abortable(controller, interrupts, controller.submit_prompt(prompt, enhance)).await?
        }
        (None, None) => return Ok(()),
    }

    if let Some(index) = args.file {
        controller.select_file(index)?;
    }
    if args.download_all {
        abortable(controller, interrupts, controller.download_all()).await?;
    } else if args.download {
        abortable(controller, interrupts, controller.download_current()).await?;
    }
    Ok(())
}

async fn run_interactive(
    controller: &Controller,
    interrupts: &Interrupts,
    mut enhance: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("{}", "codegen-client: type a prompt, or :help".bright_cyan().bold());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprint!("{} ", ">".bright_green());
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(c) => c,
            Err(msg) => {
                eprintln!("{}", msg.bright_red());
                continue;
            }
        };

        // Failures have already been shown by the view; keep the loop alive.
        let _ = match command {
            Command::Prompt(p) => abortable(controller, interrupts, controller.submit_prompt(&p, enhance)).await,
            Command::Tab(n) => controller.select_file(n).map_err(|e| {
                eprintln!("{}", e.to_string().bright_red());
                e
            }),
            Command::Download => abortable(controller, interrupts, controller.download_current())
                .await
                .map(|_| ()),
            Command::DownloadAll => abortable(controller, interrupts, controller.download_all())
                .await
                .map(|_| ()),
            Command::History => abortable(controller, interrupts, print_history(controller)).await,
            Command::Open(id) => abortable(controller, interrupts, controller.open_history(&id)).await.map_err(|e| {
                if matches!(e, ClientError::UnknownSession(_)) {
                    eprintln!("{}", e.to_string().bright_red());
                }
                e
            }),
            Command::Enhance(on) => {
                enhance = on;
                eprintln!("prompt enhancement {}", if on { "on" } else { "off" });
                Ok(())
            }
            Command::Reload => {
                controller.reload();
                Ok(())
            }
            Command::Help => {
                eprintln!("{HELP}");
                Ok(())
            }
            Command::Quit => break,
            Command::Empty => Ok(()),
        };
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let interrupts = Interrupts::new();
    interrupts.install_ctrl_c();

    let args = Args::parse();
    let config = load_config(&args)?;
    let color = !args.no_color && std::env::var_os("NO_COLOR").is_none();

    let backend = HttpBackend::builder(config.base_url.clone())
        .connect_timeout(config.connect_timeout())
        .request_timeout(config.request_timeout())
        .build();
    let controller = UiController::new(
        backend,
        TerminalView::new(color),
        ControllerConfig {
            download_dir: config.download_dir.clone(),
            submit_timeout: config.request_timeout(),
        },
    );

    if args.prompt.is_some() || args.history || args.open.is_some() {
        let result = run_once(&controller, &interrupts, &args, config.enhance_prompt).await;
        // The view has already shown the failure; the loop can carry on from there.
        if !args.is_interactive() {
            result?;
        }
    }
    if args.is_interactive() {
        run_interactive(&controller, &interrupts, config.enhance_prompt).await?;
    }
    Ok(())
}
