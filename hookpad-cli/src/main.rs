// ABOUTME: Main entry point for the hookpad CLI application
// ABOUTME: Wires configuration, the SDK client, and the session context into each subcommand

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser};
use hookpad_cli::artifact::ImageArtifact;
use hookpad_cli::cli::{Cli, Commands};
use hookpad_cli::cli_output::CliOutput;
use hookpad_cli::completions::generate_completions;
use hookpad_cli::config::{self, Config};
use hookpad_cli::constants::limits;
use hookpad_cli::fitting::{
    Container, FitResult, FitterSnapshot, FixedContainer, ImageFitter, TerminalContainer,
};
use hookpad_cli::flow::{self, ContentOutcome, FlowEnv};
use hookpad_cli::output::{
    format_generated_image, format_hint, JsonFormatter, OutputFormat, TableFormatter,
};
use hookpad_cli::session::{self, AppContext, AutoSaver, HistoryEntry, StateFile};
use hookpad_sdk::{BackendConfig, HookpadClient, SessionStore};
use log::{debug, warn};
use secrecy::SecretString;
use std::env;
use std::io::{IsTerminal, Read};
use std::path::Path;
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Determine if color should be used
    let use_color = !cli.no_color
        && env::var("NO_COLOR").is_err()
        && env::var("TERM").unwrap_or_default() != "dumb"
        && std::io::stdout().is_terminal();
    let output = CliOutput::with_color(use_color && std::io::stderr().is_terminal());

    if let Err(err) = run(cli, use_color, &output).await {
        output.report(&err);
        std::process::exit(1);
    }
}

/// `--verbose` lowers the default filter to debug; an explicit RUST_LOG wins.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

async fn run(cli: Cli, use_color: bool, output: &CliOutput) -> Result<()> {
    let Cli {
        verbose,
        config: config_path,
        command,
        ..
    } = cli;

    match command {
        Commands::Completions { shell } => {
            generate_completions(shell, &mut Cli::command(), &mut std::io::stdout());
        }
        Commands::Fit {
            image,
            width,
            height,
            json,
            watch,
        } => {
            let config = load_config(config_path.as_deref())?;
            fit_image(&image, width.zip(height), json, watch, &config, use_color).await?;
        }
        Commands::Send { message } => {
            let (config, client, mut ctx) = connect(config_path.as_deref(), verbose).await?;
            let message = match message {
                Some(message) => message,
                None => read_stdin("message")?,
            };
            let message = message.trim();
            if message.is_empty() {
                return Err(anyhow!("Message is empty"));
            }

            let mut saver = session_saver(&client, &ctx);
            let env = FlowEnv {
                client: &client,
                config: &config,
                show_progress: std::io::stderr().is_terminal(),
            };

            let result = flow::process_message(&mut ctx, &env, saver.as_mut(), message).await;
            if let Some(saver) = saver.as_mut() {
                saver.flush(&ctx).await;
            }
            ctx.persist()?;
            let outcome = result?;

            println!("{}", outcome.editor);
            if let Some(image) = &outcome.image {
                println!("{}", format_generated_image(image, use_color));
            }
            if let Some(hint) = &outcome.hint {
                println!();
                println!("{}", format_hint(hint, use_color));
            }
            if outcome.quota_reached {
                output.warning(&format!(
                    "You have used all {} free messages. Run `hookpad login` to keep chatting.",
                    limits::MAX_FREE_MESSAGES
                ));
            }
        }
        Commands::Generate { file, out_dir } => {
            let (mut config, client, mut ctx) = connect(config_path.as_deref(), verbose).await?;
            match file.as_deref() {
                Some(path) if path == Path::new("-") => {
                    ctx.set_editor_content(read_stdin("editor content")?)
                }
                Some(path) => ctx.set_editor_content(
                    std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None => {}
            }
            if out_dir.is_some() {
                config.output_dir = out_dir;
            }

            let env = FlowEnv {
                client: &client,
                config: &config,
                show_progress: std::io::stderr().is_terminal(),
            };
            let outcome =
                flow::send_editor_content(&ctx, &env, Box::new(TerminalContainer::new())).await?;
            ctx.persist()?;

            match outcome {
                ContentOutcome::Text(text) => println!("{}", text),
                ContentOutcome::Image(image) => {
                    println!("{}", format_generated_image(&image, use_color))
                }
            }
        }
        Commands::History { json, pretty } => {
            let (_, client, ctx) = connect(config_path.as_deref(), verbose).await?;
            if ctx.user().is_none() {
                return Err(anyhow!("Sign in to see saved sessions. Run `hookpad login`"));
            }
            let records = session::load_history(&ctx, &*client).await;
            let entries: Vec<HistoryEntry> = records
                .iter()
                .map(|record| HistoryEntry::from_record(record, ctx.session_id()))
                .collect();

            let formatted = if json {
                JsonFormatter::new(pretty).format_history(&entries)?
            } else {
                TableFormatter::new(use_color).format_history(&entries)?
            };
            println!("{}", formatted);
        }
        Commands::Open { session_id } => {
            let (_, client, mut ctx) = connect(config_path.as_deref(), verbose).await?;
            if ctx.user().is_none() {
                return Err(anyhow!("Sign in to open saved sessions. Run `hookpad login`"));
            }
            let records = session::load_history(&ctx, &*client).await;
            let record = records
                .iter()
                .find(|record| record.session_id == session_id)
                .ok_or_else(|| anyhow!("Session {} not found in your history", session_id))?;

            ctx.open_session(record);
            ctx.persist()?;
            println!("{}", ctx.editor_content());
        }
        Commands::New => {
            let mut ctx = AppContext::restore(StateFile::default_location()?)?;
            ctx.start_new_session();
            ctx.persist()?;
            output.success(&format!("Started new session {}", ctx.session_id()));
        }
        Commands::Whoami => {
            let (_, _, ctx) = connect(config_path.as_deref(), verbose).await?;
            match ctx.user() {
                Some(user) => {
                    println!("{} <{}>", user.display_name(), user.email);
                    println!("Messages: unlimited");
                }
                None => {
                    println!("Not signed in");
                    println!(
                        "Free messages left: {}",
                        limits::MAX_FREE_MESSAGES.saturating_sub(ctx.message_count())
                    );
                }
            }
        }
        Commands::Login { secret } => {
            let config = load_config(config_path.as_deref())?;
            let secret = match secret {
                Some(secret) => secret,
                None => read_stdin("session secret")?,
            };
            let secret = secret.trim().to_string();
            if secret.is_empty() {
                return Err(anyhow!("Session secret is empty"));
            }

            let client =
                build_client(&config, verbose, Some(SecretString::from(secret.clone()))).await?;
            let user = client
                .current_user()
                .await
                .context("Failed to verify session secret")?;
            hookpad_sdk::storage::store(&secret)?;

            output.success(&format!("Signed in as {}", user.display_name()));
        }
        Commands::Logout => {
            let (_, client, mut ctx) = connect(config_path.as_deref(), verbose).await?;
            if client.has_session() {
                if let Err(e) = client.sign_out().await {
                    warn!("Sign out failed: {}", e);
                }
            }
            if let Err(e) = hookpad_sdk::storage::clear() {
                debug!("No stored session secret to clear: {}", e);
            }
            ctx.sign_out();
            ctx.persist()?;
            output.success("Signed out");
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path),
        None => Config::load(),
    }
}

/// Load config, build the client, and restore the session context with the
/// signed-in user resolved.
async fn connect(
    config_path: Option<&Path>,
    verbose: bool,
) -> Result<(Config, Arc<HookpadClient>, AppContext)> {
    let config = load_config(config_path)?;
    let client = Arc::new(build_client(&config, verbose, None).await?);
    let mut ctx = AppContext::restore(StateFile::default_location()?)?;
    ctx.set_user(resolve_user(&client).await);
    Ok((config, client, ctx))
}

/// Build the SDK client from the config, fetching the backend record when
/// only its URL is configured.
async fn build_client(
    config: &Config,
    verbose: bool,
    session_override: Option<SecretString>,
) -> Result<HookpadClient> {
    let backend = match (config.backend_config(), config.backend_config_url()) {
        (Some(backend), _) => Some(backend),
        (None, Some(url)) => Some(
            BackendConfig::fetch(&reqwest::Client::new(), url)
                .await
                .context("Failed to fetch backend configuration")?,
        ),
        (None, None) => None,
    };

    let session_secret = session_override.or_else(config::session_secret);

    HookpadClient::builder()
        .backend(backend)
        .api_key(config::api_key())
        .session_secret(session_secret)
        .verbose(verbose)
        .build()
        .context("Failed to create client")
}

/// The signed-in user, or `None` when signed out or the backend cannot
/// confirm the session.
async fn resolve_user(client: &HookpadClient) -> Option<hookpad_sdk::User> {
    if !client.has_session() || client.backend().is_none() {
        return None;
    }
    match client.current_user().await {
        Ok(user) => {
            debug!("User authenticated: {}", user.id);
            Some(user)
        }
        Err(e) => {
            warn!("User not authenticated: {}", e);
            None
        }
    }
}

fn session_saver(client: &Arc<HookpadClient>, ctx: &AppContext) -> Option<AutoSaver> {
    if client.backend().is_none() || ctx.user().is_none() {
        return None;
    }
    let store: Arc<dyn SessionStore> = client.clone();
    Some(AutoSaver::new(store))
}

fn read_stdin(what: &str) -> Result<String> {
    if std::io::stdin().is_terminal() {
        eprintln!("Enter {} (Ctrl-D to finish):", what);
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .with_context(|| format!("Failed to read {} from stdin", what))?;
    Ok(buffer)
}

async fn fit_image(
    path: &Path,
    size: Option<(u32, u32)>,
    json: bool,
    watch: bool,
    config: &Config,
    use_color: bool,
) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))?;
    let mut artifact = ImageArtifact::from_bytes(bytes, None)?;
    let (width, height) = artifact
        .load()
        .with_context(|| format!("Failed to read image header of {}", path.display()))?;

    let container: Box<dyn Container> = match size {
        Some((w, h)) => Box::new(FixedContainer::new("fixed", f64::from(w), f64::from(h))),
        None => Box::new(TerminalContainer::new()),
    };

    let mut fitter = ImageFitter::new(config.fit_config());
    fitter.observe_container(container);
    let id = fitter.add_image(artifact);

    let formatter: Box<dyn OutputFormat> = if json {
        Box::new(JsonFormatter::new(false))
    } else {
        Box::new(TableFormatter::new(use_color))
    };

    if watch {
        return watch_fit(fitter, formatter.as_ref()).await;
    }

    let fit = fitter
        .image(id)
        .and_then(|image| image.fit().copied())
        .unwrap_or_else(|| fitter.calculate(width, height));
    println!(
        "{}",
        formatter.format_fit(fitter.container_dimensions(), &fit)?
    );
    Ok(())
}

fn print_snapshot(snapshot: &FitterSnapshot, formatter: &dyn OutputFormat) -> Result<()> {
    let fit: Option<&FitResult> = snapshot.fits.first().and_then(Option::as_ref);
    if let Some(fit) = fit {
        println!("{}", formatter.format_fit(snapshot.container, fit)?);
    }
    Ok(())
}

#[cfg(unix)]
async fn watch_fit(fitter: ImageFitter, formatter: &dyn OutputFormat) -> Result<()> {
    use hookpad_cli::fitting::{ResizeEvent, ResizeObserver};
    use tokio::signal::unix::{signal, SignalKind};

    let observer = ResizeObserver::spawn(fitter);
    let mut updates = observer.subscribe();
    let mut resizes =
        signal(SignalKind::window_change()).context("Failed to listen for terminal resizes")?;
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    let initial = updates.borrow_and_update().clone();
    print_snapshot(&initial, formatter)?;

    loop {
        tokio::select! {
            _ = &mut interrupted => break,
            Some(()) = resizes.recv() => observer.send(ResizeEvent::WindowResized)?,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_snapshot(&snapshot, formatter)?;
            }
        }
    }

    observer.shutdown().await?;
    Ok(())
}

#[cfg(not(unix))]
async fn watch_fit(_fitter: ImageFitter, _formatter: &dyn OutputFormat) -> Result<()> {
    Err(anyhow!("--watch is only supported on Unix terminals"))
}
