use hope_radio::audio::{
    EngineCollaborators, EngineConfig, LocalFocusArbiter, LocalRouteMonitor, SimulatedBackendFactory,
};
use hope_radio::config::Settings;
use hope_radio::init_app_dirs;
use hope_radio::metadata::HttpMetadataSource;
use hope_radio::player::{self, Player, PlayerError, PlayerHandle};
use hope_radio::service::AudioService;
use hope_radio::ui::{format_snapshot, format_track_menu, Cli, ConsoleCommand, ConsoleStatusSurface};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LOG_TARGET: &str = "hope_radio::main";

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

struct Simulators {
    focus: Arc<LocalFocusArbiter>,
    route: Arc<LocalRouteMonitor>,
}

async fn run_console_command(
    cli: &Cli,
    command: ConsoleCommand,
    handle: &PlayerHandle,
    simulators: &Simulators,
) -> Result<(), PlayerError> {
    match command {
        ConsoleCommand::Play => handle.play().await?,
        ConsoleCommand::Pause => handle.pause().await?,
        ConsoleCommand::Stop => handle.stop().await?,
        ConsoleCommand::Track(id) => handle.select_track(id).await?,
        ConsoleCommand::Tracks => println!("{}", format_track_menu(&handle.tracks().await?)),
        ConsoleCommand::Status => println!("{}", format_snapshot(&handle.snapshot().await?)),
        ConsoleCommand::Focus(change) => {
            if !simulators.focus.simulate(change) {
                println!("Nobody holds audio focus.");
            }
        }
        ConsoleCommand::Unplug => {
            if !simulators.route.unplug() {
                println!("Nothing is listening for route changes.");
            }
        }
        ConsoleCommand::Help => cli.display_help(),
        // Handled by the caller
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::new();
    init_tracing(cli.args.log_json);

    init_app_dirs()?;
    let config_path = match &cli.args.config {
        Some(path) => Path::new(path).to_path_buf(),
        None => Settings::default_path(),
    };
    let settings = Settings::load(&config_path)?;
    settings.validate()?;
    info!(target: LOG_TARGET, "Using config {}", config_path.display());

    // --- Wiring ---
    let (handle, events) = player::channel(settings.command_buffer_size);
    let simulators = Simulators {
        focus: Arc::new(LocalFocusArbiter::new(handle.clone())),
        route: Arc::new(LocalRouteMonitor::new(handle.clone())),
    };
    let collaborators = EngineCollaborators {
        backend_factory: Arc::new(SimulatedBackendFactory::default()),
        focus_provider: simulators.focus.clone(),
        route_monitor: simulators.route.clone(),
    };
    let metadata_source = Arc::new(HttpMetadataSource::new(settings.info_url.clone())?);
    let service = Arc::new(AudioService::new(
        handle.clone(),
        Arc::new(ConsoleStatusSurface),
        metadata_source,
        &settings,
    ));

    let mut player = Player::new(
        EngineConfig::from(&settings),
        collaborators,
        service.clone(),
        handle.clone(),
        events,
        settings.state_update_capacity,
    );
    let mut updates = player.subscribe_updates();
    let player_task = tokio::spawn(async move { player.run().await });

    let render_task = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(update) => println!("{}", hope_radio::ui::format_update(&update)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(target: LOG_TARGET, "Display lagged behind by {} updates.", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    if cli.args.autoplay {
        handle.play().await?;
    }

    // --- Console loop ---
    cli.display_help();
    let mut stop_requested = service.stop_requested();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            changed = stop_requested.changed() => {
                if changed.is_err() || *stop_requested.borrow() {
                    info!(target: LOG_TARGET, "Idle stop requested, exiting.");
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match ConsoleCommand::parse(&line) {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = run_console_command(&cli, command, &handle, &simulators).await {
                            cli.display_error(&e);
                            break;
                        }
                    }
                    Err(message) => eprintln!("{}", message),
                }
            }
        }
    }

    // --- Teardown ---
    match handle.shutdown().await {
        Ok(()) | Err(PlayerError::ChannelClosed) => {}
        Err(e) => cli.display_error(&e),
    }
    player_task.await?;
    service.destroy();
    render_task.abort();
    Ok(())
}
