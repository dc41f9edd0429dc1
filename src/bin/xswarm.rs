//! CLI entry point for the voice runtime (spec §6.1).

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use xswarm_voice::audio::device::DeviceConfig;
use xswarm_voice::condition::ConditionBuilder;
use xswarm_voice::config::VoiceConfig;
use xswarm_voice::dashboard::app::DashboardCommand;
use xswarm_voice::dashboard::{self, Dashboard, DashboardUpdate};
use xswarm_voice::memory::ConversationMemory;
use xswarm_voice::neural::stub::StubEngine;
use xswarm_voice::neural::SpeechEngine;
use xswarm_voice::persona::loader::{InMemoryPersonaLoader, PersonaLoader};
use xswarm_voice::persona::runtime::PersonaRuntime;
use xswarm_voice::persona::Persona;
use xswarm_voice::supervisor::{Supervisor, SupervisorDeps};
use xswarm_voice::VoiceError;

#[derive(Parser)]
#[command(name = "xswarm", version, about = "Local voice-first personal assistant")]
struct Cli {
    /// Path to a TOML configuration file; overrides the normal lookup chain.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// `error`, `warn`, `info`, `debug`, or `trace`.
    #[arg(long = "log-level", global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the voice runtime and open the dashboard (default).
    Run {
        /// Offline dev mode: clearly-marked dashboard, no strict device retry.
        #[arg(long)]
        dev: bool,
        /// Open the dashboard without starting the voice runtime.
        #[arg(long = "no-voice")]
        no_voice: bool,
    },
    /// Persona discovery commands.
    Personas {
        #[command(subcommand)]
        action: PersonasCommand,
    },
    /// Configuration commands.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Print the version string.
    Version,
}

#[derive(Subcommand)]
enum PersonasCommand {
    /// List discovered personas, one per line.
    List,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective merged configuration.
    Show,
}

/// `$XSWARM_PROJECT_DIR/config.toml` -> `~/.config/xswarm/config.toml` ->
/// built-in defaults (spec §6.3). Only TOML is implemented; this crate's
/// own [`VoiceConfig::from_toml`] is the narrow deserialization seam, file
/// discovery is this binary's job.
fn load_config(explicit: Option<&Path>) -> xswarm_voice::Result<VoiceConfig> {
    if let Some(path) = explicit {
        let text = std::fs::read_to_string(path)?;
        return VoiceConfig::from_toml(&text);
    }

    if let Ok(project_dir) = std::env::var("XSWARM_PROJECT_DIR") {
        let candidate = PathBuf::from(project_dir).join("config.toml");
        if candidate.is_file() {
            let text = std::fs::read_to_string(&candidate)?;
            return VoiceConfig::from_toml(&text);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let candidate = config_dir.join("xswarm").join("config.toml");
        if candidate.is_file() {
            let text = std::fs::read_to_string(&candidate)?;
            return VoiceConfig::from_toml(&text);
        }
    }

    Ok(VoiceConfig::default())
}

fn init_logging(log_level: &str) -> tracing_appender::non_blocking::WorkerGuard {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("xswarm")
        .join("logs");
    let appender = tracing_appender::rolling::daily(log_dir, "xswarm.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("xswarm_voice={log_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    guard
}

/// Maps a fatal error to the process exit code table in spec §6.1.
fn exit_code_for(err: &VoiceError) -> i32 {
    match err {
        VoiceError::PermissionDenied(_) => 2,
        VoiceError::NoDevice(_) | VoiceError::DeviceLost(_) | VoiceError::UnsupportedFormat(_) => 3,
        VoiceError::EngineLoad(_) => 4,
        _ => 1,
    }
}

fn breakpoints_from_config(config: &VoiceConfig) -> [u16; 4] {
    let bp = &config.layout.breakpoints;
    [
        bp.first().copied().unwrap_or(40),
        bp.get(1).copied().unwrap_or(60),
        bp.get(2).copied().unwrap_or(80),
        bp.get(3).copied().unwrap_or(120),
    ]
}

fn build_engine(config: &VoiceConfig) -> xswarm_voice::Result<Box<dyn SpeechEngine>> {
    #[cfg(feature = "onnx")]
    if let Some(path) = &config.engine.model_path {
        use xswarm_voice::neural::onnx::OnnxSpeechEngine;
        use xswarm_voice::neural::{LoadPhase, ModelDescriptor, ModelQuality};

        let quality = match config.engine.quality {
            xswarm_voice::config::Quality::Bf16 | xswarm_voice::config::Quality::Auto => ModelQuality::Bf16,
            xswarm_voice::config::Quality::Q8 => ModelQuality::Q8,
            xswarm_voice::config::Quality::Q4 => ModelQuality::Q4,
        };
        let descriptor = ModelDescriptor {
            quality,
            weights_path: PathBuf::from(path),
        };
        let on_progress = |phase: LoadPhase, pct: u8| info!("model load phase {phase:?}: {pct}%");
        let engine = OnnxSpeechEngine::load(&descriptor, &on_progress)?;
        return Ok(Box::new(engine));
    }

    info!("no model_path configured; using the deterministic stub engine");
    Ok(Box::new(StubEngine::new()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli.log_level);

    let exit_code = match cli.command.unwrap_or(Command::Run { dev: false, no_voice: false }) {
        Command::Version => {
            println!("xswarm {}", env!("CARGO_PKG_VERSION"));
            0
        }
        Command::Config { action: ConfigCommand::Show } => {
            let config = load_config(cli.config.as_deref())?;
            println!("{}", toml::to_string_pretty(&config)?);
            0
        }
        Command::Personas { action: PersonasCommand::List } => {
            let loader = InMemoryPersonaLoader::new(vec![Persona::fallback()]);
            for descriptor in loader.list_available() {
                println!("{}\t{}\t{}", descriptor.name, descriptor.version, descriptor.description);
            }
            0
        }
        Command::Run { dev, no_voice } => run(cli.config.as_deref(), dev, no_voice).await?,
    };

    std::process::exit(exit_code);
}

async fn run(config_path: Option<&Path>, dev: bool, no_voice: bool) -> anyhow::Result<i32> {
    if dev {
        for var in ["XSWARM_DEV_ADMIN_EMAIL", "XSWARM_DEV_ADMIN_PASS"] {
            if std::env::var(var).is_err() {
                warn!("--dev is set but {var} is not; dev-mode admin features will be unavailable");
            }
        }
    }

    let config = load_config(config_path)?;
    let persona_runtime = Arc::new(PersonaRuntime::new(
        Persona::fallback(),
        Box::new(InMemoryPersonaLoader::new(vec![Persona::fallback()])),
    ));
    let memory = Arc::new(ConversationMemory::new(
        config.memory.max_recent_messages,
        config.memory.max_archived_sessions,
    ));
    let condition_builder = Arc::new(ConditionBuilder::new());

    let (dash_tx, dash_rx) = tokio::sync::mpsc::channel::<DashboardUpdate>(128);
    let (cmd_tx, mut cmd_rx) = tokio::sync::mpsc::channel::<DashboardCommand>(32);

    let engine = build_engine(&config).map_err(|e| {
        let code = exit_code_for(&e);
        anyhow::anyhow!("{e}").context(format!("exit code {code}"))
    })?;

    let mut supervisor = Supervisor::new(SupervisorDeps {
        config: config.clone(),
        engine,
        persona_runtime: Arc::clone(&persona_runtime),
        memory: Arc::clone(&memory),
        condition_builder: Arc::clone(&condition_builder),
        dashboard_updates: dash_tx.clone(),
    });

    let input_cfg = DeviceConfig { device_name: config.audio.input_device.clone() };
    let output_cfg = DeviceConfig { device_name: config.audio.output_device.clone() };

    let exit_code = Arc::new(AtomicI32::new(0));

    if !no_voice {
        try_start_voice(&mut supervisor, &input_cfg, &output_cfg, &dash_tx, &exit_code).await;
    }

    let mut dashboard = Dashboard::new(breakpoints_from_config(&config));
    dashboard.set_dev_mode(dev);

    let mut terminal = dashboard::init_terminal()?;
    dashboard::install_panic_hook();

    let app_cancel = CancellationToken::new();
    let dispatcher_cancel = app_cancel.clone();
    let dispatcher_exit_code = Arc::clone(&exit_code);
    let dispatcher_dash_tx = dash_tx.clone();
    let dispatcher_persona_runtime = Arc::clone(&persona_runtime);

    let dispatcher = tokio::spawn(async move {
        while let Some(command) = cmd_rx.recv().await {
            match command {
                DashboardCommand::StartVoice => {
                    if !supervisor.is_running() {
                        try_start_voice(
                            &mut supervisor,
                            &input_cfg,
                            &output_cfg,
                            &dispatcher_dash_tx,
                            &dispatcher_exit_code,
                        )
                        .await;
                    }
                }
                DashboardCommand::SelectPersona(name) => match dispatcher_persona_runtime.load_by_name(&name) {
                    Ok(persona) => dispatcher_persona_runtime.swap(persona),
                    Err(e) => {
                        let (category, remediation) = e.user_message();
                        let _ = dispatcher_dash_tx
                            .send(DashboardUpdate::ErrorBanner(category, remediation))
                            .await;
                    }
                },
                DashboardCommand::Shutdown => {
                    supervisor.stop().await;
                    dispatcher_cancel.cancel();
                    break;
                }
                DashboardCommand::ToggleSettings
                | DashboardCommand::SettingsCursorUp
                | DashboardCommand::SettingsCursorDown
                | DashboardCommand::CycleMode
                | DashboardCommand::CopyStateDump => {}
            }
        }
    });

    let _ = dash_tx
        .send(DashboardUpdate::AvailablePersonas(persona_runtime.list_available()))
        .await;

    let run_result = dashboard.run(&mut terminal, dash_rx, cmd_tx, app_cancel).await;
    dashboard::restore_terminal(&mut terminal);
    let _ = dispatcher.await;

    run_result?;
    Ok(exit_code.load(Ordering::Relaxed))
}

async fn try_start_voice(
    supervisor: &mut Supervisor,
    input_cfg: &DeviceConfig,
    output_cfg: &DeviceConfig,
    dash_tx: &tokio::sync::mpsc::Sender<DashboardUpdate>,
    exit_code: &AtomicI32,
) {
    if let Err(e) = supervisor.start(input_cfg.clone(), output_cfg.clone()).await {
        exit_code.store(exit_code_for(&e), Ordering::Relaxed);
        let (category, remediation) = e.user_message();
        let _ = dash_tx.send(DashboardUpdate::ErrorBanner(category, remediation)).await;
    }
}
