/// Cadence - headless music player for the catalog proxy
use anyhow::{bail, Context, Result};
use cadence_cli::session::describe;
use cadence_cli::{watch, AppConfig, SessionEnd, SimulatedDevice};
use cadence_client::CatalogClient;
use cadence_core::{IdentityProvider, StateStore};
use cadence_playback::{PlaybackController, PlaybackEvent};
use cadence_storage::{MemoryStateStore, SqliteStateStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Headless Cadence player", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./cadence.toml if present)
    #[arg(short, long, global = true, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog
    Search {
        keyword: String,
        /// Result page, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Print the lyrics of a track
    Lyrics {
        /// Track identifier (songmid)
        id: String,
    },
    /// Show the signed-in user's playback history
    History,
    /// Search and play the results as a queue
    Play {
        keyword: String,
        /// Queue position to start from, starting at 0
        #[arg(short, long, default_value_t = 0)]
        start: usize,
    },
    /// Continue the queue saved by the last session
    Resume,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence=info,cadence_playback=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let client = Arc::new(CatalogClient::new(config.catalog.clone())?);

    match cli.command {
        Commands::Search { keyword, page } => search(&client, &keyword, page).await?,
        Commands::Lyrics { id } => lyrics(&client, &id).await?,
        Commands::History => history(&config, &client).await?,
        Commands::Play { keyword, start } => play(&config, client, &keyword, start).await?,
        Commands::Resume => resume(&config, client).await?,
    }

    Ok(())
}

async fn search(client: &CatalogClient, keyword: &str, page: u32) -> Result<()> {
    let page = client.search(keyword, page).await?;
    if page.tracks.is_empty() {
        println!("No results for \"{keyword}\"");
        return Ok(());
    }

    for (i, track) in page.tracks.iter().enumerate() {
        println!("{:>3}. {}  [{}]", i, describe(track), track.id);
    }
    if !page.is_end {
        println!("(more results available)");
    }
    Ok(())
}

async fn lyrics(client: &CatalogClient, id: &str) -> Result<()> {
    let lyrics = client.lyrics(id).await?;
    if lyrics.raw_lrc.is_empty() {
        println!("No lyrics for {id}");
        return Ok(());
    }

    println!("{}", lyrics.raw_lrc);
    if let Some(translation) = lyrics.translation.filter(|t| !t.is_empty()) {
        println!("\n{translation}");
    }
    Ok(())
}

async fn history(config: &AppConfig, client: &CatalogClient) -> Result<()> {
    let Some(user) = config.identity().current_user() else {
        bail!("No user configured (set user.email or CADENCE_USER__EMAIL)");
    };

    let entries = client.playback_history(&user).await?;
    if entries.is_empty() {
        println!("No playback history");
    }
    for entry in entries {
        println!(
            "{}  {} - {}",
            entry.played_at.format("%Y-%m-%d %H:%M"),
            entry.title,
            entry.artist
        );
    }
    Ok(())
}

async fn play(
    config: &AppConfig,
    client: Arc<CatalogClient>,
    keyword: &str,
    start: usize,
) -> Result<()> {
    let page = client.search(keyword, 1).await?;
    if page.tracks.is_empty() {
        println!("No results for \"{keyword}\"");
        return Ok(());
    }

    let session = Session::start(config, client).await?;
    session.controller.play_queue(page.tracks, start).await;
    session.run().await
}

async fn resume(config: &AppConfig, client: Arc<CatalogClient>) -> Result<()> {
    let session = Session::start(config, client).await?;
    let view = session.controller.view();

    let Some(index) = view.current_index else {
        println!("Nothing to resume");
        return Ok(());
    };
    session.controller.play_at(index, None).await;
    session.run().await
}

/// A wired controller with a simulated device and a restored state
struct Session {
    controller: PlaybackController,
    events: tokio::sync::broadcast::Receiver<PlaybackEvent>,
    _device: Arc<SimulatedDevice>,
}

impl Session {
    async fn start(config: &AppConfig, client: Arc<CatalogClient>) -> Result<Self> {
        let store = open_store(config).await?;

        let controller = PlaybackController::builder(client.clone())
            .config(config.playback.clone())
            .store(store)
            .history(client, Arc::new(config.identity()))
            .build();

        let (device, transport_events) = SimulatedDevice::new(config.device.clone());
        controller.attach(device.clone())?;
        device.spawn_clock();

        let listener = controller.clone();
        tokio::spawn(async move { listener.run_transport_events(transport_events).await });

        controller.restore().await;
        let events = controller.subscribe();

        Ok(Self {
            controller,
            events,
            _device: device,
        })
    }

    /// Print playback events until the queue finishes, stalls, or Ctrl-C
    async fn run(mut self) -> Result<()> {
        let end = watch(&self.controller, &mut self.events, tokio::signal::ctrl_c()).await;
        self.controller.persist_now().await;

        if end == SessionEnd::Stalled {
            bail!("Playback stopped before the queue finished");
        }
        Ok(())
    }
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn StateStore>> {
    if !config.storage.persist {
        return Ok(Arc::new(MemoryStateStore::new()));
    }

    if let Some(parent) = config
        .storage
        .database_path()
        .as_deref()
        .and_then(|path| path.parent())
    {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let pool = cadence_storage::create_pool(&config.storage.database_url).await?;
    cadence_storage::run_migrations(&pool).await?;
    Ok(Arc::new(SqliteStateStore::new(pool)))
}
