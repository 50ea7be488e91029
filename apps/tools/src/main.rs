use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scenes_core::{load_settings, settings::load_settings_from, AppContext, Settings};
use shared::domain::Scene;
use storage::{LocalStorage, SceneStore, Storage};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scenes-tools", about = "Inspect and drive the persisted slideshow")]
struct Cli {
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    namespace: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every stored scene in order.
    List,
    /// Print the rendered markup of the mounted scene.
    Show,
    /// Click the mounted scene once.
    Advance,
    /// Restart the slideshow and click through it.
    Play {
        #[arg(long, default_value_t = 3)]
        steps: u32,
    },
    /// Remove every record in the namespace.
    Reset,
    /// List raw storage keys under the namespace.
    Keys,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli);

    match cli.command {
        Command::List => {
            let store = open_store(&settings).await?;
            let mut scenes = store.find_all().await?;
            scenes.sort_by_key(|scene| scene.order);
            for scene in &scenes {
                println!("{}", describe(scene));
            }
            println!("{} scene(s) in '{}'", scenes.len(), store.name());
        }
        Command::Show => {
            let context = AppContext::open(&settings).await?;
            match context.current() {
                Some(item) => {
                    println!("{}", item.html);
                    println!("{}", serde_json::to_string_pretty(&item.scene)?);
                }
                None => println!("no scene mounted"),
            }
            context.shutdown();
        }
        Command::Advance => {
            let mut context = AppContext::open(&settings).await?;
            let scene = context.advance().await?;
            println!("{}", describe(&scene));
            context.shutdown();
        }
        Command::Play { steps } => {
            let mut context = AppContext::open(&settings).await?;
            let opening = context.start().await?;
            println!("{}", describe(&opening));
            for _ in 0..steps {
                let scene = context.advance().await?;
                println!("{}", describe(&scene));
            }
            context.shutdown();
        }
        Command::Reset => {
            let store = open_store(&settings).await?;
            let removed = store.clear().await?;
            println!("removed {removed} scene(s) from '{}'", store.name());
        }
        Command::Keys => {
            let store = open_store(&settings).await?;
            for key in store.keys().await? {
                println!("{key}");
            }
        }
    }

    Ok(())
}

fn resolve_settings(cli: &Cli) -> Settings {
    let mut settings = match &cli.config {
        Some(path) => load_settings_from(path),
        None => load_settings(),
    };
    if let Some(database_url) = &cli.database_url {
        settings.database_url = database_url.clone();
    }
    if let Some(namespace) = &cli.namespace {
        settings.namespace = namespace.clone();
    }
    settings
}

async fn open_store(settings: &Settings) -> Result<LocalStorage> {
    let database_url = scenes_core::settings::normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url)
        .await
        .with_context(|| format!("failed to open '{database_url}'"))?;
    Ok(LocalStorage::new(storage, settings.namespace.clone()))
}

fn describe(scene: &Scene) -> String {
    format!(
        "#{} order={} {} {:?}",
        scene.scene_number,
        scene.order,
        scene.img_class,
        scene.instructions.as_deref().unwrap_or("")
    )
}
