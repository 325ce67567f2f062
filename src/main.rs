//! `arix` command-line entry point.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use arix::cli::{Cli, Commands, ConfigAction, MemoryAction};
use arix::gesture::GestureScript;
use arix::memory::{export_filename, FileStore, MemoryDraft, MemoryId, MemoryStore, PendingLoads, Persisted};
use arix::render::RecordingDelegate;
use arix::{NullPlayback, Scene, SceneConfig, Time};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) if path.exists() => SceneConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        Some(path) => {
            warn!(path = %path.display(), "Config file not found, using defaults");
            SceneConfig::default()
        }
        None => SceneConfig::default(),
    };

    match cli.command {
        Commands::Memories { action } => run_memories(action, &config)?,
        Commands::Simulate { frames, script } => run_simulate(config, frames, script)?,
        #[cfg(feature = "viewer")]
        Commands::View { photos } => run_view(config, photos)?,
        Commands::Config { action } => run_config(action, &config)?,
    }

    Ok(())
}

fn open_store(config: &SceneConfig) -> MemoryStore<FileStore> {
    let dir = config
        .storage
        .dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(".arix"));
    let backend = FileStore::new(dir).with_quota(config.storage.quota_bytes);
    MemoryStore::open(backend, config.storage.key.clone())
}

fn report(persisted: Persisted) {
    if let Persisted::Failed(e) = persisted {
        warn!(error = %e, "Change applied but not saved");
    }
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn run_memories(action: MemoryAction, config: &SceneConfig) -> anyhow::Result<()> {
    let mut store = open_store(config);
    match action {
        MemoryAction::List => {
            if store.is_empty() {
                println!("No memories yet.");
            }
            for memory in store.memories() {
                let music = if memory.music.is_some() { "music" } else { "-" };
                println!("{:<16} {:<6} {}", memory.id.to_string(), music, memory.name);
            }
        }
        MemoryAction::Add { name, photo, music } => {
            let mut draft = MemoryDraft::new(name, photo);
            if let Some(music) = music {
                draft = draft.with_music(music);
            }
            let id = MemoryId::fresh(store.memories().iter().map(|m| &m.id));
            let mut pending = PendingLoads::new();
            pending.submit(draft, id)?;
            for loaded in pending.wait_all() {
                let memory = loaded?;
                println!("Added {} ({})", memory.name, memory.id);
                report(store.add(memory)?);
            }
        }
        MemoryAction::Delete { id } => match store.delete(&MemoryId::parse(&id)) {
            Persisted::Unchanged => println!("No memory with id {id}"),
            outcome => report(outcome),
        },
        MemoryAction::Import { file, yes } => {
            let json = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            if !yes && !store.is_empty() && !confirm("Replace all current memories?")? {
                println!("Import cancelled.");
                return Ok(());
            }
            report(store.import_json(&json)?);
            println!("Imported {} memories", store.len());
        }
        MemoryAction::Export { output } => {
            let path = output
                .unwrap_or_else(|| PathBuf::from(export_filename(chrono::Local::now().date_naive())));
            fs::write(&path, store.export_json()?).with_context(|| format!("writing {}", path.display()))?;
            println!("Exported {} memories to {}", store.len(), path.display());
        }
    }
    Ok(())
}

fn run_simulate(config: SceneConfig, frames: u32, script: Option<PathBuf>) -> anyhow::Result<()> {
    let script = match script {
        Some(path) => load_script(&path)?,
        None => GestureScript::default(),
    };
    let store = open_store(&config);
    let mut scene = Scene::new(config, NullPlayback)?;
    scene.set_memories(store.memories());
    info!(frames, gestures = script.frames.len(), "Simulating");

    let mut time = Time::simulated(1.0 / 60.0);
    let mut last_ms = 0;
    for _ in 0..frames {
        let (elapsed, dt) = time.update();
        let now_ms = time.elapsed_ms();
        for gesture in script.window(last_ms, now_ms) {
            for action in scene.apply_gesture(gesture) {
                println!("{:>7} ms  {:?} -> {:?}", gesture.timestamp_ms, gesture.label, action);
            }
        }
        last_ms = now_ms;
        for event in scene.frame(dt, elapsed) {
            println!("{:>7} ms  {:?}", now_ms, event);
        }
    }

    let mut frame = RecordingDelegate::new();
    scene.render(&mut frame);
    println!(
        "t = {:.2}s  tree = {}  progress = {:.3}  instances = {}",
        scene.elapsed(),
        scene.is_tree_shape(),
        scene.progress(),
        frame.instance_count()
    );
    if let Some((group, item)) = scene.active() {
        println!("open gift: group {group}, id {} -> {}", item.particle_id, item.memory.name);
    }
    Ok(())
}

fn load_script(path: &Path) -> anyhow::Result<GestureScript> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let script = serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
    Ok(script)
}

#[cfg(feature = "viewer")]
fn run_view(config: SceneConfig, photos: Vec<PathBuf>) -> anyhow::Result<()> {
    let store = open_store(&config);
    let mut pending = PendingLoads::new();
    let mut ids: Vec<MemoryId> = Vec::new();
    for photo in photos {
        let name = photo
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Memory".to_string());
        let id = MemoryId::fresh(store.memories().iter().map(|m| &m.id).chain(ids.iter()));
        pending.submit(MemoryDraft::new(name, photo), id.clone())?;
        ids.push(id);
    }
    arix::viewer::run(config, store, pending)?;
    Ok(())
}

fn run_config(action: ConfigAction, config: &SceneConfig) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => println!("{}", serde_json::to_string_pretty(config)?),
        ConfigAction::Init { path, force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            SceneConfig::default().save(&path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
