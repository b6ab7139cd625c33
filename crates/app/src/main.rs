use std::{
    io::{self, BufRead},
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, TryRecvError},
    thread,
    time::Duration,
};

use character_showcase_core::{
    import_gltf, AppConfig, ConsolePresentation, FrameClock, GltfLoader, Showcase,
    ShowcaseManifest, SilentTrack, Track,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "playback")]
mod playback;

fn main() -> character_showcase_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            manifest,
            config,
            assets,
            mute,
        } => run_showcase(manifest.as_deref(), config.as_deref(), &assets, mute),
        Commands::Catalog { manifest } => print_catalog(manifest.as_deref()),
        Commands::Inspect { file } => inspect(&file),
    }
}

fn load_manifest(path: Option<&Path>) -> character_showcase_core::Result<ShowcaseManifest> {
    match path {
        Some(path) => ShowcaseManifest::from_path(path),
        None => Ok(ShowcaseManifest::builtin()),
    }
}

fn run_showcase(
    manifest: Option<&Path>,
    config: Option<&Path>,
    assets: &Path,
    mute: bool,
) -> character_showcase_core::Result<()> {
    let mut config = match config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };
    config.audio.muted |= mute;

    let (catalog, props) = load_manifest(manifest)?.into_parts()?;
    tracing::info!(
        characters = catalog.len(),
        props = props.len(),
        assets = %assets.display(),
        "starting showcase"
    );
    let loader = GltfLoader::new(assets);

    #[cfg(feature = "playback")]
    {
        if !config.audio.muted {
            let output = playback::AudioOutput::open()?;
            let volume = config.audio.volume;
            let showcase = Showcase::new(
                catalog,
                props,
                config,
                loader,
                ConsolePresentation::default(),
                |entry| output.track(&assets.join(&entry.audio_path), volume),
            )?;
            return drive(showcase);
        }
    }

    #[cfg(not(feature = "playback"))]
    {
        if !config.audio.muted {
            tracing::warn!("built without the `playback` feature, music stays silent");
        }
    }

    let showcase = Showcase::new(
        catalog,
        props,
        config,
        loader,
        ConsolePresentation::default(),
        |_| Ok(SilentTrack::new()),
    )?;
    drive(showcase)
}

/// Frame loop: applies stdin commands, then ticks the showcase.
fn drive<T: Track>(
    mut showcase: Showcase<GltfLoader, T, ConsolePresentation>,
) -> character_showcase_core::Result<()> {
    showcase.start()?;

    let commands = spawn_stdin_reader()?;
    let frame = Duration::from_secs_f32(showcase.config().frame_rate.frame_seconds());
    let mut clock = FrameClock::start();
    tracing::info!("controls: up/down change character, left/right rotate, h next animation, q quit");

    loop {
        loop {
            match commands.try_recv() {
                Ok(Command::Quit) | Err(TryRecvError::Disconnected) => {
                    tracing::info!("leaving showcase");
                    return Ok(());
                }
                Ok(Command::Click) => showcase.on_click(),
                Ok(Command::Key(key)) => {
                    if showcase.handle_key(&key).is_none() {
                        tracing::debug!(%key, "ignored key");
                    }
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        showcase.tick(clock.delta());
        thread::sleep(frame);
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    Key(String),
    Click,
    Quit,
}

/// Translates a typed line into a command. Short arrow names are expanded to
/// their key identifiers; anything else is passed through as a key.
fn parse_command(line: &str) -> Option<Command> {
    let word = line.trim();
    if word.is_empty() {
        return None;
    }
    let command = match word.to_lowercase().as_str() {
        "q" | "quit" | "exit" => Command::Quit,
        "click" => Command::Click,
        "up" => Command::Key("ArrowUp".to_string()),
        "down" => Command::Key("ArrowDown".to_string()),
        "left" => Command::Key("ArrowLeft".to_string()),
        "right" => Command::Key("ArrowRight".to_string()),
        _ => Command::Key(word.to_string()),
    };
    Some(command)
}

fn spawn_stdin_reader() -> character_showcase_core::Result<Receiver<Command>> {
    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-keys".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if let Some(command) = parse_command(&line) {
                    if sender.send(command).is_err() {
                        break;
                    }
                }
            }
        })?;
    Ok(receiver)
}

fn print_catalog(manifest: Option<&Path>) -> character_showcase_core::Result<()> {
    let (catalog, props) = load_manifest(manifest)?.into_parts()?;
    for (index, entry) in catalog.entries().iter().enumerate() {
        println!(
            "{index}: {} [{}] {}",
            entry.display_name,
            entry.key,
            entry.asset_path.display()
        );
        println!("   animations: {}", entry.allowed_animations.join(", "));
    }
    for prop in &props {
        println!("prop {} x{}: {}", prop.name, prop.instances.len(), prop.asset_path.display());
    }
    Ok(())
}

fn inspect(file: &Path) -> character_showcase_core::Result<()> {
    tracing::info!(file = %file.display(), "inspecting asset");
    let asset = import_gltf(file)?;
    println!(
        "{}: {} nodes, {} meshes",
        asset.scene.name, asset.scene.node_count, asset.scene.mesh_count
    );
    for clip in &asset.clips {
        println!("  {} ({:.2}s)", clip.name, clip.duration_seconds);
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Keyboard-driven 3D character showcase", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the showcase, reading keys from stdin.
    Run {
        /// Showcase manifest (JSON). Uses the built-in catalog when omitted.
        #[arg(short, long)]
        manifest: Option<PathBuf>,
        /// Application configuration (JSON).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory that asset paths are resolved against.
        #[arg(short, long, default_value = ".")]
        assets: PathBuf,
        /// Keep the background music silent.
        #[arg(long)]
        mute: bool,
    },
    /// Print the characters and props of a manifest.
    Catalog {
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
    /// Import a glTF file and list its animation clips.
    Inspect {
        /// Path to a `.gltf` or `.glb` file.
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_short_arrow_names() {
        assert_eq!(parse_command("up"), Some(Command::Key("ArrowUp".to_string())));
        assert_eq!(parse_command(" Right "), Some(Command::Key("ArrowRight".to_string())));
        assert_eq!(parse_command("ArrowDown"), Some(Command::Key("ArrowDown".to_string())));
        assert_eq!(parse_command("h"), Some(Command::Key("h".to_string())));
    }

    #[test]
    fn recognises_control_words() {
        assert_eq!(parse_command("q"), Some(Command::Quit));
        assert_eq!(parse_command("click"), Some(Command::Click));
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from(["character-showcase", "run", "--assets", "public", "--mute"])
            .unwrap();
        match cli.command {
            Commands::Run { assets, mute, manifest, .. } => {
                assert_eq!(assets, PathBuf::from("public"));
                assert!(mute);
                assert!(manifest.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
