use std::io::{BufRead as _, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use orbitreel::{
    Clock, Fps, JsonLinesFrontend, ManualClock, RunOutcome, Scene, SceneManifest, SystemClock,
};

#[derive(Parser, Debug)]
#[command(name = "orbitreel", version)]
struct Cli {
    /// Log debug output to stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the datasets and playback script of a scene.
    Inspect(InspectArgs),
    /// Render a single scrub value as JSON.
    Frame(FrameArgs),
    /// Run the playback script, writing one JSON object per line.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input scene manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input scene manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Scrub value in [0, 1].
    #[arg(long)]
    scrub: f64,

    /// Playback clock in seconds, for view spin.
    #[arg(long, default_value_t = 0.0)]
    clock: f64,

    /// Output path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input scene manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output NDJSON path, `-` for stdout.
    #[arg(long, default_value = "-")]
    out: String,

    /// Override the manifest tick rate (integer frames per second).
    #[arg(long)]
    fps: Option<u32>,

    /// Pace ticks against wall-clock time instead of running flat out.
    #[arg(long, default_value_t = false)]
    realtime: bool,

    /// Wait for Enter on stdin at wait-for-input segments instead of continuing.
    #[arg(long, default_value_t = false)]
    interactive: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let scene = Scene::from_path(&args.in_path)?;
    let state = scene.state();

    let datasets: Vec<_> = state
        .layers()
        .iter()
        .map(|layer| {
            let ds = layer.dataset();
            serde_json::json!({
                "name": ds.name(),
                "role": ds.role(),
                "steps": ds.len(),
                "entities": ds.entity_count(),
                "dims": ds.dims(),
                "time": ds.time_base(),
                "trace": layer.trace(),
                "status": layer.status().is_some(),
            })
        })
        .collect();
    let summary = serde_json::json!({
        "display": scene.display(),
        "system": scene.system(),
        "fps": scene.opts().fps,
        "entities": state.entity_count(),
        "datasets": datasets,
        "highlights": state.highlights().iter().map(|h| &h.name).collect::<Vec<_>>(),
        "statics": state.statics()?.len(),
        "playback": scene.playback(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let scene = Scene::from_path(&args.in_path)?;
    let frame = scene.state().render_at(args.scrub, args.clock)?;
    let json = serde_json::to_string_pretty(&frame)?;

    match args.out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(&path, json)
                .with_context(|| format!("write frame '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let mut manifest = SceneManifest::from_path(&args.in_path)?;
    if let Some(fps) = args.fps {
        manifest.fps = Fps::new(fps, 1)?;
    }
    let scene = Scene::from_manifest(&manifest)?;

    let out: Box<dyn Write> = if args.out == "-" {
        Box::new(std::io::stdout().lock())
    } else {
        let path = PathBuf::from(&args.out);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        let f = std::fs::File::create(&path)
            .with_context(|| format!("create output '{}'", path.display()))?;
        Box::new(f)
    };
    let frontend = JsonLinesFrontend::new(BufWriter::new(out));

    let lines = if args.realtime {
        play(scene, frontend, SystemClock::default(), args.interactive)?
    } else {
        play(scene, frontend, ManualClock::new(), args.interactive)?
    };

    if args.out != "-" {
        eprintln!("wrote {} ({lines} lines)", args.out);
    }
    Ok(())
}

fn play<W: Write, C: Clock>(
    scene: Scene,
    frontend: JsonLinesFrontend<W>,
    clock: C,
    interactive: bool,
) -> anyhow::Result<u64> {
    let mut driver = scene.into_driver(frontend, clock)?;
    loop {
        match driver.run_until_idle()? {
            RunOutcome::WaitingForInput => {
                if interactive {
                    eprintln!("press Enter to continue");
                    let mut line = String::new();
                    std::io::stdin()
                        .lock()
                        .read_line(&mut line)
                        .context("read stdin")?;
                }
                driver.proceed();
            }
            RunOutcome::Idle | RunOutcome::Paused | RunOutcome::Cancelled => break,
        }
    }
    let (frontend, stats) = driver.finish()?;
    tracing::info!(
        ticks = stats.ticks,
        presented = stats.frames_presented,
        elided = stats.frames_elided,
        "playback done"
    );
    Ok(frontend.lines())
}
