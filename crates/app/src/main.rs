mod scene;

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use clap::{Parser, Subcommand};
use scene::{PointField, SdlRandom};
use sdl3_binding_core::{
    dispatch, ffi::SDL_SCANCODE_ESCAPE, library, BindingConfig, Context, Event, LibraryHost,
    LibraryResolver, SdlBackend, WindowFlags, WindowId, CALL_DESCRIPTORS,
};
use tracing_subscriber::EnvFilter;

fn main() -> sdl3_binding_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref(), &cli.library_dir)?;

    match cli.command {
        Commands::Run { frames } => run_demo(&config, frames),
        Commands::Probe => run_probe(&config),
    }
}

fn load_config(path: Option<&PathBuf>, library_dirs: &[PathBuf]) -> sdl3_binding_core::Result<BindingConfig> {
    let mut config = match path {
        Some(path) => BindingConfig::from_path(path)?,
        None => BindingConfig::default(),
    };
    config.library.search_dirs.extend(library_dirs.iter().cloned());
    Ok(config)
}

fn run_demo(config: &BindingConfig, max_frames: Option<u64>) -> sdl3_binding_core::Result<()> {
    tracing::info!(?max_frames, "starting demo");

    let ctx = Context::load(&config.library)?;
    let window_config = &config.window;
    let (window, renderer) = ctx.create_window_and_renderer(
        &window_config.title,
        window_config.width,
        window_config.height,
        WindowFlags::from_config(window_config),
    )?;
    let window = ctx.own(window);
    let renderer = ctx.own(renderer);

    let mut rng = SdlRandom(&ctx);
    let mut field = PointField::new(
        config.demo.clone(),
        window_config.width as f32,
        window_config.height as f32,
        &mut rng,
    );

    let (dispatcher, jobs) = dispatch::channel::<Context>();
    let frames = Arc::new(AtomicU64::new(0));
    let stop = Arc::new(AtomicBool::new(false));
    let reporter = spawn_fps_reporter(
        dispatcher,
        *window,
        window_config.title.clone(),
        frames.clone(),
        stop.clone(),
    );

    let mut prev_ticks = ctx.ticks();
    'frames: while max_frames.map_or(true, |max| frames.load(Ordering::Relaxed) < max) {
        while let Some(event) = ctx.poll_event() {
            match event {
                Event::Quit
                | Event::KeyUp {
                    scancode: SDL_SCANCODE_ESCAPE,
                    ..
                } => break 'frames,
                Event::WindowResized { width, height } => {
                    field.resize(width as f32, height as f32);
                }
                _ => {}
            }
        }
        jobs.run_pending(&ctx);

        let ticks = ctx.ticks();
        let now = ticks as f64 / 1000.0;
        let elapsed = ticks.saturating_sub(prev_ticks) as f32 / 1000.0;
        field.update(elapsed, &mut rng);

        let background = scene::background(now);
        ctx.set_draw_color(*renderer, background)?;
        ctx.clear(*renderer)?;
        ctx.set_draw_color(*renderer, background.inverse())?;
        ctx.fill_rects(*renderer, field.rects())?;
        ctx.set_draw_color(*renderer, scene::point_color(background))?;
        ctx.draw_points(*renderer, field.points())?;
        ctx.present(*renderer)?;

        prev_ticks = ticks;
        frames.fetch_add(1, Ordering::Relaxed);
    }
    tracing::info!(frames = frames.load(Ordering::Relaxed), "shutting down");

    stop.store(true, Ordering::Relaxed);
    drop(jobs);
    if reporter.join().is_err() {
        tracing::warn!("fps reporter panicked");
    }

    renderer.release()?;
    window.release()?;
    let counts = ctx.shutdown();
    tracing::info!(?counts, "released native resources");
    Ok(())
}

/// Updates the window title with the frame rate once per second, from a
/// worker thread, through the dispatcher.
fn spawn_fps_reporter(
    dispatcher: dispatch::Dispatcher<Context>,
    window: WindowId,
    title: String,
    frames: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut last = frames.load(Ordering::Relaxed);
        let mut waited = Duration::ZERO;
        while !stop.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(100));
            waited += Duration::from_millis(100);
            if waited < Duration::from_secs(1) {
                continue;
            }
            waited = Duration::ZERO;

            let current = frames.load(Ordering::Relaxed);
            let text = format!("{title} ({} fps)", current - last);
            last = current;
            let submitted = dispatcher.submit(move |ctx: &Context| {
                if let Err(err) = ctx.set_window_title(window, &text) {
                    tracing::debug!(error = %err, "title update skipped");
                }
            });
            if submitted.is_err() {
                break;
            }
        }
    })
}

fn run_probe(config: &BindingConfig) -> sdl3_binding_core::Result<()> {
    let resolver = LibraryResolver::new(config.library.clone())?;
    println!("platform: {}", resolver.platform());
    println!("file names: {}", resolver.file_names().join(", "));
    println!("search path:");
    for dir in resolver.search_dirs() {
        println!("  {}", dir.display());
    }
    println!("candidates:");
    for candidate in resolver.candidates() {
        println!("  {candidate}");
    }
    println!("entry points:");
    for descriptor in CALL_DESCRIPTORS {
        println!("  {:<30} {}", descriptor.symbol, descriptor.signature);
    }

    let loaded = LibraryHost::global().load_verified(&resolver, SdlBackend::verify)?;
    match library::library_dir(&loaded) {
        Some(dir) => println!("loaded {} from {}", loaded.origin(), dir.display()),
        None => println!("loaded {}", loaded.origin()),
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
#[command(author, version, about = "SDL3 binding demo", long_about = None)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Extra directory to search for the SDL3 shared library.
    #[arg(long, global = true)]
    library_dir: Vec<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open a window and animate the drifting points scene.
    Run {
        /// Stop after this many frames.
        #[arg(long)]
        frames: Option<u64>,
    },
    /// Show where the native library is looked up and try to load it.
    Probe,
}
