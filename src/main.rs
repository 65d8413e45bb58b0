use gesture_sup::{
    cli::{self, EscapeKey, StatusAwareStderr},
    Config, DevMode, GestureAuth, HandMode, ReplaySource, UserStore,
};

use clap::{Parser, Subcommand};
use anyhow::Result;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gestureSup")]
#[command(about = "Hand-gesture authentication")]
struct Cli {
    /// Enable development mode (keeps the user database under ./dev_data)
    #[arg(long, global = true)]
    dev: bool,

    /// Config file; built-in defaults apply when it does not exist
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record and store a new gesture
    Register {
        #[arg(short, long)]
        username: String,
        /// Gesture uses both hands
        #[arg(long)]
        two_hands: bool,
        /// Recorded landmark stream (JSON lines)
        #[arg(short, long)]
        frames: PathBuf,
    },
    /// Record a full window and compare it once against the stored gesture
    Verify {
        #[arg(short, long)]
        username: String,
        /// Match percentage required (default from config)
        #[arg(short, long)]
        threshold: Option<f64>,
        #[arg(short, long)]
        frames: PathBuf,
    },
    /// Live verification: pass after enough consecutive matching frames
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        threshold: Option<f64>,
        /// Consecutive matching frames required (default from config)
        #[arg(short, long)]
        stable_frames: Option<u32>,
        #[arg(short, long)]
        frames: PathBuf,
    },
    /// List registered users
    List,
    /// Show a user's enrollment details
    Info {
        #[arg(short, long)]
        username: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.dev);

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let dev_mode = DevMode::new(cli.dev)?;
    let store = UserStore::new_with_dev_mode(&dev_mode, &config)?;
    let auth = GestureAuth::new(store, config);

    let outcome = match cli.command {
        Commands::Register { username, two_hands, frames } => {
            register(&auth, &username, HandMode::from_two_hands(two_hands), &frames)
        }
        Commands::Verify { username, threshold, frames } => {
            let threshold = threshold.unwrap_or(auth.config().verification.threshold);
            verify(&auth, &username, threshold, &frames)
        }
        Commands::Login { username, threshold, stable_frames, frames } => {
            let threshold = threshold.unwrap_or(auth.config().verification.threshold);
            let stable = stable_frames.unwrap_or(auth.config().verification.required_stable_frames);
            login(&auth, &username, threshold, stable, &frames)
        }
        Commands::List => {
            let users = auth.list_users()?;
            if users.is_empty() {
                println!("No registered users");
            }
            for user in users {
                println!("{}", user);
            }
            Ok(())
        }
        Commands::Info { username } => {
            auth.user_info(&username).map(|info| {
                println!("User:        {}", info.username);
                println!("Gesture:     {}", info.hand_mode);
                println!("Registered:  {}", info.created_at.format("%Y-%m-%d %H:%M:%S"));
                println!("Features:    {}", info.vector_len);
            })
        }
    };

    match outcome {
        Ok(()) => Ok(()),
        Err(e) if e.is_recoverable() => {
            println!("✗ {}", e);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

type FileReplay = ReplaySource<BufReader<File>>;

fn replay(auth: &GestureAuth<UserStore>, frames: &Path) -> gesture_sup::Result<FileReplay> {
    ReplaySource::open(frames, auth.config().capture.replay_fps)
}

fn register(
    auth: &GestureAuth<UserStore>,
    username: &str,
    mode: HandMode,
    frames: &Path,
) -> gesture_sup::Result<()> {
    let mut source = replay(auth, frames)?;
    println!("Registering '{}' with a {} gesture. Press ESC to cancel.", username, mode);

    let result = {
        let mut escape = EscapeKey::new();
        auth.register(username, mode, &mut source, &mut escape, |p| {
            cli::print_status(&cli::render_recording(mode, p))
        })
    };
    println!();

    result.map(|_| println!("✓ User registered successfully!"))
}

fn verify(
    auth: &GestureAuth<UserStore>,
    username: &str,
    threshold: f64,
    frames: &Path,
) -> gesture_sup::Result<()> {
    let mode = auth.template(username)?.hand_mode();
    let mut source = replay(auth, frames)?;
    println!("Perform your gesture. Press ESC to cancel.");

    let result = {
        let mut escape = EscapeKey::new();
        auth.verify_once(username, threshold, &mut source, &mut escape, |p| {
            cli::print_status(&cli::render_recording(mode, p))
        })
    };
    println!();

    result.map(|outcome| println!("✓ {}", outcome.message()))
}

fn login(
    auth: &GestureAuth<UserStore>,
    username: &str,
    threshold: f64,
    stable_frames: u32,
    frames: &Path,
) -> gesture_sup::Result<()> {
    let mode = auth.template(username)?.hand_mode();
    let mut source = replay(auth, frames)?;
    println!("Show your gesture. Press ESC to cancel.");

    let result = {
        let mut escape = EscapeKey::new();
        auth.verify_live(username, threshold, stable_frames, &mut source, &mut escape, |d| {
            cli::print_status(&cli::render_decision(mode, d, stable_frames))
        })
    };
    println!();

    result.map(|outcome| {
        println!("✓ Welcome back, {}! (Match: {:.1}%)", outcome.username, outcome.score)
    })
}

fn setup_logging(dev_mode: bool) {
    if dev_mode {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_writer(|| StatusAwareStderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(|| StatusAwareStderr)
            .init();
    }
}
