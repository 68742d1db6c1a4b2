use clap::Parser;
use dmgboy::error::{BootRomReadSnafu, FrameDumpSnafu, GbError, LogSetupSnafu};
use dmgboy::gameboy::GameBoy;
use dmgboy::lr35902::M_CYCLES_PER_SECOND;
use dmgboy::memory::cartridge::Cartridge;
use dmgboy::video::{CYCLES_PER_FRAME, SCREEN_HEIGHT, SCREEN_WIDTH};
use log::{info, LevelFilter};
use snafu::ResultExt;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Headless DMG Game Boy runner")]
struct Args {
    /// Path to the ROM image (.gb, or a .zip containing one)
    rom: PathBuf,

    /// Path to a 256 byte DMG boot ROM
    #[arg(long)]
    bootrom: Option<PathBuf>,

    /// Number of frames to run
    #[arg(long, default_value_t = 60)]
    frames: usize,

    /// Write the last frame as raw RGB24 to this path
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Log every executed instruction
    #[arg(long)]
    trace: bool,
}

fn setup_logging(level: LevelFilter, trace: bool) -> Result<(), GbError> {
    let cpu_level = if trace { LevelFilter::Trace } else { level };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{} {}] {}", record.level(), record.target(), message))
        })
        .level(level)
        .level_for("dmgboy::lr35902", cpu_level)
        .chain(std::io::stderr())
        .apply()
        .context(LogSetupSnafu)
}

fn run(args: Args) -> Result<(), GbError> {
    setup_logging(args.log_level, args.trace)?;

    let cartridge = Cartridge::from_path(&args.rom)?;
    info!("Loaded {}", args.rom.display());

    let bootrom = match &args.bootrom {
        Some(path) => Some(std::fs::read(path).context(BootRomReadSnafu { path })?),
        None => None,
    };

    let mut gb = GameBoy::new(cartridge, bootrom)?;
    for _ in 0..args.frames {
        gb.run_frame();
    }
    let seconds = (gb.frames() * CYCLES_PER_FRAME) as f64 / M_CYCLES_PER_SECOND as f64;
    info!("Ran {} frames ({:.2}s emulated), stopped at {}", gb.frames(), seconds, gb.snapshot());

    if let Some(path) = &args.dump {
        let buffer = gb.frame_rgb();
        std::fs::write(path, &buffer).context(FrameDumpSnafu { path })?;
        info!(
            "Wrote {} bytes ({}x{} rgb24) to {}",
            buffer.len(),
            SCREEN_WIDTH,
            SCREEN_HEIGHT,
            path.display()
        );
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
