use snafu::prelude::*;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum GbError {
    #[snafu(display("Failed to read ROM file {}", path.display()))]
    RomRead { path: PathBuf, source: std::io::Error },
    #[snafu(display("Failed to open ROM archive {}", path.display()))]
    Archive { path: PathBuf, source: zip::result::ZipError },
    #[snafu(display("ROM archive {} contains no .gb/.gbc entry", path.display()))]
    EmptyArchive { path: PathBuf },
    #[snafu(display("ROM image too small to hold a header: {} bytes", size))]
    RomTooSmall { size: usize },
    #[snafu(display("ROM image exceeds 2 MiB: {} bytes", size))]
    RomTooLarge { size: usize },
    #[snafu(display("Unsupported cartridge type: ${:02x}", kind))]
    UnsupportedCartridge { kind: u8 },
    #[snafu(display("Unsupported ROM size code: ${:02x}", code))]
    UnsupportedRomSize { code: u8 },
    #[snafu(display("ROM image is {} bytes but its header declares {}", size, declared))]
    RomSizeMismatch { size: usize, declared: usize },
    #[snafu(display("Unsupported external RAM size code: ${:02x}", code))]
    UnsupportedRamSize { code: u8 },
    #[snafu(display("Failed to read boot ROM {}", path.display()))]
    BootRomRead { path: PathBuf, source: std::io::Error },
    #[snafu(display("Boot ROM must be exactly 256 bytes, got {}", size))]
    InvalidBootRom { size: usize },
    #[snafu(display("Failed to write frame dump {}", path.display()))]
    FrameDump { path: PathBuf, source: std::io::Error },
    #[snafu(display("Failed to install logger"))]
    LogSetup { source: log::SetLoggerError },
}
