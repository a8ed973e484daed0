//! Interactive door lock emulator.
//!
//! By default both nodes run in one process over the mock serial line and
//! the keypad is driven from stdin. With `--role` a single node runs on a
//! real serial port (build with the `hardware-serial` feature) and talks to
//! a peer board or a second `doorlock` process.
//!
//! # Usage
//!
//! ```bash
//! # Blank store: the HMI starts in provisioning
//! doorlock
//!
//! # Preloaded credential and custom timings
//! doorlock --stored 26495 --config doorlock.json
//!
//! # One node per port
//! doorlock --role control --port /dev/ttyUSB0 --stored 26495
//! doorlock --role hmi --port /dev/ttyUSB1
//! ```
//!
//! Each input line is read as a sequence of keys: `0`-`9`, `+`, `-`, `=`.
//! `!` toggles holding `=` for the root override. Whitespace is ignored.

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use doorlock_core::config::SerialConfig;
use doorlock_core::{Credential, DeviceConfig};
use doorlock_emulator::{EmulatedSystem, emulated_control, emulated_hmi};
use doorlock_hardware::KeypadInput;
use doorlock_hardware::devices::AnyByteChannel;
use doorlock_hardware::mock::{MockDisplayHandle, MockEepromHandle, MockKeypadHandle};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Two-node door lock emulator
#[derive(Parser, Debug)]
#[command(name = "doorlock")]
#[command(about = "Run the door lock HMI and Control nodes, together or on a serial port")]
#[command(version)]
struct Args {
    /// JSON device configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Credential to preload into the store, e.g. 26495
    #[arg(short, long, value_parser = parse_credential)]
    stored: Option<Credential>,

    /// Which node to run
    #[arg(short, long, value_enum, default_value_t = Role::Both)]
    role: Role,

    /// Serial device for a single node, overrides serial.port
    #[arg(short, long)]
    port: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Node selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Role {
    /// Both nodes in this process over a mock line.
    Both,
    /// Control node on a serial port.
    Control,
    /// HMI node on a serial port.
    Hmi,
}

/// One action parsed from stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Press(KeypadInput),
    ToggleRootHold,
}

fn parse_credential(text: &str) -> Result<Credential, String> {
    let digits = text
        .chars()
        .map(|c| c.to_digit(10).map(|d| d as u8))
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| format!("'{text}' is not all digits"))?;
    Credential::from_slice(&digits).map_err(|e| e.to_string())
}

fn parse_key(c: char) -> Option<KeyAction> {
    let input = match c {
        '0'..='9' => KeypadInput::Digit(c.to_digit(10)? as u8),
        '+' => KeypadInput::Plus,
        '-' => KeypadInput::Minus,
        '=' => KeypadInput::Equals,
        '!' => return Some(KeyAction::ToggleRootHold),
        _ => return None,
    };
    Some(KeyAction::Press(input))
}

async fn apply(keypad: &MockKeypadHandle, action: KeyAction) -> Result<()> {
    match action {
        KeyAction::Press(input) => keypad.send_input(input).await?,
        KeyAction::ToggleRootHold => {
            if keypad.held().is_some() {
                keypad.release();
                info!("Released '='");
            } else {
                keypad.hold(KeypadInput::Equals).await?;
                info!("Holding '='");
            }
        }
    }
    Ok(())
}

fn print_frame(rows: &[String]) {
    let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
    println!("+{}+", "-".repeat(width));
    for row in rows {
        println!("|{row:<width$}|");
    }
    println!("+{}+", "-".repeat(width));
}

fn load_config(path: Option<&PathBuf>) -> Result<DeviceConfig> {
    match path {
        Some(path) => DeviceConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(DeviceConfig::default()),
    }
}

fn preload(eeprom: &MockEepromHandle, config: &DeviceConfig, stored: Option<&Credential>) {
    if let Some(credential) = stored {
        eeprom.load(config.bus.credential_base, credential.as_bytes());
        info!("Preloaded credential at 0x{:04X}", config.bus.credential_base);
    }
}

/// Serial settings for a single node: `--port` wins over the config file.
fn serial_settings(config: &DeviceConfig, port: Option<String>) -> Result<SerialConfig> {
    let mut serial = config.serial.clone();
    if port.is_some() {
        serial.port = port;
    }
    if serial.port.is_none() {
        bail!("a single node needs --port or serial.port in the config");
    }
    Ok(serial)
}

#[cfg(feature = "hardware-serial")]
fn open_line(serial: &SerialConfig) -> Result<AnyByteChannel> {
    let channel = doorlock_hardware::serial::SerialPortChannel::open(serial)
        .context("failed to open serial port")?;
    info!("Opened {} at {} baud", channel.path(), serial.baud_rate);
    Ok(AnyByteChannel::Serial(channel))
}

#[cfg(not(feature = "hardware-serial"))]
fn open_line(serial: &SerialConfig) -> Result<AnyByteChannel> {
    bail!(
        "cannot open {}: built without the hardware-serial feature",
        serial.port.as_deref().unwrap_or("serial port")
    )
}

/// Drive a running node from stdin and print every display frame until
/// the node stops or the process is interrupted.
async fn interact<F, E>(
    run: F,
    keypad: &MockKeypadHandle,
    display: &MockDisplayHandle,
) -> Result<()>
where
    F: Future<Output = std::result::Result<(), E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut frames = display.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    tokio::pin!(run);

    loop {
        tokio::select! {
            result = &mut run => {
                result.context("door lock stopped")?;
                bail!("door lock stopped without an error");
            }
            changed = frames.changed() => {
                if changed.is_err() {
                    bail!("display dropped");
                }
                let rows = frames.borrow_and_update().clone();
                print_frame(&rows);
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("failed to read stdin")? {
                    Some(line) => {
                        for c in line.chars().filter(|c| !c.is_whitespace()) {
                            match parse_key(c) {
                                Some(action) => apply(keypad, action).await?,
                                None => warn!("Ignoring key '{}'", c),
                            }
                        }
                    }
                    None => {
                        info!("stdin closed, node keeps running");
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                return Ok(());
            }
        }
    }
}

async fn run_both(config: &DeviceConfig, stored: Option<&Credential>) -> Result<()> {
    let (mut system, handles) = EmulatedSystem::new(config);
    preload(&handles.eeprom, config, stored);
    interact(system.run(), &handles.keypad, &handles.display).await
}

async fn run_control(
    config: &DeviceConfig,
    serial: &SerialConfig,
    stored: Option<&Credential>,
) -> Result<()> {
    let channel = open_line(serial)?;
    info!("Control node on {} line", channel.kind());
    let (mut node, handles) = emulated_control(channel, config);
    preload(&handles.eeprom, config, stored);

    tokio::select! {
        result = node.run() => {
            result.context("control node stopped")?;
            bail!("control node stopped without an error");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
    }
}

async fn run_hmi(config: &DeviceConfig, serial: &SerialConfig) -> Result<()> {
    let channel = open_line(serial)?;
    info!("HMI node on {} line", channel.kind());
    let (mut node, handles) = emulated_hmi(channel, config);
    interact(node.run(), &handles.keypad, &handles.display).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = load_config(args.config.as_ref())?;
    match args.role {
        Role::Both => {
            if args.port.is_some() {
                bail!("--port needs --role control or --role hmi");
            }
            run_both(&config, args.stored.as_ref()).await
        }
        Role::Control => {
            let serial = serial_settings(&config, args.port)?;
            run_control(&config, &serial, args.stored.as_ref()).await
        }
        Role::Hmi => {
            if args.stored.is_some() {
                warn!("--stored is ignored by the HMI node");
            }
            let serial = serial_settings(&config, args.port)?;
            run_hmi(&config, &serial).await
        }
    }
}
