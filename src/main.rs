//! midiseq: decode, encode and play single-track MIDI sequences
//!
//! - `decode`: Print the notes of a Standard MIDI File
//! - `encode`: Write a project (or MIDI file) as a Standard MIDI File
//! - `play`: Play a project, MIDI file or the demo track in real time
//! - `demo`: Write the demo project
//! - `ports`: List MIDI output ports

use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use midiseq::playback::{ChannelControl, LogSink, NoteSink, Transport};
use midiseq::{smf, Project, SeqError};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

/// How often `play` checks for Ctrl-C and the end of playback.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[command(name = "midiseq")]
#[command(about = "Single-track MIDI sequencer")]
#[command(version)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the notes of a Standard MIDI File
    Decode {
        file: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Write a project or MIDI file as a Standard MIDI File
    Encode {
        /// Project (.json, .yaml) or MIDI file
        input: PathBuf,

        output: PathBuf,

        /// Tempo in BPM (default: the project's)
        #[arg(long, value_parser = parse_tempo)]
        tempo: Option<f64>,
    },

    /// Play a project, a MIDI file, or the demo track
    Play {
        /// Project (.json, .yaml) or MIDI file; the demo track if omitted
        input: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,

        /// Output port name (default: the first port)
        #[arg(long)]
        port: Option<String>,

        /// Log notes instead of sending them to a port
        #[arg(long)]
        dry_run: bool,
    },

    /// Write the demo project as JSON
    Demo {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List MIDI output ports
    Ports,
}

/// Settings applied on top of the loaded project.
#[derive(Args)]
struct Overrides {
    /// Tempo in BPM (40-240)
    #[arg(long, value_parser = parse_tempo)]
    tempo: Option<f64>,

    /// MIDI channel (1-16)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=16))]
    channel: Option<u8>,

    /// Bank (1-16)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=16))]
    bank: Option<u8>,

    /// Program (1-16)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=16))]
    program: Option<u8>,

    /// Octave shift (-4 to 4)
    #[arg(long, allow_negative_numbers = true, value_parser = clap::value_parser!(i8).range(-4..=4))]
    octave: Option<i8>,

    /// Loop until Ctrl-C
    #[arg(long = "loop")]
    looping: bool,
}

impl Overrides {
    fn apply(&self, project: &mut Project) {
        if let Some(tempo) = self.tempo {
            project.tempo = tempo;
        }
        if let Some(channel) = self.channel {
            project.track.channel = channel;
        }
        if let Some(bank) = self.bank {
            project.track.bank = bank;
        }
        if let Some(program) = self.program {
            project.track.program = program;
        }
        if let Some(octave) = self.octave {
            project.octave = octave;
        }
        if self.looping {
            project.looping = true;
        }
    }
}

fn parse_tempo(s: &str) -> Result<f64, String> {
    let tempo: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if (40.0..=240.0).contains(&tempo) {
        Ok(tempo)
    } else {
        Err(format!("tempo must be between 40 and 240, got {}", tempo))
    }
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "midiseq=debug"
    } else {
        "midiseq=info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), SeqError> {
    match command {
        Commands::Decode { file, json } => decode(&file, json),
        Commands::Encode {
            input,
            output,
            tempo,
        } => {
            let mut project = Project::load_path(&input)?;
            if let Some(tempo) = tempo {
                project.tempo = tempo;
            }
            fs::write(&output, project.to_midi()?)?;
            eprintln!(
                "Wrote {} notes to {}",
                project.track.notes.iter().filter(|n| !n.muted).count(),
                output.display()
            );
            Ok(())
        }
        Commands::Play {
            input,
            overrides,
            port,
            dry_run,
        } => {
            let mut project = match input {
                Some(path) => Project::load_path(path)?,
                None => Project::default(),
            };
            overrides.apply(&mut project);

            if dry_run {
                return play(LogSink::new(), &project);
            }
            play_on_port(port.as_deref(), &project)
        }
        Commands::Demo { output } => {
            let project = Project::default();
            match output {
                Some(path) => {
                    project.save_path(&path)?;
                    eprintln!("Wrote demo project to {}", path.display());
                }
                None => println!("{}", project.to_json()?),
            }
            Ok(())
        }
        Commands::Ports => list_ports(),
    }
}

fn decode(path: &Path, json: bool) -> Result<(), SeqError> {
    let decoded = smf::decode(&fs::read(path)?);
    if let Some(offset) = decoded.truncated {
        warn!("{} is truncated at byte {}", path.display(), offset);
    }

    if json {
        let text = serde_json::to_string_pretty(&decoded.notes)
            .map_err(|e| SeqError::Project(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    println!(
        "{} notes, {} tracks, {} ticks per beat",
        decoded.notes.len(),
        decoded.tracks,
        decoded.ticks_per_beat
    );
    println!("{:>5}  {:>5}  {:>9}  {:>9}  {:>3}", "#", "pitch", "start", "duration", "vel");
    for (i, note) in decoded.notes.iter().enumerate() {
        println!(
            "{:>5}  {:>5}  {:>9.3}  {:>9.3}  {:>3}",
            i + 1,
            note.pitch,
            note.start_time,
            note.duration,
            note.velocity
        );
    }
    Ok(())
}

#[cfg(feature = "midir")]
fn play_on_port(port: Option<&str>, project: &Project) -> Result<(), SeqError> {
    play(midiseq::device::open_output(port)?, project)
}

#[cfg(not(feature = "midir"))]
fn play_on_port(port: Option<&str>, project: &Project) -> Result<(), SeqError> {
    if let Some(port) = port {
        warn!("Built without MIDI device support, ignoring --port {}", port);
    }
    info!("No MIDI device support; logging notes instead");
    play(LogSink::new(), project)
}

/// Play `project` on `sink` until it ends or Ctrl-C is pressed.
fn play<S>(sink: S, project: &Project) -> Result<(), SeqError>
where
    S: NoteSink + ChannelControl + Send + 'static,
{
    let (interrupt_tx, interrupt) = crossbeam_channel::bounded(1);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = interrupt_tx.try_send(());
    }) {
        warn!("Ctrl-C will not stop playback cleanly: {}", e);
    }

    let mut transport = Transport::new(sink);
    transport.apply_track_context(project.track.context())?;
    transport.play(project.track.notes.clone(), project.playback_settings())?;

    loop {
        if interrupt.recv_timeout(POLL_INTERVAL).is_ok() {
            info!("Interrupted, stopping");
            transport.stop()?;
            return Ok(());
        }
        if !transport.is_playing() {
            transport.wait()?;
            return Ok(());
        }
    }
}

#[cfg(feature = "midir")]
fn list_ports() -> Result<(), SeqError> {
    let ports = midiseq::device::list_output_ports()?;
    if ports.is_empty() {
        eprintln!("No MIDI output ports found");
    }
    for (i, name) in ports.iter().enumerate() {
        println!("{}: {}", i, name);
    }
    Ok(())
}

#[cfg(not(feature = "midir"))]
fn list_ports() -> Result<(), SeqError> {
    eprintln!("Built without MIDI device support (enable the `midir` feature)");
    Ok(())
}
