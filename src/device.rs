//! Hardware MIDI output through `midir`
//!
//! Only built with the `midir` feature.

use crate::error::{SeqError, SinkError};
use crate::playback::{MidiOut, WireSink};
use log::{debug, info};
use midir::{MidiOutput, MidiOutputConnection};

const CLIENT_NAME: &str = "midiseq";

/// An open output port.
pub struct MidiPort {
    name: String,
    connection: MidiOutputConnection,
}

impl MidiPort {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl MidiOut for MidiPort {
    fn send(&mut self, message: &[u8]) -> Result<(), SinkError> {
        self.connection
            .send(message)
            .map_err(|e| SinkError::new(format!("{}: {}", self.name, e)))
    }
}

/// A port ready to be handed to a [`Transport`](crate::playback::Transport).
pub type MidiPortSink = WireSink<MidiPort>;

/// Names of the output ports currently available.
pub fn list_output_ports() -> Result<Vec<String>, SeqError> {
    let output = MidiOutput::new(CLIENT_NAME).map_err(device_error)?;

    Ok(output
        .ports()
        .iter()
        .filter_map(|port| output.port_name(port).ok())
        .collect())
}

/// Connect to the port called `name`, or to the first port if `name` is `None`.
///
/// # Errors
/// `SeqError::Sink` if the MIDI backend is unavailable, no port matches, or
/// the connection is refused.
pub fn open_output(name: Option<&str>) -> Result<MidiPortSink, SeqError> {
    let output = MidiOutput::new(CLIENT_NAME).map_err(device_error)?;

    let ports = output.ports();
    debug!("{} MIDI output ports available", ports.len());

    let port = match name {
        Some(wanted) => ports
            .iter()
            .find(|p| output.port_name(p).ok().as_deref() == Some(wanted))
            .ok_or_else(|| device_error(format!("MIDI port '{}' not found", wanted)))?,
        None => ports
            .first()
            .ok_or_else(|| device_error("no MIDI output ports available"))?,
    };

    let port_name = output.port_name(port).map_err(device_error)?;
    let connection = output
        .connect(port, CLIENT_NAME)
        .map_err(|e| device_error(format!("failed to connect to '{}': {}", port_name, e)))?;

    info!("Connected to MIDI output '{}'", port_name);
    Ok(WireSink::new(MidiPort {
        name: port_name,
        connection,
    }))
}

fn device_error(e: impl ToString) -> SeqError {
    SeqError::Sink(SinkError::new(e.to_string()))
}
