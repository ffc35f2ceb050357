//! Play/stop control over one output

use super::player::Player;
use super::scheduler::Scheduler;
use super::sink::{ChannelControl, NoteSink};
use super::types::{PlaybackEnd, PlaybackSettings, TICK_PERIOD};
use crate::error::{SeqError, SinkError};
use crate::note::{Note, TrackContext};
use crossbeam_channel::{bounded, RecvTimeoutError};
use log::{debug, info, warn};

/// Owns an output and runs at most one playback session on it.
///
/// # Responsibilities
/// - Silences the channel (All Notes Off) before every session
/// - Stops any previous session, sweep included, before starting a new one
/// - Sends Bank Select then Program Change when the track context changes,
///   also in the middle of a session
///
/// # Example
/// ```rust,no_run
/// use midiseq::playback::{LogSink, PlaybackSettings, Transport};
/// use midiseq::Track;
///
/// let track = Track::demo();
/// let mut transport = Transport::new(LogSink::new());
///
/// transport.apply_track_context(track.context())?;
/// transport.play(track.notes.clone(), PlaybackSettings::default())?;
/// transport.wait()?;
/// # Ok::<(), midiseq::SeqError>(())
/// ```
pub struct Transport<S> {
    sink: Option<S>,
    player: Option<Player<S>>,
    applied: Option<TrackContext>,
}

impl<S> Transport<S>
where
    S: NoteSink + ChannelControl + Send + 'static,
{
    pub fn new(sink: S) -> Self {
        Self {
            sink: Some(sink),
            player: None,
            applied: None,
        }
    }

    /// True while a session is running.
    pub fn is_playing(&self) -> bool {
        self.player.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// The output, when no session holds it.
    pub fn sink(&self) -> Option<&S> {
        self.sink.as_ref()
    }

    /// Last context sent with [`apply_track_context`](Self::apply_track_context).
    pub fn track_context(&self) -> Option<TrackContext> {
        self.applied
    }

    /// Select the bank and program for `context` if they differ from the
    /// context applied last.
    ///
    /// # Returns
    /// Whether anything was sent.
    ///
    /// During a session the messages go through the playback thread and this
    /// waits until they have been sent. The context is only remembered once
    /// the output accepted it, so a failed attempt is retried on the next call.
    ///
    /// # Errors
    /// The sink's error. A failure on the playback thread also ends the
    /// session.
    pub fn apply_track_context(&mut self, context: TrackContext) -> Result<bool, SeqError> {
        if self.applied == Some(context) {
            return Ok(false);
        }

        debug!(
            "Track context: channel {}, bank {}, program {}",
            context.channel, context.bank, context.program
        );

        if let Some(player) = self.player.as_ref() {
            if let Some(delivered) = deliver_during_session(player, context) {
                delivered?;
                self.applied = Some(context);
                return Ok(true);
            }
        }

        // Idle, or the session ended before it could send
        let sink = self.reclaim()?;
        send_context(sink, context)?;
        self.applied = Some(context);
        Ok(true)
    }

    /// Start playing `notes`.
    ///
    /// Any running session is stopped first. All Notes Off is sent on
    /// `settings.channel` before the first tick.
    pub fn play(&mut self, notes: Vec<Note>, settings: PlaybackSettings) -> Result<(), SeqError> {
        let scheduler = Scheduler::new(notes, settings)?;

        if let Err(e) = self.stop() {
            warn!("Previous session: {}", e);
        }
        let mut sink = self.take_sink()?;
        if let Err(e) = sink.all_notes_off(settings.channel) {
            self.sink = Some(sink);
            return Err(e.into());
        }

        info!(
            "Playing {} notes at {} BPM on channel {}",
            scheduler.notes().len(),
            settings.tempo_bpm,
            settings.channel
        );
        self.player = Some(Player::spawn(scheduler, sink));
        Ok(())
    }

    /// Transpose notes that start from now on.
    pub fn set_octave_shift(&self, octave_shift: i8) {
        if let Some(player) = self.player.as_ref() {
            player.set_octave_shift(octave_shift);
        }
    }

    /// Stop the current session and wait for its sweep.
    ///
    /// # Returns
    /// How the session ended, or `None` if there was none.
    pub fn stop(&mut self) -> Result<Option<PlaybackEnd>, SeqError> {
        match self.player.take() {
            Some(player) => {
                player.stop();
                self.finish(player).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Wait for the current session to end by itself.
    ///
    /// Never returns for a looping session; poll
    /// [`is_playing`](Self::is_playing) and call [`stop`](Self::stop) instead.
    pub fn wait(&mut self) -> Result<Option<PlaybackEnd>, SeqError> {
        match self.player.take() {
            Some(player) => self.finish(player).map(Some),
            None => Ok(None),
        }
    }

    /// Stop any session and give the output back.
    pub fn into_sink(mut self) -> Result<S, SeqError> {
        self.stop()?;
        self.take_sink()
    }

    fn finish(&mut self, player: Player<S>) -> Result<PlaybackEnd, SeqError> {
        let (sink, result) = player.join();
        self.sink = Some(sink);
        result
    }

    /// The idle sink, joining a session that already ended if needed.
    fn reclaim(&mut self) -> Result<&mut S, SeqError> {
        if let Some(player) = self.player.take() {
            // Only reached once the thread has exited, so this does not block
            if let Err(e) = self.finish(player) {
                debug!("Previous session: {}", e);
            }
        }
        self.sink.as_mut().ok_or_else(busy)
    }

    fn take_sink(&mut self) -> Result<S, SeqError> {
        self.sink.take().ok_or_else(busy)
    }
}

fn send_context<S: ChannelControl>(sink: &mut S, context: TrackContext) -> Result<(), SinkError> {
    sink.bank_select(context.bank, context.channel)?;
    sink.program_change(context.program, context.channel)
}

/// Run `send_context` on the playback thread and wait for its result.
///
/// `None` if the session ended without running it.
fn deliver_during_session<S>(
    player: &Player<S>,
    context: TrackContext,
) -> Option<Result<(), SeqError>>
where
    S: NoteSink + ChannelControl + Send + 'static,
{
    let (reply_tx, reply) = bounded(1);
    let queued = player.with_sink(move |sink| {
        let result = send_context(sink, context);
        let _ = reply_tx.send(result.clone());
        result
    });
    if !queued {
        return None;
    }

    loop {
        match reply.recv_timeout(TICK_PERIOD) {
            Ok(result) => return Some(result.map_err(SeqError::from)),
            Err(RecvTimeoutError::Disconnected) => return None,
            Err(RecvTimeoutError::Timeout) if player.is_finished() => {
                // The thread has exited, so the reply is either queued or never coming
                return reply.try_recv().ok().map(|r| r.map_err(SeqError::from));
            }
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}

fn busy() -> SeqError {
    SeqError::Sink(SinkError::new("output is held by a playback session"))
}
