//! Background playback thread

use super::scheduler::Scheduler;
use super::sink::NoteSink;
use super::types::{PlaybackEnd, TickOutcome, TICK_PERIOD};
use crate::error::{SeqError, SinkError};
use crossbeam_channel::{select, unbounded, Sender};
use log::{debug, warn};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Work sent to the sink from outside the scheduler, between two ticks.
pub type SinkTask<S> = Box<dyn FnOnce(&mut S) -> Result<(), SinkError> + Send>;

enum Command<S> {
    Stop,
    SetOctaveShift(i8),
    WithSink(SinkTask<S>),
}

/// A scheduler running on its own thread, ticking every [`TICK_PERIOD`].
///
/// The thread owns the sink for the whole session and hands it back from
/// [`join`](Self::join). Dropping a `Player` without joining stops playback.
///
/// # Example
/// ```rust,no_run
/// use midiseq::playback::{PlaybackSettings, Player, RecordingSink, Scheduler};
/// use midiseq::Track;
///
/// let scheduler = Scheduler::new(Track::demo().notes, PlaybackSettings::default())?;
/// let player = Player::spawn(scheduler, RecordingSink::new());
///
/// let (sink, end) = player.join();
/// println!("{:?}, {} events", end?, sink.events.len());
/// # Ok::<(), midiseq::SeqError>(())
/// ```
pub struct Player<S> {
    commands: Sender<Command<S>>,
    thread: JoinHandle<(S, Result<PlaybackEnd, SeqError>)>,
}

impl<S> Player<S>
where
    S: NoteSink + Send + 'static,
{
    /// Start `scheduler` on a new thread.
    pub fn spawn(scheduler: Scheduler, sink: S) -> Self {
        let (commands, inbox) = unbounded();

        let thread = thread::spawn(move || {
            let mut scheduler = scheduler;
            let mut sink = sink;
            let clock = Instant::now();
            let now = || clock.elapsed().as_secs_f64();

            if let Err(e) = scheduler.start(now(), &mut sink) {
                return (sink, Err(e));
            }

            let ticker = crossbeam_channel::tick(TICK_PERIOD);
            let result = loop {
                select! {
                    recv(inbox) -> command => match command {
                        Ok(Command::SetOctaveShift(shift)) => scheduler.set_octave_shift(shift),
                        Ok(Command::WithSink(task)) => {
                            if let Err(source) = task(&mut sink) {
                                let position = scheduler.position();
                                let _ = scheduler.stop(&mut sink);
                                break Err(SeqError::PlaybackAborted { position, source });
                            }
                        }
                        // Stop, or every handle is gone
                        Ok(Command::Stop) | Err(_) => {
                            break scheduler.stop(&mut sink).map(|_| PlaybackEnd::Stopped);
                        }
                    },
                    recv(ticker) -> _ => match scheduler.tick(now(), &mut sink) {
                        Ok(TickOutcome::Finished) => break Ok(PlaybackEnd::Completed),
                        Ok(_) => {}
                        Err(e) => break Err(e),
                    },
                }
            };

            // Tasks queued while the session was ending still reach the sink
            while let Ok(command) = inbox.try_recv() {
                if let Command::WithSink(task) = command {
                    if let Err(e) = task(&mut sink) {
                        warn!("Sink task after playback ended: {}", e);
                    }
                }
            }

            match &result {
                Ok(end) => debug!("Playback thread exiting: {:?}", end),
                Err(e) => warn!("Playback thread exiting: {}", e),
            }
            (sink, result)
        });

        Self { commands, thread }
    }

    /// Ask the session to stop. Returns at once; use [`join`](Self::join) to wait.
    pub fn stop(&self) {
        // The thread may already have finished on its own
        let _ = self.commands.send(Command::Stop);
    }

    pub fn set_octave_shift(&self, octave_shift: i8) {
        let _ = self.commands.send(Command::SetOctaveShift(octave_shift));
    }

    /// Run `task` against the sink on the playback thread, between two ticks.
    ///
    /// A failing task aborts the session like a failing note. Tasks still
    /// queued when the session ends run after the closing sweep.
    ///
    /// # Returns
    /// `false` if the thread has already exited and the task was dropped.
    pub fn with_sink<F>(&self, task: F) -> bool
    where
        F: FnOnce(&mut S) -> Result<(), SinkError> + Send + 'static,
    {
        self.commands.send(Command::WithSink(Box::new(task))).is_ok()
    }

    /// True once the session has ended, for any reason.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the session to end and take the sink back.
    ///
    /// A looping session only ends through [`stop`](Self::stop).
    pub fn join(self) -> (S, Result<PlaybackEnd, SeqError>) {
        match self.thread.join() {
            Ok(outcome) => outcome,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
