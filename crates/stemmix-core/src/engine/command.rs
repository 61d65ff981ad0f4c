//! Lock-free command queue for the playback engine
//!
//! The UI thread pushes commands onto an `rtrb` SPSC ringbuffer; the
//! audio callback pops them at buffer boundaries. Neither side ever
//! blocks, so gain changes and transport control cannot cause audio
//! dropouts, and no command is applied mid-buffer.

use crate::loader::LoadedStems;
use crate::types::Part;

/// Commands sent from the UI thread to the audio callback
///
/// Each variant is one atomic operation on the engine, processed at
/// the start of the next audio buffer.
pub enum EngineCommand {
    /// Hand the decoded stem set to the engine (done once, at ready
    /// time). Boxed: the stems are large, the command stays
    /// pointer-sized on the queue.
    LoadStems(Box<LoadedStems>),
    /// Start the shared transport (all stems advance in lock-step)
    Play,
    /// Pause the shared transport
    Pause,
    /// Jump the shared transport to a sample position
    Seek { position: u64 },
    /// Set the linear gain of one part (0.0 = silence, 1.0 = unity).
    /// The engine ramps to the new value over a short fade.
    SetGain { part: Part, gain: f32 },
}

/// Create a command channel with the given capacity
pub fn command_channel(
    capacity: usize,
) -> (rtrb::Producer<EngineCommand>, rtrb::Consumer<EngineCommand>) {
    rtrb::RingBuffer::new(capacity)
}

/// Command sender for the UI thread
pub struct CommandSender {
    producer: rtrb::Producer<EngineCommand>,
}

impl CommandSender {
    pub fn new(producer: rtrb::Producer<EngineCommand>) -> Self {
        Self { producer }
    }

    /// Send a command to the audio callback (non-blocking).
    /// A full queue drops the command and logs; the UI resends state
    /// on the next interaction rather than blocking the event loop.
    pub fn send(&mut self, cmd: EngineCommand) {
        if self.producer.push(cmd).is_err() {
            log::warn!("Engine command queue full, command dropped");
        }
    }
}
