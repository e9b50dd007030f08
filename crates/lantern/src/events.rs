//! # Lantern Event System
//!
//! Bounded channels between the embedding application and the world.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  inbound   ┌─────────────┐  outbound  ┌─────────────┐
//! │ Application │──────────> │  GameLoop   │──────────> │ Application │
//! │ (input, UI) │            │ (on_event)  │ (ctx.emit) │ (UI, audio) │
//! └─────────────┘            └─────────────┘            └─────────────┘
//! ```
//!
//! Inbound events are drained at the start of every frame and fanned out to
//! systems in registration order. Systems emit outbound events through their
//! `SystemContext`; sends never block the frame.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Events exchanged between the application and systems.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineEvent {
    // =========================================================================
    // Host Events (application → systems)
    // =========================================================================
    /// The drawing surface changed size.
    Resized {
        /// New width in pixels.
        width: u32,
        /// New height in pixels.
        height: u32,
    },

    /// The pointer moved, in surface pixels.
    PointerMoved {
        /// Horizontal position.
        x: f32,
        /// Vertical position.
        y: f32,
    },

    /// A key was pressed or released.
    Key {
        /// Key name as reported by the host (`"ArrowLeft"`, `"a"`, ...).
        code: String,
        /// `true` on press.
        pressed: bool,
    },

    /// Request to move the camera by a world-space offset.
    ///
    /// Consumed by: camera controller
    CameraPan {
        /// Horizontal offset.
        dx: f32,
        /// Vertical offset.
        dy: f32,
    },

    /// Request to multiply the camera zoom.
    ///
    /// Consumed by: camera controller
    CameraZoom {
        /// Zoom multiplier, must be positive.
        factor: f32,
    },

    // =========================================================================
    // World Events (systems → application)
    // =========================================================================
    /// The camera changed.
    ///
    /// Emitted by: camera controller
    CameraMoved {
        /// Camera center, horizontal.
        x: f32,
        /// Camera center, vertical.
        y: f32,
        /// Current zoom.
        zoom: f32,
    },

    // =========================================================================
    // Extension
    // =========================================================================
    /// Game-specific event with a free-form payload.
    Custom {
        /// Event name.
        name: String,
        /// Payload.
        #[serde(default)]
        payload: serde_json::Value,
    },
}

/// Bounded event channel.
///
/// Pre-allocates its buffer so a flood of events cannot grow memory
/// without bound.
pub struct EventBus {
    /// Sender end - held by event producers.
    sender: Sender<EngineEvent>,
    /// Receiver end - held by event consumers.
    receiver: Receiver<EngineEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum events in flight before sends are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Raw channel sender, for wiring a world's event outlet.
    #[must_use]
    pub fn channel_sender(&self) -> Sender<EngineEvent> {
        self.sender.clone()
    }

    /// Creates a new pair of sender and receiver.
    #[must_use]
    pub fn create_pair(capacity: usize) -> (EventSender, EventReceiver) {
        let bus = Self::new(capacity);
        (bus.sender(), bus.receiver())
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<EngineEvent>,
}

impl EventSender {
    /// Sends an event (non-blocking).
    ///
    /// Returns `false` if the channel is full (the event is dropped) or
    /// the receiver is gone.
    #[inline]
    pub fn send(&self, event: EngineEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("event channel full, dropping event");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for receiving events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<EngineEvent>,
}

impl EventReceiver {
    /// Receives all pending events (non-blocking).
    #[inline]
    pub fn drain(&self) -> Vec<EngineEvent> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event (non-blocking).
    #[inline]
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_send_receive() {
        let (sender, receiver) = EventBus::create_pair(8);

        assert!(sender.send(EngineEvent::CameraZoom { factor: 2.0 }));
        assert!(receiver.has_events());
        assert_eq!(
            receiver.try_recv(),
            Some(EngineEvent::CameraZoom { factor: 2.0 })
        );
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_full_channel_drops() {
        let (sender, receiver) = EventBus::create_pair(2);
        for _ in 0..2 {
            assert!(sender.send(EngineEvent::PointerMoved { x: 0.0, y: 0.0 }));
        }
        assert!(!sender.send(EngineEvent::PointerMoved { x: 1.0, y: 1.0 }));
        assert_eq!(receiver.pending_count(), 2);
    }

    #[test]
    fn test_event_drain() {
        let bus = EventBus::new(16);
        let sender = bus.sender();
        let receiver = bus.receiver();

        for i in 0..10u8 {
            let _ = sender.send(EngineEvent::PointerMoved {
                x: f32::from(i),
                y: 0.0,
            });
        }

        assert_eq!(receiver.drain().len(), 10);
        assert!(!receiver.has_events());
    }

    #[test]
    fn test_wire_format() {
        let event: EngineEvent =
            serde_json::from_str(r#"{"kind": "camera_pan", "dx": 1.5, "dy": -2.0}"#).unwrap();
        assert_eq!(event, EngineEvent::CameraPan { dx: 1.5, dy: -2.0 });

        let custom: EngineEvent =
            serde_json::from_str(r#"{"kind": "custom", "name": "boss_defeated"}"#).unwrap();
        assert!(matches!(custom, EngineEvent::Custom { ref name, .. } if name == "boss_defeated"));
    }
}
