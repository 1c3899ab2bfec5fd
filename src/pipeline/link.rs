//! Dynamic pad linking
//!
//! The source stage only knows its output pads once it has looked into the
//! container. Each announced pad arrives here as a [`PadDiscovered`] event
//! and is linked to the entry stage if its media type matches.

use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};

use super::backend::EntryPad;
use super::health::RunHealth;
use super::types::MediaKind;

/// A pad announced by the source stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadDiscovered {
    /// Stage that exposed the pad
    pub stage: String,
    pub pad: String,
    /// Negotiated media type, `None` if caps are not fixed yet
    pub media_type: Option<String>,
}

/// Link state of the entry pad
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    Unlinked,
    Linked { stage: String, pad: String },
}

/// What a single resolve call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The entry stage has no input pad to link into
    NoEntry,
    /// The entry pad already has a peer
    AlreadyLinked,
    /// The pad has no negotiated type yet
    NotReady,
    /// The type does not carry the expected prefix
    Ignored { media_type: String },
    Linked { media_type: String },
    /// The framework refused the link; not retried
    Failed { media_type: String, reason: String },
}

impl LinkOutcome {
    pub fn is_linked(&self) -> bool {
        matches!(self, LinkOutcome::Linked { .. })
    }
}

/// Links discovered pads of a given media family to one entry pad
///
/// Called from framework streaming threads. The state lock is held across
/// the link attempt, so concurrent announcements cannot both link.
pub struct LinkResolver {
    media_prefix: String,
    state: Mutex<LinkState>,
    health: Arc<RunHealth>,
}

impl LinkResolver {
    pub fn new(media_prefix: impl Into<String>, health: Arc<RunHealth>) -> Self {
        Self {
            media_prefix: media_prefix.into(),
            state: Mutex::new(LinkState::Unlinked),
            health,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Handle one announced pad
    ///
    /// `entry` is the entry stage's input pad as resolved for this call.
    pub fn resolve<E: EntryPad>(
        &self,
        event: &PadDiscovered,
        peer: &E::Peer,
        entry: Option<&E>,
    ) -> LinkOutcome {
        self.health.record_pad_discovered();
        info!("Received new pad '{}' from '{}'", event.pad, event.stage);

        let outcome = self.link_locked(event, peer, entry);
        match &outcome {
            LinkOutcome::NoEntry => {
                warn!("Entry stage exposes no input pad. Ignoring.");
            }
            LinkOutcome::AlreadyLinked => {
                info!("We are already linked. Ignoring.");
            }
            LinkOutcome::NotReady => {
                info!("Pad '{}' has no negotiated type yet. Ignoring.", event.pad);
            }
            LinkOutcome::Ignored { media_type } => {
                let family = MediaKind::from_media_type(media_type)
                    .map(|kind| kind.to_string())
                    .unwrap_or_else(|| "other".to_string());
                info!(
                    "It has type '{}' ({}) which is not '{}'. Ignoring.",
                    media_type, family, self.media_prefix
                );
            }
            LinkOutcome::Linked { media_type } => {
                info!("Link succeeded (type '{}').", media_type);
            }
            LinkOutcome::Failed { media_type, reason } => {
                warn!("Type is '{}' but link failed: {}", media_type, reason);
            }
        }

        match &outcome {
            LinkOutcome::Linked { .. } => self.health.record_pad_linked(),
            LinkOutcome::Failed { .. } => self.health.record_link_failure(),
            _ => self.health.record_pad_ignored(),
        }

        outcome
    }

    fn link_locked<E: EntryPad>(
        &self,
        event: &PadDiscovered,
        peer: &E::Peer,
        entry: Option<&E>,
    ) -> LinkOutcome {
        let Some(entry) = entry else {
            return LinkOutcome::NoEntry;
        };

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, LinkState::Linked { .. }) || entry.is_linked() {
            return LinkOutcome::AlreadyLinked;
        }

        let Some(media_type) = event.media_type.clone() else {
            return LinkOutcome::NotReady;
        };

        if !media_type.starts_with(&self.media_prefix) {
            return LinkOutcome::Ignored { media_type };
        }

        match entry.link_from(peer) {
            Ok(()) => {
                *state = LinkState::Linked {
                    stage: event.stage.clone(),
                    pad: event.pad.clone(),
                };
                LinkOutcome::Linked { media_type }
            }
            Err(reason) => LinkOutcome::Failed { media_type, reason },
        }
    }
}
