//! Fire-and-forget announcement playback.
//!
//! The coordinator decides synchronously what to say and hands the result to
//! an [`AudioDispatcher`]. A background task plays announcements one at a
//! time in the order they were queued. Failures are logged and dropped.
//! Mute changes travel through the same queue, so they only affect
//! announcements decided after them.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::announce::Announcement;
use crate::services::{AudioAnnouncer, AudioError};

enum AudioCommand {
    Announce(Announcement),
    Silence,
    SetEnabled(bool),
    Flush(oneshot::Sender<()>),
}

/// Queue feeding an [`AudioAnnouncer`] from a background task.
#[derive(Debug, Clone)]
pub struct AudioDispatcher {
    tx: mpsc::UnboundedSender<AudioCommand>,
}

impl std::fmt::Debug for AudioCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Announce(a) => write!(f, "Announce({})", a.kind()),
            Self::Silence => write!(f, "Silence"),
            Self::SetEnabled(enabled) => write!(f, "SetEnabled({enabled})"),
            Self::Flush(_) => write!(f, "Flush"),
        }
    }
}

impl AudioDispatcher {
    /// Start the playback task on `runtime`.
    #[must_use]
    pub fn spawn(announcer: Arc<dyn AudioAnnouncer>, runtime: &Handle) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AudioCommand>();

        runtime.spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    AudioCommand::Announce(announcement) => {
                        trace!(kind = announcement.kind(), "Playing announcement");
                        if let Err(e) = play(announcer.as_ref(), &announcement).await {
                            warn!(kind = announcement.kind(), error = %e, "Announcement failed");
                        }
                    }
                    AudioCommand::Silence => {
                        if let Err(e) = announcer.stop().await {
                            warn!(error = %e, "Failed to silence announcer");
                        }
                    }
                    AudioCommand::SetEnabled(enabled) => announcer.set_enabled(enabled),
                    AudioCommand::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("Audio dispatcher stopped");
        });

        Self { tx }
    }

    /// Queue an announcement. Never blocks.
    pub fn announce(&self, announcement: Announcement) {
        if self.tx.send(AudioCommand::Announce(announcement)).is_err() {
            warn!("Audio dispatcher is gone; announcement dropped");
        }
    }

    /// Queue a request to silence speech in progress.
    pub fn silence(&self) {
        let _ = self.tx.send(AudioCommand::Silence);
    }

    /// Queue a mute change behind the announcements already waiting.
    pub fn set_enabled(&self, enabled: bool) {
        if self.tx.send(AudioCommand::SetEnabled(enabled)).is_err() {
            warn!(enabled, "Audio dispatcher is gone; mute change dropped");
        }
    }

    /// Wait until everything queued so far has been played.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(AudioCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

/// Play one announcement on `announcer`.
///
/// # Errors
///
/// Returns whatever the announcer reports.
pub async fn play(
    announcer: &dyn AudioAnnouncer,
    announcement: &Announcement,
) -> Result<(), AudioError> {
    match announcement {
        Announcement::NavigationStarted {
            destination,
            total_distance_m,
        } => {
            announcer
                .announce_navigation_start(destination, *total_distance_m)
                .await
        }
        Announcement::OffRoute => announcer.announce_off_route().await,
        Announcement::RouteComplete { destination } => {
            announcer.announce_route_complete(destination).await
        }
        Announcement::ApproachingWaypoint {
            name,
            distance_m,
            profile,
        } => {
            announcer
                .announce_approaching_waypoint(name, *distance_m, *profile)
                .await
        }
        Announcement::Rerouting => announcer.announce_rerouting().await,
    }
}
