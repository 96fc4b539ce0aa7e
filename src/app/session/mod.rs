// Clip session - one pick, window, annotate, save cycle

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::app::catalog::ClipCatalogStore;
use crate::app::pipeline::ClipExtractionPipeline;
use crate::domain::errors::SessionError;
use crate::domain::model::{ClipRecord, ClipWindow, NewClip, PickResult};
use crate::domain::rules::{
    MetadataRules, WindowRules, DEFAULT_CLIP_DURATION, MAX_DESCRIPTION_CHARS, MAX_NAME_CHARS,
};

/// The picked video and its length, when known
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSelection {
    pub uri: String,
    pub duration: Option<f64>,
}

/// Name and description as typed so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataDraft {
    pub name: String,
    pub description: String,
}

/// Session state; each variant holds only what is valid in it
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Selecting,
    Windowing {
        source: SourceSelection,
        window: ClipWindow,
        draft: MetadataDraft,
    },
    AnnotatingMetadata {
        source: SourceSelection,
        window: ClipWindow,
        draft: MetadataDraft,
    },
    Committing {
        source: SourceSelection,
        window: ClipWindow,
        draft: MetadataDraft,
    },
    Failed {
        source: SourceSelection,
        window: ClipWindow,
        draft: MetadataDraft,
        error: SessionError,
    },
}

/// Data-free view of [`SessionState`] for observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Selecting,
    Windowing,
    AnnotatingMetadata,
    Committing,
    Failed,
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Selecting => "selecting a video",
            SessionPhase::Windowing => "choosing the clip window",
            SessionPhase::AnnotatingMetadata => "editing clip details",
            SessionPhase::Committing => "saving",
            SessionPhase::Failed => "showing an error",
        }
    }

    /// Whether a save may be submitted
    pub fn accepts_save(&self) -> bool {
        *self == SessionPhase::AnnotatingMetadata
    }
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Selecting => SessionPhase::Selecting,
            SessionState::Windowing { .. } => SessionPhase::Windowing,
            SessionState::AnnotatingMetadata { .. } => SessionPhase::AnnotatingMetadata,
            SessionState::Committing { .. } => SessionPhase::Committing,
            SessionState::Failed { .. } => SessionPhase::Failed,
        }
    }

    pub fn window(&self) -> Option<ClipWindow> {
        match self {
            SessionState::Selecting => None,
            SessionState::Windowing { window, .. }
            | SessionState::AnnotatingMetadata { window, .. }
            | SessionState::Committing { window, .. }
            | SessionState::Failed { window, .. } => Some(*window),
        }
    }

    pub fn draft(&self) -> Option<&MetadataDraft> {
        match self {
            SessionState::Selecting => None,
            SessionState::Windowing { draft, .. }
            | SessionState::AnnotatingMetadata { draft, .. }
            | SessionState::Committing { draft, .. }
            | SessionState::Failed { draft, .. } => Some(draft),
        }
    }

    pub fn error(&self) -> Option<&SessionError> {
        match self {
            SessionState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Drives one user through picking a video, choosing a window, naming the
/// clip and saving it.
///
/// The window uses an explicit start and end; a fixed-length clip is a window
/// whose end the user never moved. Operations that do not apply in the
/// current state fail with [`SessionError::InvalidTransition`] and leave the
/// state alone.
pub struct ClipSession {
    pipeline: Arc<ClipExtractionPipeline>,
    catalog: Arc<ClipCatalogStore>,
    clip_duration: f64,
    state: SessionState,
    phase: watch::Sender<SessionPhase>,
}

impl ClipSession {
    pub fn new(pipeline: Arc<ClipExtractionPipeline>, catalog: Arc<ClipCatalogStore>) -> Self {
        let (phase, _) = watch::channel(SessionPhase::Selecting);
        Self {
            pipeline,
            catalog,
            clip_duration: DEFAULT_CLIP_DURATION,
            state: SessionState::Selecting,
            phase,
        }
    }

    /// Length of the initial window after a pick
    pub fn with_clip_duration(mut self, seconds: f64) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            self.clip_duration = seconds;
        }
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    /// Observe phase changes, e.g. to disable a save button while committing
    pub fn subscribe_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    fn transition(&mut self, next: SessionState) {
        let phase = next.phase();
        self.state = next;
        self.phase.send_if_modified(|current| {
            let changed = *current != phase;
            *current = phase;
            changed
        });
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            state: self.state.phase().name(),
        }
    }

    /// Take the picker result. Returns `false` when the user canceled, in
    /// which case the session keeps waiting for a pick.
    pub fn select_source(
        &mut self,
        pick: PickResult,
        source_duration: Option<f64>,
    ) -> Result<bool, SessionError> {
        if !matches!(self.state, SessionState::Selecting) {
            return Err(self.invalid("select a video"));
        }
        if pick.canceled {
            info!("Video selection canceled");
            return Ok(false);
        }
        let uri = match pick.uri {
            Some(uri) if !uri.trim().is_empty() => uri,
            _ => return Err(SessionError::InvalidSource),
        };
        if let Some(total) = source_duration {
            if !total.is_finite() || total <= 0.0 {
                return Err(SessionError::InvalidSourceDuration { seconds: total });
            }
        }

        let duration = match source_duration {
            Some(total) => self.clip_duration.min(total),
            None => self.clip_duration,
        };
        let window = ClipWindow::new(0.0, duration)?;
        info!("Selected {} ({:?}s)", uri, source_duration);
        self.transition(SessionState::Windowing {
            source: SourceSelection {
                uri,
                duration: source_duration,
            },
            window,
            draft: MetadataDraft::default(),
        });
        Ok(true)
    }

    fn windowing_mut(
        &mut self,
        action: &'static str,
    ) -> Result<(&SourceSelection, &mut ClipWindow), SessionError> {
        let state = self.state.phase().name();
        match &mut self.state {
            SessionState::Windowing { source, window, .. } => Ok((&*source, window)),
            _ => Err(SessionError::InvalidTransition { action, state }),
        }
    }

    /// Move the start, keeping the duration. The start is clamped to
    /// `[0, max(0, source - duration)]`.
    pub fn set_start(&mut self, start: f64) -> Result<ClipWindow, SessionError> {
        let (source, window) = self.windowing_mut("move the start")?;
        window.start = WindowRules::clamp_start(start, window.duration, source.duration);
        Ok(*window)
    }

    /// Move the end, keeping the start. An end past the source is pulled back
    /// to the source end.
    pub fn set_end(&mut self, end: f64) -> Result<ClipWindow, SessionError> {
        let (source, window) = self.windowing_mut("move the end")?;
        let end = match source.duration {
            Some(total) => end.min(total),
            None => end,
        };
        let updated = ClipWindow::between(window.start, end)?;
        *window = updated;
        Ok(updated)
    }

    /// Move both ends at once. An end past the source is pulled back to the
    /// source end; a negative start is rejected.
    pub fn set_range(&mut self, start: f64, end: f64) -> Result<ClipWindow, SessionError> {
        let (source, window) = self.windowing_mut("change the window")?;
        let end = match source.duration {
            Some(total) => end.min(total),
            None => end,
        };
        let updated = ClipWindow::between(start, end)?;
        *window = updated;
        Ok(updated)
    }

    /// Change the length, keeping the start
    pub fn set_duration(&mut self, duration: f64) -> Result<ClipWindow, SessionError> {
        let (source, window) = self.windowing_mut("change the length")?;
        let updated = ClipWindow::new(window.start, duration)?;
        WindowRules::validate_against_source(&updated, source.duration)?;
        *window = updated;
        Ok(updated)
    }

    /// Accept the window and go on to the clip details
    pub fn confirm_window(&mut self) -> Result<(), SessionError> {
        match std::mem::replace(&mut self.state, SessionState::Selecting) {
            SessionState::Windowing {
                source,
                window,
                draft,
            } => {
                if let Err(e) = WindowRules::validate_against_source(&window, source.duration) {
                    self.state = SessionState::Windowing {
                        source,
                        window,
                        draft,
                    };
                    return Err(e.into());
                }
                self.transition(SessionState::AnnotatingMetadata {
                    source,
                    window,
                    draft,
                });
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.invalid("confirm the window"))
            }
        }
    }

    fn draft_mut(&mut self, action: &'static str) -> Result<&mut MetadataDraft, SessionError> {
        let state = self.state.phase().name();
        match &mut self.state {
            SessionState::AnnotatingMetadata { draft, .. } => Ok(draft),
            _ => Err(SessionError::InvalidTransition { action, state }),
        }
    }

    /// Set the name, cut to the name length limit
    pub fn set_name(&mut self, name: &str) -> Result<&str, SessionError> {
        let draft = self.draft_mut("edit the name")?;
        draft.name = MetadataRules::truncate(name, MAX_NAME_CHARS);
        Ok(&draft.name)
    }

    /// Set the description, cut to the description length limit
    pub fn set_description(&mut self, description: &str) -> Result<&str, SessionError> {
        let draft = self.draft_mut("edit the description")?;
        draft.description = MetadataRules::truncate(description, MAX_DESCRIPTION_CHARS);
        Ok(&draft.description)
    }

    /// Return to the window editor, keeping window and drafts. Also the way
    /// out of a failed save.
    pub fn back_to_windowing(&mut self) -> Result<(), SessionError> {
        match std::mem::replace(&mut self.state, SessionState::Selecting) {
            SessionState::AnnotatingMetadata {
                source,
                window,
                draft,
            }
            | SessionState::Failed {
                source,
                window,
                draft,
                ..
            } => {
                self.transition(SessionState::Windowing {
                    source,
                    window,
                    draft,
                });
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.invalid("go back to the window"))
            }
        }
    }

    /// Drop the current source and start over.
    ///
    /// `Committing` is only held while a [`save`](ClipSession::save) future
    /// borrows the session, so every state observable here can be left.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Selecting);
        Ok(())
    }

    /// Extract the clip and add it to the catalog.
    ///
    /// On success the session returns to `Selecting`. On failure it moves to
    /// `Failed` holding the error; [`back_to_windowing`] or [`reset`] leave it.
    /// If the future is dropped before it completes, the session goes back to
    /// `AnnotatingMetadata` with the window and drafts unchanged.
    ///
    /// [`back_to_windowing`]: ClipSession::back_to_windowing
    /// [`reset`]: ClipSession::reset
    pub async fn save(&mut self) -> Result<ClipRecord, SessionError> {
        let (source, window, draft) =
            match std::mem::replace(&mut self.state, SessionState::Selecting) {
                SessionState::AnnotatingMetadata {
                    source,
                    window,
                    draft,
                } => (source, window, draft),
                other => {
                    self.state = other;
                    return Err(self.invalid("save"));
                }
            };

        self.transition(SessionState::Committing {
            source: source.clone(),
            window,
            draft: draft.clone(),
        });

        let result = {
            let mut guard = CommitGuard {
                session: self,
                pending: Some((source.clone(), window, draft.clone())),
            };
            let result = guard.session.commit(&source, window, &draft).await;
            guard.pending = None;
            result
        };
        match result {
            Ok(record) => {
                info!("Saved clip {} to {}", record.id, record.uri);
                self.transition(SessionState::Selecting);
                Ok(record)
            }
            Err(error) => {
                warn!("Save failed: {}", error);
                self.transition(SessionState::Failed {
                    source,
                    window,
                    draft,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    async fn commit(
        &self,
        source: &SourceSelection,
        window: ClipWindow,
        draft: &MetadataDraft,
    ) -> Result<ClipRecord, SessionError> {
        let descriptor = self
            .pipeline
            .extract(&source.uri, window)
            .await
            .map_err(SessionError::ClipNotCreated)?;

        let clip = NewClip::from_descriptor(&descriptor, &draft.name, &draft.description);
        self.catalog
            .add_video(clip)
            .await
            .map_err(|source| SessionError::ClipNotSaved {
                output_path: descriptor.output_path.clone(),
                source,
            })
    }
}

/// Returns an interrupted save to `AnnotatingMetadata`
struct CommitGuard<'a> {
    session: &'a mut ClipSession,
    pending: Option<(SourceSelection, ClipWindow, MetadataDraft)>,
}

impl Drop for CommitGuard<'_> {
    fn drop(&mut self) {
        if let Some((source, window, draft)) = self.pending.take() {
            warn!("Save interrupted, back to clip details");
            self.session.transition(SessionState::AnnotatingMetadata {
                source,
                window,
                draft,
            });
        }
    }
}
