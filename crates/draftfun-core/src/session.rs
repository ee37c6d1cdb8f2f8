//! Generation session orchestration.
//!
//! A `GenerationSession` owns one conversation window and drives one
//! turn at a time: build the prompt, open a backend stream, accumulate
//! text frames, and on terminal `Done` validate and commit the artifact
//! into the window. Failures and cancellations leave the window exactly
//! as it was before the turn (the commit is all-or-nothing).

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use draftfun_types::config::EngineConfig;
use draftfun_types::error::SessionError;
use draftfun_types::llm::{BackendError, GenerationRequest, Message, StreamEvent};
use draftfun_types::session::{EngineVariant, RuntimeError, SessionMode};

use crate::backend::GenerationBackend;
use crate::detect;
use crate::feedback::ErrorFeedbackLoop;
use crate::prompt::PromptBuilder;
use crate::supervisor::StreamSupervisor;
use crate::window::MessageWindow;

/// Incremental updates surfaced to a caller while a turn is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnUpdate {
    /// A frame from the backend stream, in arrival order.
    Frame(StreamEvent),
    /// The accumulated buffer first became a plausibly complete
    /// document. Emitted at most once per turn; a live preview may
    /// render on it, but the commit decision happens only at `Done`.
    PlausiblyComplete,
}

/// How a turn ended.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The stream finished and the artifact was committed.
    Committed { artifact: String },
    /// The stream failed or finished without a valid artifact.
    Failed { error: SessionError },
    /// The turn was cancelled before completion.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Generating,
}

/// One generation session: conversation window, mode, active stream.
pub struct GenerationSession {
    id: Uuid,
    variant: EngineVariant,
    engine: EngineConfig,
    mode: SessionMode,
    window: MessageWindow,
    last_artifact: Option<String>,
    feedback: ErrorFeedbackLoop,
    supervisor: StreamSupervisor,
    backend: Arc<dyn GenerationBackend>,
    idle_timeout: Duration,
    state: SessionState,
}

impl GenerationSession {
    pub fn new(
        variant: EngineVariant,
        engine: EngineConfig,
        backend: Arc<dyn GenerationBackend>,
        idle_timeout: Duration,
    ) -> Self {
        let window = MessageWindow::new(engine.window_bound);
        Self {
            id: Uuid::now_v7(),
            variant,
            engine,
            mode: SessionMode::New,
            window,
            last_artifact: None,
            feedback: ErrorFeedbackLoop::new(),
            supervisor: StreamSupervisor::new(),
            backend,
            idle_timeout,
            state: SessionState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn variant(&self) -> EngineVariant {
        self.variant
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn last_artifact(&self) -> Option<&str> {
        self.last_artifact.as_deref()
    }

    pub fn is_generating(&self) -> bool {
        self.state == SessionState::Generating
    }

    /// Number of committed messages in the window.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Read-only view of the committed conversation.
    pub fn window_snapshot(&self) -> Vec<Message> {
        self.window.snapshot()
    }

    /// A handle that can cancel this session's active stream from
    /// another task, without holding the session itself.
    pub fn cancel_handle(&self) -> StreamSupervisor {
        self.supervisor.clone()
    }

    /// Stage a runtime error report for the next submit and return the
    /// pre-fill text for the input box. Valid in any state; a newer
    /// report replaces an unconsumed one.
    pub fn report_runtime_error(&mut self, error: RuntimeError) -> String {
        self.feedback.report(error)
    }

    /// The currently staged runtime error, if any.
    pub fn staged_error(&self) -> Option<&RuntimeError> {
        self.feedback.staged()
    }

    /// Discard a staged runtime error without submitting.
    pub fn clear_staged_error(&mut self) {
        self.feedback.clear();
    }

    /// Seed the session from a previously saved artifact and switch to
    /// edit mode. Only valid while idle.
    pub fn load_existing(&mut self, artifact: String) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidState(
                "cannot load an artifact while a generation is in flight".to_string(),
            ));
        }
        self.window.reset(Some(Message::assistant(artifact.clone())));
        self.last_artifact = Some(artifact);
        self.mode = SessionMode::Edit;
        Ok(())
    }

    /// Run one generation turn to its terminal state.
    ///
    /// Builds the prompt for the current mode, opens a backend stream,
    /// and consumes it frame by frame, forwarding frames to `updates`
    /// when provided. Returns `Err(InvalidState)` synchronously if a
    /// turn is already in flight; every other failure is a normal
    /// [`TurnOutcome`].
    pub async fn submit(
        &mut self,
        raw_user_text: &str,
        updates: Option<mpsc::UnboundedSender<TurnUpdate>>,
    ) -> Result<TurnOutcome, SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidState(
                "a generation is already in flight".to_string(),
            ));
        }

        let runtime_error = self.feedback.consume();
        let snapshot = self.window.snapshot();
        if self.mode == SessionMode::Edit {
            self.window.stage(Message::user(raw_user_text.to_string()));
        }
        let messages = PromptBuilder::build(
            self.mode,
            &snapshot,
            raw_user_text,
            runtime_error.as_ref(),
        );
        let request = GenerationRequest {
            model: self.engine.model.clone(),
            messages,
            temperature: self.engine.temperature,
            stream: true,
        };

        let (turn_id, token) = self.supervisor.begin();
        self.state = SessionState::Generating;
        debug!(session_id = %self.id, mode = %self.mode, model = %self.engine.model, "starting generation turn");

        let mut stream = self.backend.stream(request);
        let mut buffer = String::new();
        let mut plausible_signalled = false;

        enum StreamEnd {
            Done,
            Failed(SessionError),
            Cancelled,
        }

        let end = loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break StreamEnd::Cancelled,
                next = tokio::time::timeout(self.idle_timeout, stream.next()) => {
                    match next {
                        Err(_) => {
                            warn!(session_id = %self.id, timeout_secs = self.idle_timeout.as_secs(), "stream stalled");
                            break StreamEnd::Failed(
                                BackendError::Stream("no frame within the idle timeout".to_string()).into(),
                            );
                        }
                        Ok(None) => {
                            // Transport closed without a terminal frame.
                            break StreamEnd::Failed(
                                BackendError::Stream("stream ended without completion".to_string()).into(),
                            );
                        }
                        Ok(Some(Err(error))) => break StreamEnd::Failed(error.into()),
                        Ok(Some(Ok(event))) => {
                            if let StreamEvent::TextDelta { text } = &event {
                                buffer.push_str(text);
                            }
                            let done = matches!(event, StreamEvent::Done);
                            if let Some(sender) = &updates {
                                let _ = sender.send(TurnUpdate::Frame(event));
                                if !plausible_signalled && detect::is_complete(&buffer) {
                                    plausible_signalled = true;
                                    let _ = sender.send(TurnUpdate::PlausiblyComplete);
                                }
                            }
                            if done {
                                break StreamEnd::Done;
                            }
                        }
                    }
                }
            }
        };

        self.supervisor.finish(turn_id);
        self.state = SessionState::Idle;

        let outcome = match end {
            StreamEnd::Done => match detect::validate_artifact(&buffer) {
                Ok(()) => {
                    self.window.commit_staged();
                    self.window.push(Message::assistant(buffer.clone()));
                    self.last_artifact = Some(buffer.clone());
                    self.mode = SessionMode::Edit;
                    debug!(session_id = %self.id, artifact_bytes = buffer.len(), "turn committed");
                    TurnOutcome::Committed { artifact: buffer }
                }
                Err(error) => {
                    self.window.discard_staged();
                    warn!(session_id = %self.id, %error, "stream finished without a valid artifact");
                    TurnOutcome::Failed { error }
                }
            },
            StreamEnd::Failed(error) => {
                self.window.discard_staged();
                warn!(session_id = %self.id, %error, "turn failed");
                TurnOutcome::Failed { error }
            }
            StreamEnd::Cancelled => {
                self.window.discard_staged();
                debug!(session_id = %self.id, "turn cancelled");
                TurnOutcome::Cancelled
            }
        };

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use futures_util::stream;

    use crate::backend::FrameStream;

    /// Backend that replays a scripted frame sequence and records the
    /// last request it received.
    struct ScriptedBackend {
        frames: Mutex<Vec<Vec<Result<StreamEvent, BackendError>>>>,
        last_request: Mutex<Option<GenerationRequest>>,
    }

    impl ScriptedBackend {
        fn new(turns: Vec<Vec<Result<StreamEvent, BackendError>>>) -> Arc<Self> {
            Arc::new(Self {
                frames: Mutex::new(turns),
                last_request: Mutex::new(None),
            })
        }

        fn single(frames: Vec<Result<StreamEvent, BackendError>>) -> Arc<Self> {
            Self::new(vec![frames])
        }

        fn last_request(&self) -> GenerationRequest {
            self.last_request.lock().unwrap().clone().unwrap()
        }
    }

    impl GenerationBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        fn stream(&self, request: GenerationRequest) -> FrameStream {
            *self.last_request.lock().unwrap() = Some(request);
            let mut turns = self.frames.lock().unwrap();
            let frames = if turns.is_empty() {
                vec![]
            } else {
                turns.remove(0)
            };
            Box::pin(stream::iter(frames))
        }
    }

    /// Backend whose stream never yields, for cancellation tests.
    struct PendingBackend;

    impl GenerationBackend for PendingBackend {
        fn name(&self) -> &str {
            "pending"
        }

        fn stream(&self, _request: GenerationRequest) -> FrameStream {
            Box::pin(stream::pending())
        }
    }

    fn text(s: &str) -> Result<StreamEvent, BackendError> {
        Ok(StreamEvent::TextDelta {
            text: s.to_string(),
        })
    }

    fn session_with(backend: Arc<dyn GenerationBackend>) -> GenerationSession {
        GenerationSession::new(
            EngineVariant::Classic,
            EngineConfig::classic(),
            backend,
            Duration::from_secs(5),
        )
    }

    const ARTIFACT: &str = "<!DOCTYPE html><html><body></body></html>";

    #[tokio::test]
    async fn test_fresh_session_commits_single_assistant_message() {
        let backend = ScriptedBackend::single(vec![
            Ok(StreamEvent::Connected),
            text("<!DOCTYPE html><html>"),
            text("<body></body></html>"),
            Ok(StreamEvent::Done),
        ]);
        let mut session = session_with(backend);
        assert_eq!(session.mode(), SessionMode::New);

        let outcome = session.submit("a maze game", None).await.unwrap();
        match outcome {
            TurnOutcome::Committed { artifact } => assert_eq!(artifact, ARTIFACT),
            other => panic!("expected commit, got {other:?}"),
        }
        assert_eq!(session.mode(), SessionMode::Edit);
        assert_eq!(session.last_artifact(), Some(ARTIFACT));

        let window = session.window_snapshot();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0], Message::assistant(ARTIFACT));
    }

    #[tokio::test]
    async fn test_edit_turn_commits_user_and_artifact() {
        let v2 = "<!DOCTYPE html><html><body>v2</body></html>";
        let backend = ScriptedBackend::new(vec![
            vec![text(ARTIFACT), Ok(StreamEvent::Done)],
            vec![text(v2), Ok(StreamEvent::Done)],
        ]);
        let mut session = session_with(backend);

        session.submit("a maze game", None).await.unwrap();
        let outcome = session.submit("make it faster", None).await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Committed { .. }));

        let window = session.window_snapshot();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0], Message::assistant(ARTIFACT));
        assert_eq!(window[1], Message::user("make it faster"));
        assert_eq!(window[2], Message::assistant(v2));
        assert_eq!(session.last_artifact(), Some(v2));
    }

    #[tokio::test]
    async fn test_window_stays_within_bound_across_turns() {
        let turns: Vec<Vec<Result<StreamEvent, BackendError>>> = (0..6)
            .map(|i| {
                vec![
                    text(&format!("<!DOCTYPE html><html><body>v{i}</body></html>")),
                    Ok(StreamEvent::Done),
                ]
            })
            .collect();
        let backend = ScriptedBackend::new(turns);
        let mut session = GenerationSession::new(
            EngineVariant::Beta,
            EngineConfig::beta(),
            backend,
            Duration::from_secs(5),
        );

        for i in 0..6 {
            let outcome = session.submit(&format!("request {i}"), None).await.unwrap();
            assert!(matches!(outcome, TurnOutcome::Committed { .. }));
            assert!(session.window_len() <= 2);
        }
        // Newest artifact is always retained.
        assert_eq!(
            session.window_snapshot().last().unwrap().content,
            "<!DOCTYPE html><html><body>v5</body></html>"
        );
    }

    #[tokio::test]
    async fn test_backend_error_leaves_window_unchanged_and_allows_retry() {
        let backend = ScriptedBackend::new(vec![
            vec![
                text("<!DOCTYPE html><body>"),
                Err(BackendError::Stream("connection reset".to_string())),
            ],
            vec![text(ARTIFACT), Ok(StreamEvent::Done)],
        ]);
        let mut session = session_with(backend);

        let outcome = session.submit("a maze game", None).await.unwrap();
        assert!(matches!(
            outcome,
            TurnOutcome::Failed {
                error: SessionError::Backend(_)
            }
        ));
        assert_eq!(session.window_len(), 0);
        assert_eq!(session.mode(), SessionMode::New);
        assert!(session.last_artifact().is_none());

        // Same text again gets an independent attempt.
        let outcome = session.submit("a maze game", None).await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Committed { .. }));
    }

    #[tokio::test]
    async fn test_failed_edit_turn_discards_staged_user_message() {
        let backend = ScriptedBackend::new(vec![
            vec![text(ARTIFACT), Ok(StreamEvent::Done)],
            vec![Err(BackendError::RateLimited)],
        ]);
        let mut session = session_with(backend);
        session.submit("a maze game", None).await.unwrap();

        let outcome = session.submit("make it faster", None).await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Failed { .. }));

        let window = session.window_snapshot();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0], Message::assistant(ARTIFACT));
    }

    #[tokio::test]
    async fn test_truncated_stream_fails_with_incomplete_artifact() {
        let backend =
            ScriptedBackend::single(vec![text("<!DOCTYPE html><body>"), Ok(StreamEvent::Done)]);
        let mut session = session_with(backend);

        let outcome = session.submit("pong", None).await.unwrap();
        assert!(matches!(
            outcome,
            TurnOutcome::Failed {
                error: SessionError::IncompleteArtifact(_)
            }
        ));
        assert_eq!(session.window_len(), 0);
    }

    #[tokio::test]
    async fn test_fenced_output_is_a_format_violation() {
        let backend = ScriptedBackend::single(vec![
            text("```html\n<!DOCTYPE html><html></html>\n```"),
            Ok(StreamEvent::Done),
        ]);
        let mut session = session_with(backend);

        let outcome = session.submit("pong", None).await.unwrap();
        assert!(matches!(
            outcome,
            TurnOutcome::Failed {
                error: SessionError::IncompleteArtifact(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_stream_end_without_done_fails() {
        let backend = ScriptedBackend::single(vec![text(ARTIFACT)]);
        let mut session = session_with(backend);

        let outcome = session.submit("pong", None).await.unwrap();
        assert!(matches!(
            outcome,
            TurnOutcome::Failed {
                error: SessionError::Backend(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_reasoning_frames_never_enter_the_artifact() {
        let backend = ScriptedBackend::single(vec![
            Ok(StreamEvent::ReasoningDelta {
                text: "planning the layout".to_string(),
            }),
            text(ARTIFACT),
            Ok(StreamEvent::ReasoningDelta {
                text: "done thinking".to_string(),
            }),
            Ok(StreamEvent::Done),
        ]);
        let mut session = session_with(backend);

        let outcome = session.submit("pong", None).await.unwrap();
        match outcome {
            TurnOutcome::Committed { artifact } => assert_eq!(artifact, ARTIFACT),
            other => panic!("expected commit, got {other:?}"),
        }
        assert!(!session.last_artifact().unwrap().contains("planning"));
    }

    #[tokio::test]
    async fn test_runtime_error_is_embedded_then_consumed() {
        let backend = ScriptedBackend::new(vec![
            vec![text(ARTIFACT), Ok(StreamEvent::Done)],
            vec![text(ARTIFACT), Ok(StreamEvent::Done)],
        ]);
        let recorder = backend.clone();
        let mut session = session_with(backend);
        session.submit("a maze game", None).await.unwrap();

        let mut error = RuntimeError::new("x is not defined");
        error.line = Some(42);
        session.report_runtime_error(error);
        assert!(session.staged_error().is_some());

        session.submit("also add sound", None).await.unwrap();
        let request = recorder.last_request();
        let last = &request.messages.last().unwrap().content;
        let error_pos = last.find("x is not defined (line 42)").unwrap();
        let delta_pos = last.find("also add sound").unwrap();
        assert!(error_pos < delta_pos);
        assert!(session.staged_error().is_none());
    }

    #[tokio::test]
    async fn test_newer_runtime_error_replaces_staged_one() {
        let backend = ScriptedBackend::single(vec![text(ARTIFACT), Ok(StreamEvent::Done)]);
        let mut session = session_with(backend);
        session.report_runtime_error(RuntimeError::new("first"));
        session.report_runtime_error(RuntimeError::new("second"));
        assert_eq!(session.staged_error().unwrap().message, "second");

        session.clear_staged_error();
        assert!(session.staged_error().is_none());
    }

    #[tokio::test]
    async fn test_load_existing_seeds_edit_mode() {
        let backend = ScriptedBackend::single(vec![]);
        let mut session = session_with(backend);

        session.load_existing(ARTIFACT.to_string()).unwrap();
        assert_eq!(session.mode(), SessionMode::Edit);
        assert_eq!(session.last_artifact(), Some(ARTIFACT));

        let window = session.window_snapshot();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0], Message::assistant(ARTIFACT));
    }

    #[tokio::test]
    async fn test_cancel_handle_aborts_in_flight_turn() {
        let mut session = session_with(Arc::new(PendingBackend));
        let handle = session.cancel_handle();

        let turn = tokio::spawn(async move {
            let outcome = session.submit("pong", None).await.unwrap();
            (session, outcome)
        });
        // Let the turn reach its stream loop before cancelling.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(handle.cancel());

        let (session, outcome) = turn.await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Cancelled));
        assert_eq!(session.window_len(), 0);
        assert_eq!(session.mode(), SessionMode::New);
        assert!(!session.is_generating());
    }

    #[tokio::test]
    async fn test_second_submit_is_rejected_while_a_turn_is_in_flight() {
        // One session per mutex, as the HTTP layer holds it: a second
        // caller must be turned away without disturbing the live turn.
        let session = Arc::new(tokio::sync::Mutex::new(session_with(Arc::new(
            PendingBackend,
        ))));
        let cancel = session.try_lock().unwrap().cancel_handle();

        let guard = session.clone().try_lock_owned().unwrap();
        let turn = tokio::spawn(async move {
            let mut guard = guard;
            guard.submit("pong", None).await.unwrap()
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The concurrent submit path: lock contention, nothing else.
        assert!(session.clone().try_lock_owned().is_err());
        assert!(cancel.is_active());

        cancel.cancel();
        let outcome = turn.await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Cancelled));

        // The rejected caller never touched the session.
        let session = session.lock().await;
        assert_eq!(session.window_len(), 0);
        assert!(!session.is_generating());
    }

    #[tokio::test]
    async fn test_idle_timeout_fails_the_turn() {
        let mut session = GenerationSession::new(
            EngineVariant::Classic,
            EngineConfig::classic(),
            Arc::new(PendingBackend),
            Duration::from_millis(30),
        );

        let outcome = session.submit("pong", None).await.unwrap();
        assert!(matches!(
            outcome,
            TurnOutcome::Failed {
                error: SessionError::Backend(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_updates_report_frames_and_plausible_completion_once() {
        let backend = ScriptedBackend::single(vec![
            text("<!DOCTYPE html><html>"),
            text("</html>"),
            text("<!-- trailing -->"),
            Ok(StreamEvent::Done),
        ]);
        let mut session = session_with(backend);
        let (sender, mut receiver) = mpsc::unbounded_channel();

        session.submit("pong", Some(sender)).await.unwrap();

        let mut updates = Vec::new();
        while let Ok(update) = receiver.try_recv() {
            updates.push(update);
        }
        let plausible = updates
            .iter()
            .filter(|u| matches!(u, TurnUpdate::PlausiblyComplete))
            .count();
        assert_eq!(plausible, 1);
        // Completion is signalled as soon as the close marker lands,
        // before the stream is finished.
        assert_eq!(updates[2], TurnUpdate::PlausiblyComplete);
        assert!(matches!(
            updates.last().unwrap(),
            TurnUpdate::Frame(StreamEvent::Done)
        ));
    }

    #[tokio::test]
    async fn test_new_mode_prompt_has_system_and_templated_user() {
        let backend = ScriptedBackend::single(vec![text(ARTIFACT), Ok(StreamEvent::Done)]);
        let recorder = backend.clone();
        let mut session = session_with(backend);

        session.submit("a maze game", None).await.unwrap();
        let request = recorder.last_request();
        assert_eq!(request.model, "google/gemini-2.5-flash-preview");
        assert_eq!(request.temperature, None);
        assert!(request.stream);
        assert_eq!(request.messages.len(), 2);
        assert!(request.messages[1].content.contains("a maze game"));
    }
}
