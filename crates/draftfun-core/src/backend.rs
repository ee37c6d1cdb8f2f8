//! GenerationBackend trait definition.
//!
//! The abstraction the generation session drives. Implementations live
//! in draftfun-infra (e.g. `OpenRouterBackend`).

use std::pin::Pin;

use futures_util::Stream;

use draftfun_types::llm::{BackendError, GenerationRequest, StreamEvent};

/// A stream of generation frames, ending with `Done` on success or an
/// `Err` item on backend failure.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, BackendError>> + Send + 'static>>;

/// Trait for streaming generation backends.
///
/// `stream` returns a boxed stream so the trait stays object-safe and
/// can be held as `Arc<dyn GenerationBackend>` by the session.
pub trait GenerationBackend: Send + Sync {
    /// Human-readable backend name (e.g. "openrouter").
    fn name(&self) -> &str;

    /// Open exactly one network-level generation request and expose
    /// its response as a frame stream. Frames are delivered in arrival
    /// order; `Done` is the last item on a successful stream.
    fn stream(&self, request: GenerationRequest) -> FrameStream;
}
