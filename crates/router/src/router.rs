//! The turn router — the per-turn routing state machine.
//!
//! States: Idle → Direct → {Confident, NeedsGrounding} → (Resolving →
//! Retrieving → Grounded) → Done. One user turn in, one provenance-tagged
//! assistant turn out (or a rolled-back store plus an engine error).

use std::sync::Arc;

use groundwire_core::engine::{AnswerEngine, EngineRequest, Usage};
use groundwire_core::error::EngineError;
use groundwire_core::retrieval::{GroundingDoc, GroundingRetriever};
use groundwire_core::routing::{Provenance, RoutingResult, SENTINEL};
use groundwire_core::session::Session;
use groundwire_core::turn::Turn;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::accumulator::{AccumulatedReply, StreamAccumulator};
use crate::event::RouteEvent;
use crate::prompts;
use crate::resolver::TopicResolver;

/// Fixed answer when neither the model nor retrieval could help.
pub const APOLOGY: &str = "Sorry, I don't have enough information to answer that.";

/// Routes each user turn to a direct or grounded answer.
pub struct TurnRouter {
    engine: Arc<dyn AnswerEngine>,
    retriever: Arc<dyn GroundingRetriever>,
    resolver: TopicResolver,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl TurnRouter {
    /// Create a new router over the given collaborators.
    pub fn new(
        engine: Arc<dyn AnswerEngine>,
        retriever: Arc<dyn GroundingRetriever>,
        model: impl Into<String>,
    ) -> Self {
        let model = model.into();
        let resolver = TopicResolver::new(engine.clone(), model.clone());
        Self {
            engine,
            retriever,
            resolver,
            model,
            temperature: 0.3,
            max_tokens: None,
        }
    }

    /// Set the sampling temperature for answer calls.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens per answer call.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Route one user turn using blocking engine calls.
    pub async fn route(
        &self,
        session: &mut Session,
        utterance: &str,
    ) -> Result<RoutingResult, EngineError> {
        self.route_inner(session, utterance, None).await
    }

    /// Route one user turn using streaming engine calls, forwarding
    /// [`RouteEvent`]s as they become visible.
    ///
    /// Abandoning the returned future mid-stream never commits a partial
    /// buffer: the assistant turn is appended only after the stream
    /// completed normally, and the pending user turn is rolled back so a
    /// retry of the same utterance does not duplicate it.
    pub async fn route_streamed(
        &self,
        session: &mut Session,
        utterance: &str,
        events: &mpsc::Sender<RouteEvent>,
    ) -> Result<RoutingResult, EngineError> {
        self.route_inner(session, utterance, Some(events)).await
    }

    async fn route_inner(
        &self,
        session: &mut Session,
        utterance: &str,
        events: Option<&mpsc::Sender<RouteEvent>>,
    ) -> Result<RoutingResult, EngineError> {
        let mut guard = TurnGuard::new(session, utterance);

        // ── Direct attempt over the full history ──
        let direct = match self.ask(self.direct_messages(guard.session()), events).await {
            Ok(reply) => reply,
            Err(e) => return Err(self.fail(events, e).await),
        };
        if let Some(usage) = &direct.usage {
            guard.session_mut().add_usage(usage);
        }

        if direct.text.trim() != SENTINEL {
            debug!(session = %guard.session().id, "Confident direct answer");
            return Ok(self
                .commit(&mut guard, events, direct.text, Provenance::ModelOnly, None, direct.usage)
                .await);
        }

        info!(session = %guard.session().id, "Model declined — resolving topic from conversation context");

        // ── Resolve against the history *before* this utterance ──
        let prior = &guard.session().turns()[..guard.session().len() - 1];
        let resolved = match self.resolver.resolve(utterance, prior).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(error = %e, "Topic resolution failed");
                return Ok(self.unavailable(&mut guard, events).await);
            }
        };
        if let Some(usage) = &resolved.usage {
            guard.session_mut().add_usage(usage);
        }

        // ── Retrieve grounding text ──
        let doc = match self.retriever.search(&resolved.topic).await {
            Ok(doc) => doc,
            Err(failure) => {
                info!(topic = %resolved.topic, failure = %failure, "Retrieval failed");
                return Ok(self.unavailable(&mut guard, events).await);
            }
        };

        info!(title = %doc.title, "Grounding retrieved, re-asking with context");
        if let Some(tx) = events {
            let _ = tx
                .send(RouteEvent::Grounding {
                    title: doc.title.clone(),
                })
                .await;
        }

        // ── Grounded re-ask ──
        let grounded = match self
            .ask(self.grounded_messages(guard.session(), &doc), events)
            .await
        {
            Ok(reply) => reply,
            Err(e) => return Err(self.fail(events, e).await),
        };
        if let Some(usage) = &grounded.usage {
            guard.session_mut().add_usage(usage);
        }

        Ok(self
            .commit(
                &mut guard,
                events,
                grounded.text,
                Provenance::Grounded,
                Some(doc.title),
                grounded.usage,
            )
            .await)
    }

    /// One engine call, blocking or streamed depending on `events`.
    ///
    /// The streamed form accumulates deltas behind the sentinel hold and
    /// forwards only visible text; the held tail is flushed once the
    /// stream ends and the buffer is known not to be the sentinel.
    async fn ask(
        &self,
        messages: Vec<Turn>,
        events: Option<&mpsc::Sender<RouteEvent>>,
    ) -> Result<AccumulatedReply, EngineError> {
        let request = EngineRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let Some(tx) = events else {
            let response = self.engine.complete(request).await?;
            return Ok(AccumulatedReply {
                text: response.text,
                usage: response.usage,
            });
        };

        let mut stream = self.engine.stream(request).await?;
        let mut acc = StreamAccumulator::new();

        while let Some(chunk) = stream.chunks.recv().await {
            let chunk = chunk?;
            if let Some(delta) = acc.push(&chunk) {
                let _ = tx.send(RouteEvent::Delta { content: delta }).await;
            }
            if chunk.done {
                break;
            }
        }

        if !acc.is_sentinel() {
            if let Some(tail) = acc.take_tail() {
                let _ = tx.send(RouteEvent::Delta { content: tail }).await;
            }
        }

        Ok(acc.finish())
    }

    fn direct_messages(&self, session: &Session) -> Vec<Turn> {
        let mut messages = vec![Turn::system(prompts::direct_system_prompt())];
        messages.extend(session.turns().iter().cloned());
        messages
    }

    fn grounded_messages(&self, session: &Session, doc: &GroundingDoc) -> Vec<Turn> {
        let mut messages = vec![
            Turn::system(prompts::GROUNDED_SYSTEM_PROMPT),
            Turn::system(prompts::grounding_note(doc)),
        ];
        messages.extend(session.turns().iter().cloned());
        messages
    }

    /// Append the answer turn and emit the final event.
    async fn commit(
        &self,
        guard: &mut TurnGuard<'_>,
        events: Option<&mpsc::Sender<RouteEvent>>,
        text: String,
        provenance: Provenance,
        grounding_title: Option<String>,
        usage: Option<Usage>,
    ) -> RoutingResult {
        // Synthesized answers were never streamed; surface them as one delta
        if provenance == Provenance::Unavailable {
            if let Some(tx) = events {
                let _ = tx.send(RouteEvent::Delta { content: text.clone() }).await;
            }
        }

        guard.commit_assistant(&text);

        let result = RoutingResult {
            text,
            provenance,
            grounding_title,
            usage,
        };

        if let Some(tx) = events {
            let _ = tx
                .send(RouteEvent::Done {
                    provenance: result.provenance,
                    grounding_title: result.grounding_title.clone(),
                    usage: result.usage.clone(),
                    session_tokens: guard.session().session_token_total(),
                })
                .await;
        }

        result
    }

    /// Resolution or retrieval failed after confidence was already
    /// declared low: no retry, no second direct attempt.
    async fn unavailable(
        &self,
        guard: &mut TurnGuard<'_>,
        events: Option<&mpsc::Sender<RouteEvent>>,
    ) -> RoutingResult {
        self.commit(
            guard,
            events,
            APOLOGY.to_string(),
            Provenance::Unavailable,
            None,
            None,
        )
        .await
    }

    /// Engine failure: surface the error event; the turn guard rolls the
    /// dangling user turn back when it drops.
    async fn fail(
        &self,
        events: Option<&mpsc::Sender<RouteEvent>>,
        error: EngineError,
    ) -> EngineError {
        if let Some(tx) = events {
            let _ = tx
                .send(RouteEvent::Error {
                    message: error.to_string(),
                })
                .await;
        }
        error
    }
}

/// Holds the just-appended user turn until an answer commits.
///
/// Dropped while still armed — engine failure, or the routing future
/// abandoned mid-stream — it removes the dangling user turn, so a retry
/// of the same utterance does not duplicate it.
struct TurnGuard<'a> {
    session: &'a mut Session,
    armed: bool,
}

impl<'a> TurnGuard<'a> {
    fn new(session: &'a mut Session, utterance: &str) -> Self {
        session.push_user(utterance);
        Self {
            session,
            armed: true,
        }
    }

    fn session(&self) -> &Session {
        self.session
    }

    fn session_mut(&mut self) -> &mut Session {
        self.session
    }

    /// Append the assistant turn and keep the user turn.
    fn commit_assistant(&mut self, text: &str) {
        self.session.push_assistant(text);
        self.armed = false;
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.rollback_dangling_user();
        }
    }
}
