//! Submission orchestrator
//!
//! One [`SubmissionPipeline`] backs one action trigger (a button, a CLI
//! command). It runs at most one submission at a time:
//!
//! ```text
//! Idle → Uploading → AwaitingPreparation → Invoking → AwaitingConfirmation → Succeeded
//!           │                │                 │                │
//!           └────────────────┴─────────────────┴────────────────┴──────────→ Failed
//! ```
//!
//! `Uploading` is skipped for requests without a payload. There is no retry;
//! after `Failed` the trigger is enabled again and the user decides.

use std::pin::pin;
use std::sync::{Arc, Mutex, Weak};

use futures::StreamExt;
use pledge_ipfs::ContentStore;
use pledge_ledger::{ConfirmationTracker, LedgerWriter};
use pledge_types::{ChainContext, ConfirmationResult, ContentReference, SubmissionRequest, TransactionHandle};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;
use crate::notify::{Notifier, SubmissionObserver, TracingNotifier};
use crate::session::{Stage, SubmissionSession};

/// What happens to the trigger after a confirmed submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuccessPolicy {
    /// Keep the trigger disabled; the action cannot be repeated
    #[default]
    LockTrigger,
    /// Allow another submission from the same pipeline
    Rearm,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub success_policy: SuccessPolicy,
}

/// A confirmed submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub content: Option<ContentReference>,
    pub transaction: TransactionHandle,
    pub message: String,
}

#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Another submission was in flight (or the trigger is locked); nothing ran
    Ignored,
    Succeeded(SubmissionReceipt),
    Failed(PipelineError),
}

impl SubmissionOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, SubmissionOutcome::Ignored)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Succeeded(_))
    }
}

pub struct SubmissionPipeline<S, L, C> {
    store: Arc<S>,
    ledger: Arc<L>,
    tracker: Arc<C>,
    context: ChainContext,
    settings: PipelineSettings,
    notifier: Arc<dyn Notifier>,
    observer: Option<Weak<dyn SubmissionObserver>>,
    session: watch::Sender<SubmissionSession>,
    /// Token of the run in flight, if any
    current: Mutex<Option<CancellationToken>>,
}

impl<S, L, C> SubmissionPipeline<S, L, C>
where
    S: ContentStore,
    L: LedgerWriter,
    C: ConfirmationTracker,
{
    pub fn new(store: Arc<S>, ledger: Arc<L>, tracker: Arc<C>, context: ChainContext) -> Self {
        Self {
            store,
            ledger,
            tracker,
            context,
            settings: PipelineSettings::default(),
            notifier: Arc::new(TracingNotifier),
            observer: None,
            session: watch::Sender::new(SubmissionSession::default()),
            current: Mutex::new(None),
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Register terminal callbacks without keeping the observer alive
    pub fn with_observer<O: SubmissionObserver + 'static>(mut self, observer: &Arc<O>) -> Self {
        let weak: Weak<dyn SubmissionObserver> = Arc::downgrade(observer) as Weak<dyn SubmissionObserver>;
        self.observer = Some(weak);
        self
    }

    pub fn context(&self) -> &ChainContext {
        &self.context
    }

    /// Watch every session change
    pub fn subscribe(&self) -> watch::Receiver<SubmissionSession> {
        self.session.subscribe()
    }

    pub fn session(&self) -> SubmissionSession {
        self.session.borrow().clone()
    }

    pub fn stage(&self) -> Stage {
        self.session.borrow().stage
    }

    /// Whether the UI should let the user fire the action
    pub fn is_trigger_enabled(&self) -> bool {
        self.accepts_trigger(self.stage())
    }

    fn accepts_trigger(&self, stage: Stage) -> bool {
        match stage {
            Stage::Idle | Stage::Failed => true,
            Stage::Succeeded => self.settings.success_policy == SuccessPolicy::Rearm,
            _ => false,
        }
    }

    /// Abort the submission in flight. A transaction that was already sent
    /// stays sent; only tracking stops.
    pub fn cancel(&self) {
        // Lock order is session, then current; never hold current while reading the session.
        let token = self.current.lock().unwrap_or_else(|e| e.into_inner()).clone();
        if let Some(token) = token {
            tracing::info!("Cancelling submission at stage {}", self.stage());
            token.cancel();
        }
    }

    /// Run one submission to its end. Returns [`SubmissionOutcome::Ignored`]
    /// without touching any adapter if the trigger is disabled.
    pub async fn submit(&self, request: SubmissionRequest) -> SubmissionOutcome {
        let Some(cancel) = self.begin(&request) else {
            tracing::debug!("Ignoring {} trigger at stage {}", request.target.function, self.stage());
            return SubmissionOutcome::Ignored;
        };

        tracing::info!(
            "Starting {} on {} ({:?} payload)",
            request.target.function,
            request.chain.display_name(),
            request.payload.kind()
        );

        let result = self.run(&request, &cancel).await;
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = None;
        self.finish(result)
    }

    /// Run a submission on the runtime, detached from the caller
    pub fn spawn(self: &Arc<Self>, request: SubmissionRequest) -> JoinHandle<SubmissionOutcome>
    where
        S: 'static,
        L: 'static,
        C: 'static,
    {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move { pipeline.submit(request).await })
    }

    /// Atomically move from an enabled stage into the first stage of a run
    fn begin(&self, request: &SubmissionRequest) -> Option<CancellationToken> {
        let first = if request.payload.is_empty() {
            Stage::AwaitingPreparation
        } else {
            Stage::Uploading
        };
        let token = CancellationToken::new();

        let started = self.session.send_if_modified(|session| {
            if !self.accepts_trigger(session.stage) {
                return false;
            }
            *session = SubmissionSession {
                stage: first,
                ..Default::default()
            };
            *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
            true
        });

        started.then_some(token)
    }

    fn advance(&self, stage: Stage, update: impl FnOnce(&mut SubmissionSession)) {
        tracing::debug!("Stage: {} -> {}", self.stage(), stage);
        self.session.send_modify(|session| {
            session.stage = stage;
            update(session);
        });
    }

    async fn run(
        &self,
        request: &SubmissionRequest,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReceipt, PipelineError> {
        let content = if request.payload.is_empty() {
            None
        } else {
            let reference = self
                .store
                .store(&request.payload, cancel)
                .await
                .map_err(PipelineError::from_store)?;
            tracing::info!("Payload stored at {}", reference);

            let published = reference.clone();
            self.advance(Stage::AwaitingPreparation, |s| s.content = Some(published));
            Some(reference)
        };

        let call = request
            .resolve(content.as_ref())
            .map_err(|e| PipelineError::Preparation(e.to_string()))?;

        let prepared = self
            .ledger
            .prepare(call, &self.context, cancel)
            .await
            .map_err(PipelineError::from_prepare)?;
        if let Some(reason) = prepared.reason() {
            return Err(PipelineError::Preparation(reason.to_string()));
        }

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        self.advance(Stage::Invoking, |_| {});
        let handle = self
            .ledger
            .invoke(prepared, &self.context, cancel)
            .await
            .map_err(PipelineError::from_invoke)?;

        let published = handle.clone();
        self.advance(Stage::AwaitingConfirmation, |s| s.transaction = Some(published));

        let mut confirmations = pin!(self.tracker.track(&handle, cancel));
        while let Some(status) = confirmations.next().await {
            match status {
                ConfirmationResult::Pending => {
                    tracing::debug!("{} still pending", handle.hash);
                }
                ConfirmationResult::Success => {
                    return Ok(SubmissionReceipt {
                        content,
                        transaction: handle.clone(),
                        message: request.success_message.clone(),
                    });
                }
                ConfirmationResult::Failure(reason) => {
                    return Err(PipelineError::Confirmation(reason));
                }
            }
        }

        if cancel.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Err(PipelineError::Confirmation(format!(
                "tracking of {} ended without a result",
                handle.hash
            )))
        }
    }

    fn finish(&self, result: Result<SubmissionReceipt, PipelineError>) -> SubmissionOutcome {
        match result {
            Ok(receipt) => {
                tracing::info!("Confirmed {}", receipt.transaction.hash);
                self.advance(Stage::Succeeded, |_| {});
                self.notifier.success(&receipt.message);
                if let Some(observer) = self.observer.as_ref().and_then(Weak::upgrade) {
                    observer.on_success(&receipt);
                }
                SubmissionOutcome::Succeeded(receipt)
            }
            Err(error) => {
                let message = error.user_message();
                tracing::warn!("Submission failed ({:?}): {}", error.kind(), error);
                let published = message.clone();
                self.advance(Stage::Failed, |s| s.error = Some(published));
                self.notifier.error(&message);
                if let Some(observer) = self.observer.as_ref().and_then(Weak::upgrade) {
                    observer.on_error(&error);
                }
                SubmissionOutcome::Failed(error)
            }
        }
    }
}
