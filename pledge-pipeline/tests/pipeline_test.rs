use std::sync::{Arc, Mutex};

use futures::Stream;
use pledge_ipfs::{ContentStore, MemoryContentStore, StoreError};
use pledge_ledger::{ConfirmationTracker, LedgerWriter, MemoryLedger, PreparedCall};
use pledge_pipeline::actions;
use pledge_pipeline::{
    ErrorKind, Notifier, PipelineError, PipelineSettings, Stage, SubmissionObserver, SubmissionOutcome,
    SubmissionPipeline, SubmissionReceipt, SuccessPolicy,
};
use pledge_types::{
    ArgValue, ChainContext, ChainId, ConfirmationResult, ContentReference, ContractBook, Payload,
    ResolvedCall, TransactionHandle,
};
use tokio_util::sync::CancellationToken;

type MemoryPipeline = SubmissionPipeline<MemoryContentStore, MemoryLedger, MemoryLedger>;

fn chain() -> ChainId {
    ChainId::parse("base:sepolia").unwrap()
}

fn context() -> ChainContext {
    ChainContext::new(
        chain(),
        ContractBook {
            goal: "0xgoal".to_string(),
            profile: "0xprofile".to_string(),
            treasury: "0xtreasury".to_string(),
        },
    )
    .with_account("0xalice")
}

fn pipeline(store: &Arc<MemoryContentStore>, ledger: &Arc<MemoryLedger>) -> MemoryPipeline {
    SubmissionPipeline::new(store.clone(), ledger.clone(), ledger.clone(), context())
}

#[derive(Default)]
struct Recorder {
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl Recorder {
    fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }

    fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Notifier for Recorder {
    fn success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

impl SubmissionObserver for Recorder {
    fn on_success(&self, receipt: &SubmissionReceipt) {
        self.successes.lock().unwrap().push(receipt.transaction.hash.clone());
    }

    fn on_error(&self, error: &PipelineError) {
        self.errors.lock().unwrap().push(format!("{:?}", error.kind()));
    }
}

fn expect_failure(outcome: SubmissionOutcome) -> PipelineError {
    match outcome {
        SubmissionOutcome::Failed(error) => error,
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_json_message_runs_every_stage_once() {
    let store = Arc::new(MemoryContentStore::new());
    let ledger = Arc::new(MemoryLedger::new(chain()));
    let notifier = Arc::new(Recorder::default());
    let observer = Arc::new(Recorder::default());
    let pipeline = pipeline(&store, &ledger)
        .with_notifier(notifier.clone())
        .with_observer(&observer);

    let outcome = pipeline.submit(actions::post_message(&context(), 9, "gm")).await;

    let receipt = match outcome {
        SubmissionOutcome::Succeeded(receipt) => receipt,
        other => panic!("expected success, got {:?}", other),
    };
    let uri = receipt.content.as_ref().unwrap().uri().to_string();

    assert_eq!(store.store_calls(), 1);
    assert_eq!(ledger.prepare_calls(), 1);
    assert_eq!(ledger.invoke_calls(), 1);

    let prepared = ledger.prepared_calls();
    assert_eq!(prepared[0].function, "postMessage");
    assert_eq!(prepared[0].args, vec![ArgValue::Uint(9), ArgValue::String(uri)]);

    assert_eq!(pipeline.stage(), Stage::Succeeded);
    assert_eq!(notifier.successes(), vec!["Message posted".to_string()]);
    assert_eq!(observer.successes(), vec![receipt.transaction.hash.clone()]);
    assert!(observer.errors().is_empty());

    let session = pipeline.session();
    assert_eq!(session.transaction, Some(receipt.transaction));
    assert!(session.error.is_none());
}

#[tokio::test]
async fn test_wrong_network_fails_before_invoke() {
    let store = Arc::new(MemoryContentStore::new());
    let ledger = Arc::new(MemoryLedger::new(ChainId::eip155(1)));
    let observer = Arc::new(Recorder::default());
    let pipeline = pipeline(&store, &ledger).with_observer(&observer);

    let error = expect_failure(pipeline.submit(actions::post_message(&context(), 1, "gm")).await);

    assert_eq!(error.kind(), ErrorKind::Preparation);
    assert_eq!(ledger.prepare_calls(), 1);
    assert_eq!(ledger.invoke_calls(), 0);
    assert_eq!(pipeline.stage(), Stage::Failed);
    assert_eq!(
        pipeline.session().error.as_deref(),
        Some("Wrong network. Switch your wallet to the app's network.")
    );
    assert_eq!(observer.errors(), vec!["Preparation".to_string()]);
}

#[tokio::test]
async fn test_upload_failure_stops_pipeline() {
    let store = Arc::new(MemoryContentStore::new());
    store.fail_uploads("gateway timeout");
    let ledger = Arc::new(MemoryLedger::new(chain()));
    let pipeline = pipeline(&store, &ledger);

    let error = expect_failure(pipeline.submit(actions::post_message(&context(), 1, "gm")).await);

    assert!(matches!(error, PipelineError::Upload(StoreError::Upload(_))));
    assert_eq!(ledger.prepare_calls(), 0);
    assert_eq!(ledger.invoke_calls(), 0);
    assert!(pipeline.is_trigger_enabled());

    // The user can retry; nothing retries on its own.
    let error = expect_failure(pipeline.submit(actions::post_message(&context(), 1, "gm")).await);
    assert_eq!(error.kind(), ErrorKind::Upload);
    assert_eq!(store.store_calls(), 2);
}

#[tokio::test]
async fn test_second_trigger_during_upload_is_ignored() {
    let store = Arc::new(MemoryContentStore::new());
    store.pause_uploads();
    let ledger = Arc::new(MemoryLedger::new(chain()));
    let pipeline = Arc::new(pipeline(&store, &ledger));

    let mut session = pipeline.subscribe();
    let first = pipeline.spawn(actions::post_message(&context(), 1, "gm"));
    session.wait_for(|s| s.stage == Stage::Uploading).await.unwrap();

    assert!(!pipeline.is_trigger_enabled());
    let second = pipeline.submit(actions::post_message(&context(), 1, "gm again")).await;
    assert!(second.is_ignored());
    let third = pipeline.spawn(actions::watch_goal(&context(), 1)).await.unwrap();
    assert!(third.is_ignored());

    store.release_uploads();
    assert!(first.await.unwrap().is_success());

    assert_eq!(store.store_calls(), 1);
    assert_eq!(ledger.invoke_calls(), 1);
}

#[tokio::test]
async fn test_reverted_transaction_fails() {
    let store = Arc::new(MemoryContentStore::new());
    let ledger = Arc::new(MemoryLedger::new(chain()));
    ledger.confirm_with(ConfirmationResult::Failure("execution reverted: GoalClosed()".to_string()), 3);
    let notifier = Arc::new(Recorder::default());
    let pipeline = pipeline(&store, &ledger).with_notifier(notifier.clone());

    let error = expect_failure(pipeline.submit(actions::close_as_achieved(&context(), 5)).await);

    assert_eq!(error.kind(), ErrorKind::Confirmation);
    assert_eq!(notifier.errors(), vec!["This goal is already closed.".to_string()]);
    assert!(notifier.successes().is_empty());
    assert!(pipeline.session().transaction.is_some());
}

#[tokio::test]
async fn test_tracker_without_verdict_fails() {
    let store = Arc::new(MemoryContentStore::new());
    let ledger = Arc::new(MemoryLedger::new(chain()));
    ledger.confirm_with(ConfirmationResult::Pending, 2);
    let pipeline = pipeline(&store, &ledger);

    let error = expect_failure(pipeline.submit(actions::watch_goal(&context(), 5)).await);

    assert_eq!(error.kind(), ErrorKind::Confirmation);
    assert_eq!(pipeline.stage(), Stage::Failed);
}

#[tokio::test]
async fn test_signer_rejection() {
    let store = Arc::new(MemoryContentStore::new());
    let ledger = Arc::new(MemoryLedger::new(chain()));
    ledger.reject_with("User rejected the request.");
    let pipeline = pipeline(&store, &ledger);

    let error = expect_failure(pipeline.submit(actions::accept_motivator(&context(), 2, "0xbob")).await);

    assert_eq!(error.kind(), ErrorKind::Submission);
    assert_eq!(error.user_message(), "Transaction rejected in wallet.");
    assert_eq!(ledger.track_calls(), 0);
}

#[tokio::test]
async fn test_payloadless_action_skips_upload() {
    let store = Arc::new(MemoryContentStore::new());
    let ledger = Arc::new(MemoryLedger::new(chain()));
    let pipeline = pipeline(&store, &ledger);

    let outcome = pipeline.submit(actions::close_as_failed(&context(), 3)).await;

    assert!(outcome.is_success());
    assert_eq!(store.store_calls(), 0);
    assert!(pipeline.session().content.is_none());
}

#[tokio::test]
async fn test_success_locks_trigger_by_default() {
    let store = Arc::new(MemoryContentStore::new());
    let ledger = Arc::new(MemoryLedger::new(chain()));
    let pipeline = pipeline(&store, &ledger);

    assert!(pipeline.submit(actions::watch_goal(&context(), 1)).await.is_success());
    assert!(!pipeline.is_trigger_enabled());
    assert!(pipeline.submit(actions::watch_goal(&context(), 1)).await.is_ignored());
    assert_eq!(ledger.invoke_calls(), 1);
}

#[tokio::test]
async fn test_rearm_policy_allows_resubmission() {
    let store = Arc::new(MemoryContentStore::new());
    let ledger = Arc::new(MemoryLedger::new(chain()));
    let pipeline = pipeline(&store, &ledger).with_settings(PipelineSettings {
        success_policy: SuccessPolicy::Rearm,
    });

    assert!(pipeline.submit(actions::post_message(&context(), 1, "gm")).await.is_success());
    assert!(pipeline.is_trigger_enabled());
    assert!(pipeline.submit(actions::post_message(&context(), 1, "gn")).await.is_success());
    assert_eq!(ledger.invoke_calls(), 2);
}

#[tokio::test]
async fn test_cancel_during_upload() {
    let store = Arc::new(MemoryContentStore::new());
    store.pause_uploads();
    let ledger = Arc::new(MemoryLedger::new(chain()));
    let pipeline = Arc::new(pipeline(&store, &ledger));

    let mut session = pipeline.subscribe();
    let run = pipeline.spawn(actions::post_message(&context(), 1, "gm"));
    session.wait_for(|s| s.stage == Stage::Uploading).await.unwrap();

    pipeline.cancel();
    let error = expect_failure(run.await.unwrap());

    assert_eq!(error.kind(), ErrorKind::Cancelled);
    assert_eq!(ledger.prepare_calls(), 0);
    assert!(pipeline.is_trigger_enabled());
}

#[tokio::test]
async fn test_dropped_observer_is_skipped() {
    let store = Arc::new(MemoryContentStore::new());
    let ledger = Arc::new(MemoryLedger::new(chain()));
    let observer = Arc::new(Recorder::default());
    let pipeline = pipeline(&store, &ledger).with_observer(&observer);
    drop(observer);

    assert!(pipeline.submit(actions::watch_goal(&context(), 1)).await.is_success());
    assert_eq!(pipeline.stage(), Stage::Succeeded);
}

#[tokio::test]
async fn test_independent_pipelines_share_adapters() {
    let store = Arc::new(MemoryContentStore::new());
    let ledger = Arc::new(MemoryLedger::new(chain()));
    let a = Arc::new(pipeline(&store, &ledger));
    let b = Arc::new(pipeline(&store, &ledger));

    let (ra, rb) = tokio::join!(
        a.spawn(actions::post_message(&context(), 1, "gm")),
        b.spawn(actions::watch_goal(&context(), 1)),
    );

    assert!(ra.unwrap().is_success());
    assert!(rb.unwrap().is_success());
    assert_eq!(ledger.invoke_calls(), 2);
}

/// Adapters that write every call into one shared journal
#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<&'static str>>>);

impl Journal {
    fn push(&self, entry: &'static str) {
        self.0.lock().unwrap().push(entry);
    }

    fn entries(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

struct JournaledStore {
    inner: MemoryContentStore,
    journal: Journal,
}

impl ContentStore for JournaledStore {
    async fn store(&self, payload: &Payload, cancel: &CancellationToken) -> pledge_ipfs::Result<ContentReference> {
        self.journal.push("store");
        self.inner.store(payload, cancel).await
    }

    async fn resolve(&self, reference: &ContentReference, cancel: &CancellationToken) -> pledge_ipfs::Result<Vec<u8>> {
        self.inner.resolve(reference, cancel).await
    }
}

struct JournaledLedger {
    inner: MemoryLedger,
    journal: Journal,
}

impl LedgerWriter for JournaledLedger {
    async fn prepare(
        &self,
        call: ResolvedCall,
        context: &ChainContext,
        cancel: &CancellationToken,
    ) -> pledge_ledger::Result<PreparedCall> {
        self.journal.push("prepare");
        self.inner.prepare(call, context, cancel).await
    }

    async fn invoke(
        &self,
        prepared: PreparedCall,
        context: &ChainContext,
        cancel: &CancellationToken,
    ) -> pledge_ledger::Result<TransactionHandle> {
        assert!(prepared.is_valid(), "invoke called with an invalid prepared call");
        self.journal.push("invoke");
        self.inner.invoke(prepared, context, cancel).await
    }
}

impl ConfirmationTracker for JournaledLedger {
    fn track(
        &self,
        handle: &TransactionHandle,
        cancel: &CancellationToken,
    ) -> impl Stream<Item = ConfirmationResult> + Send {
        self.journal.push("track");
        self.inner.track(handle, cancel)
    }
}

#[tokio::test]
async fn test_stages_run_in_order() {
    let journal = Journal::default();
    let store = Arc::new(JournaledStore {
        inner: MemoryContentStore::new(),
        journal: journal.clone(),
    });
    let ledger = Arc::new(JournaledLedger {
        inner: MemoryLedger::new(chain()),
        journal: journal.clone(),
    });
    let pipeline = SubmissionPipeline::new(store, ledger.clone(), ledger, context());

    let proof = actions::add_proof(&context(), 4, Some("run.jpg".to_string()), vec![7; 512]).unwrap();
    assert!(pipeline.submit(proof).await.is_success());
    assert_eq!(journal.entries(), vec!["store", "prepare", "invoke", "track"]);
}

#[tokio::test]
async fn test_no_invoke_after_failed_simulation() {
    let journal = Journal::default();
    let inner = MemoryLedger::new(chain());
    inner.revert_with("execution reverted: DeadlineTooSoon()");
    let store = Arc::new(JournaledStore {
        inner: MemoryContentStore::new(),
        journal: journal.clone(),
    });
    let ledger = Arc::new(JournaledLedger {
        inner,
        journal: journal.clone(),
    });
    let pipeline = SubmissionPipeline::new(store, ledger.clone(), ledger, context());

    let error = expect_failure(
        pipeline
            .submit(actions::create_goal(&context(), "ship it", 1, 100))
            .await,
    );

    assert_eq!(error.user_message(), "The deadline is too soon. Pick a later date.");
    assert_eq!(journal.entries(), vec!["store", "prepare"]);
}
