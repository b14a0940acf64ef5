//! Goal actions, each run through one submission pipeline

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use pledge_cli::config::Config;
use pledge_cli::console::{outcome_report, stage_line, ConsoleNotifier};
use pledge_ipfs::{ContentStore, HttpContentStore, MemoryContentStore};
use pledge_ledger::{ConfirmationTracker, LedgerWriter, MemoryLedger, RpcLedger};
use pledge_pipeline::actions::{self, ProfileDocument};
use pledge_pipeline::{SubmissionOutcome, SubmissionPipeline};
use pledge_types::{ChainContext, SubmissionRequest};

use crate::GoalCommands;

/// Signing account used with `--offline` when none is configured
const OFFLINE_ACCOUNT: &str = "0x00000000000000000000000000000000000000ff";

/// Run one goal action. A failed submission was already reported by the
/// notifier, so it only shows in the exit code.
pub async fn run(config: &Config, offline: bool, cmd: GoalCommands) -> Result<ExitCode> {
    let account = offline.then_some(OFFLINE_ACCOUNT).filter(|_| config.ledger.account.is_none());
    let context = config.ledger.context(account);
    let request = build_request(&context, cmd)?;

    if offline {
        let ledger = Arc::new(MemoryLedger::new(context.chain.clone()));
        let pipeline = SubmissionPipeline::new(
            Arc::new(MemoryContentStore::new()),
            ledger.clone(),
            ledger,
            context,
        );
        drive(config, pipeline, request).await
    } else {
        if context.contracts.goal.is_empty() {
            anyhow::bail!("No goal contract configured; set [ledger.contracts] in the config file");
        }

        let ledger = RpcLedger::new(config.ledger.rpc())?;
        let connected = ledger.chain_id().await?;
        if connected != context.chain {
            tracing::warn!(
                "Signer is on {}, config expects {}",
                connected.display_name(),
                context.chain.display_name()
            );
        }

        let ledger = Arc::new(ledger);
        let pipeline = SubmissionPipeline::new(
            Arc::new(HttpContentStore::new(config.ipfs.clone())?),
            ledger.clone(),
            ledger,
            context,
        );
        drive(config, pipeline, request).await
    }
}

fn build_request(context: &ChainContext, cmd: GoalCommands) -> Result<SubmissionRequest> {
    Ok(match cmd {
        GoalCommands::Create { description, deadline, stake } => {
            actions::create_goal(context, &description, deadline, stake)
        }
        GoalCommands::Message { goal_id, message } => actions::post_message(context, goal_id, &message),
        GoalCommands::AcceptMotivator { goal_id, motivator } => {
            actions::accept_motivator(context, goal_id, &motivator)
        }
        GoalCommands::Watch { goal_id } => actions::watch_goal(context, goal_id),
        GoalCommands::Proof { goal_id, file } => {
            let bytes = std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let name = file.file_name().map(|n| n.to_string_lossy().into_owned());
            actions::add_proof(context, goal_id, name, bytes)?
        }
        GoalCommands::Achieve { goal_id } => actions::close_as_achieved(context, goal_id),
        GoalCommands::Fail { goal_id } => actions::close_as_failed(context, goal_id),
        GoalCommands::Profile { name, about, image, twitter } => {
            let profile = ProfileDocument { name, about, image, twitter };
            actions::edit_profile(context, &profile)
        }
    })
}

/// Run one submission, printing every stage change. Ctrl-C cancels it.
async fn drive<S, L, C>(config: &Config, pipeline: SubmissionPipeline<S, L, C>, request: SubmissionRequest) -> Result<ExitCode>
where
    S: ContentStore + 'static,
    L: LedgerWriter + 'static,
    C: ConfirmationTracker + 'static,
{
    let pipeline = Arc::new(
        pipeline
            .with_settings(config.pipeline.settings())
            .with_notifier(Arc::new(ConsoleNotifier)),
    );

    let mut session = pipeline.subscribe();
    let printer = tokio::spawn(async move {
        while session.changed().await.is_ok() {
            let snapshot = session.borrow_and_update().clone();
            if let Some(line) = stage_line(&snapshot) {
                println!("{}", line);
            }
            if snapshot.stage.is_terminal() {
                break;
            }
        }
    });

    let interrupt = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                pipeline.cancel();
            }
        })
    };

    let outcome = pipeline.spawn(request).await?;
    interrupt.abort();
    if let Err(e) = printer.await {
        tracing::debug!("Progress printer stopped: {}", e);
    }

    if let SubmissionOutcome::Failed(error) = &outcome {
        tracing::debug!("Submission failed: {}", error);
    }

    let (lines, ok) = outcome_report(&outcome);
    for line in lines {
        println!("{}", line);
    }
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
