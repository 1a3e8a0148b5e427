//! Executes the effects produced by [`engine`] against a [`Repository`].

use futures::future::join_all;

use crate::{
    db::{self, subticket, Repository},
    engine::{self, BatchItem, Effect},
};

/// Performs the writes of `effects` in order, then the log entries.
///
/// A failed write aborts the rest and is returned; a failed log entry is
/// only reported.
pub async fn execute(
    repo: &dyn Repository,
    effects: &[Effect],
) -> Result<(), db::Error> {
    for effect in effects {
        match effect {
            Effect::WriteTicket(ticket) => repo.write_ticket(ticket).await?,
            Effect::WriteSubticket(subticket) => {
                repo.write_subticket(subticket).await?
            }
            Effect::Log(_) => {}
        }
    }
    for effect in effects {
        if let Effect::Log(entry) = effect {
            if let Err(e) = repo.append_action_log(entry).await {
                tracing::warn!(
                    ticket = %entry.ticket_code,
                    "failed to record action `{}`: {e}",
                    entry.action
                );
            }
        }
    }
    Ok(())
}

#[derive(Debug)]
pub enum Failure {
    Rejected(engine::Error),
    Store(db::Error),
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub closed: Vec<subticket::Subticket>,
    pub failed: Vec<(String, Failure)>,
}

/// Executes every item of a batch concurrently. Items refused by the engine
/// are reported without touching the store; one failed write does not stop
/// the others.
pub async fn execute_batch(
    repo: &dyn Repository,
    items: Vec<BatchItem>,
) -> BatchOutcome {
    let results = join_all(items.into_iter().map(|item| async move {
        let reduced = match item.reduced {
            Ok(reduced) => reduced,
            Err(e) => return Err((item.code, Failure::Rejected(e))),
        };
        if let Err(e) = execute(repo, &reduced.effects).await {
            return Err((item.code, Failure::Store(e)));
        }
        reduced
            .state
            .subticket(item.subticket)
            .cloned()
            .map_err(|e| (item.code, Failure::Rejected(e)))
    }))
    .await;

    let mut outcome = BatchOutcome::default();
    for result in results {
        match result {
            Ok(closed) => outcome.closed.push(closed),
            Err(failure) => outcome.failed.push(failure),
        }
    }
    outcome
}
