// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Fee Subscription
//!
//! Push-driven fee stream: every new block head carrying a `baseFeePerGas`
//! triggers an EIP-1559 fee recomputation whose result is delivered to the
//! subscriber.
//!
//! ## Overlap policy
//!
//! Heads can arrive faster than a recomputation completes. The worker keeps
//! at most one recomputation in flight and coalesces to the latest head: a
//! newer head drops the stale computation and starts over with its own base
//! fee. The subscriber therefore only ever sees quotes for the newest head
//! observed at completion time.
//!
//! ## Failures
//!
//! A head without a base fee, or an error item on the head stream, is
//! delivered as `CannotEstimateFee`; the subscription keeps running.
//!
//! ## Shutdown
//!
//! `unsubscribe()` (or dropping the handle) triggers a
//! `tokio_util::sync::CancellationToken`. The worker drops any in-flight
//! computation and exits; nothing is delivered afterwards.

use std::future::Future;
use std::pin::Pin;

use futures::stream::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::query::HeadStream;
use super::types::FeeQuote;
use crate::error::TransferError;

/// One delivery on a fee subscription.
pub type FeeUpdate = Result<FeeQuote, TransferError>;

/// Buffered deliveries before the worker waits on the subscriber.
const UPDATE_BUFFER: usize = 16;

/// Handle to a running fee subscription.
pub struct FeeSubscription {
    updates: mpsc::Receiver<FeeUpdate>,
    shutdown: CancellationToken,
    worker: JoinHandle<()>,
}

impl FeeSubscription {
    /// Start the worker. `estimate` maps a base fee to a fee quote.
    pub(crate) fn spawn<F, Fut>(heads: HeadStream, estimate: F) -> Self
    where
        F: Fn(u128) -> Fut + Send + 'static,
        Fut: Future<Output = FeeUpdate> + Send + 'static,
    {
        let (sender, updates) = mpsc::channel(UPDATE_BUFFER);
        let shutdown = CancellationToken::new();
        let worker = tokio::spawn(run(heads, estimate, sender, shutdown.clone()));

        Self {
            updates,
            shutdown,
            worker,
        }
    }

    /// Wait for the next delivery. `None` once the subscription has ended.
    pub async fn next(&mut self) -> Option<FeeUpdate> {
        self.updates.recv().await
    }

    /// Stop the subscription and discard anything not yet received.
    pub fn unsubscribe(&mut self) {
        self.shutdown.cancel();
        self.updates.close();
        while self.updates.try_recv().is_ok() {}
    }

    /// Whether the worker is still listening for heads.
    pub fn is_active(&self) -> bool {
        !self.shutdown.is_cancelled() && !self.worker.is_finished()
    }
}

impl Drop for FeeSubscription {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

type InFlight<Fut> = Option<(u64, Pin<Box<Fut>>)>;

async fn run<F, Fut>(
    mut heads: HeadStream,
    estimate: F,
    updates: mpsc::Sender<FeeUpdate>,
    shutdown: CancellationToken,
) where
    F: Fn(u128) -> Fut,
    Fut: Future<Output = FeeUpdate>,
{
    let mut in_flight: InFlight<Fut> = None;
    let mut heads_open = true;

    while heads_open || in_flight.is_some() {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                debug!("Fee subscription cancelled");
                return;
            }

            head = heads.next(), if heads_open => match head {
                Some(Ok(head)) => match head.base_fee_per_gas {
                    Some(base_fee) => {
                        if let Some((stale, _)) = &in_flight {
                            debug!(stale_head = *stale, head = head.number, "Superseding fee recomputation");
                        }
                        in_flight = Some((head.number, Box::pin(estimate(base_fee))));
                    }
                    None => {
                        let failure = TransferError::CannotEstimateFee(format!(
                            "block {} has no baseFeePerGas",
                            head.number
                        ));
                        if updates.send(Err(failure)).await.is_err() {
                            return;
                        }
                    }
                },
                Some(Err(e)) => {
                    warn!(error = %e, "Head subscription error");
                    if updates
                        .send(Err(TransferError::CannotEstimateFee(e.to_string())))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                None => {
                    debug!("Head stream closed");
                    heads_open = false;
                }
            },

            result = poll_in_flight(&mut in_flight), if in_flight.is_some() => {
                in_flight = None;
                if updates.send(result).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// Drive the in-flight computation; pending forever when there is none.
async fn poll_in_flight<Fut: Future>(slot: &mut InFlight<Fut>) -> Fut::Output {
    match slot {
        Some((_, computation)) => computation.as_mut().await,
        None => std::future::pending().await,
    }
}
