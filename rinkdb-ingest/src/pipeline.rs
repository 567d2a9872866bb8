//! The cold-load population pipeline.
//!
//! Three stages of workers connected by queues: team items fan out to
//! roster items, roster items fan out to player items. Termination is
//! sentinel-based: seeding pushes one [`WorkItem::EndOfStream`] per
//! worker into the first queue, and every worker that consumes one
//! forwards exactly one downstream before exiting, so each stage's
//! workers all observe end-of-input independently.

use std::sync::{Arc, Mutex as StdMutex};

use futures::future::join_all;
use log::{debug, info, warn};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use rinkdb_db::Store;
use statsapi::Transport;
use statsapi::dispatch::Dispatch;

use crate::config::IngestConfig;
use crate::item::process_item;

/// One queue slot: either work or this stage's end-of-input marker. The
/// tag removes any ambiguity between "no more work" and a legitimate
/// payload.
#[derive(Debug)]
pub enum WorkItem {
    Task(Dispatch),
    EndOfStream,
}

/// The player queue is bounded so roster workers block rather than pile
/// up fetch work faster than player workers drain it; the earlier queues
/// hold a small, known item count and stay unbounded.
enum StageSender {
    Bounded(mpsc::Sender<WorkItem>),
    Unbounded(mpsc::UnboundedSender<WorkItem>),
}

impl StageSender {
    async fn send(&self, item: WorkItem) {
        let result = match self {
            StageSender::Bounded(tx) => tx.send(item).await.map_err(|e| e.0),
            StageSender::Unbounded(tx) => tx.send(item).map_err(|e| e.0),
        };
        if let Err(item) = result {
            // Receivers only drop after their sentinels, so this means
            // the stage wiring is wrong.
            warn!("Dropped {item:?}: downstream queue closed");
        }
    }
}

#[derive(Clone)]
enum StageReceiver {
    Bounded(Arc<Mutex<mpsc::Receiver<WorkItem>>>),
    Unbounded(Arc<Mutex<mpsc::UnboundedReceiver<WorkItem>>>),
}

impl StageReceiver {
    async fn recv(&self) -> Option<WorkItem> {
        match self {
            StageReceiver::Bounded(rx) => rx.lock().await.recv().await,
            StageReceiver::Unbounded(rx) => rx.lock().await.recv().await,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StageCounts {
    pub succeeded: usize,
    pub failed: usize,
}

/// Per-stage outcome counts for one population run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub teams: StageCounts,
    pub rosters: StageCounts,
    pub players: StageCounts,
}

impl PipelineReport {
    pub fn total_failed(&self) -> usize {
        self.teams.failed + self.rosters.failed + self.players.failed
    }
}

/// Cold-loads `team_ids`: team rows, their rosters, every rostered
/// player, and (when configured) season aggregates.
///
/// A failed item is logged and counted, never fatal to the run.
/// Cancelling `abort` lets in-flight fetches finish but stops new items
/// from being processed and follow-on work from propagating; the
/// sentinels still drain every queue.
pub async fn populate<T: Transport + 'static>(
    transport: Arc<T>,
    store: Arc<Store>,
    config: &IngestConfig,
    team_ids: &[i64],
    abort: CancellationToken,
) -> PipelineReport {
    let n = config.workers_per_stage.max(1);

    let (team_tx, team_rx) = mpsc::unbounded_channel();
    let (roster_tx, roster_rx) = mpsc::unbounded_channel();
    let (player_tx, player_rx) = mpsc::channel(config.player_queue_capacity.max(1));

    let team_rx = StageReceiver::Unbounded(Arc::new(Mutex::new(team_rx)));
    let roster_rx = StageReceiver::Unbounded(Arc::new(Mutex::new(roster_rx)));
    let player_rx = StageReceiver::Bounded(Arc::new(Mutex::new(player_rx)));

    // Seed: one item per team, one per (team, season) pair, then one
    // sentinel per team worker.
    for &team_id in team_ids {
        let _ = team_tx.send(WorkItem::Task(Dispatch::team_info(team_id)));
        if config.include_season_stats {
            for season in &config.seasons {
                let _ = team_tx.send(WorkItem::Task(Dispatch::team_season(team_id, season)));
            }
        }
    }
    for _ in 0..n {
        let _ = team_tx.send(WorkItem::EndOfStream);
    }
    drop(team_tx);

    let seasons: Arc<[String]> = if config.include_season_stats {
        config.seasons.clone().into()
    } else {
        Arc::from(Vec::new())
    };

    let team_counts = Arc::new(StdMutex::new(StageCounts::default()));
    let roster_counts = Arc::new(StdMutex::new(StageCounts::default()));
    let player_counts = Arc::new(StdMutex::new(StageCounts::default()));

    let mut workers = Vec::with_capacity(n * 3);
    for _ in 0..n {
        workers.push(tokio::spawn(stage_worker(
            "team",
            Arc::clone(&transport),
            Arc::clone(&store),
            Arc::clone(&seasons),
            team_rx.clone(),
            Some(StageSender::Unbounded(roster_tx.clone())),
            Arc::clone(&team_counts),
            abort.clone(),
        )));
        workers.push(tokio::spawn(stage_worker(
            "roster",
            Arc::clone(&transport),
            Arc::clone(&store),
            Arc::clone(&seasons),
            roster_rx.clone(),
            Some(StageSender::Bounded(player_tx.clone())),
            Arc::clone(&roster_counts),
            abort.clone(),
        )));
        workers.push(tokio::spawn(stage_worker(
            "player",
            Arc::clone(&transport),
            Arc::clone(&store),
            Arc::clone(&seasons),
            player_rx.clone(),
            None,
            Arc::clone(&player_counts),
            abort.clone(),
        )));
    }
    drop(roster_tx);
    drop(player_tx);

    join_all(workers).await;

    let report = PipelineReport {
        teams: team_counts.lock().unwrap().clone(),
        rosters: roster_counts.lock().unwrap().clone(),
        players: player_counts.lock().unwrap().clone(),
    };
    info!(
        "Population finished: teams {}/{} ok, rosters {}/{} ok, players {}/{} ok",
        report.teams.succeeded,
        report.teams.succeeded + report.teams.failed,
        report.rosters.succeeded,
        report.rosters.succeeded + report.rosters.failed,
        report.players.succeeded,
        report.players.succeeded + report.players.failed,
    );
    report
}

#[allow(clippy::too_many_arguments)]
async fn stage_worker<T: Transport>(
    stage: &'static str,
    transport: Arc<T>,
    store: Arc<Store>,
    seasons: Arc<[String]>,
    receiver: StageReceiver,
    downstream: Option<StageSender>,
    counts: Arc<StdMutex<StageCounts>>,
    abort: CancellationToken,
) {
    loop {
        // A closed queue without a sentinel means every upstream worker
        // is already gone; treat it like end-of-input.
        let Some(item) = receiver.recv().await else {
            break;
        };

        let dispatch = match item {
            WorkItem::EndOfStream => {
                debug!("{stage} worker saw end of stream");
                if let Some(downstream) = &downstream {
                    downstream.send(WorkItem::EndOfStream).await;
                }
                break;
            }
            WorkItem::Task(dispatch) => dispatch,
        };

        if abort.is_cancelled() {
            debug!("{stage} worker dropping {dispatch} after abort");
            continue;
        }

        match process_item(transport.as_ref(), store.as_ref(), &dispatch, &seasons).await {
            Ok(follow_on) => {
                counts.lock().unwrap().succeeded += 1;
                if abort.is_cancelled() {
                    continue;
                }
                if let Some(downstream) = &downstream {
                    for next in follow_on {
                        downstream.send(WorkItem::Task(next)).await;
                    }
                }
            }
            Err(err) => {
                counts.lock().unwrap().failed += 1;
                warn!("{stage} item {dispatch} failed: {err}");
            }
        }
    }
}
