//! In-process message-passing fabric.
//!
//! Connects a set of ranks (rank 0 = coordinator) with the four primitives
//! the partitioning strategies need: blocking point-to-point `send`, blocking
//! `recv` from a named rank, `recv_any` with the sender identified in the
//! returned [`Status`], and a monotonic `wall_time`. Every ordered rank pair
//! gets its own FIFO channel, so messages between a fixed pair are never
//! reordered or overtaken; any-source reception is a select over the inbound
//! channels.
//!
//! Channel policy: channels are unbounded, so `send` blocks only for the
//! hand-over to the fabric and never on the receiver — the same contract as
//! a buffered fabric send. The strategies' strict send/recv alternation
//! bounds the number of in-flight messages per pair at one, so unbounded
//! capacity cannot grow without limit.
//!
//! Telemetry: per-cluster atomic counters record how many float-payload and
//! int-payload messages crossed the fabric. The property tests assert the
//! strategies' exact message complexity against these counters.

use crossbeam_channel::{Receiver, Select, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::Instant;
use thiserror::Error;

/// Rank index inside a cluster. Rank 0 is the coordinator.
pub type Rank = usize;

/// Message tag. The render protocols all use [`TAG_RENDER`]; the tag is
/// matched on reception and a mismatch is a protocol violation.
pub type Tag = u16;

/// The single tag used by the partitioning protocols.
pub const TAG_RENDER: Tag = 0;

/// A message body. Float vectors carry pixel data with trailing metadata;
/// int pairs carry dynamic-strategy work packets.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Floats(Vec<f32>),
    Ints([i32; 2]),
}

impl Payload {
    fn kind(&self) -> &'static str {
        match self {
            Payload::Floats(_) => "floats",
            Payload::Ints(_) => "ints",
        }
    }
}

/// Reception metadata: who sent the message and under which tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub source: Rank,
    pub tag: Tag,
}

#[derive(Debug, Error)]
pub enum FabricError {
    /// The peer's endpoint was dropped while a receive was outstanding.
    #[error("rank {peer} disconnected")]
    Disconnected { peer: Rank },
    /// All peers disconnected during an any-source receive.
    #[error("all peers disconnected")]
    AllDisconnected,
    /// A message arrived with an unexpected tag.
    #[error("tag mismatch: expected {expected}, got {got} from rank {from_rank}")]
    TagMismatch { expected: Tag, got: Tag, from_rank: Rank },
    /// A message arrived with the wrong payload kind for the protocol step.
    #[error("payload mismatch from rank {from_rank}: expected {expected}, got {got}")]
    PayloadMismatch {
        expected: &'static str,
        got: &'static str,
        from_rank: Rank,
    },
    /// A float message arrived with a length the protocol does not allow.
    #[error("length mismatch from rank {from_rank}: expected {expected} floats, got {got}")]
    LengthMismatch {
        expected: usize,
        got: usize,
        from_rank: Rank,
    },
}

struct Envelope {
    tag: Tag,
    payload: Payload,
}

#[derive(Debug, Default)]
struct FabricMetrics {
    float_messages: AtomicU64,
    int_messages: AtomicU64,
}

/// Point-in-time copy of the cluster's message counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FabricMetricsSnapshot {
    pub float_messages: u64,
    pub int_messages: u64,
}

impl FabricMetrics {
    fn record(&self, payload: &Payload) {
        match payload {
            Payload::Floats(_) => self.float_messages.fetch_add(1, Relaxed),
            Payload::Ints(_) => self.int_messages.fetch_add(1, Relaxed),
        };
    }

    fn snapshot(&self) -> FabricMetricsSnapshot {
        FabricMetricsSnapshot {
            float_messages: self.float_messages.load(Relaxed),
            int_messages: self.int_messages.load(Relaxed),
        }
    }
}

/// One rank's handle on the fabric. Owned by exactly one thread; holds the
/// send side toward every peer and the sole receive side of every inbound
/// channel.
pub struct Endpoint {
    rank: Rank,
    procs: usize,
    outbound: Vec<Sender<Envelope>>,
    inbound: Vec<Receiver<Envelope>>,
    epoch: Instant,
    metrics: Arc<FabricMetrics>,
}

impl Endpoint {
    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn procs(&self) -> usize {
        self.procs
    }

    /// Whether this endpoint is the coordinator (rank 0).
    pub fn is_coordinator(&self) -> bool {
        self.rank == 0
    }

    /// Monotonic wall-clock seconds since the cluster was created.
    pub fn wall_time(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Hand a message to the fabric. Completes as soon as the fabric has
    /// it; the receiver may not have received it yet.
    pub fn send(&self, dest: Rank, tag: Tag, payload: Payload) -> Result<(), FabricError> {
        tracing::trace!(
            target: "fabric",
            source = self.rank,
            dest,
            tag,
            kind = payload.kind(),
            "send"
        );
        self.metrics.record(&payload);
        self.outbound[dest]
            .send(Envelope { tag, payload })
            .map_err(|_| FabricError::Disconnected { peer: dest })
    }

    /// Block until a message with `tag` arrives from `source`.
    pub fn recv(&self, source: Rank, tag: Tag) -> Result<(Payload, Status), FabricError> {
        let env = self.inbound[source]
            .recv()
            .map_err(|_| FabricError::Disconnected { peer: source })?;
        Self::check_tag(env, tag, source)
    }

    /// Block until a message with `tag` arrives from any peer. The returned
    /// [`Status`] names the sender.
    pub fn recv_any(&self, tag: Tag) -> Result<(Payload, Status), FabricError> {
        // The self-loop channel can never deliver (its sender is this
        // endpoint, which is blocked here); leave it out so losing every
        // peer surfaces as an error instead of blocking forever.
        let peers: Vec<Rank> = (0..self.procs).filter(|&r| r != self.rank).collect();
        let mut select = Select::new();
        for &peer in &peers {
            select.recv(&self.inbound[peer]);
        }
        let mut live = peers.len();
        if live == 0 {
            return Err(FabricError::AllDisconnected);
        }
        loop {
            let op = select.select();
            let index = op.index();
            let source = peers[index];
            match op.recv(&self.inbound[source]) {
                Ok(env) => return Self::check_tag(env, tag, source),
                // A finished peer dropped its endpoint; stop polling its
                // channel and keep waiting on the rest.
                Err(_) => {
                    select.remove(index);
                    live -= 1;
                    if live == 0 {
                        return Err(FabricError::AllDisconnected);
                    }
                }
            }
        }
    }

    fn check_tag(env: Envelope, tag: Tag, source: Rank) -> Result<(Payload, Status), FabricError> {
        if env.tag != tag {
            return Err(FabricError::TagMismatch {
                expected: tag,
                got: env.tag,
                from_rank: source,
            });
        }
        Ok((env.payload, Status { source, tag }))
    }

    // -- typed protocol helpers ------------------------------------------

    /// Send a float message (pixel payload plus trailing metadata).
    pub fn send_floats(&self, dest: Rank, tag: Tag, data: Vec<f32>) -> Result<(), FabricError> {
        self.send(dest, tag, Payload::Floats(data))
    }

    /// Send a 2-int message (dynamic work packet).
    pub fn send_ints(&self, dest: Rank, tag: Tag, data: [i32; 2]) -> Result<(), FabricError> {
        self.send(dest, tag, Payload::Ints(data))
    }

    /// Receive a float message of exactly `expected_len` from `source`.
    pub fn recv_floats(
        &self,
        source: Rank,
        tag: Tag,
        expected_len: usize,
    ) -> Result<Vec<f32>, FabricError> {
        let (payload, status) = self.recv(source, tag)?;
        Self::expect_floats(payload, status, expected_len)
    }

    /// Receive a float message of exactly `expected_len` from any peer.
    pub fn recv_floats_any(
        &self,
        tag: Tag,
        expected_len: usize,
    ) -> Result<(Vec<f32>, Status), FabricError> {
        let (payload, status) = self.recv_any(tag)?;
        let data = Self::expect_floats(payload, status, expected_len)?;
        Ok((data, status))
    }

    /// Receive a 2-int message from `source`.
    pub fn recv_ints(&self, source: Rank, tag: Tag) -> Result<[i32; 2], FabricError> {
        let (payload, status) = self.recv(source, tag)?;
        match payload {
            Payload::Ints(data) => Ok(data),
            other => Err(FabricError::PayloadMismatch {
                expected: "ints",
                got: other.kind(),
                from_rank: status.source,
            }),
        }
    }

    fn expect_floats(
        payload: Payload,
        status: Status,
        expected_len: usize,
    ) -> Result<Vec<f32>, FabricError> {
        match payload {
            Payload::Floats(data) if data.len() == expected_len => Ok(data),
            Payload::Floats(data) => Err(FabricError::LengthMismatch {
                expected: expected_len,
                got: data.len(),
                from_rank: status.source,
            }),
            other => Err(FabricError::PayloadMismatch {
                expected: "floats",
                got: other.kind(),
                from_rank: status.source,
            }),
        }
    }
}

/// Builder for an in-process cluster: allocates the full channel matrix and
/// hands out one [`Endpoint`] per rank. The cluster keeps the metrics handle
/// so callers can read message counts after the endpoints have been moved
/// into their threads.
pub struct LocalCluster {
    endpoints: Vec<Option<Endpoint>>,
    metrics: Arc<FabricMetrics>,
}

impl LocalCluster {
    pub fn new(procs: usize) -> Self {
        assert!(procs >= 1, "cluster needs at least one rank");
        let epoch = Instant::now();
        let metrics = Arc::new(FabricMetrics::default());

        // One channel per ordered (source, dest) pair: matrix_tx[s][d]
        // feeds matrix_rx[d][s].
        let mut matrix_tx: Vec<Vec<Option<Sender<Envelope>>>> = (0..procs)
            .map(|_| (0..procs).map(|_| None).collect())
            .collect();
        let mut matrix_rx: Vec<Vec<Option<Receiver<Envelope>>>> = (0..procs)
            .map(|_| (0..procs).map(|_| None).collect())
            .collect();
        for source in 0..procs {
            for dest in 0..procs {
                let (tx, rx) = unbounded();
                matrix_tx[source][dest] = Some(tx);
                matrix_rx[dest][source] = Some(rx);
            }
        }

        let endpoints = (0..procs)
            .map(|rank| {
                Some(Endpoint {
                    rank,
                    procs,
                    outbound: (0..procs)
                        .map(|dest| matrix_tx[rank][dest].take().expect("sender taken once"))
                        .collect(),
                    inbound: (0..procs)
                        .map(|source| matrix_rx[rank][source].take().expect("receiver taken once"))
                        .collect(),
                    epoch,
                    metrics: Arc::clone(&metrics),
                })
            })
            .collect();

        Self { endpoints, metrics }
    }

    /// Move rank `rank`'s endpoint out of the cluster. Each endpoint can be
    /// taken exactly once.
    pub fn take_endpoint(&mut self, rank: Rank) -> Endpoint {
        self.endpoints[rank]
            .take()
            .expect("endpoint already taken")
    }

    /// Message counters accumulated so far across the whole cluster.
    pub fn metrics(&self) -> FabricMetricsSnapshot {
        self.metrics.snapshot()
    }
}
