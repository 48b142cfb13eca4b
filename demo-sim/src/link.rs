//! Simulated unreliable link: fixed latency, random jitter, random loss.

use serde::Serialize;

/// Deterministic LCG so runs reproduce from a seed.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1);
        (self.state >> 32) as u32
    }

    /// Uniform in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        f64::from(self.next_u32()) / (f64::from(u32::MAX) + 1.0)
    }

    /// Uniform in `[0, max]`.
    pub fn up_to(&mut self, max: u32) -> u32 {
        match max.checked_add(1) {
            Some(1) => 0,
            Some(span) => self.next_u32() % span,
            None => self.next_u32(),
        }
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.unit() < probability
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkConfig {
    pub latency_ticks: u32,
    pub jitter_ticks: u32,
    pub loss: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LinkStats {
    pub sent: u64,
    pub dropped: u64,
    pub delivered: u64,
    pub bytes: u64,
}

/// One direction of a connection.
///
/// Packets sent on step `n` arrive on step `n + latency + jitter`; packets
/// due on the same step arrive in a shuffled order.
#[derive(Debug)]
pub struct LossyLink {
    config: LinkConfig,
    rng: Rng,
    in_flight: Vec<InFlight>,
    stats: LinkStats,
}

#[derive(Debug)]
struct InFlight {
    due: u64,
    order: u32,
    bytes: Vec<u8>,
}

impl LossyLink {
    pub const fn new(config: LinkConfig, rng: Rng) -> Self {
        Self {
            config,
            rng,
            in_flight: Vec::new(),
            stats: LinkStats {
                sent: 0,
                dropped: 0,
                delivered: 0,
                bytes: 0,
            },
        }
    }

    pub fn send(&mut self, now: u64, bytes: Vec<u8>) {
        self.stats.sent += 1;
        self.stats.bytes += bytes.len() as u64;
        if self.rng.chance(self.config.loss) {
            self.stats.dropped += 1;
            return;
        }
        let delay = self
            .config
            .latency_ticks
            .saturating_add(self.rng.up_to(self.config.jitter_ticks));
        self.in_flight.push(InFlight {
            due: now + u64::from(delay),
            order: self.rng.next_u32(),
            bytes,
        });
    }

    /// Removes and returns every packet due by `now`.
    pub fn deliver(&mut self, now: u64) -> Vec<Vec<u8>> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.in_flight.drain(..).partition(|packet| packet.due <= now);
        self.in_flight = pending;
        due.sort_by_key(|packet| (packet.due, packet.order));
        self.stats.delivered += due.len() as u64;
        due.into_iter().map(|packet| packet.bytes).collect()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub const fn stats(&self) -> LinkStats {
        self.stats
    }
}
