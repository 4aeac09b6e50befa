//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: upstream assumed down, requests fail fast to the fallback
//! - Half-Open: one probe request tests whether the upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= failure_threshold
//! Open → Half-Open: first admit() after open_duration (request-triggered)
//! Half-Open → Closed: probe request succeeds
//! Half-Open → Open: probe request fails
//! ```
//!
//! # Design Decisions
//! - One breaker per breaker name, shared by every route naming it
//! - Each breaker has its own mutex; admit and report are single critical
//!   sections, so two requests can never both own the probe slot
//! - No background timer: the Open → Half-Open move happens inside admit()
//! - Admission hands out a permit stamped with the breaker's generation;
//!   outcomes from a previous generation are ignored
//! - A probe permit dropped without an outcome frees the probe slot

use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::config::{BreakerSettings, GatewayConfig};
use crate::observability::metrics;
use crate::resilience::outcome::ForwardOutcome;
use crate::routing::RouteStore;

/// Breaker state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

/// Gate decision for one request.
#[derive(Debug)]
pub enum Admission {
    /// Forward the request, then report its outcome through the permit.
    Allow(BreakerPermit),
    /// Do not contact the upstream.
    Deny,
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allow(_))
    }
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    last_transition: Instant,
    probe_in_flight: bool,
    /// Bumped on every transition.
    generation: u64,
}

/// Point-in-time view of a breaker, for the admin API and tests.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: BreakerState,
    pub consecutive_failures: u32,
    pub failure_threshold: u32,
    pub open_duration_ms: u64,
    pub half_open_probe_in_flight: bool,
    pub millis_since_transition: u64,
}

/// A single named breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    settings: BreakerSettings,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, settings: BreakerSettings) -> Self {
        let name = name.into();
        tracing::debug!(
            breaker = %name,
            failure_threshold = settings.failure_threshold,
            open_duration_ms = settings.open_duration.as_millis() as u64,
            "Creating circuit breaker"
        );
        metrics::record_breaker_state(&name, BreakerState::Closed);

        Self {
            name,
            settings,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                last_transition: Instant::now(),
                probe_in_flight: false,
                generation: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> BreakerSettings {
        self.settings
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    /// Decide whether a request may be forwarded. May move Open → Half-Open.
    pub fn admit(self: &Arc<Self>) -> Admission {
        self.admit_at(Instant::now())
    }

    pub(crate) fn admit_at(self: &Arc<Self>, now: Instant) -> Admission {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed => Admission::Allow(self.permit(inner.generation, false)),
            BreakerState::Open => {
                let elapsed = now.saturating_duration_since(inner.last_transition);
                if elapsed >= self.settings.open_duration {
                    self.transition(&mut inner, BreakerState::HalfOpen, now);
                    inner.probe_in_flight = true;
                    tracing::info!(breaker = %self.name, "Admitting half-open probe");
                    Admission::Allow(self.permit(inner.generation, true))
                } else {
                    tracing::trace!(
                        breaker = %self.name,
                        remaining_ms = (self.settings.open_duration - elapsed).as_millis() as u64,
                        "Circuit open, request denied"
                    );
                    Admission::Deny
                }
            }
            BreakerState::HalfOpen => {
                if inner.probe_in_flight {
                    tracing::trace!(breaker = %self.name, "Probe in flight, request denied");
                    Admission::Deny
                } else {
                    // A previous probe was abandoned; this request takes the slot.
                    inner.probe_in_flight = true;
                    Admission::Allow(self.permit(inner.generation, true))
                }
            }
        }
    }

    fn report_at(&self, generation: u64, outcome: &ForwardOutcome, now: Instant) {
        let mut inner = self.lock();
        if generation != inner.generation {
            tracing::debug!(
                breaker = %self.name,
                permit_generation = generation,
                current_generation = inner.generation,
                "Ignoring outcome from a previous breaker generation"
            );
            return;
        }

        match inner.state {
            BreakerState::Closed => {
                if outcome.success {
                    inner.consecutive_failures = 0;
                    return;
                }
                inner.consecutive_failures += 1;
                tracing::debug!(
                    breaker = %self.name,
                    consecutive_failures = inner.consecutive_failures,
                    failure_threshold = self.settings.failure_threshold,
                    "Upstream failure recorded"
                );
                if inner.consecutive_failures >= self.settings.failure_threshold {
                    self.transition(&mut inner, BreakerState::Open, now);
                }
            }
            BreakerState::HalfOpen => {
                if outcome.success {
                    self.transition(&mut inner, BreakerState::Closed, now);
                } else {
                    self.transition(&mut inner, BreakerState::Open, now);
                }
            }
            // Same-generation permits are never issued while Open.
            BreakerState::Open => {}
        }
    }

    fn release_probe(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation && inner.state == BreakerState::HalfOpen {
            tracing::debug!(breaker = %self.name, "Probe abandoned without an outcome");
            inner.probe_in_flight = false;
        }
    }

    fn transition(&self, inner: &mut Inner, to: BreakerState, now: Instant) {
        let from = inner.state;
        inner.state = to;
        inner.last_transition = now;
        inner.consecutive_failures = 0;
        inner.probe_in_flight = false;
        inner.generation += 1;

        match to {
            BreakerState::Open => tracing::warn!(
                breaker = %self.name,
                from = from.as_str(),
                open_duration_ms = self.settings.open_duration.as_millis() as u64,
                "Circuit breaker opened"
            ),
            _ => tracing::info!(
                breaker = %self.name,
                from = from.as_str(),
                to = to.as_str(),
                "Circuit breaker transition"
            ),
        }
        metrics::record_breaker_transition(&self.name, to);
    }

    fn permit(self: &Arc<Self>, generation: u64, probe: bool) -> BreakerPermit {
        BreakerPermit {
            breaker: self.clone(),
            generation,
            probe,
            reported: false,
        }
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            failure_threshold: self.settings.failure_threshold,
            open_duration_ms: self.settings.open_duration.as_millis() as u64,
            half_open_probe_in_flight: inner.probe_in_flight,
            millis_since_transition: inner.last_transition.elapsed().as_millis() as u64,
        }
    }

    /// Time of the last state change.
    pub fn last_transition(&self) -> Instant {
        self.lock().last_transition
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Right to forward one request, returned by [`CircuitBreaker::admit`].
///
/// Report the upstream outcome with [`BreakerPermit::report`]. Dropping an
/// unreported probe permit (e.g. the client went away) frees the probe slot
/// without counting a failure.
#[derive(Debug)]
pub struct BreakerPermit {
    breaker: Arc<CircuitBreaker>,
    generation: u64,
    probe: bool,
    reported: bool,
}

impl BreakerPermit {
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn breaker_name(&self) -> &str {
        self.breaker.name()
    }

    pub fn report(self, outcome: &ForwardOutcome) {
        self.report_at(outcome, Instant::now());
    }

    pub(crate) fn report_at(mut self, outcome: &ForwardOutcome, now: Instant) {
        self.reported = true;
        self.breaker.report_at(self.generation, outcome, now);
    }
}

impl Drop for BreakerPermit {
    fn drop(&mut self) {
        if !self.reported && self.probe {
            self.breaker.release_probe(self.generation);
        }
    }
}

/// All breakers, one per distinct name.
///
/// Lookups go through a sharded map; the per-breaker mutex is only taken
/// after the shard guard is released, so breakers never contend with each
/// other.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    configured: HashMap<String, BreakerSettings>,
    defaults: BreakerSettings,
}

impl BreakerRegistry {
    pub fn new(defaults: BreakerSettings) -> Self {
        Self {
            breakers: DashMap::new(),
            configured: HashMap::new(),
            defaults,
        }
    }

    /// Build the registry and eagerly create every breaker a route names.
    pub fn from_config(config: &GatewayConfig, routes: &RouteStore) -> Self {
        let mut registry = Self::new(config.breaker_defaults.settings());
        for breaker in &config.breakers {
            registry
                .configured
                .insert(breaker.name.clone(), config.breaker_settings(&breaker.name));
        }
        for route in routes.routes() {
            registry.get_or_create(&route.breaker_name);
        }
        tracing::info!(breakers = registry.len(), "Circuit breaker registry ready");
        registry
    }

    /// Register a breaker. Registering an existing name returns the existing
    /// breaker unchanged.
    pub fn register(&self, name: &str, settings: BreakerSettings) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.get(name) {
            return existing;
        }
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(name, settings)))
            .value()
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|entry| entry.value().clone())
    }

    /// Fetch a breaker, creating it with its configured (or default) settings.
    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        let settings = self.configured.get(name).copied().unwrap_or(self.defaults);
        self.register(name, settings)
    }

    pub fn admit(&self, name: &str) -> Admission {
        self.get_or_create(name).admit()
    }

    /// Record the outcome of a request admitted through `permit`.
    pub fn report(&self, permit: BreakerPermit, outcome: &ForwardOutcome) {
        permit.report(outcome);
    }

    /// Snapshots of all breakers, sorted by name.
    pub fn snapshot(&self) -> Vec<BreakerSnapshot> {
        let breakers: Vec<_> = self.breakers.iter().map(|e| e.value().clone()).collect();
        let mut all: Vec<_> = breakers.iter().map(|b| b.snapshot()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
