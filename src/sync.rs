//! Keeping the set of nearby places in step with the map camera.
//!
//! A fetch is split into [`ProximitySync::plan`], which decides whether a
//! request is due and hands out a [`FetchTicket`], and
//! [`ProximitySync::complete`], which applies the response for that ticket.
//! [`ProximitySync::refresh_if_moved`] does both against a [`Client`].

use std::error;
use std::fmt::Display;

use futures_util::future::{self, Either};
use futures_util::pin_mut;
use http_body::Body;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{Config, StalePolicy};
use crate::geo::LatLng;
use crate::poi::{Poi, PoiRecord};
use crate::service::HttpService;
use crate::session::SessionProvider;
use crate::Client;

/// A proximity request that has been issued and not yet applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FetchTicket {
    seq: u64,
    center: LatLng,
}

impl FetchTicket {
    /// Issue order of the request, starting at zero.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn center(&self) -> LatLng {
        self.center
    }
}

/// What became of a refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The camera did not move far enough, or the center was not a valid coordinate.
    Skipped,
    /// The place set was replaced with this many places.
    Applied(usize),
    /// The request failed and the previous state was kept.
    Failed,
    /// A newer response had already been applied.
    Stale,
    /// The owning component was torn down.
    Cancelled,
}

/// Nearby places and the position they were fetched for.
#[derive(Debug)]
pub struct ProximitySync {
    threshold_km: f64,
    policy: StalePolicy,
    last_position: Option<LatLng>,
    pois: Vec<Poi>,
    next_seq: u64,
    applied_seq: Option<u64>,
    /// Tickets issued before this were issued in an earlier lifetime.
    lifetime_seq: u64,
    lifetime: CancellationToken,
}

impl Default for ProximitySync {
    fn default() -> Self {
        ProximitySync::new(&Config::default())
    }
}

impl ProximitySync {
    pub fn new(config: &Config) -> Self {
        ProximitySync {
            threshold_km: config.get_refetch_threshold_km(),
            policy: config.get_stale_policy(),
            last_position: None,
            pois: Vec::new(),
            next_seq: 0,
            applied_seq: None,
            lifetime_seq: 0,
            lifetime: CancellationToken::new(),
        }
    }

    /// The places of the last applied response.
    pub fn pois(&self) -> &[Poi] {
        &self.pois
    }

    /// Where the last applied fetch was made.
    pub fn last_position(&self) -> Option<LatLng> {
        self.last_position
    }

    /// Cancelled when the owning component goes away.
    pub fn lifetime(&self) -> &CancellationToken {
        &self.lifetime
    }

    /// Whether a camera at `center` is far enough from the last fetch to need a new one.
    pub fn should_refetch(&self, center: LatLng) -> bool {
        match self.last_position {
            None => true,
            Some(last) => last.distance_km(&center) > self.threshold_km,
        }
    }

    /// Issues a ticket for `center` if a fetch is due.
    pub fn plan(&mut self, center: LatLng) -> Option<FetchTicket> {
        if !center.is_finite() {
            warn!(?center, "ignoring non-finite map center");
            return None;
        }
        if !self.should_refetch(center) {
            debug!(?center, "camera moved within the refetch threshold");
            return None;
        }
        Some(self.issue(center))
    }

    /// Issues a ticket for `center` regardless of the distance moved.
    pub fn plan_forced(&mut self, center: LatLng) -> Option<FetchTicket> {
        if !center.is_finite() {
            warn!(?center, "ignoring non-finite map center");
            return None;
        }
        Some(self.issue(center))
    }

    fn issue(&mut self, center: LatLng) -> FetchTicket {
        let seq = self.next_seq;
        self.next_seq += 1;
        FetchTicket { seq, center }
    }

    /// Applies the response to `ticket`.
    ///
    /// On success the place set is replaced as a whole and the last position
    /// moves to the ticket's center. On failure nothing changes.
    pub fn complete<E: Display>(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<PoiRecord>, E>,
    ) -> Outcome {
        if self.lifetime.is_cancelled() || ticket.seq < self.lifetime_seq {
            debug!(seq = ticket.seq, "dropping response after teardown");
            return Outcome::Cancelled;
        }

        let records = match result {
            Ok(records) => records,
            Err(e) => {
                error!(seq = ticket.seq, "failed to load nearby places: {}", e);
                return Outcome::Failed;
            }
        };

        if self.policy == StalePolicy::DiscardStale
            && self.applied_seq.map_or(false, |applied| ticket.seq < applied)
        {
            info!(seq = ticket.seq, "discarding stale response");
            return Outcome::Stale;
        }

        let pois: Vec<Poi> = records.into_iter().map(Poi::from).collect();
        let count = pois.len();
        self.pois = pois;
        self.last_position = Some(ticket.center);
        self.applied_seq = Some(ticket.seq);
        debug!(seq = ticket.seq, count, "applied nearby places");
        Outcome::Applied(count)
    }

    /// Fetches places around `center` if the camera moved far enough.
    pub async fn refresh_if_moved<S, P, B>(&mut self, center: LatLng, client: &Client<S, P>) -> Outcome
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        S::Error: Display,
        P: SessionProvider,
        B: Default,
    {
        match self.plan(center) {
            Some(ticket) => self.fetch(ticket, client).await,
            None => Outcome::Skipped,
        }
    }

    /// Fetches places around `center` unconditionally.
    pub async fn force_refresh<S, P, B>(&mut self, center: LatLng, client: &Client<S, P>) -> Outcome
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        S::Error: Display,
        P: SessionProvider,
        B: Default,
    {
        match self.plan_forced(center) {
            Some(ticket) => self.fetch(ticket, client).await,
            None => Outcome::Skipped,
        }
    }

    async fn fetch<S, P, B>(&mut self, ticket: FetchTicket, client: &Client<S, P>) -> Outcome
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        S::Error: Display,
        P: SessionProvider,
        B: Default,
    {
        let lifetime = self.lifetime.clone();
        let cancelled = lifetime.cancelled();
        let request = client.load_location(ticket.center);
        pin_mut!(cancelled);
        pin_mut!(request);

        match future::select(cancelled, request).await {
            Either::Left(_) => Outcome::Cancelled,
            Either::Right((result, _)) => self.complete(ticket, result),
        }
    }

    /// Cancels outstanding work and drops the place set.
    pub fn teardown(&mut self) {
        self.lifetime.cancel();
        self.lifetime_seq = self.next_seq;
        self.pois.clear();
    }

    /// Starts a new lifetime after [`teardown`](Self::teardown).
    ///
    /// Tickets from before the teardown stay cancelled. Does nothing while the
    /// current lifetime is still running.
    pub fn resume(&mut self) {
        if self.lifetime.is_cancelled() {
            debug!(seq = self.next_seq, "resuming nearby place sync");
            self.lifetime = CancellationToken::new();
        }
    }
}
