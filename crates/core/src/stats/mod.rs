//! Cached access to the site owner's listening statistics.
//!
//! Each ranking is cold until first requested. A cold request trades the
//! configured refresh token for an access token, fetches the ranking, and
//! caches the payload for the freshness window; warm requests never leave the
//! process.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::{
    cache::{Clock, SystemClock, TtlCache},
    config::CacheConfig,
    genre::{self, GenreCount},
    spotify::{SpotifyApi, TokenResponse, TopItemsKind},
    PortfolioError, Result,
};

pub struct TopItemsService<A, C = SystemClock> {
    api: A,
    refresh_token: Option<String>,
    limit: u32,
    cache: TtlCache<TopItemsKind, Arc<Value>, C>,
}

impl<A: SpotifyApi> TopItemsService<A, SystemClock> {
    pub fn new(api: A, refresh_token: Option<String>, config: &CacheConfig) -> Self {
        Self::with_clock(api, refresh_token, config, SystemClock)
    }
}

impl<A, C> TopItemsService<A, C>
where
    A: SpotifyApi,
    C: Clock,
{
    pub fn with_clock(
        api: A,
        refresh_token: Option<String>,
        config: &CacheConfig,
        clock: C,
    ) -> Self {
        Self {
            api,
            refresh_token,
            limit: config.top_limit,
            cache: TtlCache::with_clock(config.ttl(), clock),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Returns the ranking, from cache when fresh.
    ///
    /// Any upstream failure propagates and leaves the cache as it was. A
    /// refreshed payload is stamped with the time the request arrived, not the
    /// time the upstream answered.
    pub async fn top_items(&self, kind: TopItemsKind) -> Result<Arc<Value>> {
        let requested_at = self.cache.now();
        if let Some(cached) = self.cache.get(&kind) {
            debug!(%kind, "serving top items from cache");
            return Ok(cached);
        }

        let refresh_token = self
            .refresh_token
            .as_deref()
            .ok_or(PortfolioError::MissingRefreshToken)?;

        let token = self.api.refresh_access_token(refresh_token).await?;
        let payload = Arc::new(
            self.api
                .fetch_top_items(&token.access_token, kind, self.limit)
                .await?,
        );

        self.cache.put_at(kind, payload.clone(), requested_at);
        info!(%kind, limit = self.limit, "refreshed top items");
        Ok(payload)
    }

    /// Genre families across the top artists.
    pub async fn top_genres(&self) -> Result<Vec<GenreCount>> {
        let artists = self.top_items(TopItemsKind::Artists).await?;
        Ok(genre::summarize(&artists))
    }

    /// Authorization-code exchange for the OAuth callback.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        self.api.exchange_code(code).await
    }
}
