use std::sync::Arc;

use portfolio_core::{
    cache::{Clock, SystemClock},
    AppConfig, SpotifyApi, SpotifyClient, TopItemsService,
};

/// Everything the handlers share. Built once at startup.
pub struct AppState<A, C = SystemClock> {
    pub service: TopItemsService<A, C>,
    pub config: AppConfig,
}

impl AppState<SpotifyClient> {
    pub fn from_config(config: AppConfig) -> Arc<Self> {
        let api = SpotifyClient::new(config.spotify.clone());
        let service =
            TopItemsService::new(api, config.spotify.refresh_token.clone(), &config.cache);
        Self::new(service, config)
    }
}

impl<A, C> AppState<A, C>
where
    A: SpotifyApi,
    C: Clock,
{
    pub fn new(service: TopItemsService<A, C>, config: AppConfig) -> Arc<Self> {
        Arc::new(Self { service, config })
    }
}
