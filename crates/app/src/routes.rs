use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Query, State},
    http::{header::CONTENT_TYPE, Method},
    response::Redirect,
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use portfolio_core::{
    cache::Clock,
    spotify::{self, REFRESH_TOKEN_COOKIE, STATE_COOKIE},
    GenreCount, SpotifyApi, TopItemsKind,
};
use serde::Deserialize;
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{error::AppError, state::AppState};

const STATE_COOKIE_MAX_AGE: time::Duration = time::Duration::minutes(10);

pub fn router<A, C>(state: Arc<AppState<A, C>>) -> Router
where
    A: SpotifyApi + 'static,
    C: Clock + 'static,
{
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/spotify/login", get(login::<A, C>))
        .route("/api/spotify/callback", get(callback::<A, C>))
        .route("/api/spotify/top-tracks", get(top_tracks::<A, C>))
        .route("/api/spotify/top-artists", get(top_artists::<A, C>))
        .route("/api/spotify/top-genres", get(top_genres::<A, C>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the authorization-code flow.
pub async fn login<A, C>(
    State(state): State<Arc<AppState<A, C>>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError>
where
    A: SpotifyApi,
    C: Clock,
{
    let oauth_state = spotify::generate_state();
    let url = spotify::authorize_url(&state.config.spotify, &oauth_state)?;

    let cookie = Cookie::build((STATE_COOKIE, oauth_state))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.server.production)
        .path("/")
        .max_age(STATE_COOKIE_MAX_AGE);

    info!("redirecting to provider login");
    Ok((jar.add(cookie), Redirect::to(&url)))
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Provider redirect target. Persists the refresh token in a cookie and
/// sends the browser home.
pub async fn callback<A, C>(
    State(state): State<Arc<AppState<A, C>>>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError>
where
    A: SpotifyApi,
    C: Clock,
{
    if let Some(error) = params.error.as_deref() {
        warn!(error, "provider declined authorization");
    }
    let stored = jar.get(STATE_COOKIE).map(|cookie| cookie.value().to_owned());
    let code = spotify::validate_callback(
        params.code.as_deref(),
        params.state.as_deref(),
        stored.as_deref(),
    )?;

    let token = state.service.exchange_code(code).await?;

    let mut jar = jar.remove(Cookie::build(STATE_COOKIE).path("/"));
    match token.refresh_token {
        Some(refresh_token) => {
            jar = jar.add(
                Cookie::build((REFRESH_TOKEN_COOKIE, refresh_token))
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .secure(state.config.server.production)
                    .path("/"),
            );
            info!("authorization complete, refresh token stored");
        }
        None => warn!("token exchange returned no refresh token"),
    }

    Ok((jar, Redirect::to("/")))
}

pub async fn top_tracks<A, C>(
    State(state): State<Arc<AppState<A, C>>>,
) -> Result<Json<Value>, AppError>
where
    A: SpotifyApi,
    C: Clock,
{
    let tracks = state.service.top_items(TopItemsKind::Tracks).await?;
    Ok(Json(Value::clone(&tracks)))
}

pub async fn top_artists<A, C>(
    State(state): State<Arc<AppState<A, C>>>,
) -> Result<Json<Value>, AppError>
where
    A: SpotifyApi,
    C: Clock,
{
    let artists = state.service.top_items(TopItemsKind::Artists).await?;
    Ok(Json(Value::clone(&artists)))
}

pub async fn top_genres<A, C>(
    State(state): State<Arc<AppState<A, C>>>,
) -> Result<Json<Vec<GenreCount>>, AppError>
where
    A: SpotifyApi,
    C: Clock,
{
    Ok(Json(state.service.top_genres().await?))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{
        http::{
            header::{COOKIE, LOCATION, SET_COOKIE},
            HeaderMap, HeaderValue, StatusCode,
        },
        response::IntoResponse,
    };
    use portfolio_core::{
        cache::ManualClock, AppConfig, PortfolioError, SpotifyConfig, TokenResponse,
        TopItemsService,
    };
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct FakeSpotify {
        exchanges: AtomicUsize,
        fetches: AtomicUsize,
    }

    impl SpotifyApi for FakeSpotify {
        async fn exchange_code(&self, code: &str) -> portfolio_core::Result<TokenResponse> {
            self.exchanges.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::from_value(json!({
                "access_token": "access",
                "refresh_token": format!("refresh-for-{code}"),
            }))?)
        }

        async fn refresh_access_token(
            &self,
            _refresh_token: &str,
        ) -> portfolio_core::Result<TokenResponse> {
            Ok(serde_json::from_value(json!({ "access_token": "access" }))?)
        }

        async fn fetch_top_items(
            &self,
            _access_token: &str,
            kind: TopItemsKind,
            _limit: u32,
        ) -> portfolio_core::Result<Value> {
            let call = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            match kind {
                TopItemsKind::Tracks => Ok(json!({ "items": [{ "name": "Song" }], "call": call })),
                TopItemsKind::Artists => Ok(json!({
                    "items": [{ "name": "Band", "genres": ["shoegaze"] }],
                    "call": call
                })),
            }
        }
    }

    type TestState = Arc<AppState<FakeSpotify, Arc<ManualClock>>>;

    fn state(refresh_token: Option<&str>, production: bool) -> TestState {
        let mut config = AppConfig {
            spotify: SpotifyConfig {
                client_id: "client".into(),
                client_secret: "secret".into(),
                redirect_uri: "http://localhost:3000/api/spotify/callback".into(),
                refresh_token: refresh_token.map(str::to_string),
                ..Default::default()
            },
            ..Default::default()
        };
        config.server.production = production;
        let service = TopItemsService::with_clock(
            FakeSpotify::default(),
            config.spotify.refresh_token.clone(),
            &config.cache,
            Arc::new(ManualClock::new()),
        );
        AppState::new(service, config)
    }

    fn jar_with_state(value: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{STATE_COOKIE}={value}")).unwrap(),
        );
        CookieJar::from_headers(&headers)
    }

    fn set_cookies(headers: &HeaderMap) -> Vec<String> {
        headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect()
    }

    fn params(code: Option<&str>, state: Option<&str>) -> Query<CallbackParams> {
        Query(CallbackParams {
            code: code.map(str::to_string),
            state: state.map(str::to_string),
            error: None,
        })
    }

    #[tokio::test]
    async fn login_sets_state_cookie_and_redirects_to_provider() {
        let state = state(None, false);

        let response = login(State(state), CookieJar::new())
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://accounts.spotify.com/authorize?"));

        let cookies = set_cookies(response.headers());
        assert_eq!(cookies.len(), 1);
        let cookie = &cookies[0];
        assert!(cookie.starts_with(&format!("{STATE_COOKIE}=portfolio_")));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=600"));

        let value = cookie
            .split(';')
            .next()
            .and_then(|pair| pair.split_once('='))
            .map(|(_, value)| value)
            .unwrap();
        assert!(location.contains(&format!("state={value}")));
    }

    #[tokio::test]
    async fn callback_with_mismatched_state_is_rejected_before_exchange() {
        let state = state(None, false);

        let err = callback(
            State(state.clone()),
            params(Some("code"), Some("forged")),
            jar_with_state("portfolio_expected"),
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.service.api().exchanges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn callback_without_state_cookie_is_rejected() {
        let state = state(None, false);

        let err = callback(
            State(state.clone()),
            params(Some("code"), Some("portfolio_expected")),
            CookieJar::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Core(PortfolioError::InvalidState)));
        assert_eq!(state.service.api().exchanges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn callback_without_code_is_a_client_error() {
        let state = state(None, false);

        let err = callback(
            State(state.clone()),
            params(None, Some("portfolio_expected")),
            jar_with_state("portfolio_expected"),
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.service.api().exchanges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn callback_stores_refresh_token_and_clears_state() {
        let state = state(None, true);

        let response = callback(
            State(state.clone()),
            params(Some("abc"), Some("portfolio_expected")),
            jar_with_state("portfolio_expected"),
        )
        .await
        .unwrap()
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/");
        assert_eq!(state.service.api().exchanges.load(Ordering::SeqCst), 1);

        let cookies = set_cookies(response.headers());
        let refresh = cookies
            .iter()
            .find(|cookie| cookie.starts_with(REFRESH_TOKEN_COOKIE))
            .unwrap();
        assert!(refresh.starts_with(&format!("{REFRESH_TOKEN_COOKIE}=refresh-for-abc")));
        assert!(refresh.contains("HttpOnly"));
        assert!(refresh.contains("Secure"));
        assert!(refresh.contains("SameSite=Lax"));

        let cleared = cookies
            .iter()
            .find(|cookie| cookie.starts_with(STATE_COOKIE))
            .unwrap();
        assert!(cleared.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn top_tracks_are_served_from_cache_on_repeat() {
        let state = state(Some("refresh"), false);

        let Json(first) = top_tracks(State(state.clone())).await.unwrap();
        let Json(second) = top_tracks(State(state.clone())).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first["call"], 1);
        assert_eq!(state.service.api().fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn top_items_without_refresh_token_fail_with_server_error() {
        let state = state(None, false);

        let err = top_artists(State(state.clone())).await.unwrap_err();

        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(state.service.api().fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn top_genres_summarise_artists() {
        let state = state(Some("refresh"), false);

        let Json(genres) = top_genres(State(state)).await.unwrap();

        assert_eq!(genres.len(), 1);
        assert_eq!(genres[0].label, "Rock");
        assert_eq!(genres[0].count, 1);
    }

    #[test]
    fn router_builds_with_the_live_client() {
        let state = AppState::from_config(AppConfig::default());
        let _router: Router = router(state);
    }
}
