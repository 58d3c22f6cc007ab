//! Core library for the portfolio site.
//!
//! Two halves live here. The presentation half plans scroll and intro
//! animations against an abstract document ([`render::RenderSurface`]) and
//! hands finished timelines to an engine ([`timeline::AnimationEngine`]). The
//! service half talks to the Spotify Web API on behalf of the site owner and
//! keeps the results in a small time-bounded cache.

pub mod animation;
pub mod cache;
pub mod config;
pub mod error;
pub mod genre;
pub mod render;
pub mod spotify;
pub mod stats;
pub mod timeline;

pub use animation::{Animator, TextFillEntry, TypewriterHandle};
pub use cache::{Clock, SystemClock, TtlCache};
pub use config::{AppConfig, CacheConfig, ServerConfig, SpotifyConfig};
pub use error::{PortfolioError, Result};
pub use genre::{GenreBucket, GenreCount};
pub use render::{MemoryDocument, NodeId, RenderSurface, Target};
pub use spotify::{SpotifyApi, SpotifyClient, TokenResponse, TopItemsKind};
pub use stats::TopItemsService;
pub use timeline::{AnimationEngine, AnimationHandle, AnimationId, Timeline, Tween};
