use crate::{
    api::routes::{
        cast_vote, get_achievements, get_characters, get_fight, health, place_bet, preview_fight,
    },
    config::{BackendSettings, Settings},
    domain::{achievement_channel, AchievementTracker, CharacterCache, FightService, ProgressBook},
    infra::backend::{BackendClient, GeekFightsApi},
};

// In-memory backend only available with e2e-testing feature or debug builds
#[cfg(any(feature = "e2e-testing", debug_assertions))]
use crate::infra::backend_mock::MockBackend;
use anyhow::anyhow;
use axum::{
    body::Body,
    extract::{connect_info::IntoMakeServiceWithConnectInfo, ConnectInfo, Request},
    http::{Extensions, HeaderName, HeaderValue},
    middleware::{self, AddExtension, Next},
    response::IntoResponse,
    routing::{get, post},
    serve::Serve,
    Router,
};
use hyper::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use log::{error, info, warn};
use reqwest_middleware::{
    reqwest::{self, Client, Url},
    ClientBuilder, ClientWithMiddleware, Middleware,
};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::{collections::HashMap, net::SocketAddr, str::FromStr};
use std::{sync::Arc, time::Duration};
use tokio::signal::unix::{signal, SignalKind};
use tokio::{net::TcpListener, select, task::JoinHandle};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::USER_ID_HEADER;

pub struct Application {
    server: Serve<
        TcpListener,
        IntoMakeServiceWithConnectInfo<Router, SocketAddr>,
        AddExtension<Router, ConnectInfo<SocketAddr>>,
    >,
    cancellation_token: CancellationToken,
    background_tasks: TaskTracker,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            config.api_settings.domain, config.api_settings.port
        );
        let listener = SocketAddr::from_str(&address)?;
        let (app_state, background_tasks, cancellation_token) = build_app(config.clone()).await?;
        let server = build_server(listener, app_state, config.api_settings.origins).await?;
        Ok(Self {
            server,
            cancellation_token,
            background_tasks,
        })
    }

    pub async fn run_until_stopped(self) -> Result<(), anyhow::Error> {
        info!("Starting server...");
        match self.server.with_graceful_shutdown(shutdown_signal()).await {
            Ok(_) => {
                info!("Server shutdown initiated");
                self.cancellation_token.cancel();

                let timeout = tokio::time::sleep(Duration::from_secs(10));
                select! {
                    _ = self.background_tasks.wait() => {
                        info!("Background tasks completed gracefully");
                    }
                    _ = timeout => {
                        warn!("Background tasks timed out during shutdown");
                    }
                }

                info!("Shutdown complete");
                Ok(())
            }
            Err(e) => {
                error!("Server shutdown error: {}", e);
                self.cancellation_token.cancel();

                let _ = tokio::time::timeout(Duration::from_secs(5), self.background_tasks.wait())
                    .await;

                Err(anyhow!("Error during server shutdown: {}", e))
            }
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub fights: Arc<FightService>,
    pub characters: Arc<CharacterCache>,
    pub achievements: Arc<ProgressBook>,
    pub background_threads: Arc<HashMap<String, JoinHandle<()>>>,
}

pub async fn build_app(
    config: Settings,
) -> Result<(AppState, TaskTracker, CancellationToken), anyhow::Error> {
    // Create backend client (real or in-memory based on config)
    #[cfg(any(feature = "e2e-testing", debug_assertions))]
    let api: Arc<dyn GeekFightsApi> = if config.backend_settings.mock_enabled {
        info!("In-memory GeekFights backend configured");
        Arc::new(MockBackend::seeded(time::OffsetDateTime::now_utc()))
    } else {
        backend_client(&config.backend_settings)?
    };

    #[cfg(not(any(feature = "e2e-testing", debug_assertions)))]
    let api: Arc<dyn GeekFightsApi> = {
        if config.backend_settings.mock_enabled {
            return Err(anyhow!(
                "In-memory backend requires e2e-testing feature or debug build"
            ));
        }
        backend_client(&config.backend_settings)?
    };

    Ok(build_state(api, &config))
}

fn backend_client(settings: &BackendSettings) -> Result<Arc<dyn GeekFightsApi>, anyhow::Error> {
    let base_url = Url::parse(&settings.base_url)
        .map_err(|e| anyhow!("Failed to parse backend url: {}", e))?;
    let reqwest_client = build_reqwest_client(settings)?;
    info!("GeekFights backend configured at {}", base_url);
    Ok(Arc::new(BackendClient::new(reqwest_client, &base_url)))
}

/// Wire services around `api` and start the background tasks
pub fn build_state(
    api: Arc<dyn GeekFightsApi>,
    config: &Settings,
) -> (AppState, TaskTracker, CancellationToken) {
    let (achievement_bus, achievement_events) =
        achievement_channel(config.achievement_settings.channel_capacity);
    let progress_book = Arc::new(ProgressBook::new());

    let characters = Arc::new(CharacterCache::new(
        api.clone(),
        Duration::from_secs(config.character_settings.refresh_secs),
    ));
    let fights = Arc::new(FightService::new(
        api.clone(),
        characters.clone(),
        achievement_bus,
    ));
    info!("Fight services configured");

    let tracker = TaskTracker::new();
    let mut threads = HashMap::new();
    let cancel_token = CancellationToken::new();

    let achievement_tracker = AchievementTracker::new(
        api,
        progress_book.clone(),
        achievement_events,
        cancel_token.clone(),
    );
    let achievement_task = tracker.spawn(async move {
        match achievement_tracker.watch().await {
            Ok(_) => {
                info!("Successfully shutdown achievement tracker")
            }
            Err(e) => {
                error!("Error in achievement tracker: {}", e)
            }
        }
    });

    tracker.close();
    threads.insert(String::from("achievement_tracker"), achievement_task);

    let app_state = AppState {
        fights,
        characters,
        achievements: progress_book,
        background_threads: Arc::new(threads),
    };
    (app_state, tracker, cancel_token)
}

pub async fn build_server(
    socket_addr: SocketAddr,
    app_state: AppState,
    origins: Vec<String>,
) -> Result<
    Serve<
        TcpListener,
        IntoMakeServiceWithConnectInfo<Router, SocketAddr>,
        AddExtension<Router, ConnectInfo<SocketAddr>>,
    >,
    anyhow::Error,
> {
    let listener = TcpListener::bind(socket_addr).await?;

    info!("Setting up service");
    let app = app(app_state, origins);
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );
    info!(
        "Service running @: http://{}:{}",
        socket_addr.ip(),
        socket_addr.port()
    );
    Ok(server)
}

pub fn app(app_state: AppState, origins: Vec<String>) -> Router {
    let origins: Vec<HeaderValue> = origins
        .into_iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(USER_ID_HEADER),
        ])
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true);

    let fight_endpoints = Router::new()
        .route("/{post_id}", get(get_fight))
        .route("/{post_id}/vote", post(cast_vote))
        .route("/{post_id}/bet", post(place_bet));

    Router::new()
        .route("/api/v1/health_check", get(health))
        .nest("/api/v1/fights", fight_endpoints)
        .route("/api/v1/fight-preview", post(preview_fight))
        .route("/api/v1/characters", get(get_characters))
        .route("/api/v1/achievements/{user_id}", get(get_achievements))
        .layer(middleware::from_fn(log_request))
        .with_state(Arc::new(app_state))
        .layer(cors)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_default()
        .to_owned();
    info!(target: "http_request","new request, {} {}", request.method().as_str(), path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(target: "http_response", "response, code: {}, time: {}", response.status().as_str(), response_time);

    response
}

pub fn build_reqwest_client(
    settings: &BackendSettings,
) -> Result<ClientWithMiddleware, anyhow::Error> {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(settings.max_retries);
    let client = Client::builder()
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .build()
        .map_err(|e| anyhow!("Failed to build http client: {}", e))?;
    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .with(LoggingMiddleware)
        .build())
}

struct LoggingMiddleware;

#[async_trait::async_trait]
impl Middleware for LoggingMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        extensions: &mut Extensions,
        next: reqwest_middleware::Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let method = req.method().clone();
        let url = req.url().clone();

        info!("Making {} request to: {}", method, url);

        let result = next.run(req, extensions).await;

        match &result {
            Ok(response) => {
                info!("{} {} -> Status: {}", method, url, response.status());
            }
            Err(error) => {
                warn!("{} {} -> Error: {:?}", method, url, error);
            }
        }

        result
    }
}

async fn shutdown_signal() {
    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to install SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

    select! {
        _ = sigint.recv() => info!("Received SIGINT signal"),
        _ = sigterm.recv() => info!("Received SIGTERM signal"),
    }
}
