use actix_cors::Cors;
use actix_middleware::{CorrelationIdMiddleware, Logging, MetricsMiddleware};
use actix_web::{middleware::Logger, web, App, HttpServer};
use db_pool::{create_pool, env_utils::parse_env_with_default, DbConfig};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yatube_service::auth::TokenService;
use yatube_service::cache::{LocalPageCache, PageCache, RedisPageCache};
use yatube_service::config::{Config, LogFormat, StorageBackend};
use yatube_service::db::{BlogRepository, MemoryBlogRepository, PostgresBlogRepository};
use yatube_service::handlers;
use yatube_service::media::MediaStorage;
use yatube_service::middleware::AuthenticationMiddleware;
use yatube_service::services::{GroupService, PostServiceConfig};
use yatube_service::AppState;

const SERVICE_NAME: &str = "yatube-service";

fn other_error(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::Other, message)
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn build_repository(config: &Config) -> io::Result<Arc<dyn BlogRepository>> {
    match config.database.backend {
        StorageBackend::Postgres => {
            let db_cfg = DbConfig::for_service(SERVICE_NAME, &config.database.url)
                .with_max_connections(config.database.max_connections);
            db_cfg.log_config();

            let pool = create_pool(db_cfg)
                .await
                .map_err(|e| other_error(format!("Failed to create database pool: {e}")))?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| other_error(format!("Failed to run migrations: {e}")))?;
            tracing::info!("Database migrations applied");

            Ok(Arc::new(PostgresBlogRepository::new(pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryBlogRepository::new()))
        }
    }
}

/// Redis when configured and reachable, otherwise the in-process cache.
async fn build_page_cache(config: &Config) -> Arc<dyn PageCache> {
    let Some(url) = config.cache.redis_url.as_deref() else {
        tracing::info!("REDIS_URL not set; using in-process page cache");
        return Arc::new(LocalPageCache::new());
    };

    match RedisPageCache::connect(url).await {
        Ok(cache) => {
            tracing::info!("Connected to Redis page cache");
            Arc::new(cache)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable; using in-process page cache");
            Arc::new(LocalPageCache::new())
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn run_healthcheck() -> io::Result<()> {
    let port: u16 = parse_env_with_default("YATUBE_PORT", 8000);
    let url = format!("http://127.0.0.1:{}/health", port);
    match reqwest::Client::new().get(&url).send().await {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => {
            eprintln!("healthcheck HTTP status: {}", resp.status());
            Err(other_error("healthcheck failed".to_string()))
        }
        Err(e) => {
            eprintln!("healthcheck HTTP error: {}", e);
            Err(other_error("healthcheck error".to_string()))
        }
    }
}

async fn run_create_group(config: &Config, args: &[String]) -> io::Result<()> {
    let (slug, title) = match (args.first(), args.get(1)) {
        (Some(slug), Some(title)) => (slug, title),
        _ => {
            eprintln!("usage: {} create-group <slug> <title> [description]", SERVICE_NAME);
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "missing arguments",
            ));
        }
    };
    let description = args.get(2).map(String::as_str).unwrap_or("");

    let repo = build_repository(config).await?;
    let group = GroupService::new(repo)
        .create_group(slug, title, description)
        .await
        .map_err(|e| other_error(format!("Failed to create group: {e}")))?;

    println!("{}\t{}\t{}", group.id, group.slug, group.title);
    Ok(())
}

/// Yatube Service
///
/// Serves the blog pages (index, groups, profiles, posts, follow feed), the
/// post and comment forms, and token authentication.
///
/// # Subcommands
///
/// - `healthcheck` - probe `/health` on the local instance (container healthchecks)
/// - `create-group <slug> <title> [description]` - add a group to storage
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("healthcheck") {
        return run_healthcheck().await;
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.app.log_format);

    if args.first().map(String::as_str) == Some("create-group") {
        return run_create_group(&config, &args[1..]).await;
    }

    tracing::info!("Starting {} v{}", SERVICE_NAME, env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Storage backend: {}", config.database.backend);

    let repo = build_repository(&config).await?;
    let page_cache = build_page_cache(&config).await;

    tokio::fs::create_dir_all(&config.media.root).await?;
    let media = Arc::new(MediaStorage::new(
        config.media.root.clone(),
        config.media.url.clone(),
    ));

    let tokens = Arc::new(TokenService::new(
        &config.auth.jwt_secret,
        config.auth.jwt_ttl_secs,
    ));

    let state = web::Data::new(AppState::new(
        repo,
        page_cache,
        media,
        tokens.clone(),
        PostServiceConfig {
            posts_per_page: config.site.posts_per_page,
            index_cache_ttl: config.cache.index_ttl,
            max_upload_bytes: config.media.max_upload_bytes,
        },
    ));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(AuthenticationMiddleware::new(tokens.clone()))
            .wrap(MetricsMiddleware)
            .wrap(Logging)
            .wrap(CorrelationIdMiddleware)
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .run();

    let server_handle = server.handle();
    let shutdown = shutdown_signal();
    tokio::pin!(server);
    tokio::pin!(shutdown);

    tokio::select! {
        result = &mut server => {
            result?;
        }
        _ = &mut shutdown => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    tracing::info!("{} shutting down", SERVICE_NAME);
    Ok(())
}
