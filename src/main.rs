use std::{process, sync::Arc, time::Duration};

use spiralpress::{
    application::{
        error::AppError,
        jobs::{JobService, Scheduler},
        render::{RenderService, SpiralRenderUnit, compose_document, dispatch_blocking},
        repos::{ArtifactStore, JobStore},
    },
    config,
    infra::{
        db::{MemoryJobStore, PostgresJobStore},
        error::InfraError,
        http::{self, HttpState},
        storage::FsArtifactStore,
        telemetry,
    },
};
use tokio::time::{Instant, sleep};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Render(args) => run_render(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let store = init_job_store(&settings).await?;
    let artifacts: Arc<dyn ArtifactStore> = Arc::new(
        FsArtifactStore::new(settings.storage.directory.clone()).map_err(InfraError::from)?,
    );
    let renderer: Arc<dyn RenderService> = Arc::new(
        SpiralRenderUnit::new(artifacts.clone(), settings.render.geometry)
            .with_delimiter(settings.render.delimiter),
    );

    let scheduler = Arc::new(Scheduler::new(
        store.clone(),
        renderer,
        settings.scheduler.poll_interval,
    ));
    scheduler.recover().await?;
    let scheduler_handle = Arc::clone(&scheduler).spawn();

    let jobs = JobService::new(store, artifacts).with_delimiter(settings.render.delimiter);
    let result = serve_http(&settings, HttpState::new(jobs)).await;

    scheduler_handle.abort();
    let _ = scheduler_handle.await;
    drain_in_flight(&scheduler, settings.server.graceful_shutdown).await;

    result
}

async fn run_render(settings: config::Settings, args: config::RenderArgs) -> Result<(), AppError> {
    let content = tokio::fs::read_to_string(&args.input)
        .await
        .map_err(InfraError::from)?;
    let title = args
        .input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("spiralpress")
        .to_string();
    let geometry = settings.render.geometry;
    let delimiter = settings.render.delimiter;

    let document = dispatch_blocking(move || {
        compose_document(&title, &content, delimiter, &geometry)
    })
    .await
    .map_err(|err| AppError::render(err.to_string()))?;

    tokio::fs::write(&args.output, &document.bytes)
        .await
        .map_err(InfraError::from)?;

    info!(
        target: "spiralpress::render",
        output = %args.output.display(),
        pages = document.pages,
        font_size = document.font_size,
        page_width = document.page_width,
        "Rendered document"
    );
    Ok(())
}

async fn init_job_store(settings: &config::Settings) -> Result<Arc<dyn JobStore>, AppError> {
    let Some(database_url) = settings.database.url.as_deref() else {
        warn!("No database configured; jobs are kept in memory and lost on restart");
        return Ok(Arc::new(MemoryJobStore::new()));
    };

    let pool = PostgresJobStore::connect(
        database_url,
        settings.database.max_connections.get(),
        settings.database.acquire_timeout,
    )
    .await
    .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresJobStore::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    info!("Connected to Postgres job store");
    Ok(Arc::new(PostgresJobStore::new(pool)))
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state, settings.server.max_body_bytes);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(addr = %settings.server.addr, "Listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Give a running render the chance to record its outcome before exit.
/// Anything still `processing` afterwards is recovered on the next start.
async fn drain_in_flight(scheduler: &Scheduler, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while scheduler.is_busy() {
        if Instant::now() >= deadline {
            warn!("Exiting with a render in flight; it will be retried after restart");
            return;
        }
        sleep(SHUTDOWN_POLL).await;
    }
}
