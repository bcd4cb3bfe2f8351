// src/main.rs

use std::sync::Arc;

use exam_portal::authoring::ai::GeminiGenerator;
use exam_portal::authoring::readers::{CalamineReader, LopdfExtractor};
use exam_portal::config::Config;
use exam_portal::routes;
use exam_portal::seed;
use exam_portal::state::AppState;
use exam_portal::store::{InMemoryExamStore, InMemoryStudentStore};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load configuration from environment (reads .env if present)
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if config.gemini.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set. AI generation and PDF import are disabled.");
    }

    // Seed the in-memory stores with the demo exams and roster
    let exams = Arc::new(InMemoryExamStore::new(seed::demo_exams()));
    let students = Arc::new(InMemoryStudentStore::new(seed::demo_students()));
    let generator = Arc::new(GeminiGenerator::new(config.gemini.clone()));
    tracing::info!("Seeded demo exams and students");

    let mut state = AppState::new(config.clone(), exams, students, generator)
        .expect("Failed to hash admin password");
    state.importer = state
        .importer
        .with_spreadsheet_reader(Arc::new(CalamineReader))
        .with_pdf_extractor(Arc::new(LopdfExtractor));

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listening address");
    tracing::info!("Listening on {}", config.bind_addr);

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}
