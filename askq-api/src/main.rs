use actix_web::{web, App, HttpServer};
use anyhow::Context;
use askq_api::config::ApiConfig;
use askq_api::graphql::{schema::SCHEMA_SDL, Executor};
use askq_api::store::QuestionStore;
use askq_api::{handlers, helpers};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "askq-api", version, about = "Question/answer GraphQL server")]
struct Cli {
    /// Config file (defaults to ./askq.toml, then the user config directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override server.host
    #[arg(long)]
    host: Option<String>,

    /// Override server.port
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the GraphQL schema and exit
    #[arg(long)]
    print_schema: bool,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_schema {
        print!("{}", SCHEMA_SDL);
        return Ok(());
    }

    let (mut config, config_path) =
        ApiConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let _log_guard = helpers::logging::init_logging(&config.logging)?;

    match &config_path {
        Some(path) => info!(path = %path.display(), "Loaded configuration"),
        None => info!("No config file found, using defaults and environment"),
    }

    let answerer = helpers::llm::create_answer_generator(&config)?;
    let store = QuestionStore::new(config.store.capacity);
    info!(
        capacity = ?store.capacity(),
        answer_mode = answerer.mode(),
        "Question store ready"
    );
    let executor = web::Data::new(Executor::new(store, answerer));

    let bind_addr = config.bind_address();
    info!(
        "Starting askq-api server at http://{}{}",
        bind_addr, config.graphql.path
    );

    HttpServer::new(move || {
        App::new()
            .wrap(handlers::build_cors(&config.cors))
            .app_data(executor.clone())
            .configure(|cfg| handlers::configure(cfg, &config))
    })
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await?;

    Ok(())
}
