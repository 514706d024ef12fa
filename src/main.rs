use bakery_ledger::{
    config::{
        app::{OPENING_BALANCE_VAR, parse_opening_balance},
        database::init_database,
        load_app_configuration,
    },
    core::{
        EditSession, Engine, Selection,
        import::{Collection, import_file},
        report::render_summary_text,
        state::parse_date,
    },
    errors::Result,
};
use dotenvy::dotenv;
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the main application configuration
    let config = load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Initialize database
    let db = init_database(&config.database_url)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;
    let engine = Engine::new(db, config);

    // 5. Seed the default catalog for shops that have none
    engine
        .seed_catalog()
        .await
        .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;

    // 6. Optional import of an exported collection
    if let Ok(path) = env::var("IMPORT_FILE") {
        let collection: Collection = env::var("IMPORT_COLLECTION")
            .inspect_err(|e| error!("IMPORT_COLLECTION not set: {}", e))?
            .parse()?;
        let summary = import_file(engine.db(), collection, &path).await?;
        info!(
            "Import of {} finished: {} imported, {} skipped",
            path, summary.imported, summary.skipped
        );
    }

    // 7. Optional summary report
    if let Ok(shop) = env::var("REPORT_SHOP") {
        if !engine.config().has_shop(&shop) {
            warn!("{} is not a configured shop", shop);
        }
        let date = match env::var("REPORT_DATE") {
            Ok(raw) => parse_date(&raw)?,
            Err(_) => chrono::Local::now().date_naive(),
        };
        let selection = Selection::new(shop, date);
        let opening = parse_opening_balance(env::var(OPENING_BALANCE_VAR).ok().as_deref())
            .inspect_err(|e| error!("{}", e))?;
        let report = engine
            .summary(&selection, &EditSession::new(), opening)
            .await?;
        println!(
            "{}",
            render_summary_text(&report, &engine.config().currency_label)
        );
    }

    Ok(())
}
