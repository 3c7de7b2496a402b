use anyhow::Context;
use clap::Parser;
use search_term_triage::core::mapper::FieldMapper;
use search_term_triage::core::parser::TabularParser;
use search_term_triage::core::projector::RecordProjector;
use search_term_triage::domain::ports::{ConfigProvider, Storage};
use search_term_triage::utils::{logger, validation::Validate};
use search_term_triage::{
    build_classifier, CancelFlag, LocalStorage, TomlConfig, TriageEngine, TriagePipeline,
};

#[derive(Parser)]
#[command(name = "toml-triage")]
#[command(about = "Search term triage driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "triage-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - parse and map the report without calling the classifier
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config file '{}'", args.config))?;

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based search term triage");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No classifier calls will be made");
        perform_dry_run(&config).await?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let classifier = build_classifier(&config.classifier_settings())
        .context("Failed to set up the classifier")?;

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("⏹️ Interrupt received, finishing the current batch");
            on_interrupt.cancel();
        }
    });

    let pipeline =
        TriagePipeline::new(LocalStorage::new("."), config, classifier).with_cancel_flag(cancel);
    let engine = TriageEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Triage completed successfully!");
            println!("✅ Triage completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Triage failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    let classifier = config.classifier_settings();
    let batch = config.batch_settings();
    let output = config.output_settings();

    println!("📋 Configuration Summary:");
    match &config.pipeline.version {
        Some(version) => println!("  Pipeline: {} v{}", config.pipeline.name, version),
        None => println!("  Pipeline: {}", config.pipeline.name),
    }
    if let Some(description) = &config.pipeline.description {
        println!("  Description: {}", description);
    }
    println!("  Source: {} (header row {})", config.input_path(), config.header_row());
    println!("  Classifier: {:?}", classifier.kind);
    if let Some(endpoint) = &classifier.endpoint {
        println!("  Endpoint: {}", endpoint);
    }
    println!(
        "  Batch: up to {} per call, {}ms between calls",
        batch.max_batch_size,
        batch.inter_batch_delay.as_millis()
    );
    println!("  Output: {}", output.output_path);
    println!("  Formats: {}", config.load.output_formats.join(", "));
    if output.compress {
        println!("  Archive: {}", output.archive_name);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
}

async fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    let storage = LocalStorage::new(".");
    let bytes = storage
        .read_file(config.input_path())
        .await
        .with_context(|| format!("Failed to read {}", config.input_path()))?;
    let text = String::from_utf8(bytes).context("Report is not valid UTF-8")?;

    let table = TabularParser::new().parse(&text, config.header_row())?;
    let columns = table.columns();

    let (mut mapping, conflicts) = if config.auto_map() {
        let outcome = FieldMapper::new().auto_map(&columns);
        (outcome.mapping, outcome.conflicts)
    } else {
        Default::default()
    };
    mapping.merge_overrides(&config.mapping_overrides());
    mapping.retain_columns(&columns);

    println!("🔍 Dry run:");
    println!("  Columns ({}): {}", columns.len(), columns.join(", "));
    for (field, column) in mapping.iter() {
        println!("  {} ← {}", field, column);
    }
    for conflict in &conflicts {
        println!(
            "  ⚠️ '{}' matches several fields: {:?}",
            conflict.column, conflict.fields
        );
    }

    let missing = mapping.missing_required();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|field| field.as_str()).collect();
        println!("  ❌ Missing required fields: {}", names.join(", "));
    }

    let records = RecordProjector::new().project(&table.rows, &mapping);
    let admissible = records.iter().filter(|r| r.is_admissible()).count();
    println!(
        "  Records: {} parsed, {} ready for analysis, {} lines rejected",
        records.len(),
        admissible,
        table.rejected_lines
    );

    Ok(())
}
