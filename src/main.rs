use clap::Parser;
use search_term_triage::domain::ports::ConfigProvider;
use search_term_triage::utils::error::TriageError;
use search_term_triage::utils::{logger, validation::Validate};
use search_term_triage::{
    build_classifier, CancelFlag, CliConfig, LocalStorage, TracingObserver, TriageEngine,
    TriagePipeline,
};
use std::sync::Arc;

fn report_failure(context: &str, e: &TriageError) {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting search-term-triage CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let classifier = match build_classifier(&config.classifier_settings()) {
        Ok(classifier) => classifier,
        Err(e) => {
            report_failure("Classifier setup failed", &e);
            std::process::exit(1);
        }
    };

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // Ctrl-C 只停止後續批次，已完成的結果照樣輸出
    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("⏹️ Interrupt received, finishing the current batch");
            on_interrupt.cancel();
        }
    });

    let storage = LocalStorage::new(".");
    let pipeline = TriagePipeline::new(storage, config, classifier)
        .with_observer(Arc::new(TracingObserver))
        .with_cancel_flag(cancel);

    let engine = TriageEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Triage completed successfully!");
            println!("✅ Triage completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            report_failure("Triage failed", &e);

            let code = e.exit_code();
            if code > 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
