use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use small_library::utils::error::ErrorSeverity;
use small_library::utils::{logger, validation::Validate};
use small_library::{open_library, CliConfig, LocalStorage, SnapshotGateway, SystemClock, Terminal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入並驗證配置
    let config = match cli.resolve().and_then(|config| config.validate().map(|()| config)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_cli_logger(config.verbose, config.log_format);

    tracing::info!("Starting small-library");
    tracing::debug!("Resolved config: {:?}", config);

    let storage = LocalStorage::new(config.data_dir.clone());
    let gateway = SnapshotGateway::new(storage, config.snapshot_file.clone());

    let mut engine = open_library(&gateway, config.loan_term(), Arc::new(SystemClock))
        .await
        .with_context(|| {
            format!(
                "failed to open library data '{}' in {}",
                config.snapshot_file, config.data_dir
            )
        })?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut terminal = Terminal::new(stdin.lock(), stdout.lock());

    match terminal.run(&mut engine, &gateway).await {
        Ok(()) => {
            tracing::info!("👋 Session ended, library state saved");
        }
        Err(e) => {
            tracing::error!(
                "❌ Library session failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
