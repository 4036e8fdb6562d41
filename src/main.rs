use clap::Parser;
use port_tunnel_sim::utils::error::ErrorSeverity;
use port_tunnel_sim::utils::{logger, validation::Validate};
use port_tunnel_sim::{CliConfig, SimEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(cli.verbose, cli.json_logs);

    tracing::info!("Starting port-tunnel-sim");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let run = match cli.to_run_config() {
        Ok(run) => run,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = run.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if run.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }
    match run.duration {
        Some(duration) => tracing::info!("⏱️ Running for {:?}", duration),
        None => tracing::info!("⏱️ Running until Ctrl-C"),
    }

    let engine = SimEngine::new_with_monitoring(run, cli.monitor);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ Simulation finished ({:?})", report.stopped_by);
            println!("{}", serde_json::to_string_pretty(&report.snapshot)?);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Simulation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

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
