use anyhow::Context;
use clap::Parser;
use port_tunnel_sim::config::toml_config::TomlConfig;
use port_tunnel_sim::utils::{logger, validation::Validate};
use port_tunnel_sim::{RunConfig, SimEngine};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "toml-sim")]
#[command(about = "Port tunnel simulator driven by a TOML world file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "sim-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override run duration from config
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Show the resolved world without running it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_logger(args.verbose, args.json_logs);

    tracing::info!("🚀 Starting TOML-based simulation");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config file '{}'", args.config))?;

    // 應用命令列覆蓋設定
    let mut run = config.to_run_config();
    if let Some(monitor) = args.monitor {
        run.monitor = monitor;
        tracing::info!("🔧 Monitoring overridden to: {}", monitor);
    }
    if let Some(secs) = args.duration_secs {
        run.duration = Some(Duration::from_secs(secs));
        tracing::info!("🔧 Duration overridden to: {}s", secs);
    }

    // 驗證配置
    if let Err(e) = run.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&run, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - world will not be started");
        return Ok(());
    }

    let engine = SimEngine::new(run);
    let report = engine.run().await.context("Simulation failed")?;

    tracing::info!("✅ Simulation finished ({:?})", report.stopped_by);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn display_config_summary(run: &RunConfig, args: &Args) {
    let world = &run.world;
    println!("📋 Configuration Summary:");
    println!("  Ports: {} × {} units", world.port_count, world.initial_quantity);
    println!("  Generation threshold: > {}", world.generation_threshold);
    println!(
        "  Tunnel: capacity {}, dwell {}..{} ms",
        world.tunnel_capacity, world.timing.tunnel_delay_min_ms, world.timing.tunnel_delay_max_ms
    );
    println!(
        "  Storage slots: small {}, middle {}, big {}",
        world.storage.small, world.storage.middle, world.storage.big
    );
    println!("  Max ships in flight: {}", world.max_in_flight);
    match world.redirect_limit() {
        Some(limit) => println!("  Max redirects: {}", limit),
        None => println!("  Max redirects: unlimited"),
    }
    match world.seed {
        Some(seed) => println!("  Seed: {}", seed),
        None => println!("  Seed: random"),
    }
    match run.duration {
        Some(duration) => println!("  Duration: {:?}", duration),
        None => println!("  Duration: until Ctrl-C"),
    }
    println!("  Monitoring: {}", run.monitor);

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
