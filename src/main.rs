use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "confirm-runner")]
#[command(about = "Confirm pending records by filling their interaction log")]
#[command(version)]
struct Cli {
    /// Workflow config file
    config: PathBuf,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate config without running
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> confirm_runner::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let mut config = confirm_runner::Config::load(&cli.config)?;

    if cli.check {
        let wf = &config.workflow;
        println!("Config valid: {}", config.name);
        println!("  Target: {}", config.target.url);
        if let Some(ref ready) = config.target.ready_text {
            println!("  Waits for: '{}'", ready);
        }
        println!(
            "  Marker: {} containing '{}'",
            wf.marker.selector, wf.marker.text
        );
        println!("  List headers: {}", wf.table_headers.join(", "));
        println!("  Selections: {}", wf.selections.len());
        for s in &wf.selections {
            println!("    - {} -> option {}", s.label, s.index);
        }
        if let Some(ref transfer) = wf.transfer {
            println!("  Transfer: '{}'", transfer);
        }
        println!("  Confirm with: '{}'", wf.confirm_button);
        return Ok(());
    }

    if cli.headless {
        config.browser.headless = true;
    }

    println!("Running: {}", config.name);

    let mut runner = confirm_runner::Runner::new(&config.browser).await?;
    let outcome = runner.run(&config).await;
    runner.close().await?;
    let result = outcome?;

    println!();
    println!("✓ Finished");
    println!("  Confirmed: {}", result.completed.len());
    println!("  Processed: {}", result.items_processed);
    println!("  Markers visited: {}", result.markers_visited);
    if !result.failed.is_empty() {
        println!("  Failed ({}):", result.failed.len());
        for name in &result.failed {
            println!("    - {}", name);
        }
    }
    if !result.stalled_markers.is_empty() {
        println!("  Left unfinished:");
        for marker in &result.stalled_markers {
            println!("    - {}", marker);
        }
    }
    println!("  Duration: {}ms", result.duration_ms);

    Ok(())
}
