use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use autodial::bridge::{self, Dialer, SimulatedDialer};
use autodial::dnc::{self, DncOrigin, DncSource};
use autodial::queue::generate_queue;
use autodial::domain::AgentSettings;
use autodial::report::{
    DailyStats, HttpUploader, ReportRow, ReportUploader, build_report_csv, file_range_report, report_filename,
};
use autodial::sequencer::{ConsoleSink, Sequencer, SequencerInput};
use autodial::sms::{BridgeSms, RemoteApiSms, SmsSender, SmsTransport};
use autodial::storage::{self, CallLogStore, KvStore};

mod cli;
mod config;

use cli::Cli;
use cli::commands::{Commands, DncCommands, QueueArgs, RangeReportArgs, SettingsCommands, SettingsUpdate};
use cli::session::{SessionCommand, parse_line};
use config::Config;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("autodial")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("autodial.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
        println!("  data dir: {}", config.storage.data_dir.display());
    }

    match &cli.command {
        Commands::Queue { queue } => handle_queue_command(queue),
        Commands::Dial {
            queue,
            interval,
            simulate,
        } => handle_dial_command(queue, *interval, *simulate, config).await,
        Commands::Dnc { command } => handle_dnc_command(command, config).await,
        Commands::Settings { command } => handle_settings_command(command, config).await,
        Commands::Stats => handle_stats_command(config),
        Commands::Export { output } => handle_export_command(output.as_deref(), config).await,
        Commands::Report(args) => handle_report_command(args, config).await,
    }
}

struct Stores {
    kv: KvStore,
    logs: Arc<CallLogStore>,
}

fn open_stores(config: &Config) -> Result<Stores> {
    let dir = &config.storage.data_dir;
    let kv = KvStore::open(dir).context(format!("Failed to open state store in {}", dir.display()))?;
    let logs = CallLogStore::open(dir).context(format!("Failed to open call logs in {}", dir.display()))?;
    Ok(Stores {
        kv,
        logs: Arc::new(logs),
    })
}

fn handle_queue_command(args: &QueueArgs) -> Result<()> {
    info!("Generating queue: {:?}", args);
    let queue = generate_queue(&args.base, &args.last4, args.attempts, args.shuffle);
    for number in &queue {
        println!("{}", number);
    }
    eprintln!("{} {} numbers", "Generated:".green(), queue.len());
    Ok(())
}

async fn handle_dial_command(args: &QueueArgs, interval: Option<u64>, simulate: bool, config: &Config) -> Result<()> {
    info!("Dial session: {:?} interval={:?} simulate={}", args, interval, simulate);
    let stores = open_stores(config)?;
    let mut settings = storage::load_settings(&stores.kv).context("Failed to load settings")?;
    let timeout = config.endpoints.timeout();

    let source = DncSource::new(&config.endpoints.dnc_url, timeout).context("Failed to create DNC client")?;
    let dnc_load = source.load(&stores.kv).await.context("Failed to load DNC list")?;
    match &dnc_load.origin {
        DncOrigin::Cache => println!("{} {} numbers (cached)", "DNC:".cyan(), dnc_load.set.len()),
        DncOrigin::Remote => println!("{} {} numbers (fetched)", "DNC:".cyan(), dnc_load.set.len()),
        DncOrigin::Unavailable(_) => println!("{}", "Failed to load DNC (offline?)".yellow()),
    }

    let (tx, rx) = mpsc::channel::<SequencerInput>(64);

    let detected = if simulate {
        bridge::DetectedDialer {
            dialer: Box::new(SimulatedDialer::new(tx.clone())),
            connection: None,
        }
    } else {
        bridge::detect_dialer(config.bridge.socket_path.as_deref(), timeout, tx.clone()).await
    };
    let bridge::DetectedDialer { dialer, connection } = detected;
    println!("{} {}", "Dialer:".cyan(), dialer.name());
    if connection.is_some() {
        merge_host_admin(dialer.as_ref(), &mut settings, &stores.kv).await;
    }

    let mut transports: Vec<Box<dyn SmsTransport>> = Vec::new();
    if let Some(conn) = connection {
        transports.push(Box::new(BridgeSms::new(conn)));
    }
    if let Some(url) = &config.endpoints.sms_api_url {
        transports.push(Box::new(
            RemoteApiSms::new(url.as_str(), timeout).context("Failed to create SMS client")?,
        ));
    }

    let uploader =
        HttpUploader::new(&config.endpoints.reports_url, timeout).context("Failed to create report uploader")?;
    let default_series = settings.series_or(&args.base).to_string();

    let sequencer = Sequencer::new(dialer, stores.logs, Arc::new(uploader), Arc::new(ConsoleSink), tx.clone())
        .with_config(config.sequencer(interval))
        .with_dnc(dnc_load.set)
        .with_settings(settings)
        .with_sms(SmsSender::new(transports));
    let runner = tokio::spawn(sequencer.run(rx));

    let queue = generate_queue(&args.base, &args.last4, args.attempts, args.shuffle);
    tx.send(SequencerInput::Start(queue))
        .await
        .context("Sequencer stopped unexpectedly")?;

    println!("{}", "Type 'help' for commands, 'quit' to leave.".dimmed());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let input = match parse_line(&line) {
            Ok(None) => continue,
            Ok(Some(SessionCommand::Help)) => {
                print_session_help();
                continue;
            }
            Ok(Some(SessionCommand::Quit)) => break,
            Ok(Some(SessionCommand::Stop)) => SequencerInput::Stop,
            Ok(Some(SessionCommand::Report(fields))) => SequencerInput::SubmitReport(fields.into_report(&default_series)),
            Ok(Some(SessionCommand::Edit { call_id, fields })) => SequencerInput::EditReport {
                call_id,
                report: fields.into_report(&default_series),
            },
            Err(e) => {
                println!("{} {}", "Error:".red(), e);
                continue;
            }
        };
        if tx.send(input).await.is_err() {
            break;
        }
    }

    let _ = tx.send(SequencerInput::Shutdown).await;
    runner.await.context("Sequencer task failed")?;
    Ok(())
}

fn print_session_help() {
    println!("  {} [qualified=yes] [outbound=yes] [inbound=yes] [status=callback] [series=S]", "report".bold());
    println!("  {} <call-id> [fields]", "edit".bold());
    println!("  {}", "stop".bold());
    println!("  {}", "quit".bold());
}

async fn handle_dnc_command(command: &DncCommands, config: &Config) -> Result<()> {
    info!("Handling dnc command: {:?}", command);
    let stores = open_stores(config)?;

    match command {
        DncCommands::Refresh => {
            let source = DncSource::new(&config.endpoints.dnc_url, config.endpoints.timeout())
                .context("Failed to create DNC client")?;
            let set = source.refresh(&stores.kv).await.context("Failed to refresh DNC list")?;
            println!("{} {} numbers from {}", "Refreshed:".green(), set.len(), source.url());
        }
        DncCommands::Status => match dnc::cached_count(&stores.kv)? {
            Some(count) => println!("{} {} numbers cached", "DNC:".cyan(), count),
            None => println!("{}", "DNC: no cached list".yellow()),
        },
        DncCommands::Clear => {
            dnc::clear_cache(&stores.kv).context("Failed to clear DNC cache")?;
            println!("{}", "DNC cache cleared".green());
        }
        DncCommands::Check { number } => {
            let set = dnc::cached(&stores.kv)?.unwrap_or_default();
            if set.contains_number(number) {
                println!("{} {}", number, "is on the DNC list".red());
            } else {
                println!("{} {}", number, "is not on the DNC list".green());
            }
        }
    }
    Ok(())
}

async fn handle_settings_command(command: &SettingsCommands, config: &Config) -> Result<()> {
    info!("Handling settings command: {:?}", command);
    let stores = open_stores(config)?;
    let mut settings = storage::load_settings(&stores.kv).context("Failed to load settings")?;

    match command {
        SettingsCommands::Show => {
            if let Some(path) = config.bridge.socket_path.as_deref() {
                let (tx, _rx) = mpsc::channel(1);
                let detected = bridge::detect_dialer(Some(path), config.endpoints.timeout(), tx).await;
                if let Some(conn) = &detected.connection {
                    merge_host_admin(detected.dialer.as_ref(), &mut settings, &stores.kv).await;
                    conn.close().await;
                }
            }
        }
        SettingsCommands::Set(update) => {
            if update.is_empty() {
                println!("{}", "Nothing to change".yellow());
                return Ok(());
            }
            apply_and_save(update, &mut settings, &stores.kv, config).await?;
            println!("{}", "Settings saved".green());
        }
    }

    let sheet_id = settings.sheet_id_or(&config.defaults.sheet_id);
    println!("{:<22} {}", "Agent:".bold(), settings.display_agent());
    println!("{:<22} {}", "Branch:".bold(), settings.branch_name);
    println!("{:<22} {}", "Series:".bold(), settings.series.as_deref().unwrap_or("-"));
    println!("{:<22} {}", "Sheet:".bold(), sheet_id);
    println!("{:<22} {}", "Auto-SMS unanswered:".bold(), settings.auto_sms_enabled);
    println!("{:<22} {}", "Auto-SMS answered:".bold(), settings.auto_sms_answered_enabled);
    println!("{:<22} {}", "Unanswered template:".bold(), settings.unanswered_template());
    println!("{:<22} {}", "Answered template:".bold(), settings.answered_template());
    if !settings.admin_phone.is_empty() {
        println!("{:<22} {}", "Admin phone:".bold(), settings.admin_phone);
    }
    Ok(())
}

async fn apply_and_save(
    update: &SettingsUpdate,
    settings: &mut AgentSettings,
    kv: &KvStore,
    config: &Config,
) -> Result<()> {
    update.apply(settings);
    storage::save_settings(kv, settings).context("Failed to save settings")?;

    // Mirror to the host when it is reachable
    if let Some(path) = config.bridge.socket_path.as_deref() {
        let (tx, _rx) = mpsc::channel(1);
        let detected = bridge::detect_dialer(Some(path), config.endpoints.timeout(), tx).await;
        if let Some(conn) = &detected.connection {
            let sheet_id = settings.sheet_id_or(&config.defaults.sheet_id).to_string();
            if let Err(e) = detected.dialer.save_admin(settings, &sheet_id).await {
                println!("{} {}", "Error:".red(), e);
            }
            conn.close().await;
        }
    }
    Ok(())
}

/// Pull the profile saved on the host into local settings, keeping local
/// values the host leaves blank.
async fn merge_host_admin(dialer: &dyn Dialer, settings: &mut AgentSettings, kv: &KvStore) {
    match dialer.load_admin().await {
        Ok(Some(admin)) => {
            if admin.merge_into(settings) {
                match storage::save_settings(kv, settings) {
                    Ok(()) => info!("Settings updated from host profile"),
                    Err(e) => log::warn!("Failed to save host profile: {}", e),
                }
            }
        }
        Ok(None) => {}
        Err(e) => println!("{} {}", "Error:".red(), e),
    }
}

fn handle_stats_command(config: &Config) -> Result<()> {
    let stores = open_stores(config)?;
    let logs = stores.logs.list().context("Failed to read call logs")?;
    let today = Local::now().date_naive();
    let stats = DailyStats::for_day(&logs, today);

    println!("{} {}", "Today:".bold(), today.format("%-m/%-d/%Y"));
    println!(
        "  {} total  {} answered  {} unanswered  {} busy",
        stats.total,
        stats.answered.to_string().green(),
        stats.unanswered.to_string().yellow(),
        stats.busy.to_string().red()
    );
    for range in &stats.ranges {
        println!(
            "  {:<12} {:>3} total  {:>3} answered  {:>3} unanswered",
            range.label, range.total, range.answered, range.unanswered
        );
    }
    Ok(())
}

async fn handle_export_command(output: Option<&Path>, config: &Config) -> Result<()> {
    let stores = open_stores(config)?;
    let settings = storage::load_settings(&stores.kv).context("Failed to load settings")?;
    let logs = stores.logs.list().context("Failed to read call logs")?;
    if logs.is_empty() {
        println!("{}", "No call logs to export".yellow());
        return Ok(());
    }

    let now = Local::now();
    let rows: Vec<ReportRow> = logs
        .iter()
        .map(|log| ReportRow::from_log(log, &settings.agent_name, now))
        .collect();
    let csv = build_report_csv(&rows).context("Failed to build CSV")?;

    match output {
        Some(path) => {
            fs::write(path, &csv).context(format!("Failed to write {}", path.display()))?;
            println!("{} {} rows to {}", "Exported:".green(), rows.len(), path.display());
        }
        None => {
            let filename = report_filename(&settings.agent_name, now);
            let uploader = HttpUploader::new(&config.endpoints.reports_url, config.endpoints.timeout())
                .context("Failed to create report uploader")?;
            uploader
                .upload(&filename, &csv)
                .await
                .context(format!("Failed to upload {}", filename))?;
            println!("{} {} ({} rows)", "Uploaded:".green(), filename, rows.len());
        }
    }
    Ok(())
}

async fn handle_report_command(args: &RangeReportArgs, config: &Config) -> Result<()> {
    info!("Range report: {:?}", args);
    let stores = open_stores(config)?;
    let settings = storage::load_settings(&stores.kv).context("Failed to load settings")?;
    let report = args.fields().into_report(settings.series_or(""));

    let uploader = HttpUploader::new(&config.endpoints.reports_url, config.endpoints.timeout())
        .context("Failed to create report uploader")?;
    let filename = file_range_report(
        &uploader,
        &args.range,
        &args.number,
        &settings.agent_name,
        &report,
        Local::now(),
    )
    .await
    .context(format!("Failed to file {} report", args.range))?;
    println!("{} {}", "Updated successfully:".green(), filename);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
