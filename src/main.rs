use anyhow::{anyhow, Context, Result};
use solana_pda_detector::analyzer::{build_transaction_tree, AccountCreationDetector};
use solana_pda_detector::config::Configuration;
use solana_pda_detector::monitor::{transaction, Monitor};
use solana_pda_detector::utils::parse_pubkey;
use std::path::PathBuf;
use env_logger::Builder;
use log::{info, LevelFilter};
use std::io::Write;

const DEFAULT_CLUSTER: &str = "https://api.mainnet-beta.solana.com";

fn print_usage(program: &str) {
    println!("Solana PDA Detector v{}", solana_pda_detector::VERSION);
    println!("\nUsage:");
    println!("  {} analyze <TX_JSON_FILE> --subject <PUBKEY> [--cluster URL] [--config PATH]", program);
    println!("  {} scan <SUBJECT> [--cluster URL] [--pages N] [--config PATH]", program);
    println!("  {} --version", program);
    println!("\nOptions:");
    println!("  --subject, -s PUBKEY  Account whose created accounts are reported");
    println!("  --cluster, -c URL     Use the specified RPC URL (default: mainnet-beta)");
    println!("  --pages, -p N         Number of signature pages to scan");
    println!("  --config PATH         JSON configuration file (or PDA_DETECTOR_CONFIG)");
    println!("  --version, -v         Show version information");
}

struct Options {
    subject: Option<String>,
    cluster: String,
    pages: Option<usize>,
    config: Option<PathBuf>,
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut options = Options {
        subject: None,
        cluster: DEFAULT_CLUSTER.to_string(),
        pages: None,
        config: None,
    };

    let mut i = 0;
    while i < args.len() {
        let value = || {
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| anyhow!("Missing value for {}", args[i]))
        };
        match args[i].as_str() {
            "--subject" | "-s" => options.subject = Some(value()?),
            "--cluster" | "-c" => options.cluster = value()?,
            "--pages" | "-p" => {
                options.pages = Some(value()?.parse().context("--pages expects a number")?)
            }
            "--config" => options.config = Some(PathBuf::from(value()?)),
            other => return Err(anyhow!("Unknown argument: {}", other)),
        }
        i += 2;
    }
    Ok(options)
}

#[tokio::main]
async fn main() -> Result<()> {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|elapsed| elapsed.as_secs())
                    .unwrap_or_default(),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && (args[1] == "--version" || args[1] == "-v") {
        println!("Solana PDA Detector v{}", solana_pda_detector::VERSION);
        return Ok(());
    }

    if args.len() < 3 {
        print_usage(&args[0]);
        return Ok(());
    }

    let options = parse_options(&args[3..])?;
    let config = Configuration::load(options.config.as_deref())?;
    let detector = AccountCreationDetector::new(config.detector.clone());

    match args[1].as_str() {
        "analyze" => {
            let path = PathBuf::from(&args[2]);
            let subject = options
                .subject
                .as_deref()
                .ok_or_else(|| anyhow!("analyze requires --subject"))?;
            let subject = parse_pubkey(subject, "subject")?;

            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let tx = transaction::from_json(&json)?;
            let tree = build_transaction_tree(&tx)?;

            let monitor = Monitor::with_settings(&options.cluster, &config.scan);
            let created = detector
                .detect(&tx, &tree, &subject, &monitor.account_lookup())
                .await?;

            let output = serde_json::json!({
                "signature": tx.signature,
                "tree": tree,
                "created": created,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "scan" => {
            let subject = parse_pubkey(&args[2], "subject")?;
            let mut settings = config.scan.clone();
            if let Some(pages) = options.pages {
                settings.max_pages = Some(pages);
            }

            info!("Scanning history of {} on {}", subject, options.cluster);
            let monitor = Monitor::with_settings(&options.cluster, &settings);
            let report = monitor.scan(&subject, &detector, &settings).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        other => {
            println!("Unknown command: {}", other);
            print_usage(&args[0]);
        }
    }

    Ok(())
}
