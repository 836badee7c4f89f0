use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "failover-cli")]
#[command(about = "Management CLI for the failover orchestrator", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show global failover state
    Status,
    /// Show failover counters
    Metrics,
    /// List fallbacks, or show one category
    Fallbacks { category: Option<String> },
    /// Show recent failover events
    Events {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Activate the fallback for a category
    Failover {
        category: String,
        #[arg(short, long)]
        reason: Option<String>,
    },
    /// Route a category back to its primary
    Recover {
        category: String,
        #[arg(short, long)]
        reason: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)),
        Commands::Metrics => client.get(format!("{}/admin/metrics", cli.url)),
        Commands::Fallbacks { category: None } => client.get(format!("{}/admin/fallbacks", cli.url)),
        Commands::Fallbacks { category: Some(category) } => {
            client.get(format!("{}/admin/fallbacks/{}", cli.url, category))
        }
        Commands::Events { limit } => client.get(format!("{}/admin/events?limit={}", cli.url, limit)),
        Commands::Failover { category, reason } => client
            .post(format!("{}/admin/fallbacks/{}/failover", cli.url, category))
            .json(&json!({ "reason": reason })),
        Commands::Recover { category, reason } => client
            .post(format!("{}/admin/fallbacks/{}/recover", cli.url, category))
            .json(&json!({ "reason": reason })),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
