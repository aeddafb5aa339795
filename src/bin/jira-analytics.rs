use clap::{Parser, Subcommand};

use jira_analytics::{jira::JiraFlavor, server, tools, JiraAnalytics, JiraConfig};

#[derive(Parser)]
#[command(name = "jira-analytics", about = "Bulk productivity analytics over Jira issue search")]
struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Jira site URL (overrides JIRA_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// `cloud` or `server` (overrides JIRA_TYPE)
    #[arg(long)]
    jira_type: Option<String>,

    /// Custom field holding story points (overrides JIRA_STORY_POINTS_FIELD)
    #[arg(long)]
    story_points_field: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available tools and their input schemas
    Tools,
    /// Call a tool once and print its result
    Call {
        /// Tool name, e.g. jira_bulk_user_analytics
        name: String,
        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Serve JSON-RPC requests over stdin/stdout
    Serve,
}

fn load_config(cli: &Cli) -> JiraConfig {
    let mut config = JiraConfig::from_env();
    if let Some(ref url) = cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(ref t) = cli.jira_type {
        config.flavor = JiraFlavor::parse(t);
    }
    if let Some(ref field) = cli.story_points_field {
        config.story_points_field = field.clone();
    }
    if config.token.is_none() {
        log::warn!("No Jira credentials configured; requests will be unauthenticated");
    }
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match &cli.command {
        Commands::Tools => {
            println!("{}", serde_json::to_string_pretty(&tools::definitions())?);
        }
        Commands::Call { name, args } => {
            let args: serde_json::Value = serde_json::from_str(args)
                .map_err(|e| anyhow::anyhow!("--args is not valid JSON: {e}"))?;
            let service = JiraAnalytics::from_config(&load_config(&cli))?;
            let output = service.call_tool(name, args).await;
            println!("{}", output.as_text());
            if output.is_error {
                std::process::exit(1);
            }
        }
        Commands::Serve => {
            let service = JiraAnalytics::from_config(&load_config(&cli))?;
            log::info!("Serving tools over stdio");
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            server::serve(&service, stdin, tokio::io::stdout()).await?;
        }
    }

    Ok(())
}
