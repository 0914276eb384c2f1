use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use duckpanel::{
    ColumnSet, DataSource, DataSourceSettings, HealthStatus, Query, QueryRequest, Result,
};
use std::path::PathBuf;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "duckpanel")]
#[command(about = "Query CSV-backed DuckDB tables into time-series frames", version)]
struct Cli {
    /// Data-source settings (YAML or JSON)
    #[arg(short, long, env = "DUCKPANEL_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query; without SQL the built-in generator query runs
    Query {
        sql: Option<String>,

        #[arg(long, default_value = "A")]
        ref_id: String,

        /// One field per column instead of one frame per segment
        #[arg(long)]
        raw: bool,

        #[arg(long, requires = "to")]
        from: Option<DateTime<Utc>>,

        #[arg(long, requires = "from")]
        to: Option<DateTime<Utc>>,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the tables created from the configured data frames
    Tables,
    /// Check that the database can be opened
    Test,
}

fn load_settings(path: Option<&PathBuf>) -> Result<DataSourceSettings> {
    match path {
        Some(path) => DataSourceSettings::load(path),
        None => Ok(DataSourceSettings::default()),
    }
}

fn render_frame(frame: &ColumnSet) -> String {
    let mut builder = Builder::default();
    builder.push_record(frame.fields.iter().map(|f| f.name.clone()).collect::<Vec<_>>());
    for i in 0..frame.row_count() {
        builder.push_record(
            frame
                .fields
                .iter()
                .map(|f| f.values.get(i).map(|v| v.to_string()).unwrap_or_default())
                .collect::<Vec<_>>(),
        );
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(cli.config.as_ref())?;
    let datasource = DataSource::from_settings(&settings);

    match cli.command {
        Commands::Query {
            sql,
            ref_id,
            raw,
            from,
            to,
            json,
        } => {
            let query = Query::new(ref_id, sql.unwrap_or_default()).with_long(!raw);
            let mut request = QueryRequest::new(vec![query]);
            if let (Some(from), Some(to)) = (from, to) {
                request = request.with_range(from, to);
            }

            let response = datasource.query(&request).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
                return Ok(());
            }

            for frame in &response.data {
                let title = frame.name.as_deref().unwrap_or(&frame.ref_id);
                println!("{} ({} rows)", title.cyan().bold(), frame.row_count());
                println!("{}", render_frame(frame));
            }
            for warning in &response.warnings {
                eprintln!("{} {}", "warning:".yellow().bold(), warning);
            }
        }
        Commands::Tables => {
            let tables = datasource.source().list_tables().await?;
            if tables.is_empty() {
                println!("{}", "No tables".dimmed());
            }
            for table in tables {
                println!("{}", table);
            }
        }
        Commands::Test => {
            let check = datasource.test_datasource().await;
            match check.status {
                HealthStatus::Success => println!("{} {}", "✓".green().bold(), check.message),
                HealthStatus::Error => {
                    println!("{} {}", "✗".red().bold(), check.message);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
