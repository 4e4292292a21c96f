use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Command-line client for the route optimizer", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "ROUTE_OPTIMIZER_API_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Criterion {
    Distance,
    Time,
    Cost,
    Emissions,
    Balanced,
}

impl Criterion {
    fn as_str(self) -> &'static str {
        match self {
            Criterion::Distance => "distance",
            Criterion::Time => "time",
            Criterion::Cost => "cost",
            Criterion::Emissions => "emissions",
            Criterion::Balanced => "balanced",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status and cache statistics
    Health,
    /// Optimize a route between two points
    Optimize {
        /// Origin as "lat,lng"
        #[arg(long)]
        from: String,
        /// Destination as "lat,lng"
        #[arg(long)]
        to: String,
        /// Vehicle class (car, truck, van, motorcycle, bicycle, electric_car, electric_truck)
        #[arg(long, default_value = "car")]
        vehicle: String,
        #[arg(long, value_enum, default_value = "balanced")]
        criterion: Criterion,
        #[arg(long, default_value_t = 2)]
        alternatives: usize,
        /// Time-preference factor; below 1 favours faster routes
        #[arg(long)]
        factor: Option<f64>,
    },
    /// Show usage for the API key over the last N hours
    Usage {
        #[arg(long, default_value_t = 24)]
        hours: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", HeaderValue::from_str(&cli.key)?);

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Optimize {
            from,
            to,
            vehicle,
            criterion,
            alternatives,
            factor,
        } => {
            let body = json!({
                "origin": parse_point(&from)?,
                "destination": parse_point(&to)?,
                "vehicle": { "vehicle_class": vehicle },
                "criterion": criterion.as_str(),
                "alternatives": alternatives,
                "factor": factor,
            });
            let res = client
                .post(format!("{}/v1/optimize-route", cli.url))
                .headers(headers)
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Usage { hours } => {
            let res = client
                .get(format!("{}/v1/usage", cli.url))
                .headers(headers)
                .query(&[("hours", hours)])
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn parse_point(raw: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got {raw:?}"))?;
    let lat: f64 = lat.trim().parse()?;
    let lng: f64 = lng.trim().parse()?;
    Ok(json!({ "lat": lat, "lng": lng }))
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: route optimizer returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
