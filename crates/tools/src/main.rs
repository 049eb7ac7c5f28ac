use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use classify::{Palette, ScaleType};
use query::QueryClient;
use reqwest::multipart::{Form, Part};
use tools::QuerySummary;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use viewstate::{ShareState, Viewport};

#[derive(Parser, Debug)]
#[command(author, version, about = "Census geomap query and upload client")]
struct Args {
    /// Base URL of the query backend
    #[arg(
        long,
        global = true,
        env = "GEOMAP_API_URL",
        default_value = "http://127.0.0.1:8000"
    )]
    api_url: String,

    /// Base URL of the upload service
    #[arg(
        long,
        global = true,
        env = "GEOMAP_UPLOAD_URL",
        default_value = "http://127.0.0.1:9200"
    )]
    upload_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a free-text query and print the classified legend
    Query {
        /// Question, e.g. "share of renters by zip"
        #[arg(required = true)]
        query: Vec<String>,

        /// Column to classify (defaults to the first value column)
        #[arg(long)]
        column: Option<String>,

        /// quantize or quantile
        #[arg(long, default_value = "quantize")]
        scale: ScaleType,

        /// Color scheme name
        #[arg(long, default_value = "Blues")]
        palette: Palette,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print autocomplete suggestions for partial query text
    Suggest { text: String },

    /// Encode or decode shareable map-state tokens
    Share {
        #[command(subcommand)]
        action: ShareAction,
    },

    /// Upload a data file and print the parsed result
    Upload {
        path: PathBuf,

        /// Content type to declare (otherwise the service goes by extension)
        #[arg(long)]
        mime: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ShareAction {
    Encode {
        query: String,
        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long)]
        zoom: Option<f64>,
    },
    Decode {
        token: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), String> {
    match args.command {
        Command::Query {
            query,
            column,
            scale,
            palette,
            json,
        } => {
            let query = query.join(" ");
            let client = QueryClient::new(args.api_url);
            let result = client.fetch(&query).await.map_err(|e| e.to_string())?;
            let summary = QuerySummary::new(&query, &result, column.as_deref(), scale, palette)?;
            if json {
                let out =
                    serde_json::to_string_pretty(&summary).map_err(|e| format!("json: {e}"))?;
                println!("{out}");
            } else {
                print!("{}", summary.render());
            }
        }
        Command::Suggest { text } => {
            let client = QueryClient::new(args.api_url);
            for suggestion in client.autocomplete(&text).await.map_err(|e| e.to_string())? {
                println!("{suggestion}");
            }
        }
        Command::Share { action } => share(action)?,
        Command::Upload { path, mime } => upload(&args.upload_url, &path, mime).await?,
    }
    Ok(())
}

fn share(action: ShareAction) -> Result<(), String> {
    match action {
        ShareAction::Encode {
            query,
            lng,
            lat,
            zoom,
        } => {
            let default = Viewport::default();
            let viewport = Viewport::new(
                lng.unwrap_or(default.longitude),
                lat.unwrap_or(default.latitude),
                zoom.unwrap_or(default.zoom),
            );
            println!("#{}", ShareState::new(query, &viewport).encode());
        }
        ShareAction::Decode { token } => {
            let state = ShareState::decode(&token).map_err(|e| e.to_string())?;
            let out = serde_json::to_string_pretty(&state).map_err(|e| format!("json: {e}"))?;
            println!("{out}");
        }
    }
    Ok(())
}

async fn upload(base_url: &str, path: &Path, mime: Option<String>) -> Result<(), String> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| format!("read {path:?}: {e}"))?;
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| format!("invalid file name: {path:?}"))?
        .to_string();
    debug!("uploading {file_name} ({} bytes)", data.len());

    let mime = mime.unwrap_or_else(|| "application/octet-stream".to_string());
    let part = Part::bytes(data)
        .file_name(file_name)
        .mime_str(&mime)
        .map_err(|e| format!("content type {mime:?}: {e}"))?;
    let form = Form::new().part("data", part);

    let url = format!("{}/upload", base_url.trim_end_matches('/'));
    let resp = reqwest::Client::new()
        .post(&url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| format!("POST {url}: {e}"))?;
    let body: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| format!("response body: {e}"))?;

    let out = serde_json::to_string_pretty(&body).map_err(|e| format!("json: {e}"))?;
    println!("{out}");
    if body["status"] != "success" {
        return Err("upload failed".to_string());
    }
    Ok(())
}
