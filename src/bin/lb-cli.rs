use std::net::SocketAddr;

use axum::{extract::Request, Router};
use clap::{Parser, Subcommand};
use passive_lb::registration::Registration;

#[derive(Parser)]
#[command(name = "lb-cli")]
#[command(about = "Registration client and demo backend for passive-lb", long_about = None)]
struct Cli {
    /// Registration endpoint of the load balancer
    #[arg(short, long, default_value = "http://localhost:4041/lb/new")]
    registrar: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a backend endpoint
    Register {
        /// Endpoint to forward traffic to (e.g. http://10.0.0.5:9000)
        #[arg(long)]
        url: String,
    },
    /// Run a demo backend that registers itself on startup
    Backend {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:9000")]
        listen: SocketAddr,

        /// Endpoint to advertise (defaults to http://<listen>)
        #[arg(long)]
        advertise: Option<String>,

        /// Text every response carries
        #[arg(long, default_value = "Hello from a balanced backend")]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Register { url } => {
            register(&client, &cli.registrar, url).await?;
        }
        Commands::Backend {
            listen,
            advertise,
            message,
        } => {
            let listener = tokio::net::TcpListener::bind(listen).await?;
            let local = listener.local_addr()?;
            let app = Router::new().fallback(move |req: Request| {
                let message = message.clone();
                async move { format!("{message} ({} {})\n", req.method(), req.uri()) }
            });
            println!("Demo backend listening on http://{local}");

            let server = tokio::spawn(async move { axum::serve(listener, app).await });

            let url = advertise.unwrap_or_else(|| format!("http://{local}"));
            register(&client, &cli.registrar, url).await?;

            server.await??;
        }
    }

    Ok(())
}

async fn register(
    client: &reqwest::Client,
    registrar: &str,
    url: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let res = client
        .post(registrar)
        .json(&Registration { url: url.clone() })
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: registration returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Err(format!("registration of {url} failed").into());
    }

    println!("Registered {url}");
    Ok(())
}
