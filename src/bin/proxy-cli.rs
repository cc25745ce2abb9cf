use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use reqwest::cookie::Jar;
use url::Url;

use backend_passthrough::client::{
    list_threads, ClientUrlResolver, CookieSink, DiscardCookies, HttpThreadSearch, JarCookieSink,
};

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Client-side routing and thread listing through the passthrough proxy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Session {
    /// Backend the session wants to talk to.
    #[arg(short, long, env = "API_URL")]
    backend_url: Option<String>,

    /// Origin the chat page is served from (where the proxy is mounted).
    #[arg(short, long)]
    page_origin: Option<String>,

    /// Always go through the proxy (also enabled by USE_API_PROXY=true).
    #[arg(long)]
    force_proxy: bool,

    /// Proxy mount path on the page origin.
    #[arg(long, default_value = "/api")]
    mount_path: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the routing decision for a session
    Route(Session),
    /// List an assistant's threads through the decided base URL
    Threads {
        #[command(flatten)]
        session: Session,

        /// Assistant UUID or graph name.
        #[arg(short, long, env = "ASSISTANT_ID")]
        assistant_id: String,

        /// API key sent as x-api-key (used for direct connections).
        #[arg(short = 'k', long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Route(session) => {
            let (decision, _) = decide(&session)?;
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                "use_proxy": decision.use_proxy,
                "effective_base_url": decision.effective_base_url,
            }))?);
        }
        Commands::Threads { session, assistant_id, api_key } => {
            let (decision, jar) = decide(&session)?;
            if decision.effective_base_url.is_empty() {
                eprintln!("No backend configured; pass --backend-url or set API_URL");
                return Ok(());
            }

            let client = reqwest::Client::builder().cookie_provider(jar).build()?;
            let search = HttpThreadSearch::new(client, decision.effective_base_url, api_key);
            let listing = list_threads(&search, &assistant_id).await;

            if listing.degraded {
                eprintln!("Thread search failed; showing no threads");
            }
            println!("{}", serde_json::to_string_pretty(&listing.threads)?);
        }
    }

    Ok(())
}

/// Run the client-side routing decision, persisting the cookie into a fresh jar.
fn decide(
    session: &Session,
) -> Result<(backend_passthrough::client::ClientRoutingDecision, Arc<Jar>), Box<dyn std::error::Error>> {
    let jar = Arc::new(Jar::default());
    let resolver = ClientUrlResolver::from_env(session.page_origin.clone())
        .with_mount_path(session.mount_path.clone());
    let resolver = if session.force_proxy {
        resolver.with_force_proxy(true)
    } else {
        resolver
    };

    let sink: Box<dyn CookieSink> = match &session.page_origin {
        Some(origin) => Box::new(JarCookieSink::new(jar.clone(), Url::parse(origin)?)),
        None => Box::new(DiscardCookies),
    };

    let decision = resolver.compute_base_url(session.backend_url.as_deref(), sink.as_ref());
    Ok((decision, jar))
}
