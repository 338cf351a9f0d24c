// Command-line front end for the surge data layer.
// Looks up a repository list twice so the second resolution demonstrates
// the cache, then prints the fields consumers render.

use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use surge::store::{AppStore, AuthToken};
use surge::{GitHubClient, QueryState, RepoService};

#[derive(Parser, Debug)]
#[command(name = "surge", version, about = "Cached GitHub repository queries")]
struct Cli {
    /// User or organization whose repositories to list.
    owner: String,

    /// Personal access token for authenticated requests.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Override the GitHub API base URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Bypass the cache and issue a fresh request.
    #[arg(long)]
    refresh: bool,

    /// Maximum number of repositories to print.
    #[arg(long, default_value_t = 8)]
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let store = AppStore::new();
    if let Some(token) = cli.token {
        store.auth.set_token(AuthToken::bearer(token));
        tracing::info!("authenticating with the provided token");
    }

    let mut client = GitHubClient::new(store.auth.watch())?;
    if let Some(base_url) = cli.base_url {
        client = client.with_base_url(base_url);
    }
    let service = RepoService::new(client);

    let started = Instant::now();
    let state = if cli.refresh {
        service.refetch_repos(&cli.owner).await
    } else {
        service.repos(&cli.owner).await
    };
    tracing::info!(
        owner = %cli.owner,
        elapsed_ms = started.elapsed().as_millis(),
        "first lookup settled"
    );

    let repos = match state {
        QueryState::Success(repos) => repos,
        QueryState::Error(err) => return Err(err.into()),
        _ => Vec::new(),
    };

    for repo in repos.iter().take(cli.limit) {
        let description = repo
            .description
            .as_deref()
            .unwrap_or("No description available");
        let language = repo.language.as_deref().unwrap_or("Code");
        let visibility = if repo.private { "private" } else { "public" };

        println!(
            "{:>6}*  {:<32} [{}] ({})",
            repo.stargazers_count,
            repo.display_name(),
            language,
            visibility
        );
        println!("         {}", description);
        println!("         {}", repo.html_url);
    }
    if repos.len() > cli.limit {
        println!("... and {} more", repos.len() - cli.limit);
    }

    // Same key again: resolved from the cache without a second request.
    let started = Instant::now();
    let _ = service.repos(&cli.owner).await;
    let cached = service
        .snapshot(&cli.owner)
        .map(|snapshot| !snapshot.stale)
        .unwrap_or(false);
    tracing::info!(
        elapsed_ms = started.elapsed().as_millis(),
        cached,
        "second lookup settled"
    );

    Ok(())
}
