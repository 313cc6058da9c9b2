use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use himmel::api::auth::Credentials;
use himmel::api::fictions::{FictionQuery, SortKey};
use himmel::{ClientConfig, HimmelClient};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "himmel", about = "Himmel reading platform client", version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Himmel API base URL
    #[arg(long, env = "HIMMEL_API_URL")]
    api_url: Option<String>,

    /// Data directory for config.toml and the saved session
    #[arg(long, env = "HIMMEL_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "HIMMEL_LOG")]
    log: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and save the session for later commands.
    ///
    /// Examples:
    ///   himmel signin --email lena@example.com --password secret
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and drop the saved session.
    Signout,
    /// Show the signed-in account.
    Whoami,
    /// Browse the fiction catalogue.
    ///
    /// Examples:
    ///   himmel fictions --keyword "sky castle"
    ///   himmel fictions --tag isekai --by-rating --page 2
    Fictions {
        #[arg(long)]
        keyword: Option<String>,
        /// Filter by tag; repeat for multiple tags.
        #[arg(long)]
        tag: Vec<String>,
        #[arg(long)]
        page: Option<u32>,
        /// Sort by average rating instead of recency.
        #[arg(long)]
        by_rating: bool,
    },
    /// Show one fiction's details.
    Show { id: u64 },
    /// Print a chapter's page URLs in reading order and record progress.
    Read { fiction: u64, chapter: u32 },
    /// Bookmark a fiction (or remove the bookmark).
    Bookmark {
        id: u64,
        #[arg(long)]
        remove: bool,
    },
    /// Post a comment on a fiction.
    Comment { id: u64, text: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ClientConfig::new(args.api_url, args.data_dir, args.log);
    init_tracing(&config);

    let client = build_client(&config)?;

    match args.command {
        Command::Signin { email, password } => {
            let signin = client
                .sign_in(&Credentials { email, password })
                .await
                .context("sign-in failed")?;
            if let Some(cookies) = &signin.cookies {
                save_session(&config, cookies)?;
            }
            println!(
                "signed in as {} ({})",
                signin.account.username, signin.account.role
            );
        }
        Command::Signout => {
            // Best effort server-side; the local session is dropped regardless.
            if let Err(e) = client.sign_out().await {
                eprintln!("server sign-out failed: {e}");
            }
            drop_session(&config)?;
            println!("signed out");
        }
        Command::Whoami => {
            let account = client.me().await.context("not signed in")?;
            println!("{} <{}> role={}", account.username, account.email, account.role);
            if let Some(until) = account.premium_until {
                println!("premium until {until}");
            }
        }
        Command::Fictions {
            keyword,
            tag,
            page,
            by_rating,
        } => {
            let query = FictionQuery {
                keyword,
                tags: tag,
                sort: by_rating.then_some(SortKey::Rating),
                page: page.unwrap_or(1),
            };
            let listing = client.browse_fictions(&query).await?;
            for fiction in &listing.items {
                let rating = fiction
                    .average_rating
                    .map(|r| format!("{r:.1}"))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "#{:<6} {:<40} {:>4}★  {} chapters  [{}]",
                    fiction.id,
                    fiction.title,
                    rating,
                    fiction.chapter_count,
                    fiction.tags.join(", ")
                );
            }
            println!(
                "page {}/{} ({} fictions)",
                listing.page, listing.total_pages, listing.total_items
            );
        }
        Command::Show { id } => {
            let fiction = client.fiction(id).await?;
            println!("{} by {}", fiction.title, fiction.author);
            println!("tags: {}", fiction.tags.join(", "));
            if let Some(rating) = fiction.average_rating {
                println!("rating: {rating:.1} ({} votes)", fiction.rating_count);
            }
            println!("chapters: {}", fiction.chapter_count);
            if fiction.bookmarked {
                println!("bookmarked");
            }
            println!("\n{}", fiction.synopsis);
        }
        Command::Read { fiction, chapter } => {
            let ch = client.chapter(fiction, chapter).await?;
            if let Some(title) = &ch.title {
                println!("chapter {} — {}", ch.number, title);
            } else {
                println!("chapter {}", ch.number);
            }
            for page in &ch.pages {
                println!("{page}");
            }
            let last_page = ch.pages.len() as u32;
            if let Err(e) = client.record_progress(fiction, chapter, last_page).await {
                eprintln!("failed to record reading progress: {e}");
            }
        }
        Command::Bookmark { id, remove } => {
            if remove {
                client.unbookmark_fiction(id).await?;
                println!("bookmark removed");
            } else {
                client.bookmark_fiction(id).await?;
                println!("bookmarked");
            }
        }
        Command::Comment { id, text } => {
            let comment = client.post_comment(id, &text).await?;
            println!("comment #{} posted", comment.id);
        }
    }

    Ok(())
}

fn init_tracing(config: &ClientConfig) {
    let filter = EnvFilter::try_new(&config.log).unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Build a client, seeding it with the saved session if one exists.
/// A 403 prints a notice instead of the web client's hard redirect.
fn build_client(config: &ClientConfig) -> Result<HimmelClient> {
    let client = match load_session(config) {
        Some(cookies) => HimmelClient::with_session(config, &cookies)?,
        None => HimmelClient::new(config)?,
    };
    Ok(client.on_forbidden(|| eprintln!("access denied — your account lacks the required role")))
}

// ─── Saved session ────────────────────────────────────────────────────────────

fn session_path(config: &ClientConfig) -> std::path::PathBuf {
    config.data_dir.join("session")
}

fn load_session(config: &ClientConfig) -> Option<String> {
    let line = std::fs::read_to_string(session_path(config)).ok()?;
    let line = line.trim().to_string();
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

fn save_session(config: &ClientConfig, cookies: &str) -> Result<()> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating {}", config.data_dir.display()))?;
    std::fs::write(session_path(config), cookies).context("saving session")?;
    Ok(())
}

fn drop_session(config: &ClientConfig) -> Result<()> {
    let path = session_path(config);
    if path.exists() {
        std::fs::remove_file(&path).context("removing saved session")?;
    }
    Ok(())
}
