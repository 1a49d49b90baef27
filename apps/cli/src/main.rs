use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use client_core::{
    BackendGateway, CounterDisplay, CreateOutcome, HttpGateway, LiveCounterPoller,
    origin_of, OpinionSubmissionController, PageAddress, QuestionCreationController,
    SummaryController,
};
use futures::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "opinion", about = "Ask a question, collect anonymous opinions, summarize them")]
struct Args {
    /// Origin the creation page is served from; it must not carry a path.
    #[arg(long, env = "OPINION_SERVER_URL", default_value = "http://127.0.0.1:5000")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a question and print its share and summary links.
    Create {
        question: String,
        /// Keep showing the live opinion count until interrupted.
        #[arg(long)]
        watch: bool,
        #[arg(long, env = "OPINION_POLL_INTERVAL_SECS", default_value_t = 3)]
        poll_interval_secs: u64,
    },
    /// Show the question behind a share link, and submit an opinion if one is given.
    Respond {
        page_url: String,
        opinion: Option<String>,
    },
    /// Generate the summary for a question from its summary link.
    Summary { page_url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    match args.command {
        Command::Create {
            question,
            watch,
            poll_interval_secs,
        } => {
            let interval = Duration::from_secs(poll_interval_secs.max(1));
            create(&args.server_url, &question, watch, interval).await
        }
        Command::Respond { page_url, opinion } => respond(&page_url, opinion).await,
        Command::Summary { page_url } => summary(&page_url).await,
    }
}

async fn create(server_url: &str, question: &str, watch: bool, interval: Duration) -> Result<()> {
    let origin = backend_origin(server_url)?;
    let gateway: Arc<dyn BackendGateway> = Arc::new(HttpGateway::new(origin.as_str()));
    let poller = LiveCounterPoller::with_interval(Arc::clone(&gateway), interval);
    let mut controller = QuestionCreationController::with_poller(gateway, &origin, poller)?;

    let created = match controller.create(question).await {
        CreateOutcome::Created(created) => created,
        other => bail!("{}", other.message()),
    };
    println!("Share link:   {}", created.share_link);
    println!("Summary link: {}", created.summary_link);
    if !watch {
        return Ok(());
    }

    info!(question_id = %created.question_id, ?interval, "watching opinion count");
    let mut updates = WatchStream::new(controller.counter());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            update = updates.next() => match update {
                Some(display) => print_counter(&display),
                None => break,
            },
        }
    }
    controller.stop_counter();
    Ok(())
}

/// Share links are built from the origin alone, so a path prefix would point them away from
/// the backend the requests go to.
fn backend_origin(server_url: &str) -> Result<String> {
    let url = Url::parse(server_url).with_context(|| format!("invalid server url '{server_url}'"))?;
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        bail!("server url '{server_url}' must be an origin such as http://127.0.0.1:5000");
    }
    Ok(origin_of(server_url)?)
}

fn print_counter(display: &CounterDisplay) {
    if !display.visible {
        return;
    }
    let Some(question_id) = display.question_id.as_ref() else {
        return;
    };
    let stamp = Local::now().format("%H:%M:%S");
    match display.count {
        Some(count) => println!("[{stamp}] {question_id}: {count} opinion(s)"),
        None => println!("[{stamp}] {question_id}: waiting for responses"),
    }
}

/// Page addresses are served by the same backend the page talks to.
fn gateway_for(page: &PageAddress) -> Arc<dyn BackendGateway> {
    Arc::new(HttpGateway::new(page.origin()))
}

async fn respond(page_url: &str, opinion: Option<String>) -> Result<()> {
    let page = PageAddress::parse(page_url)?;
    let controller = OpinionSubmissionController::for_page(gateway_for(&page), &page);
    println!("{}", controller.load_question().await.display_text());

    if let Some(mut draft) = opinion {
        let outcome = controller.submit(&mut draft).await;
        println!("{}", outcome.message());
    }
    Ok(())
}

async fn summary(page_url: &str) -> Result<()> {
    let page = PageAddress::parse(page_url)?;
    let controller = SummaryController::for_page(gateway_for(&page), &page);
    if let Some(question) = controller.load_question().await {
        println!("{question}");
    }

    println!("{}", controller.pending_text());
    let outcome = controller.generate().await;
    if outcome.is_error() {
        eprintln!("{}", outcome.display_text());
    } else {
        println!("{}", outcome.display_text());
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
