use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use quizforge::prelude::*;
use tracing_subscriber::EnvFilter;

/// Multiplayer trivia server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:3001")]
    bind: String,
    /// Seconds each question stays open
    #[arg(long, default_value_t = 12)]
    question_secs: u64,
    /// Questions requested per game
    #[arg(long, default_value_t = 10)]
    question_count: usize,
    /// Minutes a finished room lingers before eviction (0 keeps rooms forever)
    #[arg(long, default_value_t = 10)]
    evict_after_mins: u64,
    /// JSON question bank; without one every room plays the fallback set
    #[arg(short, long)]
    questions: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), QuizforgeError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let bank = match &args.questions {
        Some(path) => {
            let json = tokio::fs::read_to_string(path).await?;
            let bank = QuestionBank::from_json(&json)?;
            tracing::info!(path = %path.display(), questions = bank.len(), "question bank loaded");
            bank
        }
        None => {
            tracing::warn!("no question bank given, rooms will use the fallback set");
            QuestionBank::empty()
        }
    };

    let room_config = RoomConfig {
        question_duration: Duration::from_secs(args.question_secs),
        question_count: args.question_count,
        evict_after: (args.evict_after_mins > 0)
            .then(|| Duration::from_secs(args.evict_after_mins * 60)),
        ..RoomConfig::default()
    };

    let server = QuizforgeServerBuilder::new()
        .bind(&args.bind)
        .room_config(room_config)
        .build(bank)
        .await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
