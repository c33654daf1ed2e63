use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::ArgMatches;
use podium_domain::feed::{FeedScope, FeedSynchronizer, FeedView};
use podium_domain::identity::IdentityService;
use podium_domain::leaderboard::Leaderboard;
use podium_domain::ports::identity::IdentityStore;
use podium_domain::ports::notify::Notifier;
use podium_domain::questions::Question;
use podium_domain::sessions::{SessionAdmin, SessionOverview};
use podium_domain::submit::QuestionSubmission;
use podium_domain::vote::VoteCoordinator;
use podium_infra::api_client::ApiClient;
use podium_infra::config::AppConfig;
use podium_infra::notify::TracingNotifier;
use podium_infra::store::FileIdentityStore;
use time::format_description::well_known::Rfc3339;
use tracing::info;

struct Wiring {
    api: Arc<ApiClient>,
    store: Arc<dyn IdentityStore>,
    notifier: Arc<dyn Notifier>,
}

fn wire(config: &AppConfig) -> Wiring {
    Wiring {
        api: Arc::new(ApiClient::from_config(config)),
        store: Arc::new(FileIdentityStore::new(&config.state_dir)),
        notifier: Arc::new(TracingNotifier),
    }
}

impl Wiring {
    fn feed(&self, config: &AppConfig, scope: FeedScope) -> Arc<FeedSynchronizer> {
        Arc::new(FeedSynchronizer::new(
            self.api.clone(),
            self.store.clone(),
            self.notifier.clone(),
            scope,
            Duration::from_millis(config.highlight_window_ms.max(1)),
        ))
    }
}

pub async fn dispatch(config: &AppConfig, matches: &ArgMatches) -> Result<()> {
    let wiring = wire(config);
    match matches.subcommand() {
        Some(("login", sub)) => login(&wiring, sub),
        Some(("ask", sub)) => ask(config, &wiring, sub).await,
        Some(("vote", sub)) => vote(config, &wiring, sub).await,
        Some(("feed", sub)) => feed(config, &wiring, sub).await,
        Some(("top", sub)) => top(config, &wiring, sub).await,
        Some(("mine", _)) => mine(config, &wiring).await,
        Some(("admin", sub)) => admin(&wiring, sub).await,
        _ => unreachable!("subcommand is required"),
    }
}

fn login(wiring: &Wiring, matches: &ArgMatches) -> Result<()> {
    let name = matches.get_one::<String>("name").expect("required arg");
    let phone = matches.get_one::<String>("phone").expect("required arg");

    let identity = IdentityService::new(wiring.store.clone()).sign_in(name, phone)?;
    println!("Signed in as {}.", identity.name);
    Ok(())
}

async fn ask(config: &AppConfig, wiring: &Wiring, matches: &ArgMatches) -> Result<()> {
    let text = matches.get_one::<String>("text").expect("required arg");

    let feed = wiring.feed(config, FeedScope::AllQuestions);
    let submission =
        QuestionSubmission::new(wiring.api.clone(), wiring.store.clone(), feed.clone());
    let created = submission.submit(text).await?;
    println!("Your question has been added! (#{})", created.id);
    Ok(())
}

async fn vote(config: &AppConfig, wiring: &Wiring, matches: &ArgMatches) -> Result<()> {
    let id = *matches.get_one::<i64>("id").expect("required arg");

    let feed = wiring.feed(config, FeedScope::AllQuestions);
    // Best effort: a failed poll only weakens the authorship pre-check, the
    // server still decides.
    let _ = feed.poll().await;

    let coordinator =
        VoteCoordinator::new(wiring.api.clone(), wiring.store.clone(), feed.clone());
    coordinator.vote(id).await?;

    match feed.question(id) {
        Some(question) => println!(
            "Vote recorded for #{} ({} votes).",
            question.id, question.vote_count
        ),
        None => println!("Vote recorded for #{id}."),
    }
    Ok(())
}

async fn feed(config: &AppConfig, wiring: &Wiring, matches: &ArgMatches) -> Result<()> {
    let scope = if matches.get_flag("live") {
        FeedScope::RunningSession
    } else {
        FeedScope::AllQuestions
    };
    let filter = matches.get_one::<String>("filter").cloned();

    let feed = wiring.feed(config, scope);
    let mut ticker =
        tokio::time::interval(Duration::from_millis(config.poll_interval_ms.max(1)));
    info!("watching feed, ctrl-c to stop");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                if let Ok(view) = feed.poll().await {
                    render_feed(&view, &feed.highlighted(), filter.as_deref());
                }
            }
        }
    }
    Ok(())
}

async fn top(config: &AppConfig, wiring: &Wiring, matches: &ArgMatches) -> Result<()> {
    let leaderboard = Leaderboard::new(wiring.api.clone());

    if !matches.get_flag("watch") {
        render_top(&leaderboard.top().await?);
        return Ok(());
    }

    let mut ticker =
        tokio::time::interval(Duration::from_millis(config.poll_interval_ms.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                match leaderboard.top().await {
                    Ok(questions) => render_top(&questions),
                    Err(err) => info!(error = %err, "leaderboard refresh failed"),
                }
            }
        }
    }
    Ok(())
}

async fn mine(config: &AppConfig, wiring: &Wiring) -> Result<()> {
    let feed = wiring.feed(config, FeedScope::AllQuestions);
    let view = feed.poll().await?;

    if view.mine.is_empty() {
        println!("No questions yet.");
        return Ok(());
    }
    for question in &view.mine {
        let created = question
            .created_at
            .and_then(|at| at.format(&Rfc3339).ok())
            .unwrap_or_default();
        println!(
            "[{:>3}] #{} {} {}",
            question.vote_count, question.id, question.question_text, created
        );
    }
    Ok(())
}

async fn admin(wiring: &Wiring, matches: &ArgMatches) -> Result<()> {
    let admin = SessionAdmin::new(wiring.api.clone());
    let overview = match matches.subcommand() {
        Some(("sessions", _)) => admin.overview().await?,
        Some(("toggle", sub)) => {
            let id = *sub.get_one::<i64>("id").expect("required arg");
            let overview = admin.toggle_questions(id).await?;
            println!("Toggled questions for session #{id}.");
            overview
        }
        Some(("refresh", sub)) => {
            let id = *sub.get_one::<i64>("id").expect("required arg");
            let overview = admin.refresh_running(id).await?;
            println!("Session #{id} refreshed.");
            overview
        }
        _ => unreachable!("subcommand is required"),
    };
    render_overview(&overview);
    Ok(())
}

fn render_feed(view: &FeedView, highlighted: &HashSet<i64>, filter: Option<&str>) {
    let view = match filter {
        Some(term) => view.filtered(term),
        None => view.clone(),
    };

    println!();
    if let Some(title) = &view.session_title {
        println!("== {title} ==");
    }
    if view.unvoted.is_empty() && view.voted.is_empty() {
        println!("(no questions)");
    }
    for question in &view.unvoted {
        println!("{}", feed_line(question, highlighted, ""));
    }
    for question in &view.voted {
        println!("{}", feed_line(question, highlighted, " (voted)"));
    }
    if !view.mine.is_empty() {
        println!("your questions: {}", view.mine.len());
    }
}

fn feed_line(question: &Question, highlighted: &HashSet<i64>, suffix: &str) -> String {
    let mark = if highlighted.contains(&question.id) {
        "*"
    } else {
        " "
    };
    format!(
        "{mark} [{:>3}] #{} {} ({}){suffix}",
        question.vote_count, question.id, question.question_text, question.name
    )
}

fn render_top(questions: &[Question]) {
    println!();
    if questions.is_empty() {
        println!("(no questions)");
        return;
    }
    for (rank, question) in questions.iter().enumerate() {
        println!(
            "{:>2}. [{:>3}] {} ({})",
            rank + 1,
            question.vote_count,
            question.question_text,
            question.name
        );
    }
}

fn render_overview(overview: &SessionOverview) {
    for session in &overview.sessions {
        let running = if Some(session.id) == overview.running_session_id {
            "  <- running"
        } else {
            ""
        };
        let accepting = if session.is_accepting_questions {
            "accepting questions"
        } else {
            "closed"
        };
        println!("#{} {} [{}]{}", session.id, session.title, accepting, running);
    }
    if overview.sessions.is_empty() {
        println!("(no sessions)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, vote_count: u32, text: &str) -> Question {
        Question {
            id,
            name: "Bob".to_string(),
            phone_number: "9800000000".to_string(),
            question_text: text.to_string(),
            vote_count,
            created_at: None,
        }
    }

    #[test]
    fn feed_line_marks_recent_changes() {
        let highlighted: HashSet<i64> = [7].into_iter().collect();
        let line = feed_line(&question(7, 5, "Why?"), &highlighted, "");
        assert!(line.starts_with('*'));

        let line = feed_line(&question(8, 5, "Why?"), &highlighted, " (voted)");
        assert!(line.starts_with(' '));
        assert!(line.ends_with("(voted)"));
    }
}
