mod commands;

use clap::{Arg, ArgAction, Command, value_parser};
use podium_infra::config::AppConfig;
use podium_infra::logging::init_tracing;

const PROGRAM_NAME: &str = "podium";

const ABOUT_TEXT: &str = "Terminal client for a conference Q&A service: \
sign in with a name and phone number, ask questions, vote on other \
attendees' questions and watch the live feed.";

fn cli() -> Command {
    Command::new(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("login")
                .about("Store the name and phone number used for questions and votes")
                .arg(Arg::new("name").required(true))
                .arg(Arg::new("phone").required(true)),
        )
        .subcommand(
            Command::new("ask")
                .about("Submit a question")
                .arg(Arg::new("text").required(true)),
        )
        .subcommand(
            Command::new("vote")
                .about("Vote for a question by id")
                .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
        )
        .subcommand(
            Command::new("feed")
                .about("Watch the live question feed until interrupted")
                .arg(
                    Arg::new("live")
                        .long("live")
                        .action(ArgAction::SetTrue)
                        .help("Follow the running session's list instead of all questions"),
                )
                .arg(
                    Arg::new("filter")
                        .long("filter")
                        .value_name("TEXT")
                        .help("Only show questions whose text contains TEXT"),
                ),
        )
        .subcommand(
            Command::new("top")
                .about("Show the top-voted questions")
                .arg(
                    Arg::new("watch")
                        .long("watch")
                        .action(ArgAction::SetTrue)
                        .help("Keep refreshing until interrupted"),
                ),
        )
        .subcommand(Command::new("mine").about("List your own questions"))
        .subcommand(
            Command::new("admin")
                .about("Organizer-side session management")
                .subcommand_required(true)
                .subcommand(Command::new("sessions").about("List sessions and the running one"))
                .subcommand(
                    Command::new("toggle")
                        .about("Toggle whether a session accepts questions")
                        .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
                )
                .subcommand(
                    Command::new("refresh")
                        .about("Refresh the running session record")
                        .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
                ),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config)?;

    let matches = cli().get_matches();
    commands::dispatch(&config, &matches).await
}
