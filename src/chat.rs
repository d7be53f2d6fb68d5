//! Terminal front ends for the session: one-shot `accobot ask` and the
//! interactive `accobot chat` loop.

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use accobot_core::models::Role;

use crate::client::HttpAnsweringService;
use crate::config::Config;
use crate::ingest;
use crate::sandbox::Sandbox;
use crate::session::SessionState;

/// A parsed line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Ask(String),
    Scan(String),
    History,
    Reset,
    Quit,
    Help,
    Empty,
}

pub fn parse_line(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ReplCommand::Ask(line.to_string());
    };
    let (command, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    match command {
        "scan" => ReplCommand::Scan(arg.trim().to_string()),
        "history" => ReplCommand::History,
        "reset" => ReplCommand::Reset,
        "quit" | "exit" => ReplCommand::Quit,
        _ => ReplCommand::Help,
    }
}

/// CLI entry point for `accobot ask`.
pub async fn run_ask(config: &Config, query: &str) -> Result<()> {
    let service = HttpAnsweringService::from_config(config)?;
    let session = SessionState::from_config(config);

    match session.submit(&service, query).await {
        Ok(turn) => {
            println!("{}", turn.assistant.text);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            std::process::exit(1);
        }
    }
}

/// CLI entry point for `accobot chat`.
pub async fn run_chat(config: &Config) -> Result<()> {
    let service = HttpAnsweringService::from_config(config)?;
    let session = SessionState::from_config(config);
    let sandbox = Sandbox::new(&config.sandbox.root);

    println!("accobot chat: ask a question, or use /scan <path>, /history, /reset, /quit");
    for message in session.messages() {
        println!("[{}] {}", message.timestamp, message.text);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_line(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Help => {
                println!("commands: /scan <path>, /history, /reset, /quit");
            }
            ReplCommand::History => {
                for message in session.messages() {
                    let who = match message.role {
                        Role::User => "you",
                        Role::Assistant => "bot",
                        Role::System => "sys",
                    };
                    println!("[{}] {}: {}", message.timestamp, who, message.text);
                }
            }
            ReplCommand::Reset => {
                session.reset();
                println!("conversation cleared");
            }
            ReplCommand::Scan(raw) => {
                let path = match sandbox.check(&raw) {
                    Ok(path) => path,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        continue;
                    }
                };
                if let Err(e) = ingest::check_directory(&path).await {
                    eprintln!("Error: {}", e);
                    continue;
                }
                let record = ingest::scan_folder(&path).await;
                let notice = session.record_scan(record);
                println!("{}", notice.text);
            }
            ReplCommand::Ask(text) => match session.submit(&service, &text).await {
                Ok(turn) => println!("{}", turn.assistant.text),
                Err(e) => eprintln!("Error: {}", e.user_message()),
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(
            parse_line("  What was Q1 revenue? "),
            ReplCommand::Ask("What was Q1 revenue?".into())
        );
    }

    #[test]
    fn slash_commands_are_recognized() {
        assert_eq!(parse_line("/scan ./test-data/q1"), ReplCommand::Scan("./test-data/q1".into()));
        assert_eq!(parse_line("/scan"), ReplCommand::Scan(String::new()));
        assert_eq!(parse_line("/history"), ReplCommand::History);
        assert_eq!(parse_line("/reset"), ReplCommand::Reset);
        assert_eq!(parse_line("/exit"), ReplCommand::Quit);
        assert_eq!(parse_line("/bogus"), ReplCommand::Help);
        assert_eq!(parse_line(""), ReplCommand::Empty);
    }
}
