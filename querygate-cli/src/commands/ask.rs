use querygate_core::formatter::{format_history, format_outcome};
use querygate_core::{ConversationSession, QueryGateway};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{cli::OutputFormat, error::CliError};

/// Answer one question and exit
pub async fn ask(
    gateway: &QueryGateway,
    session: &ConversationSession,
    question: &str,
    format: OutputFormat,
) -> Result<(), CliError> {
    let outcome = gateway.generate_and_execute(session, question).await?;
    match format {
        OutputFormat::Text => print!("{}", format_outcome(&outcome)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }
    Ok(())
}

/// Line-oriented chat loop.
///
/// Failed questions are reported and the loop continues; only a configuration refusal
/// ends the session.
pub async fn chat(gateway: &QueryGateway, session: &ConversationSession) -> Result<(), CliError> {
    let status = gateway.configuration_status();
    if !status.configured {
        return Err(querygate_core::GatewayError::configuration(status.missing_fields).into());
    }

    println!("querygate chat ({}). Commands: :clear, :history, :schema, :quit", gateway.backend_name());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match ChatInput::parse(input) {
            ChatInput::Empty => continue,
            ChatInput::Quit => break,
            ChatInput::Clear => {
                gateway.clear_session(session);
                println!("Conversation cleared.");
            }
            ChatInput::History => println!("{}", format_history(&session.history())),
            ChatInput::Schema => println!("{}", gateway.schema_description().await?),
            ChatInput::Unknown(cmd) => println!("Unknown command: {}", cmd),
            ChatInput::Question(question) => {
                match gateway.generate_and_execute(session, question).await {
                    Ok(outcome) => print!("{}", format_outcome(&outcome)),
                    Err(err) if err.is_recoverable() => println!("{}", err),
                    Err(err) => return Err(err.into()),
                }
            }
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Empty,
    Quit,
    Clear,
    History,
    Schema,
    Unknown(&'a str),
    Question(&'a str),
}

impl<'a> ChatInput<'a> {
    fn parse(input: &'a str) -> Self {
        match input {
            "" => ChatInput::Empty,
            ":quit" | ":q" | ":exit" => ChatInput::Quit,
            ":clear" => ChatInput::Clear,
            ":history" => ChatInput::History,
            ":schema" => ChatInput::Schema,
            cmd if cmd.starts_with(':') => ChatInput::Unknown(cmd),
            question => ChatInput::Question(question),
        }
    }
}
