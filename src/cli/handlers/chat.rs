//! Interactive and one-shot chat with a local Ollama model.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use uuid::Uuid;

use crate::chat::{
    ChatEvent, ChatReply, ChatService, InMemorySessionStore, OllamaClient, ToolInvocation,
};
use crate::cli::output::{output_json, print_error, print_header, print_hint, spinner, OutputMode};
use crate::config::ChatConfig;
use crate::init::AppContext;
use crate::mcp::{ToolCategory, ToolName};

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput<'a> {
    Exit,
    Clear,
    Help,
    Empty,
    Message(&'a str),
}

impl<'a> ChatInput<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        match trimmed.to_lowercase().as_str() {
            "" => ChatInput::Empty,
            "exit" | "quit" | "q" => ChatInput::Exit,
            "clear" => ChatInput::Clear,
            "help" => ChatInput::Help,
            _ => ChatInput::Message(trimmed),
        }
    }
}

fn print_invocation(invocation: &ToolInvocation) {
    let marker = if invocation.success {
        "ok".green()
    } else {
        "failed".red()
    };
    eprintln!(
        "  {} {} ({})",
        "→".cyan(),
        invocation.name.dimmed(),
        marker
    );
}

fn print_reply(reply: &ChatReply) {
    for invocation in &reply.tool_calls {
        print_invocation(invocation);
    }
    println!("\n{}\n", reply.content);
}

fn print_help() {
    print_header("Commands");
    println!("  exit, quit, q   Leave the chat");
    println!("  clear           Forget the conversation so far");
    println!("  help            Show this help");
    for category in ToolCategory::ALL {
        print_header(category.title());
        for tool in ToolName::ALL.iter().filter(|t| t.category() == *category) {
            println!("  {}", tool.as_str());
        }
    }
    println!();
}

async fn stream_reply(service: &ChatService, session_id: &str, input: &str) -> Result<()> {
    let events = service.send_streaming(session_id, input);
    tokio::pin!(events);
    println!();
    while let Some(event) = events.next().await {
        match event? {
            ChatEvent::Delta(text) => {
                print!("{}", text);
                std::io::stdout().flush()?;
            }
            ChatEvent::ToolCall(invocation) => print_invocation(&invocation),
            ChatEvent::Done(_) => println!("\n"),
        }
    }
    Ok(())
}

async fn answer(
    service: &ChatService,
    session_id: &str,
    input: &str,
    stream: bool,
) -> Result<()> {
    if stream {
        return stream_reply(service, session_id, input).await;
    }
    let bar = spinner("Thinking");
    let reply = service.send(session_id, input).await;
    bar.finish_and_clear();
    print_reply(&reply?);
    Ok(())
}

pub async fn handle_chat(
    ctx: &AppContext,
    model: Option<String>,
    ollama_url: Option<String>,
    query: Option<&str>,
    stream: bool,
    mode: OutputMode,
) -> Result<()> {
    let config = ChatConfig::resolve(ollama_url, model, &ctx.file_config);
    let llm = OllamaClient::new(config.clone())?;

    let bar = spinner(&format!("Checking model {}", config.model));
    let ready = llm.ensure_model().await;
    bar.finish_and_clear();
    ready?;

    let store = Arc::new(InMemorySessionStore::new(config.history_limit));
    let service = ChatService::new(llm, ctx.gateway.clone(), store, config.clone());

    if let Some(question) = query {
        if stream && mode == OutputMode::Human {
            let session_id = Uuid::new_v4().to_string();
            return stream_reply(&service, &session_id, question).await;
        }
        let bar = spinner("Thinking");
        let reply = service.ask(question).await;
        bar.finish_and_clear();
        let reply = reply?;
        match mode {
            OutputMode::Json => output_json(&reply),
            OutputMode::Human => print_reply(&reply),
        }
        return Ok(());
    }

    let session_id = Uuid::new_v4().to_string();
    print_header(&format!("QRadar chat ({})", config.model));
    print_hint("Type 'help' for commands, 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "you>".bold());
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match ChatInput::parse(&line) {
            ChatInput::Empty => continue,
            ChatInput::Exit => break,
            ChatInput::Clear => {
                service.clear(&session_id).await;
                print_hint("Conversation cleared.");
            }
            ChatInput::Help => print_help(),
            ChatInput::Message(text) => {
                if let Err(e) = answer(&service, &session_id, text, stream).await {
                    print_error(&e.to_string());
                }
            }
        }
    }
    Ok(())
}
