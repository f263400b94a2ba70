mod cli;
mod repl;
mod telemetry;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use docchat_rag::ollama::OllamaClient;
use docchat_rag::{
    ChatMessage, DocChat, Document, GenerationProvider, LegalAssistant, LegalReply, chunk_text,
    extract_text,
};
use tracing::{info, warn};

use crate::cli::{Cli, Command};
use crate::repl::LineReader;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_json);

    match &cli.command {
        Command::Chunk { file } => {
            let config = cli.pipeline.rag_config(&cli.backend.model)?;
            let (filename, bytes) = read_file(file).await?;
            let text = extract_text(&bytes, &filename)?;
            let chunks = chunk_text(&text, config.chunk_size, config.chunk_overlap)?;
            println!("{}", serde_json::to_string_pretty(&chunks)?);
        }
        Command::Ask { file, question } => {
            let chat = build_chat(&cli)?;
            let doc = upload(&chat, &cli, file).await?;
            let answer = chat.ask(&doc.id, question, cli.pipeline.top_k, &cli.backend.model).await?;
            println!("{answer}");
        }
        Command::Chat { file } => {
            let chat = build_chat(&cli)?;
            let doc = upload(&chat, &cli, file).await?;
            eprintln!("Ask about '{}' (one question per line, Ctrl-D to quit).", doc.filename);

            let mut input = LineReader::new()?;
            while let Some(line) = input.next_line("> ").await? {
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                match chat.ask(&doc.id, question, cli.pipeline.top_k, &cli.backend.model).await {
                    Ok(answer) => println!("{answer}\n"),
                    Err(e) if e.is_retryable() => warn!(error = %e, "question failed, try again"),
                    Err(e) => return Err(e.into()),
                }
            }
            chat.remove(&doc.id).await?;
        }
        Command::Legal { message } => {
            let client = Arc::new(OllamaClient::new(cli.backend.ollama_config())?);
            let legal = LegalAssistant::new(client, &cli.backend.model);

            if let Some(message) = message {
                print_legal_reply(&legal.ask(message).await?);
                return Ok(());
            }

            eprintln!("Legal information chat (one message per line, Ctrl-D to quit).");
            let mut history: Vec<ChatMessage> = Vec::new();
            let mut input = LineReader::new()?;
            while let Some(line) = input.next_line("legal> ").await? {
                let message = line.trim();
                if message.is_empty() {
                    continue;
                }
                history.push(ChatMessage::user(message));
                match legal.ask_with_history(&history).await {
                    Ok(reply) => {
                        print_legal_reply(&reply);
                        history.push(ChatMessage::assistant(reply.response));
                    }
                    Err(e) if e.is_retryable() => {
                        history.pop();
                        warn!(error = %e, "message failed, try again");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Command::Models => {
            let client = OllamaClient::new(cli.backend.ollama_config())?;
            for name in client.list_models().await? {
                println!("{name}");
            }
        }
    }

    Ok(())
}

fn print_legal_reply(reply: &LegalReply) {
    println!("{}\n\n{}\n", reply.response, reply.disclaimer);
}

fn build_chat(cli: &Cli) -> Result<DocChat> {
    let client = Arc::new(OllamaClient::new(cli.backend.ollama_config())?);
    let chat = DocChat::builder()
        .config(cli.pipeline.rag_config(&cli.backend.model)?)
        .embedding_provider(client.clone())
        .generation_provider(client)
        .build()?;
    Ok(chat)
}

async fn read_file(path: &Path) -> Result<(String, Vec<u8>)> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("'{}' has no usable file name", path.display()))?
        .to_string();
    let bytes =
        tokio::fs::read(path).await.with_context(|| format!("failed to read '{}'", path.display()))?;
    Ok((filename, bytes))
}

async fn upload(chat: &DocChat, cli: &Cli, file: &Path) -> Result<Document> {
    let (filename, bytes) = read_file(file).await?;
    let doc = chat
        .upload(&cli.pipeline.user, &filename, &bytes)
        .await
        .with_context(|| format!("failed to index '{filename}'"))?;
    info!(
        document.id = %doc.id,
        filename = %doc.filename,
        chunk_count = doc.chunk_count,
        text_length = doc.text_length,
        "document ready"
    );
    Ok(doc)
}
