// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `yui shell` command implementation.
//!
//! Interactive REPL with readline history and colored output. One session
//! per invocation; the session is closed cleanly on exit.

use yui_agent::ConversationManager;
use yui_config::YuiConfig;
use yui_core::YuiError;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::info;

/// Runs the interactive REPL.
pub async fn run_shell(config: YuiConfig) -> Result<(), YuiError> {
    let provider = yui_llm::create_provider(&config.llm).inspect_err(|_| {
        eprintln!(
            "error: no usable LLM backend. Set llm.provider/llm.api_key in yui.toml \
             or the provider's API key environment variable."
        );
    })?;

    let mut rl = DefaultEditor::new()
        .map_err(|e| YuiError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "yui".bold().green());
    println!(
        "Chatting via {} -- type {} for commands.\n",
        config.llm.provider.cyan(),
        "/help".yellow()
    );

    let user_name = match rl.readline("What's your name? ") {
        Ok(line) => {
            let trimmed = line.trim().to_string();
            if trimmed.is_empty() {
                "Friend".to_string()
            } else {
                trimmed
            }
        }
        Err(_) => return Ok(()),
    };
    println!("\nNice to meet you, {}!\n", user_name.cyan());

    let mut manager = ConversationManager::new(&config, provider, &user_name).await?;
    if !manager.vector_enabled() {
        println!(
            "{}",
            "(semantic memory unavailable -- recall falls back to keyword search)".dimmed()
        );
    }
    info!(
        session_id = manager.session_id(),
        user = user_name,
        "shell session started"
    );

    let prompt = format!("{}> ", user_name.cyan());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if let Some(command) = trimmed.strip_prefix('/') {
                    if handle_command(command, &mut manager).await? {
                        break;
                    }
                    continue;
                }

                match manager.send_message(trimmed).await {
                    Ok(reply) => {
                        println!("\n{}: {reply}\n", manager.persona().name.magenta());
                    }
                    Err(e) => {
                        eprintln!("{}: {e}", "error".red());
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    manager.end().await?;
    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// Handles one slash command. Returns true when the REPL should exit.
async fn handle_command(
    command: &str,
    manager: &mut ConversationManager,
) -> Result<bool, YuiError> {
    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or_default() {
        "quit" | "exit" => return Ok(true),
        "clear" => {
            manager.clear_history().await?;
            println!("{}", "conversation cleared -- new session started".dimmed());
        }
        "switch" => match parts.next() {
            Some(name) => match manager.switch_personality(name).await {
                Ok(persona) => {
                    println!("switched to {}", persona.name.magenta());
                }
                Err(e) => {
                    eprintln!("{}: {e}", "error".red());
                    println!(
                        "available: {}",
                        yui_persona::available_personalities().join(", ")
                    );
                }
            },
            None => {
                println!("usage: /switch <personality>");
                println!(
                    "available: {}",
                    yui_persona::available_personalities().join(", ")
                );
            }
        },
        "stats" => {
            let stats = manager.stats().await?;
            println!("messages: {}", stats.total_messages);
            println!("sessions: {}", stats.total_sessions);
            println!(
                "favorite personality: {}",
                stats.favorite_personality.as_deref().unwrap_or("none")
            );
        }
        "info" => {
            println!("{}", manager.summary().await?);
        }
        "help" => {
            println!("/quit, /exit     leave the shell");
            println!("/clear           start a fresh session (history is kept)");
            println!("/switch <name>   change personality ({})",
                yui_persona::available_personalities().join(", "));
            println!("/stats           show your usage statistics");
            println!("/info            show current conversation info");
        }
        other => {
            println!("unknown command `/{other}` -- try /help");
        }
    }
    Ok(false)
}
