use crate::server;
use application::prompt::{AGENT_NAME, EXAMPLE_QUERIES};
use application::rag_service::RagService;
use application::registration::RegistrationService;
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input};
use domain::models::{ChatResponse, RetrievedChunk, DEFAULT_TOP_K};
use infrastructure::config::Config;
use shared::confirmation::ask_confirmation;
use shared::types::Result;
use std::sync::Arc;

/// Sources shown under each interactive answer.
const SOURCES_SHOWN: usize = 3;

#[derive(Parser, Debug)]
#[command(name = "rag_agent")]
#[command(about = "Retrieval-augmented chat agent over an Azure AI Search index")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Interactive question/answer session (default)
    Chat {
        /// Number of documents to retrieve per question
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
    },
    /// Answer a single question and exit
    Ask {
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        /// Print the full response envelope as JSON
        #[arg(long)]
        json: bool,
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,
    },
    /// Serve the agent over HTTP
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create the agent definition on the AI endpoint
    RegisterAgent {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// What the user typed at the interactive prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum Turn {
    Empty,
    Quit,
    Help,
    Query(String),
}

pub fn parse_turn(input: &str) -> Turn {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Turn::Empty;
    }
    match trimmed.to_lowercase().as_str() {
        "quit" | "exit" | "q" => Turn::Quit,
        "help" => Turn::Help,
        _ => Turn::Query(trimmed.to_string()),
    }
}

pub fn format_sources(sources: &[RetrievedChunk], limit: usize) -> Vec<String> {
    sources
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, s)| format!("{}. {} (relevance: {:.4})", i + 1, s.title, s.score))
        .collect()
}

pub struct CliApp {
    config: Config,
}

impl CliApp {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&self, cli: Cli) -> Result<()> {
        match cli.command.unwrap_or(Command::Chat {
            top_k: DEFAULT_TOP_K,
        }) {
            Command::Chat { top_k } => self.handle_chat(top_k).await,
            Command::Ask { top_k, json, query } => self.handle_ask(&query.join(" "), top_k, json).await,
            Command::Serve { host, port } => self.handle_serve(host, port).await,
            Command::RegisterAgent { yes } => self.handle_register(yes).await,
        }
    }

    async fn handle_chat(&self, top_k: usize) -> Result<()> {
        let service = RagService::from_config(&self.config)?;
        print_banner();

        loop {
            let input: String = match Input::with_theme(&ColorfulTheme::default())
                .with_prompt("You")
                .allow_empty(true)
                .interact_text()
            {
                Ok(text) => text,
                // Ctrl-C / closed stdin ends the session like `quit`.
                Err(_) => break,
            };

            match parse_turn(&input) {
                Turn::Empty => continue,
                Turn::Quit => break,
                Turn::Help => print_examples(),
                Turn::Query(query) => {
                    eprintln!("{}", "Searching knowledge base...".dimmed());
                    let result = service.chat(&query, top_k).await;
                    print_answer(&result);
                }
            }
        }
        println!("\n{}", "Goodbye!".green());
        Ok(())
    }

    async fn handle_ask(&self, query: &str, top_k: usize, as_json: bool) -> Result<()> {
        let service = RagService::from_config(&self.config)?;
        let result = service.chat(query, top_k).await;
        if as_json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_answer(&result);
        }
        if let Some(err) = result.error {
            anyhow::bail!(err);
        }
        Ok(())
    }

    async fn handle_serve(&self, host: Option<String>, port: Option<u16>) -> Result<()> {
        let service = Arc::new(RagService::from_config(&self.config)?);
        let host = host.unwrap_or_else(|| self.config.server_host.clone());
        let port = port.unwrap_or(self.config.server_port);
        tracing::info!("Starting {} server...", AGENT_NAME);
        server::serve(service, &format!("{host}:{port}")).await
    }

    async fn handle_register(&self, assume_yes: bool) -> Result<()> {
        let registration = RegistrationService::from_config(&self.config)?;
        let definition = registration.definition();
        println!("{} {}", "Creating agent:".green(), definition.name);
        println!("   Endpoint: {}", registration.target_url());
        println!("   Model: {}", definition.model);

        if !ask_confirmation("Create this agent?", true, assume_yes)? {
            println!("{}", "Registration cancelled.".yellow());
            return Ok(());
        }

        let created = registration.register().await?;
        println!("\n{}", "Agent created successfully!".green().bold());
        println!("   Agent ID: {}", created.id);
        println!("   Agent Name: {}", created.name.as_deref().unwrap_or(&definition.name));
        println!("   Model: {}", created.model.as_deref().unwrap_or(&definition.model));
        println!("\n{}", "Next step: add the Azure AI Search tool in the portal:".blue());
        println!("   1. Open the agent '{}'", definition.name);
        println!("   2. Go to the 'Tools' section");
        println!("   3. Add the 'Azure AI Search' tool");
        println!("   4. Select index: {}", self.config.search_index);
        Ok(())
    }
}

fn print_banner() {
    let rule = "=".repeat(70);
    println!("\n{rule}");
    println!("{}", format!("{AGENT_NAME} - Interactive Mode").bold());
    println!("{rule}");
    println!("\nAsk questions about the indexed videos, audio, images and PDF documents.");
    println!("Type 'quit' or 'exit' to end the session.");
    println!("Type 'help' for example queries.");
    println!("{}", "-".repeat(70));
}

fn print_examples() {
    println!("\n{}", "Example queries you can try:".blue());
    for (i, q) in EXAMPLE_QUERIES.iter().enumerate() {
        println!("   {}. {}", i + 1, q);
    }
}

fn print_answer(result: &ChatResponse) {
    if result.is_error() {
        println!("\n{} {}", "Agent:".red().bold(), result.response);
        return;
    }
    println!("\n{} {}", "Agent:".green().bold(), result.response);
    if !result.sources.is_empty() {
        println!("\n{}", "Sources:".blue());
        for line in format_sources(&result.sources, SOURCES_SHOWN) {
            println!("   {line}");
        }
    }
}
