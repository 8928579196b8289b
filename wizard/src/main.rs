//! Deployment Wizard - Entry Point
//!
//! Walks one marketplace agent through Configuration, Resources and Review,
//! then submits the deployment.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use anyhow::{anyhow, Context};
use colored::Colorize;
use tracing::{error, info, warn};

use deploy_wizard::cache::sessions::WizardSessions;
use deploy_wizard::chat::session::{ChatRole, ChatSession};
use deploy_wizard::deploy::fsm::{DeploymentWizard, SubmissionStatus, WizardEvent, WizardStep};
use deploy_wizard::http::client::HttpClient;
use deploy_wizard::logs::{init_logging, LogOptions};
use deploy_wizard::models::agent::AgentDetails;
use deploy_wizard::models::deployment::FieldUpdate;
use deploy_wizard::storage::layout::StorageLayout;
use deploy_wizard::storage::receipts::DeploymentReceipt;
use deploy_wizard::storage::settings::Settings;
use deploy_wizard::utils::version_info;

#[tokio::main]
async fn main() {
    let cli_args = parse_args(env::args().skip(1));

    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to render version: {e}"),
        }
        return;
    }

    let layout = cli_args
        .get("dir")
        .map(StorageLayout::new)
        .unwrap_or_default();

    let settings = match Settings::load_or_default(&layout.settings_file()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = layout.setup().await {
        eprintln!("Unable to create {}: {e}", layout.base_dir.display());
        std::process::exit(1);
    }

    let log_options = LogOptions {
        log_level: settings.log_level,
        stderr: cli_args.contains_key("verbose"),
        log_dir: Some(layout.logs_dir()),
        json_format: settings.json_logs,
    };
    let guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let code = match run(&cli_args, &layout, &settings).await {
        Ok(()) => 0,
        Err(e) => {
            error!("deploy-wizard failed: {:#}", e);
            eprintln!("{} {:#}", "error:".red().bold(), e);
            1
        }
    };

    drop(guard);
    std::process::exit(code);
}

/// Parse `--key=value` and bare `--flag` arguments
fn parse_args(args: impl Iterator<Item = String>) -> HashMap<String, String> {
    let mut cli_args = HashMap::new();
    for arg in args {
        if let Some((key, value)) = arg.split_once('=') {
            cli_args.insert(key.trim_start_matches('-').to_string(), value.to_string());
        } else if arg.starts_with("--") {
            cli_args.insert(arg.trim_start_matches('-').to_string(), "true".to_string());
        }
    }
    cli_args
}

async fn run(
    cli_args: &HashMap<String, String>,
    layout: &StorageLayout,
    settings: &Settings,
) -> anyhow::Result<()> {
    let agent_id = cli_args
        .get("agent")
        .context("missing --agent=<agent id>")?;

    let mut client = HttpClient::new(
        &settings.backend.base_url,
        Duration::from_secs(settings.backend.request_timeout_secs),
    )?;
    if let Some(token) = &settings.backend.auth_token {
        client = client.with_auth_token(token.clone());
    }

    let agent = match client.get_agent(agent_id).await {
        Ok(agent) => agent,
        Err(e) => {
            println!("{}", "Agent unavailable".red().bold());
            println!("  {}", e.user_message());
            return Err(e).context("agent lookup failed");
        }
    };

    if let Some(message) = cli_args.get("chat") {
        return chat(&client, &agent, message, settings).await;
    }

    let receipt_file = layout.receipt_file(&agent.agent_id);
    if receipt_file.exists().await && !cli_args.contains_key("redeploy") {
        let receipt = DeploymentReceipt::load(&receipt_file).await?;
        render_receipt(&receipt);
        println!("Pass --redeploy to start a new deployment.");
        return Ok(());
    }

    let mut sessions = WizardSessions::new(settings.session_capacity, settings.wizard_settings());
    let wizard = sessions.open(agent)?;

    apply_edits(wizard, cli_args);
    while wizard.state().current_step != WizardStep::Review {
        render_step(wizard);
        wizard.process(WizardEvent::Next)?;
    }
    render_step(wizard);

    if cli_args.contains_key("dry-run") {
        println!("{}", "Dry run: nothing submitted.".yellow());
        return Ok(());
    }

    println!("{}", "Deploying...".cyan());
    match wizard.submit(&client).await? {
        SubmissionStatus::Success => {
            let receipt = DeploymentReceipt::from_wizard(wizard)
                .ok_or_else(|| anyhow!("deployment succeeded without a credential"))?;
            receipt.save(&receipt_file).await?;
            render_receipt(&receipt);
            Ok(())
        }
        status => {
            let message = wizard.error().unwrap_or("Failed to deploy agent").to_string();
            println!("{} {}", "Deployment failed:".red().bold(), message);
            println!("Run the same command again to retry with this configuration.");
            Err(anyhow!("deployment ended in {:?}: {}", status, message))
        }
    }
}

/// Translate CLI flags into field edits. Rejected edits are reported and skipped.
fn apply_edits(wizard: &mut DeploymentWizard, cli_args: &HashMap<String, String>) {
    let mut updates: Vec<Result<FieldUpdate, String>> = Vec::new();

    if let Some(name) = cli_args.get("name") {
        updates.push(Ok(FieldUpdate::Name(name.clone())));
    }
    if let Some(environment) = cli_args.get("environment") {
        updates.push(environment.parse().map(FieldUpdate::Environment));
    }
    if let Some(framework) = cli_args.get("framework") {
        updates.push(Ok(FieldUpdate::Framework(framework.clone())));
    }
    if let Some(model) = cli_args.get("model") {
        updates.push(Ok(FieldUpdate::Model(model.clone())));
    }
    if cli_args.contains_key("memory") {
        updates.push(Ok(FieldUpdate::MemoryEnabled(true)));
    }
    if cli_args.contains_key("no-streaming") {
        updates.push(Ok(FieldUpdate::StreamingEnabled(false)));
    }
    if let Some(max_tokens) = cli_args.get("max-tokens") {
        updates.push(parse_integer("max-tokens", max_tokens).map(FieldUpdate::MaxTokens));
    }
    if let Some(instance) = cli_args.get("instance") {
        updates.push(instance.parse().map(FieldUpdate::InstanceType));
    }
    if let Some(region) = cli_args.get("region") {
        updates.push(Ok(FieldUpdate::Region(region.clone())));
    }
    if let Some(replicas) = cli_args.get("replicas") {
        updates.push(parse_integer("replicas", replicas).map(FieldUpdate::Replicas));
    }

    for update in updates {
        let result = update.and_then(|u| wizard.update_field(u).map_err(|e| e.user_message()));
        if let Err(message) = result {
            warn!("Edit rejected: {}", message);
            println!("{} {}", "rejected:".yellow(), message);
        }
    }
}

fn parse_integer(field: &str, value: &str) -> Result<i64, String> {
    value
        .parse()
        .map_err(|_| format!("{} must be an integer (got {})", field, value))
}

fn render_step(wizard: &DeploymentWizard) {
    let step = wizard.state().current_step;
    let config = wizard.config();
    println!();
    println!(
        "{} {}",
        format!("Step {}/3", step.number()).as_str().bold(),
        step.to_string().as_str().cyan()
    );
    match step {
        WizardStep::Configuration => {
            println!("  name          {}", config.name());
            println!("  environment   {}", config.environment());
            println!("  framework     {}", config.framework());
            println!("  model         {}", config.model());
            println!("  memory        {}", config.memory_enabled());
            println!("  streaming     {}", config.streaming_enabled());
            println!("  max tokens    {}", config.max_tokens());
        }
        WizardStep::Resources => {
            println!("  instance      {}", config.instance_type());
            println!("  region        {}", config.region());
            println!("  replicas      {}", config.replicas());
        }
        WizardStep::Review => {
            println!("  agent         {}", wizard.agent().name);
            println!(
                "  deployment    {} ({}, {})",
                config.name(),
                config.environment(),
                config.region()
            );
            println!(
                "  runtime       {} on {} x{}",
                config.model(),
                config.instance_type(),
                config.replicas()
            );
        }
    }
}

fn render_receipt(receipt: &DeploymentReceipt) {
    println!();
    println!("{}", "Agent deployed".green().bold());
    println!("  deployment    {}", receipt.name);
    println!("  region        {}", receipt.region);
    println!("  deployed at   {}", receipt.deployed_at.to_rfc3339());
    println!("  api key       {}", receipt.api_key.bold());
}

async fn chat(
    client: &HttpClient,
    agent: &AgentDetails,
    message: &str,
    settings: &Settings,
) -> anyhow::Result<()> {
    let mut session = ChatSession::new(
        agent.agent_id.clone(),
        Duration::from_secs(settings.backend.request_timeout_secs),
    );
    session.send(client, message).await?;
    info!("Chat with {} finished", agent.agent_id);

    for line in session.messages() {
        let who = match line.role {
            ChatRole::User => "you".blue().bold(),
            ChatRole::Agent => agent.name.as_str().green().bold(),
            ChatRole::System => "error".red().bold(),
        };
        println!("{} {}", who, line.content);
    }
    Ok(())
}
