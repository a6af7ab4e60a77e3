use clap::Parser;
use cloud_workflow::core::deploy::PollStatus;
use cloud_workflow::core::estimator;
use cloud_workflow::core::workflow::{DeployOutcome, ToggleOutcome};
use cloud_workflow::domain::catalog;
use cloud_workflow::domain::model::WizardStep;
use cloud_workflow::domain::ports::{CloudApi, CredentialCheck, StateStore};
use cloud_workflow::utils::error::{Result, WorkflowError};
use cloud_workflow::utils::{logger, validation::Validate};
use cloud_workflow::{CliConfig, Command, FileStateStore, HttpCloudApi, Workflow, WorkflowConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI config: {:?}", cli);

    // 驗證參數
    if let Err(e) = cli.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = e.severity().exit_code();

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: CliConfig) -> Result<()> {
    let config = match &cli.config {
        Some(path) => WorkflowConfig::from_file(path)?,
        None => WorkflowConfig::default(),
    }
    .with_overrides(cli.api_base.clone(), cli.state_dir.clone());
    config.validate()?;

    let store = Arc::new(FileStateStore::new(&config.storage.state_dir));
    let api = HttpCloudApi::new(&config.api.base_url, config.request_timeout(), Arc::clone(&store))?;
    let mut workflow = Workflow::restore(api, store)?;

    match cli.command {
        Command::Providers => {
            for provider in catalog::providers() {
                println!(
                    "{:<6} {:<14} {}",
                    provider.id.as_str(),
                    provider.name,
                    provider.description
                );
            }
        }
        Command::Provider { id } => {
            workflow.select_provider(id).await?;
            let state = workflow.state();
            println!("☁️ {} selected (region {})", catalog::provider(id).name, state.form_data.region);
            if !state.connected_accounts.is_empty() {
                println!("🔗 {} connected account(s) available; see `accounts`", state.connected_accounts.len());
            }
        }
        Command::Credential { field, value } => {
            workflow.set_form_field(&field, &value)?;
            println!("✅ {} updated", field);
        }
        Command::Validate => match workflow.validate_credentials().await? {
            CredentialCheck::Valid => println!("✅ Connection successful!"),
            CredentialCheck::Invalid(reason) => println!("❌ {}", reason),
        },
        Command::Connect => {
            workflow.connect_account().await?;
            println!("✅ Account saved successfully!");
        }
        Command::Accounts => {
            let accounts = workflow.load_accounts().await?;
            if accounts.is_empty() {
                println!("No connected accounts");
            }
            for account in accounts {
                println!("{}  {}  {}", account.id, account.account_id, account.aws_region);
            }
        }
        Command::UseAccount { account } => {
            workflow.use_account(&account).await?;
            let state = workflow.state();
            println!(
                "🔗 Using account {} in {} ({} VPCs)",
                account,
                state.form_data.region,
                state.vpcs.len()
            );
        }
        Command::ClearAccount => {
            workflow.clear_account()?;
            println!("✅ Account selection cleared");
        }
        Command::Modules { search } => {
            let provider = workflow
                .state()
                .selected_provider
                .ok_or_else(|| WorkflowError::state("No provider selected"))?;
            let modules = match &search {
                Some(query) => catalog::search_modules(provider, query),
                None => catalog::modules_for(provider).iter().collect(),
            };
            for module in modules {
                let marker = if workflow.state().selected_modules.iter().any(|m| m == module.id) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{} {:<11} {:<18} from ${:<10} {}",
                    marker,
                    module.id,
                    module.name,
                    catalog::starting_price(module),
                    module.description
                );
            }
        }
        Command::Toggle { module } => match workflow.toggle_module(&module)? {
            ToggleOutcome::Selected(id) => println!("🧩 {} selected", id),
            ToggleOutcome::ManagedElsewhere { module_id, route } => {
                println!("ℹ️ {} is managed from {}", module_id, route)
            }
        },
        Command::Set { module, key, value } => {
            workflow.set_config_field(&module, &key, &value)?;
            let problems = workflow.module_problems();
            if problems.is_empty() {
                println!("✅ {} configuration complete", module);
            } else {
                println!("📝 Still needed: {}", problems.join("; "));
            }
        }
        Command::Next => {
            let step = workflow.advance().await?;
            println!("➡️ Step {}: {}", step.number(), step.name());
        }
        Command::Back => match workflow.back()? {
            Some(step) => println!("⬅️ Step {}: {}", step.number(), step.name()),
            None => println!("⬅️ Provider selection cleared"),
        },
        Command::Goto { step } => {
            let step = WizardStep::try_from(step).map_err(WorkflowError::validation)?;
            workflow.jump_to(step)?;
            println!("Step {}: {}", step.number(), step.name());
        }
        Command::Summary => {
            workflow.refresh_summary().await?;
            print_summary(&workflow);
        }
        Command::Preview => {
            workflow.refresh_summary().await?;
            println!("{}", workflow.state().iac_code);
        }
        Command::Cost => {
            workflow.refresh_summary().await?;
            let state = workflow.state();
            let costs = estimator::estimate_breakdown(
                state.selected_provider,
                &state.selected_modules,
                &state.module_config,
                &state.dynamic_pricing,
            );
            for cost in &costs {
                println!("{:<11} ${:.2}/month", cost.module_id, cost.monthly);
            }
            println!("Total       ${:.2}/month", state.estimated_cost);
        }
        Command::Deployments => {
            let deployments = workflow.load_deployments().await?;
            if deployments.is_empty() {
                println!("No deployments for this account");
            }
            for deployment in deployments {
                println!(
                    "📦 {}  [{}]  {}",
                    deployment.deployment_id,
                    deployment.modules.join(", ").to_uppercase(),
                    deployment.created_label()
                );
                for resource in &deployment.resources {
                    println!("    {}  {}", resource.resource_type, resource.label());
                }
            }
        }
        Command::Created => {
            let deployments = workflow.load_all_deployments().await?;
            if deployments.is_empty() {
                println!("No resources created yet");
            }
            for deployment in deployments {
                println!(
                    "📦 {}  ({})  [{}]  {}",
                    deployment.display_name(),
                    deployment.deployment_id,
                    deployment.modules.join(", ").to_uppercase(),
                    deployment.created_label()
                );
                for resource in &deployment.resources {
                    println!("    {}  {}", resource.resource_type, resource.label());
                }
            }
        }
        Command::Destroy { deployment_id } => {
            workflow.destroy_deployment(&deployment_id).await?;
            println!("✅ Destroyed: {}", deployment_id);
        }
        Command::Deploy { accept_terms } => {
            let mut printed = 0;
            let outcome = workflow
                .deploy(accept_terms, config.poll_settings(), |logs| {
                    for line in logs.iter().skip(printed) {
                        println!("{}", line);
                    }
                    printed = printed.max(logs.len());
                })
                .await?;

            match outcome {
                DeployOutcome::Rejected(message) => {
                    return Err(WorkflowError::BackendError {
                        endpoint: "/api/terraform/deploy".to_string(),
                        message,
                    });
                }
                DeployOutcome::Finished {
                    deployment_id,
                    status: PollStatus::Completed,
                } => println!("🎉 Deployment {} completed", deployment_id),
                DeployOutcome::Finished {
                    deployment_id,
                    status: PollStatus::Failed,
                } => {
                    return Err(WorkflowError::BackendError {
                        endpoint: format!("/api/terraform/logs/{}", deployment_id),
                        message: "Deployment reported an error; see the logs above".to_string(),
                    });
                }
                DeployOutcome::Finished {
                    deployment_id,
                    status: PollStatus::TimedOut,
                } => println!(
                    "⏱️ Stopped following {}; run `status` later to check it",
                    deployment_id
                ),
            }
        }
        Command::Status => {
            let state = workflow.state();
            println!("Route: {}", workflow.route());
            println!("Step {}: {}", state.current_step.number(), state.current_step.name());
            if let Some(id) = &state.last_deployment_id {
                let result = if state.is_created { "created" } else { "not confirmed" };
                println!("Last deployment: {} ({})", id, result);
            }
            for line in &state.deployment_logs {
                println!("{}", line);
            }
        }
        Command::Reset => {
            workflow.reset()?;
            println!("🔄 Workflow reset");
        }
        Command::Route { path } => {
            if let Some(path) = path {
                workflow.apply_route(&path)?;
            }
            println!("{}", workflow.route());
        }
    }

    Ok(())
}

fn print_summary<A: CloudApi, S: StateStore>(workflow: &Workflow<A, S>) {
    let summary = workflow.summary();
    let provider = summary
        .provider
        .map(|p| catalog::provider(p).name)
        .unwrap_or("-");

    println!("Provider: {}", provider);
    println!("Step:     {} ({})", summary.step.number(), summary.step.name());
    println!("Region:   {}", summary.region);
    if let Some(account_id) = &summary.account_id {
        println!("Account:  {}", account_id);
    }
    for (name, description) in &summary.modules {
        println!("Module:   {} - {}", name, description);
    }
    println!("Estimate: ${:.2}/month", summary.estimated_cost);
}
