pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
mod args {
    use crate::domain::model::ProviderId;
    use crate::utils::error::Result;
    use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
    use clap::{Parser, Subcommand};
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "cloud-workflow")]
    #[command(about = "Guided cloud provisioning: connect an account, pick a module, estimate and deploy")]
    pub struct CliConfig {
        #[arg(long, global = true, help = "TOML configuration file")]
        pub config: Option<PathBuf>,

        #[arg(long, global = true, help = "Backend base URL (overrides the config file)")]
        pub api_base: Option<String>,

        #[arg(long, global = true, help = "Directory for workflow state and session files")]
        pub state_dir: Option<String>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Emit logs as JSON")]
        pub json_logs: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// List the supported cloud providers
        Providers,
        /// Select a provider and restart at the connection step
        Provider { id: ProviderId },
        /// Set a connection form field (accessKey, secretKey, region, tenantId, ...)
        Credential { field: String, value: String },
        /// Test the entered AWS credentials
        Validate,
        /// Save the entered AWS credentials as a connected account
        Connect,
        /// List connected AWS accounts
        Accounts,
        /// Use a connected account (backend id or AWS account id)
        UseAccount { account: String },
        /// Stop using the selected account
        ClearAccount,
        /// List modules offered by the selected provider
        Modules {
            #[arg(long)]
            search: Option<String>,
        },
        /// Select a module
        Toggle { module: String },
        /// Set a module configuration field; JSON values are parsed
        Set {
            module: String,
            key: String,
            value: String,
        },
        /// Move to the next step
        Next,
        /// Move to the previous step
        Back,
        /// Jump back to an already visited step (1-5)
        Goto { step: u8 },
        /// Show the current selection and estimated cost
        Summary,
        /// Print the IaC preview
        Preview,
        /// Show the per-module cost breakdown
        Cost,
        /// List deployments of the selected account
        Deployments,
        /// List every created deployment, ECR repositories first
        Created,
        /// Destroy a deployment
        Destroy { deployment_id: String },
        /// Submit the deployment and follow its logs
        Deploy {
            #[arg(long, help = "Accept responsibility for the cost of the created resources")]
            accept_terms: bool,
        },
        /// Show the current step and last deployment logs
        Status,
        /// Clear all saved workflow state
        Reset,
        /// Print the current route, or restore state from one
        Route { path: Option<String> },
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            if let Some(api_base) = &self.api_base {
                validate_url("api_base", api_base)?;
            }
            if let Some(state_dir) = &self.state_dir {
                validate_path("state_dir", state_dir)?;
            }
            if let Command::Goto { step } = &self.command {
                validate_range("step", *step, 1, 5)?;
            }
            Ok(())
        }
    }

}

#[cfg(feature = "cli")]
pub use args::{CliConfig, Command};
