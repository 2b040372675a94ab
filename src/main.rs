//! Binary entry point for groupgate.
//!
//! This binary provides the CLI interface for subscribers-group checks and
//! for seeding the group database.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use groupgate::cli::{
    AdminCommand, CommandOutput, CommandStatus, MembershipCommand, ValidateCommand,
    ValidateRequest,
};
use groupgate::config::GroupGateConfig;
use groupgate::observability::{self, InitOptions};
use groupgate::storage::{GroupStoreFactory, SqliteGroupStore};
use groupgate::{RealmId, UserId};

/// Exit code for requests that were refused.
const EXIT_DENIED: u8 = 2;

/// Groupgate - subscribers-group authorization checks.
#[derive(Parser)]
#[command(name = "groupgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to the group database.
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Print Prometheus metrics to stderr when the command finishes.
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Check whether a user may assign a subscribers group.
    Validate {
        /// Realm of the acting user.
        #[arg(short, long)]
        realm: Option<String>,

        /// Acting user.
        #[arg(short, long)]
        user: String,

        /// Group id or `role:<tag>`.
        #[arg(short, long)]
        group: String,

        /// Stream the group would apply to.
        #[arg(short, long, default_value = "general")]
        stream: String,

        /// Request parameter as KEY=VALUE (repeatable).
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Emit JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check whether a user belongs to a group.
    IsMember {
        /// Realm.
        #[arg(short, long)]
        realm: Option<String>,

        /// User.
        #[arg(short, long)]
        user: String,

        /// Group id or `role:<tag>`.
        #[arg(short, long)]
        group: String,
    },

    /// List the groups whose members count toward a group.
    Members {
        /// Realm.
        #[arg(short, long)]
        realm: Option<String>,

        /// Group id or `role:<tag>`.
        #[arg(short, long)]
        group: String,
    },

    /// Show the system group for a role tag.
    SystemGroup {
        /// Realm.
        #[arg(short, long)]
        realm: Option<String>,

        /// Role tag, such as `administrators`.
        #[arg(short, long)]
        tag: String,

        /// Emit JSON.
        #[arg(long)]
        json: bool,
    },

    /// Create the system groups of a realm.
    InitRealm {
        /// Realm.
        #[arg(short, long)]
        realm: Option<String>,
    },

    /// Create a custom group and print its id.
    CreateGroup {
        /// Realm.
        #[arg(short, long)]
        realm: Option<String>,

        /// Group name.
        #[arg(short, long)]
        name: String,

        /// Group description.
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Add a user to a group.
    AddMember {
        /// Realm.
        #[arg(short, long)]
        realm: Option<String>,

        /// Group id or `role:<tag>`.
        #[arg(short, long)]
        group: String,

        /// User.
        #[arg(short, long)]
        user: String,
    },

    /// Nest one group inside another.
    AddSubgroup {
        /// Realm.
        #[arg(short, long)]
        realm: Option<String>,

        /// Containing group.
        #[arg(short, long)]
        group: String,

        /// Contained group.
        #[arg(short, long)]
        subgroup: String,
    },

    /// Create or update a user profile.
    SetUser {
        /// Realm.
        #[arg(short, long)]
        realm: Option<String>,

        /// User.
        #[arg(short, long)]
        user: String,

        /// Role: owner, administrator, moderator, member or guest.
        #[arg(long)]
        role: String,

        /// Mark the user as deactivated.
        #[arg(long)]
        inactive: bool,

        /// Mark the user as not yet a full member.
        #[arg(long)]
        not_full_member: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config.with_env_overrides(),
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };
    if let Some(path) = cli.database.clone() {
        config = config.with_database_path(path);
    }

    let handle = match observability::init_from_config(
        &config.observability,
        InitOptions {
            verbose: cli.verbose,
        },
    ) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            None
        },
    };

    let result = run_command(cli.command, &config);

    if cli.print_metrics
        && let Some(metrics) = handle.as_ref().and_then(observability::ObservabilityHandle::render_metrics)
    {
        eprintln!("{metrics}");
    }

    match result {
        Ok(output) => {
            if !output.text.is_empty() {
                println!("{}", output.text);
            }
            match output.status {
                CommandStatus::Success => ExitCode::SUCCESS,
                CommandStatus::Denied => ExitCode::from(EXIT_DENIED),
            }
        },
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(
    command: Commands,
    config: &GroupGateConfig,
) -> Result<CommandOutput, Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    let realm_of = |realm: Option<String>| resolve_realm(realm, config);

    let output = match command {
        Commands::Validate {
            realm,
            user,
            group,
            stream,
            params,
            json,
        } => ValidateCommand::new(store).run(&ValidateRequest {
            realm: realm_of(realm)?,
            user: UserId::new(user),
            group,
            stream,
            params,
            json,
        })?,
        Commands::IsMember { realm, user, group } => {
            MembershipCommand::new(store).is_member(&realm_of(realm)?, &UserId::new(user), &group)?
        },
        Commands::Members { realm, group } => {
            MembershipCommand::new(store).members(&realm_of(realm)?, &group)?
        },
        Commands::SystemGroup { realm, tag, json } => {
            MembershipCommand::new(store).system_group(&realm_of(realm)?, &tag, json)?
        },
        Commands::InitRealm { realm } => AdminCommand::new(store).init_realm(&realm_of(realm)?)?,
        Commands::CreateGroup {
            realm,
            name,
            description,
        } => AdminCommand::new(store).create_group(&realm_of(realm)?, &name, &description)?,
        Commands::AddMember { realm, group, user } => {
            AdminCommand::new(store).add_member(&realm_of(realm)?, &group, &UserId::new(user))?
        },
        Commands::AddSubgroup {
            realm,
            group,
            subgroup,
        } => AdminCommand::new(store).add_subgroup(&realm_of(realm)?, &group, &subgroup)?,
        Commands::SetUser {
            realm,
            user,
            role,
            inactive,
            not_full_member,
        } => AdminCommand::new(store).set_user(
            &realm_of(realm)?,
            &UserId::new(user),
            &role,
            !inactive,
            !not_full_member,
        )?,
    };

    Ok(output)
}

/// Opens the configured group database.
fn open_store(config: &GroupGateConfig) -> Result<Arc<SqliteGroupStore>, Box<dyn std::error::Error>> {
    GroupStoreFactory::from_config(config).map_err(std::convert::Into::into)
}

/// Picks the realm from the flag, then the config default.
fn resolve_realm(
    realm: Option<String>,
    config: &GroupGateConfig,
) -> Result<RealmId, Box<dyn std::error::Error>> {
    realm
        .map(RealmId::new)
        .or_else(|| config.default_realm.clone())
        .ok_or_else(|| "no realm given; pass --realm or set default_realm".into())
}

/// Loads configuration from file or default location.
fn load_config(path: Option<&str>) -> Result<GroupGateConfig, Box<dyn std::error::Error>> {
    // If a path is provided, load from that file
    if let Some(config_path) = path {
        return GroupGateConfig::load_from_file(std::path::Path::new(config_path))
            .map_err(std::convert::Into::into);
    }

    // Environment override for config path
    if let Ok(config_path) = std::env::var("GROUPGATE_CONFIG_PATH")
        && !config_path.trim().is_empty()
    {
        return GroupGateConfig::load_from_file(std::path::Path::new(&config_path))
            .map_err(std::convert::Into::into);
    }

    // Otherwise, load from default location
    Ok(GroupGateConfig::load_default())
}
