//! Application commands

use clap::Subcommand;
use serde_json::Value;
use tabled::Tabled;

use crate::cli::context::Context;
use crate::cli::output;
use crate::errors::CasperError;
use crate::http::{AppFilter, Apps, ListQuery, ResourceKind};
use crate::models::Resource;

/// Application subcommands
#[derive(Subcommand)]
pub enum AppCommands {
    /// List the applications
    Ls {
        /// Number of applications to fetch (defaults to the profile page size)
        #[arg(long)]
        nb: Option<u32>,

        /// Page to fetch
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Filter by name (regex usage possible)
        #[arg(long)]
        name: Option<String>,

        /// Filter by environment
        #[arg(long)]
        env: Option<String>,

        /// Filter by role
        #[arg(long)]
        role: Option<String>,
    },

    /// Show the details of an application
    Show {
        /// Application ID
        app_id: String,
    },
}

/// Table row for application display
#[derive(Debug, Tabled)]
pub struct AppRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Environment")]
    pub env: String,
    #[tabled(rename = "Role")]
    pub role: String,
    /// Blue/green color and online state, empty without blue/green
    #[tabled(rename = "Color")]
    pub color: String,
}

impl From<&Resource> for AppRow {
    fn from(app: &Resource) -> Self {
        let field = |key: &str| app.str_field(key).unwrap_or_default().to_string();
        let blue_green = app.get("blue_green");
        let enabled = blue_green
            .and_then(|bg| bg.get("enable_blue_green"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let color = match blue_green {
            Some(bg) if enabled => format!(
                "{} ({})",
                bg.get("color").and_then(Value::as_str).unwrap_or_default(),
                if bg.get("is_online").and_then(Value::as_bool).unwrap_or(false) {
                    "Online"
                } else {
                    "Offline"
                }
            ),
            _ => String::new(),
        };

        Self {
            id: app.id().unwrap_or_default().to_string(),
            name: field("name"),
            env: field("env"),
            role: field("role"),
            color,
        }
    }
}

/// Execute an application command
pub async fn execute(command: AppCommands, ctx: &Context) -> Result<(), CasperError> {
    match command {
        AppCommands::Ls {
            nb,
            page,
            name,
            env,
            role,
        } => {
            let query = ListQuery::new(nb.unwrap_or(ctx.settings.page_size), page);
            let filter = AppFilter { name, env, role };
            let apps = ctx.apps.list(&query, &filter).await?;
            let rows: Vec<AppRow> = apps.items.iter().map(AppRow::from).collect();
            output::print_page(&apps, Apps::NOUN, rows, ctx.output)
        }

        AppCommands::Show { app_id } => {
            let app = ctx.apps.retrieve(&app_id).await?;
            output::print_single(&app, ctx.output)
        }
    }
}
