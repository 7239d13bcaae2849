use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Debug, Args)]
pub struct TokenArgs {
    #[arg(long, help = "User id (the `sub` claim)")]
    pub user: Uuid,

    #[arg(long, help = "Tenant id the user belongs to")]
    pub tenant: Uuid,

    #[arg(long, help = "Email to embed in the token")]
    pub email: Option<String>,

    #[arg(long, help = "Lifetime in hours (defaults to JWT_EXPIRY_HOURS)")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let hours = args.hours.unwrap_or(config.security.jwt_expiry_hours);
    let claims = Claims::new(args.user, args.tenant, args.email, hours)?;
    let token = generate_jwt(&claims, &config.security.jwt_secret)?;

    match output_format {
        // Bare token so it can be captured with $(fishledger token ...)
        OutputFormat::Text => println!("{}", token),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "success": true,
                "token": token,
                "expires_at": claims.exp,
            }))?
        ),
    }
    Ok(())
}
