use auth0_client::auth_api::AuthApi;
use auth0_client::commands::get_user::GetUserCommand;
use auth0_client::commands::retrieve_token::RetrieveTokenCommand;
use auth0_client::domain::Domain;
use auth0_client::http::config::LogLevel;
use auth0_client::management::ManagementApi;
use auth0_client::parameters::{Commands, OutPutTokenFormat, select_credential};
use clap::Parser;
use std::error::Error;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "auth0-cli")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(http_log_level: LogLevel) {
    let level = if http_log_level > LogLevel::None {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli_command = Cli::parse();

    match cli_command.command {
        Commands::RetrieveToken {
            domain,
            client_id,
            input_auth_args,
            algorithm,
            audience,
            output_token_format,
            http_args,
        } => {
            init_tracing(http_args.http_log_level());
            let credential = select_credential(&input_auth_args, algorithm)?;
            let audience = match audience {
                Some(audience) => audience,
                None => Domain::try_from(domain.as_str())?.management_audience(),
            };
            let auth_api = AuthApi::builder(&domain, &client_id)
                .with_credential(credential)
                .with_http_config(http_args.http_config())
                .build()?;
            let token = RetrieveTokenCommand::new(auth_api).retrieve_token(&audience)?;
            match output_token_format {
                OutPutTokenFormat::Plain => {
                    println!("{}", token.access_token());
                }
                OutPutTokenFormat::Json => {
                    let output = serde_json::to_string_pretty(&token)?;
                    println!("{}", output);
                }
            }
            Ok(())
        }
        Commands::GetUser {
            domain,
            token,
            user_id,
            http_args,
        } => {
            init_tracing(http_args.http_log_level());
            let management = ManagementApi::builder(&domain)
                .with_token(&token)
                .with_http_config(http_args.http_config())
                .build()?;
            let user = GetUserCommand::new(management).get_user(&user_id)?;
            println!("{}", serde_json::to_string_pretty(&user)?);
            Ok(())
        }
    }
}
