//! Non-interactive commands: `userdeck login`, `userdeck users 2`, etc.
//!
//! These share the token storage with the TUI, so a session started here is
//! picked up by the dashboard and vice versa.

use std::io::{self, Write};

use anyhow::{bail, Result};
use tracing::warn;

use userdeck_core::auth::{AuthService, TokenStore};
use userdeck_core::session::{LoginOutcome, SessionContext};
use userdeck_core::{ApiClient, Config};

use crate::utils::format_remaining;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    Logout,
    Status,
    Register,
    Users { page: u32 },
    Help,
}

impl Command {
    /// Parse a subcommand. `None` means "run the TUI".
    pub fn parse(args: &[String]) -> Result<Option<Self>> {
        let Some(name) = args.first() else {
            return Ok(None);
        };
        let command = match name.as_str() {
            "login" => Command::Login,
            "logout" => Command::Logout,
            "status" => Command::Status,
            "register" => Command::Register,
            "users" => {
                let page = match args.get(1) {
                    Some(raw) => match raw.parse::<u32>() {
                        Ok(page) if page >= 1 => page,
                        _ => bail!("Invalid page number: {}", raw),
                    },
                    None => 1,
                };
                Command::Users { page }
            }
            "help" | "--help" | "-h" => Command::Help,
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}

pub const USAGE: &str = "\
Usage: userdeck [PATH | COMMAND]

Without a command, opens the terminal UI at PATH (default /).

Commands:
  login            Sign in and store the session
  logout           Clear the stored session
  status           Show whether a session is active
  register         Create an account (does not sign in)
  users [PAGE]     Print a page of users as JSON
  help             Show this message";

pub async fn run(command: Command, mut config: Config) -> Result<()> {
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let store = TokenStore::open(&config.cache_dir()?)?;
    let api = ApiClient::new(config.api_base_url()?, store)?;
    let auth = AuthService::new(api).with_demo_mode(config.demo_mode);

    match command {
        Command::Login => {
            let (email, password) = prompt_credentials(&config)?;
            let mut session = SessionContext::new(auth);
            session.initialize();
            match session.login(&email, &password).await {
                LoginOutcome::Success => {
                    config.last_email = Some(email);
                    if let Err(e) = config.save() {
                        warn!(error = %e, "Failed to save config");
                    }
                    println!("Login successful!");
                    if session.auth().demo_mode() {
                        println!("(demo mode enabled)");
                    }
                }
                LoginOutcome::Failure(message) => bail!(message),
            }
        }
        Command::Logout => {
            let mut session = SessionContext::new(auth);
            session.initialize();
            session.logout();
            println!("Logged out.");
        }
        Command::Status => {
            if auth.check_validity() {
                let minutes = auth.policy().minutes_until_expiry();
                println!("Signed in. Session expires in {}.", format_remaining(minutes));
            } else {
                println!("Not signed in.");
            }
        }
        Command::Register => {
            let (email, password) = prompt_credentials(&config)?;
            let response = auth.register(&email, &password).await?;
            match response.id {
                Some(id) => println!("Registered user {}. Run `userdeck login` to sign in.", id),
                None => println!("Registered. Run `userdeck login` to sign in."),
            }
        }
        Command::Users { page } => {
            if !auth.check_validity() {
                bail!("Not signed in. Run `userdeck login` first.");
            }
            let users = auth.api().fetch_users(page).await?;
            println!("{}", serde_json::to_string_pretty(&users)?);
        }
        Command::Help => {}
    }

    Ok(())
}

fn prompt_credentials(config: &Config) -> Result<(String, String)> {
    let email = match config.last_email.as_deref() {
        Some(last) => {
            print!("Email [{}]: ", last);
            io::stdout().flush()?;
            let input = read_line()?;
            if input.is_empty() {
                last.to_string()
            } else {
                input
            }
        }
        None => {
            print!("Email: ");
            io::stdout().flush()?;
            read_line()?
        }
    };

    let password = match std::env::var(userdeck_core::config::ENV_PASSWORD) {
        Ok(password) if !password.is_empty() => password,
        _ => rpassword::prompt_password("Password: ")?,
    };

    if email.is_empty() || password.is_empty() {
        bail!("Email and password required");
    }
    Ok((email, password))
}

fn read_line() -> Result<String> {
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
