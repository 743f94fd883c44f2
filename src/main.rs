use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;

use ims_core::approval::{ApprovalStore, AuthProvider, Role};
use ims_core::config::AppConfig;
use ims_core::error::{AuthError, Error};
use ims_core::registration::{RegistrationFlow, RegistrationOutcome};
use ims_core::routing::{AddressBar, path_for, step_from_path};
use ims_core::session::Session;
use ims_core::store::{JsonFileStore, KeyValueStore};
use ims_core::wizard::{Flow, NoopNavigator, StepId, WizardController};

#[derive(Parser, Debug)]
#[command(version, about = "Operator console for the IMS sign-in store and flows")]
struct Cli {
    /// Store file; overrides IMS_STORE_PATH.
    #[arg(long)]
    store: Option<std::path::PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account through the registration flow.
    Register {
        email: String,
        password: String,
        #[arg(long, default_value = "clerk")]
        role: Role,
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "New")]
        first_name: String,
        #[arg(long, default_value = "User")]
        last_name: String,
    },
    /// Sign in with email and password.
    Login { email: String, password: String },
    /// Sign in with Google or Apple.
    Social { provider: AuthProvider, email: String },
    Logout,
    /// Show the signed-in identity.
    Whoami,
    /// List pending requests (the signed-in admin's company unless given).
    Pending {
        #[arg(long)]
        company: Option<String>,
    },
    /// Approve a pending request.
    Approve {
        email: String,
        #[arg(long)]
        company: Option<String>,
    },
    /// Deny a pending request.
    Deny {
        email: String,
        #[arg(long)]
        company: Option<String>,
    },
    /// List the flows and their steps.
    Flows,
    /// Step through a flow, printing each address.
    Walk {
        flow: Flow,
        /// Start address or step id, e.g. /forgot-password/27.1 or 27.1.
        #[arg(long)]
        at: Option<String>,
        /// Field value as key=value; repeatable.
        #[arg(long = "set")]
        fields: Vec<String>,
        /// How many times to press Next.
        #[arg(long, default_value_t = 1)]
        steps: usize,
    },
    /// List companies with members and pending requests.
    Companies,
    /// Remove everything from the store.
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(path) = cli.store {
        config.store_path = path;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let kv: Arc<dyn KeyValueStore> = Arc::new(
        JsonFileStore::open(&config.store_path)
            .with_context(|| format!("opening store at {}", config.store_path.display()))?,
    );
    let approvals = ApprovalStore::new(Arc::clone(&kv)).with_approved_role(config.approved_role);
    let session = Session::new(approvals.clone());

    match cli.command {
        Command::Register {
            email,
            password,
            role,
            company,
            first_name,
            last_name,
        } => {
            let mut flow = RegistrationFlow::new(session, None, NoopNavigator)?;
            flow.update_field("first_name", Value::from(first_name));
            flow.update_field("last_name", Value::from(last_name));
            flow.update_field("email", Value::from(email));
            flow.update_field("password", Value::from(password.clone()));
            flow.update_field("confirm_password", Value::from(password));
            flow.update_field("role", Value::from(role.to_string()));
            flow.update_field("company", Value::from(company));

            match flow.submit() {
                Ok(RegistrationOutcome::SignedIn(user)) => {
                    println!("registered and signed in as {} ({})", user.email, user.role);
                }
                Ok(RegistrationOutcome::AwaitingApproval { email, company }) => {
                    println!("registered {email}; waiting for approval at {company}");
                }
                Err(Error::Wizard(e)) => {
                    for (field, message) in e.field_errors().into_iter().flatten() {
                        eprintln!("{field}: {message}");
                    }
                    bail!("registration incomplete at step {}", flow.wizard().current());
                }
                Err(Error::Auth(e)) => bail!(e.user_message()),
                Err(e) => return Err(e.into()),
            }
        }
        Command::Login { email, password } => {
            let user = session.login(&email, &password).map_err(explain)?;
            println!("signed in as {} <{}>", user.display_name(), user.email);
        }
        Command::Social { provider, email } => {
            let user = session
                .sign_in_with_provider(provider, &email)
                .map_err(explain)?;
            println!("signed in with {provider} as {}", user.email);
        }
        Command::Logout => {
            session.logout()?;
            println!("signed out");
        }
        Command::Whoami => match session.current_user()? {
            Some(user) => println!(
                "{} <{}> role={} company={}",
                user.display_name(),
                user.email,
                user.role,
                if user.company.is_empty() { "-" } else { user.company.as_str() }
            ),
            None => println!("not signed in"),
        },
        Command::Pending { company } => {
            let pending = match company {
                Some(company) => approvals.pending_requests(&company)?,
                None => session.pending_approvals().map_err(explain)?,
            };
            if pending.is_empty() {
                println!("no pending requests");
            }
            for request in pending {
                println!("{}\t{}", request.email, request.role);
            }
        }
        Command::Approve { email, company } => {
            let member = match company {
                Some(company) => approvals.approve(&company, &email)?,
                None => session.approve_pending(&email).map_err(explain)?,
            };
            match member {
                Some(m) => println!("approved {} as {}", m.email, m.role),
                None => println!("nothing pending for {email}"),
            }
        }
        Command::Deny { email, company } => {
            let denied = match company {
                Some(company) => approvals.deny(&company, &email)?,
                None => session.deny_pending(&email).map_err(explain)?,
            };
            match denied {
                Some(request) => println!("denied {}", request.email),
                None => println!("nothing pending for {email}"),
            }
        }
        Command::Flows => {
            for flow in Flow::ALL {
                println!("{flow} (/{})", flow.base());
                for step in flow.steps() {
                    println!("  {:>5}  {}", step.id.to_string(), step.label);
                }
            }
        }
        Command::Walk {
            flow,
            at,
            fields,
            steps,
        } => walk(flow, at.as_deref(), &fields, steps)?,
        Command::Companies => {
            for company in approvals.companies()? {
                println!("{}", company.name);
                for m in &company.members {
                    println!("  member   {}\t{}", m.email, m.role);
                }
                for p in &company.pending {
                    println!("  pending  {}\t{}", p.email, p.role);
                }
            }
        }
        Command::Reset => {
            kv.clear()?;
            println!("store cleared");
        }
    }

    Ok(())
}

fn walk(flow: Flow, at: Option<&str>, fields: &[String], steps: usize) -> Result<()> {
    let start = at.and_then(|raw| {
        step_from_path(raw, flow.base()).or_else(|| raw.trim().parse::<StepId>().ok())
    });
    let mut wizard = WizardController::for_flow(flow, start, AddressBar::default())?;
    println!("{}", path_for(flow.base(), wizard.current()));

    for pair in fields {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("expected key=value, got {pair:?}");
        };
        wizard.update_field(key.trim(), Value::from(value));
    }

    for _ in 0..steps {
        match wizard.advance(&flow) {
            Ok(t) if t.moved() => println!("{}", wizard.navigator().path()),
            Ok(_) => {
                println!("last step reached");
                break;
            }
            Err(e) => {
                for (field, message) in wizard.state().errors() {
                    println!("  {field}: {message}");
                }
                bail!(e);
            }
        }
    }
    Ok(())
}

/// Swap an auth error for the line the sign-in screen would show.
fn explain(e: AuthError) -> anyhow::Error {
    match e {
        AuthError::Store(e) => e.into(),
        other => anyhow::anyhow!(other.user_message()),
    }
}
