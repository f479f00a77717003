use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use log::info;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::aggregate::collect_runs;
use crate::auth::{credential_hint, validate_token, CredentialSource, Credentials, StoredAuth, Token};
use crate::config::{self, Config, Endpoints};
use crate::dispatch::Dispatcher;
use crate::git;
use crate::model::{Platform, Project};
use crate::output::{self, error_line, info_line, success_line};
use crate::select::read_line;
use crate::state::{AddOutcome, Registry};
use crate::workflows::{self, TriggerRequest};

#[derive(Parser)]
#[command(name = "quick_workflow")]
#[command(author, version, about = "GitHub Actions & GitLab CI monitor", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project registry file
    #[arg(long, global = true, env = "QUICK_WORKFLOW_STATE")]
    state: Option<PathBuf>,

    /// Settings file (TOML, JSON or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Track the git repository at PATH
    Add {
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Show recent runs across projects and inspect one
    Watch {
        /// Runs fetched per project
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Trigger a workflow or pipeline
    Start {
        /// Git ref to run against (GitHub)
        #[arg(short, long = "ref")]
        ref_: Option<String>,

        /// Pipeline variable, repeatable
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_variable)]
        variables: Vec<(String, String)>,
    },

    /// Show recent runs across projects
    List {
        /// Runs fetched per project
        limit: Option<usize>,

        /// Print runs as JSON instead of a listing
        #[arg(long, default_value_t = false)]
        json: bool,

        #[arg(short, long, default_value_t = false, requires = "json")]
        pretty: bool,

        /// Write the JSON to a file
        #[arg(short, long, requires = "json")]
        output: Option<PathBuf>,
    },

    /// Show tracked projects
    Projects,

    /// Stop tracking a project
    Remove { name: String },

    /// Manage stored access tokens
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Store a personal access token after validating it
    Login {
        platform: String,

        /// GitLab instance, e.g. gitlab.example.com (gitlab only)
        #[arg(long)]
        host: Option<String>,
    },

    /// Show which platforms have a token
    Status,

    /// Remove stored tokens (github, gitlab or all)
    Logout { platform: String },
}

fn parse_variable(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn known_platform(raw: &str) -> Result<Platform> {
    match Platform::from(raw.to_ascii_lowercase()) {
        Platform::Unsupported(other) => bail!("Unsupported platform: {other}"),
        platform => Ok(platform),
    }
}

/// Paths and settings shared by every command.
struct Session {
    config: Config,
    state_file: PathBuf,
    auth_file: PathBuf,
}

impl Session {
    fn stored_auth(&self) -> StoredAuth {
        StoredAuth::load_or_report(&self.auth_file, &mut io::stderr())
    }

    fn endpoints(&self, stored: &StoredAuth) -> Endpoints {
        let mut endpoints = self.config.endpoints();
        if let Some(host) = &stored.gitlab_host {
            endpoints.gitlab = config::gitlab_base_url(host);
        }
        endpoints
    }

    /// Where `auth login` validates the token. `--host` only applies to GitLab.
    fn login_base_url(
        &self,
        platform: &Platform,
        host: Option<&str>,
        stored: &StoredAuth,
    ) -> Result<String> {
        match (platform, host) {
            (Platform::GitLab, Some(host)) => Ok(config::gitlab_base_url(host)),
            (Platform::GitLab, None) => Ok(self.endpoints(stored).gitlab),
            (_, Some(_)) => bail!("--host is only supported for gitlab"),
            (_, None) => Ok(self.endpoints(stored).github),
        }
    }

    fn dispatcher(&self) -> Dispatcher {
        let stored = self.stored_auth();
        Dispatcher::new(
            self.endpoints(&stored),
            Arc::new(Credentials::from_env(&stored)),
        )
    }

    fn registry(&self) -> Result<Registry> {
        Ok(Registry::load(self.state_file.clone())?)
    }
}

impl Cli {
    fn session(&self) -> Result<Session> {
        let dir = config::config_dir()?;
        let config = Config::load(self.config.as_deref(), &dir)?;
        let state_file = match &self.state {
            Some(path) => path.clone(),
            None => config::default_state_file()?,
        };

        Ok(Session {
            config,
            state_file,
            auth_file: config::default_auth_file()?,
        })
    }

    fn execute_add(&self, ctx: &Session, path: &Path) -> Result<()> {
        let path = path
            .canonicalize()
            .with_context(|| format!("Failed to resolve path: {}", path.display()))?;

        if !git::is_git_repository(&path) {
            bail!("Not a git repository: {}", path.display());
        }

        let remote = git::remote_url(&path)?;
        let info = git::parse_remote_url(&remote)?;
        let project = Project::new(&info.owner, &info.repo, info.platform, &remote);
        let name = project.name.clone();
        let platform = project.platform.clone();

        let mut registry = ctx.registry()?;
        match registry.add(project)? {
            AddOutcome::Added => println!(
                "{}",
                success_line(format!("Added project {name} ({platform})"))
            ),
            AddOutcome::AlreadyTracked => {
                println!("{}", info_line(format!("Project {name} is already tracked")))
            }
        }
        Ok(())
    }

    fn execute_projects(&self, ctx: &Session) -> Result<()> {
        let registry = ctx.registry()?;
        if registry.projects().is_empty() {
            println!(
                "{}",
                info_line("No projects found. Use 'quick_workflow add' to add a project first.")
            );
            return Ok(());
        }

        println!("{}", output::projects_table(registry.projects()));
        Ok(())
    }

    fn execute_remove(&self, ctx: &Session, name: &str) -> Result<()> {
        let mut registry = ctx.registry()?;
        match registry.remove(name)? {
            Some(project) => println!(
                "{}",
                success_line(format!("Removed project {}", project.name))
            ),
            None => println!("{}", error_line(format!("Project not found: {name}"))),
        }
        Ok(())
    }

    async fn execute_list(
        &self,
        ctx: &Session,
        limit: Option<usize>,
        json: bool,
        pretty: bool,
        output_path: Option<&Path>,
    ) -> Result<()> {
        let registry = ctx.registry()?;
        let limit = limit.unwrap_or(ctx.config.defaults.list_limit);
        let dispatcher = ctx.dispatcher();

        if !json {
            let mut stdout = io::stdout().lock();
            workflows::list(&dispatcher, registry.projects(), limit, &mut stdout).await?;
            return Ok(());
        }

        let aggregation = collect_runs(&dispatcher, registry.projects(), limit).await;
        for failure in &aggregation.failures {
            eprintln!(
                "{}",
                error_line(format!(
                    "Failed to get workflows for {}: {}",
                    failure.project, failure.error
                ))
            );
        }

        let json_output = if pretty {
            serde_json::to_string_pretty(&aggregation.runs)?
        } else {
            serde_json::to_string(&aggregation.runs)?
        };

        if let Some(path) = output_path {
            std::fs::write(path, json_output)?;
            info!("Runs written to: {}", path.display());
        } else {
            println!("{json_output}");
        }
        Ok(())
    }

    async fn execute_watch(&self, ctx: &Session, limit: Option<usize>) -> Result<()> {
        let registry = ctx.registry()?;
        let limit = limit.unwrap_or(ctx.config.defaults.watch_limit);

        let mut stdin = io::stdin().lock();
        let mut stdout = io::stdout().lock();
        workflows::watch(
            &ctx.dispatcher(),
            registry.projects(),
            limit,
            &mut stdin,
            &mut stdout,
        )
        .await?;
        Ok(())
    }

    async fn execute_start(
        &self,
        ctx: &Session,
        ref_: Option<&str>,
        variables: &[(String, String)],
    ) -> Result<()> {
        let registry = ctx.registry()?;
        let request = TriggerRequest {
            ref_: ref_
                .map(str::to_string)
                .unwrap_or_else(|| ctx.config.defaults.trigger_ref.clone()),
            variables: variables.iter().cloned().collect::<IndexMap<_, _>>(),
        };

        let mut stdin = io::stdin().lock();
        let mut stdout = io::stdout().lock();
        workflows::start(
            &ctx.dispatcher(),
            registry.projects(),
            &request,
            &mut stdin,
            &mut stdout,
        )
        .await?;
        Ok(())
    }

    async fn execute_login(&self, ctx: &Session, platform: &str, host: Option<&str>) -> Result<()> {
        let platform = known_platform(platform)?;
        let mut stored = ctx.stored_auth();

        let base_url = ctx.login_base_url(&platform, host, &stored)?;

        let token = {
            let mut stdin = io::stdin().lock();
            let mut stdout = io::stdout().lock();
            read_line(
                &mut stdin,
                &mut stdout,
                &format!("Enter {platform} personal access token: "),
            )?
        };
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            bail!("No token entered");
        };

        validate_token(&platform, &base_url, &Token::from(token.as_str()))
            .await
            .with_context(|| format!("Token validation against {base_url} failed"))?;

        let update = match &platform {
            Platform::GitHub => StoredAuth {
                github_token: Some(token),
                ..Default::default()
            },
            _ => StoredAuth {
                gitlab_token: Some(token),
                gitlab_host: host.map(|h| h.trim_end_matches('/').to_string()),
                ..Default::default()
            },
        };
        stored.merge(update);
        stored.save(&ctx.auth_file)?;

        println!("{}", success_line(format!("Logged in to {platform}")));
        Ok(())
    }

    fn execute_auth_status(&self, ctx: &Session) -> Result<()> {
        let stored = ctx.stored_auth();
        let credentials = Credentials::from_env(&stored);
        let endpoints = ctx.endpoints(&stored);

        for (platform, base_url) in [
            (Platform::GitHub, endpoints.github),
            (Platform::GitLab, endpoints.gitlab),
        ] {
            let line = if credentials.credential(&platform).is_some() {
                success_line(format!("{platform}: token configured ({base_url})"))
            } else {
                info_line(format!(
                    "{platform}: not logged in (set {} or run 'quick_workflow auth login {platform}')",
                    credential_hint(&platform)
                ))
            };
            println!("{line}");
        }
        Ok(())
    }

    fn execute_logout(&self, ctx: &Session, platform: &str) -> Result<()> {
        let mut stored = ctx.stored_auth();
        let platforms = if platform.eq_ignore_ascii_case("all") {
            vec![Platform::GitHub, Platform::GitLab]
        } else {
            vec![known_platform(platform)?]
        };

        for p in &platforms {
            stored.clear(p);
        }
        stored.save(&ctx.auth_file)?;

        println!("{}", success_line(format!("Logged out of {platform}")));
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let ctx = self.session()?;

        match &self.command {
            Commands::Add { path } => self.execute_add(&ctx, path),
            Commands::Watch { limit } => self.execute_watch(&ctx, *limit).await,
            Commands::Start { ref_, variables } => {
                self.execute_start(&ctx, ref_.as_deref(), variables).await
            }
            Commands::List {
                limit,
                json,
                pretty,
                output: output_path,
            } => {
                self.execute_list(&ctx, *limit, *json, *pretty, output_path.as_deref())
                    .await
            }
            Commands::Projects => self.execute_projects(&ctx),
            Commands::Remove { name } => self.execute_remove(&ctx, name),
            Commands::Auth { command } => match command {
                AuthCommands::Login { platform, host } => {
                    self.execute_login(&ctx, platform, host.as_deref()).await
                }
                AuthCommands::Status => self.execute_auth_status(&ctx),
                AuthCommands::Logout { platform } => self.execute_logout(&ctx, platform),
            },
        }
    }
}
