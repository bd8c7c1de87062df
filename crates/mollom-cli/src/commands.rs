//! Argument parsing and command execution.

use std::{
    io::{Write, stdout},
    path::PathBuf,
};

use clap::{Parser, Subcommand, ValueEnum};
use mollom_client::{
    Mollom, MollomConfig, MollomRest, TransportKind,
    config::{PRIVATE_KEY_VAR, PUBLIC_KEY_VAR},
    rest::{content::ContentRequest, feedback::FeedbackTarget},
    rpc::types::{CaptchaKind, ContentSubmission, Reason, StatisticsType},
};
use serde::Serialize;
use serde_json::json;

use crate::error::CliError;

/// Mollom content moderation client
#[derive(Parser, Debug)]
#[command(name = "mollom")]
#[command(about = "Check content, serve CAPTCHAs and manage sites with Mollom")]
#[command(version)]
pub struct Args {
    /// Configuration file. Without one, keys are read from
    /// MOLLOM_PUBLIC_KEY and MOLLOM_PRIVATE_KEY.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use the REST API regardless of the configured transport
    #[arg(long)]
    pub rest: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the configured keys are valid
    VerifyKey,

    /// Show the server list
    Servers {
        /// Fetch a new list even if the cached one is fresh
        #[arg(long)]
        refresh: bool,
    },

    /// Check content for spam
    Check(CheckArgs),

    /// Request a CAPTCHA
    Captcha {
        /// Audio instead of image
        #[arg(long)]
        audio: bool,

        /// Session id (XML-RPC) or content id (REST) to tie the CAPTCHA to
        #[arg(long)]
        session: Option<String>,

        /// Author IP (XML-RPC only)
        #[arg(long)]
        author_ip: Option<String>,
    },

    /// Submit a CAPTCHA solution
    Solve {
        /// Session id (XML-RPC) or CAPTCHA id (REST)
        id: String,

        /// The author's answer
        solution: String,
    },

    /// Report checked content as unwanted
    Feedback {
        /// Session id (XML-RPC) or content id (REST)
        id: String,

        /// Why the content is unwanted
        #[arg(value_enum)]
        reason: ReasonArg,
    },

    /// Read usage counters (XML-RPC only)
    Stats {
        /// Counter to read; all counters if omitted
        #[arg(value_parser = clap::value_parser!(StatisticsType))]
        kind: Option<StatisticsType>,
    },

    /// Guess the language of a text (XML-RPC only)
    Language {
        /// Text to analyse
        text: String,
    },

    /// List sites managed by these keys (REST only)
    Sites {
        /// First site to list
        #[arg(long, default_value = "0")]
        offset: u64,

        /// Page size
        #[arg(long)]
        count: Option<u64>,
    },
}

/// Content fields for `check`.
#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Post title
    #[arg(long)]
    title: Option<String>,

    /// Post body
    #[arg(long)]
    body: Option<String>,

    /// Author display name
    #[arg(long)]
    author_name: Option<String>,

    /// Author email
    #[arg(long)]
    author_mail: Option<String>,

    /// Author website
    #[arg(long)]
    author_url: Option<String>,

    /// Author IP address
    #[arg(long)]
    author_ip: Option<String>,
}

/// Feedback reasons.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ReasonArg {
    /// Spam
    Spam,
    /// Profanity
    Profanity,
    /// Low quality
    LowQuality,
    /// Unwanted for another reason
    Unwanted,
}

impl From<ReasonArg> for Reason {
    fn from(arg: ReasonArg) -> Self {
        match arg {
            ReasonArg::Spam => Self::Spam,
            ReasonArg::Profanity => Self::Profanity,
            ReasonArg::LowQuality => Self::LowQuality,
            ReasonArg::Unwanted => Self::Unwanted,
        }
    }
}

enum Client {
    Rpc(Mollom),
    Rest(MollomRest),
}

/// Load configuration from `--config`, or from the environment without one.
pub fn load_config(args: &Args) -> Result<MollomConfig, CliError> {
    let lookup = |name: &str| std::env::var(name).ok();
    load_config_with(args, lookup)
}

fn load_config_with(
    args: &Args,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<MollomConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => MollomConfig::load(path)?,
        None => {
            tracing::debug!("no config file, reading {PUBLIC_KEY_VAR} and {PRIVATE_KEY_VAR}");
            let mut config = MollomConfig::with_keys("", "");
            config.apply_overrides(lookup);
            config
        },
    };
    if args.rest {
        config.general.transport = TransportKind::Rest;
    }
    config.validate()?;
    Ok(config)
}

fn client(config: &MollomConfig) -> Result<Client, CliError> {
    Ok(match config.general.transport {
        TransportKind::XmlRpc => Client::Rpc(Mollom::from_config(config)?),
        TransportKind::Rest => Client::Rest(MollomRest::from_config(config)?),
    })
}

fn emit<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let mut out = stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn rpc_only(command: &'static str) -> CliError {
    CliError::Unsupported { command, transport: "XML-RPC" }
}

/// Run the parsed command.
pub fn run(args: &Args) -> Result<(), CliError> {
    let config = load_config(args)?;
    let client = client(&config)?;
    tracing::info!(transport = ?config.general.transport, server = config.server(), "client ready");

    match (&args.command, &client) {
        (Command::VerifyKey, Client::Rpc(mollom)) => {
            emit(&json!({ "valid": mollom.verify_key()? }))
        },
        (Command::VerifyKey, Client::Rest(rest)) => {
            let site = rest.read_site(rest.public_key())?;
            emit(&json!({ "valid": true, "site": site.url }))
        },

        (Command::Servers { refresh }, client) => {
            let resolved = match client {
                Client::Rpc(mollom) => mollom.server_list(*refresh),
                Client::Rest(rest) => rest.dispatcher().servers(*refresh),
            };
            let source = format!("{:?}", resolved.source);
            emit(&json!({ "servers": resolved.servers, "source": source }))
        },

        (Command::Check(check), Client::Rpc(mollom)) => {
            let submission = ContentSubmission {
                post_title: check.title.clone(),
                post_body: check.body.clone(),
                author_name: check.author_name.clone(),
                author_url: check.author_url.clone(),
                author_mail: check.author_mail.clone(),
                author_ip: check.author_ip.clone(),
                ..ContentSubmission::default()
            };
            emit(&mollom.check_content(&submission)?)
        },
        (Command::Check(check), Client::Rest(rest)) => {
            let request = ContentRequest {
                post_title: check.title.clone(),
                post_body: check.body.clone(),
                author_name: check.author_name.clone(),
                author_url: check.author_url.clone(),
                author_mail: check.author_mail.clone(),
                author_ip: check.author_ip.clone(),
                ..ContentRequest::default()
            };
            emit(&rest.check_content(&request)?)
        },

        (Command::Captcha { audio, session, author_ip }, client) => {
            let kind = if *audio { CaptchaKind::Audio } else { CaptchaKind::Image };
            match client {
                Client::Rpc(mollom) => {
                    emit(&mollom.captcha(kind, session.as_deref(), author_ip.as_deref())?)
                },
                Client::Rest(rest) => emit(&rest.create_captcha(kind, session.as_deref())?),
            }
        },

        (Command::Solve { id, solution }, Client::Rpc(mollom)) => {
            emit(&json!({ "solved": mollom.check_captcha(id, solution)? }))
        },
        (Command::Solve { id, solution }, Client::Rest(rest)) => {
            emit(&rest.verify_captcha(id, solution)?)
        },

        (Command::Feedback { id, reason }, Client::Rpc(mollom)) => {
            emit(&json!({ "accepted": mollom.send_feedback(id, (*reason).into())? }))
        },
        (Command::Feedback { id, reason }, Client::Rest(rest)) => {
            rest.send_feedback(&FeedbackTarget::content(id.as_str()), (*reason).into())?;
            emit(&json!({ "accepted": true }))
        },

        (Command::Stats { kind }, Client::Rpc(mollom)) => {
            let kinds = kind.map_or_else(|| StatisticsType::ALL.to_vec(), |k| vec![k]);
            let mut counters = serde_json::Map::new();
            for kind in kinds {
                counters.insert(kind.to_string(), json!(mollom.statistics(kind)?));
            }
            emit(&counters)
        },
        (Command::Stats { .. }, Client::Rest(_)) => Err(rpc_only("stats")),

        (Command::Language { text }, Client::Rpc(mollom)) => emit(&mollom.detect_language(text)?),
        (Command::Language { .. }, Client::Rest(_)) => Err(rpc_only("language")),

        (Command::Sites { offset, count }, Client::Rest(rest)) => {
            let page = rest.list_sites(*offset, *count)?;
            emit(&json!({
                "sites": page.items,
                "offset": page.offset,
                "total": page.total,
                "more": page.has_more(),
            }))
        },
        (Command::Sites { .. }, Client::Rpc(_)) => {
            Err(CliError::Unsupported { command: "sites", transport: "REST" })
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    fn keys(name: &str) -> Option<String> {
        match name {
            PUBLIC_KEY_VAR => Some("env-pub".to_string()),
            PRIVATE_KEY_VAR => Some("env-priv".to_string()),
            _ => None,
        }
    }

    #[test]
    fn parses_check_fields() {
        let args = parse(&["mollom", "check", "--body", "hi", "--author-ip", "10.0.0.1"]);

        let Command::Check(check) = args.command else { panic!("expected check") };
        assert_eq!(check.body.as_deref(), Some("hi"));
        assert_eq!(check.author_ip.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn parses_statistics_type() {
        let args = parse(&["mollom", "stats", "today_accepted"]);
        assert!(matches!(
            args.command,
            Command::Stats { kind: Some(StatisticsType::TodayAccepted) }
        ));

        assert!(Args::try_parse_from(["mollom", "stats", "bogus"]).is_err());
    }

    #[test]
    fn parses_feedback_reason() {
        let args = parse(&["mollom", "feedback", "s-1", "low-quality"]);

        let Command::Feedback { reason, .. } = args.command else { panic!("expected feedback") };
        assert_eq!(Reason::from(reason), Reason::LowQuality);
    }

    #[test]
    fn keys_come_from_environment_without_config() {
        let args = parse(&["mollom", "--rest", "servers"]);

        let config = load_config_with(&args, keys).unwrap();

        assert_eq!(config.authentication.public_key, "env-pub");
        assert_eq!(config.general.transport, TransportKind::Rest);
    }

    #[test]
    fn missing_keys_are_a_config_error() {
        let args = parse(&["mollom", "verify-key"]);

        let err = load_config_with(&args, |_| None).unwrap_err();

        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn rest_flag_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let toml = "[authentication]\npublic_key = \"pub\"\nprivate_key = \"priv\"\n";
        file.write_all(toml.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let args = parse(&["mollom", "--config", &path, "--rest", "sites"]);

        let config = load_config_with(&args, |_| None).unwrap();

        assert_eq!(config.general.transport, TransportKind::Rest);
        assert_eq!(config.server(), mollom_client::config::DEFAULT_REST_SERVER);
    }
}
