//! Operator tool for the durable checkout journal.
//!
//! Lists checkouts that still need attention, resumes one interrupted after
//! the charge succeeded, or purges terminal records past their retention.

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use clubhub::app::{self, ClubHubSettings, telemetry};
use clubhub::domain::QueryClient;
use clubhub::domain::checkout::{CheckoutId, CheckoutRecord, CheckoutStep};
use clubhub::domain::ports::NoQueryCache;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;

/// `checkout-reconcile` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "checkout-reconcile",
    about = "Inspect and repair journalled checkouts",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List in-flight and orphaned checkouts.
    List {
        /// Include granted checkouts too.
        #[arg(long)]
        all: bool,
    },
    /// Continue a checkout stopped after the charge.
    Resume {
        /// Checkout identifier as printed by `list`.
        id: CheckoutId,
    },
    /// Drop terminal checkouts older than `CHECKOUT_TTL_HOURS`.
    Purge,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    telemetry::init();
    let args = CliArgs::parse();
    // Settings come from the environment and config files only; the
    // command line belongs to clap.
    let settings = ClubHubSettings::load_from_iter([OsString::from("checkout-reconcile")])
        .map_err(|error| eyre!("failed to load settings: {error}"))?;
    check_settings(&settings, &args.command)?;

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build Tokio runtime")?;
    runtime.block_on(run(&settings, args.command))
}

/// Refuse to start without the settings `command` depends on.
fn check_settings(settings: &ClubHubSettings, command: &Command) -> Result<()> {
    if settings.checkout_journal_dir().is_none() {
        return Err(eyre!(
            "CLUBHUB_CHECKOUT_JOURNAL_DIR must name the journal to reconcile"
        ));
    }
    if matches!(command, Command::Resume { .. }) && settings.service_token().is_none() {
        return Err(eyre!("CLUBHUB_SERVICE_TOKEN must be set to resume a checkout"));
    }
    Ok(())
}

async fn run(settings: &ClubHubSettings, command: Command) -> Result<()> {
    let tokens = app::service_tokens(settings);
    let backend = Arc::new(app::rest_backend(settings, Arc::clone(&tokens))?);
    let sequencer = app::checkout(
        settings,
        backend,
        tokens,
        QueryClient::new(Arc::new(NoQueryCache)),
        Arc::new(DefaultClock),
    )?;
    let mut out = io::stdout().lock();

    match command {
        Command::List { all } => {
            let records = sequencer.all_checkouts().await?;
            for record in records.iter().filter(|record| all || needs_attention(record)) {
                writeln!(out, "{}", describe(record))?;
            }
        }
        Command::Resume { id } => {
            let receipt = sequencer
                .resume_checkout(&id)
                .await
                .with_context(|| format!("checkout {id} could not be resumed"))?;
            writeln!(
                out,
                "resumed={} payment={} amount={}",
                receipt.checkout_id, receipt.payment.id, receipt.payment.amount
            )?;
        }
        Command::Purge => {
            let purged = sequencer.purge_expired().await?;
            writeln!(out, "purged={purged}")?;
        }
    }
    Ok(())
}

fn needs_attention(record: &CheckoutRecord) -> bool {
    record.is_in_flight() || record.step == CheckoutStep::Orphaned
}

fn describe(record: &CheckoutRecord) -> String {
    format!(
        "{id}\t{step}\t{user}\t{kind}:{target}\t{amount}\t{updated}\t{error}",
        id = record.id,
        step = record.step,
        user = record.user_email,
        kind = record.target.kind(),
        target = record.target.club_id(),
        amount = record.amount,
        updated = record.updated_at.to_rfc3339(),
        error = record.last_error.as_deref().unwrap_or("-"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["checkout-reconcile", "list"], "list")]
    #[case(&["checkout-reconcile", "list", "--all"], "list")]
    #[case(&["checkout-reconcile", "purge"], "purge")]
    fn subcommands_parse(#[case] argv: &[&str], #[case] expected: &str) {
        let args = CliArgs::try_parse_from(argv).expect("arguments parse");
        let parsed = match args.command {
            Command::List { .. } => "list",
            Command::Resume { .. } => "resume",
            Command::Purge => "purge",
        };
        assert_eq!(parsed, expected);
    }

    fn settings(journal: Option<&str>, token: Option<&str>) -> ClubHubSettings {
        ClubHubSettings {
            backend_url: None,
            payment_provider_url: None,
            payment_publishable_key: None,
            request_timeout_secs: None,
            checkout_journal_dir: journal.map(str::to_owned),
            service_token: token.map(str::to_owned),
        }
    }

    fn resume() -> Command {
        Command::Resume {
            id: "00000000-0000-0000-0000-000000000001"
                .parse()
                .expect("checkout id"),
        }
    }

    #[test]
    fn resuming_needs_a_service_token() {
        let error = check_settings(&settings(Some("/var/lib/checkouts"), None), &resume())
            .expect_err("no token");

        assert!(error.to_string().contains("CLUBHUB_SERVICE_TOKEN"));
        check_settings(&settings(Some("/var/lib/checkouts"), Some("svc")), &resume())
            .expect("token present");
    }

    #[test]
    fn only_resume_needs_a_service_token() {
        check_settings(&settings(Some("/var/lib/checkouts"), None), &Command::Purge)
            .expect("purge needs no token");
        check_settings(&settings(None, Some("svc")), &Command::List { all: false })
            .expect_err("a journal is always required");
    }

    #[test]
    fn resume_requires_a_checkout_id() {
        assert!(CliArgs::try_parse_from(["checkout-reconcile", "resume"]).is_err());
        assert!(CliArgs::try_parse_from(["checkout-reconcile", "resume", "nope"]).is_err());
    }
}
