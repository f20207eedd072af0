//! a11y-contrast - WCAG contrast check for a color pair
//!
//! Usage:
//!   a11y-contrast [--large] [--json] <foreground> <background>
//!   a11y-contrast --announce <message> [--assertive] [--timeout <ms>]
//!
//! Exits non-zero when the pair fails WCAG AA, so it can gate CI on theme
//! or design-token changes. `--announce` replays an announcement against a
//! simulated document and prints the live region after each step.

use std::time::Duration;

use anyhow::{bail, Context};
use fos_a11y_runtime::sim::SimHost;
use fos_a11y_runtime::{ContrastChecker, LiveAnnouncer, Politeness, RuntimeConfig, TextSize};

const USAGE: &str = "usage: a11y-contrast [--large] [--json] <foreground> <background>\n       \
                     a11y-contrast --announce <message> [--assertive] [--timeout <ms>]";

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Contrast { fg: String, bg: String, size: TextSize, json: bool },
    Announce { message: String, politeness: Politeness, timeout: Duration },
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Command> {
    let mut size = TextSize::Normal;
    let mut json = false;
    let mut message = None;
    let mut politeness = Politeness::Polite;
    let mut timeout = None;
    let mut colors = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--large" => size = TextSize::Large,
            "--json" => json = true,
            "--assertive" => politeness = Politeness::Assertive,
            "--announce" => message = Some(args.next().context("--announce needs a message")?),
            "--timeout" => {
                let value = args.next().context("--timeout needs milliseconds")?;
                let ms: u64 = value.parse().with_context(|| format!("invalid --timeout {value:?}"))?;
                timeout = Some(Duration::from_millis(ms));
            }
            "-h" | "--help" => return Ok(Command::Help),
            flag if flag.starts_with("--") => bail!("unknown option {flag}"),
            _ => colors.push(arg),
        }
    }

    if let Some(message) = message {
        if !colors.is_empty() {
            bail!("--announce does not take colors");
        }
        let timeout = timeout.unwrap_or_else(|| RuntimeConfig::default().clear_timeout());
        return Ok(Command::Announce { message, politeness, timeout });
    }

    let Ok([fg, bg]) = <[String; 2]>::try_from(colors) else {
        bail!("expected exactly two colors\n{USAGE}");
    };
    Ok(Command::Contrast { fg, bg, size, json })
}

/// Replay one announcement on a simulated document; one line per step
fn dry_run(message: &str, politeness: Politeness, timeout: Duration) -> Vec<String> {
    let host = SimHost::new();
    let config = RuntimeConfig::default();
    let announcer = LiveAnnouncer::new(host.clone(), config.clone());
    announcer.announce(message, politeness, timeout);

    let Some(region) = announcer.region() else {
        return vec!["no live region created".to_string()];
    };
    let snapshot = |host: &SimHost| {
        format!(
            "{:>6}ms  aria-live={}  {:?}",
            host.now().as_millis(),
            host.attribute(region, "aria-live").unwrap_or_default(),
            host.text(region)
        )
    };

    let mut lines = vec![snapshot(&host)];
    host.advance(config.relay_delay());
    lines.push(snapshot(&host));
    if !timeout.is_zero() && timeout > host.now() {
        host.advance(timeout - host.now());
        lines.push(snapshot(&host));
    }
    lines
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (fg, bg, size, json) = match parse_args(std::env::args().skip(1))? {
        Command::Help => {
            println!("{USAGE}");
            return Ok(());
        }
        Command::Announce { message, politeness, timeout } => {
            for line in dry_run(&message, politeness, timeout) {
                println!("{line}");
            }
            return Ok(());
        }
        Command::Contrast { fg, bg, size, json } => (fg, bg, size, json),
    };

    let result = ContrastChecker::classify_for(&fg, &bg, size)
        .with_context(|| format!("checking {fg} on {bg}"))?;
    tracing::debug!(?size, ?result, "contrast computed");

    if json {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        let mark = |pass: bool| if pass { "pass" } else { "FAIL" };
        println!("{fg} on {bg}: {:.2}:1", result.ratio);
        println!("  WCAG AA:  {}", mark(result.wcag_aa));
        println!("  WCAG AAA: {}", mark(result.wcag_aaa));
    }

    if !result.wcag_aa {
        bail!("contrast {:.2}:1 is below WCAG AA", result.ratio);
    }
    Ok(())
}
