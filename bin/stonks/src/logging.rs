//! Logging setup for the stonks CLI.

use eyre::{Result, WrapErr, eyre};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use crate::cli::LogArgs;

/// Install the global subscriber for this run.
///
/// Commands print their results on stdout, so logs go to stderr. They stay at
/// `warn` unless raised with `-v` (repeatable) or `RUST_LOG`. `--quiet` keeps
/// only errors and ignores everything else. Directives from `--log.filter` are
/// added last and win over the base level; a malformed one is an error. `--log.json` emits one JSON object
/// per event with timestamps, plain output omits them.
pub(crate) fn init_logging(args: &LogArgs) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(args)?)
        .with_writer(std::io::stderr);

    let installed = if args.json {
        builder.json().try_init()
    } else {
        builder.without_time().try_init()
    };
    installed.map_err(|e| eyre!("failed to install tracing subscriber: {e}"))
}

fn env_filter(args: &LogArgs) -> Result<EnvFilter> {
    if args.quiet {
        return Ok(EnvFilter::new("error"));
    }

    let level = match args.verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let extra = args.filter.as_deref().unwrap_or_default();
    for directive in extra.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        let directive = directive
            .parse::<Directive>()
            .wrap_err_with(|| format!("invalid --log.filter directive `{directive}`"))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(quiet: bool, filter: Option<&str>) -> LogArgs {
        LogArgs {
            quiet,
            verbosity: 0,
            filter: filter.map(str::to_owned),
            json: false,
        }
    }

    #[test]
    fn test_quiet_ignores_extra_directives() {
        let filter = env_filter(&args(true, Some("stonks_engine=trace"))).unwrap();
        assert_eq!(filter.to_string(), "error");
    }

    #[test]
    fn test_extra_directives_are_checked() {
        env_filter(&args(false, Some("stonks_engine=debug, stonks_storage=info,"))).unwrap();

        let err = env_filter(&args(false, Some("stonks_engine=loud"))).unwrap_err();
        assert!(err.to_string().contains("stonks_engine=loud"));
    }
}
