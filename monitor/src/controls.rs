use anyhow::{bail, Context};
use meshcore::RefreshConfig;

/// One line typed on the monitor's stdin.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    Interval(u64),
    Hours(u32),
    Limit(u32),
    Viewshed(f64),
    Endpoint(String),
    Refresh,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "commands: interval <seconds, 0 = manual> | hours <n> | limit <n> | \
viewshed <km 1-100> | endpoint <url> | refresh | status | help | quit";

impl ControlCommand {
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            bail!("empty command");
        };
        let argument = parts.next();
        if parts.next().is_some() {
            bail!("too many arguments for `{verb}`");
        }

        let command = match (verb.to_ascii_lowercase().as_str(), argument) {
            ("interval", Some(value)) => ControlCommand::Interval(
                value
                    .parse()
                    .with_context(|| format!("invalid interval `{value}`"))?,
            ),
            ("hours", Some(value)) => ControlCommand::Hours(
                value
                    .parse()
                    .with_context(|| format!("invalid time range `{value}`"))?,
            ),
            ("limit", Some(value)) => ControlCommand::Limit(
                value
                    .parse()
                    .with_context(|| format!("invalid node limit `{value}`"))?,
            ),
            ("viewshed", Some(value)) => ControlCommand::Viewshed(
                value
                    .parse()
                    .with_context(|| format!("invalid viewshed limit `{value}`"))?,
            ),
            ("endpoint", Some(url)) => ControlCommand::Endpoint(url.to_string()),
            ("refresh", None) => ControlCommand::Refresh,
            ("status", None) => ControlCommand::Status,
            ("help", None) => ControlCommand::Help,
            ("quit" | "exit", None) => ControlCommand::Quit,
            (other, _) => bail!("unknown command `{other}`; {HELP}"),
        };
        Ok(command)
    }

    /// Replacement configuration for commands that re-arm the timer.
    pub fn reconfigured(&self, current: RefreshConfig) -> Option<RefreshConfig> {
        match *self {
            ControlCommand::Interval(seconds) => Some(current.with_interval(seconds)),
            _ => None,
        }
    }

    /// `(time_range_hours, max_nodes)` for commands that only change what is fetched.
    pub fn query_window(&self, current: RefreshConfig) -> Option<(u32, u32)> {
        match *self {
            ControlCommand::Hours(hours) => Some((hours, current.max_nodes)),
            ControlCommand::Limit(limit) => Some((current.time_range_hours, limit)),
            _ => None,
        }
    }
}
