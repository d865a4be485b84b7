//! Stderr progress for the command-line tools. Reports go to stdout, so
//! stages are drawn on stderr and fall back to plain lines when piped.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
    Quiet,
}

impl UiMode {
    pub fn parse(flag: &str) -> Self {
        match flag {
            "plain" => UiMode::Plain,
            "pretty" => UiMode::Pretty,
            "quiet" => UiMode::Quiet,
            _ => UiMode::Auto,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    stderr_is_tty: bool,
    /// Set when stdout is redirected: a report is being captured, so `auto`
    /// keeps stderr to plain stage lines.
    disable_pretty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, stderr_is_tty: bool, disable_pretty: bool) -> Self {
        Self {
            mode,
            stderr_is_tty,
            disable_pretty,
        }
    }

    pub fn from_flag(flag: &str) -> Self {
        use std::io::IsTerminal;
        let stderr_is_tty = std::io::stderr().is_terminal();
        let stdout_is_tty = std::io::stdout().is_terminal();
        Self::new(UiMode::parse(flag), stderr_is_tty, !stdout_is_tty)
    }

    fn spinner_enabled(&self) -> bool {
        match self.mode {
            UiMode::Pretty => self.stderr_is_tty,
            UiMode::Auto => self.stderr_is_tty && !self.disable_pretty,
            UiMode::Plain | UiMode::Quiet => false,
        }
    }

    pub fn stage(&self, name: &str) -> StageGuard {
        if self.mode == UiMode::Quiet {
            return StageGuard::new(name.to_string(), None, true);
        }
        if self.spinner_enabled() {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(format!("{name}…"));
            StageGuard::new(name.to_string(), Some(spinner), false)
        } else {
            eprintln!("==> {}", name);
            StageGuard::new(name.to_string(), None, false)
        }
    }
}

pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
    silent: bool,
}

impl StageGuard {
    fn new(name: String, spinner: Option<ProgressBar>, silent: bool) -> Self {
        Self {
            name,
            start: Instant::now(),
            spinner,
            silent,
        }
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        if self.silent {
            return;
        }
        let message = format!("✔ {} ({})", self.name, format_duration(self.start.elapsed()));
        match &self.spinner {
            Some(spinner) => spinner.finish_with_message(message),
            None => eprintln!("{message}"),
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod ui_tests {
    use super::*;

    #[test]
    fn auto_spins_only_when_both_streams_are_terminals() {
        assert!(Ui::new(UiMode::Auto, true, false).spinner_enabled());
        assert!(!Ui::new(UiMode::Auto, true, true).spinner_enabled());
        assert!(!Ui::new(UiMode::Auto, false, false).spinner_enabled());
    }

    #[test]
    fn explicit_modes_override_redirection() {
        assert!(Ui::new(UiMode::Pretty, true, true).spinner_enabled());
        assert!(!Ui::new(UiMode::Pretty, false, false).spinner_enabled());
        assert!(!Ui::new(UiMode::Plain, true, false).spinner_enabled());
        assert!(!Ui::new(UiMode::Quiet, true, false).spinner_enabled());
    }

    #[test]
    fn unknown_flag_falls_back_to_auto() {
        assert_eq!(UiMode::parse("quiet"), UiMode::Quiet);
        assert_eq!(UiMode::parse("fancy"), UiMode::Auto);
    }

    #[test]
    fn durations_switch_units_at_one_second() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }
}
