//! Operator confirmation before destructive purges

use crate::metadata::ResolvedMetric;
use crate::purge::PurgeMode;
use crate::schema::{ScanRange, TimeWindow};
use crate::Result;

use chrono::DateTime;
use std::fmt;
use std::io::{BufRead, Write};

/// What a purge is about to do, in operator terms
#[derive(Debug, Clone)]
pub struct PurgeSummary {
    pub window: TimeWindow,
    pub mode: PurgeMode,
    pub targets: Vec<(ResolvedMetric, ScanRange)>,
}

fn format_epoch(epoch: i64) -> String {
    DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| epoch.to_string())
}

impl fmt::Display for PurgeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "About to purge ({}) data points between {} and {}",
            self.mode.as_str(),
            format_epoch(self.window.start),
            format_epoch(self.window.end)
        )?;
        for (metric, range) in &self.targets {
            writeln!(
                f,
                "  {} (uid {}): hours {} .. {} (exclusive), {} buckets, keys {}",
                metric.name,
                metric.uid,
                format_epoch(range.start_base),
                format_epoch(range.end_base),
                range.hours(),
                range
            )?;
        }
        Ok(())
    }
}

/// Decides whether a destructive purge may proceed
pub trait Confirm {
    fn confirm(&mut self, summary: &PurgeSummary) -> Result<bool>;
}

/// Always proceeds (`--yes`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _summary: &PurgeSummary) -> Result<bool> {
        Ok(true)
    }
}

/// Interactive yes/no prompt
///
/// Answers are trimmed and case-folded. Only `y`/`yes` and `n`/`no` end the
/// prompt; anything else asks again. End of input is an error, never a
/// decision.
pub struct ConfirmationGate<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConfirmationGate<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

impl<R: BufRead, W: Write> Confirm for ConfirmationGate<R, W> {
    fn confirm(&mut self, summary: &PurgeSummary) -> Result<bool> {
        write!(self.output, "{}", summary)?;
        loop {
            write!(self.output, "Proceed? [y/n]: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "input closed before confirmation",
                )
                .into());
            }

            match parse_answer(&line) {
                Some(answer) => return Ok(answer),
                None => writeln!(self.output, "Please answer 'y' or 'n'.")?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetricUid;
    use crate::schema::build_range;
    use crate::Error;
    use std::io::Cursor;

    fn summary() -> PurgeSummary {
        let window = TimeWindow::new(1_497_387_618, 1_497_391_218).unwrap();
        let metric = ResolvedMetric {
            name: "sys.cpu.user".to_string(),
            uid: MetricUid::new(vec![0, 0, 0x2A]),
        };
        let range = build_range(&metric.uid, &window);
        PurgeSummary {
            window,
            mode: PurgeMode::Destructive,
            targets: vec![(metric, range)],
        }
    }

    fn ask(input: &str) -> (Result<bool>, String) {
        let mut gate = ConfirmationGate::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let answer = gate.confirm(&summary());
        let (_, out) = gate.into_inner();
        (answer, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_no_declines() {
        let (answer, _) = ask("n\n");
        assert!(!answer.unwrap());
    }

    #[test]
    fn test_answers_are_trimmed_and_case_folded() {
        assert!(ask("  YES \n").0.unwrap());
        assert!(!ask("No\n").0.unwrap());
    }

    #[test]
    fn test_ambiguous_input_reprompts() {
        let (answer, out) = ask("maybe\n\nyep\ny\n");
        assert!(answer.unwrap());
        assert_eq!(out.matches("Proceed? [y/n]: ").count(), 4);
        assert_eq!(out.matches("Please answer").count(), 3);
    }

    #[test]
    fn test_eof_is_an_error() {
        let (answer, _) = ask("what\n");
        assert!(matches!(answer, Err(Error::Io(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_summary_is_human_readable() {
        let (_, out) = ask("n\n");
        assert!(out.contains("sys.cpu.user (uid 00002a)"));
        assert!(out.contains("2017-06-13T21:00:18+00:00"));
        assert!(out.contains("2017-06-13T21:00:00+00:00"));
        assert!(out.contains("00002a59405250"));
    }
}
