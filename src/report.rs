//! Console progress for a backup run.
//!
//! Verbose mode prints one line per entry. Terse mode prints a dot per untouched
//! entry and a line only for entries that changed or failed.

use std::io::{self, Stdout, Write};
use std::path::Path;

use console::style;

use crate::backup::{Action, Outcome};
use crate::error::BackupError;

pub struct Reporter<W: Write = Stdout> {
    out: W,
    verbose: bool,
    dry_run: bool,
    /// A terse dot was printed and the line has not been ended yet.
    mid_line: bool,
}

impl Reporter<Stdout> {
    pub fn stdout(verbose: bool, dry_run: bool) -> Self {
        Reporter::new(io::stdout(), verbose, dry_run)
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, verbose: bool, dry_run: bool) -> Self {
        Self {
            out,
            verbose,
            dry_run,
            mid_line: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn entry(&mut self, name: &str, result: &Result<Outcome, BackupError>) -> io::Result<()> {
        match result {
            Ok(Outcome::Updated(action)) => {
                let verb = match (action, self.dry_run) {
                    (Action::Built, false) => "Archived",
                    (Action::Built, true) => "Would archive",
                    (Action::Copied, false) => "Copied",
                    (Action::Copied, true) => "Would copy",
                };
                self.line(&style(format!("{verb}: {name}")).cyan().to_string())
            }
            Ok(Outcome::Skipped) if self.verbose => {
                self.line(&style(format!("Not updated: {name}")).green().to_string())
            }
            Ok(Outcome::Skipped) => self.dot(&style(".").green().to_string()),
            Err(e) if self.verbose => {
                self.line(&style(format!("Failed: {name}: {e}")).red().to_string())
            }
            Err(_) => self.dot(&style("F").red().to_string()),
        }
    }

    pub fn removed(&mut self, path: &Path) -> io::Result<()> {
        let verb = if self.dry_run { "Would remove" } else { "Removed" };
        self.line(&style(format!("{verb}: {}", path.display())).yellow().to_string())
    }

    pub fn remove_failed(&mut self, path: &Path, e: &BackupError) -> io::Result<()> {
        self.line(&style(format!("Failed to remove {}: {e}", path.display())).red().to_string())
    }

    /// Ends a pending line of dots.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.mid_line {
            writeln!(self.out)?;
            self.mid_line = false;
        }
        self.out.flush()
    }

    /// Lists every entry that failed, after the run.
    pub fn summary<'a>(
        &mut self,
        failures: impl IntoIterator<Item = (&'a str, &'a BackupError)>,
    ) -> io::Result<()> {
        let failures: Vec<_> = failures.into_iter().collect();
        if failures.is_empty() {
            return Ok(());
        }
        self.finish()?;
        let header = format!("Failed entries ({}):", failures.len());
        writeln!(self.out, "{}", style(header).red().bold())?;
        for (name, e) in failures {
            writeln!(self.out, "  {}", style(format!("{name}: {e}")).red())?;
        }
        self.out.flush()
    }

    fn line(&mut self, text: &str) -> io::Result<()> {
        if self.mid_line {
            writeln!(self.out)?;
            self.mid_line = false;
        }
        writeln!(self.out, "{text}")
    }

    fn dot(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "{text}")?;
        self.mid_line = true;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn output(reporter: Reporter<Vec<u8>>) -> String {
        console::strip_ansi_codes(&String::from_utf8(reporter.into_inner()).unwrap()).into_owned()
    }

    fn failure() -> BackupError {
        BackupError::NotADirectory(PathBuf::from("gone"))
    }

    #[test]
    fn test_terse_output() -> io::Result<()> {
        let mut reporter = Reporter::new(Vec::new(), false, false);
        reporter.entry("A.epub", &Ok(Outcome::Skipped))?;
        reporter.entry("B.epub", &Ok(Outcome::Skipped))?;
        reporter.entry("C.epub", &Ok(Outcome::Updated(Action::Built)))?;
        reporter.entry("notes.txt", &Err(failure()))?;
        reporter.finish()?;
        assert_eq!(output(reporter), "..\nArchived: C.epub\nF\n");
        Ok(())
    }

    #[test]
    fn test_verbose_output() -> io::Result<()> {
        let mut reporter = Reporter::new(Vec::new(), true, false);
        reporter.entry("A.epub", &Ok(Outcome::Skipped))?;
        reporter.entry("notes.txt", &Ok(Outcome::Updated(Action::Copied)))?;
        reporter.entry("B.epub", &Err(failure()))?;
        reporter.removed(Path::new("/dest/Old.epub"))?;
        reporter.finish()?;
        let text = output(reporter);
        assert!(text.contains("Not updated: A.epub\n"));
        assert!(text.contains("Copied: notes.txt\n"));
        assert!(text.contains("Failed: B.epub: source path 'gone' is not a directory\n"));
        assert!(text.contains("Removed: /dest/Old.epub\n"));
        Ok(())
    }

    #[test]
    fn test_dry_run_wording() -> io::Result<()> {
        let mut reporter = Reporter::new(Vec::new(), false, true);
        reporter.entry("A.epub", &Ok(Outcome::Updated(Action::Built)))?;
        reporter.removed(Path::new("Old.epub"))?;
        let text = output(reporter);
        assert!(text.contains("Would archive: A.epub"));
        assert!(text.contains("Would remove: Old.epub"));
        Ok(())
    }

    #[test]
    fn test_summary() -> io::Result<()> {
        let mut reporter = Reporter::new(Vec::new(), false, false);
        let e = failure();
        reporter.summary([("B.epub", &e)])?;
        let text = output(reporter);
        assert!(text.starts_with("Failed entries (1):\n"));
        assert!(text.contains("  B.epub: "));
        Ok(())
    }
}
