//! Line-based prompts.
//!
//! Used when stdin is not a terminal or `--plain` is given. Both the group
//! selector and the deletion confirmation read whole lines, so they work
//! with piped input and in tests against in-memory buffers.
//!
//! Row selection accepts:
//! - `1,3` - delete rows 1 and 3 (1-based, as shown)
//! - `none` - keep every row in the group
//! - `q` / `quit` - stop and skip the remaining groups
//!
//! End of input is treated as `quit` for selection and as "no" for
//! confirmation.

use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::cleanup::{ConfirmDeletion, DeletionPlan};
use crate::selection::{
    describe_key, GroupSelector, GroupView, SelectionError, SelectorResponse,
};

/// Groups listed individually in the deletion preview.
const PREVIEW_GROUPS: usize = 10;

/// A parsed answer to the row prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSelection {
    /// 1-based row numbers to delete
    Rows(BTreeSet<usize>),
    /// Keep every row
    KeepAll,
    /// Stop selecting
    Quit,
}

/// Parse one line of row-selection input for a group of `rows` members.
///
/// # Errors
///
/// Returns a message suitable for re-prompting when the input is empty,
/// not a number list, or out of range.
pub fn parse_row_selection(input: &str, rows: usize) -> Result<RowSelection, String> {
    let input = input.trim().to_lowercase();
    match input.as_str() {
        "" => return Err("Please enter row numbers or 'none'".to_string()),
        "none" => return Ok(RowSelection::KeepAll),
        "q" | "quit" => return Ok(RowSelection::Quit),
        _ => {}
    }

    let mut selected = BTreeSet::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let row: usize = part.parse().map_err(|_| {
            "Invalid input. Enter numbers separated by commas, 'none', or 'q'".to_string()
        })?;
        if row == 0 || row > rows {
            return Err(format!("Please enter numbers between 1 and {}", rows));
        }
        selected.insert(row);
    }
    if selected.is_empty() {
        return Err("Please enter row numbers or 'none'".to_string());
    }
    Ok(RowSelection::Rows(selected))
}

/// Line-oriented selector and confirmer over any reader and writer.
///
/// # Example
///
/// ```
/// use credupe::prompt::LinePrompt;
/// use std::io::Cursor;
///
/// let mut prompt = LinePrompt::new(Cursor::new("y\n"), Vec::new());
/// assert!(prompt.ask_yes_no("Continue?").unwrap());
/// ```
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
    mask_passwords: bool,
    confirm_phrase: String,
}

impl<R, W> std::fmt::Debug for LinePrompt<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinePrompt")
            .field("mask_passwords", &self.mask_passwords)
            .field("confirm_phrase", &self.confirm_phrase)
            .finish_non_exhaustive()
    }
}

impl LinePrompt<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on the process's stdin, writing to stderr so stdout stays
    /// reserved for reports.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    /// Create a prompt with passwords masked and `DELETE` as the phrase.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            mask_passwords: true,
            confirm_phrase: "DELETE".to_string(),
        }
    }

    /// Show or hide password values.
    #[must_use]
    pub fn with_mask_passwords(mut self, mask: bool) -> Self {
        self.mask_passwords = mask;
        self
    }

    /// Set the phrase typed to confirm deletion.
    #[must_use]
    pub fn with_confirm_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.confirm_phrase = phrase.into();
        self
    }

    /// Consume the prompt, returning its writer.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Ask a yes/no question; only `y` or `yes` count as yes.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if reading or writing fails.
    pub fn ask_yes_no(&mut self, question: &str) -> io::Result<bool> {
        write!(self.output, "{} [y/N]: ", question)?;
        self.output.flush()?;
        Ok(self
            .read_line()?
            .is_some_and(|line| matches!(line.trim().to_lowercase().as_str(), "y" | "yes")))
    }

    /// Ask before overwriting `path` during restore.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if reading or writing fails.
    pub fn confirm_overwrite(&mut self, path: &Path) -> io::Result<bool> {
        self.ask_yes_no(&format!("Overwrite {} with the backup?", path.display()))
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn show_group(&mut self, view: &GroupView) -> io::Result<()> {
        let rule = "=".repeat(60);
        writeln!(self.output)?;
        writeln!(self.output, "{}", rule)?;
        writeln!(
            self.output,
            "Group {}/{} ({})",
            view.position.index, view.position.total, view.policy
        )?;
        writeln!(self.output, "{}", view.key_label(self.mask_passwords))?;
        writeln!(self.output, "{}", rule)?;

        for (n, row) in view.rows.iter().enumerate() {
            writeln!(self.output, "\nRow {} (record {}):", n + 1, row.original_index)?;
            for (column, header) in view.headers.iter().enumerate() {
                let value = view.display_value(row, column, self.mask_passwords);
                writeln!(self.output, "  {}: {}", header, value)?;
            }
        }
        Ok(())
    }

    fn show_plan(&mut self, plan: &DeletionPlan) -> io::Result<()> {
        writeln!(self.output, "\nDeletion preview ({} policy)", plan.policy)?;
        if plan.full_duplicates > 0 {
            writeln!(
                self.output,
                "  {} exact copies will be removed",
                plan.full_duplicates
            )?;
        }
        for group in plan.groups.iter().take(PREVIEW_GROUPS) {
            writeln!(
                self.output,
                "  {}: keep {:?}, delete {:?}",
                describe_key(plan.policy, &group.key, self.mask_passwords),
                group.keep,
                group.delete
            )?;
        }
        if plan.groups.len() > PREVIEW_GROUPS {
            writeln!(
                self.output,
                "  ... and {} more groups",
                plan.groups.len() - PREVIEW_GROUPS
            )?;
        }
        writeln!(
            self.output,
            "\n{} rows will be deleted, {} will remain.",
            plan.would_delete, plan.would_remain
        )
    }
}

impl<R: BufRead, W: Write> GroupSelector for LinePrompt<R, W> {
    fn request_selection(&mut self, view: &GroupView) -> Result<SelectorResponse, SelectionError> {
        self.show_group(view)?;
        let rows = view.rows.len();

        loop {
            write!(
                self.output,
                "\nRows to delete (1-{}, 'none' to keep all, 'q' to stop): ",
                rows
            )?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                log::debug!("Input closed; aborting selection");
                return Ok(SelectorResponse::Abort);
            };

            match parse_row_selection(&line, rows) {
                Ok(RowSelection::Quit) => return Ok(SelectorResponse::Abort),
                Ok(RowSelection::KeepAll) => return Ok(SelectorResponse::Delete(BTreeSet::new())),
                Ok(RowSelection::Rows(selected)) => {
                    let indices = selected
                        .iter()
                        .filter_map(|n| view.rows.get(n - 1))
                        .map(|row| row.original_index)
                        .collect();
                    return Ok(SelectorResponse::Delete(indices));
                }
                Err(message) => writeln!(self.output, "{}", message)?,
            }
        }
    }
}

impl<R: BufRead, W: Write> ConfirmDeletion for LinePrompt<R, W> {
    fn confirm(&mut self, plan: &DeletionPlan) -> Result<bool, SelectionError> {
        self.show_plan(plan)?;
        write!(
            self.output,
            "Type {} to confirm, anything else cancels: ",
            self.confirm_phrase
        )?;
        self.output.flush()?;

        let confirmed = self
            .read_line()?
            .is_some_and(|line| line.trim().eq_ignore_ascii_case(self.confirm_phrase.trim()));
        if !confirmed {
            writeln!(self.output, "Cancelled. No changes made.")?;
        }
        Ok(confirmed)
    }
}
