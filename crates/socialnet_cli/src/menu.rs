//! Interactive text menu over the core repositories and importer.
//!
//! Input and output are generic so scripted sessions can drive the menu.
//! Failures are already logged by the core; the menu only reports them.

use log::error;
use rusqlite::Connection;
use socialnet_core::{
    load_status_updates, load_users, ImportOptions, ImportOutcome, ImportResult,
    SqliteStatusRepository, SqliteUserRepository, Status, StatusRepository, User,
    UserRepository,
};
use std::io::{self, BufRead, Write};

const MENU_TEXT: &str = "
    A: Load user file into database
    B: Add user
    C: Update user
    D: Search user
    E: Delete user
    F: Load status file into database
    G: Add status
    H: Update status
    I: Search status
    J: Delete status
    Q: Quit

    Please enter your choice: ";

enum Flow {
    Continue,
    Quit,
}

#[derive(Clone, Copy)]
enum LoadKind {
    Users,
    Statuses,
}

/// Runs the menu loop until `Q` or end of input.
pub fn run<R: BufRead, W: Write>(
    conn: &mut Connection,
    options: ImportOptions,
    input: R,
    output: W,
) -> io::Result<()> {
    let mut session = Session {
        conn,
        options,
        input,
        output,
    };
    loop {
        let Some(choice) = session.prompt(MENU_TEXT)? else {
            return Ok(());
        };
        let flow = match choice.to_ascii_uppercase().as_str() {
            "A" => session.load(LoadKind::Users)?,
            "B" => session.add_user()?,
            "C" => session.update_user()?,
            "D" => session.search_user()?,
            "E" => session.delete_user()?,
            "F" => session.load(LoadKind::Statuses)?,
            "G" => session.add_status()?,
            "H" => session.update_status()?,
            "I" => session.search_status()?,
            "J" => session.delete_status()?,
            "Q" => Flow::Quit,
            _ => {
                writeln!(session.output, "Invalid option")?;
                Flow::Continue
            }
        };
        if matches!(flow, Flow::Quit) {
            return Ok(());
        }
    }
}

struct Session<'c, R, W> {
    conn: &'c mut Connection,
    options: ImportOptions,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<'_, R, W> {
    /// Prints `label` and reads one trimmed line; `None` at end of input.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Reads every field in order, stopping at end of input.
    fn prompt_all<const N: usize>(
        &mut self,
        labels: [&str; N],
    ) -> io::Result<Option<[String; N]>> {
        let mut values: [String; N] = std::array::from_fn(|_| String::new());
        for (slot, label) in values.iter_mut().zip(labels) {
            match self.prompt(label)? {
                Some(value) => *slot = value,
                None => return Ok(None),
            }
        }
        Ok(Some(values))
    }

    fn report(&mut self, ok: bool, success: &str, failure: &str) -> io::Result<Flow> {
        writeln!(self.output, "{}", if ok { success } else { failure })?;
        Ok(Flow::Continue)
    }

    fn users(&self) -> Option<SqliteUserRepository<'_>> {
        SqliteUserRepository::try_new(&*self.conn)
            .map_err(|err| error!("event=menu module=cli status=error error={err}"))
            .ok()
    }

    fn statuses(&self) -> Option<SqliteStatusRepository<'_>> {
        SqliteStatusRepository::try_new(&*self.conn)
            .map_err(|err| error!("event=menu module=cli status=error error={err}"))
            .ok()
    }

    fn load(&mut self, kind: LoadKind) -> io::Result<Flow> {
        let label = match kind {
            LoadKind::Users => "\nEnter filename of user file: ",
            LoadKind::Statuses => "\nEnter filename for status file: ",
        };
        let Some(filename) = self.prompt(label)? else {
            return Ok(Flow::Quit);
        };

        loop {
            let question = format!("Are you sure that you want to import {filename}? (y/n): ");
            let Some(answer) = self.prompt(&question)? else {
                return Ok(Flow::Quit);
            };
            match answer.to_ascii_lowercase().as_str() {
                "y" | "yes" => break,
                "n" | "no" => {
                    writeln!(self.output, "Import aborted.")?;
                    return Ok(Flow::Continue);
                }
                _ => writeln!(self.output, "Invalid input. Please enter 'y' (yes) or 'n' (no).")?,
            }
        }

        let result = match kind {
            LoadKind::Users => load_users(self.conn, &filename, &self.options),
            LoadKind::Statuses => load_status_updates(self.conn, &filename, &self.options),
        };
        let message = describe_import(kind, &filename, &result);
        writeln!(self.output, "{message}")?;
        Ok(Flow::Continue)
    }

    fn add_user(&mut self) -> io::Result<Flow> {
        let Some([user_id, email, first_name, last_name]) = self.prompt_all([
            "\nUser ID: ",
            "User email: ",
            "User name: ",
            "User last name: ",
        ])?
        else {
            return Ok(Flow::Quit);
        };
        let user = User::new(user_id, email, first_name, last_name);
        let ok = self
            .users()
            .is_some_and(|repo| repo.add_user(&user).is_ok());
        self.report(
            ok,
            "\nUser was successfully added",
            "\nAn error occurred while trying to add new user",
        )
    }

    fn update_user(&mut self) -> io::Result<Flow> {
        let Some([user_id, email, first_name, last_name]) = self.prompt_all([
            "\nUser ID: ",
            "User email: ",
            "User name: ",
            "User last name: ",
        ])?
        else {
            return Ok(Flow::Quit);
        };
        let user = User::new(user_id, email, first_name, last_name);
        let ok = self
            .users()
            .is_some_and(|repo| repo.modify_user(&user).is_ok());
        self.report(
            ok,
            "User was successfully updated",
            "An error occurred while trying to update user",
        )
    }

    fn search_user(&mut self) -> io::Result<Flow> {
        let Some(user_id) = self.prompt("\nEnter user ID to search: ")? else {
            return Ok(Flow::Quit);
        };
        let found = self
            .users()
            .and_then(|repo| repo.search_user(&user_id, true).ok().flatten());
        match found {
            Some(user) => {
                writeln!(self.output, "User ID: {}", user.user_id)?;
                writeln!(self.output, "Email: {}", user.email)?;
                writeln!(self.output, "Name: {}", user.first_name)?;
                writeln!(self.output, "Last name: {}", user.last_name)?;
            }
            None => writeln!(self.output, "ERROR: User does not exist")?,
        }
        Ok(Flow::Continue)
    }

    fn delete_user(&mut self) -> io::Result<Flow> {
        let Some(user_id) = self.prompt("\nUser ID: ")? else {
            return Ok(Flow::Quit);
        };
        let ok = self
            .users()
            .is_some_and(|repo| repo.delete_user(&user_id).is_ok());
        self.report(
            ok,
            "User was successfully deleted",
            "An error occurred while trying to delete user",
        )
    }

    fn add_status(&mut self) -> io::Result<Flow> {
        let Some([user_id, status_id, status_text]) =
            self.prompt_all(["\nUser ID: ", "Status ID: ", "Status text: "])?
        else {
            return Ok(Flow::Quit);
        };
        let status = Status::new(status_id, user_id, status_text);
        let ok = self
            .statuses()
            .is_some_and(|repo| repo.add_status(&status).is_ok());
        self.report(
            ok,
            "New status was successfully added",
            "An error occurred while trying to add new status",
        )
    }

    fn update_status(&mut self) -> io::Result<Flow> {
        let Some([status_id, status_text]) =
            self.prompt_all(["\nStatus ID: ", "Status text: "])?
        else {
            return Ok(Flow::Quit);
        };
        let ok = self
            .statuses()
            .is_some_and(|repo| repo.modify_status(&status_id, &status_text).is_ok());
        self.report(
            ok,
            "Status was successfully updated",
            "An error occurred while trying to update status",
        )
    }

    fn search_status(&mut self) -> io::Result<Flow> {
        let Some(status_id) = self.prompt("\nEnter status ID to search: ")? else {
            return Ok(Flow::Quit);
        };
        let found = self
            .statuses()
            .and_then(|repo| repo.search_status(&status_id, true).ok().flatten());
        match found {
            Some(status) => {
                writeln!(self.output, "User ID: {}", status.owner_user_id)?;
                writeln!(self.output, "Status ID: {}", status.status_id)?;
                writeln!(self.output, "Status text: {}", status.status_text)?;
            }
            None => writeln!(self.output, "ERROR: Status does not exist")?,
        }
        Ok(Flow::Continue)
    }

    fn delete_status(&mut self) -> io::Result<Flow> {
        let Some(status_id) = self.prompt("\nStatus ID: ")? else {
            return Ok(Flow::Quit);
        };
        let ok = self
            .statuses()
            .is_some_and(|repo| repo.delete_status(&status_id).is_ok());
        self.report(
            ok,
            "Status was successfully deleted",
            "An error occurred while trying to delete status",
        )
    }
}

fn describe_import(kind: LoadKind, filename: &str, result: &ImportResult<ImportOutcome>) -> String {
    let noun = match kind {
        LoadKind::Users => "users",
        LoadKind::Statuses => "statuses",
    };
    match result {
        Ok(ImportOutcome::Loaded(summary)) => {
            let mut message = match kind {
                LoadKind::Users => format!(
                    "{filename} imported into the database. {} users loaded.",
                    summary.new_count
                ),
                LoadKind::Statuses => format!(
                    "{} statuses loaded from {filename} successfully.",
                    summary.new_count
                ),
            };
            if summary.skipped_count > 0 {
                message.push_str(&format!(" {} {noun} skipped.", summary.skipped_count));
            }
            message
        }
        Ok(ImportOutcome::SourceUnavailable { .. }) => format!("File '{filename}' not found."),
        Ok(ImportOutcome::Malformed { line, missing }) => format!(
            "Import rejected: line {line} of {filename} is missing {}. No {noun} were loaded.",
            missing.join(", ")
        ),
        Err(_) => format!("An error occurred while importing {filename}. No {noun} were loaded."),
    }
}
