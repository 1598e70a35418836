//! Line-oriented front-end for the portal.
//!
//! Reads one command per line from stdin and applies sync events between
//! commands. Everything printed here is UI; diagnostics go to the log file.

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::auth::verification::VerificationState;
use crate::handlers::{DocumentForm, FeedbackForm, LeaveForm, ProfileForm};
use crate::portal::{AuthView, Portal, View};
use crate::sync::EventReceiver;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unterminated quote.")]
    UnterminatedQuote,
    /// Usage errors, and the text for `help`.
    #[error(transparent)]
    Usage(#[from] clap::Error),
}

/// One console line. The first word names the command.
#[derive(Debug, Parser)]
#[command(name = "hr-portal", multicall = true)]
#[command(subcommand_value_name = "COMMAND", subcommand_help_heading = "Commands")]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Sign in. With one argument it is the password for the last verified email
    Login(LoginArgs),

    /// Create an account
    Signup {
        email: String,
        password: String,
        confirm: String,
    },

    /// Confirm the 6-digit code sent by email
    Verify {
        #[arg(default_value = "")]
        code: String,
    },

    /// Send a new verification code
    Resend,

    /// Sign out and clear local data
    Logout,

    /// Show the current profile, or save it
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },

    /// Request leave (sick, casual, earned, maternity, paternity)
    Leave(LeaveArgs),

    /// Show leave history
    Leaves,

    /// Submit performance feedback
    Feedback {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Show feedback history
    Feedbacks,

    /// Save metadata for a local file
    Upload {
        path: PathBuf,
        /// payslip, tax-info, id-proof, address-proof, medical-cert or other
        file_type: String,
    },

    /// Show uploaded documents
    Documents,

    /// Load everything again
    Refresh,

    /// Show session state
    Status,

    /// Leave the portal
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct LoginArgs {
    #[arg(value_name = "EMAIL")]
    first: String,
    #[arg(value_name = "PASSWORD")]
    second: Option<String>,
}

impl LoginArgs {
    /// `(email, password)`; no email when only a password was given.
    pub fn credentials(self) -> (Option<String>, String) {
        match self.second {
            Some(password) => (Some(self.first), password),
            None => (None, self.first),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ProfileAction {
    /// Save the profile: empId=... name=... email=... department=...
    Save {
        #[arg(required = true, value_parser = parse_edit)]
        fields: Vec<(String, String)>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct LeaveArgs {
    leave_type: String,
    /// YYYY-MM-DD
    start: String,
    /// YYYY-MM-DD
    end: String,
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    reason: Vec<String>,
}

impl LeaveArgs {
    pub fn into_form(self) -> LeaveForm {
        LeaveForm::new(self.leave_type, self.start, self.end, self.reason.join(" "))
    }
}

fn parse_edit(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected field=value, got \"{raw}\""))
}

/// Splits a line on whitespace. Double quotes group, and may appear
/// mid-word (`name="Asha Rao"`).
pub fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quoted {
        return Err(ParseError::UnterminatedQuote);
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// `Ok(None)` for a blank line.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let mut tokens = tokenize(line)?;
    let Some(head) = tokens.first_mut() else {
        return Ok(None);
    };
    head.make_ascii_lowercase();

    let line = Line::try_parse_from(tokens)?;
    Ok(Some(line.command))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Runs one command against the portal and returns what to print.
///
/// Failures have already been turned into notices or the auth message by
/// the portal, so their `Err` values are dropped here.
pub async fn execute(portal: &mut Portal, command: Command) -> (Flow, String) {
    let mut out = String::new();

    match command {
        Command::Login(args) => {
            portal.show_login();
            let (email, password) = args.credentials();
            let email = email.or_else(|| portal.login_prefill().map(str::to_string));
            match email {
                Some(email) => {
                    let _ = portal.login(&email, &password).await;
                }
                None => out.push_str("Usage: login <email> <password>\n"),
            }
            push_auth_message(portal, &mut out);
        }
        Command::Signup {
            email,
            password,
            confirm,
        } => {
            portal.show_signup();
            let _ = portal.signup(&email, &password, &confirm).await;
            push_auth_message(portal, &mut out);
        }
        Command::Verify { code } => {
            let _ = portal.verify(&code).await;
            push_auth_message(portal, &mut out);
        }
        Command::Resend => {
            let _ = portal.resend_code().await;
            push_auth_message(portal, &mut out);
        }
        Command::Logout => {
            let _ = portal.logout().await;
        }
        Command::Profile { action: None } => out.push_str(&render_profile(portal)),
        Command::Profile {
            action: Some(ProfileAction::Save { fields: edits }),
        } => {
            let mut form = ProfileForm::from_profile(&portal.data().profile);
            let mut valid = true;
            for (field, value) in &edits {
                if let Err(e) = form.set(field, value) {
                    let _ = writeln!(out, "{e}");
                    valid = false;
                }
            }
            if valid && portal.save_profile(&form).await.is_ok() {
                out.push_str(&render_profile(portal));
            }
        }
        Command::Leave(args) => {
            let _ = portal.submit_leave(&args.into_form()).await;
        }
        Command::Leaves => out.push_str(&render_leaves(portal)),
        Command::Feedback { text } => {
            let _ = portal
                .submit_feedback(&FeedbackForm::new(text.join(" ")))
                .await;
        }
        Command::Feedbacks => out.push_str(&render_feedback(portal)),
        Command::Upload { path, file_type } => {
            let form = DocumentForm::parse_type(&file_type)
                .and_then(|kind| DocumentForm::from_path(&path, kind));
            match form {
                Ok(form) => {
                    let _ = portal.upload_document(&form).await;
                }
                Err(e) => {
                    let _ = writeln!(out, "{e}");
                }
            }
        }
        Command::Documents => out.push_str(&render_documents(portal)),
        Command::Refresh => {
            let _ = portal.refresh().await;
        }
        Command::Status => out.push_str(&render_status(portal)),
        Command::Quit => return (Flow::Quit, out),
    }

    (Flow::Continue, out)
}

fn push_auth_message(portal: &Portal, out: &mut String) {
    if let Some(message) = portal.auth_message() {
        let _ = writeln!(out, "{message}");
    }
}

fn push_notices(portal: &mut Portal, out: &mut String) {
    for notice in portal.notices() {
        let _ = writeln!(out, "{notice}");
    }
}

fn when(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn render_status(portal: &Portal) -> String {
    let mut out = String::new();
    match portal.view() {
        View::Dashboard => {
            if let Some(identity) = portal.identity() {
                let _ = writeln!(out, "Signed in as {} ({:?})", identity.user_id, identity.method);
                if let Some(email) = &identity.email {
                    let _ = writeln!(out, "Email: {email}");
                }
            }
            let _ = writeln!(out, "Session epoch: {}", portal.epoch());
            let _ = writeln!(out, "Live listeners: {}", portal.live_listeners());
        }
        View::Auth(view) => {
            let screen = match view {
                AuthView::Login => "login",
                AuthView::Signup => "signup",
                AuthView::Verify => "verification",
            };
            let _ = writeln!(out, "Not signed in ({screen} screen)");
            match portal.verification() {
                VerificationState::AwaitingSignup => {}
                VerificationState::AwaitingCode { email } => {
                    let _ = writeln!(out, "Waiting for the code sent to {email}");
                }
                VerificationState::Verified { email } => {
                    let _ = writeln!(out, "{email} is verified");
                }
            }
        }
    }
    out
}

pub fn render_profile(portal: &Portal) -> String {
    let profile = &portal.data().profile;
    if profile.is_blank() {
        return "No profile saved yet. Use: profile save empId=... name=... email=... department=...\n"
            .to_string();
    }
    format!(
        "Current Profile\n  Employee ID: {}\n  Name:        {}\n  Email:       {}\n  Department:  {}\n",
        profile.emp_id, profile.name, profile.email, profile.department
    )
}

pub fn render_leaves(portal: &Portal) -> String {
    let leaves = &portal.data().leaves;
    if leaves.is_empty() {
        return "No leave requests yet.\n".to_string();
    }
    let mut out = String::from("Leave History\n");
    for leave in leaves {
        let _ = writeln!(
            out,
            "  {:<16} {} → {} ({} d)  {:<9} submitted {}{}",
            leave.leave_type.label(),
            leave.start_date,
            leave.end_date,
            leave.days(),
            leave.status,
            when(leave.submitted_at),
            leave
                .reason
                .as_deref()
                .map(|r| format!("  \"{r}\""))
                .unwrap_or_default(),
        );
    }
    out
}

pub fn render_feedback(portal: &Portal) -> String {
    let feedback = &portal.data().feedback;
    if feedback.is_empty() {
        return "No feedback submitted yet.\n".to_string();
    }
    let mut out = String::from("Performance Feedback\n");
    for entry in feedback {
        let _ = writeln!(out, "  [{}] {}", when(entry.timestamp), entry.body);
    }
    out
}

pub fn render_documents(portal: &Portal) -> String {
    let documents = &portal.data().documents;
    if documents.is_empty() {
        return "No documents uploaded yet.\n".to_string();
    }
    let mut out = String::from("Documents\n");
    for doc in documents {
        let _ = writeln!(
            out,
            "  {:<24} {:<20} {:>9} B  {}  {}",
            doc.file_name,
            doc.file_type.label(),
            doc.file_size,
            when(doc.upload_date),
            doc.download_url.as_deref().unwrap_or("-"),
        );
    }
    out
}

/// Reads commands until `quit` or end of input, applying sync events as
/// they arrive.
pub async fn run(portal: &mut Portal, mut events: EventReceiver) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut out = String::new();
    push_auth_message(portal, &mut out);
    push_notices(portal, &mut out);
    out.push_str(&render_status(portal));
    out.push_str("Type help for commands.\n");
    print!("{out}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed");
                    break;
                };

                let mut out = String::new();
                let flow = match parse(&line) {
                    Ok(Some(command)) => {
                        debug!(?command, "command");
                        let (flow, text) = execute(portal, command).await;
                        out.push_str(&text);
                        flow
                    }
                    Ok(None) => Flow::Continue,
                    Err(e) => {
                        let _ = writeln!(out, "{e}");
                        Flow::Continue
                    }
                };
                push_notices(portal, &mut out);
                print!("{out}");

                if flow == Flow::Quit {
                    break;
                }
            }
            Some(event) = events.recv() => {
                let mut out = String::new();
                if let Some(collection) = portal.apply(event) {
                    let _ = writeln!(out, "({} updated)", collection.description());
                }
                push_notices(portal, &mut out);
                print!("{out}");
            }
        }
    }

    Ok(())
}
