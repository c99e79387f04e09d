//! Line-driven registration session.
//!
//! Each stdin line is one command: `<field> <value>` edits a field (an empty
//! value clears it), `submit <signature>` submits, `show` prints the form.

use std::sync::Arc;

use anyhow::Result;
use tail_registration::{
    ChallengeState, FormField, RegistrationSession, SessionError, SessionSnapshot,
    SubmissionReceipt, TailRegistrationApi, SUBMITTED_MESSAGE,
};
use tail_telemetry::log_event;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use crate::sign_command;

const HELP: &str = "\
commands:
  <field> <value>     set a field (hash, name, code, category, coin, logo,
                      website_url, twitter_url, discord_url, description)
  submit <signature>  submit the record
  show                print the form and its errors
  quit                leave";

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Line {
    Edit(FormField, String),
    Submit(String),
    Show,
    Help,
    Quit,
    Empty,
}

pub(crate) fn parse_line(line: &str) -> Result<Line, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word {
        "" => Ok(Line::Empty),
        "submit" => Ok(Line::Submit(rest.to_string())),
        "show" => Ok(Line::Show),
        "help" | "?" => Ok(Line::Help),
        "quit" | "exit" => Ok(Line::Quit),
        field => field
            .parse::<FormField>()
            .map(|field| Line::Edit(field, rest.to_string()))
            .map_err(|e| e.to_string()),
    }
}

/// One-line summary of where the registration stands.
pub(crate) fn status(snapshot: &SessionSnapshot) -> String {
    if let Some(receipt) = &snapshot.receipt {
        return format!("{SUBMITTED_MESSAGE} (tx_id {})", receipt.tx_id);
    }
    if snapshot.submitting {
        return "submitting...".to_string();
    }

    let challenge = match &snapshot.challenge {
        ChallengeState::Idle => "waiting for hash and coin".to_string(),
        ChallengeState::Fetching { key } => format!("fetching challenge for {key}"),
        ChallengeState::Ready {
            challenge: Some(challenge),
            ..
        } => format!("sign with: {}", sign_command(challenge)),
        ChallengeState::Ready { key, .. } => format!("no challenge available for {key}"),
    };

    match &snapshot.challenge_failure {
        Some(failure) => format!("{challenge}\nerror: {failure}"),
        None => challenge,
    }
}

/// Line to print for a submit result. Accepted records show up in the status.
pub(crate) fn submit_report(result: &Result<SubmissionReceipt, SessionError>) -> Option<String> {
    result.as_ref().err().map(|e| format!("error: {e}"))
}

fn print_form(snapshot: &SessionSnapshot) {
    for field in FormField::ALL {
        let name = field.as_str();
        let value = snapshot.fields.get(field);
        match snapshot.error_for(field) {
            Some(error) => println!("  {name:<12} {value:?}  <- {error}"),
            None => println!("  {name:<12} {value:?}"),
        }
    }
}

/// Print the status line whenever it changes.
async fn watch_status(mut snapshots: watch::Receiver<SessionSnapshot>) {
    let mut last = String::new();
    while snapshots.changed().await.is_ok() {
        let line = status(&snapshots.borrow_and_update());
        if line != last {
            println!("{line}");
            last = line;
        }
    }
}

pub(crate) async fn run<S: TailRegistrationApi + 'static>(service: Arc<S>) -> Result<()> {
    let (handle, _session) = RegistrationSession::spawn(service);
    let printer = tokio::spawn(watch_status(handle.subscribe()));
    log_event!(info, "tail-cli", "Interactive session started");

    println!("{HELP}");
    println!("{}", status(&handle.snapshot()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Line::Empty) => {}
            Ok(Line::Help) => println!("{HELP}"),
            Ok(Line::Quit) => break,
            Ok(Line::Show) => print_form(&handle.snapshot()),
            Ok(Line::Edit(field, value)) => handle.edit(field, value).await?,
            Ok(Line::Submit(signature)) => {
                let result = handle.submit(signature).await;
                if let Some(report) = submit_report(&result) {
                    eprintln!("{report}");
                }
                if let Err(SessionError::Closed) = result {
                    break;
                }
            }
            Err(message) => eprintln!("{message}"),
        }
    }

    printer.abort();
    Ok(())
}
