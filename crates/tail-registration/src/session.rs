//! # Registration Session
//!
//! Async driver around a [`RegistrationForm`]. One task owns the form and
//! consumes [`SessionCommand`]s in arrival order. Challenge lookups and
//! submissions run concurrently in a `FuturesUnordered`; their outcomes are
//! fed back into the same loop, so all state changes happen in one place.
//! Every change is published as a [`SessionSnapshot`] on a watch channel,
//! and a submit reply is sent only after its outcome has been published.
//!
//! Lookups are never cancelled. A result for a key that is no longer current
//! is discarded by the coordinator when it arrives.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::coordinator::FetchTicket;
use crate::domain::entities::{Challenge, FormField, SubmissionReceipt};
use crate::domain::errors::{ChallengeFetchError, SubmissionError};
use crate::domain::form::{RegistrationForm, SessionSnapshot};
use crate::ports::inbound::TailRegistrationApi;

/// Queue depth for pending commands.
const COMMAND_CAPACITY: usize = 64;

type SubmitReply = oneshot::Sender<Result<SubmissionReceipt, SubmissionError>>;

/// Input to a running session.
#[derive(Debug)]
pub enum SessionCommand {
    /// Set one field to a new value
    Edit { field: FormField, value: String },
    /// Submit the current form with `signature`
    Submit { signature: String, reply: SubmitReply },
}

/// Outcome of background work, applied by the session loop.
enum SessionEvent {
    Challenge {
        ticket: FetchTicket,
        result: Result<Option<Challenge>, ChallengeFetchError>,
    },
    Submitted {
        result: Result<SubmissionReceipt, SubmissionError>,
        reply: SubmitReply,
    },
}

/// Errors seen through a [`SessionHandle`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Registration session has stopped")]
    Closed,

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Cloneable handle to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Queue an edit.
    pub async fn edit(&self, field: FormField, value: impl Into<String>) -> Result<(), SessionError> {
        self.commands
            .send(SessionCommand::Edit {
                field,
                value: value.into(),
            })
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Submit the form and wait for the outcome.
    pub async fn submit(&self, signature: impl Into<String>) -> Result<SubmissionReceipt, SessionError> {
        let (reply, outcome) = oneshot::channel();
        self.commands
            .send(SessionCommand::Submit {
                signature: signature.into(),
                reply,
            })
            .await
            .map_err(|_| SessionError::Closed)?;

        match outcome.await {
            Ok(result) => result.map_err(SessionError::from),
            Err(_) => Err(SessionError::Closed),
        }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a snapshot satisfies `predicate`, checking the current one first.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, SessionError> {
        let mut receiver = self.snapshots.clone();
        let snapshot = receiver
            .wait_for(predicate)
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(snapshot.clone())
    }
}

/// The task state of one registration.
pub struct RegistrationSession<S: TailRegistrationApi + 'static> {
    service: Arc<S>,
    form: RegistrationForm,
    commands: mpsc::Receiver<SessionCommand>,
    snapshots: watch::Sender<SessionSnapshot>,
    pending: FuturesUnordered<BoxFuture<'static, SessionEvent>>,
}

impl<S: TailRegistrationApi + 'static> RegistrationSession<S> {
    /// Create a session and the handle that drives it.
    pub fn new(service: Arc<S>) -> (Self, SessionHandle) {
        let form = RegistrationForm::new();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(form.snapshot());

        let session = Self {
            service,
            form,
            commands: command_rx,
            snapshots: snapshot_tx,
            pending: FuturesUnordered::new(),
        };
        let handle = SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (session, handle)
    }

    /// Create a session and run it on the current tokio runtime.
    pub fn spawn(service: Arc<S>) -> (SessionHandle, JoinHandle<()>) {
        let (session, handle) = Self::new(service);
        (handle, tokio::spawn(session.run()))
    }

    /// Run until every handle is dropped.
    ///
    /// Work still in flight at that point is abandoned.
    pub async fn run(mut self) {
        debug!("Registration session started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.pending.next(), if !self.pending.is_empty() => {
                    self.handle_event(event);
                }
            }
            self.publish();
        }
        debug!(abandoned = self.pending.len(), "Registration session stopped");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Edit { field, value } => {
                if let Some(ticket) = self.form.edit(field, &value) {
                    self.start_fetch(ticket);
                }
            }
            SessionCommand::Submit { signature, reply } => match self.form.begin_submission() {
                Ok(request) => {
                    info!(hash = %request.fields.hash(), "Submitting TAIL record");
                    let service = Arc::clone(&self.service);
                    self.pending.push(Box::pin(async move {
                        let result = service
                            .submit(&request.fields, &request.challenge, &signature)
                            .await;
                        SessionEvent::Submitted { result, reply }
                    }));
                }
                Err(error) => {
                    self.publish();
                    let _ = reply.send(Err(error));
                }
            },
        }
    }

    fn start_fetch(&mut self, ticket: FetchTicket) {
        let service = Arc::clone(&self.service);
        self.pending.push(Box::pin(async move {
            let result = service.request_challenge(ticket.key()).await;
            SessionEvent::Challenge { ticket, result }
        }));
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Challenge { ticket, result } => {
                self.form.resolve_challenge(&ticket, result);
            }
            SessionEvent::Submitted { result, reply } => {
                self.form.finish_submission(&result);
                // Callers read the outcome back from the snapshot
                self.publish();
                // Caller may have stopped waiting
                let _ = reply.send(result);
            }
        }
    }

    fn publish(&self) {
        let next = self.form.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}
