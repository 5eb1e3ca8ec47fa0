//! Registration with the host and the line-delimited JSON protocol it speaks.
//!
//! One request per input line, one response per output line. Requests are
//! tagged by `"type"`:
//!
//! ```text
//! {"type":"feedback","command_line":"ls -la"}
//! {"type":"suggestion"}
//! {"type":"command_line_accepted","history":["ls -la"]}
//! ```

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::engine::{CancellationToken, SuggestionEngine};
use crate::parse::BashParser;
use crate::provider::{
    FeedbackItem, FeedbackKind, FeedbackProvider, JsonAdapterProvider, LastError,
    PROVIDER_DESCRIPTION, PROVIDER_ID, PROVIDER_NAME, PredictionClient, PredictionContext,
    PredictiveSuggestion, SuggestionPredictor,
};
use crate::resolve::{Resolver, ResolverError, SessionResolver};
use crate::session::{SessionState, SessionStats};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("resolution context unavailable: {0}")]
    Resolver(#[from] ResolverError),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Identity,
    Feedback {
        command_line: String,
        #[serde(default)]
        last_error: Option<LastError>,
    },
    Suggestion {
        #[serde(default)]
        client: PredictionClient,
        #[serde(default)]
        context: PredictionContext,
    },
    CanAcceptFeedback {
        #[serde(default)]
        client: PredictionClient,
        kind: FeedbackKind,
    },
    CommandLineAccepted {
        #[serde(default)]
        client: PredictionClient,
        #[serde(default)]
        history: Vec<String>,
    },
    SuggestionDisplayed {
        #[serde(default)]
        client: PredictionClient,
        #[serde(default)]
        session: u32,
        #[serde(default)]
        index: i32,
    },
    SuggestionAccepted {
        #[serde(default)]
        client: PredictionClient,
        #[serde(default)]
        session: u32,
        text: String,
    },
    CommandLineExecuted {
        #[serde(default)]
        client: PredictionClient,
        command_line: String,
        success: bool,
    },
    Stats,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Identity {
        id: &'static str,
        name: &'static str,
        description: &'static str,
    },
    Feedback {
        item: Option<FeedbackItem>,
    },
    Suggestion {
        suggestions: Option<Vec<PredictiveSuggestion>>,
    },
    CanAcceptFeedback {
        accepted: bool,
    },
    /// Reply to a lifecycle event. `routed` is false when the predictor declined that kind.
    Ack {
        routed: bool,
    },
    Stats {
        stats: SessionStats,
    },
    Error {
        message: String,
    },
}

/// A provider registered as both feedback provider and predictor.
///
/// Lifecycle events are delivered only for the feedback kinds the predictor
/// accepts, the way a host routes them.
pub struct Registration {
    provider: JsonAdapterProvider,
}

impl Registration {
    /// Open the resolution context from `config` and register.
    pub fn register(config: &Config) -> Result<Self, StartupError> {
        let resolver = SessionResolver::open(&config.resolver, &config.session)?;
        Ok(Self::with_resolver(Box::new(resolver)))
    }

    /// Register over an already-open resolver.
    pub fn with_resolver(resolver: Box<dyn Resolver>) -> Self {
        let engine = SuggestionEngine::new(Box::new(BashParser::new()), resolver);
        let provider = JsonAdapterProvider::new(engine, Arc::new(SessionState::new()));
        info!("registered {PROVIDER_NAME} ({PROVIDER_ID}) as feedback provider and predictor");
        Self { provider }
    }

    pub fn provider(&self) -> &JsonAdapterProvider {
        &self.provider
    }

    /// Tear down, releasing the resolution context.
    pub fn unregister(self) {
        info!("unregistered {PROVIDER_NAME} ({PROVIDER_ID})");
    }

    pub fn handle(&self, request: Request) -> Response {
        let provider = &self.provider;
        match request {
            Request::Identity => Response::Identity {
                id: PROVIDER_ID,
                name: PROVIDER_NAME,
                description: PROVIDER_DESCRIPTION,
            },
            Request::Feedback {
                command_line,
                last_error,
            } => Response::Feedback {
                item: provider.get_feedback(
                    &command_line,
                    last_error.as_ref(),
                    &CancellationToken::new(),
                ),
            },
            Request::Suggestion { client, context } => Response::Suggestion {
                suggestions: provider.get_suggestion(&client, &context, &CancellationToken::new()),
            },
            Request::CanAcceptFeedback { client, kind } => Response::CanAcceptFeedback {
                accepted: provider.can_accept_feedback(&client, kind),
            },
            Request::CommandLineAccepted { client, history } => {
                self.route(&client, FeedbackKind::CommandLineAccepted, || {
                    provider.on_command_line_accepted(&client, &history)
                })
            }
            Request::SuggestionDisplayed {
                client,
                session,
                index,
            } => self.route(&client, FeedbackKind::SuggestionDisplayed, || {
                provider.on_suggestion_displayed(&client, session, index)
            }),
            Request::SuggestionAccepted {
                client,
                session,
                text,
            } => self.route(&client, FeedbackKind::SuggestionAccepted, || {
                provider.on_suggestion_accepted(&client, session, &text)
            }),
            Request::CommandLineExecuted {
                client,
                command_line,
                success,
            } => self.route(&client, FeedbackKind::CommandLineExecuted, || {
                provider.on_command_line_executed(&client, &command_line, success)
            }),
            Request::Stats => Response::Stats {
                stats: provider.session().stats(),
            },
        }
    }

    fn route(&self, client: &PredictionClient, kind: FeedbackKind, deliver: impl FnOnce()) -> Response {
        let routed = self.provider.can_accept_feedback(client, kind);
        if routed {
            deliver();
        } else {
            debug!("{kind:?} not accepted, dropped");
        }
        Response::Ack { routed }
    }

    /// Decode and handle one protocol line.
    pub fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request),
            Err(e) => {
                warn!("invalid request: {e}");
                Response::Error {
                    message: format!("invalid request: {e}"),
                }
            }
        }
    }

    /// Serve requests from `input` until EOF, writing one response per line.
    pub fn serve<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line);
            serde_json::to_writer(&mut output, &response)?;
            writeln!(output)?;
            output.flush()?;
        }
        Ok(())
    }
}
