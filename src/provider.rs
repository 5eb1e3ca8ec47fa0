//! Host-facing interfaces: a feedback provider and a suggestion predictor,
//! both implemented by [`JsonAdapterProvider`] over one engine and one session.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::engine::{CancellationToken, SuggestionEngine};
use crate::session::SessionState;

pub const PROVIDER_ID: &str = "6edf7436-db79-4b5b-b889-4e6d6a1c8680";
pub const PROVIDER_NAME: &str = "JsonAdapter";
pub const PROVIDER_DESCRIPTION: &str = "Finds a JSON adapter for a native application.";

/// Feedback events a predictor may ask the host to deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    SuggestionDisplayed,
    SuggestionAccepted,
    CommandLineAccepted,
    CommandLineExecuted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    #[default]
    Terminal,
    Editor,
}

/// Who is asking for predictions.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PredictionClient {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: ClientKind,
}

/// The edit line at the time of a prediction request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PredictionContext {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub cursor: Option<usize>,
}

/// Whatever the host knows about the last command's failure. Not inspected.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LastError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
}

/// A rewrite offered through the feedback channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackItem {
    pub provider_name: String,
    /// Exactly one entry: the rewritten pipeline.
    pub suggested_texts: Vec<String>,
}

/// A rewrite offered through the prediction channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictiveSuggestion {
    pub suggestion_text: String,
}

/// Static identity a host registers a subsystem under.
pub trait Subsystem {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
}

/// Reacts to a command line with an immediate rewrite.
pub trait FeedbackProvider: Subsystem {
    fn get_feedback(
        &self,
        command_line: &str,
        last_error: Option<&LastError>,
        token: &CancellationToken,
    ) -> Option<FeedbackItem>;
}

/// Offers a held suggestion on demand and tracks how it is used.
pub trait SuggestionPredictor: Subsystem {
    /// Which feedback events the host should deliver to this predictor.
    fn can_accept_feedback(&self, client: &PredictionClient, kind: FeedbackKind) -> bool;

    fn get_suggestion(
        &self,
        client: &PredictionClient,
        context: &PredictionContext,
        token: &CancellationToken,
    ) -> Option<Vec<PredictiveSuggestion>>;

    fn on_command_line_accepted(&self, client: &PredictionClient, history: &[String]);

    fn on_suggestion_displayed(&self, client: &PredictionClient, session: u32, count_or_index: i32);

    fn on_suggestion_accepted(&self, client: &PredictionClient, session: u32, accepted: &str);

    fn on_command_line_executed(&self, client: &PredictionClient, command_line: &str, success: bool);
}

pub struct JsonAdapterProvider {
    engine: SuggestionEngine,
    session: Arc<SessionState>,
}

impl JsonAdapterProvider {
    pub fn new(engine: SuggestionEngine, session: Arc<SessionState>) -> Self {
        Self { engine, session }
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }
}

impl Subsystem for JsonAdapterProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn description(&self) -> &'static str {
        PROVIDER_DESCRIPTION
    }
}

impl FeedbackProvider for JsonAdapterProvider {
    fn get_feedback(
        &self,
        command_line: &str,
        _last_error: Option<&LastError>,
        token: &CancellationToken,
    ) -> Option<FeedbackItem> {
        let pipeline = self.engine.analyze(command_line, token)?;
        self.session.produce_suggestion(pipeline.clone());
        Some(FeedbackItem {
            provider_name: PROVIDER_NAME.to_string(),
            suggested_texts: vec![pipeline],
        })
    }
}

impl SuggestionPredictor for JsonAdapterProvider {
    fn can_accept_feedback(&self, _client: &PredictionClient, kind: FeedbackKind) -> bool {
        matches!(kind, FeedbackKind::CommandLineAccepted)
    }

    fn get_suggestion(
        &self,
        client: &PredictionClient,
        _context: &PredictionContext,
        token: &CancellationToken,
    ) -> Option<Vec<PredictiveSuggestion>> {
        if token.is_cancelled() {
            return None;
        }
        let suggestion_text = self.session.request_suggestion()?;
        debug!("offering held suggestion to {}", client.name);
        Some(vec![PredictiveSuggestion { suggestion_text }])
    }

    fn on_command_line_accepted(&self, _client: &PredictionClient, _history: &[String]) {
        self.session.on_command_line_submitted();
    }

    fn on_suggestion_displayed(&self, _client: &PredictionClient, _session: u32, _count_or_index: i32) {
        self.session.on_displayed();
    }

    fn on_suggestion_accepted(&self, _client: &PredictionClient, _session: u32, _accepted: &str) {
        self.session.on_accepted();
    }

    fn on_command_line_executed(&self, _client: &PredictionClient, _command_line: &str, success: bool) {
        self.session.on_command_line_executed(success);
    }
}
