//! Interactive boundary
//!
//! The pipeline never blocks on a UI call. It emits a [`Request`] and waits
//! for the caller to supply an [`Answer`]; a [`Prompter`] is just one way of
//! producing those answers.

use std::collections::VecDeque;

use crate::kernel::{BodyId, FaceId};

/// Kind of entity a selection prompt accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityFilter {
    Bodies,
    Faces,
}

/// An entity picked by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Body(BodyId),
    Face(FaceId),
}

/// Input the pipeline is waiting for
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Pick an entity in the document
    SelectEntity { prompt: String, filter: EntityFilter },
    /// Free-form text answer with a suggested default
    Choice {
        title: String,
        message: String,
        default: String,
    },
}

impl Request {
    pub fn select(prompt: impl Into<String>, filter: EntityFilter) -> Self {
        Request::SelectEntity {
            prompt: prompt.into(),
            filter,
        }
    }

    pub fn choice(
        title: impl Into<String>,
        message: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        Request::Choice {
            title: title.into(),
            message: message.into(),
            default: default.into(),
        }
    }
}

/// Answer to a [`Request`]
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Entity(EntityRef),
    Text(String),
    /// The user dismissed the prompt
    Cancelled,
}

/// The user dismissed a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Source of user answers and sink for user-facing messages
pub trait Prompter {
    /// Ask the user to pick an entity
    fn select_entity(&mut self, prompt: &str, filter: EntityFilter) -> Result<EntityRef, Cancelled>;

    /// Ask the user for a text value
    fn prompt_choice(
        &mut self,
        title: &str,
        message: &str,
        default: &str,
    ) -> Result<String, Cancelled>;

    /// Show an informational message
    fn notify(&mut self, message: &str);

    /// Answer a pipeline request
    fn ask(&mut self, request: &Request) -> Answer {
        match request {
            Request::SelectEntity { prompt, filter } => match self.select_entity(prompt, *filter) {
                Ok(entity) => Answer::Entity(entity),
                Err(Cancelled) => Answer::Cancelled,
            },
            Request::Choice {
                title,
                message,
                default,
            } => match self.prompt_choice(title, message, default) {
                Ok(text) => Answer::Text(text),
                Err(Cancelled) => Answer::Cancelled,
            },
        }
    }
}

/// Prompter that replays a fixed list of answers
///
/// Requests and notices are recorded for inspection. Running out of answers
/// counts as cancelling.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    /// Every request asked, in order
    pub requests: Vec<Request>,
    /// Every notice shown, in order
    pub notices: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn body(mut self, id: BodyId) -> Self {
        self.answers.push_back(Answer::Entity(EntityRef::Body(id)));
        self
    }

    pub fn face(mut self, id: FaceId) -> Self {
        self.answers.push_back(Answer::Entity(EntityRef::Face(id)));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.answers.push_back(Answer::Text(text.into()));
        self
    }

    pub fn cancel(mut self) -> Self {
        self.answers.push_back(Answer::Cancelled);
        self
    }

    /// Answers not yet consumed
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self) -> Answer {
        self.answers.pop_front().unwrap_or_else(|| {
            tracing::warn!("Scripted prompter ran out of answers");
            Answer::Cancelled
        })
    }
}

impl Prompter for ScriptedPrompter {
    fn select_entity(&mut self, prompt: &str, filter: EntityFilter) -> Result<EntityRef, Cancelled> {
        self.requests.push(Request::select(prompt, filter));
        match self.next() {
            Answer::Entity(entity) => Ok(entity),
            Answer::Cancelled => Err(Cancelled),
            Answer::Text(text) => {
                tracing::warn!("Scripted text '{}' given for an entity selection", text);
                Err(Cancelled)
            }
        }
    }

    fn prompt_choice(
        &mut self,
        title: &str,
        message: &str,
        default: &str,
    ) -> Result<String, Cancelled> {
        self.requests.push(Request::choice(title, message, default));
        match self.next() {
            Answer::Text(text) => Ok(text),
            Answer::Cancelled => Err(Cancelled),
            Answer::Entity(entity) => {
                tracing::warn!("Scripted entity {:?} given for a text prompt", entity);
                Err(Cancelled)
            }
        }
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }

    /// Scripted answers pass through unchanged so mismatches reach the pipeline
    fn ask(&mut self, request: &Request) -> Answer {
        self.requests.push(request.clone());
        self.next()
    }
}
