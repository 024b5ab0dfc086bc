//! Query routing: a fixed chain of resolvers.
//!
//! A question is offered to each stage in order until one produces an
//! answer:
//!
//! 1. [`Stage::CourseId`]: the leftmost 4-digit course id in the question,
//!    looked up by exact id.
//! 2. [`Stage::CourseTitle`]: the first catalog course whose title occurs
//!    in the question, case-insensitively.
//! 3. [`Stage::Semantic`]: retrieve context with the active strategy and
//!    answer with the active backend.
//!
//! A stage that has nothing to say returns `Ok(None)` and the next stage
//! runs. When every stage passes, [`FALLBACK_ANSWER`] is returned. External
//! service failures in the semantic stage are errors, not fall-throughs.
//!
//! The chain is built once and never reordered; only the policy behind the
//! semantic stage changes at runtime.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::catalog::{find_course_id, Catalog};
use crate::error::{AssistantError, ExternalService};
use crate::policy::ActivePolicy;
use crate::store::ContentStore;

/// Answer returned when no stage resolves the question.
pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't find an answer to your question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CourseId,
    CourseTitle,
    Semantic,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::CourseId => f.write_str("course_id"),
            Stage::CourseTitle => f.write_str("course_title"),
            Stage::Semantic => f.write_str("semantic"),
        }
    }
}

/// The outcome of routing one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The stage that answered, or `None` for the fallback answer.
    pub stage: Option<Stage>,
    pub answer: String,
}

pub struct CourseIdHandler {
    catalog: Arc<Catalog>,
}

impl CourseIdHandler {
    fn process(&self, query: &str) -> Option<String> {
        let id = find_course_id(query)?;
        let course = self.catalog.find_by_id(id)?;
        Some(format!(
            "Course {}: {}. Description: {}",
            course.id, course.title, course.description
        ))
    }
}

pub struct CourseTitleHandler {
    catalog: Arc<Catalog>,
}

impl CourseTitleHandler {
    fn process(&self, query: &str) -> Option<String> {
        let course = self.catalog.find_by_title_in(query)?;
        Some(format!(
            "Found course by title: {}. ID: {}. Description: {}",
            course.title, course.id, course.description
        ))
    }
}

pub struct SemanticHandler {
    store: Option<Arc<dyn ContentStore>>,
    policy: Arc<ActivePolicy>,
}

impl SemanticHandler {
    async fn process(&self, query: &str) -> Result<Option<String>, AssistantError> {
        if query.trim().is_empty() {
            return Ok(None);
        }

        let snapshot = self.policy.snapshot();
        let (Some(strategy), Some(backend)) = (snapshot.strategy, snapshot.backend) else {
            debug!("semantic stage has no active strategy or backend");
            return Ok(None);
        };

        let context = strategy
            .retrieve(query, self.store.as_deref())
            .await
            .map_err(|e| AssistantError::service(ExternalService::ContentStore, e))?;

        let answer = backend
            .generate(query, &context)
            .await
            .map_err(|e| AssistantError::service(ExternalService::Generation, e))?;

        Ok(Some(answer))
    }
}

/// One link in the chain.
pub enum Handler {
    CourseId(CourseIdHandler),
    CourseTitle(CourseTitleHandler),
    Semantic(SemanticHandler),
}

impl Handler {
    pub fn stage(&self) -> Stage {
        match self {
            Handler::CourseId(_) => Stage::CourseId,
            Handler::CourseTitle(_) => Stage::CourseTitle,
            Handler::Semantic(_) => Stage::Semantic,
        }
    }

    /// Try to answer; `Ok(None)` defers to the next stage.
    pub async fn process(&self, query: &str) -> Result<Option<String>, AssistantError> {
        match self {
            Handler::CourseId(h) => Ok(h.process(query)),
            Handler::CourseTitle(h) => Ok(h.process(query)),
            Handler::Semantic(h) => h.process(query).await,
        }
    }
}

pub struct QueryRouter {
    handlers: Vec<Handler>,
    policy: Arc<ActivePolicy>,
}

impl QueryRouter {
    /// Build the chain: course id, then course title, then semantic.
    pub fn new(
        catalog: Arc<Catalog>,
        store: Option<Arc<dyn ContentStore>>,
        policy: Arc<ActivePolicy>,
    ) -> Self {
        let handlers = vec![
            Handler::CourseId(CourseIdHandler {
                catalog: Arc::clone(&catalog),
            }),
            Handler::CourseTitle(CourseTitleHandler { catalog }),
            Handler::Semantic(SemanticHandler {
                store,
                policy: Arc::clone(&policy),
            }),
        ];
        Self { handlers, policy }
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.handlers.iter().map(Handler::stage).collect()
    }

    /// The policy consulted by the semantic stage.
    pub fn policy(&self) -> &Arc<ActivePolicy> {
        &self.policy
    }

    pub async fn resolve(&self, query: &str) -> Result<Resolution, AssistantError> {
        for handler in &self.handlers {
            match handler.process(query).await? {
                Some(answer) if !answer.is_empty() => {
                    debug!(stage = %handler.stage(), "question resolved");
                    return Ok(Resolution {
                        stage: Some(handler.stage()),
                        answer,
                    });
                }
                _ => continue,
            }
        }
        debug!("no stage resolved the question");
        Ok(Resolution {
            stage: None,
            answer: FALLBACK_ANSWER.to_string(),
        })
    }

    pub async fn handle(&self, query: &str) -> Result<String, AssistantError> {
        Ok(self.resolve(query).await?.answer)
    }
}
