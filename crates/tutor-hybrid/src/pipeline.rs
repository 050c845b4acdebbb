use serde::Serialize;
use tracing::{info, warn};

use tutor_core::levels::YearLevel;
use tutor_core::traits::{Classifier, Generator};
use tutor_core::types::Excerpt;
use tutor_core::{Error, Result};

use crate::activity::ActivityRequest;
use crate::prompt::{fixed_prompt, grounded_prompt, redirect_prompt};
use crate::retriever::HybridRetriever;

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a query first.";
pub const GENERATION_FAILED_BODY: &str = "Unable to generate the activity. Please check the model connection.";
const CURRICULUM_NOTE: &str = "This content is based on the Victorian Curriculum F–10 Version 2.0.";

/// Everything decided before the generation call.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedLesson {
    pub request: ActivityRequest,
    pub level: YearLevel,
    pub query: String,
    pub prompt: String,
    pub excerpts: Vec<Excerpt>,
    /// Relevance gate decision; `None` for fixed activities.
    pub relevant: Option<bool>,
    pub diagnostics: Vec<String>,
}

impl PreparedLesson {
    pub fn title(&self) -> String {
        format!("{} Activity for {}", self.request.label(), self.level)
    }

    /// `science_Year_2` style stem for saved output.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.request.label().to_lowercase(), self.level.file_label())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Lesson {
    pub title: String,
    pub body: String,
    pub prompt: String,
    pub excerpts: Vec<Excerpt>,
    pub relevant: Option<bool>,
    pub diagnostics: Vec<String>,
    pub file_stem: String,
}

impl Lesson {
    /// Markdown with a curriculum note, the title heading, the body and a
    /// closing call to action.
    pub fn to_markdown(&self) -> String {
        format!("{CURRICULUM_NOTE}\n\n### {}\n\n{}\n\n---\n\n**Complete your activity!**\n", self.title, self.body.trim_end())
    }
}

/// Request in, prompt (and optionally generated lesson) out.
pub struct LessonPipeline<'a> {
    retriever: &'a HybridRetriever,
    classifier: &'a dyn Classifier,
    top_k: usize,
}

impl<'a> LessonPipeline<'a> {
    pub fn new(retriever: &'a HybridRetriever, classifier: &'a dyn Classifier, top_k: usize) -> Self {
        Self { retriever, classifier, top_k }
    }

    /// Build the prompt for `request` at `level`.
    ///
    /// Custom requests run retrieval and the relevance gate side by side; the
    /// gate alone picks the prompt, so excerpts are dropped from an off-topic
    /// prompt even when retrieval found some.
    pub async fn prepare(&self, request: &ActivityRequest, level: YearLevel) -> Result<PreparedLesson> {
        match request {
            ActivityRequest::Custom { query, area } => {
                if query.trim().is_empty() {
                    return Err(Error::InvalidInput(EMPTY_QUERY_MESSAGE.to_string()));
                }
                if !self.retriever.corpus().has_learning_area(area) {
                    return Err(Error::InvalidInput(format!("Unknown learning area '{area}'")));
                }
                let retrieval = self.retriever.retrieve(query, area, level, self.top_k).await;
                let relevant = self.classifier.is_relevant(query, area);
                let prompt = if relevant {
                    grounded_prompt(area, level, query, &retrieval.excerpts)
                } else {
                    redirect_prompt(area, level, query)
                };
                info!(area = %area, level = %level, relevant, excerpts = retrieval.excerpts.len(), "prepared custom lesson");
                Ok(PreparedLesson {
                    request: request.clone(),
                    level,
                    query: query.clone(),
                    prompt,
                    excerpts: retrieval.excerpts,
                    relevant: Some(relevant),
                    diagnostics: retrieval.diagnostic.map(|e| e.to_string()).into_iter().collect(),
                })
            }
            ActivityRequest::Fixed { kind } => Ok(PreparedLesson {
                request: request.clone(),
                level,
                query: format!("Generate a {} activity for {level}", kind.name().to_lowercase()),
                prompt: fixed_prompt(*kind, level),
                excerpts: Vec::new(),
                relevant: None,
                diagnostics: Vec::new(),
            }),
        }
    }

    /// Prepare, then generate. A generation failure still yields a lesson
    /// with a fixed apology body and a diagnostic.
    pub async fn run(&self, request: &ActivityRequest, level: YearLevel, generator: &dyn Generator) -> Result<Lesson> {
        let prepared = self.prepare(request, level).await?;
        let title = prepared.title();
        let file_stem = prepared.file_stem();
        let mut diagnostics = prepared.diagnostics;
        let body = match generator.generate(&prepared.prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "generation failed");
                diagnostics.push(format!("Error generating activity: {e}"));
                GENERATION_FAILED_BODY.to_string()
            }
        };
        Ok(Lesson {
            title,
            body,
            prompt: prepared.prompt,
            excerpts: prepared.excerpts,
            relevant: prepared.relevant,
            diagnostics,
            file_stem,
        })
    }
}
