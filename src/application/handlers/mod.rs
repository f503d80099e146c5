//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod interview;

pub use interview::{
    AbandonInterviewCommand, AbandonInterviewHandler, CompletionSummary, GenerateDocumentHandler,
    GenerateDocumentQuery, GetInterviewStatusHandler, GetInterviewStatusQuery,
    InterviewHandlerError, NextStep, ResumeInterviewCommand, ResumeInterviewHandler,
    ResumeInterviewResult, SessionLocks, StartInterviewCommand, StartInterviewHandler,
    StartInterviewResult, SubmitAnswerCommand, SubmitAnswerHandler, SubmitAnswerResult,
};
