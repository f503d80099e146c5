//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! It owns nothing the domain could own: per-session turn locking and
//! load/persist around each engine step.

pub mod handlers;

pub use handlers::{
    AbandonInterviewCommand, AbandonInterviewHandler, CompletionSummary, GenerateDocumentHandler,
    GenerateDocumentQuery, GetInterviewStatusHandler, GetInterviewStatusQuery,
    InterviewHandlerError, NextStep, ResumeInterviewCommand, ResumeInterviewHandler,
    ResumeInterviewResult, SessionLocks, StartInterviewCommand, StartInterviewHandler,
    StartInterviewResult, SubmitAnswerCommand, SubmitAnswerHandler, SubmitAnswerResult,
};
