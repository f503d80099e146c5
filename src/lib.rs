//! Interview Orchestrator - Role-aware requirements interviews
//!
//! A session starts with fixed intake questions, classifies the interviewee
//! as IT, business or management, and then walks that role's schema until
//! enough required fields are filled. A chat model words the questions,
//! classifies and extracts fields; without one the interview runs on canned
//! questions and a fallback classification.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
