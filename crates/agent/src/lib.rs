//! LLM boundary and query pipeline orchestration.
//!
//! This crate turns natural language into candidate tasks and typed results
//! back into prose. The constrained loop is:
//!
//! 1. **Intent extraction** (`extractor`) - LLM call constrained by the
//!    catalog, parsed defensively into an untrusted `CandidateTask`
//! 2. **Validation** (core `Planner`) - the single trust boundary
//! 3. **Execution** (core `Engine`) - deterministic computation with a trace
//! 4. **Explanation** (`explain`) - LLM rendering with a templated fallback
//!
//! # Safety principle
//!
//! The LLM is strictly a translator. It never chooses what computation runs
//! beyond naming a catalog operation, and it has no way to alter a number the
//! engine produced: the explanation pass reads a frozen `ExecutionResult` and
//! degrades to a template if the model misbehaves or is unreachable.

pub mod explain;
pub mod extractor;
pub mod llm;
pub mod parser;
pub mod pipeline;
pub mod prompts;

pub use explain::ExplanationGenerator;
pub use extractor::IntentExtractor;
pub use llm::{LlmClient, LlmError, OllamaClient};
pub use pipeline::{Pipeline, QueryOutcome};
