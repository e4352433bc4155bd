//! BlueBuddy Domain Library
//!
//! Core domain types and interfaces for automated wellness check-in calls
//! placed on behalf of caregivers.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: Core domain models (Transcript, CallSession, PatientContext, CallLog)
//!   - `value_objects/`: Immutable value types (MedicationStatus, CallStatus, CallPhase)
//!   - `services/`: Model-backed helpers (classifier, responder, summarizer) and prompts
//!   - `errors/`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `repositories/`: Call log persistence
//!   - `services/`: Language model and telephony providers
//!
//! # Usage
//!
//! ```rust,ignore
//! use bluebuddy::domain::{CallSession, PatientContext, Transcript};
//! use bluebuddy::ports::{CallLogRepository, LlmProvider, TelephonyProvider};
//! ```

pub mod domain;
pub mod ports;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use domain::{
    CallLog, CallPhase, CallSession, CallSessionSnapshot, CallStatus, CallSummarizer, CallSummary,
    CallbackUrls, ClassifiedTurn, ConversationResponder, DomainError, MedicationStatus,
    MedicationUpdate, NewCallLog, PatientContext, Reply, SpeechTurnClassifier, Transcript, Turn,
    TurnRole, VoiceInstruction, VoiceScript,
};
pub use ports::{
    // Repositories
    CallLogRepository,
    // Services
    CompletionOptions,
    CompletionResponse,
    LlmProvider,
    OutboundCall,
    PlacedCall,
    ResponseFormat,
    TelephonyProvider,
    TokenUsage,
};
