pub mod assessment_client;
pub mod circuit_breaker;
pub mod openai_transport;
pub mod prompt;
pub mod response_parser;
pub mod transport;

pub use assessment_client::{AssessmentClient, RetryPolicy};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot};
pub use openai_transport::OpenAiTransport;
pub use response_parser::{parse_and_validate, parse_response, validate_scores};
pub use transport::{CompletionRequest, CompletionResponse, CompletionTransport, TransportError};
