// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Templating and campaign logic
pub mod campaign;
pub mod ratelimit;
pub mod template;

// Collaborators at the edges
pub mod cli;
pub mod mailer;
pub mod records;
pub mod results;
