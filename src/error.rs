//! Error types for the card pipeline.
//!
//! - `ParamError`: the request failed validation
//! - `CacheError`: a cache backend could not be reached (never fatal)
//! - `CardError`: everything a render can surface to its caller

use std::time::Duration;

use thiserror::Error;

use crate::svg::{self, Node};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid parameters: {0}")]
pub struct ParamError(pub String);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum CardError {
    #[error(transparent)]
    Validation(#[from] ParamError),

    #[error("User \"{0}\" not found")]
    NotFound(String),

    #[error("Rate limit exceeded. Try again in {}s", retry_after_secs(.retry_after))]
    RateLimited { limit: u32, retry_after: Duration },

    #[error("Upstream error: {0:#}")]
    Upstream(#[from] anyhow::Error),
}

fn retry_after_secs(d: &Duration) -> u64 {
    d.as_millis().div_ceil(1000) as u64
}

impl CardError {
    pub fn status_code(&self) -> u16 {
        match self {
            CardError::Validation(_) => 400,
            CardError::NotFound(_) => 404,
            CardError::RateLimited { .. } => 429,
            CardError::Upstream(_) => 502,
        }
    }

    /// Message shown on the error card. Upstream details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            CardError::Upstream(_) => "Internal server error. Please try again.".to_string(),
            other => other.to_string(),
        }
    }

    pub fn to_svg(&self) -> String {
        error_card(&self.public_message())
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CardError::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

pub fn retry_after_header(d: Duration) -> String {
    retry_after_secs(&d).to_string()
}

const ERROR_WIDTH: f64 = 500.0;
const ERROR_HEIGHT: f64 = 120.0;

/// Small standalone card so failures still embed as an image.
pub fn error_card(message: &str) -> String {
    svg::document(ERROR_WIDTH, ERROR_HEIGHT)
        .child(
            Node::rect(ERROR_WIDTH, ERROR_HEIGHT)
                .attr("fill", "#1a1b27")
                .attr("rx", "10"),
        )
        .child(
            Node::rect(ERROR_WIDTH, ERROR_HEIGHT)
                .attr("fill", "none")
                .attr("stroke", "#d73a4a")
                .attr("stroke-width", "2")
                .attr("rx", "10"),
        )
        .child(
            Node::text("Error")
                .attr("x", "250")
                .attr("y", "60")
                .attr("text-anchor", "middle")
                .attr("fill", "#d73a4a")
                .attr("font-size", "16")
                .attr("font-weight", "bold"),
        )
        .child(
            Node::text(message)
                .attr("x", "250")
                .attr("y", "85")
                .attr("text-anchor", "middle")
                .attr("fill", "#e0e0e0")
                .attr("font-size", "12"),
        )
        .to_markup()
}
