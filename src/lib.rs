//! triples - latest upload of a YouTube channel
//!
//! The lookup runs through a chain of [`youtube::YouTubeClient`] decorators:
//! a persistent cache in front of a rate limiter in front of the HTTP client.
//! The binary wires the chain together in [`app::App::from_config`].

pub mod app;
pub mod cache;
pub mod cli;
pub mod health;
pub mod logging;
pub mod text;
pub mod youtube;
