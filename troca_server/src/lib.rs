//! # Troca marketplace server
//! This crate hosts the HTTP and WebSocket front end for the Troca marketplace. It is responsible for:
//! * Exposing the REST API for registration, chats, offers, orders and wallet queries.
//! * Authenticating requests with JWT bearer tokens.
//! * Driving payments through Stripe, including the signed webhook callback.
//! * Pushing negotiation events to connected WebSocket clients in real time.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! Every REST route except `/health`, the `/auth` endpoints and the `/stripe/webhooks` callback requires a
//! bearer token. The webhook is signature-checked rather than token-checked, since Stripe is the caller.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod stripe_routes;
pub mod ws;

#[cfg(test)]
mod endpoint_tests;
