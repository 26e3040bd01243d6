//! # Kantin server
//! The HTTP front end of the Kantin payment gateway. It is responsible for:
//! * Serving the guest-facing cart, checkout and order endpoints. The guest is identified by the `X-Guest-Id` header.
//! * Serving the vendor endpoints that complete or cancel their part of an order.
//! * Receiving payment notifications from Midtrans and handing them to the reconciler.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/...`: Cart, checkout, payment, order and fulfillment routes. See [routes](routes/index.html).
//! * `/midtrans/notification`: The Midtrans HTTP notification webhook. Requests must carry a valid `signature_key`.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
