/*
 * Responsibility
 * - Public interface of the middleware layer
 * - cors::apply(...): consumer of the origin authorization engine
 * - http::apply(...): transport plumbing (request id, tracing, limits)
 */
pub mod cors;
pub mod http;
