//! End-to-end tests: signed webhook in, rendered forecast reply out.

mod mock_source;
mod webhook_flow;
