//! Integration tests for cloudmirror-notify
//!
//! Uses wiremock to stand in for the event consumer and verifies the wire
//! format and status handling of the HTTP notifier.

mod common;
