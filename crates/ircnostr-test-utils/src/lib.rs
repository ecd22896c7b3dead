// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mocks and an end-to-end harness for ircnostr tests.
//!
//! Only a dev-dependency; nothing here ships in the binary.

pub mod harness;
pub mod mock_sink;
pub mod mock_transport;

pub use harness::{TestHarness, TestHarnessBuilder, TEST_SECRET_KEY};
pub use mock_sink::MockRelaySink;
pub use mock_transport::{MockConnector, MockSession};
