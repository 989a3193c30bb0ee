//! Tests for the sidecar tag file.
