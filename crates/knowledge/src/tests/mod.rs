//! End-to-end tests of the answering pipeline against a scripted engine.

mod support;
