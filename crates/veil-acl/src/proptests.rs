//! Property-based tests for evaluation and filtering.
