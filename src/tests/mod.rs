//! End-to-end cycle scenarios over mock collaborators.

mod cycle_tests;
