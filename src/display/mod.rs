//! Terminal display of analysis results.
//!
//! Provides styled tables and the `Display` impls the CLI prints in text
//! mode.

pub mod tables;

pub use tables::{
    TableBuilder, create_cluster_table, create_gap_table, create_search_tables,
};
