// lib.rs
pub mod aligner;
pub mod alignment_record;
pub mod blast_tab;
pub mod bridge;
pub mod commands;
pub mod config;
pub mod consensus;
pub mod error;
pub mod flank_filter;
pub mod fragment;
pub mod graph;
pub mod matrix;
pub mod merger;
pub mod site;
pub mod tree;
pub mod validator;
