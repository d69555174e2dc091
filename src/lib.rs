//! Multiblog - a small multi-author blogging server
//!
//! Users sign up, start one or more blogs, and write Markdown posts into
//! them. Posts are drafts until published, can be filed under per-blog
//! categories, and collect visitor comments.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod theme;
