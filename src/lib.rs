//! # accobot
//!
//! Local backend for MyACCOBot, a conversational assistant over a folder of
//! financial XML documents.
//!
//! A user points the assistant at a folder inside the sandbox. The folder's
//! top-level `.xml` files are validated and classified into a
//! [`FolderRecord`](accobot_core::models::FolderRecord), and the user then
//! chats about them. Questions go to a remote answering service together
//! with a short window of recent conversation; this crate never answers
//! anything itself.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Sandbox     │──▶│  Ingest      │──▶│  Session     │
//! │  path check  │   │  XML+classify│   │  log, folder │
//! └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                              │
//!                      ┌───────────────────────┤
//!                      ▼                       ▼
//!                 ┌──────────┐          ┌──────────────┐
//!                 │ CLI/REPL │          │ HTTP (axum)  │
//!                 └──────────┘          └──────┬───────┘
//!                                              ▼
//!                                     remote answering service
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Validation, ingest, and submit errors |
//! | [`sandbox`] | Path allow-list for folder requests |
//! | [`picker`] | Folder picker result resolution |
//! | [`xml`] | Well-formedness check and element tree |
//! | [`classify`] | Document type, period, and company extraction |
//! | [`ingest`] | Folder scan pipeline |
//! | [`client`] | HTTP answering-service client |
//! | [`session`] | Conversation session state |
//! | [`chat`] | `ask` and `chat` terminal front ends |
//! | [`server`] | Local HTTP API |

pub mod chat;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod ingest;
pub mod picker;
pub mod sandbox;
pub mod server;
pub mod session;
pub mod xml;
