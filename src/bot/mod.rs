//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Routes incoming messages into the conversation or
//!   the admin flow and renders recommendations
//! - `ui_builder`: Creates keyboards and formats messages
//! - `admin_handler`: The photo-management menu for admin chats

pub mod admin_handler;
pub mod message_handler;
pub mod ui_builder;

use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::dialogue::SessionStore;
use crate::graph::DialogGraph;

pub use admin_handler::AdminState;
pub use message_handler::message_handler;

/// Shared application state handed to every handler.
pub struct App {
    pub config: Config,
    pub graph: DialogGraph,
    pub sessions: SessionStore,
    pub admin: AdminState,
    pub conn: Mutex<Connection>,
}

impl App {
    pub fn new(config: Config, graph: DialogGraph, conn: Connection) -> Self {
        Self {
            config,
            graph,
            sessions: SessionStore::new(),
            admin: AdminState::new(),
            conn: Mutex::new(conn),
        }
    }
}
