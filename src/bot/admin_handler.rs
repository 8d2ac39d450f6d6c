//! Admin menu for managing product photos: upload, list, delete.
//!
//! The admin flow is a small per-chat state kept beside the conversation
//! sessions; it shares nothing with the dialog graph except the photo table.

use std::collections::HashMap;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup};
use tokio::sync::Mutex;
use tracing::info;

use crate::db;
use crate::localization::{t, t_args};

use super::App;

pub const BTN_UPLOAD: &str = "Загрузить фото";
pub const BTN_LIST: &str = "Список фото";
pub const BTN_DELETE: &str = "Удалить фото";
pub const BTN_EXIT: &str = "Выход";

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]{1,64}$").unwrap());

/// Validate a product key typed by an admin.
pub fn is_valid_key(key: &str) -> bool {
    KEY_RE.is_match(key)
}

/// Position inside the admin menu tree.
#[derive(Debug, Clone)]
enum AdminFlow {
    Menu,
    AwaitUploadKey,
    AwaitUploadPhoto { key: String },
    AwaitDeleteKey,
}

/// Per-chat admin flow state. A chat without an entry is not in admin mode.
#[derive(Debug, Default)]
pub struct AdminState {
    inner: Mutex<HashMap<i64, AdminFlow>>,
}

impl AdminState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn close(&self, chat_id: i64) {
        self.inner.lock().await.remove(&chat_id);
    }

    async fn get(&self, chat_id: i64) -> Option<AdminFlow> {
        self.inner.lock().await.get(&chat_id).cloned()
    }

    async fn set(&self, chat_id: i64, flow: AdminFlow) {
        self.inner.lock().await.insert(chat_id, flow);
    }
}

fn menu_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new([
        vec![KeyboardButton::new(BTN_UPLOAD)],
        vec![KeyboardButton::new(BTN_LIST)],
        vec![KeyboardButton::new(BTN_DELETE)],
        vec![KeyboardButton::new(BTN_EXIT)],
    ])
    .resize_keyboard()
}

fn exit_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new([vec![KeyboardButton::new(BTN_EXIT)]]).resize_keyboard()
}

/// Enter the admin menu. The caller has already checked admin rights.
pub async fn open_menu(bot: &Bot, chat_id: ChatId, app: &App) -> Result<()> {
    app.admin.set(chat_id.0, AdminFlow::Menu).await;
    bot.send_message(chat_id, t("admin-menu-prompt"))
        .reply_markup(menu_keyboard())
        .await?;
    Ok(())
}

/// Handle a text message while the chat is in admin mode. Returns `false`
/// when the chat is not in admin mode so the conversation flow runs instead.
pub async fn handle_text(bot: &Bot, chat_id: ChatId, app: &App, text: &str) -> Result<bool> {
    let Some(flow) = app.admin.get(chat_id.0).await else {
        return Ok(false);
    };

    if text == BTN_EXIT {
        app.admin.close(chat_id.0).await;
        bot.send_message(chat_id, t("admin-exit")).await?;
        super::message_handler::send_node_prompt(bot, chat_id, app).await?;
        return Ok(true);
    }

    match flow {
        AdminFlow::Menu => match text {
            BTN_UPLOAD => {
                app.admin.set(chat_id.0, AdminFlow::AwaitUploadKey).await;
                bot.send_message(chat_id, t("admin-upload-ask-key"))
                    .reply_markup(exit_keyboard())
                    .await?;
            }
            BTN_LIST => {
                send_photo_list(bot, chat_id, app).await?;
            }
            BTN_DELETE => {
                app.admin.set(chat_id.0, AdminFlow::AwaitDeleteKey).await;
                bot.send_message(chat_id, t("admin-delete-ask-key"))
                    .reply_markup(exit_keyboard())
                    .await?;
            }
            _ => {
                bot.send_message(chat_id, t("admin-menu-prompt"))
                    .reply_markup(menu_keyboard())
                    .await?;
            }
        },
        AdminFlow::AwaitUploadKey => {
            if is_valid_key(text) {
                app.admin
                    .set(chat_id.0, AdminFlow::AwaitUploadPhoto { key: text.to_string() })
                    .await;
                bot.send_message(chat_id, t_args("admin-upload-ask-photo", &[("key", text)]))
                    .await?;
            } else {
                bot.send_message(chat_id, t("admin-invalid-key")).await?;
            }
        }
        AdminFlow::AwaitUploadPhoto { .. } => {
            bot.send_message(chat_id, t("admin-expected-photo")).await?;
        }
        AdminFlow::AwaitDeleteKey => {
            if is_valid_key(text) {
                let removed = {
                    let conn = app.conn.lock().await;
                    db::delete_photo(&conn, text)?
                };
                let reply = if removed {
                    t_args("admin-delete-done", &[("key", text)])
                } else {
                    t_args("admin-delete-missing", &[("key", text)])
                };
                app.admin.set(chat_id.0, AdminFlow::Menu).await;
                bot.send_message(chat_id, reply)
                    .reply_markup(menu_keyboard())
                    .await?;
            } else {
                bot.send_message(chat_id, t("admin-invalid-key")).await?;
            }
        }
    }

    Ok(true)
}

/// Handle an incoming photo while the chat awaits an upload. Returns `false`
/// when the admin flow is not expecting a photo.
pub async fn handle_photo(bot: &Bot, chat_id: ChatId, app: &App, file_id: String) -> Result<bool> {
    let Some(AdminFlow::AwaitUploadPhoto { key }) = app.admin.get(chat_id.0).await else {
        return Ok(false);
    };

    {
        let conn = app.conn.lock().await;
        db::upsert_photo(&conn, &key, &file_id)?;
    }
    info!(admin_id = %chat_id, key = %key, "product photo uploaded");

    app.admin.set(chat_id.0, AdminFlow::Menu).await;
    bot.send_message(chat_id, t_args("admin-upload-saved", &[("key", &key)]))
        .reply_markup(menu_keyboard())
        .await?;

    Ok(true)
}

async fn send_photo_list(bot: &Bot, chat_id: ChatId, app: &App) -> Result<()> {
    let photos = {
        let conn = app.conn.lock().await;
        db::list_photos(&conn)?
    };

    if photos.is_empty() {
        bot.send_message(chat_id, t("admin-list-empty")).await?;
        return Ok(());
    }

    let mut listing = t("admin-list-header");
    for photo in &photos {
        listing.push_str(&format!("\n• {} — {}", photo.key, photo.created_at));
    }
    bot.send_message(chat_id, listing).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validation_accepts_catalog_style_keys() {
        assert!(is_valid_key("shampoo_color"));
        assert!(is_valid_key("body-cream-2"));
        assert!(is_valid_key("a"));
    }

    #[test]
    fn key_validation_rejects_bad_keys() {
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("Шампунь"));
        assert!(!is_valid_key("has space"));
        assert!(!is_valid_key("UPPER"));
        assert!(!is_valid_key(&"a".repeat(65)));
    }
}
