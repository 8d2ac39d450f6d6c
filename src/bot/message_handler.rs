//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile};
use tracing::{error, info, warn};

use crate::catalog::{self, RecLine};
use crate::db;
use crate::dialogue::{AnswerSheet, Progress, Rejection};
use crate::localization::t;

use super::admin_handler;
use super::ui_builder::{create_node_keyboard, format_product_line, node_prompt};
use super::App;

/// Entry point for every incoming message.
pub async fn message_handler(bot: Bot, msg: Message, app: std::sync::Arc<App>) -> Result<()> {
    let chat_id = msg.chat.id;

    if let Some(photos) = msg.photo() {
        // Photos only matter to the admin upload flow; the largest size is
        // the one worth keeping.
        if app.config.is_admin(chat_id.0) {
            if let Some(photo) = photos.last() {
                let file_id = photo.file.id.0.clone();
                if admin_handler::handle_photo(&bot, chat_id, &app, file_id).await? {
                    return Ok(());
                }
            }
        }
        bot.send_message(chat_id, t("use-menu")).await?;
        return Ok(());
    }

    let Some(text) = msg.text() else {
        bot.send_message(chat_id, t("use-menu")).await?;
        return Ok(());
    };
    let text = text.trim();

    match text {
        "/start" => start_conversation(&bot, chat_id, &app).await,
        "/admin" => {
            if app.config.is_admin(chat_id.0) {
                admin_handler::open_menu(&bot, chat_id, &app).await
            } else {
                warn!(user_id = %chat_id, "admin menu requested by non-admin");
                bot.send_message(chat_id, t("admin-denied")).await?;
                Ok(())
            }
        }
        _ => {
            if admin_handler::handle_text(&bot, chat_id, &app, text).await? {
                return Ok(());
            }
            conversation_input(&bot, chat_id, &app, text).await
        }
    }
}

async fn start_conversation(bot: &Bot, chat_id: ChatId, app: &App) -> Result<()> {
    info!(user_id = %chat_id, "conversation started");
    app.admin.close(chat_id.0).await;
    app.sessions.reset(chat_id.0).await;

    bot.send_message(chat_id, t("greeting")).await?;
    send_node_prompt(bot, chat_id, app).await
}

/// Send the current question with its keyboard, as recorded in the session.
pub async fn send_node_prompt(bot: &Bot, chat_id: ChatId, app: &App) -> Result<()> {
    let (node, pending) = app.sessions.view(chat_id.0).await;
    bot.send_message(chat_id, node_prompt(&app.graph, node))
        .reply_markup(create_node_keyboard(&app.graph, node, &pending))
        .await?;
    Ok(())
}

async fn conversation_input(bot: &Bot, chat_id: ChatId, app: &App, text: &str) -> Result<()> {
    match app.sessions.advance(&app.graph, chat_id.0, text).await {
        Ok(Progress::Moved(_)) | Ok(Progress::Back(_)) | Ok(Progress::Toggled { .. }) => {
            // Reply keyboards cannot be edited in place, so a toggle re-sends
            // the question with the updated checkboxes.
            send_node_prompt(bot, chat_id, app).await
        }
        Ok(Progress::MenuReset) => {
            bot.send_message(chat_id, t("back-to-menu")).await?;
            send_node_prompt(bot, chat_id, app).await
        }
        Ok(Progress::Completed(answers)) => {
            send_recommendation(bot, chat_id, app, &answers).await
        }
        Err(Rejection::InvalidChoice) => {
            bot.send_message(chat_id, t("invalid-choice")).await?;
            send_node_prompt(bot, chat_id, app).await
        }
    }
}

/// Render the combined recommendation. Products with an uploaded photo are
/// sent as illustrated messages; everything else accumulates into text
/// blocks. A failed photo lookup or send degrades that line to text.
async fn send_recommendation(
    bot: &Bot,
    chat_id: ChatId,
    app: &App,
    answers: &AnswerSheet,
) -> Result<()> {
    let lines = match catalog::recommend(&app.graph, answers) {
        Ok(lines) => lines,
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "recommendation failed");
            bot.send_message(chat_id, t("recommendation-failed")).await?;
            return send_node_prompt(bot, chat_id, app).await;
        }
    };

    info!(user_id = %chat_id, lines = lines.len(), "sending recommendation");
    bot.send_message(chat_id, t("recommendation-header")).await?;

    let mut block = String::new();
    for line in lines {
        match line {
            RecLine::Heading(heading) => {
                if !block.is_empty() {
                    block.push('\n');
                }
                block.push_str(heading);
            }
            RecLine::Product(product) => {
                match stored_photo(app, product.photo).await {
                    Some(file_id) => {
                        flush_block(bot, chat_id, &mut block).await?;
                        let photo = InputFile::file_id(FileId(file_id));
                        if let Err(e) =
                            bot.send_photo(chat_id, photo).caption(product.name).await
                        {
                            warn!(user_id = %chat_id, error = %e, "photo send failed, falling back to text");
                            push_line(&mut block, &format_product_line(product.name));
                        }
                    }
                    None => push_line(&mut block, &format_product_line(product.name)),
                }
            }
        }
    }
    flush_block(bot, chat_id, &mut block).await?;

    let (node, pending) = app.sessions.view(chat_id.0).await;
    bot.send_message(chat_id, t("recommendation-footer"))
        .reply_markup(create_node_keyboard(&app.graph, node, &pending))
        .await?;

    Ok(())
}

/// Look up a product's uploaded photo; lookup failures degrade to text.
async fn stored_photo(app: &App, key: Option<&'static str>) -> Option<String> {
    let key = key?;
    let conn = app.conn.lock().await;
    match db::get_photo(&conn, key) {
        Ok(file_id) => file_id,
        Err(e) => {
            warn!(key, error = %e, "photo lookup failed");
            None
        }
    }
}

fn push_line(block: &mut String, line: &str) {
    if !block.is_empty() {
        block.push('\n');
    }
    block.push_str(line);
}

async fn flush_block(bot: &Bot, chat_id: ChatId, block: &mut String) -> Result<()> {
    if block.is_empty() {
        return Ok(());
    }
    bot.send_message(chat_id, std::mem::take(block)).await?;
    Ok(())
}
