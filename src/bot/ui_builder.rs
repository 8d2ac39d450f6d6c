//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{KeyboardButton, KeyboardMarkup};

use crate::dialogue::{BACK_LABEL, DONE_LABEL, SELECTED_PREFIX, UNSELECTED_PREFIX};
use crate::graph::{DialogGraph, NodeId, NodeKind};
use crate::localization::t;

/// Reply keyboard for a question node. Single-choice nodes list one option
/// per row; the multi-select renders the checkbox state of every option from
/// the session's working set. Non-entry nodes get a «Назад» row.
pub fn create_node_keyboard(graph: &DialogGraph, node_id: NodeId, pending: &[String]) -> KeyboardMarkup {
    let mut rows: Vec<Vec<KeyboardButton>> = Vec::new();

    match graph.node(node_id).kind {
        NodeKind::SingleChoice { options, .. } => {
            for option in options {
                rows.push(vec![KeyboardButton::new(option.label)]);
            }
        }
        NodeKind::MultiChoice { options, .. } => {
            for label in options {
                let prefix = if pending.iter().any(|p| p == label) {
                    SELECTED_PREFIX
                } else {
                    UNSELECTED_PREFIX
                };
                rows.push(vec![KeyboardButton::new(format!("{prefix}{label}"))]);
            }
            rows.push(vec![KeyboardButton::new(DONE_LABEL)]);
        }
        NodeKind::Terminal => {}
    }

    if node_id != DialogGraph::ENTRY {
        rows.push(vec![KeyboardButton::new(BACK_LABEL)]);
    }

    KeyboardMarkup::new(rows).resize_keyboard()
}

/// The localized question text of a node.
pub fn node_prompt(graph: &DialogGraph, node_id: NodeId) -> String {
    t(graph.node(node_id).prompt)
}

/// Bullet for a product rendered as plain text.
pub fn format_product_line(name: &str) -> String {
    format!("• {name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_select_keyboard_reflects_pending_set() {
        let graph = DialogGraph::build().unwrap();
        let pending = vec!["Сухость".to_string()];

        let keyboard = create_node_keyboard(&graph, NodeId::HairProblems, &pending);

        let texts: Vec<String> = keyboard
            .keyboard
            .iter()
            .flatten()
            .map(|b| b.text.clone())
            .collect();
        assert!(texts.contains(&format!("{SELECTED_PREFIX}Сухость")));
        assert!(texts.contains(&format!("{UNSELECTED_PREFIX}Ломкость")));
        assert!(texts.contains(&DONE_LABEL.to_string()));
        assert!(texts.contains(&BACK_LABEL.to_string()));
    }

    #[test]
    fn entry_keyboard_has_no_back_row() {
        let graph = DialogGraph::build().unwrap();

        let keyboard = create_node_keyboard(&graph, NodeId::MainMenu, &[]);

        let texts: Vec<String> = keyboard
            .keyboard
            .iter()
            .flatten()
            .map(|b| b.text.clone())
            .collect();
        assert_eq!(texts, vec!["Уход за телом", "Уход за волосами"]);
    }
}
