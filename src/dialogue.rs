//! Conversation state machine: per-chat session, answer sheet and the
//! `advance` transition function driven by the static dialog graph.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::graph::{Category, DialogGraph, NodeId, NodeKind};

/// Back sentinel, valid at every non-entry node.
pub const BACK_LABEL: &str = "Назад";
/// Commit sentinel of multi-choice nodes.
pub const DONE_LABEL: &str = "Готово";
/// Prefix rendered before a selected multi-choice option.
pub const SELECTED_PREFIX: &str = "✅ ";
/// Prefix rendered before an unselected multi-choice option.
pub const UNSELECTED_PREFIX: &str = "☐ ";

/// Answers accumulated along the dialog path. A `None` field means the
/// category has not been visited yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSheet {
    pub body_goal: Option<String>,
    pub hair_type: Option<String>,
    pub hair_problems: Option<Vec<String>>,
    pub scalp_type: Option<String>,
    pub volume_need: Option<String>,
    pub hair_color: Option<String>,
}

impl AnswerSheet {
    pub fn record(&mut self, category: Category, label: &str) {
        match category {
            Category::BodyGoal => self.body_goal = Some(label.to_string()),
            Category::HairType => self.hair_type = Some(label.to_string()),
            Category::ScalpType => self.scalp_type = Some(label.to_string()),
            Category::VolumeNeed => self.volume_need = Some(label.to_string()),
            Category::HairColor => self.hair_color = Some(label.to_string()),
            Category::HairProblems => self.hair_problems = Some(vec![label.to_string()]),
        }
    }

    /// Commit a multi-select result, preserving the selection order.
    pub fn record_many(&mut self, category: Category, labels: Vec<String>) {
        if category == Category::HairProblems {
            self.hair_problems = Some(labels);
        }
    }

    pub fn clear(&mut self, category: Category) {
        match category {
            Category::BodyGoal => self.body_goal = None,
            Category::HairType => self.hair_type = None,
            Category::HairProblems => self.hair_problems = None,
            Category::ScalpType => self.scalp_type = None,
            Category::VolumeNeed => self.volume_need = None,
            Category::HairColor => self.hair_color = None,
        }
    }

    pub fn single(&self, category: Category) -> Option<&str> {
        match category {
            Category::BodyGoal => self.body_goal.as_deref(),
            Category::HairType => self.hair_type.as_deref(),
            Category::ScalpType => self.scalp_type.as_deref(),
            Category::VolumeNeed => self.volume_need.as_deref(),
            Category::HairColor => self.hair_color.as_deref(),
            Category::HairProblems => None,
        }
    }

    /// Selected secondary problems in selection order; empty when the
    /// multi-select was skipped or committed empty.
    pub fn problems(&self) -> &[String] {
        self.hair_problems.as_deref().unwrap_or(&[])
    }
}

/// Conversation state of one chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub chat_id: i64,
    pub node: NodeId,
    pub answers: AnswerSheet,
    /// Multi-select working set, scoped to the current multi-choice node.
    pub pending: Vec<String>,
}

impl Session {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            node: DialogGraph::ENTRY,
            answers: AnswerSheet::default(),
            pending: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.node = DialogGraph::ENTRY;
        self.answers = AnswerSheet::default();
        self.pending.clear();
    }
}

/// Successful outcome of one `advance` step.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// Moved forward to a new question node.
    Moved(NodeId),
    /// Toggled a multi-choice option; still on the same node.
    Toggled { label: String, selected: bool },
    /// Back navigation landed on the given question node.
    Back(NodeId),
    /// Backed out of the first question; session reset to the main menu.
    MenuReset,
    /// A terminal node was reached; the answers are final.
    Completed(AnswerSheet),
}

/// Rejected input. The session is left untouched and the caller re-prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InvalidChoice,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::InvalidChoice => write!(f, "input does not match any option"),
        }
    }
}

impl std::error::Error for Rejection {}

/// Strip the rendered checkbox prefix so matching runs on the stable label.
fn strip_presentation(input: &str) -> &str {
    input
        .strip_prefix(SELECTED_PREFIX)
        .or_else(|| input.strip_prefix(UNSELECTED_PREFIX))
        .unwrap_or(input)
}

/// Apply one user input to the session. Invalid input leaves the session
/// unchanged; every state change happens before returning `Ok`.
pub fn advance(
    graph: &DialogGraph,
    session: &mut Session,
    raw_input: &str,
) -> Result<Progress, Rejection> {
    let input = strip_presentation(raw_input.trim());
    let node = graph.node(session.node);

    if input == BACK_LABEL && session.node != DialogGraph::ENTRY {
        return Ok(go_back(graph, session));
    }

    match node.kind {
        NodeKind::SingleChoice { category, options } => {
            let choice = options
                .iter()
                .find(|o| o.label == input)
                .ok_or(Rejection::InvalidChoice)?;
            if let Some(category) = category {
                session.answers.record(category, choice.label);
            }
            Ok(enter(graph, session, choice.next))
        }
        NodeKind::MultiChoice { category, options, next } => {
            if input == DONE_LABEL {
                let selected = std::mem::take(&mut session.pending);
                session.answers.record_many(category, selected);
                return Ok(enter(graph, session, next));
            }
            let label = options
                .iter()
                .copied()
                .find(|&l| l == input)
                .ok_or(Rejection::InvalidChoice)?;
            if let Some(pos) = session.pending.iter().position(|p| p == label) {
                session.pending.remove(pos);
                Ok(Progress::Toggled {
                    label: label.to_string(),
                    selected: false,
                })
            } else {
                session.pending.push(label.to_string());
                Ok(Progress::Toggled {
                    label: label.to_string(),
                    selected: true,
                })
            }
        }
        // Terminals are never waited on: the session resets the moment one
        // is reached, so any input here is a stray message.
        NodeKind::Terminal => Err(Rejection::InvalidChoice),
    }
}

/// Move into `target`. Entering a terminal snapshots the answers and resets
/// the session; entering a multi-choice clears the working set.
fn enter(graph: &DialogGraph, session: &mut Session, target: NodeId) -> Progress {
    match graph.node(target).kind {
        NodeKind::Terminal => {
            let answers = std::mem::take(&mut session.answers);
            session.reset();
            Progress::Completed(answers)
        }
        NodeKind::MultiChoice { .. } => {
            session.pending.clear();
            session.node = target;
            Progress::Moved(target)
        }
        NodeKind::SingleChoice { .. } => {
            session.node = target;
            Progress::Moved(target)
        }
    }
}

fn go_back(graph: &DialogGraph, session: &mut Session) -> Progress {
    session.pending.clear();
    match graph.prev(session.node) {
        Some(prev) if prev == DialogGraph::ENTRY => {
            session.reset();
            Progress::MenuReset
        }
        Some(prev) => {
            // The predecessor gets re-asked, so its recorded answer is
            // dropped to keep the answers-follow-the-path invariant.
            if let Some(category) = node_category(graph, prev) {
                session.answers.clear(category);
            }
            session.node = prev;
            Progress::Back(prev)
        }
        // The entry node is guarded by the caller; nothing to go back to.
        None => Progress::MenuReset,
    }
}

fn node_category(graph: &DialogGraph, id: NodeId) -> Option<Category> {
    match graph.node(id).kind {
        NodeKind::SingleChoice { category, .. } => category,
        NodeKind::MultiChoice { category, .. } => Some(category),
        NodeKind::Terminal => None,
    }
}

/// Session store handle: one mutable cell per chat id behind a single lock.
/// Inputs of one chat are serialized by the lock, matching the ordering
/// guarantee of the state machine.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<i64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one input to the chat's session, creating it on first contact.
    pub async fn advance(
        &self,
        graph: &DialogGraph,
        chat_id: i64,
        input: &str,
    ) -> Result<Progress, Rejection> {
        let mut sessions = self.inner.lock().await;
        let session = sessions
            .entry(chat_id)
            .or_insert_with(|| Session::new(chat_id));
        advance(graph, session, input)
    }

    /// Reset the chat's session to the main menu.
    pub async fn reset(&self, chat_id: i64) {
        let mut sessions = self.inner.lock().await;
        sessions.insert(chat_id, Session::new(chat_id));
    }

    /// Current node and multi-select working set, for keyboard rendering.
    pub async fn view(&self, chat_id: i64) -> (NodeId, Vec<String>) {
        let sessions = self.inner.lock().await;
        match sessions.get(&chat_id) {
            Some(session) => (session.node, session.pending.clone()),
            None => (DialogGraph::ENTRY, Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> DialogGraph {
        DialogGraph::build().unwrap()
    }

    fn hair_session(graph: &DialogGraph) -> Session {
        let mut session = Session::new(1);
        advance(graph, &mut session, "Уход за волосами").unwrap();
        session
    }

    #[test]
    fn invalid_input_leaves_state_untouched() {
        let graph = graph();
        let mut session = Session::new(1);
        let before = session.clone();

        let result = advance(&graph, &mut session, "что-нибудь");

        assert_eq!(result, Err(Rejection::InvalidChoice));
        assert_eq!(session.node, before.node);
        assert_eq!(session.answers, before.answers);
    }

    #[test]
    fn branch_selector_records_no_answer() {
        let graph = graph();
        let session = hair_session(&graph);

        assert_eq!(session.node, NodeId::HairType);
        assert_eq!(session.answers, AnswerSheet::default());
    }

    #[test]
    fn double_toggle_is_identity() {
        let graph = graph();
        let mut session = hair_session(&graph);
        advance(&graph, &mut session, "Окрашенные").unwrap();

        let first = advance(&graph, &mut session, "Сухость").unwrap();
        assert_eq!(
            first,
            Progress::Toggled {
                label: "Сухость".to_string(),
                selected: true
            }
        );
        let second = advance(&graph, &mut session, "Сухость").unwrap();
        assert_eq!(
            second,
            Progress::Toggled {
                label: "Сухость".to_string(),
                selected: false
            }
        );
        assert!(session.pending.is_empty());
    }

    #[test]
    fn toggle_matches_with_checkbox_prefix() {
        let graph = graph();
        let mut session = hair_session(&graph);
        advance(&graph, &mut session, "Окрашенные").unwrap();

        advance(&graph, &mut session, "☐ Ломкость").unwrap();
        assert_eq!(session.pending, vec!["Ломкость".to_string()]);
        advance(&graph, &mut session, "✅ Ломкость").unwrap();
        assert!(session.pending.is_empty());
    }

    #[test]
    fn double_toggled_problem_is_absent_after_commit() {
        let graph = graph();
        let mut session = hair_session(&graph);
        advance(&graph, &mut session, "Окрашенные").unwrap();

        advance(&graph, &mut session, "Сухость").unwrap();
        advance(&graph, &mut session, "Сухость").unwrap();
        let progress = advance(&graph, &mut session, "Готово").unwrap();

        assert_eq!(progress, Progress::Moved(NodeId::ScalpType));
        assert_eq!(session.answers.hair_problems, Some(Vec::new()));
    }

    #[test]
    fn commit_preserves_selection_order() {
        let graph = graph();
        let mut session = hair_session(&graph);
        advance(&graph, &mut session, "Окрашенные").unwrap();

        advance(&graph, &mut session, "Тусклость").unwrap();
        advance(&graph, &mut session, "Сухость").unwrap();
        advance(&graph, &mut session, "Готово").unwrap();

        assert_eq!(
            session.answers.problems(),
            ["Тусклость".to_string(), "Сухость".to_string()]
        );
    }

    #[test]
    fn full_hair_path_completes_with_answers() {
        let graph = graph();
        let mut session = hair_session(&graph);

        advance(&graph, &mut session, "Окрашенные").unwrap();
        advance(&graph, &mut session, "Тусклость").unwrap();
        advance(&graph, &mut session, "Готово").unwrap();
        advance(&graph, &mut session, "Нормальная").unwrap();
        advance(&graph, &mut session, "Нужен").unwrap();
        let progress = advance(&graph, &mut session, "Блонд").unwrap();

        let Progress::Completed(answers) = progress else {
            panic!("expected completion, got {progress:?}");
        };
        assert_eq!(answers.hair_type.as_deref(), Some("Окрашенные"));
        assert_eq!(answers.scalp_type.as_deref(), Some("Нормальная"));
        assert_eq!(answers.volume_need.as_deref(), Some("Нужен"));
        assert_eq!(answers.hair_color.as_deref(), Some("Блонд"));
        assert_eq!(answers.problems(), ["Тусклость".to_string()]);

        // The flow is over; the session is back at the main menu.
        assert_eq!(session.node, NodeId::MainMenu);
        assert_eq!(session.answers, AnswerSheet::default());
    }

    #[test]
    fn back_returns_to_unique_predecessor_and_reasks() {
        let graph = graph();
        let mut session = hair_session(&graph);
        advance(&graph, &mut session, "Окрашенные").unwrap();
        advance(&graph, &mut session, "Готово").unwrap();
        assert_eq!(session.node, NodeId::ScalpType);

        let progress = advance(&graph, &mut session, BACK_LABEL).unwrap();

        assert_eq!(progress, Progress::Back(NodeId::HairProblems));
        assert_eq!(session.node, NodeId::HairProblems);
        // The re-asked multi-select starts over.
        assert_eq!(session.answers.hair_problems, None);
        assert!(session.pending.is_empty());
    }

    #[test]
    fn back_from_first_question_resets_to_menu() {
        let graph = graph();
        let mut session = hair_session(&graph);
        advance(&graph, &mut session, "Окрашенные").unwrap();

        // Back out of the multi-select, then out of the first question.
        advance(&graph, &mut session, BACK_LABEL).unwrap();
        let progress = advance(&graph, &mut session, BACK_LABEL).unwrap();

        assert_eq!(progress, Progress::MenuReset);
        assert_eq!(session.node, NodeId::MainMenu);
        assert_eq!(session.answers, AnswerSheet::default());
    }

    #[test]
    fn back_at_main_menu_is_invalid() {
        let graph = graph();
        let mut session = Session::new(1);

        assert_eq!(
            advance(&graph, &mut session, BACK_LABEL),
            Err(Rejection::InvalidChoice)
        );
    }

    #[test]
    fn back_from_multi_select_discards_pending() {
        let graph = graph();
        let mut session = hair_session(&graph);
        advance(&graph, &mut session, "Окрашенные").unwrap();
        advance(&graph, &mut session, "Перхоть").unwrap();

        let progress = advance(&graph, &mut session, BACK_LABEL).unwrap();

        assert_eq!(progress, Progress::Back(NodeId::HairType));
        assert!(session.pending.is_empty());
        assert_eq!(session.answers.hair_type, None);
    }

    #[tokio::test]
    async fn store_isolates_sessions_by_chat_id() {
        let graph = graph();
        let store = SessionStore::new();

        store.advance(&graph, 1, "Уход за волосами").await.unwrap();
        store.advance(&graph, 2, "Уход за телом").await.unwrap();

        let (node_one, _) = store.view(1).await;
        let (node_two, _) = store.view(2).await;
        assert_eq!(node_one, NodeId::HairType);
        assert_eq!(node_two, NodeId::BodyGoal);
    }

    #[tokio::test]
    async fn store_reset_returns_to_entry() {
        let graph = graph();
        let store = SessionStore::new();

        store.advance(&graph, 7, "Уход за телом").await.unwrap();
        store.reset(7).await;

        let (node, pending) = store.view(7).await;
        assert_eq!(node, NodeId::MainMenu);
        assert!(pending.is_empty());
    }
}
