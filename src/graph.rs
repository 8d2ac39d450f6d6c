//! Static dialog graph for the consultation flow.
//!
//! The graph is a fixed set of question nodes: the main menu selects a branch
//! (body care or hair care), each branch walks through its questions and ends
//! in a terminal node. Options live in one static table per node carrying the
//! stable key, the display label shown on the keyboard, the transition target
//! and the catalog key segment the choice contributes, so the keyboards, the
//! transitions and the catalog keys can never drift apart.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Identifies a node in the dialog graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    MainMenu,
    BodyGoal,
    HairType,
    HairProblems,
    ScalpType,
    VolumeNeed,
    HairColor,
    BodyResult,
    HairResult,
}

/// Question category an answer is recorded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    BodyGoal,
    HairType,
    HairProblems,
    ScalpType,
    VolumeNeed,
    HairColor,
}

/// One selectable option of a single-choice node.
#[derive(Debug, Clone, Copy)]
pub struct ChoiceDef {
    /// Stable internal key, also used as the catalog key for photo uploads.
    pub key: &'static str,
    /// Display label, shown on the keyboard and matched against user input.
    pub label: &'static str,
    /// Node the dialog moves to when this option is chosen.
    pub next: NodeId,
    /// Segment this choice contributes to the catalog base key, if any.
    pub segment: Option<&'static str>,
}

/// Behavior of a dialog node.
#[derive(Debug, Clone, Copy)]
pub enum NodeKind {
    /// Exactly one option must be picked; each option names its successor.
    /// The branch selector records no answer and carries no category.
    SingleChoice {
        category: Option<Category>,
        options: &'static [ChoiceDef],
    },
    /// Options are toggled on and off; «Готово» commits and moves to `next`.
    MultiChoice {
        category: Category,
        options: &'static [&'static str],
        next: NodeId,
    },
    /// End of a branch; reaching it triggers recommendation rendering.
    Terminal,
}

/// A node of the static dialog graph.
#[derive(Debug, Clone, Copy)]
pub struct DialogNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Localization key of the question text.
    pub prompt: &'static str,
}

const MAIN_MENU_OPTIONS: &[ChoiceDef] = &[
    ChoiceDef {
        key: "body",
        label: "Уход за телом",
        next: NodeId::BodyGoal,
        segment: None,
    },
    ChoiceDef {
        key: "hair",
        label: "Уход за волосами",
        next: NodeId::HairType,
        segment: None,
    },
];

const BODY_GOAL_OPTIONS: &[ChoiceDef] = &[
    ChoiceDef {
        key: "body_hydration",
        label: "Увлажнение",
        next: NodeId::BodyResult,
        segment: Some("body_hydration"),
    },
    ChoiceDef {
        key: "body_nutrition",
        label: "Питание",
        next: NodeId::BodyResult,
        segment: Some("body_nutrition"),
    },
    ChoiceDef {
        key: "body_anticellulite",
        label: "Антицеллюлитный уход",
        next: NodeId::BodyResult,
        segment: Some("body_anticellulite"),
    },
    ChoiceDef {
        key: "body_firming",
        label: "Упругость",
        next: NodeId::BodyResult,
        segment: Some("body_firming"),
    },
];

const HAIR_TYPE_OPTIONS: &[ChoiceDef] = &[
    ChoiceDef {
        key: "natural",
        label: "Натуральные",
        next: NodeId::HairProblems,
        segment: Some("natural"),
    },
    ChoiceDef {
        key: "colored",
        label: "Окрашенные",
        next: NodeId::HairProblems,
        segment: Some("colored"),
    },
];

/// Secondary problems; each label keys an optional additional-products entry.
const HAIR_PROBLEM_OPTIONS: &[&str] = &[
    "Сухость",
    "Ломкость",
    "Выпадение",
    "Перхоть",
    "Тусклость",
    "Секущиеся концы",
];

const SCALP_TYPE_OPTIONS: &[ChoiceDef] = &[
    ChoiceDef {
        key: "scalp_normal",
        label: "Нормальная",
        next: NodeId::VolumeNeed,
        segment: None,
    },
    ChoiceDef {
        key: "scalp_sensitive",
        label: "Чувствительная",
        next: NodeId::VolumeNeed,
        segment: Some("sensitive"),
    },
];

const VOLUME_NEED_OPTIONS: &[ChoiceDef] = &[
    ChoiceDef {
        key: "volume_yes",
        label: "Нужен",
        next: NodeId::HairColor,
        segment: Some("volume"),
    },
    ChoiceDef {
        key: "volume_no",
        label: "Не нужен",
        next: NodeId::HairColor,
        segment: None,
    },
];

const HAIR_COLOR_OPTIONS: &[ChoiceDef] = &[
    ChoiceDef {
        key: "blonde",
        label: "Блонд",
        next: NodeId::HairResult,
        segment: Some("blonde"),
    },
    ChoiceDef {
        key: "dark",
        label: "Тёмные",
        next: NodeId::HairResult,
        segment: Some("dark"),
    },
];

/// Every node of the graph. The entry node is [`DialogGraph::ENTRY`].
const NODES: &[DialogNode] = &[
    DialogNode {
        id: NodeId::MainMenu,
        kind: NodeKind::SingleChoice {
            category: None,
            options: MAIN_MENU_OPTIONS,
        },
        prompt: "main-menu-prompt",
    },
    DialogNode {
        id: NodeId::BodyGoal,
        kind: NodeKind::SingleChoice {
            category: Some(Category::BodyGoal),
            options: BODY_GOAL_OPTIONS,
        },
        prompt: "body-goal-prompt",
    },
    DialogNode {
        id: NodeId::HairType,
        kind: NodeKind::SingleChoice {
            category: Some(Category::HairType),
            options: HAIR_TYPE_OPTIONS,
        },
        prompt: "hair-type-prompt",
    },
    DialogNode {
        id: NodeId::HairProblems,
        kind: NodeKind::MultiChoice {
            category: Category::HairProblems,
            options: HAIR_PROBLEM_OPTIONS,
            next: NodeId::ScalpType,
        },
        prompt: "hair-problems-prompt",
    },
    DialogNode {
        id: NodeId::ScalpType,
        kind: NodeKind::SingleChoice {
            category: Some(Category::ScalpType),
            options: SCALP_TYPE_OPTIONS,
        },
        prompt: "scalp-prompt",
    },
    DialogNode {
        id: NodeId::VolumeNeed,
        kind: NodeKind::SingleChoice {
            category: Some(Category::VolumeNeed),
            options: VOLUME_NEED_OPTIONS,
        },
        prompt: "volume-prompt",
    },
    DialogNode {
        id: NodeId::HairColor,
        kind: NodeKind::SingleChoice {
            category: Some(Category::HairColor),
            options: HAIR_COLOR_OPTIONS,
        },
        prompt: "color-prompt",
    },
    DialogNode {
        id: NodeId::BodyResult,
        kind: NodeKind::Terminal,
        prompt: "recommendation-header",
    },
    DialogNode {
        id: NodeId::HairResult,
        kind: NodeKind::Terminal,
        prompt: "recommendation-header",
    },
];

/// Errors detected while assembling the graph. All of them are fatal before
/// any session is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    DuplicateNode(NodeId),
    DanglingNext { from: NodeId, to: NodeId },
    MultiplePredecessors { node: NodeId, first: NodeId, second: NodeId },
    Unreachable(NodeId),
    DuplicateLabel { node: NodeId, label: String },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::DuplicateNode(id) => write!(f, "node {id:?} is defined twice"),
            GraphError::DanglingNext { from, to } => {
                write!(f, "node {from:?} transitions to undefined node {to:?}")
            }
            GraphError::MultiplePredecessors { node, first, second } => write!(
                f,
                "node {node:?} has more than one predecessor ({first:?} and {second:?})"
            ),
            GraphError::Unreachable(id) => write!(f, "node {id:?} has no predecessor"),
            GraphError::DuplicateLabel { node, label } => {
                write!(f, "node {node:?} lists the label «{label}» twice")
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// The validated dialog graph with the inverted back-navigation edges.
#[derive(Debug)]
pub struct DialogGraph {
    nodes: HashMap<NodeId, &'static DialogNode>,
    prev: HashMap<NodeId, NodeId>,
}

impl DialogGraph {
    pub const ENTRY: NodeId = NodeId::MainMenu;

    /// Assemble and validate the graph. Checks that every transition targets
    /// a defined node, that every non-entry node has exactly one predecessor
    /// (back navigation relies on it) and that labels are unique per node.
    pub fn build() -> Result<Self, GraphError> {
        let mut nodes: HashMap<NodeId, &'static DialogNode> = HashMap::new();
        for node in NODES {
            if nodes.insert(node.id, node).is_some() {
                return Err(GraphError::DuplicateNode(node.id));
            }
        }

        let mut prev: HashMap<NodeId, NodeId> = HashMap::new();
        for node in NODES {
            for target in node_targets(node) {
                if !nodes.contains_key(&target) {
                    return Err(GraphError::DanglingNext {
                        from: node.id,
                        to: target,
                    });
                }
                if let Some(&first) = prev.get(&target) {
                    if first != node.id {
                        return Err(GraphError::MultiplePredecessors {
                            node: target,
                            first,
                            second: node.id,
                        });
                    }
                } else {
                    prev.insert(target, node.id);
                }
            }
            check_labels(node)?;
        }

        for node in NODES {
            if node.id != Self::ENTRY && !prev.contains_key(&node.id) {
                return Err(GraphError::Unreachable(node.id));
            }
        }

        Ok(Self { nodes, prev })
    }

    pub fn node(&self, id: NodeId) -> &'static DialogNode {
        self.nodes[&id]
    }

    /// The unique predecessor used for back navigation; `None` for the entry.
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.prev.get(&id).copied()
    }

    /// The catalog key segment a recorded answer contributes, if any.
    ///
    /// Returns `Err` with the offending label when the label is not part of
    /// the option table, which indicates a corrupted answer sheet.
    pub fn segment_for(&self, category: Category, label: &str) -> Result<Option<&'static str>, String> {
        for node in self.nodes.values() {
            if let NodeKind::SingleChoice {
                category: c,
                options,
            } = node.kind
            {
                if c != Some(category) {
                    continue;
                }
                if let Some(choice) = options.iter().find(|o| o.label == label) {
                    return Ok(choice.segment);
                }
            }
        }
        Err(label.to_string())
    }
}

fn node_targets(node: &DialogNode) -> Vec<NodeId> {
    match node.kind {
        NodeKind::SingleChoice { options, .. } => options.iter().map(|o| o.next).collect(),
        NodeKind::MultiChoice { next, .. } => vec![next],
        NodeKind::Terminal => Vec::new(),
    }
}

fn check_labels(node: &DialogNode) -> Result<(), GraphError> {
    let labels: Vec<&str> = match node.kind {
        NodeKind::SingleChoice { options, .. } => options.iter().map(|o| o.label).collect(),
        NodeKind::MultiChoice { options, .. } => options.to_vec(),
        NodeKind::Terminal => Vec::new(),
    };
    for (i, label) in labels.iter().enumerate() {
        if labels[..i].contains(label) {
            return Err(GraphError::DuplicateLabel {
                node: node.id,
                label: label.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_builds_and_inverts_predecessors() {
        let graph = DialogGraph::build().unwrap();

        assert_eq!(graph.prev(NodeId::MainMenu), None);
        assert_eq!(graph.prev(NodeId::BodyGoal), Some(NodeId::MainMenu));
        assert_eq!(graph.prev(NodeId::HairType), Some(NodeId::MainMenu));
        assert_eq!(graph.prev(NodeId::HairProblems), Some(NodeId::HairType));
        assert_eq!(graph.prev(NodeId::ScalpType), Some(NodeId::HairProblems));
        assert_eq!(graph.prev(NodeId::VolumeNeed), Some(NodeId::ScalpType));
        assert_eq!(graph.prev(NodeId::HairColor), Some(NodeId::VolumeNeed));
        assert_eq!(graph.prev(NodeId::HairResult), Some(NodeId::HairColor));
        assert_eq!(graph.prev(NodeId::BodyResult), Some(NodeId::BodyGoal));
    }

    #[test]
    fn segment_lookup_matches_option_table() {
        let graph = DialogGraph::build().unwrap();

        assert_eq!(
            graph.segment_for(Category::HairType, "Окрашенные").unwrap(),
            Some("colored")
        );
        assert_eq!(
            graph.segment_for(Category::ScalpType, "Нормальная").unwrap(),
            None
        );
        assert!(graph.segment_for(Category::HairType, "Кудрявые").is_err());
    }

    #[test]
    fn every_problem_label_is_unique() {
        let graph = DialogGraph::build().unwrap();
        let node = graph.node(NodeId::HairProblems);
        match node.kind {
            NodeKind::MultiChoice { options, .. } => {
                for (i, label) in options.iter().enumerate() {
                    assert!(!options[..i].contains(label), "duplicate label {label}");
                }
            }
            _ => panic!("HairProblems must be a multi-choice node"),
        }
    }
}
