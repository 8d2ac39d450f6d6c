//! Product catalog and recommendation combiner.
//!
//! The catalog maps a base key, derived from a completed answer sheet, to an
//! ordered product list. Secondary problems selected in the multi-select
//! append their own product blocks after the base list, in selection order.
//! Coverage of every reachable base key is verified once at startup.

use crate::dialogue::AnswerSheet;
use crate::graph::{Category, DialogGraph, DialogNode, NodeKind};

/// One recommendable product. The photo key addresses the uploaded
/// illustration; products without a key are always rendered as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Product {
    pub name: &'static str,
    pub photo: Option<&'static str>,
}

/// One line of the combined recommendation output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecLine {
    /// Heading note introducing an additional-problem block.
    Heading(&'static str),
    Product(Product),
}

struct CatalogEntry {
    key: &'static str,
    products: &'static [Product],
}

struct ProblemEntry {
    problem: &'static str,
    heading: &'static str,
    products: &'static [Product],
}

/// Errors on the recommendation path. `MissingEntry` escaping startup
/// validation means the shipped catalog and graph disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    MissingEntry(String),
    IncompleteAnswers(Category),
    UnknownLabel { category: Category, label: String },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::MissingEntry(key) => {
                write!(f, "no catalog entry for base key «{key}»")
            }
            CatalogError::IncompleteAnswers(category) => {
                write!(f, "answer sheet reached a terminal without {category:?}")
            }
            CatalogError::UnknownLabel { category, label } => {
                write!(f, "label «{label}» is not an option of {category:?}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

// Hair products.
const SHAMPOO_DAILY: Product = Product {
    name: "Шампунь «Ежедневный уход»",
    photo: Some("shampoo_daily"),
};
const CONDITIONER_DAILY: Product = Product {
    name: "Кондиционер «Лёгкое расчёсывание»",
    photo: Some("conditioner_daily"),
};
const SHAMPOO_COLOR: Product = Product {
    name: "Шампунь «Защита цвета»",
    photo: Some("shampoo_color"),
};
const CONDITIONER_COLOR: Product = Product {
    name: "Кондиционер «Защита цвета»",
    photo: Some("conditioner_color"),
};
const SHAMPOO_SENSITIVE: Product = Product {
    name: "Шампунь «Комфорт кожи головы»",
    photo: Some("shampoo_sensitive"),
};
const LOTION_SENSITIVE: Product = Product {
    name: "Успокаивающий лосьон для кожи головы",
    photo: Some("lotion_sensitive"),
};
const SHAMPOO_BLOND: Product = Product {
    name: "Оттеночный шампунь «Холодный блонд»",
    photo: Some("shampoo_blond"),
};
const MASK_DARK: Product = Product {
    name: "Маска «Глубина тёмных оттенков»",
    photo: Some("mask_dark"),
};
const SPRAY_VOLUME: Product = Product {
    name: "Спрей для прикорневого объёма",
    photo: Some("spray_volume"),
};
const MOUSSE_VOLUME: Product = Product {
    name: "Мусс-объём для тонких волос",
    photo: Some("mousse_volume"),
};

// Additional-problem products.
const MASK_MOISTURE: Product = Product {
    name: "Увлажняющая маска с алоэ",
    photo: Some("mask_moisture"),
};
const OIL_ENDS: Product = Product {
    name: "Масло для сухих кончиков",
    photo: Some("oil_ends"),
};
const AMPOULES_KERATIN: Product = Product {
    name: "Ампулы с кератином",
    photo: Some("ampoules_keratin"),
};
const TONIC_GROWTH: Product = Product {
    name: "Тоник для стимуляции роста",
    photo: Some("tonic_growth"),
};
const AMPOULES_GROWTH: Product = Product {
    name: "Ампулы против выпадения",
    photo: Some("ampoules_growth"),
};
const SHAMPOO_DANDRUFF: Product = Product {
    name: "Шампунь-пилинг против перхоти",
    photo: Some("shampoo_dandruff"),
};
const ELIXIR_SHINE: Product = Product {
    name: "Эликсир для блеска волос",
    photo: Some("elixir_shine"),
};
const SPRAY_GLOSS: Product = Product {
    name: "Спрей-глянец с термозащитой",
    photo: Some("spray_gloss"),
};

// Body products.
const BODY_CREAM_HYDRA: Product = Product {
    name: "Крем для тела «Интенсивное увлажнение»",
    photo: Some("body_cream_hydra"),
};
const BODY_OIL_HYDRA: Product = Product {
    name: "Масло для душа с гиалуроновой кислотой",
    photo: Some("body_oil_hydra"),
};
const BODY_BUTTER_NUTRI: Product = Product {
    name: "Баттер для тела «Питание и восстановление»",
    photo: Some("body_butter_nutri"),
};
const BODY_MILK_NUTRI: Product = Product {
    name: "Молочко для тела с маслом ши",
    photo: Some("body_milk_nutri"),
};
const BODY_SCRUB_ANTICELL: Product = Product {
    name: "Разогревающий антицеллюлитный скраб",
    photo: Some("body_scrub_anticell"),
};
const BODY_GEL_ANTICELL: Product = Product {
    name: "Дренажный гель для массажа",
    photo: Some("body_gel_anticell"),
};
const BODY_SERUM_FIRM: Product = Product {
    name: "Укрепляющая сыворотка для тела",
    photo: Some("body_serum_firm"),
};
const BODY_CREAM_FIRM: Product = Product {
    name: "Моделирующий крем «Упругость»",
    photo: Some("body_cream_firm"),
};

/// Base recommendations per reachable answer combination. The hair keys are
/// the `_`-join of the non-empty option segments in the order hair type,
/// scalp, color, volume; the body keys are the goal segment alone.
const CATALOG: &[CatalogEntry] = &[
    // Natural hair.
    CatalogEntry {
        key: "natural_blonde",
        products: &[SHAMPOO_DAILY, CONDITIONER_DAILY, SHAMPOO_BLOND],
    },
    CatalogEntry {
        key: "natural_dark",
        products: &[SHAMPOO_DAILY, CONDITIONER_DAILY, MASK_DARK],
    },
    CatalogEntry {
        key: "natural_blonde_volume",
        products: &[SHAMPOO_DAILY, CONDITIONER_DAILY, SHAMPOO_BLOND, SPRAY_VOLUME],
    },
    CatalogEntry {
        key: "natural_dark_volume",
        products: &[SHAMPOO_DAILY, CONDITIONER_DAILY, MASK_DARK, SPRAY_VOLUME],
    },
    CatalogEntry {
        key: "natural_sensitive_blonde",
        products: &[SHAMPOO_SENSITIVE, LOTION_SENSITIVE, SHAMPOO_BLOND],
    },
    CatalogEntry {
        key: "natural_sensitive_dark",
        products: &[SHAMPOO_SENSITIVE, LOTION_SENSITIVE, MASK_DARK],
    },
    CatalogEntry {
        key: "natural_sensitive_blonde_volume",
        products: &[
            SHAMPOO_SENSITIVE,
            LOTION_SENSITIVE,
            SHAMPOO_BLOND,
            MOUSSE_VOLUME,
        ],
    },
    CatalogEntry {
        key: "natural_sensitive_dark_volume",
        products: &[SHAMPOO_SENSITIVE, LOTION_SENSITIVE, MASK_DARK, MOUSSE_VOLUME],
    },
    // Colored hair.
    CatalogEntry {
        key: "colored_blonde",
        products: &[SHAMPOO_COLOR, CONDITIONER_COLOR, SHAMPOO_BLOND],
    },
    CatalogEntry {
        key: "colored_dark",
        products: &[SHAMPOO_COLOR, CONDITIONER_COLOR, MASK_DARK],
    },
    CatalogEntry {
        key: "colored_blonde_volume",
        products: &[SHAMPOO_COLOR, CONDITIONER_COLOR, SHAMPOO_BLOND, SPRAY_VOLUME],
    },
    CatalogEntry {
        key: "colored_dark_volume",
        products: &[SHAMPOO_COLOR, CONDITIONER_COLOR, MASK_DARK, SPRAY_VOLUME],
    },
    CatalogEntry {
        key: "colored_sensitive_blonde",
        products: &[SHAMPOO_SENSITIVE, CONDITIONER_COLOR, SHAMPOO_BLOND],
    },
    CatalogEntry {
        key: "colored_sensitive_dark",
        products: &[SHAMPOO_SENSITIVE, CONDITIONER_COLOR, MASK_DARK],
    },
    CatalogEntry {
        key: "colored_sensitive_blonde_volume",
        products: &[
            SHAMPOO_SENSITIVE,
            CONDITIONER_COLOR,
            SHAMPOO_BLOND,
            MOUSSE_VOLUME,
        ],
    },
    CatalogEntry {
        key: "colored_sensitive_dark_volume",
        products: &[SHAMPOO_SENSITIVE, CONDITIONER_COLOR, MASK_DARK, MOUSSE_VOLUME],
    },
    // Body care.
    CatalogEntry {
        key: "body_hydration",
        products: &[BODY_CREAM_HYDRA, BODY_OIL_HYDRA],
    },
    CatalogEntry {
        key: "body_nutrition",
        products: &[BODY_BUTTER_NUTRI, BODY_MILK_NUTRI],
    },
    CatalogEntry {
        key: "body_anticellulite",
        products: &[BODY_SCRUB_ANTICELL, BODY_GEL_ANTICELL],
    },
    CatalogEntry {
        key: "body_firming",
        products: &[BODY_SERUM_FIRM, BODY_CREAM_FIRM],
    },
];

/// Extra product blocks per secondary problem. A problem without an entry
/// («Секущиеся концы») contributes nothing to the output.
const ADDITIONAL_PROBLEMS: &[ProblemEntry] = &[
    ProblemEntry {
        problem: "Сухость",
        heading: "При сухости волос:",
        products: &[MASK_MOISTURE, OIL_ENDS],
    },
    ProblemEntry {
        problem: "Ломкость",
        heading: "Против ломкости:",
        products: &[AMPOULES_KERATIN],
    },
    ProblemEntry {
        problem: "Выпадение",
        heading: "Против выпадения:",
        products: &[TONIC_GROWTH, AMPOULES_GROWTH],
    },
    ProblemEntry {
        problem: "Перхоть",
        heading: "Против перхоти:",
        products: &[SHAMPOO_DANDRUFF],
    },
    ProblemEntry {
        problem: "Тусклость",
        heading: "Для блеска:",
        products: &[ELIXIR_SHINE, SPRAY_GLOSS],
    },
];

/// Hair-branch categories in the fixed order their segments compose the key.
/// The order is a catalog convention and intentionally differs from the
/// question order (color before volume).
const KEY_ORDER: [Category; 4] = [
    Category::HairType,
    Category::ScalpType,
    Category::HairColor,
    Category::VolumeNeed,
];

/// Derive the catalog base key from a completed answer sheet.
pub fn base_key(graph: &DialogGraph, answers: &AnswerSheet) -> Result<String, CatalogError> {
    if let Some(goal) = answers.body_goal.as_deref() {
        let segment = graph
            .segment_for(Category::BodyGoal, goal)
            .map_err(|label| CatalogError::UnknownLabel {
                category: Category::BodyGoal,
                label,
            })?;
        return segment
            .map(str::to_string)
            .ok_or(CatalogError::IncompleteAnswers(Category::BodyGoal));
    }

    let mut parts: Vec<&str> = Vec::new();
    for category in KEY_ORDER {
        let label = answers
            .single(category)
            .ok_or(CatalogError::IncompleteAnswers(category))?;
        let segment =
            graph
                .segment_for(category, label)
                .map_err(|label| CatalogError::UnknownLabel { category, label })?;
        if let Some(segment) = segment {
            parts.push(segment);
        }
    }
    Ok(parts.join("_"))
}

/// Combine the base product list with the blocks of the selected problems,
/// in the order the problems were selected. Pure; never deduplicates.
pub fn combine(base_key: &str, selected_problems: &[String]) -> Result<Vec<RecLine>, CatalogError> {
    let entry = CATALOG
        .iter()
        .find(|e| e.key == base_key)
        .ok_or_else(|| CatalogError::MissingEntry(base_key.to_string()))?;

    let mut lines: Vec<RecLine> = entry.products.iter().copied().map(RecLine::Product).collect();

    for problem in selected_problems {
        let Some(extra) = ADDITIONAL_PROBLEMS.iter().find(|p| p.problem == problem) else {
            continue;
        };
        lines.push(RecLine::Heading(extra.heading));
        lines.extend(extra.products.iter().copied().map(RecLine::Product));
    }

    Ok(lines)
}

/// Derive the key and combine in one step, for the terminal handler.
pub fn recommend(graph: &DialogGraph, answers: &AnswerSheet) -> Result<Vec<RecLine>, CatalogError> {
    let key = base_key(graph, answers)?;
    combine(&key, answers.problems())
}

/// Verify at startup that every base key reachable in the dialog graph has a
/// catalog entry. Walks every single-choice path to a terminal; the
/// multi-select does not influence the key.
pub fn validate_coverage(graph: &DialogGraph) -> Result<(), CatalogError> {
    let mut keys = Vec::new();
    collect_keys(graph, graph.node(DialogGraph::ENTRY), AnswerSheet::default(), &mut keys)?;
    for key in keys {
        if !CATALOG.iter().any(|e| e.key == key) {
            return Err(CatalogError::MissingEntry(key));
        }
    }
    Ok(())
}

fn collect_keys(
    graph: &DialogGraph,
    node: &'static DialogNode,
    answers: AnswerSheet,
    keys: &mut Vec<String>,
) -> Result<(), CatalogError> {
    match node.kind {
        NodeKind::SingleChoice { category, options } => {
            for option in options {
                let mut next_answers = answers.clone();
                if let Some(category) = category {
                    next_answers.record(category, option.label);
                }
                collect_keys(graph, graph.node(option.next), next_answers, keys)?;
            }
            Ok(())
        }
        NodeKind::MultiChoice { next, .. } => collect_keys(graph, graph.node(next), answers, keys),
        NodeKind::Terminal => {
            keys.push(base_key(graph, &answers)?);
            Ok(())
        }
    }
}
