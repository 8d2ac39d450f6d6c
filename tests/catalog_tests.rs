use anyhow::Result;

use glowbot::catalog::{base_key, combine, recommend, validate_coverage, CatalogError, RecLine};
use glowbot::dialogue::{advance, Progress, Session};
use glowbot::graph::{Category, DialogGraph};

/// The colored/normal/volume/blonde scenario resolves to the
/// colored_blonde_volume entry and the dullness block follows the base list.
#[test]
fn colored_blonde_volume_with_dullness() -> Result<()> {
    let graph = DialogGraph::build()?;
    let mut session = Session::new(1);

    advance(&graph, &mut session, "Уход за волосами").unwrap();
    advance(&graph, &mut session, "Окрашенные").unwrap();
    advance(&graph, &mut session, "Тусклость").unwrap();
    advance(&graph, &mut session, "Готово").unwrap();
    advance(&graph, &mut session, "Нормальная").unwrap();
    advance(&graph, &mut session, "Нужен").unwrap();
    let Progress::Completed(answers) = advance(&graph, &mut session, "Блонд").unwrap() else {
        panic!("expected completion");
    };

    assert_eq!(base_key(&graph, &answers).unwrap(), "colored_blonde_volume");

    let lines = recommend(&graph, &answers)?;
    let shine_at = lines
        .iter()
        .position(|l| *l == RecLine::Heading("Для блеска:"))
        .expect("shine heading present");
    // Base list first, untouched, then the heading and its two products.
    assert_eq!(shine_at, lines.len() - 3);
    assert!(matches!(lines[shine_at + 1], RecLine::Product(_)));
    assert!(matches!(lines[shine_at + 2], RecLine::Product(_)));

    Ok(())
}

/// Every base key reachable in the shipped graph has a catalog entry.
#[test]
fn startup_coverage_validation_passes() -> Result<()> {
    let graph = DialogGraph::build()?;
    validate_coverage(&graph)?;
    Ok(())
}

/// A base key outside the catalog is a configuration error, never an empty
/// recommendation.
#[test]
fn missing_entry_is_reported_as_error() {
    let result = combine("body_relaxation", &[]);
    assert_eq!(
        result,
        Err(CatalogError::MissingEntry("body_relaxation".to_string()))
    );
}

/// An answer label outside the option table is reported with its category.
#[test]
fn corrupted_answer_label_is_reported() -> Result<()> {
    let graph = DialogGraph::build()?;
    let mut session = Session::new(1);
    advance(&graph, &mut session, "Уход за волосами").unwrap();
    advance(&graph, &mut session, "Окрашенные").unwrap();
    advance(&graph, &mut session, "Готово").unwrap();
    advance(&graph, &mut session, "Нормальная").unwrap();
    advance(&graph, &mut session, "Нужен").unwrap();
    let Progress::Completed(mut answers) = advance(&graph, &mut session, "Блонд").unwrap() else {
        panic!("expected completion");
    };

    answers.hair_color = Some("Зелёные".to_string());

    assert_eq!(
        base_key(&graph, &answers),
        Err(CatalogError::UnknownLabel {
            category: Category::HairColor,
            label: "Зелёные".to_string(),
        })
    );

    Ok(())
}

/// Combining twice with the same inputs yields identical output; selected
/// problems keep their selection order and duplicates are never collapsed.
#[test]
fn combine_is_pure_and_order_preserving() -> Result<()> {
    let problems = vec![
        "Выпадение".to_string(),
        "Тусклость".to_string(),
        "Секущиеся концы".to_string(),
    ];

    let first = combine("natural_sensitive_dark", &problems)?;
    let second = combine("natural_sensitive_dark", &problems)?;
    assert_eq!(first, second);

    let headings: Vec<&str> = first
        .iter()
        .filter_map(|l| match l {
            RecLine::Heading(h) => Some(*h),
            RecLine::Product(_) => None,
        })
        .collect();
    // «Секущиеся концы» has no entry and contributes nothing.
    assert_eq!(headings, ["Против выпадения:", "Для блеска:"]);

    Ok(())
}

/// An empty multi-select commit recommends exactly the base list.
#[test]
fn no_problems_means_base_list_only() -> Result<()> {
    let lines = combine("colored_dark", &[])?;
    assert!(lines.iter().all(|l| matches!(l, RecLine::Product(_))));
    assert_eq!(lines.len(), 3);
    Ok(())
}
