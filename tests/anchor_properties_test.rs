// Properties of the anchor codec and span renderer on the arena tree

use marker_anchor_wasm::anchor::{find_occurrence, occurrences_before};
use marker_anchor_wasm::dom::walk::closest_within;
use marker_anchor_wasm::dom::{text_nodes, Document, NodeId, TextTree};
use marker_anchor_wasm::layer::MarkerLayer;
use marker_anchor_wasm::markers::{MarkerId, MarkerPolicy, MarkerRecord};
use marker_anchor_wasm::render::{owning_wrapper, unwrap, wrap, wrappers_for};
use marker_anchor_wasm::resolver::ScanResolver;
use marker_anchor_wasm::text::{flat_text, text_runs, FlatRange};
use marker_anchor_wasm::Anchor;

const FAITH: &str = "<div>faith alone faith alone faith</div>";

/// Parse markup and return the document with its first element
fn setup(markup: &str) -> (Document, NodeId) {
    let doc = Document::parse(markup).expect("fixture should parse");
    let container = doc.first_child(&doc.root()).expect("fixture has a container");
    (doc, container)
}

/// Flat ranges wrapped per marker id, adjacent runs merged, sorted
fn wrapped_ranges(doc: &Document, container: &NodeId, policy: &MarkerPolicy) -> Vec<(String, FlatRange)> {
    let mut out: Vec<(String, FlatRange)> = Vec::new();
    for run in text_runs(doc, container) {
        let Some(wrapper) = owning_wrapper(doc, &run.node, container, policy) else {
            continue;
        };
        let id = doc.attribute(&wrapper, &policy.id_attribute).unwrap();
        match out.last_mut() {
            Some((last_id, range)) if *last_id == id && range.end == run.start => range.end = run.end(),
            _ => out.push((id, FlatRange::new(run.start, run.end()))),
        }
    }
    out.sort_by_key(|(id, range)| (range.start, id.clone()));
    out
}

#[test]
fn test_round_trip_preserves_flat_text() {
    let markup = "<div>Blessed <em>are</em> the <b>poor in <i>spirit</i></b>, for theirs</div>";
    let policy = MarkerPolicy::highlights();

    let (doc, container) = setup(markup);
    let original = flat_text(&doc, &container);
    let len = original.len();

    for start in 0..len {
        for end in (start + 1)..=len {
            let (mut doc, container) = setup(markup);
            let id = MarkerId::Num(1);

            wrap(&mut doc, &container, FlatRange::new(start, end), &id, &policy).unwrap();
            assert_eq!(flat_text(&doc, &container), original, "wrap changed text for {}..{}", start, end);

            unwrap(&mut doc, &container, &id, &policy).unwrap();
            assert_eq!(flat_text(&doc, &container), original, "unwrap changed text for {}..{}", start, end);
            assert_eq!(
                doc.to_markup(container),
                markup,
                "structure not restored for {}..{}",
                start,
                end
            );
        }
    }
}

#[test]
fn test_occurrence_symmetry() {
    let flat = "ab abab aba bab";
    for len in 1..=3 {
        for start in 0..=(flat.len() - len) {
            let text = &flat[start..start + len];
            let index = occurrences_before(flat, text, start);
            let found = find_occurrence(flat, text, index).expect("occurrence should decode");
            assert_eq!(found, FlatRange::new(start, start + len), "{:?} at {}", text, start);
        }
    }
}

#[test]
fn test_faith_scenario() {
    let (mut doc, container) = setup(FAITH);
    let policy = MarkerPolicy::annotations();
    let anchor = Anchor::new("faith", 2);

    let range = anchor.locate(&flat_text(&doc, &container)).unwrap();
    assert_eq!(range, FlatRange::new(24, 29));

    let wrappers = wrap(&mut doc, &container, range, &MarkerId::Num(9), &policy).unwrap();
    assert_eq!(wrappers.len(), 1);
    assert_eq!(doc.text_content(&wrappers[0]), "faith");

    let children = doc.children(container);
    let position = children.iter().position(|c| *c == wrappers[0]).unwrap();
    let preceding = doc.text(&children[position - 1]).unwrap();
    assert!(preceding.ends_with("alone "), "preceding text was {:?}", preceding);
}

#[test]
fn test_not_found_is_silent() {
    let (doc, container) = setup(FAITH);
    let flat = flat_text(&doc, &container);

    assert_eq!(find_occurrence(&flat, "zzz-not-present", 0), None);
    assert_eq!(find_occurrence(&flat, "faith", 3), None);
}

#[test]
fn test_idempotent_reload_regardless_of_order() {
    // Flat text "faith alone faithalone faith alone"
    let markup = "<div><p>faith alone faith</p><p>alone faith alone</p></div>";
    let policy = MarkerPolicy::annotations();
    let markers = [
        (MarkerId::Num(1), Anchor::new("faith", 0)),
        (MarkerId::Num(2), Anchor::new("alone", 1)),
        (MarkerId::Num(3), Anchor::new("faith alone", 1)),
    ];

    let render = |order: &[usize]| {
        let (mut doc, container) = setup(markup);
        for &i in order {
            let (id, anchor) = &markers[i];
            let range = anchor.locate(&flat_text(&doc, &container)).unwrap();
            wrap(&mut doc, &container, range, id, &policy).unwrap();
        }
        wrapped_ranges(&doc, &container, &policy)
    };

    let forward = render(&[0, 1, 2]);
    assert_eq!(
        forward,
        vec![
            ("1".to_string(), FlatRange::new(0, 5)),
            ("2".to_string(), FlatRange::new(17, 22)),
            ("3".to_string(), FlatRange::new(23, 34)),
        ]
    );
    assert_eq!(forward, render(&[2, 1, 0]));
    assert_eq!(forward, render(&[1, 0, 2]));
}

#[test]
fn test_layer_reload_in_any_list_order() {
    let markup = concat!(
        r#"<div data-annotatable="" data-content-type="answer" data-question-id="42">"#,
        r#"<p>faith alone faith</p><p>alone faith alone</p></div>"#,
    );
    let policy = MarkerPolicy::annotations();
    let record = |id: u64, text: &str, occurrence_index: u32| MarkerRecord {
        id: Some(MarkerId::Num(id)),
        content_type_tag: Some("answer".to_string()),
        question_id: None,
        commentary_id: None,
        selected_text: text.to_string(),
        occurrence_index,
        comment_text: Some(format!("note {}", id)),
    };
    let records = [record(1, "faith", 0), record(2, "alone", 1), record(3, "faith alone", 1)];

    let reload = |order: [usize; 3]| {
        let (mut doc, container) = setup(markup);
        let scopes = [doc.root()];
        let mut layer = MarkerLayer::new(policy.clone(), ScanResolver::new(policy.clone()), Some(42));
        let list = order.iter().map(|&i| records[i].clone()).collect();

        let report = layer.load(&mut doc, &scopes, list).unwrap();
        assert_eq!(report.rendered, 3, "order {:?}", order);
        assert!(report.skipped.is_empty(), "order {:?}", order);

        // A second pass over the same store changes nothing
        let rendered = doc.to_markup(container);
        let again = layer.apply_all(&mut doc, &scopes).unwrap();
        assert_eq!(again.already_rendered, 3);
        assert_eq!(doc.to_markup(container), rendered);

        wrapped_ranges(&doc, &container, &policy)
    };

    let expected = reload([0, 1, 2]);
    assert_eq!(expected.len(), 3);
    for order in [[0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]] {
        assert_eq!(reload(order), expected, "order {:?}", order);
    }
}

#[test]
fn test_exclusive_mode_never_nests() {
    let (mut doc, container) = setup(FAITH);
    let policy = MarkerPolicy::annotations();

    // "alone faith" then "faith alone", overlapping on "alone"
    wrap(&mut doc, &container, FlatRange::new(6, 17), &MarkerId::Num(1), &policy).unwrap();
    let second = wrap(&mut doc, &container, FlatRange::new(0, 11), &MarkerId::Num(2), &policy).unwrap();

    assert_eq!(second.len(), 1);
    assert_eq!(doc.text_content(&second[0]), "faith ");

    for text in text_nodes(&doc, &container) {
        let Some(wrapper) = owning_wrapper(&doc, &text, &container, &policy) else {
            continue;
        };
        let parent = doc.parent(&wrapper).unwrap();
        let outer = closest_within(&doc, &parent, Some(&container), |n| {
            *n != container && policy.is_wrapper(&doc, n)
        });
        assert_eq!(outer, None, "text {:?} is under nested wrappers", doc.text(&text));
    }

    let ranges = wrapped_ranges(&doc, &container, &policy);
    assert_eq!(
        ranges,
        vec![
            ("2".to_string(), FlatRange::new(0, 6)),
            ("1".to_string(), FlatRange::new(6, 17)),
        ]
    );
}

#[test]
fn test_delete_split_marker_merges_text() {
    let (mut doc, container) = setup(FAITH);
    let policy = MarkerPolicy::highlights();
    let original = flat_text(&doc, &container);
    let first = MarkerId::Num(1);
    let second = MarkerId::Num(2);

    wrap(&mut doc, &container, FlatRange::new(6, 17), &first, &policy).unwrap();
    // Crosses into the first highlight, so it lands in two fragments
    let fragments = wrap(&mut doc, &container, FlatRange::new(0, 11), &second, &policy).unwrap();
    assert_eq!(fragments.len(), 2);

    assert_eq!(unwrap(&mut doc, &container, &second, &policy).unwrap(), 2);
    assert!(wrappers_for(&doc, &container, &second, &policy).is_empty());
    assert_eq!(flat_text(&doc, &container), original);

    let remaining = wrappers_for(&doc, &container, &first, &policy);
    assert_eq!(remaining.len(), 1);
    assert_eq!(doc.children(remaining[0]).len(), 1);
    assert_eq!(doc.text_content(&remaining[0]), "alone faith");

    unwrap(&mut doc, &container, &first, &policy).unwrap();
    assert_eq!(doc.children(container).len(), 1);
    assert_eq!(doc.to_markup(container), FAITH);
}
