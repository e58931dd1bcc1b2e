use listwright_engine::lists::{build, flatten, renumber_document};
use listwright_engine::ordinal::{OrdinalType, translate};
use listwright_engine::{
    Cmd, Document, ItemRange, LineKind, ListEditor, ListKind, ListOptions, NodeId, OutlineLine,
    Tree,
};
use pretty_assertions::assert_eq;

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.md",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn editor(name: &str) -> ListEditor {
    ListEditor::from_markdown(&fixture(name), ListOptions::default())
}

fn line(editor: &ListEditor, text: &str) -> OutlineLine {
    editor
        .outline()
        .into_iter()
        .find(|line| line.text == text)
        .unwrap_or_else(|| panic!("no line {text:?}"))
}

fn labels(editor: &ListEditor) -> Vec<String> {
    editor
        .outline()
        .into_iter()
        .filter_map(|line| line.label)
        .collect()
}

fn top_level_list(editor: &ListEditor) -> NodeId {
    let doc = editor.document();
    doc.children(doc.body())
        .iter()
        .copied()
        .find(|&node| doc.is_list(node))
        .unwrap()
}

#[test]
fn round_trip_law_holds_for_nested_fixture() {
    let mut doc = Document::from_markdown(&fixture("outline"));
    let options = ListOptions::default();
    renumber_document(&mut doc, &options);
    let list = doc.children(doc.body())[0];
    let before = doc.to_tree(list);

    let array = flatten(&mut doc, list).unwrap();
    let built = build(&mut doc, &array, 0, None, &options).unwrap();

    assert_eq!(built.next_index, array.len());
    assert_eq!(doc.to_tree(built.fragment), Tree::Fragment(vec![before]));
}

#[test]
fn import_numbers_nested_lists_as_sections() {
    let editor = editor("outline");

    assert_eq!(labels(&editor), vec!["1.", "2.", "2.1.", "2.2.", "3."]);
    assert_eq!(line(&editor, "papers").depth, 2);
    assert_eq!(line(&editor, "papers").kind, LineKind::UnorderedItem);
}

#[test]
fn renumbering_twice_changes_nothing() {
    let mut doc = Document::from_markdown(&fixture("outline"));
    let options = ListOptions::default();

    let first = renumber_document(&mut doc, &options);
    let html = doc.body_html();
    let second = renumber_document(&mut doc, &options);

    assert_eq!(first.created.len(), 5);
    assert!(second.is_empty());
    assert_eq!(doc.body_html(), html);
}

#[test]
fn indent_then_outdent_restores_document() {
    let mut editor = editor("three_items");
    let original = editor.to_html();
    let two = line(&editor, "two").node;

    editor
        .apply(Cmd::Indent {
            range: ItemRange::single(two),
        })
        .unwrap();
    assert_eq!(labels(&editor), vec!["1.", "1.1.", "2."]);
    let list = top_level_list(&editor);
    assert_eq!(listwright_engine::lists::items_of(editor.document(), list).len(), 2);

    let two = line(&editor, "two").node;
    editor
        .apply(Cmd::Outdent {
            range: ItemRange::single(two),
        })
        .unwrap();

    assert_eq!(editor.to_html(), original);
    assert_eq!(editor.version(), 2);
}

#[test]
fn repeated_indent_and_outdent_keeps_node_count_bounded() {
    let mut editor = editor("three_items");
    let original = editor.to_html();
    let start = editor.document().node_count();

    for _ in 0..200 {
        let two = line(&editor, "two").node;
        editor
            .apply(Cmd::Indent {
                range: ItemRange::single(two),
            })
            .unwrap();
        let two = line(&editor, "two").node;
        editor
            .apply(Cmd::Outdent {
                range: ItemRange::single(two),
            })
            .unwrap();
    }

    assert_eq!(editor.to_html(), original);
    assert!(
        editor.document().node_count() <= start * 2,
        "{} live nodes after 400 edits, started with {start}",
        editor.document().node_count()
    );
}

#[test]
fn indenting_first_item_is_noop() {
    let mut editor = editor("three_items");
    let before = editor.to_html();
    let one = line(&editor, "one").node;

    let patch = editor
        .apply(Cmd::Indent {
            range: ItemRange::single(one),
        })
        .unwrap();

    assert!(patch.is_noop());
    assert_eq!(editor.to_html(), before);
}

#[test]
fn converting_to_unordered_removes_labels_only() {
    let mut editor = editor("three_items");
    let list = top_level_list(&editor);

    let patch = editor
        .apply(Cmd::ChangeListType {
            list,
            kind: ListKind::Unordered,
        })
        .unwrap();

    assert_eq!(patch.labels.removed.len(), 3);
    insta::assert_snapshot!(
        editor.to_html(),
        @"<ul><li><p>one</p></li><li><p>two</p></li><li><p>three</p></li></ul>"
    );
}

#[test]
fn removing_only_item_restores_content_in_place() {
    let mut editor = ListEditor::from_markdown("before\n\n1. alone\n\nafter\n", ListOptions::default());
    let list = top_level_list(&editor);
    let alone = line(&editor, "alone").node;

    editor
        .apply(Cmd::RemoveList {
            list,
            selected: vec![alone],
        })
        .unwrap();

    insta::assert_snapshot!(editor.to_html(), @"<p>before</p><p>alone</p><p>after</p>");
}

#[test]
fn toggling_paragraphs_joins_following_list() {
    let mut editor = editor("notes");
    let blocks = vec![line(&editor, "First thought.").block, line(&editor, "Second thought.").block];

    editor
        .apply(Cmd::ToggleList {
            blocks,
            kind: ListKind::Unordered,
        })
        .unwrap();

    let items: Vec<String> = editor
        .outline()
        .into_iter()
        .filter(|line| line.kind == LineKind::UnorderedItem)
        .map(|line| line.text)
        .collect();
    assert_eq!(items, vec!["First thought.", "Second thought.", "apple", "banana"]);
    assert_eq!(editor.document().children(editor.document().body()).len(), 3);
}

#[test]
fn typing_session_keeps_numbering_consistent() {
    let mut editor = editor("three_items");

    // Enter at the end of "one" opens a new item
    let one = line(&editor, "one").node;
    let patch = editor.apply(Cmd::Enter { item: one, split: None }).unwrap();
    let new_item = patch.focus.unwrap();
    assert_eq!(labels(&editor), vec!["1.", "2.", "3.", "4."]);

    // Tab nests it under "one"
    editor
        .apply(Cmd::Indent {
            range: ItemRange::single(new_item),
        })
        .unwrap();
    assert_eq!(labels(&editor), vec!["1.", "1.1.", "2.", "3."]);

    // Enter again on the empty nested item leaves the nested list
    let empty = editor
        .outline()
        .into_iter()
        .find(|line| line.depth == 1)
        .unwrap()
        .node;
    editor.apply(Cmd::Enter { item: empty, split: None }).unwrap();
    assert_eq!(labels(&editor), vec!["1.", "2.", "3.", "4."]);

    // Backspace joins the empty item onto "one"
    let empty = editor.outline()[1].node;
    editor.apply(Cmd::Backspace { block: empty }).unwrap();
    assert_eq!(labels(&editor), vec!["1.", "2.", "3."]);
    assert_eq!(line(&editor, "two").label.as_deref(), Some("2."));
}

#[test]
fn configured_ordinal_type_drives_new_labels() {
    let options = ListOptions {
        default_ordinal_type: OrdinalType::UpperRoman,
        ..ListOptions::default()
    };
    let mut editor = ListEditor::from_markdown(&fixture("roman"), options);
    assert_eq!(labels(&editor), vec!["I.", "II.", "III.", "IV."]);

    let second = line(&editor, "second").node;
    editor.apply(Cmd::Enter { item: second, split: None }).unwrap();

    assert_eq!(labels(&editor), vec!["I.", "II.", "III.", "IV.", "V."]);
    assert_eq!(line(&editor, "fourth").label.as_deref(), Some("V."));
}

#[test]
fn ordinal_codec_properties() {
    for ordinal_type in OrdinalType::ALL {
        for n in 1..200 {
            let token = ordinal_type.encode(n).unwrap();
            assert_eq!(ordinal_type.decode(&token).unwrap(), n, "{ordinal_type} {n}");
        }
    }
    assert_eq!(OrdinalType::LowerAlpha.encode(0).unwrap(), "a");
    assert_eq!(OrdinalType::LowerAlpha.encode(25).unwrap(), "z");
    assert_eq!(OrdinalType::LowerAlpha.encode(26).unwrap(), "aa");
    assert_eq!(OrdinalType::LowerRoman.decode("iv").unwrap(), 4);
    assert_eq!(OrdinalType::UpperRoman.encode(4).unwrap(), "IV");
    assert_eq!(translate("2.3", 1, None).unwrap(), "2.4");
    assert_eq!(translate("b", 1, Some(OrdinalType::LowerAlpha)).unwrap(), "c");
}
