use folio::Key;
use folio_render::{
    Attributes, Node, SectionRenderer, TreeBuilder, render_main_section, render_section, to_html,
};
use serde_json::{Value, json};

fn render(props: Value) -> Node {
    render_section(&props).expect("render failed")
}

fn render_main(props: Value) -> Node {
    render_main_section(&props).expect("render failed")
}

fn heading_level(node: &Node) -> Option<u8> {
    node.as_element().and_then(|e| e.heading_level())
}

fn kinds(node: &Node) -> Vec<&str> {
    node.children().iter().filter_map(Node::kind).collect()
}

#[test]
fn defaults_without_configuration() {
    let node = render(json!({"title": [{"text": "Intro"}]}));
    let root = node.as_element().unwrap();
    assert_eq!(root.kind, "section");
    assert_eq!(root.attributes.class_name, None);
    assert_eq!(root.children.len(), 1);
    assert_eq!(heading_level(&root.children[0]), Some(2));
    assert_eq!(root.children[0].text_content(), "Intro");
}

#[test]
fn class_name_is_applied_to_container() {
    let node = render(json!({"title": ["a"], "className": "chapter"}));
    assert_eq!(to_html(&node), "<section class=\"chapter\"><h2>a</h2></section>");
}

#[test]
fn heading_depth_grows_with_nesting() {
    let node = render(json!({
        "title": ["l2"],
        "sections": [{
            "title": ["l3"],
            "sections": [{"title": ["l4"]}],
        }],
    }));
    assert_eq!(heading_level(&node.children()[0]), Some(2));
    let child = &node.children()[1];
    assert_eq!(heading_level(&child.children()[0]), Some(3));
    let grandchild = &child.children()[1];
    assert_eq!(heading_level(&grandchild.children()[0]), Some(4));
}

#[test]
fn main_section_forces_root_depth_and_kind() {
    let node = render_main(json!({"title": ["t"], "level": 5, "as": "div"}));
    assert_eq!(node.kind(), Some("main"));
    assert_eq!(heading_level(&node.children()[0]), Some(1));
}

#[test]
fn children_follow_heading_abstract_blocks_sections_order() {
    let node = render(json!({
        "title": ["T"],
        "abstract": ["A"],
        "blocks": [
            {"type": "paragraph", "text": "b1"},
            {"type": "code", "code": "b2"},
        ],
        "sections": [{"title": ["s1"]}, {"title": ["s2"]}],
    }));
    assert_eq!(kinds(&node), vec!["h2", "p", "p", "pre", "section", "section"]);
    let texts: Vec<String> = node.children().iter().map(Node::text_content).collect();
    assert_eq!(texts, vec!["T", "A", "b1", "b2", "s1", "s2"]);
}

#[test]
fn empty_title_and_abstract_emit_nothing() {
    let node = render(json!({
        "title": [],
        "abstract": [],
        "blocks": [{"type": "rule"}],
    }));
    assert_eq!(kinds(&node), vec!["hr"]);
}

#[test]
fn blocks_and_sections_carry_content_keys() {
    let props = json!({
        "title": ["T"],
        "blocks": [{"type": "paragraph", "text": "Hello"}],
        "sections": [{"title": ["Sub"]}],
    });
    let node = render(props);
    let heading = &node.children()[0];
    assert!(heading.key().is_none());

    let block_key = node.children()[1].key().cloned().unwrap();
    let section_key = node.children()[2].key().cloned().unwrap();
    let expected_block = folio::schema::validate_section(&json!({
        "title": [],
        "blocks": [{"type": "paragraph", "text": "Hello"}],
    }))
    .unwrap()
    .blocks
    .remove(0);
    assert_eq!(block_key, Key::derive(&expected_block));
    let expected_section = folio::schema::validate_section(&json!({"title": ["Sub"]})).unwrap();
    assert_eq!(section_key, Key::derive(&expected_section));
}

#[test]
fn keys_are_stable_across_renders_and_surrounding_props() {
    let blocks = json!([{"type": "paragraph", "text": "Hello"}]);
    let sections = json!([{"title": ["Sub"], "blocks": [{"type": "rule"}]}]);

    let first = render(json!({
        "title": ["One"],
        "blocks": blocks.clone(),
        "sections": sections.clone(),
    }));
    let second = render_main(json!({
        "title": ["Two"],
        "abstract": ["changed"],
        "className": "x",
        "blocks": blocks,
        "sections": sections,
    }));

    let keys = |node: &Node| -> Vec<Key> {
        node.children().iter().filter_map(|c| c.key().cloned()).collect()
    };
    assert_eq!(keys(&first).len(), 2);
    assert_eq!(keys(&first), keys(&second));
}

#[test]
fn same_content_at_different_positions_shares_a_key() {
    let node = render(json!({
        "title": ["T"],
        "blocks": [{"type": "paragraph", "text": "x"}],
        "sections": [{"title": ["S"], "blocks": [{"type": "paragraph", "text": "x"}]}],
    }));
    let outer = node.children()[1].key().unwrap();
    let inner = node.children()[2].children()[1].key().unwrap();
    assert_eq!(outer, inner);
}

#[test]
fn invalid_leaf_aborts_whole_render() {
    let err = render_section(&json!({
        "title": ["root"],
        "sections": [{
            "title": ["mid"],
            "sections": [{"title": [{"type": "link", "href": "/x"}]}],
        }],
    }))
    .unwrap_err();
    assert_eq!(err.issues.len(), 1);
    assert_eq!(
        err.issues[0].path.to_string(),
        "sections[0].sections[0].title[0].content"
    );
}

#[test]
fn every_issue_is_reported_in_one_pass() {
    let err = render_main_section(&json!({
        "title": 3,
        "className": 4,
        "blocks": [{"type": "heading", "level": 9, "text": "x"}],
        "sections": [{"abstract": ["no title"]}],
    }))
    .unwrap_err();
    let paths: Vec<String> = err.issues.iter().map(|i| i.path.to_string()).collect();
    assert_eq!(
        paths,
        vec!["className", "title", "blocks[0].level", "sections[0].title"]
    );
}

#[test]
fn scenario_intro_hello_sub() {
    let node = render_main(json!({
        "title": [{"text": "Intro"}],
        "blocks": [{"type": "paragraph", "text": "Hello"}],
        "sections": [{"title": [{"text": "Sub"}]}],
    }));
    assert_eq!(
        to_html(&node),
        "<main><h1>Intro</h1><p>Hello</p><main><h2>Sub</h2></main></main>"
    );
}

#[test]
fn inline_markup_renders_inside_heading() {
    let node = render(json!({
        "title": [
            "Read ",
            {"type": "link", "href": "/docs", "content": [{"type": "emphasis", "content": ["the docs"]}]},
        ],
    }));
    assert_eq!(
        to_html(&node),
        "<section><h2>Read <a href=\"/docs\"><em>the docs</em></a></h2></section>"
    );
}

#[test]
fn deep_heading_levels_clamp_to_h6() {
    let mut props = json!({"title": ["leaf"]});
    for _ in 0..6 {
        props = json!({"title": ["x"], "sections": [props]});
    }
    let node = render(props);
    let mut current = &node;
    for _ in 0..6 {
        current = &current.children()[1];
    }
    assert_eq!(current.children()[0].kind(), Some("h6"));
}

/// Counts what the renderer asks the host for, building nothing.
#[derive(Default)]
struct CountingBuilder {
    elements: Vec<String>,
    texts: usize,
}

impl TreeBuilder for CountingBuilder {
    type Node = ();

    fn element(&mut self, kind: &str, _attributes: Attributes, _children: Vec<()>) {
        self.elements.push(kind.to_string());
    }

    fn text(&mut self, _content: &str) {
        self.texts += 1;
    }
}

#[test]
fn renderer_drives_any_tree_builder() {
    let mut renderer = SectionRenderer::with_builder(CountingBuilder::default());
    renderer
        .render_main_section(&json!({
            "title": ["Intro"],
            "blocks": [{"type": "paragraph", "text": "Hello"}],
            "sections": [{"title": ["Sub"]}],
        }))
        .unwrap();
    let builder = renderer.into_builder();
    // Children are built before their parents.
    assert_eq!(builder.elements, vec!["h1", "p", "h2", "main", "main"]);
    assert_eq!(builder.texts, 3);
}
