//! Direction and link decoration of a sanitized tree.

use crate::config::constants::render::{
    LINK_REL, LINK_TARGET, ROOT_CLASS, TABLE_WRAPPER_CLASS, TABLE_WRAPPER_STYLE,
};
use crate::render::tree::{Element, Node};
use crate::text::{Direction, DirectionClassifier};

/// Wrap `nodes` in the root container and annotate every block with its own
/// direction. Must only be fed sanitized nodes: the attributes added here are
/// trusted.
pub fn decorate(nodes: Vec<Node>, root: Direction, classifier: &DirectionClassifier) -> Element {
    let mut container = Element::new("div")
        .with_attr("class", ROOT_CLASS)
        .with_attr("dir", root.as_str());
    container.children = decorate_children(nodes, root, classifier);
    container
}

fn decorate_children(
    nodes: Vec<Node>,
    inherited: Direction,
    classifier: &DirectionClassifier,
) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| match node {
            Node::Element(element) => decorate_element(element, inherited, classifier),
            text => text,
        })
        .collect()
}

fn decorate_element(
    mut element: Element,
    inherited: Direction,
    classifier: &DirectionClassifier,
) -> Node {
    let mut context = inherited;

    match element.tag.as_str() {
        "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            context = classifier.direction_or(&element.text_content(), inherited);
            element.set_attr("dir", context.as_str());
        }
        "li" => {
            // Nested lists decide for themselves
            let own = element
                .text_content_filtered(&|child| !matches!(child.tag.as_str(), "ul" | "ol"));
            context = classifier.direction_or(&own, inherited);
            element.set_attr("dir", context.as_str());
        }
        "a" => {
            element.set_attr("target", LINK_TARGET);
            element.set_attr("rel", LINK_REL);
            element.set_attr("dir", "auto");
        }
        "code" | "pre" => {
            element.set_attr("dir", Direction::Ltr.as_str());
            context = Direction::Ltr;
        }
        "table" => {
            element.set_attr("dir", "auto");
            element.children =
                decorate_children(std::mem::take(&mut element.children), context, classifier);
            let mut wrapper = Element::new("div")
                .with_attr("class", TABLE_WRAPPER_CLASS)
                .with_attr("style", TABLE_WRAPPER_STYLE);
            wrapper.children.push(Node::Element(element));
            return Node::Element(wrapper);
        }
        _ => {}
    }

    element.children =
        decorate_children(std::mem::take(&mut element.children), context, classifier);
    Node::Element(element)
}
