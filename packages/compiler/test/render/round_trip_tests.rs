use twinrender_compiler::template::{NodeId, Template};

#[path = "../util.rs"]
mod util;

use util::Shape;

fn assert_same_structure(template: Template) -> Vec<Shape> {
    let component = util::compile(template);
    let client = util::client_shapes(&component.client_render);
    let server = util::markup_shapes(&util::server_markup(&component.server_render));
    assert_eq!(client, server);
    client
}

fn card(template: &mut Template, parent: NodeId) {
    let article = template.add_element(parent, "article");
    template.set_attribute(article, "class", Some("card"));
    template.set_attribute(article, "hidden", None);
    let h2 = template.add_element(article, "h2");
    template.add_text(h2, "Fish & Chips");
    let img = template.add_element(article, "img");
    template.set_attribute(img, "alt", Some("a \"quoted\" <caption>"));
    let p = template.add_element(article, "p");
    template.add_text(p, "1 < 2");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_agree_on_single_element() {
        let mut template = Template::new();
        template.add_element(template.root, "h1");

        let shapes = assert_same_structure(template);
        assert_eq!(
            shapes,
            vec![Shape::Element {
                tag: "h1".to_string(),
                attributes: Vec::new(),
                children: Vec::new(),
            }]
        );
    }

    #[test]
    fn should_agree_on_nested_markup_with_escaping() {
        let mut template = Template::new();
        let root = template.root;
        card(&mut template, root);
        template.add_text(template.root, "after");

        let shapes = assert_same_structure(template);
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[1], Shape::Text("after".to_string()));
    }

    #[test]
    fn should_agree_on_comments_and_void_elements() {
        let mut template = Template::new();
        let section = template.add_element(template.root, "section");
        template.add_comment(section, "marker", true);
        template.add_comment(section, "not rendered", false);
        template.add_element(section, "br");
        let input = template.add_element(section, "input");
        template.set_attribute(input, "disabled", None);

        let shapes = assert_same_structure(template);
        match &shapes[0] {
            Shape::Element { children, .. } => {
                assert_eq!(children.len(), 3);
                assert_eq!(children[0], Shape::Comment("marker".to_string()));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }
}
