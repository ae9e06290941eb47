use twinrender_compiler::config::ScriptLanguage;
use twinrender_compiler::expression::ast::Expr;
use twinrender_compiler::render::escape::escape_html;
use twinrender_compiler::template::Template;
use twinrender_compiler::CompilerConfig;

#[path = "../util.rs"]
mod util;

fn body(component: &twinrender_compiler::CompiledComponent) -> String {
    let source = util::server(component);
    let prefix = "function render(data,contentSlot,metaSlot){return ";
    assert!(source.starts_with(prefix), "unexpected header: {}", source);
    source[prefix.len()..source.len() - 1].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_static_markup() {
        let mut template = Template::new();
        template.add_element(template.root, "h1");

        let component = util::compile(template);
        assert_eq!(
            util::server(&component),
            "function render(data,contentSlot,metaSlot){return '<h1></h1>'}"
        );
    }

    #[test]
    fn should_escape_dynamic_attribute() {
        let mut template = Template::new();
        let img = template.add_element(template.root, "img");
        template.set_dynamic_attribute(img, "src", Expr::ident("someImage"));

        let component = util::compile(template);
        assert_eq!(
            body(&component),
            "'<img class=\"p0\" src=\"'+escape(data.someImage)+'\">'"
        );
    }

    #[test]
    fn should_start_with_empty_string_before_dynamic_text() {
        let mut template = Template::new();
        template.add_dynamic_text(template.root, Expr::ident("title"));

        let component = util::compile(template);
        assert_eq!(body(&component), "''+escape(data.title)");
    }

    #[test]
    fn should_escape_static_text_at_compile_time() {
        let mut template = Template::new();
        let p = template.add_element(template.root, "p");
        template.add_text(p, "a < b & c");
        template.set_attribute(p, "title", Some("\"quoted\""));

        let component = util::compile(template);
        assert_eq!(
            body(&component),
            "'<p title=\"&quot;quoted&quot;\">a &lt; b &amp; c</p>'"
        );
    }

    #[test]
    fn should_render_conditional_as_ternary() {
        let mut template = Template::new();
        let p = template.add_element(template.root, "p");
        template.make_conditional(p, Expr::ident("open"));
        template.add_text(p, "Hi");

        let component = util::compile(template);
        assert_eq!(
            body(&component),
            "''+(data.open?'<p class=\"p0\">Hi</p>':'<span class=\"p0\" data-else></span>')"
        );
    }

    #[test]
    fn should_join_loop_items() {
        let mut template = Template::new();
        let ul = template.add_element(template.root, "ul");
        template.make_iterator(ul, "item", Expr::ident("items"));
        let li = template.add_element(ul, "li");
        template.add_dynamic_text(li, Expr::chain(&["item", "name"]));

        let component = util::compile(template);
        assert_eq!(
            body(&component),
            "'<ul class=\"p0\">'+data.items.map((item,$i0)=>'<li>'+escape(data.items[$i0].name)+'</li>').join('')+'</ul>'"
        );
    }

    #[test]
    fn should_fill_content_and_meta_slots() {
        let mut template = Template::new();
        template.add_element(template.root, "slot");
        let meta = template.add_element(template.root, "slot");
        template.set_attribute(meta, "for", Some("meta"));

        let component = util::compile(template);
        assert_eq!(body(&component), "''+contentSlot+metaSlot");
    }

    #[test]
    fn should_omit_closing_tag_of_void_elements() {
        let mut template = Template::new();
        let div = template.add_element(template.root, "div");
        template.add_element(div, "br");
        template.add_element(div, "hr");

        let component = util::compile(template);
        assert_eq!(body(&component), "'<div><br><hr></div>'");
    }

    #[test]
    fn should_keep_fragment_comments() {
        let mut template = Template::new();
        template.add_comment(template.root, "dropped", false);
        template.add_comment(template.root, "c", true);

        let component = util::compile(template);
        assert_eq!(body(&component), "'<!--c-->'");
    }

    #[test]
    fn should_wrap_in_escape_exactly_once() {
        let mut template = Template::new();
        template.add_dynamic_text(
            template.root,
            Expr::ident("escape").call(vec![Expr::ident("title")]),
        );

        let component = util::compile_with(template, &["escape"], &util::minified());
        assert_eq!(body(&component), "''+escape(data.title)");
    }

    #[test]
    fn should_print_types_for_typescript() {
        let mut template = Template::new();
        template.add_element(template.root, "h1");

        let config = CompilerConfig {
            script_language: ScriptLanguage::Typescript,
            ..CompilerConfig::minified()
        };
        let component = util::compile_with(template, &[], &config);
        assert_eq!(
            component.server_source(&config),
            "function render(data: any,contentSlot: string,metaSlot: string): string{return '<h1></h1>'}"
        );
    }

    #[test]
    fn should_escape_like_the_runtime() {
        assert_eq!(escape_html("<b>\"Tom\" & Jerry</b>"), "&lt;b&gt;&quot;Tom&quot; &amp; Jerry&lt;/b&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
