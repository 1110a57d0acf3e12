//! Render a load plan as HTML for the page head.
//!
//! Immediate scripts never block parsing: external ones are `async`, inline
//! bodies wait for `DOMContentLoaded`. Deferred scripts become small
//! bootstraps that create the element after their delay and insert it before
//! the first script on the page. A page without any script gets nothing.

use crate::analytics::plan::{js_string, LoadPlan, PlannedScript, Timing};
use crate::analytics::queue::queue_shim;
use crate::analytics::script::ScriptTag;

pub fn render_head_snippet(plan: &LoadPlan) -> String {
    let mut html = Vec::new();
    for script in plan.immediate() {
        html.push(render_immediate(&script.tag));
    }
    for script in plan.deferred() {
        html.push(render_deferred(script));
    }
    html.join("\n")
}

fn render_immediate(tag: &ScriptTag) -> String {
    match &tag.body {
        Some(body) => {
            let mut tag = tag.clone();
            tag.body = Some(format!(
                "(function(){{var r=function(){{{body}}};\
                 if(document.readyState!=='loading'){{r();}}\
                 else{{document.addEventListener('DOMContentLoaded',r);}}}})();"
            ));
            tag.to_html()
        }
        None => tag.to_html(),
    }
}

fn render_deferred(script: &PlannedScript) -> String {
    let Timing::Deferred(delay) = script.timing else {
        return script.tag.to_html();
    };
    let tag = &script.tag;

    let mut js = String::new();
    if let Some(binding) = &script.queue {
        js.push_str(&queue_shim(binding.name));
        for call in &binding.calls {
            js.push_str(&call.to_js(binding.name));
        }
    }
    js.push_str("var d=document,s=d.createElement('script');");
    if tag.is_async {
        js.push_str("s.async=true;");
    }
    if tag.defer {
        js.push_str("s.defer=true;");
    }
    if let Some(src) = &tag.src {
        js.push_str(&format!("s.src={};", js_string(src)));
    }
    for (name, value) in &tag.attributes {
        js.push_str(&format!(
            "s.setAttribute({},{});",
            js_string(name),
            js_string(value)
        ));
    }
    js.push_str(
        "var f=d.getElementsByTagName('script')[0];\
         if(f&&f.parentNode){f.parentNode.insertBefore(s,f);}",
    );

    format!(
        "<script id=\"{}-loader\">setTimeout(function(){{{js}}},{});</script>",
        script.integration,
        delay.as_millis()
    )
}
