//! Script elements injected into the page.

use std::fmt;

/// Third-party integrations the loader knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Integration {
    Baidu,
    Google,
    Email,
    Clarity,
    Rybbit,
}

impl Integration {
    pub fn as_str(&self) -> &'static str {
        match self {
            Integration::Baidu => "baidu",
            Integration::Google => "google",
            Integration::Email => "email",
            Integration::Clarity => "clarity",
            Integration::Rybbit => "rybbit",
        }
    }
}

impl fmt::Display for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `<script>` element: either external (`src`) or inline (`body`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptTag {
    pub id: Option<String>,
    pub src: Option<String>,
    pub body: Option<String>,
    pub is_async: bool,
    pub defer: bool,
    pub attributes: Vec<(String, String)>,
}

impl ScriptTag {
    pub fn external(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            ..Self::default()
        }
    }

    pub fn inline(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    pub fn deferred(mut self) -> Self {
        self.defer = true;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Serialize as an HTML element. Inline bodies are emitted verbatim.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<script");
        if let Some(id) = &self.id {
            push_attr(&mut html, "id", id);
        }
        if let Some(src) = &self.src {
            push_attr(&mut html, "src", src);
        }
        if self.is_async {
            html.push_str(" async");
        }
        if self.defer {
            html.push_str(" defer");
        }
        for (name, value) in &self.attributes {
            push_attr(&mut html, name, value);
        }
        html.push('>');
        if let Some(body) = &self.body {
            html.push_str(body);
        }
        html.push_str("</script>");
        html
    }
}

fn push_attr(html: &mut String, name: &str, value: &str) {
    html.push(' ');
    html.push_str(name);
    html.push_str("=\"");
    html.push_str(&escape_attr(value));
    html.push('"');
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
