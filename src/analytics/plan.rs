//! Load plan: which integrations are injected, in what order, and when.
//!
//! Built once from the analytics configuration. Immediate scripts run as
//! soon as the page is interactive, in plan order. Deferred scripts fire
//! after a fixed delay from mount, heaviest (session recording) last.

use std::time::Duration;

use crate::analytics::queue::PendingCall;
use crate::analytics::script::{Integration, ScriptTag};
use crate::config::AnalyticsConfig;

pub const CLARITY_DELAY: Duration = Duration::from_millis(3000);
/// Slightly after Clarity so the two never race for the document head.
pub const RYBBIT_DELAY: Duration = Duration::from_millis(3500);

const BAIDU_SCRIPT: &str = "https://hm.baidu.com/hm.js";
const GTAG_SCRIPT: &str = "https://www.googletagmanager.com/gtag/js";
const CLARITY_SCRIPT: &str = "https://www.clarity.ms/tag/";

/// When a script is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    /// Appended as soon as the page is interactive.
    AfterInteractive,
    /// Inserted before the first script element once the delay elapsed.
    Deferred(Duration),
}

/// Global queue a script relies on, with calls to enqueue before it loads.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueBinding {
    pub name: &'static str,
    pub calls: Vec<PendingCall>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedScript {
    pub integration: Integration,
    pub timing: Timing,
    pub tag: ScriptTag,
    pub queue: Option<QueueBinding>,
}

impl PlannedScript {
    pub fn delay(&self) -> Option<Duration> {
        match self.timing {
            Timing::AfterInteractive => None,
            Timing::Deferred(delay) => Some(delay),
        }
    }
}

/// Ordered injection plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadPlan {
    scripts: Vec<PlannedScript>,
}

impl LoadPlan {
    pub fn from_config(config: &AnalyticsConfig) -> Self {
        let mut scripts = Vec::new();

        if config.baidu.enabled {
            scripts.push(baidu(&config.baidu.tracking_id));
        }

        if config.google.enabled {
            scripts.extend(google(&config.google.tracking_id));
            // The email tag lives inside the Google block.
            if config.email.enabled {
                scripts.push(email(&config.email.script_url));
            }
        }

        if config.clarity.enabled {
            scripts.push(clarity(&config.clarity.tracking_id));
        }

        if config.rybbit.enabled {
            scripts.push(rybbit(&config.rybbit.script_url, &config.rybbit.site_id));
        }

        Self { scripts }
    }

    pub fn scripts(&self) -> &[PlannedScript] {
        &self.scripts
    }

    pub fn immediate(&self) -> impl Iterator<Item = &PlannedScript> {
        self.scripts
            .iter()
            .filter(|s| s.timing == Timing::AfterInteractive)
    }

    /// Deferred scripts ordered by delay.
    pub fn deferred(&self) -> Vec<&PlannedScript> {
        let mut deferred: Vec<&PlannedScript> =
            self.scripts.iter().filter(|s| s.delay().is_some()).collect();
        deferred.sort_by_key(|s| s.delay());
        deferred
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn integrations(&self) -> Vec<Integration> {
        let mut seen = Vec::new();
        for script in &self.scripts {
            if !seen.contains(&script.integration) {
                seen.push(script.integration);
            }
        }
        seen
    }
}

fn baidu(tracking_id: &str) -> PlannedScript {
    let src = format!("{BAIDU_SCRIPT}?{tracking_id}");
    let body = format!(
        "window._hmt = window._hmt || [];\
         (function() {{\
         var hm = document.createElement(\"script\");\
         hm.src = {src};\
         var s = document.getElementsByTagName(\"script\")[0];\
         s.parentNode.insertBefore(hm, s);\
         }})();",
        src = js_string(&src),
    );
    PlannedScript {
        integration: Integration::Baidu,
        timing: Timing::AfterInteractive,
        tag: ScriptTag::inline(body).with_id("baidu-analytics"),
        queue: Some(QueueBinding {
            name: "_hmt",
            calls: Vec::new(),
        }),
    }
}

fn google(tracking_id: &str) -> [PlannedScript; 2] {
    let loader = PlannedScript {
        integration: Integration::Google,
        timing: Timing::AfterInteractive,
        tag: ScriptTag::external(format!("{GTAG_SCRIPT}?id={tracking_id}"))
            .with_id("google-analytics")
            .asynchronous(),
        queue: None,
    };

    // Page view is deferred until load to keep it off the first paint.
    let body = format!(
        "window.dataLayer = window.dataLayer || [];\
         window.gtag = function(){{dataLayer.push(arguments);}};\
         gtag('js', new Date());\
         gtag('config', {id}, {{ send_page_view: false }});\
         if (document.readyState === 'complete') {{\
         gtag('event', 'page_view');\
         }} else {{\
         window.addEventListener('load', function() {{ gtag('event', 'page_view'); }});\
         }}",
        id = js_string(tracking_id),
    );
    let config = PlannedScript {
        integration: Integration::Google,
        timing: Timing::AfterInteractive,
        tag: ScriptTag::inline(body).with_id("google-analytics-config"),
        queue: Some(QueueBinding {
            name: "dataLayer",
            calls: vec![
                PendingCall::new(["js"]),
                PendingCall::new(vec![
                    serde_json::Value::from("config"),
                    serde_json::Value::from(tracking_id),
                    serde_json::json!({ "send_page_view": false }),
                ]),
            ],
        }),
    };

    [loader, config]
}

fn email(script_url: &str) -> PlannedScript {
    let pageview = PendingCall::new(["send", "pageview"]);
    let body = format!(
        "(function(w,d,t,u,n,a,m){{w['MauticTrackingObject']=n;\
         w[n]=w[n]||function(){{(w[n].q=w[n].q||[]).push(arguments)}},a=d.createElement(t),\
         m=d.getElementsByTagName(t)[0];a.async=1;a.src=u;m.parentNode.insertBefore(a,m)\
         }})(window,document,'script',{url},'mt');\
         {pageview}",
        url = js_string(script_url),
        pageview = pageview.to_js("mt"),
    );
    PlannedScript {
        integration: Integration::Email,
        timing: Timing::AfterInteractive,
        tag: ScriptTag::inline(body).with_id("email-analytics"),
        queue: Some(QueueBinding {
            name: "mt",
            calls: vec![pageview],
        }),
    }
}

fn clarity(tracking_id: &str) -> PlannedScript {
    PlannedScript {
        integration: Integration::Clarity,
        timing: Timing::Deferred(CLARITY_DELAY),
        tag: ScriptTag::external(format!("{CLARITY_SCRIPT}{tracking_id}")).asynchronous(),
        queue: Some(QueueBinding {
            name: "clarity",
            calls: Vec::new(),
        }),
    }
}

fn rybbit(script_url: &str, site_id: &str) -> PlannedScript {
    PlannedScript {
        integration: Integration::Rybbit,
        timing: Timing::Deferred(RYBBIT_DELAY),
        tag: ScriptTag::external(script_url)
            .asynchronous()
            .deferred()
            .with_attribute("data-site-id", site_id),
        queue: None,
    }
}

/// Quote a value as a JavaScript string literal that is safe inside an
/// inline `<script>` element.
pub(crate) fn js_string(value: &str) -> String {
    escape_script_close(&serde_json::Value::from(value).to_string())
}

/// `<` never appears raw, so no value can close the enclosing script tag.
pub(crate) fn escape_script_close(js: &str) -> String {
    js.replace('<', "\\u003c")
}
