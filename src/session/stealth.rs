//! Anti-detection script injection
//!
//! Every pooled session runs with a stealth profile so rendered fetches
//! look like a regular user browser to common bot-detection checks. Scripts
//! are registered to run on every new document before page code executes.

use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use tracing::debug;

use crate::error::{Error, Result};

const HIDE_WEBDRIVER: &str = r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
        configurable: true
    });
"#;

const MOCK_CHROME_RUNTIME: &str = r#"
    if (!window.chrome) {
        window.chrome = {};
    }
    if (!window.chrome.runtime) {
        window.chrome.runtime = {
            connect: function() {},
            sendMessage: function() {}
        };
    }
"#;

const MOCK_LANGUAGES: &str = r#"
    Object.defineProperty(navigator, 'languages', {
        get: () => ['en-US', 'en'],
        configurable: true
    });
"#;

const MOCK_PLUGINS: &str = r#"
    Object.defineProperty(navigator, 'plugins', {
        get: () => {
            const plugins = [
                { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer' },
                { name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai' },
                { name: 'Native Client', filename: 'internal-nacl-plugin' }
            ];
            plugins.item = (i) => plugins[i];
            plugins.namedItem = (name) => plugins.find(p => p.name === name);
            return plugins;
        },
        configurable: true
    });
"#;

const MASK_WEBGL: &str = r#"
    const getParameterOriginal = WebGLRenderingContext.prototype.getParameter;
    WebGLRenderingContext.prototype.getParameter = function(parameter) {
        if (parameter === 37445) { return 'Intel Inc.'; }
        if (parameter === 37446) { return 'Intel Iris OpenGL Engine'; }
        return getParameterOriginal.call(this, parameter);
    };
"#;

const SCRIPTS: &[(&str, &str)] = &[
    ("webdriver", HIDE_WEBDRIVER),
    ("chrome-runtime", MOCK_CHROME_RUNTIME),
    ("languages", MOCK_LANGUAGES),
    ("plugins", MOCK_PLUGINS),
    ("webgl", MASK_WEBGL),
];

/// Register all stealth scripts on a freshly created page
pub(crate) async fn apply(page: &Page) -> Result<()> {
    for (name, script) in SCRIPTS {
        let params = AddScriptToEvaluateOnNewDocumentParams::builder()
            .source(*script)
            .build()
            .map_err(|e| Error::cdp(format!("Failed to build {} stealth script: {}", name, e)))?;
        page.execute(params)
            .await
            .map_err(|e| Error::cdp(format!("Failed to inject {} stealth script: {}", name, e)))?;
    }
    debug!("stealth profile applied");
    Ok(())
}
