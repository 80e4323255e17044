//! Live-reload and native-bridge script injection.
//!
//! Every HTML response is rendered fresh from disk and gets one script
//! block inserted immediately before the last closing body tag. The block
//! opens the reload WebSocket and installs the cross-platform action
//! bridge used by WebView embedders.

/// Inject the live-reload/bridge script into an HTML document.
///
/// The block is inserted before the last `</body>` (case-insensitive);
/// documents without a closing body tag get it appended. Each response is
/// built from the on-disk document, so the block appears exactly once.
pub fn inject_live_reload(html: &str) -> String {
    let snippet = live_reload_snippet();
    match rfind_close_body(html) {
        Some(idx) => format!("{}\n{}\n{}", &html[..idx], snippet, &html[idx..]),
        None => format!("{html}\n{snippet}\n"),
    }
}

/// Byte offset of the last case-insensitive `</body>`.
fn rfind_close_body(html: &str) -> Option<usize> {
    const TAG: &[u8] = b"</body>";
    html.as_bytes()
        .windows(TAG.len())
        .rposition(|window| window.eq_ignore_ascii_case(TAG))
}

/// The injected script block.
///
/// Bridge conventions:
/// - iOS WebView: `window.webkit.messageHandlers.canvasHostAction.postMessage(...)`
/// - Android WebView: `window.canvasHostAction.postMessage(...)`
fn live_reload_snippet() -> String {
    format!(
        r#"<script>
(() => {{
  const actionHandlerName = "canvasHostAction";
  function postToHost(payload) {{
    try {{
      const raw = typeof payload === "string" ? payload : JSON.stringify(payload);
      const iosHandler = globalThis.webkit?.messageHandlers?.[actionHandlerName];
      if (iosHandler && typeof iosHandler.postMessage === "function") {{
        iosHandler.postMessage(raw);
        return true;
      }}
      const androidHandler = globalThis[actionHandlerName];
      if (androidHandler && typeof androidHandler.postMessage === "function") {{
        // Call as a method on the interface object (binding matters on Android WebView).
        androidHandler.postMessage(raw);
        return true;
      }}
    }} catch {{}}
    return false;
  }}
  function sendUserAction(userAction) {{
    const id =
      (userAction && typeof userAction.id === "string" && userAction.id.trim()) ||
      (globalThis.crypto?.randomUUID?.() ?? String(Date.now()));
    const action = {{ ...userAction, id }};
    return postToHost({{ userAction: action }});
  }}
  globalThis.CanvasHost = globalThis.CanvasHost ?? {{}};
  globalThis.CanvasHost.postMessage = postToHost;
  globalThis.CanvasHost.sendUserAction = sendUserAction;
  globalThis.canvasHostPostMessage = postToHost;
  globalThis.canvasHostSendUserAction = sendUserAction;

  try {{
    const proto = location.protocol === "https:" ? "wss" : "ws";
    const ws = new WebSocket(proto + "://" + location.host + "{ws_path}");
    ws.onmessage = (ev) => {{
      if (String(ev.data || "") === "reload") location.reload();
    }};
  }} catch {{}}
}})();
</script>"#,
        ws_path = crate::WS_PATH
    )
}

/// Starter page seeded into an empty canvas root.
///
/// A small self-test card: shows whether the action bridge is available
/// and lets the user fire a couple of sample actions.
pub(crate) fn default_index_html() -> String {
    r#"<!doctype html>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1" />
<title>Canvas</title>
<style>
  html, body { height: 100%; margin: 0; background: #000; color: #fff; font: 16px/1.4 system-ui, sans-serif; }
  .wrap { min-height: 100%; display: grid; place-items: center; padding: 24px; }
  .card { width: min(720px, 100%); background: rgba(255,255,255,0.06); border: 1px solid rgba(255,255,255,0.10); border-radius: 16px; padding: 18px; }
  h1 { margin: 0; font-size: 22px; }
  .sub { opacity: 0.75; font-size: 13px; }
  .row { display: flex; gap: 10px; flex-wrap: wrap; margin-top: 14px; }
  button { border: 1px solid rgba(255,255,255,0.14); background: rgba(255,255,255,0.10); color: #fff; padding: 10px 12px; border-radius: 12px; font-weight: 600; cursor: pointer; }
  .log { margin-top: 14px; font: 12px/1.4 ui-monospace, monospace; white-space: pre-wrap; background: rgba(0,0,0,0.35); border: 1px solid rgba(255,255,255,0.08); padding: 10px; border-radius: 12px; }
</style>
<body>
<div class="wrap">
  <div class="card">
    <h1>Canvas</h1>
    <div class="sub">Starter page (auto-reload enabled)</div>
    <div class="row">
      <button id="btn-hello">Hello</button>
      <button id="btn-time">Time</button>
    </div>
    <div id="status" class="sub" style="margin-top: 10px;"></div>
    <div id="log" class="log">Ready.</div>
  </div>
</div>
<script>
(() => {
  const logEl = document.getElementById("log");
  const statusEl = document.getElementById("status");
  const log = (msg) => { logEl.textContent = String(msg); };

  const hasBridge = () => typeof window.canvasHostSendUserAction === "function";
  statusEl.textContent = "Bridge: " + (hasBridge() ? "ready" : "missing");

  function send(name, sourceComponentId) {
    if (!hasBridge()) {
      log("No action bridge found. Open this page from an embedding canvas client.");
      return;
    }
    const ok = window.canvasHostSendUserAction({
      name,
      surfaceId: "main",
      sourceComponentId,
      context: { t: Date.now() },
    });
    log(ok ? ("Sent action: " + name) : ("Failed to send action: " + name));
  }

  document.getElementById("btn-hello").onclick = () => send("hello", "demo.hello");
  document.getElementById("btn-time").onclick = () => send("time", "demo.time");
})();
</script>
</body>
"#
    .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_before_closing_body() {
        let html = "<html><body>hi</body></html>";

        let injected = inject_live_reload(html);

        let script_at = injected.find("<script>").unwrap();
        let body_close = injected.find("</body>").unwrap();
        assert!(script_at < body_close);
        assert!(injected.contains("hi"));
        assert!(injected.ends_with("</body></html>"));
    }

    #[test]
    fn test_inject_case_insensitive() {
        let injected = inject_live_reload("<BODY>x</BODY>");

        let script_at = injected.find("<script>").unwrap();
        let body_close = injected.find("</BODY>").unwrap();
        assert!(script_at < body_close);
    }

    #[test]
    fn test_inject_uses_last_closing_tag() {
        let html = "<body>a</body><body>b</body>";

        let injected = inject_live_reload(html);

        let last_close = injected.rfind("</body>").unwrap();
        let script_at = injected.rfind("<script>").unwrap();
        assert!(script_at < last_close);
        assert!(injected[..script_at].contains("</body>"));
    }

    #[test]
    fn test_inject_appends_without_body_tag() {
        let injected = inject_live_reload("<p>fragment</p>");

        assert!(injected.starts_with("<p>fragment</p>"));
        assert!(injected.contains("<script>"));
    }

    #[test]
    fn test_inject_exactly_once() {
        let injected = inject_live_reload("<body>hi</body>");

        assert_eq!(injected.matches(crate::WS_PATH).count(), 1);
    }

    #[test]
    fn test_snippet_contains_bridge_and_ws_path() {
        let snippet = live_reload_snippet();

        assert!(snippet.contains("canvasHostAction"));
        assert!(snippet.contains(crate::WS_PATH));
        assert!(snippet.contains("location.reload()"));
    }

    #[test]
    fn test_default_index_gets_injection() {
        let injected = inject_live_reload(&default_index_html());

        let script_at = injected.find(crate::WS_PATH).unwrap();
        let body_close = injected.rfind("</body>").unwrap();
        assert!(script_at < body_close);
    }
}
