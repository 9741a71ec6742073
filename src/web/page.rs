//! The review page.

/// Single-page UI. All data flows through the `/api` routes.
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>图纸预审</title>
<style>
  body { margin: 0; font-family: system-ui, sans-serif; display: flex; min-height: 100vh; }
  aside { width: 280px; padding: 1.5rem; background: #f4f5f7; box-sizing: border-box; }
  main { flex: 1; padding: 1.5rem 2rem; max-width: 1100px; }
  .warning { background: #fff4d6; border-left: 4px solid #e0a800; padding: .75rem; margin: .75rem 0; }
  .info { background: #e6f2ff; border-left: 4px solid #2f80ed; padding: .75rem; margin: .75rem 0; }
  .error { background: #fde8e8; border-left: 4px solid #d93025; padding: .75rem; margin: .75rem 0; }
  .success { background: #e6f6ea; border-left: 4px solid #1e8e3e; padding: .75rem; margin: .75rem 0; }
  .hidden { display: none; }
  img#drawing { max-width: 100%; border: 1px solid #ddd; margin-top: 1rem; }
  table { border-collapse: collapse; margin-top: .5rem; }
  th, td { border: 1px solid #ccc; padding: .4rem .7rem; text-align: left; }
  pre { background: #f6f8fa; padding: .75rem; overflow-x: auto; }
  button { padding: .5rem 1.2rem; font-size: 1rem; cursor: pointer; }
</style>
</head>
<body>
<aside>
  <h3>安全红线</h3>
  <div class="warning">上传前请务必使用截图工具遮挡客户 Logo 和电话！</div>
  <div class="info">数据仅用于 AI 临时分析，不会留存。</div>
  <form id="key-form" class="hidden">
    <label for="api-key">请输入 Google API Key</label><br>
    <input id="api-key" type="password" autocomplete="off">
    <button type="submit">保存</button>
  </form>
</aside>
<main>
  <h1>图纸秒级预审 Agent</h1>
  <p>直接上传图纸，AI 自动检测[材质]、[公差]等关键要素。</p>
  <div id="notice" class="hidden"></div>

  <section id="workspace" class="hidden">
    <label for="file">请上传图纸 (支持 PNG, JPG, JPEG)</label><br>
    <input id="file" type="file" accept=".png,.jpg,.jpeg">
    <div id="preview" class="hidden">
      <img id="drawing" alt="已上传图纸">
      <p><button id="trigger">开始 AI 预审</button></p>
    </div>
    <div id="status" class="hidden"></div>
    <section id="result" class="hidden">
      <h3>预审报告</h3>
      <div id="report"></div>
      <details>
        <summary>查看结构化数据 (供 CRM 集成用)</summary>
        <pre id="summary"></pre>
      </details>
    </section>
  </section>
</main>
<script>
const $ = (id) => document.getElementById(id);
const show = (el, on) => el.classList.toggle("hidden", !on);

function message(el, kind, text) {
  el.className = kind;
  el.textContent = text;
}

function escapeHtml(s) {
  return s.replace(/[&<>"]/g, (c) => ({ "&": "&amp;", "<": "&lt;", ">": "&gt;", '"': "&quot;" })[c]);
}

function renderReport(text) {
  const lines = text.split("\n");
  const out = [];
  let i = 0;
  while (i < lines.length) {
    const row = lines[i].trim();
    if (row.startsWith("|")) {
      const rows = [];
      while (i < lines.length && lines[i].trim().startsWith("|")) {
        rows.push(lines[i].trim());
        i++;
      }
      const cells = (r) => r.replace(/^\||\|$/g, "").split("|").map((c) => escapeHtml(c.trim()));
      const body = rows.filter((r) => !/^\|[\s\-:|]+\|$/.test(r));
      let html = "<table>";
      body.forEach((r, n) => {
        const tag = n === 0 ? "th" : "td";
        html += "<tr>" + cells(r).map((c) => `<${tag}>${c}</${tag}>`).join("") + "</tr>";
      });
      out.push(html + "</table>");
    } else {
      if (row) out.push("<p>" + escapeHtml(row) + "</p>");
      i++;
    }
  }
  $("report").innerHTML = out.join("");
}

async function api(path, options) {
  const resp = await fetch(path, options);
  const body = await resp.json().catch(() => ({}));
  if (!resp.ok) throw new Error(body.error || resp.statusText);
  return body;
}

async function refresh() {
  const state = await api("/api/state");
  show($("key-form"), !state.configured);
  show($("workspace"), state.configured);
  if (!state.configured) {
    message($("notice"), "warning", "请在侧边栏输入 API Key 或在后台配置 Secrets");
    return;
  }
  show($("notice"), false);
  if (state.image) {
    $("drawing").src = "/api/image?t=" + Date.now();
    show($("preview"), true);
  }
}

$("key-form").addEventListener("submit", async (ev) => {
  ev.preventDefault();
  try {
    await api("/api/credential", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({ api_key: $("api-key").value }),
    });
    $("api-key").value = "";
    await refresh();
  } catch (e) {
    message($("notice"), "error", e.message);
  }
});

$("file").addEventListener("change", async () => {
  const file = $("file").files[0];
  if (!file) return;
  const form = new FormData();
  form.append("file", file);
  show($("result"), false);
  show($("status"), false);
  try {
    await api("/api/upload", { method: "POST", body: form });
    await refresh();
  } catch (e) {
    show($("preview"), false);
    message($("status"), "error", e.message);
  }
});

$("trigger").addEventListener("click", async () => {
  $("trigger").disabled = true;
  show($("result"), false);
  message($("status"), "info", "AI 工程师正在读图，请稍候 (约5-10秒)...");
  try {
    const outcome = await api("/api/review", { method: "POST" });
    message($("status"), "success", "分析完成！");
    renderReport(outcome.report);
    $("summary").textContent = JSON.stringify(outcome.summary, null, 2);
    show($("result"), true);
  } catch (e) {
    message($("status"), "error", e.message);
  } finally {
    $("trigger").disabled = false;
  }
});

refresh().catch((e) => message($("notice"), "error", e.message));
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_has_controls() {
        assert!(INDEX_HTML.contains(r#"type="password""#));
        assert!(INDEX_HTML.contains(r#"accept=".png,.jpg,.jpeg""#));
        assert!(INDEX_HTML.contains("<details>"));
        assert!(INDEX_HTML.contains("/api/review"));
    }
}
