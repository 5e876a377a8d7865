use crate::state::Registry;

pub fn render_index(
    registry: &Registry,
    saves: &[String],
    status: Option<&str>,
    kind: Option<&str>,
) -> String {
    let tab_bar = render_tab_bar(registry);
    let body = match registry.selected() {
        Some((id, collection)) => render_tab_body(id, collection),
        None => r#"<p class="hint">No tab open. Create one above, or load a save file.</p>"#
            .to_string(),
    };
    let toolbar = render_toolbar(registry, saves);
    let status_line = render_status(status, kind);

    PAGE_HTML
        .replace("{{TOOLBAR}}", &toolbar)
        .replace("{{TABS}}", &tab_bar)
        .replace("{{BODY}}", &body)
        .replace("{{STATUS}}", &status_line)
}

fn render_toolbar(registry: &Registry, saves: &[String]) -> String {
    let save_options: String = saves
        .iter()
        .map(|name| format!(r#"<option value="{}"></option>"#, escape_html(name)))
        .collect();

    let current_controls = match registry.selected() {
        Some((id, collection)) => format!(
            concat!(
                r#"<form method="post" action="/tabs/save">"#,
                r#"<button type="submit">Save Current Tab</button></form>"#,
                r#"<form method="post" action="/tabs/{id}/remove" "#,
                r#"onsubmit="return confirm('Remove the tab \'{name}\'? This also deletes its save file.');">"#,
                r#"<button class="danger" type="submit">Remove Current Tab</button></form>"#
            ),
            id = id,
            name = escape_html(&collection.name),
        ),
        None => String::new(),
    };

    format!(
        concat!(
            r#"<form method="post" action="/tabs/new">"#,
            r#"<input name="name" placeholder="New tab name (e.g. 'Pokemon Glazed')" required />"#,
            r#"<button type="submit">New Tab</button></form>"#,
            r#"<form method="post" action="/tabs/open">"#,
            r#"<input name="file" list="save-files" placeholder="Save file to load" required />"#,
            r#"<datalist id="save-files">{options}</datalist>"#,
            r#"<button type="submit">Load Tab</button></form>"#,
            "{current}"
        ),
        options = save_options,
        current = current_controls,
    )
}

fn render_tab_bar(registry: &Registry) -> String {
    let selected = registry.selected().map(|(id, _)| id);
    registry
        .iter()
        .map(|(id, collection)| {
            let name = escape_html(&collection.name);
            if selected == Some(id) {
                format!(r#"<span class="tab active">{name}</span>"#)
            } else {
                format!(
                    concat!(
                        r#"<form method="post" action="/tabs/{id}/select">"#,
                        r#"<button class="tab" type="submit">{name}</button></form>"#
                    ),
                    id = id,
                    name = name,
                )
            }
        })
        .collect()
}

fn render_tab_body(id: u64, collection: &crate::models::Collection) -> String {
    let rows: String = collection
        .counters
        .iter()
        .enumerate()
        .map(|(index, counter)| render_counter_row(id, index, counter))
        .collect();

    format!(
        concat!(
            r#"<div class="counters">{rows}</div>"#,
            r#"<form method="post" action="/tabs/{id}/counters/add">"#,
            r#"<button type="submit">Add Pokemon Tracker</button></form>"#
        ),
        rows = rows,
        id = id,
    )
}

fn render_counter_row(tab_id: u64, index: usize, counter: &crate::models::Counter) -> String {
    if counter.is_locked() {
        return format!(
            concat!(
                r#"<div class="counter obtained">"#,
                r#"<span class="announcement">{label}</span>"#,
                r#"<span class="badge">obtained</span></div>"#
            ),
            label = escape_html(counter.display_label()),
        );
    }

    format!(
        concat!(
            r#"<div class="counter">"#,
            r#"<form method="post" action="/tabs/{tab}/counters/{idx}/rename" class="rename">"#,
            r#"<input name="name" value="{label}" />"#,
            r#"<button type="submit" title="Rename">&#10003;</button></form>"#,
            r#"<form method="post" action="/tabs/{tab}/counters/{idx}/decrement">"#,
            r#"<button type="submit">-</button></form>"#,
            r#"<span class="count">{count}</span>"#,
            r#"<form method="post" action="/tabs/{tab}/counters/{idx}/increment">"#,
            r#"<button type="submit">+</button></form>"#,
            r#"<form method="post" action="/tabs/{tab}/counters/{idx}/obtained">"#,
            r#"<button class="gotit" type="submit">Got it!</button></form>"#,
            "</div>"
        ),
        tab = tab_id,
        idx = index,
        label = escape_html(counter.display_label()),
        count = counter.attempts(),
    )
}

fn render_status(status: Option<&str>, kind: Option<&str>) -> String {
    match status {
        Some(message) if !message.is_empty() => format!(
            r#"<div class="status" data-type="{}">{}</div>"#,
            escape_html(kind.unwrap_or("")),
            escape_html(message),
        ),
        _ => r#"<div class="status"></div>"#.to_string(),
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Shiny Tracker</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #eef4ec;
      --bg-2: #cfe6d8;
      --ink: #243329;
      --accent: #2d9c5a;
      --accent-2: #2f4858;
      --danger: #c63b2b;
      --card: rgba(255, 255, 255, 0.88);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.16);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e2f1e6 60%, #f2f7ef 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: start center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(1.8rem, 4vw, 2.4rem);
      margin: 0;
    }

    .subtitle {
      margin: 0;
      color: #5c6b60;
      font-size: 1rem;
    }

    .toolbar {
      display: flex;
      flex-wrap: wrap;
      gap: 10px;
      align-items: center;
    }

    .toolbar form {
      display: flex;
      gap: 6px;
    }

    input {
      border: 1px solid rgba(47, 72, 88, 0.25);
      border-radius: 10px;
      padding: 9px 12px;
      font: inherit;
      background: white;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 9px 16px;
      font-size: 0.95rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent-2);
      color: white;
      transition: transform 150ms ease;
    }

    button:active {
      transform: scale(0.97);
    }

    button.danger {
      background: var(--danger);
    }

    button.gotit {
      background: var(--accent);
    }

    .tab-bar {
      display: flex;
      flex-wrap: wrap;
      gap: 6px;
      padding: 6px;
      background: rgba(47, 72, 88, 0.08);
      border-radius: 16px;
    }

    .tab-bar form {
      display: contents;
    }

    .tab {
      background: transparent;
      border: none;
      border-radius: 999px;
      padding: 8px 14px;
      font-size: 0.9rem;
      font-weight: 600;
      color: #5c6b60;
    }

    span.tab.active {
      background: white;
      color: var(--accent-2);
      box-shadow: 0 8px 16px rgba(47, 72, 88, 0.12);
    }

    .counters {
      display: grid;
      gap: 10px;
    }

    .counter {
      display: flex;
      align-items: center;
      gap: 8px;
      background: white;
      border: 1px solid rgba(47, 72, 88, 0.08);
      border-radius: 14px;
      padding: 10px 12px;
    }

    .counter form {
      display: flex;
      gap: 6px;
    }

    .counter .rename {
      flex: 1;
    }

    .counter .rename input {
      flex: 1;
    }

    .counter .count {
      min-width: 3.2em;
      text-align: center;
      font-size: 1.2rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .counter.obtained {
      border: 2px solid var(--accent);
      justify-content: space-between;
    }

    .announcement {
      font-weight: 600;
    }

    .badge {
      background: var(--accent);
      color: white;
      border-radius: 999px;
      padding: 4px 12px;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.08em;
    }

    .status {
      font-size: 0.95rem;
      color: #5c6b60;
      min-height: 1.2em;
    }

    .status[data-type="error"] {
      color: var(--danger);
    }

    .status[data-type="warn"] {
      color: #a06a12;
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }

    .hint {
      margin: 0;
      color: #6f7a70;
      font-size: 0.9rem;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Shiny Tracker</h1>
      <p class="subtitle">Egg tries per hunt, one save file per tab.</p>
    </header>

    <section class="toolbar">{{TOOLBAR}}</section>

    <nav class="tab-bar">{{TABS}}</nav>

    <section>{{BODY}}</section>

    {{STATUS}}
  </main>
</body>
</html>
"#;
