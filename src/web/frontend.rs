//! Embedded HTML/CSS/JS frontend for the insightboard dashboard.
//!
//! The entire page is compiled into the binary as a string constant. It
//! only draws what `/api/view` returns; filtering, facets and chart
//! geometry all happen server side.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>insightboard</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1200px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 24px; font-weight: 600; }
header h1 .logo { color: var(--accent); font-family: var(--mono); }
header .subtitle { color: var(--text-muted); font-size: 13px; }

.badge {
  display: inline-flex;
  padding: 4px 10px;
  border-radius: 12px;
  font-size: 12px;
  background: var(--surface);
  border: 1px solid var(--border);
}
.badge.ok { border-color: var(--green); color: var(--green); }
.badge.err { border-color: var(--red); color: var(--red); }

.layout { display: grid; grid-template-columns: 280px 1fr; gap: 16px; }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  margin-bottom: 16px;
}
.card h2 { font-size: 16px; font-weight: 600; margin-bottom: 16px; }

.field { margin-bottom: 12px; }
.field label {
  display: block;
  font-size: 12px;
  color: var(--text-muted);
  margin-bottom: 4px;
  text-transform: uppercase;
  letter-spacing: 0.5px;
}
.field input, .field select {
  width: 100%;
  padding: 6px 8px;
  background: var(--bg);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: 6px;
  font-size: 13px;
}
.field select[multiple] { height: 96px; }

.btn-row { display: flex; gap: 8px; }
button {
  flex: 1;
  padding: 8px 12px;
  border: 1px solid var(--border);
  border-radius: 6px;
  background: transparent;
  color: var(--text);
  font-size: 13px;
  cursor: pointer;
}
button:hover { background: rgba(255,255,255,0.04); }
button.primary { background: var(--accent); border-color: var(--accent); color: #fff; }

svg text { fill: var(--text-muted); font-size: 10px; }
svg .axis line, svg .axis path { stroke: var(--border); }
svg .title { fill: var(--text); font-size: 14px; font-weight: 600; }
svg .mark { fill: var(--accent); }
svg .mark:hover { fill: var(--yellow); }
svg .line { fill: none; stroke: var(--accent); stroke-width: 2; }

table { width: 100%; border-collapse: collapse; font-size: 13px; }
th { text-align: left; color: var(--text-muted); font-weight: 500; padding: 6px 8px; border-bottom: 1px solid var(--border); }
td { padding: 6px 8px; border-bottom: 1px solid var(--border); }
.muted { color: var(--text-muted); }

.toast {
  position: fixed;
  bottom: 24px;
  right: 24px;
  padding: 10px 16px;
  border-radius: var(--radius);
  background: var(--surface);
  border: 1px solid var(--green);
  opacity: 0;
  transition: opacity 0.2s;
}
.toast.show { opacity: 1; }
.toast.error { border-color: var(--red); }
</style>
</head>
<body>
<div class="app">
  <header>
    <div>
      <h1><span class="logo">insight</span>board</h1>
      <div class="subtitle" id="counts">loading…</div>
    </div>
    <span class="badge" id="fetch-badge">no data</span>
  </header>

  <div class="layout">
    <aside class="card">
      <h2>Filters</h2>
      <div class="field"><label>Search title</label><input id="f-search" type="text"></div>
      <div class="field"><label>Published from</label><input id="f-date_from" type="date"></div>
      <div class="field"><label>Published to</label><input id="f-date_to" type="date"></div>
      <div class="field"><label>End year</label><select id="f-end_year"></select></div>
      <div class="field"><label>Topics</label><select id="f-topics" multiple></select></div>
      <div class="field"><label>Sector</label><select id="f-sector"></select></div>
      <div class="field"><label>Region</label><select id="f-region"></select></div>
      <div class="field"><label>PEST</label><select id="f-pest"></select></div>
      <div class="field"><label>Source</label><input id="f-source" type="text"></div>
      <div class="field"><label>SWOT</label><select id="f-swot"></select></div>
      <div class="field"><label>Country</label><select id="f-country"></select></div>
      <div class="field"><label>City</label><select id="f-city"></select></div>
      <div class="btn-row">
        <button id="btn-clear">Clear filters</button>
        <button id="btn-refresh" class="primary">Refresh</button>
      </div>
    </aside>

    <main>
      <div class="card">
        <div class="field">
          <label>Chart type</label>
          <select id="chart-type"></select>
        </div>
        <svg id="chart"></svg>
      </div>
      <div class="card">
        <h2>Data preview</h2>
        <table>
          <thead><tr><th>Title</th><th>Region</th><th>Sector</th><th>Topic</th><th>Intensity</th><th>Published</th></tr></thead>
          <tbody id="preview"></tbody>
        </table>
      </div>
    </main>
  </div>
</div>
<div class="toast" id="toast"></div>

<script>
// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------
let viewData = null;
const SVG_NS = 'http://www.w3.org/2000/svg';
const TEXT_FIELDS = ['search', 'date_from', 'date_to', 'source'];
const SELECT_FIELDS = {
  end_year: 'end_years', sector: 'sectors', region: 'regions',
  country: 'countries', city: 'cities',
};

// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  const data = await res.json();
  if (!res.ok) throw new Error(data.error || res.statusText);
  return data;
}

function toast(msg, isError) {
  const el = document.getElementById('toast');
  el.textContent = msg;
  el.className = 'toast show' + (isError ? ' error' : '');
  setTimeout(() => el.className = 'toast', 3000);
}

function esc(s) {
  return String(s ?? '').replace(/[&<>"]/g, c => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;' })[c]);
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------
function fillSelect(el, values, selected, blank) {
  const opts = blank ? ['<option value="">All</option>'] : [];
  for (const v of values) {
    const s = String(v);
    const sel = Array.isArray(selected) ? selected.includes(s) : selected === s;
    opts.push(`<option value="${esc(s)}"${sel ? ' selected' : ''}>${esc(s)}</option>`);
  }
  el.innerHTML = opts.join('');
}

function renderControls() {
  const c = viewData.criteria;
  const o = viewData.options;
  for (const f of TEXT_FIELDS) document.getElementById('f-' + f).value = c[f] || '';
  for (const [f, facet] of Object.entries(SELECT_FIELDS)) {
    fillSelect(document.getElementById('f-' + f), o.facets[facet], c[f], true);
  }
  fillSelect(document.getElementById('f-pest'), o.pest, c.pest, true);
  fillSelect(document.getElementById('f-swot'), o.swot, c.swot, true);
  fillSelect(document.getElementById('f-topics'), o.facets.topics, c.topics, false);
  fillSelect(document.getElementById('chart-type'), viewData.chart_types, viewData.chart_type, false);
}

function readCriteria() {
  const c = { sort_by: viewData ? viewData.criteria.sort_by : '' };
  for (const f of TEXT_FIELDS) c[f] = document.getElementById('f-' + f).value;
  for (const f of [...Object.keys(SELECT_FIELDS), 'pest', 'swot']) {
    c[f] = document.getElementById('f-' + f).value;
  }
  c.topics = [...document.getElementById('f-topics').selectedOptions].map(o => o.value);
  return c;
}

// ---------------------------------------------------------------------------
// Chart drawing
// ---------------------------------------------------------------------------
function el(tag, attrs, parent) {
  const node = document.createElementNS(SVG_NS, tag);
  for (const [k, v] of Object.entries(attrs || {})) node.setAttribute(k, v);
  if (parent) parent.appendChild(node);
  return node;
}

function withTooltip(node, label) {
  el('title', {}, node).textContent = label;
  return node;
}

function linearMap(scale, v) {
  const [d0, d1] = scale.domain, [r0, r1] = scale.range;
  return d1 === d0 ? (r0 + r1) / 2 : r0 + (v - d0) / (d1 - d0) * (r1 - r0);
}

function timeMap(scale, t) {
  const [d0, d1] = scale.domain.map(d => Date.parse(d)), [r0, r1] = scale.range;
  const v = Date.parse(t);
  return d1 === d0 ? (r0 + r1) / 2 : r0 + (v - d0) / (d1 - d0) * (r1 - r0);
}

function bandAxis(g, scale, h, vertical) {
  const axis = el('g', { class: 'axis' }, g);
  scale.domain.forEach((key, i) => {
    const p = scale.offset + scale.step * i + scale.bandwidth / 2;
    const t = vertical
      ? el('text', { x: -6, y: p, 'text-anchor': 'end', 'dominant-baseline': 'middle' }, axis)
      : el('text', { x: p, y: h + 12, transform: `rotate(45 ${p} ${h + 12})` }, axis);
    t.textContent = key.length > 18 ? key.slice(0, 17) + '…' : key;
  });
}

function linearAxis(g, scale, w, h, vertical) {
  const axis = el('g', { class: 'axis' }, g);
  for (const tick of scale.ticks) {
    const p = linearMap(scale, tick);
    if (vertical) {
      el('line', { x1: 0, x2: w, y1: p, y2: p }, axis);
      el('text', { x: -6, y: p, 'text-anchor': 'end', 'dominant-baseline': 'middle' }, axis).textContent = tick;
    } else {
      el('line', { x1: p, x2: p, y1: 0, y2: h }, axis);
      el('text', { x: p, y: h + 14, 'text-anchor': 'middle' }, axis).textContent = tick;
    }
  }
}

function timeAxis(g, scale, h) {
  const axis = el('g', { class: 'axis' }, g);
  for (const tick of scale.ticks) {
    const p = timeMap(scale, tick);
    el('line', { x1: p, x2: p, y1: 0, y2: h }, axis);
    el('text', { x: p, y: h + 14, 'text-anchor': 'middle' }, axis).textContent = tick.slice(0, 10);
  }
}

function arcPath(cx, cy, r, a0, a1) {
  const pt = a => [cx + r * Math.sin(a), cy - r * Math.cos(a)];
  const [x0, y0] = pt(a0), [x1, y1] = pt(a1);
  const large = a1 - a0 > Math.PI ? 1 : 0;
  if (a1 - a0 >= 2 * Math.PI - 1e-9) {
    return `M ${cx} ${cy - r} A ${r} ${r} 0 1 1 ${cx} ${cy + r} A ${r} ${r} 0 1 1 ${cx} ${cy - r} Z`;
  }
  return `M ${cx} ${cy} L ${x0} ${y0} A ${r} ${r} 0 ${large} 1 ${x1} ${y1} Z`;
}

function renderChart() {
  const spec = viewData.chart;
  const L = spec.layout;
  const svg = document.getElementById('chart');
  svg.innerHTML = '';
  svg.setAttribute('width', L.width);
  svg.setAttribute('height', L.height);

  const w = L.width - L.margin_left - L.margin_right;
  const h = L.height - L.margin_top - L.margin_bottom;
  const g = el('g', { transform: `translate(${L.margin_left},${L.margin_top})` }, svg);
  const m = spec.marks;

  if (m.kind === 'empty') {
    el('text', { x: w / 2, y: h / 2, 'text-anchor': 'middle' }, g).textContent =
      spec.chart_type ? 'No data for the current filters' : 'Unknown chart type';
    return;
  }

  el('text', { class: 'title', x: w / 2, y: 0, 'text-anchor': 'middle' }, g).textContent = spec.title;
  el('text', { x: w / 2, y: L.height - L.margin_top - 4, 'text-anchor': 'middle' }, g).textContent = spec.x_label;
  el('text', { x: -h / 2, y: -L.margin_left + 12, transform: 'rotate(-90)', 'text-anchor': 'middle' }, g).textContent = spec.y_label;

  switch (m.kind) {
    case 'bars':
      linearAxis(g, m.y, w, h, true);
      bandAxis(g, m.x, h, false);
      for (const b of m.bars) {
        withTooltip(el('rect', { class: 'mark', x: b.x, y: b.y, width: b.width, height: b.height }, g), b.label);
      }
      break;
    case 'line':
      linearAxis(g, m.y, w, h, true);
      bandAxis(g, m.x, h, false);
      el('path', { class: 'line', d: m.points.map((p, i) => `${i ? 'L' : 'M'} ${p.x} ${p.y}`).join(' ') }, g);
      for (const p of m.points) {
        withTooltip(el('circle', { class: 'mark', cx: p.x, cy: p.y, r: 3 }, g), p.label);
      }
      break;
    case 'scatter':
      linearAxis(g, m.y, w, h, true);
      bandAxis(g, m.x, h, false);
      for (const p of m.points) {
        withTooltip(el('circle', { class: 'mark', cx: p.x, cy: p.y, r: m.radius }, g), p.label);
      }
      break;
    case 'bubbles':
      linearAxis(g, m.y, w, h, true);
      linearAxis(g, m.x, w, h, false);
      for (const p of m.bubbles) {
        withTooltip(el('circle', { class: 'mark', cx: p.x, cy: p.y, r: m.radius, 'fill-opacity': 0.6 }, g), p.label);
      }
      break;
    case 'timeline':
      linearAxis(g, m.y, w, h, true);
      timeAxis(g, m.x, h);
      for (const p of m.points) {
        withTooltip(el('circle', { class: 'mark', cx: p.x, cy: p.y, r: m.radius }, g), p.label);
      }
      break;
    case 'pie': {
      const [cx, cy] = m.center;
      m.arcs.forEach((a, i) => {
        const hue = Math.round(360 * i / Math.max(1, m.arcs.length));
        withTooltip(el('path', {
          d: arcPath(cx, cy, m.radius, a.start_angle, a.end_angle),
          fill: `hsl(${hue}, 60%, 55%)`, stroke: '#0d1117',
        }, g), a.label);
      });
      break;
    }
    case 'heatmap':
      bandAxis(g, m.x, h, false);
      bandAxis(g, m.y, h, true);
      for (const c of m.cells) {
        withTooltip(el('rect', { x: c.x, y: c.y, width: c.width, height: c.height, fill: c.color }, g), c.label);
      }
      break;
  }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------
function renderPreview() {
  const rows = viewData.preview.map(r => `<tr>
    <td>${esc(r.title)}</td>
    <td class="muted">${esc(r.region)}</td>
    <td class="muted">${esc(r.sector)}</td>
    <td class="muted">${esc((r.topic || []).join(', '))}</td>
    <td>${esc(r.intensity)}</td>
    <td class="muted">${esc(r.published)}</td>
  </tr>`);
  document.getElementById('preview').innerHTML =
    rows.join('') || '<tr><td colspan="6" class="muted">No records match the current filters.</td></tr>';
}

function renderStatus() {
  document.getElementById('counts').textContent =
    `${viewData.matched} of ${viewData.total} records`;
  const badge = document.getElementById('fetch-badge');
  const f = viewData.last_fetch;
  if (!f) {
    badge.className = 'badge';
    badge.textContent = 'no data';
  } else if (f.outcome === 'failed') {
    badge.className = 'badge err';
    badge.textContent = 'fetch failed';
    badge.title = f.error || '';
  } else {
    badge.className = 'badge ok';
    badge.textContent = `loaded ${f.records}`;
    badge.title = f.timestamp;
  }
}

function render(view) {
  viewData = view;
  renderControls();
  renderChart();
  renderPreview();
  renderStatus();
}

async function load() {
  try {
    render(await api('GET', '/api/view'));
  } catch (e) {
    toast('Failed to load dashboard: ' + e.message, true);
  }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------
async function pushCriteria() {
  try {
    render(await api('PUT', '/api/criteria', readCriteria()));
  } catch (e) {
    toast('Failed to apply filters: ' + e.message, true);
  }
}

document.querySelectorAll('aside input').forEach(i => i.addEventListener('change', pushCriteria));
document.querySelectorAll('aside select').forEach(s => s.addEventListener('change', pushCriteria));

document.getElementById('chart-type').addEventListener('change', async e => {
  try {
    render(await api('PUT', '/api/chart-type', { chart_type: e.target.value }));
  } catch (err) {
    toast(err.message, true);
  }
});

document.getElementById('btn-clear').addEventListener('click', async () => {
  render(await api('POST', '/api/criteria/clear'));
});

document.getElementById('btn-refresh').addEventListener('click', async () => {
  try {
    const res = await api('POST', '/api/refresh');
    render(res.view);
    if (res.outcome.outcome === 'failed') toast('Refresh failed: ' + res.outcome.error, true);
    else toast(`Loaded ${res.outcome.records} records`);
  } catch (e) {
    toast('Refresh failed: ' + e.message, true);
  }
});

load();
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_calls_every_view_route() {
        for route in [
            "/api/view",
            "/api/criteria",
            "/api/criteria/clear",
            "/api/chart-type",
            "/api/refresh",
        ] {
            assert!(INDEX_HTML.contains(route), "frontend never calls {route}");
        }
    }

    #[test]
    fn page_draws_every_mark_kind() {
        for kind in ["bars", "line", "pie", "bubbles", "scatter", "heatmap", "timeline", "empty"] {
            assert!(INDEX_HTML.contains(&format!("'{kind}'")), "no drawing for {kind}");
        }
    }
}
